//! Template parsing.
//!
//! Two views of the same bytes: the normalized resource tree used by the
//! rules, and the position index used to locate findings in the raw text.

pub mod positions;
pub mod template;

pub use positions::PositionIndex;
pub use template::{
    ParseError, Resource, Template, is_intrinsic, parse_document, parse_template,
    parse_template_str, yaml_to_json,
};
