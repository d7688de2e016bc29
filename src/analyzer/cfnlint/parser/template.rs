//! CloudFormation template structure types.
//!
//! Normalizes JSON or YAML template bytes into an addressable tree of
//! resources whose properties keep full nesting fidelity.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;

use crate::analyzer::cfnlint::types::{Diagnostic, StructuralPath};

/// Error type for parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Template is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("Template syntax error: {0}")]
    Syntax(String),
    #[error("Empty document")]
    EmptyDocument,
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// One declared resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Logical name.
    pub name: String,
    /// Resource type, e.g. `AWS::S3::Bucket`.
    pub resource_type: String,
    /// The `Properties` subtree (always an object; empty when absent).
    pub properties: Value,
}

impl Resource {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            properties,
        }
    }

    /// Get a top-level property.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Follow a chain of keys below `Properties`.
    pub fn property_at(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .try_fold(&self.properties, |node, key| node.get(*key))
    }

    /// Get a top-level property as a sequence (empty when absent or not a list).
    pub fn property_list(&self, key: &str) -> &[Value] {
        self.property(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Path of this resource's `Properties` node.
    pub fn properties_path(&self) -> StructuralPath {
        StructuralPath::properties(&self.name)
    }
}

/// Parsed template.
#[derive(Debug, Clone, Default)]
pub struct Template {
    resources: BTreeMap<String, Resource>,
    diagnostics: Vec<Diagnostic>,
}

impl Template {
    /// Build a template from already-normalized resources.
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All resources ordered by logical name.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// Resources whose type equals or contains `type_name`.
    ///
    /// A coarse family filter such as `"S3"` selects every S3 resource; an
    /// exact type such as `"AWS::S3::Bucket"` selects that type (and any type
    /// that contains it, so callers wanting one type must compare exactly).
    pub fn resources_of_type(&self, type_name: &str) -> BTreeMap<&str, &Resource> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == type_name || r.resource_type.contains(type_name))
            .map(|(name, r)| (name.as_str(), r))
            .collect()
    }

    /// Structural problems found while normalizing. Never security findings.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Parse template bytes (JSON or YAML).
pub fn parse_template(bytes: &[u8]) -> Result<Template, ParseError> {
    let content = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
    parse_template_str(content)
}

/// Parse a template from a string.
pub fn parse_template_str(content: &str) -> Result<Template, ParseError> {
    let root = parse_document(content)?;
    normalize(root)
}

/// Parse raw text into a JSON value tree.
///
/// Text starting with `{` is read as JSON; everything else goes through the
/// YAML parser with short-form intrinsics expanded.
pub fn parse_document(content: &str) -> Result<Value, ParseError> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyDocument);
    }

    if trimmed.starts_with('{') {
        return serde_json::from_str(trimmed).map_err(|e| ParseError::Syntax(e.to_string()));
    }

    let yaml: YamlValue =
        serde_yaml::from_str(trimmed).map_err(|e| ParseError::Syntax(e.to_string()))?;
    if yaml.is_null() {
        return Err(ParseError::EmptyDocument);
    }
    Ok(yaml_to_json(&yaml))
}

fn normalize(root: Value) -> Result<Template, ParseError> {
    let Value::Object(mut root) = root else {
        return Err(ParseError::InvalidStructure(
            "Template root must be a mapping".to_string(),
        ));
    };

    let mut template = Template::default();

    let resources = match root.remove("Resources") {
        None | Some(Value::Null) => return Ok(template),
        Some(Value::Object(map)) => map,
        Some(_) => {
            template.diagnostics.push(Diagnostic::Schema {
                path: "Resources".to_string(),
                message: "Resources must be a mapping".to_string(),
            });
            return Ok(template);
        }
    };

    for (name, body) in resources {
        if let Some(resource) = normalize_resource(&name, body, &mut template.diagnostics) {
            template.resources.insert(name, resource);
        }
    }

    Ok(template)
}

fn normalize_resource(name: &str, body: Value, diagnostics: &mut Vec<Diagnostic>) -> Option<Resource> {
    let path = format!("Resources/{}", name);

    let Value::Object(mut body) = body else {
        diagnostics.push(Diagnostic::Schema {
            path,
            message: "Resource must be a mapping".to_string(),
        });
        return None;
    };

    let resource_type = match body.remove("Type") {
        Some(Value::String(t)) => t,
        Some(_) => {
            diagnostics.push(Diagnostic::Schema {
                path: format!("{}/Type", path),
                message: "Type must be a string".to_string(),
            });
            return None;
        }
        None => {
            diagnostics.push(Diagnostic::Schema {
                path,
                message: "Resource is missing Type".to_string(),
            });
            return None;
        }
    };

    let properties = match body.remove("Properties") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::Object(map)) => Value::Object(map),
        Some(_) => {
            diagnostics.push(Diagnostic::Schema {
                path: format!("{}/Properties", path),
                message: "Properties must be a mapping".to_string(),
            });
            Value::Object(Map::new())
        }
    };

    Some(Resource::new(name, resource_type, properties))
}

/// Convert a YAML value to JSON.
///
/// Short-form intrinsic tags (`!Ref`, `!GetAtt`, `!Sub`, ...) become their
/// long-form objects and are otherwise passed through untouched.
pub fn yaml_to_json(yaml: &YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string()))
            }
        }
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(seq) => Value::Array(seq.iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping {
                map.insert(yaml_key(k), yaml_to_json(v));
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            expand_intrinsic(tag.trim_start_matches('!'), yaml_to_json(&tagged.value))
        }
    }
}

fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn expand_intrinsic(name: &str, value: Value) -> Value {
    let (key, value) = match name {
        "Ref" | "Condition" => (name.to_string(), value),
        "GetAtt" => {
            let value = match value {
                Value::String(s) => match s.split_once('.') {
                    Some((resource, attribute)) => Value::Array(vec![
                        Value::String(resource.to_string()),
                        Value::String(attribute.to_string()),
                    ]),
                    None => Value::String(s),
                },
                other => other,
            };
            ("Fn::GetAtt".to_string(), value)
        }
        other => (format!("Fn::{}", other), value),
    };
    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}

/// Whether a value is an intrinsic function object (`Ref`, `Fn::*`).
pub fn is_intrinsic(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        map.len() == 1
            && map
                .keys()
                .all(|k| k == "Ref" || k == "Condition" || k.starts_with("Fn::"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_template() {
        let src = r#"{
  "Resources": {
    "Bucket": {
      "Type": "AWS::S3::Bucket",
      "Properties": { "BucketName": "logs" }
    }
  }
}"#;
        let template = parse_template_str(src).unwrap();
        assert_eq!(template.len(), 1);
        let bucket = template.resource("Bucket").unwrap();
        assert_eq!(bucket.resource_type, "AWS::S3::Bucket");
        assert_eq!(bucket.property("BucketName"), Some(&json!("logs")));
    }

    #[test]
    fn test_parse_yaml_with_short_intrinsics() {
        let src = r#"
Resources:
  Role:
    Type: AWS::IAM::Role
    Properties:
      RoleName: !Ref NameParam
      Arn: !GetAtt Other.Arn
      Body: !Sub "${AWS::StackName}-body"
"#;
        let template = parse_template_str(src).unwrap();
        let role = template.resource("Role").unwrap();
        assert_eq!(role.property("RoleName"), Some(&json!({"Ref": "NameParam"})));
        assert_eq!(
            role.property("Arn"),
            Some(&json!({"Fn::GetAtt": ["Other", "Arn"]}))
        );
        assert!(is_intrinsic(role.property("Body").unwrap()));
    }

    #[test]
    fn test_resources_of_type_family_and_exact() {
        let template = Template::from_resources([
            Resource::new("A", "AWS::S3::Bucket", json!({})),
            Resource::new("B", "AWS::S3::BucketPolicy", json!({})),
            Resource::new("C", "AWS::IAM::Role", json!({})),
        ]);
        assert_eq!(template.resources_of_type("S3").len(), 2);
        assert_eq!(template.resources_of_type("AWS::IAM::Role").len(), 1);
        assert!(template.resources_of_type("Lambda").is_empty());
    }

    #[test]
    fn test_zero_resources() {
        let template = parse_template_str("AWSTemplateFormatVersion: '2010-09-09'\n").unwrap();
        assert!(template.is_empty());
        assert!(template.diagnostics().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_template_str("   "), Err(ParseError::EmptyDocument)));
        assert!(matches!(
            parse_template_str("{\"Resources\": "),
            Err(ParseError::Syntax(_))
        ));
        assert!(matches!(
            parse_template_str("- a\n- b\n"),
            Err(ParseError::InvalidStructure(_))
        ));
        assert!(matches!(
            parse_template(&[0xff, 0xfe, 0x00]),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_schema_diagnostics_are_not_fatal() {
        let src = r#"
Resources:
  NoType:
    Properties: {}
  BadProps:
    Type: AWS::SNS::Topic
    Properties: [1, 2]
  Good:
    Type: AWS::SQS::Queue
"#;
        let template = parse_template_str(src).unwrap();
        assert_eq!(template.len(), 2);
        assert_eq!(template.diagnostics().len(), 2);
        assert_eq!(
            template.resource("BadProps").unwrap().properties,
            json!({})
        );
    }

    #[test]
    fn test_property_at() {
        let res = Resource::new(
            "Dist",
            "AWS::CloudFront::Distribution",
            json!({"DistributionConfig": {"DefaultCacheBehavior": {"ViewerProtocolPolicy": "allow-all"}}}),
        );
        assert_eq!(
            res.property_at(&["DistributionConfig", "DefaultCacheBehavior", "ViewerProtocolPolicy"]),
            Some(&json!("allow-all"))
        );
        assert_eq!(res.property_at(&["DistributionConfig", "Missing"]), None);
    }
}
