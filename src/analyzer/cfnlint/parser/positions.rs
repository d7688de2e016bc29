//! Source position index.
//!
//! Walks the YAML event stream of the original source text once and records
//! where every mapping entry and sequence item starts, keyed by the same
//! canonical `Resources/<name>/...` string that [`StructuralPath`] produces.
//! JSON input goes through the same parser (JSON is a YAML flow document).

use std::collections::HashMap;

use log::debug;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

use crate::analyzer::cfnlint::parser::template::ParseError;
use crate::analyzer::cfnlint::types::{Location, Position, StructuralPath, join_canonical};

/// Path -> position lookup built once per scan.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    positions: HashMap<String, Position>,
}

impl PositionIndex {
    /// Build the index from the unmodified source text.
    pub fn build(source: &str) -> Result<Self, ParseError> {
        let mut builder = IndexBuilder::default();
        let mut parser = Parser::new_from_str(source);
        parser
            .load(&mut builder, false)
            .map_err(|e| ParseError::Syntax(e.to_string()))?;

        debug!("Position index built with {} entries", builder.positions.len());
        Ok(Self {
            positions: builder.positions,
        })
    }

    /// Resolve a structural path. Paths with no verbatim counterpart in the
    /// source resolve to [`Location::NotFound`].
    pub fn resolve(&self, path: &StructuralPath) -> Location {
        self.resolve_canonical(&path.canonical())
    }

    /// Resolve an already-joined canonical path.
    pub fn resolve_canonical(&self, canonical: &str) -> Location {
        match self.positions.get(canonical) {
            Some(pos) => Location::Resolved(*pos),
            None => {
                debug!("No source position for {}", canonical);
                Location::NotFound
            }
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// What the enclosing mapping expects next.
#[derive(Debug)]
enum Pending {
    Key,
    Value(String, Position),
    /// Value of a non-scalar (or aliased) key; not addressable.
    Skip,
}

#[derive(Debug)]
enum Frame {
    Mapping { pending: Pending, pushed: bool },
    Sequence { next: usize, pushed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Mapping,
    Sequence,
}

#[derive(Debug, Default)]
struct IndexBuilder {
    positions: HashMap<String, Position>,
    stack: Vec<Frame>,
    path: Vec<String>,
    /// Open containers being skipped (complex keys and their values).
    skip_depth: usize,
    /// Sequence item that opened a container, waiting for its first event.
    deferred: Option<(String, Position)>,
}

/// The earlier of two positions.
fn earliest(a: Position, b: Position) -> Position {
    if (b.line, b.column) < (a.line, a.column) { b } else { a }
}

impl IndexBuilder {
    fn node(&mut self, scalar: Option<String>, at: Position, container: Option<Container>) {
        let (segment, recorded_at, item) = match self.stack.last_mut() {
            None => {
                // Document root: no segment of its own.
                if let Some(kind) = container {
                    self.open(kind, false);
                }
                return;
            }
            Some(Frame::Mapping { pending, .. }) => {
                match std::mem::replace(pending, Pending::Key) {
                    Pending::Key => {
                        *pending = match (scalar, container) {
                            (Some(key), None) => Pending::Value(key, at),
                            (_, Some(_)) => {
                                self.skip_depth = 1;
                                Pending::Skip
                            }
                            (None, None) => Pending::Skip,
                        };
                        return;
                    }
                    Pending::Skip => {
                        if container.is_some() {
                            self.skip_depth = 1;
                        }
                        return;
                    }
                    Pending::Value(key, key_at) => (key, key_at, false),
                }
            }
            Some(Frame::Sequence { next, .. }) => {
                let index = *next;
                *next += 1;
                (index.to_string(), at, true)
            }
        };

        self.path.push(segment);
        let canonical = join_canonical(&self.path);

        match container {
            // A block mapping in a sequence is marked at its first `:`, not
            // where the item starts.
            Some(kind) if item => {
                self.deferred = Some((canonical, recorded_at));
                self.open(kind, true);
            }
            Some(kind) => {
                self.record(canonical, recorded_at);
                self.open(kind, true);
            }
            None => {
                self.record(canonical, recorded_at);
                self.path.pop();
            }
        }
    }

    fn record(&mut self, canonical: String, at: Position) {
        self.positions.entry(canonical).or_insert(at);
    }

    fn open(&mut self, kind: Container, pushed: bool) {
        self.stack.push(match kind {
            Container::Mapping => Frame::Mapping {
                pending: Pending::Key,
                pushed,
            },
            Container::Sequence => Frame::Sequence { next: 0, pushed },
        });
    }

    fn close(&mut self) {
        let pushed = match self.stack.pop() {
            Some(Frame::Mapping { pushed, .. }) | Some(Frame::Sequence { pushed, .. }) => pushed,
            None => false,
        };
        if pushed {
            self.path.pop();
        }
    }
}

impl MarkedEventReceiver for IndexBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        let at = Position::new(mark.line() as u32, mark.col() as u32 + 1);

        // The first event inside a sequence item (or its end, when empty)
        // settles where the item starts.
        if let Some((canonical, start)) = self.deferred.take() {
            self.record(canonical, earliest(start, at));
        }

        if self.skip_depth > 0 {
            match ev {
                Event::MappingStart(..) | Event::SequenceStart(..) => self.skip_depth += 1,
                Event::MappingEnd | Event::SequenceEnd => self.skip_depth -= 1,
                _ => {}
            }
            return;
        }

        match ev {
            Event::Scalar(value, ..) => self.node(Some(value), at, None),
            Event::Alias(..) => self.node(None, at, None),
            Event::MappingStart(..) => self.node(None, at, Some(Container::Mapping)),
            Event::SequenceStart(..) => self.node(None, at, Some(Container::Sequence)),
            Event::MappingEnd | Event::SequenceEnd => self.close(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::parser::template::parse_document;
    use serde_json::Value;

    const YAML: &str = "\
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Properties:
      PublicAccessBlockConfiguration:
        BlockPublicAcls: false
  Sg:
    Type: AWS::EC2::SecurityGroup
    Properties:
      SecurityGroupIngress:
        - CidrIp: 0.0.0.0/0
          FromPort: 22
        - CidrIp: 10.0.0.0/8
";

    #[test]
    fn test_resolves_verbatim_paths() {
        let index = PositionIndex::build(YAML).unwrap();

        let acls = StructuralPath::properties("Bucket")
            .keys(&["PublicAccessBlockConfiguration", "BlockPublicAcls"]);
        assert_eq!(index.resolve(&acls), Location::Resolved(Position::new(6, 9)));

        let first = StructuralPath::properties("Sg")
            .key("SecurityGroupIngress")
            .index(0);
        assert_eq!(
            index.resolve(&first),
            Location::Resolved(Position::new(11, 11))
        );

        let second = StructuralPath::properties("Sg")
            .key("SecurityGroupIngress")
            .index(1);
        assert_eq!(
            index.resolve(&second),
            Location::Resolved(Position::new(13, 11))
        );

        let port = StructuralPath::properties("Sg")
            .key("SecurityGroupIngress")
            .index(0)
            .key("FromPort");
        assert_eq!(index.resolve(&port), Location::Resolved(Position::new(12, 11)));
    }

    #[test]
    fn test_synthesized_path_is_not_found() {
        let index = PositionIndex::build(YAML).unwrap();
        let missing = StructuralPath::properties("Sg")
            .key("SecurityGroupIngress")
            .index(5);
        assert_eq!(index.resolve(&missing), Location::NotFound);
        let absent = StructuralPath::properties("Bucket").key("BucketEncryption");
        assert_eq!(index.resolve(&absent), Location::NotFound);
    }

    #[test]
    fn test_json_source() {
        let json = "{\n  \"Resources\": {\n    \"Db\": {\n      \"Type\": \"AWS::RDS::DBInstance\",\n      \"Properties\": {\"MultiAZ\": false}\n    }\n  }\n}\n";
        let index = PositionIndex::build(json).unwrap();
        let path = StructuralPath::properties("Db").key("MultiAZ");
        assert!(index.resolve(&path).is_resolved());
        assert_eq!(
            index.resolve(&StructuralPath::resource("Db")),
            Location::Resolved(Position::new(3, 5))
        );
    }

    const MIXED: &str = "\
Resources:
  Group:
    Type: AWS::EC2::SecurityGroup
    Properties:
      GroupDescription: \"web tier\"
      SecurityGroupIngress:
        - IpProtocol: tcp
          FromPort: 443
          ToPort: \"443\"
          CidrIp: 0.0.0.0/0
        - {IpProtocol: tcp, FromPort: 22, ToPort: 22}
      Tags:
      - Key: Name
        Value: web
      - Key: team
        Value: edge
  Role:
    Type: AWS::IAM::Role
    Properties:
      ManagedPolicyArns: [ReadOnly, Audit]
      Policies:
        - PolicyName: inline
          PolicyDocument:
            Statement:
              - Effect: Allow
                Action:
                  - s3:GetObject
                  - - nested
                    - list
                Resource: '*'
              - {Effect: Deny, Action: [PassRole]}
  Table:
    Type: AWS::DynamoDB::Table
    Properties: {TableName: orders, SSESpecification: {SSEEnabled: true}}
";

    /// Spellings a scalar may have in the source.
    fn spellings(text: &str) -> Vec<String> {
        vec![
            text.to_string(),
            format!("\"{}\"", text),
            format!("'{}'", text),
        ]
    }

    /// Text a sequence item may start with.
    fn item_starts(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => spellings(s),
            Value::Number(n) => spellings(&n.to_string()),
            Value::Bool(b) => vec![b.to_string()],
            Value::Null => Vec::new(),
            Value::Array(_) => vec!["[".to_string(), "-".to_string()],
            Value::Object(map) => std::iter::once("{".to_string())
                .chain(map.keys().flat_map(|k| spellings(k)))
                .collect(),
        }
    }

    /// Every addressable path below `value` with the text expected there.
    fn expected_paths(value: &Value, path: &mut Vec<String>, out: &mut Vec<(String, Vec<String>)>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    path.push(key.clone());
                    out.push((join_canonical(path.iter()), spellings(key)));
                    expected_paths(child, path, out);
                    path.pop();
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    path.push(i.to_string());
                    out.push((join_canonical(path.iter()), item_starts(child)));
                    expected_paths(child, path, out);
                    path.pop();
                }
            }
            _ => {}
        }
    }

    #[test]
    fn test_every_verbatim_path_resolves_to_its_own_text() {
        let index = PositionIndex::build(MIXED).unwrap();
        let document = parse_document(MIXED).unwrap();
        let lines: Vec<&str> = MIXED.lines().collect();

        let mut expected = Vec::new();
        expected_paths(&document, &mut Vec::new(), &mut expected);
        assert!(expected.len() > 40);

        for (canonical, starts) in &expected {
            let Location::Resolved(pos) = index.resolve_canonical(canonical) else {
                panic!("{} did not resolve", canonical);
            };
            let line = lines[pos.line as usize - 1];
            let text = &line[pos.column as usize - 1..];
            assert!(
                starts.iter().any(|s| text.starts_with(s.as_str())),
                "{} resolved to {}:{} ({:?}), expected one of {:?}",
                canonical,
                pos.line,
                pos.column,
                text,
                starts
            );
        }
    }

    #[test]
    fn test_block_mapping_items_start_at_first_key() {
        let index = PositionIndex::build(MIXED).unwrap();
        let statement = "Resources/Role/Properties/Policies/0/PolicyDocument/Statement";
        assert_eq!(
            index.resolve_canonical(&format!("{}/0", statement)),
            Location::Resolved(Position::new(25, 17))
        );
        assert_eq!(
            index.resolve_canonical(&format!("{}/1", statement)),
            Location::Resolved(Position::new(31, 17))
        );
        assert_eq!(
            index.resolve_canonical("Resources/Group/Properties/Tags/1"),
            Location::Resolved(Position::new(15, 9))
        );
    }

    #[test]
    fn test_complex_keys_are_skipped() {
        let src = "? [a, b]\n: value\nResources:\n  X:\n    Type: T\n";
        let index = PositionIndex::build(src).unwrap();
        assert!(index.resolve(&StructuralPath::resource("X")).is_resolved());
    }

    #[test]
    fn test_invalid_source_is_an_error() {
        assert!(PositionIndex::build("a: [1, 2\n").is_err());
    }
}
