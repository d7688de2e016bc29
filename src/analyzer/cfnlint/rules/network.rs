//! Network exposure checks.
//!
//! E04 `security-group-open-to-world`: world-open CIDRs on SSH, RDP or all ports.
//! W13 `vpc-flow-logs`: every VPC needs a flow log (cross-resource).

use serde_json::Value;

use crate::analyzer::cfnlint::parser::Resource;
use crate::analyzer::cfnlint::rules::{LintContext, Rule, SimpleRule, TypeFilter, numeric_port};
use crate::analyzer::cfnlint::types::{RuleMeta, StructuralPath, Violation};

const WORLD_CIDRS: [&str; 2] = ["0.0.0.0/0", "::/0"];
const DANGEROUS_PORTS: [i64; 2] = [22, 3389];
const MAX_PORT: i64 = 65535;

const SECURITY_GROUP: &str = "AWS::EC2::SecurityGroup";
const RULE_LISTS: [&str; 2] = ["SecurityGroupIngress", "SecurityGroupEgress"];

/// A port bound as written in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortBound {
    Absent,
    Known(i64),
    /// Present but not statically known (intrinsic, non-digit string).
    Unknown,
}

impl PortBound {
    fn read(entry: &Value, key: &str) -> Self {
        match entry.get(key) {
            None | Some(Value::Null) => Self::Absent,
            Some(v) => numeric_port(v).map_or(Self::Unknown, Self::Known),
        }
    }
}

/// Whether a port range reaches a dangerous port or spans every port.
///
/// Absent bounds mean "unbounded"; `-1` means all ports. Unknown bounds never
/// match.
fn covers_dangerous_port(from: PortBound, to: PortBound) -> bool {
    let (from, to) = match (from, to) {
        (PortBound::Unknown, _) | (_, PortBound::Unknown) => return false,
        (PortBound::Known(-1), _) | (_, PortBound::Known(-1)) => (0, MAX_PORT),
        (from, to) => (
            match from {
                PortBound::Known(p) => p,
                _ => 0,
            },
            match to {
                PortBound::Known(p) => p,
                _ => MAX_PORT,
            },
        ),
    };

    DANGEROUS_PORTS.iter().any(|p| from <= *p && *p <= to) || (from <= 0 && to >= MAX_PORT)
}

fn world_cidr(entry: &Value) -> Option<(&'static str, &str)> {
    ["CidrIp", "CidrIpv6"].into_iter().find_map(|key| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .filter(|cidr| WORLD_CIDRS.iter().any(|w| w == cidr))
            .map(|cidr| (key, cidr))
    })
}

fn is_open_to_world(entry: &Value) -> bool {
    world_cidr(entry).is_some()
        && covers_dangerous_port(
            PortBound::read(entry, "FromPort"),
            PortBound::read(entry, "ToPort"),
        )
}

pub fn open_to_world() -> impl Rule {
    SimpleRule::new(
        "E04",
        "security-group-open-to-world",
        "0.0.0.0",
        TypeFilter::new(
            "EC2",
            &[
                SECURITY_GROUP,
                "AWS::EC2::SecurityGroupIngress",
                "AWS::EC2::SecurityGroupEgress",
            ],
        ),
        RuleMeta::new(
            "Security groups must not open SSH, RDP or all ports to the world",
            "Restrict CidrIp/CidrIpv6 to known ranges or narrow the port range",
        ),
        check_open_to_world,
    )
    .quick()
}

fn check_open_to_world(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    if resource.resource_type != SECURITY_GROUP {
        // Standalone ingress/egress: the properties are the rule itself.
        return match world_cidr(&resource.properties) {
            Some((key, cidr)) if is_open_to_world(&resource.properties) => vec![Violation::new(
                resource.properties_path().key(key),
                format!(
                    "{} is open to the world ({}) on dangerous ports",
                    resource.name, cidr
                ),
            )],
            _ => Vec::new(),
        };
    }

    let mut violations = Vec::new();
    for list in RULE_LISTS {
        for (idx, entry) in resource.property_list(list).iter().enumerate() {
            if is_open_to_world(entry) {
                violations.push(Violation::new(
                    resource.properties_path().key(list).index(idx),
                    format!(
                        "{} {}[{}] open to the world on dangerous ports",
                        resource.name, list, idx
                    ),
                ));
            }
        }
    }
    violations
}

pub fn vpc_flow_logs() -> impl Rule {
    SimpleRule::new(
        "W13",
        "vpc-flow-logs",
        "logging",
        TypeFilter::new("EC2", &["AWS::EC2::VPC"]),
        RuleMeta::new(
            "VPCs should have flow logs enabled",
            "Add an AWS::EC2::FlowLog whose ResourceId is a Ref to the VPC",
        ),
        check_vpc_flow_logs,
    )
}

fn check_vpc_flow_logs(ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let found = ctx
        .template
        .resources_of_type("FlowLog")
        .values()
        .filter(|fl| fl.resource_type == "AWS::EC2::FlowLog")
        .any(|fl| {
            fl.property("ResourceId")
                .and_then(|id| id.get("Ref"))
                .and_then(Value::as_str)
                == Some(resource.name.as_str())
        });

    if found {
        return Vec::new();
    }
    vec![Violation::new(
        StructuralPath::resource(&resource.name),
        format!("{}: VPC Flow Logs are not enabled for this VPC", resource.name),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::parser::Template;
    use serde_json::json;

    fn sg(entries: Value) -> Vec<Violation> {
        let resource = Resource::new(
            "Sg",
            SECURITY_GROUP,
            json!({"GroupDescription": "test", "SecurityGroupIngress": entries}),
        );
        let template = Template::from_resources([resource.clone()]);
        open_to_world().check(&LintContext::new(&template), &resource)
    }

    #[test]
    fn test_ssh_from_anywhere() {
        let v = sg(json!([{"IpProtocol": "tcp", "CidrIp": "0.0.0.0/0", "FromPort": 22, "ToPort": 22}]));
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].path.canonical(),
            "Resources/Sg/Properties/SecurityGroupIngress/0"
        );
    }

    #[test]
    fn test_private_cidr_is_fine() {
        let v = sg(json!([{"IpProtocol": "tcp", "CidrIp": "10.0.0.0/8", "FromPort": 22, "ToPort": 22}]));
        assert!(v.is_empty());
    }

    #[test]
    fn test_port_forms() {
        use PortBound::*;
        assert!(covers_dangerous_port(Known(3389), Known(3389)));
        assert!(covers_dangerous_port(Known(0), Known(65535)));
        assert!(covers_dangerous_port(Known(20), Known(30)));
        assert!(!covers_dangerous_port(Known(443), Known(443)));
        assert!(covers_dangerous_port(Absent, Absent));
        assert!(covers_dangerous_port(Known(-1), Known(-1)));
        assert!(!covers_dangerous_port(Unknown, Known(22)));
    }

    #[test]
    fn test_string_and_intrinsic_ports() {
        let v = sg(json!([
            {"CidrIpv6": "::/0", "FromPort": "22", "ToPort": "22"},
            {"CidrIp": "0.0.0.0/0", "FromPort": {"Ref": "Port"}, "ToPort": {"Ref": "Port"}},
            {"CidrIp": "0.0.0.0/0", "FromPort": 443, "ToPort": 443}
        ]));
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].path.canonical(),
            "Resources/Sg/Properties/SecurityGroupIngress/0"
        );
    }

    #[test]
    fn test_standalone_ingress() {
        let resource = Resource::new(
            "Ingress",
            "AWS::EC2::SecurityGroupIngress",
            json!({"GroupId": {"Ref": "Sg"}, "CidrIp": "0.0.0.0/0", "FromPort": 3389, "ToPort": 3389}),
        );
        let template = Template::from_resources([resource.clone()]);
        let v = open_to_world().check(&LintContext::new(&template), &resource);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].path.canonical(), "Resources/Ingress/Properties/CidrIp");
    }

    #[test]
    fn test_vpc_flow_logs() {
        let vpc = Resource::new("Vpc", "AWS::EC2::VPC", json!({"CidrBlock": "10.0.0.0/16"}));
        let other = Resource::new("Other", "AWS::EC2::VPC", json!({}));
        let flow = Resource::new(
            "Flow",
            "AWS::EC2::FlowLog",
            json!({"ResourceId": {"Ref": "Vpc"}, "ResourceType": "VPC"}),
        );
        let template = Template::from_resources([vpc.clone(), other.clone(), flow]);
        let ctx = LintContext::new(&template);
        let rule = vpc_flow_logs();
        assert!(rule.check(&ctx, &vpc).is_empty());
        let v = rule.check(&ctx, &other);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].path.canonical(), "Resources/Other");
    }
}
