//! Immutable pipeline configuration.
//!
//! All rule tables — aggregation rules, logical-connection rules, and
//! relationship-extraction rules — are plain data constructed once and
//! passed explicitly into the component constructors. Components never
//! consult ambient state, which keeps the whole pipeline a pure function of
//! its inputs.
//!
//! The built-in tables cover the AWS service families the tool understands
//! out of the box; callers can replace or extend them freely. Rule-table
//! consistency is validated when a component is constructed, not when it
//! runs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One aggregation rule: which resource types form a logical service.
///
/// Primary types count toward the service's presence and multiplicity;
/// secondary types attach to an existing service without triggering its
/// creation. Rules with `in_vpc` set are de-grouped: one service is emitted
/// per primary resource instead of one service per rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationRule {
    /// Service type identifier, e.g. `alb` or `sqs`.
    pub service_type: String,
    /// Resource types that create and count toward the service.
    pub primary: Vec<String>,
    /// Resource types that attach without creating the service.
    #[serde(default)]
    pub secondary: Vec<String>,
    /// Whether the service lives inside the VPC and is de-grouped.
    #[serde(default)]
    pub in_vpc: bool,
}

impl AggregationRule {
    /// Create a rule with the given primary types.
    pub fn new(service_type: impl Into<String>, primary: &[&str]) -> Self {
        Self {
            service_type: service_type.into(),
            primary: primary.iter().map(|s| s.to_string()).collect(),
            secondary: Vec::new(),
            in_vpc: false,
        }
    }

    /// Attach secondary resource types (builder style).
    pub fn with_secondary(mut self, secondary: &[&str]) -> Self {
        self.secondary = secondary.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Mark the rule's services as VPC-internal, de-grouped (builder style).
    pub fn in_vpc(mut self) -> Self {
        self.in_vpc = true;
        self
    }

    /// The resource type whose icon represents the service.
    pub fn icon_resource_type(&self) -> &str {
        self.primary.first().map(String::as_str).unwrap_or("")
    }
}

/// Semantic flavor of a logical connection, for renderer styling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    #[default]
    Default,
    DataFlow,
    Trigger,
    Encrypt,
}

/// One logical-connection rule between two service types.
///
/// When both service types are present in an aggregated result, a connection
/// is emitted for every (source service, target service) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRule {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: ConnectionKind,
}

impl ConnectionRule {
    /// Create a labeled connection rule.
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: &str) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: Some(label.to_string()),
            kind: ConnectionKind::Default,
        }
    }

    /// Set the connection kind (builder style).
    pub fn with_kind(mut self, kind: ConnectionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Aggregation rule table plus logical-connection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub rules: Vec<AggregationRule>,
    pub connections: Vec<ConnectionRule>,
}

impl AggregationConfig {
    /// The built-in AWS rule tables.
    pub fn aws_defaults() -> Self {
        let rules = vec![
            AggregationRule::new("cloudfront", &["aws_cloudfront_distribution"])
                .with_secondary(&["aws_cloudfront_origin_access_control"]),
            AggregationRule::new("waf", &["aws_wafv2_web_acl"])
                .with_secondary(&["aws_wafv2_web_acl_association", "aws_wafv2_ip_set"]),
            AggregationRule::new("route53", &["aws_route53_zone"])
                .with_secondary(&["aws_route53_record"]),
            AggregationRule::new("acm", &["aws_acm_certificate"])
                .with_secondary(&["aws_acm_certificate_validation"]),
            AggregationRule::new("cognito", &["aws_cognito_user_pool"])
                .with_secondary(&["aws_cognito_user_pool_client", "aws_cognito_user_pool_domain"]),
            AggregationRule::new("alb", &["aws_lb"])
                .with_secondary(&[
                    "aws_lb_listener",
                    "aws_lb_listener_rule",
                    "aws_lb_target_group",
                ])
                .in_vpc(),
            AggregationRule::new("ecs", &["aws_ecs_service"])
                .with_secondary(&[
                    "aws_ecs_cluster",
                    "aws_ecs_task_definition",
                    "aws_appautoscaling_target",
                    "aws_appautoscaling_policy",
                ])
                .in_vpc(),
            AggregationRule::new("ec2", &["aws_instance"])
                .with_secondary(&["aws_launch_template", "aws_autoscaling_group"])
                .in_vpc(),
            AggregationRule::new("rds", &["aws_db_instance"])
                .with_secondary(&["aws_db_subnet_group", "aws_db_parameter_group"])
                .in_vpc(),
            AggregationRule::new("internet_gateway", &["aws_internet_gateway"]).in_vpc(),
            AggregationRule::new("nat_gateway", &["aws_nat_gateway"]).in_vpc(),
            AggregationRule::new("security_groups", &["aws_security_group"])
                .with_secondary(&[
                    "aws_security_group_rule",
                    "aws_vpc_security_group_ingress_rule",
                    "aws_vpc_security_group_egress_rule",
                ]),
            AggregationRule::new("lambda", &["aws_lambda_function"]).with_secondary(&[
                "aws_lambda_permission",
                "aws_lambda_event_source_mapping",
            ]),
            AggregationRule::new("s3", &["aws_s3_bucket"]).with_secondary(&[
                "aws_s3_bucket_policy",
                "aws_s3_bucket_versioning",
                "aws_s3_bucket_public_access_block",
                "aws_s3_bucket_server_side_encryption_configuration",
            ]),
            AggregationRule::new("dynamodb", &["aws_dynamodb_table"]),
            AggregationRule::new("sqs", &["aws_sqs_queue"])
                .with_secondary(&["aws_sqs_queue_policy"]),
            AggregationRule::new("sns", &["aws_sns_topic"])
                .with_secondary(&["aws_sns_topic_subscription"]),
            AggregationRule::new("eventbridge", &["aws_cloudwatch_event_rule"])
                .with_secondary(&["aws_cloudwatch_event_target"]),
            AggregationRule::new("kms", &["aws_kms_key"]).with_secondary(&["aws_kms_alias"]),
            AggregationRule::new("secrets_manager", &["aws_secretsmanager_secret"])
                .with_secondary(&["aws_secretsmanager_secret_version"]),
            AggregationRule::new("iam", &["aws_iam_role"]).with_secondary(&[
                "aws_iam_role_policy",
                "aws_iam_policy",
                "aws_iam_role_policy_attachment",
                "aws_iam_instance_profile",
            ]),
            AggregationRule::new("ecr", &["aws_ecr_repository"])
                .with_secondary(&["aws_ecr_lifecycle_policy"]),
            AggregationRule::new("cloudwatch", &["aws_cloudwatch_log_group"])
                .with_secondary(&["aws_cloudwatch_metric_alarm", "aws_cloudwatch_dashboard"]),
        ];

        let connections = vec![
            ConnectionRule::new("route53", "cloudfront", "resolves"),
            ConnectionRule::new("waf", "cloudfront", "protects"),
            ConnectionRule::new("cloudfront", "alb", "forwards").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("cloudfront", "s3", "origin").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("alb", "ecs", "routes").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("alb", "ec2", "routes").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("ecs", "rds", "queries").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("ecs", "dynamodb", "reads/writes")
                .with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("ecs", "s3", "reads/writes").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("ecs", "sqs", "publishes").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("ecs", "secrets_manager", "reads secrets"),
            ConnectionRule::new("ecs", "ecr", "pulls images"),
            ConnectionRule::new("sqs", "lambda", "triggers").with_kind(ConnectionKind::Trigger),
            ConnectionRule::new("eventbridge", "lambda", "triggers")
                .with_kind(ConnectionKind::Trigger),
            ConnectionRule::new("sns", "sqs", "fans out").with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("lambda", "dynamodb", "reads/writes")
                .with_kind(ConnectionKind::DataFlow),
            ConnectionRule::new("kms", "s3", "encrypts").with_kind(ConnectionKind::Encrypt),
            ConnectionRule::new("kms", "sqs", "encrypts").with_kind(ConnectionKind::Encrypt),
        ];

        Self { rules, connections }
    }

    /// Build the reverse index from resource type to owning rule.
    ///
    /// Primary and secondary types map to the same rule. A type claimed by
    /// two rules is a configuration error, detected here so components can
    /// reject it at construction time.
    pub(crate) fn build_type_index(&self) -> Result<IndexMap<String, usize>, ConfigError> {
        let mut index: IndexMap<String, usize> = IndexMap::new();
        for (rule_idx, rule) in self.rules.iter().enumerate() {
            if rule.primary.is_empty() {
                return Err(ConfigError::EmptyRule(rule.service_type.clone()));
            }
            for resource_type in rule.primary.iter().chain(rule.secondary.iter()) {
                match index.get(resource_type) {
                    Some(&owner) if owner != rule_idx => {
                        return Err(ConfigError::DuplicateTypeRegistration {
                            resource_type: resource_type.clone(),
                            first_rule: self.rules[owner].service_type.clone(),
                            second_rule: rule.service_type.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.insert(resource_type.clone(), rule_idx);
                    }
                }
            }
        }
        Ok(index)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::aws_defaults()
    }
}

/// One relationship-extraction rule: an attribute whose value references a
/// specific target resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRule {
    /// Attribute name to inspect, e.g. `vpc_id`.
    pub attribute: String,
    /// Relationship kind to emit, e.g. `belongs_to_vpc`.
    pub kind: String,
    /// Resource type the attribute references, e.g. `aws_vpc`.
    pub target_type: String,
}

impl ReferenceRule {
    pub fn new(attribute: &str, kind: &str, target_type: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            kind: kind.to_string(),
            target_type: target_type.to_string(),
        }
    }
}

/// Configuration for the relationship extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Direct attribute-reference rules, applied in order.
    pub reference_rules: Vec<ReferenceRule>,
    /// Plumbing resource types excluded from the deep scan.
    pub deep_scan_exclusions: Vec<String>,
}

impl ExtractorConfig {
    /// The built-in AWS extraction tables.
    pub fn aws_defaults() -> Self {
        let reference_rules = vec![
            ReferenceRule::new("vpc_id", "belongs_to_vpc", "aws_vpc"),
            ReferenceRule::new("subnet_id", "deployed_in_subnet", "aws_subnet"),
            ReferenceRule::new("subnet_ids", "deployed_in_subnets", "aws_subnet"),
            ReferenceRule::new("security_group_ids", "uses_security_group", "aws_security_group"),
            ReferenceRule::new("kms_master_key_id", "encrypted_by", "aws_kms_key"),
            ReferenceRule::new("kms_key_id", "encrypted_by", "aws_kms_key"),
            ReferenceRule::new("target_group_arn", "routes_to", "aws_lb_target_group"),
            ReferenceRule::new("load_balancer_arn", "attached_to", "aws_lb"),
            ReferenceRule::new("web_acl_arn", "protected_by", "aws_wafv2_web_acl"),
            ReferenceRule::new("waf_acl_arn", "protected_by", "aws_wafv2_web_acl"),
            ReferenceRule::new("certificate_arn", "uses_certificate", "aws_acm_certificate"),
            ReferenceRule::new("role_arn", "assumes_role", "aws_iam_role"),
            ReferenceRule::new("queue_arn", "sends_to_queue", "aws_sqs_queue"),
            ReferenceRule::new("topic_arn", "publishes_to", "aws_sns_topic"),
            ReferenceRule::new("alarm_topic_arn", "alerts_to", "aws_sns_topic"),
        ];

        let deep_scan_exclusions = [
            "aws_security_group",
            "aws_security_group_rule",
            "aws_vpc_security_group_ingress_rule",
            "aws_vpc_security_group_egress_rule",
            "aws_iam_role",
            "aws_iam_policy",
            "aws_iam_role_policy",
            "aws_iam_role_policy_attachment",
            "aws_subnet",
            "aws_vpc",
            "aws_route_table",
            "aws_route_table_association",
            "aws_eip",
            "aws_network_interface",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            reference_rules,
            deep_scan_exclusions,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::aws_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_validate() {
        let config = AggregationConfig::aws_defaults();
        let index = config.build_type_index().unwrap();

        assert_eq!(index["aws_lb"], index["aws_lb_listener"]);
        assert!(config.rules[index["aws_lb"]].in_vpc);
        assert!(!config.rules[index["aws_s3_bucket"]].in_vpc);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let config = AggregationConfig {
            rules: vec![
                AggregationRule::new("queues", &["aws_sqs_queue"]),
                AggregationRule::new("messaging", &["aws_sns_topic"])
                    .with_secondary(&["aws_sqs_queue"]),
            ],
            connections: Vec::new(),
        };

        let err = config.build_type_index().unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateTypeRegistration {
                resource_type: "aws_sqs_queue".to_string(),
                first_rule: "queues".to_string(),
                second_rule: "messaging".to_string(),
            }
        );
    }

    #[test]
    fn test_rule_without_primary_types_is_rejected() {
        let config = AggregationConfig {
            rules: vec![AggregationRule::new("empty", &[])],
            connections: Vec::new(),
        };

        assert_eq!(
            config.build_type_index().unwrap_err(),
            ConfigError::EmptyRule("empty".to_string())
        );
    }

    #[test]
    fn test_type_repeated_within_one_rule_is_allowed() {
        let config = AggregationConfig {
            rules: vec![
                AggregationRule::new("sqs", &["aws_sqs_queue"])
                    .with_secondary(&["aws_sqs_queue", "aws_sqs_queue_policy"]),
            ],
            connections: Vec::new(),
        };

        assert!(config.build_type_index().is_ok());
    }

    #[test]
    fn test_icon_resource_type_is_first_primary() {
        let rule = AggregationRule::new("alb", &["aws_lb", "aws_alb"]);
        assert_eq!(rule.icon_resource_type(), "aws_lb");
    }
}
