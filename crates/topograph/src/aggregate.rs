//! Resource aggregation.
//!
//! Collapses many low-level declared resources into a handful of
//! [`LogicalService`] nodes according to the configured rule table, and
//! derives [`LogicalConnection`] edges from service-type adjacency.
//!
//! Two aggregation modes exist:
//!
//! - **Grouped** (the default): one service per rule, counting the primary
//!   resources it absorbed (e.g. "24 queues" become one SQS node with
//!   `count = 24`).
//! - **De-grouped** (`in_vpc` rules): one service per primary resource, each
//!   keyed by the resource's `full_id`, so individual load balancers and
//!   instances keep their own node inside the VPC drawing.

use indexmap::{IndexMap, IndexSet};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use topograph_core::resolve::{contains_interpolation, title_case, truncate_name};
use topograph_core::resource::AttrMap;
use topograph_core::{Resource, StateIndex, VariableResolver};

use crate::config::{AggregationConfig, AggregationRule, ConnectionKind};
use crate::error::ConfigError;
use crate::vpc::{VpcStructure, VpcStructureBuilder};

/// Maximum display-name length before truncation.
const MAX_SERVICE_NAME_LEN: usize = 20;

/// Prefix marking an opaque provider-assigned subnet id that needs a later
/// id-to-resource resolution pass against the VPC structure.
pub const STATE_SUBNET_PREFIX: &str = "_state_subnet:";

static SUBNET_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\baws_subnet\.(\w+)").unwrap());

/// Attribute keys that commonly carry subnet references, scanned first.
const SUBNET_ATTR_KEYS: [&str; 4] = ["subnet_id", "subnet_ids", "subnets", "network_configuration"];

/// Live-state keys that carry provider-assigned subnet ids.
const STATE_SUBNET_KEYS: [&str; 3] = ["subnet_id", "subnet_ids", "subnets"];

/// A high-level service aggregating one or more declared resources.
#[derive(Debug, Clone, Serialize)]
pub struct LogicalService<'a> {
    /// Service type from the owning rule, e.g. `alb`.
    pub service_type: String,
    /// Resolved display name.
    pub name: String,
    /// Resource type whose icon represents this service.
    pub icon_resource_type: String,
    /// All resources attached to this service (primary and secondary).
    pub resources: Vec<&'a Resource>,
    /// Number of primary resources this service represents.
    pub count: usize,
    /// Whether the service renders inside the VPC container.
    pub is_vpc_resource: bool,
    /// Subnet references this service deploys into (`aws_subnet.<name>` or
    /// `_state_subnet:<id>` entries).
    pub subnet_ids: Vec<String>,
    /// `full_id` of the underlying resource for de-grouped services.
    pub resource_id: Option<String>,
}

impl LogicalService<'_> {
    /// Globally unique id: the resource id for de-grouped services, else
    /// `{service_type}.{name}`.
    pub fn id(&self) -> String {
        match &self.resource_id {
            Some(resource_id) => resource_id.clone(),
            None => format!("{}.{}", self.service_type, self.name),
        }
    }
}

/// A derived connection between two logical services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalConnection {
    pub source_id: String,
    pub target_id: String,
    pub label: Option<String>,
    pub kind: ConnectionKind,
}

/// Everything the aggregator hands to the layout engine and the renderer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedResult<'a> {
    /// All logical services, in rule-table-then-declaration order.
    pub services: Vec<LogicalService<'a>>,
    /// Derived service-to-service connections.
    pub connections: Vec<LogicalConnection>,
    /// Reconstructed VPC topology, when a VPC resource exists.
    pub vpc_structure: Option<VpcStructure>,
}

impl<'a> AggregatedResult<'a> {
    /// Services that render inside the VPC container.
    pub fn vpc_services(&self) -> impl Iterator<Item = &LogicalService<'a>> {
        self.services.iter().filter(|s| s.is_vpc_resource)
    }

    /// Services that render outside the VPC container.
    pub fn global_services(&self) -> impl Iterator<Item = &LogicalService<'a>> {
        self.services.iter().filter(|s| !s.is_vpc_resource)
    }
}

/// Aggregates declared resources into logical services.
#[derive(Debug, Clone)]
pub struct ResourceAggregator {
    config: AggregationConfig,
    type_index: IndexMap<String, usize>,
}

impl ResourceAggregator {
    /// Create an aggregator, validating the rule table.
    ///
    /// Fails when a resource type is registered under two rules or a rule
    /// declares no primary types; ambiguity is never carried into
    /// aggregation time.
    pub fn new(config: AggregationConfig) -> Result<Self, ConfigError> {
        let type_index = config.build_type_index()?;
        Ok(Self { config, type_index })
    }

    /// Aggregate resources into logical services and connections.
    pub fn aggregate<'a>(
        &self,
        resources: &'a [Resource],
        resolver: Option<&dyn VariableResolver>,
        state: Option<&StateIndex>,
    ) -> AggregatedResult<'a> {
        let mut result = AggregatedResult::default();

        let mut by_rule: IndexMap<usize, Vec<&'a Resource>> = IndexMap::new();
        for resource in resources {
            if let Some(&rule_idx) = self.type_index.get(&resource.resource_type) {
                by_rule.entry(rule_idx).or_default().push(resource);
            }
        }

        for (&rule_idx, members) in &by_rule {
            let rule = &self.config.rules[rule_idx];
            let primary: Vec<&'a Resource> = members
                .iter()
                .filter(|r| rule.primary.contains(&r.resource_type))
                .copied()
                .collect();
            // Secondary-only groups produce no service.
            if primary.is_empty() {
                continue;
            }

            if rule.in_vpc {
                for &resource in &primary {
                    result.services.push(LogicalService {
                        service_type: rule.service_type.clone(),
                        name: display_name(resource, rule, resolver),
                        icon_resource_type: rule.icon_resource_type().to_string(),
                        resources: vec![resource],
                        count: 1,
                        is_vpc_resource: true,
                        subnet_ids: extract_subnet_ids(&[resource], state),
                        resource_id: Some(resource.full_id()),
                    });
                }
            } else {
                result.services.push(LogicalService {
                    service_type: rule.service_type.clone(),
                    name: display_name(primary[0], rule, resolver),
                    icon_resource_type: rule.icon_resource_type().to_string(),
                    resources: members.clone(),
                    count: primary.len(),
                    is_vpc_resource: false,
                    subnet_ids: extract_subnet_ids(members, state),
                    resource_id: None,
                });
            }
        }

        result.connections = self.derive_connections(&result.services);
        result.vpc_structure = VpcStructureBuilder::new().build(resources, resolver, state);

        debug!(
            resources = resources.len(),
            services = result.services.len(),
            connections = result.connections.len(),
            has_vpc = result.vpc_structure.is_some();
            "aggregated resources",
        );
        result
    }

    /// Emit one connection per (source, target) service pair for every rule
    /// whose two service types are both present. A de-grouped side
    /// contributes every one of its services to the cross-product.
    fn derive_connections(&self, services: &[LogicalService<'_>]) -> Vec<LogicalConnection> {
        let mut ids_by_type: IndexMap<&str, Vec<String>> = IndexMap::new();
        for service in services {
            ids_by_type
                .entry(service.service_type.as_str())
                .or_default()
                .push(service.id());
        }

        let mut connections = Vec::new();
        for rule in &self.config.connections {
            let (Some(sources), Some(targets)) = (
                ids_by_type.get(rule.source.as_str()),
                ids_by_type.get(rule.target.as_str()),
            ) else {
                continue;
            };
            for source_id in sources {
                for target_id in targets {
                    connections.push(LogicalConnection {
                        source_id: source_id.clone(),
                        target_id: target_id.clone(),
                        label: rule.label.clone(),
                        kind: rule.kind,
                    });
                }
            }
        }
        connections
    }
}

/// Resolve the display name for a service from its first primary resource.
///
/// Preference order: the `name` attribute when interpolation-free after
/// resolution, then the declared resource name, then the rule's service
/// type. The result is title-cased and truncated.
fn display_name(
    resource: &Resource,
    rule: &AggregationRule,
    resolver: Option<&dyn VariableResolver>,
) -> String {
    let mut name = if resource.resource_name.is_empty() {
        rule.service_type.clone()
    } else {
        resource.resource_name.clone()
    };

    if let Some(attr_name) = resource.attr_str("name") {
        if !attr_name.is_empty() {
            let resolved = match resolver {
                Some(resolver) => resolver.resolve(attr_name),
                None => attr_name.to_string(),
            };
            if !contains_interpolation(&resolved) {
                name = resolved;
            }
        }
    }

    let name = title_case(&name.replace('_', " "));
    truncate_name(&name, MAX_SERVICE_NAME_LEN)
}

/// Extract unique subnet references from resources and their live state.
///
/// Declared references surface as `aws_subnet.<name>`; live-state values are
/// opaque provider ids recorded with [`STATE_SUBNET_PREFIX`] for the VPC
/// builder's resolution pass.
fn extract_subnet_ids(resources: &[&Resource], state: Option<&StateIndex>) -> Vec<String> {
    let mut ids: IndexSet<String> = IndexSet::new();

    for resource in resources {
        if let Some(values) = state.and_then(|s| s.get(&resource.full_id())) {
            for key in STATE_SUBNET_KEYS {
                match values.get(key) {
                    Some(Value::String(id)) => {
                        ids.insert(format!("{STATE_SUBNET_PREFIX}{id}"));
                    }
                    Some(Value::Array(items)) => {
                        for id in items.iter().filter_map(Value::as_str) {
                            ids.insert(format!("{STATE_SUBNET_PREFIX}{id}"));
                        }
                    }
                    _ => {}
                }
            }
        }

        scan_subnet_refs_in_map(&resource.attributes, 0, &mut ids);
    }

    ids.into_iter().collect()
}

fn scan_subnet_refs_in_map(map: &AttrMap, depth: usize, out: &mut IndexSet<String>) {
    if depth > topograph_core::refscan::MAX_SCAN_DEPTH {
        return;
    }
    for key in SUBNET_ATTR_KEYS {
        if let Some(value) = map.get(key) {
            scan_subnet_refs(value, depth + 1, out);
        }
    }
    // Plain strings under other keys are not subnet carriers; only nested
    // containers are followed.
    for value in map.values() {
        if value.is_object() || value.is_array() {
            scan_subnet_refs(value, depth + 1, out);
        }
    }
}

fn scan_subnet_refs(value: &Value, depth: usize, out: &mut IndexSet<String>) {
    if depth > topograph_core::refscan::MAX_SCAN_DEPTH {
        return;
    }
    match value {
        Value::String(s) => {
            for captures in SUBNET_REF_RE.captures_iter(s) {
                out.insert(format!("aws_subnet.{}", &captures[1]));
            }
        }
        Value::Array(items) => {
            for item in items {
                scan_subnet_refs(item, depth + 1, out);
            }
        }
        Value::Object(map) => scan_subnet_refs_in_map(map, depth, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use topograph_core::resolve::MapResolver;

    use super::*;

    fn aggregator() -> ResourceAggregator {
        ResourceAggregator::new(AggregationConfig::aws_defaults()).unwrap()
    }

    #[test]
    fn test_grouped_rule_counts_primary_resources_only() {
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs"),
            Resource::new("aws_sqs_queue", "jobs_dlq"),
            Resource::new("aws_sqs_queue", "events"),
            Resource::new("aws_sqs_queue_policy", "jobs_policy"),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.services.len(), 1);

        let service = &result.services[0];
        assert_eq!(service.service_type, "sqs");
        assert_eq!(service.count, 3);
        assert_eq!(service.resources.len(), 4);
        assert!(!service.is_vpc_resource);
    }

    #[test]
    fn test_secondary_only_group_produces_no_service() {
        let resources = vec![Resource::new("aws_lb_listener", "http")];
        let result = aggregator().aggregate(&resources, None, None);
        assert!(result.services.is_empty());
    }

    #[test]
    fn test_vpc_rule_degroups_per_primary_resource() {
        let resources = vec![
            Resource::new("aws_lb", "app"),
            Resource::new("aws_lb", "internal"),
            Resource::new("aws_lb_listener", "http"),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.services.len(), 2);

        let ids: Vec<String> = result.services.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["aws_lb.app", "aws_lb.internal"]);
        for service in &result.services {
            assert!(service.is_vpc_resource);
            assert_eq!(service.count, 1);
        }
    }

    #[test]
    fn test_connection_cross_product() {
        let resources = vec![
            Resource::new("aws_lb", "app"),
            Resource::new("aws_lb", "internal"),
            Resource::new("aws_ecs_service", "api"),
            Resource::new("aws_ecs_service", "worker"),
            Resource::new("aws_ecs_service", "scheduler"),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        let alb_to_ecs: Vec<&LogicalConnection> = result
            .connections
            .iter()
            .filter(|c| c.source_id.starts_with("aws_lb."))
            .collect();

        // 2 load balancers x 3 services.
        assert_eq!(alb_to_ecs.len(), 6);
    }

    #[test]
    fn test_connection_rule_skipped_when_one_side_absent() {
        let resources = vec![Resource::new("aws_sqs_queue", "jobs")];
        let result = aggregator().aggregate(&resources, None, None);
        assert!(result.connections.is_empty());
    }

    #[test]
    fn test_display_name_prefers_marker_free_attribute() {
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs").with_attr("name", json!("billing-events")),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.services[0].name, "Billing-Events");
    }

    #[test]
    fn test_display_name_falls_back_on_unresolved_marker() {
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs")
                .with_attr("name", json!("${var.prefix}-events")),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.services[0].name, "Jobs");
    }

    #[test]
    fn test_display_name_uses_resolver() {
        let resolver = MapResolver::new().with_variable("prefix", "acme");
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs")
                .with_attr("name", json!("${var.prefix}-events")),
        ];

        let result = aggregator().aggregate(&resources, Some(&resolver), None);
        assert_eq!(result.services[0].name, "Acme-Events");
    }

    #[test]
    fn test_long_display_names_are_truncated() {
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs")
                .with_attr("name", json!("production-api-gateway-event-queue")),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        let name = &result.services[0].name;
        assert_eq!(name.chars().count(), 20);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn test_subnet_ids_from_declared_reference() {
        let resources = vec![
            Resource::new("aws_instance", "web")
                .with_attr("subnet_id", json!("${aws_subnet.public_a.id}")),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.services[0].subnet_ids, vec!["aws_subnet.public_a"]);
    }

    #[test]
    fn test_subnet_ids_from_nested_network_configuration() {
        let resources = vec![Resource::new("aws_ecs_service", "api").with_attr(
            "network_configuration",
            json!({
                "subnets": ["${aws_subnet.private_a.id}", "${aws_subnet.private_b.id}"],
            }),
        )];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(
            result.services[0].subnet_ids,
            vec!["aws_subnet.private_a", "aws_subnet.private_b"]
        );
    }

    #[test]
    fn test_subnet_ids_ignore_strings_under_unrelated_keys() {
        let resources = vec![
            Resource::new("aws_instance", "web")
                .with_attr("user_data", json!("echo aws_subnet.public_a.id")),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert!(result.services[0].subnet_ids.is_empty());
    }

    #[test]
    fn test_subnet_ids_from_live_state() {
        let state: StateIndex = [(
            "aws_lb.app".to_string(),
            [(
                "subnets".to_string(),
                json!(["subnet-0a1b2c", "subnet-3d4e5f"]),
            )]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();

        let resources = vec![Resource::new("aws_lb", "app")];
        let result = aggregator().aggregate(&resources, None, Some(&state));

        assert_eq!(
            result.services[0].subnet_ids,
            vec!["_state_subnet:subnet-0a1b2c", "_state_subnet:subnet-3d4e5f"]
        );
    }

    #[test]
    fn test_vpc_and_global_partitions() {
        let resources = vec![
            Resource::new("aws_lb", "app"),
            Resource::new("aws_sqs_queue", "jobs"),
        ];

        let result = aggregator().aggregate(&resources, None, None);
        assert_eq!(result.vpc_services().count(), 1);
        assert_eq!(result.global_services().count(), 1);
    }
}
