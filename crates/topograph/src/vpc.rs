//! VPC topology reconstruction.
//!
//! Declared infrastructure rarely states its network topology outright; it
//! is implied by naming conventions, attribute values, and (when available)
//! live state. [`VpcStructureBuilder`] reconstructs a best-effort
//! [`VpcStructure`] — availability zones, subnets, endpoints — from those
//! signals. Every heuristic is an ordered fallback chain whose last resort
//! is an explicit `unknown` sentinel; the builder never fails.

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use topograph_core::resolve::contains_interpolation;
use topograph_core::{Resource, StateIndex, VariableResolver};

/// Prefix for availability zones inferred from naming rather than declared.
const DETECTED_PREFIX: &str = "detected-";

const AZ_LETTERS: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// Classified role of a subnet, detected from tags and names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetType {
    Public,
    Private,
    Database,
    #[default]
    Unknown,
}

impl SubnetType {
    /// Keyword lists for classification, checked in declaration order.
    const KEYWORDS: [(SubnetType, &'static [&'static str]); 3] = [
        (
            SubnetType::Public,
            &["public", "pub", "external", "ext", "dmz", "bastion"],
        ),
        (
            SubnetType::Private,
            &[
                "private",
                "priv",
                "internal",
                "int",
                "app",
                "compute",
                "worker",
                "backend",
                "application",
            ],
        ),
        (
            SubnetType::Database,
            &["database", "db", "rds", "data", "storage", "persistence"],
        ),
    ];
}

impl std::fmt::Display for SubnetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubnetType::Public => "public",
            SubnetType::Private => "private",
            SubnetType::Database => "database",
            SubnetType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A subnet within the VPC.
#[derive(Debug, Clone, Serialize)]
pub struct Subnet {
    /// `full_id` of the declaring resource.
    pub resource_id: String,
    /// Resolved display name.
    pub name: String,
    pub subnet_type: SubnetType,
    /// The AZ key this subnet was grouped under.
    pub availability_zone: String,
    pub cidr_block: Option<String>,
    /// Provider-assigned subnet id from live state, when known.
    pub aws_id: Option<String>,
}

/// An availability zone and the subnets grouped into it.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityZone {
    /// Full AZ name, e.g. `us-east-1a` or `detected-a`.
    pub name: String,
    /// Short form used for matching and display, e.g. `1a` or `a`.
    pub short_name: String,
    /// Subnets ordered by type (public, private, database, unknown) then name.
    pub subnets: Vec<Subnet>,
}

/// Whether a VPC endpoint is a route-table gateway or an interface ENI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Gateway,
    Interface,
}

/// A VPC endpoint, collected independently of the AZ structure.
#[derive(Debug, Clone, Serialize)]
pub struct VpcEndpoint {
    pub resource_id: String,
    pub name: String,
    pub kind: EndpointKind,
    /// Short service name, e.g. `s3` or `ecr.api`; `unknown` when unparseable.
    pub service: String,
}

/// The reconstructed VPC topology. At most one per diagram.
#[derive(Debug, Clone, Serialize)]
pub struct VpcStructure {
    /// `full_id` of the VPC resource.
    pub vpc_id: String,
    pub name: String,
    pub availability_zones: Vec<AvailabilityZone>,
    pub endpoints: Vec<VpcEndpoint>,
}

impl VpcStructure {
    /// Map provider-assigned subnet ids to subnet resource ids.
    ///
    /// Resolves the `_state_subnet:<id>` references recorded by the
    /// aggregator back to declared subnets.
    pub fn aws_id_index(&self) -> IndexMap<&str, &str> {
        let mut index = IndexMap::new();
        for az in &self.availability_zones {
            for subnet in &az.subnets {
                if let Some(aws_id) = &subnet.aws_id {
                    index.insert(aws_id.as_str(), subnet.resource_id.as_str());
                }
            }
        }
        index
    }
}

// AZ detection patterns applied to lowercase resource names, in priority
// order: `-a` / `-1a` / `-az1` suffixes, then a letter embedded mid-name.
static AZ_NAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[-_]([a-f])$").unwrap(),
        Regex::new(r"[-_](\d[a-f])$").unwrap(),
        Regex::new(r"[-_]az(\d)$").unwrap(),
        Regex::new(r"[-_]([a-f])[-_]").unwrap(),
    ]
});

// Suffix extraction for AZ grouping: letter-plus-digit beats pure digit
// beats bare letter.
static AZ_SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[-_](\d[a-f])$").unwrap(),
        Regex::new(r"[-_](\d+)$").unwrap(),
        Regex::new(r"[-_]([a-f])$").unwrap(),
    ]
});

static AZ_SHORT_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d[a-z])$").unwrap());

/// Builds an optional [`VpcStructure`] from a resource list.
#[derive(Debug, Clone, Default)]
pub struct VpcStructureBuilder;

impl VpcStructureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the VPC topology, or `None` when no VPC resource exists.
    pub fn build(
        &self,
        resources: &[Resource],
        resolver: Option<&dyn VariableResolver>,
        state: Option<&StateIndex>,
    ) -> Option<VpcStructure> {
        let vpc_resource = resources.iter().find(|r| r.resource_type == "aws_vpc")?;
        let vpc_name = resolved_name(vpc_resource, resolver);

        // First pass: classify every subnet and determine its AZ key.
        let subnet_resources: Vec<&Resource> = resources
            .iter()
            .filter(|r| r.resource_type == "aws_subnet")
            .collect();

        let mut classified: Vec<(Subnet, Option<String>)> = Vec::new();
        let mut explicit_azs: Vec<String> = Vec::new();

        for resource in &subnet_resources {
            let full_id = resource.full_id();

            let explicit_az = state
                .and_then(|s| s.get_str(&full_id, "availability_zone"))
                .map(str::to_string)
                .or_else(|| detect_availability_zone(resource));

            let suffix = extract_az_suffix(&resource.resource_name);

            let az_key = match explicit_az {
                Some(az) if !az.starts_with(DETECTED_PREFIX) => {
                    if !explicit_azs.contains(&az) {
                        explicit_azs.push(az.clone());
                    }
                    Some(az)
                }
                _ => suffix.map(|s| format!("{DETECTED_PREFIX}{s}")),
            };

            let subnet = Subnet {
                resource_id: full_id.clone(),
                name: resolved_name(resource, resolver),
                subnet_type: detect_subnet_type(resource),
                availability_zone: az_key.clone().unwrap_or_else(|| "unknown".to_string()),
                cidr_block: resource.attr_str("cidr_block").map(str::to_string),
                aws_id: state
                    .and_then(|s| s.get_str(&full_id, "id"))
                    .map(str::to_string),
            };
            classified.push((subnet, az_key));
        }

        // Second pass: the AZ list. Explicit declarations are authoritative;
        // otherwise synthesize from counts and detected suffixes.
        let az_names = if explicit_azs.is_empty() {
            let count = detected_az_count(&subnet_resources, &classified);
            (0..count)
                .map(|i| format!("{DETECTED_PREFIX}{}", AZ_LETTERS[i % AZ_LETTERS.len()]))
                .collect()
        } else {
            explicit_azs.sort();
            explicit_azs
        };

        let mut availability_zones: Vec<AvailabilityZone> = az_names
            .iter()
            .map(|name| AvailabilityZone {
                name: name.clone(),
                short_name: az_short_name(name),
                subnets: Vec::new(),
            })
            .collect();

        distribute_subnets(classified, &mut availability_zones);

        let endpoints = collect_endpoints(resources, resolver);

        debug!(
            vpc = vpc_name.as_str(),
            azs = availability_zones.len(),
            endpoints = endpoints.len();
            "built VPC structure",
        );

        Some(VpcStructure {
            vpc_id: vpc_resource.full_id(),
            name: vpc_name,
            availability_zones,
            endpoints,
        })
    }
}

/// `name` attribute resolved through the resolver, else the declared name.
fn resolved_name(resource: &Resource, resolver: Option<&dyn VariableResolver>) -> String {
    let name = resource
        .attr_str("name")
        .filter(|s| !s.is_empty())
        .unwrap_or(&resource.resource_name);
    match resolver {
        Some(resolver) => resolver.resolve(name),
        None => name.to_string(),
    }
}

/// Detect an AZ from the explicit attribute or name patterns.
///
/// Returns the attribute value when interpolation-free, else a
/// `detected-<suffix>` key from the name-pattern ladder, else `None`.
fn detect_availability_zone(resource: &Resource) -> Option<String> {
    if let Some(az) = resource.attr_str("availability_zone") {
        if !az.is_empty() && !contains_interpolation(az) {
            return Some(az.to_string());
        }
    }

    let name = resource
        .attr_str("name")
        .filter(|s| !s.is_empty())
        .unwrap_or(&resource.resource_name)
        .to_lowercase();

    for pattern in AZ_NAME_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(&name) {
            return Some(format!("{DETECTED_PREFIX}{}", &captures[1]));
        }
    }
    None
}

/// Extract the AZ-indicating suffix of a declared subnet name.
///
/// `public-subnet-1` yields `1`, `compute_subnet_a` yields `a`,
/// `database_subnet_1a` yields `1a`, `my-private-subnet` yields nothing.
fn extract_az_suffix(resource_name: &str) -> Option<String> {
    let name = resource_name.to_lowercase();
    for pattern in AZ_SUFFIX_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(&name) {
            return Some(captures[1].to_string());
        }
    }
    None
}

/// Classify a subnet from tags first, then name substrings.
fn detect_subnet_type(resource: &Resource) -> SubnetType {
    // Tag values must match a keyword exactly.
    if let Some(tags) = resource.attr("tags").and_then(|v| v.as_object()) {
        let type_tag = tags
            .get("Type")
            .or_else(|| tags.get("type"))
            .and_then(|v| v.as_str());
        if let Some(tag) = type_tag {
            let tag = tag.to_lowercase();
            for (subnet_type, keywords) in SubnetType::KEYWORDS {
                if keywords.contains(&tag.as_str()) {
                    return subnet_type;
                }
            }
        }
    }

    // Names match on substrings.
    let candidates = [
        Some(resource.resource_name.as_str()),
        resource.attr_str("name"),
    ];
    for name in candidates.into_iter().flatten() {
        let name = name.to_lowercase();
        for (subnet_type, keywords) in SubnetType::KEYWORDS {
            if keywords.iter().any(|k| name.contains(k)) {
                return subnet_type;
            }
        }
    }

    SubnetType::Unknown
}

/// Short display form of an AZ name: `us-east-1a` → `1a`, `detected-a` → `a`.
fn az_short_name(az_name: &str) -> String {
    if let Some(stripped) = az_name.strip_prefix(DETECTED_PREFIX) {
        return stripped.to_string();
    }
    if let Some(captures) = AZ_SHORT_NAME_RE.captures(az_name) {
        return captures[1].to_string();
    }
    if az_name.ends_with(|c: char| c.is_ascii_alphabetic()) && !az_name.is_empty() {
        return az_name.chars().last().map(String::from).unwrap_or_default();
    }
    az_name.to_string()
}

/// Number of AZs to synthesize when none are declared: the largest `count`
/// meta-argument, else the number of distinct detected keys, else the
/// largest per-type subnet count.
fn detected_az_count(
    subnet_resources: &[&Resource],
    classified: &[(Subnet, Option<String>)],
) -> usize {
    let mut count = 1usize;
    for resource in subnet_resources {
        if let Some(declared) = resource.count {
            if declared > count as i64 {
                count = declared as usize;
            }
        }
    }
    if count > 1 {
        return count;
    }

    let detected: Vec<&str> = {
        let mut keys: Vec<&str> = classified
            .iter()
            .filter_map(|(_, az_key)| az_key.as_deref())
            .filter(|k| k.starts_with(DETECTED_PREFIX))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    };
    if !detected.is_empty() {
        return detected.len();
    }

    let mut type_counts: IndexMap<SubnetType, usize> = IndexMap::new();
    for (subnet, _) in classified {
        *type_counts.entry(subnet.subnet_type).or_default() += 1;
    }
    type_counts.values().copied().max().unwrap_or(1)
}

/// Distribute classified subnets into the AZ list.
///
/// Exact key matches first, then detected-suffix matches against AZ short
/// names, then round-robin by subnet type with `(a)`, `(b)` display
/// disambiguation when a type has several unassigned members.
fn distribute_subnets(
    classified: Vec<(Subnet, Option<String>)>,
    availability_zones: &mut [AvailabilityZone],
) {
    let mut ordered = classified;
    ordered.sort_by(|(a, _), (b, _)| {
        a.subnet_type
            .cmp(&b.subnet_type)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut unassigned: Vec<Subnet> = Vec::new();

    for (subnet, az_key) in ordered {
        let Some(az_key) = az_key else {
            unassigned.push(subnet);
            continue;
        };

        if let Some(az) = availability_zones.iter_mut().find(|az| az.name == az_key) {
            az.subnets.push(subnet);
            continue;
        }

        if let Some(suffix) = az_key.strip_prefix(DETECTED_PREFIX) {
            let matched = availability_zones
                .iter_mut()
                .find(|az| az.short_name == suffix || az.short_name.contains(suffix));
            if let Some(az) = matched {
                az.subnets.push(subnet);
                continue;
            }
        }
        unassigned.push(subnet);
    }

    if unassigned.is_empty() || availability_zones.is_empty() {
        return;
    }

    let mut by_type: IndexMap<SubnetType, Vec<Subnet>> = IndexMap::new();
    for subnet in unassigned {
        by_type.entry(subnet.subnet_type).or_default().push(subnet);
    }
    by_type.sort_keys();

    for (_, members) in by_type {
        let disambiguate = members.len() > 1;
        for (idx, mut subnet) in members.into_iter().enumerate() {
            let az_idx = idx % availability_zones.len();
            if disambiguate {
                subnet.name = format!(
                    "{} ({})",
                    subnet.name,
                    AZ_LETTERS[az_idx % AZ_LETTERS.len()]
                );
            }
            availability_zones[az_idx].subnets.push(subnet);
        }
    }
}

/// Collect VPC endpoints, independently of the AZ structure.
fn collect_endpoints(
    resources: &[Resource],
    resolver: Option<&dyn VariableResolver>,
) -> Vec<VpcEndpoint> {
    resources
        .iter()
        .filter(|r| r.resource_type == "aws_vpc_endpoint")
        .map(|resource| VpcEndpoint {
            resource_id: resource.full_id(),
            name: resolved_name(resource, resolver),
            kind: detect_endpoint_kind(resource),
            service: detect_endpoint_service(resource),
        })
        .collect()
}

fn detect_endpoint_kind(resource: &Resource) -> EndpointKind {
    match resource.attr_str("vpc_endpoint_type") {
        Some(t) if t.eq_ignore_ascii_case("gateway") => EndpointKind::Gateway,
        _ => EndpointKind::Interface,
    }
}

/// Parse the short service name out of `com.amazonaws.<region>.<service>`.
///
/// Everything after the region segment is kept, so dotted services like
/// `ecr.api` survive. When the region is an unresolved interpolation, the
/// segments after the marker are used instead. Unparseable names yield
/// `unknown`.
fn detect_endpoint_service(resource: &Resource) -> String {
    let Some(service_name) = resource.attr_str("service_name") else {
        return "unknown".to_string();
    };

    if contains_interpolation(service_name) {
        // Segments before (and inside) the marker are prefix; the service is
        // whatever follows the last marker segment.
        let mut past_marker = false;
        let mut tail: Vec<&str> = Vec::new();
        for part in service_name.split('.') {
            if part.contains("${") || part.contains('}') {
                past_marker = true;
                tail.clear();
            } else if past_marker {
                tail.push(part);
            }
        }
        if !tail.is_empty() {
            return tail.join(".");
        }
        return "unknown".to_string();
    }

    let parts: Vec<&str> = service_name.split('.').collect();
    if parts.len() >= 4 {
        return parts[3..].join(".");
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use topograph_core::resolve::MapResolver;

    use super::*;

    fn subnet(name: &str) -> Resource {
        Resource::new("aws_subnet", name)
    }

    fn build(resources: &[Resource]) -> Option<VpcStructure> {
        VpcStructureBuilder::new().build(resources, None, None)
    }

    #[test]
    fn test_no_vpc_resource_yields_none() {
        let resources = vec![subnet("public_a")];
        assert!(build(&resources).is_none());
    }

    #[test]
    fn test_explicit_azs_are_authoritative_and_sorted() {
        let resources = vec![
            Resource::new("aws_vpc", "main"),
            subnet("private_b").with_attr("availability_zone", json!("us-east-1b")),
            subnet("public_a").with_attr("availability_zone", json!("us-east-1a")),
        ];

        let vpc = build(&resources).unwrap();
        let names: Vec<&str> = vpc
            .availability_zones
            .iter()
            .map(|az| az.name.as_str())
            .collect();
        assert_eq!(names, vec!["us-east-1a", "us-east-1b"]);
        assert_eq!(vpc.availability_zones[0].subnets[0].resource_id, "aws_subnet.public_a");
        assert_eq!(vpc.availability_zones[1].subnets[0].resource_id, "aws_subnet.private_b");
    }

    #[test]
    fn test_unresolved_az_attribute_falls_back_to_name_detection() {
        let resource = subnet("public_a")
            .with_attr("availability_zone", json!("${var.azs[0]}"))
            .with_attr("name", json!("prod-public-a"));

        assert_eq!(
            detect_availability_zone(&resource),
            Some("detected-a".to_string())
        );
    }

    #[test]
    fn test_az_suffix_priority() {
        assert_eq!(extract_az_suffix("database_subnet_1a"), Some("1a".to_string()));
        assert_eq!(extract_az_suffix("public-subnet-1"), Some("1".to_string()));
        assert_eq!(extract_az_suffix("compute_subnet_a"), Some("a".to_string()));
        assert_eq!(extract_az_suffix("my-private-subnet"), None);
    }

    #[test]
    fn test_az_distribution_stability() {
        // Six subnets named by type and index, no explicit AZ attributes:
        // two AZs, each holding one subnet of each type.
        let resources = vec![
            Resource::new("aws_vpc", "main"),
            subnet("public-1"),
            subnet("private-1"),
            subnet("database-1"),
            subnet("public-2"),
            subnet("private-2"),
            subnet("database-2"),
        ];

        let vpc = build(&resources).unwrap();
        assert_eq!(vpc.availability_zones.len(), 2);

        for az in &vpc.availability_zones {
            assert_eq!(az.subnets.len(), 3);
            let types: Vec<SubnetType> = az.subnets.iter().map(|s| s.subnet_type).collect();
            assert_eq!(
                types,
                vec![SubnetType::Public, SubnetType::Private, SubnetType::Database]
            );
        }
    }

    #[test]
    fn test_round_robin_disambiguates_display_names() {
        let resources = vec![
            Resource::new("aws_vpc", "main"),
            subnet("app").with_attr("availability_zone", json!("us-east-1a")),
            subnet("cache-x"),
            subnet("cache-y"),
        ];

        let vpc = build(&resources).unwrap();
        // Both unknown-AZ subnets are private ("cache" has no keyword; they
        // are Unknown type) and land round-robin with suffixes.
        let mut names: Vec<String> = vpc
            .availability_zones
            .iter()
            .flat_map(|az| az.subnets.iter().map(|s| s.name.clone()))
            .collect();
        names.sort();
        assert!(names.contains(&"cache-x (a)".to_string()));
    }

    #[test]
    fn test_subnet_type_from_tags_beats_name() {
        let resource = subnet("misc_a")
            .with_attr("tags", json!({"Type": "public"}))
            .with_attr("name", json!("database-a"));

        assert_eq!(detect_subnet_type(&resource), SubnetType::Public);
    }

    #[test]
    fn test_subnet_type_from_name_substring() {
        assert_eq!(detect_subnet_type(&subnet("app_subnet_a")), SubnetType::Private);
        assert_eq!(detect_subnet_type(&subnet("rds-a")), SubnetType::Database);
        assert_eq!(detect_subnet_type(&subnet("dmz_1")), SubnetType::Public);
        assert_eq!(detect_subnet_type(&subnet("subnet_one")), SubnetType::Unknown);
    }

    #[test]
    fn test_state_az_preferred_over_declared() {
        let state: StateIndex = [(
            "aws_subnet.public_a".to_string(),
            [("availability_zone".to_string(), json!("eu-west-1a"))]
                .into_iter()
                .collect(),
        )]
        .into_iter()
        .collect();

        let resources = vec![
            Resource::new("aws_vpc", "main"),
            subnet("public_a").with_attr("availability_zone", json!("us-east-1a")),
        ];

        let vpc = VpcStructureBuilder::new()
            .build(&resources, None, Some(&state))
            .unwrap();
        assert_eq!(vpc.availability_zones[0].name, "eu-west-1a");
    }

    #[test]
    fn test_aws_id_index_from_state() {
        let state: StateIndex = [(
            "aws_subnet.public_a".to_string(),
            [
                ("id".to_string(), json!("subnet-0a1b2c")),
                ("availability_zone".to_string(), json!("us-east-1a")),
            ]
            .into_iter()
            .collect(),
        )]
        .into_iter()
        .collect();

        let resources = vec![Resource::new("aws_vpc", "main"), subnet("public_a")];
        let vpc = VpcStructureBuilder::new()
            .build(&resources, None, Some(&state))
            .unwrap();

        assert_eq!(
            vpc.aws_id_index().get("subnet-0a1b2c"),
            Some(&"aws_subnet.public_a")
        );
    }

    #[test]
    fn test_az_short_names() {
        assert_eq!(az_short_name("us-east-1a"), "1a");
        assert_eq!(az_short_name("detected-2b"), "2b");
        assert_eq!(az_short_name("detected-a"), "a");
        assert_eq!(az_short_name("zone-b"), "b");
    }

    #[test]
    fn test_endpoint_kind_detection() {
        let gateway = Resource::new("aws_vpc_endpoint", "s3")
            .with_attr("vpc_endpoint_type", json!("Gateway"));
        let interface = Resource::new("aws_vpc_endpoint", "ecr");

        assert_eq!(detect_endpoint_kind(&gateway), EndpointKind::Gateway);
        assert_eq!(detect_endpoint_kind(&interface), EndpointKind::Interface);
    }

    #[test]
    fn test_endpoint_service_parsing() {
        let plain = Resource::new("aws_vpc_endpoint", "s3")
            .with_attr("service_name", json!("com.amazonaws.us-east-1.s3"));
        let dotted = Resource::new("aws_vpc_endpoint", "ecr")
            .with_attr("service_name", json!("com.amazonaws.us-east-1.ecr.api"));
        let interpolated = Resource::new("aws_vpc_endpoint", "dynamo")
            .with_attr("service_name", json!("com.amazonaws.${var.region}.dynamodb"));
        let unparseable = Resource::new("aws_vpc_endpoint", "odd")
            .with_attr("service_name", json!("s3-direct"));

        assert_eq!(detect_endpoint_service(&plain), "s3");
        assert_eq!(detect_endpoint_service(&dotted), "ecr.api");
        assert_eq!(detect_endpoint_service(&interpolated), "dynamodb");
        assert_eq!(detect_endpoint_service(&unparseable), "unknown");
    }

    #[test]
    fn test_names_run_through_resolver() {
        let resolver = MapResolver::new().with_variable("env", "prod");
        let resources = vec![
            Resource::new("aws_vpc", "main").with_attr("name", json!("${var.env}-vpc")),
        ];

        let vpc = VpcStructureBuilder::new()
            .build(&resources, Some(&resolver), None)
            .unwrap();
        assert_eq!(vpc.name, "prod-vpc");
    }

    #[test]
    fn test_synthesized_az_count_from_count_meta() {
        let resources = vec![
            Resource::new("aws_vpc", "main"),
            subnet("public").with_count(3),
        ];

        let vpc = build(&resources).unwrap();
        assert_eq!(vpc.availability_zones.len(), 3);
        let shorts: Vec<&str> = vpc
            .availability_zones
            .iter()
            .map(|az| az.short_name.as_str())
            .collect();
        assert_eq!(shorts, vec!["a", "b", "c"]);
    }
}
