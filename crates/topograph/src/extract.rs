//! Relationship extraction.
//!
//! Derives typed edges between declared resources by scanning attribute
//! trees for cross-references. Four passes run in a fixed order, each
//! appending to the output (never reordering earlier results):
//!
//! 1. Direct attribute rules from [`ExtractorConfig::reference_rules`]
//! 2. A catch-all deep scan emitting `references` edges
//! 3. Dead-letter-queue redrive targets
//! 4. Security-group ingress cross-references
//!
//! A reference whose target does not exist in the resource set is silently
//! skipped; cross-module and cross-account references the tool cannot
//! resolve are expected, not errors.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use topograph_core::refscan::{collect_module_refs, collect_ref_tokens, visit_strings};
use topograph_core::{Relationship, Resource};

use crate::config::ExtractorConfig;

/// Relationship kind emitted by the deep scan.
pub const KIND_REFERENCES: &str = "references";
/// Relationship kind emitted for DLQ redrive targets.
pub const KIND_REDRIVES_TO: &str = "redrives_to";
/// Relationship kind emitted for security-group ingress references.
pub const KIND_SG_ALLOWS_FROM: &str = "sg_allows_from";

static DLQ_ARN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"aws_sqs_queue\.(\w+)\.arn").unwrap());
static SG_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\baws_security_group\.(\w+)").unwrap());

type TypeIndex<'a> = IndexMap<&'a str, Vec<&'a Resource>>;

/// Derives [`Relationship`] edges from a resource list.
#[derive(Debug, Clone, Default)]
pub struct RelationshipExtractor {
    config: ExtractorConfig,
}

impl RelationshipExtractor {
    /// Create an extractor with the given rule tables.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract all relationships, in deterministic order.
    pub fn extract(&self, resources: &[Resource]) -> Vec<Relationship> {
        let index = build_type_index(resources);
        let mut relationships = Vec::new();

        for resource in resources {
            self.extract_direct(resource, &index, &mut relationships);
        }

        let mut seen: HashSet<(String, String)> = relationships
            .iter()
            .map(|r| (r.source_id.clone(), r.target_id.clone()))
            .collect();
        for resource in resources {
            self.deep_scan(resource, &index, &mut seen, &mut relationships);
        }

        for resource in resources {
            extract_dlq(resource, &index, &mut relationships);
        }

        for resource in resources {
            extract_security_group(resource, &index, &mut relationships);
        }

        debug!(
            resources = resources.len(),
            relationships = relationships.len();
            "extracted relationships",
        );
        relationships
    }

    /// Pass 1: configured attribute references plus module references.
    fn extract_direct(
        &self,
        resource: &Resource,
        index: &TypeIndex<'_>,
        out: &mut Vec<Relationship>,
    ) {
        let source_id = resource.full_id();
        for rule in &self.config.reference_rules {
            let Some(value) = resource.attr(&rule.attribute) else {
                continue;
            };
            if is_empty_value(value) {
                continue;
            }

            for token in collect_ref_tokens(value) {
                if token.resource_type != rule.target_type {
                    continue;
                }
                if let Some(target) = find_by_name(index, &rule.target_type, &token.name) {
                    out.push(Relationship::new(&source_id, target.full_id(), &rule.kind));
                }
            }

            for module_name in collect_module_refs(value) {
                if let Some(target) = find_in_module(index, &rule.target_type, &module_name) {
                    out.push(Relationship::new(&source_id, target.full_id(), &rule.kind));
                }
            }
        }
    }

    /// Pass 2: catch-all scan for `{type}.{name}.` tokens of any type present
    /// in the resource set, excluding the resource's own type and plumbing
    /// types, deduplicated against everything already found for this source.
    fn deep_scan(
        &self,
        resource: &Resource,
        index: &TypeIndex<'_>,
        seen: &mut HashSet<(String, String)>,
        out: &mut Vec<Relationship>,
    ) {
        let source_id = resource.full_id();
        for value in resource.attributes.values() {
            for token in collect_ref_tokens(value) {
                if token.resource_type == resource.resource_type {
                    continue;
                }
                if self
                    .config
                    .deep_scan_exclusions
                    .iter()
                    .any(|t| *t == token.resource_type)
                {
                    continue;
                }
                let Some(target) = find_by_name(index, &token.resource_type, &token.name) else {
                    continue;
                };
                let pair = (source_id.clone(), target.full_id());
                if seen.insert(pair) {
                    out.push(Relationship::new(
                        &source_id,
                        target.full_id(),
                        KIND_REFERENCES,
                    ));
                }
            }
        }
    }
}

/// Format an ingress rule's port range for a connection label.
pub fn format_port_label(protocol: &str, from_port: Option<i64>, to_port: Option<i64>) -> String {
    if protocol == "-1" {
        return "All Traffic".to_string();
    }
    let proto = protocol.to_ascii_uppercase();
    match (from_port, to_port) {
        (Some(0), Some(65535)) => format!("{proto}/All"),
        (Some(from), Some(to)) if from == to => format!("{proto}/{from}"),
        (Some(from), None) => format!("{proto}/{from}"),
        (Some(from), Some(to)) => format!("{proto}/{from}-{to}"),
        (None, _) => proto,
    }
}

fn build_type_index(resources: &[Resource]) -> TypeIndex<'_> {
    let mut index: TypeIndex<'_> = IndexMap::new();
    for resource in resources {
        index
            .entry(resource.resource_type.as_str())
            .or_default()
            .push(resource);
    }
    index
}

fn find_by_name<'a>(
    index: &TypeIndex<'a>,
    resource_type: &str,
    name: &str,
) -> Option<&'a Resource> {
    index
        .get(resource_type)?
        .iter()
        .find(|r| r.resource_name == name)
        .copied()
}

fn find_in_module<'a>(
    index: &TypeIndex<'a>,
    resource_type: &str,
    module_name: &str,
) -> Option<&'a Resource> {
    index
        .get(resource_type)?
        .iter()
        .find(|r| r.module_path == module_name)
        .copied()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Pass 3: SQS redrive policies pointing at a dead-letter queue.
fn extract_dlq(resource: &Resource, index: &TypeIndex<'_>, out: &mut Vec<Relationship>) {
    if resource.resource_type != "aws_sqs_queue" {
        return;
    }
    let Some(redrive) = resource.attr("redrive_policy") else {
        return;
    };

    let mut dlq_name: Option<String> = None;
    visit_strings(redrive, &mut |s| {
        if dlq_name.is_none() {
            if let Some(captures) = DLQ_ARN_RE.captures(s) {
                dlq_name = Some(captures[1].to_string());
            }
        }
    });

    if let Some(name) = dlq_name {
        if let Some(dlq) = find_by_name(index, "aws_sqs_queue", &name) {
            out.push(
                Relationship::new(resource.full_id(), dlq.full_id(), KIND_REDRIVES_TO)
                    .with_label("DLQ"),
            );
        }
    }
}

/// Pass 4: security-group ingress references, three declaration shapes.
///
/// The emitted edge always points from the referenced (allowed) group to the
/// owning group; self-references are suppressed.
fn extract_security_group(resource: &Resource, index: &TypeIndex<'_>, out: &mut Vec<Relationship>) {
    match resource.resource_type.as_str() {
        "aws_security_group" => {
            let Some(ingress) = resource.attr("ingress") else {
                return;
            };
            for block in iter_blocks(ingress) {
                let label = block_port_label(block, "protocol");
                let Some(referenced) = block.get("security_groups") else {
                    continue;
                };
                for name in collect_sg_names(referenced) {
                    push_sg_edge(index, &name, resource, &label, out);
                }
            }
        }
        "aws_security_group_rule" => {
            if resource.attr_str("type") != Some("ingress") {
                return;
            }
            let label = block_port_label(&resource.attributes, "protocol");
            push_sg_edge_between(
                index,
                resource.attr("source_security_group_id"),
                resource.attr("security_group_id"),
                &label,
                out,
            );
        }
        "aws_vpc_security_group_ingress_rule" => {
            let protocol_key = if resource.attr("ip_protocol").is_some() {
                "ip_protocol"
            } else {
                "protocol"
            };
            let label = block_port_label(&resource.attributes, protocol_key);
            push_sg_edge_between(
                index,
                resource.attr("referenced_security_group_id"),
                resource.attr("security_group_id"),
                &label,
                out,
            );
        }
        _ => {}
    }
}

/// Iterate the object blocks of a value that is either one block or a list
/// of blocks (both shapes occur for inline `ingress` rules).
fn iter_blocks(value: &Value) -> Vec<&serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn block_port_label(block: &serde_json::Map<String, Value>, protocol_key: &str) -> String {
    let protocol = block
        .get(protocol_key)
        .map(value_to_display)
        .unwrap_or_else(|| "tcp".to_string());
    format_port_label(
        &protocol,
        block.get("from_port").and_then(value_as_port),
        block.get("to_port").and_then(value_as_port),
    )
}

fn value_as_port(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn collect_sg_names(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    visit_strings(value, &mut |s| {
        for captures in SG_REF_RE.captures_iter(s) {
            let name = captures[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    });
    names
}

fn push_sg_edge(
    index: &TypeIndex<'_>,
    source_name: &str,
    owner: &Resource,
    label: &str,
    out: &mut Vec<Relationship>,
) {
    let Some(source) = find_by_name(index, "aws_security_group", source_name) else {
        return;
    };
    let source_id = source.full_id();
    let target_id = owner.full_id();
    if source_id == target_id {
        return;
    }
    out.push(Relationship::new(source_id, target_id, KIND_SG_ALLOWS_FROM).with_label(label));
}

fn push_sg_edge_between(
    index: &TypeIndex<'_>,
    source_value: Option<&Value>,
    target_value: Option<&Value>,
    label: &str,
    out: &mut Vec<Relationship>,
) {
    let (Some(source_value), Some(target_value)) = (source_value, target_value) else {
        return;
    };
    let source_name = collect_sg_names(source_value).into_iter().next();
    let target_name = collect_sg_names(target_value).into_iter().next();
    let (Some(source_name), Some(target_name)) = (source_name, target_name) else {
        return;
    };
    let Some(source) = find_by_name(index, "aws_security_group", &source_name) else {
        return;
    };
    let Some(target) = find_by_name(index, "aws_security_group", &target_name) else {
        return;
    };
    if source.full_id() == target.full_id() {
        return;
    }
    out.push(
        Relationship::new(source.full_id(), target.full_id(), KIND_SG_ALLOWS_FROM)
            .with_label(label),
    );
}
