//! Structural reference scanning over attribute trees.
//!
//! Cross-resource references in declared attributes appear as textual tokens
//! like `aws_subnet.public_a.id` or `module.network.vpc_id` embedded in
//! string values, often nested several levels deep inside maps and lists.
//! This module walks the parsed attribute tree with a depth cap and applies
//! regular expressions only to string leaf values, so incidental substring
//! matches in stringified containers cannot produce false positives and deep
//! nesting cannot blow up scan time.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Maximum recursion depth when walking an attribute tree.
pub const MAX_SCAN_DEPTH: usize = 5;

/// A `{type}.{name}` token found in a string leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefToken {
    /// Referenced resource type, e.g. `aws_vpc`.
    pub resource_type: String,
    /// Referenced resource name, e.g. `main`.
    pub name: String,
}

// `{type}.{name}.` with a trailing dot: references always address an
// attribute of the target (`.id`, `.arn`, ...).
static REF_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-z][a-z0-9_]*)\.(\w+)\.").unwrap());

static MODULE_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmodule\.(\w+)\.").unwrap());

/// Visit every string leaf reachable from `value` within [`MAX_SCAN_DEPTH`].
pub fn visit_strings<F>(value: &Value, f: &mut F)
where
    F: FnMut(&str),
{
    visit_strings_at(value, 0, f);
}

fn visit_strings_at<F>(value: &Value, depth: usize, f: &mut F)
where
    F: FnMut(&str),
{
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => {
            for item in items {
                visit_strings_at(item, depth + 1, f);
            }
        }
        Value::Object(map) => {
            for nested in map.values() {
                visit_strings_at(nested, depth + 1, f);
            }
        }
        _ => {}
    }
}

/// Collect all `{type}.{name}.` tokens reachable from `value`.
///
/// Tokens are deduplicated and returned in first-seen order. The `module.`
/// namespace is excluded; use [`collect_module_refs`] for it.
pub fn collect_ref_tokens(value: &Value) -> Vec<RefToken> {
    let mut seen: IndexSet<RefToken> = IndexSet::new();
    visit_strings(value, &mut |s| {
        for captures in REF_TOKEN_RE.captures_iter(s) {
            let resource_type = &captures[1];
            if resource_type == "module" || resource_type == "var" || resource_type == "local" {
                continue;
            }
            seen.insert(RefToken {
                resource_type: resource_type.to_string(),
                name: captures[2].to_string(),
            });
        }
    });
    seen.into_iter().collect()
}

/// Collect the names of `{target_type}.{name}.` tokens reachable from `value`.
pub fn collect_typed_refs(value: &Value, target_type: &str) -> Vec<String> {
    collect_ref_tokens(value)
        .into_iter()
        .filter(|token| token.resource_type == target_type)
        .map(|token| token.name)
        .collect()
}

/// Collect referenced module names (`module.{name}.` tokens) from `value`.
pub fn collect_module_refs(value: &Value) -> Vec<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    visit_strings(value, &mut |s| {
        for captures in MODULE_REF_RE.captures_iter(s) {
            seen.insert(captures[1].to_string());
        }
    });
    seen.into_iter().collect()
}
