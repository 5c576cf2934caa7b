//! Live-state value index.
//!
//! The optional live-state collaborator exposes, per deployed resource
//! address, a flat map of provider-assigned values (real subnet identifiers,
//! resolved availability zones, ...). Addresses use the deployment tool's
//! format — `module.vpc.aws_subnet.public[0]` — while the pipeline keys
//! resources by `full_id` — `vpc.aws_subnet.public`. [`StateIndex`]
//! normalizes addresses on insertion so lookups by `full_id` just work.
//!
//! Absence of live state is a fully supported mode: every consumer takes
//! `Option<&StateIndex>`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::resource::AttrMap;

static INDEX_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\[(\d+|"[^"]*")\]"#).unwrap());

/// Provider-assigned values keyed by normalized resource id.
///
/// When the same base address appears multiple times (indexed instances of a
/// counted resource), the first instance wins; per-instance differences are
/// not meaningful to a best-effort diagram.
#[derive(Debug, Clone, Default)]
pub struct StateIndex {
    values: IndexMap<String, AttrMap>,
}

impl StateIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the values for one deployed resource address.
    pub fn insert(&mut self, address: &str, values: AttrMap) {
        let id = normalize_address(address);
        self.values.entry(id).or_insert(values);
    }

    /// Look up values by a resource's `full_id`.
    pub fn get(&self, full_id: &str) -> Option<&AttrMap> {
        self.values.get(full_id)
    }

    /// Look up a single string value for a resource.
    pub fn get_str(&self, full_id: &str, key: &str) -> Option<&str> {
        self.get(full_id)?.get(key).and_then(Value::as_str)
    }

    /// Number of indexed resources.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the index holds no resources.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, AttrMap)> for StateIndex {
    fn from_iter<I: IntoIterator<Item = (String, AttrMap)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (address, values) in iter {
            index.insert(&address, values);
        }
        index
    }
}

/// Normalize a deployed-resource address to the pipeline's `full_id` format.
///
/// Index brackets are stripped and `module.` prefixes are collapsed:
/// `module.vpc.aws_subnet.public[0]` becomes `vpc.aws_subnet.public`.
pub fn normalize_address(address: &str) -> String {
    let address = INDEX_SUFFIX_RE.replace_all(address, "");

    if !address.starts_with("module.") {
        return address.into_owned();
    }

    let parts: Vec<&str> = address.split('.').collect();
    let mut module_parts: Vec<&str> = Vec::new();
    let mut resource_parts: &[&str] = &[];

    let mut i = 0;
    while i < parts.len() {
        if parts[i] == "module" && i + 1 < parts.len() {
            module_parts.push(parts[i + 1]);
            i += 2;
        } else {
            resource_parts = &parts[i..];
            break;
        }
    }

    if module_parts.is_empty() || resource_parts.is_empty() {
        return address.into_owned();
    }
    format!("{}.{}", module_parts.join("."), resource_parts.join("."))
}
