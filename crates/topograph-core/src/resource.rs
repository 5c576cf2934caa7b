//! Declared-resource and relationship records.
//!
//! These are the input contract of the pipeline: the upstream HCL parser
//! produces an ordered list of [`Resource`] records, and the relationship
//! extractor derives an ordered list of [`Relationship`] edges from them.
//! Both are immutable once created.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute tree of a declared resource.
///
/// Attributes are parsed HCL values: nested maps, lists, and scalars. The
/// map is empty (never null) when a resource declares no attributes.
pub type AttrMap = serde_json::Map<String, Value>;

/// A single declared infrastructure resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider resource type, e.g. `aws_subnet`.
    pub resource_type: String,
    /// Declared resource name, e.g. `public_a`.
    pub resource_name: String,
    /// Dotted module path for module-scoped resources, empty at the root.
    #[serde(default)]
    pub module_path: String,
    /// Parsed attribute tree.
    #[serde(default)]
    pub attributes: AttrMap,
    /// The `count` meta-argument when declared as a plain integer.
    #[serde(default)]
    pub count: Option<i64>,
    /// Whether the resource uses the `for_each` meta-argument.
    #[serde(default)]
    pub for_each: bool,
}

impl Resource {
    /// Create a resource with the given type and name and no attributes.
    pub fn new(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            ..Self::default()
        }
    }

    /// Set a single attribute (builder style).
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set the module path (builder style).
    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    /// Set the `count` meta-argument (builder style).
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// Unique identifier: `[module_path.]type.name`.
    pub fn full_id(&self) -> String {
        if self.module_path.is_empty() {
            format!("{}.{}", self.resource_type, self.resource_name)
        } else {
            format!(
                "{}.{}.{}",
                self.module_path, self.resource_type, self.resource_name
            )
        }
    }

    /// Look up an attribute value by key.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Look up a string attribute by key.
    ///
    /// Returns `None` when the attribute is absent or not a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// A directed, typed edge between two resources.
///
/// Multiple edges between the same pair are allowed when their kinds differ.
/// Relationships are appended in extraction order and never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// `full_id` of the referencing resource.
    pub source_id: String,
    /// `full_id` of the referenced resource.
    pub target_id: String,
    /// Relationship kind, e.g. `belongs_to_vpc` or `references`.
    pub kind: String,
    /// Optional display label, e.g. `DLQ` or `TCP/443`.
    pub label: Option<String>,
}

impl Relationship {
    /// Create an unlabeled relationship.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind: kind.into(),
            label: None,
        }
    }

    /// Attach a display label (builder style).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
