//! Error types for pipeline configuration.
//!
//! The inference pipeline itself is infallible by contract: heuristics
//! degrade to `unknown` sentinels and unresolved references are skipped.
//! Only configuration construction can fail.

use thiserror::Error;

/// Errors detected while validating pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A resource type appears in two aggregation rules; ownership would be
    /// ambiguous at aggregation time.
    #[error(
        "resource type `{resource_type}` is registered under both \
         `{first_rule}` and `{second_rule}` aggregation rules"
    )]
    DuplicateTypeRegistration {
        resource_type: String,
        first_rule: String,
        second_rule: String,
    },

    /// An aggregation rule declares no primary resource types, so no
    /// resource could ever create its service.
    #[error("aggregation rule `{0}` declares no primary resource types")]
    EmptyRule(String),
}
