//! Topograph: layered architecture diagrams inferred from
//! infrastructure-as-code declarations.
//!
//! The crate is the middle of a three-stage toolchain. An upstream parser
//! turns source files into an ordered [`Resource`](topograph_core::Resource)
//! list; this crate infers the diagram model and its geometry; a downstream
//! renderer serializes the result. The inference pipeline runs in
//! dependency order:
//!
//! 1. [`extract`] — typed relationships from attribute cross-references
//! 2. [`aggregate`] — logical services and connections from the rule tables
//! 3. [`vpc`] — AZ/subnet/endpoint topology from naming heuristics
//! 4. [`layout`] — deterministic pixel geometry sized to content
//!
//! The whole pipeline is a synchronous pure function of its inputs: no
//! I/O, no ambient configuration, no mutation of the input resources.
//! Heuristics degrade to explicit `unknown` sentinels, and unresolvable
//! references are skipped; only configuration construction can fail.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod summary;
pub mod vpc;

use log::info;
use topograph_core::{Relationship, Resource, StateIndex, VariableResolver};

pub use aggregate::{AggregatedResult, LogicalConnection, LogicalService, ResourceAggregator};
pub use config::{AggregationConfig, ConnectionKind, ExtractorConfig};
pub use error::ConfigError;
pub use extract::RelationshipExtractor;
pub use layout::{Layout, LayoutConfig, LayoutEngine};
pub use vpc::{VpcStructure, VpcStructureBuilder};

/// Everything inferred for one diagram.
#[derive(Debug, Clone)]
pub struct Diagram<'a> {
    /// Typed resource-to-resource edges, in extraction order.
    pub relationships: Vec<Relationship>,
    /// Logical services, connections, and the optional VPC topology.
    pub aggregated: AggregatedResult<'a>,
    /// Geometry for every placed entity plus canvas sizing.
    pub layout: Layout,
}

/// The full inference pipeline with its configuration bound at
/// construction.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: RelationshipExtractor,
    aggregator: ResourceAggregator,
    layout_engine: LayoutEngine,
}

impl Pipeline {
    /// Pipeline with the built-in AWS rule tables and default layout.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config(
            ExtractorConfig::aws_defaults(),
            AggregationConfig::aws_defaults(),
            LayoutConfig::default(),
        )
    }

    /// Pipeline with explicit configuration, validated here.
    pub fn with_config(
        extractor: ExtractorConfig,
        aggregation: AggregationConfig,
        layout: LayoutConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            extractor: RelationshipExtractor::new(extractor),
            aggregator: ResourceAggregator::new(aggregation)?,
            layout_engine: LayoutEngine::with_config(layout),
        })
    }

    /// Run extraction, aggregation, and layout over a resource list.
    pub fn run<'a>(
        &self,
        resources: &'a [Resource],
        resolver: Option<&dyn VariableResolver>,
        state: Option<&StateIndex>,
    ) -> Diagram<'a> {
        info!(resources = resources.len(); "running inference pipeline");

        let relationships = self.extractor.extract(resources);
        let aggregated = self.aggregator.aggregate(resources, resolver, state);
        let layout = self.layout_engine.compute_layout(&aggregated);

        info!(
            services = aggregated.services.len(),
            relationships = relationships.len(),
            entities = layout.positions.len();
            "pipeline complete",
        );

        Diagram {
            relationships,
            aggregated,
            layout,
        }
    }
}
