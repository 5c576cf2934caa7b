//! Layout engine.
//!
//! Assigns non-overlapping pixel geometry to every diagram entity. The
//! engine is a pure function of `(AggregatedResult, LayoutConfig)`:
//! identical inputs produce byte-identical positions, groups, and canvas
//! sizing.
//!
//! Layout structure, top to bottom:
//! - edge services (internet-facing) as a centered row,
//! - the VPC container with a top service row, AZ columns holding subnet
//!   boxes, and an endpoint column on the right,
//! - all remaining services on a connection-aware organic grid.
//!
//! Every dimension flows through one [`sizing::Sizing`] table computed from
//! the responsively scaled configuration, and the canvas height required by
//! the content is estimated from the same table before placement begins.

pub mod categories;
mod organic;
pub mod path;
pub(crate) mod sizing;
mod vpc_area;

use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use topograph_core::Position;

use crate::aggregate::{AggregatedResult, LogicalService, STATE_SUBNET_PREFIX};
use crate::layout::categories::{categorize, ServiceCategory};
use crate::layout::sizing::Sizing;
use crate::vpc::VpcStructure;

pub use path::connection_path;

/// Base layout dimensions and responsive-scaling bounds.
///
/// All size fields are base values: the engine multiplies them by a single
/// content-derived scale factor (clamped to `[min_scale, max_scale]`)
/// before use, so proportions between elements are always preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub padding: f32,
    pub icon_size: f32,
    pub icon_spacing: f32,
    pub group_padding: f32,
    pub label_height: f32,
    pub row_spacing: f32,
    pub column_spacing: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1400.0,
            canvas_height: 900.0,
            padding: 30.0,
            icon_size: 64.0,
            icon_spacing: 40.0,
            group_padding: 25.0,
            label_height: 24.0,
            row_spacing: 100.0,
            column_spacing: 130.0,
            min_scale: 0.6,
            max_scale: 1.5,
        }
    }
}

impl LayoutConfig {
    /// Clamp a raw scale factor into the configured range.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// A copy of this configuration with all dimensions scaled.
    pub fn scaled(&self, scale: f32) -> Self {
        let k = self.clamp_scale(scale);
        Self {
            canvas_width: self.canvas_width * k,
            canvas_height: self.canvas_height * k,
            padding: self.padding * k,
            icon_size: self.icon_size * k,
            icon_spacing: self.icon_spacing * k,
            group_padding: self.group_padding * k,
            label_height: self.label_height * k,
            row_spacing: self.row_spacing * k,
            column_spacing: self.column_spacing * k,
            min_scale: self.min_scale,
            max_scale: self.max_scale,
        }
    }
}

/// Kind of a visual container group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    AwsCloud,
    Vpc,
    Az,
}

/// A purely visual container: the cloud frame, the VPC box, or an AZ box.
///
/// Groups are ordered by creation: the cloud frame first, then the VPC,
/// then one group per AZ.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceGroup {
    pub kind: GroupKind,
    pub name: String,
    /// Ids of the services rendered inside this container.
    pub service_ids: Vec<String>,
    pub position: Position,
}

/// The layout engine's output for one diagram.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Geometry per entity id (service, subnet, or endpoint).
    pub positions: IndexMap<String, Position>,
    /// Visual container groups in render order.
    pub groups: Vec<ServiceGroup>,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

/// Computes positions for all diagram elements.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    base: LayoutConfig,
}

impl LayoutEngine {
    /// Engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom base configuration.
    pub fn with_config(base: LayoutConfig) -> Self {
        Self { base }
    }

    /// Compute positions, groups, and canvas sizing for an aggregated
    /// result. Deterministic for identical inputs.
    pub fn compute_layout(&self, aggregated: &AggregatedResult<'_>) -> Layout {
        let scale = responsive_scale(aggregated);
        let s = Sizing::new(&self.base, scale);

        // Categorize services into their fixed bands.
        let mut edge: Vec<&LogicalService<'_>> = Vec::new();
        let mut vpc_band: Vec<&LogicalService<'_>> = Vec::new();
        let mut data: Vec<&LogicalService<'_>> = Vec::new();
        let mut messaging: Vec<&LogicalService<'_>> = Vec::new();
        let mut security: Vec<&LogicalService<'_>> = Vec::new();
        let mut other: Vec<&LogicalService<'_>> = Vec::new();

        for service in &aggregated.services {
            match categorize(&service.service_type) {
                ServiceCategory::Edge => edge.push(service),
                ServiceCategory::Vpc => vpc_band.push(service),
                ServiceCategory::Data => data.push(service),
                ServiceCategory::Messaging => messaging.push(service),
                ServiceCategory::Security => security.push(service),
                ServiceCategory::Other => other.push(service),
            }
        }

        // The VPC node itself is a container, not a placed icon.
        let vpc_internal: Vec<&LogicalService<'_>> = vpc_band
            .into_iter()
            .filter(|service| service.service_type != "vpc")
            .collect();

        // Resolve subnet references once; height estimation and placement
        // both consume the resolved mapping.
        let resolved =
            resolve_service_subnets(&vpc_internal, aggregated.vpc_structure.as_ref());
        let (with_subnets, without_subnets): (
            Vec<&&LogicalService<'_>>,
            Vec<&&LogicalService<'_>>,
        ) = vpc_internal
            .iter()
            .partition(|service| resolved.contains_key::<String>(&service.id()));

        let mut services_by_subnet: IndexMap<String, Vec<String>> = IndexMap::new();
        for service in &with_subnets {
            let id = service.id();
            for subnet_id in &resolved[&id] {
                services_by_subnet
                    .entry(subnet_id.clone())
                    .or_default()
                    .push(id.clone());
            }
        }
        let occupied_subnets: HashSet<String> =
            services_by_subnet.keys().cloned().collect();

        let has_vpc_content =
            !vpc_internal.is_empty() || aggregated.vpc_structure.is_some();
        let vpc_height = has_vpc_content.then(|| {
            s.vpc_height(
                aggregated.vpc_structure.as_ref(),
                !without_subnets.is_empty(),
                &occupied_subnets,
            )
        });

        let organic: Vec<&LogicalService<'_>> = data
            .into_iter()
            .chain(messaging)
            .chain(security)
            .chain(other)
            .collect();

        let estimated = estimate_height(&s, !edge.is_empty(), vpc_height, organic.len());
        let canvas_height = s.config.canvas_height.max(estimated);

        let mut positions: IndexMap<String, Position> = IndexMap::new();
        let mut groups: Vec<ServiceGroup> = vec![ServiceGroup {
            kind: GroupKind::AwsCloud,
            name: "AWS Cloud".to_string(),
            service_ids: Vec::new(),
            position: Position::new(
                s.config.padding,
                s.config.padding,
                s.config.canvas_width - 2.0 * s.config.padding,
                canvas_height - 2.0 * s.config.padding,
            ),
        }];

        let mut y = s.config.padding + s.header_offset;

        if !edge.is_empty() {
            let mut x = s.center_row_start(
                edge.len(),
                s.config.padding,
                s.config.canvas_width - s.config.padding,
            );
            for service in &edge {
                positions.insert(
                    service.id(),
                    Position::new(x, y, s.config.icon_size, s.config.icon_size),
                );
                x += s.config.column_spacing;
            }
        }
        y += s.config.row_spacing + s.row_gap;

        if let Some(vpc_height) = vpc_height {
            let vpc_x = s.config.padding + s.vpc_side_inset;
            let vpc_width =
                s.config.canvas_width - 2.0 * (s.config.padding + s.vpc_side_inset);
            let vpc_pos = Position::new(vpc_x, y, vpc_width, vpc_height);
            groups.push(ServiceGroup {
                kind: GroupKind::Vpc,
                name: "VPC".to_string(),
                service_ids: vpc_internal.iter().map(|service| service.id()).collect(),
                position: vpc_pos,
            });

            // Services not tied to a subnet sit in a row above the AZ area.
            let services_row_y = y + s.vpc_header;
            if !without_subnets.is_empty() {
                let mut x = s.center_row_start(
                    without_subnets.len(),
                    vpc_x + s.config.group_padding,
                    vpc_x + vpc_width - s.config.group_padding,
                );
                for service in &without_subnets {
                    positions.insert(
                        service.id(),
                        Position::new(x, services_row_y, s.config.icon_size, s.config.icon_size),
                    );
                    x += s.config.column_spacing;
                }
            }

            if let Some(vpc) = &aggregated.vpc_structure {
                let az_start_y = if without_subnets.is_empty() {
                    services_row_y
                } else {
                    services_row_y + s.services_row
                };
                vpc_area::layout_vpc_structure(
                    &s,
                    vpc,
                    vpc_pos,
                    az_start_y,
                    &services_by_subnet,
                    &mut positions,
                    &mut groups,
                );
            }

            y += vpc_height + s.section_gap;
        }

        if !organic.is_empty() {
            y = organic::layout_by_connections(
                &organic,
                &aggregated.connections,
                s.config.padding + s.vpc_side_inset,
                y,
                s.config.canvas_width - 2.0 * (s.config.padding + s.vpc_side_inset),
                &s,
                &mut positions,
            );
        }

        debug!(
            entities = positions.len(),
            groups = groups.len(),
            content_bottom = y as f64,
            canvas_height = canvas_height as f64;
            "computed layout",
        );

        Layout {
            positions,
            groups,
            canvas_width: s.config.canvas_width,
            canvas_height,
        }
    }
}

/// Scale factor from content complexity.
///
/// Service count picks the base bucket; VPC complexity nudges it up. The
/// result is clamped by [`LayoutConfig::clamp_scale`] when applied.
fn responsive_scale(aggregated: &AggregatedResult<'_>) -> f32 {
    let service_scale = match aggregated.services.len() {
        0..=4 => 0.8,
        5..=8 => 0.9,
        9..=15 => 1.0,
        16..=25 => 1.2,
        _ => 1.4,
    };

    let mut vpc_scale = 1.0;
    if let Some(vpc) = &aggregated.vpc_structure {
        if vpc.availability_zones.len() >= 3 {
            vpc_scale *= 1.1;
        }
        if vpc
            .availability_zones
            .iter()
            .any(|az| az.subnets.len() >= 4)
        {
            vpc_scale *= 1.15;
        }
        if vpc.endpoints.len() >= 4 {
            vpc_scale *= 1.05;
        }
    }

    service_scale * vpc_scale
}

/// Pre-compute the canvas height the content needs, mirroring placement.
fn estimate_height(
    s: &Sizing,
    has_edge_row: bool,
    vpc_height: Option<f32>,
    organic_count: usize,
) -> f32 {
    let mut height = s.config.padding + s.header_offset;

    if has_edge_row {
        height += s.config.row_spacing + s.row_gap;
    }
    if let Some(vpc_height) = vpc_height {
        height += vpc_height + s.section_gap;
    }
    if organic_count > 0 {
        let available = s.config.canvas_width - 2.0 * (s.config.padding + s.vpc_side_inset);
        height += organic::estimated_height(organic_count, available, s);
    }

    height + s.config.padding + s.header_offset
}

/// Resolve each VPC service's subnet references to known subnet resource
/// ids. `_state_subnet:` entries go through the VPC structure's
/// provider-id index; references to subnets the structure does not know
/// are dropped, leaving the service in the VPC top row.
fn resolve_service_subnets(
    vpc_internal: &[&LogicalService<'_>],
    vpc: Option<&VpcStructure>,
) -> IndexMap<String, Vec<String>> {
    let Some(vpc) = vpc else {
        return IndexMap::new();
    };

    let aws_index = vpc.aws_id_index();
    let known: HashSet<&str> = vpc
        .availability_zones
        .iter()
        .flat_map(|az| az.subnets.iter().map(|subnet| subnet.resource_id.as_str()))
        .collect();

    let mut resolved: IndexMap<String, Vec<String>> = IndexMap::new();
    for service in vpc_internal {
        let mut subnet_ids: Vec<String> = Vec::new();
        for subnet_id in &service.subnet_ids {
            let concrete = match subnet_id.strip_prefix(STATE_SUBNET_PREFIX) {
                Some(aws_id) => aws_index.get(aws_id).map(|id| id.to_string()),
                None => known
                    .contains(subnet_id.as_str())
                    .then(|| subnet_id.clone()),
            };
            if let Some(concrete) = concrete {
                if !subnet_ids.contains(&concrete) {
                    subnet_ids.push(concrete);
                }
            }
        }
        if !subnet_ids.is_empty() {
            resolved.insert(service.id(), subnet_ids);
        }
    }
    resolved
}
