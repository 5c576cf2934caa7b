//! The single source of truth for layout dimensions.
//!
//! Every pixel constant the engine uses — container headers, subnet
//! heights, endpoint spacing, grid cells — lives here, derived once from
//! the scaled [`LayoutConfig`](crate::layout::LayoutConfig). Both the
//! height estimator and the placement code consume the same [`Sizing`]
//! value, so the two can never disagree about a dimension.

use std::collections::HashSet;

use crate::layout::LayoutConfig;
use crate::vpc::VpcStructure;

/// All derived layout dimensions, uniformly scaled.
#[derive(Debug, Clone)]
pub(crate) struct Sizing {
    /// The scaled base configuration.
    pub config: LayoutConfig,

    /// Initial content offset below the canvas padding.
    pub header_offset: f32,
    /// Small gap appended after a service row.
    pub row_gap: f32,
    /// Gap separating major vertical sections.
    pub section_gap: f32,

    /// Horizontal inset of the VPC box relative to the canvas padding.
    pub vpc_side_inset: f32,
    /// VPC container header height.
    pub vpc_header: f32,
    /// Height of the service row at the top of the VPC box.
    pub services_row: f32,
    /// Fallback VPC box height when no structure exists.
    pub vpc_fallback_height: f32,
    /// Hard floor for a VPC box with structure.
    pub vpc_min_height: f32,

    /// AZ container header height.
    pub az_header: f32,
    /// Padding around and between AZ boxes.
    pub az_padding: f32,
    /// Gap between the AZ bottom edge and the VPC bottom border.
    pub az_bottom_margin: f32,

    /// Padding around and between subnet boxes.
    pub subnet_padding: f32,
    /// Height of a subnet with no services inside.
    pub empty_subnet_height: f32,
    /// Height of a subnet hosting service icons.
    pub occupied_subnet_height: f32,
    /// Left margin of the first service inside a subnet.
    pub subnet_service_inset: f32,
    /// Top padding of a service box inside a subnet.
    pub subnet_service_top_pad: f32,
    /// Vertical room a service box needs below its icon for the label.
    pub service_label_allowance: f32,
    /// Horizontal step between co-located services in a subnet.
    pub subnet_service_step: f32,

    /// Width of the endpoint column reserved at the VPC's right edge.
    pub endpoint_column: f32,
    pub endpoint_box_width: f32,
    pub endpoint_box_height: f32,
    /// Vertical step between endpoint boxes.
    pub endpoint_spacing: f32,
    /// Inset of the endpoint column inside the reserved space.
    pub endpoint_inset_x: f32,
    pub endpoint_inset_y: f32,

    /// Grid cell size of the organic (connection-aware) layout.
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Sizing {
    /// Derive all dimensions from `base` at the given (unclamped) scale.
    pub fn new(base: &LayoutConfig, scale: f32) -> Self {
        let k = base.clamp_scale(scale);
        let config = base.scaled(scale);

        Self {
            header_offset: 40.0 * k,
            row_gap: 20.0 * k,
            section_gap: 40.0 * k,

            vpc_side_inset: 50.0 * k,
            vpc_header: config.group_padding + 30.0 * k,
            services_row: config.icon_size + 50.0 * k,
            vpc_fallback_height: 180.0 * k,
            vpc_min_height: 200.0 * k,

            az_header: 30.0 * k,
            az_padding: 15.0 * k,
            az_bottom_margin: 20.0 * k,

            subnet_padding: 10.0 * k,
            empty_subnet_height: 60.0 * k,
            occupied_subnet_height: config.icon_size + 56.0 * k,
            subnet_service_inset: 15.0 * k,
            subnet_service_top_pad: 8.0 * k,
            service_label_allowance: 44.0 * k,
            subnet_service_step: config.icon_size + 26.0 * k,

            endpoint_column: 90.0 * k,
            endpoint_box_width: 80.0 * k,
            endpoint_box_height: 65.0 * k,
            endpoint_spacing: 72.0 * k,
            endpoint_inset_x: 3.0 * k,
            endpoint_inset_y: 5.0 * k,

            cell_width: config.icon_size + 50.0 * k,
            cell_height: config.icon_size + 50.0 * k,

            config,
        }
    }

    /// Starting X that horizontally centers `num_items` icons between
    /// `min_x` and `max_x`.
    pub fn center_row_start(&self, num_items: usize, min_x: f32, max_x: f32) -> f32 {
        let n = num_items as f32;
        let total_items_width = n * self.config.icon_size + (n - 1.0) * self.config.icon_spacing;
        min_x + (max_x - min_x - total_items_width) / 2.0
    }

    /// Height of the VPC box.
    ///
    /// The box must fit whichever is taller: the deepest AZ's subnet stack
    /// or the endpoint column, each on top of the VPC header and the
    /// optional service row. `occupied_subnets` holds the resource ids of
    /// subnets that will contain service icons and therefore need the
    /// taller subnet box.
    pub fn vpc_height(
        &self,
        vpc: Option<&VpcStructure>,
        has_top_row: bool,
        occupied_subnets: &HashSet<String>,
    ) -> f32 {
        let Some(vpc) = vpc else {
            return self.vpc_fallback_height;
        };
        if vpc.availability_zones.is_empty() {
            return self.vpc_fallback_height;
        }

        let services_row = if has_top_row { self.services_row } else { 0.0 };

        let max_az_content: f32 = vpc
            .availability_zones
            .iter()
            .map(|az| {
                az.subnets
                    .iter()
                    .map(|subnet| {
                        self.subnet_height(occupied_subnets.contains(&subnet.resource_id))
                            + self.subnet_padding
                    })
                    .sum::<f32>()
            })
            .fold(0.0, f32::max);

        let height_for_subnets =
            self.vpc_header + services_row + self.az_header + max_az_content + self.section_gap;

        let height_for_endpoints = if vpc.endpoints.is_empty() {
            0.0
        } else {
            self.vpc_header
                + services_row
                + vpc.endpoints.len() as f32 * self.endpoint_spacing
                + self.section_gap
                + self.row_gap
        };

        self.vpc_min_height
            .max(height_for_subnets)
            .max(height_for_endpoints)
    }

    /// Height of one subnet box, depending on whether it hosts services.
    pub fn subnet_height(&self, occupied: bool) -> f32 {
        if occupied {
            self.empty_subnet_height.max(self.occupied_subnet_height)
        } else {
            self.empty_subnet_height
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::vpc::{AvailabilityZone, Subnet, SubnetType};

    fn subnet(id: &str) -> Subnet {
        Subnet {
            resource_id: id.to_string(),
            name: id.to_string(),
            subnet_type: SubnetType::Public,
            availability_zone: "us-east-1a".to_string(),
            cidr_block: None,
            aws_id: None,
        }
    }

    fn vpc_with_subnets(count: usize) -> VpcStructure {
        VpcStructure {
            vpc_id: "aws_vpc.main".to_string(),
            name: "main".to_string(),
            availability_zones: vec![AvailabilityZone {
                name: "us-east-1a".to_string(),
                short_name: "1a".to_string(),
                subnets: (0..count).map(|i| subnet(&format!("aws_subnet.s{i}"))).collect(),
            }],
            endpoints: Vec::new(),
        }
    }

    #[test]
    fn test_unit_scale_keeps_base_dimensions() {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        assert_approx_eq!(f32, sizing.config.icon_size, 64.0);
        assert_approx_eq!(f32, sizing.cell_width, 114.0);
    }

    #[test]
    fn test_scale_applies_uniformly() {
        let base = LayoutConfig::default();
        let unit = Sizing::new(&base, 1.0);
        let grown = Sizing::new(&base, 1.2);

        assert_approx_eq!(f32, grown.cell_width, unit.cell_width * 1.2);
        assert_approx_eq!(f32, grown.endpoint_spacing, unit.endpoint_spacing * 1.2);
        assert_approx_eq!(f32, grown.empty_subnet_height, unit.empty_subnet_height * 1.2);
    }

    #[test]
    fn test_scale_is_clamped() {
        let base = LayoutConfig::default();
        let clamped = Sizing::new(&base, 9.0);
        let max = Sizing::new(&base, base.max_scale);

        assert_approx_eq!(f32, clamped.config.icon_size, max.config.icon_size);
    }

    #[test]
    fn test_vpc_height_fallback_without_structure() {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let empty = HashSet::new();

        assert_approx_eq!(f32, sizing.vpc_height(None, false, &empty), 180.0);
    }

    #[test]
    fn test_vpc_height_grows_with_subnets() {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let empty = HashSet::new();

        let one = sizing.vpc_height(Some(&vpc_with_subnets(1)), false, &empty);
        let three = sizing.vpc_height(Some(&vpc_with_subnets(3)), false, &empty);

        assert!(three > one);
        assert!(one >= sizing.vpc_min_height);
    }

    #[test]
    fn test_occupied_subnet_needs_taller_box() {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let vpc = vpc_with_subnets(2);

        let empty = HashSet::new();
        let occupied: HashSet<String> = ["aws_subnet.s0".to_string()].into();

        assert!(sizing.vpc_height(Some(&vpc), false, &occupied) > sizing.vpc_height(Some(&vpc), false, &empty));
    }

    #[test]
    fn test_center_row_start_centers_single_icon() {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let start = sizing.center_row_start(1, 0.0, 200.0);
        assert_approx_eq!(f32, start, (200.0 - 64.0) / 2.0);
    }
}
