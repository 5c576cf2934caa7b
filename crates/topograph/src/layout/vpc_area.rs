//! Placement of the VPC interior: AZ columns, subnet boxes, services
//! inside subnets, and the endpoint column.

use indexmap::IndexMap;
use topograph_core::Position;

use crate::layout::sizing::Sizing;
use crate::layout::{GroupKind, ServiceGroup};
use crate::vpc::{AvailabilityZone, VpcStructure};

/// Lay out availability zones, subnets, and endpoints inside the VPC box.
///
/// AZ boxes are laid left-to-right with a fixed gap and never overlap; a
/// column at the VPC's right edge is reserved for endpoints.
/// `services_by_subnet` maps subnet resource ids to the services placed
/// inside them (already resolved from declared and live-state references).
pub(crate) fn layout_vpc_structure(
    sizing: &Sizing,
    vpc: &VpcStructure,
    vpc_pos: Position,
    az_start_y: f32,
    services_by_subnet: &IndexMap<String, Vec<String>>,
    positions: &mut IndexMap<String, Position>,
    groups: &mut Vec<ServiceGroup>,
) {
    let num_azs = vpc.availability_zones.len();
    if num_azs > 0 {
        let available_width =
            vpc_pos.width - 2.0 * sizing.az_padding - sizing.endpoint_column;
        let az_width =
            (available_width - (num_azs as f32 - 1.0) * sizing.az_padding) / num_azs as f32;
        let az_height = (vpc_pos.bottom() - sizing.az_bottom_margin) - az_start_y;

        let mut az_x = vpc_pos.x + sizing.az_padding;
        for az in &vpc.availability_zones {
            let az_pos = Position::new(az_x, az_start_y, az_width, az_height);
            groups.push(ServiceGroup {
                kind: GroupKind::Az,
                name: format!("AZ {}", az.short_name),
                service_ids: Vec::new(),
                position: az_pos,
            });

            layout_subnets(sizing, az, az_pos, services_by_subnet, positions);

            az_x += az_width + sizing.az_padding;
        }
    }

    if !vpc.endpoints.is_empty() {
        let endpoint_x =
            vpc_pos.right() - sizing.endpoint_column + sizing.endpoint_inset_x;
        let mut endpoint_y = az_start_y + sizing.endpoint_inset_y;

        for endpoint in &vpc.endpoints {
            positions.insert(
                endpoint.resource_id.clone(),
                Position::new(
                    endpoint_x,
                    endpoint_y,
                    sizing.endpoint_box_width,
                    sizing.endpoint_box_height,
                ),
            );
            endpoint_y += sizing.endpoint_spacing;
        }
    }
}

/// Stack subnet boxes inside one AZ and place services inside them.
///
/// Services are left-aligned with a margin and vertically centered;
/// co-located services step left-to-right. A service already positioned in
/// an earlier subnet keeps its first position.
fn layout_subnets(
    sizing: &Sizing,
    az: &AvailabilityZone,
    az_pos: Position,
    services_by_subnet: &IndexMap<String, Vec<String>>,
    positions: &mut IndexMap<String, Position>,
) {
    if az.subnets.is_empty() {
        return;
    }

    let subnet_width = az_pos.width - 2.0 * sizing.subnet_padding;
    let mut subnet_y = az_pos.y + sizing.az_header;

    for subnet in &az.subnets {
        let subnet_services = services_by_subnet
            .get(&subnet.resource_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let subnet_height = sizing.subnet_height(!subnet_services.is_empty());
        positions.insert(
            subnet.resource_id.clone(),
            Position::new(
                az_pos.x + sizing.subnet_padding,
                subnet_y,
                subnet_width,
                subnet_height,
            ),
        );

        if !subnet_services.is_empty() {
            let mut service_x =
                az_pos.x + sizing.subnet_padding + sizing.subnet_service_inset;
            let box_height = sizing.config.icon_size + sizing.service_label_allowance;
            let service_y = subnet_y
                + sizing.subnet_service_top_pad
                + (subnet_height - box_height) / 2.0;

            for service_id in subnet_services {
                if !positions.contains_key(service_id) {
                    positions.insert(
                        service_id.clone(),
                        Position::new(
                            service_x,
                            service_y,
                            sizing.config.icon_size,
                            sizing.config.icon_size,
                        ),
                    );
                    service_x += sizing.subnet_service_step;
                }
            }
        }

        subnet_y += subnet_height + sizing.subnet_padding;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::vpc::{Subnet, SubnetType, VpcEndpoint, EndpointKind};

    fn subnet(id: &str, subnet_type: SubnetType) -> Subnet {
        Subnet {
            resource_id: id.to_string(),
            name: id.to_string(),
            subnet_type,
            availability_zone: "us-east-1a".to_string(),
            cidr_block: None,
            aws_id: None,
        }
    }

    fn two_az_vpc() -> VpcStructure {
        VpcStructure {
            vpc_id: "aws_vpc.main".to_string(),
            name: "main".to_string(),
            availability_zones: vec![
                AvailabilityZone {
                    name: "us-east-1a".to_string(),
                    short_name: "1a".to_string(),
                    subnets: vec![
                        subnet("aws_subnet.public_a", SubnetType::Public),
                        subnet("aws_subnet.private_a", SubnetType::Private),
                    ],
                },
                AvailabilityZone {
                    name: "us-east-1b".to_string(),
                    short_name: "1b".to_string(),
                    subnets: vec![subnet("aws_subnet.public_b", SubnetType::Public)],
                },
            ],
            endpoints: vec![VpcEndpoint {
                resource_id: "aws_vpc_endpoint.s3".to_string(),
                name: "s3".to_string(),
                kind: EndpointKind::Gateway,
                service: "s3".to_string(),
            }],
        }
    }

    fn run_layout(
        services_by_subnet: &IndexMap<String, Vec<String>>,
    ) -> (IndexMap<String, Position>, Vec<ServiceGroup>) {
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let vpc = two_az_vpc();
        let vpc_pos = Position::new(80.0, 170.0, 1240.0, 400.0);
        let mut positions = IndexMap::new();
        let mut groups = Vec::new();

        layout_vpc_structure(
            &sizing,
            &vpc,
            vpc_pos,
            vpc_pos.y + sizing.vpc_header,
            services_by_subnet,
            &mut positions,
            &mut groups,
        );
        (positions, groups)
    }

    #[test]
    fn test_sibling_azs_do_not_overlap() {
        let (_, groups) = run_layout(&IndexMap::new());

        let az_boxes: Vec<&ServiceGroup> = groups
            .iter()
            .filter(|g| g.kind == GroupKind::Az)
            .collect();
        assert_eq!(az_boxes.len(), 2);
        assert!(!az_boxes[0]
            .position
            .overlaps_horizontally(&az_boxes[1].position));
        // Fixed gap between consecutive boxes.
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        let gap = az_boxes[1].position.x - az_boxes[0].position.right();
        assert!((gap - sizing.az_padding).abs() < 0.01);
    }

    #[test]
    fn test_every_subnet_gets_a_position() {
        let (positions, _) = run_layout(&IndexMap::new());

        assert!(positions.contains_key("aws_subnet.public_a"));
        assert!(positions.contains_key("aws_subnet.private_a"));
        assert!(positions.contains_key("aws_subnet.public_b"));
    }

    #[test]
    fn test_service_is_contained_in_its_subnet() {
        let services_by_subnet: IndexMap<String, Vec<String>> = [(
            "aws_subnet.public_a".to_string(),
            vec!["aws_instance.web".to_string()],
        )]
        .into_iter()
        .collect();

        let (positions, _) = run_layout(&services_by_subnet);

        let subnet_pos = positions["aws_subnet.public_a"];
        let service_pos = positions["aws_instance.web"];
        assert!(subnet_pos.contains(&service_pos));

        // The other subnets stay at the empty height.
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        assert!(subnet_pos.height > positions["aws_subnet.public_b"].height);
        assert!((positions["aws_subnet.public_b"].height - sizing.empty_subnet_height).abs() < 0.01);
    }

    #[test]
    fn test_colocated_services_step_right() {
        let services_by_subnet: IndexMap<String, Vec<String>> = [(
            "aws_subnet.private_a".to_string(),
            vec!["aws_ecs_service.api".to_string(), "aws_ecs_service.worker".to_string()],
        )]
        .into_iter()
        .collect();

        let (positions, _) = run_layout(&services_by_subnet);

        let first = positions["aws_ecs_service.api"];
        let second = positions["aws_ecs_service.worker"];
        assert!(second.x > first.x);
        assert!((second.y - first.y).abs() < f32::EPSILON);
    }

    #[test]
    fn test_endpoints_stack_in_right_column() {
        let (positions, _) = run_layout(&IndexMap::new());

        let endpoint = positions["aws_vpc_endpoint.s3"];
        let sizing = Sizing::new(&LayoutConfig::default(), 1.0);
        // Inside the reserved column at the right edge of the VPC box.
        assert!(endpoint.x > 80.0 + 1240.0 - sizing.endpoint_column);
        assert!(endpoint.right() <= 80.0 + 1240.0);
    }
}
