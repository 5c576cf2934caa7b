//! Aggregation-metadata query for the renderer's grouping UI.
//!
//! The client can offer per-type grouping toggles; this module answers the
//! question "what did aggregation do" without exposing the pipeline's
//! internals. It plays no role in the layout algorithm itself.

use indexmap::IndexMap;
use serde::Serialize;

use crate::aggregate::AggregatedResult;

/// One member resource of a service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceMember {
    pub resource_id: String,
    pub name: String,
}

/// Aggregation metadata for one service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceTypeSummary {
    pub service_type: String,
    /// Total primary-resource count across the type's services.
    pub count: usize,
    /// Whether the type is aggregated by default (false for de-grouped
    /// VPC types).
    pub aggregated: bool,
    /// All member resources, in aggregation order.
    pub members: Vec<ServiceMember>,
}

/// Summarize an aggregated result per service type.
pub fn service_type_summaries(result: &AggregatedResult<'_>) -> Vec<ServiceTypeSummary> {
    let mut by_type: IndexMap<&str, ServiceTypeSummary> = IndexMap::new();

    for service in &result.services {
        let summary = by_type
            .entry(service.service_type.as_str())
            .or_insert_with(|| ServiceTypeSummary {
                service_type: service.service_type.clone(),
                count: 0,
                aggregated: !service.is_vpc_resource,
                members: Vec::new(),
            });
        summary.count += service.count;
        for resource in &service.resources {
            summary.members.push(ServiceMember {
                resource_id: resource.full_id(),
                name: resource.resource_name.clone(),
            });
        }
    }

    by_type.into_values().collect()
}

#[cfg(test)]
mod tests {
    use topograph_core::Resource;

    use super::*;
    use crate::aggregate::ResourceAggregator;
    use crate::config::AggregationConfig;

    #[test]
    fn test_summaries_count_and_flag() {
        let resources = vec![
            Resource::new("aws_sqs_queue", "jobs"),
            Resource::new("aws_sqs_queue", "events"),
            Resource::new("aws_lb", "app"),
            Resource::new("aws_lb", "internal"),
        ];
        let aggregator = ResourceAggregator::new(AggregationConfig::aws_defaults()).unwrap();
        let result = aggregator.aggregate(&resources, None, None);

        let summaries = service_type_summaries(&result);
        let sqs = summaries.iter().find(|s| s.service_type == "sqs").unwrap();
        let alb = summaries.iter().find(|s| s.service_type == "alb").unwrap();

        assert_eq!(sqs.count, 2);
        assert!(sqs.aggregated);
        assert_eq!(sqs.members.len(), 2);

        // De-grouped type: two services fold into one summary row.
        assert_eq!(alb.count, 2);
        assert!(!alb.aggregated);
        assert_eq!(
            alb.members,
            vec![
                ServiceMember {
                    resource_id: "aws_lb.app".to_string(),
                    name: "app".to_string(),
                },
                ServiceMember {
                    resource_id: "aws_lb.internal".to_string(),
                    name: "internal".to_string(),
                },
            ]
        );
    }
}
