//! Fixed visual categorization of service types.
//!
//! Each category renders as its own horizontal band: edge services on top,
//! VPC-internal services inside the VPC container, then data, messaging,
//! security, and everything else in the organic grid below.

/// Visual band a service type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    /// Internet-facing services above the VPC.
    Edge,
    /// Services drawn inside the VPC container.
    Vpc,
    /// Storage and database services.
    Data,
    /// Queueing and eventing services.
    Messaging,
    /// Keys, secrets, identity.
    Security,
    /// Catch-all for everything else.
    Other,
}

const EDGE_TYPES: [&str; 5] = ["cloudfront", "waf", "route53", "acm", "cognito"];
const VPC_TYPES: [&str; 8] = [
    "alb",
    "ecs",
    "ec2",
    "rds",
    "security_groups",
    "vpc",
    "internet_gateway",
    "nat_gateway",
];
const DATA_TYPES: [&str; 2] = ["s3", "dynamodb"];
const MESSAGING_TYPES: [&str; 3] = ["sqs", "sns", "eventbridge"];
const SECURITY_TYPES: [&str; 3] = ["kms", "secrets_manager", "iam"];

/// Bucket a service type into its fixed visual band.
pub fn categorize(service_type: &str) -> ServiceCategory {
    if EDGE_TYPES.contains(&service_type) {
        ServiceCategory::Edge
    } else if VPC_TYPES.contains(&service_type) {
        ServiceCategory::Vpc
    } else if DATA_TYPES.contains(&service_type) {
        ServiceCategory::Data
    } else if MESSAGING_TYPES.contains(&service_type) {
        ServiceCategory::Messaging
    } else if SECURITY_TYPES.contains(&service_type) {
        ServiceCategory::Security
    } else {
        ServiceCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_buckets() {
        assert_eq!(categorize("cloudfront"), ServiceCategory::Edge);
        assert_eq!(categorize("alb"), ServiceCategory::Vpc);
        assert_eq!(categorize("s3"), ServiceCategory::Data);
        assert_eq!(categorize("sqs"), ServiceCategory::Messaging);
        assert_eq!(categorize("kms"), ServiceCategory::Security);
    }

    #[test]
    fn test_unknown_types_fall_into_other() {
        assert_eq!(categorize("lambda"), ServiceCategory::Other);
        assert_eq!(categorize("made_up"), ServiceCategory::Other);
    }
}
