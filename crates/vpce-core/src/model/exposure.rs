//! Load balancers, the endpoint service and stack outputs

use super::network::SubnetType;
use serde::{Deserialize, Serialize};

/// Network load balancer with a single listener/target-group pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerSpec {
    /// Construct name (e.g. "PublicLB")
    pub name: String,

    pub internet_facing: bool,

    /// Subnet selection for the load balancer nodes
    pub subnets: SubnetType,

    /// Construct name of the target group
    pub target_group: String,

    /// Construct name of the listener
    pub listener: String,
}

impl LoadBalancerSpec {
    pub fn new(
        name: impl Into<String>,
        internet_facing: bool,
        subnets: SubnetType,
        target_group: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            internet_facing,
            subnets,
            target_group: target_group.into(),
            listener: "service".to_string(),
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.internet_facing {
            "internet-facing"
        } else {
            "internal"
        }
    }
}

/// VPC endpoint service in front of an internal load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointServiceSpec {
    /// Construct name
    pub name: String,

    /// Name of the load balancer being exposed
    pub load_balancer: String,

    /// Human-friendly service name. CloudFormation has no property for it,
    /// so it is carried as resource metadata only.
    pub service_name: Option<String>,

    /// Whether connection requests must be accepted manually
    pub acceptance_required: bool,

    /// AWS account ids allowed to create endpoints
    pub allowed_accounts: Vec<String>,
}

/// Exported stack output built from a load balancer's DNS name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,

    /// Load balancer whose DNS name is exported
    pub load_balancer: String,

    /// Export name for cross-stack references
    pub export_name: Option<String>,

    /// URL scheme prefixed to the DNS name ("http" → "http://...")
    pub scheme: Option<String>,

    pub description: Option<String>,
}

impl OutputSpec {
    pub fn new(
        name: impl Into<String>,
        load_balancer: impl Into<String>,
        export_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            load_balancer: load_balancer.into(),
            export_name: Some(export_name.into()),
            scheme: Some("http".to_string()),
            description: None,
        }
    }
}
