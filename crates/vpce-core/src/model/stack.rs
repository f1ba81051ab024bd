//! Stack definition

use super::cidr::Ipv4Cidr;
use super::exposure::{EndpointServiceSpec, LoadBalancerSpec, OutputSpec};
use super::network::{NetworkSpec, SubnetGroupSpec, SubnetType};
use super::service::{ContainerSpec, ServiceSpec};
use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

pub const DEFAULT_STACK_ID: &str = "CdkVpceStack";
pub const DEFAULT_SERVICE_PORT: u16 = 80;

/// CloudFormation's limit on stack names
const MAX_STACK_ID_LEN: usize = 128;

/// Check that `id` is a valid CloudFormation stack name
///
/// A letter followed by letters, digits and hyphens. Stack ids also name the
/// template file, so this keeps them free of path separators.
pub fn validate_stack_id(id: &str) -> Result<()> {
    let mut chars = id.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        || id.len() > MAX_STACK_ID_LEN
    {
        return Err(StackError::InvalidConfig(format!(
            "invalid stack id '{}': expected a letter followed by letters, digits or '-' (max {} characters)",
            id, MAX_STACK_ID_LEN
        )));
    }
    Ok(())
}

/// StackSpec - the whole producer stack
///
/// Holds the network, the service and everything exposing it. Load
/// balancers, the endpoint service and outputs refer to each other by
/// construct name; the synthesizer turns those names into references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSpec {
    /// Stack identifier; also the root of every construct path
    pub id: String,

    #[serde(default)]
    pub description: Option<String>,

    pub network: NetworkSpec,

    pub service: ServiceSpec,

    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerSpec>,

    #[serde(default)]
    pub endpoint_service: Option<EndpointServiceSpec>,

    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
}

impl StackSpec {
    /// The service producer stack
    ///
    /// One VPC over three zones with a private "Application" and a public
    /// "Ingress" group, an nginx Fargate service with three replicas, a
    /// public and an internal NLB, and an endpoint service exposing the
    /// internal one to a single account.
    pub fn producer(id: impl Into<String>) -> Self {
        let network = NetworkSpec {
            name: "Producer".to_string(),
            cidr: Ipv4Cidr::masked(Ipv4Addr::new(10, 40, 0, 0), 16),
            max_azs: 3,
            nat_gateways: 1,
            subnet_groups: vec![
                SubnetGroupSpec::new("Application", SubnetType::Private, 24),
                SubnetGroupSpec::new("Ingress", SubnetType::Public, 24),
            ],
        };

        let service = ServiceSpec {
            name: "service".to_string(),
            cluster: "Cluster".to_string(),
            task: "MyService".to_string(),
            security_group: "EcsIngressEgress".to_string(),
            ingress_cidr: "0.0.0.0/0".to_string(),
            port: DEFAULT_SERVICE_PORT,
            desired_count: 3,
            cpu: 256,
            subnets: SubnetType::Private,
            assign_public_ip: false,
            containers: vec![ContainerSpec::new("Default", "nginx", 512)],
        };

        let load_balancers = vec![
            LoadBalancerSpec::new("PublicLB", true, SubnetType::Public, "public"),
            LoadBalancerSpec::new("InternalLB", false, SubnetType::Private, "private"),
        ];

        let endpoint_service = EndpointServiceSpec {
            name: "StupidService".to_string(),
            load_balancer: "InternalLB".to_string(),
            service_name: Some("myservice.yodo.io".to_string()),
            acceptance_required: false,
            allowed_accounts: vec!["468871832330".to_string()],
        };

        let outputs = vec![
            OutputSpec::new("PublicUrl", "PublicLB", "PublicLbDnsName"),
            OutputSpec::new("InternalUrl", "InternalLB", "InternalLbDnsName"),
        ];

        Self {
            id: id.into(),
            description: None,
            network,
            service,
            load_balancers,
            endpoint_service: Some(endpoint_service),
            outputs,
        }
    }

    /// Same stack with a different service port
    pub fn with_service_port(mut self, port: u16) -> Self {
        self.service.port = port;
        self
    }

    pub fn load_balancer(&self, name: &str) -> Option<&LoadBalancerSpec> {
        self.load_balancers.iter().find(|lb| lb.name == name)
    }
}

impl Default for StackSpec {
    fn default() -> Self {
        Self::producer(DEFAULT_STACK_ID)
    }
}
