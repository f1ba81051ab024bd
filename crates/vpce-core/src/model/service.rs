//! Fargate service definition

use super::network::SubnetType;
use serde::{Deserialize, Serialize};

/// Container inside the task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,

    /// Image reference resolved from a public registry (e.g. "nginx")
    pub image: String,

    /// Hard memory limit in MiB
    pub memory_mib: u32,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, memory_mib: u32) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            memory_mib,
        }
    }
}

/// Port mapping of the primary container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
}

/// Cluster, task definition, security group and service in one place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Construct name of the ECS service
    pub name: String,

    /// Construct name of the ECS cluster
    pub cluster: String,

    /// Construct name of the task definition
    pub task: String,

    /// Construct name of the service security group
    pub security_group: String,

    /// Peer allowed to reach the service port
    pub ingress_cidr: String,

    /// The one service port: container mapping, ingress rule, target groups
    /// and listeners all use it
    pub port: u16,

    /// Number of task replicas
    pub desired_count: u32,

    /// Task CPU units
    pub cpu: u32,

    /// Subnets the tasks are placed in
    pub subnets: SubnetType,

    /// Give tasks a public address (only meaningful on public subnets)
    pub assign_public_ip: bool,

    /// Containers; the first one receives the port mapping and the load
    /// balancer attachments
    pub containers: Vec<ContainerSpec>,
}

impl ServiceSpec {
    pub fn primary_container(&self) -> Option<&ContainerSpec> {
        self.containers.first()
    }

    pub fn port_mapping(&self) -> PortMapping {
        PortMapping {
            container_port: self.port,
            host_port: self.port,
        }
    }

    /// Task memory: the sum of the container limits
    pub fn task_memory_mib(&self) -> u32 {
        self.containers.iter().map(|c| c.memory_mib).sum()
    }
}
