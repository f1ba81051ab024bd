//! Network (VPC) definition

use super::cidr::Ipv4Cidr;
use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing class of a subnet group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetType {
    /// Routes to an internet gateway; instances may get public addresses
    Public,
    /// Routes outbound traffic through a NAT gateway
    #[default]
    Private,
}

impl SubnetType {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SubnetType::Public),
            "private" => Ok(SubnetType::Private),
            other => Err(StackError::InvalidConfig(format!(
                "unknown subnet type '{}' (expected public or private)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for SubnetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One subnet group, repeated once per availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetGroupSpec {
    /// Group name (e.g. "Application", "Ingress")
    pub name: String,

    pub subnet_type: SubnetType,

    /// Prefix length of each subnet in the group
    pub cidr_mask: u8,
}

impl SubnetGroupSpec {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            name: name.into(),
            subnet_type,
            cidr_mask,
        }
    }
}

/// VPC definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Construct name of the VPC (e.g. "Producer")
    pub name: String,

    /// Address range of the whole VPC
    pub cidr: Ipv4Cidr,

    /// Number of availability zones to spread subnets over
    pub max_azs: u8,

    /// Number of NAT gateways, placed in the first public subnets
    pub nat_gateways: u8,

    /// Subnet groups in allocation order
    pub subnet_groups: Vec<SubnetGroupSpec>,
}

/// A concrete subnet: one group in one availability zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSlot {
    pub group: String,
    pub subnet_type: SubnetType,
    /// Zero-based availability zone index
    pub az_index: u8,
    pub cidr: Ipv4Cidr,
}

impl SubnetSlot {
    /// Construct name of the subnet, e.g. "IngressSubnet2" (1-based)
    pub fn construct_name(&self) -> String {
        format!("{}Subnet{}", self.group, self.az_index + 1)
    }
}

impl NetworkSpec {
    /// Subnet count is always zones × groups
    pub fn subnet_count(&self) -> usize {
        self.max_azs as usize * self.subnet_groups.len()
    }

    /// Lay out every subnet of every group
    ///
    /// Groups are allocated in declaration order, and within a group one
    /// subnet per availability zone.
    pub fn subnet_layout(&self) -> Result<Vec<SubnetSlot>> {
        let masks: Vec<u8> = self
            .subnet_groups
            .iter()
            .flat_map(|g| std::iter::repeat_n(g.cidr_mask, self.max_azs as usize))
            .collect();
        let blocks = self.cidr.allocate(&masks)?;

        let mut slots = Vec::with_capacity(blocks.len());
        let mut blocks = blocks.into_iter();
        for group in &self.subnet_groups {
            for az_index in 0..self.max_azs {
                let Some(cidr) = blocks.next() else {
                    break;
                };
                slots.push(SubnetSlot {
                    group: group.name.clone(),
                    subnet_type: group.subnet_type,
                    az_index,
                    cidr,
                });
            }
        }

        Ok(slots)
    }

    /// Whether any group of the given type exists
    pub fn has_subnets(&self, subnet_type: SubnetType) -> bool {
        self.subnet_groups
            .iter()
            .any(|g| g.subnet_type == subnet_type)
    }
}
