//! vpc node

use super::{field_arg, int_value, required_name, string_prop, string_value};
use crate::error::{Result, StackError};
use crate::model::{Ipv4Cidr, NetworkSpec, SubnetGroupSpec, SubnetType};
use kdl::KdlNode;

/// Apply a `vpc` node onto the network definition
pub fn parse_vpc(node: &KdlNode, network: &mut NetworkSpec) -> Result<()> {
    network.name = required_name(node, "vpc")?;

    let Some(children) = node.children() else {
        return Ok(());
    };

    let mut groups: Vec<SubnetGroupSpec> = Vec::new();
    for child in children.nodes() {
        match child.name().value() {
            "cidr" => {
                let raw = string_value(field_arg(child)?, "cidr")?;
                network.cidr = raw.parse::<Ipv4Cidr>()?;
            }
            "max-azs" | "max_azs" => {
                network.max_azs = int_value(field_arg(child)?, "max-azs")?;
            }
            "nat-gateways" | "nat_gateways" => {
                network.nat_gateways = int_value(field_arg(child)?, "nat-gateways")?;
            }
            "subnet" => {
                groups.push(parse_subnet_group(child)?);
            }
            _ => {}
        }
    }

    if network.max_azs == 0 {
        return Err(StackError::InvalidConfig(
            "max-azs must be at least 1".to_string(),
        ));
    }

    // Declared subnet groups replace the default layout
    if !groups.is_empty() {
        network.subnet_groups = groups;
    }

    Ok(())
}

/// subnet "Name" type="private" cidr-mask=24
fn parse_subnet_group(node: &KdlNode) -> Result<SubnetGroupSpec> {
    let name = required_name(node, "subnet")?;
    let subnet_type = match string_prop(node, "type") {
        Some(raw) => SubnetType::parse(raw)?,
        None => SubnetType::default(),
    };
    let cidr_mask = match super::prop(node, "cidr-mask").or_else(|| super::prop(node, "cidr_mask"))
    {
        Some(value) => int_value(value, "cidr-mask")?,
        None => 24,
    };
    if cidr_mask > 32 {
        return Err(StackError::InvalidConfig(format!(
            "subnet '{}': cidr-mask /{} is not an IPv4 prefix",
            name, cidr_mask
        )));
    }

    Ok(SubnetGroupSpec::new(name, subnet_type, cidr_mask))
}
