//! service node

use super::{
    bool_value, field_arg, int_value, prop, required_name, string_prop, string_value,
};
use crate::error::{Result, StackError};
use crate::model::{ContainerSpec, ServiceSpec, SubnetType};
use kdl::KdlNode;

/// Apply a `service` node onto the service definition
pub fn parse_service(node: &KdlNode, service: &mut ServiceSpec) -> Result<()> {
    service.name = required_name(node, "service")?;

    let Some(children) = node.children() else {
        return Ok(());
    };

    let mut containers: Vec<ContainerSpec> = Vec::new();
    for child in children.nodes() {
        match child.name().value() {
            "task" => {
                service.task = string_value(field_arg(child)?, "task")?.to_string();
            }
            "port" => {
                let port: u16 = int_value(field_arg(child)?, "port")?;
                if port == 0 {
                    return Err(StackError::InvalidConfig(
                        "port must be between 1 and 65535".to_string(),
                    ));
                }
                service.port = port;
            }
            "desired-count" | "desired_count" => {
                service.desired_count = int_value(field_arg(child)?, "desired-count")?;
            }
            "cpu" => {
                service.cpu = int_value(field_arg(child)?, "cpu")?;
            }
            "subnets" => {
                service.subnets = SubnetType::parse(string_value(field_arg(child)?, "subnets")?)?;
            }
            "assign-public-ip" | "assign_public_ip" => {
                service.assign_public_ip = bool_value(field_arg(child)?, "assign-public-ip")?;
            }
            "security-group" | "security_group" => {
                service.security_group = required_name(child, "security-group")?;
                if let Some(ingress) = string_prop(child, "ingress") {
                    service.ingress_cidr = ingress.to_string();
                }
            }
            "container" => {
                containers.push(parse_container(child)?);
            }
            _ => {}
        }
    }

    // Declared containers replace the default one
    if !containers.is_empty() {
        service.containers = containers;
    }

    Ok(())
}

/// container "Default" image="nginx" memory=512
fn parse_container(node: &KdlNode) -> Result<ContainerSpec> {
    let name = required_name(node, "container")?;
    let image = string_prop(node, "image")
        .ok_or_else(|| StackError::InvalidConfig(format!("container '{}' requires image=", name)))?
        .to_string();
    let memory_mib = match prop(node, "memory") {
        Some(value) => int_value(value, "memory")?,
        None => 512,
    };

    Ok(ContainerSpec::new(name, image, memory_mib))
}
