//! load-balancer, endpoint-service and output nodes

use super::{args, bool_value, field_arg, prop, required_name, string_prop, string_value};
use crate::error::{Result, StackError};
use crate::model::{EndpointServiceSpec, LoadBalancerSpec, OutputSpec, SubnetType};
use kdl::{KdlNode, KdlValue};

/// load-balancer "PublicLB" internet-facing=#true subnets="public" target-group="public"
///
/// Without `subnets=`, internet-facing balancers go to public subnets and
/// internal ones to private subnets.
pub fn parse_load_balancer(node: &KdlNode) -> Result<LoadBalancerSpec> {
    let name = required_name(node, "load-balancer")?;

    let internet_facing = match prop(node, "internet-facing").or_else(|| prop(node, "internet_facing"))
    {
        Some(value) => bool_value(value, "internet-facing")?,
        None => false,
    };
    let subnets = match string_prop(node, "subnets") {
        Some(raw) => SubnetType::parse(raw)?,
        None if internet_facing => SubnetType::Public,
        None => SubnetType::Private,
    };
    let target_group = string_prop(node, "target-group")
        .or_else(|| string_prop(node, "target_group"))
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}Targets", name));

    let mut lb = LoadBalancerSpec::new(name, internet_facing, subnets, target_group);
    if let Some(listener) = string_prop(node, "listener") {
        lb.listener = listener.to_string();
    }

    Ok(lb)
}

/// endpoint-service "Name" { load-balancer "InternalLB"; allow-account "123456789012" }
pub fn parse_endpoint_service(node: &KdlNode) -> Result<EndpointServiceSpec> {
    let name = required_name(node, "endpoint-service")?;

    let mut load_balancer: Option<String> = None;
    let mut service_name = None;
    let mut acceptance_required = false;
    let mut allowed_accounts: Vec<String> = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "load-balancer" | "load_balancer" => {
                    load_balancer =
                        Some(string_value(field_arg(child)?, "load-balancer")?.to_string());
                }
                "name" => {
                    service_name = Some(string_value(field_arg(child)?, "name")?.to_string());
                }
                "acceptance-required" | "acceptance_required" => {
                    acceptance_required = bool_value(field_arg(child)?, "acceptance-required")?;
                }
                "allow-account" | "allow_account" | "allowed-accounts" => {
                    // allow-account "111111111111" "222222222222"
                    for value in args(child) {
                        allowed_accounts.push(account_value(value)?);
                    }
                }
                _ => {}
            }
        }
    }

    let load_balancer = load_balancer.ok_or_else(|| {
        StackError::InvalidConfig(format!(
            "endpoint-service '{}' requires a load-balancer",
            name
        ))
    })?;

    Ok(EndpointServiceSpec {
        name,
        load_balancer,
        service_name,
        acceptance_required,
        allowed_accounts,
    })
}

/// Largest integer that is still a 12-digit account id
const MAX_ACCOUNT_ID: i128 = 999_999_999_999;

/// Account ids may be written as integers; leading zeros are restored
fn account_value(value: &KdlValue) -> Result<String> {
    match value.as_integer() {
        Some(n) if (0..=MAX_ACCOUNT_ID).contains(&n) => Ok(format!("{:012}", n)),
        Some(n) => Err(StackError::InvalidConfig(format!(
            "allow-account {} is not a 12-digit AWS account id",
            n
        ))),
        None => Ok(string_value(value, "allow-account")?.to_string()),
    }
}

/// output "PublicUrl" load-balancer="PublicLB" export="PublicLbDnsName" scheme="http"
pub fn parse_output(node: &KdlNode) -> Result<OutputSpec> {
    let name = required_name(node, "output")?;
    let load_balancer = string_prop(node, "load-balancer")
        .or_else(|| string_prop(node, "load_balancer"))
        .ok_or_else(|| {
            StackError::InvalidConfig(format!("output '{}' requires load-balancer=", name))
        })?
        .to_string();

    Ok(OutputSpec {
        name,
        load_balancer,
        export_name: string_prop(node, "export").map(|s| s.to_string()),
        scheme: string_prop(node, "scheme").map(|s| s.to_string()),
        description: string_prop(node, "description").map(|s| s.to_string()),
    })
}
