//! Stack synthesis
//!
//! Lowers a [`StackSpec`] into a [`Template`]. Each part of the stack lives
//! in its own module:
//!
//! - `network`: VPC, subnets, route tables, gateways
//! - `exposure`: load balancers, target groups, listeners, endpoint service, outputs
//! - `compute`: cluster, task definition, security group, Fargate service
//!
//! The synthesizer only refuses definitions it cannot lower at all (an
//! exhausted CIDR, a reference to an undeclared load balancer, a service
//! without containers). Placement rules such as "internet-facing balancers
//! belong on public subnets" are left to CloudFormation; see
//! `vpce_core::lint` for an early warning.

mod compute;
mod exposure;
mod network;

use crate::error::Result;
use crate::logical_id::ConstructPath;
use crate::template::{Resource, Template};
use std::collections::HashMap;
use tracing::{debug, info};
use vpce_core::{StackError, StackSpec, SubnetType};

/// Synthesize the CloudFormation template of a stack
#[tracing::instrument(skip(stack), fields(stack = %stack.id))]
pub fn synthesize(stack: &StackSpec) -> Result<Template> {
    Synthesizer::new(stack).run()
}

/// Logical ids of the network resources other parts refer to
#[derive(Debug, Default)]
struct NetworkIds {
    vpc: String,
    subnets: Vec<(SubnetType, String)>,
    /// Default routes of public subnets; internet-facing resources wait on them
    public_routes: Vec<String>,
}

impl NetworkIds {
    fn subnets_of(&self, subnet_type: SubnetType) -> Vec<&str> {
        self.subnets
            .iter()
            .filter(|(t, _)| *t == subnet_type)
            .map(|(_, id)| id.as_str())
            .collect()
    }
}

/// Logical ids of one load balancer and its listener/target-group pair
#[derive(Debug, Clone)]
struct BalancerIds {
    load_balancer: String,
    target_group: String,
    listener: String,
}

/// One-shot synthesizer for a single stack
pub struct Synthesizer<'a> {
    stack: &'a StackSpec,
    root: ConstructPath,
    template: Template,
    network: NetworkIds,
    balancers: HashMap<String, BalancerIds>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(stack: &'a StackSpec) -> Self {
        Self {
            stack,
            root: ConstructPath::root(&stack.id),
            template: Template::new(stack.description.clone()),
            network: NetworkIds::default(),
            balancers: HashMap::new(),
        }
    }

    /// Build the template
    pub fn run(mut self) -> Result<Template> {
        self.check_lowerable()?;

        self.synth_network()?;
        self.synth_load_balancers()?;
        self.synth_compute()?;
        self.synth_endpoint_service()?;
        self.synth_outputs()?;

        info!(
            resources = self.template.resources.len(),
            outputs = self.template.outputs.len(),
            "Synthesized template"
        );
        Ok(self.template)
    }

    /// References between constructs must resolve before anything is emitted
    fn check_lowerable(&self) -> Result<()> {
        let stack = self.stack;
        if stack.service.containers.is_empty() {
            return Err(StackError::NoContainers(stack.service.name.clone()).into());
        }

        let referenced = stack
            .endpoint_service
            .iter()
            .map(|e| &e.load_balancer)
            .chain(stack.outputs.iter().map(|o| &o.load_balancer));
        for name in referenced {
            if stack.load_balancer(name).is_none() {
                return Err(StackError::UnknownLoadBalancer(name.clone()).into());
            }
        }

        Ok(())
    }

    /// Add a resource at `path` and return its logical id
    fn emit(&mut self, path: &ConstructPath, resource: Resource) -> Result<String> {
        let id = path.logical_id();
        debug!(logical_id = %id, path = %path.full(), resource_type = %resource.resource_type, "Emitting resource");
        self.template.add_resource(id.clone(), resource)?;
        Ok(id)
    }

    /// `Name` tag carrying the construct path, as the console displays it
    fn name_tag(path: &ConstructPath) -> serde_json::Value {
        serde_json::json!({ "Key": "Name", "Value": path.full() })
    }
}

#[cfg(test)]
mod tests;
