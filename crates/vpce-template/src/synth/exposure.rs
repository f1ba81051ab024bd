//! Load balancers, endpoint service and outputs

use super::{BalancerIds, Synthesizer};
use crate::error::Result;
use crate::intrinsic::{account_root_arn, fn_get_att, fn_join, fn_ref};
use crate::template::{Export, Output, Resource};
use serde_json::{Value, json};
use vpce_core::{StackError, SubnetType};

impl Synthesizer<'_> {
    /// One NLB per definition, each with its own TCP listener and IP target
    /// group on the service port
    pub(super) fn synth_load_balancers(&mut self) -> Result<()> {
        let stack = self.stack;
        let port = stack.service.port;

        for lb in &stack.load_balancers {
            let lb_path = self.root.child(&lb.name);
            let subnets: Vec<Value> = self
                .network
                .subnets_of(lb.subnets)
                .into_iter()
                .map(fn_ref)
                .collect();

            let mut resource = Resource::new("AWS::ElasticLoadBalancingV2::LoadBalancer")
                .with_properties(json!({
                    "LoadBalancerAttributes": [
                        { "Key": "deletion_protection.enabled", "Value": "false" }
                    ],
                    "Scheme": lb.scheme(),
                    "Subnets": subnets,
                    "Type": "network",
                }));
            // Internet-facing nodes need the internet routes in place first
            if lb.internet_facing && lb.subnets == SubnetType::Public {
                for route in &self.network.public_routes {
                    resource = resource.depends_on(route.clone());
                }
            }
            let load_balancer = self.emit(&lb_path.child("Resource"), resource)?;

            let target_group = self.emit(
                &self.root.child(&lb.target_group).child("Resource"),
                Resource::new("AWS::ElasticLoadBalancingV2::TargetGroup").with_properties(json!({
                    "Port": port,
                    "Protocol": "TCP",
                    "TargetType": "ip",
                    "VpcId": fn_ref(&self.network.vpc),
                })),
            )?;

            let listener = self.emit(
                &lb_path.child(&lb.listener).child("Resource"),
                Resource::new("AWS::ElasticLoadBalancingV2::Listener").with_properties(json!({
                    "DefaultActions": [
                        { "TargetGroupArn": fn_ref(&target_group), "Type": "forward" }
                    ],
                    "LoadBalancerArn": fn_ref(&load_balancer),
                    "Port": port,
                    "Protocol": "TCP",
                })),
            )?;

            self.balancers.insert(
                lb.name.clone(),
                BalancerIds {
                    load_balancer,
                    target_group,
                    listener,
                },
            );
        }

        Ok(())
    }

    /// Endpoint service in front of one load balancer, plus the allow-list
    pub(super) fn synth_endpoint_service(&mut self) -> Result<()> {
        let stack = self.stack;
        let Some(endpoint) = &stack.endpoint_service else {
            return Ok(());
        };
        let balancer = self.balancer(&endpoint.load_balancer)?.load_balancer;
        let path = self.root.child(&endpoint.name);

        let mut resource =
            Resource::new("AWS::EC2::VPCEndpointService").with_properties(json!({
                "AcceptanceRequired": endpoint.acceptance_required,
                "NetworkLoadBalancerArns": [fn_ref(&balancer)],
            }));
        if let Some(name) = &endpoint.service_name {
            resource = resource.with_metadata(json!({ "vpce:service-name": name }));
        }
        let service = self.emit(&path.child("Resource"), resource)?;

        // An empty principal list is rejected by CloudFormation
        if endpoint.allowed_accounts.is_empty() {
            tracing::debug!("No allowed accounts for {}, skipping permissions", endpoint.name);
            return Ok(());
        }

        let principals: Vec<Value> = endpoint
            .allowed_accounts
            .iter()
            .map(|account| account_root_arn(account))
            .collect();
        self.emit(
            &path.child("Permissions"),
            Resource::new("AWS::EC2::VPCEndpointServicePermissions").with_properties(json!({
                "AllowedPrincipals": principals,
                "ServiceId": fn_ref(&service),
            })),
        )?;

        Ok(())
    }

    /// `scheme://<dns name>` outputs, exported under their export names
    pub(super) fn synth_outputs(&mut self) -> Result<()> {
        let stack = self.stack;

        for spec in &stack.outputs {
            let balancer = self.balancer(&spec.load_balancer)?.load_balancer;
            let dns_name = fn_get_att(&balancer, "DNSName");
            let value = match &spec.scheme {
                Some(scheme) => fn_join("", vec![Value::from(format!("{}://", scheme)), dns_name]),
                None => dns_name,
            };

            let output = Output {
                description: spec.description.clone(),
                value,
                export: spec.export_name.as_ref().map(|name| Export { name: name.clone() }),
            };
            self.template
                .add_output(self.root.child(&spec.name).logical_id(), output)?;
        }

        Ok(())
    }

    fn balancer(&self, name: &str) -> Result<BalancerIds> {
        self.balancers
            .get(name)
            .cloned()
            .ok_or_else(|| StackError::UnknownLoadBalancer(name.to_string()).into())
    }
}
