//! VPC, subnets and gateways

use super::Synthesizer;
use crate::error::Result;
use crate::intrinsic::{availability_zone, fn_get_att, fn_ref};
use crate::template::Resource;
use serde_json::json;
use vpce_core::{SubnetSlot, SubnetType};

impl Synthesizer<'_> {
    /// VPC with one subnet per group and zone
    ///
    /// Public subnets route to an internet gateway. NAT gateways sit in the
    /// first public subnets; private subnets in zone `n` route through NAT
    /// gateway `n % nat_count`. Without NAT gateways private subnets get no
    /// default route.
    pub(super) fn synth_network(&mut self) -> Result<()> {
        let stack = self.stack;
        let network = &stack.network;
        let vpc_path = self.root.child(&network.name);
        let slots = network.subnet_layout()?;

        let vpc = self.emit(
            &vpc_path.child("Resource"),
            Resource::new("AWS::EC2::VPC").with_properties(json!({
                "CidrBlock": network.cidr.to_string(),
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
                "InstanceTenancy": "default",
                "Tags": [Self::name_tag(&vpc_path)],
            })),
        )?;
        self.network.vpc = vpc.clone();

        // Internet gateway, only when something is public
        let gateway = if network.has_subnets(SubnetType::Public) {
            let igw = self.emit(
                &vpc_path.child("IGW"),
                Resource::new("AWS::EC2::InternetGateway").with_properties(json!({
                    "Tags": [Self::name_tag(&vpc_path)],
                })),
            )?;
            let attachment = self.emit(
                &vpc_path.child("VPCGW"),
                Resource::new("AWS::EC2::VPCGatewayAttachment").with_properties(json!({
                    "InternetGatewayId": fn_ref(&igw),
                    "VpcId": fn_ref(&vpc),
                })),
            )?;
            Some((igw, attachment))
        } else {
            None
        };

        // NAT placement is decided up front; private routes need the ids
        let nat_hosts: Vec<&SubnetSlot> = slots
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Public)
            .take(network.nat_gateways as usize)
            .collect();
        let nat_ids: Vec<String> = nat_hosts
            .iter()
            .map(|s| vpc_path.child(s.construct_name()).child("NATGateway").logical_id())
            .collect();

        for slot in &slots {
            let subnet_path = vpc_path.child(slot.construct_name());
            let is_public = slot.subnet_type == SubnetType::Public;
            let type_tag = if is_public { "Public" } else { "Private" };

            let subnet = self.emit(
                &subnet_path.child("Subnet"),
                Resource::new("AWS::EC2::Subnet").with_properties(json!({
                    "AvailabilityZone": availability_zone(slot.az_index),
                    "CidrBlock": slot.cidr.to_string(),
                    "MapPublicIpOnLaunch": is_public,
                    "VpcId": fn_ref(&vpc),
                    "Tags": [
                        { "Key": "aws-cdk:subnet-name", "Value": slot.group },
                        { "Key": "aws-cdk:subnet-type", "Value": type_tag },
                        Self::name_tag(&subnet_path),
                    ],
                })),
            )?;
            self.network.subnets.push((slot.subnet_type, subnet.clone()));

            let route_table = self.emit(
                &subnet_path.child("RouteTable"),
                Resource::new("AWS::EC2::RouteTable").with_properties(json!({
                    "VpcId": fn_ref(&vpc),
                    "Tags": [Self::name_tag(&subnet_path)],
                })),
            )?;
            let association = self.emit(
                &subnet_path.child("RouteTableAssociation"),
                Resource::new("AWS::EC2::SubnetRouteTableAssociation").with_properties(json!({
                    "RouteTableId": fn_ref(&route_table),
                    "SubnetId": fn_ref(&subnet),
                })),
            )?;

            if is_public {
                let Some((igw, attachment)) = &gateway else {
                    continue;
                };
                let route = self.emit(
                    &subnet_path.child("DefaultRoute"),
                    Resource::new("AWS::EC2::Route")
                        .with_properties(json!({
                            "DestinationCidrBlock": "0.0.0.0/0",
                            "GatewayId": fn_ref(igw),
                            "RouteTableId": fn_ref(&route_table),
                        }))
                        .depends_on(attachment.clone()),
                )?;
                self.network.public_routes.push(route.clone());

                if nat_hosts.iter().any(|h| h == &slot) {
                    let eip = self.emit(
                        &subnet_path.child("EIP"),
                        Resource::new("AWS::EC2::EIP").with_properties(json!({
                            "Domain": "vpc",
                            "Tags": [Self::name_tag(&subnet_path)],
                        })),
                    )?;
                    self.emit(
                        &subnet_path.child("NATGateway"),
                        Resource::new("AWS::EC2::NatGateway")
                            .with_properties(json!({
                                "AllocationId": fn_get_att(&eip, "AllocationId"),
                                "SubnetId": fn_ref(&subnet),
                                "Tags": [Self::name_tag(&subnet_path)],
                            }))
                            .depends_on(route)
                            .depends_on(association),
                    )?;
                }
            } else if !nat_ids.is_empty() {
                let nat = &nat_ids[slot.az_index as usize % nat_ids.len()];
                self.emit(
                    &subnet_path.child("DefaultRoute"),
                    Resource::new("AWS::EC2::Route").with_properties(json!({
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "NatGatewayId": fn_ref(nat),
                        "RouteTableId": fn_ref(&route_table),
                    })),
                )?;
            }
        }

        Ok(())
    }
}
