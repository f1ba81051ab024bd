//! Cluster, task definition, security group and Fargate service

use super::Synthesizer;
use crate::error::Result;
use crate::intrinsic::{fn_get_att, fn_ref};
use crate::template::Resource;
use serde_json::{Value, json};

impl Synthesizer<'_> {
    pub(super) fn synth_compute(&mut self) -> Result<()> {
        let stack = self.stack;
        let service = &stack.service;
        let port = service.port;

        let cluster = self.emit(
            &self.root.child(&service.cluster).child("Resource"),
            Resource::new("AWS::ECS::Cluster"),
        )?;

        // Task definition and the role its containers run as
        let task_path = self.root.child(&service.task);
        let task_role = self.emit(
            &task_path.child("TaskRole").child("Resource"),
            Resource::new("AWS::IAM::Role").with_properties(json!({
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                    }],
                    "Version": "2012-10-17",
                },
            })),
        )?;

        let containers: Vec<Value> = service
            .containers
            .iter()
            .enumerate()
            .map(|(index, container)| {
                let mut definition = json!({
                    "Essential": true,
                    "Image": container.image,
                    "Memory": container.memory_mib,
                    "Name": container.name,
                });
                // Only the primary container is wired to the load balancers
                if index == 0 {
                    let mapping = service.port_mapping();
                    definition["PortMappings"] = json!([{
                        "ContainerPort": mapping.container_port,
                        "HostPort": mapping.host_port,
                        "Protocol": "tcp",
                    }]);
                }
                definition
            })
            .collect();

        let task_definition = self.emit(
            &task_path.child("Resource"),
            Resource::new("AWS::ECS::TaskDefinition").with_properties(json!({
                "ContainerDefinitions": containers,
                "Cpu": service.cpu.to_string(),
                "Family": format!("{}{}", stack.id, service.task),
                "Memory": service.task_memory_mib().to_string(),
                "NetworkMode": "awsvpc",
                "RequiresCompatibilities": ["FARGATE"],
                "TaskRoleArn": fn_get_att(&task_role, "Arn"),
            })),
        )?;

        let sg_path = self.root.child(&service.security_group);
        let security_group = self.emit(
            &sg_path.child("Resource"),
            Resource::new("AWS::EC2::SecurityGroup").with_properties(json!({
                "GroupDescription": sg_path.full(),
                "SecurityGroupEgress": [{
                    "CidrIp": "0.0.0.0/0",
                    "Description": "Allow all outbound traffic by default",
                    "IpProtocol": "-1",
                }],
                "SecurityGroupIngress": [{
                    "CidrIp": service.ingress_cidr,
                    "Description": format!("from {}:{}", service.ingress_cidr, port),
                    "FromPort": port,
                    "IpProtocol": "tcp",
                    "ToPort": port,
                }],
                "VpcId": fn_ref(&self.network.vpc),
            })),
        )?;

        // Attach the primary container to every target group
        let primary = service
            .primary_container()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let mut attachments = Vec::new();
        let mut listeners = Vec::new();
        for lb in &stack.load_balancers {
            if let Some(ids) = self.balancers.get(&lb.name) {
                attachments.push(json!({
                    "ContainerName": primary,
                    "ContainerPort": port,
                    "TargetGroupArn": fn_ref(&ids.target_group),
                }));
                listeners.push(ids.listener.clone());
            }
        }

        let subnets: Vec<Value> = self
            .network
            .subnets_of(service.subnets)
            .into_iter()
            .map(fn_ref)
            .collect();

        let assign_public_ip = if service.assign_public_ip {
            "ENABLED"
        } else {
            "DISABLED"
        };

        let mut resource = Resource::new("AWS::ECS::Service").with_properties(json!({
            "Cluster": fn_ref(&cluster),
            "DeploymentConfiguration": {
                "MaximumPercent": 200,
                "MinimumHealthyPercent": 50,
            },
            "DesiredCount": service.desired_count,
            "EnableECSManagedTags": false,
            "LaunchType": "FARGATE",
            "LoadBalancers": attachments,
            "NetworkConfiguration": {
                "AwsvpcConfiguration": {
                    "AssignPublicIp": assign_public_ip,
                    "SecurityGroups": [fn_get_att(&security_group, "GroupId")],
                    "Subnets": subnets,
                },
            },
            "TaskDefinition": fn_ref(&task_definition),
        }));
        // Target groups only accept registrations once a listener uses them
        for listener in listeners {
            resource = resource.depends_on(listener);
        }
        self.emit(&self.root.child(&service.name).child("Service"), resource)?;

        Ok(())
    }
}
