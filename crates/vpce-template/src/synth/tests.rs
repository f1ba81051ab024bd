use super::*;
use crate::intrinsic::fn_ref;
use serde_json::{Value, json};
use vpce_core::{ContainerSpec, OutputSpec};

fn producer() -> Template {
    synthesize(&StackSpec::producer("CdkVpceStack")).unwrap()
}

fn single<'t>(template: &'t Template, resource_type: &str) -> (&'t String, &'t Resource) {
    let found = template.resources_of_type(resource_type);
    assert_eq!(found.len(), 1, "expected exactly one {}", resource_type);
    found[0]
}

/// Logical ids of subnets carrying the given aws-cdk:subnet-type tag
fn subnet_ids(template: &Template, subnet_type: &str) -> Vec<Value> {
    template
        .resources_of_type("AWS::EC2::Subnet")
        .into_iter()
        .filter(|(_, r)| {
            r.property("Tags")
                .and_then(|t| t.as_array())
                .is_some_and(|tags| {
                    tags.iter().any(|t| {
                        t["Key"] == "aws-cdk:subnet-type" && t["Value"] == subnet_type
                    })
                })
        })
        .map(|(id, _)| fn_ref(id))
        .collect()
}

fn sorted(mut values: Vec<Value>) -> Vec<Value> {
    values.sort_by_key(|v| v.to_string());
    values
}

#[test]
fn test_resource_counts() {
    let template = producer();

    assert_eq!(template.resources_of_type("AWS::EC2::VPC").len(), 1);
    assert_eq!(template.resources_of_type("AWS::ECS::Cluster").len(), 1);
    assert_eq!(template.resources_of_type("AWS::ECS::Service").len(), 1);
    assert_eq!(
        template
            .resources_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer")
            .len(),
        2
    );
    assert_eq!(template.resources_of_type("AWS::EC2::VPCEndpointService").len(), 1);
}

#[test]
fn test_subnets_are_zones_times_groups() {
    let template = producer();

    assert_eq!(template.resources_of_type("AWS::EC2::Subnet").len(), 6);
    assert_eq!(template.resources_of_type("AWS::EC2::RouteTable").len(), 6);
    assert_eq!(subnet_ids(&template, "Public").len(), 3);
    assert_eq!(subnet_ids(&template, "Private").len(), 3);
}

#[test]
fn test_single_nat_gateway() {
    let template = producer();

    assert_eq!(template.resources_of_type("AWS::EC2::NatGateway").len(), 1);
    assert_eq!(template.resources_of_type("AWS::EC2::EIP").len(), 1);
    let (nat, _) = single(&template, "AWS::EC2::NatGateway");

    // every private route goes through it
    let nat_routes: Vec<_> = template
        .resources_of_type("AWS::EC2::Route")
        .into_iter()
        .filter(|(_, r)| r.property("NatGatewayId").is_some())
        .collect();
    assert_eq!(nat_routes.len(), 3);
    for (_, route) in nat_routes {
        assert_eq!(route.property("NatGatewayId"), Some(&fn_ref(nat)));
    }
}

#[test]
fn test_subnet_cidrs() {
    let template = producer();
    let mut cidrs: Vec<String> = template
        .resources_of_type("AWS::EC2::Subnet")
        .into_iter()
        .filter_map(|(_, r)| r.property("CidrBlock").and_then(|c| c.as_str()).map(String::from))
        .collect();
    cidrs.sort();

    assert_eq!(
        cidrs,
        vec![
            "10.40.0.0/24",
            "10.40.1.0/24",
            "10.40.2.0/24",
            "10.40.3.0/24",
            "10.40.4.0/24",
            "10.40.5.0/24",
        ]
    );
}

#[test]
fn test_desired_count() {
    let template = producer();
    let (_, service) = single(&template, "AWS::ECS::Service");
    assert_eq!(service.property("DesiredCount"), Some(&json!(3)));
    assert_eq!(service.property("LaunchType"), Some(&json!("FARGATE")));
}

#[test]
fn test_load_balancer_subnet_selection() {
    let template = producer();
    let public = sorted(subnet_ids(&template, "Public"));
    let private = sorted(subnet_ids(&template, "Private"));

    for (_, lb) in template.resources_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer") {
        let subnets = sorted(lb.property("Subnets").unwrap().as_array().unwrap().clone());
        match lb.property("Scheme").and_then(|s| s.as_str()) {
            Some("internet-facing") => assert_eq!(subnets, public),
            Some("internal") => assert_eq!(subnets, private),
            other => panic!("unexpected scheme {:?}", other),
        }
    }
}

#[test]
fn test_internet_facing_waits_for_routes() {
    let template = producer();
    for (_, lb) in template.resources_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer") {
        if lb.property("Scheme") == Some(&json!("internet-facing")) {
            assert_eq!(lb.depends_on.len(), 3);
        } else {
            assert!(lb.depends_on.is_empty());
        }
    }
}

#[test]
fn test_endpoint_service_targets_internal_lb() {
    let template = producer();
    let (endpoint_id, endpoint) = single(&template, "AWS::EC2::VPCEndpointService");

    let internal: Vec<_> = template
        .resources_of_type("AWS::ElasticLoadBalancingV2::LoadBalancer")
        .into_iter()
        .filter(|(_, r)| r.property("Scheme") == Some(&json!("internal")))
        .collect();
    assert_eq!(internal.len(), 1);

    assert_eq!(
        endpoint.property("NetworkLoadBalancerArns"),
        Some(&json!([fn_ref(internal[0].0)]))
    );
    assert_eq!(endpoint.property("AcceptanceRequired"), Some(&json!(false)));
    assert_eq!(
        endpoint.metadata,
        Some(json!({ "vpce:service-name": "myservice.yodo.io" }))
    );

    let (_, permissions) = single(&template, "AWS::EC2::VPCEndpointServicePermissions");
    assert_eq!(permissions.property("ServiceId"), Some(&fn_ref(endpoint_id)));
    let principals = permissions.property("AllowedPrincipals").unwrap().as_array().unwrap();
    assert_eq!(principals.len(), 1);
    assert!(principals[0].to_string().contains(":iam::468871832330:root"));
}

#[test]
fn test_endpoint_without_allowed_accounts_has_no_permissions() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    if let Some(endpoint) = stack.endpoint_service.as_mut() {
        endpoint.allowed_accounts.clear();
    }
    let template = synthesize(&stack).unwrap();

    single(&template, "AWS::EC2::VPCEndpointService");
    assert!(
        template
            .resources_of_type("AWS::EC2::VPCEndpointServicePermissions")
            .is_empty()
    );
    assert!(template.dangling_references().is_empty());
}

#[test]
fn test_service_attached_to_both_target_groups() {
    let template = producer();
    let (_, service) = single(&template, "AWS::ECS::Service");
    let attachments = service.property("LoadBalancers").unwrap().as_array().unwrap();

    let target_groups: Vec<Value> = template
        .resources_of_type("AWS::ElasticLoadBalancingV2::TargetGroup")
        .into_iter()
        .map(|(id, _)| fn_ref(id))
        .collect();
    assert_eq!(target_groups.len(), 2);

    let attached: Vec<Value> = attachments.iter().map(|a| a["TargetGroupArn"].clone()).collect();
    assert_eq!(sorted(attached), sorted(target_groups));
    for attachment in attachments {
        assert_eq!(attachment["ContainerName"], "Default");
    }

    // listeners exist before the service registers targets
    assert_eq!(service.depends_on.len(), 2);
    for listener in &service.depends_on {
        assert_eq!(
            template.resource(listener).unwrap().resource_type,
            "AWS::ElasticLoadBalancingV2::Listener"
        );
    }
}

#[test]
fn test_service_runs_in_private_subnets() {
    let template = producer();
    let (_, service) = single(&template, "AWS::ECS::Service");
    let config = &service.property("NetworkConfiguration").unwrap()["AwsvpcConfiguration"];

    assert_eq!(config["AssignPublicIp"], "DISABLED");
    assert_eq!(
        sorted(config["Subnets"].as_array().unwrap().clone()),
        sorted(subnet_ids(&template, "Private"))
    );
}

#[test]
fn test_task_definition() {
    let template = producer();
    let (_, task) = single(&template, "AWS::ECS::TaskDefinition");

    assert_eq!(task.property("NetworkMode"), Some(&json!("awsvpc")));
    assert_eq!(task.property("Memory"), Some(&json!("512")));
    assert_eq!(task.property("Cpu"), Some(&json!("256")));
    assert_eq!(task.property("Family"), Some(&json!("CdkVpceStackMyService")));

    let container = &task.property("ContainerDefinitions").unwrap()[0];
    assert_eq!(container["Image"], "nginx");
    assert_eq!(container["Memory"], 512);
}

/// Ports used by the container mapping, ingress rule, target groups and listeners
fn declared_ports(template: &Template) -> Vec<Value> {
    let mut ports = Vec::new();

    let (_, task) = single(template, "AWS::ECS::TaskDefinition");
    let mapping = &task.property("ContainerDefinitions").unwrap()[0]["PortMappings"][0];
    ports.push(mapping["ContainerPort"].clone());
    ports.push(mapping["HostPort"].clone());

    let (_, sg) = single(template, "AWS::EC2::SecurityGroup");
    let ingress = &sg.property("SecurityGroupIngress").unwrap()[0];
    ports.push(ingress["FromPort"].clone());
    ports.push(ingress["ToPort"].clone());

    for ty in [
        "AWS::ElasticLoadBalancingV2::TargetGroup",
        "AWS::ElasticLoadBalancingV2::Listener",
    ] {
        for (_, r) in template.resources_of_type(ty) {
            ports.push(r.property("Port").unwrap().clone());
        }
    }

    let (_, service) = single(template, "AWS::ECS::Service");
    for attachment in service.property("LoadBalancers").unwrap().as_array().unwrap() {
        ports.push(attachment["ContainerPort"].clone());
    }

    ports
}

#[test]
fn test_default_port_everywhere() {
    let ports = declared_ports(&producer());
    assert_eq!(ports.len(), 10);
    assert!(ports.iter().all(|p| *p == json!(80)));
}

#[test]
fn test_changing_service_port_moves_everything() {
    let stack = StackSpec::producer("CdkVpceStack").with_service_port(8080);
    let template = synthesize(&stack).unwrap();

    let ports = declared_ports(&template);
    assert_eq!(ports.len(), 10);
    assert!(ports.iter().all(|p| *p == json!(8080)));
}

#[test]
fn test_outputs() {
    let template = producer();
    assert_eq!(template.outputs.len(), 2);

    let public = &template.outputs["PublicUrl"];
    assert_eq!(public.export.as_ref().unwrap().name, "PublicLbDnsName");
    let parts = &public.value["Fn::Join"][1];
    assert_eq!(parts[0], "http://");
    assert_eq!(parts[1]["Fn::GetAtt"][1], "DNSName");

    let internal = &template.outputs["InternalUrl"];
    assert_eq!(internal.export.as_ref().unwrap().name, "InternalLbDnsName");
}

#[test]
fn test_output_without_scheme_is_plain_dns_name() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.outputs = vec![OutputSpec {
        scheme: None,
        export_name: None,
        ..OutputSpec::new("Dns", "InternalLB", "unused")
    }];
    let template = synthesize(&stack).unwrap();

    let output = &template.outputs["Dns"];
    assert!(output.export.is_none());
    assert_eq!(output.value["Fn::GetAtt"][1], "DNSName");
}

#[test]
fn test_no_dangling_references() {
    assert!(producer().dangling_references().is_empty());
}

#[test]
fn test_synthesis_is_deterministic() {
    let a = producer().to_json().unwrap();
    let b = producer().to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_description_carried() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.description = Some("producer".to_string());
    let template = synthesize(&stack).unwrap();
    assert_eq!(template.description.as_deref(), Some("producer"));
}

#[test]
fn test_no_nat_gateways_means_no_private_default_route() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.network.nat_gateways = 0;
    let template = synthesize(&stack).unwrap();

    assert!(template.resources_of_type("AWS::EC2::NatGateway").is_empty());
    // only the three public default routes remain
    assert_eq!(template.resources_of_type("AWS::EC2::Route").len(), 3);
}

#[test]
fn test_nat_per_zone() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.network.nat_gateways = 3;
    let template = synthesize(&stack).unwrap();

    assert_eq!(template.resources_of_type("AWS::EC2::NatGateway").len(), 3);
    let mut targets: Vec<String> = template
        .resources_of_type("AWS::EC2::Route")
        .into_iter()
        .filter_map(|(_, r)| r.property("NatGatewayId").map(|v| v.to_string()))
        .collect();
    targets.sort();
    targets.dedup();
    assert_eq!(targets.len(), 3);
}

#[test]
fn test_private_only_network_has_no_internet_gateway() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.network.subnet_groups.retain(|g| g.subnet_type == vpce_core::SubnetType::Private);
    stack.load_balancers.retain(|lb| !lb.internet_facing);
    stack.outputs.retain(|o| o.load_balancer != "PublicLB");
    let template = synthesize(&stack).unwrap();

    assert!(template.resources_of_type("AWS::EC2::InternetGateway").is_empty());
    assert!(template.resources_of_type("AWS::EC2::NatGateway").is_empty());
    assert!(template.dangling_references().is_empty());
}

#[test]
fn test_misplaced_load_balancer_is_not_rejected() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.load_balancers[0].subnets = vpce_core::SubnetType::Private;
    assert!(synthesize(&stack).is_ok());
}

#[test]
fn test_unknown_load_balancer_in_output() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.outputs.push(OutputSpec::new("Ghost", "GhostLB", "Ghost"));

    let err = synthesize(&stack).unwrap_err();
    assert!(err.to_string().contains("GhostLB"));
}

#[test]
fn test_unknown_load_balancer_in_endpoint_service() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    if let Some(endpoint) = stack.endpoint_service.as_mut() {
        endpoint.load_balancer = "GhostLB".to_string();
    }
    assert!(synthesize(&stack).is_err());
}

#[test]
fn test_service_without_containers() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.service.containers.clear();
    assert!(synthesize(&stack).is_err());
}

#[test]
fn test_cidr_too_small() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack.network.cidr = "10.40.0.0/22".parse().unwrap();
    let err = synthesize(&stack).unwrap_err();
    assert!(err.to_string().contains("no room"));
}

#[test]
fn test_duplicate_load_balancer_names() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    let copy = stack.load_balancers[0].clone();
    stack.load_balancers.push(copy);
    let err = synthesize(&stack).unwrap_err();
    assert!(matches!(err, crate::TemplateError::DuplicateLogicalId(_)));
}

#[test]
fn test_sidecar_has_no_port_mapping() {
    let mut stack = StackSpec::producer("CdkVpceStack");
    stack
        .service
        .containers
        .push(ContainerSpec::new("sidecar", "envoyproxy/envoy", 256));
    let template = synthesize(&stack).unwrap();

    let (_, task) = single(&template, "AWS::ECS::TaskDefinition");
    let containers = task.property("ContainerDefinitions").unwrap().as_array().unwrap();
    assert_eq!(containers.len(), 2);
    assert!(containers[1].get("PortMappings").is_none());
    assert_eq!(task.property("Memory"), Some(&json!("768")));
}
