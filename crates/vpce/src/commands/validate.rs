use crate::utils;
use colored::Colorize;
use std::path::Path;
use vpce_core::SubnetType;

pub fn handle(file: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating stack...".blue());

    let settings = utils::load_settings()?;
    let loaded = utils::load_stack(file, None, &settings)?;
    utils::print_source(&loaded);

    let stack = &loaded.stack;
    let diagnostics = vpce_core::lint(stack);
    utils::print_diagnostics(&diagnostics);

    // Synthesis catches what lints don't (CIDR room, missing containers)
    let template = vpce_template::synthesize(stack)?;

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        anyhow::bail!("{} error(s) in stack {}", errors, stack.id);
    }

    println!("{}", "✓ Stack is valid".green().bold());
    println!();
    println!("Summary:");
    println!("  Stack: {}", stack.id.cyan());
    println!(
        "  VPC: {} ({}, {} AZs, {} subnets, {} NAT gateways)",
        stack.network.name.cyan(),
        stack.network.cidr,
        stack.network.max_azs,
        stack.network.subnet_count(),
        stack.network.nat_gateways
    );
    for group in &stack.network.subnet_groups {
        println!("    - {} ({}, /{})", group.name, group.subnet_type, group.cidr_mask);
    }
    println!(
        "  Service: {} ({} x {}, port {})",
        stack.service.name.cyan(),
        stack.service.desired_count,
        stack
            .service
            .primary_container()
            .map(|c| c.image.as_str())
            .unwrap_or("-"),
        stack.service.port
    );
    println!("  Load balancers: {}", stack.load_balancers.len());
    for lb in &stack.load_balancers {
        let placement = match lb.subnets {
            SubnetType::Public => "public subnets",
            SubnetType::Private => "private subnets",
        };
        println!("    - {} ({}, {})", lb.name.cyan(), lb.scheme(), placement);
    }
    if let Some(endpoint) = &stack.endpoint_service {
        println!(
            "  Endpoint service: {} -> {} ({} allowed accounts)",
            endpoint.name.cyan(),
            endpoint.load_balancer,
            endpoint.allowed_accounts.len()
        );
    }
    println!("  Resources: {}", template.resources.len());
    Ok(())
}
