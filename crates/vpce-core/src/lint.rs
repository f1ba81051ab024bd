//! Consistency checks for a stack definition
//!
//! Lints never reject a stack: synthesis works on anything that parses.
//! `vpce validate` prints the diagnostics and fails only on errors.

use crate::model::{StackSpec, SubnetType};
use serde::{Deserialize, Serialize};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The stack would deploy but likely not work as intended
    Warning,
    /// The stack would fail to deploy or expose the wrong thing
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single finding about one part of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Construct the finding is about (e.g. "PublicLB")
    pub subject: String,

    pub message: String,
}

impl Diagnostic {
    fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.subject, self.message)
    }
}

/// Fargate's smallest task size
const MIN_TASK_MEMORY_MIB: u32 = 512;

/// Check a stack for settings that deploy badly or not at all
#[tracing::instrument(skip(stack), fields(stack = %stack.id))]
pub fn lint(stack: &StackSpec) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    lint_network(stack, &mut diagnostics);
    lint_service(stack, &mut diagnostics);
    lint_load_balancers(stack, &mut diagnostics);
    lint_endpoint_service(stack, &mut diagnostics);

    for output in &stack.outputs {
        if stack.load_balancer(&output.load_balancer).is_none() {
            diagnostics.push(Diagnostic::error(
                &output.name,
                format!("load balancer '{}' is not declared", output.load_balancer),
            ));
        }
    }

    tracing::debug!("{} diagnostics", diagnostics.len());
    diagnostics
}

fn lint_network(stack: &StackSpec, diagnostics: &mut Vec<Diagnostic>) {
    let network = &stack.network;

    if network.nat_gateways > network.max_azs {
        diagnostics.push(Diagnostic::warning(
            &network.name,
            format!(
                "{} NAT gateways requested but only {} availability zones; extra gateways are not created",
                network.nat_gateways, network.max_azs
            ),
        ));
    }
    if network.nat_gateways > 0 && !network.has_subnets(SubnetType::Public) {
        diagnostics.push(Diagnostic::warning(
            &network.name,
            "NAT gateways need a public subnet group; none will be created",
        ));
    }
    if network.nat_gateways == 0 && network.has_subnets(SubnetType::Private) {
        diagnostics.push(Diagnostic::warning(
            &network.name,
            "private subnets have no NAT gateway and no route out",
        ));
    }
}

fn lint_service(stack: &StackSpec, diagnostics: &mut Vec<Diagnostic>) {
    let service = &stack.service;

    if !stack.network.has_subnets(service.subnets) {
        diagnostics.push(Diagnostic::error(
            &service.name,
            format!("VPC has no {} subnets to place tasks in", service.subnets),
        ));
    }
    if service.subnets == SubnetType::Public && !service.assign_public_ip {
        diagnostics.push(Diagnostic::warning(
            &service.name,
            "tasks in public subnets without a public IP cannot reach the image registry",
        ));
    }
    if !service.containers.is_empty() && service.task_memory_mib() < MIN_TASK_MEMORY_MIB {
        diagnostics.push(Diagnostic::warning(
            &service.task,
            format!(
                "task memory {} MiB is below the Fargate minimum of {} MiB",
                service.task_memory_mib(),
                MIN_TASK_MEMORY_MIB
            ),
        ));
    }
}

fn lint_load_balancers(stack: &StackSpec, diagnostics: &mut Vec<Diagnostic>) {
    for lb in &stack.load_balancers {
        if !stack.network.has_subnets(lb.subnets) {
            diagnostics.push(Diagnostic::error(
                &lb.name,
                format!("VPC has no {} subnets for this load balancer", lb.subnets),
            ));
        }
        match (lb.internet_facing, lb.subnets) {
            (true, SubnetType::Private) => diagnostics.push(Diagnostic::warning(
                &lb.name,
                "internet-facing load balancer in private subnets is unreachable from the internet",
            )),
            (false, SubnetType::Public) => diagnostics.push(Diagnostic::warning(
                &lb.name,
                "internal load balancer placed in public subnets",
            )),
            _ => {}
        }
    }
}

fn lint_endpoint_service(stack: &StackSpec, diagnostics: &mut Vec<Diagnostic>) {
    let Some(endpoint) = &stack.endpoint_service else {
        return;
    };

    match stack.load_balancer(&endpoint.load_balancer) {
        None => diagnostics.push(Diagnostic::error(
            &endpoint.name,
            format!(
                "load balancer '{}' is not declared",
                endpoint.load_balancer
            ),
        )),
        Some(lb) if lb.internet_facing => diagnostics.push(Diagnostic::error(
            &endpoint.name,
            format!(
                "endpoint service fronts internet-facing load balancer '{}'",
                lb.name
            ),
        )),
        Some(_) => {}
    }

    if endpoint.allowed_accounts.is_empty() {
        diagnostics.push(Diagnostic::warning(
            &endpoint.name,
            "no accounts are allowed to connect",
        ));
    }
    for account in &endpoint.allowed_accounts {
        if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
            diagnostics.push(Diagnostic::error(
                &endpoint.name,
                format!("'{}' is not a 12-digit AWS account id", account),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerSpec, SubnetGroupSpec};

    fn producer() -> StackSpec {
        StackSpec::producer("CdkVpceStack")
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_producer_is_clean() {
        assert!(lint(&producer()).is_empty());
    }

    #[test]
    fn test_internet_facing_lb_in_private_subnets() {
        let mut stack = producer();
        stack.load_balancers[0].subnets = SubnetType::Private;

        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].subject, "PublicLB");
    }

    #[test]
    fn test_internal_lb_in_public_subnets() {
        let mut stack = producer();
        stack.load_balancers[1].subnets = SubnetType::Public;

        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("internal load balancer"));
    }

    #[test]
    fn test_endpoint_on_public_lb_is_error() {
        let mut stack = producer();
        if let Some(endpoint) = stack.endpoint_service.as_mut() {
            endpoint.load_balancer = "PublicLB".to_string();
        }

        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
        assert_eq!(diagnostics[0].subject, "StupidService");
    }

    #[test]
    fn test_unknown_load_balancers() {
        let mut stack = producer();
        if let Some(endpoint) = stack.endpoint_service.as_mut() {
            endpoint.load_balancer = "Nope".to_string();
        }
        stack.outputs[0].load_balancer = "Missing".to_string();

        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.iter().filter(|d| d.is_error()).count(), 2);
        assert!(messages(&diagnostics).iter().any(|m| m.contains("'Missing'")));
    }

    #[test]
    fn test_account_ids() {
        let mut stack = producer();
        if let Some(endpoint) = stack.endpoint_service.as_mut() {
            endpoint.allowed_accounts = vec!["12345".to_string(), "abcdefghijkl".to_string()];
        }
        assert_eq!(lint(&stack).iter().filter(|d| d.is_error()).count(), 2);

        if let Some(endpoint) = stack.endpoint_service.as_mut() {
            endpoint.allowed_accounts.clear();
        }
        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_nat_gateway_counts() {
        let mut stack = producer();
        stack.network.nat_gateways = 5;
        assert_eq!(lint(&stack).len(), 1);

        stack.network.nat_gateways = 0;
        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("no NAT gateway"));
    }

    #[test]
    fn test_missing_subnet_type() {
        let mut stack = producer();
        stack.network.subnet_groups = vec![SubnetGroupSpec::new("Ingress", SubnetType::Public, 24)];
        stack.network.nat_gateways = 1;

        let diagnostics = lint(&stack);
        // service and internal LB both want private subnets
        let errors: Vec<&Diagnostic> = diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].subject, "service");
        assert_eq!(errors[1].subject, "InternalLB");
    }

    #[test]
    fn test_public_service_without_public_ip() {
        let mut stack = producer();
        stack.service.subnets = SubnetType::Public;
        assert_eq!(lint(&stack).len(), 1);

        stack.service.assign_public_ip = true;
        assert!(lint(&stack).is_empty());
    }

    #[test]
    fn test_small_task_memory() {
        let mut stack = producer();
        stack.service.containers = vec![ContainerSpec::new("web", "nginx", 256)];

        let diagnostics = lint(&stack);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].subject, "MyService");
        assert_eq!(
            diagnostics[0].to_string(),
            "warning: MyService: task memory 256 MiB is below the Fargate minimum of 512 MiB"
        );
    }
}
