//! KDL writer
//!
//! Renders a [`StackSpec`] back into `stack.kdl` form. Used by `vpce init`
//! to give users an editable copy of the built-in definition.

use crate::model::StackSpec;
use kdl::{FormatConfig, KdlDocument, KdlEntry, KdlEntryFormat, KdlNode, KdlValue};

/// Render the stack definition as a KDL document
pub fn to_kdl_string(stack: &StackSpec) -> String {
    let network = &stack.network;
    let service = &stack.service;
    let mut doc = KdlDocument::new();
    let nodes = doc.nodes_mut();

    let mut stack_node = node("stack", stack.id.as_str());
    if let Some(description) = &stack.description {
        stack_node = with_children(stack_node, vec![node("description", description.as_str())]);
    }
    nodes.push(stack_node);

    let mut vpc = vec![
        node("cidr", network.cidr.to_string()),
        node("max-azs", i128::from(network.max_azs)),
        node("nat-gateways", i128::from(network.nat_gateways)),
    ];
    for group in &network.subnet_groups {
        let mut subnet = node("subnet", group.name.as_str());
        subnet.push(prop("type", group.subnet_type.as_str()));
        subnet.push(prop("cidr-mask", i128::from(group.cidr_mask)));
        vpc.push(subnet);
    }
    nodes.push(with_children(node("vpc", network.name.as_str()), vpc));

    nodes.push(node("cluster", service.cluster.as_str()));

    let mut children = vec![
        node("task", service.task.as_str()),
        node("port", i128::from(service.port)),
        node("desired-count", i128::from(service.desired_count)),
        node("cpu", i128::from(service.cpu)),
        node("subnets", service.subnets.as_str()),
    ];
    if service.assign_public_ip {
        children.push(node("assign-public-ip", true));
    }
    let mut security_group = node("security-group", service.security_group.as_str());
    security_group.push(prop("ingress", service.ingress_cidr.as_str()));
    children.push(security_group);
    for container in &service.containers {
        let mut entry = node("container", container.name.as_str());
        entry.push(prop("image", container.image.as_str()));
        entry.push(prop("memory", i128::from(container.memory_mib)));
        children.push(entry);
    }
    nodes.push(with_children(node("service", service.name.as_str()), children));

    for lb in &stack.load_balancers {
        let mut entry = node("load-balancer", lb.name.as_str());
        entry.push(prop("internet-facing", lb.internet_facing));
        entry.push(prop("subnets", lb.subnets.as_str()));
        entry.push(prop("target-group", lb.target_group.as_str()));
        entry.push(prop("listener", lb.listener.as_str()));
        nodes.push(entry);
    }

    if let Some(endpoint) = &stack.endpoint_service {
        let mut children = vec![node("load-balancer", endpoint.load_balancer.as_str())];
        if let Some(name) = &endpoint.service_name {
            children.push(node("name", name.as_str()));
        }
        children.push(node("acceptance-required", endpoint.acceptance_required));
        for account in &endpoint.allowed_accounts {
            children.push(node("allow-account", account.as_str()));
        }
        nodes.push(with_children(node("endpoint-service", endpoint.name.as_str()), children));
    }

    for output in &stack.outputs {
        let mut entry = node("output", output.name.as_str());
        entry.push(prop("load-balancer", output.load_balancer.as_str()));
        if let Some(export) = &output.export_name {
            entry.push(prop("export", export.as_str()));
        }
        if let Some(scheme) = &output.scheme {
            entry.push(prop("scheme", scheme.as_str()));
        }
        if let Some(description) = &output.description {
            entry.push(prop("description", description.as_str()));
        }
        nodes.push(entry);
    }

    // The first pass gives fresh nodes a terminator, the second indents them.
    // Kept entry formats carry the escaped strings.
    let mut config = FormatConfig::default();
    config.entry_autoformate_keep = true;
    doc.autoformat_config(&config);
    doc.autoformat_config(&config);
    doc.to_string()
}

/// `name <value>`
fn node(name: &str, value: impl Into<KdlValue>) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(escaped(KdlEntry::new(value)));
    node
}

/// `key=<value>`
fn prop(key: &str, value: impl Into<KdlValue>) -> KdlEntry {
    escaped(KdlEntry::new_prop(key, value))
}

/// kdl prints newline and disallowed code points verbatim, which its own
/// parser rejects inside quoted strings. Those are written as `\u{..}`.
fn escaped(mut entry: KdlEntry) -> KdlEntry {
    let needs_escape = entry
        .value()
        .as_string()
        .is_some_and(|s| s.chars().any(needs_unicode_escape));
    if !needs_escape {
        return entry;
    }

    let value_repr = entry
        .value()
        .to_string()
        .chars()
        .map(|c| {
            if needs_unicode_escape(c) {
                format!("\\u{{{:x}}}", u32::from(c))
            } else {
                c.to_string()
            }
        })
        .collect();
    entry.set_format(KdlEntryFormat {
        value_repr,
        leading: " ".into(),
        autoformat_keep: true,
        ..Default::default()
    });
    entry
}

/// Code points kdl leaves unescaped but does not accept back literally
fn needs_unicode_escape(c: char) -> bool {
    matches!(c,
        '\u{0000}'..='\u{0007}'
        | '\u{000B}'
        | '\u{000E}'..='\u{001F}'
        | '\u{0085}'
        | '\u{200E}'..='\u{200F}'
        | '\u{2028}'..='\u{202E}'
        | '\u{2066}'..='\u{2069}'
        | '\u{FEFF}'
    )
}

fn with_children(mut node: KdlNode, children: Vec<KdlNode>) -> KdlNode {
    node.ensure_children().nodes_mut().extend(children);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_kdl_string;

    #[test]
    fn test_producer_round_trips_through_kdl() {
        let stack = StackSpec::producer("CdkVpceStack");
        let kdl = to_kdl_string(&stack);

        let parsed = parse_kdl_string(&kdl, "Other").unwrap();
        assert_eq!(parsed, stack);
    }

    #[test]
    fn test_description_and_quoting() {
        let mut stack = StackSpec::producer("CdkVpceStack");
        stack.description = Some("say \"hi\"".to_string());

        let kdl = to_kdl_string(&stack);
        assert!(kdl.contains(r#"description "say \"hi\"""#));

        let parsed = parse_kdl_string(&kdl, "Other").unwrap();
        assert_eq!(parsed.description.as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn test_control_characters_round_trip() {
        let mut stack = StackSpec::producer("CdkVpceStack");
        stack.description = Some("line1\rline2\ttab\u{08}\u{0C}\nend".to_string());
        stack.service.containers[0].image = "registry.local/web:1.0 \"edge\"".to_string();
        stack.outputs[0].description = Some("C:\\temp\r\n".to_string());

        let kdl = to_kdl_string(&stack);
        let parsed = parse_kdl_string(&kdl, "Other").unwrap();
        assert_eq!(parsed, stack);
    }

    #[test]
    fn test_unicode_newlines_and_disallowed_code_points_round_trip() {
        let mut stack = StackSpec::producer("CdkVpceStack");
        stack.description =
            Some("nel\u{85}vt\u{0B}ls\u{2028}ps\u{2029}soh\u{01}bom\u{FEFF}".to_string());
        stack.outputs[0].description = Some("rtl\u{202E}mark\u{200F}".to_string());

        let kdl = to_kdl_string(&stack);
        assert!(kdl.contains(r#"description "nel\u{85}vt\u{b}ls\u{2028}"#));
        assert!(kdl.contains(r#" description="rtl\u{202e}mark\u{200f}""#));

        let parsed = parse_kdl_string(&kdl, "Other").unwrap();
        assert_eq!(parsed, stack);
    }

    #[test]
    fn test_keywords_and_numbers_stay_strings() {
        let mut stack = StackSpec::producer("CdkVpceStack");
        stack.service.task = "true".to_string();
        stack.service.containers[0].name = "123".to_string();

        let parsed = parse_kdl_string(&to_kdl_string(&stack), "Other").unwrap();
        assert_eq!(parsed.service.task, "true");
        assert_eq!(parsed.service.containers[0].name, "123");
    }

    #[test]
    fn test_children_are_indented() {
        let kdl = to_kdl_string(&StackSpec::producer("CdkVpceStack"));
        assert!(kdl.starts_with("stack CdkVpceStack\nvpc Producer {\n"));
        assert!(kdl.contains("\n    max-azs 3\n"));
        assert!(kdl.contains("load-balancer PublicLB internet-facing=#true"));
    }
}
