//! KDL parser
//!
//! Reads a `stack.kdl` document into a [`StackSpec`]. Parsing starts from the
//! producer defaults; every node in the file overrides the matching part.
//! Each node type lives in its own module.

mod exposure;
mod network;
mod service;

use exposure::{parse_endpoint_service, parse_load_balancer, parse_output};
use network::parse_vpc;
use service::parse_service;

use crate::error::{Result, StackError};
use crate::model::{DEFAULT_STACK_ID, StackSpec, validate_stack_id};
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parse a KDL file into a stack definition
///
/// The stack id defaults to the name of the directory holding the file, or
/// to `CdkVpceStack` when that name is not a usable stack id.
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<StackSpec> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| StackError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let default_id = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(to_stack_id)
        .filter(|id| validate_stack_id(id).is_ok())
        .unwrap_or_else(|| DEFAULT_STACK_ID.to_string());
    parse_kdl_string(&content, &default_id)
}

/// Parse a KDL string into a stack definition
pub fn parse_kdl_string(content: &str, default_id: &str) -> Result<StackSpec> {
    let doc: KdlDocument = content.parse()?;
    let mut stack = StackSpec::producer(default_id);

    // Lists declared in the file replace the defaults as a whole
    let mut load_balancers_seen = false;
    let mut outputs_seen = false;

    for node in doc.nodes() {
        match node.name().value() {
            "stack" => {
                if let Some(id) = string_arg(node, 0) {
                    validate_stack_id(id)?;
                    stack.id = id.to_string();
                }
                if let Some(description) = string_prop(node, "description")
                    .or_else(|| child_string(node, "description"))
                {
                    stack.description = Some(description.to_string());
                }
            }
            "vpc" => {
                parse_vpc(node, &mut stack.network)?;
            }
            "cluster" => {
                stack.service.cluster = required_name(node, "cluster")?;
            }
            "service" => {
                parse_service(node, &mut stack.service)?;
            }
            "load-balancer" | "load_balancer" => {
                if !load_balancers_seen {
                    stack.load_balancers.clear();
                    load_balancers_seen = true;
                }
                let lb = parse_load_balancer(node)?;
                if let Some(existing) = stack.load_balancers.iter_mut().find(|l| l.name == lb.name)
                {
                    *existing = lb;
                } else {
                    stack.load_balancers.push(lb);
                }
            }
            "endpoint-service" | "endpoint_service" => {
                stack.endpoint_service = Some(parse_endpoint_service(node)?);
            }
            "output" => {
                if !outputs_seen {
                    stack.outputs.clear();
                    outputs_seen = true;
                }
                stack.outputs.push(parse_output(node)?);
            }
            other => {
                warn!(node = other, "Skipping unknown node");
            }
        }
    }

    validate_stack_id(&stack.id)?;

    debug!(
        stack = %stack.id,
        load_balancers = stack.load_balancers.len(),
        outputs = stack.outputs.len(),
        "Parsed stack definition"
    );

    Ok(stack)
}

/// Turn a directory name into a PascalCase stack id ("cdk-vpce" → "CdkVpce")
fn to_stack_id(dir: &str) -> String {
    dir.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Positional argument at `index`, ignoring properties
fn arg(node: &KdlNode, index: usize) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .map(|e| e.value())
}

fn args(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

fn prop<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

fn string_arg(node: &KdlNode, index: usize) -> Option<&str> {
    arg(node, index).and_then(|v| v.as_string())
}

fn string_prop<'a>(node: &'a KdlNode, key: &str) -> Option<&'a str> {
    prop(node, key).and_then(|v| v.as_string())
}

/// First string argument of a child node (`node { key "value" }`)
fn child_string<'a>(node: &'a KdlNode, key: &str) -> Option<&'a str> {
    node.children()?
        .nodes()
        .iter()
        .find(|c| c.name().value() == key)
        .and_then(|c| string_arg(c, 0))
}

fn required_name(node: &KdlNode, what: &str) -> Result<String> {
    string_arg(node, 0)
        .map(|s| s.to_string())
        .ok_or_else(|| StackError::InvalidConfig(format!("{} requires a name", what)))
}

/// Convert an integer value into the target width, naming the field on error
fn int_value<T: TryFrom<i128>>(value: &KdlValue, field: &str) -> Result<T> {
    let raw = value.as_integer().ok_or_else(|| {
        StackError::InvalidConfig(format!("{} must be an integer, got {}", field, value))
    })?;
    T::try_from(raw)
        .map_err(|_| StackError::InvalidConfig(format!("{} is out of range: {}", field, raw)))
}

fn bool_value(value: &KdlValue, field: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| StackError::InvalidConfig(format!("{} must be #true or #false", field)))
}

fn string_value<'a>(value: &'a KdlValue, field: &str) -> Result<&'a str> {
    value
        .as_string()
        .ok_or_else(|| StackError::InvalidConfig(format!("{} must be a string", field)))
}

/// First positional argument of a field node, which must exist
fn field_arg<'a>(node: &'a KdlNode) -> Result<&'a KdlValue> {
    arg(node, 0).ok_or_else(|| {
        StackError::InvalidConfig(format!("{} requires a value", node.name().value()))
    })
}
