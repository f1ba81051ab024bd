//! Change plan between two templates

use crate::template::{Resource, Template};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Planned change for a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Logical id of the resource
    pub logical_id: String,

    /// Type of change
    pub action_type: ActionType,

    /// Resource type (e.g. "AWS::EC2::Subnet"); the new type for updates
    pub resource_type: String,

    /// Whether CloudFormation has to replace the resource
    pub replacement: bool,

    /// Top-level properties that differ (updates only)
    pub changed_properties: Vec<String>,
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Resource is new
    Create,
    /// Resource exists with different settings
    Update,
    /// Resource is gone from the desired template
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing one action per logical id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Actions ordered by logical id
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// Compare the previously written template with the desired one
///
/// Without a previous template every resource is a create.
pub fn plan(previous: Option<&Template>, desired: &Template) -> Plan {
    let Some(previous) = previous else {
        let actions = desired
            .resources
            .iter()
            .map(|(id, r)| Action {
                logical_id: id.clone(),
                action_type: ActionType::Create,
                resource_type: r.resource_type.clone(),
                replacement: false,
                changed_properties: Vec::new(),
            })
            .collect();
        return Plan::new(actions);
    };

    let ids: BTreeSet<&String> = previous
        .resources
        .keys()
        .chain(desired.resources.keys())
        .collect();

    let actions = ids
        .into_iter()
        .filter_map(|id| {
            let action = match (previous.resources.get(id), desired.resources.get(id)) {
                (None, Some(new)) => Action {
                    logical_id: id.clone(),
                    action_type: ActionType::Create,
                    resource_type: new.resource_type.clone(),
                    replacement: false,
                    changed_properties: Vec::new(),
                },
                (Some(old), None) => Action {
                    logical_id: id.clone(),
                    action_type: ActionType::Delete,
                    resource_type: old.resource_type.clone(),
                    replacement: false,
                    changed_properties: Vec::new(),
                },
                (Some(old), Some(new)) => compare(id, old, new),
                (None, None) => return None,
            };
            Some(action)
        })
        .collect();

    Plan::new(actions)
}

fn compare(id: &str, old: &Resource, new: &Resource) -> Action {
    let replacement = old.resource_type != new.resource_type;

    let keys: BTreeSet<&String> = old.properties.keys().chain(new.properties.keys()).collect();
    let mut changed_properties: Vec<String> = keys
        .into_iter()
        .filter(|k| old.properties.get(*k) != new.properties.get(*k))
        .cloned()
        .collect();
    if old.depends_on != new.depends_on {
        changed_properties.push("DependsOn".to_string());
    }
    if old.metadata != new.metadata {
        changed_properties.push("Metadata".to_string());
    }

    let action_type = if replacement || !changed_properties.is_empty() {
        ActionType::Update
    } else {
        ActionType::NoOp
    };

    Action {
        logical_id: id.to_string(),
        action_type,
        resource_type: new.resource_type.clone(),
        replacement,
        changed_properties,
    }
}
