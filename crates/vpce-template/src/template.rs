//! CloudFormation template document

use crate::error::{Result, TemplateError};
use crate::intrinsic::{is_pseudo_parameter, referenced_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const FORMAT_VERSION: &str = "2010-09-09";

/// A CloudFormation template
///
/// Resources and outputs are kept in ordered maps so the same stack always
/// serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, Resource>,

    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

/// A single resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource type (e.g. "AWS::EC2::VPC")
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,

    /// Explicit ordering edges on top of the implicit `Ref`/`GetAtt` ones
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "Metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Map::new(),
            depends_on: Vec::new(),
            metadata: None,
        }
    }

    /// Build from a `json!` object; non-object values leave properties empty
    pub fn with_properties(mut self, properties: Value) -> Self {
        if let Value::Object(map) = properties {
            self.properties = map;
        }
        self
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let id = logical_id.into();
        if !self.depends_on.contains(&id) {
            self.depends_on.push(id);
        }
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Get a property value
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Logical ids this resource points at, via intrinsics or `DependsOn`
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        for value in self.properties.values() {
            collect_references(value, &mut refs);
        }
        refs.extend(self.depends_on.iter().cloned());
        refs
    }
}

/// Stack output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Value")]
    pub value: Value,

    #[serde(rename = "Export", default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

/// Cross-stack export of an output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export {
    #[serde(rename = "Name")]
    pub name: String,
}

impl Template {
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description,
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add a resource; logical ids must be unique
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) -> Result<()> {
        let id = logical_id.into();
        if self.resources.contains_key(&id) {
            return Err(TemplateError::DuplicateLogicalId(id));
        }
        self.resources.insert(id, resource);
        Ok(())
    }

    /// Add an output; names must be unique
    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(TemplateError::DuplicateLogicalId(name));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Resources of one type, with their logical ids
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<(&String, &Resource)> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .collect()
    }

    /// Logical ids a resource points at
    pub fn references_of(&self, logical_id: &str) -> BTreeSet<String> {
        self.resources
            .get(logical_id)
            .map(|r| r.references())
            .unwrap_or_default()
    }

    /// `(from, to)` pairs whose target is neither a resource nor a pseudo
    /// parameter
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        let is_known = |id: &str| self.resources.contains_key(id) || is_pseudo_parameter(id);

        for (id, resource) in &self.resources {
            for target in resource.references() {
                if !is_known(&target) {
                    dangling.push((id.clone(), target));
                }
            }
        }
        for (name, output) in &self.outputs {
            let mut refs = BTreeSet::new();
            collect_references(&output.value, &mut refs);
            for target in refs {
                if !is_known(&target) {
                    dangling.push((name.clone(), target));
                }
            }
        }

        dangling
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

fn collect_references(value: &Value, refs: &mut BTreeSet<String>) {
    if let Some(id) = referenced_id(value) {
        refs.insert(id.to_string());
        return;
    }
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_references(v, refs);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_references(v, refs);
            }
        }
        _ => {}
    }
}
