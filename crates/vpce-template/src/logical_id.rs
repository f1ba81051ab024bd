//! Construct paths and logical ids
//!
//! Every resource has a path such as `CdkVpceStack/Producer/IngressSubnet1/Subnet`.
//! Its logical id is the readable part of the path (stack id dropped,
//! `Resource`/`Default` components hidden, consecutive duplicates collapsed)
//! followed by an 8-character digest of the path below the stack. Top-level
//! constructs without children keep their bare name.

use sha2::{Digest, Sha256};

const HIDDEN_COMPONENTS: [&str; 2] = ["Resource", "Default"];
const HASH_LEN: usize = 8;

/// Path of a construct below the stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructPath {
    stack_id: String,
    components: Vec<String>,
}

impl ConstructPath {
    /// Path of the stack itself
    pub fn root(stack_id: impl Into<String>) -> Self {
        Self {
            stack_id: stack_id.into(),
            components: Vec::new(),
        }
    }

    /// Child path
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut components = self.components.clone();
        components.push(name.into());
        Self {
            stack_id: self.stack_id.clone(),
            components,
        }
    }

    /// Full path including the stack id
    pub fn full(&self) -> String {
        std::iter::once(self.stack_id.as_str())
            .chain(self.components.iter().map(|c| c.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// The CloudFormation logical id of the construct at this path
    pub fn logical_id(&self) -> String {
        if self.components.len() == 1 {
            return sanitize(&self.components[0]);
        }

        let mut human: Vec<&str> = Vec::new();
        for component in &self.components {
            if HIDDEN_COMPONENTS.contains(&component.as_str()) {
                continue;
            }
            if human.last() == Some(&component.as_str()) {
                continue;
            }
            human.push(component);
        }

        let digest = Sha256::digest(self.components.join("/").as_bytes());
        let hash = hex::encode_upper(digest);
        format!("{}{}", sanitize(&human.concat()), &hash[..HASH_LEN])
    }
}

fn sanitize(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
