//! Output directory management
//!
//! Synthesized templates are written to `<dir>/<stack id>.template.json`.
//! `<dir>/manifest.json` lists every stack written to the directory so a
//! later run can diff against it.

use crate::error::{Result, TemplateError};
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.json";
const TEMPLATE_SUFFIX: &str = ".template.json";

/// Index of the templates in an output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest file version
    pub version: u32,

    /// Stacks ordered by id
    pub stacks: Vec<ManifestStack>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            stacks: Vec::new(),
        }
    }
}

impl Manifest {
    pub fn stack(&self, id: &str) -> Option<&ManifestStack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Add or replace the entry for a stack
    pub fn upsert(&mut self, entry: ManifestStack) {
        self.stacks.retain(|s| s.id != entry.id);
        self.stacks.push(entry);
        self.stacks.sort_by(|a, b| a.id.cmp(&b.id));
    }
}

/// One synthesized stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStack {
    pub id: String,

    /// Template file name, relative to the output directory
    pub template_file: String,

    pub resource_count: usize,

    pub synthesized_at: DateTime<Utc>,
}

/// Reads and writes templates in an output directory
pub struct Assembly {
    dir: PathBuf,
}

impl Assembly {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Path of the template file for a stack
    pub fn template_path(&self, stack_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", stack_id, TEMPLATE_SUFFIX))
    }

    /// Stack ids become file names, so they must not leave the directory
    fn check_stack_id(&self, stack_id: &str) -> Result<()> {
        if stack_id.is_empty() || stack_id.contains(['/', '\\']) || stack_id.contains("..") {
            return Err(TemplateError::Assembly {
                path: self.dir.clone(),
                message: format!("stack id '{}' is not a valid file name", stack_id),
            });
        }
        Ok(())
    }

    async fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| TemplateError::Assembly {
                    path: self.dir.clone(),
                    message: e.to_string(),
                })?;
            tracing::debug!("Created output directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// Load the manifest; an empty one when the directory has none yet
    pub async fn load_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        if !path.exists() {
            tracing::debug!("Manifest not found, returning empty manifest");
            return Ok(Manifest::default());
        }

        let content = fs::read_to_string(&path).await?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        if manifest.version > MANIFEST_VERSION {
            return Err(TemplateError::Assembly {
                path,
                message: format!(
                    "manifest version {} is newer than supported version {}",
                    manifest.version, MANIFEST_VERSION
                ),
            });
        }

        Ok(manifest)
    }

    /// Write a template and record it in the manifest
    #[tracing::instrument(skip(self, template), fields(dir = %self.dir.display()))]
    pub async fn write(&self, stack_id: &str, template: &Template) -> Result<PathBuf> {
        self.check_stack_id(stack_id)?;
        self.ensure_dir().await?;

        let path = self.template_path(stack_id);
        fs::write(&path, template.to_json()?).await?;

        let mut manifest = self.load_manifest().await?;
        manifest.upsert(ManifestStack {
            id: stack_id.to_string(),
            template_file: format!("{}{}", stack_id, TEMPLATE_SUFFIX),
            resource_count: template.resources.len(),
            synthesized_at: Utc::now(),
        });
        let content = serde_json::to_string_pretty(&manifest)?;
        fs::write(self.manifest_path(), content).await?;

        tracing::debug!(
            "Wrote {} resources to {}",
            template.resources.len(),
            path.display()
        );
        Ok(path)
    }

    /// Read the last template written for a stack, if any
    pub async fn read_template(&self, stack_id: &str) -> Result<Option<Template>> {
        self.check_stack_id(stack_id)?;
        let path = self.template_path(stack_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let template = Template::from_json(&content).map_err(|e| TemplateError::Assembly {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::synthesize;
    use tempfile::tempdir;
    use vpce_core::StackSpec;

    #[tokio::test]
    async fn test_write_and_read_template() {
        let temp_dir = tempdir().unwrap();
        let assembly = Assembly::new(temp_dir.path().join("vpce.out"));
        let template = synthesize(&StackSpec::producer("CdkVpceStack")).unwrap();

        let path = assembly.write("CdkVpceStack", &template).await.unwrap();
        assert!(path.ends_with("CdkVpceStack.template.json"));

        let loaded = assembly.read_template("CdkVpceStack").await.unwrap();
        assert_eq!(loaded, Some(template.clone()));

        let manifest = assembly.load_manifest().await.unwrap();
        let entry = manifest.stack("CdkVpceStack").unwrap();
        assert_eq!(entry.template_file, "CdkVpceStack.template.json");
        assert_eq!(entry.resource_count, template.resources.len());
    }

    #[tokio::test]
    async fn test_missing_template() {
        let temp_dir = tempdir().unwrap();
        let assembly = Assembly::new(temp_dir.path());

        assert!(assembly.read_template("Nope").await.unwrap().is_none());
        assert!(assembly.load_manifest().await.unwrap().stacks.is_empty());
    }

    #[tokio::test]
    async fn test_manifest_keeps_one_entry_per_stack() {
        let temp_dir = tempdir().unwrap();
        let assembly = Assembly::new(temp_dir.path());
        let template = synthesize(&StackSpec::producer("Beta")).unwrap();

        assembly.write("Beta", &template).await.unwrap();
        assembly.write("Alpha", &template).await.unwrap();
        assembly.write("Beta", &template).await.unwrap();

        let manifest = assembly.load_manifest().await.unwrap();
        let ids: Vec<&str> = manifest.stacks.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_newer_manifest_is_rejected() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join(MANIFEST_FILE),
            r#"{"version": 99, "stacks": []}"#,
        )
        .unwrap();

        let result = Assembly::new(temp_dir.path()).load_manifest().await;
        assert!(matches!(result, Err(TemplateError::Assembly { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_template() {
        let temp_dir = tempdir().unwrap();
        let assembly = Assembly::new(temp_dir.path());
        std::fs::write(assembly.template_path("Broken"), "not json").unwrap();

        let result = assembly.read_template("Broken").await;
        assert!(matches!(result, Err(TemplateError::Assembly { .. })));
    }

    #[tokio::test]
    async fn test_stack_id_cannot_leave_the_directory() {
        let temp_dir = tempdir().unwrap();
        let out = temp_dir.path().join("vpce.out");
        let assembly = Assembly::new(&out);
        let template = synthesize(&StackSpec::producer("CdkVpceStack")).unwrap();

        for id in ["../escaped", "nested/stack", "back\\slash", ""] {
            let result = assembly.write(id, &template).await;
            assert!(
                matches!(result, Err(TemplateError::Assembly { .. })),
                "{id:?} should be rejected"
            );
        }
        assert!(!temp_dir.path().join("escaped.template.json").exists());
        assert!(!out.exists());

        let result = assembly.read_template("../escaped").await;
        assert!(matches!(result, Err(TemplateError::Assembly { .. })));
    }
}
