//! YAML manifest loading.
//!
//! The manifest document is a single node spec; nesting under `children`
//! builds the component graph. Scalar fields are non-breaking unless
//! named in the node's `breaking` list; `metadata` entries never affect
//! digests. Lifecycle hooks are optional shell commands.
//!
//! ```yaml
//! type: service
//! label: api
//! fields:
//!   image: registry/api
//!   replicas: 3
//! breaking: [image]
//! on_create: ./deploy.sh api
//! children:
//!   - type: volume
//!     fields: { size_gb: 20 }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use strata_engine::{auto_label, Component, Field, HookError, HookResult, Scalar};

use crate::error::{CliError, Result};

/// One node of the manifest document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Type name shared by all instances of this kind of node.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Instance name; derived deterministically from the node's position
    /// when omitted.
    #[serde(default)]
    pub label: Option<String>,
    /// Scalar fields, digested in name order.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
    /// Names of fields whose change must recreate the node.
    #[serde(default)]
    pub breaking: Vec<String>,
    /// Free-form annotations excluded from both digests.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Shell command run on CREATE.
    #[serde(default)]
    pub on_create: Option<String>,
    /// Shell command run on READ.
    #[serde(default)]
    pub on_read: Option<String>,
    /// Shell command run on UPDATE.
    #[serde(default)]
    pub on_update: Option<String>,
    /// Shell command run on DELETE.
    #[serde(default)]
    pub on_delete: Option<String>,
    /// Subcomponents, in declaration order.
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// A parsed manifest document.
#[derive(Debug)]
pub struct Manifest {
    root: NodeSpec,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CliError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&text, path)
    }

    /// Parse manifest text; `path` is used in error messages only.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let root: NodeSpec =
            serde_yaml::from_str(text).map_err(|source| CliError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { root })
    }

    /// Build the component graph described by this manifest.
    pub fn build(&self) -> Result<Arc<dyn Component>> {
        build_node(&self.root, "0")
    }
}

fn build_node(spec: &NodeSpec, seed: &str) -> Result<Arc<dyn Component>> {
    let label = match &spec.label {
        Some(label) => label.clone(),
        None => auto_label(&spec.type_name, seed),
    };

    for name in &spec.breaking {
        if !spec.fields.contains_key(name) {
            return Err(CliError::unknown_breaking_field(&label, name));
        }
    }

    // BTreeMap iteration is name-ordered, so the digest input is stable
    // regardless of how the YAML was written.
    let mut fields = Vec::with_capacity(spec.fields.len() + spec.metadata.len() + 1);
    for (name, value) in &spec.fields {
        let scalar = scalar_from_yaml(&label, name, value)?;
        let mut field = Field::scalar(name.clone(), scalar);
        if spec.breaking.iter().any(|b| b == name) {
            field = field.breaking();
        }
        fields.push(field);
    }
    for (name, value) in &spec.metadata {
        fields.push(Field::metadata(name.clone(), value.clone()));
    }

    if !spec.children.is_empty() {
        let children = spec
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| build_node(child, &format!("{seed}.{i}")))
            .collect::<Result<Vec<_>>>()?;
        fields.push(Field::components("children", children));
    }

    Ok(Arc::new(ManifestComponent {
        type_name: spec.type_name.clone(),
        label,
        fields,
        on_create: spec.on_create.clone(),
        on_read: spec.on_read.clone(),
        on_update: spec.on_update.clone(),
        on_delete: spec.on_delete.clone(),
    }))
}

fn scalar_from_yaml(node: &str, name: &str, value: &serde_yaml::Value) -> Result<Scalar> {
    match value {
        serde_yaml::Value::Null => Ok(Scalar::Null),
        serde_yaml::Value::Bool(b) => Ok(Scalar::Bool(*b)),
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float))
            .ok_or_else(|| CliError::unsupported_field(node, name)),
        serde_yaml::Value::String(s) => Ok(Scalar::Str(s.clone())),
        _ => Err(CliError::unsupported_field(node, name)),
    }
}

/// A manifest-defined component whose hooks shell out.
#[derive(Debug)]
pub struct ManifestComponent {
    type_name: String,
    label: String,
    fields: Vec<Field>,
    on_create: Option<String>,
    on_read: Option<String>,
    on_update: Option<String>,
    on_delete: Option<String>,
}

impl ManifestComponent {
    async fn run_hook(&self, hook: &'static str, command: &Option<String>) -> HookResult {
        let Some(command) = command else {
            return Ok(());
        };
        debug!(
            node = %self.label,
            hook,
            command = %command,
            "running hook command"
        );
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("STRATA_TYPE", &self.type_name)
            .env("STRATA_LABEL", &self.label)
            .env("STRATA_HOOK", hook)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(HookError::new(format!(
                "{hook} command for {}/{} exited with {status}",
                self.type_name, self.label
            )))
        }
    }
}

#[async_trait]
impl Component for ManifestComponent {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn fields(&self) -> Vec<Field> {
        self.fields.clone()
    }

    async fn create(&self) -> HookResult {
        self.run_hook("create", &self.on_create).await
    }

    async fn read(&self) -> HookResult {
        self.run_hook("read", &self.on_read).await
    }

    async fn update(&self) -> HookResult {
        self.run_hook("update", &self.on_update).await
    }

    async fn delete(&self) -> HookResult {
        self.run_hook("delete", &self.on_delete).await
    }
}
