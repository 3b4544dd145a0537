//! Test-only component stub shared by the engine's unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::component::Component;
use crate::types::{Field, Scalar};

/// A minimal component with mutable declared fields, used to assemble
/// graphs (including deliberately malformed ones) in unit tests.
#[derive(Debug)]
pub(crate) struct StubComponent {
    type_name: String,
    label: String,
    fields: Mutex<Vec<Field>>,
}

impl StubComponent {
    pub(crate) fn new(type_name: &str, label: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            label: label.to_string(),
            fields: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn scalar(self, name: &str, value: impl Into<Scalar>) -> Self {
        self.push_field(Field::scalar(name, value));
        self
    }

    pub(crate) fn breaking_scalar(self, name: &str, value: impl Into<Scalar>) -> Self {
        self.push_field(Field::scalar(name, value).breaking());
        self
    }

    pub(crate) fn metadata(self, name: &str, value: serde_json::Value) -> Self {
        self.push_field(Field::metadata(name, value));
        self
    }

    pub(crate) fn child(self, name: &str, child: Arc<dyn Component>) -> Self {
        self.push_field(Field::component(name, child));
        self
    }

    pub(crate) fn children(self, name: &str, children: Vec<Arc<dyn Component>>) -> Self {
        self.push_field(Field::components(name, children));
        self
    }

    pub(crate) fn push_field(&self, field: Field) {
        self.fields.lock().unwrap().push(field);
    }

    pub(crate) fn arc(self) -> Arc<dyn Component> {
        Arc::new(self)
    }
}

#[async_trait]
impl Component for StubComponent {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn fields(&self) -> Vec<Field> {
        self.fields.lock().unwrap().clone()
    }
}
