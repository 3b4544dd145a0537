//! Shared fixture: a component that records every hook invocation and
//! can be told to fail a given hook.

#![allow(clippy::unwrap_used)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use strata_engine::{Component, Field, HookError, HookResult, Scalar};

/// Shared, ordered log of `label.hook` invocations.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn clear(log: &CallLog) {
    log.lock().unwrap().clear();
}

#[derive(Debug)]
pub struct ProbeComponent {
    type_name: String,
    label: String,
    fields: Vec<Field>,
    log: CallLog,
    fail_on: Option<&'static str>,
}

impl ProbeComponent {
    pub fn new(type_name: &str, label: &str, log: &CallLog) -> Self {
        Self {
            type_name: type_name.to_string(),
            label: label.to_string(),
            fields: Vec::new(),
            log: Arc::clone(log),
            fail_on: None,
        }
    }

    pub fn scalar(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.fields.push(Field::scalar(name, value));
        self
    }

    pub fn breaking_scalar(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.fields.push(Field::scalar(name, value).breaking());
        self
    }

    pub fn child(mut self, name: &str, child: Arc<dyn Component>) -> Self {
        self.fields.push(Field::component(name, child));
        self
    }

    pub fn children(mut self, name: &str, children: Vec<Arc<dyn Component>>) -> Self {
        self.fields.push(Field::components(name, children));
        self
    }

    /// Make the named hook fail.
    pub fn fail_on(mut self, hook: &'static str) -> Self {
        self.fail_on = Some(hook);
        self
    }

    pub fn arc(self) -> Arc<dyn Component> {
        Arc::new(self)
    }

    fn record(&self, hook: &'static str) -> HookResult {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.{hook}", self.label));
        if self.fail_on == Some(hook) {
            return Err(HookError::new(format!("{hook} failed by request")));
        }
        Ok(())
    }
}

#[async_trait]
impl Component for ProbeComponent {
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
        self.record("create")
    }

    async fn read(&self) -> HookResult {
        self.record("read")
    }

    async fn update(&self) -> HookResult {
        self.record("update")
    }

    async fn delete(&self) -> HookResult {
        self.record("delete")
    }
}
