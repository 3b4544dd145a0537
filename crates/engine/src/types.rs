//! Core types for the reconciliation engine.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::component::Component;

/// A 32-byte SHA-256 digest over a node's declared state.
///
/// Digest equality is taken to imply field-set equality; collisions are
/// an accepted negligible-probability assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw hash output.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex rendering (64 chars).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Short hex form (first 16 chars) used in report lines.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(16);
        hex
    }

    /// Parse a 64-char hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hi = hex_val(*chunk.first()?)?;
            let lo = hex_val(*chunk.get(1)?)?;
            *bytes.get_mut(i)? = (hi << 4) | lo;
        }
        Some(Self(bytes))
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).ok_or_else(|| D::Error::custom("invalid digest hex"))
    }
}

/// A scalar field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Fold this scalar into a hasher with a type tag, so values of
    /// different types never collide (`Int(1)` vs `Str("1")`).
    pub(crate) fn fold_into(&self, hasher: &mut Sha256) {
        match self {
            Self::Null => hasher.update(b"<null>"),
            Self::Bool(b) => {
                hasher.update(b"<bool>");
                hasher.update([u8::from(*b)]);
            }
            Self::Int(i) => {
                hasher.update(b"<int>");
                hasher.update(i.to_be_bytes());
            }
            Self::Float(x) => {
                hasher.update(b"<float>");
                hasher.update(x.to_bits().to_be_bytes());
            }
            Self::Str(s) => {
                hasher.update(b"<str>");
                hasher.update((s.len() as u64).to_be_bytes());
                hasher.update(s.as_bytes());
            }
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// The value of a declared field.
#[derive(Clone)]
pub enum FieldValue {
    /// A plain scalar value.
    Scalar(Scalar),
    /// Opaque bookkeeping data, excluded from both digests.
    Metadata(serde_json::Value),
    /// A single subcomponent edge.
    Component(Arc<dyn Component>),
    /// An ordered sequence of subcomponent edges.
    ComponentList(Vec<Arc<dyn Component>>),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "Scalar({s:?})"),
            Self::Metadata(v) => write!(f, "Metadata({v})"),
            Self::Component(c) => write!(f, "Component({}/{})", c.type_name(), c.label()),
            Self::ComponentList(cs) => write!(f, "ComponentList(len={})", cs.len()),
        }
    }
}

/// One declared field of a component instance: name, value, and whether a
/// change to it invalidates the component's identity.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    pub breaking: bool,
}

impl Field {
    /// Create a non-breaking field.
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
            breaking: false,
        }
    }

    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::new(name, FieldValue::Scalar(value.into()))
    }

    /// Create a metadata field (excluded from digests).
    pub fn metadata(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(name, FieldValue::Metadata(value))
    }

    /// Create a subcomponent field.
    pub fn component(name: impl Into<String>, child: Arc<dyn Component>) -> Self {
        Self::new(name, FieldValue::Component(child))
    }

    /// Create an ordered subcomponent sequence field.
    pub fn components(name: impl Into<String>, children: Vec<Arc<dyn Component>>) -> Self {
        Self::new(name, FieldValue::ComponentList(children))
    }

    /// Mark this field as identity-affecting.
    pub fn breaking(mut self) -> Self {
        self.breaking = true;
        self
    }
}

/// Stable key correlating a node across applies.
///
/// Two node instances are the same resource iff their identities match.
/// Identity is unaffected by non-breaking field changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub type_name: String,
    pub label: String,
    pub breaking_digest: Digest,
}

impl Identity {
    /// Create a new identity.
    pub fn new(
        type_name: impl Into<String>,
        label: impl Into<String>,
        breaking_digest: Digest,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            label: label.into(),
            breaking_digest,
        }
    }

    /// The full store key: `type_name/label/<64-char breaking digest>`.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.type_name,
            self.label,
            self.breaking_digest.to_hex()
        )
    }
}

impl fmt::Display for Identity {
    /// Short human-readable form used in report lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.type_name,
            self.label,
            self.breaking_digest.short()
        )
    }
}

/// The record persisted per identity after a successful CREATE or UPDATE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// The identity this record is keyed by.
    pub identity: Identity,
    /// Full-state digest at the time of the last successful apply.
    pub full_digest: Digest,
    /// When the record was last written.
    pub applied_at: DateTime<Utc>,
    /// Identity keys of the node's direct subcomponents at apply time.
    /// Used to order orphan deletions children-before-parent.
    #[serde(default)]
    pub deps: Vec<String>,
}

impl StateRecord {
    /// Create a record stamped with the current time.
    pub fn new(identity: Identity, full_digest: Digest, deps: Vec<String>) -> Self {
        Self {
            identity,
            full_digest,
            applied_at: Utc::now(),
            deps,
        }
    }
}
