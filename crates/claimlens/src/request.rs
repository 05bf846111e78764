use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Declared type of an uploaded document, when the caller knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Policy,
    Legal,
    Claim,
    Invoice,
    Estimate,
    Correspondence,
    Photo,
}

/// Context flags that indicate a disaster-peril claim when set truthy.
const DISASTER_PERIL_FLAGS: &[&str] = &["hurricane", "flood", "storm_surge", "wind"];

/// Caller-supplied jurisdiction or peril hints, keyed by flag name.
///
/// Ordered so that rendering the flags into provider instructions is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextFlags(BTreeMap<String, Value>);

impl ContextFlags {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Whether any disaster-peril flag is set truthy. Steers provider
    /// selection toward the anomaly-detection specialist.
    pub fn is_disaster_peril(&self) -> bool {
        DISASTER_PERIL_FLAGS
            .iter()
            .any(|flag| self.0.get(*flag).is_some_and(is_truthy))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.eq_ignore_ascii_case("true"),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// One uploaded document plus the caller's hints. Read-only once constructed;
/// discarded after the request completes.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document: Vec<u8>,
    pub mime_type: String,
    pub kind: Option<DocumentKind>,
    pub context: ContextFlags,
}

impl AnalysisRequest {
    pub fn new(document: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            document,
            mime_type: mime_type.into(),
            kind: None,
            context: ContextFlags::new(),
        }
    }

    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_context(mut self, context: ContextFlags) -> Self {
        self.context = context;
        self
    }
}
