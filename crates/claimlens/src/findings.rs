//! Structured findings a provider reports for one document.
//!
//! Vendors return loosely shaped JSON; everything recognized lands in a typed
//! field and anything else is preserved in the `extra` bucket so the merge
//! logic stays exhaustively checked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Severity grades reported for physical damage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Severe,
    Total,
}

/// A monetary amount with its role on the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryAmount {
    pub value: f64,
    /// Amount-type label, e.g. "deductible" or "claimed".
    #[serde(default)]
    pub label: String,
    /// The amount exactly as the provider printed it, when it kept one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl MonetaryAmount {
    pub fn new(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
            raw: None,
        }
    }
}

/// Damage reported for the insured property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DamageAssessment {
    pub severity: Option<Severity>,
    pub estimated_cost: Option<f64>,
    pub description: Option<String>,
}

/// A suspicious or inconsistent finding flagged by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFinding {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything one provider extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentFindings {
    pub document_type: Option<String>,
    pub category: Option<String>,
    /// ISO 8601 date strings.
    pub dates: Vec<String>,
    pub amounts: Vec<MonetaryAmount>,
    /// Named entities keyed by role, e.g. "insured" or "carrier".
    pub entities: BTreeMap<String, Value>,
    pub damage_assessment: Option<DamageAssessment>,
    pub anomalies: Vec<AnomalyFinding>,
    /// Jurisdiction- or peril-specific fields.
    pub contextual: BTreeMap<String, Value>,
    pub suggested_name: Option<String>,
    /// The provider's self-reported confidence, 0.0..=1.0.
    pub confidence: Option<f64>,
    /// Unrecognized vendor fields, preserved rather than dropped.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
