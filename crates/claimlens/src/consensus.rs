//! Field-by-field consensus over successful provider results.
//!
//! Categorical fields are decided by majority vote, list fields by
//! deduplicated union, and map fields by last-write-wins overlay in
//! invocation order. The anomaly-detection specialist's damage and anomaly
//! findings take authority over the vote. The two merge styles are
//! deliberately different and must stay that way: unifying them would
//! silently change output.
//!
//! Merging is deterministic: no randomness, no wall-clock reads, and every
//! tie-break is first-encountered order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::findings::{
    AnomalyFinding, DamageAssessment, DocumentFindings, MonetaryAmount, Severity,
};
use crate::providers::base::ProviderDescriptor;

/// Confidence assigned to a lone provider that did not report its own.
pub const DEFAULT_PROVIDER_CONFIDENCE: f64 = 0.7;
/// Bonus applied when the anomaly-detection specialist participated.
pub const SPECIALIST_BONUS: f64 = 0.05;
/// The aggregate never reaches 1.0; consensus is inherently uncertain.
pub const MAX_CONFIDENCE: f64 = 0.99;
/// Floor keeping the aggregate strictly positive.
pub const MIN_CONFIDENCE: f64 = 0.01;

/// Serialized field names whose cross-provider agreement drives the
/// aggregate confidence.
const CORE_FIELDS: &[&str] = &["documentType", "category", "dates", "amounts"];

/// One successful provider analysis, in invocation order.
#[derive(Debug, Clone)]
pub struct ProviderReport {
    pub descriptor: ProviderDescriptor,
    pub findings: DocumentFindings,
}

/// A field where a provider's own report differs from the merged value.
/// Preserved per provider for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub provider: String,
    pub field: String,
    pub reported: Value,
}

/// The single merged record produced from all successful provider results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub findings: DocumentFindings,
    /// Aggregate confidence, strictly between 0 and 1.
    pub confidence: f64,
    /// Participating provider ids, in invocation order.
    pub providers: Vec<String>,
    pub divergences: Vec<Divergence>,
}

/// Merge successful provider results into one consensus record.
///
/// Zero successes is a hard failure, never an empty result.
pub fn merge(reports: &[ProviderReport]) -> Result<ConsensusResult, AnalysisError> {
    if reports.is_empty() {
        return Err(AnalysisError::NoSuccessfulProvider);
    }

    let specialist = reports
        .iter()
        .find(|report| report.descriptor.is_anomaly_specialist());

    let findings = DocumentFindings {
        document_type: majority(reports.iter().filter_map(|r| r.findings.document_type.clone())),
        category: majority(reports.iter().filter_map(|r| r.findings.category.clone())),
        dates: merged_dates(reports),
        amounts: merged_amounts(reports),
        entities: overlay(reports.iter().map(|r| &r.findings.entities)),
        damage_assessment: merged_damage(reports, specialist),
        anomalies: merged_anomalies(reports, specialist),
        contextual: overlay(reports.iter().map(|r| &r.findings.contextual)),
        suggested_name: longest_suggested_name(reports),
        confidence: None,
        extra: overlay(reports.iter().map(|r| &r.findings.extra)),
    };

    let confidence = aggregate_confidence(reports, specialist.is_some());
    let divergences = collect_divergences(reports, &findings);
    let providers = reports
        .iter()
        .map(|report| report.descriptor.id.clone())
        .collect();

    Ok(ConsensusResult {
        findings,
        confidence,
        providers,
        divergences,
    })
}

/// Majority vote; ties broken by first-encountered order.
fn majority<T: PartialEq + Clone>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut tally: Vec<(T, usize)> = Vec::new();
    for value in values {
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in tally {
        if best.as_ref().is_none_or(|(_, best_count)| count > *best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Union of all reported dates, deduplicated, ascending lexicographic order.
fn merged_dates(reports: &[ProviderReport]) -> Vec<String> {
    let mut dates: Vec<String> = reports
        .iter()
        .flat_map(|report| report.findings.dates.iter().cloned())
        .collect();
    dates.sort();
    dates.dedup();
    dates
}

/// Union deduplicated by the (value, label) pair; the first occurrence wins
/// when duplicates collide on label but differ in formatting.
fn merged_amounts(reports: &[ProviderReport]) -> Vec<MonetaryAmount> {
    let mut seen: HashSet<(u64, String)> = HashSet::new();
    let mut merged = Vec::new();
    for report in reports {
        for amount in &report.findings.amounts {
            // Key on the raw bits so 100.0 collides with itself but never
            // with 100.5.
            let key = (amount.value.to_bits(), amount.label.clone());
            if seen.insert(key) {
                merged.push(amount.clone());
            }
        }
    }
    merged
}

/// Shallow merge; later providers in invocation order overwrite earlier on
/// key collision. Additive extraction, not votable.
fn overlay<'a, M>(maps: M) -> std::collections::BTreeMap<String, Value>
where
    M: Iterator<Item = &'a std::collections::BTreeMap<String, Value>>,
{
    let mut merged = std::collections::BTreeMap::new();
    for map in maps {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// The specialist's assessment is authoritative when it reported one;
/// otherwise severity goes to majority vote and cost estimates are averaged.
fn merged_damage(
    reports: &[ProviderReport],
    specialist: Option<&ProviderReport>,
) -> Option<DamageAssessment> {
    if let Some(assessment) = specialist.and_then(|r| r.findings.damage_assessment.as_ref()) {
        return Some(assessment.clone());
    }

    let reported: Vec<&DamageAssessment> = reports
        .iter()
        .filter_map(|report| report.findings.damage_assessment.as_ref())
        .collect();
    if reported.is_empty() {
        return None;
    }

    let severity: Option<Severity> =
        majority(reported.iter().filter_map(|assessment| assessment.severity));
    let costs: Vec<f64> = reported
        .iter()
        .filter_map(|assessment| assessment.estimated_cost)
        .collect();
    let estimated_cost =
        (!costs.is_empty()).then(|| costs.iter().sum::<f64>() / costs.len() as f64);
    let description = reported
        .iter()
        .find_map(|assessment| assessment.description.clone());

    Some(DamageAssessment {
        severity,
        estimated_cost,
        description,
    })
}

/// Same authority rule as the damage assessment; otherwise union,
/// deduplicated by full-value equality.
fn merged_anomalies(
    reports: &[ProviderReport],
    specialist: Option<&ProviderReport>,
) -> Vec<AnomalyFinding> {
    if let Some(report) = specialist {
        if !report.findings.anomalies.is_empty() {
            return report.findings.anomalies.clone();
        }
    }

    let mut merged: Vec<AnomalyFinding> = Vec::new();
    for report in reports {
        for anomaly in &report.findings.anomalies {
            if !merged.contains(anomaly) {
                merged.push(anomaly.clone());
            }
        }
    }
    merged
}

/// The longest candidate is treated as the most descriptive; ties keep the
/// first-encountered candidate.
fn longest_suggested_name(reports: &[ProviderReport]) -> Option<String> {
    let mut best: Option<&String> = None;
    for name in reports
        .iter()
        .filter_map(|report| report.findings.suggested_name.as_ref())
    {
        if best.is_none_or(|current| name.len() > current.len()) {
            best = Some(name);
        }
    }
    best.cloned()
}

fn aggregate_confidence(reports: &[ProviderReport], specialist_present: bool) -> f64 {
    if reports.len() == 1 {
        let own = reports[0]
            .findings
            .confidence
            .unwrap_or(DEFAULT_PROVIDER_CONFIDENCE);
        return own.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);
    }

    let serialized: Vec<Value> = reports
        .iter()
        .map(|report| serde_json::to_value(&report.findings).unwrap_or_default())
        .collect();

    let n = reports.len();
    let mut total = 0.0;
    for field in CORE_FIELDS {
        let values: HashSet<String> = serialized
            .iter()
            .map(|findings| {
                findings
                    .get(*field)
                    .cloned()
                    .unwrap_or(Value::Null)
                    .to_string()
            })
            .collect();
        // 1.0 when all providers agree, partial credit otherwise.
        total += (n - values.len() + 1) as f64 / n as f64;
    }

    let mut confidence = total / CORE_FIELDS.len() as f64;
    if specialist_present {
        confidence += SPECIALIST_BONUS;
    }
    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Per participating provider, every field it reported whose merged value
/// differs from its own. Absent or empty fields are not divergences, and
/// the self-reported confidence is the provider's opinion of itself, not a
/// finding.
fn collect_divergences(reports: &[ProviderReport], merged: &DocumentFindings) -> Vec<Divergence> {
    let merged_value = serde_json::to_value(merged).unwrap_or_default();

    let mut divergences = Vec::new();
    for report in reports {
        let reported = serde_json::to_value(&report.findings).unwrap_or_default();
        let Value::Object(fields) = reported else {
            continue;
        };
        for (field, value) in fields {
            if field == "confidence" || is_empty_value(&value) {
                continue;
            }
            if merged_value.get(&field) != Some(&value) {
                divergences.push(Divergence {
                    provider: report.descriptor.id.clone(),
                    field,
                    reported: value,
                });
            }
        }
    }
    divergences
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::Specialty;
    use serde_json::json;

    fn report(id: &str, specialties: Vec<Specialty>, findings: DocumentFindings) -> ProviderReport {
        ProviderReport {
            descriptor: ProviderDescriptor::new(id, id, 0.8, specialties),
            findings,
        }
    }

    fn plain(id: &str, findings: DocumentFindings) -> ProviderReport {
        report(id, vec![], findings)
    }

    #[test]
    fn empty_input_is_a_hard_failure() {
        assert_eq!(merge(&[]), Err(AnalysisError::NoSuccessfulProvider));
    }

    #[test]
    fn majority_vote_decides_document_type() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    document_type: Some("policy".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    document_type: Some("legal".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "c",
                DocumentFindings {
                    document_type: Some("policy".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.document_type.as_deref(), Some("policy"));
    }

    #[test]
    fn majority_vote_ties_keep_first_encountered() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    category: Some("claims".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    category: Some("legal".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.category.as_deref(), Some("claims"));
    }

    #[test]
    fn dates_union_is_deduplicated_and_sorted() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    dates: vec!["2024-01-01".to_string()],
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    dates: vec!["2024-01-01".to_string(), "2024-02-01".to_string()],
                    ..Default::default()
                },
            ),
            plain("c", DocumentFindings::default()),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.dates, ["2024-01-01", "2024-02-01"]);
    }

    #[test]
    fn amounts_dedupe_on_value_and_label_first_occurrence_wins() {
        let first = MonetaryAmount {
            value: 1500.0,
            label: "deductible".to_string(),
            raw: Some("$1,500".to_string()),
        };
        let duplicate = MonetaryAmount {
            value: 1500.0,
            label: "deductible".to_string(),
            raw: Some("1500.00 USD".to_string()),
        };
        let distinct = MonetaryAmount::new(1500.0, "claimed");

        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    amounts: vec![first.clone()],
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    amounts: vec![duplicate, distinct.clone()],
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.amounts, vec![first, distinct]);
    }

    #[test]
    fn entities_are_last_write_wins_not_voted() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    entities: [
                        ("insured".to_string(), json!("J. Alvarez")),
                        ("carrier".to_string(), json!("Gulfstream Mutual")),
                    ]
                    .into(),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    entities: [("insured".to_string(), json!("Jorge Alvarez"))].into(),
                    ..Default::default()
                },
            ),
            plain(
                "c",
                DocumentFindings {
                    entities: [("insured".to_string(), json!("Jorge Alvarez"))].into(),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        // "Jorge Alvarez" wins because provider c wrote last, not because two
        // providers agree on it.
        assert_eq!(
            result.findings.entities.get("insured"),
            Some(&json!("Jorge Alvarez"))
        );
        assert_eq!(
            result.findings.entities.get("carrier"),
            Some(&json!("Gulfstream Mutual"))
        );
    }

    #[test]
    fn specialist_damage_assessment_overrides_majority() {
        let moderate = DamageAssessment {
            severity: Some(Severity::Moderate),
            estimated_cost: Some(10_000.0),
            description: None,
        };
        let severe = DamageAssessment {
            severity: Some(Severity::Severe),
            estimated_cost: Some(45_000.0),
            description: Some("roof breach, standing water".to_string()),
        };

        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    damage_assessment: Some(moderate.clone()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    damage_assessment: Some(moderate),
                    ..Default::default()
                },
            ),
            report(
                "realtime",
                vec![Specialty::RealTime, Specialty::AnomalyDetection],
                DocumentFindings {
                    damage_assessment: Some(severe.clone()),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.damage_assessment, Some(severe));
    }

    #[test]
    fn without_specialist_severity_votes_and_costs_average() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    damage_assessment: Some(DamageAssessment {
                        severity: Some(Severity::Moderate),
                        estimated_cost: Some(8_000.0),
                        description: Some("water intrusion".to_string()),
                    }),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    damage_assessment: Some(DamageAssessment {
                        severity: Some(Severity::Moderate),
                        estimated_cost: Some(12_000.0),
                        description: None,
                    }),
                    ..Default::default()
                },
            ),
            plain(
                "c",
                DocumentFindings {
                    damage_assessment: Some(DamageAssessment {
                        severity: Some(Severity::Severe),
                        estimated_cost: None,
                        description: None,
                    }),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        let merged = result.findings.damage_assessment.unwrap();
        assert_eq!(merged.severity, Some(Severity::Moderate));
        assert_eq!(merged.estimated_cost, Some(10_000.0));
        assert_eq!(merged.description.as_deref(), Some("water intrusion"));
    }

    #[test]
    fn anomalies_union_dedupes_by_full_value() {
        let shared = AnomalyFinding {
            label: "date-mismatch".to_string(),
            detail: Some("loss date precedes policy inception".to_string()),
        };
        let unique = AnomalyFinding {
            label: "altered-text".to_string(),
            detail: None,
        };

        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    anomalies: vec![shared.clone()],
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    anomalies: vec![shared.clone(), unique.clone()],
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(result.findings.anomalies, vec![shared, unique]);
    }

    #[test]
    fn longest_suggested_name_wins() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    suggested_name: Some("claim".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    suggested_name: Some("hurricane-ian-roof-claim-2024".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(
            result.findings.suggested_name.as_deref(),
            Some("hurricane-ian-roof-claim-2024")
        );
    }

    #[test]
    fn single_provider_uses_its_own_confidence() {
        let reports = vec![plain(
            "a",
            DocumentFindings {
                confidence: Some(0.9),
                ..Default::default()
            },
        )];
        assert_eq!(merge(&reports).unwrap().confidence, 0.9);

        let reports = vec![plain("a", DocumentFindings::default())];
        assert_eq!(merge(&reports).unwrap().confidence, DEFAULT_PROVIDER_CONFIDENCE);
    }

    #[test]
    fn confidence_stays_strictly_between_zero_and_one() {
        // A lone provider that is certain of itself still caps below 1.0.
        let reports = vec![plain(
            "a",
            DocumentFindings {
                confidence: Some(1.0),
                ..Default::default()
            },
        )];
        let confidence = merge(&reports).unwrap().confidence;
        assert!(confidence > 0.0 && confidence < 1.0);

        // Full agreement plus the specialist bonus also caps below 1.0.
        let agreed = DocumentFindings {
            document_type: Some("claim".to_string()),
            category: Some("claims".to_string()),
            dates: vec!["2024-09-28".to_string()],
            ..Default::default()
        };
        let reports = vec![
            report("realtime", vec![Specialty::AnomalyDetection], agreed.clone()),
            plain("b", agreed.clone()),
            plain("c", agreed),
        ];
        let confidence = merge(&reports).unwrap().confidence;
        assert!(confidence > 0.0 && confidence < 1.0);
        assert_eq!(confidence, MAX_CONFIDENCE);

        // Total disagreement still floors above 0.
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    document_type: Some("claim".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    document_type: Some("invoice".to_string()),
                    ..Default::default()
                },
            ),
        ];
        let confidence = merge(&reports).unwrap().confidence;
        assert!(confidence > 0.0 && confidence < 1.0);
    }

    #[test]
    fn agreement_ratio_gives_partial_credit() {
        // Three providers, two agreeing on documentType: that core field
        // scores (3 - 2 + 1) / 3 = 2/3; the other three score 1.
        let agreeing = DocumentFindings {
            document_type: Some("policy".to_string()),
            ..Default::default()
        };
        let dissenting = DocumentFindings {
            document_type: Some("legal".to_string()),
            ..Default::default()
        };
        let reports = vec![
            plain("a", agreeing.clone()),
            plain("b", agreeing),
            plain("c", dissenting),
        ];

        let expected = (2.0 / 3.0 + 3.0) / 4.0;
        let confidence = merge(&reports).unwrap().confidence;
        assert!((confidence - expected).abs() < 1e-9);
    }

    #[test]
    fn merge_is_deterministic_and_idempotent() {
        let reports = vec![
            report(
                "realtime",
                vec![Specialty::RealTime],
                DocumentFindings {
                    document_type: Some("claim".to_string()),
                    dates: vec!["2024-10-01".to_string()],
                    anomalies: vec![AnomalyFinding {
                        label: "signature-missing".to_string(),
                        detail: None,
                    }],
                    confidence: Some(0.8),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    document_type: Some("claim".to_string()),
                    dates: vec!["2024-09-28".to_string(), "2024-10-01".to_string()],
                    suggested_name: Some("storm-claim-intake".to_string()),
                    confidence: Some(0.7),
                    ..Default::default()
                },
            ),
        ];

        let first = merge(&reports).unwrap();
        let second = merge(&reports).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn divergences_record_overruled_providers() {
        let reports = vec![
            plain(
                "a",
                DocumentFindings {
                    document_type: Some("policy".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "b",
                DocumentFindings {
                    document_type: Some("policy".to_string()),
                    ..Default::default()
                },
            ),
            plain(
                "c",
                DocumentFindings {
                    document_type: Some("legal".to_string()),
                    ..Default::default()
                },
            ),
        ];

        let result = merge(&reports).unwrap();
        assert_eq!(
            result.divergences,
            vec![Divergence {
                provider: "c".to_string(),
                field: "documentType".to_string(),
                reported: json!("legal"),
            }]
        );
    }

    #[test]
    fn providers_are_listed_in_invocation_order() {
        let reports = vec![
            plain("second-prior", DocumentFindings::default()),
            plain("first-prior", DocumentFindings::default()),
        ];
        let result = merge(&reports).unwrap();
        assert_eq!(result.providers, ["second-prior", "first-prior"]);
    }
}
