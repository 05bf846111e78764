//! Provider selection policy.

use std::sync::Arc;

use crate::providers::base::Provider;
use crate::providers::registry::ProviderRegistry;
use crate::request::{AnalysisRequest, DocumentKind};

/// How many providers a disaster-peril claim fans out to.
const DISASTER_PANEL_SIZE: usize = 3;
/// Panel size for routine documents.
const DEFAULT_PANEL_SIZE: usize = 2;

/// Choose the providers to consult for one request, in invocation order.
///
/// Pure function of the request and the registry; every sort is stable so
/// ties fall back to registry insertion order and selection is deterministic.
pub fn select(registry: &ProviderRegistry, request: &AnalysisRequest) -> Vec<Arc<dyn Provider>> {
    let all = registry.list_all();

    // Disaster perils: lead with the anomaly-detection specialist, back it
    // with a reasoning specialist, fill the rest of the panel in order.
    if request.context.is_disaster_peril() {
        let mut ranked: Vec<Arc<dyn Provider>> = all.to_vec();
        ranked.sort_by_key(|provider| {
            let descriptor = provider.descriptor();
            if descriptor.is_anomaly_specialist() {
                0
            } else if descriptor.is_reasoning_specialist() {
                1
            } else {
                2
            }
        });
        ranked.truncate(DISASTER_PANEL_SIZE);
        return ranked;
    }

    // Complex documents get every available opinion.
    if matches!(request.kind, Some(DocumentKind::Policy | DocumentKind::Legal)) {
        return all.to_vec();
    }

    let mut ranked: Vec<Arc<dyn Provider>> = all.to_vec();
    ranked.sort_by(|a, b| {
        b.descriptor()
            .confidence_prior
            .total_cmp(&a.descriptor().confidence_prior)
    });
    ranked.truncate(DEFAULT_PANEL_SIZE);
    ranked
}
