use serde::{Deserialize, Serialize};

use super::normalizer::{normalize, ValidatedMetrics};
use super::weights::{self, professionalism as w};
use super::CategoryScore;

/// Component scores for task fulfilment and rating quality, each in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalismComponents {
    pub fulfilling_rate: f64,
    pub rating: f64,
    pub responsiveness: f64,
    pub min_max_diff: f64,
    pub influx: f64,
}

pub(crate) fn score_professionalism(
    metrics: &ValidatedMetrics,
) -> CategoryScore<ProfessionalismComponents> {
    // Lower cancellation means more tasks fulfilled.
    let fulfilling_rate = normalize((1.0 - metrics.cancellation_rate) * 100.0);

    let components = ProfessionalismComponents {
        fulfilling_rate,
        rating: normalize(metrics.ratings * 100.0),
        responsiveness: normalize(metrics.responsiveness_to_task * 100.0),
        min_max_diff: normalize(metrics.min_max_diff * 100.0),
        influx: normalize(metrics.ratings_influx * 100.0),
    };

    let raw = w::FULFILLING_RATE * components.fulfilling_rate
        + w::RATING * components.rating
        + w::RESPONSIVENESS * components.responsiveness
        + w::MIN_MAX_DIFF * components.min_max_diff
        + w::INFLUX * components.influx;

    CategoryScore::new(weights::PROFESSIONALISM_WEIGHT, raw, components)
}
