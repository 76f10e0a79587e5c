use serde::{Deserialize, Serialize};

use super::normalizer::{normalize, ValidatedMetrics};
use super::weights::{self, stability as w, FULL_MARKS, HALF_MARKS};
use super::CategoryScore;

/// Component scores for employment stability, each in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityComponents {
    pub gig_type: f64,
    pub permanent_employment: f64,
    pub years_of_employment: f64,
    pub fluctuation_rate: f64,
}

pub fn is_high_value_gig(type_of_gig: &str) -> bool {
    w::HIGH_VALUE_GIGS.contains(&type_of_gig)
}

pub(crate) fn score_stability(metrics: &ValidatedMetrics) -> CategoryScore<StabilityComponents> {
    let gig_type = if is_high_value_gig(&metrics.type_of_gig) {
        FULL_MARKS
    } else {
        HALF_MARKS
    };

    let permanent_employment = if metrics.permanent_employment == w::PERMANENT_MARKER {
        FULL_MARKS
    } else {
        HALF_MARKS
    };

    let capped_years = metrics.years_of_employment.min(w::YEARS_CEILING);
    let years_of_employment = normalize(capped_years / w::YEARS_CEILING * 100.0);

    // fluctuation_rate lives in [0, 1]; the refresh job writes it in that domain.
    let fluctuation_rate = normalize((1.0 - metrics.fluctuation_rate) * 100.0);

    let components = StabilityComponents {
        gig_type,
        permanent_employment,
        years_of_employment,
        fluctuation_rate,
    };

    let raw = w::GIG_TYPE * components.gig_type
        + w::PERMANENT_EMPLOYMENT * components.permanent_employment
        + w::YEARS_OF_EMPLOYMENT * components.years_of_employment
        + w::FLUCTUATION * components.fluctuation_rate;

    CategoryScore::new(weights::STABILITY_WEIGHT, raw, components)
}
