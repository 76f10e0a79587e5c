use serde::{Deserialize, Serialize};

use super::normalizer::normalize;
use super::weights::{LOW_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};

/// Risk band derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Low Risk")]
    LowRisk,
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl RiskCategory {
    /// Bands are inclusive at their lower bound.
    pub fn classify(final_score: f64) -> Self {
        if final_score >= LOW_RISK_THRESHOLD {
            RiskCategory::LowRisk
        } else if final_score >= MEDIUM_RISK_THRESHOLD {
            RiskCategory::MediumRisk
        } else {
            RiskCategory::HighRisk
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::LowRisk => "Low Risk",
            RiskCategory::MediumRisk => "Medium Risk",
            RiskCategory::HighRisk => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Sum the three weighted contributions into a final score and its band.
pub fn aggregate(
    professionalism: f64,
    stability: f64,
    financial_habits: f64,
) -> (f64, RiskCategory) {
    let final_score = normalize(professionalism + stability + financial_habits);
    (final_score, RiskCategory::classify(final_score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_at_lower_bound() {
        assert_eq!(RiskCategory::classify(80.0), RiskCategory::LowRisk);
        assert_eq!(RiskCategory::classify(79.99), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::classify(60.0), RiskCategory::MediumRisk);
        assert_eq!(RiskCategory::classify(59.99), RiskCategory::HighRisk);
        assert_eq!(RiskCategory::classify(0.0), RiskCategory::HighRisk);
    }

    #[test]
    fn aggregate_matches_reference_contributions() {
        assert_eq!(aggregate(30.0, 40.0, 30.0), (100.0, RiskCategory::LowRisk));
        assert_eq!(aggregate(15.0, 24.0, 18.0), (57.0, RiskCategory::HighRisk));
        assert_eq!(aggregate(15.0, 28.0, 20.0), (63.0, RiskCategory::MediumRisk));
    }

    #[test]
    fn aggregate_clamps_out_of_range_sums() {
        assert_eq!(aggregate(60.0, 40.0, 30.0).0, 100.0);
        assert_eq!(aggregate(-10.0, 0.0, 0.0).0, 0.0);
    }

    #[test]
    fn categories_serialize_as_display_labels() {
        let json = serde_json::to_string(&RiskCategory::MediumRisk).expect("serializes");
        assert_eq!(json, "\"Medium Risk\"");
    }
}
