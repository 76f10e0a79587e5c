mod financial_habits;
pub mod normalizer;
mod professionalism;
mod risk;
mod stability;
pub mod weights;

pub use financial_habits::{
    luxury_to_necessity_ratio, FinancialHabitsComponents, FinancialHabitsDetails,
};
pub use normalizer::{clamp_ratio, normalize, InvalidInput, ValidatedMetrics};
pub use professionalism::ProfessionalismComponents;
pub use risk::{aggregate, RiskCategory};
pub use stability::{is_high_value_gig, StabilityComponents};

use super::domain::{FinancialMetricsRecord, IdentityNumber, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Stateless engine turning one metrics snapshot plus its transactions into a score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        record: &FinancialMetricsRecord,
        transactions: &[TransactionRecord],
    ) -> Result<ScoreResult, InvalidInput> {
        let metrics = ValidatedMetrics::from_record(record)?;

        let professionalism = professionalism::score_professionalism(&metrics);
        let stability = stability::score_stability(&metrics);
        let financial_habits = financial_habits::score_financial_habits(&metrics, transactions);

        let (final_score, risk_category) = aggregate(
            professionalism.weighted_score,
            stability.weighted_score,
            financial_habits.weighted_score,
        );

        Ok(ScoreResult {
            identity_number: record.identity_number.clone(),
            final_score,
            risk_category,
            breakdown: ScoreBreakdown {
                professionalism,
                stability,
                financial_habits,
            },
            metrics: MetricsSnapshot::from(&metrics),
        })
    }
}

/// One category's share of the final score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore<C> {
    pub weight: f64,
    /// Contribution to the final score: `raw_score * weight`.
    pub weighted_score: f64,
    /// Weighted combination of the components before the category weight, in `[0, 100]`.
    pub raw_score: f64,
    pub components: C,
}

impl<C> CategoryScore<C> {
    pub(crate) fn new(weight: f64, raw: f64, components: C) -> Self {
        let raw_score = normalize(raw);
        Self {
            weight,
            weighted_score: raw_score * weight,
            raw_score,
            components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub professionalism: CategoryScore<ProfessionalismComponents>,
    pub stability: CategoryScore<StabilityComponents>,
    pub financial_habits: CategoryScore<FinancialHabitsComponents>,
}

/// Clamped inputs echoed back so a reader can see what was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub cancellation_rate: f64,
    pub fluctuation_rate: f64,
    pub expense_to_income_ratio: f64,
    pub impulsive_purchase_rate: f64,
    pub type_of_gig: String,
    pub recurring_expense_consistency: f64,
}

impl From<&ValidatedMetrics> for MetricsSnapshot {
    fn from(metrics: &ValidatedMetrics) -> Self {
        Self {
            cancellation_rate: metrics.cancellation_rate,
            fluctuation_rate: metrics.fluctuation_rate,
            expense_to_income_ratio: metrics.expense_to_income_ratio,
            impulsive_purchase_rate: metrics.impulsive_purchase_rate,
            type_of_gig: metrics.type_of_gig.clone(),
            recurring_expense_consistency: metrics.recurring_expense_consistency,
        }
    }
}

/// Complete scoring contract handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub identity_number: IdentityNumber,
    pub final_score: f64,
    pub risk_category: RiskCategory,
    pub breakdown: ScoreBreakdown,
    pub metrics: MetricsSnapshot,
}

impl ScoreResult {
    /// Rounded summary used by the landing dashboard.
    ///
    /// Only the numbers are rounded. `risk_level` keeps the band of the
    /// unrounded score, so 79.996 renders as `80.0` with `MediumRisk`.
    pub fn dashboard_view(&self, name: Option<String>) -> DashboardView {
        DashboardView {
            identity_number: self.identity_number.clone(),
            name,
            credit_score: round2(self.final_score),
            risk_level: self.risk_category,
            breakdown: DashboardBreakdown {
                professionalism: round2(self.breakdown.professionalism.weighted_score),
                stability: round2(self.breakdown.stability.weighted_score),
                financial_habits: round2(self.breakdown.financial_habits.weighted_score),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub identity_number: IdentityNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub credit_score: f64,
    pub risk_level: RiskCategory,
    pub breakdown: DashboardBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBreakdown {
    pub professionalism: f64,
    pub stability: f64,
    pub financial_habits: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
