//! Range clamping applied to every raw metric before it reaches a scorer.
//!
//! Out-of-range values are clamped rather than rejected so a dashboard can
//! always render a number. Missing numeric fields count as zero. Only `NaN`,
//! which has no meaningful clamp, is surfaced as [`InvalidInput`].

use super::super::domain::FinancialMetricsRecord;

/// Clamp a score into `[0, 100]`.
pub fn normalize(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Clamp a ratio into `[0, 1]`.
pub fn clamp_ratio(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// A numeric metric held a value that cannot be coerced into its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("metric `{field}` is not a number")]
pub struct InvalidInput {
    pub field: &'static str,
}

pub(crate) fn checked(field: &'static str, value: f64) -> Result<f64, InvalidInput> {
    if value.is_nan() {
        Err(InvalidInput { field })
    } else {
        Ok(value)
    }
}

fn ratio(field: &'static str, value: Option<f64>) -> Result<f64, InvalidInput> {
    checked(field, value.unwrap_or(0.0)).map(clamp_ratio)
}

/// Metrics after coercion and clamping; every ratio is guaranteed to be in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMetrics {
    pub cancellation_rate: f64,
    pub ratings: f64,
    pub responsiveness_to_task: f64,
    pub min_max_diff: f64,
    pub ratings_influx: f64,
    pub type_of_gig: String,
    pub permanent_employment: String,
    pub years_of_employment: f64,
    pub fluctuation_rate: f64,
    pub impulsive_purchase_rate: f64,
    pub recurring_expense_consistency: f64,
    pub expense_to_income_ratio: f64,
    pub regular_saving: bool,
    pub emergency_fund_availability: bool,
    pub consistent_spending: bool,
}

impl ValidatedMetrics {
    pub fn from_record(record: &FinancialMetricsRecord) -> Result<Self, InvalidInput> {
        let years = checked(
            "years_of_employment",
            record.years_of_employment.unwrap_or(0.0),
        )?;

        Ok(Self {
            cancellation_rate: ratio("cancellation_rate", record.cancellation_rate)?,
            ratings: ratio("ratings", record.ratings)?,
            responsiveness_to_task: ratio(
                "responsiveness_to_task",
                record.responsiveness_to_task,
            )?,
            min_max_diff: ratio(
                "min_max_diff_past_6_months",
                record.min_max_diff_past_6_months,
            )?,
            ratings_influx: ratio("ratings_influx", record.ratings_influx)?,
            type_of_gig: record.type_of_gig.clone(),
            permanent_employment: record.permanent_employment.clone(),
            years_of_employment: years.max(0.0),
            fluctuation_rate: ratio("fluctuation_rate", record.fluctuation_rate)?,
            impulsive_purchase_rate: ratio(
                "impulsive_purchase_rate",
                record.impulsive_purchase_rate,
            )?,
            recurring_expense_consistency: ratio(
                "recurring_expense_consistency",
                record.recurring_expense_consistency,
            )?,
            expense_to_income_ratio: ratio(
                "expense_to_income_ratio",
                record.expense_to_income_ratio,
            )?,
            regular_saving: record.regular_saving,
            emergency_fund_availability: record.emergency_fund_availability,
            consistent_spending: record.consistent_spending,
        })
    }
}
