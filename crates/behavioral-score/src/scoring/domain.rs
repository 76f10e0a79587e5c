use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity number correlating one subject's metrics snapshots and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityNumber(pub String);

impl IdentityNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable identifier of a single metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricsRecordId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

/// Point-in-time snapshot of a subject's financial and employment metrics.
///
/// Several snapshots may exist per identity; the most recent `timestamp` wins.
/// Numeric inputs are optional because upstream ingestion may omit them; the
/// normalizer coerces a missing value to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetricsRecord {
    pub id: MetricsRecordId,
    pub identity_number: IdentityNumber,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub cancellation_rate: Option<f64>,
    #[serde(default)]
    pub ratings: Option<f64>,
    #[serde(default)]
    pub responsiveness_to_task: Option<f64>,
    #[serde(default)]
    pub min_max_diff_past_6_months: Option<f64>,
    #[serde(default)]
    pub ratings_influx: Option<f64>,
    #[serde(default)]
    pub type_of_gig: String,
    #[serde(default)]
    pub permanent_employment: String,
    #[serde(default)]
    pub years_of_employment: Option<f64>,
    #[serde(default)]
    pub fluctuation_rate: Option<f64>,
    #[serde(default)]
    pub gross_income: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub impulsive_purchase_rate: Option<f64>,
    #[serde(default)]
    pub recurring_expense_consistency: Option<f64>,
    #[serde(default)]
    pub expense_to_income_ratio: Option<f64>,
    #[serde(default)]
    pub regular_saving: bool,
    #[serde(default)]
    pub emergency_fund_availability: bool,
    #[serde(default)]
    pub consistent_spending: bool,
    pub timestamp: DateTime<Utc>,
}

impl FinancialMetricsRecord {
    /// Copy of the record with only the refresh-owned fields replaced.
    pub fn with_derived(&self, derived: &DerivedMetrics) -> Self {
        Self {
            fluctuation_rate: Some(derived.fluctuation_rate),
            expense_to_income_ratio: Some(derived.expense_to_income_ratio),
            ..self.clone()
        }
    }
}

/// Signed money movement: positive amounts are income, negative amounts are expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub identity_number: IdentityNumber,
    pub spending_amount: f64,
    /// `true` when the purchase was a necessity.
    pub necessities_or_non_essential: bool,
    pub booked_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn is_income(&self) -> bool {
        self.spending_amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.spending_amount < 0.0
    }

    pub fn is_luxury(&self) -> bool {
        !self.necessities_or_non_essential
    }
}

/// Inclusive booking-date filter a caller may apply to the transaction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TransactionWindow {
    /// Window from optional bounds. `None` when neither bound is given; an
    /// open side extends to the earliest or latest representable instant.
    pub fn new(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, InvalidWindow> {
        if from.is_none() && to.is_none() {
            return Ok(None);
        }

        let start = from.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        if start > end {
            return Err(InvalidWindow { start, end });
        }

        Ok(Some(Self { start, end }))
    }

    pub fn contains(&self, transaction: &TransactionRecord) -> bool {
        transaction.booked_at >= self.start && transaction.booked_at <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transaction window starts at {start} after it ends at {end}")]
pub struct InvalidWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Where the refresh job sourced the monthly income figure from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeSource {
    NetIncome,
    GrossIncome,
    Transactions,
    Unavailable,
}

impl IncomeSource {
    pub const fn label(self) -> &'static str {
        match self {
            IncomeSource::NetIncome => "net_income",
            IncomeSource::GrossIncome => "gross_income",
            IncomeSource::Transactions => "transactions",
            IncomeSource::Unavailable => "none",
        }
    }
}

/// Output of one refresh computation: the two derived fields plus audit context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub fluctuation_rate: f64,
    pub expense_to_income_ratio: f64,
    pub monthly_income: f64,
    pub income_source: IncomeSource,
    pub explanation: String,
}
