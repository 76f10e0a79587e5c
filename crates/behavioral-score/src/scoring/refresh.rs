//! Batch recomputation of the transaction-derived metrics fields.
//!
//! Every stored snapshot gets a fresh `fluctuation_rate` and
//! `expense_to_income_ratio`, both in `[0, 1]`. Records are processed on a
//! dedicated rayon pool; one record failing never aborts the batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    DerivedMetrics, FinancialMetricsRecord, IdentityNumber, IncomeSource, MetricsRecordId,
    TransactionRecord,
};
use super::engine::{clamp_ratio, InvalidInput};
use super::repository::{MetricsRepository, RepositoryError};

/// Mid-scale fluctuation assumed when fewer than two income transactions exist.
pub const DEFAULT_FLUCTUATION_RATE: f64 = 0.5;
/// Months of history the transaction set is assumed to span.
pub const INCOME_OBSERVATION_MONTHS: f64 = 3.0;
const FLUCTUATION_SCALE: f64 = 0.5;
const ADVERSE_EXPENSE_RATIO: f64 = 1.0;

fn finite(field: &'static str, value: f64) -> Result<f64, InvalidInput> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInput { field })
    }
}

fn fluctuation_rate(incomes: &[f64]) -> f64 {
    if incomes.len() < 2 {
        return DEFAULT_FLUCTUATION_RATE;
    }

    let max = incomes.iter().copied().fold(f64::MIN, f64::max);
    let min = incomes.iter().copied().fold(f64::MAX, f64::min);
    let mean = incomes.iter().sum::<f64>() / incomes.len() as f64;

    clamp_ratio((max - min) / mean * FLUCTUATION_SCALE)
}

/// Recompute the derived fields for one snapshot from its identity's transactions.
pub fn derive_metrics(
    record: &FinancialMetricsRecord,
    transactions: &[TransactionRecord],
) -> Result<DerivedMetrics, InvalidInput> {
    let mut incomes = Vec::new();
    let mut total_expenses = 0.0;
    for transaction in transactions {
        let amount = finite("spending_amount", transaction.spending_amount)?;
        if amount > 0.0 {
            incomes.push(amount);
        } else if amount < 0.0 {
            total_expenses += amount.abs();
        }
    }

    let net_income = finite("net_income", record.net_income.unwrap_or(0.0))?;
    let gross_income = finite("gross_income", record.gross_income.unwrap_or(0.0))?;

    let (monthly_income, income_source) = if net_income > 0.0 {
        (net_income, IncomeSource::NetIncome)
    } else if gross_income > 0.0 {
        (gross_income, IncomeSource::GrossIncome)
    } else if !incomes.is_empty() {
        (
            incomes.iter().sum::<f64>() / INCOME_OBSERVATION_MONTHS,
            IncomeSource::Transactions,
        )
    } else {
        (0.0, IncomeSource::Unavailable)
    };

    let (expense_to_income_ratio, explanation) =
        match (monthly_income > 0.0, total_expenses > 0.0) {
            (true, true) => (
                clamp_ratio(total_expenses / monthly_income),
                format!("{total_expenses:.2} / {monthly_income:.2}"),
            ),
            (true, false) => (
                ADVERSE_EXPENSE_RATIO,
                "income recorded without any expense transactions".to_string(),
            ),
            (false, true) => (
                ADVERSE_EXPENSE_RATIO,
                "expenses recorded without any income".to_string(),
            ),
            (false, false) => (
                ADVERSE_EXPENSE_RATIO,
                "no income or expense data available".to_string(),
            ),
        };

    Ok(DerivedMetrics {
        fluctuation_rate: fluctuation_rate(&incomes),
        expense_to_income_ratio,
        monthly_income,
        income_source,
        explanation,
    })
}

/// Cooperative cancellation flag checked before each record is refreshed.
#[derive(Debug, Clone)]
pub struct RefreshCancellation {
    flag: Arc<AtomicBool>,
}

impl RefreshCancellation {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl Default for RefreshCancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Tuning for the refresh job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Upper bound on records processed at once.
    pub concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// One record the job could not refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub identity_number: IdentityNumber,
    pub record_id: MetricsRecordId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub updated_count: usize,
    pub failures: Vec<RefreshFailure>,
    /// Records left untouched because the run was cancelled first.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Job-level failure; per-record problems land in [`RefreshSummary::failures`].
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("failed to start refresh workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, thiserror::Error)]
enum RecordError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
}

enum RecordOutcome {
    Updated,
    Failed(RefreshFailure),
    Skipped,
}

pub struct MetricsRefreshJob<R> {
    repository: Arc<R>,
    config: RefreshConfig,
}

impl<R> MetricsRefreshJob<R>
where
    R: MetricsRepository,
{
    pub fn new(repository: Arc<R>, config: RefreshConfig) -> Self {
        Self { repository, config }
    }

    /// Refresh every stored snapshot, blocking until the batch finishes or is cancelled.
    pub fn run(&self, cancellation: &RefreshCancellation) -> Result<RefreshSummary, RefreshError> {
        let records = self.repository.all_metrics()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency.max(1))
            .build()?;

        let outcomes: Vec<RecordOutcome> = pool.install(|| {
            records
                .par_iter()
                .map(|record| {
                    if cancellation.is_cancelled() {
                        return RecordOutcome::Skipped;
                    }

                    match self.refresh_record(record) {
                        Ok(()) => RecordOutcome::Updated,
                        Err(err) => {
                            warn!(
                                identity = %record.identity_number,
                                record = %record.id.0,
                                error = %err,
                                "metrics refresh failed for record"
                            );
                            RecordOutcome::Failed(RefreshFailure {
                                identity_number: record.identity_number.clone(),
                                record_id: record.id.clone(),
                                reason: err.to_string(),
                            })
                        }
                    }
                })
                .collect()
        });

        let mut summary = RefreshSummary {
            updated_count: 0,
            failures: Vec::new(),
            skipped: 0,
            cancelled: cancellation.is_cancelled(),
        };
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Updated => summary.updated_count += 1,
                RecordOutcome::Failed(failure) => summary.failures.push(failure),
                RecordOutcome::Skipped => summary.skipped += 1,
            }
        }

        info!(
            updated = summary.updated_count,
            failed = summary.failures.len(),
            skipped = summary.skipped,
            cancelled = summary.cancelled,
            "metrics refresh finished"
        );

        Ok(summary)
    }

    fn refresh_record(&self, record: &FinancialMetricsRecord) -> Result<(), RecordError> {
        let transactions = self
            .repository
            .transactions(&record.identity_number, None)?;
        let derived = derive_metrics(record, &transactions)?;

        debug!(
            identity = %record.identity_number,
            record = %record.id.0,
            income_source = derived.income_source.label(),
            monthly_income = derived.monthly_income,
            fluctuation_rate = derived.fluctuation_rate,
            expense_to_income_ratio = derived.expense_to_income_ratio,
            explanation = %derived.explanation,
            "derived metrics recomputed"
        );

        self.repository.apply_derived(&record.id, &derived)?;
        Ok(())
    }
}
