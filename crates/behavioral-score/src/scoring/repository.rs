use super::domain::{
    DerivedMetrics, FinancialMetricsRecord, IdentityNumber, MetricsRecordId, TransactionRecord,
    TransactionWindow,
};

/// Data-access boundary injected into the service and the refresh job.
///
/// Implementations resolve "current" metrics themselves: several snapshots
/// may exist per identity and the one with the latest `timestamp` wins.
pub trait MetricsRepository: Send + Sync {
    /// Most recent snapshot for the identity, if any.
    fn latest_metrics(
        &self,
        identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError>;

    /// Identity owning the most recent snapshot across the whole store.
    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError>;

    /// Every stored snapshot, historical ones included.
    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError>;

    fn transactions(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError>;

    /// Overwrite `fluctuation_rate` and `expense_to_income_ratio` on one
    /// snapshot in a single write, leaving every other field untouched.
    fn apply_derived(
        &self,
        id: &MetricsRecordId,
        derived: &DerivedMetrics,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
