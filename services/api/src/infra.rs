use behavioral_score::error::AppError;
use behavioral_score::scoring::dataset::{load_metrics_from_path, load_transactions_from_path};
use behavioral_score::scoring::{
    DerivedMetrics, FinancialMetricsRecord, IdentityNumber, MetricsRecordId, MetricsRepository,
    RepositoryError, TransactionRecord, TransactionWindow,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local store backing the service when no database is attached.
#[derive(Default, Clone)]
pub(crate) struct InMemoryMetricsRepository {
    metrics: Arc<Mutex<Vec<FinancialMetricsRecord>>>,
    transactions: Arc<Mutex<Vec<TransactionRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

impl InMemoryMetricsRepository {
    pub(crate) fn seeded(
        metrics: Vec<FinancialMetricsRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        Self {
            metrics: Arc::new(Mutex::new(metrics)),
            transactions: Arc::new(Mutex::new(transactions)),
        }
    }

    /// Load snapshots from `metrics_csv` and, when given, transactions from `transactions_csv`.
    pub(crate) fn from_csv(
        metrics_csv: &Path,
        transactions_csv: Option<&Path>,
    ) -> Result<Self, AppError> {
        let metrics = load_metrics_from_path(metrics_csv)?;
        let transactions = match transactions_csv {
            Some(path) => load_transactions_from_path(path)?,
            None => Vec::new(),
        };

        info!(
            metrics = metrics.len(),
            transactions = transactions.len(),
            source = %metrics_csv.display(),
            "loaded behavioral score dataset"
        );

        Ok(Self::seeded(metrics, transactions))
    }
}

impl MetricsRepository for InMemoryMetricsRepository {
    fn latest_metrics(
        &self,
        identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError> {
        let guard = lock(&self.metrics)?;
        Ok(guard
            .iter()
            .filter(|record| &record.identity_number == identity)
            .max_by_key(|record| record.timestamp)
            .cloned())
    }

    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError> {
        let guard = lock(&self.metrics)?;
        Ok(guard
            .iter()
            .max_by_key(|record| record.timestamp)
            .map(|record| record.identity_number.clone()))
    }

    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError> {
        Ok(lock(&self.metrics)?.clone())
    }

    fn transactions(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        let guard = lock(&self.transactions)?;
        Ok(guard
            .iter()
            .filter(|transaction| &transaction.identity_number == identity)
            .filter(|transaction| window.map_or(true, |window| window.contains(transaction)))
            .cloned()
            .collect())
    }

    fn apply_derived(
        &self,
        id: &MetricsRecordId,
        derived: &DerivedMetrics,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.metrics)?;
        let record = guard
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *record = record.with_derived(derived);
        Ok(())
    }
}
