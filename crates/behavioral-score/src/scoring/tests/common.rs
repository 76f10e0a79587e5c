use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::scoring::domain::{
    DerivedMetrics, FinancialMetricsRecord, IdentityNumber, MetricsRecordId, TransactionId,
    TransactionRecord, TransactionWindow,
};
use crate::scoring::refresh::{RefreshCancellation, RefreshConfig};
use crate::scoring::repository::{MetricsRepository, RepositoryError};
use crate::scoring::service::BehavioralScoreService;

pub(super) const EPSILON: f64 = 1e-9;

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn identity(value: &str) -> IdentityNumber {
    IdentityNumber(value.to_string())
}

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// A strong, fully populated snapshot.
pub(super) fn metrics_record(ic: &str, suffix: &str) -> FinancialMetricsRecord {
    FinancialMetricsRecord {
        id: MetricsRecordId(format!("metrics-{ic}-{suffix}")),
        identity_number: identity(ic),
        full_name: Some("Farah Lim".to_string()),
        cancellation_rate: Some(0.1),
        ratings: Some(0.9),
        responsiveness_to_task: Some(0.8),
        min_max_diff_past_6_months: Some(0.3),
        ratings_influx: Some(0.6),
        type_of_gig: "Software Development".to_string(),
        permanent_employment: "Yes".to_string(),
        years_of_employment: Some(6.0),
        fluctuation_rate: Some(0.2),
        gross_income: Some(6000.0),
        net_income: Some(4800.0),
        impulsive_purchase_rate: Some(0.15),
        recurring_expense_consistency: Some(0.9),
        expense_to_income_ratio: Some(0.4),
        regular_saving: true,
        emergency_fund_availability: true,
        consistent_spending: true,
        timestamp: at(2025, 3, 1),
    }
}

/// A snapshot with every optional metric missing and every flag false.
pub(super) fn empty_record(ic: &str) -> FinancialMetricsRecord {
    FinancialMetricsRecord {
        id: MetricsRecordId(format!("metrics-{ic}-empty")),
        identity_number: identity(ic),
        full_name: None,
        cancellation_rate: None,
        ratings: None,
        responsiveness_to_task: None,
        min_max_diff_past_6_months: None,
        ratings_influx: None,
        type_of_gig: String::new(),
        permanent_employment: String::new(),
        years_of_employment: None,
        fluctuation_rate: None,
        gross_income: None,
        net_income: None,
        impulsive_purchase_rate: None,
        recurring_expense_consistency: None,
        expense_to_income_ratio: None,
        regular_saving: false,
        emergency_fund_availability: false,
        consistent_spending: false,
        timestamp: at(2025, 1, 1),
    }
}

pub(super) fn transaction(
    ic: &str,
    seq: u32,
    amount: f64,
    necessity: bool,
    booked_at: DateTime<Utc>,
) -> TransactionRecord {
    TransactionRecord {
        id: TransactionId(format!("txn-{ic}-{seq}")),
        identity_number: identity(ic),
        spending_amount: amount,
        necessities_or_non_essential: necessity,
        booked_at,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) metrics: Arc<Mutex<Vec<FinancialMetricsRecord>>>,
    pub(super) transactions: Arc<Mutex<Vec<TransactionRecord>>>,
}

impl MemoryRepository {
    pub(super) fn seeded(
        metrics: Vec<FinancialMetricsRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        Self {
            metrics: Arc::new(Mutex::new(metrics)),
            transactions: Arc::new(Mutex::new(transactions)),
        }
    }

    pub(super) fn record(&self, id: &MetricsRecordId) -> FinancialMetricsRecord {
        self.metrics
            .lock()
            .expect("repository mutex poisoned")
            .iter()
            .find(|record| &record.id == id)
            .cloned()
            .expect("record present")
    }
}

impl MetricsRepository for MemoryRepository {
    fn latest_metrics(
        &self,
        identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError> {
        let guard = self.metrics.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.identity_number == identity)
            .max_by_key(|record| record.timestamp)
            .cloned())
    }

    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError> {
        let guard = self.metrics.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .max_by_key(|record| record.timestamp)
            .map(|record| record.identity_number.clone()))
    }

    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError> {
        Ok(self
            .metrics
            .lock()
            .expect("repository mutex poisoned")
            .clone())
    }

    fn transactions(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        let guard = self.transactions.lock().expect("repository mutex poisoned");
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
        let mut guard = self.metrics.lock().expect("repository mutex poisoned");
        let record = guard
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *record = record.with_derived(derived);
        Ok(())
    }
}

/// Rejects writes for selected identities.
pub(super) struct RejectingRepository {
    pub(super) inner: MemoryRepository,
    pub(super) rejected: HashSet<IdentityNumber>,
}

impl MetricsRepository for RejectingRepository {
    fn latest_metrics(
        &self,
        identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError> {
        self.inner.latest_metrics(identity)
    }

    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError> {
        self.inner.latest_identity()
    }

    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError> {
        self.inner.all_metrics()
    }

    fn transactions(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        self.inner.transactions(identity, window)
    }

    fn apply_derived(
        &self,
        id: &MetricsRecordId,
        derived: &DerivedMetrics,
    ) -> Result<(), RepositoryError> {
        let record = self.inner.record(id);
        if self.rejected.contains(&record.identity_number) {
            return Err(RepositoryError::Unavailable("write rejected".to_string()));
        }
        self.inner.apply_derived(id, derived)
    }
}

/// Trips the cancellation flag as soon as the first record is committed.
pub(super) struct CancellingRepository {
    pub(super) inner: MemoryRepository,
    pub(super) cancellation: RefreshCancellation,
}

impl MetricsRepository for CancellingRepository {
    fn latest_metrics(
        &self,
        identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError> {
        self.inner.latest_metrics(identity)
    }

    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError> {
        self.inner.latest_identity()
    }

    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError> {
        self.inner.all_metrics()
    }

    fn transactions(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        self.inner.transactions(identity, window)
    }

    fn apply_derived(
        &self,
        id: &MetricsRecordId,
        derived: &DerivedMetrics,
    ) -> Result<(), RepositoryError> {
        let result = self.inner.apply_derived(id, derived);
        self.cancellation.cancel();
        result
    }
}

pub(super) struct UnavailableRepository;

impl MetricsRepository for UnavailableRepository {
    fn latest_metrics(
        &self,
        _identity: &IdentityNumber,
    ) -> Result<Option<FinancialMetricsRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_identity(&self) -> Result<Option<IdentityNumber>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all_metrics(&self) -> Result<Vec<FinancialMetricsRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transactions(
        &self,
        _identity: &IdentityNumber,
        _window: Option<TransactionWindow>,
    ) -> Result<Vec<TransactionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn apply_derived(
        &self,
        _id: &MetricsRecordId,
        _derived: &DerivedMetrics,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Two identities: one strong profile with mixed transactions, one sparse profile.
pub(super) fn seeded_repository() -> MemoryRepository {
    let mut older = metrics_record("880808-10-1234", "old");
    older.timestamp = at(2024, 12, 1);
    older.cancellation_rate = Some(0.9);

    let mut sparse = empty_record("770707-07-7777");
    sparse.timestamp = at(2025, 4, 1);

    MemoryRepository::seeded(
        vec![older, metrics_record("880808-10-1234", "new"), sparse],
        vec![
            transaction("880808-10-1234", 1, 2000.0, true, at(2025, 1, 5)),
            transaction("880808-10-1234", 2, 2400.0, true, at(2025, 2, 5)),
            transaction("880808-10-1234", 3, -300.0, true, at(2025, 2, 10)),
            transaction("880808-10-1234", 4, -150.0, false, at(2025, 2, 12)),
            transaction("770707-07-7777", 1, -80.0, false, at(2025, 3, 2)),
        ],
    )
}

pub(super) fn build_service() -> (BehavioralScoreService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(seeded_repository());
    let service = BehavioralScoreService::new(repository.clone(), RefreshConfig::default());
    (service, repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
