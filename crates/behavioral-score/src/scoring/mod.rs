//! Behavioral scoring: metric normalization, the three weighted sub-scorers,
//! risk aggregation, and the batch job that refreshes transaction-derived metrics.

pub mod dataset;
pub mod domain;
pub mod engine;
pub mod refresh;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use dataset::{parse_timestamp, DatasetError, TimestampError};
pub use domain::{
    DerivedMetrics, FinancialMetricsRecord, IdentityNumber, IncomeSource, InvalidWindow,
    MetricsRecordId, TransactionId, TransactionRecord, TransactionWindow,
};
pub use engine::{
    CategoryScore, DashboardView, FinancialHabitsComponents, InvalidInput,
    ProfessionalismComponents, RiskCategory, ScoreBreakdown, ScoreResult, ScoringEngine,
    StabilityComponents,
};
pub use refresh::{
    derive_metrics, MetricsRefreshJob, RefreshCancellation, RefreshConfig, RefreshError,
    RefreshFailure, RefreshSummary,
};
pub use repository::{MetricsRepository, RepositoryError};
pub use router::score_router;
pub use service::{BehavioralScoreService, ScoreServiceError};
