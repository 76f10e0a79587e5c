use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{IdentityNumber, TransactionWindow};
use super::engine::{
    CategoryScore, DashboardView, FinancialHabitsComponents, InvalidInput,
    ProfessionalismComponents, ScoreResult, ScoringEngine, StabilityComponents,
};
use super::refresh::{
    MetricsRefreshJob, RefreshCancellation, RefreshConfig, RefreshError, RefreshSummary,
};
use super::repository::{MetricsRepository, RepositoryError};

/// Service composing the repository, the scoring engine, and the refresh job.
pub struct BehavioralScoreService<R> {
    repository: Arc<R>,
    engine: ScoringEngine,
    refresh: RefreshConfig,
}

impl<R> BehavioralScoreService<R>
where
    R: MetricsRepository + 'static,
{
    pub fn new(repository: Arc<R>, refresh: RefreshConfig) -> Self {
        Self {
            repository,
            engine: ScoringEngine::new(),
            refresh,
        }
    }

    /// Score the latest snapshot for `identity`, optionally restricting transactions to `window`.
    pub fn compute_behavioral_score(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<ScoreResult, ScoreServiceError> {
        let record = match self.repository.latest_metrics(identity)? {
            Some(record) => record,
            None => {
                warn!(%identity, "no metrics found for identity");
                return Err(ScoreServiceError::NotFound(identity.clone()));
            }
        };

        let transactions = self.repository.transactions(identity, window)?;
        let result = self.engine.score(&record, &transactions)?;

        info!(
            %identity,
            transactions = transactions.len(),
            final_score = result.final_score,
            risk = %result.risk_category,
            "behavioral score computed"
        );

        Ok(result)
    }

    /// Professionalism drill-down for the latest snapshot.
    pub fn professionalism(
        &self,
        identity: &IdentityNumber,
    ) -> Result<CategoryScore<ProfessionalismComponents>, ScoreServiceError> {
        Ok(self
            .compute_behavioral_score(identity, None)?
            .breakdown
            .professionalism)
    }

    /// Stability drill-down for the latest snapshot.
    pub fn stability(
        &self,
        identity: &IdentityNumber,
    ) -> Result<CategoryScore<StabilityComponents>, ScoreServiceError> {
        Ok(self
            .compute_behavioral_score(identity, None)?
            .breakdown
            .stability)
    }

    /// Financial habits drill-down; `window` restricts the transactions like the full score.
    pub fn financial_habits(
        &self,
        identity: &IdentityNumber,
        window: Option<TransactionWindow>,
    ) -> Result<CategoryScore<FinancialHabitsComponents>, ScoreServiceError> {
        Ok(self
            .compute_behavioral_score(identity, window)?
            .breakdown
            .financial_habits)
    }

    /// Dashboard summary for `identity`, or for the most recently recorded identity.
    pub fn dashboard(
        &self,
        identity: Option<&IdentityNumber>,
    ) -> Result<DashboardView, ScoreServiceError> {
        let identity = match identity {
            Some(identity) => identity.clone(),
            None => self
                .repository
                .latest_identity()?
                .ok_or(ScoreServiceError::NoData)?,
        };

        let record = self
            .repository
            .latest_metrics(&identity)?
            .ok_or_else(|| ScoreServiceError::NotFound(identity.clone()))?;
        let transactions = self.repository.transactions(&identity, None)?;
        let result = self.engine.score(&record, &transactions)?;

        Ok(result.dashboard_view(record.full_name))
    }

    /// Run the refresh job over every stored snapshot. Blocks the calling thread.
    pub fn refresh_all_metrics(
        &self,
        cancellation: &RefreshCancellation,
    ) -> Result<RefreshSummary, ScoreServiceError> {
        let job = MetricsRefreshJob::new(self.repository.clone(), self.refresh);
        Ok(job.run(cancellation)?)
    }
}

/// Error raised by the behavioral score service.
#[derive(Debug, thiserror::Error)]
pub enum ScoreServiceError {
    #[error("no metrics found for identity {0}")]
    NotFound(IdentityNumber),
    #[error("no metrics stored")]
    NoData,
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}
