use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::dataset::parse_timestamp;
use super::domain::{IdentityNumber, TransactionWindow};
use super::engine::CategoryScore;
use super::refresh::RefreshCancellation;
use super::repository::MetricsRepository;
use super::service::{BehavioralScoreService, ScoreServiceError};

/// Query string shared by the score routes. Bounds are RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScoreQuery {
    #[serde(default)]
    pub(crate) ic: Option<String>,
    #[serde(default)]
    pub(crate) from: Option<String>,
    #[serde(default)]
    pub(crate) to: Option<String>,
}

impl ScoreQuery {
    fn identity(&self) -> Option<IdentityNumber> {
        self.ic
            .as_deref()
            .map(str::trim)
            .filter(|ic| !ic.is_empty())
            .map(|ic| IdentityNumber(ic.to_string()))
    }

    fn window(&self) -> Result<Option<TransactionWindow>, Response> {
        let from = bound(self.from.as_deref(), "from")?;
        let to = bound(self.to.as_deref(), "to")?;
        TransactionWindow::new(from, to)
            .map_err(|error| error_response(StatusCode::BAD_REQUEST, error.to_string()))
    }
}

fn bound(
    raw: Option<&str>,
    name: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, Response> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .map_err(|error| error_response(StatusCode::BAD_REQUEST, format!("{name}: {error}"))),
    }
}

/// Router builder exposing the scoring and refresh endpoints.
pub fn score_router<R>(service: Arc<BehavioralScoreService<R>>) -> Router
where
    R: MetricsRepository + 'static,
{
    Router::new()
        .route("/api/v1/behavioural-score", get(score_handler::<R>))
        .route("/api/v1/professionalism", get(professionalism_handler::<R>))
        .route("/api/v1/stability", get(stability_handler::<R>))
        .route("/api/v1/financial-habits", get(financial_habits_handler::<R>))
        .route("/api/v1/dashboard", get(dashboard_handler::<R>))
        .route("/api/v1/metrics/refresh", post(refresh_handler::<R>))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, axum::Json(payload)).into_response()
}

fn service_error_response(error: ScoreServiceError) -> Response {
    let status = match &error {
        ScoreServiceError::NotFound(_) | ScoreServiceError::NoData => StatusCode::NOT_FOUND,
        ScoreServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ScoreServiceError::Repository(_) | ScoreServiceError::Refresh(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error.to_string())
}

fn required_identity(query: &ScoreQuery) -> Result<IdentityNumber, Response> {
    query
        .identity()
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "IC number is required"))
}

fn category_response<C: Serialize>(
    outcome: Result<CategoryScore<C>, ScoreServiceError>,
) -> Response {
    match outcome {
        Ok(category) => (StatusCode::OK, axum::Json(category)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
    Query(query): Query<ScoreQuery>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    let identity = match required_identity(&query) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let window = match query.window() {
        Ok(window) => window,
        Err(response) => return response,
    };

    match service.compute_behavioral_score(&identity, window) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn professionalism_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
    Query(query): Query<ScoreQuery>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    match required_identity(&query) {
        Ok(identity) => category_response(service.professionalism(&identity)),
        Err(response) => response,
    }
}

pub(crate) async fn stability_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
    Query(query): Query<ScoreQuery>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    match required_identity(&query) {
        Ok(identity) => category_response(service.stability(&identity)),
        Err(response) => response,
    }
}

pub(crate) async fn financial_habits_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
    Query(query): Query<ScoreQuery>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    let identity = match required_identity(&query) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    match query.window() {
        Ok(window) => category_response(service.financial_habits(&identity, window)),
        Err(response) => response,
    }
}

pub(crate) async fn dashboard_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
    Query(query): Query<ScoreQuery>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    let identity = query.identity();
    match service.dashboard(identity.as_ref()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn refresh_handler<R>(
    State(service): State<Arc<BehavioralScoreService<R>>>,
) -> Response
where
    R: MetricsRepository + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        service.refresh_all_metrics(&RefreshCancellation::new())
    })
    .await;

    match outcome {
        Ok(Ok(summary)) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Ok(Err(error)) => service_error_response(error),
        Err(join_error) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("refresh worker panicked: {join_error}"),
        ),
    }
}
