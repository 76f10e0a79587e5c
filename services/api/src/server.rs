use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_score_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use behavioral_score::config::AppConfig;
use behavioral_score::error::AppError;
use behavioral_score::scoring::BehavioralScoreService;
use behavioral_score::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(args.dataset.repository()?);
    let score_service = Arc::new(BehavioralScoreService::new(repository, config.refresh));

    let app = with_score_routes(score_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        refresh_concurrency = config.refresh.concurrency,
        "behavioral score service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
