use crate::demo::{demo_repository, run_demo, DemoArgs};
use crate::infra::InMemoryMetricsRepository;
use crate::server;
use behavioral_score::config::AppConfig;
use behavioral_score::error::AppError;
use behavioral_score::scoring::{
    parse_timestamp, BehavioralScoreService, FinancialMetricsRecord, IdentityNumber,
    MetricsRepository, RefreshCancellation, RefreshSummary, TransactionWindow,
};
use chrono::{DateTime, Utc};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "Behavioral Score Service",
    about = "Score gig worker financial profiles and refresh transaction-derived metrics",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute one identity's behavioral score and print it as JSON
    Score(ScoreArgs),
    /// Recompute fluctuation and expense ratios for every stored snapshot
    Refresh(DatasetArgs),
    /// Walk through scoring and refresh on a bundled sample dataset
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DatasetArgs {
    /// Metrics snapshot CSV export; the bundled demo dataset is used when omitted
    #[arg(long)]
    pub(crate) metrics_csv: Option<PathBuf>,
    /// Transaction CSV export matching the metrics file
    #[arg(long, requires = "metrics_csv")]
    pub(crate) transactions_csv: Option<PathBuf>,
}

impl DatasetArgs {
    pub(crate) fn repository(&self) -> Result<InMemoryMetricsRepository, AppError> {
        match &self.metrics_csv {
            Some(metrics) => {
                InMemoryMetricsRepository::from_csv(metrics, self.transactions_csv.as_deref())
            }
            None => demo_repository(),
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Identity (IC) number to score
    #[arg(long)]
    pub(crate) ic: String,
    /// Only consider transactions booked at or after this instant
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) from: Option<DateTime<Utc>>,
    /// Only consider transactions booked at or before this instant
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) to: Option<DateTime<Utc>>,
    #[command(flatten)]
    pub(crate) dataset: DatasetArgs,
}

impl ScoreArgs {
    fn window(&self) -> Result<Option<TransactionWindow>, clap::Error> {
        TransactionWindow::new(self.from, self.to).map_err(|error| {
            Cli::command().error(ErrorKind::ArgumentConflict, format!("--from/--to: {error}"))
        })
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Refresh(args) => run_refresh(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service =
        BehavioralScoreService::new(Arc::new(args.dataset.repository()?), config.refresh);

    let window = args.window().unwrap_or_else(|error| error.exit());
    let identity = IdentityNumber(args.ic.trim().to_string());
    let result = service.compute_behavioral_score(&identity, window)?;

    let rendered = serde_json::to_string_pretty(&result).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

async fn run_refresh(args: DatasetArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    behavioral_score::telemetry::init(&config.telemetry)?;

    let repository = Arc::new(args.repository()?);
    let service = Arc::new(BehavioralScoreService::new(
        repository.clone(),
        config.refresh,
    ));

    let cancellation = RefreshCancellation::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || service.refresh_all_metrics(&cancellation))
        .await
        .map_err(std::io::Error::other)??;

    let records = repository
        .all_metrics()
        .map_err(behavioral_score::scoring::ScoreServiceError::from)?;
    let report = refresh_report(&summary, &records);
    let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

/// Summary plus the derived pair of every snapshot after the run.
fn refresh_report(
    summary: &RefreshSummary,
    records: &[FinancialMetricsRecord],
) -> serde_json::Value {
    let records: Vec<_> = records
        .iter()
        .map(|record| {
            json!({
                "id": record.id.0,
                "ic": record.identity_number,
                "fluctuationRate": record.fluctuation_rate,
                "expenseToIncomeRatio": record.expense_to_income_ratio,
            })
        })
        .collect();

    json!({
        "summary": summary,
        "records": records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_command_parses_window_and_dataset() {
        let cli = Cli::try_parse_from([
            "behavioral-score-api",
            "score",
            "--ic",
            "880808-10-1234",
            "--from",
            "2025-01-01",
            "--metrics-csv",
            "metrics.csv",
            "--transactions-csv",
            "transactions.csv",
        ])
        .expect("arguments parse");

        let Some(Command::Score(args)) = cli.command else {
            panic!("expected score command");
        };
        let window = args
            .window()
            .expect("window valid")
            .expect("window present");
        assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
        assert_eq!(args.dataset.metrics_csv, Some(PathBuf::from("metrics.csv")));
    }

    #[test]
    fn inverted_window_is_a_usage_error() {
        let cli = Cli::try_parse_from([
            "behavioral-score-api",
            "score",
            "--ic",
            "880808-10-1234",
            "--from",
            "2025-03-01",
            "--to",
            "2025-01-01",
        ])
        .expect("arguments parse");

        let Some(Command::Score(args)) = cli.command else {
            panic!("expected score command");
        };
        let error = args.window().expect_err("inverted window rejected");
        assert_eq!(error.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn malformed_timestamp_is_rejected_by_clap() {
        let parsed = Cli::try_parse_from([
            "behavioral-score-api",
            "score",
            "--ic",
            "880808-10-1234",
            "--to",
            "next week",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn refresh_report_lists_derived_values() {
        let repository = Arc::new(demo_repository().expect("demo dataset loads"));
        let service = BehavioralScoreService::new(
            repository.clone(),
            behavioral_score::scoring::RefreshConfig { concurrency: 1 },
        );
        let summary = service
            .refresh_all_metrics(&RefreshCancellation::new())
            .expect("refresh runs");
        let records = repository.all_metrics().expect("records listed");

        let report = refresh_report(&summary, &records);

        assert_eq!(report["summary"]["updatedCount"], 4);
        let rows = report["records"].as_array().expect("records array");
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row["fluctuationRate"].is_number()
            && row["expenseToIncomeRatio"].is_number()));
        assert!(rows.iter().any(|row| row["ic"] == "970707-08-2468"));
    }

    #[test]
    fn transactions_csv_requires_metrics_csv() {
        let parsed = Cli::try_parse_from([
            "behavioral-score-api",
            "refresh",
            "--transactions-csv",
            "transactions.csv",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["behavioral-score-api"]).expect("parses");
        assert!(cli.command.is_none());
    }
}
