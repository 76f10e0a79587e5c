use crate::infra::InMemoryMetricsRepository;
use behavioral_score::error::AppError;
use behavioral_score::scoring::dataset::{load_metrics, load_transactions};
use behavioral_score::scoring::{
    BehavioralScoreService, IdentityNumber, MetricsRepository, RefreshCancellation,
    RefreshConfig, ScoreResult,
};
use clap::Args;
use std::collections::BTreeSet;
use std::sync::Arc;

const DEMO_METRICS_CSV: &str = "\
id,ic,fullName,cancellationRate,ratings,responsivenessToTask,minMaxDiffPast6Months,ratingsInflux,typeOfGig,permanentEmployment,yearsOfEmployment,fluctuationRate,grossIncome,netIncome,impulsivePurchaseRate,recurringExpenseConsistency,expenseToIncomeRatio,regularSaving,emergencyFundAvailability,consistentSpending,timestamp
demo-m-1,880808-10-1234,Farah Lim,0.08,0.92,0.85,0.35,0.65,Software Development,Yes,6,,6500,5200,0.12,0.9,,true,true,true,2025-03-01T00:00:00Z
demo-m-2,880808-10-1234,Farah Lim,0.2,0.85,0.7,0.3,0.5,Software Development,No,5,,6200,,0.2,0.8,,true,false,true,2024-11-01T00:00:00Z
demo-m-3,920202-14-5678,Hafiz Omar,0.25,0.75,0.6,0.2,0.4,Medical,No,3,,,,0.3,0.7,,false,true,false,2025-02-15T00:00:00Z
demo-m-4,970707-08-2468,Mei Tan,0.4,0.6,0.5,0.1,0.2,Food Delivery,No,1,,,,0.5,0.4,,false,false,false,2025-03-10T00:00:00Z
";

const DEMO_TRANSACTIONS_CSV: &str = "\
id,ic,spendingAmount,necessitiesOrNonEssential,bookingDatetime
demo-t-1,880808-10-1234,5200,true,2025-01-28T09:00:00Z
demo-t-2,880808-10-1234,5150,true,2025-02-27T09:00:00Z
demo-t-3,880808-10-1234,-1450,true,2025-02-03T09:00:00Z
demo-t-4,880808-10-1234,-260,false,2025-02-15T09:00:00Z
demo-t-5,920202-14-5678,3100,true,2025-01-05T09:00:00Z
demo-t-6,920202-14-5678,1900,true,2025-02-05T09:00:00Z
demo-t-7,920202-14-5678,2600,true,2025-03-05T09:00:00Z
demo-t-8,920202-14-5678,-980,true,2025-02-10T09:00:00Z
demo-t-9,920202-14-5678,-420,false,2025-02-22T09:00:00Z
demo-t-10,970707-08-2468,450,true,2025-02-01T09:00:00Z
demo-t-11,970707-08-2468,-380,false,2025-02-02T09:00:00Z
demo-t-12,970707-08-2468,-210,false,2025-02-09T09:00:00Z
";

/// Repository seeded with the bundled sample dataset.
pub(crate) fn demo_repository() -> Result<InMemoryMetricsRepository, AppError> {
    let metrics = load_metrics(DEMO_METRICS_CSV.as_bytes())?;
    let transactions = load_transactions(DEMO_TRANSACTIONS_CSV.as_bytes())?;
    Ok(InMemoryMetricsRepository::seeded(metrics, transactions))
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only print the breakdown for this identity number.
    #[arg(long)]
    pub(crate) ic: Option<String>,
    /// Worker threads used by the refresh step (defaults to 4).
    #[arg(long)]
    pub(crate) concurrency: Option<usize>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(demo_repository()?);
    let refresh = RefreshConfig {
        concurrency: args
            .concurrency
            .unwrap_or(RefreshConfig::default().concurrency)
            .max(1),
    };
    let service = BehavioralScoreService::new(repository.clone(), refresh);

    let identities: Vec<IdentityNumber> = match args.ic {
        Some(ic) => vec![IdentityNumber(ic.trim().to_string())],
        None => repository
            .all_metrics()
            .map_err(behavioral_score::scoring::ScoreServiceError::from)?
            .into_iter()
            .map(|record| record.identity_number)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    println!("Behavioral score demo");
    println!("\nScores before refreshing derived metrics");
    for identity in &identities {
        let result = service.compute_behavioral_score(identity, None)?;
        render_score_line(&result);
    }

    let summary = service.refresh_all_metrics(&RefreshCancellation::new())?;
    println!(
        "\nMetrics refresh: {} updated, {} failed, {} skipped",
        summary.updated_count,
        summary.failures.len(),
        summary.skipped
    );
    for failure in &summary.failures {
        println!(
            "  - {} ({}): {}",
            failure.identity_number, failure.record_id.0, failure.reason
        );
    }

    println!("\nScores after refresh");
    for identity in &identities {
        let result = service.compute_behavioral_score(identity, None)?;
        render_breakdown(&result);
    }

    let dashboard = service.dashboard(None)?;
    println!(
        "\nDashboard default: {} {} → {:.2} ({})",
        dashboard.identity_number,
        dashboard.name.as_deref().unwrap_or("(unnamed)"),
        dashboard.credit_score,
        dashboard.risk_level
    );

    Ok(())
}

fn render_score_line(result: &ScoreResult) {
    println!(
        "  {:<16} {:>6.2}  {}",
        result.identity_number.as_str(),
        result.final_score,
        result.risk_category
    );
}

fn render_breakdown(result: &ScoreResult) {
    let breakdown = &result.breakdown;
    println!(
        "\n{} scored {:.2} ({})",
        result.identity_number, result.final_score, result.risk_category
    );
    println!(
        "  Professionalism   {:>6.2} / 30  fulfilling {:.0}, rating {:.0}, responsiveness {:.0}",
        breakdown.professionalism.weighted_score,
        breakdown.professionalism.components.fulfilling_rate,
        breakdown.professionalism.components.rating,
        breakdown.professionalism.components.responsiveness
    );
    println!(
        "  Stability         {:>6.2} / 40  gig {:.0}, permanent {:.0}, tenure {:.0}, fluctuation {:.0}",
        breakdown.stability.weighted_score,
        breakdown.stability.components.gig_type,
        breakdown.stability.components.permanent_employment,
        breakdown.stability.components.years_of_employment,
        breakdown.stability.components.fluctuation_rate
    );
    println!(
        "  Financial habits  {:>6.2} / 30  luxury share {:.1}%, expense ratio score {:.0}",
        breakdown.financial_habits.weighted_score,
        breakdown
            .financial_habits
            .components
            .details
            .luxury_to_necessity_ratio,
        breakdown.financial_habits.components.expense_ratio
    );
    println!(
        "  Inputs: fluctuation {:.3}, expense/income {:.3}",
        result.metrics.fluctuation_rate, result.metrics.expense_to_income_ratio
    );
}
