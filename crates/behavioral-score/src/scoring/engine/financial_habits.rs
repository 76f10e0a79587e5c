use serde::{Deserialize, Serialize};

use super::super::domain::TransactionRecord;
use super::normalizer::{normalize, ValidatedMetrics};
use super::weights::{self, financial_habits as w, FULL_MARKS, HALF_MARKS};
use super::CategoryScore;

/// Component scores for spending behaviour, each in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialHabitsComponents {
    pub historical_spending: f64,
    pub impulsive_purchase: f64,
    pub consistent_repayment: f64,
    pub expense_ratio: f64,
    pub details: FinancialHabitsDetails,
}

/// Display-only figures; none of them feed the raw score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialHabitsDetails {
    pub luxury_to_necessity_ratio: f64,
    pub other_expenses_management: f64,
}

/// Share of non-essential transactions as a percentage; zero for an empty set.
pub fn luxury_to_necessity_ratio(transactions: &[TransactionRecord]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }

    let luxury_count = transactions
        .iter()
        .filter(|transaction| transaction.is_luxury())
        .count();

    normalize(luxury_count as f64 / transactions.len() as f64 * 100.0)
}

fn marks(flag: bool) -> f64 {
    if flag {
        FULL_MARKS
    } else {
        0.0
    }
}

pub(crate) fn score_financial_habits(
    metrics: &ValidatedMetrics,
    transactions: &[TransactionRecord],
) -> CategoryScore<FinancialHabitsComponents> {
    let luxury_ratio = luxury_to_necessity_ratio(transactions);

    let historical_spending = if metrics.consistent_spending {
        FULL_MARKS
    } else {
        HALF_MARKS
    };
    let impulsive_purchase = normalize(100.0 - luxury_ratio);
    let consistent_repayment = normalize(metrics.recurring_expense_consistency * 100.0);
    let expense_ratio = normalize((1.0 - metrics.expense_to_income_ratio) * 100.0);

    let other_expenses_management = normalize(
        (marks(metrics.regular_saving)
            + marks(metrics.emergency_fund_availability)
            + marks(metrics.consistent_spending))
            / 3.0,
    );

    let components = FinancialHabitsComponents {
        historical_spending,
        impulsive_purchase,
        consistent_repayment,
        expense_ratio,
        details: FinancialHabitsDetails {
            luxury_to_necessity_ratio: luxury_ratio,
            other_expenses_management,
        },
    };

    let raw = w::HISTORICAL_SPENDING * components.historical_spending
        + w::IMPULSIVE_PURCHASE * components.impulsive_purchase
        + w::CONSISTENT_REPAYMENT * components.consistent_repayment
        + w::EXPENSE_RATIO * components.expense_ratio;

    CategoryScore::new(weights::FINANCIAL_HABITS_WEIGHT, raw, components)
}
