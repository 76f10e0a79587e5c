//! CSV loaders for metrics snapshots and transactions.
//!
//! Column headers follow the upstream export (`ic`, `cancellationRate`,
//! `spendingAmount`, ...). Empty numeric cells are read as missing values.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    FinancialMetricsRecord, IdentityNumber, MetricsRecordId, TransactionId, TransactionRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },
    #[error("row {row}: column '{column}' must not be empty")]
    MissingValue { row: usize, column: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse '{0}' as RFC 3339 or YYYY-MM-DD")]
pub struct TimestampError(pub String);

pub fn load_metrics<R: Read>(reader: R) -> Result<Vec<FinancialMetricsRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for (index, row) in csv_reader.deserialize::<MetricsRow>().enumerate() {
        let row = row?;
        records.push(row.into_record(index + 1)?);
    }

    Ok(records)
}

pub fn load_metrics_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<FinancialMetricsRecord>, DatasetError> {
    let file = std::fs::File::open(path)?;
    load_metrics(file)
}

pub fn load_transactions<R: Read>(reader: R) -> Result<Vec<TransactionRecord>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut transactions = Vec::new();

    for (index, row) in csv_reader.deserialize::<TransactionRow>().enumerate() {
        let row = row?;
        transactions.push(row.into_record(index + 1)?);
    }

    Ok(transactions)
}

pub fn load_transactions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<TransactionRecord>, DatasetError> {
    let file = std::fs::File::open(path)?;
    load_transactions(file)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    ic: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    cancellation_rate: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    ratings: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    responsiveness_to_task: Option<f64>,
    #[serde(
        default,
        rename = "minMaxDiffPast6Months",
        deserialize_with = "optional_number"
    )]
    min_max_diff_past_6_months: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    ratings_influx: Option<f64>,
    #[serde(default)]
    type_of_gig: String,
    #[serde(default)]
    permanent_employment: String,
    #[serde(default, deserialize_with = "optional_number")]
    years_of_employment: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    fluctuation_rate: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    gross_income: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    net_income: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    impulsive_purchase_rate: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    recurring_expense_consistency: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    expense_to_income_ratio: Option<f64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    regular_saving: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    emergency_fund_availability: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    consistent_spending: bool,
    timestamp: String,
}

impl MetricsRow {
    fn into_record(self, row: usize) -> Result<FinancialMetricsRecord, DatasetError> {
        let timestamp =
            parse_timestamp(&self.timestamp).map_err(|_| DatasetError::InvalidTimestamp {
                row,
                value: self.timestamp.clone(),
            })?;

        Ok(FinancialMetricsRecord {
            id: MetricsRecordId(self.id.unwrap_or_else(|| format!("metrics-{row:05}"))),
            identity_number: IdentityNumber(self.ic),
            full_name: self.full_name,
            cancellation_rate: self.cancellation_rate,
            ratings: self.ratings,
            responsiveness_to_task: self.responsiveness_to_task,
            min_max_diff_past_6_months: self.min_max_diff_past_6_months,
            ratings_influx: self.ratings_influx,
            type_of_gig: self.type_of_gig,
            permanent_employment: self.permanent_employment,
            years_of_employment: self.years_of_employment,
            fluctuation_rate: self.fluctuation_rate,
            gross_income: self.gross_income,
            net_income: self.net_income,
            impulsive_purchase_rate: self.impulsive_purchase_rate,
            recurring_expense_consistency: self.recurring_expense_consistency,
            expense_to_income_ratio: self.expense_to_income_ratio,
            regular_saving: self.regular_saving,
            emergency_fund_availability: self.emergency_fund_availability,
            consistent_spending: self.consistent_spending,
            timestamp,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    ic: String,
    spending_amount: f64,
    #[serde(deserialize_with = "optional_bool")]
    necessities_or_non_essential: Option<bool>,
    booking_datetime: String,
}

impl TransactionRow {
    fn into_record(self, row: usize) -> Result<TransactionRecord, DatasetError> {
        let booked_at =
            parse_timestamp(&self.booking_datetime).map_err(|_| DatasetError::InvalidTimestamp {
                row,
                value: self.booking_datetime.clone(),
            })?;
        let necessities_or_non_essential =
            self.necessities_or_non_essential
                .ok_or(DatasetError::MissingValue {
                    row,
                    column: "necessitiesOrNonEssential",
                })?;

        Ok(TransactionRecord {
            id: TransactionId(self.id.unwrap_or_else(|| format!("txn-{row:05}"))),
            identity_number: IdentityNumber(self.ic),
            spending_amount: self.spending_amount,
            necessities_or_non_essential,
            booked_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    empty_string_as_none(deserializer)?
        .map(|value| value.trim().parse::<f64>().map_err(serde::de::Error::custom))
        .transpose()
}

fn optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = empty_string_as_none(deserializer)? else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(Some(true)),
        "false" | "no" | "n" | "0" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, found '{other}'"
        ))),
    }
}

// Empty flag cells read as `false`.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_bool(deserializer)?.unwrap_or(false))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS_CSV: &str = "\
id,ic,fullName,cancellationRate,ratings,responsivenessToTask,minMaxDiffPast6Months,ratingsInflux,typeOfGig,permanentEmployment,yearsOfEmployment,fluctuationRate,grossIncome,netIncome,impulsivePurchaseRate,recurringExpenseConsistency,expenseToIncomeRatio,regularSaving,emergencyFundAvailability,consistentSpending,timestamp
m-1,900101-14-5566,Aina Rahman,0.1,0.9,0.8,0.2,0.6,Medical,Yes,4,,5200,4100,0.2,0.9,,true,yes,1,2025-03-01T08:00:00Z
m-2,900101-14-5566,,,,,,,Delivery,No,,,,,,,,,,,2025-01-15
";

    const TRANSACTIONS_CSV: &str = "\
id,ic,spendingAmount,necessitiesOrNonEssential,bookingDatetime
t-1,900101-14-5566,2500,true,2025-02-01T09:00:00Z
t-2,900101-14-5566,-120.5,false,2025-02-03
";

    #[test]
    fn loads_metrics_with_missing_cells() {
        let records = load_metrics(METRICS_CSV.as_bytes()).expect("metrics parse");
        assert_eq!(records.len(), 2);

        let full = &records[0];
        assert_eq!(full.id, MetricsRecordId("m-1".to_string()));
        assert_eq!(full.full_name.as_deref(), Some("Aina Rahman"));
        assert_eq!(full.cancellation_rate, Some(0.1));
        assert_eq!(full.fluctuation_rate, None);
        assert!(full.regular_saving && full.emergency_fund_availability);
        assert!(full.consistent_spending);

        let sparse = &records[1];
        assert_eq!(sparse.full_name, None);
        assert_eq!(sparse.ratings, None);
        assert_eq!(sparse.type_of_gig, "Delivery");
        assert!(!sparse.regular_saving);
        assert_eq!(
            sparse.timestamp,
            NaiveDate::from_ymd_opt(2025, 1, 15)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .expect("valid")
                .and_utc()
        );
    }

    #[test]
    fn loads_signed_transactions() {
        let transactions = load_transactions(TRANSACTIONS_CSV.as_bytes()).expect("parse");
        assert_eq!(transactions.len(), 2);
        assert!(transactions[0].is_income());
        assert!(transactions[1].is_expense());
        assert!(transactions[1].is_luxury());
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let csv = "ic,spendingAmount,necessitiesOrNonEssential,bookingDatetime\nabc,10,true,yesterday\n";
        match load_transactions(csv.as_bytes()) {
            Err(DatasetError::InvalidTimestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_transactions_without_necessity_flag() {
        let csv = "\
ic,spendingAmount,necessitiesOrNonEssential,bookingDatetime
abc,-10,false,2025-01-01
abc,-25,,2025-01-02
";
        match load_transactions(csv.as_bytes()) {
            Err(DatasetError::MissingValue { row, column }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "necessitiesOrNonEssential");
            }
            other => panic!("expected missing value error, got {other:?}"),
        }
    }

    #[test]
    fn parse_timestamp_accepts_dates_and_rfc3339() {
        use chrono::TimeZone;

        assert_eq!(
            parse_timestamp("2025-02-01").expect("date parses"),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).single().expect("valid")
        );
        assert_eq!(
            parse_timestamp("2025-02-01T08:30:00+08:00").expect("rfc3339 parses"),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 30, 0)
                .single()
                .expect("valid")
        );
        assert_eq!(
            parse_timestamp("last tuesday"),
            Err(TimestampError("last tuesday".to_string()))
        );
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn generates_ids_when_column_absent() {
        let csv = "ic,spendingAmount,necessitiesOrNonEssential,bookingDatetime\nabc,10,true,2025-01-01\n";
        let transactions = load_transactions(csv.as_bytes()).expect("parse");
        assert_eq!(transactions[0].id, TransactionId("txn-00001".to_string()));
    }
}
