//! Fixed weighting rubric. Category weights sum to 1.0 and each category's
//! component weights sum to 1.0.

pub const PROFESSIONALISM_WEIGHT: f64 = 0.30;
pub const STABILITY_WEIGHT: f64 = 0.40;
pub const FINANCIAL_HABITS_WEIGHT: f64 = 0.30;

pub(crate) mod professionalism {
    pub const FULFILLING_RATE: f64 = 0.25;
    pub const RATING: f64 = 0.20;
    pub const RESPONSIVENESS: f64 = 0.15;
    pub const MIN_MAX_DIFF: f64 = 0.20;
    pub const INFLUX: f64 = 0.20;
}

pub(crate) mod stability {
    pub const GIG_TYPE: f64 = 0.25;
    pub const PERMANENT_EMPLOYMENT: f64 = 0.30;
    pub const YEARS_OF_EMPLOYMENT: f64 = 0.25;
    pub const FLUCTUATION: f64 = 0.20;

    pub const HIGH_VALUE_GIGS: [&str; 4] =
        ["Software Development", "Medical", "Legal", "Financial Services"];
    pub const PERMANENT_MARKER: &str = "Yes";
    pub const YEARS_CEILING: f64 = 10.0;
}

pub(crate) mod financial_habits {
    pub const HISTORICAL_SPENDING: f64 = 0.35;
    pub const IMPULSIVE_PURCHASE: f64 = 0.35;
    pub const CONSISTENT_REPAYMENT: f64 = 0.20;
    pub const EXPENSE_RATIO: f64 = 0.10;
}

/// Inclusive lower bounds for the risk bands.
pub const LOW_RISK_THRESHOLD: f64 = 80.0;
pub const MEDIUM_RISK_THRESHOLD: f64 = 60.0;

/// Score awarded to a binary "good" signal and to its "neutral" counterpart.
pub(crate) const FULL_MARKS: f64 = 100.0;
pub(crate) const HALF_MARKS: f64 = 50.0;
