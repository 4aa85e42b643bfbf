//! Core data models for the FP&A copilot

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

//
// ================= Period =================
//

/// A calendar month. All table dates are first-of-month, so a (year, month)
/// pair is the whole invariant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Truncate any date to its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month before this one.
    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }
}

//
// ================= Table Rows =================
//

/// One row of the actuals or budget table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub period: Period,
    pub entity: String,
    pub account: String,
    pub amount: f64,
    pub currency: String,
}

/// One row of the FX table. Exactly one rate per (period, currency);
/// USD is defined as 1.0 and need not appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub period: Period,
    pub currency: String,
    pub rate_to_usd: f64,
}

/// One row of the cash table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashBalance {
    pub period: Period,
    pub entity: String,
    pub cash: f64,
    pub currency: String,
}

//
// ================= Canonical Accounts =================
//

/// Account category after alias resolution. Every aggregate sums exactly
/// one of these buckets; `Unclassified` rows are excluded and reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalAccount {
    Revenue,
    Cogs,
    Opex(String),
    Unclassified,
}

//
// ================= Intent =================
//

/// The five supported metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    RevenueVsBudget,
    GrossMargin,
    OpexBreakdown,
    Ebitda,
    CashRunway,
}

/// Parameters extracted from the question text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Target month; `None` defaults to the latest actuals month.
    pub period: Option<Period>,
    /// Trailing window length ("last 3 months").
    pub window: Option<usize>,
    /// Entity filter; `None` aggregates all entities.
    pub entity: Option<String>,
}

/// A classified question: which metric to run, with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub metric: Metric,
    pub params: QueryParams,
}

//
// ================= Metric Results =================
//

/// One point of a chart-ready series. `value: None` is a defined-but-
/// undefined point (e.g. margin of a zero-revenue month); it stays in the
/// series rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: Some(value),
        }
    }

    pub fn undefined(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
        }
    }
}

/// One entry of an Opex breakdown, already converted to USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    pub label: String,
    pub usd: f64,
}

/// Headline figure(s) of a metric result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Headline {
    /// Actual vs budget for one month. `variance_pct` is `None` when the
    /// budget sums to zero (undefined, not ±inf).
    Comparison {
        period: Period,
        actual_usd: f64,
        budget_usd: f64,
        variance_usd: f64,
        variance_pct: Option<f64>,
    },
    /// Latest gross margin of the requested range. `pct: None` means the
    /// month had no revenue and the margin is undefined.
    Margin { period: Period, pct: Option<f64> },
    /// Opex subcategories sorted descending by amount (largest driver first).
    Breakdown {
        period: Period,
        items: Vec<BreakdownItem>,
    },
    /// EBITDA proxy (Revenue − COGS − Opex; no D&A line exists in the data).
    Ebitda { period: Period, usd: f64 },
    /// Cash runway. `months: None` means burn is non-positive (cash is not
    /// shrinking) and the runway is infinite.
    Runway {
        months: Option<f64>,
        cash_usd: f64,
        avg_burn_usd: f64,
    },
}

/// Structured output of one metric computation. The composer turns this
/// into the answer text; the series passes through to charting unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: Metric,
    pub headline: Headline,
    pub series: Vec<SeriesPoint>,
    /// Caveats to surface with the narrative (e.g. the EBITDA proxy note).
    pub notes: Vec<String>,
}

//
// ================= Answer =================
//

/// Public return value of a query. Never an error: unrecognized questions
/// and per-metric failures come back as explanatory text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub series: Vec<SeriesPoint>,
    /// Raw account labels that did not classify, deduplicated.
    pub diagnostics: Vec<String>,
}

//
// ================= Audit Record =================
//

/// Per-query audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub audit_id: Uuid,
    pub question: String,
    /// `None` when the question did not classify.
    pub metric: Option<Metric>,
    pub answer: Arc<Answer>,
    pub snapshot_hash: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: u64,
}

//
// ================= Display =================
//

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for CanonicalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalAccount::Revenue => write!(f, "Revenue"),
            CanonicalAccount::Cogs => write!(f, "COGS"),
            CanonicalAccount::Opex(sub) => write!(f, "Opex:{}", sub),
            CanonicalAccount::Unclassified => write!(f, "Unclassified"),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::RevenueVsBudget => "revenue_vs_budget",
            Metric::GrossMargin => "gross_margin",
            Metric::OpexBreakdown => "opex_breakdown",
            Metric::Ebitda => "ebitda",
            Metric::CashRunway => "cash_runway",
        };
        write!(f, "{}", s)
    }
}
