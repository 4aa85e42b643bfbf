//! Table loading and the in-memory snapshot
//!
//! Owns CSV parsing and basic shape validation for the four source tables,
//! not business rules. Everything is loaded once at startup into an
//! immutable [`Snapshot`] shared read-only across queries.

use crate::audit::fingerprint_json;
use crate::error::{CopilotError, Result};
use crate::fx::{FxIndex, USD};
use crate::models::{CashBalance, FxRate, LedgerRow, Period};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Immutable snapshot of the four tables plus derived lookups.
///
/// Queries take this by reference; nothing on the answer path mutates it.
#[derive(Debug)]
pub struct Snapshot {
    pub actuals: Vec<LedgerRow>,
    pub budget: Vec<LedgerRow>,
    pub fx_rows: Vec<FxRate>,
    pub cash: Vec<CashBalance>,
    /// (period, currency) → rate lookup built from `fx_rows`.
    pub fx: FxIndex,
    /// Sorted unique entity names across all tables, for entity extraction.
    pub entities: Vec<String>,
    /// Most recent month present in actuals; the default target period.
    pub latest_actuals: Option<Period>,
    /// SHA-256 over the table contents, recorded with every audit entry.
    pub fingerprint: String,
}

impl Snapshot {
    pub fn new(
        actuals: Vec<LedgerRow>,
        budget: Vec<LedgerRow>,
        fx_rows: Vec<FxRate>,
        cash: Vec<CashBalance>,
    ) -> Self {
        let fx = FxIndex::build(&fx_rows);

        let mut entities = BTreeSet::new();
        for row in &actuals {
            entities.insert(row.entity.clone());
        }
        for row in &budget {
            entities.insert(row.entity.clone());
        }
        for row in &cash {
            entities.insert(row.entity.clone());
        }

        let latest_actuals = actuals.iter().map(|r| r.period).max();
        let fingerprint = fingerprint_json(&(&actuals, &budget, &fx_rows, &cash));

        Self {
            actuals,
            budget,
            fx_rows,
            cash,
            fx,
            entities: entities.into_iter().collect(),
            latest_actuals,
            fingerprint,
        }
    }
}

/// Load `actuals.csv`, `budget.csv`, `fx.csv` and `cash.csv` from a
/// directory into a snapshot.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Snapshot> {
    let dir = dir.as_ref();

    let actuals = parse_ledger(open(dir, "actuals.csv")?, "actuals")?;
    let budget = parse_ledger(open(dir, "budget.csv")?, "budget")?;
    let fx_rows = parse_fx(open(dir, "fx.csv")?)?;
    let cash = parse_cash(open(dir, "cash.csv")?)?;

    let snapshot = Snapshot::new(actuals, budget, fx_rows, cash);
    info!(
        actuals = snapshot.actuals.len(),
        budget = snapshot.budget.len(),
        fx = snapshot.fx_rows.len(),
        cash = snapshot.cash.len(),
        fingerprint = %snapshot.fingerprint,
        "Snapshot loaded"
    );
    Ok(snapshot)
}

fn open(dir: &Path, name: &str) -> Result<File> {
    let path = dir.join(name);
    File::open(&path)
        .map_err(|e| CopilotError::DataLoad(format!("cannot open {}: {}", path.display(), e)))
}

/// Parse the actuals or budget table: date, entity, account, amount, currency.
pub fn parse_ledger<R: Read>(reader: R, table: &'static str) -> Result<Vec<LedgerRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date = column(&headers, "date", table)?;
    let entity = column(&headers, "entity", table)?;
    let account = column(&headers, "account", table)?;
    let amount = column(&headers, "amount", table)?;
    let currency = column(&headers, "currency", table)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(LedgerRow {
            period: parse_period(field(&record, date, table)?, table)?,
            entity: field(&record, entity, table)?.to_string(),
            account: field(&record, account, table)?.to_string(),
            amount: parse_number(field(&record, amount, table)?, table)?,
            currency: field(&record, currency, table)?.to_uppercase(),
        });
    }
    Ok(rows)
}

/// Parse the FX table: date, currency, rate_to_usd.
///
/// Shape invariants enforced here: exactly one rate per (period, currency)
/// pair, and a USD rate, if listed at all, must be 1.0.
pub fn parse_fx<R: Read>(reader: R) -> Result<Vec<FxRate>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date = column(&headers, "date", "fx")?;
    let currency = column(&headers, "currency", "fx")?;
    let rate = column(&headers, "rate_to_usd", "fx")?;

    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = FxRate {
            period: parse_period(field(&record, date, "fx")?, "fx")?,
            currency: field(&record, currency, "fx")?.to_uppercase(),
            rate_to_usd: parse_number(field(&record, rate, "fx")?, "fx")?,
        };

        if row.currency == USD && (row.rate_to_usd - 1.0).abs() > 1e-9 {
            return Err(CopilotError::DataLoad(format!(
                "fx.csv lists USD at {} for {}; USD is defined as 1.0",
                row.rate_to_usd, row.period
            )));
        }
        if !seen.insert((row.period, row.currency.clone())) {
            return Err(CopilotError::DataLoad(format!(
                "fx.csv has more than one rate for {} in {}",
                row.currency, row.period
            )));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse the cash table: date, entity, cash, currency.
pub fn parse_cash<R: Read>(reader: R) -> Result<Vec<CashBalance>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date = column(&headers, "date", "cash")?;
    let entity = column(&headers, "entity", "cash")?;
    let cash = column(&headers, "cash", "cash")?;
    let currency = column(&headers, "currency", "cash")?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(CashBalance {
            period: parse_period(field(&record, date, "cash")?, "cash")?,
            entity: field(&record, entity, "cash")?.to_string(),
            cash: parse_number(field(&record, cash, "cash")?, "cash")?,
            currency: field(&record, currency, "cash")?.to_uppercase(),
        });
    }
    Ok(rows)
}

/// Locate a required column by name, case-insensitive.
fn column(headers: &StringRecord, name: &str, table: &'static str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            CopilotError::DataLoad(format!("{}.csv is missing a '{}' column", table, name))
        })
}

fn field<'r>(record: &'r StringRecord, index: usize, table: &'static str) -> Result<&'r str> {
    record.get(index).ok_or_else(|| {
        CopilotError::DataLoad(format!(
            "{}.csv line {}: short record",
            table,
            record
                .position()
                .map(|p| p.line().to_string())
                .unwrap_or_else(|| "?".to_string())
        ))
    })
}

/// Parse a table date and truncate it to its month. Accepted forms:
/// `2025-06-01`, `2025/06/01`, `2025-06`.
fn parse_period(raw: &str, table: &'static str) -> Result<Period> {
    let raw = raw.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(Period::from_date(date));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Ok(Period::from_date(date));
    }

    Err(CopilotError::DataLoad(format!(
        "{}.csv has an unparseable date '{}'",
        table, raw
    )))
}

/// Parse a numeric cell, tolerating `$`, thousands separators and `%`
/// decoration as the source spreadsheets use them.
fn parse_number(raw: &str, table: &'static str) -> Result<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | ' '))
        .collect();
    cleaned.parse::<f64>().map_err(|_| {
        CopilotError::DataLoad(format!("{}.csv has an unparseable number '{}'", table, raw))
    })
}
