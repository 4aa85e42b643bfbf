//! Metric Engine
//!
//! Five deterministic finance computations over the loaded snapshot.
//! Everything here is a pure aggregation: rows in, `MetricResult` out,
//! no mutation of the tables and no I/O.

use crate::accounts::AliasTable;
use crate::data::Snapshot;
use crate::error::{CopilotError, Result};
use crate::fx::{to_usd, FxIndex};
use crate::models::{
    BreakdownItem, CanonicalAccount, Headline, Intent, LedgerRow, Metric, MetricResult, Period,
    QueryParams, SeriesPoint,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Trailing window applied when the question does not name one.
pub const DEFAULT_TRAILING_WINDOW: usize = 3;

/// Entity value that carries a pre-aggregated total. When present for a
/// month, aggregating "all entities" uses only these rows; summing the
/// rest on top would double count.
pub const CONSOLIDATED: &str = "Consolidated";

/// Warning-level findings collected while computing: raw account labels
/// that did not classify and were excluded from every aggregate.
#[derive(Debug, Default)]
pub struct Diagnostics {
    unclassified: BTreeSet<String>,
}

impl Diagnostics {
    pub fn record_unclassified(&mut self, account: &str) {
        if self.unclassified.insert(account.to_string()) {
            warn!(account, "unclassified account excluded from aggregates");
        }
    }

    pub fn into_list(self) -> Vec<String> {
        self.unclassified
            .into_iter()
            .map(|account| format!("unclassified account: {}", account))
            .collect()
    }
}

/// Run the metric an intent names.
pub fn compute(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    intent: &Intent,
    diags: &mut Diagnostics,
) -> Result<MetricResult> {
    debug!(metric = %intent.metric, params = ?intent.params, "Computing metric");
    match intent.metric {
        Metric::RevenueVsBudget => revenue_vs_budget(snapshot, aliases, &intent.params, diags),
        Metric::GrossMargin => gross_margin_trend(snapshot, aliases, &intent.params, diags),
        Metric::OpexBreakdown => opex_breakdown(snapshot, aliases, &intent.params, diags),
        Metric::Ebitda => ebitda_summary(snapshot, aliases, &intent.params, diags),
        Metric::CashRunway => cash_runway(snapshot, &intent.params),
    }
}

//
// ================= Revenue vs Budget =================
//

pub fn revenue_vs_budget(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    params: &QueryParams,
    diags: &mut Diagnostics,
) -> Result<MetricResult> {
    let period = target_period(params, snapshot)?;
    let entity = params.entity.as_deref();

    // Zero matching rows is ambiguous between "truly zero" and "no data
    // loaded", so it is an error; a zero *sum* over real rows is a valid
    // answer.
    let actual_rows = ledger_rows_for(&snapshot.actuals, period, entity);
    if actual_rows.is_empty() {
        return Err(insufficient("actuals", period, entity));
    }
    let budget_rows = ledger_rows_for(&snapshot.budget, period, entity);
    if budget_rows.is_empty() {
        return Err(insufficient("budget", period, entity));
    }

    let actual = month_totals(&actual_rows, aliases, &snapshot.fx, diags)?.revenue;
    let budget = month_totals(&budget_rows, aliases, &snapshot.fx, diags)?.revenue;
    let variance = actual - budget;
    let variance_pct = (budget != 0.0).then(|| variance / budget);

    Ok(MetricResult {
        metric: Metric::RevenueVsBudget,
        headline: Headline::Comparison {
            period,
            actual_usd: actual,
            budget_usd: budget,
            variance_usd: variance,
            variance_pct,
        },
        series: vec![
            SeriesPoint::new("Actual", actual),
            SeriesPoint::new("Budget", budget),
        ],
        notes: Vec::new(),
    })
}

//
// ================= Gross Margin % =================
//

pub fn gross_margin_trend(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    params: &QueryParams,
    diags: &mut Diagnostics,
) -> Result<MetricResult> {
    let entity = params.entity.as_deref();
    let window = params.window.unwrap_or(DEFAULT_TRAILING_WINDOW);

    let mut months = actuals_months(snapshot, entity);
    if let Some(end) = params.period {
        months.retain(|p| *p <= end);
    }
    if months.is_empty() {
        let period = target_period(params, snapshot)?;
        return Err(insufficient("actuals", period, entity));
    }
    let months: Vec<Period> = months.split_off(months.len().saturating_sub(window));

    let mut series = Vec::with_capacity(months.len());
    let mut latest = None;
    for period in &months {
        let rows = ledger_rows_for(&snapshot.actuals, *period, entity);
        let totals = month_totals(&rows, aliases, &snapshot.fx, diags)?;
        // Revenue of zero makes the margin undefined; the month stays in
        // the series as an explicit undefined point rather than vanishing.
        let margin = (totals.revenue != 0.0)
            .then(|| (totals.revenue - totals.cogs) / totals.revenue);
        match margin {
            Some(pct) => series.push(SeriesPoint::new(period.to_string(), pct)),
            None => series.push(SeriesPoint::undefined(period.to_string())),
        }
        latest = Some((*period, margin));
    }

    let (period, pct) = latest.ok_or_else(|| insufficient("actuals", months[0], entity))?;
    Ok(MetricResult {
        metric: Metric::GrossMargin,
        headline: Headline::Margin { period, pct },
        series,
        notes: Vec::new(),
    })
}

//
// ================= Opex Breakdown =================
//

pub fn opex_breakdown(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    params: &QueryParams,
    diags: &mut Diagnostics,
) -> Result<MetricResult> {
    let period = target_period(params, snapshot)?;
    let entity = params.entity.as_deref();

    let rows = ledger_rows_for(&snapshot.actuals, period, entity);
    if rows.is_empty() {
        return Err(insufficient("actuals", period, entity));
    }

    let totals = month_totals(&rows, aliases, &snapshot.fx, diags)?;

    // Largest driver first: board decks read top-down.
    let mut items: Vec<BreakdownItem> = totals
        .opex_by_sub
        .into_iter()
        .map(|(sub, usd)| BreakdownItem {
            label: CanonicalAccount::Opex(sub).to_string(),
            usd,
        })
        .collect();
    items.sort_by(|a, b| {
        b.usd
            .partial_cmp(&a.usd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    let series = items
        .iter()
        .map(|item| SeriesPoint::new(item.label.clone(), item.usd))
        .collect();

    Ok(MetricResult {
        metric: Metric::OpexBreakdown,
        headline: Headline::Breakdown { period, items },
        series,
        notes: Vec::new(),
    })
}

//
// ================= EBITDA (proxy) =================
//

pub fn ebitda_summary(
    snapshot: &Snapshot,
    aliases: &AliasTable,
    params: &QueryParams,
    diags: &mut Diagnostics,
) -> Result<MetricResult> {
    let period = target_period(params, snapshot)?;
    let entity = params.entity.as_deref();

    let rows = ledger_rows_for(&snapshot.actuals, period, entity);
    if rows.is_empty() {
        return Err(insufficient("actuals", period, entity));
    }
    let totals = month_totals(&rows, aliases, &snapshot.fx, diags)?;
    let headline_usd = totals.revenue - totals.cogs - totals.opex;

    let mut series = Vec::new();
    for month in actuals_months(snapshot, entity) {
        let rows = ledger_rows_for(&snapshot.actuals, month, entity);
        let t = month_totals(&rows, aliases, &snapshot.fx, diags)?;
        series.push(SeriesPoint::new(
            month.to_string(),
            t.revenue - t.cogs - t.opex,
        ));
    }

    Ok(MetricResult {
        metric: Metric::Ebitda,
        headline: Headline::Ebitda {
            period,
            usd: headline_usd,
        },
        series,
        notes: vec![
            "EBITDA is approximated as Revenue − COGS − Opex; the data carries no \
             depreciation or amortization line."
                .to_string(),
        ],
    })
}

//
// ================= Cash Runway =================
//

pub fn cash_runway(snapshot: &Snapshot, params: &QueryParams) -> Result<MetricResult> {
    let entity = params.entity.as_deref();
    let window = params.window.unwrap_or(DEFAULT_TRAILING_WINDOW);

    // Total USD cash per month. With no entity filter, a month that has a
    // Consolidated row uses it as the pre-aggregated total; otherwise the
    // per-entity rows are summed.
    let mut by_month: BTreeMap<Period, f64> = BTreeMap::new();
    for month in cash_months(snapshot, entity) {
        let rows: Vec<_> = snapshot
            .cash
            .iter()
            .filter(|r| r.period == month)
            .collect();
        let consolidated: Vec<_> = rows
            .iter()
            .filter(|r| r.entity.eq_ignore_ascii_case(CONSOLIDATED))
            .copied()
            .collect();
        let scoped: Vec<_> = match entity {
            Some(e) => rows
                .iter()
                .filter(|r| r.entity.eq_ignore_ascii_case(e))
                .copied()
                .collect(),
            None if !consolidated.is_empty() => consolidated,
            None => rows,
        };

        let mut total = 0.0;
        for row in scoped {
            total += to_usd(&snapshot.fx, row.period, &row.currency, row.cash)?;
        }
        by_month.insert(month, total);
    }

    let months: Vec<(Period, f64)> = by_month.into_iter().collect();
    if months.len() < 2 {
        let period = months
            .last()
            .map(|(p, _)| *p)
            .or(snapshot.latest_actuals)
            .unwrap_or_else(|| Period::from_date(chrono::Utc::now().date_naive()));
        return Err(CopilotError::InsufficientData {
            table: "cash",
            period,
            scope: format!("{} (burn needs at least two months)", scope_name(entity)),
        });
    }

    // Trailing window of month-over-month decreases. A negative burn means
    // cash grew that month.
    let tail = &months[months.len().saturating_sub(window + 1)..];
    let burns: Vec<f64> = tail.windows(2).map(|w| w[0].1 - w[1].1).collect();
    let avg_burn = burns.iter().sum::<f64>() / burns.len() as f64;
    let (latest_period, latest_cash) = tail[tail.len() - 1];

    let runway = if avg_burn > 0.0 {
        Some((latest_cash / avg_burn).max(0.0))
    } else {
        // Cash is flat or growing; runway is infinite, never negative or
        // a division by zero.
        None
    };

    debug!(
        %latest_period,
        latest_cash,
        avg_burn,
        window = burns.len(),
        "Cash runway computed"
    );

    let series = tail
        .iter()
        .map(|(period, cash)| SeriesPoint::new(period.to_string(), *cash))
        .collect();

    Ok(MetricResult {
        metric: Metric::CashRunway,
        headline: Headline::Runway {
            months: runway,
            cash_usd: latest_cash,
            avg_burn_usd: avg_burn,
        },
        series,
        notes: Vec::new(),
    })
}

//
// ================= Shared helpers =================
//

#[derive(Debug, Default)]
struct MonthTotals {
    revenue: f64,
    cogs: f64,
    opex: f64,
    opex_by_sub: BTreeMap<String, f64>,
}

/// Classify and normalize a month's rows into category totals.
/// Unclassified rows are excluded and reported, never summed into a
/// wrong bucket.
fn month_totals(
    rows: &[&LedgerRow],
    aliases: &AliasTable,
    fx: &FxIndex,
    diags: &mut Diagnostics,
) -> Result<MonthTotals> {
    let mut totals = MonthTotals::default();
    for row in rows {
        match aliases.classify(&row.account) {
            CanonicalAccount::Revenue => {
                totals.revenue += to_usd(fx, row.period, &row.currency, row.amount)?;
            }
            CanonicalAccount::Cogs => {
                totals.cogs += to_usd(fx, row.period, &row.currency, row.amount)?;
            }
            CanonicalAccount::Opex(sub) => {
                let usd = to_usd(fx, row.period, &row.currency, row.amount)?;
                totals.opex += usd;
                *totals.opex_by_sub.entry(sub).or_insert(0.0) += usd;
            }
            CanonicalAccount::Unclassified => diags.record_unclassified(&row.account),
        }
    }
    Ok(totals)
}

/// Rows of one table for a month under the entity rule.
fn ledger_rows_for<'a>(
    rows: &'a [LedgerRow],
    period: Period,
    entity: Option<&str>,
) -> Vec<&'a LedgerRow> {
    let in_period: Vec<&LedgerRow> = rows.iter().filter(|r| r.period == period).collect();
    match entity {
        Some(e) => in_period
            .into_iter()
            .filter(|r| r.entity.eq_ignore_ascii_case(e))
            .collect(),
        None => {
            let has_consolidated = in_period
                .iter()
                .any(|r| r.entity.eq_ignore_ascii_case(CONSOLIDATED));
            if has_consolidated {
                in_period
                    .into_iter()
                    .filter(|r| r.entity.eq_ignore_ascii_case(CONSOLIDATED))
                    .collect()
            } else {
                in_period
            }
        }
    }
}

/// Sorted unique months present in actuals for the entity scope.
fn actuals_months(snapshot: &Snapshot, entity: Option<&str>) -> Vec<Period> {
    let months: BTreeSet<Period> = snapshot
        .actuals
        .iter()
        .filter(|r| entity.map_or(true, |e| r.entity.eq_ignore_ascii_case(e)))
        .map(|r| r.period)
        .collect();
    months.into_iter().collect()
}

fn cash_months(snapshot: &Snapshot, entity: Option<&str>) -> Vec<Period> {
    let months: BTreeSet<Period> = snapshot
        .cash
        .iter()
        .filter(|r| entity.map_or(true, |e| r.entity.eq_ignore_ascii_case(e)))
        .map(|r| r.period)
        .collect();
    months.into_iter().collect()
}

fn target_period(params: &QueryParams, snapshot: &Snapshot) -> Result<Period> {
    params
        .period
        .or(snapshot.latest_actuals)
        .ok_or_else(|| CopilotError::DataLoad("actuals table is empty; no month to report on".into()))
}

fn insufficient(table: &'static str, period: Period, entity: Option<&str>) -> CopilotError {
    CopilotError::InsufficientData {
        table,
        period,
        scope: scope_name(entity),
    }
}

fn scope_name(entity: Option<&str>) -> String {
    entity.map_or_else(|| "all entities".to_string(), |e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CashBalance, FxRate};

    fn ledger(year: i32, month: u32, entity: &str, account: &str, amount: f64, currency: &str) -> LedgerRow {
        LedgerRow {
            period: Period::new(year, month),
            entity: entity.to_string(),
            account: account.to_string(),
            amount,
            currency: currency.to_string(),
        }
    }

    fn cash(year: i32, month: u32, entity: &str, amount: f64) -> CashBalance {
        CashBalance {
            period: Period::new(year, month),
            entity: entity.to_string(),
            cash: amount,
            currency: "USD".to_string(),
        }
    }

    fn fx(year: i32, month: u32, currency: &str, rate: f64) -> FxRate {
        FxRate {
            period: Period::new(year, month),
            currency: currency.to_string(),
            rate_to_usd: rate,
        }
    }

    fn params(period: Option<Period>, entity: Option<&str>) -> QueryParams {
        QueryParams {
            period,
            window: None,
            entity: entity.map(|e| e.to_string()),
        }
    }

    #[test]
    fn test_revenue_vs_budget_reference_scenario() {
        let snapshot = Snapshot::new(
            vec![ledger(2025, 5, "US", "Revenue", 120000.0, "USD")],
            vec![ledger(2025, 5, "US", "Revenue", 100000.0, "USD")],
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = revenue_vs_budget(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 5)), Some("US")),
            &mut diags,
        )
        .unwrap();

        match result.headline {
            Headline::Comparison {
                actual_usd,
                budget_usd,
                variance_usd,
                variance_pct,
                ..
            } => {
                assert_eq!(actual_usd, 120000.0);
                assert_eq!(budget_usd, 100000.0);
                assert_eq!(variance_usd, actual_usd - budget_usd);
                assert!((variance_pct.unwrap() - 0.20).abs() < 1e-12);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_revenue_vs_budget_converts_currencies() {
        let snapshot = Snapshot::new(
            vec![
                ledger(2025, 5, "EU", "Revenue", 1000.0, "EUR"),
                ledger(2025, 5, "US", "Revenue", 500.0, "USD"),
            ],
            vec![ledger(2025, 5, "EU", "Revenue", 1000.0, "USD")],
            vec![fx(2025, 5, "EUR", 1.1)],
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = revenue_vs_budget(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 5)), None),
            &mut diags,
        )
        .unwrap();

        match result.headline {
            Headline::Comparison { actual_usd, .. } => {
                assert!((actual_usd - 1600.0).abs() < 1e-9)
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_revenue_vs_budget_missing_month_is_insufficient_data() {
        let snapshot = Snapshot::new(
            vec![ledger(2025, 5, "US", "Revenue", 1.0, "USD")],
            Vec::new(), // budget never loaded
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let err = revenue_vs_budget(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 5)), None),
            &mut diags,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CopilotError::InsufficientData { table: "budget", .. }
        ));
    }

    #[test]
    fn test_zero_budget_rows_still_distinct_from_zero_sum() {
        // A real budget row summing to zero is a legitimate zero, not an
        // error; variance_pct is undefined rather than ±inf.
        let snapshot = Snapshot::new(
            vec![ledger(2025, 5, "US", "Revenue", 50.0, "USD")],
            vec![ledger(2025, 5, "US", "Revenue", 0.0, "USD")],
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = revenue_vs_budget(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 5)), None),
            &mut diags,
        )
        .unwrap();
        match result.headline {
            Headline::Comparison { variance_pct, variance_usd, .. } => {
                assert_eq!(variance_pct, None);
                assert_eq!(variance_usd, 50.0);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_missing_fx_rate_aborts_the_metric() {
        let snapshot = Snapshot::new(
            vec![ledger(2025, 5, "EU", "Revenue", 1000.0, "EUR")],
            vec![ledger(2025, 5, "EU", "Revenue", 900.0, "USD")],
            Vec::new(), // no EUR rate loaded
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let err = revenue_vs_budget(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 5)), None),
            &mut diags,
        )
        .unwrap_err();
        assert!(matches!(err, CopilotError::MissingFxRate { .. }));
    }

    #[test]
    fn test_gross_margin_zero_revenue_month_is_undefined_in_series() {
        let snapshot = Snapshot::new(
            vec![
                ledger(2025, 4, "US", "Revenue", 1000.0, "USD"),
                ledger(2025, 4, "US", "COGS", 400.0, "USD"),
                ledger(2025, 5, "US", "COGS", 300.0, "USD"), // no revenue in May
                ledger(2025, 6, "US", "Revenue", 2000.0, "USD"),
                ledger(2025, 6, "US", "COGS", 500.0, "USD"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = gross_margin_trend(
            &snapshot,
            &AliasTable::default(),
            &params(None, None),
            &mut diags,
        )
        .unwrap();

        let labels: Vec<&str> = result.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2025-04", "2025-05", "2025-06"]);
        assert!((result.series[0].value.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(result.series[1].value, None);
        assert!((result.series[2].value.unwrap() - 0.75).abs() < 1e-12);

        match result.headline {
            Headline::Margin { period, pct } => {
                assert_eq!(period, Period::new(2025, 6));
                assert!((pct.unwrap() - 0.75).abs() < 1e-12);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_gross_margin_respects_window() {
        let mut actuals = Vec::new();
        for month in 1..=6 {
            actuals.push(ledger(2025, month, "US", "Revenue", 100.0, "USD"));
        }
        let snapshot = Snapshot::new(actuals, Vec::new(), Vec::new(), Vec::new());
        let mut diags = Diagnostics::default();

        let mut p = params(None, None);
        p.window = Some(2);
        let result =
            gross_margin_trend(&snapshot, &AliasTable::default(), &p, &mut diags).unwrap();
        let labels: Vec<&str> = result.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2025-05", "2025-06"]);
    }

    #[test]
    fn test_opex_breakdown_sorts_largest_driver_first() {
        let snapshot = Snapshot::new(
            vec![
                ledger(2025, 6, "US", "Opex:G&A", 5000.0, "USD"),
                ledger(2025, 6, "US", "Opex:Sales", 15000.0, "USD"),
                ledger(2025, 6, "US", "Revenue", 99.0, "USD"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = opex_breakdown(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 6)), None),
            &mut diags,
        )
        .unwrap();

        match &result.headline {
            Headline::Breakdown { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].label, "Opex:Sales");
                assert_eq!(items[0].usd, 15000.0);
                assert_eq!(items[1].label, "Opex:G&A");
                assert_eq!(items[1].usd, 5000.0);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_unclassified_rows_reported_not_summed() {
        let snapshot = Snapshot::new(
            vec![
                ledger(2025, 6, "US", "Revenue", 100.0, "USD"),
                ledger(2025, 6, "US", "Depreciation", 40.0, "USD"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = ebitda_summary(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 6)), None),
            &mut diags,
        )
        .unwrap();

        match result.headline {
            // Depreciation must not leak into any bucket.
            Headline::Ebitda { usd, .. } => assert_eq!(usd, 100.0),
            other => panic!("unexpected headline: {:?}", other),
        }
        let diagnostics = diags.into_list();
        assert_eq!(diagnostics, vec!["unclassified account: Depreciation"]);
    }

    #[test]
    fn test_consolidated_rows_preempt_per_entity_sums() {
        let snapshot = Snapshot::new(
            vec![
                ledger(2025, 6, "US", "Revenue", 100.0, "USD"),
                ledger(2025, 6, "EU", "Revenue", 50.0, "USD"),
                ledger(2025, 6, "Consolidated", "Revenue", 149.0, "USD"),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let mut diags = Diagnostics::default();
        let result = ebitda_summary(
            &snapshot,
            &AliasTable::default(),
            &params(Some(Period::new(2025, 6)), None),
            &mut diags,
        )
        .unwrap();
        match result.headline {
            Headline::Ebitda { usd, .. } => assert_eq!(usd, 149.0),
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_cash_runway_finite() {
        let snapshot = Snapshot::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![
                cash(2025, 3, "Consolidated", 120.0),
                cash(2025, 4, "Consolidated", 110.0),
                cash(2025, 5, "Consolidated", 100.0),
                cash(2025, 6, "Consolidated", 90.0),
            ],
        );
        let result = cash_runway(&snapshot, &params(None, None)).unwrap();

        match result.headline {
            Headline::Runway {
                months,
                cash_usd,
                avg_burn_usd,
            } => {
                assert_eq!(cash_usd, 90.0);
                assert!((avg_burn_usd - 10.0).abs() < 1e-9);
                assert!((months.unwrap() - 9.0).abs() < 1e-9);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_cash_runway_growing_cash_is_infinite() {
        let snapshot = Snapshot::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![
                cash(2025, 4, "Consolidated", 100.0),
                cash(2025, 5, "Consolidated", 120.0),
                cash(2025, 6, "Consolidated", 140.0),
            ],
        );
        let result = cash_runway(&snapshot, &params(None, None)).unwrap();
        match result.headline {
            Headline::Runway { months, .. } => assert_eq!(months, None),
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_cash_runway_sums_entities_when_no_consolidated_row() {
        let snapshot = Snapshot::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![
                cash(2025, 5, "US", 80.0),
                cash(2025, 5, "EU", 40.0),
                cash(2025, 6, "US", 70.0),
                cash(2025, 6, "EU", 30.0),
            ],
        );
        let result = cash_runway(&snapshot, &params(None, None)).unwrap();
        match result.headline {
            Headline::Runway {
                months,
                cash_usd,
                avg_burn_usd,
            } => {
                assert_eq!(cash_usd, 100.0);
                assert!((avg_burn_usd - 20.0).abs() < 1e-9);
                assert!((months.unwrap() - 5.0).abs() < 1e-9);
            }
            other => panic!("unexpected headline: {:?}", other),
        }
    }

    #[test]
    fn test_cash_runway_needs_two_months() {
        let snapshot = Snapshot::new(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![cash(2025, 6, "Consolidated", 100.0)],
        );
        let err = cash_runway(&snapshot, &params(None, None)).unwrap_err();
        assert!(matches!(
            err,
            CopilotError::InsufficientData { table: "cash", .. }
        ));
    }
}
