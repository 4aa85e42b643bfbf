//! Answer Composer
//!
//! Pure formatting: turns a `MetricResult` into one or two sentences.
//! Currency is rounded to whole dollars, percentages to one decimal.
//! The chart series is never touched here; it passes through to the
//! presentation layer unmodified.

use crate::error::CopilotError;
use crate::models::{Headline, MetricResult};
use std::fmt::Write;

/// Questions shown by the fallback response and the CLI banner.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "What was June 2025 revenue vs budget in USD?",
    "Show Gross Margin % trend for the last 3 months.",
    "Break down Opex by category for June 2025.",
    "What is our cash runway right now?",
];

/// Compose the narrative for a computed metric.
pub fn compose(result: &MetricResult) -> String {
    let mut text = match &result.headline {
        Headline::Comparison {
            period,
            actual_usd,
            budget_usd,
            variance_usd,
            variance_pct,
        } => {
            let pct = match variance_pct {
                Some(p) => format!("{:+.1}%", p * 100.0),
                None => "% undefined — budget is zero".to_string(),
            };
            format!(
                "Revenue vs budget for {}: actual {}, budget {}, variance {} ({}).",
                period,
                usd(*actual_usd),
                usd(*budget_usd),
                usd(*variance_usd),
                pct
            )
        }

        Headline::Margin { period, pct } => {
            let mut text = String::from("Gross margin % by month: ");
            for (i, point) in result.series.iter().enumerate() {
                if i > 0 {
                    text.push_str(", ");
                }
                match point.value {
                    Some(ratio) => {
                        let _ = write!(text, "{} {:.1}%", point.label, ratio * 100.0);
                    }
                    None => {
                        let _ = write!(
                            text,
                            "{} undefined — no revenue recorded",
                            point.label
                        );
                    }
                }
            }
            text.push('.');
            if pct.is_none() {
                let _ = write!(
                    text,
                    " The latest month ({}) has no revenue, so its margin is undefined.",
                    period
                );
            }
            text
        }

        Headline::Breakdown { period, items } => {
            if items.is_empty() {
                format!("No Opex recorded for {}.", period)
            } else {
                let mut text = format!("Opex for {} (largest driver first): ", period);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        text.push_str(", ");
                    }
                    let _ = write!(text, "{} {}", item.label, usd(item.usd));
                }
                text.push('.');
                text
            }
        }

        Headline::Ebitda { period, usd: value } => {
            format!("EBITDA for {}: {}.", period, usd(*value))
        }

        Headline::Runway {
            months,
            cash_usd,
            avg_burn_usd,
        } => match months {
            Some(m) => format!(
                "Cash runway: {:.1} months (cash {} / average monthly burn {}).",
                m,
                usd(*cash_usd),
                usd(*avg_burn_usd)
            ),
            None => format!(
                "Cash runway: infinite — cash ({}) is not shrinking over the trailing window.",
                usd(*cash_usd)
            ),
        },
    };

    for note in &result.notes {
        text.push(' ');
        text.push_str(note);
    }
    text
}

/// User-facing explanation for a metric that could not be computed.
/// Always names the missing month/currency/table, never a guessed value.
pub fn explain_error(err: &CopilotError) -> String {
    match err {
        CopilotError::MissingFxRate { period, currency } => format!(
            "I can't compute that: no FX rate is loaded for {} in {}, so amounts in that \
             currency can't be converted to USD.",
            currency, period
        ),
        CopilotError::InsufficientData {
            table,
            period,
            scope,
        } => format!(
            "I can't compute that: the {} table has no rows for {} in {}. That month may \
             simply not be loaded — a true zero would still have rows.",
            table, scope, period
        ),
        other => format!("I couldn't answer that: {}.", other),
    }
}

/// Fallback for a question no rule matched.
pub fn fallback(question: &str) -> String {
    let mut text = format!(
        "I didn't understand \"{}\". Try one of: ",
        question.trim()
    );
    for (i, example) in EXAMPLE_QUESTIONS.iter().enumerate() {
        if i > 0 {
            text.push_str(" • ");
        }
        text.push_str(example);
    }
    text
}

/// Whole dollars with thousands separators.
pub fn usd(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}", if rounded < 0 { "-" } else { "" }, grouped)
}
