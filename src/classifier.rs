//! Intent Classifier
//!
//! Routes a raw question string to one of the five metrics with extracted
//! parameters (target month, trailing window, entity filter). Rule-based:
//! a fixed-priority list of keyword groups evaluated in one pass, first
//! match wins. More specific phrasings ("opex breakdown") are checked
//! before generic ones ("revenue") to avoid misrouting.

use crate::error::{CopilotError, Result};
use crate::models::{Intent, Metric, Period, QueryParams};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// One routing rule. Every group must contribute at least one keyword hit
/// against the lowercased question.
struct IntentRule {
    metric: Metric,
    groups: &'static [&'static [&'static str]],
}

/// Static rule list, checked in order. Zero allocation.
const RULES: &[IntentRule] = &[
    IntentRule {
        metric: Metric::OpexBreakdown,
        groups: &[
            &["opex", "operating expense", "operating expenses"],
            &["breakdown", "break down", "by category", "split"],
        ],
    },
    IntentRule {
        metric: Metric::RevenueVsBudget,
        groups: &[&["revenue", "sales"], &["budget", "plan", "target"]],
    },
    IntentRule {
        metric: Metric::GrossMargin,
        groups: &[&["gross margin", "margin"]],
    },
    IntentRule {
        metric: Metric::Ebitda,
        groups: &[&["ebitda", "operating profit"]],
    },
    IntentRule {
        metric: Metric::CashRunway,
        groups: &[&["runway", "months of cash", "cash last"]],
    },
];

/// Long aliases before short so the regex captures the whole word.
const MONTH_PATTERN: &str = "january|february|march|april|may|june|july|august|september|october|november|december|sept|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";

lazy_static! {
    static ref MONTHS: HashMap<&'static str, u32> = {
        let mut m = HashMap::new();
        for (names, number) in [
            (&["jan", "january"][..], 1),
            (&["feb", "february"][..], 2),
            (&["mar", "march"][..], 3),
            (&["apr", "april"][..], 4),
            (&["may"][..], 5),
            (&["jun", "june"][..], 6),
            (&["jul", "july"][..], 7),
            (&["aug", "august"][..], 8),
            (&["sep", "sept", "september"][..], 9),
            (&["oct", "october"][..], 10),
            (&["nov", "november"][..], 11),
            (&["dec", "december"][..], 12),
        ] {
            for name in names {
                m.insert(*name, number);
            }
        }
        m
    };
    static ref MONTH_YEAR: Regex =
        Regex::new(&format!(r"(?i)\b({})\.?\s+(20\d{{2}})\b", MONTH_PATTERN)).unwrap();
    static ref MONTH_ONLY: Regex =
        Regex::new(&format!(r"(?i)\b({})\b", MONTH_PATTERN)).unwrap();
    static ref NUMERIC_PERIOD: Regex = Regex::new(r"\b(20\d{2})[-/](\d{1,2})\b").unwrap();
    static ref WINDOW: Regex = Regex::new(r"(?i)\blast\s+(\d{1,2})\s+months?\b").unwrap();
}

/// Snapshot-derived context the classifier needs: the entities it may
/// recognize verbatim and the fallback year for month-only mentions.
pub struct ClassifierContext<'a> {
    pub entities: &'a [String],
    pub latest_actuals: Option<Period>,
}

/// Classify a question into an intent.
///
/// Fails with `UnrecognizedIntent` when no rule matches; the caller shows
/// a fallback message listing supported questions, never a crash.
pub fn classify(question: &str, ctx: &ClassifierContext<'_>) -> Result<Intent> {
    let lower = question.to_lowercase();

    let rule = RULES
        .iter()
        .find(|rule| {
            rule.groups
                .iter()
                .all(|group| group.iter().any(|kw| lower.contains(kw)))
        })
        .ok_or_else(|| CopilotError::UnrecognizedIntent(question.trim().to_string()))?;

    Ok(Intent {
        metric: rule.metric,
        params: QueryParams {
            period: extract_period(&lower, ctx.latest_actuals),
            window: extract_window(&lower),
            entity: extract_entity(&lower, ctx.entities),
        },
    })
}

/// Recognize "June 2025", "2025-06" / "2025/06", or a bare month name
/// (year defaulting to the latest actuals year).
fn extract_period(lower: &str, latest: Option<Period>) -> Option<Period> {
    if let Some(caps) = MONTH_YEAR.captures(lower) {
        let month = MONTHS[caps[1].to_lowercase().as_str()];
        let year = caps[2].parse().ok()?;
        return Some(Period::new(year, month));
    }

    if let Some(caps) = NUMERIC_PERIOD.captures(lower) {
        let year = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        if (1..=12).contains(&month) {
            return Some(Period::new(year, month));
        }
    }

    if let Some(caps) = MONTH_ONLY.captures(lower) {
        let month = MONTHS[caps[1].to_lowercase().as_str()];
        return latest.map(|p| Period::new(p.year, month));
    }

    None
}

/// "last 3 months" → 3. Metrics apply their own default when absent.
fn extract_window(lower: &str) -> Option<usize> {
    WINDOW
        .captures(lower)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|n| *n > 0)
}

/// Find the first known entity appearing verbatim as a whole word, so
/// that "US" never matches inside "USD".
fn extract_entity(lower: &str, entities: &[String]) -> Option<String> {
    entities
        .iter()
        .find(|entity| contains_word(lower, &entity.to_lowercase()))
        .cloned()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let bounded_left = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let bounded_right = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if bounded_left && bounded_right {
            return true;
        }
        from = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(entities: &[&str]) -> (Vec<String>, Option<Period>) {
        (
            entities.iter().map(|e| e.to_string()).collect(),
            Some(Period::new(2025, 7)),
        )
    }

    fn classify_with(question: &str, entities: &[&str]) -> Result<Intent> {
        let (entities, latest) = ctx(entities);
        classify(
            question,
            &ClassifierContext {
                entities: &entities,
                latest_actuals: latest,
            },
        )
    }

    #[test]
    fn test_routes_each_supported_question() {
        let cases = vec![
            ("What was June 2025 revenue vs budget in USD?", Metric::RevenueVsBudget),
            ("Show Gross Margin % trend for the last 3 months.", Metric::GrossMargin),
            ("Break down Opex by category for June 2025.", Metric::OpexBreakdown),
            ("What is our cash runway right now?", Metric::CashRunway),
            ("What was EBITDA in June 2025?", Metric::Ebitda),
        ];

        for (question, expected) in cases {
            let intent = classify_with(question, &["US", "EU"]).unwrap();
            assert_eq!(intent.metric, expected, "misrouted: {}", question);
        }
    }

    #[test]
    fn test_specific_rules_win_over_generic_keywords() {
        // "sales" + "budget" would satisfy the revenue rule, but the opex
        // phrasing must take priority.
        let intent =
            classify_with("Break down opex: how did Sales compare to budget?", &[]).unwrap();
        assert_eq!(intent.metric, Metric::OpexBreakdown);
    }

    #[test]
    fn test_unmatched_question_is_unrecognized() {
        let err = classify_with("What's the weather like today?", &["US"]).unwrap_err();
        assert!(matches!(err, CopilotError::UnrecognizedIntent(_)));
    }

    #[test]
    fn test_extracts_month_and_year_forms() {
        let lower = "revenue vs budget for june 2025";
        assert_eq!(
            extract_period(lower, None),
            Some(Period::new(2025, 6))
        );
        assert_eq!(
            extract_period("revenue vs budget for 2025-06", None),
            Some(Period::new(2025, 6))
        );
        assert_eq!(
            extract_period("revenue vs budget for 2025/6", None),
            Some(Period::new(2025, 6))
        );
    }

    #[test]
    fn test_bare_month_falls_back_to_latest_actuals_year() {
        let latest = Some(Period::new(2025, 7));
        assert_eq!(
            extract_period("what was march revenue vs budget?", latest),
            Some(Period::new(2025, 3))
        );
        // without a loaded snapshot there is nothing to default to
        assert_eq!(extract_period("what was march revenue?", None), None);
    }

    #[test]
    fn test_month_name_inside_a_word_does_not_count() {
        assert_eq!(extract_period("maybe revenue grew?", None), None);
        assert_eq!(
            extract_period("we decided in september 2025", None),
            Some(Period::new(2025, 9))
        );
    }

    #[test]
    fn test_extracts_trailing_window() {
        assert_eq!(extract_window("margin for the last 6 months"), Some(6));
        assert_eq!(extract_window("last 1 month"), Some(1));
        assert_eq!(extract_window("margin trend"), None);
    }

    #[test]
    fn test_entity_matches_whole_words_only() {
        let entities = vec!["EU".to_string(), "US".to_string()];
        assert_eq!(
            extract_entity("revenue vs budget for us", &entities),
            Some("US".to_string())
        );
        // "USD" must not look like the US entity
        assert_eq!(extract_entity("revenue vs budget in usd", &entities), None);
        assert_eq!(
            extract_entity("how is eu doing vs budget", &entities),
            Some("EU".to_string())
        );
    }

    #[test]
    fn test_full_intent_for_the_reference_question() {
        let intent =
            classify_with("What was May 2025 revenue vs budget for US?", &["EU", "US"]).unwrap();
        assert_eq!(intent.metric, Metric::RevenueVsBudget);
        assert_eq!(intent.params.period, Some(Period::new(2025, 5)));
        assert_eq!(intent.params.entity, Some("US".to_string()));
        assert_eq!(intent.params.window, None);
    }
}
