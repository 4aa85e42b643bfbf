//! Copilot front door
//!
//! QUESTION → CLASSIFY → COMPUTE → COMPOSE → RECORD
//!
//! Runs the whole pipeline synchronously over the immutable snapshot.
//! Nothing here is fatal to the process: unrecognized questions and
//! failed metric computations come back as explanatory answers scoped to
//! the one query.

use crate::accounts::AliasTable;
use crate::audit::AnswerLog;
use crate::classifier::{self, ClassifierContext};
use crate::composer;
use crate::data::Snapshot;
use crate::error::CopilotError;
use crate::metrics::{self, Diagnostics, DEFAULT_TRAILING_WINDOW};
use crate::models::{Answer, AnswerRecord, Metric};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Externally overridable configuration: the chart of accounts and the
/// runway trailing window.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    pub aliases: AliasTable,
    pub runway_window: usize,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            aliases: AliasTable::default(),
            runway_window: DEFAULT_TRAILING_WINDOW,
        }
    }
}

/// The question-answering engine. Holds the read-only snapshot, the
/// configuration, and the session audit log.
pub struct Copilot {
    snapshot: Arc<Snapshot>,
    config: CopilotConfig,
    audit: AnswerLog,
}

impl Copilot {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self::with_config(snapshot, CopilotConfig::default())
    }

    pub fn with_config(snapshot: Arc<Snapshot>, config: CopilotConfig) -> Self {
        Self {
            snapshot,
            config,
            audit: AnswerLog::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn audit(&self) -> &AnswerLog {
        &self.audit
    }

    /// Answer a question. Convenience wrapper over [`Copilot::respond`]
    /// returning just the answer.
    pub fn answer(&self, question: &str) -> Answer {
        (*self.respond(question).answer).clone()
    }

    /// Answer a question and return the full audit record.
    pub fn respond(&self, question: &str) -> AnswerRecord {
        let start = Instant::now();
        info!(question, "Answering question");

        let ctx = ClassifierContext {
            entities: &self.snapshot.entities,
            latest_actuals: self.snapshot.latest_actuals,
        };
        let mut diags = Diagnostics::default();

        let (metric, mut answer) = match classifier::classify(question, &ctx) {
            Ok(mut intent) => {
                if intent.metric == Metric::CashRunway && intent.params.window.is_none() {
                    intent.params.window = Some(self.config.runway_window);
                }
                info!(metric = %intent.metric, params = ?intent.params, "Intent classified");

                match metrics::compute(&self.snapshot, &self.config.aliases, &intent, &mut diags)
                {
                    Ok(result) => {
                        let text = composer::compose(&result);
                        (
                            Some(intent.metric),
                            Answer {
                                text,
                                series: result.series,
                                diagnostics: Vec::new(),
                            },
                        )
                    }
                    Err(err) => {
                        warn!(metric = %intent.metric, error = %err, "Metric computation failed");
                        (
                            Some(intent.metric),
                            Answer {
                                text: composer::explain_error(&err),
                                series: Vec::new(),
                                diagnostics: Vec::new(),
                            },
                        )
                    }
                }
            }
            Err(CopilotError::UnrecognizedIntent(q)) => {
                info!("No intent rule matched");
                (
                    None,
                    Answer {
                        text: composer::fallback(&q),
                        series: Vec::new(),
                        diagnostics: Vec::new(),
                    },
                )
            }
            Err(err) => (
                None,
                Answer {
                    text: composer::explain_error(&err),
                    series: Vec::new(),
                    diagnostics: Vec::new(),
                },
            ),
        };

        answer.diagnostics = diags.into_list();

        let record = AnswerRecord {
            audit_id: Uuid::new_v4(),
            question: question.to_string(),
            metric,
            answer: Arc::new(answer),
            snapshot_hash: self.snapshot.fingerprint.clone(),
            created_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Err(err) = self.audit.record(record.clone()) {
            warn!(error = %err, "Failed to record audit entry");
        }

        info!(
            audit_id = %record.audit_id,
            duration_ms = record.duration_ms,
            "Question answered"
        );
        record
    }
}
