//! FP&A Copilot
//!
//! Answers free-text finance questions ("What was June revenue vs
//! budget?") against four monthly CSV tables:
//! - Classifies the question's intent with an ordered rule list
//! - Computes the requested metric from normalized, classified rows
//! - Composes a short text answer plus a chart-ready series
//! - Records every answered query in a session audit log
//!
//! PIPELINE:
//! QUESTION → CLASSIFY → COMPUTE → COMPOSE → RECORD
//!
//! The four tables are loaded once into an immutable snapshot; every
//! query is an in-memory aggregation over it. Deterministic end to end,
//! no model calls anywhere.

pub mod accounts;
pub mod agent;
pub mod api;
pub mod audit;
pub mod classifier;
pub mod composer;
pub mod data;
pub mod error;
pub mod fx;
pub mod metrics;
pub mod models;

pub use error::Result;

// Re-export common types
pub use accounts::AliasTable;
pub use agent::{Copilot, CopilotConfig};
pub use classifier::{classify, ClassifierContext};
pub use data::Snapshot;
pub use models::*;
