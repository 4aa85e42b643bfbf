//! Audit logging
//!
//! Every answered question is recorded with the snapshot fingerprint it
//! was computed against, so a session's answers are traceable and
//! replayable against the same data.

use crate::error::{CopilotError, Result};
use crate::models::AnswerRecord;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory audit trail. The only shared mutable state in the crate;
/// the snapshot itself stays read-only.
pub struct AnswerLog {
    records: RwLock<HashMap<Uuid, AnswerRecord>>,
}

impl AnswerLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Store an answer record.
    pub fn record(&self, record: AnswerRecord) -> Result<Uuid> {
        let audit_id = record.audit_id;
        let mut records = self.write()?;
        records.insert(audit_id, record);
        Ok(audit_id)
    }

    /// Retrieve a record by audit ID.
    pub fn get(&self, audit_id: Uuid) -> Result<Option<AnswerRecord>> {
        let records = self.read()?;
        Ok(records.get(&audit_id).cloned())
    }

    /// All audit IDs, sorted by creation time.
    pub fn list(&self) -> Result<Vec<Uuid>> {
        let records = self.read()?;

        let mut items: Vec<_> = records
            .iter()
            .map(|(id, record)| (*id, record.created_at))
            .collect();
        items.sort_by_key(|(_, created_at)| *created_at);

        Ok(items.into_iter().map(|(id, _)| id).collect())
    }

    /// Check that a record was computed against the given snapshot
    /// fingerprint; a mismatch means the data has been reloaded since.
    pub fn verify_integrity(&self, audit_id: Uuid, snapshot_hash: &str) -> Result<bool> {
        let records = self.read()?;
        Ok(records
            .get(&audit_id)
            .map(|record| record.snapshot_hash == snapshot_hash)
            .unwrap_or(false))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Uuid, AnswerRecord>>> {
        self.records
            .read()
            .map_err(|_| CopilotError::Audit("answer log lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, AnswerRecord>>> {
        self.records
            .write()
            .map_err(|_| CopilotError::Audit("answer log lock poisoned".to_string()))
    }
}

impl Default for AnswerLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the SHA-256 fingerprint of any serializable value.
/// Uses zero-copy streaming serialization into the hasher.
pub fn fingerprint_json<T: Serialize>(value: &T) -> String {
    let mut hasher = Sha256::new();

    // Stream JSON directly into the hasher (no intermediate String)
    if serde_json::to_writer(&mut HashWriter(&mut hasher), value).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
