//! In-memory audit log
//!
//! Append-only, hash-chained record of every ledger mutation. Entries are
//! kept in a bounded ring; the chain lets an external collector detect
//! tampering or gaps in what it received.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use super::event::{AuditEvent, AuditKind};
use super::AuditSink;

/// Maximum log entries to keep in memory
const MAX_MEMORY_ENTRIES: usize = 10_000;

/// Single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry sequence number
    pub sequence: u64,
    /// Timestamp (microseconds since UNIX epoch)
    pub timestamp_us: u64,
    /// Recorded event
    pub event: AuditEvent,
    /// Hash of previous entry (for chain integrity)
    pub prev_hash: [u8; 32],
    /// Hash of this entry
    pub entry_hash: [u8; 32],
}

impl AuditEntry {
    /// Compute the hash of this entry
    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_le_bytes());
        hasher.update(self.timestamp_us.to_le_bytes());
        // serde_json output of our own enums is deterministic
        let payload = serde_json::to_vec(&self.event).unwrap_or_default();
        hasher.update(&payload);
        hasher.update(self.prev_hash);

        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    /// Entry hash as hex
    pub fn hash_hex(&self) -> String {
        hex::encode(self.entry_hash)
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Event kinds to keep (empty = all)
    pub kinds_filter: Vec<AuditKind>,
    /// Maximum entries in memory
    pub max_memory_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            kinds_filter: vec![],
            max_memory_entries: MAX_MEMORY_ENTRIES,
        }
    }
}

/// Audit statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditStats {
    /// Total entries logged
    pub total_entries: u64,
    /// Entries by event kind
    pub by_kind: HashMap<String, u64>,
    /// Entries evicted from memory
    pub evicted: u64,
}

struct LogInner {
    entries: VecDeque<AuditEntry>,
    sequence: u64,
    last_hash: [u8; 32],
    /// Hash preceding the oldest retained entry
    base_hash: [u8; 32],
    stats: AuditStats,
}

/// Hash-chained audit log
pub struct AuditLog {
    config: AuditConfig,
    inner: RwLock<LogInner>,
}

impl AuditLog {
    /// Create a new audit log with default config
    pub fn new() -> Self {
        Self::with_config(AuditConfig::default())
    }

    /// Create a new audit log with custom config
    pub fn with_config(config: AuditConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(LogInner {
                entries: VecDeque::new(),
                sequence: 0,
                last_hash: [0u8; 32],
                base_hash: [0u8; 32],
                stats: AuditStats::default(),
            }),
        }
    }

    /// Append an event
    pub fn append(&self, event: AuditEvent) {
        if !self.config.kinds_filter.is_empty()
            && !self.config.kinds_filter.contains(&event.kind())
        {
            return;
        }

        let timestamp_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;

        let mut inner = self.inner.write();

        let mut entry = AuditEntry {
            sequence: inner.sequence,
            timestamp_us,
            event,
            prev_hash: inner.last_hash,
            entry_hash: [0u8; 32],
        };
        entry.entry_hash = entry.compute_hash();

        inner.sequence += 1;
        inner.last_hash = entry.entry_hash;
        inner.stats.total_entries += 1;
        *inner
            .stats
            .by_kind
            .entry(entry.event.kind().to_string())
            .or_insert(0) += 1;

        inner.entries.push_back(entry);

        while inner.entries.len() > self.config.max_memory_entries {
            if let Some(evicted) = inner.entries.pop_front() {
                inner.base_hash = evicted.entry_hash;
                inner.stats.evicted += 1;
            }
        }
    }

    /// Get recent entries, newest first
    pub fn recent(&self, count: usize) -> Vec<AuditEntry> {
        self.inner.read().entries.iter().rev().take(count).cloned().collect()
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.read().entries.iter().cloned().collect()
    }

    /// Get entries of one kind, oldest first
    pub fn entries_of(&self, kind: AuditKind) -> Vec<AuditEntry> {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|e| e.event.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get audit statistics
    pub fn stats(&self) -> AuditStats {
        self.inner.read().stats.clone()
    }

    /// Verify the hash chain over retained entries
    pub fn verify_chain(&self) -> Result<(), ChainVerifyError> {
        let inner = self.inner.read();
        let mut prev_hash = inner.base_hash;

        for entry in inner.entries.iter() {
            if entry.prev_hash != prev_hash {
                return Err(ChainVerifyError::PrevHashMismatch {
                    sequence: entry.sequence,
                });
            }
            if entry.compute_hash() != entry.entry_hash {
                return Err(ChainVerifyError::EntryHashMismatch {
                    sequence: entry.sequence,
                });
            }
            prev_hash = entry.entry_hash;
        }

        Ok(())
    }

    /// Export retained entries to JSON
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let entries = self.entries();
        serde_json::to_string_pretty(&entries)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for AuditLog {
    fn record(&self, event: AuditEvent) {
        self.append(event);
    }
}

/// Chain verification error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainVerifyError {
    #[error("Previous hash mismatch at sequence {sequence}")]
    PrevHashMismatch { sequence: u64 },

    #[error("Entry hash mismatch at sequence {sequence}")]
    EntryHashMismatch { sequence: u64 },
}
