//! Durable key-value store
//!
//! Entries carry an optional time-to-live. An entry at or past its expiry
//! reads as absent and is deleted on the read that observes it.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::Result;

/// Key-value storage that survives process restarts.
pub trait DurableKv: Send + Sync {
    /// Returns the stored value, or `None` when missing or expired.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`, replacing any previous entry. `ttl_secs` of `None`
    /// keeps the entry until it is removed.
    fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Reads a JSON-encoded value.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes a value as JSON.
    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw, ttl_secs)
    }
}

/// A raw row of the key-value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl KvEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }

    /// Seconds left before expiry, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at
            .map(|at| (at - now).num_seconds().max(0))
    }
}

impl Database {
    /// Loads an entry without applying expiry, for inspection.
    pub fn entry(&self, key: &str) -> Result<Option<KvEntry>> {
        self.with_connection(|conn| {
            let row = conn
                .query_row(
                    "SELECT key, value, expires_at FROM kv WHERE key = ?1",
                    [key],
                    |row| {
                        let expires_ms: Option<i64> = row.get(2)?;
                        Ok(KvEntry {
                            key: row.get(0)?,
                            value: row.get(1)?,
                            expires_at: expires_ms
                                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Deletes every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now_ms = Utc::now().timestamp_millis();
        let removed = self.with_connection(|conn| {
            Ok(conn.execute(
                "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [now_ms],
            )?)
        })?;

        if removed > 0 {
            tracing::debug!(removed, "Purged expired entries");
        }

        Ok(removed)
    }
}

impl DurableKv for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(entry) = self.entry(key)? else {
            return Ok(None);
        };

        if entry.is_expired_at(Utc::now()) {
            self.remove(key)?;
            tracing::debug!(key = %key, "Entry expired");
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        let now = Utc::now();
        let expires_at = ttl_secs.map(|ttl| {
            let ttl_ms = i64::try_from(ttl.saturating_mul(1000)).unwrap_or(i64::MAX);
            now.timestamp_millis().saturating_add(ttl_ms)
        });

        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value, expires_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![key, value, expires_at, now.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}
