//! Persisted cooldown store
//!
//! Keeps `(pattern, expiresAt)` blocks in a durable key-value area so a visitor
//! is not prompted again on matching URLs until the block expires. The list is
//! stored as a JSON array of two-element arrays:
//!
//! ```json
//! [["*", 1700000600000], ["^https://shop\\.example/", 1700003600000]]
//! ```
//!
//! A purge token stored next to the list lets an operator drop every
//! outstanding block by changing a version string.
//!
//! When no storage is available every read is empty and every write is
//! skipped.

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{ExitIntentError, Result, check_duration};
use super::host::{Clock, KeyValueStore};

/// Pattern that blocks every URL
pub const BLOCK_WILDCARD: &str = "*";

/// Storage key for the block list
pub const STORAGE_KEY_BLOCKS: &str = "donleevBlocks";

/// Storage key for the purge token
pub const STORAGE_KEY_PURGE: &str = "donleevPurge";

const MS_PER_MINUTE: f64 = 60_000.0;

/// Cooldown length in milliseconds. Rejects lengths whose millisecond value
/// is not representable, since a non-finite expiry can't be stored as JSON.
pub(crate) fn cooldown_ms(minutes: f64) -> Result<f64> {
    let minutes = check_duration("cooldownMinutes", minutes)?;
    let ms = minutes * MS_PER_MINUTE;
    if ms.is_finite() {
        Ok(ms)
    } else {
        Err(ExitIntentError::InvalidDuration {
            field: "cooldownMinutes",
            value: minutes,
        })
    }
}

/// URL pattern of a cooldown block
#[derive(Debug, Clone, Default)]
pub enum BlockPattern {
    #[default]
    Wildcard,
    Regex(Regex),
}

impl BlockPattern {
    /// Parse the wildcard or compile a regular expression
    pub fn parse(source: &str) -> Result<Self> {
        if source == BLOCK_WILDCARD {
            return Ok(BlockPattern::Wildcard);
        }

        Regex::new(source)
            .map(BlockPattern::Regex)
            .map_err(|source_err| ExitIntentError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    pub fn as_str(&self) -> &str {
        match self {
            BlockPattern::Wildcard => BLOCK_WILDCARD,
            BlockPattern::Regex(regex) => regex.as_str(),
        }
    }

    /// Unanchored match against a URL
    pub fn matches(&self, url: &str) -> bool {
        match self {
            BlockPattern::Wildcard => true,
            BlockPattern::Regex(regex) => regex.is_match(url),
        }
    }
}

impl PartialEq for BlockPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for BlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct CooldownEntry {
    /// Wildcard or regular expression source
    pub pattern: String,
    /// Absolute expiry in epoch milliseconds
    pub expires_at: f64,
}

impl CooldownEntry {
    pub fn remaining_ms(&self, now_ms: f64) -> f64 {
        self.expires_at - now_ms
    }

    pub fn is_active(&self, now_ms: f64) -> bool {
        self.remaining_ms(now_ms) > 0.0
    }
}

impl From<(String, f64)> for CooldownEntry {
    fn from((pattern, expires_at): (String, f64)) -> Self {
        Self {
            pattern,
            expires_at,
        }
    }
}

impl From<CooldownEntry> for (String, f64) {
    fn from(entry: CooldownEntry) -> Self {
        (entry.pattern, entry.expires_at)
    }
}

/// An unexpired block matching a URL
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveBlock {
    pub pattern: String,
    pub remaining_ms: f64,
}

/// Block list backed by an optional key-value store
#[derive(Clone)]
pub struct CooldownStore {
    storage: Option<Rc<dyn KeyValueStore>>,
    clock: Rc<dyn Clock>,
}

impl CooldownStore {
    pub fn new(storage: Option<Rc<dyn KeyValueStore>>, clock: Rc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Whether blocks are persisted at all
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Read the persisted list. Malformed data is replaced with an empty list.
    pub fn entries(&self) -> Vec<CooldownEntry> {
        let Some(storage) = self.storage.as_ref() else {
            return Vec::new();
        };
        let Some(raw) = storage.get(STORAGE_KEY_BLOCKS) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<CooldownEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                leptos::logging::warn!("Couldn't parse cooldown blocks, resetting them: {}", e);
                self.save(Vec::new());
                Vec::new()
            }
        }
    }

    /// Persist `entries` after dropping the expired ones
    fn save(&self, mut entries: Vec<CooldownEntry>) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };

        let now = self.clock.now_ms();
        entries.retain(|entry| entry.is_active(now));

        match serde_json::to_string(&entries) {
            Ok(json) => storage.set(STORAGE_KEY_BLOCKS, &json),
            Err(e) => leptos::logging::warn!("Couldn't serialize cooldown blocks: {}", e),
        }
    }

    /// Every unexpired block whose pattern matches `url`.
    ///
    /// Fails on the first stored pattern that does not compile.
    pub fn active_blocks(&self, url: &str) -> Result<Vec<ActiveBlock>> {
        let now = self.clock.now_ms();
        let mut active = Vec::new();

        for entry in self.entries() {
            if !entry.is_active(now) {
                continue;
            }
            if BlockPattern::parse(&entry.pattern)?.matches(url) {
                active.push(ActiveBlock {
                    remaining_ms: entry.remaining_ms(now),
                    pattern: entry.pattern,
                });
            }
        }

        Ok(active)
    }

    pub fn is_blocking(&self, url: &str) -> Result<bool> {
        Ok(!self.active_blocks(url)?.is_empty())
    }

    /// Block URLs matching `pattern` for `minutes`
    pub fn add_block(&self, pattern: &BlockPattern, minutes: f64) -> Result<()> {
        let duration_ms = cooldown_ms(minutes)?;
        let expires_at = self.clock.now_ms() + duration_ms;
        if !expires_at.is_finite() {
            return Err(ExitIntentError::InvalidDuration {
                field: "cooldownMinutes",
                value: minutes,
            });
        }
        if !self.is_available() {
            return Ok(());
        }

        let mut entries = self.entries();
        entries.push(CooldownEntry {
            pattern: pattern.as_str().to_string(),
            expires_at,
        });
        self.save(entries);
        Ok(())
    }

    /// Drop every block if `token` differs from the stored one. Returns true
    /// when a purge happened.
    pub fn purge(&self, token: &str) -> bool {
        let Some(storage) = self.storage.as_ref() else {
            return false;
        };

        if storage.get(STORAGE_KEY_PURGE).as_deref() == Some(token) {
            return false;
        }

        storage.set(STORAGE_KEY_PURGE, token);
        self.save(Vec::new());
        leptos::logging::log!("Cooldown blocks purged with token {:?}", token);
        true
    }
}
