use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::Value;

use crate::{
    config::document::{ConfigDocument, Migrated, migrate_document},
    foundation::error::{StardreamError, StardreamResult},
};

/// Trailing-edge delay applied to document writes.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Key/value persistence for the configuration document.
///
/// `load` hands back raw JSON; callers always go through [`migrate_document`] so stores never
/// need to know the document schema.
pub trait SettingsStore: Send {
    fn save(&mut self, doc: &ConfigDocument) -> StardreamResult<()>;
    fn load(&self) -> StardreamResult<Option<Value>>;
}

/// Load the persisted document, falling back to defaults on any failure.
pub fn load_or_default(store: &dyn SettingsStore) -> Migrated {
    match store.load() {
        Ok(v) => migrate_document(v.as_ref()),
        Err(e) => {
            tracing::warn!(error = %e, "settings load failed, using default document");
            migrate_document(None)
        }
    }
}

/// Load raw JSON for migration. Unparseable content counts as absent so migration can rebuild
/// it; IO failures propagate, since overwriting an unreadable file would lose it.
pub fn load_for_migration(store: &dyn SettingsStore) -> StardreamResult<Option<Value>> {
    match store.load() {
        Ok(v) => Ok(v),
        Err(StardreamError::ConfigIntegrity(msg)) => {
            tracing::warn!(error = %msg, "settings unparseable, migrating from defaults");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Settings store kept in memory, for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    value: Option<Value>,
    saves: usize,
    fail_writes: bool,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an arbitrary (possibly malformed) persisted value.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls.
    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Make subsequent writes fail with a persistence error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl SettingsStore for MemorySettingsStore {
    fn save(&mut self, doc: &ConfigDocument) -> StardreamResult<()> {
        if self.fail_writes {
            return Err(StardreamError::persistence("settings store is read-only"));
        }
        self.value = Some(doc.to_json_value());
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> StardreamResult<Option<Value>> {
        Ok(self.value.clone())
    }
}

/// Settings store backed by a single JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a crash mid-write keeps
/// the previous document readable.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn save(&mut self, doc: &ConfigDocument) -> StardreamResult<()> {
        let text = doc.to_json_string_pretty()?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir '{}'", parent.display()))
                .map_err(|e| StardreamError::persistence(format!("{e:#}")))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .with_context(|| format!("write '{}'", tmp.display()))
            .and_then(|()| {
                std::fs::rename(&tmp, &self.path)
                    .with_context(|| format!("replace '{}'", self.path.display()))
            })
            .map_err(|e| StardreamError::persistence(format!("{e:#}")))
    }

    fn load(&self) -> StardreamResult<Option<Value>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StardreamError::persistence(format!(
                    "read '{}': {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&text).map(Some).map_err(|e| {
            StardreamError::config_integrity(format!("parse '{}': {e}", self.path.display()))
        })
    }
}

/// Trailing-edge debouncer: only the last scheduled value is emitted, once `delay` has elapsed
/// since the last `schedule` call.
///
/// Time is supplied by the caller, so the debouncer has no threads or timers of its own.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the quiet period at `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Pending value if its quiet period has elapsed by `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.delay => {
                self.pending.take().map(|(v, _)| v)
            }
            _ => None,
        }
    }

    /// Pending value regardless of timing.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/persist.rs"]
mod tests;
