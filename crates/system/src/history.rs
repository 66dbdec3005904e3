//! Durable rolling history of aggregate CPU readings.
//!
//! On disk the history is a flat JSON object mapping a fractional epoch
//! timestamp (as a string) to the percentage recorded at that time:
//!   {"1700000000.123456": 42.0, "1700000060.5": 17.25}

use chrono::{DateTime, TimeDelta, Utc};
use cpuavg_core::{format_decimal, CheckError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Permissions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Timestamp → percent samples inside the rolling window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryRecord {
    samples: BTreeMap<String, f64>,
}

impl HistoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample stored at `timestamp`, however its key happens to be spelled.
    pub fn get(&self, timestamp: f64) -> Option<f64> {
        self.samples
            .iter()
            .find(|(key, _)| key.parse::<f64>().is_ok_and(|ts| ts == timestamp))
            .map(|(_, value)| *value)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.values().copied()
    }

    /// Insert a sample, replacing any reading already stored at `timestamp`.
    pub fn append(&mut self, timestamp: f64, value: f64) {
        self.samples
            .retain(|key, _| key.parse::<f64>().map_or(true, |ts| ts != timestamp));
        self.samples.insert(format_decimal(timestamp), value);
    }

    /// Drop every sample older than `cutoff` (epoch seconds). A sample taken
    /// exactly at the cutoff is kept.
    pub fn prune(&mut self, cutoff: f64) {
        self.samples
            .retain(|key, _| key.parse::<f64>().is_ok_and(|ts| ts >= cutoff));
    }

    /// Arithmetic mean of every retained sample.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.values().sum::<f64>() / self.samples.len() as f64)
    }
}

/// Fractional seconds since the epoch, microsecond precision.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_micros()) / 1_000_000.0
}

/// Oldest timestamp still inside a `window_minutes` window ending at `now`.
pub fn window_cutoff(now: DateTime<Utc>, window_minutes: u32) -> f64 {
    epoch_seconds(now - TimeDelta::minutes(i64::from(window_minutes)))
}

/// Load the history at `path` and prune it to the window ending at `now`.
///
/// A missing file is an empty history. A file that cannot be read is
/// [`CheckError::HistoryUnreadable`]; one that reads but does not hold a
/// timestamp → number object is [`CheckError::CorruptHistory`].
pub fn load(path: &Path, now: DateTime<Utc>, window_minutes: u32) -> Result<HistoryRecord> {
    if !path.exists() {
        info!("no history at '{}'; starting fresh", path.display());
        return Ok(HistoryRecord::new());
    }

    let corrupt = |reason: String| CheckError::CorruptHistory {
        path: path.to_path_buf(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|source| CheckError::HistoryUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut record: HistoryRecord = serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;

    if let Some(bad) = record.samples.keys().find(|k| k.parse::<f64>().is_err()) {
        return Err(corrupt(format!("timestamp key {bad:?} is not a number")));
    }

    let before = record.len();
    record.prune(window_cutoff(now, window_minutes));
    debug!(
        "loaded {} samples from '{}', {} inside the {window_minutes} minute window",
        before,
        path.display(),
        record.len()
    );

    Ok(record)
}

/// Mode for a freshly written history: whatever the file it replaces had,
/// else 0644. Temp files are created 0600 and the rename would keep that.
fn history_permissions(path: &Path) -> Option<Permissions> {
    if let Ok(meta) = std::fs::metadata(path) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Write `record` to `path`, creating missing parent directories.
///
/// The JSON is written to a temporary file beside `path` and renamed over
/// it, so a reader never sees a half-written history.
pub fn persist(record: &HistoryRecord, path: &Path) -> Result<()> {
    let failure = |source: std::io::Error| CheckError::PersistFailure {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(failure)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(failure)?;
    serde_json::to_writer(&mut tmp, record).map_err(|e| failure(e.into()))?;
    tmp.flush().map_err(failure)?;
    if let Some(perms) = history_permissions(path) {
        tmp.as_file().set_permissions(perms).map_err(failure)?;
    }
    tmp.persist(path).map_err(|e| failure(e.error))?;

    info!("persisted {} samples to '{}'", record.len(), path.display());
    Ok(())
}
