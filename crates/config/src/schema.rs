use cpuavg_core::{CheckError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WARN_PERCENT: u32 = 95;
pub const DEFAULT_CRIT_PERCENT: u32 = 98;
pub const DEFAULT_WINDOW_MINUTES: u32 = 10;
pub const DEFAULT_SAMPLE_PERIOD_SECS: u64 = 1;
pub const DEFAULT_HISTORY_PATH: &str = "/tmp/check_cpu_avg/results.json";
pub const DEFAULT_STAT_PATH: &str = "/proc/stat";

/// Environment variable that overrides the counter source path.
pub const STAT_PATH_ENV: &str = "CHECK_CPU_AVG_PROC_STAT";

/// Warning / critical levels in percent. `warn <= crit` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    warn_percent: u32,
    crit_percent: u32,
}

impl Thresholds {
    pub fn new(warn_percent: u32, crit_percent: u32) -> Result<Self> {
        if warn_percent > crit_percent {
            return Err(CheckError::Config(format!(
                "warning level ({warn_percent}) must not exceed critical level ({crit_percent})"
            )));
        }
        Ok(Self { warn_percent, crit_percent })
    }

    pub fn warn_percent(&self) -> u32 {
        self.warn_percent
    }

    pub fn crit_percent(&self) -> u32 {
        self.crit_percent
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn_percent: DEFAULT_WARN_PERCENT,
            crit_percent: DEFAULT_CRIT_PERCENT,
        }
    }
}

/// Everything one check invocation needs, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub thresholds:     Thresholds,
    /// Rolling window length; older samples are pruned.
    pub window_minutes: u32,
    /// JSON file holding the timestamp → percent history.
    pub history_path:   PathBuf,
    /// Sleep between the two counter snapshots.
    pub sample_period:  Duration,
    /// Counter source, normally `/proc/stat`.
    pub stat_path:      PathBuf,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            thresholds:     Thresholds::default(),
            window_minutes: DEFAULT_WINDOW_MINUTES,
            history_path:   PathBuf::from(DEFAULT_HISTORY_PATH),
            sample_period:  Duration::from_secs(DEFAULT_SAMPLE_PERIOD_SECS),
            stat_path:      default_stat_path(),
        }
    }
}

/// Return the counter source path, honouring `$CHECK_CPU_AVG_PROC_STAT`.
pub fn default_stat_path() -> PathBuf {
    std::env::var_os(STAT_PATH_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STAT_PATH))
}
