use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::format::format_decimal;

/// Identifies one row of the counter source: the aggregate `cpu` line or a
/// single `cpuN` core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpuId {
    /// The synthetic "all cores combined" row.
    Aggregate,
    /// An individual core, e.g. `cpu3` → `Core(3)`.
    Core(u32),
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuId::Aggregate => f.write_str("cpu"),
            CpuId::Core(n)   => write!(f, "cpu{n}"),
        }
    }
}

impl FromStr for CpuId {
    type Err = ();

    /// Accepts `cpu` or `cpu` followed directly by a decimal index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suffix = s.strip_prefix("cpu").ok_or(())?;
        if suffix.is_empty() {
            return Ok(CpuId::Aggregate);
        }
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        suffix.parse().map(CpuId::Core).map_err(|_| ())
    }
}

/// Tick counters for one CPU row, cumulative since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    /// Every non-idle field summed (io-wait, steal and guest time included).
    pub busy:    u64,
    /// `busy + idle`. Always `>= busy`.
    pub total:   u64,
    pub io_wait: u64,
    pub steal:   u64,
}

/// A point-in-time reading of the counter source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSnapshot {
    pub per_cpu:           BTreeMap<CpuId, CpuTicks>,
    /// System-wide context switch counter (`ctxt`).
    pub context_switches:  u64,
    /// System-wide fork counter (`processes`).
    pub processes_created: u64,
}

impl TickSnapshot {
    /// CPU ids in the order they sort: aggregate first, then cores ascending.
    pub fn cpu_ids(&self) -> impl Iterator<Item = CpuId> + '_ {
        self.per_cpu.keys().copied()
    }
}

/// Percentages for one CPU row over a sampling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuUsage {
    /// Busy share of the interval (0.0 – 100.0).
    pub percent:         f64,
    pub io_wait_percent: f64,
    pub steal_percent:   f64,
}

/// Utilisation derived from two [`TickSnapshot`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilizationSample {
    pub per_cpu:                     BTreeMap<CpuId, CpuUsage>,
    pub context_switches_per_second: f64,
    pub processes_per_second:        f64,
}

impl UtilizationSample {
    /// Busy percentage of the aggregate `cpu` row, the figure that gets persisted.
    #[must_use]
    pub fn aggregate_percent(&self) -> Option<f64> {
        self.per_cpu.get(&CpuId::Aggregate).map(|u| u.percent)
    }
}

/// Monitoring-plugin service state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Process exit code under the usual plugin convention.
    pub const fn exit_code(self) -> u8 {
        match self {
            Status::Ok       => 0,
            Status::Warning  => 1,
            Status::Critical => 2,
            Status::Unknown  => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Status::Ok       => "OK",
            Status::Warning  => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown  => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of classifying the rolling average.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status:         Status,
    pub average:        f64,
    pub window_minutes: u32,
}

impl Verdict {
    /// The status line, e.g. `"OK - Average CPU Load in last 10 minutes: 42.0"`.
    pub fn message(&self) -> String {
        format!(
            "{} - Average CPU Load in last {} minutes: {}",
            self.status,
            self.window_minutes,
            format_decimal(self.average)
        )
    }
}
