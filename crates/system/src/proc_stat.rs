//! Reader for the kernel's per-CPU tick counters.
//!
//! Format of `/proc/stat` (only the lines used here):
//!   cpu  user nice system idle iowait irq softirq steal guest guest_nice
//!   cpu0 user nice system idle iowait irq softirq steal guest guest_nice
//!   ctxt 1990473
//!   processes 2915
//!
//! Older kernels report fewer tick fields; missing trailing fields count as 0.

use cpuavg_core::{CheckError, CpuId, CpuTicks, Result, TickSnapshot};
use std::path::PathBuf;

/// Number of tick fields on a `cpu` line in current kernels.
const TICK_FIELDS: usize = 10;

/// Anything that can produce a fresh [`TickSnapshot`].
pub trait TickSource {
    fn read(&self) -> Result<TickSnapshot>;
}

/// Reads tick counters from a `/proc/stat`-formatted file.
#[derive(Debug, Clone)]
pub struct ProcStatSource {
    path: PathBuf,
}

impl ProcStatSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TickSource for ProcStatSource {
    fn read(&self) -> Result<TickSnapshot> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| {
            CheckError::SourceUnavailable {
                path: self.path.clone(),
                source,
            }
        })?;
        parse_snapshot(&raw)
    }
}

/// Parse the full text of the counter source.
pub fn parse_snapshot(content: &str) -> Result<TickSnapshot> {
    let mut snapshot = TickSnapshot::default();

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(key) = fields.next() else {
            continue;
        };

        match key {
            "ctxt" => snapshot.context_switches = parse_counter(fields.next(), line)?,
            "processes" => snapshot.processes_created = parse_counter(fields.next(), line)?,
            _ if key.starts_with("cpu") => {
                // `cpu` followed by anything but digits is not a tick row.
                let Ok(id) = key.parse::<CpuId>() else {
                    continue;
                };
                snapshot.per_cpu.insert(id, parse_ticks(fields, line)?);
            }
            _ => {}
        }
    }

    Ok(snapshot)
}

fn parse_ticks<'a>(fields: impl Iterator<Item = &'a str>, line: &str) -> Result<CpuTicks> {
    let mut ticks = [0u64; TICK_FIELDS];
    let mut seen = 0;
    for (slot, field) in ticks.iter_mut().zip(fields) {
        *slot = parse_counter(Some(field), line)?;
        seen += 1;
    }
    if seen == 0 {
        return Err(malformed(line));
    }

    let [user, nice, system, idle, io_wait, irq, softirq, steal, guest, guest_nice] = ticks;
    let busy = [user, nice, system, io_wait, irq, softirq, steal, guest, guest_nice]
        .into_iter()
        .try_fold(0u64, u64::checked_add)
        .ok_or_else(|| malformed(line))?;
    let total = busy.checked_add(idle).ok_or_else(|| malformed(line))?;

    Ok(CpuTicks {
        busy,
        total,
        io_wait,
        steal,
    })
}

fn parse_counter(field: Option<&str>, line: &str) -> Result<u64> {
    field
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| malformed(line))
}

fn malformed(line: &str) -> CheckError {
    CheckError::MalformedSource { line: line.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cpu  100 0 100 800 0 0 0 0 0 0
cpu0 60 0 40 400 5 1 2 3 0 0
cpu1 40 0 60 400 0 0 0 0 0 0
intr 12345 0 0 0
ctxt 1990473
btime 1700000000
processes 2915
procs_running 2
softirq 1 2 3
";

    #[test]
    fn parses_aggregate_and_per_core_rows() {
        let snap = parse_snapshot(SAMPLE).unwrap();
        assert_eq!(
            snap.cpu_ids().collect::<Vec<_>>(),
            vec![CpuId::Aggregate, CpuId::Core(0), CpuId::Core(1)]
        );
        assert_eq!(
            snap.per_cpu[&CpuId::Aggregate],
            CpuTicks { busy: 200, total: 1000, io_wait: 0, steal: 0 }
        );
        // user+nice+system+iowait+irq+softirq+steal = 60+40+5+1+2+3
        assert_eq!(
            snap.per_cpu[&CpuId::Core(0)],
            CpuTicks { busy: 111, total: 511, io_wait: 5, steal: 3 }
        );
    }

    #[test]
    fn parses_system_counters() {
        let snap = parse_snapshot(SAMPLE).unwrap();
        assert_eq!(snap.context_switches, 1_990_473);
        assert_eq!(snap.processes_created, 2915);
    }

    #[test]
    fn short_rows_pad_missing_fields_with_zero() {
        // Pre-2.6.11 layout: user nice system idle iowait irq softirq
        let snap = parse_snapshot("cpu  10 0 10 80 4 1 1\n").unwrap();
        assert_eq!(
            snap.per_cpu[&CpuId::Aggregate],
            CpuTicks { busy: 26, total: 106, io_wait: 4, steal: 0 }
        );
    }

    #[test]
    fn guest_time_counts_as_busy() {
        let snap = parse_snapshot("cpu  1 1 1 10 1 1 1 1 1 1\n").unwrap();
        let ticks = snap.per_cpu[&CpuId::Aggregate];
        assert_eq!(ticks.busy, 9);
        assert_eq!(ticks.total, 19);
    }

    #[test]
    fn extra_trailing_fields_are_ignored() {
        let snap = parse_snapshot("cpu  1 0 0 9 0 0 0 0 0 0 77 88\n").unwrap();
        assert_eq!(snap.per_cpu[&CpuId::Aggregate].total, 10);
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let snap = parse_snapshot("cpufreq 1 2 3\nintr 5 6\n\nctxtx 9\n").unwrap();
        assert!(snap.per_cpu.is_empty());
        assert_eq!(snap.context_switches, 0);
    }

    #[test]
    fn non_numeric_tick_is_malformed() {
        let err = parse_snapshot("cpu  10 x 10 80\n").unwrap_err();
        assert!(matches!(err, CheckError::MalformedSource { .. }));
    }

    #[test]
    fn overflowing_tick_sum_is_malformed() {
        let err = parse_snapshot("cpu  18446744073709551615 1 0 0\n").unwrap_err();
        assert!(matches!(err, CheckError::MalformedSource { .. }));
        // busy fits, busy + idle does not
        let err = parse_snapshot("cpu  18446744073709551615 0 0 1\n").unwrap_err();
        assert!(matches!(err, CheckError::MalformedSource { .. }));
    }

    #[test]
    fn cpu_row_without_ticks_is_malformed() {
        assert!(matches!(
            parse_snapshot("cpu\n").unwrap_err(),
            CheckError::MalformedSource { .. }
        ));
    }

    #[test]
    fn missing_ctxt_value_is_malformed() {
        assert!(matches!(
            parse_snapshot("ctxt\n").unwrap_err(),
            CheckError::MalformedSource { .. }
        ));
    }

    #[test]
    fn unreadable_source_is_unavailable() {
        let source = ProcStatSource::new("/nonexistent/proc/stat");
        assert!(matches!(
            source.read().unwrap_err(),
            CheckError::SourceUnavailable { .. }
        ));
    }
}
