use cpuavg_core::{CheckError, CpuTicks, CpuUsage, Result, TickSnapshot, UtilizationSample};

/// Derive utilisation from two snapshots taken `elapsed_secs` apart.
///
/// Every CPU in `curr` must also be present in `prev`; a CPU that only exists
/// in `prev` (taken offline mid-sample) is skipped.
pub fn compute_utilization(
    prev: &TickSnapshot,
    curr: &TickSnapshot,
    elapsed_secs: f64,
) -> Result<UtilizationSample> {
    let mut sample = UtilizationSample::default();

    for (&cpu, now) in &curr.per_cpu {
        let before = prev
            .per_cpu
            .get(&cpu)
            .ok_or(CheckError::InconsistentSnapshot { cpu })?;
        let usage = cpu_usage(before, now);
        tracing::debug!(
            "{cpu}: busy={:.2}% iowait={:.2}% steal={:.2}%",
            usage.percent,
            usage.io_wait_percent,
            usage.steal_percent
        );
        sample.per_cpu.insert(cpu, usage);
    }

    sample.context_switches_per_second =
        rate(prev.context_switches, curr.context_switches, elapsed_secs);
    sample.processes_per_second = rate(prev.processes_created, curr.processes_created, elapsed_secs);
    tracing::debug!(
        "ctxt/s={:.1} forks/s={:.1}",
        sample.context_switches_per_second,
        sample.processes_per_second
    );

    Ok(sample)
}

/// Percentages for one CPU. A CPU that accrued no ticks at all (a parked
/// vCPU on an idle host) reads as 0% rather than dividing by zero.
fn cpu_usage(prev: &CpuTicks, curr: &CpuTicks) -> CpuUsage {
    let total_delta = curr.total.saturating_sub(prev.total);
    if total_delta == 0 {
        return CpuUsage::default();
    }

    let share = |before: u64, after: u64| after.saturating_sub(before) as f64 * 100.0 / total_delta as f64;

    CpuUsage {
        percent:         share(prev.busy, curr.busy),
        io_wait_percent: share(prev.io_wait, curr.io_wait),
        steal_percent:   share(prev.steal, curr.steal),
    }
}

fn rate(before: u64, after: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    after.saturating_sub(before) as f64 / elapsed_secs
}
