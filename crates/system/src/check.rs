use crate::delta::compute_utilization;
use crate::evaluate::evaluate;
use crate::history::{self, epoch_seconds, HistoryRecord};
use crate::proc_stat::TickSource;
use chrono::{DateTime, Utc};
use cpuavg_config::CheckConfig;
use cpuavg_core::{CheckError, Result, Status, UtilizationSample, Verdict};
use std::time::Duration;
use tracing::{debug, warn};

/// Everything one check run produced.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub verdict:  Verdict,
    pub sample:   UtilizationSample,
    /// Samples averaged, the fresh one included.
    pub retained: usize,
}

/// Run one check and reduce it to the plugin's status and status line.
pub fn run<S, D>(config: &CheckConfig, source: &S, delay: D) -> (Status, String)
where
    S: TickSource + ?Sized,
    D: FnOnce(Duration),
{
    match run_check(config, source, delay) {
        Ok(report) => (report.verdict.status, report.verdict.message()),
        Err(e) => (e.status(), e.status_line()),
    }
}

pub fn run_check<S, D>(config: &CheckConfig, source: &S, delay: D) -> Result<CheckReport>
where
    S: TickSource + ?Sized,
    D: FnOnce(Duration),
{
    run_check_at(config, source, delay, Utc::now())
}

/// Snapshot, sleep `config.sample_period` via `delay`, snapshot again, then
/// fold the aggregate reading into the history and classify the average.
///
/// `now` is the wall-clock time the sample is recorded under.
pub fn run_check_at<S, D>(
    config: &CheckConfig,
    source: &S,
    delay: D,
    now: DateTime<Utc>,
) -> Result<CheckReport>
where
    S: TickSource + ?Sized,
    D: FnOnce(Duration),
{
    let first = source.read()?;
    delay(config.sample_period);
    let second = source.read()?;

    let sample = compute_utilization(&first, &second, config.sample_period.as_secs_f64())?;
    let current = sample.aggregate_percent().ok_or(CheckError::MissingAggregate)?;
    debug!("aggregate cpu over {:?}: {current:.2}%", config.sample_period);

    let mut record = match history::load(&config.history_path, now, config.window_minutes) {
        Ok(record) => record,
        Err(e @ CheckError::CorruptHistory { .. }) => {
            warn!("{e}; discarding it");
            HistoryRecord::new()
        }
        Err(e) => return Err(e),
    };

    record.append(epoch_seconds(now), current);
    history::persist(&record, &config.history_path)?;

    let verdict = evaluate(&record, &config.thresholds, config.window_minutes)?;
    Ok(CheckReport {
        verdict,
        sample,
        retained: record.len(),
    })
}
