use crate::history::HistoryRecord;
use cpuavg_config::Thresholds;
use cpuavg_core::{CheckError, Result, Status, Verdict};

/// Classify `average` against the thresholds. Levels trigger only when the
/// average is strictly above them.
pub fn classify(average: f64, thresholds: &Thresholds) -> Status {
    if average > f64::from(thresholds.crit_percent()) {
        Status::Critical
    } else if average > f64::from(thresholds.warn_percent()) {
        Status::Warning
    } else {
        Status::Ok
    }
}

/// Average every sample in `record` and turn it into a [`Verdict`].
pub fn evaluate(record: &HistoryRecord, thresholds: &Thresholds, window_minutes: u32) -> Result<Verdict> {
    let average = record.average().ok_or(CheckError::EmptyHistory)?;
    Ok(Verdict {
        status: classify(average, thresholds),
        average,
        window_minutes,
    })
}
