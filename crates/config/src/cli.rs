use crate::schema::{
    default_stat_path, CheckConfig, Thresholds, DEFAULT_CRIT_PERCENT, DEFAULT_HISTORY_PATH,
    DEFAULT_SAMPLE_PERIOD_SECS, DEFAULT_WARN_PERCENT, DEFAULT_WINDOW_MINUTES,
};
use clap::error::ErrorKind;
use clap::Parser;
use cpuavg_core::{CheckError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const NOTES: &str = "\
Notes:
  Warning/critical alerts are generated when the threshold is exceeded,
  e.g. -w 95 alerts on an average above 95%.
  All values are in percent; a trailing % is accepted but not required.";

/// Raw command line. Numeric flags are kept as strings so each one gets its
/// own typed parse step with a readable error.
#[derive(Debug, Parser)]
#[command(
    name = "check-cpu-avg",
    about = "Rolling-average CPU utilisation check for monitoring plugins",
    disable_version_flag = true,
    after_help = NOTES
)]
pub struct Args {
    /// Warn if the average CPU use exceeds NUM percent [default: 95]
    #[arg(short, long, value_name = "NUM")]
    pub warn: Option<String>,

    /// Critical if the average CPU use exceeds NUM percent [default: 98]
    #[arg(short, long, value_name = "NUM")]
    pub crit: Option<String>,

    /// Average over the previous NUM minutes [default: 10]
    #[arg(short, long, value_name = "NUM")]
    pub time: Option<String>,

    /// Previous measurements file
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_HISTORY_PATH)]
    pub file: PathBuf,

    /// Seconds between the two counter snapshots [default: 1]
    #[arg(short, long, value_name = "SECS")]
    pub sample_period: Option<String>,

    /// Print the version
    #[arg(short = 'V', long, short_alias = 'v')]
    pub version: bool,
}

/// What the binary should do after parsing its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CheckConfig),
    Version,
    /// Rendered `--help` text.
    Help(String),
}

impl Args {
    /// Validate the raw flags into a [`Command`].
    pub fn into_command(self) -> Result<Command> {
        if self.version {
            return Ok(Command::Version);
        }

        let warn = parse_number("warn", self.warn.as_deref(), DEFAULT_WARN_PERCENT)?;
        let crit = parse_number("crit", self.crit.as_deref(), DEFAULT_CRIT_PERCENT)?;
        let window_minutes = parse_number("time window", self.time.as_deref(), DEFAULT_WINDOW_MINUTES)?;
        let period = parse_number(
            "sample period",
            self.sample_period.as_deref(),
            DEFAULT_SAMPLE_PERIOD_SECS,
        )?;

        Ok(Command::Run(CheckConfig {
            thresholds: Thresholds::new(warn, crit)?,
            window_minutes,
            history_path: self.file,
            sample_period: Duration::from_secs(period),
            stat_path: default_stat_path(),
        }))
    }
}

/// Parse an argument list (program name first) into a [`Command`].
pub fn parse_args<I, T>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => args.into_command(),
        Err(e) => {
            let rendered = e.render().to_string().trim_end().to_string();
            if e.kind() == ErrorKind::DisplayHelp {
                Ok(Command::Help(rendered))
            } else {
                Err(CheckError::Config(rendered))
            }
        }
    }
}

fn parse_number<T: FromStr>(name: &str, raw: Option<&str>, default: T) -> Result<T> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw.trim().trim_end_matches('%');
    value.parse().map_err(|_| {
        tracing::debug!("rejecting {name} value {raw:?}");
        CheckError::Config(format!("{name} value must be a non-negative integer, got {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(args: &[&str]) -> CheckConfig {
        let argv = std::iter::once("check-cpu-avg").chain(args.iter().copied());
        match parse_args(argv).unwrap() {
            Command::Run(config) => config,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    fn parse_err(args: &[&str]) -> CheckError {
        let argv = std::iter::once("check-cpu-avg").chain(args.iter().copied());
        parse_args(argv).unwrap_err()
    }

    #[test]
    fn no_flags_gives_defaults() {
        let config = run_config(&[]);
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.window_minutes, 10);
        assert_eq!(config.history_path, PathBuf::from(DEFAULT_HISTORY_PATH));
        assert_eq!(config.sample_period, Duration::from_secs(1));
    }

    #[test]
    fn short_and_long_flags() {
        let config = run_config(&["-w", "80", "--crit", "90", "-t", "5", "--file", "/var/tmp/h.json"]);
        assert_eq!(config.thresholds.warn_percent(), 80);
        assert_eq!(config.thresholds.crit_percent(), 90);
        assert_eq!(config.window_minutes, 5);
        assert_eq!(config.history_path, PathBuf::from("/var/tmp/h.json"));
    }

    #[test]
    fn trailing_percent_is_stripped() {
        let config = run_config(&["--warn=70%", "-c", "85%"]);
        assert_eq!(config.thresholds.warn_percent(), 70);
        assert_eq!(config.thresholds.crit_percent(), 85);
    }

    #[test]
    fn sample_period_zero_is_allowed() {
        let config = run_config(&["-s", "0"]);
        assert_eq!(config.sample_period, Duration::ZERO);
    }

    #[test]
    fn warn_above_crit_is_rejected() {
        let err = parse_err(&["-w", "50", "-c", "40"]);
        assert!(matches!(err, CheckError::Config(ref m) if m.contains("must not exceed")));
    }

    #[test]
    fn warn_above_default_crit_is_rejected() {
        assert!(matches!(parse_err(&["-w", "99"]), CheckError::Config(_)));
    }

    #[test]
    fn any_malformed_number_aborts() {
        for args in [["-w", "high"], ["-c", "x"], ["-t", "ten"], ["-s", "1.5"]] {
            assert!(matches!(parse_err(&args), CheckError::Config(_)), "{args:?}");
        }
    }

    #[test]
    fn unknown_flag_is_a_config_error() {
        assert!(matches!(parse_err(&["--bogus"]), CheckError::Config(_)));
    }

    #[test]
    fn version_wins_over_other_flags() {
        for flag in ["-V", "-v", "--version"] {
            let cmd = parse_args(["check-cpu-avg", "-w", "nope", flag]).unwrap();
            assert_eq!(cmd, Command::Version);
        }
    }

    #[test]
    fn help_is_rendered() {
        match parse_args(["check-cpu-avg", "--help"]).unwrap() {
            Command::Help(text) => assert!(text.contains("--warn")),
            other => panic!("expected Help, got {other:?}"),
        }
    }
}
