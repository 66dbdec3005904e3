//! check-cpu-avg — rolling-average CPU utilisation check for Nagios-compatible
//! monitoring systems.
//!
//! Run with:  `check-cpu-avg -w 90 -c 95 -t 15`   (`RUST_LOG=debug` for per-CPU detail)

use cpuavg_config::Command;
use cpuavg_core::Status;
use cpuavg_system::ProcStatSource;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("{e}");
    }

    let (status, line) = match cpuavg_config::parse_args(std::env::args_os()) {
        // Exits WARNING, as the plugin always has.
        Ok(Command::Version) => (Status::Warning, env!("CARGO_PKG_VERSION").to_string()),
        Ok(Command::Help(text)) => (Status::Ok, text),
        Ok(Command::Run(config)) => {
            tracing::info!(
                "check-cpu-avg v{} reading '{}'",
                env!("CARGO_PKG_VERSION"),
                config.stat_path.display()
            );
            let source = ProcStatSource::new(&config.stat_path);
            cpuavg_system::run(&config, &source, std::thread::sleep)
        }
        Err(e) => (e.status(), e.status_line()),
    };

    println!("{line}");
    ExitCode::from(status.exit_code())
}

/// Structured logging on stderr; stdout carries only the status line.
/// `RUST_LOG` controls verbosity (default: warn).
fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}
