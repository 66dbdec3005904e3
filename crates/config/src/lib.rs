pub mod cli;
pub mod schema;

pub use cli::{parse_args, Args, Command};
pub use schema::{default_stat_path, CheckConfig, Thresholds, STAT_PATH_ENV};
