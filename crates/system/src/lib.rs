pub mod check;
pub mod delta;
pub mod evaluate;
pub mod history;
pub mod proc_stat;

pub use check::{run, run_check, run_check_at, CheckReport};
pub use delta::compute_utilization;
pub use evaluate::{classify, evaluate};
pub use history::{HistoryRecord, load, persist};
pub use proc_stat::{parse_snapshot, ProcStatSource, TickSource};
