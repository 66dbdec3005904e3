pub mod error;
pub mod format;
pub mod state;

pub use error::{CheckError, Result};
pub use format::format_decimal;
pub use state::{CpuId, CpuTicks, CpuUsage, Status, TickSnapshot, UtilizationSample, Verdict};
