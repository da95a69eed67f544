pub mod codec;

pub use codec::{ExecType, ExecutionReport, ReportedTrade};
