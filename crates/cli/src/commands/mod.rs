//! CLI commands for institutional flow analysis.

pub mod analyze;
pub mod common;
pub mod data_status;
pub mod infer_trades;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use data_status::{run_data_status, DataStatusArgs};
pub use infer_trades::{run_infer_trades, InferTradesArgs};
