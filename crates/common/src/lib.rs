//! santoku-common - 通用类型和工具库

pub mod aws;
pub mod batch;
pub mod table;

pub use aws::load_sdk_config;
pub use batch::{BatchFailure, BatchOutcome};
pub use table::Table;
