//! santoku-bootstrap - 统一启动骨架
//!
//! Loads nothing by itself: callers pass a [`ToolkitConfig`](santoku_config::ToolkitConfig),
//! initialise logging with [`init_runtime`] and obtain handlers from a [`Toolkit`].

mod runtime;
mod toolkit;

pub use runtime::*;
pub use toolkit::*;
