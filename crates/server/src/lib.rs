//! HTTP surface of the focus session intake service.

pub mod api;
pub mod metrics;
pub mod state;
