//! HTTP front-end of mediaconv: pages, workflow API and metrics.

pub mod api;
pub mod metrics;
pub mod state;
