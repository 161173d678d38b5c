//! System utilities and monitoring
//!
//! Prometheus counters for requests, fetches, handler invocations and
//! applied changes.

pub mod metrics;
