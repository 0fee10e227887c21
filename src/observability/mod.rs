//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, admin API and lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - One log line per failed file, with path and cause as fields
//! - Metrics are cheap (atomic increments) and off unless enabled

pub mod logging;
pub mod metrics;
