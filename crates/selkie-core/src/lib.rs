//! Selkie Core
//!
//! Core types, errors, and constants for the selkie active object runtime.
//!
//! # Overview
//!
//! Selkie turns a user-defined runnable type into an independently scheduled
//! entity owning a private thread of execution. This crate carries the
//! concerns shared by the whole workspace:
//!
//! - Error taxonomy ([`Error`], [`Result`])
//! - Explicit limits ([`constants`])
//! - Injected time sources for deterministic tests ([`Clock`])
//! - Tracing subscriber wiring ([`telemetry`])
//!
//! # TigerStyle
//!
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `DISPATCH_BURST_COUNT_MAX`)
//! - All time enters through an injected source

pub mod clock;
pub mod constants;
pub mod error;
pub mod telemetry;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use constants::*;
pub use error::{Error, Result};
pub use telemetry::{init_telemetry, TelemetryConfig};
