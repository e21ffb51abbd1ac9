//! Audit lifecycle orchestration.
//!
//! This module owns the client-visible state machine for one audit and the
//! projection of a finished audit into render-ready values. CLI/presentation
//! layers call into this module to keep responsibilities separated.

pub mod controller;
pub mod projection;

pub use controller::{LifecycleController, LifecycleError};
pub use projection::{PlatformView, ReportProjection};
