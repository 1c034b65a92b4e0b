//! Shared foundation for the silica graphics HAL.
//!
//! Holds the pieces every backend needs: the diagnostic [`Report`] that
//! objects carry instead of throwing, the HAL [`Config`], and the tracing
//! bootstrap.

pub mod config;
pub mod logging;
pub mod report;

pub use config::{BackendKind, Config};
pub use report::Report;
