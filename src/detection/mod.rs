//! Anomaly detection for residual and feature series.
//!
//! Two independent detectors:
//! - Robust SPC control bands over a high-pass residual (univariate).
//! - Local Outlier Factor over a low-dimensional feature series.

mod lof;
mod spc;

pub use lof::{lof_detect, lof_detect_series, LofResult};
pub use spc::{spc_bounds, ControlBounds, SpcResult};
