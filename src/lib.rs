//! # elspect
//!
//! Signal analysis for hourly weather and electricity-production series.
//!
//! Provides the pure computations behind an anomaly-inspection dashboard:
//! resampling onto a uniform grid, a DCT high-pass filter isolating
//! short-term anomaly values (SATV), robust SPC control bands, Local
//! Outlier Factor detection, STL seasonal-trend decomposition, and
//! spectrogram computation. Data loading and rendering are left entirely
//! to the caller; every entry point is a deterministic function over
//! immutable inputs.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod cache;
pub mod core;
pub mod detection;
pub mod error;
pub mod seasonality;
pub mod spectral;
pub mod transform;
pub mod utils;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::cache::{fingerprint, AnalysisCache};
    pub use crate::core::{resample, EdgeFill, TimeSeries};
    pub use crate::detection::{lof_detect, spc_bounds, ControlBounds, LofResult, SpcResult};
    pub use crate::error::{AnalysisError, Result};
    pub use crate::seasonality::{stl_decompose, DecompositionResult, STL};
    pub use crate::spectral::{spectrogram, SpectrogramResult};
    pub use crate::transform::satv_filter;
}
