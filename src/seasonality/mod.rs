//! Seasonal-trend decomposition.
//!
//! STL (Seasonal-Trend decomposition using LOESS) splits a periodic
//! series into trend, seasonal, and residual components.

mod stl;

pub use stl::{stl_decompose, DecompositionResult, STL};
