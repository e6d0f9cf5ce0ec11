//! Series transforms.
//!
//! Currently hosts the SATV high-pass filter, which strips trend and
//! seasonal structure from a series in DCT space.

mod satv;

pub use satv::satv_filter;
