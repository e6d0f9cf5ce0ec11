//! Short-time spectral analysis.

mod spectrogram;

pub use spectrogram::{spectrogram, SpectrogramResult, POWER_FLOOR};
