/// Synthetic detection streams used by demos and benchmarks
pub mod examples;

/// Crate prelude
pub mod prelude;

/// Tracker implementations
pub mod trackers;

/// Geometric primitives shared by the detector input contract and the trackers
pub mod utils;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Errors {
    #[error("Frame geometry must have positive finite dimensions, got {0}x{1}.")]
    InvalidFrameGeometry(f32, f32),
    #[error("Edge fraction must lay within (0.0, 0.5), got {0}.")]
    InvalidEdgeFraction(f32),
    #[error("Spawn size fraction must lay within (0.0, 1.0), got {0}.")]
    InvalidSpawnFraction(f32),
    #[error("Pixels-per-foot calibration must be a positive number, got {0}.")]
    InvalidCalibration(f32),
    #[error("FPS must be a positive number when frame-count timing is used, got {0}.")]
    InvalidFps(f32),
}

/// Allows comparing float-carrying values for near-equality
pub trait EstimateClose {
    fn almost_same(&self, other: &Self, eps: f32) -> bool;
}

pub(crate) const EPS: f32 = 0.00001;
