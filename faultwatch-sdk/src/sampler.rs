//! Signal sampling: raw converter counts in, scaled samples out.

use std::fmt::Debug;
use std::path::PathBuf;

use faultwatch_types::{ScaleError, VoltageSample, VoltageScale};
use thiserror::Error;

/// Errors raised while reading the analog input.
///
/// The monitoring loop treats every sampler error as fatal.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// The underlying device could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device returned something that is not a raw count.
    #[error("invalid raw reading {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// The raw count does not fit the configured scale.
    #[error(transparent)]
    Scale(#[from] ScaleError),

    /// Any other hardware failure.
    #[error("hardware fault: {0}")]
    Hardware(String),
}

/// Source of raw converter counts.
///
/// Implementations perform exactly one hardware read per call and never
/// retry internally.
pub trait HardwareSampler: Send + Debug {
    /// Read one raw count.
    fn read_raw(&mut self) -> Result<u16, SamplerError>;

    /// Returns a human-readable description of the input, used in logs.
    fn description(&self) -> &str;
}

impl<T: HardwareSampler + ?Sized> HardwareSampler for Box<T> {
    fn read_raw(&mut self) -> Result<u16, SamplerError> {
        (**self).read_raw()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

/// Pairs a hardware input with the scale that converts its counts to volts.
#[derive(Debug)]
pub struct SignalSampler<H> {
    hardware: H,
    scale: VoltageScale,
}

impl<H: HardwareSampler> SignalSampler<H> {
    pub fn new(hardware: H, scale: VoltageScale) -> Self {
        Self { hardware, scale }
    }

    pub fn scale(&self) -> &VoltageScale {
        &self.scale
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Take one sample.
    pub fn sample(&mut self) -> Result<VoltageSample, SamplerError> {
        let raw = self.hardware.read_raw()?;
        Ok(self.scale.sample(raw)?)
    }
}
