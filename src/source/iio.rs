//! Linux IIO sysfs sampler.
//!
//! The kernel exposes each ADC channel as a text file holding the latest raw
//! count, e.g. `/sys/bus/iio/devices/iio:device0/in_voltage6_raw`. Every read
//! reopens the file, which triggers a fresh conversion.

use std::fs;
use std::path::{Path, PathBuf};

use faultwatch_sdk::{HardwareSampler, SamplerError};

/// Reads raw counts from an IIO sysfs node.
#[derive(Debug)]
pub struct IioFileSampler {
    path: PathBuf,
    description: String,
}

impl IioFileSampler {
    /// Open a sampler, failing if the node is not readable right now.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SamplerError> {
        let path = path.as_ref().to_path_buf();
        fs::File::open(&path).map_err(|source| SamplerError::Io {
            path: path.clone(),
            source,
        })?;

        let description = format!("iio: {}", path.display());
        Ok(Self { path, description })
    }

    /// Returns the node being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HardwareSampler for IioFileSampler {
    fn read_raw(&mut self) -> Result<u16, SamplerError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SamplerError::Io {
            path: self.path.clone(),
            source,
        })?;

        let value = content.trim();
        value.parse::<u16>().map_err(|e| SamplerError::Parse {
            value: value.to_string(),
            reason: e.to_string(),
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}
