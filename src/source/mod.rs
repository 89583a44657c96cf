//! Hardware sources for the analog input.
//!
//! Two implementations of [`HardwareSampler`]: the Linux IIO sysfs node that
//! real deployments read, and a scripted scenario for bench runs.

mod iio;
mod scenario;

pub use iio::IioFileSampler;
pub use scenario::ScenarioSampler;

use anyhow::{Context, Result};
use faultwatch_sdk::HardwareSampler;

use crate::settings::{SamplerKind, Settings};

/// Open the sampler selected in `settings`.
///
/// Fails if an IIO node cannot be read at startup.
pub fn open(settings: &Settings) -> Result<Box<dyn HardwareSampler>> {
    let sampler: Box<dyn HardwareSampler> = match settings.sampler.kind {
        SamplerKind::Iio => Box::new(
            IioFileSampler::open(&settings.sampler.path)
                .with_context(|| format!("Failed to open ADC node {}", settings.sampler.path))?,
        ),
        SamplerKind::Scenario => Box::new(ScenarioSampler::new(
            settings.sampler.scenario.clone(),
            settings.scale,
            settings.thresholds,
        )),
    };
    Ok(sampler)
}
