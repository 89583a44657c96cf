//! Scripted bench sampler.
//!
//! Replays a list of phases in a loop, emitting a raw count that the
//! classifier will place in each phase's band. Useful for exercising the
//! full reporting path without hardware.

use faultwatch_sdk::{FaultState, HardwareSampler, SamplerError, Thresholds, VoltageScale};

use crate::settings::ScenarioPhase;

#[derive(Debug)]
pub struct ScenarioSampler {
    phases: Vec<ScenarioPhase>,
    scale: VoltageScale,
    thresholds: Thresholds,
    phase: usize,
    tick_in_phase: u32,
    high: bool,
    description: String,
}

impl ScenarioSampler {
    pub fn new(phases: Vec<ScenarioPhase>, scale: VoltageScale, thresholds: Thresholds) -> Self {
        let total: u64 = phases.iter().map(|p| u64::from(p.ticks)).sum();
        Self {
            description: format!("scenario: {} phases, {} ticks", phases.len(), total),
            phases,
            scale,
            thresholds,
            phase: 0,
            tick_in_phase: 0,
            high: false,
        }
    }

    /// Voltage emitted while holding `state`.
    ///
    /// Fluctuation alternates between two points inside the normal band,
    /// 80% of the band width apart.
    fn voltage_for(&mut self, state: FaultState) -> f64 {
        let t = &self.thresholds;
        match state {
            FaultState::Normal => (t.normal_min + t.normal_max) / 2.0,
            FaultState::ShortCircuit => t.short_circuit / 2.0,
            FaultState::OpenCircuit => self.scale.v_ref,
            FaultState::Overvoltage => (t.overvoltage + t.open_circuit) / 2.0,
            FaultState::Undervoltage => (t.short_circuit + t.normal_min) / 2.0,
            FaultState::Fluctuation => {
                let margin = (t.normal_max - t.normal_min) * 0.1;
                self.high = !self.high;
                if self.high {
                    t.normal_max - margin
                } else {
                    t.normal_min + margin
                }
            }
        }
    }

    fn advance(&mut self) {
        self.tick_in_phase += 1;
        if self.tick_in_phase >= self.phases[self.phase].ticks {
            self.tick_in_phase = 0;
            self.phase = (self.phase + 1) % self.phases.len();
        }
    }
}

impl HardwareSampler for ScenarioSampler {
    fn read_raw(&mut self) -> Result<u16, SamplerError> {
        if self.phases.iter().all(|p| p.ticks == 0) {
            return Err(SamplerError::Hardware("scenario has no ticks".to_string()));
        }

        while self.phases[self.phase].ticks == 0 {
            self.phase = (self.phase + 1) % self.phases.len();
        }

        let state = self.phases[self.phase].state;
        let voltage = self.voltage_for(state);
        self.advance();

        Ok(self.scale.raw_for(voltage))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_scenario;
    use faultwatch_sdk::{classify, SignalSampler};

    fn sampler(phases: Vec<ScenarioPhase>) -> SignalSampler<ScenarioSampler> {
        SignalSampler::new(
            ScenarioSampler::new(phases, VoltageScale::default(), Thresholds::default()),
            VoltageScale::default(),
        )
    }

    #[test]
    fn test_each_phase_classifies_as_its_state() {
        let thresholds = Thresholds::default();

        for state in FaultState::ALL {
            let mut sampler = sampler(vec![ScenarioPhase::new(state, 4)]);
            let mut previous = None;
            let mut seen = Vec::new();
            for _ in 0..4 {
                let v = sampler.sample().unwrap().voltage;
                seen.push(classify(v, previous, &thresholds));
                previous = Some(v);
            }
            // The first fluctuation sample has nothing to compare against
            let steady = if state == FaultState::Fluctuation {
                &seen[1..]
            } else {
                &seen[..]
            };
            assert!(steady.iter().all(|s| *s == state), "{state}: {seen:?}");
        }
    }

    #[test]
    fn test_phases_loop() {
        let mut sampler = ScenarioSampler::new(
            vec![
                ScenarioPhase::new(FaultState::ShortCircuit, 2),
                ScenarioPhase::new(FaultState::OpenCircuit, 1),
            ],
            VoltageScale::default(),
            Thresholds::default(),
        );

        let raw: Vec<u16> = (0..6).map(|_| sampler.read_raw().unwrap()).collect();
        assert_eq!(raw, vec![186, 186, 4095, 186, 186, 4095]);
    }

    #[test]
    fn test_zero_tick_phases_are_skipped() {
        let mut sampler = ScenarioSampler::new(
            vec![
                ScenarioPhase::new(FaultState::OpenCircuit, 0),
                ScenarioPhase::new(FaultState::ShortCircuit, 1),
            ],
            VoltageScale::default(),
            Thresholds::default(),
        );
        assert_eq!(sampler.read_raw().unwrap(), 186);
        assert_eq!(sampler.read_raw().unwrap(), 186);
    }

    #[test]
    fn test_long_phases_do_not_overflow() {
        let mut sampler = ScenarioSampler::new(
            vec![
                ScenarioPhase::new(FaultState::Normal, 3_000_000_000),
                ScenarioPhase::new(FaultState::OpenCircuit, u32::MAX),
            ],
            VoltageScale::default(),
            Thresholds::default(),
        );
        assert!(sampler.description().ends_with("7294967295 ticks"));
        assert!(sampler.read_raw().is_ok());
    }

    #[test]
    fn test_empty_scenario_is_an_error() {
        let mut sampler =
            ScenarioSampler::new(Vec::new(), VoltageScale::default(), Thresholds::default());
        assert!(matches!(sampler.read_raw(), Err(SamplerError::Hardware(_))));
    }

    #[test]
    fn test_default_scenario_walks_every_state() {
        let thresholds = Thresholds::default();
        let mut sampler = sampler(default_scenario());
        let total: u32 = default_scenario().iter().map(|p| p.ticks).sum();

        let mut previous = None;
        let mut seen = Vec::new();
        for _ in 0..total {
            let v = sampler.sample().unwrap().voltage;
            let state = classify(v, previous, &thresholds);
            if seen.last() != Some(&state) {
                seen.push(state);
            }
            previous = Some(v);
        }

        for state in FaultState::ALL {
            assert!(seen.contains(&state), "missing {state}");
        }
    }
}
