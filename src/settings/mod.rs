//! Agent configuration.
//!
//! Settings are layered: serde defaults, then an optional TOML file, then
//! `FAULTWATCH_*` environment variables with `__` separating nested keys
//! (for example `FAULTWATCH_TRANSPORT__API_KEY`).

pub mod duration;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use faultwatch_types::{FaultState, Thresholds, VoltageScale};
use serde::{Deserialize, Serialize, Serializer};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FAULTWATCH";

/// Default sysfs node for ADC1 channel 6.
pub const DEFAULT_IIO_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_voltage6_raw";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceSettings,
    pub network: NetworkSettings,
    pub transport: TransportSettings,
    pub thresholds: Thresholds,
    pub scale: VoltageScale,
    pub schedule: ScheduleSettings,
    pub sampler: SamplerSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Identifier sent as `light-ID` in every report.
    pub light_id: String,
    /// Identifier of the monitoring unit, logged at startup.
    pub device_id: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            light_id: "CB-420 light#2".to_string(),
            device_id: "ESP32-001".to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Network name, informational only.
    pub ssid: String,
    #[serde(serialize_with = "redact")]
    pub password: String,
    #[serde(with = "duration")]
    pub probe_interval: Duration,
    #[serde(with = "duration")]
    pub probe_timeout: Duration,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            probe_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl std::fmt::Debug for NetworkSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSettings")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("probe_interval", &self.probe_interval)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
    Tcp,
    /// Text frames over `ws://` or `wss://`.
    WebSocket,
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportSettings {
    pub kind: TransportKind,
    /// URL for `http` and `websocket`, `host:port` for `tcp`.
    pub endpoint: String,
    #[serde(serialize_with = "redact")]
    pub api_key: String,
    #[serde(with = "duration")]
    pub timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: TransportKind::Http,
            endpoint: "http://localhost:3000/api/fault/esp32".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for TransportSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSettings")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleSettings {
    #[serde(with = "duration")]
    pub sample_period: Duration,
    #[serde(with = "duration")]
    pub normal_heartbeat: Duration,
    #[serde(with = "duration")]
    pub fault_heartbeat: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_secs(1),
            normal_heartbeat: Duration::from_secs(30),
            fault_heartbeat: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Linux IIO sysfs node.
    #[default]
    Iio,
    /// Scripted bench scenario, no hardware needed.
    Scenario,
}

/// One step of a bench scenario: hold `state` for `ticks` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScenarioPhase {
    pub state: FaultState,
    pub ticks: u32,
}

impl ScenarioPhase {
    pub const fn new(state: FaultState, ticks: u32) -> Self {
        Self { state, ticks }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub kind: SamplerKind,
    /// sysfs file holding the raw count, for `iio`.
    pub path: String,
    /// Phases replayed in a loop, for `scenario`.
    pub scenario: Vec<ScenarioPhase>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            kind: SamplerKind::Iio,
            path: DEFAULT_IIO_PATH.to_string(),
            scenario: default_scenario(),
        }
    }
}

/// Periodic `{"voltage": v}` stream to a WebSocket collector. Off unless
/// an endpoint is set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// `ws://` or `wss://` URL.
    pub endpoint: Option<String>,
    #[serde(with = "duration")]
    pub interval: Duration,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            interval: Duration::from_secs(5),
        }
    }
}

impl TelemetrySettings {
    /// The configured endpoint, treating a blank one as unset.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// The bench script: settle, walk through every fault, recover.
pub fn default_scenario() -> Vec<ScenarioPhase> {
    vec![
        ScenarioPhase::new(FaultState::Normal, 10),
        ScenarioPhase::new(FaultState::ShortCircuit, 5),
        ScenarioPhase::new(FaultState::OpenCircuit, 8),
        ScenarioPhase::new(FaultState::Overvoltage, 6),
        ScenarioPhase::new(FaultState::Undervoltage, 7),
        ScenarioPhase::new(FaultState::Fluctuation, 4),
        ScenarioPhase::new(FaultState::Normal, 15),
    ]
}

impl Settings {
    /// Load from an optional file plus the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.light_id.trim().is_empty() {
            bail!("device.light_id must not be empty");
        }
        if self.transport.endpoint.trim().is_empty() {
            bail!("transport.endpoint must not be empty");
        }

        self.thresholds.validate().context("Invalid [thresholds]")?;
        self.scale.validate().context("Invalid [scale]")?;

        for (name, value) in [
            ("schedule.sample_period", self.schedule.sample_period),
            ("schedule.normal_heartbeat", self.schedule.normal_heartbeat),
            ("schedule.fault_heartbeat", self.schedule.fault_heartbeat),
            ("transport.timeout", self.transport.timeout),
            ("network.probe_interval", self.network.probe_interval),
            ("network.probe_timeout", self.network.probe_timeout),
            ("telemetry.interval", self.telemetry.interval),
        ] {
            if value.is_zero() {
                bail!("{} must be greater than zero", name);
            }
        }

        if let Some(endpoint) = self.telemetry.endpoint() {
            if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
                bail!("telemetry.endpoint '{}' is not a ws(s) URL", endpoint);
            }
        }

        if self.sampler.kind == SamplerKind::Scenario {
            if self.sampler.scenario.is_empty() {
                bail!("sampler.scenario must have at least one phase");
            }
            if let Some(phase) = self.sampler.scenario.iter().find(|p| p.ticks == 0) {
                bail!("sampler.scenario phase {} has zero ticks", phase.state);
            }
        }

        Ok(())
    }
}

fn redact<S: Serializer>(value: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(vars))
    }

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.device.light_id, "CB-420 light#2");
        assert_eq!(settings.schedule.normal_heartbeat, Duration::from_secs(30));
        assert_eq!(settings.schedule.fault_heartbeat, Duration::from_secs(5));
        assert_eq!(settings.sampler.path, DEFAULT_IIO_PATH);
        assert_eq!(settings.thresholds, Thresholds::default());
    }

    #[test]
    fn test_file_overrides() {
        let file = toml_file(
            r#"
            [device]
            light_id = "pole-17"

            [transport]
            kind = "tcp"
            endpoint = "10.0.0.5:9000"
            timeout = "2s"

            [thresholds]
            fluctuation_delta = 0.25

            [schedule]
            sample_period = "250ms"

            [sampler]
            kind = "scenario"
            scenario = [
                { state = "short_circuit", ticks = 3 },
                { state = "voltage_fluctuation", ticks = 2 },
            ]
            "#,
        );

        let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();

        assert_eq!(settings.device.light_id, "pole-17");
        assert_eq!(settings.device.device_id, "ESP32-001");
        assert_eq!(settings.transport.kind, TransportKind::Tcp);
        assert_eq!(settings.transport.timeout, Duration::from_secs(2));
        assert_eq!(settings.thresholds.fluctuation_delta, 0.25);
        assert_eq!(settings.thresholds.short_circuit, 0.3);
        assert_eq!(settings.schedule.sample_period, Duration::from_millis(250));
        assert_eq!(
            settings.sampler.scenario,
            vec![
                ScenarioPhase::new(FaultState::ShortCircuit, 3),
                ScenarioPhase::new(FaultState::Fluctuation, 2),
            ]
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file("[transport]\napi_key = \"from-file\"\n");

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("FAULTWATCH_TRANSPORT__API_KEY", "from-env"),
                ("FAULTWATCH_SCHEDULE__FAULT_HEARTBEAT", "2s"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.transport.api_key, "from-env");
        assert_eq!(settings.schedule.fault_heartbeat, Duration::from_secs(2));
    }

    #[test]
    fn test_websocket_transport_and_telemetry() {
        let file = toml_file(
            r#"
            [transport]
            kind = "websocket"
            endpoint = "ws://10.0.0.5:8080"
            "#,
        );

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[
                ("FAULTWATCH_TELEMETRY__ENDPOINT", "ws://10.0.0.5:8080"),
                ("FAULTWATCH_TELEMETRY__INTERVAL", "10s"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.transport.kind, TransportKind::WebSocket);
        assert_eq!(settings.telemetry.endpoint(), Some("ws://10.0.0.5:8080"));
        assert_eq!(settings.telemetry.interval, Duration::from_secs(10));
    }

    #[test]
    fn test_telemetry_endpoint_checks() {
        let mut settings = Settings::default();
        assert_eq!(settings.telemetry.endpoint(), None);

        settings.telemetry.endpoint = Some("  ".to_string());
        assert_eq!(settings.telemetry.endpoint(), None);
        assert!(settings.validate().is_ok());

        settings.telemetry.endpoint = Some("http://10.0.0.5:8080".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let file = toml_file("[thresholds]\nnormal_min = 3.5\n");
        let err = Settings::load_with_env(Some(file.path()), env(&[])).unwrap_err();
        assert!(format!("{:#}", err).contains("thresholds"));
    }

    #[test]
    fn test_rejects_bad_duration() {
        let file = toml_file("[schedule]\nsample_period = \"often\"\n");
        assert!(Settings::load_with_env(Some(file.path()), env(&[])).is_err());
    }

    #[test]
    fn test_rejects_zero_tick_phase() {
        let mut settings = Settings::default();
        settings.sampler.kind = SamplerKind::Scenario;
        settings.sampler.scenario = vec![ScenarioPhase::new(FaultState::Normal, 0)];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let mut settings = Settings::default();
        settings.network.password = "wifi-pass".to_string();
        settings.transport.api_key = "api-secret".to_string();

        let debug = format!("{:?}", settings);
        let json = serde_json::to_string(&settings).unwrap();

        for rendered in [debug, json] {
            assert!(!rendered.contains("wifi-pass"));
            assert!(!rendered.contains("api-secret"));
        }
    }
}
