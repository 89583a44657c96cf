//! Agent wiring: settings in, a running monitor out.

use std::sync::Arc;

use anyhow::{Context, Result};
use faultwatch_adapters::{HttpTransport, TcpTransport, WsTransport};
use faultwatch_sdk::{Monitor, StatusSnapshot, Transport};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::connectivity::{probe_target, ConnectivityWatcher};
use crate::settings::{Settings, TransportKind};
use crate::source;

/// Build the transport selected in `settings`.
pub fn build_transport(settings: &Settings) -> Result<Arc<dyn Transport>> {
    let transport = &settings.transport;
    let built: Arc<dyn Transport> = match transport.kind {
        TransportKind::Http => Arc::new(
            HttpTransport::builder()
                .endpoint(transport.endpoint.clone())
                .api_key(transport.api_key.clone())
                .timeout(transport.timeout)
                .build()
                .context("Failed to build HTTP transport")?,
        ),
        TransportKind::Tcp => {
            Arc::new(TcpTransport::new(transport.endpoint.clone()).with_timeout(transport.timeout))
        }
        TransportKind::WebSocket => Arc::new(
            WsTransport::builder()
                .url(transport.endpoint.clone())
                .timeout(transport.timeout)
                .build()
                .context("Failed to build WebSocket transport")?,
        ),
    };
    Ok(built)
}

/// Build the voltage telemetry transport, if an endpoint is configured.
pub fn build_telemetry(settings: &Settings) -> Result<Option<Arc<dyn Transport>>> {
    let Some(endpoint) = settings.telemetry.endpoint() else {
        return Ok(None);
    };
    let transport = WsTransport::builder()
        .url(endpoint)
        .timeout(settings.transport.timeout)
        .build()
        .context("Failed to build telemetry transport")?;
    Ok(Some(Arc::new(transport)))
}

/// Run the agent until Ctrl-C, or for `ticks` iterations when given.
///
/// Returns the final status. Sampler failures end the run with an error.
pub async fn run(settings: Settings, ticks: Option<u64>) -> Result<StatusSnapshot> {
    info!(
        light_id = %settings.device.light_id,
        device_id = %settings.device.device_id,
        "Fault monitor starting"
    );
    if !settings.network.ssid.is_empty() {
        info!(ssid = %settings.network.ssid, "Configured network");
    }

    let hardware = source::open(&settings)?;
    let transport = build_transport(&settings)?;
    let telemetry = build_telemetry(&settings)?;

    let watcher = ConnectivityWatcher::new(
        probe_target(&settings.transport)?,
        settings.network.probe_interval,
        settings.network.probe_timeout,
    );
    let flag = watcher.flag();
    if !watcher.probe_once().await {
        warn!(addr = watcher.target(), "Endpoint not reachable yet, reports will be skipped until it is");
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_tx = Arc::new(stop_tx);
    let watcher_handle = watcher.spawn(stop_rx.clone());

    let mut builder = Monitor::builder()
        .boxed_hardware(hardware)
        .scale(settings.scale)
        .thresholds(settings.thresholds)
        .heartbeats(
            settings.schedule.normal_heartbeat,
            settings.schedule.fault_heartbeat,
        )
        .source_id(settings.device.light_id.clone())
        .transport(transport)
        .connectivity(Arc::new(flag))
        .period(settings.schedule.sample_period);
    if let Some(telemetry) = telemetry {
        builder = builder.telemetry(telemetry, settings.telemetry.interval);
    }
    let mut monitor = builder.build().context("Invalid monitor configuration")?;

    let result = match ticks {
        Some(n) => monitor.run_for(n).await,
        None => {
            let signal_tx = stop_tx.clone();
            let signal = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown requested");
                    let _ = signal_tx.send(true);
                }
            });
            let result = monitor.run(stop_rx).await;
            signal.abort();
            result
        }
    };

    let _ = stop_tx.send(true);
    let _ = watcher_handle.await;

    let status = monitor.status().snapshot();
    info!(
        ticks = status.ticks,
        sent = status.reports_sent,
        skipped = status.reports_skipped,
        failed = status.reports_failed,
        telemetry = status.telemetry_sent,
        "Fault monitor finished"
    );

    result.context("Sampling failed")?;
    Ok(status)
}
