//! Network reachability probing.
//!
//! The watcher periodically opens a TCP connection to the report endpoint and
//! publishes the result through a [`ConnectivityFlag`]. The monitor only ever
//! reads the flag.

use std::time::Duration;

use anyhow::{bail, Result};
use faultwatch_sdk::{Connectivity, ConnectivityFlag};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::settings::{TransportKind, TransportSettings};

/// URL schemes and their default ports.
const HTTP_SCHEMES: &[(&str, u16)] = &[("https://", 443), ("http://", 80)];
const WS_SCHEMES: &[(&str, u16)] = &[("wss://", 443), ("ws://", 80)];

/// Work out the `host:port` to probe for a transport endpoint.
///
/// URLs without an explicit port use 80, or 443 for `https` and `wss`.
pub fn probe_target(transport: &TransportSettings) -> Result<String> {
    let endpoint = transport.endpoint.trim();

    let (schemes, expected) = match transport.kind {
        TransportKind::Tcp => (&[][..], "host:port"),
        TransportKind::Http => (HTTP_SCHEMES, "an http(s) URL"),
        TransportKind::WebSocket => (WS_SCHEMES, "a ws(s) URL"),
    };

    let (authority, default_port) = if schemes.is_empty() {
        (endpoint, None)
    } else {
        let Some((rest, port)) = schemes
            .iter()
            .find_map(|(scheme, port)| endpoint.strip_prefix(*scheme).map(|rest| (rest, *port)))
        else {
            bail!("Endpoint '{}' is not {}", endpoint, expected);
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        // Drop any userinfo
        let authority = authority.rsplit('@').next().unwrap_or_default();
        (authority, Some(port))
    };

    if authority.is_empty() {
        bail!("Endpoint '{}' has no host", endpoint);
    }

    // Bracketed IPv6 literals carry colons of their own
    let has_port = match authority.rsplit_once(':') {
        Some((host, port)) => {
            (!host.starts_with('[') || host.ends_with(']')) && port.parse::<u16>().is_ok()
        }
        None => false,
    };

    match (has_port, default_port) {
        (true, _) => Ok(authority.to_string()),
        (false, Some(port)) => Ok(format!("{}:{}", authority, port)),
        (false, None) => bail!("TCP endpoint '{}' must be host:port", endpoint),
    }
}

/// Probes a `host:port` on an interval and keeps a [`ConnectivityFlag`] current.
#[derive(Debug, Clone)]
pub struct ConnectivityWatcher {
    target: String,
    interval: Duration,
    timeout: Duration,
    flag: ConnectivityFlag,
}

impl ConnectivityWatcher {
    pub fn new(target: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            interval,
            timeout,
            flag: ConnectivityFlag::new(false),
        }
    }

    /// The flag this watcher writes.
    pub fn flag(&self) -> ConnectivityFlag {
        self.flag.clone()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Probe once and update the flag, logging transitions.
    pub async fn probe_once(&self) -> bool {
        let connected = matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await,
            Ok(Ok(_))
        );

        let was_connected = self.flag.set(connected);
        match (was_connected, connected) {
            (false, true) => info!(addr = %self.target, "Network connected"),
            (true, false) => warn!(addr = %self.target, "Lost connection, retrying"),
            _ => debug!(addr = %self.target, connected, "Connectivity probe"),
        }
        connected
    }

    /// Probe every interval until `stop` turns true or its sender goes away.
    pub fn spawn(self, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.probe_once().await;
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!(addr = %self.target, "Connectivity watcher stopped");
        })
    }
}

impl Connectivity for ConnectivityWatcher {
    fn is_connected(&self) -> bool {
        self.flag.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn transport(kind: TransportKind, endpoint: &str) -> TransportSettings {
        TransportSettings {
            kind,
            endpoint: endpoint.to_string(),
            ..TransportSettings::default()
        }
    }

    #[test]
    fn test_probe_target_http() {
        let t = transport(TransportKind::Http, "http://10.230.25.216:3000/api/fault/esp32");
        assert_eq!(probe_target(&t).unwrap(), "10.230.25.216:3000");

        let t = transport(TransportKind::Http, "http://example.com/api");
        assert_eq!(probe_target(&t).unwrap(), "example.com:80");

        let t = transport(TransportKind::Http, "https://user:pw@example.com?x=1");
        assert_eq!(probe_target(&t).unwrap(), "example.com:443");
    }

    #[test]
    fn test_probe_target_websocket() {
        let t = transport(TransportKind::WebSocket, "ws://10.230.25.216:8080");
        assert_eq!(probe_target(&t).unwrap(), "10.230.25.216:8080");

        let t = transport(TransportKind::WebSocket, "wss://collector.local/stream");
        assert_eq!(probe_target(&t).unwrap(), "collector.local:443");

        let t = transport(TransportKind::WebSocket, "http://collector.local");
        assert!(probe_target(&t).is_err());
    }

    #[test]
    fn test_probe_target_ipv6() {
        let t = transport(TransportKind::Http, "http://[::1]:8080/x");
        assert_eq!(probe_target(&t).unwrap(), "[::1]:8080");

        let t = transport(TransportKind::Http, "http://[::1]/x");
        assert_eq!(probe_target(&t).unwrap(), "[::1]:80");
    }

    #[test]
    fn test_probe_target_tcp() {
        let t = transport(TransportKind::Tcp, "collector.local:9000");
        assert_eq!(probe_target(&t).unwrap(), "collector.local:9000");

        let t = transport(TransportKind::Tcp, "collector.local");
        assert!(probe_target(&t).is_err());
    }

    #[test]
    fn test_probe_target_rejects_bad_urls() {
        assert!(probe_target(&transport(TransportKind::Http, "ftp://x")).is_err());
        assert!(probe_target(&transport(TransportKind::Http, "http:///path")).is_err());
    }

    #[tokio::test]
    async fn test_probe_tracks_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let watcher = ConnectivityWatcher::new(&addr, Duration::from_secs(1), Duration::from_secs(1));
        let flag = watcher.flag();

        assert!(!flag.is_connected());
        assert!(watcher.probe_once().await);
        assert!(flag.is_connected());

        drop(listener);
        assert!(!watcher.probe_once().await);
        assert!(!flag.is_connected());
    }

    #[tokio::test]
    async fn test_spawned_watcher_stops() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let watcher =
            ConnectivityWatcher::new(addr, Duration::from_millis(20), Duration::from_secs(1));
        let flag = watcher.flag();
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = watcher.spawn(stop_rx);
        for _ in 0..50 {
            if flag.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(flag.is_connected());

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
