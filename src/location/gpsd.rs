// src/location/gpsd.rs
//! gpsd client: position reports from the gpsd JSON protocol

use super::{
    fix::{LocationFix, ProviderKind},
    permission::PermissionSource,
    provider::{check_permission, FixSink, LocationListener, LocationProvider, UpdateRequest},
};
use crate::error::{MapError, ProviderError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{
    io::Write,
    net::ToSocketAddrs,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpStream,
    runtime::Handle,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

const WATCH_COMMAND: &str = "?WATCH={\"enable\":true,\"json\":true}\n";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum GpsdMessage {
    #[serde(rename = "TPV")]
    Tpv(Tpv),
    #[serde(rename = "VERSION")]
    Version { release: Option<String> },
    #[serde(rename = "DEVICES")]
    Devices {
        #[serde(default)]
        devices: Vec<serde_json::Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Tpv {
    #[serde(default)]
    mode: u8,
    time: Option<DateTime<Utc>>,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Estimated horizontal position error, meters
    eph: Option<f64>,
    epx: Option<f64>,
    epy: Option<f64>,
}

/// Connect to a gpsd daemon and enable JSON watch mode
pub fn connect_gpsd(host: &str, port: u16, timeout: Duration) -> Result<std::net::TcpStream> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| MapError::Connection(format!("Failed to resolve gpsd host {}: {}", host, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match std::net::TcpStream::connect_timeout(&addr, timeout) {
            Ok(mut stream) => {
                stream
                    .write_all(WATCH_COMMAND.as_bytes())
                    .map_err(|e| MapError::Connection(format!("Failed to send WATCH command: {}", e)))?;
                stream.set_nonblocking(true)?;
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(MapError::Connection(match last_error {
        Some(e) => format!("Failed to connect to gpsd at {}:{}: {}", host, port, e),
        None => format!("No address found for gpsd at {}:{}", host, port),
    }))
}

/// Parse one line of gpsd output. Returns a fix for TPV reports that carry
/// a 2D or 3D position.
pub fn parse_gpsd_json(line: &str, provider: ProviderKind) -> Result<Option<LocationFix>> {
    let message: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| MapError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    match message {
        GpsdMessage::Tpv(tpv) => Ok(tpv_to_fix(tpv, provider)),
        GpsdMessage::Version { release } => {
            info!(release = release.as_deref().unwrap_or("unknown"), "connected to gpsd");
            Ok(None)
        }
        GpsdMessage::Devices { devices } => {
            debug!(count = devices.len(), "gpsd devices");
            Ok(None)
        }
        GpsdMessage::Other => Ok(None),
    }
}

fn tpv_to_fix(tpv: Tpv, provider: ProviderKind) -> Option<LocationFix> {
    if tpv.mode < 2 {
        return None;
    }
    let (lat, lon) = (tpv.lat?, tpv.lon?);

    let mut fix = LocationFix::new(lat, lon, provider);
    if let Some(time) = tpv.time {
        fix = fix.with_timestamp(time);
    }
    let accuracy = tpv.eph.or_else(|| match (tpv.epx, tpv.epy) {
        (Some(x), Some(y)) => Some(x.hypot(y)),
        _ => None,
    });
    if let Some(accuracy) = accuracy {
        fix = fix.with_accuracy(accuracy);
    }
    Some(fix)
}

/// Location provider backed by a gpsd daemon
pub struct GpsdProvider {
    kind: ProviderKind,
    host: String,
    port: u16,
    runtime: Handle,
    permissions: Arc<dyn PermissionSource>,
    last_known: Arc<Mutex<Option<LocationFix>>>,
    task: Option<JoinHandle<()>>,
}

impl GpsdProvider {
    pub fn new(
        kind: ProviderKind,
        host: &str,
        port: u16,
        runtime: Handle,
        permissions: Arc<dyn PermissionSource>,
    ) -> Self {
        Self {
            kind,
            host: host.to_string(),
            port,
            runtime,
            permissions,
            last_known: Arc::new(Mutex::new(None)),
            task: None,
        }
    }

    async fn run(stream: TcpStream, kind: ProviderKind, sink: FixSink) {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    warn!(provider = %kind, "gpsd closed the connection");
                    break;
                }
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match parse_gpsd_json(line, kind) {
                        Ok(Some(fix)) => sink.report(fix),
                        Ok(None) => {}
                        Err(e) => debug!(error = %e, "skipping gpsd line"),
                    }
                }
                Err(e) => {
                    warn!(provider = %kind, error = %e, "error reading from gpsd");
                    break;
                }
            }
        }
    }
}

impl LocationProvider for GpsdProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn request_updates(
        &mut self,
        request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
    ) -> std::result::Result<(), ProviderError> {
        check_permission(self.kind, self.permissions.as_ref())?;
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(ProviderError::AlreadySubscribed);
        }

        let stream = connect_gpsd(&self.host, self.port, CONNECT_TIMEOUT)
            .and_then(|stream| {
                let _runtime = self.runtime.enter();
                Ok(TcpStream::from_std(stream)?)
            })
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        info!(provider = %self.kind, "connected to gpsd at {}:{}", self.host, self.port);

        let sink = FixSink::new(request, listener, Arc::clone(&self.last_known));
        let task = self.runtime.spawn(Self::run(stream, self.kind, sink));
        self.task = Some(task);
        Ok(())
    }

    fn remove_updates(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(provider = %self.kind, "gpsd updates removed");
        }
    }

    fn last_known_fix(&self) -> Option<LocationFix> {
        check_permission(self.kind, self.permissions.as_ref()).ok()?;
        self.last_known.lock().ok()?.clone()
    }
}

impl Drop for GpsdProvider {
    fn drop(&mut self) {
        self.remove_updates();
    }
}
