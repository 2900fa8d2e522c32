// src/location/nmea.rs
//! NMEA 0183 position sentences from a serial receiver

use super::{
    fix::{LocationFix, ProviderKind},
    permission::PermissionSource,
    provider::{check_permission, FixSink, LocationListener, LocationProvider, UpdateRequest},
};
use crate::error::{ProviderError, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    runtime::Handle,
    task::JoinHandle,
};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Typical horizontal error per unit of HDOP for a consumer receiver, meters
const UERE_M: f64 = 5.0;

/// Parse a single NMEA sentence into a fix. Only GGA and RMC carry a
/// position; anything else, or a sentence without a valid fix, yields None.
pub fn parse_nmea_sentence(line: &str, provider: ProviderKind) -> Option<LocationFix> {
    let sentence = line.split('*').next().unwrap_or(line);
    let parts: Vec<&str> = sentence.split(',').collect();
    let talker = parts.first()?;

    if talker.len() != 6 || !talker.is_ascii() || !talker.starts_with('$') {
        return None;
    }
    match talker.get(3..)? {
        "GGA" => parse_gga(&parts, provider),
        "RMC" => parse_rmc(&parts, provider),
        _ => None,
    }
}

/// Parse GGA (Global Positioning System Fix Data) sentence
fn parse_gga(parts: &[&str], provider: ProviderKind) -> Option<LocationFix> {
    if parts.len() < 10 {
        return None;
    }

    // Fix quality (field 6), 0 means invalid
    let quality: u8 = parts[6].parse().ok()?;
    if quality == 0 {
        return None;
    }

    let latitude = parse_coordinate(parts[2], parts[3])?;
    let longitude = parse_coordinate(parts[4], parts[5])?;
    let mut fix = LocationFix::new(latitude, longitude, provider);

    // HDOP (field 8)
    if let Ok(hdop) = parts[8].parse::<f64>() {
        fix = fix.with_accuracy(hdop * UERE_M);
    }
    Some(fix)
}

/// Parse RMC (Recommended Minimum) sentence
fn parse_rmc(parts: &[&str], provider: ProviderKind) -> Option<LocationFix> {
    if parts.len() < 10 {
        return None;
    }

    // Status (field 2): A = active, V = void
    if parts[2] != "A" {
        return None;
    }

    let latitude = parse_coordinate(parts[3], parts[4])?;
    let longitude = parse_coordinate(parts[5], parts[6])?;
    let mut fix = LocationFix::new(latitude, longitude, provider);

    // Time (field 1) and date (field 9)
    let time = NaiveTime::parse_from_str(parts[1], "%H%M%S%.f").ok();
    let date = NaiveDate::parse_from_str(parts[9], "%d%m%y").ok();
    if let (Some(time), Some(date)) = (time, date) {
        fix = fix.with_timestamp(Utc.from_utc_datetime(&date.and_time(time)));
    }
    Some(fix)
}

/// Convert ddmm.mmmm / dddmm.mmmm plus hemisphere to signed degrees
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let raw: f64 = value.parse().ok()?;
    let degrees = (raw / 100.0).trunc();
    let minutes = raw - degrees * 100.0;
    let coordinate = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(coordinate),
        "S" | "W" => Some(-coordinate),
        _ => None,
    }
}

/// Location provider reading NMEA sentences from a serial port
pub struct NmeaSerialProvider {
    kind: ProviderKind,
    port: String,
    baudrate: u32,
    runtime: Handle,
    permissions: Arc<dyn PermissionSource>,
    last_known: Arc<Mutex<Option<LocationFix>>>,
    task: Option<JoinHandle<()>>,
}

impl NmeaSerialProvider {
    pub fn new(
        kind: ProviderKind,
        port: &str,
        baudrate: u32,
        runtime: Handle,
        permissions: Arc<dyn PermissionSource>,
    ) -> Self {
        Self {
            kind,
            port: port.to_string(),
            baudrate,
            runtime,
            permissions,
            last_known: Arc::new(Mutex::new(None)),
            task: None,
        }
    }
}

impl LocationProvider for NmeaSerialProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn request_updates(
        &mut self,
        request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
    ) -> std::result::Result<(), ProviderError> {
        check_permission(self.kind, self.permissions.as_ref())?;
        if self.task.is_some() {
            return Err(ProviderError::AlreadySubscribed);
        }

        let serial = {
            let _runtime = self.runtime.enter();
            tokio_serial::new(&self.port, self.baudrate)
                .timeout(Duration::from_millis(1000))
                .open_native_async()
                .map_err(|e| ProviderError::Unavailable(format!("{}: {}", self.port, e)))?
        };
        info!(provider = %self.kind, port = %self.port, baudrate = self.baudrate, "serial receiver opened");

        let sink = FixSink::new(request, listener, Arc::clone(&self.last_known));
        let kind = self.kind;
        let port = self.port.clone();
        let task = self.runtime.spawn(async move {
            let mut reader = BufReader::new(serial);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        if let Some(fix) = parse_nmea_sentence(line.trim(), kind) {
                            sink.report(fix);
                        }
                    }
                    Err(e) => {
                        warn!(provider = %kind, port = %port, error = %e, "error reading from serial port");
                        break;
                    }
                }
            }
        });
        self.task = Some(task);
        Ok(())
    }

    fn remove_updates(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(provider = %self.kind, "serial updates removed");
        }
    }

    fn last_known_fix(&self) -> Option<LocationFix> {
        check_permission(self.kind, self.permissions.as_ref()).ok()?;
        self.last_known.lock().ok()?.clone()
    }
}

impl Drop for NmeaSerialProvider {
    fn drop(&mut self) {
        self.remove_updates();
    }
}

/// List available serial ports
pub fn list_serial_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| format!("{} - {:?}", port.port_name, port.port_type))
        .collect())
}
