//! Engine worker loop
//!
//! The worker thread owns every mutable map in the engine: discovered
//! devices, established connections, the live sample ring, and the session
//! store handle. Commands, raw subscription payloads, discovery callbacks,
//! and info-fetch outcomes all arrive over channels and are applied
//! serially, so no locking is needed anywhere in the engine.
//!
//! # Responsibilities
//!
//! - **Command processing**: scan, connect, record, forget, shutdown
//! - **Presence handling**: connection creation after the two-step info
//!   fetch, removal on presence deletes
//! - **Measurement routing**: decode, scale, live-ring append, and
//!   (depending on the sink mode) durable persistence
//! - **Scan timeout**: a one-shot deadline stops scanning after the
//!   configured window; re-entrant starts restart the deadline
//! - **Error handling**: every decode/request/storage failure is reported
//!   and recovery is local; nothing here is fatal to the process
//!
//! # Info fetch
//!
//! A presence "post" spawns a detached thread that performs the two info
//! queries strictly in sequence (app info, then device info) and reports a
//! [`FetchOutcome`] back through a channel. Fetches for different serials
//! may run concurrently; the worker applies outcomes one at a time, and a
//! connection becomes visible to observers in a single publish.

use crate::config::EngineConfig;
use crate::engine::{EngineCommand, EngineEvent};
use crate::error::{EngineError, Result, ResultExt};
use crate::live::LiveSampleRing;
use crate::protocol::{
    self, decode_device_event, decode_measurement, decode_response, AppInfo, Method, SensorInfo,
};
use crate::reporter::ErrorReporter;
use crate::store::{SensorId, SessionId, SessionStore};
use crate::transport::{DiscoveredDevice, Discovery, MdsClient, RawEvent};
use crate::types::{
    Connection, ConnectionState, DeviceRecord, ScanState, SignalGroup, Vector3,
};
use crate::units::{scale_acc, scale_gyro, scale_magn};
use chrono::Utc;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long the loop waits for input before rechecking the scan deadline
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Result of the two-step info fetch for one serial
#[derive(Debug)]
pub(crate) struct FetchOutcome {
    serial: String,
    handle: Uuid,
    result: Result<(AppInfo, SensorInfo)>,
}

/// The engine worker owning all mutable session state
pub struct EngineWorker {
    config: EngineConfig,
    /// Command receiver from the caller
    command_rx: Receiver<EngineCommand>,
    /// Event sender to observers
    event_tx: Sender<EngineEvent>,
    discovery: Arc<dyn Discovery>,
    client: Arc<dyn MdsClient>,
    reporter: Arc<dyn ErrorReporter>,

    /// Raw subscription payloads (presence + measurement feeds)
    raw_rx: Receiver<RawEvent>,
    raw_tx: Sender<RawEvent>,
    /// Discovery callbacks
    discovered_rx: Receiver<DiscoveredDevice>,
    discovered_tx: Sender<DiscoveredDevice>,
    /// Info-fetch outcomes from detached fetch threads
    fetch_rx: Receiver<FetchOutcome>,
    fetch_tx: Sender<FetchOutcome>,

    /// Sensors found by the current scan, keyed by transport identifier
    devices: HashMap<Uuid, DeviceRecord>,
    /// Established connections, keyed by serial
    connections: HashMap<String, Connection>,
    /// Bounded live sample history per serial and signal group
    live: LiveSampleRing,
    /// Durable store; present when the sink mode persists
    store: Option<SessionStore>,
    /// Active session handle, created lazily on the first persisted
    /// measurement of a recording occasion
    session: Option<SessionId>,
    /// Sensor-row cache for the active session
    sensors: HashMap<String, SensorId>,
    /// Serials with an active measurement subscription
    recording: HashSet<String>,

    scan_state: ScanState,
    scan_deadline: Option<Instant>,
    running: bool,
}

impl EngineWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        command_rx: Receiver<EngineCommand>,
        event_tx: Sender<EngineEvent>,
        discovery: Arc<dyn Discovery>,
        client: Arc<dyn MdsClient>,
        reporter: Arc<dyn ErrorReporter>,
        store: Option<SessionStore>,
    ) -> Self {
        let (raw_tx, raw_rx) = bounded(1024);
        let (discovered_tx, discovered_rx) = bounded(256);
        let (fetch_tx, fetch_rx) = bounded(64);
        let live = LiveSampleRing::new(config.live_buffer_cap);

        Self {
            config,
            command_rx,
            event_tx,
            discovery,
            client,
            reporter,
            raw_rx,
            raw_tx,
            discovered_rx,
            discovered_tx,
            fetch_rx,
            fetch_tx,
            devices: HashMap::new(),
            connections: HashMap::new(),
            live,
            store,
            session: None,
            sensors: HashMap::new(),
            recording: HashSet::new(),
            scan_state: ScanState::Off,
            scan_deadline: None,
            running: true,
        }
    }

    /// Run the worker loop until shutdown
    pub fn run(&mut self) {
        tracing::info!("Session engine worker started");

        // Presence subscription outlives everything else the worker does
        if let Err(e) = self
            .client
            .subscribe(protocol::CONNECTED_DEVICES_PATH, self.raw_tx.clone())
        {
            tracing::error!("Presence subscription failed: {e}");
            self.reporter.report_error(&e);
        }

        while self.running {
            let timeout = match self.scan_deadline {
                Some(deadline) => deadline
                    .saturating_duration_since(Instant::now())
                    .min(IDLE_TICK),
                None => IDLE_TICK,
            };

            select! {
                recv(self.command_rx) -> cmd => match cmd {
                    Ok(cmd) => self.handle_command(cmd),
                    Err(_) => self.running = false,
                },
                recv(self.raw_rx) -> event => if let Ok(event) = event {
                    self.handle_raw_event(event);
                },
                recv(self.discovered_rx) -> device => if let Ok(device) = device {
                    self.handle_discovered(device);
                },
                recv(self.fetch_rx) -> outcome => if let Ok(outcome) = outcome {
                    self.apply_fetch_outcome(outcome);
                },
                default(timeout) => {},
            }

            self.check_scan_deadline();
        }

        // Cleanup: stop delivery before the channels are dropped
        for serial in self.recording.drain() {
            self.client.unsubscribe(&protocol::sample_path(&serial));
        }
        self.client.unsubscribe(protocol::CONNECTED_DEVICES_PATH);
        if self.scan_state == ScanState::On {
            self.discovery.stop_scan();
        }

        let _ = self.event_tx.send(EngineEvent::Shutdown);
        tracing::info!("Session engine worker stopped");
    }

    /// Handle a single caller command
    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::StartScan => self.start_scan(),
            EngineCommand::StopScan => self.stop_scan(),
            EngineCommand::Connect { id } => self.connect(id),
            EngineCommand::StartRecording { serial } => self.start_recording(&serial),
            EngineCommand::StopRecording { serial } => self.stop_recording(&serial),
            EngineCommand::Forget { serial, handle } => self.forget(&serial, handle),
            EngineCommand::Shutdown => {
                self.running = false;
            }
        }
    }

    /// Begin a scan with a fresh discovered set and a fresh deadline
    ///
    /// Re-entrant: starting while already scanning restarts the deadline
    /// instead of stacking timers.
    fn start_scan(&mut self) {
        self.devices.clear();
        self.emit_device_list();

        self.scan_state = ScanState::On;
        self.emit(EngineEvent::ScanState(ScanState::On));

        if let Err(e) = self.discovery.start_scan(self.discovered_tx.clone()) {
            tracing::error!("Scan failed to start: {e}");
            self.reporter.report_error(&e);
            self.scan_state = ScanState::Off;
            self.scan_deadline = None;
            self.emit(EngineEvent::ScanState(ScanState::Off));
            return;
        }

        self.scan_deadline = Some(Instant::now() + self.config.scan_timeout());
        tracing::info!("Scan started ({}s window)", self.config.scan_timeout_secs);
    }

    fn stop_scan(&mut self) {
        self.discovery.stop_scan();
        self.scan_deadline = None;
        if self.scan_state != ScanState::Off {
            self.scan_state = ScanState::Off;
            self.emit(EngineEvent::ScanState(ScanState::Off));
            tracing::info!("Scan stopped");
        }
    }

    /// Fire the one-shot scan timeout when its deadline has passed
    fn check_scan_deadline(&mut self) {
        if let Some(deadline) = self.scan_deadline {
            if Instant::now() >= deadline && self.scan_state == ScanState::On {
                tracing::debug!("Scan window elapsed");
                self.stop_scan();
            }
        }
    }

    /// Issue a transport connect for a discovered device
    ///
    /// Fire-and-forget: the record stays `Connecting` even if the
    /// transport later reports a failed attempt; the state resolves when a
    /// presence event arrives or the next scan clears the set.
    fn connect(&mut self, id: Uuid) {
        match self.devices.get_mut(&id) {
            Some(record) => {
                tracing::info!("Connecting to {} ({})", record.name, id);
                record.state = ConnectionState::Connecting;
                self.client.connect_device(id);
                self.emit_device_list();
            }
            None => {
                self.reporter
                    .report_message(&format!("Connect requested for unknown device {id}"));
            }
        }
    }

    /// Subscribe to a sensor's measurement feed
    fn start_recording(&mut self, serial: &str) {
        let path = protocol::sample_path(serial);
        match self.client.subscribe(&path, self.raw_tx.clone()) {
            Ok(()) => {
                tracing::info!("Subscribed to {path}");
                self.recording.insert(serial.to_string());
                self.emit(EngineEvent::RecordingStarted(serial.to_string()));
            }
            Err(e) => {
                tracing::error!("Subscription to {path} failed: {e}");
                self.reporter.report_error(&e);
            }
        }
    }

    /// Unsubscribe from a sensor's measurement feed
    ///
    /// Marks the connection's last-measurement timestamp stale so liveness
    /// displays detect the idle state. One event already in flight may
    /// still arrive afterwards; it reaches the live view only, never the
    /// store.
    fn stop_recording(&mut self, serial: &str) {
        self.client.unsubscribe(&protocol::sample_path(serial));
        self.recording.remove(serial);

        if let Some(conn) = self.connections.get_mut(serial) {
            conn.last_measurement = Some(Connection::stale_sentinel());
            let updated = conn.clone();
            self.emit(EngineEvent::ConnectionUpdated(updated));
        }
        self.emit(EngineEvent::RecordingStopped(serial.to_string()));
        tracing::info!("Recording stopped for {serial}");

        // A recording occasion ends when the last feed stops; the next
        // occasion begins a new session
        if self.recording.is_empty() {
            self.session = None;
            self.sensors.clear();
        }
    }

    /// Disable auto-reconnect for a sensor and drop its connection
    fn forget(&mut self, serial: &str, handle: Uuid) {
        self.client.disable_auto_reconnect(serial);
        self.client.disconnect_device(handle);
        self.live.clear_serial(serial);
        if self.connections.remove(serial).is_some() {
            self.emit(EngineEvent::ConnectionRemoved(serial.to_string()));
        }
        tracing::info!("Forgot sensor {serial}");
    }

    /// Apply a discovery callback, filtering on the vendor name prefix
    ///
    /// Rediscovering a known identifier preserves its connection state.
    fn handle_discovered(&mut self, device: DiscoveredDevice) {
        if !device.name.starts_with(&self.config.vendor_prefix) {
            return;
        }

        let state = self
            .devices
            .get(&device.id)
            .map(|r| r.state)
            .unwrap_or_default();
        self.devices.insert(
            device.id,
            DeviceRecord {
                id: device.id,
                name: device.name,
                state,
            },
        );
        self.emit_device_list();
    }

    /// Route a raw subscription payload by the path it arrived on
    fn handle_raw_event(&mut self, event: RawEvent) {
        if event.path == protocol::CONNECTED_DEVICES_PATH {
            self.handle_presence_event(&event.payload);
        } else if let Some(serial) = event
            .path
            .strip_suffix("/Sample/IntAcc/13")
            .map(str::to_string)
        {
            self.handle_measurement_event(&serial, &event.payload);
        } else {
            self.reporter
                .report_message(&format!("Event on unexpected path {}", event.path));
        }
    }

    /// Apply a presence event: connects start an info fetch, disconnects
    /// remove the connection
    fn handle_presence_event(&mut self, payload: &[u8]) {
        let event = match decode_device_event(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Presence event failed to decode: {e}");
                self.reporter.report_error(&e);
                return;
            }
        };

        let serial = event.body.serial.clone();
        match event.method {
            Method::Post => {
                tracing::info!("{serial} connected");

                // The device is no longer "unconnected but visible"
                let advertised = format!("{} {serial}", self.config.vendor_prefix);
                let before = self.devices.len();
                self.devices.retain(|_, record| record.name != advertised);
                if self.devices.len() != before {
                    self.emit_device_list();
                }

                match event.body.connection {
                    Some(info) => self.spawn_info_fetch(serial, info.uuid),
                    None => {
                        self.reporter.report_message(&format!(
                            "Presence post for {serial} carried no connection info"
                        ));
                    }
                }
            }
            Method::Delete => {
                tracing::info!("{serial} disconnected");
                // Unconditional; unknown serials are a no-op
                self.live.clear_serial(&serial);
                if self.connections.remove(&serial).is_some() {
                    self.emit(EngineEvent::ConnectionRemoved(serial));
                }
            }
            other => {
                self.reporter
                    .report_message(&format!("Unknown event method {other:?} for {serial}"));
            }
        }
    }

    /// Start the detached two-step info fetch for a newly seen serial
    ///
    /// The two GETs run strictly in sequence on the fetch thread; the
    /// outcome is folded back into the worker loop and applied serially.
    fn spawn_info_fetch(&self, serial: String, handle: Uuid) {
        let client = Arc::clone(&self.client);
        let fetch_tx = self.fetch_tx.clone();
        std::thread::spawn(move || {
            let result = fetch_device_info(client.as_ref(), &serial);
            let _ = fetch_tx.send(FetchOutcome {
                serial,
                handle,
                result,
            });
        });
    }

    /// Publish a connection from a completed info fetch, or report the
    /// failure and create nothing
    fn apply_fetch_outcome(&mut self, outcome: FetchOutcome) {
        match outcome.result {
            Ok((app_info, sensor_info)) => {
                let connection = Connection {
                    serial: outcome.serial.clone(),
                    handle: outcome.handle,
                    bootloader_version: sensor_info.sw_version,
                    firmware_version: app_info.version,
                    firmware_name: app_info.name,
                    firmware_manufacturer: app_info.company,
                    last_measurement: None,
                };
                // Single insert keyed by serial: the atomic publish
                self.connections
                    .insert(outcome.serial, connection.clone());
                self.emit(EngineEvent::ConnectionEstablished(connection));
            }
            Err(e) => {
                // The serial stays invisible until another presence post
                tracing::error!("Info fetch for {} failed: {e}", outcome.serial);
                self.reporter.report_error(&e);
            }
        }
    }

    /// Decode, scale, and route one measurement event
    fn handle_measurement_event(&mut self, serial: &str, payload: &[u8]) {
        let event = match decode_measurement(payload) {
            Ok(event) => event.body,
            Err(e) => {
                tracing::warn!("Measurement from {serial} failed to decode: {e}");
                self.reporter.report_error(&e);
                return;
            }
        };

        let ts = event.timestamp_secs();
        let acc = Vector3::new(
            scale_acc(event.acc.x),
            scale_acc(event.acc.y),
            scale_acc(event.acc.z),
        );
        let gyro = Vector3::new(
            scale_gyro(event.gyro.x),
            scale_gyro(event.gyro.y),
            scale_gyro(event.gyro.z),
        );
        let magn = Vector3::new(
            scale_magn(event.magn.x),
            scale_magn(event.magn.y),
            scale_magn(event.magn.z),
        );

        if let Some(conn) = self.connections.get_mut(serial) {
            conn.last_measurement = Some(Utc::now());
        }

        if self.config.sink.feeds_live() {
            for (group, v) in [
                (SignalGroup::Acc, acc),
                (SignalGroup::Gyro, gyro),
                (SignalGroup::Magn, magn),
            ] {
                let samples = self.live.append(serial, group, ts, v.x, v.y, v.z);
                self.emit(EngineEvent::LiveSamples {
                    serial: serial.to_string(),
                    group,
                    samples,
                });
            }
        }

        // A trailing event arriving after unsubscribe still feeds the live
        // view, but it is not part of a recording occasion and must not
        // reach the store (or lazily open a fresh session)
        if self.config.sink.persists() && self.recording.contains(serial) {
            if let Err(e) = self.persist_measurement(serial, ts, acc, gyro, magn) {
                // Measurement dropped, previously committed rows intact
                tracing::error!("Failed to persist measurement from {serial}: {e}");
                self.reporter.report_error(&e);
            }
        }
    }

    /// Lazily create the session and sensor rows, then append durably
    fn persist_measurement(
        &mut self,
        serial: &str,
        timestamp: f64,
        acc: Vector3,
        gyro: Vector3,
        magn: Vector3,
    ) -> Result<()> {
        let store = self
            .store
            .as_mut()
            .ok_or_else(|| EngineError::Config("persisting sink without a store".to_string()))?;

        let session = match self.session {
            Some(session) => session,
            None => {
                let session = store.begin_session(Utc::now())?;
                tracing::info!("Session {} started", session.0);
                self.session = Some(session);
                session
            }
        };

        let sensor = match self.sensors.get(serial) {
            Some(sensor) => *sensor,
            None => {
                let sensor = store.ensure_sensor(session, serial)?;
                self.sensors.insert(serial.to_string(), sensor);
                sensor
            }
        };

        store
            .append_measurement(sensor, timestamp, acc, gyro, magn)
            .context("measurement append failed")
    }

    /// Push an event to observers, dropping it if the channel is full
    fn emit(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            tracing::debug!("Event channel full, dropping notification");
        }
    }

    fn emit_device_list(&self) {
        let mut devices: Vec<DeviceRecord> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        self.emit(EngineEvent::DeviceList(devices));
    }
}

/// The sequential two-step info fetch: app info first, then device info
fn fetch_device_info(client: &dyn MdsClient, serial: &str) -> Result<(AppInfo, SensorInfo)> {
    let app_payload = client.get(&protocol::app_info_path(serial))?;
    let app_info: AppInfo =
        decode_response(&app_payload).with_context(|| format!("app info for {serial}"))?;

    let info_payload = client.get(&protocol::info_path(serial))?;
    let sensor_info: SensorInfo =
        decode_response(&info_payload).with_context(|| format!("device info for {serial}"))?;

    Ok((app_info, sensor_info))
}
