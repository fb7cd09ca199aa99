//! Device session manager
//!
//! The orchestrator of the crate: owns discovery results, tracks per-device
//! connection state, manages subscribe/unsubscribe lifecycles, routes
//! decoded measurements into the live ring and the session store, and
//! notifies observers of every state change.
//!
//! # Architecture
//!
//! All mutable state lives on one worker thread, which communicates with
//! callers via channels:
//!
//! - [`EngineCommand`] - Requests sent from the caller to the worker
//! - [`EngineEvent`] - Change notifications pushed back to observers
//! - [`EngineHandle`] - Caller-side handle for sending commands and
//!   draining events
//! - [`SessionEngine`] - Entry point that builds the worker and channels
//!
//! Observers never see the worker's maps directly; they consume the event
//! stream or keep their own projection of it.
//!
//! # Example
//!
//! ```ignore
//! use skisense::engine::SessionEngine;
//! use skisense::config::EngineConfig;
//!
//! let (engine, handle) = SessionEngine::new(
//!     EngineConfig::default(),
//!     discovery,
//!     client,
//!     reporter,
//! )?;
//!
//! std::thread::spawn(move || engine.run());
//!
//! handle.start_scan();
//! for event in handle.drain() {
//!     // project events into view state
//! }
//! ```

pub mod worker;

pub use worker::EngineWorker;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::reporter::ErrorReporter;
use crate::store::SessionStore;
use crate::transport::{Discovery, MdsClient};
use crate::types::{Connection, DeviceRecord, Sample, ScanState, SignalGroup};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::Arc;
use uuid::Uuid;

/// Request sent from the caller to the engine worker
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Clear the discovered set and begin a scan with a fresh timeout
    StartScan,
    /// Stop an in-progress scan
    StopScan,
    /// Issue a transport connect for a discovered device
    Connect { id: Uuid },
    /// Subscribe to a sensor's measurement feed
    StartRecording { serial: String },
    /// Unsubscribe from a sensor's measurement feed
    StopRecording { serial: String },
    /// Disable auto-reconnect and drop the connection
    Forget { serial: String, handle: Uuid },
    /// Shut the worker down
    Shutdown,
}

/// Change notification pushed to observers
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Scanning started or stopped
    ScanState(ScanState),
    /// The discovered-device set changed
    DeviceList(Vec<DeviceRecord>),
    /// A connection's info fetch completed; exactly one per serial
    ConnectionEstablished(Connection),
    /// An existing connection's attributes changed
    ConnectionUpdated(Connection),
    /// A connection was removed (presence delete or forget)
    ConnectionRemoved(String),
    /// A measurement subscription is active for the serial
    RecordingStarted(String),
    /// The measurement subscription for the serial ended
    RecordingStopped(String),
    /// One axis-triple was appended to the live ring
    LiveSamples {
        serial: String,
        group: SignalGroup,
        samples: [Sample; 3],
    },
    /// The worker is shutting down
    Shutdown,
}

/// Caller-side handle for the engine worker
pub struct EngineHandle {
    /// Receiver for engine events
    pub receiver: Receiver<EngineEvent>,
    /// Sender for commands to the worker
    pub command_sender: Sender<EngineCommand>,
}

impl EngineHandle {
    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending events
    pub fn drain(&self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Send a command to the worker
    pub fn send_command(&self, cmd: EngineCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    pub fn start_scan(&self) {
        let _ = self.command_sender.send(EngineCommand::StartScan);
    }

    pub fn stop_scan(&self) {
        let _ = self.command_sender.send(EngineCommand::StopScan);
    }

    pub fn connect(&self, id: Uuid) {
        let _ = self.command_sender.send(EngineCommand::Connect { id });
    }

    pub fn start_recording(&self, serial: impl Into<String>) {
        let _ = self.command_sender.send(EngineCommand::StartRecording {
            serial: serial.into(),
        });
    }

    pub fn stop_recording(&self, serial: impl Into<String>) {
        let _ = self.command_sender.send(EngineCommand::StopRecording {
            serial: serial.into(),
        });
    }

    pub fn forget(&self, serial: impl Into<String>, handle: Uuid) {
        let _ = self.command_sender.send(EngineCommand::Forget {
            serial: serial.into(),
            handle,
        });
    }

    pub fn shutdown(&self) {
        let _ = self.command_sender.send(EngineCommand::Shutdown);
    }
}

/// The session engine entry point
///
/// Builds the channel pair and the worker; `run` consumes the engine on a
/// dedicated thread.
pub struct SessionEngine {
    worker: EngineWorker,
}

impl SessionEngine {
    /// Create an engine and its caller handle
    ///
    /// Opens the session store eagerly when the configured sink persists,
    /// so storage misconfiguration surfaces here rather than on the first
    /// measurement.
    pub fn new(
        config: EngineConfig,
        discovery: Arc<dyn Discovery>,
        client: Arc<dyn MdsClient>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<(Self, EngineHandle)> {
        let store = if config.sink.persists() {
            let path = config.database_path.as_ref().ok_or_else(|| {
                EngineError::Config("sink mode persists but no database path is set".to_string())
            })?;
            Some(SessionStore::open(path)?)
        } else {
            None
        };

        let (cmd_tx, cmd_rx) = bounded(256);
        // Bounded for backpressure; a slow observer drops notifications
        // instead of growing the queue without limit
        let (event_tx, event_rx) = bounded(10_000);

        let worker = EngineWorker::new(config, cmd_rx, event_tx, discovery, client, reporter, store);

        let handle = EngineHandle {
            receiver: event_rx,
            command_sender: cmd_tx,
        };

        Ok((Self { worker }, handle))
    }

    /// Run the worker loop until shutdown
    pub fn run(self) {
        let mut worker = self.worker;
        worker.run();
    }
}
