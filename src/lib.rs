//! # skisense
//!
//! Session engine for wearable inertial sensors: discovers nearby sensors,
//! manages their connection lifecycles, decodes the vendor's JSON event
//! protocol into typed records, scales raw readings into physical units,
//! keeps a bounded live view for plotting, and persists recording sessions
//! with derived ski-performance metrics.
//!
//! ## Architecture
//!
//! ```text
//! Caller (UI / CLI)
//!   | EngineCommand            ^ EngineEvent
//!   v                          |
//! EngineWorker (single thread, owns all mutable state)
//!   | Discovery / MdsClient traits
//!   v
//! Transport collaborators (BLE stack, scripted fakes in tests)
//! ```
//!
//! All mutable state lives on the worker thread. Callers interact through
//! [`engine::EngineHandle`]; transports push uri-tagged payloads through
//! crossbeam channels. Nothing in the crate requires a lock.
//!
//! ## Modules
//!
//! - [`engine`] - Device session manager: worker loop, commands, events
//! - [`protocol`] - Typed records and decoders for the vendor JSON protocol
//! - [`units`] - Raw int16 to physical-unit scaling
//! - [`live`] - Bounded live sample buffers for display
//! - [`store`] - Durable SQLite session storage and derived metrics
//! - [`transport`] - Discovery and protocol-client collaborator traits
//! - [`config`] - Engine configuration and sink-mode routing
//! - [`reporter`] - Non-fatal anomaly reporting
//! - [`error`] - Engine-wide error type

pub mod config;
pub mod engine;
pub mod error;
pub mod live;
pub mod protocol;
pub mod reporter;
pub mod store;
pub mod transport;
pub mod types;
pub mod units;

pub use config::{EngineConfig, SinkMode};
pub use engine::{EngineCommand, EngineEvent, EngineHandle, SessionEngine};
pub use error::{EngineError, Result};
pub use live::LiveSampleRing;
pub use reporter::{ErrorReporter, TracingReporter};
pub use store::{SessionId, SessionStore};
pub use transport::{DiscoveredDevice, Discovery, MdsClient, RawEvent};
pub use types::{Connection, ConnectionState, DeviceRecord, Sample, ScanState, SignalGroup, Vector3};
