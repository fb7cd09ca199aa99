//! Transport and protocol collaborator traits
//!
//! The engine never talks to radios directly. Discovery and the vendor
//! session protocol are collaborators behind these traits, which keeps the
//! session engine testable against scripted fakes and mockall mocks.
//!
//! Delivery is push-based: subscriptions and scans are handed a
//! crossbeam sender, and the collaborator pushes uri-tagged payloads into
//! it in arrival order. The engine's worker folds those channels into its
//! single-threaded loop.

use crate::error::Result;
use crossbeam_channel::Sender;
use uuid::Uuid;

/// A raw subscription payload, tagged with the path it arrived on
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Resource path of the subscription that produced this payload
    pub path: String,
    /// Schema-tagged payload bytes, decoded by [`crate::protocol::decoder`]
    pub payload: Vec<u8>,
}

/// A device found during a scan
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Transport-level identifier, stable for the scan's duration
    pub id: Uuid,
    /// Advertised display name
    pub name: String,
}

/// Discovery collaborator: finds nearby devices
///
/// `start_scan` is expected to deliver every advertisement it sees; the
/// engine applies the vendor name filter itself.
#[cfg_attr(test, mockall::automock)]
pub trait Discovery: Send + Sync {
    /// Begin scanning, pushing discovered devices into `sink`
    fn start_scan(&self, sink: Sender<DiscoveredDevice>) -> Result<()>;

    /// Stop an in-progress scan; a no-op when none is running
    fn stop_scan(&self);
}

/// Vendor session protocol client
///
/// Request/response and publish/subscribe against named resource paths.
/// A non-success protocol status surfaces as `Err`; the engine does not
/// inspect raw headers.
#[cfg_attr(test, mockall::automock)]
pub trait MdsClient: Send + Sync {
    /// Issue a GET and return the raw response payload
    fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Subscribe to a path, pushing raw event payloads into `sink`
    ///
    /// Delivery is single message at a time, in arrival order per
    /// subscription. One event already in flight may still arrive after
    /// [`MdsClient::unsubscribe`].
    fn subscribe(&self, path: &str, sink: Sender<RawEvent>) -> Result<()>;

    /// Stop event delivery for a path; a no-op for unknown paths
    fn unsubscribe(&self, path: &str);

    /// Request a transport-level connection to a discovered device
    fn connect_device(&self, handle: Uuid);

    /// Request a transport-level disconnect
    fn disconnect_device(&self, handle: Uuid);

    /// Disable future automatic reconnection for a serial
    fn disable_auto_reconnect(&self, serial: &str);
}
