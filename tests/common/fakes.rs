//! Scripted transport fakes for integration tests
//!
//! Unlike the mockall mocks used in unit tests, these fakes hold real
//! channel state so a test can inject subscription events after the engine
//! is running, the way a live transport would.

use crossbeam_channel::Sender;
use skisense::error::{EngineError, Result};
use skisense::reporter::ErrorReporter;
use skisense::transport::{DiscoveredDevice, Discovery, MdsClient, RawEvent};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Discovery fake that replays a scripted advertisement list on every scan
#[derive(Default)]
pub struct ScriptedDiscovery {
    advertisements: Mutex<Vec<DiscoveredDevice>>,
    pub stop_count: Mutex<usize>,
}

impl ScriptedDiscovery {
    pub fn advertising(devices: Vec<(Uuid, &str)>) -> Arc<Self> {
        Arc::new(Self {
            advertisements: Mutex::new(
                devices
                    .into_iter()
                    .map(|(id, name)| DiscoveredDevice {
                        id,
                        name: name.to_string(),
                    })
                    .collect(),
            ),
            stop_count: Mutex::new(0),
        })
    }
}

impl Discovery for ScriptedDiscovery {
    fn start_scan(&self, sink: Sender<DiscoveredDevice>) -> Result<()> {
        for device in self.advertisements.lock().unwrap().iter() {
            let _ = sink.send(device.clone());
        }
        Ok(())
    }

    fn stop_scan(&self) {
        *self.stop_count.lock().unwrap() += 1;
    }
}

/// Protocol-client fake with canned GET responses and live subscriptions
///
/// Tests register responses per path, then push raw events into whatever
/// subscriptions the engine opened.
#[derive(Default)]
pub struct ScriptedMds {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    subscriptions: Mutex<HashMap<String, Sender<RawEvent>>>,
    pub connect_requests: Mutex<Vec<Uuid>>,
    pub forgotten: Mutex<Vec<String>>,
}

impl ScriptedMds {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register the payload a GET on `path` returns
    pub fn respond(&self, path: &str, payload: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), payload);
    }

    /// Push a raw event into the engine's subscription on `path`
    ///
    /// Panics if the engine never subscribed; integration tests treat a
    /// missing subscription as a sequencing bug.
    pub fn push(&self, path: &str, payload: Vec<u8>) {
        let subscriptions = self.subscriptions.lock().unwrap();
        let sink = subscriptions
            .get(path)
            .unwrap_or_else(|| panic!("no subscription on {path}"));
        sink.send(RawEvent {
            path: path.to_string(),
            payload,
        })
        .expect("engine dropped its raw event receiver");
    }

    pub fn is_subscribed(&self, path: &str) -> bool {
        self.subscriptions.lock().unwrap().contains_key(path)
    }
}

impl MdsClient for ScriptedMds {
    fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::Request {
                path: path.to_string(),
                message: "404 Not Found".to_string(),
            })
    }

    fn subscribe(&self, path: &str, sink: Sender<RawEvent>) -> Result<()> {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(path.to_string(), sink);
        Ok(())
    }

    fn unsubscribe(&self, path: &str) {
        self.subscriptions.lock().unwrap().remove(path);
    }

    fn connect_device(&self, handle: Uuid) {
        self.connect_requests.lock().unwrap().push(handle);
    }

    fn disconnect_device(&self, _handle: Uuid) {}

    fn disable_auto_reconnect(&self, serial: &str) {
        self.forgotten.lock().unwrap().push(serial.to_string());
    }
}

/// Reporter that collects every anomaly for assertions
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    pub reports: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn contains(&self, needle: &str) -> bool {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.contains(needle))
    }
}

impl ErrorReporter for RecordingReporter {
    fn report_error(&self, err: &EngineError) {
        self.reports.lock().unwrap().push(err.to_string());
    }

    fn report_message(&self, msg: &str) {
        self.reports.lock().unwrap().push(msg.to_string());
    }
}
