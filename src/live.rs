//! Bounded live sample buffers
//!
//! Holds the most recent readings per sensor and signal group for display.
//! Each measurement event appends one axis-triple atomically; when a buffer
//! exceeds its capacity the oldest triple is evicted, so a snapshot never
//! shows a partial triple. Content is lost on restart by design.

use crate::types::{Sample, SignalGroup};
use std::collections::{HashMap, VecDeque};

/// Default capacity per (serial, group) buffer, counted across all three
/// axes combined (150 entries = 50 triples)
pub const DEFAULT_LIVE_CAP: usize = 150;

/// Fixed-capacity live sample buffers, keyed by serial and signal group
#[derive(Debug)]
pub struct LiveSampleRing {
    buffers: HashMap<(String, SignalGroup), VecDeque<Sample>>,
    cap: usize,
}

impl Default for LiveSampleRing {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_CAP)
    }
}

impl LiveSampleRing {
    pub fn new(cap: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            cap,
        }
    }

    /// Append one axis-triple for a sensor's signal group
    ///
    /// Pushes three samples labelled with the group's axis names, then
    /// evicts the oldest triple if the buffer ran past capacity. Returns
    /// the appended samples for change notification.
    pub fn append(
        &mut self,
        serial: &str,
        group: SignalGroup,
        timestamp: f64,
        x: f64,
        y: f64,
        z: f64,
    ) -> [Sample; 3] {
        let [lx, ly, lz] = group.axis_labels();
        let triple = [
            Sample { timestamp, axis: lx, value: x },
            Sample { timestamp, axis: ly, value: y },
            Sample { timestamp, axis: lz, value: z },
        ];

        let buffer = self
            .buffers
            .entry((serial.to_string(), group))
            .or_insert_with(|| VecDeque::with_capacity(self.cap + 3));
        buffer.extend(triple);

        while buffer.len() > self.cap {
            // Evict a whole triple to keep axis alignment
            for _ in 0..3 {
                buffer.pop_front();
            }
        }

        triple
    }

    /// Ordered copy of a buffer for read-only consumption
    pub fn snapshot(&self, serial: &str, group: SignalGroup) -> Vec<Sample> {
        self.buffers
            .get(&(serial.to_string(), group))
            .map(|b| b.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently buffered for a sensor's signal group
    pub fn len(&self, serial: &str, group: SignalGroup) -> usize {
        self.buffers
            .get(&(serial.to_string(), group))
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, serial: &str, group: SignalGroup) -> bool {
        self.len(serial, group) == 0
    }

    /// Drop all buffered samples for a sensor
    pub fn clear_serial(&mut self, serial: &str) {
        self.buffers.retain(|(s, _), _| s != serial);
    }
}
