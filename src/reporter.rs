//! Error-reporting collaborator
//!
//! Every decode failure, request/subscription failure, and unexpected
//! event method is handed to a reporter. Reporting must never block the
//! event pipeline; implementations that ship errors off-process should
//! queue internally.

use crate::error::EngineError;

/// Receives non-fatal engine anomalies
pub trait ErrorReporter: Send + Sync {
    /// Report an engine error
    fn report_error(&self, err: &EngineError);

    /// Report an anomaly that is not an error value, e.g. an unknown
    /// event method
    fn report_message(&self, msg: &str);
}

/// Default reporter backed by `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report_error(&self, err: &EngineError) {
        tracing::error!("{err}");
    }

    fn report_message(&self, msg: &str) {
        tracing::warn!("{msg}");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Collects reports for assertions
    #[derive(Debug, Default, Clone)]
    pub struct CapturingReporter {
        pub reports: Arc<Mutex<Vec<String>>>,
    }

    impl ErrorReporter for CapturingReporter {
        fn report_error(&self, err: &EngineError) {
            self.reports.lock().unwrap().push(err.to_string());
        }

        fn report_message(&self, msg: &str) {
            self.reports.lock().unwrap().push(msg.to_string());
        }
    }

    impl CapturingReporter {
        pub fn contains(&self, needle: &str) -> bool {
            self.reports
                .lock()
                .unwrap()
                .iter()
                .any(|r| r.contains(needle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CapturingReporter;
    use super::*;

    #[test]
    fn test_capturing_reporter_records_both_kinds() {
        let reporter = CapturingReporter::default();
        reporter.report_error(&EngineError::Decode("bad payload".into()));
        reporter.report_message("Unknown event method");
        assert!(reporter.contains("bad payload"));
        assert!(reporter.contains("Unknown event method"));
    }
}
