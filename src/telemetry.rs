//! Injected observability collaborator
//!
//! Pipeline stages report spans (fetch, parse, propagate, cache) and
//! warnings through [`Telemetry`] instead of logging ad hoc, so embedders
//! can route them into their own tracing.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

/// Minimal span/warning sink
pub trait Telemetry: Send + Sync {
    /// Begin a named span
    fn start(&self, name: &str);
    /// End a named span previously started
    fn end(&self, name: &str);
    /// Report a recoverable problem
    fn warn(&self, msg: &str);
    /// Report a failure surfaced to the caller
    fn error(&self, msg: &str);
}

/// Telemetry that times spans and writes everything through `log`.
///
/// Spans with the same name may overlap (concurrent batches); each name
/// keeps a stack of start times and `end` closes the most recent one.
#[derive(Default)]
pub struct LogTelemetry {
    open_spans: Mutex<HashMap<String, Vec<Instant>>>,
}

impl LogTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of started but not yet ended spans
    pub fn open_span_count(&self) -> usize {
        self.open_spans.lock().values().map(Vec::len).sum()
    }
}

impl Telemetry for LogTelemetry {
    fn start(&self, name: &str) {
        log::debug!("{}...", name);
        self.open_spans
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(Instant::now());
    }

    fn end(&self, name: &str) {
        let started = {
            let mut spans = self.open_spans.lock();
            let started = spans.get_mut(name).and_then(Vec::pop);
            if spans.get(name).is_some_and(Vec::is_empty) {
                spans.remove(name);
            }
            started
        };
        match started {
            Some(started) => log::info!("{} in {:.3?}", name, started.elapsed()),
            None => log::debug!("{} ended without a matching start", name),
        }
    }

    fn warn(&self, msg: &str) {
        log::warn!("{}", msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{}", msg);
    }
}

/// Telemetry that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn start(&self, _name: &str) {}
    fn end(&self, _name: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every call for assertions
    #[derive(Default)]
    pub(crate) struct RecordingTelemetry {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingTelemetry {
        pub fn contains(&self, needle: &str) -> bool {
            self.events.lock().iter().any(|e| e.contains(needle))
        }
    }

    impl Telemetry for RecordingTelemetry {
        fn start(&self, name: &str) {
            self.events.lock().push(format!("start:{}", name));
        }
        fn end(&self, name: &str) {
            self.events.lock().push(format!("end:{}", name));
        }
        fn warn(&self, msg: &str) {
            self.events.lock().push(format!("warn:{}", msg));
        }
        fn error(&self, msg: &str) {
            self.events.lock().push(format!("error:{}", msg));
        }
    }

    #[test]
    fn test_log_telemetry_closes_spans() {
        let telemetry = LogTelemetry::new();
        telemetry.start("Parsed element sets");
        assert_eq!(telemetry.open_span_count(), 1);
        telemetry.end("Parsed element sets");
        assert_eq!(telemetry.open_span_count(), 0);
        assert!(telemetry.open_spans.lock().is_empty());

        // Unmatched end is tolerated
        telemetry.end("never started");
        assert_eq!(telemetry.open_span_count(), 0);
    }

    #[test]
    fn test_log_telemetry_overlapping_spans() {
        let telemetry = LogTelemetry::new();
        telemetry.start("Propagated element sets");
        telemetry.start("Propagated element sets");
        assert_eq!(telemetry.open_span_count(), 2);

        telemetry.end("Propagated element sets");
        assert_eq!(telemetry.open_span_count(), 1);
        telemetry.end("Propagated element sets");
        assert_eq!(telemetry.open_span_count(), 0);
    }

    #[test]
    fn test_log_telemetry_concurrent_batches() {
        use crate::data::element_set::tests::catalog;
        use crate::data::parse_element_sets;
        use crate::propagation::Propagator;
        use std::sync::Arc;

        let telemetry = Arc::new(LogTelemetry::new());
        let sets = parse_element_sets(&catalog()).unwrap();
        let propagator = Propagator::new().with_telemetry(telemetry.clone());
        let epoch = sets[0].elements().epoch();

        std::thread::scope(|scope| {
            for i in 0..4 {
                let propagator = &propagator;
                let sets = &sets;
                scope.spawn(move || {
                    let at = epoch + satkit::Duration::from_seconds(60.0 * i as f64);
                    propagator.propagate_batch(sets, at);
                });
            }
        });
        assert_eq!(telemetry.open_span_count(), 0);
    }
}
