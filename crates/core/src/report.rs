//! Reporter port for run diagnostics.
//!
//! Components never log through a global; they receive a `&dyn Reporter`.
//! Reporting is observational only and must not change control flow.

/// How chatty a run is.
///
/// `0` silent, `1` errors, `2` errors and progress, `3` also every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub const SILENT: Verbosity = Verbosity(0);
    pub const ERRORS: Verbosity = Verbosity(1);
    pub const INFO: Verbosity = Verbosity(2);
    pub const TRACE: Verbosity = Verbosity(3);
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::ERRORS
    }
}

/// Sink for progress and error messages emitted while analyzing.
pub trait Reporter {
    /// Progress information (application analyzed, package ignored, ...)
    fn info(&self, message: &str);

    /// Per-edge detail; only interesting at the highest verbosity.
    fn detail(&self, _message: &str) {}

    /// Non-fatal failure (unparsable module, unreadable package, ...)
    fn error(&self, message: &str);
}

/// Forwards messages allowed by its [`Verbosity`] to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter {
    verbosity: Verbosity,
}

impl TracingReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::INFO {
            tracing::info!("{}", message);
        }
    }

    fn detail(&self, message: &str) {
        if self.verbosity >= Verbosity::TRACE {
            tracing::debug!("{}", message);
        }
    }

    fn error(&self, message: &str) {
        if self.verbosity >= Verbosity::ERRORS {
            tracing::error!("{}", message);
        }
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn info(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records messages so tests can assert on what was reported.
    #[derive(Default)]
    pub(crate) struct RecordingReporter {
        pub infos: RefCell<Vec<String>>,
        pub errors: RefCell<Vec<String>>,
    }

    impl Reporter for RecordingReporter {
        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::SILENT < Verbosity::ERRORS);
        assert!(Verbosity::INFO < Verbosity::TRACE);
        assert_eq!(Verbosity::default(), Verbosity::ERRORS);
    }

    /// Collects the level of every event it sees
    struct LevelLayer(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for LevelLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn emitted_levels(verbosity: Verbosity) -> Vec<Level> {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LevelLayer(Arc::clone(&levels)));

        tracing::subscriber::with_default(subscriber, || {
            let reporter = TracingReporter::new(verbosity);
            reporter.info("Analyzing blog");
            reporter.detail("blog --> shop (1)");
            reporter.error("File blog.views: syntax error");
        });

        let collected = levels.lock().unwrap().clone();
        collected
    }

    #[test]
    fn test_tracing_reporter_keeps_verbosity() {
        let reporter = TracingReporter::new(Verbosity::INFO);
        assert_eq!(reporter.verbosity(), Verbosity(2));
    }

    #[test]
    fn test_tracing_reporter_gates_by_verbosity() {
        assert!(emitted_levels(Verbosity::SILENT).is_empty());
        assert_eq!(emitted_levels(Verbosity::ERRORS), vec![Level::ERROR]);
        assert_eq!(
            emitted_levels(Verbosity::INFO),
            vec![Level::INFO, Level::ERROR]
        );
        assert_eq!(
            emitted_levels(Verbosity::TRACE),
            vec![Level::INFO, Level::DEBUG, Level::ERROR]
        );
    }

    #[test]
    fn test_silent_reporter_emits_nothing() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LevelLayer(Arc::clone(&levels)));

        tracing::subscriber::with_default(subscriber, || {
            SilentReporter.info("Analyzing blog");
            SilentReporter.detail("blog --> shop (1)");
            SilentReporter.error("File blog.views: syntax error");
        });

        assert!(levels.lock().unwrap().is_empty());
    }
}
