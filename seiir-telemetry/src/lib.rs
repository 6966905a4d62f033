//! Observability utilities for forecast tools.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support {
    //! Structured tracing helpers.

    use tracing::Level;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::format::FmtSpan;

    /// Settings for the process-wide tracing subscriber.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct TelemetryConfig {
        default_directive: String,
        with_target: bool,
        log_spans: bool,
    }

    impl TelemetryConfig {
        /// Logs at `level` unless `RUST_LOG` says otherwise.
        #[must_use]
        pub fn new(level: Level) -> Self {
            Self {
                default_directive: level.to_string().to_ascii_lowercase(),
                with_target: false,
                log_spans: false,
            }
        }

        /// Replaces the default filter with an `EnvFilter` directive string,
        /// e.g. `seiir_config=debug,info`.
        #[must_use]
        pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
            self.default_directive = directive.into();
            self
        }

        /// Includes the event target (module path) in each line.
        #[must_use]
        pub const fn with_target(mut self, with_target: bool) -> Self {
            self.with_target = with_target;
            self
        }

        /// Emits an event whenever a span closes.
        #[must_use]
        pub const fn log_spans(mut self, log_spans: bool) -> Self {
            self.log_spans = log_spans;
            self
        }

        /// Default filter directive applied when `RUST_LOG` is unset.
        #[must_use]
        pub fn default_directive(&self) -> &str {
            &self.default_directive
        }

        fn filter(&self) -> EnvFilter {
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&self.default_directive))
                .unwrap_or_else(|_| EnvFilter::new("info"))
        }
    }

    impl Default for TelemetryConfig {
        fn default() -> Self {
            Self::new(Level::INFO)
        }
    }

    /// Installs a formatted subscriber on stderr.
    ///
    /// Returns `false` when a global subscriber was already installed, in which
    /// case the existing one is kept.
    pub fn init(config: &TelemetryConfig) -> bool {
        let span_events = if config.log_spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        tracing_subscriber::fmt()
            .with_env_filter(config.filter())
            .with_target(config.with_target)
            .with_span_events(span_events)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    }

}

pub use tracing_support::{TelemetryConfig, init};
