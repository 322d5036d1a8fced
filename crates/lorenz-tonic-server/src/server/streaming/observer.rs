use super::driver::StreamEnd;
use crate::server::telemetry::{increment_stream_errors, record_iterations_per_stream};

/// Sink for per-stream lifecycle events.
///
/// The driver reports what happened instead of logging directly, which
/// keeps the emission loop free of any logging subsystem and lets tests
/// assert on the exact terminal event. Each stream produces exactly one
/// terminal event: `on_completed`, `on_cancelled`, or `on_send_error`.
pub trait StreamObserver: Send + Sync {
    /// The emission loop is about to start.
    fn on_start(&self) {}

    /// A bound was reached; the stream completed normally.
    fn on_completed(&self, end: &StreamEnd) {
        let _ = end;
    }

    /// Cancellation was observed after `emitted` points.
    fn on_cancelled(&self, emitted: u32) {
        let _ = emitted;
    }

    /// The response channel rejected a send after `emitted` points.
    fn on_send_error(&self, emitted: u32) {
        let _ = emitted;
    }
}

/// Production observer: logs lifecycle events and records metrics.
pub struct TracingObserver;

impl StreamObserver for TracingObserver {
    fn on_start(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Lorenz stream started");
    }

    fn on_completed(&self, end: &StreamEnd) {
        record_iterations_per_stream(f64::from(end.emitted()));
        match end {
            StreamEnd::IterationBound { emitted: _emitted } => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    "Lorenz stream completed: iteration bound reached after {_emitted} points"
                );
            }
            StreamEnd::TimeBound { emitted: _emitted } => {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    "Lorenz stream completed: time bound reached after {_emitted} points"
                );
            }
        }
    }

    fn on_cancelled(&self, _emitted: u32) {
        // A client abort is a clean outcome, not a fault.
        #[cfg(feature = "tracing")]
        tracing::debug!("Lorenz stream cancelled by client after {_emitted} points");
    }

    fn on_send_error(&self, _emitted: u32) {
        increment_stream_errors();
        #[cfg(feature = "tracing")]
        tracing::warn!("Lorenz stream send failed after {_emitted} points");
    }
}
