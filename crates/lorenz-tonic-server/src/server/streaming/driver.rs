use super::{observer::StreamObserver, pacer::Pacer};
use core::time::Duration;
use lorenz_tonic_core::{Error, proto::LorenzPoint, types::Simulation};
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// Bounds governing when a stream ends normally.
///
/// Both bounds are independent upper limits; whichever is reached first
/// ends the stream. `max_duration: None` leaves only the iteration
/// bound in force.
#[derive(Clone, Copy, Debug)]
pub struct StreamLimits {
    /// Effective (defaulted and clamped) number of points to emit.
    pub max_iterations: u32,
    /// Wall-clock budget measured from loop start.
    pub max_duration: Option<Duration>,
    /// Integration sub-steps folded into each emitted point.
    pub steps_per_frame: u32,
}

/// Normal completion of a stream. Not an error: the bound reached is a
/// successful end of stream, with every already-sent point delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// The iteration bound was reached.
    IterationBound { emitted: u32 },
    /// The wall-clock budget was exhausted first.
    TimeBound { emitted: u32 },
}

impl StreamEnd {
    /// Number of points emitted before the stream ended.
    pub fn emitted(&self) -> u32 {
        match *self {
            Self::IterationBound { emitted } | Self::TimeBound { emitted } => emitted,
        }
    }
}

/// Runs the emission loop for one stream.
///
/// Per iteration, in order: check the bounds, wait for the pacer,
/// advance the simulation by one frame, send the resulting point. Both
/// suspension points are interruptible by the cancellation token: the
/// pacing wait (also by closure of the response channel) and a
/// backpressured send, so a client disconnect or shutdown is observed
/// within one pacing period and surfaces as [`Error::RequestCancelled`].
/// A send that fails outright surfaces as [`Error::ChannelError`]. No
/// outcome is retried; a new stream always restarts from the fixed
/// seed.
///
/// The `sim` state is exclusively owned here - nothing is shared across
/// streams, and points leave in strict simulation-time order because
/// each step depends on the previous one.
pub async fn drive_stream<O: StreamObserver>(
    mut sim: Simulation,
    limits: StreamLimits,
    mut pacer: Pacer,
    resp_tx: mpsc::Sender<Result<LorenzPoint, Status>>,
    cancel: CancellationToken,
    observer: &O,
) -> Result<StreamEnd, Error> {
    observer.on_start();

    let started = Instant::now();
    let deadline = limits.max_duration.map(|budget| started + budget);
    let mut emitted: u32 = 0;

    while emitted < limits.max_iterations {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            let end = StreamEnd::TimeBound { emitted };
            observer.on_completed(&end);
            return Ok(end);
        }

        // Cancellation checks take priority over a pacing permit that
        // happens to be ready in the same poll.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                observer.on_cancelled(emitted);
                return Err(Error::RequestCancelled);
            }
            () = resp_tx.closed() => {
                // The receiving half is dropped when the client aborts
                // the call, so closure during pacing is a cancellation,
                // not a transport fault.
                observer.on_cancelled(emitted);
                return Err(Error::RequestCancelled);
            }
            () = pacer.pace() => {}
        }

        sim.advance_frame(limits.steps_per_frame);
        let (x, y, z) = sim.position();

        // A full channel parks the send, so it has to stay responsive
        // to the shutdown token as well.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                observer.on_cancelled(emitted);
                return Err(Error::RequestCancelled);
            }
            res = resp_tx.send(Ok(LorenzPoint { x, y, z })) => {
                if res.is_err() {
                    observer.on_send_error(emitted);
                    return Err(Error::ChannelError {
                        context: "response channel closed mid-send".to_string(),
                    });
                }
            }
        }
        emitted += 1;
    }

    let end = StreamEnd::IterationBound { emitted };
    observer.on_completed(&end);
    Ok(end)
}
