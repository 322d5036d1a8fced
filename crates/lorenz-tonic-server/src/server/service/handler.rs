//! gRPC service implementation for paced trajectory streaming.
//!
//! This module defines [`PhysicsService`], the concrete implementation
//! of the [`Physics`] gRPC service defined in `lorenz.proto`.
//! Each `StreamLorenz` request gets a dedicated tokio
//! task that owns one simulation state and runs the emission loop;
//! nothing mutable is shared between streams.
//!
//! ## Responsibilities
//!
//! - Validate and normalize incoming `StreamLorenz` requests.
//! - Spawn the per-stream driver with its pacer, bounds, and
//!   cancellation token.
//! - Track in-flight streams for graceful shutdown.

use crate::server::{
    config::ServerConfig,
    streaming::{
        driver::{StreamLimits, drive_stream},
        observer::TracingObserver,
        pacer::Pacer,
    },
    telemetry::{
        decrement_streams_inflight, increment_points_emitted, increment_requests,
        increment_stream_errors, increment_streams_inflight, record_stream_duration,
    },
};
use core::pin::Pin;
use futures::TryStreamExt;
use lorenz_tonic_core::{
    Error,
    lorenz::effective_iterations,
    proto::{LorenzPoint, LorenzRequest, physics_server::Physics},
    types::{Params, Simulation},
};
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

/// gRPC service streaming paced Lorenz-attractor trajectories.
///
/// Implements the [`Physics`] service defined in the protobuf schema.
/// Each stream is an independent execution context: the simulation
/// state is created at the fixed seed for every request and dropped
/// when the stream ends, so concurrent streams never interfere.
#[derive(Clone)]
pub struct PhysicsService {
    config: ServerConfig,
    /// Cancelled as the final phase of shutdown; every stream holds a
    /// child token, so cancelling here stops all remaining drivers.
    shutdown: CancellationToken,
    /// Streams currently being driven, polled by the shutdown drain.
    streams_inflight: Arc<AtomicUsize>,
    /// Set as the first phase of shutdown to refuse new streams while
    /// in-flight ones drain.
    draining: Arc<portable_atomic::AtomicBool>,
}

impl PhysicsService {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
            streams_inflight: Arc::new(AtomicUsize::new(0)),
            draining: Arc::new(portable_atomic::AtomicBool::new(false)),
        }
    }

    /// Initiates a graceful shutdown.
    ///
    /// New requests are refused immediately; in-flight streams get up
    /// to the configured drain timeout to finish on their own, after
    /// which the shared token is cancelled and the remaining drivers
    /// observe it at their next pacing checkpoint.
    pub async fn shutdown(&self) -> Result<(), Error> {
        // === Phase 1: Refuse new requests ===
        self.draining.store(true, Ordering::Release);

        // === Phase 2: Wait for in-flight streams to drain ===
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Draining in-flight streams ({} active)",
            self.streams_inflight.load(Ordering::Acquire)
        );
        let drain_result = timeout(self.config.shutdown_timeout, async {
            while self.streams_inflight.load(Ordering::Acquire) > 0 {
                sleep(core::time::Duration::from_millis(100)).await;
            }
        })
        .await;

        if drain_result.is_err() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.streams_inflight.load(Ordering::Acquire)
            );
        }

        // === Phase 3: Cancel whatever is left ===
        self.shutdown.cancel();
        Ok(())
    }
}

#[tonic::async_trait]
impl Physics for PhysicsService {
    type StreamLorenzStream = Pin<Box<dyn Stream<Item = Result<LorenzPoint, Status>> + Send>>;

    /// Handles a streaming trajectory request.
    ///
    /// Normalizes the request (`dt`/`max_iterations` defaulting and
    /// clamping), then spawns the driver task and hands the receiving
    /// half of its channel back to tonic. Cancellation by the caller
    /// drops that receiver, which the driver observes within one pacing
    /// period.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(
        sigma = req.get_ref().sigma,
        rho = req.get_ref().rho,
        beta = req.get_ref().beta,
    )))]
    async fn stream_lorenz(
        &self,
        req: Request<LorenzRequest>,
    ) -> Result<Response<Self::StreamLorenzStream>, Status> {
        if self.draining.load(Ordering::Acquire) || self.shutdown.is_cancelled() {
            return Err(Error::ServiceShutdown.into());
        }

        let start = std::time::Instant::now();
        let req = req.into_inner();

        // Normalization is applied once, before the loop starts; only
        // genuinely unusable values are errors.
        let params = Params::new(req.sigma, req.rho, req.beta, req.dt)
            .map_err(Error::from)
            .map_err(|e| {
                increment_stream_errors();
                Status::from(e)
            })?;
        let limits = StreamLimits {
            max_iterations: effective_iterations(req.max_iterations),
            max_duration: self.config.max_stream_duration,
            steps_per_frame: self.config.steps_per_frame,
        };

        increment_requests();
        increment_streams_inflight();
        self.streams_inflight.fetch_add(1, Ordering::AcqRel);

        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<LorenzPoint, Status>>(self.config.stream_buffer_size);

        let sim = Simulation::new(params);
        let pacer = Pacer::new(self.config.target_hz);
        let cancel = self.shutdown.child_token();
        let inflight = Arc::clone(&self.streams_inflight);

        let fut = async move {
            let res =
                drive_stream(sim, limits, pacer, resp_tx.clone(), cancel, &TracingObserver).await;
            inflight.fetch_sub(1, Ordering::AcqRel);
            decrement_streams_inflight();
            record_stream_duration(start.elapsed().as_millis() as f64);
            if let Err(e) = res {
                #[cfg(feature = "tracing")]
                tracing::debug!("Stream ended early: {e}");
                // Surface the terminal error to the client. Best
                // effort: on a client abort the receiver is already
                // gone and this send simply fails.
                if let Err(_e) = resp_tx.send(Err(e.into())).await {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Client gone before terminal error could be sent: {_e}");
                }
            }
        };
        #[cfg(feature = "tracing")]
        let fut = {
            use tracing::Instrument;
            fut.instrument(tracing::info_span!("streaming"))
        };

        tokio::spawn(fut);

        let stream = ReceiverStream::new(resp_rx)
            .inspect_ok(|_point| {
                increment_points_emitted(1);
            })
            .inspect_err(move |_e| {
                increment_stream_errors();
            });

        Ok(Response::new(Box::pin(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use futures::StreamExt;
    use lorenz_tonic_core::lorenz::{
        DEFAULT_MAX_ITERATIONS, MAX_ITERATIONS_CEILING, SimParams, SimulationState,
    };

    fn test_config() -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".to_string(),
            uds: false,
            target_hz: 500,
            steps_per_frame: 1,
            max_stream_duration: None,
            stream_buffer_size: 32,
            shutdown_timeout: Duration::from_millis(200),
        }
    }

    fn request(sigma: f64, rho: f64, beta: f64, dt: f64, max_iterations: u32) -> LorenzRequest {
        LorenzRequest {
            sigma,
            rho,
            beta,
            dt,
            max_iterations,
        }
    }

    async fn collect(
        service: &PhysicsService,
        req: LorenzRequest,
    ) -> Result<Vec<LorenzPoint>, Status> {
        let resp = service.stream_lorenz(Request::new(req)).await?;
        let mut stream = resp.into_inner();
        let mut points = Vec::new();
        while let Some(item) = stream.next().await {
            points.push(item?);
        }
        Ok(points)
    }

    async fn expect_status(service: &PhysicsService, req: LorenzRequest) -> Status {
        match service.stream_lorenz(Request::new(req)).await {
            Ok(_) => panic!("expected the request to be rejected"),
            Err(status) => status,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn streams_the_requested_number_of_points() {
        let service = PhysicsService::new(test_config());
        let points = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 7))
            .await
            .unwrap();
        assert_eq!(points.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_dt_behaves_like_the_default() {
        let service = PhysicsService::new(test_config());
        let defaulted = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.0, 3))
            .await
            .unwrap();
        let explicit = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 3))
            .await
            .unwrap();

        for (a, b) in defaulted.iter().zip(&explicit) {
            assert_eq!((a.x, a.y, a.z), (b.x, b.y, b.z));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_iterations_selects_the_default_bound() {
        let service = PhysicsService::new(test_config());
        let points = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 0))
            .await
            .unwrap();
        assert_eq!(points.len(), DEFAULT_MAX_ITERATIONS as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_above_the_ceiling_are_clamped() {
        let service = PhysicsService::new(test_config());
        let points = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 50_000))
            .await
            .unwrap();
        assert_eq!(points.len(), MAX_ITERATIONS_CEILING as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_requests_are_bit_identical() {
        let service = PhysicsService::new(test_config());
        let first = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 50))
            .await
            .unwrap();
        let second = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 50))
            .await
            .unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
            assert_eq!(a.z.to_bits(), b.z.to_bits());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn points_match_a_locally_run_integrator() {
        let service = PhysicsService::new(test_config());
        let points = collect(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 10))
            .await
            .unwrap();

        let params = SimParams::new(10.0, 28.0, 8.0 / 3.0, 0.01).unwrap();
        let mut reference = SimulationState::new(params);
        for point in &points {
            reference.advance();
            let (x, y, z) = reference.position();
            assert_eq!((point.x, point.y, point.z), (x, y, z));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_parameters_are_rejected() {
        let service = PhysicsService::new(test_config());
        let status = expect_status(&service, request(f64::NAN, 28.0, 8.0 / 3.0, 0.01, 10)).await;
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_dt_is_rejected() {
        let service = PhysicsService::new(test_config());
        let status = expect_status(&service, request(10.0, 28.0, 8.0 / 3.0, -1.0, 10)).await;
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_refuses_new_streams() {
        let service = PhysicsService::new(test_config());
        service.shutdown().await.unwrap();

        let status = expect_status(&service, request(10.0, 28.0, 8.0 / 3.0, 0.01, 10)).await;
        assert_eq!(status.code(), tonic::Code::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_streams_that_outlive_the_drain() {
        let mut config = test_config();
        config.target_hz = 1; // one point per second: the drain will time out
        let service = PhysicsService::new(config);

        let resp = service
            .stream_lorenz(Request::new(request(10.0, 28.0, 8.0 / 3.0, 0.01, 10_000)))
            .await
            .unwrap();
        let mut stream = resp.into_inner();
        // First point arrives immediately; the rest are a second apart.
        stream.next().await.unwrap().unwrap();

        service.shutdown().await.unwrap();

        // The driver observed the token and stopped early; the stream
        // terminates without delivering all 10000 points.
        let mut rest = 0usize;
        while let Some(item) = stream.next().await {
            if item.is_err() {
                break;
            }
            rest += 1;
        }
        assert!(rest < 10_000);
    }
}
