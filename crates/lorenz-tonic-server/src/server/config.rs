//! CLI/environment configuration for the streaming server.
//!
//! Arguments are parsed with `clap` (each flag also reads an
//! environment variable, optionally loaded from `.env` via `dotenvy`)
//! and then validated into a [`ServerConfig`]. Validation happens once
//! at startup; the rest of the server only ever sees effective values.

use core::time::Duration;

use clap::Parser;
use lorenz_tonic_core::Error;

/// Raw command-line arguments, prior to validation.
#[derive(Parser, Debug)]
#[command(name = "lorenz-tonic-server", about = "Streams paced Lorenz-attractor trajectories over gRPC")]
pub struct CliArgs {
    /// Listen address: a `host:port` pair, or a socket path with `--uds`.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:50051")]
    pub server_addr: String,

    /// Bind a Unix domain socket instead of TCP.
    #[arg(long, env = "UDS", default_value_t = false)]
    pub uds: bool,

    /// Target emission rate per stream, in points per second.
    #[arg(long, env = "TARGET_HZ", default_value_t = 180)]
    pub target_hz: u32,

    /// Integration sub-steps per emitted point.
    #[arg(long, env = "STEPS_PER_FRAME", default_value_t = 1)]
    pub steps_per_frame: u32,

    /// Wall-clock ceiling for a single stream, in seconds. 0 disables
    /// the time bound, leaving only the iteration bound.
    #[arg(long, env = "MAX_STREAM_SECS", default_value_t = 40)]
    pub max_stream_secs: u64,

    /// Capacity of the per-stream response channel.
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 32)]
    pub stream_buffer_size: usize,

    /// How long graceful shutdown waits for in-flight streams to drain,
    /// in seconds.
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 3)]
    pub shutdown_timeout_secs: u64,
}

/// Validated server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub target_hz: u32,
    pub steps_per_frame: u32,
    /// `None` when the time bound is disabled.
    pub max_stream_duration: Option<Duration>,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.target_hz == 0 {
            return Err(Error::InvalidRequest {
                reason: "target-hz must be greater than 0".to_string(),
            });
        }
        if args.steps_per_frame == 0 {
            return Err(Error::InvalidRequest {
                reason: "steps-per-frame must be greater than 0".to_string(),
            });
        }
        if args.stream_buffer_size == 0 {
            return Err(Error::InvalidRequest {
                reason: "stream-buffer-size must be greater than 0".to_string(),
            });
        }

        let max_stream_duration = match args.max_stream_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            target_hz: args.target_hz,
            steps_per_frame: args.steps_per_frame,
            max_stream_duration,
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout_secs),
        })
    }
}
