//! Error types for the trajectory streaming service.
//!
//! This module defines the central `Error` enum, which captures every
//! terminal outcome of a stream that is not a normal completion. It
//! implements `From<Error>` for `tonic::Status` so errors propagate to
//! gRPC clients with the appropriate status codes.
//!
//! ## Error Cases
//! - `ChannelError`: the response channel rejected a send (client gone
//!   or transport failure).
//! - `RequestCancelled`: the client aborted the stream mid-flight.
//! - `InvalidRequest`: the request carried parameters the integrator
//!   cannot accept.
//! - `ServiceShutdown`: a request arrived while the service was
//!   shutting down.
//!
//! Defaulting and clamping of `dt`/`max_iterations` are normalization,
//! not faults, and never produce an error.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the trajectory streaming service.
///
/// Every variant is terminal for its stream: nothing is retried, and
/// any points already delivered remain delivered.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// The response channel could not accept a point.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The client aborted the stream. A clean outcome, not a fault.
    #[error("Stream cancelled by client")]
    RequestCancelled,

    /// The client request was invalid (non-finite parameters or a
    /// negative time step).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<lorenz::Error> for Error {
    fn from(err: lorenz::Error) -> Self {
        Error::InvalidRequest {
            reason: err.to_string(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::RequestCancelled => Status::cancelled("Stream was cancelled"),
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
