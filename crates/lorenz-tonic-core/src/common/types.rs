//! # Shared simulation types and wire-contract constants
//!
//! Type aliases and constants shared by the server and any Rust
//! clients, so both sides agree on the normalization the server applies
//! before a stream starts.
//!
//! ## Type Aliases
//!
//! - [`Params`] - validated Lorenz parameters ([`lorenz::SimParams`])
//! - [`Simulation`] - per-stream integrator state
//!   ([`lorenz::SimulationState`])
//!
//! ## Constants
//!
//! - [`DEFAULT_DT`] - time step used when a request leaves `dt` unset
//! - [`DEFAULT_MAX_ITERATIONS`] - point count used when unset
//! - [`MAX_ITERATIONS_CEILING`] - hard clamp on requested point counts
//!
//! These are part of the observable contract: a request with `dt = 0`
//! behaves identically to one with `dt = DEFAULT_DT`, and a request
//! above the ceiling yields exactly the ceiling's worth of points.

pub use lorenz::{DEFAULT_DT, DEFAULT_MAX_ITERATIONS, MAX_ITERATIONS_CEILING};

/// Validated Lorenz system parameters used across the system.
pub type Params = lorenz::SimParams;

/// The per-stream integrator state owned by each stream task.
pub type Simulation = lorenz::SimulationState;
