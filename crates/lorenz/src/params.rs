use crate::{Error, Result};

/// Time step used when a request leaves `dt` unset (proto3 zero).
pub const DEFAULT_DT: f64 = 0.01;

/// Iteration count used when a request leaves `max_iterations` unset.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000;

/// Hard ceiling on the number of points a single stream may emit.
///
/// Requests above this are clamped silently so a single caller cannot
/// pin a stream task for an unbounded number of iterations.
pub const MAX_ITERATIONS_CEILING: u32 = 10_000;

/// Fixed starting position for every trajectory.
///
/// The origin is a fixed point of the Lorenz system (all derivatives
/// vanish there), so the seed must be displaced from it or the stream
/// would emit an all-zero sequence forever.
pub const INITIAL_POSITION: (f64, f64, f64) = (0.1, 0.0, 0.0);

/// Validated, normalized Lorenz system parameters.
///
/// Immutable for the lifetime of one stream: a `SimParams` is built
/// once from the incoming request, before the emission loop starts, and
/// the effective values never change afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
    pub dt: f64,
}

impl SimParams {
    /// Builds parameters from raw request values.
    ///
    /// `dt == 0.0` selects [`DEFAULT_DT`]; a negative or non-finite
    /// `dt` is rejected, as is any non-finite system parameter.
    pub fn new(sigma: f64, rho: f64, beta: f64, dt: f64) -> Result<Self> {
        for (name, value) in [("sigma", sigma), ("rho", rho), ("beta", beta)] {
            if !value.is_finite() {
                return Err(Error::NonFinite { name, value });
            }
        }

        let dt = if dt == 0.0 { DEFAULT_DT } else { dt };
        if !dt.is_finite() || dt <= 0.0 {
            return Err(Error::InvalidTimeStep { value: dt });
        }

        Ok(Self {
            sigma,
            rho,
            beta,
            dt,
        })
    }
}

/// Applies defaulting and clamping to a requested iteration count.
///
/// Zero selects [`DEFAULT_MAX_ITERATIONS`]; anything above
/// [`MAX_ITERATIONS_CEILING`] is clamped to the ceiling. Never fails.
pub fn effective_iterations(requested: u32) -> u32 {
    match requested {
        0 => DEFAULT_MAX_ITERATIONS,
        n => n.min(MAX_ITERATIONS_CEILING),
    }
}
