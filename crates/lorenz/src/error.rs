pub type Result<T> = core::result::Result<T, Error>;

/// Parameter validation errors.
///
/// Absent or zero values are *normalized* (replaced by defaults or
/// clamped), never rejected; only values that would break the
/// integrator's invariants are errors.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A system parameter was NaN or infinite.
    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// The time step was negative or non-finite (zero means "use the
    /// default" and is not an error).
    #[error("time step must be positive, got {value}")]
    InvalidTimeStep { value: f64 },
}
