//! The paced emission loop and its collaborators.
//!
//! - [`driver`] - per-stream loop: bounds, pacing, integration, send
//! - [`pacer`] - capacity-1 rate limiter governing emission
//! - [`observer`] - lifecycle event sink injected into the driver

pub mod driver;
pub mod observer;
pub mod pacer;
