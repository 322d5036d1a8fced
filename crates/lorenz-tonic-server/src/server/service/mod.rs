//! gRPC service implementation.
//!
//! This module contains the client-facing entry point: request
//! validation and normalization, spawning the per-stream driver task,
//! and shutdown coordination.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`PhysicsService`).

pub mod handler;
