#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can access the simulation core
// via `lorenz_tonic_core::lorenz`
pub use lorenz;

/// Generated protobuf/gRPC bindings for the `lorenz` package.
pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/lorenz.rs"));

    /// Serialized file descriptor set, registered by the server's
    /// reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        include_bytes!(concat!(env!("OUT_DIR"), "/lorenz_descriptor.bin"));
}
