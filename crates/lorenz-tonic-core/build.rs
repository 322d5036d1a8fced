//! Builds the gRPC client and server code for the `lorenz.proto`
//! definition using `tonic-prost-build`.
//!
//! Besides the message and service bindings, this emits a serialized
//! file descriptor set into `OUT_DIR` so the server can register a
//! reflection service from the same schema it serves.

use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("lorenz_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/lorenz.proto"], &["proto"])
        .unwrap();
}
