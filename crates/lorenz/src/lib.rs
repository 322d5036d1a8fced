#![doc = include_str!("../README.md")]

mod error;
mod params;
mod sim;

pub use crate::error::*;
pub use crate::params::*;
pub use crate::sim::*;
