//! Shared primitives for the voxhost crates.
//!
//! Everything here is dependency-free so that `models`, `host-core` and the
//! binary can all report errors in the same shape.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
