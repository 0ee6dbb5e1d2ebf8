//! Common test utilities for media-dl end-to-end tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
