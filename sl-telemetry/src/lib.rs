//! Tracing setup shared by semantic layer binaries and tests.

pub mod tracing;
