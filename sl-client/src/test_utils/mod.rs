//! Testing utilities for the semantic layer clients.
//!
//! - [`arrow`] builds record batches and encodes them the way the server does.
//! - [`metadata`] provides a scripted metadata server behind a [`crate::transport::MetadataTransport`].
//! - [`columnar`] provides a scripted [`crate::transport::ColumnarTransport`].
//! - [`config`] builds client configurations pointing at a fake host.

pub mod arrow;
pub mod columnar;
pub mod config;
pub mod metadata;
