//! External media provider
//!
//! The provider is an opaque capability: it resolves metadata for a URL and
//! opens a byte stream for it. Everything provider-specific lives behind the
//! [`MediaProvider`] trait.
//!
//! - [`HttpProvider`]: talks to an HTTP extraction service

mod http;
mod traits;

pub use http::HttpProvider;
pub use traits::{MediaProvider, MediaStream, ProviderMetadata};
