//! HTTP implementation of the persistence backend.
//!
//! The one crate that talks to the outside world: every workflow
//! persistence call becomes a request against the clinic backend, and
//! every failure is classified into the engine's transport taxonomy.

mod http;

pub use http::HttpBackend;
