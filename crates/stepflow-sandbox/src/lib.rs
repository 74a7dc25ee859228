//! Sandbox transport.
//!
//! The engine only sees the `SandboxClient` trait; this crate provides the
//! HTTP implementation that talks to the remote execution service.

pub mod http;

pub use http::HttpSandboxClient;
