//! Deterministic stand-ins for the remote sandbox plus workflow fixtures.

pub mod fake_sandbox;
pub mod fixtures;

pub use fake_sandbox::FakeSandbox;
