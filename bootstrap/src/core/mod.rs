//! Deterministic, pure logic shared by the bootstrap pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod env_template;
pub mod launch_spec;
pub mod probe;
pub mod types;
pub mod version;
