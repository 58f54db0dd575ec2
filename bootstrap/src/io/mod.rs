//! I/O helpers for the bootstrap pipeline.

pub mod atomic;
pub mod context;
pub mod paths;
pub mod process;
pub mod report;
pub mod settings;
