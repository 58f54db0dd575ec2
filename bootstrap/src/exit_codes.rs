//! Stable exit codes for the bootstrap CLI.

/// Pipeline finished (server exited cleanly or was interrupted), or help/version printed.
pub const OK: i32 = 0;
/// A gating stage failed, settings were invalid, or arguments could not be parsed.
pub const FAILURE: i32 = 1;
