//! Development-environment bootstrapper for a Python web application.
//!
//! A run walks a fixed sequence of stages: validate the checkout, locate an
//! interpreter, prepare an isolated environment, install dependencies, write
//! default configuration, run the project's diagnostic, and launch the
//! server in the foreground. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (version parsing, probe folding,
//!   launch arguments, the `.env` template). No I/O.
//! - **[`io`]**: Side-effecting primitives (process execution, settings,
//!   atomic writes, progress output). Isolated to enable scripting in tests.
//!
//! Stage modules ([`locate`], [`environment`], [`install`], [`configure`],
//! [`health`], [`launch`]) combine the two, and [`pipeline`] sequences them.

pub mod configure;
pub mod core;
pub mod environment;
pub mod error;
pub mod exit_codes;
pub mod health;
pub mod install;
pub mod io;
pub mod launch;
pub mod locate;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
