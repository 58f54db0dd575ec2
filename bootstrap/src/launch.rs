//! Terminal launch of the application server.
//!
//! The server owns the foreground once started. The launcher prints where to
//! reach it, blocks until it exits, and never restarts it.

use std::ffi::OsString;
use std::net::{IpAddr, UdpSocket};

use tracing::{info, instrument};

use crate::core::launch_spec::{LaunchSpec, server_urls};
use crate::error::BootstrapError;
use crate::io::process::{CommandRunner, CommandSpec};
use crate::io::report::Reporter;

/// Start the server described by `spec` and wait for it to exit.
///
/// Returns the exit code (`None` when the server was stopped by a signal,
/// e.g. the operator pressing Ctrl-C). A spawn failure or non-zero exit is a
/// [`BootstrapError::Launch`].
#[instrument(skip_all, fields(executable = %spec.executable.display(), port))]
pub fn launch_server<R: CommandRunner>(
    runner: &R,
    spec: &LaunchSpec,
    host: &str,
    port: &str,
    env: Vec<(String, OsString)>,
    reporter: &mut Reporter,
) -> Result<Option<i32>, BootstrapError> {
    let (local, network) = server_urls(host, port, lan_address());
    reporter.info(format!("Local:   {local}"));
    reporter.info(format!("Network: {network}"));
    reporter.info("Press Ctrl-C to stop the server.");

    let command = CommandSpec::new(&spec.executable, &spec.workdir)
        .args(spec.args.iter().cloned())
        .envs(env);
    info!(command = %command.display(), "starting server");

    let launch_error = |reason: String| BootstrapError::Launch {
        port: port.to_string(),
        reason,
    };
    match runner.run_foreground(&command) {
        Ok(Some(0)) => Ok(Some(0)),
        Ok(None) => {
            info!("server stopped by signal");
            Ok(None)
        }
        Ok(Some(code)) => Err(launch_error(format!("exited with status {code}"))),
        Err(err) => Err(launch_error(format!("could not start: {err:#}"))),
    }
}

/// Best-effort LAN address: the local side of a UDP socket "connected" to a
/// public address. No packet is sent.
fn lan_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified() && !ip.is_loopback()).then_some(ip)
}
