//! Server invocation construction.

use std::net::{IpAddr, Ipv6Addr};
use std::path::{Path, PathBuf};

use super::types::{EnvironmentMode, RunOptions};

/// Fully resolved server invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub workdir: PathBuf,
}

/// Where the server binds and what it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget<'a> {
    /// ASGI application path, e.g. `app.main:app`.
    pub app: &'a str,
    pub host: &'a str,
}

/// Build the server argument vector for `options`.
///
/// Development always carries `--reload` and debug logging; production never
/// carries `--reload` and logs at info.
pub fn build_launch_spec(
    interpreter: &Path,
    workdir: &Path,
    target: &ServerTarget<'_>,
    options: &RunOptions,
) -> LaunchSpec {
    let mut args = vec![
        "-m".to_string(),
        "uvicorn".to_string(),
        target.app.to_string(),
        "--host".to_string(),
        target.host.to_string(),
        "--port".to_string(),
        options.port.clone(),
    ];
    match options.environment {
        EnvironmentMode::Development => {
            args.extend(["--log-level", "debug", "--reload"].map(String::from));
        }
        EnvironmentMode::Production => {
            args.extend(["--log-level", "info"].map(String::from));
        }
    }
    LaunchSpec {
        executable: interpreter.to_path_buf(),
        args,
        workdir: workdir.to_path_buf(),
    }
}

/// Local and network URLs printed before launch.
///
/// The network URL uses the machine's LAN address when known, otherwise the
/// bind host. IPv6 hosts are bracketed.
pub fn server_urls(host: &str, port: &str, lan_ip: Option<IpAddr>) -> (String, String) {
    let local = format!("http://localhost:{port}");
    let network_host = match lan_ip {
        Some(IpAddr::V6(ip)) => format!("[{ip}]"),
        Some(ip) => ip.to_string(),
        None if host.parse::<Ipv6Addr>().is_ok() => format!("[{host}]"),
        None => host.to_string(),
    };
    (local, format!("http://{network_host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const TARGET: ServerTarget<'static> = ServerTarget {
        app: "app.main:app",
        host: "0.0.0.0",
    };

    fn options(environment: EnvironmentMode) -> RunOptions {
        RunOptions {
            port: "9001".to_string(),
            environment,
            ..RunOptions::default()
        }
    }

    #[test]
    fn development_enables_reload_and_debug_logging() {
        let spec = build_launch_spec(
            Path::new(".venv/bin/python"),
            Path::new("/srv/app"),
            &TARGET,
            &options(EnvironmentMode::Development),
        );
        assert_eq!(spec.executable, PathBuf::from(".venv/bin/python"));
        assert_eq!(spec.workdir, PathBuf::from("/srv/app"));
        assert_eq!(
            spec.args,
            vec![
                "-m",
                "uvicorn",
                "app.main:app",
                "--host",
                "0.0.0.0",
                "--port",
                "9001",
                "--log-level",
                "debug",
                "--reload"
            ]
        );
    }

    #[test]
    fn production_never_reloads() {
        let spec = build_launch_spec(
            Path::new("python3"),
            Path::new("."),
            &TARGET,
            &options(EnvironmentMode::Production),
        );
        assert!(!spec.args.iter().any(|arg| arg == "--reload"));
        let args = &spec.args;
        let level = args.iter().position(|arg| arg == "--log-level");
        assert_eq!(level.map(|i| args[i + 1].as_str()), Some("info"));
    }

    #[test]
    fn urls_prefer_lan_address() {
        let lan = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        let (local, network) = server_urls("0.0.0.0", "8000", Some(lan));
        assert_eq!(local, "http://localhost:8000");
        assert_eq!(network, "http://192.168.1.20:8000");

        let (_, fallback) = server_urls("0.0.0.0", "8000", None);
        assert_eq!(fallback, "http://0.0.0.0:8000");
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let (_, wildcard) = server_urls("::", "8000", None);
        assert_eq!(wildcard, "http://[::]:8000");

        let lan = IpAddr::V6("fd00::20".parse().expect("ipv6"));
        let (_, network) = server_urls("::", "8000", Some(lan));
        assert_eq!(network, "http://[fd00::20]:8000");
    }
}
