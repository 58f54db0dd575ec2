//! Bootstrap settings stored in `bootstrap.toml` at the project root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::version::SemanticVersion;

pub const SETTINGS_FILE: &str = "bootstrap.toml";

/// Bootstrap settings (TOML).
///
/// The file is optional and intended to be edited by humans. Missing fields
/// default to the layout of a standard project checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapSettings {
    pub runtime: RuntimeSettings,
    pub paths: PathSettings,
    pub install: InstallSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Interpreter commands in priority order, most specific first.
    pub candidates: Vec<String>,
    pub min_version: SemanticVersion,
    /// Upper bound for each `--version` probe.
    pub probe_timeout_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            candidates: [
                "python3.13",
                "python3.12",
                "python3.11",
                "python3",
                "python",
            ]
            .map(String::from)
            .to_vec(),
            min_version: SemanticVersion::new(3, 11, 0),
            probe_timeout_secs: 10,
        }
    }
}

/// Project-relative locations (absolute paths are accepted as-is).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathSettings {
    pub environment_dir: PathBuf,
    pub manifest: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub health_check: PathBuf,
    pub app_entry: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            environment_dir: PathBuf::from(".venv"),
            manifest: PathBuf::from("requirements.txt"),
            config_file: PathBuf::from(".env"),
            data_dir: PathBuf::from("data"),
            health_check: PathBuf::from("sanity_check.py"),
            app_entry: PathBuf::from("app/main.py"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallSettings {
    /// Development tooling installed on every run, regardless of `--force`.
    pub dev_packages: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            dev_packages: ["pytest", "pytest-cov", "black", "isort", "flake8", "mypy"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    /// ASGI application target passed to uvicorn.
    pub app: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            app: "app.main:app".to_string(),
        }
    }
}

impl BootstrapSettings {
    pub fn validate(&self) -> Result<()> {
        if self.runtime.candidates.is_empty() {
            return Err(anyhow!("runtime.candidates must be a non-empty array"));
        }
        if has_blank(&self.runtime.candidates) {
            return Err(anyhow!("runtime.candidates must not contain blank entries"));
        }
        if self.runtime.probe_timeout_secs == 0 {
            return Err(anyhow!("runtime.probe_timeout_secs must be > 0"));
        }
        if has_blank(&self.install.dev_packages) {
            return Err(anyhow!("install.dev_packages must not contain blank entries"));
        }
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("server.host must not be empty"));
        }
        if self.server.app.trim().is_empty() {
            return Err(anyhow!("server.app must not be empty"));
        }
        // `--force` removes this directory recursively.
        if !is_strict_subpath(&self.paths.environment_dir) {
            return Err(anyhow!(
                "paths.environment_dir must be a relative path below the project root (got '{}')",
                self.paths.environment_dir.display()
            ));
        }
        Ok(())
    }
}

/// True for a relative path that names something strictly inside its base.
fn has_blank(values: &[String]) -> bool {
    values.iter().any(|value| value.trim().is_empty())
}

fn is_strict_subpath(path: &Path) -> bool {
    let mut depth = 0i32;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `BootstrapSettings::default()`.
pub fn load_settings(path: &Path) -> Result<BootstrapSettings> {
    if !path.exists() {
        let settings = BootstrapSettings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: BootstrapSettings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join(SETTINGS_FILE)).expect("load");
        assert_eq!(settings, BootstrapSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            "[runtime]\ncandidates = [\"python3.12\"]\nmin_version = \"3.12\"\n\n[server]\nhost = \"127.0.0.1\"\n",
        )
        .expect("write");

        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.runtime.candidates, vec!["python3.12"]);
        assert_eq!(settings.runtime.min_version, SemanticVersion::new(3, 12, 0));
        assert_eq!(settings.runtime.probe_timeout_secs, 10);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.app, "app.main:app");
        assert_eq!(settings.paths, PathSettings::default());
    }

    #[test]
    fn invalid_min_version_fails_to_parse() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "[runtime]\nmin_version = \"latest\"\n").expect("write");
        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid version"));
    }

    #[test]
    fn empty_candidates_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "[runtime]\ncandidates = []\n").expect("write");
        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("runtime.candidates"));
    }

    #[test]
    fn environment_dir_must_stay_inside_project() {
        for bad in [".", "", "..", "../elsewhere", "a/../..", "/tmp/venv"] {
            let settings = BootstrapSettings {
                paths: PathSettings {
                    environment_dir: PathBuf::from(bad),
                    ..PathSettings::default()
                },
                ..BootstrapSettings::default()
            };
            assert!(settings.validate().is_err(), "{bad:?} should be rejected");
        }
        for good in [".venv", "./env", "build/venv"] {
            let settings = BootstrapSettings {
                paths: PathSettings {
                    environment_dir: PathBuf::from(good),
                    ..PathSettings::default()
                },
                ..BootstrapSettings::default()
            };
            assert!(settings.validate().is_ok(), "{good:?} should be accepted");
        }
    }
}
