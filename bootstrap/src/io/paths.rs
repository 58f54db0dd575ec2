//! Canonical project paths.

use std::path::{Path, PathBuf};

use super::settings::{PathSettings, SETTINGS_FILE};

/// All paths the pipeline touches, resolved against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub settings_path: PathBuf,
    pub environment_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub health_check_path: PathBuf,
    pub app_entry_path: PathBuf,
    /// `data_dir` as written in settings, used inside the rendered `.env`.
    pub data_dir_relative: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, layout: &PathSettings) -> Self {
        let root = root.into();
        Self {
            settings_path: root.join(SETTINGS_FILE),
            environment_dir: root.join(&layout.environment_dir),
            manifest_path: root.join(&layout.manifest),
            config_path: root.join(&layout.config_file),
            data_dir: root.join(&layout.data_dir),
            health_check_path: root.join(&layout.health_check),
            app_entry_path: root.join(&layout.app_entry),
            data_dir_relative: layout.data_dir.clone(),
            root,
        }
    }
}

/// Directory holding executables inside an isolated environment.
pub fn environment_bin_dir(environment_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        environment_dir.join("Scripts")
    } else {
        environment_dir.join("bin")
    }
}

/// The environment's own interpreter.
pub fn environment_interpreter(environment_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        environment_bin_dir(environment_dir).join("python.exe")
    } else {
        environment_bin_dir(environment_dir).join("python")
    }
}
