//! All-or-nothing file replacement.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Atomically write `contents` to `path` (temp file + rename).
///
/// Readers observe either the previous file or the complete new one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = temp_sibling(path)?;
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace {}", path.display()));
    }
    Ok(())
}

/// `<name>.tmp` next to `path`; never collides with `path` itself.
fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file_and_leaves_no_temp() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".env");
        fs::write(&path, "OLD=1\n").expect("seed");

        write_atomic(&path, "NEW=2\n").expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "NEW=2\n");
        assert!(!temp.path().join(".env.tmp").exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config").join("app.env");
        write_atomic(&path, "A=1\n").expect("write");
        assert!(path.is_file());
    }
}
