//! Filesystem primitives for writing node trees.
//!
//! Every helper returns the raw `std::io::Error`; callers attach the
//! participant and artifact context.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Owner read-only. Staking material is locked down to this after writing.
pub const READ_ONLY_MODE: u32 = 0o400;

/// Create `path` and any missing parents.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Write `contents` to `path`, replacing any previous file.
///
/// A failed write removes whatever was left behind, so a retry never trips
/// over a truncated file.
pub fn write_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    if let Err(err) = fs::write(path, contents) {
        let _ = fs::remove_file(path);
        return Err(err);
    }
    Ok(())
}

/// Restrict `path` to owner read-only.
pub fn set_read_only<P: AsRef<Path>>(path: P) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(READ_ONLY_MODE))
    }

    #[cfg(not(unix))]
    {
        let path = path.as_ref();
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_readonly(true);
        fs::set_permissions(path, permissions)
    }
}

/// Write `contents` next to `path` and rename it into place.
///
/// Readers see either the previous file or the complete new one.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let staging = staging_path(path);

    write_file(&staging, contents)?;
    fs::rename(&staging, path).map_err(|err| {
        let _ = fs::remove_file(&staging);
        err
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        write_file(&path, b"first").unwrap();
        write_file(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_write_file_into_missing_dir_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("staker.crt");

        assert!(write_file(&path, b"cert").is_err());
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_set_read_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("staker.key");
        write_file(&path, b"key").unwrap();

        set_read_only(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, READ_ONLY_MODE);
    }

    #[test]
    fn test_write_atomic_removes_staging_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docker-compose.yml");

        write_atomic(&path, b"version: '3'\n").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"version: '3'\n");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_ensure_dir_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("c");

        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();

        assert!(nested.is_dir());
    }
}
