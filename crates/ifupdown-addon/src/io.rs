//! Raw file I/O for addons.
//!
//! Addons touch procfs/sysfs and generated config files through [`Io`] so
//! that a dry run can be honoured in one place.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AddonError, AddonResult};

/// Read/write primitives with optional dry-run.
#[derive(Debug, Clone, Default)]
pub struct Io {
    dry_run: bool,
    /// Writes skipped in dry-run mode, in order.
    skipped_writes: Vec<(PathBuf, String)>,
}

impl Io {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an `Io` that logs and records writes instead of performing them.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            skipped_writes: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Writes skipped because of dry-run mode.
    pub fn skipped_writes(&self) -> &[(PathBuf, String)] {
        &self.skipped_writes
    }

    /// Reads a whole file. A missing file yields `Ok(None)`.
    pub fn read_file(&self, path: &Path) -> AddonResult<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AddonError::io(path, e)),
        }
    }

    /// Reads the first line of a file, trimmed. Sysfs attributes are read
    /// this way.
    pub fn read_file_oneline(&self, path: &Path) -> AddonResult<Option<String>> {
        Ok(self
            .read_file(path)?
            .map(|content| content.lines().next().unwrap_or("").trim().to_string()))
    }

    /// Writes `content` to `path`, replacing what was there.
    pub fn write_to_file(&mut self, path: &Path, content: &str) -> AddonResult<()> {
        if self.dry_run {
            info!(path = %path.display(), content = %content, "[DRY RUN] Would write");
            self.skipped_writes
                .push((path.to_path_buf(), content.to_string()));
            return Ok(());
        }

        debug!(path = %path.display(), content = %content, "Writing file");
        std::fs::write(path, content).map_err(|e| AddonError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file() {
        let io = Io::new();
        assert_eq!(io.read_file(Path::new("/nonexistent/file")).unwrap(), None);
    }

    #[test]
    fn test_write_then_read_oneline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mtu");

        let mut io = Io::new();
        io.write_to_file(&path, "9000\n").unwrap();

        assert_eq!(io.read_file_oneline(&path).unwrap().as_deref(), Some("9000"));
        assert_eq!(io.read_file(&path).unwrap().as_deref(), Some("9000\n"));
    }

    #[test]
    fn test_read_oneline_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, "").unwrap();

        assert_eq!(Io::new().read_file_oneline(&path).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_dry_run_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mtu");

        let mut io = Io::dry_run();
        io.write_to_file(&path, "9000").unwrap();

        assert!(io.is_dry_run());
        assert!(!path.exists());
        assert_eq!(io.skipped_writes(), &[(path, "9000".to_string())]);
    }

    #[test]
    fn test_write_error_carries_path() {
        let mut io = Io::new();
        let err = io
            .write_to_file(Path::new("/nonexistent/dir/file"), "x")
            .unwrap_err();
        assert!(matches!(err, AddonError::Io { .. }));
    }
}
