use std::path::PathBuf;

use tempfile::TempDir;

/// Write tracefile content into a fresh temporary directory, returning the
/// dir handle and the file path. The caller must hold onto `TempDir` to keep
/// the temp directory alive.
pub fn write_tracefile(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coverage.lcov");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
