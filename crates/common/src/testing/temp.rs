//! Temporary directory helper
//!
//! RAII wrapper for a scratch directory that is removed when dropped.

#![allow(clippy::missing_errors_doc)]

use std::path::{Path, PathBuf};
use std::{fs, io};

/// Temporary directory that is automatically deleted when dropped
///
/// # Examples
///
/// ```
/// use ferry_common::testing::temp::TempDir;
///
/// let temp_dir = TempDir::new("ferry-store").unwrap();
/// assert!(temp_dir.path().exists());
/// ```
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    /// Create a new temporary directory with a prefix
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir_name = format!("{}-{}", prefix, uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(dir_name);

        fs::create_dir_all(&path)?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `name` inside the directory. The file is not created.
    pub fn child(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create a file in the temporary directory
    pub fn create_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let file_path = self.path.join(name);
        fs::write(&file_path, contents)?;
        Ok(file_path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_removed_on_drop() {
        let dir = TempDir::new("ferry-temp").unwrap();
        let path = dir.path().to_path_buf();
        let file = dir.create_file("queue.json", "[]").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "[]");
        assert_eq!(dir.child("queue.json"), file);

        drop(dir);
        assert!(!path.exists());
    }
}
