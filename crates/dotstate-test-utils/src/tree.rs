//! [`TestTree`] builder for capture and apply scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding a `source/` and a `dest/` directory.
///
/// # Example
///
/// ```rust,no_run
/// use dotstate_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.write_dest(".bashrc", "alias ll='ls -l'\n");
/// tree.assert_dest_contains(".bashrc", "alias");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create the temporary directory with empty `source/` and `dest/`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("source")).unwrap();
        fs::create_dir(temp_dir.path().join("dest")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root().join("source")
    }

    pub fn dest_dir(&self) -> PathBuf {
        self.root().join("dest")
    }

    /// Absolute path of `rel` under `dest/`.
    pub fn dest(&self, rel: &str) -> PathBuf {
        self.dest_dir().join(rel)
    }

    /// Absolute path of `rel` under `source/`.
    pub fn source(&self, rel: &str) -> PathBuf {
        self.source_dir().join(rel)
    }

    /// Write a destination file, creating parent directories.
    pub fn write_dest(&self, rel: &str, contents: &str) -> PathBuf {
        write(&self.dest(rel), contents)
    }

    /// Write a source file, creating parent directories.
    pub fn write_source(&self, rel: &str, contents: &str) -> PathBuf {
        write(&self.source(rel), contents)
    }

    pub fn mkdir_dest(&self, rel: &str) -> PathBuf {
        let path = self.dest(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn mkdir_source(&self, rel: &str) -> PathBuf {
        let path = self.source(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Create a destination symlink pointing at `target`.
    #[cfg(unix)]
    pub fn symlink_dest(&self, rel: &str, target: &str) -> PathBuf {
        let path = self.dest(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(target, &path).unwrap();
        path
    }

    /// Set permission bits on a path under the root.
    #[cfg(unix)]
    pub fn chmod(&self, path: &Path, perm: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(perm)).unwrap();
    }

    pub fn read_dest(&self, rel: &str) -> String {
        let path = self.dest(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    pub fn read_source(&self, rel: &str) -> String {
        let path = self.source(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Names directly under `source/<rel>`, sorted.
    pub fn list_source(&self, rel: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.source(rel))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// # Panics
    /// Panics if `dest/<rel>` does not exist (symlinks are not followed).
    pub fn assert_dest_exists(&self, rel: &str) {
        let path = self.dest(rel);
        assert!(
            path.symlink_metadata().is_ok(),
            "Expected path to exist: {}",
            path.display()
        );
    }

    /// # Panics
    /// Panics if `dest/<rel>` exists.
    pub fn assert_dest_missing(&self, rel: &str) {
        let path = self.dest(rel);
        assert!(
            path.symlink_metadata().is_err(),
            "Expected path NOT to exist: {}",
            path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_dest_contains(&self, rel: &str, content: &str) {
        let contents = self.read_dest(rel);
        assert!(
            contents.contains(content),
            "Expected {rel} to contain {content:?}, got {contents:?}"
        );
    }

    /// # Panics
    /// Panics if `source/<rel>` does not exist.
    pub fn assert_source_exists(&self, rel: &str) {
        let path = self.source(rel);
        assert!(path.exists(), "Expected source to exist: {}", path.display());
    }
}

fn write(path: &Path, contents: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    path.to_path_buf()
}
