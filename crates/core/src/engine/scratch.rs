//! Private scratch filesystem backing an engine instance.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

use super::error::EngineError;

/// A flat, per-engine directory removed when dropped.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates a fresh scratch directory under `root`.
    pub fn new_in(root: &Path) -> Result<Self, EngineError> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("mediaconv-")
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    /// Directory the engine runs in.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Resolves a scratch name to a path, rejecting anything but a plain file name.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, EngineError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !valid {
            return Err(EngineError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.dir.path().join(name))
    }

    pub async fn write(&self, name: &str, data: &[u8]) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        fs::write(&path, data).await?;
        Ok(())
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.resolve(name)?;
        fs::read(&path).await.map_err(|e| not_found_as(name, e))
    }

    pub async fn remove(&self, name: &str) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).await.map_err(|e| not_found_as(name, e))
    }
}

fn not_found_as(name: &str, e: std::io::Error) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::FileNotFound {
            name: name.to_string(),
        }
    } else {
        EngineError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_remove() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();

        scratch.write("input.jpg", b"jpeg bytes").await.unwrap();
        assert_eq!(scratch.read("input.jpg").await.unwrap(), b"jpeg bytes");

        scratch.write("input.jpg", b"other").await.unwrap();
        assert_eq!(scratch.read("input.jpg").await.unwrap(), b"other");

        scratch.remove("input.jpg").await.unwrap();
        assert!(matches!(
            scratch.read("input.jpg").await,
            Err(EngineError::FileNotFound { .. })
        ));
        assert!(matches!(
            scratch.remove("input.jpg").await,
            Err(EngineError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_path_names() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();

        for name in ["", ".", "..", "../escape.mp4", "sub/file.mp4", "a\\b"] {
            assert!(
                matches!(scratch.resolve(name), Err(EngineError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
        assert!(scratch.resolve("output.mp4").is_ok());
    }

    #[test]
    fn test_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchDir::new_in(root.path()).unwrap();
        let path = scratch.root().to_path_buf();
        assert!(path.exists());
        drop(scratch);
        assert!(!path.exists());
    }
}
