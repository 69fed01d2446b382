//! Scrubbed temporary files.
//!
//! OCR scratch images may carry page content, so they are overwritten
//! with zeros before being unlinked on every exit path.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// Overwrite a file's contents with zeros, then unlink it.
///
/// Best effort: if the overwrite fails the file is still unlinked.
pub fn secure_delete(path: &Path) -> std::io::Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Ok(()),
    };

    let zeroed = (|| -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new().write(true).open(path)?;
        let mut remaining = metadata.len();
        let block = [0u8; 8192];
        while remaining > 0 {
            let n = remaining.min(block.len() as u64) as usize;
            file.write_all(&block[..n])?;
            remaining -= n as u64;
        }
        file.sync_all()
    })();

    if let Err(e) = zeroed {
        debug!("overwrite before delete failed: {}", e);
    }

    fs::remove_file(path)
}

/// A temp directory whose files are zero-overwritten before removal.
///
/// Dropping the wrapper scrubs every regular file it contains, then
/// lets the underlying directory cleanup run.
pub struct ScrubbedTempDir {
    inner: Option<TempDir>,
}

impl ScrubbedTempDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            inner: Some(TempDir::with_prefix("rqc-")?),
        })
    }

    pub fn path(&self) -> &Path {
        self.inner
            .as_ref()
            .expect("directory alive until drop")
            .path()
    }

    fn scrub(&self) {
        let Some(dir) = self.inner.as_ref() else {
            return;
        };
        let entries = match fs::read_dir(dir.path()) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path: PathBuf = entry.path();
            if path.is_file() {
                let _ = secure_delete(&path);
            }
        }
    }
}

impl Drop for ScrubbedTempDir {
    fn drop(&mut self) {
        self.scrub();
        // TempDir's own drop removes the (now empty) directory.
        self.inner.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.png");
        fs::write(&path, b"sensitive bytes").unwrap();
        secure_delete(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn secure_delete_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        secure_delete(&dir.path().join("never-existed")).unwrap();
    }

    #[test]
    fn scrubbed_dir_removes_contents_on_drop() {
        let path;
        {
            let scratch = ScrubbedTempDir::new().unwrap();
            path = scratch.path().to_path_buf();
            fs::write(path.join("page-01.png"), b"raster").unwrap();
            assert!(path.join("page-01.png").exists());
        }
        assert!(!path.exists());
    }
}
