//! File-based locking for a backup root.
//!
//! Cross-platform (fs2) advisory lock:
//! - Exclusive, non-blocking: a second snapshot run against the same backup root
//!   fails fast instead of interleaving writes into the shared asset pool.
//!
//! Lock file path: <backup_root>/.savesnap.lock
//! Lock is released on Drop.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::RUN_LOCK_FILE;

pub struct RunLock {
    file: std::fs::File,
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // fs2 unlock errors on drop are ignored deliberately.
        let _ = self.file.unlock();
    }
}

fn lock_file_path(root: &Path) -> PathBuf {
    root.join(RUN_LOCK_FILE)
}

/// Try to take the exclusive run lock. Returns Err if another run holds it.
pub fn try_lock_backup_root(root: &Path) -> Result<RunLock> {
    let path = lock_file_path(root);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))?;
    file.try_lock_exclusive().with_context(|| {
        format!(
            "another snapshot run holds {} (try_lock_exclusive failed)",
            path.display()
        )
    })?;
    Ok(RunLock { file, path })
}
