//! In-flight guard for form submissions
//!
//! A [`SubmitGate`] lets exactly one submission through at a time. The
//! returned [`SubmitPermit`] re-opens the gate when dropped, whatever the
//! outcome of the request. With a lock file attached, the gate also holds an
//! exclusive `fs2` lock so a second CLI process fails fast instead of
//! submitting a duplicate transfer.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fs2::FileExt;

use crate::domain::result::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct SubmitGate {
    busy: Arc<AtomicBool>,
    lock_path: Option<PathBuf>,
}

impl SubmitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that also serializes submissions across processes
    pub fn with_lock_file(path: impl AsRef<Path>) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            lock_path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Take the gate or fail with [`Error::InFlight`]
    pub fn try_acquire(&self) -> Result<SubmitPermit> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::InFlight);
        }

        let lock_file = match &self.lock_path {
            Some(path) => match Self::lock(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    self.busy.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            },
            None => None,
        };

        Ok(SubmitPermit {
            busy: Arc::clone(&self.busy),
            lock_file,
        })
    }

    fn lock(path: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(file),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(Error::InFlight),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Proof that the holder owns the gate; releases it on drop
#[derive(Debug)]
pub struct SubmitPermit {
    busy: Arc<AtomicBool>,
    lock_file: Option<File>,
}

impl Drop for SubmitPermit {
    fn drop(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
        }
        self.busy.store(false, Ordering::SeqCst);
    }
}
