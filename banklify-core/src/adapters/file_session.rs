//! File-backed session storage
//!
//! Stores the session as `session.json` in the data directory. Writes go
//! through a temp file + rename under an exclusive `fs2` lock so two CLI
//! processes never interleave a half-written session. On Unix the file is
//! created with mode 0600 since it holds a bearer token.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::Result;
use crate::domain::Session;
use crate::ports::SessionStorage;

pub const SESSION_FILENAME: &str = "session.json";
const LOCK_FILENAME: &str = "session.lock";

#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(banklify_dir: &Path) -> Self {
        Self {
            path: banklify_dir.join(SESSION_FILENAME),
            lock_path: banklify_dir.join(LOCK_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn open_private(path: &Path) -> std::io::Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(path)
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Session>> {
        // missing, unreadable or corrupt all mean "logged out"
        let Ok(content) = fs::read(&self.path) else {
            return Ok(None);
        };
        let session = serde_json::from_slice::<Session>(&content)
            .ok()
            .filter(|s| s.credential.is_some());
        Ok(session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock = self.lock()?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = Self::open_private(&tmp_path)?;
        file.write_all(serde_json::to_string_pretty(session)?.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &self.path)?;

        lock.unlock()?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let lock = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        lock.unlock()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BearerToken;
    use tempfile::tempdir;

    fn session() -> Session {
        Session::authenticated(
            BearerToken::new("t1"),
            "IT60X0542811101000000123456",
            Some("Anna".to_string()),
        )
    }

    #[test]
    fn test_missing_file_is_no_session() {
        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        assert!(storage.load().unwrap().is_none());
        assert!(storage.clear().is_ok());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());

        storage.save(&session()).unwrap();
        assert!(storage.path().exists());

        let content = fs::read_to_string(storage.path()).unwrap();
        assert!(content.contains("\"token\": \"t1\""));
        assert!(content.contains("IT60X0542811101000000123456"));

        assert_eq!(storage.load().unwrap(), Some(session()));

        storage.clear().unwrap();
        assert!(!storage.path().exists());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_no_session() {
        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        fs::write(storage.path(), "{not json").unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_non_utf8_file_is_no_session() {
        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        fs::write(storage.path(), [0xff, 0xfe, 0x00, 0x7b]).unwrap();
        assert!(storage.load().unwrap().is_none());

        // the store still opens, and logging in again overwrites the bad file
        storage.save(&session()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(session()));
    }

    #[test]
    fn test_unreadable_path_is_no_session() {
        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        // a directory where the file should be fails to read
        fs::create_dir(storage.path()).unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        storage.save(&session()).unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
