//! Key/value credential storage
//!
//! Credentials are kept as plain string values under fixed keys, the same
//! shape a browser's local storage offers. [`MemoryStore`] lives for the
//! process; [`FileStore`] persists to a JSON document so a session survives
//! restarts of the command line front end.

use crate::error::{SessionError, SessionResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// String-valued key/value storage for session credentials
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> SessionResult<()>;
}

/// In-process credential storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SessionError::unavailable("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SessionError::unavailable("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SessionError::unavailable("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::CredentialStore;
    use crate::error::{SessionError, SessionResult};
    use std::collections::BTreeMap;
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tracing::debug;

    /// Credential storage backed by a JSON object on disk
    ///
    /// Every read goes back to the file, so another process logging in or
    /// out is picked up on the next request.
    #[derive(Debug)]
    pub struct FileStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl FileStore {
        /// Create a store for `path`; the file is created on first write
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                write_lock: Mutex::new(()),
            }
        }

        /// Location of the backing file
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_all(&self) -> SessionResult<BTreeMap<String, String>> {
            match fs::read_to_string(&self.path) {
                Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
                Ok(content) => Ok(serde_json::from_str(&content)?),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e.into()),
            }
        }

        fn write_all(&self, entries: &BTreeMap<String, String>) -> SessionResult<()> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }

            // Write-then-rename so readers never see a half written document
            let tmp = self.path.with_extension("tmp");
            // A leftover temp file would keep its old mode
            match fs::remove_file(&tmp) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(entries)?)?;
            file.sync_all()?;
            drop(file);

            fs::rename(&tmp, &self.path)?;
            debug!(path = %self.path.display(), "Credential file updated");
            Ok(())
        }

        fn update<F>(&self, f: F) -> SessionResult<()>
        where
            F: FnOnce(&mut BTreeMap<String, String>),
        {
            let _guard = self
                .write_lock
                .lock()
                .map_err(|_| SessionError::unavailable("file store lock poisoned"))?;
            let mut entries = self.read_all()?;
            f(&mut entries);
            self.write_all(&entries)
        }
    }

    impl CredentialStore for FileStore {
        fn get(&self, key: &str) -> SessionResult<Option<String>> {
            Ok(self.read_all()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> SessionResult<()> {
            self.update(|entries| {
                entries.insert(key.to_string(), value.to_string());
            })
        }

        fn remove(&self, key: &str) -> SessionResult<()> {
            if !self.path.exists() {
                return Ok(());
            }
            self.update(|entries| {
                entries.remove(key);
            })
        }
    }
}
