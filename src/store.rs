//! Small persistent key stores (the bearer token, the selected tenant id).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{PortalError, PortalResult};

/// One persisted string value.
pub trait LocalStore: Send + Sync {
    fn load(&self) -> PortalResult<Option<String>>;
    fn save(&self, value: &str) -> PortalResult<()>;
    fn clear(&self) -> PortalResult<()>;
}

/// Stores the value in a single file, like a dotfile in the working directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> PortalResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let value = raw.trim();
                Ok((!value.is_empty()).then(|| value.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortalError::TokenStore(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, value: &str) -> PortalResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, value)?;
        Ok(())
    }

    fn clear(&self) -> PortalResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Non-persistent store, used by tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> PortalResult<Option<String>> {
        Ok(self
            .value
            .lock()
            .map_err(|_| PortalError::TokenStore("memory store poisoned".into()))?
            .clone())
    }

    fn save(&self, value: &str) -> PortalResult<()> {
        *self
            .value
            .lock()
            .map_err(|_| PortalError::TokenStore("memory store poisoned".into()))? =
            Some(value.to_owned());
        Ok(())
    }

    fn clear(&self) -> PortalResult<()> {
        *self
            .value
            .lock()
            .map_err(|_| PortalError::TokenStore("memory store poisoned".into()))? = None;
        Ok(())
    }
}

impl<S: LocalStore + ?Sized> LocalStore for std::sync::Arc<S> {
    fn load(&self) -> PortalResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, value: &str) -> PortalResult<()> {
        (**self).save(value)
    }

    fn clear(&self) -> PortalResult<()> {
        (**self).clear()
    }
}
