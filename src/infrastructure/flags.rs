//! Flag repository implementations

use crate::domain::repositories::{FlagMap, FlagRepository, RepositoryError};
use crate::sequencer::debug::DebugCategory;
use crate::storage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Flags stored as a JSON object in a single file
pub struct FileFlagRepository {
    path: PathBuf,
}

impl FileFlagRepository {
    pub const FILE_NAME: &'static str = "flags.json";

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Repository using `flags.json` inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl FlagRepository for FileFlagRepository {
    async fn load_flags(&self) -> Result<FlagMap, RepositoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    target: DebugCategory::STORAGE,
                    "[Flags] {} not found, starting fresh",
                    self.display_path()
                );
                return Ok(FlagMap::new());
            }
            Err(e) => return Err(RepositoryError::io(self.display_path(), &e)),
        };

        storage::load(&bytes).map_err(|e| RepositoryError::InvalidFormat {
            message: format!("{}: {e}", self.display_path()),
        })
    }

    async fn save_flags(&self, flags: &FlagMap) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::io(parent.display().to_string(), &e))?;
        }

        let bytes = storage::save(flags).map_err(|e| RepositoryError::InvalidFormat {
            message: e.to_string(),
        })?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| RepositoryError::io(self.display_path(), &e))?;

        log::debug!(
            target: DebugCategory::STORAGE,
            "[Flags] saved {} flags to {}",
            flags.len(),
            self.display_path()
        );
        Ok(())
    }
}

/// In-memory implementation for testing
#[derive(Default)]
pub struct InMemoryFlagRepository {
    flags: Mutex<FlagMap>,
}

impl InMemoryFlagRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: FlagMap) -> Self {
        Self {
            flags: Mutex::new(flags),
        }
    }

    pub fn snapshot(&self) -> FlagMap {
        self.flags.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FlagRepository for InMemoryFlagRepository {
    async fn load_flags(&self) -> Result<FlagMap, RepositoryError> {
        self.flags
            .lock()
            .map(|f| f.clone())
            .map_err(|_| RepositoryError::Unavailable {
                reason: "flag store lock poisoned".to_string(),
            })
    }

    async fn save_flags(&self, flags: &FlagMap) -> Result<(), RepositoryError> {
        let mut stored = self.flags.lock().map_err(|_| RepositoryError::Unavailable {
            reason: "flag store lock poisoned".to_string(),
        })?;
        *stored = flags.clone();
        Ok(())
    }
}
