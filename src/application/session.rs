//! Visit session - Flag lifecycle and intro routing

use crate::domain::repositories::{FlagMap, FlagRepository, FlagStore, RepositoryError};
use crate::domain::value_objects::FlagKey;
use crate::sequencer::debug::DebugCategory;
use std::collections::BTreeSet;
use std::fmt;

/// Which sequence a visitor should see first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Intro,
    Main,
}

impl Route {
    /// `Main` once `hasSeenIntro` is exactly `"true"`
    pub fn for_flags<S: FlagStore + ?Sized>(flags: &S) -> Self {
        match flags.get(&FlagKey::has_seen_intro()).as_deref() {
            Some("true") => Route::Main,
            _ => Route::Intro,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Intro => write!(f, "intro"),
            Route::Main => write!(f, "main"),
        }
    }
}

/// In-memory flags of one visit, remembering which keys changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFlags {
    values: FlagMap,
    dirty: BTreeSet<FlagKey>,
}

impl SessionFlags {
    pub fn new(values: FlagMap) -> Self {
        Self {
            values,
            dirty: BTreeSet::new(),
        }
    }

    pub fn values(&self) -> &FlagMap {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn changed_keys(&self) -> impl Iterator<Item = &FlagKey> {
        self.dirty.iter()
    }

    fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

impl FlagStore for SessionFlags {
    fn get(&self, key: &FlagKey) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: FlagKey, value: String) {
        if self.values.get(&key) == Some(&value) {
            return;
        }
        self.dirty.insert(key.clone());
        self.values.insert(key, value);
    }
}

/// Flags loaded from a repository at the start of a visit and written back
/// with [`persist`](Self::persist)
pub struct VisitSession<R: FlagRepository> {
    repository: R,
    flags: SessionFlags,
}

impl<R: FlagRepository> VisitSession<R> {
    pub async fn open(repository: R) -> Result<Self, RepositoryError> {
        let values = repository.load_flags().await?;
        log::debug!(
            target: DebugCategory::STORAGE,
            "[Session] opened with {} flags",
            values.len()
        );
        Ok(Self {
            repository,
            flags: SessionFlags::new(values),
        })
    }

    pub fn route(&self) -> Route {
        Route::for_flags(&self.flags)
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut SessionFlags {
        &mut self.flags
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Save the flags if any changed. Returns whether a write happened.
    pub async fn persist(&mut self) -> Result<bool, RepositoryError> {
        if !self.flags.is_dirty() {
            return Ok(false);
        }
        self.repository.save_flags(self.flags.values()).await?;
        log::debug!(
            target: DebugCategory::STORAGE,
            "[Session] persisted {} flags",
            self.flags.values().len()
        );
        self.flags.mark_clean();
        Ok(true)
    }
}
