//! Content lookup with an explicit fallback
//!
//! Captions and other keyed copy are looked up through a [`ContentCatalog`],
//! which always answers: unknown keys resolve to the catalog's fallback.

use crate::domain::entities::StageContent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answer of a catalog lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Entry(&'a StageContent),
    Fallback(&'a StageContent),
}

impl<'a> Lookup<'a> {
    pub fn content(&self) -> &'a StageContent {
        match self {
            Lookup::Entry(content) | Lookup::Fallback(content) => content,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Lookup::Fallback(_))
    }
}

/// Supplies content for a key. Implementations must be total.
pub trait ContentProvider<K> {
    fn lookup(&self, key: &K) -> Lookup<'_>;
}

/// Keyed content plus the fallback used for every other key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCatalog<K: Ord> {
    #[serde(default = "BTreeMap::new")]
    entries: BTreeMap<K, StageContent>,
    fallback: StageContent,
}

impl<K: Ord> ContentCatalog<K> {
    pub fn new(fallback: StageContent) -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback,
        }
    }

    pub fn with_entry(mut self, key: K, content: StageContent) -> Self {
        self.entries.insert(key, content);
        self
    }

    pub fn insert(&mut self, key: K, content: StageContent) {
        self.entries.insert(key, content);
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fallback(&self) -> &StageContent {
        &self.fallback
    }
}

impl<K: Ord> ContentProvider<K> for ContentCatalog<K> {
    fn lookup(&self, key: &K) -> Lookup<'_> {
        match self.entries.get(key) {
            Some(content) => Lookup::Entry(content),
            None => Lookup::Fallback(&self.fallback),
        }
    }
}
