//! In-memory registry of mosaic documents.
//!
//! Entries live until the process exits; there is no eviction and nothing
//! is persisted.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::mosaic::MosaicJson;

/// Shared, cloneable mosaic registry keyed by random UUID v4 strings.
#[derive(Debug, Clone, Default)]
pub struct MosaicStore {
    inner: Arc<RwLock<HashMap<String, Arc<MosaicJson>>>>,
}

impl MosaicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `mosaic` under a freshly generated id and return the id.
    pub fn insert(&self, mosaic: MosaicJson) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(mosaic));
        id
    }

    /// Look up a mosaic by id.
    pub fn get(&self, id: &str) -> Option<Arc<MosaicJson>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
