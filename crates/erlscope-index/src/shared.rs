use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::{FileEvent, FileId, ModuleIndex, ScopeFilter};

/// A module index shared between one writer and any number of readers.
///
/// Mutations take the write lock, so every reader observes either the state
/// before or the state after a whole event.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex(Arc<RwLock<ModuleIndex>>);

impl SharedIndex {
    /// Share an index.
    pub fn new(index: ModuleIndex) -> Self {
        Self(Arc::new(RwLock::new(index)))
    }

    /// Handle a file event.
    pub fn apply(&self, event: FileEvent) {
        self.0.write().apply(event);
    }

    /// Handle a batch of file events under a single write lock.
    pub fn apply_all(&self, events: impl IntoIterator<Item = FileEvent>) {
        let mut index = self.0.write();
        for event in events {
            index.apply(event);
        }
    }

    /// Replace the index's scope.
    pub fn scope_changed(&self, scope: impl ScopeFilter + Send + Sync + 'static) {
        self.0.write().scope_changed(scope);
    }

    /// The files defining the module with the given name.
    pub fn files_for_module(&self, name: &str) -> BTreeSet<FileId> {
        self.0.read().files_for_module(name)
    }

    /// Lock the index for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ModuleIndex> {
        self.0.read()
    }
}
