//! Interned file identities.

use std::fmt::{self, Debug, Formatter};
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::path::{PathError, VirtualPath};

/// The global path interner.
static INTERNER: Lazy<RwLock<Interner>> = Lazy::new(|| {
    RwLock::new(Interner { to_id: FxHashMap::default(), from_id: Vec::new() })
});

/// A path interner.
struct Interner {
    to_id: FxHashMap<&'static VirtualPath, FileId>,
    from_id: Vec<&'static VirtualPath>,
}

/// Identifies a file in a project.
///
/// This type is globally interned and thus cheap to copy, compare, and hash.
/// Two ids are equal exactly if their normalized paths are.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileId(u32);

impl FileId {
    /// Create a new interned file identity.
    pub fn new(path: VirtualPath) -> Self {
        // Try to find an existing entry that we can reuse.
        if let Some(&id) = INTERNER.read().to_id.get(&path) {
            return id;
        }

        let mut interner = INTERNER.write();
        if let Some(&id) = interner.to_id.get(&path) {
            return id;
        }

        // Create a new entry forever by leaking the path. Files are only ever
        // added for paths seen in a project, so this stays small.
        let id = FileId(interner.from_id.len() as u32);
        let leaked = Box::leak(Box::new(path));
        interner.to_id.insert(leaked, id);
        interner.from_id.push(leaked);
        id
    }

    /// Create an identity for a slash-separated project path.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        VirtualPath::new(path).map(Self::new)
    }

    /// Create an identity for a real file below a real project root.
    pub fn virtualize(root: &Path, path: &Path) -> Result<Self, PathError> {
        VirtualPath::virtualize(root, path).map(Self::new)
    }

    /// The normalized path of the file within the project.
    pub fn vpath(self) -> &'static VirtualPath {
        INTERNER.read().from_id[self.0 as usize]
    }

    /// Construct from a raw number.
    ///
    /// Should only be used with numbers retrieved via
    /// [`into_raw`](Self::into_raw). Misuse may result in panics, but no
    /// unsafety.
    pub const fn from_raw(v: u32) -> Self {
        Self(v)
    }

    /// Extract the raw underlying number.
    pub const fn into_raw(self) -> u32 {
        self.0
    }
}

impl Debug for FileId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.vpath().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_normalizes() {
        let a = FileId::parse("src/foo.erl").unwrap();
        let b = FileId::parse("/src/./lib/../foo.erl").unwrap();
        let c = FileId::parse("src/bar.erl").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.vpath().get_with_slash(), "/src/foo.erl");
        assert_eq!(FileId::from_raw(a.into_raw()), a);
        assert_eq!(format!("{a:?}"), "/src/foo.erl");
    }
}
