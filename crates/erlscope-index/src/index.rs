use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Formatter};

use ecow::EcoString;
use rustc_hash::FxHashMap;

use crate::{FileId, ScopeFilter, SourceScope, VirtualPath};

/// The module a file defines: its base name without the final extension.
///
/// Returns `None` if that name is empty.
pub fn module_name(file: FileId) -> Option<EcoString> {
    file.vpath().file_stem().filter(|stem| !stem.is_empty()).map(Into::into)
}

/// A change to a file of the project, as reported by a host.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FileEvent {
    /// A file was created.
    Added(FileId),
    /// The content of a file changed.
    Changed(FileId),
    /// A file was deleted.
    Removed(FileId),
    /// A file was moved.
    Renamed { from: FileId, to: FileId },
}

/// Maps module names to the files defining them.
///
/// The index is kept up to date with [file events](FileEvent). Every event
/// first retracts what the file contributed before and then contributes
/// whatever the file's current state yields. Updating incrementally thus
/// always ends in the same state as [rebuilding](Self::rebuild) from the
/// current set of files.
pub struct ModuleIndex {
    /// Decides which files are indexed.
    scope: Box<dyn ScopeFilter + Send + Sync>,
    /// All files known to exist, whether in scope or not.
    known: BTreeSet<FileId>,
    /// The module each indexed file contributes.
    entries: FxHashMap<FileId, EcoString>,
    /// The files defining each module.
    modules: BTreeMap<EcoString, BTreeSet<FileId>>,
}

impl ModuleIndex {
    /// Create an empty index over the default [`SourceScope`].
    pub fn new() -> Self {
        Self::with_scope(SourceScope::default())
    }

    /// Create an empty index over the given scope.
    pub fn with_scope(scope: impl ScopeFilter + Send + Sync + 'static) -> Self {
        Self {
            scope: Box::new(scope),
            known: BTreeSet::new(),
            entries: FxHashMap::default(),
            modules: BTreeMap::new(),
        }
    }

    /// Build an index from scratch.
    #[tracing::instrument(skip_all)]
    pub fn rebuild(
        files: impl IntoIterator<Item = FileId>,
        scope: impl ScopeFilter + Send + Sync + 'static,
    ) -> Self {
        let mut index = Self::with_scope(scope);
        for file in files {
            index.file_added(file);
        }
        tracing::debug!(modules = index.modules.len(), "rebuilt module index");
        index
    }

    /// Handle a file event.
    pub fn apply(&mut self, event: FileEvent) {
        match event {
            FileEvent::Added(file) => self.file_added(file),
            FileEvent::Changed(file) => self.file_changed(file),
            FileEvent::Removed(file) => self.file_removed(file),
            FileEvent::Renamed { from, to } => self.file_renamed(from, to),
        }
    }

    /// A file was created.
    pub fn file_added(&mut self, file: FileId) {
        self.known.insert(file);
        self.reindex(file);
    }

    /// The content of a file changed.
    ///
    /// The module name only depends on the file name, but the file is
    /// re-derived all the same. A change to a file not seen before counts as
    /// its creation.
    pub fn file_changed(&mut self, file: FileId) {
        self.file_added(file);
    }

    /// A file was deleted.
    pub fn file_removed(&mut self, file: FileId) {
        self.known.remove(&file);
        self.retract(file);
    }

    /// A file was moved.
    pub fn file_renamed(&mut self, from: FileId, to: FileId) {
        self.file_removed(from);
        self.file_added(to);
    }

    /// Replace the scope and re-derive the entries of all known files.
    ///
    /// Files that the new scope excludes are dropped from the index even
    /// though they still exist.
    #[tracing::instrument(skip_all)]
    pub fn scope_changed(&mut self, scope: impl ScopeFilter + Send + Sync + 'static) {
        self.scope = Box::new(scope);
        let known: Vec<_> = self.known.iter().copied().collect();
        for file in known {
            self.reindex(file);
        }
    }

    /// The names of all indexed modules, in sorted order.
    pub fn module_names(&self) -> BTreeSet<EcoString> {
        self.modules.keys().cloned().collect()
    }

    /// The files defining the module with the given name.
    ///
    /// Empty if the module is unknown.
    pub fn files_for_module(&self, name: &str) -> BTreeSet<FileId> {
        self.modules.get(name).cloned().unwrap_or_default()
    }

    /// The files defining the module with the given name, narrowed down to
    /// an additional scope.
    pub fn files_for_module_in<S>(&self, name: &str, scope: &S) -> BTreeSet<FileId>
    where
        S: ScopeFilter + ?Sized,
    {
        self.modules
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&file| scope.contains(file))
            .collect()
    }

    /// The known files at or below the given path, whether indexed or not.
    ///
    /// Hosts use this to expand the removal of a directory into the removal
    /// of the files it contained.
    pub fn files_below(&self, dir: &VirtualPath) -> Vec<FileId> {
        self.known
            .iter()
            .copied()
            .filter(|file| file.vpath().starts_with(dir))
            .collect()
    }

    /// The module the file contributes, if it is indexed.
    pub fn module_of(&self, file: FileId) -> Option<&EcoString> {
        self.entries.get(&file)
    }

    /// Iterate over the modules and their files, sorted by module name.
    pub fn iter(&self) -> impl Iterator<Item = (&EcoString, &BTreeSet<FileId>)> {
        self.modules.iter()
    }

    /// The number of indexed modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is indexed.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Retract the file's entry and derive it anew.
    fn reindex(&mut self, file: FileId) {
        self.retract(file);
        if !self.scope.contains(file) {
            return;
        }

        let Some(name) = module_name(file) else { return };
        tracing::debug!(?file, module = %name, "indexing file");
        self.modules.entry(name.clone()).or_default().insert(file);
        self.entries.insert(file, name);
    }

    /// Remove everything the file contributed.
    fn retract(&mut self, file: FileId) {
        let Some(name) = self.entries.remove(&file) else { return };
        tracing::debug!(?file, module = %name, "retracting file");
        if let Some(files) = self.modules.get_mut(&name) {
            files.remove(&file);
            if files.is_empty() {
                self.modules.remove(&name);
            }
        }
    }
}

impl Default for ModuleIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ModuleIndex {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_map().entries(self.modules.iter()).finish()
    }
}

/// Two indices are equal if they map the same modules to the same files.
impl PartialEq for ModuleIndex {
    fn eq(&self, other: &Self) -> bool {
        self.modules == other.modules
    }
}

impl Eq for ModuleIndex {}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn file(path: &str) -> FileId {
        FileId::parse(path).unwrap()
    }

    #[track_caller]
    fn files(paths: &[&str]) -> BTreeSet<FileId> {
        paths.iter().map(|path| file(path)).collect()
    }

    fn names(names: &[&str]) -> BTreeSet<EcoString> {
        names.iter().map(|&name| name.into()).collect()
    }

    #[track_caller]
    fn scope(roots: &[&str], exclude: &[&str], extensions: &[&str]) -> SourceScope {
        let paths = |list: &[&str]| list.iter().map(|p| VirtualPath::new(p).unwrap()).collect();
        SourceScope::new(
            paths(roots),
            paths(exclude),
            extensions.iter().map(|&ext| ext.into()).collect(),
        )
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name(file("src/foo.erl")), Some("foo".into()));
        assert_eq!(module_name(file("src/foo_test.erl")), Some("foo_test".into()));
        assert_eq!(module_name(file("a.b.erl")), Some("a.b".into()));
        assert_eq!(module_name(file("README")), Some("README".into()));
        assert_eq!(module_name(file(".erl")), None);
        assert_eq!(module_name(FileId::new(VirtualPath::root())), None);
    }

    #[test]
    fn test_prefix_named_modules_stay_apart() {
        let mut index = ModuleIndex::new();
        index.file_added(file("src/foo.erl"));
        index.file_added(file("test/foo_test.erl"));
        assert_eq!(index.files_for_module("foo"), files(&["src/foo.erl"]));
        assert_eq!(index.files_for_module("foo_test"), files(&["test/foo_test.erl"]));
        assert_eq!(index.module_names(), names(&["foo", "foo_test"]));
    }

    #[test]
    fn test_duplicate_modules() {
        let mut index = ModuleIndex::new();
        index.file_added(file("apps/a/src/util.erl"));
        index.file_added(file("apps/b/src/util.erl"));
        assert_eq!(index.files_for_module("util").len(), 2);
        index.file_removed(file("apps/a/src/util.erl"));
        assert_eq!(index.files_for_module("util"), files(&["apps/b/src/util.erl"]));
    }

    #[test]
    fn test_removal_retracts_everything() {
        let mut index = ModuleIndex::new();
        index.file_added(file("src/foo.erl"));
        index.file_changed(file("src/foo.erl"));
        index.file_removed(file("src/foo.erl"));
        assert!(index.is_empty());
        assert!(index.files_for_module("foo").is_empty());
        assert_eq!(index.module_of(file("src/foo.erl")), None);
        assert_eq!(index, ModuleIndex::new());
    }

    #[test]
    fn test_unknown_and_ineligible_files() {
        let mut index = ModuleIndex::new();
        index.file_removed(file("src/never.erl"));
        index.file_added(file("include/defs.hrl"));
        index.file_added(file(".erl"));
        assert!(index.is_empty());
        assert!(index.files_for_module("defs").is_empty());
    }

    #[test]
    fn test_rename() {
        let mut index = ModuleIndex::new();
        index.file_added(file("src/old.erl"));
        index.apply(FileEvent::Renamed { from: file("src/old.erl"), to: file("src/new.erl") });
        assert_eq!(index.module_names(), names(&["new"]));
        assert_eq!(index.module_of(file("src/new.erl")).map(EcoString::as_str), Some("new"));
        index.apply(FileEvent::Renamed { from: file("src/new.erl"), to: file("src/new.txt") });
        assert!(index.is_empty());
    }

    #[test]
    fn test_scope_change_retracts_and_restores() {
        let mut index = ModuleIndex::new();
        index.file_added(file("src/foo.erl"));
        index.file_added(file("test/foo_test.erl"));

        index.scope_changed(scope(&["src"], &[], &["erl"]));
        assert_eq!(index.module_names(), names(&["foo"]));

        index.scope_changed(SourceScope::default());
        assert_eq!(index.module_names(), names(&["foo", "foo_test"]));
    }

    #[test]
    fn test_files_for_module_in_scope() {
        let mut index = ModuleIndex::new();
        index.file_added(file("apps/a/util.erl"));
        index.file_added(file("apps/b/util.erl"));
        let in_b = |file: FileId| file.vpath().starts_with(&VirtualPath::new("apps/b").unwrap());
        assert_eq!(index.files_for_module_in("util", &in_b), files(&["apps/b/util.erl"]));
        assert!(index.files_for_module_in("missing", &in_b).is_empty());
    }

    #[test]
    fn test_directory_removal_via_files_below() {
        let mut index = ModuleIndex::new();
        for path in ["lib/a.erl", "lib/deep/b.erl", "lib/deep/b.hrl", "libx/c.erl"] {
            index.file_added(file(path));
        }

        let lib = VirtualPath::new("lib").unwrap();
        let below: BTreeSet<_> = index.files_below(&lib).into_iter().collect();
        assert_eq!(below, files(&["lib/a.erl", "lib/deep/b.erl", "lib/deep/b.hrl"]));
        assert_eq!(index.files_below(file("libx/c.erl").vpath()), [file("libx/c.erl")]);

        for id in below {
            index.file_removed(id);
        }
        assert_eq!(index, ModuleIndex::rebuild([file("libx/c.erl")], SourceScope::default()));
        assert!(index.files_below(&lib).is_empty());
    }

    #[test]
    fn test_random_events_match_rebuild() {
        const PATHS: [&str; 8] = [
            "src/a.erl",
            "src/b.erl",
            "test/a.erl",
            "test/a_test.erl",
            "src/a.hrl",
            "lib/x/src/b.erl",
            "src/.erl",
            "_build/src/a.erl",
        ];

        let scopes = |i: usize| match i {
            0 => SourceScope::default(),
            1 => scope(&[], &["_build"], &["erl"]),
            _ => scope(&["src"], &[], &["erl", "hrl"]),
        };

        for seed in 0..64 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut index = ModuleIndex::new();
            let mut existing = BTreeSet::new();
            let mut current = 0;

            for _ in 0..40 {
                let path = file(PATHS[rng.usize(..PATHS.len())]);
                match rng.u8(..10) {
                    0..=3 => {
                        index.apply(FileEvent::Added(path));
                        existing.insert(path);
                    }
                    4 | 5 => {
                        index.apply(FileEvent::Changed(path));
                        existing.insert(path);
                    }
                    6 | 7 => {
                        index.apply(FileEvent::Removed(path));
                        existing.remove(&path);
                    }
                    8 => {
                        let to = file(PATHS[rng.usize(..PATHS.len())]);
                        index.apply(FileEvent::Renamed { from: path, to });
                        existing.remove(&path);
                        existing.insert(to);
                    }
                    _ => {
                        current = rng.usize(..3);
                        index.scope_changed(scopes(current));
                    }
                }

                let rebuilt = ModuleIndex::rebuild(existing.iter().copied(), scopes(current));
                assert_eq!(index, rebuilt, "seed {seed}");
            }
        }
    }
}
