use std::path::{Path, PathBuf};

use ecow::eco_format;
use erlscope_index::diag::StrResult;
use erlscope_index::{FileId, ModuleIndex, ProjectManifest, SourceScope};
use walkdir::WalkDir;

/// An Erlang project on disk.
pub struct Project {
    /// The canonical root directory.
    root: PathBuf,
    /// Which files of the project are indexed.
    scope: SourceScope,
}

impl Project {
    /// Open the project at the given root, or in the current directory.
    pub fn open(root: Option<&Path>) -> StrResult<Self> {
        let root = root.unwrap_or(Path::new("."));
        let root = root
            .canonicalize()
            .map_err(|err| eco_format!("failed to open project at {} ({err})", root.display()))?;
        let scope = Self::load_scope(&root)?;
        Ok(Self { root, scope })
    }

    /// Read the scope from the project's manifest.
    pub fn load_scope(root: &Path) -> StrResult<SourceScope> {
        let manifest = ProjectManifest::load(root)?;
        SourceScope::from_config(&manifest.index)
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The identity of a real file of the project, if it is inside it.
    pub fn file(&self, path: &Path) -> Option<FileId> {
        match FileId::virtualize(&self.root, path) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!("skipping {} ({err})", path.display());
                None
            }
        }
    }

    /// The real path of a file of the project.
    pub fn path(&self, file: FileId) -> PathBuf {
        file.vpath().realize(&self.root)
    }

    /// All files of the project, skipping hidden files and directories.
    pub fn scan(&self) -> Vec<FileId> {
        self.scan_below(&self.root)
    }

    /// All files of the project below a real directory, skipping hidden
    /// files and directories.
    #[tracing::instrument(skip(self))]
    pub fn scan_below(&self, dir: &Path) -> Vec<FileId> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("failed to scan directory ({err})");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.file(entry.path()))
            .collect()
    }

    /// Build the module index of the project from scratch.
    pub fn index(&self) -> ModuleIndex {
        ModuleIndex::rebuild(self.scan(), self.scope.clone())
    }
}

/// Whether a file name marks a hidden file or directory.
pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use super::*;

    #[track_caller]
    fn project(files: &[&str]) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        let project = Project::open(Some(dir.path())).unwrap();
        (dir, project)
    }

    #[track_caller]
    fn file(path: &str) -> FileId {
        FileId::parse(path).unwrap()
    }

    #[test]
    fn test_index_project() {
        let (_dir, project) = project(&[
            "src/foo.erl",
            "test/foo_test.erl",
            "include/foo.hrl",
            ".git/foo.erl",
            "README.md",
        ]);
        let index = project.index();
        assert_eq!(index.files_for_module("foo"), BTreeSet::from([file("src/foo.erl")]));
        assert_eq!(
            index.files_for_module("foo_test"),
            BTreeSet::from([file("test/foo_test.erl")])
        );
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_index_project_with_manifest() {
        let (dir, _) = project(&["src/foo.erl", "test/foo_test.erl", "_build/src/foo.erl"]);
        fs::write(
            dir.path().join("erlscope.toml"),
            "[index]\nsource-roots = [\"src\", \"_build\"]\nexclude = [\"_build/src\"]\n",
        )
        .unwrap();

        let project = Project::open(Some(dir.path())).unwrap();
        let index = project.index();
        assert_eq!(index.module_names().len(), 1);
        assert_eq!(index.files_for_module("foo"), BTreeSet::from([file("src/foo.erl")]));
        assert_eq!(
            project.path(file("src/foo.erl")),
            project.root().join("src").join("foo.erl")
        );
    }

    #[test]
    fn test_scan_below_directory() {
        let (_dir, project) =
            project(&["src/a.erl", "src/lib/b.erl", "src/.c.erl", "test/d.erl"]);
        let found: BTreeSet<_> =
            project.scan_below(&project.root().join("src")).into_iter().collect();
        assert_eq!(found, BTreeSet::from([file("src/a.erl"), file("src/lib/b.erl")]));
        assert_eq!(project.scan().len(), 3);
    }

    #[test]
    fn test_open_with_malformed_manifest() {
        let (dir, _) = project(&[]);
        fs::write(dir.path().join("erlscope.toml"), "[index\n").unwrap();
        let err = Project::open(Some(dir.path())).err().unwrap();
        assert!(err.contains("malformed"), "{err}");
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Project::open(Some(&dir.path().join("missing"))).is_err());
    }
}
