use ecow::{eco_format, EcoString};

use crate::diag::StrResult;
use crate::manifest::IndexConfig;
use crate::path::VirtualPath;
use crate::{bail, FileId};

/// Decides which files take part in the module index.
pub trait ScopeFilter {
    /// Whether the file is in scope.
    fn contains(&self, file: FileId) -> bool;
}

impl<F> ScopeFilter for F
where
    F: Fn(FileId) -> bool,
{
    fn contains(&self, file: FileId) -> bool {
        self(file)
    }
}

/// The source files of a project: files with an accepted extension below one
/// of the source roots, outside of the excluded directories.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SourceScope {
    roots: Vec<VirtualPath>,
    exclude: Vec<VirtualPath>,
    extensions: Vec<EcoString>,
}

impl SourceScope {
    /// Create a scope from its parts. No roots means the whole project.
    pub fn new(
        roots: Vec<VirtualPath>,
        exclude: Vec<VirtualPath>,
        extensions: Vec<EcoString>,
    ) -> Self {
        let roots = if roots.is_empty() { vec![VirtualPath::root()] } else { roots };
        Self { roots, exclude, extensions }
    }

    /// Create the scope described by the `[index]` table of a manifest.
    pub fn from_config(config: &IndexConfig) -> StrResult<Self> {
        let paths = |list: &[EcoString], what: &str| {
            list.iter()
                .map(|dir| {
                    VirtualPath::new(dir)
                        .map_err(|err| eco_format!("invalid {what} `{dir}` ({err})"))
                })
                .collect::<StrResult<Vec<_>>>()
        };

        let roots = paths(&config.source_roots, "source root")?;
        let exclude = paths(&config.exclude, "excluded directory")?;
        for extension in &config.extensions {
            if extension.is_empty() || extension.contains(['.', '/']) {
                bail!("invalid extension `{extension}`");
            }
        }

        Ok(Self::new(roots, exclude, config.extensions.clone()))
    }

    /// The source roots.
    pub fn roots(&self) -> &[VirtualPath] {
        &self.roots
    }
}

impl Default for SourceScope {
    fn default() -> Self {
        Self::new(vec![], vec![], vec!["erl".into()])
    }
}

impl ScopeFilter for SourceScope {
    fn contains(&self, file: FileId) -> bool {
        let vpath = file.vpath();
        vpath
            .extension()
            .is_some_and(|ext| self.extensions.iter().any(|accepted| accepted == ext))
            && self.roots.iter().any(|root| vpath.starts_with(root))
            && !self.exclude.iter().any(|dir| vpath.starts_with(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn file(path: &str) -> FileId {
        FileId::parse(path).unwrap()
    }

    #[test]
    fn test_default_scope_takes_erlang_files() {
        let scope = SourceScope::default();
        assert!(scope.contains(file("foo.erl")));
        assert!(scope.contains(file("apps/x/src/foo.erl")));
        assert!(!scope.contains(file("include/foo.hrl")));
        assert!(!scope.contains(file("erl")));
    }

    #[test]
    fn test_scope_roots_and_exclusions() {
        let scope = SourceScope::new(
            vec![VirtualPath::new("src").unwrap(), VirtualPath::new("test").unwrap()],
            vec![VirtualPath::new("src/gen").unwrap()],
            vec!["erl".into()],
        );
        assert!(scope.contains(file("src/foo.erl")));
        assert!(scope.contains(file("test/foo_test.erl")));
        assert!(!scope.contains(file("src/gen/parser.erl")));
        assert!(!scope.contains(file("srcx/foo.erl")));
        assert!(!scope.contains(file("_build/foo.erl")));
    }

    #[test]
    fn test_scope_from_config() {
        let config = IndexConfig {
            source_roots: vec!["src".into()],
            exclude: vec![],
            extensions: vec!["erl".into(), "escript".into()],
        };
        let scope = SourceScope::from_config(&config).unwrap();
        assert!(scope.contains(file("src/tool.escript")));
        assert!(!scope.contains(file("tool.escript")));

        let config = IndexConfig { source_roots: vec!["../up".into()], ..config };
        assert_eq!(
            SourceScope::from_config(&config),
            Err("invalid source root `../up` (path escapes the project root)".into())
        );
    }

    #[test]
    fn test_closures_are_filters() {
        let only_tests = |file: FileId| file.vpath().get_with_slash().ends_with("_test.erl");
        assert!(only_tests.contains(file("foo_test.erl")));
        assert!(!ScopeFilter::contains(&only_tests, file("foo.erl")));
    }
}
