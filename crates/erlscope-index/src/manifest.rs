use std::path::Path;

use ecow::{eco_format, EcoString};
use serde::{Deserialize, Serialize};

use crate::diag::StrResult;

/// The file name of a project manifest.
pub const MANIFEST: &str = "erlscope.toml";

/// A parsed project manifest.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectManifest {
    /// How the module index picks its files.
    pub index: IndexConfig,
}

impl ProjectManifest {
    /// Parse the manifest from a string.
    pub fn parse(string: &str) -> StrResult<Self> {
        toml::from_str(string)
            .map_err(|err| eco_format!("project manifest is malformed: {}", err.message()))
    }

    /// Load the manifest of the project at `root`.
    ///
    /// A missing manifest file yields the default manifest.
    pub fn load(root: &Path) -> StrResult<Self> {
        let path = root.join(MANIFEST);
        match std::fs::read_to_string(&path) {
            Ok(string) => Self::parse(&string),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(eco_format!("failed to read {} ({err})", path.display())),
        }
    }
}

/// The `[index]` table in the manifest.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct IndexConfig {
    /// Directories whose files are indexed. Empty means the whole project.
    pub source_roots: Vec<EcoString>,
    /// Directories whose files are never indexed.
    pub exclude: Vec<EcoString>,
    /// File extensions of indexed files, without the dot.
    pub extensions: Vec<EcoString>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { source_roots: vec![], exclude: vec![], extensions: vec!["erl".into()] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = ProjectManifest::parse(
            r#"
            [index]
            source-roots = ["src", "test"]
            exclude = ["_build"]
            "#,
        )
        .unwrap();
        assert_eq!(manifest.index.source_roots, ["src", "test"]);
        assert_eq!(manifest.index.exclude, ["_build"]);
        assert_eq!(manifest.index.extensions, ["erl"]);
    }

    #[test]
    fn test_parse_empty_manifest() {
        assert_eq!(ProjectManifest::parse(""), Ok(ProjectManifest::default()));
    }

    #[test]
    fn test_parse_malformed_manifest() {
        let err = ProjectManifest::parse("[index]\nsource-roots = 1").unwrap_err();
        assert!(err.starts_with("project manifest is malformed"), "{err}");
        assert!(ProjectManifest::parse("[index]\nroots = []").is_err());
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectManifest::load(dir.path()), Ok(ProjectManifest::default()));
        std::fs::write(dir.path().join(MANIFEST), "[index]\nextensions = [\"erl\", \"hrl\"]")
            .unwrap();
        let manifest = ProjectManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.index.extensions, ["erl", "hrl"]);
    }
}
