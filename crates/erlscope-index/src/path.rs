//! Virtual, cross-platform reproducible path handling.

use std::fmt::{self, Debug, Display, Formatter};
use std::path::{self, Path, PathBuf};

use ecow::EcoString;

// Special symbols in virtual paths.
const SEPARATOR: char = '/';
const CURRENT: &str = ".";
const PARENT: &str = "..";

/// A normalized, absolute path within a project.
///
/// The underlying string always starts with a slash. Its segments are never
/// empty, `.` or `..` and never contain back- or forward slashes.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualPath(EcoString);

impl VirtualPath {
    /// The root of the project.
    pub fn root() -> Self {
        Self(EcoString::from(SEPARATOR))
    }

    /// Creates a new virtual path from a slash-separated string.
    ///
    /// Relative paths are taken relative to the root. `.` and `..` segments
    /// are resolved lexically.
    pub fn new(path: impl AsRef<str>) -> Result<Self, PathError> {
        let path = path.as_ref();
        if path.contains('\\') {
            return Err(PathError::Backslash);
        }

        let mut out = Self::root();
        for segment in path.split(SEPARATOR) {
            out.push(segment)?;
        }
        Ok(out)
    }

    /// Creates a virtual path from a real path and a real root.
    ///
    /// No file system operations are performed: the root must be a lexical
    /// prefix of the path.
    pub fn virtualize(root: &Path, path: &Path) -> Result<Self, PathError> {
        let path = path.strip_prefix(root).map_err(|_| PathError::Escapes)?;
        let mut out = Self::root();
        for component in path.components() {
            match component {
                path::Component::CurDir | path::Component::RootDir => {}
                path::Component::ParentDir => out.push(PARENT)?,
                path::Component::Normal(segment) => {
                    let segment = segment.to_str().ok_or(PathError::Utf8)?;
                    if segment.contains('\\') {
                        return Err(PathError::Backslash);
                    }
                    out.push(segment)?;
                }
                path::Component::Prefix(_) => return Err(PathError::Escapes),
            }
        }
        Ok(out)
    }

    /// Turns the virtual path into a real path below the given root.
    pub fn realize(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }

    /// The path with a leading slash.
    pub fn get_with_slash(&self) -> &str {
        &self.0
    }

    /// The path without a leading slash.
    pub fn get_without_slash(&self) -> &str {
        &self.0[1..]
    }

    /// The segments of the path.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.get_without_slash().split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// The final segment of the path.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().next_back()
    }

    /// The file name without its final extension.
    ///
    /// The stem of `.erl` is empty.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        Some(name.rsplit_once('.').map_or(name, |(stem, _)| stem))
    }

    /// The final extension of the file name.
    pub fn extension(&self) -> Option<&str> {
        let (_, extension) = self.file_name()?.rsplit_once('.')?;
        Some(extension)
    }

    /// The path with its final segment removed, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let mut out = self.clone();
        out.pop().then_some(out)
    }

    /// Joins a slash-separated path onto this one.
    pub fn join(&self, path: &str) -> Result<Self, PathError> {
        if path.contains('\\') {
            return Err(PathError::Backslash);
        }

        let mut out = self.clone();
        for segment in path.split(SEPARATOR) {
            out.push(segment)?;
        }
        Ok(out)
    }

    /// Whether this path is equal to or located below `base`.
    pub fn starts_with(&self, base: &Self) -> bool {
        let mut segments = self.segments();
        base.segments().all(|segment| segments.next() == Some(segment))
    }

    /// Resolves and appends a single segment.
    fn push(&mut self, segment: &str) -> Result<(), PathError> {
        match segment {
            "" | CURRENT => {}
            PARENT => {
                if !self.pop() {
                    return Err(PathError::Escapes);
                }
            }
            _ => {
                if self.0.len() > 1 {
                    self.0.push(SEPARATOR);
                }
                self.0.push_str(segment);
            }
        }
        Ok(())
    }

    /// Removes the final segment. Returns `false` at the root.
    fn pop(&mut self) -> bool {
        if self.0.len() == 1 {
            return false;
        }
        let end = self.0.rfind(SEPARATOR).unwrap_or(0).max(1);
        self.0.truncate(end);
        true
    }
}

impl Debug for VirtualPath {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Display for VirtualPath {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// An error that can occur when constructing a [`VirtualPath`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PathError {
    /// The path would escape the root, for instance when resolving `..` at
    /// the root or when a real path is not below the real root.
    Escapes,
    /// The path contains a backslash.
    Backslash,
    /// The real path contains bytes that are not valid UTF-8.
    Utf8,
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Escapes => "path escapes the project root",
            Self::Backslash => "path contains a backslash",
            Self::Utf8 => "path is not valid UTF-8",
        })
    }
}

impl std::error::Error for PathError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn path(p: &str) -> VirtualPath {
        VirtualPath::new(p).unwrap()
    }

    #[test]
    fn test_new() {
        #[track_caller]
        fn test(path: &str, expected: Result<&str, PathError>) {
            let found = VirtualPath::new(path);
            assert_eq!(
                found.as_ref().map(VirtualPath::get_with_slash),
                expected.as_ref().map(|s| *s),
            );
        }

        test("", Ok("/"));
        test("/", Ok("/"));
        test("src/foo.erl", Ok("/src/foo.erl"));
        test("/src//./foo.erl", Ok("/src/foo.erl"));
        test("src/../test/foo_test.erl", Ok("/test/foo_test.erl"));
        test("src/", Ok("/src"));
        test("..", Err(PathError::Escapes));
        test("/src/../..", Err(PathError::Escapes));
        test("src\\foo.erl", Err(PathError::Backslash));
    }

    #[test]
    #[cfg(unix)]
    fn test_virtualize() {
        let root = Path::new("/home/user/project");
        assert_eq!(
            VirtualPath::virtualize(root, Path::new("/home/user/project/src/a.erl")),
            Ok(path("src/a.erl")),
        );
        assert_eq!(VirtualPath::virtualize(root, root), Ok(VirtualPath::root()));
        assert_eq!(
            VirtualPath::virtualize(root, Path::new("/home/user/other/a.erl")),
            Err(PathError::Escapes),
        );
        assert_eq!(
            path("src/a.erl").realize(root),
            Path::new("/home/user/project/src/a.erl"),
        );
    }

    #[test]
    fn test_file_ops() {
        let p = path("src/foo_test.erl");
        assert_eq!(p.file_name(), Some("foo_test.erl"));
        assert_eq!(p.file_stem(), Some("foo_test"));
        assert_eq!(p.extension(), Some("erl"));
        assert_eq!(p.parent(), Some(path("src")));
        assert_eq!(path("a.tar.erl").file_stem(), Some("a.tar"));
        assert_eq!(path("Makefile").extension(), None);
        assert_eq!(path(".erl").file_stem(), Some(""));
        assert_eq!(VirtualPath::root().file_name(), None);
        assert_eq!(VirtualPath::root().parent(), None);
        assert_eq!(path("a").parent(), Some(VirtualPath::root()));
    }

    #[test]
    fn test_join_and_starts_with() {
        assert_eq!(path("src").join("lib/x.erl"), Ok(path("src/lib/x.erl")));
        assert_eq!(path("src").join("../x.erl"), Ok(path("x.erl")));
        assert!(path("src/lib/x.erl").starts_with(&path("src")));
        assert!(path("src").starts_with(&VirtualPath::root()));
        assert!(!path("srcx/a.erl").starts_with(&path("src")));
        assert!(!path("src").starts_with(&path("src/lib")));
    }
}
