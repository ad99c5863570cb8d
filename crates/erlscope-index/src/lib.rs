//! An incrementally maintained index from Erlang module names to the files
//! defining them.

pub mod diag;

mod file;
mod index;
mod manifest;
mod path;
mod scope;
mod shared;

pub use self::file::FileId;
pub use self::index::{module_name, FileEvent, ModuleIndex};
pub use self::manifest::{IndexConfig, ProjectManifest, MANIFEST};
pub use self::path::{PathError, VirtualPath};
pub use self::scope::{ScopeFilter, SourceScope};
pub use self::shared::SharedIndex;
