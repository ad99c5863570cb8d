use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::{self, termcolor};
use ecow::{eco_format, EcoString};
use erlscope_index::diag::StrResult;
use erlscope_index::{FileEvent, FileId, ModuleIndex, SharedIndex, MANIFEST};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use termcolor::WriteColor;

use crate::args::WatchCommand;
use crate::color_stream;
use crate::project::{is_hidden, Project};

/// Execute a watching command.
pub fn watch(command: &WatchCommand) -> StrResult<()> {
    let project = Project::open(command.root.as_deref())?;
    let index = SharedIndex::new(project.index());
    Status::Indexed(index.read().len())
        .print(&project)
        .map_err(|err| eco_format!("failed to print status ({err})"))?;

    // Setup file watching.
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())
        .map_err(|_| "failed to setup file watching")?;
    watcher
        .watch(project.root(), RecursiveMode::Recursive)
        .map_err(|_| "failed to watch project directory")?;

    // Handle events.
    for event in rx {
        let event = event.map_err(|_| "failed to watch project directory")?;
        process(&project, &index, &event)?;
    }

    Ok(())
}

/// Bring the index up to date with a file system event and report the
/// modules that appeared or disappeared.
///
/// A change to the manifest first reloads the scope. The paths of the event
/// are handled as file changes all the same.
fn process(project: &Project, index: &SharedIndex, event: &notify::Event) -> StrResult<()> {
    if event.paths.iter().any(|path| is_manifest(project, path)) {
        match Project::load_scope(project.root()) {
            Ok(scope) => {
                let before = index.read().module_names();
                index.scope_changed(scope);
                let after = index.read().module_names();
                for name in before.difference(&after) {
                    print(&Status::Dropped(name))?;
                }
                for name in after.difference(&before) {
                    print(&Status::Added(name))?;
                }
            }
            Err(err) => print(&Status::Error(&err))?,
        }
    }

    let events = translate(project, &index.read(), event);
    for event in events {
        let before = module_of(&index.read(), event);
        index.apply(event);
        let after = module_of(&index.read(), event);
        if before != after {
            for name in before.iter().filter(|name| !after.contains(name)) {
                print(&Status::Dropped(name))?;
            }
            for name in after.iter().filter(|name| !before.contains(name)) {
                print(&Status::Added(name))?;
            }
        }
    }

    Ok(())
}

/// Translate a file system event into index events.
///
/// Directories are expanded into the files they contain: for a directory
/// that appeared, by scanning it; for one that vanished, by asking the index
/// which files it knew below it.
fn translate(project: &Project, index: &ModuleIndex, event: &notify::Event) -> Vec<FileEvent> {
    let paths = || event.paths.iter().map(PathBuf::as_path);
    match &event.kind {
        EventKind::Create(_) => paths().flat_map(|path| appeared(project, path)).collect(),
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths().flat_map(|path| vanished(project, index, path)).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => {
                let removed = vanished(project, index, from);
                let added = appeared(project, to);
                match (removed.as_slice(), added.as_slice()) {
                    (&[FileEvent::Removed(from)], &[FileEvent::Added(to)]) => {
                        vec![FileEvent::Renamed { from, to }]
                    }
                    _ => removed.into_iter().chain(added).collect(),
                }
            }
            _ => vec![],
        },
        EventKind::Modify(ModifyKind::Name(_)) => paths()
            .flat_map(|path| {
                if path.exists() {
                    appeared(project, path)
                } else {
                    vanished(project, index, path)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) | EventKind::Any => paths()
            .filter(|path| !path.is_dir())
            .flat_map(|path| {
                if path.exists() {
                    Vec::from_iter(visible(project, path).map(FileEvent::Changed))
                } else {
                    vanished(project, index, path)
                }
            })
            .collect(),
        EventKind::Modify(_) | EventKind::Access(_) | EventKind::Other => vec![],
    }
}

/// Index events for a path that exists now: the file itself, or every file
/// below it if it is a directory.
fn appeared(project: &Project, path: &Path) -> Vec<FileEvent> {
    if path.is_dir() {
        if visible(project, path).is_none() {
            return vec![];
        }
        project.scan_below(path).into_iter().map(FileEvent::Added).collect()
    } else {
        visible(project, path).map(FileEvent::Added).into_iter().collect()
    }
}

/// Index events for a path that no longer exists: the file itself and, in
/// case it was a directory, every known file below it.
fn vanished(project: &Project, index: &ModuleIndex, path: &Path) -> Vec<FileEvent> {
    let Some(file) = visible(project, path) else { return vec![] };
    let below = index.files_below(file.vpath()).into_iter().filter(|&known| known != file);
    std::iter::once(file).chain(below).map(FileEvent::Removed).collect()
}

/// The identity of a path of the project that is not hidden.
fn visible(project: &Project, path: &Path) -> Option<FileId> {
    if is_hidden_path(project.root(), path) {
        return None;
    }
    project.file(path)
}

/// The module names the files of an event currently contribute.
fn module_of(index: &ModuleIndex, event: FileEvent) -> Vec<EcoString> {
    let files = match event {
        FileEvent::Added(file) | FileEvent::Changed(file) | FileEvent::Removed(file) => {
            vec![file]
        }
        FileEvent::Renamed { from, to } => vec![from, to],
    };
    files.into_iter().filter_map(|file| index.module_of(file).cloned()).collect()
}

/// Whether a path is the manifest of the project.
fn is_manifest(project: &Project, path: &Path) -> bool {
    path.strip_prefix(project.root()).is_ok_and(|rest| rest == Path::new(MANIFEST))
}

/// Whether a path of the project is hidden or lies in a hidden directory.
fn is_hidden_path(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).is_ok_and(|rest| rest.iter().any(is_hidden))
}

/// Print a status line, mapping I/O errors.
fn print(status: &Status) -> StrResult<()> {
    status.print_line().map_err(|err| eco_format!("failed to print status ({err})"))
}

/// The status in which the watcher can be.
enum Status<'a> {
    Indexed(usize),
    Added(&'a str),
    Dropped(&'a str),
    Error(&'a str),
}

impl Status<'_> {
    /// Render the header and the first status line.
    fn print(&self, project: &Project) -> io::Result<()> {
        let mut w = color_stream();
        w.set_color(&self.color())?;
        write!(w, "watching")?;
        w.reset()?;
        writeln!(w, " {}", project.root().display())?;
        writeln!(w)?;
        w.flush()?;
        self.print_line()
    }

    /// Render a timestamped status line.
    fn print_line(&self) -> io::Result<()> {
        let timestamp = chrono::offset::Local::now().format("%H:%M:%S");
        let mut w = color_stream();
        write!(w, "[{timestamp}] ")?;
        w.set_color(&self.color())?;
        write!(w, "{}", self.label())?;
        w.reset()?;
        writeln!(w, " {}", self.message())?;
        w.flush()
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Indexed(_) => "indexed",
            Self::Added(_) => "added",
            Self::Dropped(_) => "dropped",
            Self::Error(_) => "error",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Indexed(1) => "1 module".into(),
            Self::Indexed(count) => format!("{count} modules"),
            Self::Added(name) | Self::Dropped(name) => format!("module {name}"),
            Self::Error(message) => message.to_string(),
        }
    }

    fn color(&self) -> termcolor::ColorSpec {
        let styles = term::Styles::default();
        match self {
            Self::Error(_) => styles.header_error,
            Self::Dropped(_) => styles.header_warning,
            _ => styles.header_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use notify::event::{CreateKind, DataChange, RemoveKind};
    use notify::Event;

    use super::*;

    #[track_caller]
    fn setup() -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/foo.erl"), "").unwrap();
        let project = Project::open(Some(dir.path())).unwrap();
        (dir, project)
    }

    #[track_caller]
    fn file(path: &str) -> FileId {
        FileId::parse(path).unwrap()
    }

    #[track_caller]
    fn write(project: &Project, path: &str) {
        let path = project.root().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[track_caller]
    fn apply(project: &Project, index: &mut ModuleIndex, event: Event) {
        let events = translate(project, index, &event);
        for event in events {
            index.apply(event);
        }
    }

    #[test]
    fn test_translate_events() {
        let (_dir, project) = setup();
        let index = project.index();
        let foo = project.root().join("src/foo.erl");
        let bar = project.root().join("src/bar.erl");

        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(foo.clone());
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Added(file("src/foo.erl"))]
        );

        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(foo.clone());
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Changed(file("src/foo.erl"))]
        );

        let event = Event::new(EventKind::Remove(RemoveKind::File)).add_path(bar.clone());
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Removed(file("src/bar.erl"))]
        );

        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(foo.clone())
            .add_path(bar.clone());
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Renamed { from: file("src/foo.erl"), to: file("src/bar.erl") }]
        );

        // A lone rename half is resolved by looking at the file system.
        let event =
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any))).add_path(foo);
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Added(file("src/foo.erl"))]
        );
        let event =
            Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any))).add_path(bar);
        assert_eq!(
            translate(&project, &index, &event),
            [FileEvent::Removed(file("src/bar.erl"))]
        );
    }

    #[test]
    fn test_translate_skips_hidden_and_foreign_paths() {
        let (_dir, project) = setup();
        let index = project.index();
        for hidden in [".git/objects/x.erl", "src/.x.erl"] {
            let event = Event::new(EventKind::Create(CreateKind::File))
                .add_path(project.root().join(hidden));
            assert!(translate(&project, &index, &event).is_empty());
        }

        let other = tempfile::tempdir().unwrap();
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(other.path().join("x.erl"));
        assert!(translate(&project, &index, &event).is_empty());
    }

    #[test]
    fn test_translate_moves_into_hidden_directory() {
        let (_dir, project) = setup();
        let mut index = project.index();
        fs::create_dir_all(project.root().join(".trash")).unwrap();
        fs::rename(project.root().join("src/foo.erl"), project.root().join(".trash/foo.erl"))
            .unwrap();
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(project.root().join("src/foo.erl"))
            .add_path(project.root().join(".trash/foo.erl"));
        apply(&project, &mut index, event);
        assert!(index.is_empty());
        assert_eq!(index, project.index());
    }

    #[test]
    fn test_directory_events_match_rebuild() {
        let (_dir, project) = setup();
        write(&project, "src/lib/bar.erl");
        let mut index = project.index();
        assert_eq!(index.len(), 2);

        // Removing a directory retracts everything below it.
        fs::remove_dir_all(project.root().join("src")).unwrap();
        let event = Event::new(EventKind::Remove(RemoveKind::Folder))
            .add_path(project.root().join("src"));
        apply(&project, &mut index, event);
        assert!(index.is_empty());
        assert_eq!(index, project.index());

        // A directory moved in from elsewhere is scanned.
        write(&project, "apps/a.erl");
        write(&project, "apps/deep/b.erl");
        write(&project, "apps/.hidden/c.erl");
        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(project.root().join("apps"));
        apply(&project, &mut index, event);
        assert_eq!(index.module_names().len(), 2);
        assert_eq!(index, project.index());

        // Renaming a directory moves all of its files.
        fs::rename(project.root().join("apps"), project.root().join("lib")).unwrap();
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(project.root().join("apps"))
            .add_path(project.root().join("lib"));
        apply(&project, &mut index, event);
        let b: Vec<_> = index.files_for_module("b").into_iter().collect();
        assert_eq!(b, [file("lib/deep/b.erl")]);
        assert!(index.files_below(file("apps").vpath()).is_empty());
        assert_eq!(index, project.index());
    }

    #[test]
    fn test_manifest_detection() {
        let (_dir, project) = setup();
        assert!(is_manifest(&project, &project.root().join("erlscope.toml")));
        assert!(!is_manifest(&project, &project.root().join("src/erlscope.toml")));
    }

    #[test]
    fn test_manifest_change_keeps_other_paths() {
        let (_dir, project) = setup();
        let index = SharedIndex::new(project.index());
        write(&project, "lib/bar.erl");
        fs::write(project.root().join(MANIFEST), "[index]\nsource-roots = [\"lib\"]\n")
            .unwrap();

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(project.root().join(MANIFEST))
            .add_path(project.root().join("lib/bar.erl"));
        process(&project, &index, &event).unwrap();

        let rebuilt = Project::open(Some(project.root())).unwrap().index();
        assert_eq!(index.read().module_names(), rebuilt.module_names());
        assert_eq!(*index.read(), rebuilt);
        assert_eq!(index.files_for_module("bar").len(), 1);
    }

    #[test]
    fn test_translated_events_update_index() {
        let (_dir, project) = setup();
        let mut index = project.index();
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(project.root().join("src/foo.erl"))
            .add_path(project.root().join("src/bar.erl"));
        let events = translate(&project, &index, &event);
        for event in events {
            assert_eq!(module_of(&index, event), ["foo"]);
            index.apply(event);
            assert_eq!(module_of(&index, event), ["bar"]);
        }
        assert_eq!(index.module_names().len(), 1);
    }
}
