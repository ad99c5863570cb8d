use std::io::{self, Write};

use ecow::eco_format;
use erlscope_index::diag::StrResult;
use erlscope_index::{bail, FileId};

use crate::args::ModulesCommand;
use crate::project::Project;

/// Execute a module listing command.
pub fn modules(command: &ModulesCommand) -> StrResult<()> {
    let project = Project::open(command.root.as_deref())?;
    let index = project.index();
    tracing::info!(modules = index.len(), "indexed {}", project.root().display());

    let mut out = io::stdout().lock();
    let mut print = |line: &str| {
        writeln!(out, "{line}").map_err(|err| eco_format!("failed to print ({err})"))
    };

    if let Some(name) = &command.module {
        let files = index.files_for_module(name);
        if files.is_empty() {
            bail!("module `{name}` not found");
        }
        for file in files {
            print(display(file))?;
        }
        return Ok(());
    }

    for (name, files) in index.iter() {
        let files: Vec<_> = files.iter().map(|&file| display(file)).collect();
        print(&eco_format!("{name}: {}", files.join(", ")))?;
    }

    Ok(())
}

/// A file's path relative to the project root.
fn display(file: FileId) -> &'static str {
    file.vpath().get_without_slash()
}
