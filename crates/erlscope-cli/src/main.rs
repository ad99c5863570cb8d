mod args;
mod complete;
mod modules;
mod project;
mod trace;
mod watch;

use std::cell::Cell;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use codespan_reporting::term::{self, termcolor};
use ecow::eco_format;
use erlscope_index::diag::StrResult;
use termcolor::{ColorChoice, WriteColor};

use crate::args::{CliArguments, Command};

thread_local! {
    static EXIT: Cell<ExitCode> = const { Cell::new(ExitCode::SUCCESS) };
}

/// Entry point.
fn main() -> ExitCode {
    let arguments = CliArguments::parse();
    crate::trace::init_tracing(&arguments);

    let res = match &arguments.command {
        Command::Complete(command) => complete::complete(command),
        Command::Check(command) => complete::check(command),
        Command::Modules(command) => modules::modules(command),
        Command::Watch(command) => watch::watch(command),
    };

    if let Err(msg) = res {
        set_failed();
        if let Err(err) = print_error(&msg) {
            eprintln!("failed to print error ({err}): {msg}");
        }
    }

    EXIT.with(|cell| cell.get())
}

/// Ensure a failure exit code.
fn set_failed() {
    EXIT.with(|cell| cell.set(ExitCode::FAILURE));
}

/// Print an application-level error (independent from a source file).
fn print_error(msg: &str) -> io::Result<()> {
    let mut w = color_stream();
    let styles = term::Styles::default();

    w.set_color(&styles.header_error)?;
    write!(w, "error")?;

    w.reset()?;
    writeln!(w, ": {msg}.")
}

/// Get stderr with color support if desirable.
fn color_stream() -> termcolor::StandardStream {
    termcolor::StandardStream::stderr(if std::io::stderr().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    })
}

/// Read a source file into a string.
fn read_source(path: &Path) -> StrResult<String> {
    std::fs::read_to_string(path)
        .map_err(|err| eco_format!("failed to read {} ({err})", path.display()))
}
