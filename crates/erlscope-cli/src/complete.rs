use std::io::{self, Write};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use ecow::{eco_format, EcoString};
use erlscope_index::diag::StrResult;
use erlscope_syntax::{parse_text, SyntaxError};

use crate::args::{CheckCommand, CompleteCommand};
use crate::{color_stream, read_source, set_failed};

/// Execute a completion command.
pub fn complete(command: &CompleteCommand) -> StrResult<()> {
    let text = read_source(&command.input)?;
    let labels: Vec<EcoString> = if command.all {
        erlscope_ide::expected_kinds(&text, command.offset)
            .map_err(|err| eco_format!("{err}"))?
            .into_iter()
            .map(|kind| kind.text().unwrap_or(kind.name()).into())
            .collect()
    } else {
        erlscope_ide::autocomplete(&text, command.offset)
            .map_err(|err| eco_format!("{err}"))?
            .into_iter()
            .map(|completion| completion.label)
            .collect()
    };

    let mut out = io::stdout().lock();
    for label in labels {
        writeln!(out, "{label}").map_err(|err| eco_format!("failed to print ({err})"))?;
    }
    Ok(())
}

/// Execute a syntax check command.
pub fn check(command: &CheckCommand) -> StrResult<()> {
    let text = read_source(&command.input)?;
    let errors = parse_text(&text).errors();
    tracing::info!(errors = errors.len(), "checked {}", command.input.display());
    if errors.is_empty() {
        return Ok(());
    }

    set_failed();
    let file = SimpleFile::new(command.input.display().to_string(), text);
    print_diagnostics(&file, errors)
        .map_err(|err| eco_format!("failed to print diagnostics ({err})"))
}

/// Print syntax errors to the terminal.
fn print_diagnostics(
    file: &SimpleFile<String, String>,
    errors: Vec<SyntaxError>,
) -> Result<(), codespan_reporting::files::Error> {
    let mut w = color_stream();
    let config = term::Config { tab_width: 4, ..Default::default() };

    for error in errors {
        let diag = Diagnostic::error()
            .with_message(error.message)
            .with_notes(error.hints.iter().map(|hint| format!("hint: {hint}")).collect())
            .with_labels(vec![Label::primary((), error.range)]);

        term::emit(&mut w, &config, file, &diag)?;
    }

    Ok(())
}
