use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// erlscope completes keywords in and indexes the modules of Erlang projects
#[derive(Debug, Clone, Parser)]
#[clap(name = "erlscope", version, author)]
pub struct CliArguments {
    /// The erlscope command to run
    #[command(subcommand)]
    pub command: Command,

    /// Sets the level of logging verbosity:
    /// -v = info, -vv = debug, -vvv = trace
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,
}

/// What to do.
#[derive(Debug, Clone, Subcommand)]
#[command()]
pub enum Command {
    /// Lists the keywords that can be typed at a position in a file
    Complete(CompleteCommand),

    /// Reports the syntax errors in a file
    Check(CheckCommand),

    /// Lists the modules of a project and the files defining them
    #[command(visible_alias = "m")]
    Modules(ModulesCommand),

    /// Keeps the module index of a project up to date and reports changes
    #[command(visible_alias = "w")]
    Watch(WatchCommand),
}

/// Lists the keywords that can be typed at a position in a file
#[derive(Debug, Clone, Parser)]
pub struct CompleteCommand {
    /// Path to the Erlang file
    pub input: PathBuf,

    /// Byte offset of the cursor in the file
    pub offset: usize,

    /// Lists every kind of token that may follow, not only keywords
    #[arg(long)]
    pub all: bool,
}

/// Reports the syntax errors in a file
#[derive(Debug, Clone, Parser)]
pub struct CheckCommand {
    /// Path to the Erlang file
    pub input: PathBuf,
}

/// Lists the modules of a project and the files defining them
#[derive(Debug, Clone, Parser)]
pub struct ModulesCommand {
    /// Only lists the files defining this module
    pub module: Option<String>,

    /// The project root, defaults to the current directory
    #[clap(long = "root", env = "ERLSCOPE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Keeps the module index of a project up to date and reports changes
#[derive(Debug, Clone, Parser)]
pub struct WatchCommand {
    /// The project root, defaults to the current directory
    #[clap(long = "root", env = "ERLSCOPE_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,
}
