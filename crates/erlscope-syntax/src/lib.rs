//! Truncation-tolerant lexer and parser for Erlang source files.
//!
//! Besides a lossless syntax tree, every parse reports which kinds of tokens
//! the grammar would have accepted where the input ends. This is what keyword
//! completion is built on.

pub mod set;

mod kind;
mod lexer;
mod node;
mod parser;

pub use self::kind::SyntaxKind;
pub use self::lexer::{is_name_continue, is_newline, tokenize, Token};
pub use self::node::{SyntaxError, SyntaxNode};
pub use self::parser::{parse, parse_text, ParseAttempt};
pub use self::set::{ExpectedSet, SyntaxSet};
