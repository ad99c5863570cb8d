//! Capabilities for Erlang IDE support.

mod complete;

pub use self::complete::{
    autocomplete, expected_kinds, Completion, CompletionError, CompletionKind,
};
