use std::fmt::{self, Display, Formatter};

use ecow::{eco_format, EcoString};
use erlscope_syntax::{is_name_continue, parse, tokenize, SyntaxKind, Token};
use serde::Serialize;

/// Autocomplete the keyword being typed at a cursor position.
///
/// The word the cursor sits in (or right after) is cut off, and everything in
/// front of it is re-parsed as if the file ended there. The result holds the
/// keywords the grammar would have accepted at that point, in the order it
/// tried them.
///
/// Anything after the cursor has no influence on the result. Malformed
/// input yields fewer or no completions, but never an error. The only error
/// is a cursor that does not point into `text`.
#[tracing::instrument(skip(text))]
pub fn autocomplete(text: &str, cursor: usize) -> Result<Vec<Completion>, CompletionError> {
    let completions = expected_kinds(text, cursor)?
        .into_iter()
        .filter(|kind| kind.is_keyword())
        .filter_map(Completion::keyword)
        .collect();
    Ok(completions)
}

/// All kinds of tokens the grammar would have accepted at a cursor position.
///
/// Works like [`autocomplete`], but also returns punctuation, literals and
/// names. Useful for hosts that want to offer more than keywords.
pub fn expected_kinds(text: &str, cursor: usize) -> Result<Vec<SyntaxKind>, CompletionError> {
    let anchor = anchor(text, cursor)?;
    let prefix = &text[..anchor];
    let tokens = if prefix.is_empty() {
        vec![Token::placeholder(0)]
    } else {
        tokenize(prefix)
    };

    let attempt = parse(&tokens, None);
    tracing::trace!(anchor, expected = ?attempt.expected, "parsed prefix");
    Ok(attempt.expected.iter().collect())
}

/// The start of the word that ends at the cursor.
fn anchor(text: &str, cursor: usize) -> Result<usize, CompletionError> {
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return Err(CompletionError::InvalidOffset { offset: cursor, len: text.len() });
    }

    let before = &text[..cursor];
    let word = before
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_name_continue(c))
        .last();

    Ok(word.map_or(cursor, |(i, _)| i))
}

/// An autocompletion option.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct Completion {
    /// The kind of item this completes to.
    pub kind: CompletionKind,
    /// The label the completion is shown with.
    pub label: EcoString,
    /// A short description of the completion.
    pub detail: Option<EcoString>,
}

impl Completion {
    /// A completion for a keyword kind, if it has fixed text.
    fn keyword(kind: SyntaxKind) -> Option<Self> {
        let label = kind.text()?;
        let (kind, detail) = if kind.is_attribute_name() {
            (CompletionKind::Attribute, eco_format!("-{label}(...)"))
        } else {
            (CompletionKind::Keyword, eco_format!("reserved word"))
        };
        Some(Self { kind, label: label.into(), detail: Some(detail) })
    }
}

/// A kind of item that can be completed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionKind {
    /// A reserved word of the language.
    Keyword,
    /// The name of a module attribute.
    Attribute,
}

/// A completion request that could not be answered.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CompletionError {
    /// The cursor is past the end of the text or inside a character.
    InvalidOffset { offset: usize, len: usize },
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidOffset { offset, len } => write!(
                f,
                "cursor offset {offset} is not a character boundary \
                 in a text of length {len}"
            ),
        }
    }
}

impl std::error::Error for CompletionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn labels(text: &str, cursor: usize) -> Vec<EcoString> {
        autocomplete(text, cursor)
            .unwrap()
            .into_iter()
            .map(|completion| completion.label)
            .collect()
    }

    #[track_caller]
    fn test(text: &str, cursor: usize, contains: &[&str], excludes: &[&str]) {
        let labels = labels(text, cursor);
        for label in contains {
            assert!(labels.iter().any(|l| l == label), "{label} missing in {labels:?}");
        }
        for label in excludes {
            assert!(!labels.iter().any(|l| l == label), "{label} unexpected in {labels:?}");
        }
    }

    #[test]
    fn test_autocomplete_empty_file() {
        test("", 0, &["module", "export", "import"], &["case", "end"]);
    }

    #[test]
    fn test_autocomplete_attribute_name() {
        test("-mod", 4, &["module", "export", "record", "define"], &["case"]);
        test("-module(foo).\n-exp", 18, &["export", "export_type"], &[]);
    }

    #[test]
    fn test_autocomplete_expression_keywords() {
        let text = "-module(m).\nf(X) -> ca";
        test(text, text.len(), &["case", "begin", "fun", "try", "receive"], &["module"]);
        let text = "f(X) -> case X of 1 -> ok e";
        test(text, text.len(), &["end", "andalso"], &["module"]);
    }

    #[test]
    fn test_autocomplete_guard_keyword() {
        let text = "f(X) wh";
        test(text, text.len(), &["when"], &["case"]);
    }

    #[test]
    fn test_autocomplete_unfinished_attribute_is_ok() {
        let text = "-module(x";
        assert_eq!(autocomplete(text, text.len()), Ok(vec![]));
        assert!(autocomplete("-module(", 8).is_ok());
    }

    #[test]
    fn test_autocomplete_inside_unfinished_literal_is_empty() {
        for text in ["f() -> \"ab", "f() -> 'ab", "-module(m).\nf() -> \"a b"] {
            assert_eq!(autocomplete(text, text.len()), Ok(vec![]), "{text:?}");
        }
    }

    #[test]
    fn test_autocomplete_survives_deep_nesting() {
        let text = format!("f() -> {}", "(".repeat(100_000));
        assert!(autocomplete(&text, text.len()).is_ok());
        let text = format!("-spec f({}", "{".repeat(100_000));
        assert!(autocomplete(&text, text.len()).is_ok());
    }

    #[test]
    fn test_autocomplete_is_deterministic() {
        let text = "-module(m).\nf() -> try ok of _ -> ok c";
        for cursor in 0..=text.len() {
            assert_eq!(autocomplete(text, cursor), autocomplete(text, cursor));
        }
    }

    #[test]
    fn test_autocomplete_is_prefix_local() {
        let text = "-module(m).\n-export([f/0]).\nf() -> case x of a -> b end.\n";
        for cursor in 0..=text.len() {
            let mut changed = text[..cursor].to_string();
            changed.push_str(" ) garbage 'unclosed \"");
            assert_eq!(
                autocomplete(text, cursor),
                autocomplete(&changed, cursor),
                "at {cursor}"
            );
        }
    }

    #[test]
    fn test_autocomplete_at_start_is_never_empty() {
        for text in ["", "garbage", ")))", "f() -> ok.", "-module(m)."] {
            assert!(!labels(text, 0).is_empty(), "{text:?}");
        }
    }

    #[test]
    fn test_autocomplete_never_fails_on_malformed_input() {
        let text = "-module(]. f( -> <<'x \"y $";
        for (cursor, _) in text.char_indices() {
            assert!(autocomplete(text, cursor).is_ok());
        }
    }

    #[test]
    fn test_autocomplete_rejects_invalid_offset() {
        assert_eq!(
            autocomplete("-mod", 5),
            Err(CompletionError::InvalidOffset { offset: 5, len: 4 })
        );
        assert!(matches!(
            autocomplete("'ä'", 2),
            Err(CompletionError::InvalidOffset { offset: 2, .. })
        ));
    }

    #[test]
    fn test_autocomplete_suppresses_duplicates() {
        let labels = labels("f() -> ", 7);
        for (i, label) in labels.iter().enumerate() {
            assert!(!labels[i + 1..].contains(label), "{label} repeated");
        }
    }

    #[test]
    fn test_expected_kinds_include_punctuation() {
        let kinds = expected_kinds("-module", 7).unwrap();
        assert!(kinds.contains(&SyntaxKind::Module));
        let kinds = expected_kinds("-module(m).\nf", 13).unwrap();
        assert!(kinds.contains(&SyntaxKind::Atom));
        assert!(kinds.contains(&SyntaxKind::Minus));
    }

    #[test]
    fn test_completion_kinds() {
        let completions = autocomplete("-", 1).unwrap();
        for completion in completions {
            let attribute = completion.label != "else";
            assert_eq!(completion.kind == CompletionKind::Attribute, attribute);
        }
        let completions = autocomplete("f() -> ", 7).unwrap();
        assert!(completions.iter().all(|c| c.kind == CompletionKind::Keyword));
    }
}
