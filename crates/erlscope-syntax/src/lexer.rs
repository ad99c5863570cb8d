use std::ops::Range;

use ecow::{eco_format, EcoString};
use unicode_ident::is_xid_continue;
use unscanny::Scanner;

use crate::{SyntaxError, SyntaxKind};

/// A lexical token of an Erlang file.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Token {
    /// The token's kind.
    pub kind: SyntaxKind,
    /// The exact source text of the token.
    pub text: EcoString,
    /// The byte range of the token in the tokenized text.
    pub range: Range<usize>,
    /// Why the token is invalid. Only set for [`SyntaxKind::Error`] tokens.
    pub error: Option<SyntaxError>,
}

impl Token {
    /// Create a valid token of the given kind.
    pub fn new(kind: SyntaxKind, text: impl Into<EcoString>, range: Range<usize>) -> Self {
        Self { kind, text: text.into(), range, error: None }
    }

    /// A placeholder token of zero width at the given offset.
    pub fn placeholder(at: usize) -> Self {
        Self::new(SyntaxKind::Placeholder, EcoString::new(), at..at)
    }
}

/// Split a text into tokens.
///
/// Never fails: characters that do not form a valid token end up in
/// [`SyntaxKind::Error`] tokens. Concatenating the texts of the returned
/// tokens yields the input again. The end of input is implicit and not part
/// of the result.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(text);
    let mut tokens = vec![];
    while let Some(token) = lexer.next() {
        tokens.push(token);
    }
    tokens
}

/// An iterator over a source code string which returns tokens.
#[derive(Clone)]
struct Lexer<'s> {
    /// The scanner: contains the underlying string and location as a "cursor".
    s: Scanner<'s>,
    /// An error for the last token.
    error: Option<SyntaxError>,
}

impl<'s> Lexer<'s> {
    fn new(text: &'s str) -> Self {
        Self { s: Scanner::new(text), error: None }
    }

    /// Construct a syntax error for the current token.
    fn error(&mut self, message: impl Into<EcoString>) -> SyntaxKind {
        self.error = Some(SyntaxError::new(message));
        SyntaxKind::Error
    }

    /// If the current token is an error, adds a hint.
    fn hint(&mut self, message: impl Into<EcoString>) {
        if let Some(error) = &mut self.error {
            error.hints.push(message.into());
        }
    }

    /// Return the next token in our text or `None` at the end.
    fn next(&mut self) -> Option<Token> {
        debug_assert!(self.error.is_none());
        let start = self.s.cursor();
        let c = self.s.eat()?;

        let kind = match c {
            c if c.is_whitespace() => {
                self.s.eat_while(char::is_whitespace);
                SyntaxKind::Space
            }
            '%' => {
                self.s.eat_until(is_newline);
                SyntaxKind::Comment
            }
            c if c.is_lowercase() => self.atom(start),
            c if c.is_uppercase() || c == '_' => {
                self.s.eat_while(is_name_continue);
                SyntaxKind::Var
            }
            '0'..='9' => self.number(start),
            '\'' => self.quoted(),
            '"' => self.string(),
            '$' => self.char(),
            c => self.punctuation(c),
        };

        let range = start..self.s.cursor();
        let text = self.s.from(start);
        Some(Token {
            kind,
            text: text.into(),
            range,
            error: self.error.take(),
        })
    }

    fn atom(&mut self, start: usize) -> SyntaxKind {
        self.s.eat_while(is_name_continue);
        reserved(self.s.from(start)).unwrap_or(SyntaxKind::Atom)
    }

    fn number(&mut self, start: usize) -> SyntaxKind {
        self.s.eat_while(|c: char| c.is_ascii_digit() || c == '_');
        let digits = self.s.from(start);
        if digits.ends_with('_') || digits.contains("__") {
            return self.error("invalid digit separator in number");
        }

        // Based integers: `16#ff`.
        if self.s.at('#') && self.s.scout(1).is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.s.eat();
            let value = self.s.eat_while(|c: char| c.is_ascii_alphanumeric() || c == '_');
            let base = digits.replace('_', "").parse::<u32>().unwrap_or(0);
            if !(2..=36).contains(&base) {
                return self.error(eco_format!("invalid number base {digits}"));
            }
            if value.ends_with('_')
                || !value.chars().all(|c| c == '_' || c.is_digit(base))
            {
                let kind = self.error(eco_format!("invalid digit for base {base}"));
                self.hint(eco_format!("base {base} numbers can only use digits below {base}"));
                return kind;
            }
            return SyntaxKind::Integer;
        }

        // A fraction needs a digit after the dot, otherwise the dot ends the
        // form.
        if !(self.s.at('.') && self.s.scout(1).is_some_and(|c| c.is_ascii_digit())) {
            return SyntaxKind::Integer;
        }

        self.s.eat();
        self.s.eat_while(|c: char| c.is_ascii_digit() || c == '_');

        let exponent = match (self.s.scout(1), self.s.scout(2)) {
            (Some(c), _) if c.is_ascii_digit() => true,
            (Some('+' | '-'), Some(c)) => c.is_ascii_digit(),
            _ => false,
        };
        if self.s.at(['e', 'E']) && exponent {
            self.s.eat();
            self.s.eat_if(['+', '-']);
            self.s.eat_while(|c: char| c.is_ascii_digit());
        }

        if self.s.from(start).ends_with('_') {
            return self.error("invalid digit separator in number");
        }

        SyntaxKind::Float
    }

    /// Eat until the closing delimiter, skipping escaped delimiters.
    fn delimited(&mut self, delim: char) -> bool {
        let mut escaped = false;
        self.s.eat_until(|c| {
            let stop = c == delim && !escaped;
            escaped = c == '\\' && !escaped;
            stop
        });
        self.s.eat_if(delim)
    }

    fn quoted(&mut self) -> SyntaxKind {
        if !self.delimited('\'') {
            return self.error("unclosed quoted atom");
        }
        SyntaxKind::Atom
    }

    fn string(&mut self) -> SyntaxKind {
        if !self.delimited('"') {
            return self.error("unclosed string");
        }
        SyntaxKind::Str
    }

    fn char(&mut self) -> SyntaxKind {
        match self.s.eat() {
            Some('\\') => self.escape(),
            Some(_) => SyntaxKind::Char,
            None => self.error("expected character after `$`"),
        }
    }

    fn escape(&mut self) -> SyntaxKind {
        match self.s.eat() {
            Some('0'..='7') => {
                for _ in 0..2 {
                    self.s.eat_if(|c: char| matches!(c, '0'..='7'));
                }
            }
            Some('x') => {
                if self.s.eat_if('{') {
                    self.s.eat_while(|c: char| c.is_ascii_hexdigit());
                    if !self.s.eat_if('}') {
                        return self.error("unclosed unicode escape sequence");
                    }
                } else {
                    for _ in 0..2 {
                        self.s.eat_if(|c: char| c.is_ascii_hexdigit());
                    }
                }
            }
            Some('^') => {
                if self.s.eat().is_none() {
                    return self.error("expected control character after `^`");
                }
            }
            Some(_) => {}
            None => return self.error("unfinished escape sequence"),
        }
        SyntaxKind::Char
    }

    fn punctuation(&mut self, c: char) -> SyntaxKind {
        match c {
            '(' => SyntaxKind::LeftParen,
            ')' => SyntaxKind::RightParen,
            '[' => SyntaxKind::LeftBracket,
            ']' => SyntaxKind::RightBracket,
            '{' => SyntaxKind::LeftBrace,
            '}' => SyntaxKind::RightBrace,
            ',' => SyntaxKind::Comma,
            ';' => SyntaxKind::Semicolon,
            '#' => SyntaxKind::Hash,
            '?' => SyntaxKind::Question,
            '!' => SyntaxKind::Excl,
            '*' => SyntaxKind::Star,

            '|' if self.s.eat_if('|') => SyntaxKind::PipePipe,
            '|' => SyntaxKind::Pipe,

            '<' if self.s.eat_if('<') => SyntaxKind::LeftAngles,
            '<' if self.s.eat_if('-') => SyntaxKind::LeftArrow,
            '<' if self.s.eat_if('=') => SyntaxKind::DoubleLeftArrow,
            '<' => SyntaxKind::Lt,

            '>' if self.s.eat_if('>') => SyntaxKind::RightAngles,
            '>' if self.s.eat_if('=') => SyntaxKind::GtEq,
            '>' => SyntaxKind::Gt,

            '=' if self.s.eat_if(":=") => SyntaxKind::EqColonEq,
            '=' if self.s.eat_if("/=") => SyntaxKind::EqSlashEq,
            '=' if self.s.eat_if('=') => SyntaxKind::EqEq,
            '=' if self.s.eat_if('<') => SyntaxKind::EqLt,
            '=' if self.s.eat_if('>') => SyntaxKind::FatArrow,
            '=' => SyntaxKind::Eq,

            ':' if self.s.eat_if(':') => SyntaxKind::ColonColon,
            ':' if self.s.eat_if('=') => SyntaxKind::ColonEq,
            ':' => SyntaxKind::Colon,

            '-' if self.s.eat_if('>') => SyntaxKind::Arrow,
            '-' if self.s.eat_if('-') => SyntaxKind::MinusMinus,
            '-' => SyntaxKind::Minus,

            '+' if self.s.eat_if('+') => SyntaxKind::PlusPlus,
            '+' => SyntaxKind::Plus,

            '/' if self.s.eat_if('=') => SyntaxKind::SlashEq,
            '/' => SyntaxKind::Slash,

            '.' if self.s.eat_if("..") => SyntaxKind::Ellipsis,
            '.' if self.s.eat_if('.') => SyntaxKind::Dots,
            '.' => SyntaxKind::Dot,

            c => self.error(eco_format!("the character `{c}` is not valid here")),
        }
    }
}

/// Try to parse a bare atom into a reserved word.
fn reserved(ident: &str) -> Option<SyntaxKind> {
    Some(match ident {
        "after" => SyntaxKind::After,
        "and" => SyntaxKind::And,
        "andalso" => SyntaxKind::AndAlso,
        "band" => SyntaxKind::Band,
        "begin" => SyntaxKind::Begin,
        "bnot" => SyntaxKind::Bnot,
        "bor" => SyntaxKind::Bor,
        "bsl" => SyntaxKind::Bsl,
        "bsr" => SyntaxKind::Bsr,
        "bxor" => SyntaxKind::Bxor,
        "case" => SyntaxKind::Case,
        "catch" => SyntaxKind::Catch,
        "cond" => SyntaxKind::Cond,
        "div" => SyntaxKind::Div,
        "else" => SyntaxKind::Else,
        "end" => SyntaxKind::End,
        "fun" => SyntaxKind::Fun,
        "if" => SyntaxKind::If,
        "let" => SyntaxKind::Let,
        "maybe" => SyntaxKind::Maybe,
        "not" => SyntaxKind::Not,
        "of" => SyntaxKind::Of,
        "or" => SyntaxKind::Or,
        "orelse" => SyntaxKind::OrElse,
        "receive" => SyntaxKind::Receive,
        "rem" => SyntaxKind::Rem,
        "try" => SyntaxKind::Try,
        "when" => SyntaxKind::When,
        "xor" => SyntaxKind::Xor,
        _ => return None,
    })
}

/// Whether a character is interpreted as a newline.
#[inline]
pub fn is_newline(character: char) -> bool {
    matches!(character, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whether a character can continue an atom or a variable.
#[inline]
pub fn is_name_continue(c: char) -> bool {
    is_xid_continue(c) || c == '@'
}
