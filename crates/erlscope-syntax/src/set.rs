// Acknowledgement:
// Based on rust-analyzer's `TokenSet`.
// https://github.com/rust-lang/rust-analyzer/blob/master/crates/parser/src/token_set.rs

use std::fmt::{self, Debug, Formatter};

use crate::SyntaxKind;

/// A set of syntax kinds.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SyntaxSet(u128);

impl SyntaxSet {
    /// Create a new empty set.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Insert a syntax kind into the set.
    ///
    /// You can only add kinds with discriminator < 128.
    pub const fn add(self, kind: SyntaxKind) -> Self {
        assert!((kind as u8) < BITS);
        Self(self.0 | bit(kind))
    }

    /// Whether the set contains the given syntax kind.
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        (kind as u8) < BITS && (self.0 & bit(kind)) != 0
    }

    /// Whether the set is empty.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate over the kinds in the set in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = SyntaxKind> {
        (0..BITS)
            .filter(move |&i| self.0 & (1 << i) != 0)
            .filter_map(SyntaxKind::terminal)
    }
}

impl Debug for SyntaxSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SyntaxKind> for SyntaxSet {
    fn from_iter<I: IntoIterator<Item = SyntaxKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::add)
    }
}

const BITS: u8 = 128;

const fn bit(kind: SyntaxKind) -> u128 {
    1 << (kind as usize)
}

/// The kinds a grammar would have accepted at the point where parsing
/// stalled.
///
/// Kinds are kept in the order they were first inserted and duplicates are
/// dropped.
#[derive(Default, Clone, Eq, PartialEq)]
pub struct ExpectedSet {
    seen: SyntaxSet,
    order: Vec<SyntaxKind>,
}

impl ExpectedSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a kind unless it was seen before.
    pub fn insert(&mut self, kind: SyntaxKind) {
        if !self.seen.contains(kind) {
            self.seen = self.seen.add(kind);
            self.order.push(kind);
        }
    }

    /// Insert every kind of a syntax set.
    pub fn extend(&mut self, set: SyntaxSet) {
        for kind in set.iter() {
            self.insert(kind);
        }
    }

    /// Whether the kind was inserted.
    pub fn contains(&self, kind: SyntaxKind) -> bool {
        self.seen.contains(kind)
    }

    /// The number of distinct kinds.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The kinds in order of first insertion.
    pub fn iter(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        self.order.iter().copied()
    }

    /// The keywords among the kinds, in order of first insertion.
    pub fn keywords(&self) -> impl Iterator<Item = SyntaxKind> + '_ {
        self.iter().filter(|kind| kind.is_keyword())
    }
}

impl Debug for ExpectedSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Generate an inline const syntax set of the given kinds.
///
/// Example: `if syntax_set!(Plus, Minus).contains(SyntaxKind::Plus) { }`
macro_rules! syntax_set {
    ( $($kind:ident),* $(,)? ) => {
        { // 'SET' never escapes this inner block
            const SET: crate::set::SyntaxSet = crate::set::SyntaxSet::new()
                $(.add(crate::SyntaxKind:: $kind))*;
            SET
        }
    }
}

// Export so other modules can import as: `use set::syntax_set`
pub(crate) use syntax_set;

/// Just build a syntax set of the given kinds. Only used in this file.
macro_rules! make_set {
    ( $($kind:ident),* $(,)? ) => {
        SyntaxSet::new()
        $(.add(SyntaxKind::$kind))*
    }
}

/// Attribute names the grammar recognizes, in the order they are tried.
pub const ATTRIBUTE_NAMES: [SyntaxKind; 20] = [
    SyntaxKind::Module,
    SyntaxKind::Export,
    SyntaxKind::Import,
    SyntaxKind::ExportType,
    SyntaxKind::Behaviour,
    SyntaxKind::Behavior,
    SyntaxKind::Record,
    SyntaxKind::Define,
    SyntaxKind::Undef,
    SyntaxKind::Include,
    SyntaxKind::IncludeLib,
    SyntaxKind::Ifdef,
    SyntaxKind::Ifndef,
    SyntaxKind::Endif,
    SyntaxKind::Spec,
    SyntaxKind::Callback,
    SyntaxKind::Type,
    SyntaxKind::Opaque,
    SyntaxKind::Compile,
    SyntaxKind::OnLoad,
];

/// Syntax kinds that can start an atomic expression.
pub const EXPR_PRIMARY: SyntaxSet = make_set!(
    Var,
    Atom,
    Integer,
    Float,
    Char,
    Str,
    LeftParen,
    LeftBracket,
    LeftBrace,
    LeftAngles,
    Hash,
    Question,
    Fun,
    Case,
    If,
    Receive,
    Try,
    Begin,
    Maybe,
);

/// Syntax kinds that are prefix operators.
pub const UNARY_OP: SyntaxSet = make_set!(Plus, Minus, Bnot, Not);

/// Syntax kinds that are infix operators.
pub const BINARY_OP: SyntaxSet = make_set!(
    Eq, Excl, OrElse, AndAlso, EqEq, SlashEq, EqLt, Lt, GtEq, Gt, EqColonEq,
    EqSlashEq, PlusPlus, MinusMinus, Plus, Minus, Bor, Bxor, Bsl, Bsr, Or, Xor,
    Slash, Star, Div, Rem, Band, And,
);

/// Syntax kinds that can start a type expression.
pub const TYPE: SyntaxSet = make_set!(
    Var,
    Atom,
    Integer,
    Char,
    Minus,
    LeftParen,
    LeftBracket,
    LeftBrace,
    LeftAngles,
    Hash,
    Question,
    Fun,
);
