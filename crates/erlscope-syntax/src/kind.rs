/// A syntactical building block of an Erlang file.
///
/// Can be created by the lexer or by the parser. Terminal kinds come first so
/// that their discriminants stay below 128 and fit into a
/// [`SyntaxSet`](crate::SyntaxSet).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum SyntaxKind {
    /// The end of token stream.
    Eof,
    /// An invalid sequence of characters.
    Error,
    /// Stands in for whatever is being typed at a completion cursor.
    Placeholder,

    /// Whitespace.
    Space,
    /// A line comment: `% ...`.
    Comment,

    /// An atom: `ok`, `'Quoted atom'`.
    Atom,
    /// A variable: `Name`, `_Ignored`.
    Var,
    /// An integer: `42`, `16#ff`, `1_000`.
    Integer,
    /// A floating-point number: `1.5`, `2.0e-3`.
    Float,
    /// A character literal: `$a`, `$\n`.
    Char,
    /// A string: `"hello"`.
    Str,

    /// The opening paren of a group or argument list: `(`.
    LeftParen,
    /// The closing paren of a group or argument list: `)`.
    RightParen,
    /// The opening bracket of a list: `[`.
    LeftBracket,
    /// The closing bracket of a list: `]`.
    RightBracket,
    /// The opening brace of a tuple, map or record: `{`.
    LeftBrace,
    /// The closing brace of a tuple, map or record: `}`.
    RightBrace,
    /// The opening delimiter of a binary: `<<`.
    LeftAngles,
    /// The closing delimiter of a binary: `>>`.
    RightAngles,
    /// A comma separator: `,`.
    Comma,
    /// The terminator of a form: `.`.
    Dot,
    /// A semicolon separating clauses: `;`.
    Semicolon,
    /// A colon in remote calls and binary sizes: `:`.
    Colon,
    /// A double colon for type annotations: `::`.
    ColonColon,
    /// The tail separator of a list and type union operator: `|`.
    Pipe,
    /// The comprehension separator: `||`.
    PipePipe,
    /// The arrow between clause head and body: `->`.
    Arrow,
    /// A list generator: `<-`.
    LeftArrow,
    /// A binary generator: `<=`.
    DoubleLeftArrow,
    /// A map association: `=>`.
    FatArrow,
    /// A map update: `:=`.
    ColonEq,
    /// The record and map sigil: `#`.
    Hash,
    /// The macro sigil: `?`.
    Question,
    /// The send operator: `!`.
    Excl,
    /// The match operator: `=`.
    Eq,
    /// The equality operator: `==`.
    EqEq,
    /// The inequality operator: `/=`.
    SlashEq,
    /// The less-than-or-equal operator: `=<`.
    EqLt,
    /// The less-than operator: `<`.
    Lt,
    /// The greater-than-or-equal operator: `>=`.
    GtEq,
    /// The greater-than operator: `>`.
    Gt,
    /// The exact equality operator: `=:=`.
    EqColonEq,
    /// The exact inequality operator: `=/=`.
    EqSlashEq,
    /// The addition operator: `+`.
    Plus,
    /// The subtraction operator and attribute sigil: `-`.
    Minus,
    /// The multiplication operator: `*`.
    Star,
    /// The division operator and arity separator: `/`.
    Slash,
    /// The list concatenation operator: `++`.
    PlusPlus,
    /// The list subtraction operator: `--`.
    MinusMinus,
    /// The range operator in types: `..`.
    Dots,
    /// The non-empty list marker in types: `...`.
    Ellipsis,

    /// The `after` keyword.
    After,
    /// The `and` operator.
    And,
    /// The `andalso` operator.
    AndAlso,
    /// The `band` operator.
    Band,
    /// The `begin` keyword.
    Begin,
    /// The `bnot` operator.
    Bnot,
    /// The `bor` operator.
    Bor,
    /// The `bsl` operator.
    Bsl,
    /// The `bsr` operator.
    Bsr,
    /// The `bxor` operator.
    Bxor,
    /// The `case` keyword.
    Case,
    /// The `catch` keyword.
    Catch,
    /// The `cond` keyword.
    Cond,
    /// The `div` operator.
    Div,
    /// The `else` keyword.
    Else,
    /// The `end` keyword.
    End,
    /// The `fun` keyword.
    Fun,
    /// The `if` keyword.
    If,
    /// The `let` keyword.
    Let,
    /// The `maybe` keyword.
    Maybe,
    /// The `not` operator.
    Not,
    /// The `of` keyword.
    Of,
    /// The `or` operator.
    Or,
    /// The `orelse` operator.
    OrElse,
    /// The `receive` keyword.
    Receive,
    /// The `rem` operator.
    Rem,
    /// The `try` keyword.
    Try,
    /// The `when` keyword.
    When,
    /// The `xor` operator.
    Xor,

    /// The `module` attribute name.
    Module,
    /// The `export` attribute name.
    Export,
    /// The `import` attribute name.
    Import,
    /// The `export_type` attribute name.
    ExportType,
    /// The `behaviour` attribute name.
    Behaviour,
    /// The American `behavior` attribute name.
    Behavior,
    /// The `record` attribute name.
    Record,
    /// The `define` attribute name.
    Define,
    /// The `undef` attribute name.
    Undef,
    /// The `include` attribute name.
    Include,
    /// The `include_lib` attribute name.
    IncludeLib,
    /// The `ifdef` attribute name.
    Ifdef,
    /// The `ifndef` attribute name.
    Ifndef,
    /// The `endif` attribute name.
    Endif,
    /// The `spec` attribute name.
    Spec,
    /// The `callback` attribute name.
    Callback,
    /// The `type` attribute name.
    Type,
    /// The `opaque` attribute name.
    Opaque,
    /// The `compile` attribute name.
    Compile,
    /// The `on_load` attribute name.
    OnLoad,

    /// A whole source file.
    SourceFile,
    /// A module declaration: `-module(name).`
    ModuleAttr,
    /// An export list: `-export([f/1]).`
    ExportAttr,
    /// An import list: `-import(lists, [map/2]).`
    ImportAttr,
    /// A type export list: `-export_type([t/0]).`
    ExportTypeAttr,
    /// A behaviour declaration: `-behaviour(gen_server).`
    BehaviourAttr,
    /// A record definition: `-record(point, {x = 0 :: integer()}).`
    RecordDef,
    /// A field in a record definition or record expression.
    RecordField,
    /// A macro definition: `-define(NAME(X), X + 1).`
    MacroDef,
    /// The replacement tokens of a macro definition.
    MacroBody,
    /// An include: `-include("file.hrl").`
    IncludeAttr,
    /// A preprocessor conditional: `-ifdef(X).`, `-else.`, `-endif.`
    ConditionalAttr,
    /// A function spec or callback: `-spec f(atom()) -> ok.`
    SpecAttr,
    /// A type definition: `-type t() :: atom().`
    TypeAttr,
    /// A compile option attribute: `-compile(export_all).`
    CompileAttr,
    /// Any other attribute: `-author("me").`
    WildAttr,
    /// A function reference by arity: `name/2`.
    FunctionArity,
    /// A list of function references: `[f/1, g/2]`.
    FunctionArityList,
    /// A function definition made of clauses.
    Function,
    /// A single clause of a function: `f(X) when X > 0 -> X`.
    FunctionClause,
    /// The argument patterns of a clause or arguments of a call.
    Args,
    /// A guard sequence: `when X > 0, is_atom(Y)`.
    Guard,
    /// A clause body: a comma-separated expression sequence.
    ClauseBody,
    /// A binary operation: `a + b`.
    BinaryExpr,
    /// A unary operation: `-x`, `not b`.
    UnaryExpr,
    /// A catch expression: `catch f()`.
    CatchExpr,
    /// A local or remote call: `f(x)`, `m:f(x)`.
    Call,
    /// A remote function reference: `m:f`.
    Remote,
    /// A parenthesized expression: `(x)`.
    Parenthesized,
    /// A list: `[a, b | T]`.
    List,
    /// A list comprehension: `[X || X <- Xs]`.
    ListComprehension,
    /// A generator or filter in a comprehension.
    Qualifier,
    /// A tuple: `{a, b}`.
    Tuple,
    /// A binary: `<<X:8, Rest/binary>>`.
    Binary,
    /// A binary comprehension: `<< <<X>> || <<X>> <= B >>`.
    BinaryComprehension,
    /// An element of a binary: `X:8/integer`.
    BinaryElement,
    /// A map construction or update: `#{a => 1}`, `M#{a := 2}`.
    Map,
    /// A field of a map: `a => 1`.
    MapField,
    /// A record construction or update: `#r{a = 1}`.
    RecordExpr,
    /// A record field access or index: `R#r.a`, `#r.a`.
    RecordAccess,
    /// A fun: `fun f/1`, `fun(X) -> X end`.
    FunExpr,
    /// A case expression.
    CaseExpr,
    /// A clause of a `case`, `receive`, `try` or `maybe`.
    CrClause,
    /// An if expression.
    IfExpr,
    /// A clause of an `if`.
    IfClause,
    /// A receive expression.
    ReceiveExpr,
    /// The `after` section of a receive.
    AfterClause,
    /// A try expression.
    TryExpr,
    /// A `begin ... end` block.
    BlockExpr,
    /// A `maybe ... end` block.
    MaybeExpr,
    /// A macro use: `?MODULE`, `?assert(X)`.
    MacroCall,
    /// A type expression in a spec or type definition.
    TypeExpr,
    /// A clause of a function spec: `(atom()) -> ok`.
    TypeSig,
}

impl SyntaxKind {
    /// Every terminal kind, indexed by its discriminant.
    pub(crate) const TERMINALS: [SyntaxKind; 100] = {
        use SyntaxKind::*;
        [
            Eof, Error, Placeholder, Space, Comment, Atom, Var, Integer, Float, Char,
            Str, LeftParen, RightParen, LeftBracket, RightBracket, LeftBrace,
            RightBrace, LeftAngles, RightAngles, Comma, Dot, Semicolon, Colon,
            ColonColon, Pipe, PipePipe, Arrow, LeftArrow, DoubleLeftArrow, FatArrow,
            ColonEq, Hash, Question, Excl, Eq, EqEq, SlashEq, EqLt, Lt, GtEq, Gt,
            EqColonEq, EqSlashEq, Plus, Minus, Star, Slash, PlusPlus, MinusMinus,
            Dots, Ellipsis, After, And, AndAlso, Band, Begin, Bnot, Bor, Bsl, Bsr,
            Bxor, Case, Catch, Cond, Div, Else, End, Fun, If, Let, Maybe, Not, Of,
            Or, OrElse, Receive, Rem, Try, When, Xor, Module, Export, Import,
            ExportType, Behaviour, Behavior, Record, Define, Undef, Include,
            IncludeLib, Ifdef, Ifndef, Endif, Spec, Callback, Type, Opaque, Compile,
            OnLoad,
        ]
    };

    /// Look up a terminal kind by its discriminant.
    pub(crate) fn terminal(index: u8) -> Option<SyntaxKind> {
        Self::TERMINALS.get(usize::from(index)).copied()
    }

    /// Is this an Erlang reserved word?
    pub fn is_reserved(self) -> bool {
        (Self::After as u8..=Self::Xor as u8).contains(&(self as u8))
    }

    /// Is this an attribute name the parser recognizes after a `-`?
    pub fn is_attribute_name(self) -> bool {
        (Self::Module as u8..=Self::OnLoad as u8).contains(&(self as u8))
    }

    /// Is this a keyword that completion offers to the user?
    pub fn is_keyword(self) -> bool {
        self.is_reserved() || self.is_attribute_name()
    }

    /// Whether this kind of token is irrelevant for the grammar.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Space | Self::Comment)
    }

    /// Whether this is an error.
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    /// Whether the lexer or the parser produces this kind as a leaf.
    pub fn is_terminal(self) -> bool {
        (self as u8) <= Self::OnLoad as u8
    }

    /// The source text of a keyword or punctuation kind.
    ///
    /// Returns `None` for kinds without fixed text.
    pub fn text(self) -> Option<&'static str> {
        Some(match self {
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::LeftAngles => "<<",
            Self::RightAngles => ">>",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Pipe => "|",
            Self::PipePipe => "||",
            Self::Arrow => "->",
            Self::LeftArrow => "<-",
            Self::DoubleLeftArrow => "<=",
            Self::FatArrow => "=>",
            Self::ColonEq => ":=",
            Self::Hash => "#",
            Self::Question => "?",
            Self::Excl => "!",
            Self::Eq => "=",
            Self::EqEq => "==",
            Self::SlashEq => "/=",
            Self::EqLt => "=<",
            Self::Lt => "<",
            Self::GtEq => ">=",
            Self::Gt => ">",
            Self::EqColonEq => "=:=",
            Self::EqSlashEq => "=/=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::Dots => "..",
            Self::Ellipsis => "...",
            Self::After => "after",
            Self::And => "and",
            Self::AndAlso => "andalso",
            Self::Band => "band",
            Self::Begin => "begin",
            Self::Bnot => "bnot",
            Self::Bor => "bor",
            Self::Bsl => "bsl",
            Self::Bsr => "bsr",
            Self::Bxor => "bxor",
            Self::Case => "case",
            Self::Catch => "catch",
            Self::Cond => "cond",
            Self::Div => "div",
            Self::Else => "else",
            Self::End => "end",
            Self::Fun => "fun",
            Self::If => "if",
            Self::Let => "let",
            Self::Maybe => "maybe",
            Self::Not => "not",
            Self::Of => "of",
            Self::Or => "or",
            Self::OrElse => "orelse",
            Self::Receive => "receive",
            Self::Rem => "rem",
            Self::Try => "try",
            Self::When => "when",
            Self::Xor => "xor",
            Self::Module => "module",
            Self::Export => "export",
            Self::Import => "import",
            Self::ExportType => "export_type",
            Self::Behaviour => "behaviour",
            Self::Behavior => "behavior",
            Self::Record => "record",
            Self::Define => "define",
            Self::Undef => "undef",
            Self::Include => "include",
            Self::IncludeLib => "include_lib",
            Self::Ifdef => "ifdef",
            Self::Ifndef => "ifndef",
            Self::Endif => "endif",
            Self::Spec => "spec",
            Self::Callback => "callback",
            Self::Type => "type",
            Self::Opaque => "opaque",
            Self::Compile => "compile",
            Self::OnLoad => "on_load",
            _ => return None,
        })
    }

    /// A human-readable name for the kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Eof => "end of file",
            Self::Error => "syntax error",
            Self::Placeholder => "placeholder",
            Self::Space => "space",
            Self::Comment => "comment",
            Self::Atom => "atom",
            Self::Var => "variable",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Char => "character",
            Self::Str => "string",
            Self::LeftParen => "opening paren",
            Self::RightParen => "closing paren",
            Self::LeftBracket => "opening bracket",
            Self::RightBracket => "closing bracket",
            Self::LeftBrace => "opening brace",
            Self::RightBrace => "closing brace",
            Self::LeftAngles => "opening binary delimiter",
            Self::RightAngles => "closing binary delimiter",
            Self::Comma => "comma",
            Self::Dot => "dot",
            Self::Semicolon => "semicolon",
            Self::Colon => "colon",
            Self::Pipe => "pipe",
            Self::SourceFile => "source file",
            Self::ModuleAttr => "module attribute",
            Self::ExportAttr => "export attribute",
            Self::ImportAttr => "import attribute",
            Self::ExportTypeAttr => "export_type attribute",
            Self::BehaviourAttr => "behaviour attribute",
            Self::RecordDef => "record definition",
            Self::RecordField => "record field",
            Self::MacroDef => "macro definition",
            Self::MacroBody => "macro body",
            Self::IncludeAttr => "include attribute",
            Self::ConditionalAttr => "preprocessor conditional",
            Self::SpecAttr => "spec",
            Self::TypeAttr => "type definition",
            Self::CompileAttr => "compile attribute",
            Self::WildAttr => "attribute",
            Self::FunctionArity => "function arity",
            Self::FunctionArityList => "function list",
            Self::Function => "function",
            Self::FunctionClause => "function clause",
            Self::Args => "arguments",
            Self::Guard => "guard",
            Self::ClauseBody => "clause body",
            Self::BinaryExpr => "binary expression",
            Self::UnaryExpr => "unary expression",
            Self::CatchExpr => "catch expression",
            Self::Call => "call",
            Self::Remote => "remote reference",
            Self::Parenthesized => "group",
            Self::List => "list",
            Self::ListComprehension => "list comprehension",
            Self::Qualifier => "qualifier",
            Self::Tuple => "tuple",
            Self::Binary => "binary",
            Self::BinaryComprehension => "binary comprehension",
            Self::BinaryElement => "binary element",
            Self::Map => "map",
            Self::MapField => "map field",
            Self::RecordExpr => "record expression",
            Self::RecordAccess => "record access",
            Self::FunExpr => "fun",
            Self::CaseExpr => "case expression",
            Self::CrClause => "clause",
            Self::IfExpr => "if expression",
            Self::IfClause => "if clause",
            Self::ReceiveExpr => "receive expression",
            Self::AfterClause => "after clause",
            Self::TryExpr => "try expression",
            Self::BlockExpr => "begin block",
            Self::MaybeExpr => "maybe block",
            Self::MacroCall => "macro",
            Self::TypeExpr => "type",
            Self::TypeSig => "type signature",
            kind => match kind.text() {
                Some(text) => text,
                None => "token",
            },
        }
    }
}
