use ecow::eco_format;

use crate::set::{self, syntax_set, ExpectedSet, SyntaxSet};
use crate::{tokenize, SyntaxError, SyntaxKind, SyntaxNode, Token};

/// The outcome of parsing a possibly truncated token stream.
#[derive(Debug, Clone)]
pub struct ParseAttempt {
    /// The concrete syntax tree. Missing and unexpected tokens show up as
    /// error nodes.
    pub root: SyntaxNode,
    /// The kinds the grammar would have accepted at the completion point, in
    /// the order the grammar first tested for them.
    pub expected: ExpectedSet,
}

/// Parses a token stream into a source file.
///
/// Tokens starting at or after the byte offset `stop_before` are ignored, as
/// if the input ended there. Parsing never fails: the result always holds a
/// tree, and the kinds that could have followed at the end of the input (or
/// at a [`Placeholder`](SyntaxKind::Placeholder) token).
#[tracing::instrument(skip_all)]
pub fn parse(tokens: &[Token], stop_before: Option<usize>) -> ParseAttempt {
    let end = match stop_before {
        Some(stop) => tokens
            .iter()
            .position(|token| token.range.start >= stop)
            .unwrap_or(tokens.len()),
        None => tokens.len(),
    };

    let mut p = Parser::new(&tokens[..end]);
    source_file(&mut p);
    p.finish()
}

/// Tokenizes and parses a whole source text.
pub fn parse_text(text: &str) -> SyntaxNode {
    parse(&tokenize(text), None).root
}

/// Parses a sequence of forms.
fn source_file(p: &mut Parser) {
    loop {
        if p.at_point() && !p.stalled {
            explore_forms(p);
            p.stalled = true;
        }
        if p.end() {
            break;
        }
        form(p);
    }
}

/// Lets every form alternative record what it expects at the completion
/// point, with the completion point standing in for the alternative's leading
/// token. Each alternative starts from the same state; only the expected set
/// survives.
fn explore_forms(p: &mut Parser) {
    for alternative in [attribute as fn(&mut Parser), function] {
        let checkpoint = p.checkpoint();
        alternative(p);
        p.restore(checkpoint);
    }
}

/// Parses a single attribute or function.
fn form(p: &mut Parser) {
    match p.current_kind() {
        SyntaxKind::Minus => attribute(p),
        SyntaxKind::Atom => function(p),
        _ => p.unexpected(),
    }
}

/// Expects the dot that ends a form, skipping everything before it.
///
/// A form that runs into the end of the input stalls the parser: no new form
/// can start inside it.
fn form_end(p: &mut Parser, m: Marker, kind: SyntaxKind) {
    if !p.eat_if(SyntaxKind::Dot) {
        p.expected("dot");
        loop {
            if p.end() {
                p.stalled = true;
                break;
            }
            if p.eat_if(SyntaxKind::Dot) {
                break;
            }
            p.unexpected();
        }
    }
    p.wrap(m, kind);
}

/// Parses an attribute: `-name(...).`
fn attribute(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::Minus);

    let name = set::ATTRIBUTE_NAMES.into_iter().find(|&kind| p.at_word(kind));
    let kind = match name {
        Some(name) => {
            p.convert_and_eat(name);
            attribute_body(p, name)
        }
        None if p.at(SyntaxKind::Else) => {
            p.eat();
            SyntaxKind::ConditionalAttr
        }
        None if p.at(SyntaxKind::Atom) || p.current_kind().is_reserved() => {
            p.eat();
            if p.at(SyntaxKind::LeftParen) {
                sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, expr);
            }
            SyntaxKind::WildAttr
        }
        None => {
            p.expected("attribute name");
            SyntaxKind::WildAttr
        }
    };

    form_end(p, m, kind);
}

/// Parses what follows a known attribute name and returns the node kind.
fn attribute_body(p: &mut Parser, name: SyntaxKind) -> SyntaxKind {
    match name {
        SyntaxKind::Module => {
            p.expect(SyntaxKind::LeftParen);
            p.expect(SyntaxKind::Atom);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::ModuleAttr
        }
        SyntaxKind::Export | SyntaxKind::ExportType => {
            p.expect(SyntaxKind::LeftParen);
            function_arity_list(p);
            p.expect(SyntaxKind::RightParen);
            if name == SyntaxKind::Export {
                SyntaxKind::ExportAttr
            } else {
                SyntaxKind::ExportTypeAttr
            }
        }
        SyntaxKind::Import => {
            p.expect(SyntaxKind::LeftParen);
            p.expect(SyntaxKind::Atom);
            p.expect(SyntaxKind::Comma);
            function_arity_list(p);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::ImportAttr
        }
        SyntaxKind::Behaviour | SyntaxKind::Behavior => {
            p.expect(SyntaxKind::LeftParen);
            p.expect(SyntaxKind::Atom);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::BehaviourAttr
        }
        SyntaxKind::Record => {
            record_def(p);
            SyntaxKind::RecordDef
        }
        SyntaxKind::Define => {
            macro_def(p);
            SyntaxKind::MacroDef
        }
        SyntaxKind::Undef => {
            p.expect(SyntaxKind::LeftParen);
            macro_name(p);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::MacroDef
        }
        SyntaxKind::Ifdef | SyntaxKind::Ifndef => {
            p.expect(SyntaxKind::LeftParen);
            macro_name(p);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::ConditionalAttr
        }
        SyntaxKind::Endif => SyntaxKind::ConditionalAttr,
        SyntaxKind::Include | SyntaxKind::IncludeLib => {
            p.expect(SyntaxKind::LeftParen);
            p.expect(SyntaxKind::Str);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::IncludeAttr
        }
        SyntaxKind::Spec | SyntaxKind::Callback => {
            spec(p);
            SyntaxKind::SpecAttr
        }
        SyntaxKind::Type | SyntaxKind::Opaque => {
            type_def(p);
            SyntaxKind::TypeAttr
        }
        SyntaxKind::Compile => {
            p.expect(SyntaxKind::LeftParen);
            expr(p);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::CompileAttr
        }
        _ => {
            p.expect(SyntaxKind::LeftParen);
            function_arity(p);
            p.expect(SyntaxKind::RightParen);
            SyntaxKind::WildAttr
        }
    }
}

/// Parses a list of function references: `[f/1, g/2]`.
fn function_arity_list(p: &mut Parser) {
    let m = p.marker();
    sequence(p, SyntaxKind::LeftBracket, SyntaxKind::RightBracket, function_arity);
    p.wrap(m, SyntaxKind::FunctionArityList);
}

/// Parses a function reference: `name/2`.
fn function_arity(p: &mut Parser) {
    let m = p.marker();
    p.expect(SyntaxKind::Atom);
    p.expect(SyntaxKind::Slash);
    p.expect(SyntaxKind::Integer);
    p.wrap(m, SyntaxKind::FunctionArity);
}

/// Parses the body of a record definition: `(name, {field, ...})`.
fn record_def(p: &mut Parser) {
    p.expect(SyntaxKind::LeftParen);
    p.expect(SyntaxKind::Atom);
    p.expect(SyntaxKind::Comma);
    sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, |p| {
        let m = p.marker();
        p.expect(SyntaxKind::Atom);
        if p.eat_if(SyntaxKind::Eq) {
            expr(p);
        }
        if p.eat_if(SyntaxKind::ColonColon) {
            type_expr(p);
        }
        p.wrap(m, SyntaxKind::RecordField);
    });
    p.expect(SyntaxKind::RightParen);
}

/// Parses the body of a macro definition: `(NAME(Args), Replacement)`.
///
/// The replacement is kept as a flat, balanced token sequence.
fn macro_def(p: &mut Parser) {
    p.expect(SyntaxKind::LeftParen);
    macro_name(p);
    if p.current_kind() == SyntaxKind::LeftParen {
        sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, |p| {
            p.expect(SyntaxKind::Var);
        });
    }

    if p.eat_if(SyntaxKind::Comma) {
        let m = p.marker();
        let mut depth = 0usize;
        loop {
            match p.current_kind() {
                SyntaxKind::Eof | SyntaxKind::Dot => break,
                SyntaxKind::RightParen if depth == 0 => break,
                SyntaxKind::LeftParen
                | SyntaxKind::LeftBracket
                | SyntaxKind::LeftBrace
                | SyntaxKind::LeftAngles => depth += 1,
                SyntaxKind::RightParen
                | SyntaxKind::RightBracket
                | SyntaxKind::RightBrace
                | SyntaxKind::RightAngles => depth = depth.saturating_sub(1),
                _ => {}
            }
            p.eat();
        }
        p.wrap(m, SyntaxKind::MacroBody);
    }

    p.expect(SyntaxKind::RightParen);
}

/// Parses the name of a macro.
fn macro_name(p: &mut Parser) {
    if p.at(SyntaxKind::Atom) || p.at(SyntaxKind::Var) || p.current_kind().is_reserved()
    {
        p.eat();
    } else {
        p.expected("macro name");
    }
}

/// Parses a function spec or callback: `[Mod:]name(Types) -> Type; ...`.
fn spec(p: &mut Parser) {
    p.expect(SyntaxKind::Atom);
    if p.eat_if(SyntaxKind::Colon) {
        p.expect(SyntaxKind::Atom);
    }
    loop {
        type_sig(p);
        if !p.eat_if(SyntaxKind::Semicolon) {
            break;
        }
    }
}

/// Parses a single clause of a spec: `(Types) -> Type [when Constraints]`.
fn type_sig(p: &mut Parser) {
    let m = p.marker();
    sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, type_expr);
    p.expect(SyntaxKind::Arrow);
    type_expr(p);
    if p.eat_if(SyntaxKind::When) {
        loop {
            type_expr(p);
            if !p.eat_if(SyntaxKind::Comma) {
                break;
            }
        }
    }
    p.wrap(m, SyntaxKind::TypeSig);
}

/// Parses a type definition: `name(Vars) :: Type`.
fn type_def(p: &mut Parser) {
    p.expect(SyntaxKind::Atom);
    sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, |p| {
        p.expect(SyntaxKind::Var);
    });
    p.expect(SyntaxKind::ColonColon);
    type_expr(p);
}

/// Parses a type, possibly annotated: `Name :: Type`.
fn type_expr(p: &mut Parser) {
    let m = p.marker();
    type_union(p);
    if p.eat_if(SyntaxKind::ColonColon) {
        type_union(p);
        p.wrap(m, SyntaxKind::TypeExpr);
    }
}

/// Parses a union of types: `a | b | c`.
fn type_union(p: &mut Parser) {
    let m = p.marker();
    type_range(p);
    if p.at(SyntaxKind::Pipe) {
        while p.eat_if(SyntaxKind::Pipe) {
            type_range(p);
        }
        p.wrap(m, SyntaxKind::TypeExpr);
    }
}

/// Parses a range type: `0..255`.
fn type_range(p: &mut Parser) {
    let m = p.marker();
    type_primary(p);
    if p.eat_if(SyntaxKind::Dots) {
        type_primary(p);
        p.wrap(m, SyntaxKind::TypeExpr);
    }
}

/// Parses an atomic type.
fn type_primary(p: &mut Parser) {
    p.nested(|p| {
        if !p.at_set(set::TYPE) {
            p.expected("type");
            return;
        }

        let m = p.marker();
        match p.current_kind() {
            SyntaxKind::Minus => {
                p.eat();
                p.expect(SyntaxKind::Integer);
            }
            SyntaxKind::Atom => {
                p.eat();
                if p.eat_if(SyntaxKind::Colon) {
                    p.expect(SyntaxKind::Atom);
                }
                if p.at(SyntaxKind::LeftParen) {
                    sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, type_expr);
                }
            }
            SyntaxKind::Question => {
                macro_call(p);
                if p.at(SyntaxKind::LeftParen) {
                    sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, type_expr);
                }
            }
            SyntaxKind::LeftParen => {
                p.eat();
                type_expr(p);
                p.expect(SyntaxKind::RightParen);
            }
            SyntaxKind::LeftBracket => {
                p.eat();
                if !p.eat_if(SyntaxKind::RightBracket) {
                    type_expr(p);
                    if p.eat_if(SyntaxKind::Comma) {
                        p.expect(SyntaxKind::Ellipsis);
                    }
                    p.expect(SyntaxKind::RightBracket);
                }
            }
            SyntaxKind::LeftBrace => {
                sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, type_expr);
            }
            SyntaxKind::LeftAngles => {
                p.eat();
                while !p.end() && !syntax_set!(RightAngles, Dot).contains(p.current_kind()) {
                    p.eat();
                }
                p.expect(SyntaxKind::RightAngles);
            }
            SyntaxKind::Hash => {
                p.eat();
                if p.at(SyntaxKind::LeftBrace) {
                    sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, |p| {
                        type_expr(p);
                        if p.eat_if(SyntaxKind::FatArrow) || p.eat_if(SyntaxKind::ColonEq) {
                            type_expr(p);
                        }
                    });
                } else {
                    p.expect(SyntaxKind::Atom);
                    if p.at(SyntaxKind::LeftBrace) {
                        sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, |p| {
                            p.expect(SyntaxKind::Atom);
                            p.expect(SyntaxKind::ColonColon);
                            type_expr(p);
                        });
                    }
                }
            }
            SyntaxKind::Fun => {
                p.eat();
                p.expect(SyntaxKind::LeftParen);
                if p.at(SyntaxKind::LeftParen) {
                    if p.eat_if(SyntaxKind::LeftParen) && !p.eat_if(SyntaxKind::Ellipsis) {
                        if !p.at(SyntaxKind::RightParen) {
                            loop {
                                type_expr(p);
                                if !p.eat_if(SyntaxKind::Comma) {
                                    break;
                                }
                            }
                        }
                    }
                    p.expect(SyntaxKind::RightParen);
                    p.expect(SyntaxKind::Arrow);
                    type_expr(p);
                }
                p.expect(SyntaxKind::RightParen);
            }
            _ => p.eat(),
        }
        p.wrap(m, SyntaxKind::TypeExpr);
    });
}

/// Parses a function definition: clauses separated by semicolons.
fn function(p: &mut Parser) {
    let m = p.marker();
    function_clause(p, true);
    while p.eat_if(SyntaxKind::Semicolon) {
        function_clause(p, false);
    }
    form_end(p, m, SyntaxKind::Function);
}

/// Parses a single function clause: `name(Patterns) [when Guard] -> Body`.
fn function_clause(p: &mut Parser, first: bool) {
    let m = p.marker();
    if first {
        p.assert(SyntaxKind::Atom);
    } else {
        p.expect(SyntaxKind::Atom);
    }
    clause_tail(p);
    p.wrap(m, SyntaxKind::FunctionClause);
}

/// Parses `(Patterns) [when Guard] -> Body`.
fn clause_tail(p: &mut Parser) {
    args(p);
    if p.eat_if(SyntaxKind::When) {
        guard(p);
    }
    p.expect(SyntaxKind::Arrow);
    body(p);
}

/// Parses parenthesized, comma-separated expressions.
fn args(p: &mut Parser) {
    let m = p.marker();
    sequence(p, SyntaxKind::LeftParen, SyntaxKind::RightParen, expr);
    p.wrap(m, SyntaxKind::Args);
}

/// Parses a guard sequence: guards separated by `,` and `;`.
fn guard(p: &mut Parser) {
    let m = p.marker();
    loop {
        expr(p);
        if !(p.eat_if(SyntaxKind::Comma) || p.eat_if(SyntaxKind::Semicolon)) {
            break;
        }
    }
    p.wrap(m, SyntaxKind::Guard);
}

/// Parses a comma-separated sequence of expressions.
fn body(p: &mut Parser) {
    let m = p.marker();
    loop {
        expr(p);
        if !p.eat_if(SyntaxKind::Comma) {
            break;
        }
    }
    p.wrap(m, SyntaxKind::ClauseBody);
}

/// Parses clauses of a `case`, `receive`, `try` or `maybe`.
fn cr_clauses(p: &mut Parser) {
    loop {
        let m = p.marker();
        expr(p);
        if p.eat_if(SyntaxKind::When) {
            guard(p);
        }
        p.expect(SyntaxKind::Arrow);
        body(p);
        p.wrap(m, SyntaxKind::CrClause);
        if !p.eat_if(SyntaxKind::Semicolon) {
            break;
        }
    }
}

/// Parses an expression.
fn expr(p: &mut Parser) {
    expr_prec(p, 0)
}

/// The binding strength of prefix operators.
const UNARY_PREC: u8 = 8;

/// Parses an expression whose operators bind at least as strong as
/// `min_prec`.
fn expr_prec(p: &mut Parser, min_prec: u8) {
    p.nested(|p| {
        let m = p.marker();
        if min_prec == 0 && p.at(SyntaxKind::Catch) {
            p.eat();
            expr(p);
            p.wrap(m, SyntaxKind::CatchExpr);
            return;
        }

        if p.at_set(set::UNARY_OP) {
            p.eat();
            expr_prec(p, UNARY_PREC);
            p.wrap(m, SyntaxKind::UnaryExpr);
        } else {
            primary(p);
            postfix(p, m);
        }

        while p.at_set(set::BINARY_OP) {
            let Some((prec, right)) = binary_prec(p.current_kind()) else { break };
            if prec < min_prec {
                break;
            }
            p.eat();
            expr_prec(p, if right { prec } else { prec + 1 });
            p.wrap(m, SyntaxKind::BinaryExpr);
        }
    });
}

/// The precedence of a binary operator and whether it is right-associative.
fn binary_prec(kind: SyntaxKind) -> Option<(u8, bool)> {
    Some(match kind {
        SyntaxKind::Eq | SyntaxKind::Excl => (1, true),
        SyntaxKind::OrElse => (2, true),
        SyntaxKind::AndAlso => (3, true),
        SyntaxKind::EqEq
        | SyntaxKind::SlashEq
        | SyntaxKind::EqLt
        | SyntaxKind::Lt
        | SyntaxKind::GtEq
        | SyntaxKind::Gt
        | SyntaxKind::EqColonEq
        | SyntaxKind::EqSlashEq => (4, false),
        SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => (5, true),
        SyntaxKind::Plus
        | SyntaxKind::Minus
        | SyntaxKind::Bor
        | SyntaxKind::Bxor
        | SyntaxKind::Bsl
        | SyntaxKind::Bsr
        | SyntaxKind::Or
        | SyntaxKind::Xor => (6, false),
        SyntaxKind::Slash
        | SyntaxKind::Star
        | SyntaxKind::Div
        | SyntaxKind::Rem
        | SyntaxKind::Band
        | SyntaxKind::And => (7, false),
        _ => return None,
    })
}

/// Parses calls, remote references and record or map operations following
/// the expression that started at `m`.
fn postfix(p: &mut Parser, m: Marker) {
    loop {
        if p.at(SyntaxKind::LeftParen) {
            args(p);
            p.wrap(m, SyntaxKind::Call);
        } else if p.at(SyntaxKind::Colon) {
            p.eat();
            primary(p);
            p.wrap(m, SyntaxKind::Remote);
        } else if p.at(SyntaxKind::Hash) {
            record_or_map(p, m);
        } else {
            break;
        }
    }
}

/// Parses an atomic expression.
fn primary(p: &mut Parser) {
    p.nested(|p| {
        if !p.at_set(set::EXPR_PRIMARY) {
            p.expected("expression");
            return;
        }

        let m = p.marker();
        match p.current_kind() {
            SyntaxKind::Str => {
                p.eat();
                while p.current_kind() == SyntaxKind::Str {
                    p.eat();
                }
            }
            SyntaxKind::LeftParen => {
                p.eat();
                expr(p);
                p.expect(SyntaxKind::RightParen);
                p.wrap(m, SyntaxKind::Parenthesized);
            }
            SyntaxKind::LeftBracket => list(p),
            SyntaxKind::LeftBrace => {
                sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, expr);
                p.wrap(m, SyntaxKind::Tuple);
            }
            SyntaxKind::LeftAngles => binary(p),
            SyntaxKind::Hash => record_or_map(p, m),
            SyntaxKind::Question => macro_call(p),
            SyntaxKind::Fun => fun_expr(p),
            SyntaxKind::Case => {
                p.eat();
                expr(p);
                p.expect(SyntaxKind::Of);
                cr_clauses(p);
                p.expect(SyntaxKind::End);
                p.wrap(m, SyntaxKind::CaseExpr);
            }
            SyntaxKind::If => {
                p.eat();
                loop {
                    let clause = p.marker();
                    guard(p);
                    p.expect(SyntaxKind::Arrow);
                    body(p);
                    p.wrap(clause, SyntaxKind::IfClause);
                    if !p.eat_if(SyntaxKind::Semicolon) {
                        break;
                    }
                }
                p.expect(SyntaxKind::End);
                p.wrap(m, SyntaxKind::IfExpr);
            }
            SyntaxKind::Receive => receive(p),
            SyntaxKind::Try => try_expr(p),
            SyntaxKind::Begin => {
                p.eat();
                body(p);
                p.expect(SyntaxKind::End);
                p.wrap(m, SyntaxKind::BlockExpr);
            }
            SyntaxKind::Maybe => {
                p.eat();
                body(p);
                if p.eat_if(SyntaxKind::Else) {
                    cr_clauses(p);
                }
                p.expect(SyntaxKind::End);
                p.wrap(m, SyntaxKind::MaybeExpr);
            }
            _ => p.eat(),
        }
    });
}

/// Parses a list or list comprehension.
fn list(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::LeftBracket);
    if p.eat_if(SyntaxKind::RightBracket) {
        p.wrap(m, SyntaxKind::List);
        return;
    }

    expr(p);
    if p.eat_if(SyntaxKind::PipePipe) {
        qualifiers(p);
        p.expect(SyntaxKind::RightBracket);
        p.wrap(m, SyntaxKind::ListComprehension);
        return;
    }

    while p.eat_if(SyntaxKind::Comma) {
        expr(p);
    }
    if p.eat_if(SyntaxKind::Pipe) {
        expr(p);
    }
    p.expect(SyntaxKind::RightBracket);
    p.wrap(m, SyntaxKind::List);
}

/// Parses the generators and filters of a comprehension.
fn qualifiers(p: &mut Parser) {
    loop {
        let m = p.marker();
        expr(p);
        if p.eat_if(SyntaxKind::LeftArrow) || p.eat_if(SyntaxKind::DoubleLeftArrow) {
            expr(p);
        }
        p.wrap(m, SyntaxKind::Qualifier);
        if !p.eat_if(SyntaxKind::Comma) {
            break;
        }
    }
}

/// Parses a binary or binary comprehension.
fn binary(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::LeftAngles);
    if p.eat_if(SyntaxKind::RightAngles) {
        p.wrap(m, SyntaxKind::Binary);
        return;
    }

    binary_element(p);
    if p.eat_if(SyntaxKind::PipePipe) {
        qualifiers(p);
        p.expect(SyntaxKind::RightAngles);
        p.wrap(m, SyntaxKind::BinaryComprehension);
        return;
    }

    while p.eat_if(SyntaxKind::Comma) {
        binary_element(p);
    }
    p.expect(SyntaxKind::RightAngles);
    p.wrap(m, SyntaxKind::Binary);
}

/// Parses an element of a binary: `Value[:Size][/Type-Type-unit:N]`.
fn binary_element(p: &mut Parser) {
    let m = p.marker();
    if p.at_set(set::UNARY_OP) {
        p.eat();
    }
    primary(p);
    if p.eat_if(SyntaxKind::Colon) {
        primary(p);
    }
    if p.eat_if(SyntaxKind::Slash) {
        loop {
            p.expect(SyntaxKind::Atom);
            if p.eat_if(SyntaxKind::Colon) {
                p.expect(SyntaxKind::Integer);
            }
            if !p.eat_if(SyntaxKind::Minus) {
                break;
            }
        }
    }
    p.wrap(m, SyntaxKind::BinaryElement);
}

/// Parses a record or map operation starting at the `#`. The marker points
/// to the start of the updated expression, if there is one.
fn record_or_map(p: &mut Parser, m: Marker) {
    p.assert(SyntaxKind::Hash);
    if p.at(SyntaxKind::LeftBrace) {
        sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, |p| {
            let m = p.marker();
            expr(p);
            if p.eat_if(SyntaxKind::FatArrow) || p.eat_if(SyntaxKind::ColonEq) {
                expr(p);
            } else {
                p.expected("`=>` or `:=`");
            }
            p.wrap(m, SyntaxKind::MapField);
        });
        p.wrap(m, SyntaxKind::Map);
        return;
    }

    if !p.expect(SyntaxKind::Atom) {
        p.wrap(m, SyntaxKind::RecordExpr);
        return;
    }

    // A dot directly followed by a field name accesses the field, any other
    // dot ends the form.
    if p.current_kind() == SyntaxKind::Dot && p.next_is_direct(SyntaxKind::Atom) {
        p.eat();
        p.eat();
        p.wrap(m, SyntaxKind::RecordAccess);
        return;
    }

    sequence(p, SyntaxKind::LeftBrace, SyntaxKind::RightBrace, |p| {
        let m = p.marker();
        if p.at(SyntaxKind::Atom) || p.at(SyntaxKind::Var) {
            p.eat();
        } else {
            p.expected("field name");
        }
        p.expect(SyntaxKind::Eq);
        expr(p);
        p.wrap(m, SyntaxKind::RecordField);
    });
    p.wrap(m, SyntaxKind::RecordExpr);
}

/// Parses a macro use: `?NAME` or `??Arg`.
fn macro_call(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::Question);
    if p.current_kind() == SyntaxKind::Question {
        p.eat();
    }
    macro_name(p);
    p.wrap(m, SyntaxKind::MacroCall);
}

/// Parses a fun: a function reference or anonymous function clauses.
fn fun_expr(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::Fun);

    if p.at(SyntaxKind::LeftParen) {
        fun_clauses(p, false);
    } else if p.current_kind() == SyntaxKind::Var && p.peek_kind() == SyntaxKind::LeftParen
    {
        fun_clauses(p, true);
    } else {
        reference_part(p, SyntaxKind::Atom);
        if p.eat_if(SyntaxKind::Colon) {
            reference_part(p, SyntaxKind::Atom);
        }
        p.expect(SyntaxKind::Slash);
        reference_part(p, SyntaxKind::Integer);
    }

    p.wrap(m, SyntaxKind::FunExpr);
}

/// Parses the clauses of an anonymous function up to the `end`.
fn fun_clauses(p: &mut Parser, named: bool) {
    loop {
        let m = p.marker();
        if named {
            p.expect(SyntaxKind::Var);
        }
        clause_tail(p);
        p.wrap(m, SyntaxKind::FunctionClause);
        if !p.eat_if(SyntaxKind::Semicolon) {
            break;
        }
    }
    p.expect(SyntaxKind::End);
}

/// Parses a module, name or arity in a function reference. Each can also be
/// a variable or a macro.
fn reference_part(p: &mut Parser, literal: SyntaxKind) {
    if p.at(literal) || p.at(SyntaxKind::Var) {
        p.eat();
    } else if p.at(SyntaxKind::Question) {
        macro_call(p);
    } else {
        p.expected("function reference");
    }
}

/// Parses a receive expression.
fn receive(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::Receive);
    if !p.at(SyntaxKind::After) {
        cr_clauses(p);
    }
    if p.at(SyntaxKind::After) {
        let after = p.marker();
        p.eat();
        expr(p);
        p.expect(SyntaxKind::Arrow);
        body(p);
        p.wrap(after, SyntaxKind::AfterClause);
    }
    p.expect(SyntaxKind::End);
    p.wrap(m, SyntaxKind::ReceiveExpr);
}

/// Parses a try expression.
fn try_expr(p: &mut Parser) {
    let m = p.marker();
    p.assert(SyntaxKind::Try);
    body(p);
    if p.eat_if(SyntaxKind::Of) {
        cr_clauses(p);
    }

    let mut handled = false;
    if p.eat_if(SyntaxKind::Catch) {
        cr_clauses(p);
        handled = true;
    }
    if p.at(SyntaxKind::After) {
        let after = p.marker();
        p.eat();
        body(p);
        p.wrap(after, SyntaxKind::AfterClause);
        handled = true;
    }
    if !handled {
        p.expected("`catch` or `after`");
    }

    p.expect(SyntaxKind::End);
    p.wrap(m, SyntaxKind::TryExpr);
}

/// Parses `open [item {, item}] close`.
fn sequence(p: &mut Parser, open: SyntaxKind, close: SyntaxKind, item: fn(&mut Parser)) {
    p.expect(open);
    if p.eat_if(close) {
        return;
    }
    loop {
        item(p);
        if !p.eat_if(SyntaxKind::Comma) {
            break;
        }
    }
    p.expect(close);
}

/// How deeply expressions and types may nest.
const MAX_DEPTH: usize = 256;

/// Turns a token into a tree leaf.
fn token_node(token: &Token) -> SyntaxNode {
    if token.kind.is_error() {
        let error = token
            .error
            .clone()
            .unwrap_or_else(|| SyntaxError::new(eco_format!("invalid token {:?}", token.text)));
        SyntaxNode::error(error, token.text.clone())
    } else {
        SyntaxNode::leaf(token.kind, token.text.clone())
    }
}

/// A recursive-descent parser over a token slice.
///
/// Besides building the tree, the parser records every kind it tests for
/// while the current token is the completion point: the end of input or a
/// placeholder token. Once a required test fails there, the parser is
/// stalled and records nothing more.
struct Parser<'t> {
    /// The tokens, cut off where parsing should end.
    tokens: &'t [Token],
    /// The index of the token after `current`.
    pos: usize,
    /// The current token, not yet present in `nodes`.
    current: Current,
    /// Nodes of previously parsed text, including trivia before `current`.
    nodes: Vec<SyntaxNode>,
    /// The kinds tested at the completion point. Not part of checkpoints, so
    /// that backtracking only ever adds to it.
    expected: ExpectedSet,
    /// Whether a required test failed at the completion point.
    stalled: bool,
    /// How many expressions or types enclose the current token.
    depth: usize,
}

/// The lookahead token with the number of trivia nodes before it.
#[derive(Clone)]
struct Current {
    kind: SyntaxKind,
    node: SyntaxNode,
    n_trivia: usize,
}

/// An index into the parser's nodes vector, used as a start/stop point for
/// wrapping.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Marker(usize);

/// Cheap checkpoint of parser state for backtracking.
#[derive(Clone)]
struct Checkpoint {
    pos: usize,
    current: Current,
    node_len: usize,
    stalled: bool,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let mut pos = 0;
        let mut nodes = vec![];
        let current = Self::lex_past_trivia(tokens, &mut pos, &mut nodes);
        Self {
            tokens,
            pos,
            current,
            nodes,
            expected: ExpectedSet::new(),
            stalled: false,
            depth: 0,
        }
    }

    fn finish(self) -> ParseAttempt {
        ParseAttempt {
            root: SyntaxNode::inner(SyntaxKind::SourceFile, self.nodes),
            expected: self.expected,
        }
    }

    fn current_kind(&self) -> SyntaxKind {
        self.current.kind
    }

    /// The kind of the first non-trivia token after the current one.
    fn peek_kind(&self) -> SyntaxKind {
        self.tokens[self.pos..]
            .iter()
            .map(|token| token.kind)
            .find(|kind| !kind.is_trivia())
            .unwrap_or(SyntaxKind::Eof)
    }

    /// Whether the token right after the current one, without trivia in
    /// between, has the given kind.
    fn next_is_direct(&self, kind: SyntaxKind) -> bool {
        self.tokens.get(self.pos).is_some_and(|token| token.kind == kind)
    }

    fn end(&self) -> bool {
        self.current.kind == SyntaxKind::Eof
    }

    /// Whether the current token is where expected kinds are collected.
    fn at_point(&self) -> bool {
        matches!(self.current.kind, SyntaxKind::Eof | SyntaxKind::Placeholder)
    }

    fn record(&mut self, kind: SyntaxKind) {
        if self.at_point() && !self.stalled {
            self.expected.insert(kind);
        }
    }

    fn record_set(&mut self, set: SyntaxSet) {
        if self.at_point() && !self.stalled {
            self.expected.extend(set);
        }
    }

    fn at(&mut self, kind: SyntaxKind) -> bool {
        self.record(kind);
        self.current.kind == kind
    }

    fn at_set(&mut self, set: SyntaxSet) -> bool {
        self.record_set(set);
        set.contains(self.current.kind)
    }

    /// Whether the current token is the bare atom spelling the given
    /// attribute name.
    fn at_word(&mut self, kind: SyntaxKind) -> bool {
        self.record(kind);
        self.current.kind == SyntaxKind::Atom
            && kind.text() == Some(self.current.node.text().as_str())
    }

    fn eat_if(&mut self, kind: SyntaxKind) -> bool {
        let at = self.at(kind);
        if at {
            self.eat();
        }
        at
    }

    /// Eat the current token, which the caller already knows to be of the
    /// given kind. At the completion point the token is made up instead.
    #[track_caller]
    fn assert(&mut self, kind: SyntaxKind) {
        if self.at_point() {
            self.record(kind);
            if self.current.kind == SyntaxKind::Placeholder {
                self.convert_and_eat(kind);
            } else {
                self.nodes.push(SyntaxNode::leaf(kind, ""));
                self.current.n_trivia = 0;
            }
            return;
        }
        debug_assert_eq!(self.current.kind, kind);
        self.eat();
    }

    fn convert_and_eat(&mut self, kind: SyntaxKind) {
        self.current.node.convert_to_kind(kind);
        self.eat();
    }

    fn marker(&self) -> Marker {
        Marker(self.nodes.len())
    }

    fn before_trivia(&self) -> Marker {
        Marker(self.nodes.len() - self.current.n_trivia)
    }

    fn wrap(&mut self, from: Marker, kind: SyntaxKind) {
        let to = self.before_trivia().0;
        let from = from.0.min(to);
        let children = self.nodes.drain(from..to).collect();
        self.nodes.insert(from, SyntaxNode::inner(kind, children));
    }

    fn eat(&mut self) {
        self.nodes.push(std::mem::take(&mut self.current.node));
        self.current = Self::lex_past_trivia(self.tokens, &mut self.pos, &mut self.nodes);
    }

    fn lex_past_trivia(
        tokens: &[Token],
        pos: &mut usize,
        nodes: &mut Vec<SyntaxNode>,
    ) -> Current {
        let mut n_trivia = 0;
        while let Some(token) = tokens.get(*pos) {
            *pos += 1;
            let node = token_node(token);
            if !token.kind.is_trivia() {
                return Current { kind: token.kind, node, n_trivia };
            }
            nodes.push(node);
            n_trivia += 1;
        }
        Current {
            kind: SyntaxKind::Eof,
            node: SyntaxNode::leaf(SyntaxKind::Eof, ""),
            n_trivia,
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            current: self.current.clone(),
            node_len: self.nodes.len(),
            stalled: self.stalled,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.current = checkpoint.current;
        self.nodes.truncate(checkpoint.node_len);
        self.stalled = checkpoint.stalled;
    }
}

impl Parser<'_> {
    /// Consume the given syntax `kind` or produce an error.
    fn expect(&mut self, kind: SyntaxKind) -> bool {
        let at = self.at(kind);
        if at {
            self.eat();
        } else if kind == SyntaxKind::Atom && self.current.kind.is_reserved() {
            self.trim_errors();
            self.current.node.expected(kind.name());
            self.eat();
        } else {
            self.expected(kind.name());
        }
        at
    }

    /// Produce an error that the given `thing` was expected.
    fn expected(&mut self, thing: &str) {
        if self.at_point() {
            self.stalled = true;
        }
        let m = self.before_trivia();
        let after_error = m.0 > 0 && self.nodes[m.0 - 1].kind().is_error();
        if !after_error {
            self.expected_at(m, thing);
        }
    }

    /// Produce an error that the given `thing` was expected at the position
    /// of the marker `m`.
    fn expected_at(&mut self, m: Marker, thing: &str) {
        let error = SyntaxNode::error(SyntaxError::new(eco_format!("expected {thing}")), "");
        self.nodes.insert(m.0, error);
    }

    /// Consume the next token (unless at the end) and produce an error
    /// stating that it was unexpected.
    fn unexpected(&mut self) {
        if self.end() {
            return;
        }
        self.trim_errors();
        self.current.node.unexpected();
        self.eat();
    }

    /// Parse nested syntax one level deeper. Past [`MAX_DEPTH`], the current
    /// token is turned into an error instead and `f` does not run.
    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        if self.depth >= MAX_DEPTH {
            self.too_deep();
            return;
        }
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    /// Produce an error for syntax nested deeper than [`MAX_DEPTH`].
    fn too_deep(&mut self) {
        const MESSAGE: &str = "maximum nesting depth exceeded";
        if self.at_point() {
            self.stalled = true;
        }
        if self.end() {
            let m = self.before_trivia();
            let error = SyntaxNode::error(SyntaxError::new(MESSAGE), "");
            self.nodes.insert(m.0, error);
        } else {
            self.trim_errors();
            self.current.node.convert_to_error(MESSAGE);
            self.eat();
        }
    }

    /// Remove trailing errors with zero length.
    fn trim_errors(&mut self) {
        let Marker(end) = self.before_trivia();
        let mut start = end;
        while start > 0
            && self.nodes[start - 1].kind().is_error()
            && self.nodes[start - 1].is_empty()
        {
            start -= 1;
        }
        self.nodes.drain(start..end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"-module(shapes).
-behaviour(gen_server).
-export([area/1, start_link/0]).
-export_type([shape/0]).
-import(lists, [map/2, foldl/3]).
-include_lib("kernel/include/file.hrl").
-define(PI, 3.14159).
-define(SQUARE(X), ((X) * (X))).
-record(circle, {radius = 1.0 :: float(), label}).
-type shape() :: #circle{} | {square, number()} | [integer()].
-opaque id() :: 0..255.
-spec area(shape()) -> float(); (atom()) -> error.
-compile([export_all]).
-ifdef(TEST).
-endif.
-vsn("1.0").

%% Computes the area of a shape.
area(#circle{radius = R}) -> ?PI * ?SQUARE(R);
area({square, S}) when is_number(S), S > 0 -> S * S;
area(_) -> error.

start_link() ->
    Pid = spawn(fun() -> loop(#{count => 0}) end),
    Pid ! {hello, self()},
    {ok, Pid}.

loop(State = #{count := N}) ->
    receive
        {From, Msg} when is_pid(From) ->
            From ! {reply, Msg},
            loop(State#{count := N + 1});
        stop -> ok
    after 1000 ->
        timeout
    end.

classify(X) ->
    case X of
        N when N < 0 -> negative;
        0 -> zero;
        _ -> if X rem 2 =:= 0 -> even; true -> odd end
    end.

safe(F) ->
    try F() of
        Value -> {ok, Value}
    catch
        throw:Reason -> {error, Reason};
        error:Reason:Stack -> {error, Reason, Stack}
    after
        cleanup
    end.

bits(<<Size:8, Data:Size/binary, Rest/bits>>) ->
    Doubled = << <<(B * 2):8>> || <<B>> <= Data >>,
    Evens = [Y || Y <- lists:seq(1, 10), Y rem 2 == 0],
    {Doubled, Evens, Rest, begin catch length(Rest) end, not true andalso false}.

fields(R) -> {R#circle.radius, #circle.radius, fun area/1, fun lists:map/2, -1, $a, "a" "b"}.
"#;

    #[track_caller]
    fn expected(text: &str) -> ExpectedSet {
        parse(&tokenize(text), None).expected
    }

    #[track_caller]
    fn keywords(text: &str) -> Vec<SyntaxKind> {
        expected(text).keywords().collect()
    }

    fn count(node: &SyntaxNode, kind: SyntaxKind) -> usize {
        usize::from(node.kind() == kind)
            + node.children().map(|child| count(child, kind)).sum::<usize>()
    }

    #[test]
    fn test_parse_module_without_errors() {
        let root = parse_text(MODULE);
        assert_eq!(root.errors(), vec![], "{root:#?}");
        assert_eq!(root.clone().into_text(), MODULE);
        assert_eq!(count(&root, SyntaxKind::Function), 7);
        assert_eq!(count(&root, SyntaxKind::RecordDef), 1);
        assert_eq!(count(&root, SyntaxKind::MacroDef), 2);
        assert_eq!(count(&root, SyntaxKind::BinaryComprehension), 1);
        assert_eq!(count(&root, SyntaxKind::ListComprehension), 1);
        assert_eq!(count(&root, SyntaxKind::RecordAccess), 2);
        assert_eq!(count(&root, SyntaxKind::TryExpr), 1);
        assert!(root.find(SyntaxKind::Module).is_some());
        assert!(root.find(SyntaxKind::IncludeLib).is_some());
    }

    #[test]
    fn test_parse_is_lossless_on_garbage() {
        for text in ["-module(", "f(X) -> ) ] .", "'unclosed", "<<>>>>", "-export([f/]).", ";;;"] {
            let root = parse_text(text);
            assert_eq!(root.into_text(), text);
        }
    }

    #[test]
    fn test_parse_recovers_at_next_form() {
        let root = parse_text("f() -> ).\ng() -> ok.");
        assert!(root.erroneous());
        assert_eq!(count(&root, SyntaxKind::Function), 2);
        assert!(root.errors().iter().any(|error| error.message == "expected expression"));
    }

    #[test]
    fn test_parse_reports_missing_delimiter() {
        let root = parse_text("-module(foo");
        let errors = root.errors();
        assert_eq!(errors[0].message, "expected closing paren");
        assert_eq!(errors[0].range, 11..11);
    }

    #[test]
    fn test_expected_at_start_explores_every_form() {
        let expected = expected("");
        for kind in [
            SyntaxKind::Minus,
            SyntaxKind::Module,
            SyntaxKind::Export,
            SyntaxKind::Import,
            SyntaxKind::Record,
            SyntaxKind::Atom,
            SyntaxKind::LeftParen,
        ] {
            assert!(expected.contains(kind), "{kind:?} missing in {expected:?}");
        }
        assert!(!expected.contains(SyntaxKind::Case));
    }

    #[test]
    fn test_expected_at_placeholder_matches_end() {
        let attempt = parse(&[Token::placeholder(0)], None);
        let at_end: Vec<_> = expected("").keywords().collect();
        assert_eq!(attempt.expected.keywords().collect::<Vec<_>>(), at_end);
        assert!(attempt.root.erroneous());
        assert_eq!(attempt.root.len(), 0);
    }

    #[test]
    fn test_expected_attribute_names() {
        let keywords = keywords("-");
        assert_eq!(keywords.first(), Some(&SyntaxKind::Module));
        assert!(keywords.contains(&SyntaxKind::IncludeLib));
        assert!(keywords.contains(&SyntaxKind::Else));
        assert!(!keywords.contains(&SyntaxKind::Case));
    }

    #[test]
    fn test_expected_expression_keywords() {
        let keywords = keywords("f() -> ");
        for kind in [
            SyntaxKind::Catch,
            SyntaxKind::Not,
            SyntaxKind::Fun,
            SyntaxKind::Case,
            SyntaxKind::If,
            SyntaxKind::Receive,
            SyntaxKind::Try,
            SyntaxKind::Begin,
            SyntaxKind::Maybe,
        ] {
            assert!(keywords.contains(&kind), "{kind:?} missing in {keywords:?}");
        }
        assert!(!keywords.contains(&SyntaxKind::Module));
        assert!(!keywords.contains(&SyntaxKind::End));
    }

    #[test]
    fn test_expected_after_complete_operand() {
        assert!(keywords("f(X) ").contains(&SyntaxKind::When));
        let keywords = keywords("g() -> case X of a -> ok ");
        assert!(keywords.contains(&SyntaxKind::End));
        assert!(keywords.contains(&SyntaxKind::AndAlso));
        assert!(keywords.contains(&SyntaxKind::Rem));
    }

    #[test]
    fn test_expected_in_try_and_receive() {
        let in_try = keywords("f() -> try ok ");
        assert!(in_try.contains(&SyntaxKind::Of));
        assert!(in_try.contains(&SyntaxKind::Catch));
        assert!(in_try.contains(&SyntaxKind::After));
        assert!(keywords("f() -> receive ").contains(&SyntaxKind::After));
    }

    #[test]
    fn test_expected_stops_after_stall() {
        let expected = expected("-module(");
        assert!(expected.contains(SyntaxKind::Atom));
        assert!(!expected.contains(SyntaxKind::RightParen));
        assert!(!expected.contains(SyntaxKind::Dot));
        assert_eq!(expected.keywords().count(), 0);
    }

    #[test]
    fn test_stop_before_truncates() {
        let text = "-module(x).\nf() -> ok.";
        let tokens = tokenize(text);
        let stop = text.find('f').unwrap();
        let attempt = parse(&tokens, Some(stop));
        assert_eq!(attempt.root.into_text(), &text[..stop]);
        assert!(attempt.expected.contains(SyntaxKind::Module));
    }

    #[test]
    fn test_expected_after_unfinished_literal_is_empty() {
        for text in ["f() -> \"", "f() -> '", "f() -> )", "-module(x) ]"] {
            let expected = expected(text);
            assert!(expected.is_empty(), "{text:?} expected {expected:?}");
        }
    }

    #[test]
    fn test_parse_limits_nesting_depth() {
        let cases = [
            ("f() -> ", "("),
            ("f() -> ", "[{"),
            ("f() -> ", "- "),
            ("f() -> ", "<<"),
            ("-type t() :: ", "["),
        ];
        for (prefix, open) in cases {
            let text = format!("{prefix}{}", open.repeat(100_000));
            let root = parse_text(&text);
            let errors = root.errors();
            assert!(errors.iter().any(|error| error.message == "maximum nesting depth exceeded"));
            assert_eq!(root.into_text(), text);
        }
    }

    #[test]
    fn test_parse_binary_types() {
        let root = parse_text("-type bits() :: <<_:8, _:_*1>>.\n-type empty() :: <<>>.\n");
        assert_eq!(root.errors(), vec![]);
        let root = parse_text("-type broken() :: <<_:8.\nf() -> ok.");
        assert!(root.erroneous());
        assert_eq!(count(&root, SyntaxKind::Function), 1);
    }

    #[test]
    fn test_parse_accepts_moderate_nesting() {
        let text = format!("f() -> {}ok{}.", "(".repeat(100), ")".repeat(100));
        let root = parse_text(&text);
        assert_eq!(root.errors(), vec![]);
        assert_eq!(count(&root, SyntaxKind::Parenthesized), 100);
    }
}
