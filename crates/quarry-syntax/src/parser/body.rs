//! The lazy body/statement parser.
//!
//! Bodies are parsed from the token boundaries the diet pass recorded.
//! Without statements recovery the longest cleanly-parsed statement prefix
//! is kept and a malformed first statement leaves the body empty; with
//! statements recovery, unparseable fragments are rebuilt around `$missing$`
//! placeholders and local types are reconstructed through the structural
//! parser.
//!
//! During an assist parse the statement list reduces around the cursor:
//! preceding local declarations are retained without initializers, other
//! preceding statements are dropped, the statement that produced the assist
//! node is kept whole, and trailing statements are dropped.

use smol_str::SmolStr;
use tracing::trace;

use quarry_core::TextRange;

use crate::assist::{completion_prefix, AssistState};
use crate::ast::*;
use crate::lexer::TokenKind;
use crate::parser::structure::{self, NameHit};
use crate::parser::{recovery, Cursor};
use crate::printer::{expr_display, expr_holds_assist};
use crate::{ParseError, ParserOptions, Token};

/// Native recursion is bounded for statements and expressions alike;
/// structural nesting already lives on an explicit frame stack.
const MAX_NESTING_DEPTH: u32 = 160;

pub(crate) struct BodyOutcome {
    pub(crate) statements: Vec<Statement>,
    pub(crate) explicit_call: Option<ExplicitCall>,
}

/// Parse the statements of one previously skipped body.
#[allow(clippy::too_many_arguments)]
pub(crate) fn parse_body_range(
    source: &str,
    tokens: &[Token],
    skipped: SkippedBody,
    options: &ParserOptions,
    errors: &mut Vec<ParseError>,
    assist: &mut Option<AssistState>,
    is_constructor: bool,
    depth: u32,
) -> BodyOutcome {
    // Recovery-enabled parses read past the clean prefix into the region the
    // diet scan could only balance, which is where local types get rebuilt.
    let end = if options.statements_recovery || options.methods_full_recovery {
        skipped.end_token
    } else {
        skipped.clean_end_token
    };
    let mut cx = Cursor::slice(source, tokens, skipped.start_token as usize, end as usize);
    let mut parser = BodyParser {
        cx: &mut cx,
        options,
        errors,
        assist,
        depth,
        stmt_capture_base: true,
    };
    let explicit_call = if is_constructor {
        parser.parse_explicit_call()
    } else {
        None
    };
    let statements = parser.parse_statement_list_top();
    BodyOutcome {
        statements,
        explicit_call,
    }
}

/// Parse one expression on behalf of the structural pass (field and
/// annotation values, enum constant arguments).
pub(crate) fn parse_embedded_expr(
    cx: &mut Cursor<'_>,
    options: &ParserOptions,
    errors: &mut Vec<ParseError>,
    assist: &mut Option<AssistState>,
) -> Option<Expr> {
    let mut parser = BodyParser {
        cx,
        options,
        errors,
        assist,
        depth: 0,
        stmt_capture_base: true,
    };
    if parser.cx.at(TokenKind::LBrace) {
        return parser.parse_array_init();
    }
    parser.parse_expr()
}

struct BodyParser<'a, 'src> {
    cx: &'a mut Cursor<'src>,
    options: &'a ParserOptions,
    errors: &'a mut Vec<ParseError>,
    assist: &'a mut Option<AssistState>,
    depth: u32,
    /// Whether an assist capture already existed when the current statement
    /// began; a capture newer than this keeps its statement despite trailing
    /// junk.
    stmt_capture_base: bool,
}

impl<'a, 'src> BodyParser<'a, 'src> {
    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.cx.current().range;
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    fn recovery_on(&self) -> bool {
        self.options.statements_recovery
    }

    fn capture_done(&self) -> bool {
        self.assist.as_ref().is_some_and(|s| s.capture.is_some())
    }

    fn stmt_captured(&self) -> bool {
        self.capture_done() && !self.stmt_capture_base
    }

    /// Loose continuation: statement recovery is on, or the current statement
    /// holds the assist node and must survive whatever trails it.
    fn lenient(&self) -> bool {
        self.recovery_on() || self.stmt_captured()
    }

    fn require(&mut self, kind: TokenKind) -> bool {
        self.cx.eat(kind) || self.lenient()
    }

    fn skip_to_stmt_boundary(&mut self) {
        loop {
            match self.cx.kind() {
                TokenKind::Semicolon => {
                    self.cx.bump();
                    break;
                }
                TokenKind::RBrace | TokenKind::Eof => break,
                _ => {
                    self.cx.bump();
                }
            }
        }
    }

    fn skip_balanced_parens(&mut self) {
        if !self.cx.at(TokenKind::LParen) {
            return;
        }
        let mut depth = 0u32;
        loop {
            match self.cx.kind() {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    self.cx.bump();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                    continue;
                }
                TokenKind::Eof | TokenKind::LBrace | TokenKind::RBrace => return,
                _ => {}
            }
            self.cx.bump();
        }
    }

    // ---- statements ----------------------------------------------------

    /// A constructor's leading `super(...)`/`this(...)` chain call.
    fn parse_explicit_call(&mut self) -> Option<ExplicitCall> {
        let is_super = match self.cx.kind() {
            TokenKind::SuperKw => true,
            TokenKind::ThisKw => false,
            _ => return None,
        };
        if self.cx.nth(1) != TokenKind::LParen {
            return None;
        }
        self.cx.bump();
        self.cx.bump();
        let args = self.parse_arg_list();
        self.cx.eat(TokenKind::Semicolon);
        Some(ExplicitCall { is_super, args })
    }

    fn parse_statement_list_top(&mut self) -> Vec<Statement> {
        let mut out = Vec::new();
        loop {
            if self.cx.at_end() {
                break;
            }
            if self.cx.at(TokenKind::RBrace) {
                // Stray closer left behind by a synthesized closure.
                self.cx.bump();
                continue;
            }
            let before_len = out.len();
            let had_capture = self.capture_done();
            let mark = self.cx.pos();
            let ok = self.parse_statement_into(&mut out);
            if !ok {
                if !self.recovery_on() {
                    break;
                }
                if self.cx.pos() == mark {
                    self.cx.bump();
                }
                continue;
            }
            if self.assist.is_some() {
                let has_capture = self.capture_done();
                if !had_capture && has_capture {
                    // The assist statement; everything after it is dropped.
                    break;
                }
                if has_capture {
                    out.truncate(before_len);
                    break;
                }
                let kept: Vec<Statement> = out
                    .split_off(before_len)
                    .into_iter()
                    .filter_map(|stmt| match stmt {
                        Statement::LocalVar(mut decl) => {
                            decl.initializer = None;
                            Some(Statement::LocalVar(decl))
                        }
                        stmt @ Statement::LocalType(_) => Some(stmt),
                        _ => None,
                    })
                    .collect();
                out.extend(kept);
            }
        }
        out
    }

    /// Parse one source statement into `out` (local variable declarations
    /// expand to one statement per declarator). `false` means no statement
    /// could be formed at the cursor.
    fn parse_statement_into(&mut self, out: &mut Vec<Statement>) -> bool {
        self.stmt_capture_base = self.capture_done();
        match self.cx.kind() {
            TokenKind::FinalKw | TokenKind::AbstractKw | TokenKind::StaticKw => {
                return self.parse_modified_decl(out);
            }
            TokenKind::At if self.cx.nth(1) == TokenKind::Identifier => {
                return self.parse_modified_decl(out);
            }
            TokenKind::SynchronizedKw if self.cx.nth(1) != TokenKind::LParen => {
                return self.parse_modified_decl(out);
            }
            _ => {}
        }
        if self.at_local_var_decl() {
            return self.parse_local_var_stmt(Modifiers::empty(), out);
        }
        match self.parse_statement() {
            Some(stmt) => {
                out.push(stmt);
                true
            }
            None => false,
        }
    }

    /// A statement opened by modifiers: a local type or a modified local.
    fn parse_modified_decl(&mut self, out: &mut Vec<Statement>) -> bool {
        let modifiers = self.parse_local_modifiers();
        match self.cx.kind() {
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => {
                match self.parse_local_type_stmt(modifiers) {
                    Some(stmt) => {
                        out.push(stmt);
                        true
                    }
                    None => false,
                }
            }
            _ => self.parse_local_var_stmt(modifiers, out),
        }
    }

    fn parse_local_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            if let Some(bit) = structure::modifier_bit(self.cx.kind()) {
                modifiers.insert(bit);
                self.cx.bump();
                continue;
            }
            if self.cx.at(TokenKind::At) && self.cx.nth(1) == TokenKind::Identifier {
                // Annotations on locals are balanced over; the local model
                // does not carry them.
                self.cx.bump();
                let _ = structure::parse_dotted_name(self.cx, &mut None);
                self.skip_balanced_parens();
                continue;
            }
            break;
        }
        modifiers
    }

    fn parse_local_type_stmt(&mut self, modifiers: Modifiers) -> Option<Statement> {
        let mut decl = structure::parse_local_type(
            self.cx,
            self.options,
            self.errors,
            self.assist,
            modifiers,
            Vec::new(),
        )?;
        self.parse_decl_skipped_bodies(&mut decl);
        Some(Statement::LocalType(Box::new(decl)))
    }

    /// Parse the skipped member bodies of a type reconstructed mid-body (a
    /// local or anonymous class), so full parses carry its statements too.
    fn parse_decl_skipped_bodies(&mut self, ty: &mut TypeDecl) {
        if self.depth >= MAX_NESTING_DEPTH {
            return;
        }
        for member in &mut ty.members {
            if let Member::Initializer(init) = member {
                let BodyState::Skipped(skipped) = &init.body else {
                    continue;
                };
                let skipped = *skipped;
                let outcome = parse_body_range(
                    self.cx.source(),
                    self.cx.tokens(),
                    skipped,
                    self.options,
                    self.errors,
                    self.assist,
                    false,
                    self.depth + 1,
                );
                init.body = BodyState::Parsed(outcome.statements);
            }
        }
        for method in &mut ty.methods {
            if method.is_synthesized {
                continue;
            }
            let BodyState::Skipped(skipped) = &method.body else {
                continue;
            };
            let skipped = *skipped;
            let is_constructor = method.kind == MethodKind::Constructor;
            let outcome = parse_body_range(
                self.cx.source(),
                self.cx.tokens(),
                skipped,
                self.options,
                self.errors,
                self.assist,
                is_constructor,
                self.depth + 1,
            );
            if is_constructor {
                method.explicit_call = outcome
                    .explicit_call
                    .or_else(|| Some(ExplicitCall::implicit_super()));
            }
            method.body = BodyState::Parsed(outcome.statements);
        }
        for nested in &mut ty.member_types {
            self.parse_decl_skipped_bodies(nested);
        }
    }

    fn at_local_var_decl(&self) -> bool {
        match recovery::type_shape_len(self.cx) {
            Some(n) => {
                self.cx.nth(n) == TokenKind::Identifier && self.cx.nth(n + 1) != TokenKind::LParen
            }
            None => false,
        }
    }

    fn parse_local_var_stmt(&mut self, modifiers: Modifiers, out: &mut Vec<Statement>) -> bool {
        let Some(decls) = self.parse_local_var_decls(modifiers) else {
            return false;
        };
        if !self.cx.eat(TokenKind::Semicolon) {
            if self.stmt_captured() {
                self.skip_to_stmt_boundary();
            } else if !self.recovery_on() {
                return false;
            }
        }
        out.extend(decls.into_iter().map(Statement::LocalVar));
        true
    }

    /// The declarator list of a local variable statement, terminator left to
    /// the caller (statements end with `;`, for-initializers share the
    /// loop's own).
    fn parse_local_var_decls(&mut self, modifiers: Modifiers) -> Option<Vec<LocalVarDecl>> {
        let base = self.parse_type_ref(true, true)?;
        let mut decls = Vec::new();
        loop {
            if !self.cx.at(TokenKind::Identifier) {
                if decls.is_empty() && !self.lenient() {
                    return None;
                }
                break;
            }
            let name_tok = self.cx.bump();
            let mut ty = base.clone();
            self.eat_array_dims(&mut ty);
            let mut initializer = None;
            if self.cx.eat(TokenKind::Eq) {
                initializer = if self.cx.at(TokenKind::LBrace) {
                    self.parse_array_init()
                } else {
                    self.parse_expr()
                };
                if initializer.is_none() {
                    if !self.lenient() {
                        return None;
                    }
                    trace!("missing local variable initializer");
                    initializer = Some(Expr::Missing);
                }
            }
            decls.push(LocalVarDecl {
                modifiers,
                ty,
                name: SmolStr::new(self.cx.text(name_tok)),
                name_range: name_tok.range,
                initializer,
            });
            if !self.cx.eat(TokenKind::Comma) {
                break;
            }
        }
        if decls.is_empty() {
            return None;
        }
        Some(decls)
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        if self.depth >= MAX_NESTING_DEPTH {
            return None;
        }
        self.depth += 1;
        let result = self.parse_statement_inner();
        self.depth -= 1;
        result
    }

    /// An embedded (if/while/for/do) sub-statement; local declarations wrap
    /// into a block when they expand.
    fn parse_embedded_statement(&mut self) -> Option<Statement> {
        if self.at_local_var_decl() {
            let mut tmp = Vec::new();
            if !self.parse_local_var_stmt(Modifiers::empty(), &mut tmp) {
                return None;
            }
            return Some(if tmp.len() == 1 {
                tmp.pop().expect("single statement")
            } else {
                Statement::Block(tmp)
            });
        }
        self.parse_statement()
    }

    fn parse_statement_inner(&mut self) -> Option<Statement> {
        match self.cx.kind() {
            TokenKind::LBrace => {
                self.cx.bump();
                let body = self.parse_block_rest()?;
                Some(Statement::Block(body))
            }
            TokenKind::Semicolon => {
                self.cx.bump();
                Some(Statement::Empty)
            }
            TokenKind::IfKw => self.parse_if(),
            TokenKind::WhileKw => self.parse_while(),
            TokenKind::DoKw => self.parse_do(),
            TokenKind::ForKw => self.parse_for(),
            TokenKind::ReturnKw => self.parse_return(),
            TokenKind::ThrowKw => self.parse_throw(),
            TokenKind::BreakKw => self.parse_break_continue(false),
            TokenKind::ContinueKw => self.parse_break_continue(true),
            TokenKind::TryKw => self.parse_try(),
            TokenKind::SwitchKw => self.parse_switch(),
            TokenKind::AssertKw => self.parse_assert(),
            TokenKind::SynchronizedKw if self.cx.nth(1) == TokenKind::LParen => {
                self.parse_synchronized()
            }
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => {
                self.parse_local_type_stmt(Modifiers::empty())
            }
            TokenKind::Identifier if self.cx.nth(1) == TokenKind::Colon => {
                let tok = self.cx.bump();
                self.cx.bump();
                let label = SmolStr::new(self.cx.text(tok));
                let body = self.parse_statement()?;
                Some(Statement::Labeled {
                    label,
                    body: Box::new(body),
                })
            }
            _ => self.parse_expr_statement(),
        }
    }

    /// Statements until the block's `}` (consumed). `None` propagates a
    /// strict-mode truncation up to the top-level prefix cut.
    fn parse_block_rest(&mut self) -> Option<Vec<Statement>> {
        let mut out = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::RBrace => {
                    self.cx.bump();
                    break;
                }
                TokenKind::Eof => break,
                _ => {
                    let mark = self.cx.pos();
                    if !self.parse_statement_into(&mut out) {
                        if !self.lenient() {
                            return None;
                        }
                        if self.cx.pos() == mark {
                            self.cx.bump();
                        }
                    }
                }
            }
        }
        Some(out)
    }

    fn parse_if(&mut self) -> Option<Statement> {
        self.cx.bump();
        if !self.require(TokenKind::LParen) {
            return None;
        }
        let cond = if self.cx.at(TokenKind::RParen) || self.cx.at(TokenKind::Eof) {
            None
        } else {
            self.parse_expr()
        };
        let cond = match cond {
            Some(cond) => cond,
            None => {
                if !self.lenient() {
                    return None;
                }
                trace!("missing if condition");
                Expr::Missing
            }
        };
        if !self.require(TokenKind::RParen) {
            return None;
        }
        let then_branch = match self.parse_embedded_statement() {
            Some(stmt) => stmt,
            None => {
                if !self.lenient() {
                    return None;
                }
                Statement::Empty
            }
        };
        let else_branch = if self.cx.eat(TokenKind::ElseKw) {
            match self.parse_embedded_statement() {
                Some(stmt) => Some(Box::new(stmt)),
                None => {
                    if !self.lenient() {
                        return None;
                    }
                    Some(Box::new(Statement::Empty))
                }
            }
        } else {
            None
        };
        Some(Statement::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Option<Statement> {
        self.cx.bump();
        if !self.require(TokenKind::LParen) {
            return None;
        }
        let cond = match self.parse_expr() {
            Some(cond) => cond,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.require(TokenKind::RParen) {
            return None;
        }
        let body = match self.parse_embedded_statement() {
            Some(stmt) => stmt,
            None => {
                if !self.lenient() {
                    return None;
                }
                Statement::Empty
            }
        };
        Some(Statement::While {
            cond,
            body: Box::new(body),
        })
    }

    fn parse_do(&mut self) -> Option<Statement> {
        self.cx.bump();
        let body = match self.parse_embedded_statement() {
            Some(stmt) => stmt,
            None => {
                if !self.lenient() {
                    return None;
                }
                Statement::Empty
            }
        };
        if !self.require(TokenKind::WhileKw) {
            return None;
        }
        if !self.require(TokenKind::LParen) {
            return None;
        }
        let cond = match self.parse_expr() {
            Some(cond) => cond,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.require(TokenKind::RParen) {
            return None;
        }
        if !self.require(TokenKind::Semicolon) {
            return None;
        }
        Some(Statement::Do {
            body: Box::new(body),
            cond,
        })
    }

    fn parse_for(&mut self) -> Option<Statement> {
        self.cx.bump();
        if !self.cx.eat(TokenKind::LParen) {
            return self.broken_for();
        }
        let mut init = Vec::new();
        if !self.cx.eat(TokenKind::Semicolon) {
            if self.at_local_var_decl() {
                match self.parse_local_var_decls(Modifiers::empty()) {
                    Some(decls) => init.extend(decls.into_iter().map(Statement::LocalVar)),
                    None => return self.broken_for(),
                }
            } else {
                loop {
                    match self.parse_expr() {
                        Some(expr) => init.push(Statement::Expr(expr)),
                        None => return self.broken_for(),
                    }
                    if !self.cx.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            if !self.cx.eat(TokenKind::Semicolon) {
                return self.broken_for();
            }
        }
        let cond = if self.cx.at(TokenKind::Semicolon) {
            None
        } else {
            match self.parse_expr() {
                Some(cond) => Some(cond),
                None => return self.broken_for(),
            }
        };
        if !self.cx.eat(TokenKind::Semicolon) {
            return self.broken_for();
        }
        let mut update = Vec::new();
        if !self.cx.at(TokenKind::RParen) {
            loop {
                match self.parse_expr() {
                    Some(expr) => update.push(expr),
                    None => return self.broken_for(),
                }
                if !self.cx.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        if !self.cx.eat(TokenKind::RParen) {
            return self.broken_for();
        }
        let body = match self.parse_embedded_statement() {
            Some(stmt) => stmt,
            None => {
                if !self.lenient() {
                    return None;
                }
                Statement::Empty
            }
        };
        Some(Statement::For {
            init,
            cond,
            update,
            body: Box::new(body),
        })
    }

    /// An unterminated `for (` rebuilds as the empty loop `for (;;) ;`.
    fn broken_for(&mut self) -> Option<Statement> {
        if !self.lenient() {
            return None;
        }
        trace!("rebuilding broken for header");
        self.error_here("unterminated for statement");
        self.skip_to_stmt_boundary();
        Some(Statement::For {
            init: Vec::new(),
            cond: None,
            update: Vec::new(),
            body: Box::new(Statement::Empty),
        })
    }

    fn parse_return(&mut self) -> Option<Statement> {
        self.cx.bump();
        if self.cx.eat(TokenKind::Semicolon) {
            return Some(Statement::Return(None));
        }
        if matches!(self.cx.kind(), TokenKind::RBrace | TokenKind::Eof) {
            // `return` cut off at the body edge.
            return if self.lenient() {
                Some(Statement::Return(None))
            } else {
                None
            };
        }
        match self.parse_expr() {
            Some(value) => {
                if !self.cx.eat(TokenKind::Semicolon) {
                    if self.stmt_captured() {
                        self.skip_to_stmt_boundary();
                    } else if !self.recovery_on() {
                        return None;
                    }
                }
                Some(Statement::Return(Some(value)))
            }
            None => {
                if !self.lenient() {
                    return None;
                }
                self.skip_to_stmt_boundary();
                Some(Statement::Return(Some(Expr::Missing)))
            }
        }
    }

    fn parse_throw(&mut self) -> Option<Statement> {
        self.cx.bump();
        let value = match self.parse_expr() {
            Some(value) => value,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.require(TokenKind::Semicolon) {
            return None;
        }
        Some(Statement::Throw(value))
    }

    fn parse_break_continue(&mut self, is_continue: bool) -> Option<Statement> {
        self.cx.bump();
        let label = if self.cx.at(TokenKind::Identifier) {
            let tok = self.cx.bump();
            Some(SmolStr::new(self.cx.text(tok)))
        } else {
            None
        };
        if !self.require(TokenKind::Semicolon) {
            return None;
        }
        Some(if is_continue {
            Statement::Continue(label)
        } else {
            Statement::Break(label)
        })
    }

    fn parse_try(&mut self) -> Option<Statement> {
        self.cx.bump();
        if !self.cx.eat(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_rest()?;
        let mut catches = Vec::new();
        let mut finally = None;
        loop {
            if self.cx.at(TokenKind::CatchKw) {
                self.cx.bump();
                if !self.require(TokenKind::LParen) {
                    return None;
                }
                self.cx.eat(TokenKind::FinalKw);
                let ty = self.parse_type_ref(true, true)?;
                let name = if self.cx.at(TokenKind::Identifier) {
                    let tok = self.cx.bump();
                    SmolStr::new(self.cx.text(tok))
                } else {
                    SmolStr::default()
                };
                if !self.require(TokenKind::RParen) {
                    return None;
                }
                if !self.cx.eat(TokenKind::LBrace) {
                    return None;
                }
                let catch_body = self.parse_block_rest()?;
                catches.push(CatchClause {
                    param: Param {
                        modifiers: Modifiers::empty(),
                        annotations: Vec::new(),
                        ty,
                        name,
                        varargs: false,
                    },
                    body: catch_body,
                });
            } else if self.cx.at(TokenKind::FinallyKw) {
                self.cx.bump();
                if !self.cx.eat(TokenKind::LBrace) {
                    return None;
                }
                finally = Some(self.parse_block_rest()?);
                break;
            } else {
                break;
            }
        }
        Some(Statement::Try {
            body,
            catches,
            finally,
        })
    }

    fn parse_switch(&mut self) -> Option<Statement> {
        self.cx.bump();
        if !self.require(TokenKind::LParen) {
            return None;
        }
        let scrutinee = match self.parse_expr() {
            Some(expr) => expr,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.require(TokenKind::RParen) {
            return None;
        }
        if !self.cx.eat(TokenKind::LBrace) {
            return None;
        }
        let mut cases: Vec<SwitchCase> = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::RBrace => {
                    self.cx.bump();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::CaseKw => {
                    self.cx.bump();
                    let label = self.parse_expr().unwrap_or(Expr::Missing);
                    self.cx.eat(TokenKind::Colon);
                    cases.push(SwitchCase {
                        label: Some(label),
                        body: Vec::new(),
                    });
                }
                TokenKind::DefaultKw => {
                    self.cx.bump();
                    self.cx.eat(TokenKind::Colon);
                    cases.push(SwitchCase {
                        label: None,
                        body: Vec::new(),
                    });
                }
                _ => {
                    let mark = self.cx.pos();
                    let mut tmp = Vec::new();
                    let ok = self.parse_statement_into(&mut tmp);
                    if let Some(case) = cases.last_mut() {
                        case.body.append(&mut tmp);
                    }
                    if !ok {
                        if !self.lenient() {
                            return None;
                        }
                        if self.cx.pos() == mark {
                            self.cx.bump();
                        }
                    }
                }
            }
        }
        Some(Statement::Switch { scrutinee, cases })
    }

    fn parse_assert(&mut self) -> Option<Statement> {
        self.cx.bump();
        let cond = match self.parse_expr() {
            Some(cond) => cond,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        let detail = if self.cx.eat(TokenKind::Colon) {
            match self.parse_expr() {
                Some(detail) => Some(detail),
                None => {
                    if !self.lenient() {
                        return None;
                    }
                    Some(Expr::Missing)
                }
            }
        } else {
            None
        };
        if !self.require(TokenKind::Semicolon) {
            return None;
        }
        Some(Statement::Assert { cond, detail })
    }

    fn parse_synchronized(&mut self) -> Option<Statement> {
        self.cx.bump();
        self.cx.bump();
        let lock = match self.parse_expr() {
            Some(lock) => lock,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.require(TokenKind::RParen) {
            return None;
        }
        if !self.cx.eat(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_rest()?;
        Some(Statement::Synchronized { lock, body })
    }

    fn parse_expr_statement(&mut self) -> Option<Statement> {
        let expr = self.parse_expr()?;
        if self.cx.eat(TokenKind::Semicolon) {
            return Some(Statement::Expr(expr));
        }
        if self.stmt_captured() {
            self.skip_to_stmt_boundary();
            return Some(Statement::Expr(expr));
        }
        if !self.recovery_on() {
            return None;
        }
        // A dangling name with nothing around it rebuilds as an assignment
        // of the missing expression.
        let expr = match expr {
            lhs @ (Expr::Name(_) | Expr::FieldAccess { .. }) => {
                trace!("rebuilding dangling name as missing assignment");
                Expr::Assign {
                    op: SmolStr::new("="),
                    lhs: Box::new(lhs),
                    rhs: Box::new(Expr::Missing),
                }
            }
            expr => expr,
        };
        Some(Statement::Expr(expr))
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<Expr> {
        let lhs = self.parse_conditional()?;
        let op = match self.cx.kind() {
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::UshrEq => ">>>=",
            _ => return Some(lhs),
        };
        self.cx.bump();
        let rhs = match self.parse_assignment() {
            Some(rhs) => rhs,
            None => {
                if !self.lenient() {
                    return None;
                }
                trace!("missing assignment right-hand side");
                Expr::Missing
            }
        };
        Some(Expr::Assign {
            op: SmolStr::new(op),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_conditional(&mut self) -> Option<Expr> {
        let cond = self.parse_binary(1)?;
        if !self.cx.eat(TokenKind::Question) {
            return Some(cond);
        }
        let then_value = match self.parse_expr() {
            Some(value) => value,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        if !self.cx.eat(TokenKind::Colon) && !self.lenient() {
            return None;
        }
        let else_value = match self.parse_conditional() {
            Some(value) => value,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        Some(Expr::Conditional {
            cond: Box::new(cond),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        })
    }

    /// The binary operator at the cursor: text, precedence, token count.
    /// Shifts are folded back from adjacent angle tokens here.
    fn peek_binary_op(&self) -> Option<(&'static str, u8, usize)> {
        Some(match self.cx.kind() {
            TokenKind::PipePipe => ("||", 1, 1),
            TokenKind::AmpAmp => ("&&", 2, 1),
            TokenKind::Pipe => ("|", 3, 1),
            TokenKind::Caret => ("^", 4, 1),
            TokenKind::Amp => ("&", 5, 1),
            TokenKind::EqEq => ("==", 6, 1),
            TokenKind::BangEq => ("!=", 6, 1),
            TokenKind::InstanceofKw => ("instanceof", 7, 1),
            TokenKind::LtEq => ("<=", 7, 1),
            TokenKind::GtEq => (">=", 7, 1),
            TokenKind::Lt => {
                let a = self.cx.nth_token(0);
                let b = self.cx.nth_token(1);
                if b.kind == TokenKind::Lt && self.cx.adjacent(a, b) {
                    ("<<", 8, 2)
                } else {
                    ("<", 7, 1)
                }
            }
            TokenKind::Gt => {
                let a = self.cx.nth_token(0);
                let b = self.cx.nth_token(1);
                let c = self.cx.nth_token(2);
                if b.kind == TokenKind::Gt && self.cx.adjacent(a, b) {
                    if c.kind == TokenKind::Gt && self.cx.adjacent(b, c) {
                        (">>>", 8, 3)
                    } else {
                        (">>", 8, 2)
                    }
                } else {
                    (">", 7, 1)
                }
            }
            TokenKind::Plus => ("+", 9, 1),
            TokenKind::Minus => ("-", 9, 1),
            TokenKind::Star => ("*", 10, 1),
            TokenKind::Slash => ("/", 10, 1),
            TokenKind::Percent => ("%", 10, 1),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, prec, len)) = self.peek_binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            for _ in 0..len {
                self.cx.bump();
            }
            if op == "instanceof" {
                match self.parse_type_ref(true, true) {
                    Some(ty) => {
                        lhs = Expr::InstanceOf {
                            expr: Box::new(lhs),
                            ty,
                        };
                        continue;
                    }
                    None => {
                        if !self.lenient() {
                            return None;
                        }
                        break;
                    }
                }
            }
            let rhs = match self.parse_binary(prec + 1) {
                Some(rhs) => rhs,
                None => {
                    if !self.lenient() {
                        return None;
                    }
                    Expr::Missing
                }
            };
            let expr = Expr::Binary {
                op: SmolStr::new(op),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            // The innermost binary holding a fresh assist node claims the
            // parent context.
            if self.assist.is_some() && expr_holds_assist(&expr) {
                let display = expr_display(&expr);
                if let Some(state) = self.assist.as_mut() {
                    state.claim_parent(display);
                }
            }
            lhs = expr;
        }
        Some(lhs)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return None;
        }
        self.depth += 1;
        let result = self.parse_unary_inner();
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self) -> Option<Expr> {
        let op = match self.cx.kind() {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::LParen => {
                if let Some(cast) = self.try_parse_cast() {
                    return Some(cast);
                }
                return self.parse_postfix();
            }
            _ => return self.parse_postfix(),
        };
        self.cx.bump();
        let operand = match self.parse_unary() {
            Some(operand) => operand,
            None => {
                if !self.lenient() {
                    return None;
                }
                Expr::Missing
            }
        };
        Some(Expr::Unary {
            op: SmolStr::new(op),
            operand: Box::new(operand),
            postfix: false,
        })
    }

    /// Speculative cast parse: `(` type `)` followed by something only a
    /// cast operand can start. Resets and yields to parenthesized-expression
    /// parsing otherwise.
    fn try_parse_cast(&mut self) -> Option<Expr> {
        let mark = self.cx.pos();
        self.cx.bump();
        let primitive = self.cx.kind().is_primitive_type();
        let ty = match self.parse_type_ref(false, true) {
            Some(ty) => ty,
            None => {
                self.cx.reset(mark);
                return None;
            }
        };
        if !self.cx.eat(TokenKind::RParen) {
            self.cx.reset(mark);
            return None;
        }
        if !self.starts_cast_operand(primitive) {
            self.cx.reset(mark);
            return None;
        }
        match self.parse_unary() {
            Some(expr) => Some(Expr::Cast {
                ty,
                expr: Box::new(expr),
            }),
            None => {
                self.cx.reset(mark);
                None
            }
        }
    }

    fn starts_cast_operand(&self, primitive: bool) -> bool {
        match self.cx.kind() {
            TokenKind::Identifier
            | TokenKind::LParen
            | TokenKind::ThisKw
            | TokenKind::SuperKw
            | TokenKind::NewKw
            | TokenKind::Bang
            | TokenKind::Tilde => true,
            // `(int) -1` is a cast; `(a) - 1` is a subtraction.
            TokenKind::Plus | TokenKind::Minus => primitive,
            k => k.is_literal(),
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let start = self.cx.current().range.start;
        let mut expr = self.parse_primary()?;
        loop {
            match self.cx.kind() {
                TokenKind::Dot => {
                    let receiver_span = TextRange::new(start, self.cx.prev_end());
                    match self.cx.nth(1) {
                        TokenKind::Identifier => {
                            self.cx.bump();
                            let name_tok = self.cx.bump();
                            match self.try_member_assist(expr, receiver_span, name_tok) {
                                Ok(assist_expr) => return Some(assist_expr),
                                Err(receiver) => expr = receiver,
                            }
                            let name = SmolStr::new(self.cx.text(name_tok));
                            if self.cx.at(TokenKind::LParen) {
                                self.cx.bump();
                                let args = self.parse_arg_list();
                                expr = Expr::MethodCall {
                                    receiver: Some(Box::new(expr)),
                                    name,
                                    args,
                                    range: TextRange::new(start, self.cx.prev_end()),
                                };
                            } else {
                                expr = Expr::FieldAccess {
                                    receiver: Box::new(expr),
                                    name,
                                    name_range: name_tok.range,
                                };
                            }
                        }
                        TokenKind::ThisKw | TokenKind::ClassKw => {
                            self.cx.bump();
                            let tok = self.cx.bump();
                            expr = Expr::FieldAccess {
                                receiver: Box::new(expr),
                                name: SmolStr::new(self.cx.text(tok)),
                                name_range: tok.range,
                            };
                        }
                        _ => break,
                    }
                }
                TokenKind::LBracket if self.cx.nth(1) != TokenKind::RBracket => {
                    self.cx.bump();
                    let index = match self.parse_expr() {
                        Some(index) => index,
                        None => {
                            if !self.lenient() {
                                return None;
                            }
                            Expr::Missing
                        }
                    };
                    if !self.cx.eat(TokenKind::RBracket) && !self.lenient() {
                        return None;
                    }
                    expr = Expr::ArrayAccess {
                        array: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let tok = self.cx.bump();
                    expr = Expr::Unary {
                        op: SmolStr::new(self.cx.text(tok)),
                        operand: Box::new(expr),
                        postfix: true,
                    };
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Completion/selection on the member name of a `.`-access. On a hit the
    /// chain stops at the assist node; the replaced span is the member name
    /// for a bare `this` receiver and the receiver's own span otherwise.
    fn try_member_assist(
        &mut self,
        receiver: Expr,
        receiver_span: TextRange,
        name_tok: Token,
    ) -> Result<Expr, Expr> {
        let Some(state) = self.assist.as_ref() else {
            return Err(receiver);
        };
        let pending_cursor = state.pending_cursor();
        let pending_selection = state.pending_selection();

        if let Some(cursor) = pending_cursor {
            if name_tok.range.start <= cursor && cursor < name_tok.range.end {
                let partial =
                    completion_prefix(self.cx.source(), name_tok.range.start, cursor).to_owned();
                let node = format!("<CompleteOnMemberAccess:{}.{partial}>", expr_display(&receiver));
                let replaced = if matches!(receiver, Expr::This(_)) {
                    name_tok.range
                } else {
                    receiver_span
                };
                if let Some(state) = self.assist.as_mut() {
                    state.record(node, SmolStr::new(&partial), replaced);
                }
                return Ok(Expr::CompleteOnMemberAccess {
                    receiver: Box::new(receiver),
                    name: SmolStr::new(partial),
                });
            }
        }
        if let Some((sel_start, sel_end)) = pending_selection {
            if name_tok.range.start <= sel_start && sel_end < name_tok.range.end {
                let text = self.cx.text(name_tok);
                let node = format!("<SelectOnName:{text}>");
                if let Some(state) = self.assist.as_mut() {
                    state.record(node, SmolStr::new(text), name_tok.range);
                }
                return Ok(Expr::SelectOnName(Name::simple(text, name_tok.range)));
            }
        }
        Err(receiver)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.cx.kind() {
            TokenKind::Identifier => {
                let (name, hit) = structure::parse_dotted_name(self.cx, self.assist);
                match hit {
                    NameHit::Complete {
                        identifier,
                        replaced,
                    } => {
                        let node = format!("<CompleteOnName:{}>", name.dotted());
                        if let Some(state) = self.assist.as_mut() {
                            state.record(node, identifier, replaced);
                        }
                        Some(Expr::CompleteOnName(name))
                    }
                    NameHit::Select {
                        identifier,
                        replaced,
                    } => {
                        let node = format!("<SelectOnName:{}>", name.dotted());
                        if let Some(state) = self.assist.as_mut() {
                            state.record(node, identifier, replaced);
                        }
                        Some(Expr::SelectOnName(name))
                    }
                    NameHit::None => {
                        if self.cx.at(TokenKind::LParen) {
                            self.cx.bump();
                            let args = self.parse_arg_list();
                            let range = TextRange::new(name.range.start, self.cx.prev_end());
                            Some(name_call(name, args, range))
                        } else {
                            Some(Expr::Name(name))
                        }
                    }
                }
            }
            k if k.is_literal() => {
                let tok = self.cx.bump();
                Some(Expr::Literal(SmolStr::new(self.cx.text(tok))))
            }
            TokenKind::ThisKw => {
                let tok = self.cx.bump();
                if self.cx.at(TokenKind::LParen) {
                    self.cx.bump();
                    let args = self.parse_arg_list();
                    Some(Expr::MethodCall {
                        receiver: None,
                        name: SmolStr::new("this"),
                        args,
                        range: TextRange::new(tok.range.start, self.cx.prev_end()),
                    })
                } else {
                    Some(Expr::This(tok.range))
                }
            }
            TokenKind::SuperKw => {
                let tok = self.cx.bump();
                if self.cx.at(TokenKind::Dot) && self.cx.nth(1) == TokenKind::Identifier {
                    self.cx.bump();
                    let name_tok = self.cx.bump();
                    let probe = Expr::Name(Name::simple("super", tok.range));
                    if let Ok(assist_expr) = self.try_member_assist(probe, tok.range, name_tok) {
                        return Some(assist_expr);
                    }
                    let name = SmolStr::new(self.cx.text(name_tok));
                    if self.cx.at(TokenKind::LParen) {
                        self.cx.bump();
                        let args = self.parse_arg_list();
                        Some(Expr::SuperMethodCall {
                            name,
                            args,
                            range: TextRange::new(tok.range.start, self.cx.prev_end()),
                        })
                    } else {
                        Some(Expr::SuperFieldAccess {
                            name,
                            name_range: name_tok.range,
                        })
                    }
                } else if self.cx.at(TokenKind::LParen) {
                    self.cx.bump();
                    let args = self.parse_arg_list();
                    Some(Expr::MethodCall {
                        receiver: None,
                        name: SmolStr::new("super"),
                        args,
                        range: TextRange::new(tok.range.start, self.cx.prev_end()),
                    })
                } else {
                    Some(Expr::Name(Name::simple("super", tok.range)))
                }
            }
            TokenKind::NewKw => self.parse_alloc(),
            TokenKind::LParen => {
                self.cx.bump();
                let inner = match self.parse_expr() {
                    Some(inner) => inner,
                    None => {
                        if !self.lenient() {
                            return None;
                        }
                        Expr::Missing
                    }
                };
                if !self.cx.eat(TokenKind::RParen) && !self.lenient() {
                    return None;
                }
                Some(Expr::Paren(Box::new(inner)))
            }
            TokenKind::LBrace => self.parse_array_init(),
            k if k.is_primitive_type() || k == TokenKind::VoidKw => {
                // `int.class` and friends: the primitive reads as a name.
                let tok = self.cx.bump();
                Some(Expr::Name(Name::simple(self.cx.text(tok), tok.range)))
            }
            _ => None,
        }
    }

    fn parse_alloc(&mut self) -> Option<Expr> {
        let new_tok = self.cx.bump();
        let ty = match self.parse_type_ref(true, false) {
            Some(ty) => ty,
            None => {
                if !self.lenient() {
                    return None;
                }
                trace!("missing allocation type");
                return Some(Expr::Missing);
            }
        };
        if self.cx.at(TokenKind::LBracket) {
            let mut dim_exprs = Vec::new();
            let mut extra_dims = 0u8;
            while self.cx.at(TokenKind::LBracket) {
                if self.cx.nth(1) == TokenKind::RBracket {
                    self.cx.bump();
                    self.cx.bump();
                    extra_dims = extra_dims.saturating_add(1);
                    continue;
                }
                self.cx.bump();
                let dim = match self.parse_expr() {
                    Some(dim) => dim,
                    None => {
                        if !self.lenient() {
                            return None;
                        }
                        Expr::Missing
                    }
                };
                if !self.cx.eat(TokenKind::RBracket) && !self.lenient() {
                    return None;
                }
                dim_exprs.push(dim);
            }
            let init = if self.cx.at(TokenKind::LBrace) {
                self.parse_array_init().map(Box::new)
            } else {
                None
            };
            return Some(Expr::ArrayAlloc {
                ty,
                dim_exprs,
                extra_dims,
                init,
            });
        }
        let args = if self.cx.eat(TokenKind::LParen) {
            self.parse_arg_list()
        } else {
            if !self.lenient() && !self.cx.at(TokenKind::LBrace) {
                return None;
            }
            Vec::new()
        };
        let body = if self.cx.at(TokenKind::LBrace) {
            self.cx.bump();
            let mut decl =
                structure::parse_anonymous_body(self.cx, self.options, self.errors, self.assist);
            self.parse_decl_skipped_bodies(&mut decl);
            Some(Box::new(decl))
        } else {
            None
        };
        Some(Expr::Alloc {
            ty,
            args,
            body,
            range: TextRange::new(new_tok.range.start, self.cx.prev_end()),
        })
    }

    fn parse_array_init(&mut self) -> Option<Expr> {
        debug_assert!(self.cx.at(TokenKind::LBrace));
        self.cx.bump();
        let mut elements = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::RBrace => {
                    self.cx.bump();
                    break;
                }
                TokenKind::Eof => {
                    // The initializer still counts when unterminated.
                    self.error_here("unterminated array initializer");
                    break;
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                _ => {
                    let mark = self.cx.pos();
                    match self.parse_expr() {
                        Some(element) => elements.push(element),
                        None => {
                            if self.cx.pos() == mark {
                                self.cx.bump();
                            }
                        }
                    }
                }
            }
        }
        if elements.iter().any(expr_holds_assist) {
            if let Some(state) = self.assist.as_mut() {
                state.claim_array_initializer();
            }
        }
        Some(Expr::ArrayInit(elements))
    }

    /// Comma-separated arguments after a consumed `(`, through the `)`.
    fn parse_arg_list(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::RParen => {
                    self.cx.bump();
                    break;
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RBrace => {
                    self.error_here("unterminated argument list");
                    break;
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                _ => {
                    let mark = self.cx.pos();
                    match self.parse_expr() {
                        Some(arg) => args.push(arg),
                        None => {
                            if self.cx.pos() == mark {
                                self.cx.bump();
                            }
                        }
                    }
                }
            }
        }
        args
    }

    // ---- type references in expression position ------------------------

    fn parse_type_ref(&mut self, with_assist: bool, eat_dims: bool) -> Option<TypeRef> {
        let kind = self.cx.kind();
        if kind.is_primitive_type() || kind == TokenKind::VoidKw {
            let tok = self.cx.bump();
            let mut reference = TypeRef::primitive(self.cx.text(tok));
            if eat_dims {
                self.eat_array_dims(&mut reference);
            }
            return Some(reference);
        }
        if kind != TokenKind::Identifier {
            return None;
        }
        let mut no_assist = None;
        let (name, hit) = if with_assist {
            structure::parse_dotted_name(self.cx, self.assist)
        } else {
            structure::parse_dotted_name(self.cx, &mut no_assist)
        };
        let base = match hit {
            NameHit::Complete {
                identifier,
                replaced,
            } => {
                let node = format!("<CompleteOnType:{}>", name.dotted());
                if let Some(state) = self.assist.as_mut() {
                    state.record(node, identifier, replaced);
                }
                TypeRefBase::CompleteOn(name)
            }
            NameHit::Select {
                identifier,
                replaced,
            } => {
                let node = format!("<SelectOnType:{}>", name.dotted());
                if let Some(state) = self.assist.as_mut() {
                    state.record(node, identifier, replaced);
                }
                TypeRefBase::SelectOn(name)
            }
            NameHit::None => TypeRefBase::Named(name),
        };
        let mut reference = TypeRef {
            base,
            args: Vec::new(),
            dims: 0,
        };
        if !reference.is_assist() && self.cx.at(TokenKind::Lt) {
            reference.args = self.parse_generic_args()?;
        }
        if eat_dims {
            self.eat_array_dims(&mut reference);
        }
        Some(reference)
    }

    fn parse_generic_args(&mut self) -> Option<Vec<TypeRef>> {
        debug_assert!(self.cx.at(TokenKind::Lt));
        self.cx.bump();
        let mut args = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::Gt => {
                    self.cx.bump();
                    return Some(args);
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                TokenKind::Question => {
                    self.cx.bump();
                    let bound = if self.cx.eat(TokenKind::ExtendsKw) {
                        self.parse_type_ref(false, true)
                            .map(|t| (WildcardBound::Extends, t))
                    } else if self.cx.eat(TokenKind::SuperKw) {
                        self.parse_type_ref(false, true)
                            .map(|t| (WildcardBound::Super, t))
                    } else {
                        None
                    };
                    args.push(TypeRef {
                        base: TypeRefBase::Wildcard(bound.map(Box::new)),
                        args: Vec::new(),
                        dims: 0,
                    });
                }
                k if k == TokenKind::Identifier || k.is_primitive_type() => {
                    match self.parse_type_ref(false, true) {
                        Some(arg) => args.push(arg),
                        None => return None,
                    }
                }
                _ => return None,
            }
        }
    }

    fn eat_array_dims(&mut self, reference: &mut TypeRef) {
        while self.cx.at(TokenKind::LBracket) && self.cx.nth(1) == TokenKind::RBracket {
            self.cx.bump();
            self.cx.bump();
            reference.dims = reference.dims.saturating_add(1);
        }
    }
}

/// Build the call expression for a dotted name followed by `(`: the last
/// segment is the selector, any leading segments form the receiver.
fn name_call(name: Name, args: Vec<Expr>, range: TextRange) -> Expr {
    if name.segments.len() == 1 {
        let selector = name.segments.into_iter().next().expect("one segment");
        return Expr::MethodCall {
            receiver: None,
            name: selector,
            args,
            range,
        };
    }
    let mut segments = name.segments;
    let selector = segments.pop().expect("at least two segments");
    let receiver = Expr::Name(Name {
        segments,
        range: name.range,
    });
    Expr::MethodCall {
        receiver: Some(Box::new(receiver)),
        name: selector,
        args,
        range,
    }
}
