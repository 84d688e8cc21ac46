//! Resilient Java source-structure parsing.
//!
//! This crate provides three complementary ways to read Java source:
//! - [`Parser::diet_parse`]: a structural ("diet") parse that captures every
//!   declaration header but skips method/initializer bodies, recording their
//!   boundaries for lazy parsing;
//! - [`Parser::parse`]: a full parse that additionally parses all bodies
//!   eagerly when the unit is well formed;
//! - [`Parser::parse_methods`] / [`Parser::parse_method_body`]: on-demand
//!   body parsing for previously diet-parsed members.
//!
//! All entry points absorb malformed input through the recovery engine:
//! missing braces are synthesized, orphan members are attached to their most
//! plausible owner, unfinishable header fragments are dropped, and (when
//! [`ParserOptions::statements_recovery`] is set) unparseable statement
//! fragments are rebuilt around `$missing$` placeholders. A parse never
//! fails; the worst outcome for garbage input is an empty unit.
//!
//! Completion and selection parsing attach an assist cursor to the same
//! machinery; the user-facing API for those lives in the `quarry-assist`
//! crate.

pub mod ast;
mod assist;
mod lexer;
mod parser;
mod printer;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use assist::{AssistCapture, AssistMode};
pub use lexer::{lex, lex_with_errors, LexError, Lexer, Token, TokenKind};
pub use printer::{annotation_display, expr_display, type_ref_display};
pub use quarry_core::TextRange;

use ast::{BodyState, Initializer, Member, MethodDecl, MethodKind, SourceUnit, TypeDecl};

/// Java source level. Gates the `assert` (1.4) and `enum` (5) keywords; the
/// grammar is otherwise a fixed superset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceLevel {
    Jdk1_3,
    Jdk1_4,
    Jdk5,
}

impl Default for SourceLevel {
    fn default() -> Self {
        SourceLevel::Jdk5
    }
}

/// Parser configuration, passed at construction. There is no process-wide
/// state; independent parser instances never share anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    pub source_level: SourceLevel,
    /// Statement-level recovery: rebuild unparseable statement fragments
    /// around `$missing$` placeholders instead of truncating the body.
    pub statements_recovery: bool,
    /// Reconstruct method bodies (including local types, with synthesized
    /// constructors) even when the enclosing structure needed brace-counting
    /// recovery.
    pub methods_full_recovery: bool,
}

/// A non-fatal syntax diagnostic. Recovery keeps parsing past these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

/// The result of a parse: the unit is always produced.
#[derive(Debug, Clone)]
pub struct JavaParse {
    pub unit: SourceUnit,
    pub errors: Vec<ParseError>,
    /// Whether structural recovery fired anywhere in the unit.
    pub recovered: bool,
}

impl JavaParse {
    /// The canonical display form of the unit (see `printer`).
    pub fn display(&self) -> String {
        self.unit.to_display_string()
    }
}

/// Parse with default options, bodies included.
pub fn parse_java(source: &str) -> JavaParse {
    Parser::new(source, ParserOptions::default()).parse()
}

/// Structural parse with default options, bodies skipped.
pub fn parse_java_diet(source: &str) -> JavaParse {
    Parser::new(source, ParserOptions::default()).diet_parse()
}

/// A single-use-at-a-time parser over one source buffer.
///
/// The same instance may run a diet parse and then lazily parse member
/// bodies in any order; each body parse mutates only the member it is given.
/// Instances are independent; parallelize across units, not within one.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    options: ParserOptions,
    lex_errors: Vec<LexError>,
    assist: Option<assist::AssistState>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, options: ParserOptions) -> Self {
        let (all_tokens, lex_errors) = lex_with_errors(source, options.source_level);
        let tokens = all_tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Eof)
            .collect();
        Self {
            source,
            tokens,
            options,
            lex_errors,
            assist: None,
        }
    }

    /// A parser carrying a completion cursor or selection range. Wrap sites
    /// in the diet and body parsers will produce at most one assist node,
    /// retrievable with [`Parser::take_assist`] after parsing.
    pub fn with_assist(source: &'src str, options: ParserOptions, mode: AssistMode) -> Self {
        let mut parser = Self::new(source, options);
        parser.assist = Some(assist::AssistState::new(mode));
        parser
    }

    pub fn set_statements_recovery(&mut self, on: bool) {
        self.options.statements_recovery = on;
    }

    pub fn set_methods_full_recovery(&mut self, on: bool) {
        self.options.methods_full_recovery = on;
    }

    fn base_errors(&self) -> Vec<ParseError> {
        self.lex_errors
            .iter()
            .map(|e| ParseError {
                message: e.message.clone(),
                range: e.range,
            })
            .collect()
    }

    /// Structural parse: every declaration header, no statement content.
    pub fn diet_parse(&mut self) -> JavaParse {
        let mut errors = self.base_errors();
        let outcome = parser::structure::parse_unit(
            self.source,
            &self.tokens,
            &self.options,
            &mut errors,
            &mut self.assist,
        );
        JavaParse {
            unit: outcome.unit,
            errors,
            recovered: outcome.recovered,
        }
    }

    /// Full parse. On well-formed input this equals a diet parse followed by
    /// parsing every body; when structural recovery fired, the unit keeps
    /// the diet shape (bodies unparsed), which is the stable observable
    /// contract for broken input.
    pub fn parse(&mut self) -> JavaParse {
        let mut parse = self.diet_parse();
        if !parse.recovered || self.options.methods_full_recovery {
            for ty in &mut parse.unit.types {
                self.parse_methods_inner(ty, &mut parse.errors);
            }
        }
        parse
    }

    /// Parse the bodies of every member of `ty`, recursively through member
    /// types. Safe to call repeatedly; already-parsed bodies are left alone.
    pub fn parse_methods(&mut self, ty: &mut TypeDecl) {
        let mut errors = Vec::new();
        self.parse_methods_inner(ty, &mut errors);
    }

    fn parse_methods_inner(&mut self, ty: &mut TypeDecl, errors: &mut Vec<ParseError>) {
        for member in &mut ty.members {
            if let Member::Initializer(init) = member {
                self.parse_initializer_body_inner(init, errors);
            }
        }
        for method in &mut ty.methods {
            self.parse_method_body_inner(method, errors);
        }
        for member_type in &mut ty.member_types {
            self.parse_methods_inner(member_type, errors);
        }
    }

    /// Parse one method's body on demand.
    pub fn parse_method_body(&mut self, method: &mut MethodDecl) {
        let mut errors = Vec::new();
        self.parse_method_body_inner(method, &mut errors);
    }

    fn parse_method_body_inner(&mut self, method: &mut MethodDecl, errors: &mut Vec<ParseError>) {
        let BodyState::Skipped(skipped) = &method.body else {
            return;
        };
        let skipped = *skipped;
        let is_constructor = method.kind == MethodKind::Constructor;
        let outcome = parser::body::parse_body_range(
            self.source,
            &self.tokens,
            skipped,
            &self.options,
            errors,
            &mut self.assist,
            is_constructor,
            0,
        );
        if is_constructor {
            method.explicit_call = outcome
                .explicit_call
                .or_else(|| Some(ast::ExplicitCall::implicit_super()));
        }
        method.body = BodyState::Parsed(outcome.statements);
    }

    /// Parse one initializer block's body on demand.
    pub fn parse_initializer_body(&mut self, init: &mut Initializer) {
        let mut errors = Vec::new();
        self.parse_initializer_body_inner(init, &mut errors);
    }

    fn parse_initializer_body_inner(&mut self, init: &mut Initializer, errors: &mut Vec<ParseError>) {
        let BodyState::Skipped(skipped) = &init.body else {
            return;
        };
        let skipped = *skipped;
        let outcome = parser::body::parse_body_range(
            self.source,
            &self.tokens,
            skipped,
            &self.options,
            errors,
            &mut self.assist,
            false,
            0,
        );
        init.body = BodyState::Parsed(outcome.statements);
    }

    /// Parse the body containing `offset`, if any, leaving every other body
    /// unparsed. This is the "method completion"/selection entry: the body
    /// parse runs with the parser's assist state attached.
    ///
    /// Returns whether a body containing the offset was found.
    pub fn parse_body_at(&mut self, unit: &mut SourceUnit, offset: u32) -> bool {
        let mut errors = Vec::new();
        for ty in &mut unit.types {
            if self.parse_body_at_in_type(ty, offset, &mut errors) {
                return true;
            }
        }
        false
    }

    fn parse_body_at_in_type(
        &mut self,
        ty: &mut TypeDecl,
        offset: u32,
        errors: &mut Vec<ParseError>,
    ) -> bool {
        for member_type in &mut ty.member_types {
            if self.parse_body_at_in_type(member_type, offset, errors) {
                return true;
            }
        }
        for member in &mut ty.members {
            if let Member::Initializer(init) = member {
                if let BodyState::Skipped(skipped) = &init.body {
                    if skipped.range.touches(offset) {
                        self.parse_initializer_body_inner(init, errors);
                        return true;
                    }
                }
            }
        }
        for method in &mut ty.methods {
            if let BodyState::Skipped(skipped) = &method.body {
                if !method.is_synthesized && skipped.range.touches(offset) {
                    self.parse_method_body_inner(method, errors);
                    return true;
                }
            }
        }
        false
    }

    /// The assist node produced by the last completion/selection parse.
    pub fn take_assist(&mut self) -> Option<AssistCapture> {
        self.assist.take().and_then(assist::AssistState::finish)
    }
}
