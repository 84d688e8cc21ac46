//! Cursor-aware parsing: code completion and selection.
//!
//! [`CompletionParser`] runs the resilient parser from `quarry-syntax` with a
//! completion cursor attached and reports the assist node the cursor landed
//! on — its display form, its rendered parent context, the partial
//! identifier typed so far, and the exact source span a textual completion
//! insertion would replace. [`SelectionParser`] does the same for an
//! inclusive selection range, additionally naming the member enclosing the
//! selected reference.
//!
//! Neither parser ever fails on malformed input; "nothing to complete" is an
//! ordinary `None` outcome.

use smol_str::SmolStr;
use tracing::debug;

use quarry_core::TextRange;
use quarry_syntax::ast::{Member, SourceUnit, TypeDecl};
use quarry_syntax::{AssistCapture, AssistMode, ParseError, Parser, ParserOptions};

/// The assist node of one completion parse.
#[derive(Debug, Clone)]
pub struct AssistMatch {
    /// Display form of the node under the cursor (`<CompleteOnName:foo>`).
    pub node: String,
    /// Display form of the nearest enclosing context that claimed the node,
    /// such as a member-value pair or an annotation array initializer.
    pub parent: Option<String>,
    /// The identifier characters from token start through the cursor.
    pub completion_identifier: SmolStr,
    /// The exact source span a completion insertion would overwrite.
    pub replaced_range: TextRange,
}

impl From<AssistCapture> for AssistMatch {
    fn from(capture: AssistCapture) -> Self {
        Self {
            node: capture.node,
            parent: capture.parent,
            completion_identifier: capture.completion_identifier,
            replaced_range: capture.replaced_range,
        }
    }
}

/// The result of a completion parse: the structural unit is always produced,
/// the assist node only when the cursor landed on completable tokens.
#[derive(Debug, Clone)]
pub struct CompletionParse {
    pub unit: SourceUnit,
    pub errors: Vec<ParseError>,
    pub assist: Option<AssistMatch>,
}

/// Completion-mode parsing over one buffer at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionParser {
    options: ParserOptions,
}

impl CompletionParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Header-level completion: declarations are structured, bodies stay
    /// unparsed, and field initializers are dropped unless they hold the
    /// assist node. A cursor past every header yields no assist node.
    pub fn diet_parse(&self, source: &str, cursor: u32) -> CompletionParse {
        let mut parser =
            Parser::with_assist(source, self.options, AssistMode::Complete { cursor });
        let parse = parser.diet_parse();
        let assist = parser.take_assist().map(AssistMatch::from);
        debug!(cursor, found = assist.is_some(), "diet completion parse");
        CompletionParse {
            unit: parse.unit,
            errors: parse.errors,
            assist,
        }
    }

    /// Method-level completion: additionally parses the one body containing
    /// the cursor. Within that body, preceding local declarations are kept
    /// without initializers, the cursor statement becomes the assist
    /// statement, and trailing statements are dropped. Other bodies stay
    /// unparsed.
    pub fn method_parse(&self, source: &str, cursor: u32) -> CompletionParse {
        let mut parser =
            Parser::with_assist(source, self.options, AssistMode::Complete { cursor });
        let mut parse = parser.diet_parse();
        let in_body = parser.parse_body_at(&mut parse.unit, cursor);
        let assist = parser.take_assist().map(AssistMatch::from);
        debug!(cursor, in_body, found = assist.is_some(), "method completion parse");
        CompletionParse {
            unit: parse.unit,
            errors: parse.errors,
            assist,
        }
    }
}

/// The reference a selection landed on.
#[derive(Debug, Clone)]
pub struct SelectionMatch {
    /// Display form of the selected reference (`<SelectOnName:value>`).
    pub node: String,
    /// Name of the innermost field, method, or type enclosing the selection.
    pub enclosing_member: Option<SmolStr>,
    /// The span of the selected reference token.
    pub replaced_range: TextRange,
}

/// The result of a selection parse.
#[derive(Debug, Clone)]
pub struct SelectionParse {
    pub unit: SourceUnit,
    pub errors: Vec<ParseError>,
    pub selection: Option<SelectionMatch>,
}

/// Selection-mode parsing: wraps the innermost name or type reference
/// covering an inclusive `[start, end]` character range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionParser {
    options: ParserOptions,
}

impl SelectionParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn select(&self, source: &str, start: u32, end: u32) -> SelectionParse {
        let mut parser =
            Parser::with_assist(source, self.options, AssistMode::Select { start, end });
        let mut parse = parser.diet_parse();
        parser.parse_body_at(&mut parse.unit, start);
        let selection = parser.take_assist().map(|capture| SelectionMatch {
            enclosing_member: enclosing_member(&parse.unit, capture.replaced_range),
            node: capture.node,
            replaced_range: capture.replaced_range,
        });
        debug!(start, end, found = selection.is_some(), "selection parse");
        SelectionParse {
            unit: parse.unit,
            errors: parse.errors,
            selection,
        }
    }
}

/// The name of the innermost member whose span contains `range`: a field or
/// method when one covers it, otherwise the narrowest enclosing type.
fn enclosing_member(unit: &SourceUnit, range: TextRange) -> Option<SmolStr> {
    fn in_type(ty: &TypeDecl, range: TextRange) -> Option<SmolStr> {
        if !ty.range.contains_range(range) {
            return None;
        }
        for member_type in &ty.member_types {
            if let Some(found) = in_type(member_type, range) {
                return Some(found);
            }
        }
        for member in &ty.members {
            if let Member::Field(field) = member {
                if field.range.contains_range(range) {
                    return Some(field.name.clone());
                }
            }
        }
        for method in &ty.methods {
            if !method.is_synthesized && method.range.contains_range(range) {
                return Some(method.name.clone());
            }
        }
        Some(ty.name.clone())
    }
    unit.types.iter().find_map(|ty| in_type(ty, range))
}
