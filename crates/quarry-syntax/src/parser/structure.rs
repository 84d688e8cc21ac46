//! The structural ("diet") pass.
//!
//! One token-driven loop over the unit, with open type declarations held on
//! an explicit [`TypeFrame`] stack: nesting depth never consumes native call
//! stack. Member and type headers are classified speculatively (mark,
//! look, reset), which makes the recovery checkpoint exactly one candidate
//! header wide. Method and initializer bodies are not parsed here; they are
//! scanned for balance, promotion triggers, and local types, and their token
//! boundaries recorded for the lazy body parser.

use smol_str::SmolStr;
use tracing::trace;

use quarry_core::TextRange;

use crate::assist::AssistState;
use crate::ast::*;
use crate::lexer::TokenKind;
use crate::parser::recovery::{
    self, finalize_type, TypeFrame, MAX_RECOVERED_TYPE_DEPTH,
};
use crate::parser::{body, Cursor};
use crate::printer::{expr_display, expr_holds_assist};
use crate::{ParseError, ParserOptions, Token};

pub(crate) struct StructureOutcome {
    pub(crate) unit: SourceUnit,
    pub(crate) recovered: bool,
}

pub(crate) fn parse_unit(
    source: &str,
    tokens: &[Token],
    options: &ParserOptions,
    errors: &mut Vec<ParseError>,
    assist: &mut Option<AssistState>,
) -> StructureOutcome {
    let mut cx = Cursor::new(source, tokens);
    let mut parser = StructureParser {
        cx: &mut cx,
        options,
        errors,
        assist,
        frames: Vec::new(),
        recovered: false,
        finalize_parsed: false,
        type_ref_truncated: false,
        generic_depth: 0,
    };
    let unit = parser.run_unit();
    let recovered = parser.recovered;
    StructureOutcome { unit, recovered }
}

/// Parse one local type declaration at the cursor (positioned at its
/// `class`/`interface`/`enum` keyword), on behalf of the body parser's
/// statement-recovery reconstruction. Synthesized members come out in
/// parsed-body shape.
pub(crate) fn parse_local_type(
    cx: &mut Cursor<'_>,
    options: &ParserOptions,
    errors: &mut Vec<ParseError>,
    assist: &mut Option<AssistState>,
    modifiers: Modifiers,
    annotations: Vec<Annotation>,
) -> Option<TypeDecl> {
    let mut parser = StructureParser {
        cx,
        options,
        errors,
        assist,
        frames: Vec::new(),
        recovered: false,
        finalize_parsed: true,
        type_ref_truncated: false,
        generic_depth: 0,
    };
    parser.parse_one_type(modifiers, annotations)
}

/// Parse the member list of an anonymous class body on behalf of the body
/// parser's allocation expressions. The cursor sits just past the opening
/// `{`; the returned declaration is nameless and receives no synthesized
/// members.
pub(crate) fn parse_anonymous_body(
    cx: &mut Cursor<'_>,
    options: &ParserOptions,
    errors: &mut Vec<ParseError>,
    assist: &mut Option<AssistState>,
) -> TypeDecl {
    let start = cx.current().range.start;
    let mut parser = StructureParser {
        cx,
        options,
        errors,
        assist,
        frames: Vec::new(),
        recovered: false,
        finalize_parsed: true,
        type_ref_truncated: false,
        generic_depth: 0,
    };
    let decl = TypeDecl::new(TypeKind::Class, SmolStr::default(), TextRange::empty(start));
    parser.frames.push(TypeFrame::new_anonymous(decl));
    loop {
        if parser.cx.at_end() {
            parser.recovered = true;
            let mut result = None;
            while !parser.frames.is_empty() {
                result = parser.close_top_frame();
            }
            return result.expect("anonymous frame closes to a declaration");
        }
        if let Some(decl) = parser.member_position() {
            return decl;
        }
    }
}

/// Result of a name-parse against the assist cursor.
pub(crate) enum NameHit {
    None,
    Complete { identifier: SmolStr, replaced: TextRange },
    Select { identifier: SmolStr, replaced: TextRange },
}

/// Parse a dotted name, stopping early at the segment that owns the assist
/// cursor (the segment text is truncated just past the cursor) or the
/// selection end.
pub(crate) fn parse_dotted_name(
    cx: &mut Cursor<'_>,
    assist: &mut Option<AssistState>,
) -> (Name, NameHit) {
    debug_assert!(cx.at(TokenKind::Identifier));
    let first = cx.bump();
    let start = first.range.start;
    let mut segments = vec![SmolStr::new(cx.text(first))];
    let mut last = first;

    if let Some(hit) = name_segment_hit(cx, assist, first, start, &mut segments) {
        let name = Name {
            segments,
            range: TextRange::new(start, first.range.end),
        };
        return (name, hit);
    }

    let mut hit = NameHit::None;
    while cx.at(TokenKind::Dot) && cx.nth(1) == TokenKind::Identifier {
        cx.bump();
        let tok = cx.bump();
        segments.push(SmolStr::new(cx.text(tok)));
        last = tok;
        if let Some(h) = name_segment_hit(cx, assist, tok, start, &mut segments) {
            hit = h;
            break;
        }
    }
    let name = Name {
        segments,
        range: TextRange::new(start, last.range.end),
    };
    (name, hit)
}

fn name_segment_hit(
    cx: &Cursor<'_>,
    assist: &mut Option<AssistState>,
    tok: Token,
    name_start: u32,
    segments: &mut [SmolStr],
) -> Option<NameHit> {
    let state = assist.as_mut()?;
    if let Some(cursor) = state.pending_cursor() {
        if tok.range.start <= cursor && cursor < tok.range.end {
            let truncated = crate::assist::completion_prefix(cx.source(), tok.range.start, cursor);
            if let Some(last) = segments.last_mut() {
                *last = SmolStr::new(truncated);
            }
            return Some(NameHit::Complete {
                identifier: SmolStr::new(truncated),
                replaced: TextRange::new(name_start, tok.range.end),
            });
        }
    }
    if let Some((sel_start, sel_end)) = state.pending_selection() {
        if sel_start >= name_start && tok.range.start <= sel_end && sel_end < tok.range.end {
            return Some(NameHit::Select {
                identifier: SmolStr::new(cx.text(tok)),
                replaced: tok.range,
            });
        }
    }
    None
}

enum ScanCtx {
    Block,
    /// A local/anonymous type body (or another brace region opened after
    /// `new`): promotion triggers are suppressed inside.
    TypeBody,
}

enum BodyExit {
    Closed,
    Promoted,
    Eof,
}

struct StructureParser<'a, 'src> {
    cx: &'a mut Cursor<'src>,
    options: &'a ParserOptions,
    errors: &'a mut Vec<ParseError>,
    assist: &'a mut Option<AssistState>,
    frames: Vec<TypeFrame>,
    recovered: bool,
    /// Synthesized members of closing types come out in parsed-body shape
    /// (used when reconstructing local types during statement recovery).
    finalize_parsed: bool,
    /// Set when the last type reference lost part of itself to recovery
    /// (unterminated generic argument list).
    type_ref_truncated: bool,
    generic_depth: u32,
}

impl<'a, 'src> StructureParser<'a, 'src> {
    fn run_unit(&mut self) -> SourceUnit {
        let mut unit = SourceUnit::default();
        self.parse_package(&mut unit);
        self.parse_imports(&mut unit);
        loop {
            if self.cx.at_end() {
                if !self.frames.is_empty() {
                    self.recovered = true;
                    trace!(open_frames = self.frames.len(), "closing open frames at eof");
                }
                while !self.frames.is_empty() {
                    if let Some(decl) = self.close_top_frame() {
                        unit.types.push(decl);
                    }
                }
                break;
            }
            if self.frames.is_empty() {
                self.top_level_position(&mut unit);
            } else if let Some(decl) = self.member_position() {
                unit.types.push(decl);
            }
        }
        unit
    }

    fn parse_one_type(
        &mut self,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
    ) -> Option<TypeDecl> {
        if !self.open_type(modifiers, annotations) {
            return None;
        }
        if self.frames.is_empty() {
            // Depth cap dropped the header.
            return None;
        }
        loop {
            if self.cx.at_end() {
                self.recovered = true;
                let mut result = None;
                while !self.frames.is_empty() {
                    result = self.close_top_frame();
                }
                return result;
            }
            if let Some(decl) = self.member_position() {
                return Some(decl);
            }
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.cx.current().range;
        self.errors.push(ParseError {
            message: message.into(),
            range,
        });
    }

    fn parse_package(&mut self, unit: &mut SourceUnit) {
        if !self.cx.at(TokenKind::PackageKw) {
            return;
        }
        self.cx.bump();
        if self.cx.at(TokenKind::Identifier) {
            unit.package = Some(parse_plain_name(self.cx));
        } else {
            self.error_here("expected package name");
        }
        if !self.cx.eat(TokenKind::Semicolon) {
            self.error_here("expected `;` after package declaration");
        }
    }

    fn parse_imports(&mut self, unit: &mut SourceUnit) {
        while self.cx.at(TokenKind::ImportKw) {
            let start = self.cx.current().range.start;
            self.cx.bump();
            let is_static = self.cx.eat(TokenKind::StaticKw);
            if !self.cx.at(TokenKind::Identifier) {
                self.error_here("expected import name");
                self.cx.eat(TokenKind::Semicolon);
                continue;
            }
            let name = parse_plain_name(self.cx);
            let mut on_demand = false;
            if self.cx.at(TokenKind::Dot) && self.cx.nth(1) == TokenKind::Star {
                self.cx.bump();
                self.cx.bump();
                on_demand = true;
            }
            if !self.cx.eat(TokenKind::Semicolon) {
                self.error_here("expected `;` after import declaration");
            }
            unit.imports.push(ImportDecl {
                name,
                is_static,
                on_demand,
                range: TextRange::new(start, self.cx.prev_end()),
            });
        }
    }

    fn top_level_position(&mut self, unit: &mut SourceUnit) {
        if self.cx.eat(TokenKind::Semicolon) {
            return;
        }
        let mark = self.cx.pos();
        let (modifiers, annotations) = self.parse_modifiers_annotations();
        if self.at_type_keyword() {
            self.open_type(modifiers, annotations);
            return;
        }
        // An orphan fragment with no plausible owner at the top of the file
        // contributes nothing to the unit.
        self.recovered = true;
        self.error_here("expected type declaration");
        if self.cx.pos() == mark {
            self.cx.bump();
        }
        while !matches!(
            self.cx.kind(),
            TokenKind::Eof | TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw
        ) && !self.cx.kind().is_modifier_keyword()
            && !self.cx.at(TokenKind::At)
        {
            self.cx.bump();
        }
    }

    fn at_type_keyword(&self) -> bool {
        match self.cx.kind() {
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
            TokenKind::At => self.cx.nth(1) == TokenKind::InterfaceKw,
            _ => false,
        }
    }

    /// Handle one token run at member level of the innermost open type.
    /// Returns a finished declaration when the closed frame had no parent.
    fn member_position(&mut self) -> Option<TypeDecl> {
        match self.cx.kind() {
            TokenKind::RBrace => {
                if self.frames.iter().any(|f| f.has_open_brace) {
                    // Headers that never opened a brace close first; the `}`
                    // belongs to the nearest frame that did.
                    while !self
                        .frames
                        .last()
                        .map(|f| f.has_open_brace)
                        .unwrap_or(true)
                    {
                        self.recovered = true;
                        let merged = self.close_top_frame();
                        debug_assert!(merged.is_none(), "braceless frame closed without parent");
                    }
                    self.cx.bump();
                    return self.close_top_frame();
                }
                // A `}` with no open brace anywhere is noise.
                self.error_here("unmatched `}`");
                self.recovered = true;
                self.cx.bump();
            }
            TokenKind::Semicolon => {
                self.cx.bump();
            }
            _ => {
                let in_constants = self
                    .frames
                    .last()
                    .map(|f| f.in_constant_section)
                    .unwrap_or(false);
                if in_constants {
                    self.enum_constant_position();
                } else {
                    self.parse_member();
                }
            }
        }
        None
    }

    fn close_top_frame(&mut self) -> Option<TypeDecl> {
        let frame = self.frames.pop().expect("frame stack underflow");
        let mut decl = frame.decl;
        decl.range.end = self.cx.prev_end();
        if !frame.anonymous {
            finalize_type(&mut decl, self.finalize_parsed);
        }
        match self.frames.last_mut() {
            Some(parent) => {
                parent.decl.member_types.push(decl);
                None
            }
            None => Some(decl),
        }
    }

    fn parse_modifiers_annotations(&mut self) -> (Modifiers, Vec<Annotation>) {
        let mut modifiers = Modifiers::empty();
        let mut annotations = Vec::new();
        loop {
            let kind = self.cx.kind();
            if let Some(bit) = modifier_bit(kind) {
                modifiers.insert(bit);
                self.cx.bump();
                continue;
            }
            if kind == TokenKind::At && self.cx.nth(1) == TokenKind::Identifier {
                if let Some(anno) = self.parse_annotation() {
                    annotations.push(anno);
                }
                continue;
            }
            break;
        }
        (modifiers, annotations)
    }

    fn parse_annotation(&mut self) -> Option<Annotation> {
        let at_tok = self.cx.bump();
        debug_assert_eq!(at_tok.kind, TokenKind::At);
        let (name, hit) = parse_dotted_name(self.cx, self.assist);
        match hit {
            NameHit::Complete {
                identifier,
                replaced,
            } => {
                let node = format!("@<CompleteOnType:{}>", name.dotted());
                if let Some(state) = self.assist.as_mut() {
                    state.record(node, identifier, replaced);
                }
                // The rest of the annotation no longer matters; balance any
                // argument list away.
                self.skip_balanced_parens();
                return Some(Annotation {
                    name,
                    assist_name: true,
                    args: AnnotationArgs::None,
                    range: TextRange::new(at_tok.range.start, self.cx.prev_end()),
                });
            }
            NameHit::Select { .. } | NameHit::None => {}
        }

        let mut args = AnnotationArgs::None;
        if self.cx.eat(TokenKind::LParen) {
            if self.cx.at(TokenKind::Identifier) && self.cx.nth(1) == TokenKind::Eq {
                let mut pairs = Vec::new();
                loop {
                    if !self.cx.at(TokenKind::Identifier) {
                        break;
                    }
                    let name_tok = self.cx.bump();
                    let member = SmolStr::new(self.cx.text(name_tok));
                    self.cx.eat(TokenKind::Eq);
                    let value = self.parse_annotation_value(&name.dotted(), &member);
                    pairs.push(MemberValuePair {
                        name: member,
                        value,
                    });
                    if !self.cx.eat(TokenKind::Comma) {
                        break;
                    }
                }
                args = AnnotationArgs::Pairs(pairs);
            } else if !self.cx.at(TokenKind::RParen) {
                let value = self.parse_annotation_value(&name.dotted(), "value");
                args = AnnotationArgs::Single(Box::new(value));
            }
            if !self.cx.eat(TokenKind::RParen) {
                self.error_here("unterminated annotation");
                self.recovered = true;
            }
        }
        Some(Annotation {
            name,
            assist_name: false,
            args,
            range: TextRange::new(at_tok.range.start, self.cx.prev_end()),
        })
    }

    fn parse_annotation_value(&mut self, annotation_name: &str, member: &str) -> Expr {
        let value = body::parse_embedded_expr(self.cx, self.options, self.errors, self.assist)
            .unwrap_or(Expr::Missing);
        // Only a capture inside this value may claim the member-value pair as
        // its parent; stale captures from earlier constructs keep theirs.
        if expr_holds_assist(&value) {
            if let Some(state) = self.assist.as_mut() {
                if state.is_complete_mode() {
                    state.resolve_annotation_value(annotation_name, member, || expr_display(&value));
                }
            }
        }
        value
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

    /// Parse a type header at its keyword and push its frame. Returns false
    /// when the cursor was not at a type keyword.
    fn open_type(&mut self, modifiers: Modifiers, annotations: Vec<Annotation>) -> bool {
        let kind = match self.cx.kind() {
            TokenKind::ClassKw => TypeKind::Class,
            TokenKind::InterfaceKw => TypeKind::Interface,
            TokenKind::EnumKw => TypeKind::Enum,
            TokenKind::At if self.cx.nth(1) == TokenKind::InterfaceKw => {
                self.cx.bump();
                TypeKind::Annotation
            }
            _ => return false,
        };
        self.cx.bump();

        if self.frames.len() >= MAX_RECOVERED_TYPE_DEPTH {
            // Past the cap, recovered headers are dropped wholesale.
            trace!(depth = self.frames.len(), "type nesting cap reached, dropping header");
            self.recovered = true;
            self.error_here("type nesting too deep");
            if self.cx.at(TokenKind::Identifier) {
                self.cx.bump();
            }
            self.cx.eat(TokenKind::LBrace);
            return true;
        }

        let (name, name_range) = if self.cx.at(TokenKind::Identifier) {
            let tok = self.cx.bump();
            (SmolStr::new(self.cx.text(tok)), tok.range)
        } else {
            self.error_here("expected type name");
            self.recovered = true;
            (SmolStr::default(), TextRange::empty(self.cx.current().range.start))
        };

        let mut decl = TypeDecl::new(kind, name, name_range);
        decl.modifiers = modifiers;
        decl.annotations = annotations;
        decl.range.start = name_range.start;

        if self.cx.at(TokenKind::Lt) {
            decl.type_params = self.parse_type_params();
        }

        if self.cx.eat(TokenKind::ExtendsKw) {
            if self.at_type_ref_start() {
                if kind == TypeKind::Interface {
                    loop {
                        if let Some(reference) = self.parse_type_ref() {
                            decl.superinterfaces.push(reference);
                        }
                        if !self.cx.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                } else if let Some(superclass) = self.parse_type_ref() {
                    decl.superclass = Some(superclass);
                }
            } else {
                // Missing superclass: the whole clause is dropped.
                trace!("dropping `extends` clause with missing reference");
                self.recovered = true;
            }
        }
        if self.cx.eat(TokenKind::ImplementsKw) {
            if self.at_type_ref_start() {
                loop {
                    if let Some(reference) = self.parse_type_ref() {
                        decl.superinterfaces.push(reference);
                    }
                    if !self.cx.eat(TokenKind::Comma) {
                        break;
                    }
                }
            } else {
                trace!("dropping `implements` clause with missing reference");
                self.recovered = true;
            }
        }

        // Extra trailing identifiers after a valid header are dropped
        // silently.
        while matches!(
            self.cx.kind(),
            TokenKind::Identifier | TokenKind::Dot | TokenKind::Comma
        ) {
            self.cx.bump();
            self.recovered = true;
        }

        let has_brace = self.cx.eat(TokenKind::LBrace);
        if !has_brace {
            self.recovered = true;
        }
        self.frames.push(TypeFrame::new(decl, has_brace));
        true
    }

    fn at_type_ref_start(&self) -> bool {
        self.cx.kind() == TokenKind::Identifier || self.cx.kind().is_primitive_type()
    }

    fn parse_type_params(&mut self) -> Vec<TypeParam> {
        debug_assert!(self.cx.at(TokenKind::Lt));
        self.cx.bump();
        let mut params = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::Identifier => {
                    let tok = self.cx.bump();
                    let name = SmolStr::new(self.cx.text(tok));
                    let mut bounds = Vec::new();
                    let mut drop_param = false;
                    if self.cx.eat(TokenKind::ExtendsKw) {
                        loop {
                            if self.at_type_ref_start() {
                                self.type_ref_truncated = false;
                                let bound = self.parse_type_ref();
                                if self.type_ref_truncated {
                                    // A parameter whose bound is itself
                                    // unterminated is dropped whole.
                                    drop_param = true;
                                    self.recovered = true;
                                } else if let Some(bound) = bound {
                                    bounds.push(bound);
                                }
                            } else {
                                // `<A extends` with nothing usable: keep the
                                // parameter, lose the bound.
                                self.recovered = true;
                            }
                            if !self.cx.eat(TokenKind::Amp) {
                                break;
                            }
                        }
                    }
                    if !drop_param {
                        params.push(TypeParam { name, bounds });
                    }
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                TokenKind::Gt => {
                    self.cx.bump();
                    break;
                }
                _ => {
                    // Unterminated parameter list.
                    self.recovered = true;
                    break;
                }
            }
        }
        params
    }

    fn parse_type_ref(&mut self) -> Option<TypeRef> {
        let kind = self.cx.kind();
        if kind.is_primitive_type() || kind == TokenKind::VoidKw {
            let tok = self.cx.bump();
            let mut reference = TypeRef::primitive(self.cx.text(tok));
            self.parse_array_dims(&mut reference);
            return Some(reference);
        }
        if kind != TokenKind::Identifier {
            return None;
        }
        let (name, hit) = parse_dotted_name(self.cx, self.assist);
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
            reference.args = self.parse_generic_args();
        }
        self.parse_array_dims(&mut reference);
        Some(reference)
    }

    fn parse_array_dims(&mut self, reference: &mut TypeRef) {
        while self.cx.at(TokenKind::LBracket) && self.cx.nth(1) == TokenKind::RBracket {
            self.cx.bump();
            self.cx.bump();
            reference.dims = reference.dims.saturating_add(1);
        }
    }

    fn parse_generic_args(&mut self) -> Vec<TypeRef> {
        debug_assert!(self.cx.at(TokenKind::Lt));
        self.cx.bump();
        self.generic_depth += 1;
        if self.generic_depth > 32 {
            // Pathologically nested arguments: skim to balance and report
            // the reference as truncated.
            let mut depth = 1u32;
            while depth > 0 {
                match self.cx.kind() {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Eof
                    | TokenKind::LBrace
                    | TokenKind::RBrace
                    | TokenKind::Semicolon => break,
                    _ => {}
                }
                self.cx.bump();
            }
            self.generic_depth -= 1;
            self.type_ref_truncated = true;
            return Vec::new();
        }
        let mut args = Vec::new();
        loop {
            match self.cx.kind() {
                TokenKind::Gt => {
                    self.cx.bump();
                    break;
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                TokenKind::Question => {
                    self.cx.bump();
                    let bound = if self.cx.at(TokenKind::ExtendsKw) {
                        self.cx.bump();
                        self.parse_type_ref().map(|t| (WildcardBound::Extends, t))
                    } else if self.cx.at(TokenKind::SuperKw) {
                        self.cx.bump();
                        self.parse_type_ref().map(|t| (WildcardBound::Super, t))
                    } else {
                        None
                    };
                    args.push(TypeRef {
                        base: TypeRefBase::Wildcard(bound.map(Box::new)),
                        args: Vec::new(),
                        dims: 0,
                    });
                }
                kind if kind == TokenKind::Identifier || kind.is_primitive_type() => {
                    if let Some(arg) = self.parse_type_ref() {
                        args.push(arg);
                    }
                }
                _ => {
                    // Unterminated argument list.
                    self.type_ref_truncated = true;
                    self.recovered = true;
                    break;
                }
            }
        }
        self.generic_depth -= 1;
        args
    }

    fn enum_constant_position(&mut self) {
        match self.cx.kind() {
            TokenKind::Identifier => {
                let looks_like_constant = matches!(
                    self.cx.nth(1),
                    TokenKind::Comma
                        | TokenKind::Semicolon
                        | TokenKind::RBrace
                        | TokenKind::LParen
                        | TokenKind::LBrace
                        | TokenKind::Eof
                );
                if !looks_like_constant {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.in_constant_section = false;
                    }
                    return;
                }
                let tok = self.cx.bump();
                let name = SmolStr::new(self.cx.text(tok));
                let mut args = Vec::new();
                if self.cx.eat(TokenKind::LParen) {
                    while !matches!(
                        self.cx.kind(),
                        TokenKind::RParen | TokenKind::Eof | TokenKind::RBrace
                    ) {
                        match body::parse_embedded_expr(
                            self.cx,
                            self.options,
                            self.errors,
                            self.assist,
                        ) {
                            Some(arg) => args.push(arg),
                            None => {
                                self.cx.bump();
                            }
                        }
                        if !self.cx.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    if !self.cx.eat(TokenKind::RParen) {
                        self.error_here("unterminated enum constant arguments");
                        self.recovered = true;
                    }
                }
                if self.cx.at(TokenKind::LBrace) {
                    // Constant class bodies are balanced over but not
                    // modeled.
                    self.skip_balanced_braces();
                }
                if let Some(frame) = self.frames.last_mut() {
                    frame.decl.members.push(Member::EnumConstant(EnumConstant {
                        name,
                        name_range: tok.range,
                        args,
                    }));
                }
                if self.cx.eat(TokenKind::Semicolon) {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.in_constant_section = false;
                    }
                } else {
                    self.cx.eat(TokenKind::Comma);
                }
            }
            TokenKind::Semicolon => {
                self.cx.bump();
                if let Some(frame) = self.frames.last_mut() {
                    frame.in_constant_section = false;
                }
            }
            _ => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.in_constant_section = false;
                }
            }
        }
    }

    fn skip_balanced_braces(&mut self) {
        debug_assert!(self.cx.at(TokenKind::LBrace));
        let mut depth = 0u32;
        loop {
            match self.cx.kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    self.cx.bump();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                    continue;
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.cx.bump();
        }
    }

    fn parse_member(&mut self) {
        let (type_name, in_annotation_type) = {
            let frame = self.frames.last().expect("member parse without frame");
            (frame.decl.name.clone(), frame.decl.kind == TypeKind::Annotation)
        };
        let start = self.cx.current().range.start;
        let (modifiers, annotations) = self.parse_modifiers_annotations();

        match self.cx.kind() {
            TokenKind::LBrace => {
                self.cx.bump();
                let body = self.scan_skipped_body();
                let init = Initializer {
                    is_static: modifiers.contains(Modifiers::STATIC),
                    body: BodyState::Skipped(body),
                    range: TextRange::new(start, self.cx.prev_end()),
                };
                if let Some(frame) = self.frames.last_mut() {
                    frame.decl.members.push(Member::Initializer(init));
                }
                return;
            }
            TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => {
                self.open_type(modifiers, annotations);
                return;
            }
            TokenKind::At if self.cx.nth(1) == TokenKind::InterfaceKw => {
                self.open_type(modifiers, annotations);
                return;
            }
            TokenKind::Semicolon => {
                self.cx.bump();
                return;
            }
            TokenKind::RBrace | TokenKind::Eof => {
                if !modifiers.is_empty() || !annotations.is_empty() {
                    self.error_here("dangling modifiers");
                    self.recovered = true;
                }
                return;
            }
            _ => {}
        }

        let type_params = if self.cx.at(TokenKind::Lt) {
            self.parse_type_params()
        } else {
            Vec::new()
        };

        // Constructor: the type's own name followed directly by `(`.
        if self.cx.at(TokenKind::Identifier)
            && self.cx.nth(1) == TokenKind::LParen
            && self.cx.text(self.cx.current()) == type_name.as_str()
        {
            let name_tok = self.cx.bump();
            let mut method = MethodDecl::new(
                MethodKind::Constructor,
                SmolStr::new(self.cx.text(name_tok)),
                name_tok.range,
            );
            method.modifiers = modifiers;
            method.annotations = annotations;
            method.type_params = type_params;
            method.range.start = start;
            self.finish_method(method, false);
            return;
        }

        self.type_ref_truncated = false;
        let Some(member_type) = self.parse_type_ref() else {
            self.error_here("expected member declaration");
            self.recovered = true;
            self.skip_member_junk();
            return;
        };

        if self.cx.at(TokenKind::Identifier) {
            let name_tok = self.cx.bump();
            let name = SmolStr::new(self.cx.text(name_tok));
            if self.cx.at(TokenKind::LParen) {
                let kind = if in_annotation_type {
                    MethodKind::AnnotationMember
                } else {
                    MethodKind::Method
                };
                let mut method = MethodDecl::new(kind, name, name_tok.range);
                method.modifiers = modifiers;
                method.annotations = annotations;
                method.type_params = type_params;
                method.return_type = Some(member_type);
                method.range.start = start;
                self.finish_method(method, in_annotation_type);
                return;
            }
            self.parse_field_declarators(modifiers, annotations, member_type, name_tok, start);
            return;
        }

        self.error_here("expected member name");
        self.recovered = true;
        self.skip_member_junk();
    }

    fn finish_method(&mut self, mut method: MethodDecl, allow_default: bool) {
        self.parse_params(&mut method.params);
        if self.cx.eat(TokenKind::ThrowsKw) {
            if self.at_type_ref_start() {
                loop {
                    if let Some(thrown) = self.parse_type_ref() {
                        method.throws.push(thrown);
                    }
                    if !self.cx.eat(TokenKind::Comma) {
                        break;
                    }
                }
            } else {
                // Missing thrown-exception reference: clause dropped.
                self.recovered = true;
            }
        }
        if allow_default && self.cx.eat(TokenKind::DefaultKw) {
            method.default_value =
                body::parse_embedded_expr(self.cx, self.options, self.errors, self.assist);
        }
        match self.cx.kind() {
            TokenKind::LBrace => {
                self.cx.bump();
                method.body = BodyState::Skipped(self.scan_skipped_body());
            }
            TokenKind::Semicolon => {
                self.cx.bump();
                method.body = BodyState::None;
            }
            _ => {
                // A signature with neither body nor `;`: keep it as an
                // empty-bodied method.
                self.error_here("expected method body");
                self.recovered = true;
                method.body = BodyState::empty_skipped();
            }
        }
        method.range.end = self.cx.prev_end();
        if let Some(frame) = self.frames.last_mut() {
            frame.decl.methods.push(method);
        }
    }

    fn parse_params(&mut self, params: &mut Vec<Param>) {
        if !self.cx.eat(TokenKind::LParen) {
            self.recovered = true;
            return;
        }
        loop {
            match self.cx.kind() {
                TokenKind::RParen => {
                    self.cx.bump();
                    return;
                }
                TokenKind::Eof
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Semicolon => {
                    self.error_here("unterminated parameter list");
                    self.recovered = true;
                    return;
                }
                TokenKind::Comma => {
                    self.cx.bump();
                }
                _ => {
                    let (modifiers, annotations) = self.parse_modifiers_annotations();
                    let Some(mut ty) = self.parse_type_ref() else {
                        self.cx.bump();
                        continue;
                    };
                    let varargs = self.cx.eat(TokenKind::Ellipsis);
                    let name = if self.cx.at(TokenKind::Identifier) {
                        let tok = self.cx.bump();
                        SmolStr::new(self.cx.text(tok))
                    } else {
                        SmolStr::default()
                    };
                    self.parse_array_dims(&mut ty);
                    params.push(Param {
                        modifiers,
                        annotations,
                        ty,
                        name,
                        varargs,
                    });
                }
            }
        }
    }

    fn parse_field_declarators(
        &mut self,
        modifiers: Modifiers,
        annotations: Vec<Annotation>,
        base_type: TypeRef,
        first_name: Token,
        start: u32,
    ) {
        let mut name_tok = first_name;
        loop {
            let mut ty = base_type.clone();
            while self.cx.at(TokenKind::LBracket) && self.cx.nth(1) == TokenKind::RBracket {
                self.cx.bump();
                self.cx.bump();
                ty.dims = ty.dims.saturating_add(1);
            }
            let mut initializer = None;
            if self.cx.eat(TokenKind::Eq) {
                initializer =
                    body::parse_embedded_expr(self.cx, self.options, self.errors, self.assist);
                if initializer.is_none()
                    || !matches!(
                        self.cx.kind(),
                        TokenKind::Comma | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                    )
                {
                    // The initializer did not parse cleanly: drop it unless
                    // it holds the assist node, and resynchronize at the
                    // declarator boundary either way.
                    if !initializer.as_ref().is_some_and(expr_holds_assist) {
                        initializer = None;
                        self.recovered = true;
                    }
                    while !matches!(
                        self.cx.kind(),
                        TokenKind::Comma
                            | TokenKind::Semicolon
                            | TokenKind::RBrace
                            | TokenKind::LBrace
                            | TokenKind::Eof
                    ) {
                        self.cx.bump();
                    }
                }
            }
            // The completion-diet view keeps an initializer only when it
            // holds the assist node.
            if let Some(state) = self.assist.as_ref() {
                if state.is_complete_mode()
                    && initializer.as_ref().is_some_and(|e| !expr_holds_assist(e))
                {
                    initializer = None;
                }
            }
            let field = FieldDecl {
                modifiers,
                annotations: annotations.clone(),
                ty,
                name: SmolStr::new(self.cx.text(name_tok)),
                name_range: name_tok.range,
                initializer,
                range: TextRange::new(start, self.cx.prev_end()),
            };
            if let Some(frame) = self.frames.last_mut() {
                frame.decl.members.push(Member::Field(field));
            }
            if self.cx.eat(TokenKind::Comma) {
                if self.cx.at(TokenKind::Identifier) {
                    name_tok = self.cx.bump();
                    continue;
                }
                self.error_here("expected field name");
                self.recovered = true;
            }
            break;
        }
        if !self.cx.eat(TokenKind::Semicolon) {
            self.error_here("expected `;` after field declaration");
            self.recovered = true;
        }
    }

    fn skip_member_junk(&mut self) {
        let mut bumped = false;
        loop {
            match self.cx.kind() {
                TokenKind::Eof | TokenKind::RBrace | TokenKind::LBrace => break,
                TokenKind::Semicolon => {
                    self.cx.bump();
                    break;
                }
                kind if bumped
                    && (kind.is_modifier_keyword()
                        || kind.is_type_decl_keyword()
                        || kind == TokenKind::At) =>
                {
                    break;
                }
                _ => {
                    self.cx.bump();
                    bumped = true;
                }
            }
        }
    }

    /// Scan a `{`-opened body without parsing statements: balance braces and
    /// parens, watch statement boundaries for promotion triggers, and note
    /// the first local type so the clean statement prefix can exclude it.
    fn scan_skipped_body(&mut self) -> SkippedBody {
        let start_token = self.cx.pos() as u32;
        let start_offset = self.cx.prev_end();
        let mut ctxs: Vec<ScanCtx> = Vec::new();
        let mut suppress = 0usize;
        let mut paren = 0u32;
        let mut stmt_start = true;
        let mut pending_type_body = false;
        let mut first_local_token: Option<u32> = None;

        let exit = loop {
            let tok = self.cx.current();
            match tok.kind {
                TokenKind::Eof => break BodyExit::Eof,
                TokenKind::LBrace => {
                    if pending_type_body {
                        suppress += 1;
                        ctxs.push(ScanCtx::TypeBody);
                    } else {
                        ctxs.push(ScanCtx::Block);
                    }
                    pending_type_body = false;
                    self.cx.bump();
                    stmt_start = true;
                }
                TokenKind::RBrace => {
                    match ctxs.pop() {
                        Some(ScanCtx::TypeBody) => suppress -= 1,
                        Some(ScanCtx::Block) => {}
                        None => {
                            self.cx.bump();
                            break BodyExit::Closed;
                        }
                    }
                    self.cx.bump();
                    stmt_start = true;
                }
                TokenKind::LParen => {
                    paren += 1;
                    self.cx.bump();
                    stmt_start = false;
                }
                TokenKind::RParen => {
                    paren = paren.saturating_sub(1);
                    self.cx.bump();
                    stmt_start = false;
                }
                TokenKind::Semicolon => {
                    self.cx.bump();
                    stmt_start = true;
                    pending_type_body = false;
                }
                TokenKind::Colon => {
                    self.cx.bump();
                    stmt_start = true;
                }
                TokenKind::NewKw => {
                    // The next `{` short of a `;` is an anonymous class body
                    // (or an array initializer): suppress triggers inside.
                    pending_type_body = true;
                    self.cx.bump();
                    stmt_start = false;
                }
                TokenKind::ClassKw if paren == 0 => {
                    if suppress == 0 {
                        first_local_token.get_or_insert(self.cx.pos() as u32);
                    }
                    pending_type_body = true;
                    self.cx.bump();
                    stmt_start = false;
                }
                kind => {
                    if stmt_start && paren == 0 && suppress == 0 {
                        let next = self.cx.nth(1);
                        if recovery::modifier_promotes(kind, next)
                            || recovery::at_method_header_shape(self.cx)
                        {
                            break BodyExit::Promoted;
                        }
                    }
                    self.cx.bump();
                    stmt_start = false;
                }
            }
        };

        let end_token = match exit {
            BodyExit::Closed => (self.cx.pos() as u32).saturating_sub(1),
            _ => self.cx.pos() as u32,
        };
        let clean_end_token = match exit {
            BodyExit::Closed => end_token,
            _ => first_local_token.map_or(end_token, |t| t.min(end_token)),
        };
        let recovered = !matches!(exit, BodyExit::Closed);
        if recovered {
            self.recovered = true;
            trace!(
                promoted = matches!(exit, BodyExit::Promoted),
                "body closure synthesized"
            );
        }
        SkippedBody {
            start_token,
            end_token,
            clean_end_token,
            recovered,
            range: TextRange::new(start_offset, self.cx.prev_end()),
        }
    }
}

fn parse_plain_name(cx: &mut Cursor<'_>) -> Name {
    debug_assert!(cx.at(TokenKind::Identifier));
    let first = cx.bump();
    let start = first.range.start;
    let mut segments = vec![SmolStr::new(cx.text(first))];
    let mut end = first.range.end;
    while cx.at(TokenKind::Dot) && cx.nth(1) == TokenKind::Identifier {
        cx.bump();
        let tok = cx.bump();
        segments.push(SmolStr::new(cx.text(tok)));
        end = tok.range.end;
    }
    Name {
        segments,
        range: TextRange::new(start, end),
    }
}

pub(crate) fn modifier_bit(kind: TokenKind) -> Option<Modifiers> {
    Some(match kind {
        TokenKind::PublicKw => Modifiers::PUBLIC,
        TokenKind::PrivateKw => Modifiers::PRIVATE,
        TokenKind::ProtectedKw => Modifiers::PROTECTED,
        TokenKind::StaticKw => Modifiers::STATIC,
        TokenKind::FinalKw => Modifiers::FINAL,
        TokenKind::SynchronizedKw => Modifiers::SYNCHRONIZED,
        TokenKind::VolatileKw => Modifiers::VOLATILE,
        TokenKind::TransientKw => Modifiers::TRANSIENT,
        TokenKind::NativeKw => Modifiers::NATIVE,
        TokenKind::AbstractKw => Modifiers::ABSTRACT,
        TokenKind::StrictfpKw => Modifiers::STRICTFP,
        _ => return None,
    })
}
