//! Recovered element frames and the policies that close them.
//!
//! A [`TypeFrame`] is the transient bookkeeping for one type declaration
//! under construction. Frames live on an explicit stack owned by the
//! structural parser, so recovery depth is bounded by memory rather than the
//! native call stack. A frame owns its AST node until it closes; closing
//! merges the node into the parent frame (or the unit), which is where
//! post-hoc reparenting happens.

use smol_str::SmolStr;

use crate::ast::{BodyState, ExplicitCall, MethodDecl, MethodKind, TypeDecl, TypeKind};
use crate::lexer::TokenKind;
use crate::parser::Cursor;

/// Maximum depth of recovered type nesting. Type headers recovered deeper
/// than this are dropped; the cap keeps pathological inputs (thousands of
/// unclosed `class X` headers) from producing equally pathological trees.
pub(crate) const MAX_RECOVERED_TYPE_DEPTH: usize = 256;

/// One type declaration under construction.
pub(crate) struct TypeFrame {
    pub(crate) decl: TypeDecl,
    /// Whether the header's `{` was actually present. A headerless body can
    /// only be closed by recovery, never by a `}` token.
    pub(crate) has_open_brace: bool,
    /// Enum constant section still active (before the `;` separator).
    pub(crate) in_constant_section: bool,
    /// Anonymous class bodies never receive synthesized members.
    pub(crate) anonymous: bool,
    /// Set when any member or closure of this frame was synthesized.
    pub(crate) recovered: bool,
}

impl TypeFrame {
    pub(crate) fn new(decl: TypeDecl, has_open_brace: bool) -> Self {
        let in_constant_section = decl.kind == TypeKind::Enum;
        Self {
            decl,
            has_open_brace,
            in_constant_section,
            anonymous: false,
            recovered: !has_open_brace,
        }
    }

    pub(crate) fn new_anonymous(decl: TypeDecl) -> Self {
        Self {
            decl,
            has_open_brace: true,
            in_constant_section: false,
            anonymous: true,
            recovered: false,
        }
    }
}

/// Close a type: synthesize the default constructor and `<clinit>` members
/// the declaration implies.
///
/// With `parsed_bodies` set (full parse of a well-formed unit, or local-type
/// reconstruction during statement recovery) the synthesized members carry
/// parsed-empty bodies and the constructor its implicit `super()` call;
/// otherwise they stay in the diet (skipped-body) shape.
pub(crate) fn finalize_type(decl: &mut TypeDecl, parsed_bodies: bool) {
    let wants_ctor = matches!(decl.kind, TypeKind::Class | TypeKind::Enum)
        && !decl.has_explicit_constructor();
    if wants_ctor {
        let mut ctor = MethodDecl::new(
            MethodKind::Constructor,
            decl.name.clone(),
            quarry_core::TextRange::empty(decl.name_range.start),
        );
        // Enum constructors are implicitly private and print bare; class
        // default constructors inherit the type's access modifiers.
        if decl.kind == TypeKind::Class {
            ctor.modifiers = decl.modifiers.access();
        }
        ctor.is_synthesized = true;
        if parsed_bodies {
            ctor.body = BodyState::Parsed(Vec::new());
            ctor.explicit_call = Some(ExplicitCall::implicit_super());
        } else {
            ctor.body = BodyState::empty_skipped();
        }
        decl.methods.insert(0, ctor);
    }

    if decl.has_static_state() && !decl.methods.iter().any(|m| m.kind == MethodKind::Clinit) {
        let mut clinit = MethodDecl::new(
            MethodKind::Clinit,
            SmolStr::new("<clinit>"),
            quarry_core::TextRange::empty(decl.name_range.start),
        );
        clinit.is_synthesized = true;
        clinit.body = if parsed_bodies {
            BodyState::Parsed(Vec::new())
        } else {
            BodyState::empty_skipped()
        };
        let at = usize::from(wants_ctor);
        decl.methods.insert(at, clinit);
    }
}

/// Whether a statement-initial modifier keyword forces promotion of the
/// following construct to a type member.
///
/// The trigger set is the example-driven heuristic: modifiers that are
/// illegal in statement position promote; `final` (legal on locals) and
/// `abstract`/`static` introducing a local class do not.
pub(crate) fn modifier_promotes(kind: TokenKind, next: TokenKind) -> bool {
    match kind {
        TokenKind::PublicKw
        | TokenKind::ProtectedKw
        | TokenKind::PrivateKw
        | TokenKind::NativeKw
        | TokenKind::VolatileKw
        | TokenKind::TransientKw => true,
        TokenKind::StaticKw => next != TokenKind::ClassKw,
        TokenKind::AbstractKw => next != TokenKind::ClassKw,
        _ => false,
    }
}

/// Token length of a type-reference shape at the cursor (`void`, a
/// primitive, or a dotted name with balanced generic arguments and `[]`
/// suffixes), without consuming anything. `None` when the cursor is not at a
/// type shape, or the generic argument list cannot be balanced within a sane
/// horizon.
pub(crate) fn type_shape_len(cx: &Cursor<'_>) -> Option<usize> {
    let mut n;
    match cx.nth(0) {
        TokenKind::VoidKw => n = 1,
        k if k.is_primitive_type() => n = 1,
        TokenKind::Identifier => {
            n = 1;
            while cx.nth(n) == TokenKind::Dot && cx.nth(n + 1) == TokenKind::Identifier {
                n += 2;
            }
        }
        _ => return None,
    }
    if cx.nth(n) == TokenKind::Lt {
        let mut depth = 0usize;
        let mut steps = 0usize;
        loop {
            match cx.nth(n) {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        n += 1;
                        break;
                    }
                }
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => {
                    return None;
                }
                _ => {}
            }
            n += 1;
            steps += 1;
            if steps > 64 {
                return None;
            }
        }
    }
    while cx.nth(n) == TokenKind::LBracket && cx.nth(n + 1) == TokenKind::RBracket {
        n += 2;
    }
    Some(n)
}

/// Speculative check for a `Type name (`-shaped method header at the cursor,
/// without consuming anything. A bare `name(` call shape does not match,
/// which is what keeps message sends and constructor-looking fragments from
/// being promoted.
pub(crate) fn at_method_header_shape(cx: &Cursor<'_>) -> bool {
    match type_shape_len(cx) {
        Some(n) => cx.nth(n) == TokenKind::Identifier && cx.nth(n + 1) == TokenKind::LParen,
        None => false,
    }
}
