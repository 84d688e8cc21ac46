//! The Java declaration/statement/expression node model.
//!
//! Nodes are built mutably by the structural parser and its recovery frames
//! and are frozen once the parse returns. Every declaration carries the byte
//! range it was recognized at; synthesized nodes (default constructors,
//! `<clinit>`, `$missing$` expressions) carry an empty range at their
//! insertion point.
//!
//! Kind dispatch is closed: new recovery policy is added by extending an enum
//! and letting exhaustive matches point at every site that must learn about
//! it.

use quarry_core::TextRange;
use smol_str::SmolStr;

/// Root of a parse: one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    pub package: Option<Name>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub name: Name,
    pub is_static: bool,
    pub on_demand: bool,
    pub range: TextRange,
}

/// A dotted name. Simple names have a single segment.
#[derive(Debug, Clone, Default)]
pub struct Name {
    pub segments: Vec<SmolStr>,
    pub range: TextRange,
}

impl Name {
    pub fn simple(text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            segments: vec![text.into()],
            range,
        }
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn last(&self) -> &str {
        self.segments.last().map(SmolStr::as_str).unwrap_or("")
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

/// Declaration modifiers as a bit set.
///
/// Bit values are internal; only the canonical printing order defined by
/// [`Modifiers::iter_canonical`] is observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers(1 << 0);
    pub const PRIVATE: Modifiers = Modifiers(1 << 1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);
    pub const SYNCHRONIZED: Modifiers = Modifiers(1 << 5);
    pub const VOLATILE: Modifiers = Modifiers(1 << 6);
    pub const TRANSIENT: Modifiers = Modifiers(1 << 7);
    pub const NATIVE: Modifiers = Modifiers(1 << 8);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 9);
    pub const STRICTFP: Modifiers = Modifiers(1 << 10);

    pub const fn empty() -> Self {
        Modifiers(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    /// The access-related subset (`public`/`private`/`protected`), used when
    /// a synthesized default constructor inherits its type's visibility.
    pub fn access(self) -> Modifiers {
        Modifiers(self.0 & (Self::PUBLIC.0 | Self::PRIVATE.0 | Self::PROTECTED.0))
    }

    /// Modifiers in canonical printing order.
    pub fn iter_canonical(self) -> impl Iterator<Item = &'static str> {
        const ORDER: [(Modifiers, &str); 11] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::VOLATILE, "volatile"),
            (Modifiers::TRANSIENT, "transient"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STRICTFP, "strictfp"),
        ];
        ORDER
            .into_iter()
            .filter_map(move |(bit, text)| self.contains(bit).then_some(text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

/// A class/interface/enum/annotation-type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: SmolStr,
    pub name_range: TextRange,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    pub superclass: Option<TypeRef>,
    pub superinterfaces: Vec<TypeRef>,
    /// Field-like members (fields, enum constants, initializer blocks) in
    /// discovery order.
    pub members: Vec<Member>,
    /// Constructors and methods. Synthesized members (default constructor,
    /// `<clinit>`) sit at the front, ahead of source-order members.
    pub methods: Vec<MethodDecl>,
    pub member_types: Vec<TypeDecl>,
    pub range: TextRange,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, name: SmolStr, name_range: TextRange) -> Self {
        Self {
            kind,
            name,
            name_range,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            type_params: Vec::new(),
            superclass: None,
            superinterfaces: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
            range: name_range,
        }
    }

    pub fn has_explicit_constructor(&self) -> bool {
        self.methods
            .iter()
            .any(|m| m.kind == MethodKind::Constructor && !m.is_synthesized)
    }

    /// Whether the type carries static state (a static field, a static
    /// initializer, or enum constants).
    pub fn has_static_state(&self) -> bool {
        if self.kind == TypeKind::Enum {
            return true;
        }
        self.members.iter().any(|m| match m {
            Member::Field(f) => f.modifiers.contains(Modifiers::STATIC),
            Member::Initializer(i) => i.is_static,
            Member::EnumConstant(_) => true,
        })
    }
}

/// A field-like member.
#[derive(Debug, Clone)]
pub enum Member {
    Field(FieldDecl),
    EnumConstant(EnumConstant),
    Initializer(Initializer),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub ty: TypeRef,
    pub name: SmolStr,
    pub name_range: TextRange,
    pub initializer: Option<Expr>,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub name: SmolStr,
    pub name_range: TextRange,
    pub args: Vec<Expr>,
}

/// A `static { ... }` or instance `{ ... }` initializer block.
#[derive(Debug, Clone)]
pub struct Initializer {
    pub is_static: bool,
    pub body: BodyState,
    pub range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
    /// The synthesized `<clinit>` member materializing static state.
    Clinit,
    /// An annotation-type member (`int value();`).
    AnnotationMember,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParam>,
    /// Absent for constructors and `<clinit>`.
    pub return_type: Option<TypeRef>,
    pub name: SmolStr,
    pub name_range: TextRange,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    /// Annotation-member default value.
    pub default_value: Option<Expr>,
    /// A constructor's leading chain call. Body parsing populates this with a
    /// synthesized `super()` unless the source opens with an explicit
    /// `this(...)`/`super(...)`.
    pub explicit_call: Option<ExplicitCall>,
    pub body: BodyState,
    pub is_synthesized: bool,
    pub range: TextRange,
}

impl MethodDecl {
    pub fn new(kind: MethodKind, name: SmolStr, name_range: TextRange) -> Self {
        Self {
            kind,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            type_params: Vec::new(),
            return_type: None,
            name,
            name_range,
            params: Vec::new(),
            throws: Vec::new(),
            default_value: None,
            explicit_call: None,
            body: BodyState::None,
            is_synthesized: false,
            range: name_range,
        }
    }
}

/// A constructor chain call: `super(args)` or `this(args)`.
#[derive(Debug, Clone)]
pub struct ExplicitCall {
    pub is_super: bool,
    pub args: Vec<Expr>,
}

impl ExplicitCall {
    pub fn implicit_super() -> Self {
        Self {
            is_super: true,
            args: Vec::new(),
        }
    }
}

/// The body of a method or initializer.
#[derive(Debug, Clone, Default)]
pub enum BodyState {
    /// No body at all (abstract methods, interface members).
    #[default]
    None,
    /// Body boundaries recorded by the diet pass, statements not yet parsed.
    Skipped(SkippedBody),
    /// Statements parsed (eagerly by a full parse, or lazily on demand).
    Parsed(Vec<Statement>),
}

impl BodyState {
    pub fn empty_skipped() -> Self {
        BodyState::Skipped(SkippedBody::default())
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, BodyState::Skipped(_))
    }
}

/// Token-index boundaries of a skipped body, relative to the token buffer of
/// the [`crate::Parser`] that produced it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkippedBody {
    /// First body token (the one after `{`).
    pub start_token: u32,
    /// One past the last body token.
    pub end_token: u32,
    /// One past the last token of the clean statement prefix: when the body
    /// was closed by recovery rather than a matching `}`, statements past
    /// this point are only reconstructed by the recovery-enabled body parse.
    pub clean_end_token: u32,
    /// Whether the body's closure was synthesized by the recovery engine.
    pub recovered: bool,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub ty: TypeRef,
    pub name: SmolStr,
    pub varargs: bool,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: SmolStr,
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: Name,
    /// The annotation name is the node under the cursor
    /// (`@<CompleteOnType:...>`).
    pub assist_name: bool,
    pub args: AnnotationArgs,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub enum AnnotationArgs {
    /// `@Marker`
    None,
    /// `@Single(expr)` — the elided member name defaults to `value`.
    Single(Box<Expr>),
    /// `@Normal(a = x, b = y)`
    Pairs(Vec<MemberValuePair>),
}

#[derive(Debug, Clone)]
pub struct MemberValuePair {
    pub name: SmolStr,
    pub value: Expr,
}

/// A type reference, possibly with generic arguments and array dimensions.
#[derive(Debug, Clone)]
pub struct TypeRef {
    pub base: TypeRefBase,
    pub args: Vec<TypeRef>,
    /// Trailing `[]` count.
    pub dims: u8,
}

#[derive(Debug, Clone)]
pub enum TypeRefBase {
    /// `int`, `boolean`, `void`, ...
    Primitive(SmolStr),
    Named(Name),
    /// `?`, `? extends T`, `? super T`
    Wildcard(Option<Box<(WildcardBound, TypeRef)>>),
    /// The type reference under a completion cursor.
    CompleteOn(Name),
    /// The type reference under a selection range.
    SelectOn(Name),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardBound {
    Extends,
    Super,
}

impl TypeRef {
    pub fn named(name: Name) -> Self {
        Self {
            base: TypeRefBase::Named(name),
            args: Vec::new(),
            dims: 0,
        }
    }

    pub fn primitive(text: impl Into<SmolStr>) -> Self {
        Self {
            base: TypeRefBase::Primitive(text.into()),
            args: Vec::new(),
            dims: 0,
        }
    }

    pub fn is_assist(&self) -> bool {
        matches!(
            self.base,
            TypeRefBase::CompleteOn(_) | TypeRefBase::SelectOn(_)
        )
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    Block(Vec<Statement>),
    LocalVar(LocalVarDecl),
    LocalType(Box<TypeDecl>),
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        cond: Expr,
        body: Box<Statement>,
    },
    Do {
        body: Box<Statement>,
        cond: Expr,
    },
    For {
        init: Vec<Statement>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Statement>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Break(Option<SmolStr>),
    Continue(Option<SmolStr>),
    Try {
        body: Vec<Statement>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Statement>>,
    },
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
    },
    Synchronized {
        lock: Expr,
        body: Vec<Statement>,
    },
    Assert {
        cond: Expr,
        detail: Option<Expr>,
    },
    Labeled {
        label: SmolStr,
        body: Box<Statement>,
    },
    Empty,
}

#[derive(Debug, Clone)]
pub struct LocalVarDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub name: SmolStr,
    pub name_range: TextRange,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Param,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` is the `default` label.
    pub label: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Name(Name),
    Literal(SmolStr),
    This(TextRange),
    FieldAccess {
        receiver: Box<Expr>,
        name: SmolStr,
        name_range: TextRange,
    },
    /// `super.name`
    SuperFieldAccess {
        name: SmolStr,
        name_range: TextRange,
    },
    MethodCall {
        receiver: Option<Box<Expr>>,
        name: SmolStr,
        args: Vec<Expr>,
        range: TextRange,
    },
    SuperMethodCall {
        name: SmolStr,
        args: Vec<Expr>,
        range: TextRange,
    },
    Alloc {
        ty: TypeRef,
        args: Vec<Expr>,
        /// Anonymous class body.
        body: Option<Box<TypeDecl>>,
        range: TextRange,
    },
    ArrayAlloc {
        ty: TypeRef,
        dim_exprs: Vec<Expr>,
        extra_dims: u8,
        init: Option<Box<Expr>>,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayInit(Vec<Expr>),
    Unary {
        op: SmolStr,
        operand: Box<Expr>,
        postfix: bool,
    },
    Binary {
        op: SmolStr,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
    },
    Assign {
        op: SmolStr,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// The reserved placeholder for an expression recovery could not rebuild.
    Missing,
    /// `<CompleteOnName:...>`
    CompleteOnName(Name),
    /// `<CompleteOnMemberAccess:recv.partial>`
    CompleteOnMemberAccess {
        receiver: Box<Expr>,
        name: SmolStr,
    },
    /// `<SelectOnName:...>`
    SelectOnName(Name),
}

impl Expr {
    pub fn is_assist(&self) -> bool {
        matches!(
            self,
            Expr::CompleteOnName(_)
                | Expr::CompleteOnMemberAccess { .. }
                | Expr::SelectOnName(_)
        )
    }
}
