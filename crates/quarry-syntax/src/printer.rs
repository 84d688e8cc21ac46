//! Deterministic unit-to-text renderer.
//!
//! The display form is the observable contract for structural and recovery
//! behavior: two structurally equal units render identically, modifiers
//! render in canonical order, and synthesized elements render with reserved
//! markers (`<clinit>`, `$missing$`, `<CompleteOnName:...>`).
//!
//! Layout rules:
//! - two spaces of indentation per nesting level;
//! - a type body prints member types first, then field-like members in
//!   discovery order, then methods (synthesized members lead the method
//!   list);
//! - an annotation whose name is the assist node prints alone on the line
//!   above its declaration with the other modifiers suppressed; an
//!   annotation holding the assist node inside an array-valued member prints
//!   on its own line with modifiers kept; all other annotations print inline
//!   between the modifiers and the declaration keyword.

use crate::ast::*;

const INDENT: &str = "  ";

impl SourceUnit {
    /// Render the canonical display form of the whole unit.
    pub fn to_display_string(&self) -> String {
        let mut out = String::new();
        if let Some(package) = &self.package {
            out.push_str("package ");
            out.push_str(&package.dotted());
            out.push_str(";\n");
        }
        for import in &self.imports {
            out.push_str("import ");
            if import.is_static {
                out.push_str("static ");
            }
            out.push_str(&import.name.dotted());
            if import.on_demand {
                out.push_str(".*");
            }
            out.push_str(";\n");
        }
        for ty in &self.types {
            write_type(ty, 0, &mut out);
        }
        out
    }
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn write_type(ty: &TypeDecl, level: usize, out: &mut String) {
    let assist_name_anno = ty.annotations.iter().find(|a| a.assist_name);
    let array_assist_annos: Vec<&Annotation> = ty
        .annotations
        .iter()
        .filter(|a| !a.assist_name && annotation_has_array_assist(a))
        .collect();

    if let Some(anno) = assist_name_anno {
        push_indent(level, out);
        out.push_str(&annotation_display(anno));
        out.push('\n');
    }
    for anno in &array_assist_annos {
        push_indent(level, out);
        out.push_str(&annotation_display(anno));
        out.push('\n');
    }

    push_indent(level, out);
    if assist_name_anno.is_none() {
        for word in ty.modifiers.iter_canonical() {
            out.push_str(word);
            out.push(' ');
        }
        for anno in &ty.annotations {
            if annotation_has_array_assist(anno) {
                continue;
            }
            out.push_str(&annotation_display(anno));
            out.push(' ');
        }
    }
    out.push_str(match ty.kind {
        TypeKind::Class => "class ",
        TypeKind::Interface => "interface ",
        TypeKind::Enum => "enum ",
        TypeKind::Annotation => "@interface ",
    });
    out.push_str(&ty.name);
    if !ty.type_params.is_empty() {
        out.push('<');
        for (i, tp) in ty.type_params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&tp.name);
            for (j, bound) in tp.bounds.iter().enumerate() {
                out.push_str(if j == 0 { " extends " } else { " & " });
                out.push_str(&type_ref_display(bound));
            }
        }
        out.push('>');
    }
    if let Some(superclass) = &ty.superclass {
        out.push_str(" extends ");
        out.push_str(&type_ref_display(superclass));
    }
    if !ty.superinterfaces.is_empty() {
        out.push_str(if ty.kind == TypeKind::Interface {
            " extends "
        } else {
            " implements "
        });
        for (i, si) in ty.superinterfaces.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&type_ref_display(si));
        }
    }
    out.push_str(" {\n");

    for member_type in &ty.member_types {
        write_type(member_type, level + 1, out);
    }
    for member in &ty.members {
        write_member(member, level + 1, out);
    }
    for method in &ty.methods {
        write_method(method, level + 1, out);
    }

    push_indent(level, out);
    out.push_str("}\n");
}

fn write_member(member: &Member, level: usize, out: &mut String) {
    match member {
        Member::Field(field) => {
            push_indent(level, out);
            for word in field.modifiers.iter_canonical() {
                out.push_str(word);
                out.push(' ');
            }
            for anno in &field.annotations {
                out.push_str(&annotation_display(anno));
                out.push(' ');
            }
            out.push_str(&type_ref_display(&field.ty));
            out.push(' ');
            out.push_str(&field.name);
            if let Some(init) = &field.initializer {
                out.push_str(" = ");
                write_expr(init, level, out);
            }
            out.push_str(";\n");
        }
        Member::EnumConstant(constant) => {
            push_indent(level, out);
            out.push_str(&constant.name);
            if !constant.args.is_empty() {
                out.push('(');
                write_expr_list(&constant.args, level, out);
                out.push(')');
            }
            out.push_str(",\n");
        }
        Member::Initializer(init) => {
            push_indent(level, out);
            if init.is_static {
                out.push_str("static ");
            }
            out.push('{');
            write_body(&init.body, None, level, out);
            out.push('\n');
        }
    }
}

fn write_method(method: &MethodDecl, level: usize, out: &mut String) {
    push_indent(level, out);
    for word in method.modifiers.iter_canonical() {
        out.push_str(word);
        out.push(' ');
    }
    for anno in &method.annotations {
        out.push_str(&annotation_display(anno));
        out.push(' ');
    }
    if !method.type_params.is_empty() {
        out.push('<');
        for (i, tp) in method.type_params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&tp.name);
            for (j, bound) in tp.bounds.iter().enumerate() {
                out.push_str(if j == 0 { " extends " } else { " & " });
                out.push_str(&type_ref_display(bound));
            }
        }
        out.push_str("> ");
    }
    if let Some(ret) = &method.return_type {
        out.push_str(&type_ref_display(ret));
        out.push(' ');
    }
    if method.kind == MethodKind::Clinit {
        out.push_str("<clinit>");
    } else {
        out.push_str(&method.name);
    }
    out.push('(');
    for (i, param) in method.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        for word in param.modifiers.iter_canonical() {
            out.push_str(word);
            out.push(' ');
        }
        for anno in &param.annotations {
            out.push_str(&annotation_display(anno));
            out.push(' ');
        }
        out.push_str(&type_ref_display(&param.ty));
        if param.varargs {
            out.push_str("...");
        }
        out.push(' ');
        out.push_str(&param.name);
    }
    out.push(')');
    if !method.throws.is_empty() {
        out.push_str(" throws ");
        for (i, thrown) in method.throws.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&type_ref_display(thrown));
        }
    }
    if let Some(default) = &method.default_value {
        out.push_str(" default ");
        write_expr(default, level, out);
    }
    match &method.body {
        BodyState::None => out.push_str(";\n"),
        body => {
            out.push(' ');
            out.push('{');
            write_body(body, method.explicit_call.as_ref(), level, out);
            out.push('\n');
        }
    }
}

/// Writes the part of a body after its opening `{`, including the closing
/// brace at `level`.
fn write_body(
    body: &BodyState,
    explicit_call: Option<&ExplicitCall>,
    level: usize,
    out: &mut String,
) {
    out.push('\n');
    if let Some(call) = explicit_call {
        push_indent(level + 1, out);
        out.push_str(if call.is_super { "super(" } else { "this(" });
        write_expr_list(&call.args, level + 1, out);
        out.push_str(");\n");
    }
    if let BodyState::Parsed(statements) = body {
        for statement in statements {
            write_statement(statement, level + 1, out);
        }
    }
    push_indent(level, out);
    out.push('}');
}

fn write_statement(statement: &Statement, level: usize, out: &mut String) {
    match statement {
        Statement::Block(statements) => {
            push_indent(level, out);
            out.push_str("{\n");
            for s in statements {
                write_statement(s, level + 1, out);
            }
            push_indent(level, out);
            out.push_str("}\n");
        }
        Statement::LocalVar(decl) => {
            push_indent(level, out);
            write_local_var(decl, level, out);
            out.push_str(";\n");
        }
        Statement::LocalType(ty) => write_type(ty, level, out),
        Statement::Expr(expr) => {
            push_indent(level, out);
            write_expr(expr, level, out);
            out.push_str(";\n");
        }
        Statement::If {
            cond,
            then_branch,
            else_branch,
        } => {
            push_indent(level, out);
            out.push_str("if (");
            write_expr(cond, level, out);
            out.push(')');
            let block_then = write_embedded(then_branch, level, out);
            if let Some(else_branch) = else_branch {
                if block_then {
                    out.push_str(" else");
                } else {
                    push_indent(level, out);
                    out.push_str("else");
                }
                write_embedded_closed(else_branch, level, out);
            } else if block_then {
                out.push('\n');
            }
        }
        Statement::While { cond, body } => {
            push_indent(level, out);
            out.push_str("while (");
            write_expr(cond, level, out);
            out.push(')');
            write_embedded_closed(body, level, out);
        }
        Statement::Do { body, cond } => {
            push_indent(level, out);
            out.push_str("do");
            let block = write_embedded(body, level, out);
            if block {
                out.push(' ');
            } else {
                push_indent(level, out);
            }
            out.push_str("while (");
            write_expr(cond, level, out);
            out.push_str(");\n");
        }
        Statement::For {
            init,
            cond,
            update,
            body,
        } => {
            push_indent(level, out);
            out.push_str("for (");
            for (i, part) in init.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match part {
                    Statement::LocalVar(decl) => write_local_var(decl, level, out),
                    Statement::Expr(expr) => write_expr(expr, level, out),
                    _ => {}
                }
            }
            out.push(';');
            if let Some(cond) = cond {
                out.push(' ');
                write_expr(cond, level, out);
            }
            out.push(';');
            if !update.is_empty() {
                out.push(' ');
                write_expr_list(update, level, out);
            }
            out.push(')');
            write_embedded_closed(body, level, out);
        }
        Statement::Return(value) => {
            push_indent(level, out);
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                write_expr(value, level, out);
            }
            out.push_str(";\n");
        }
        Statement::Throw(value) => {
            push_indent(level, out);
            out.push_str("throw ");
            write_expr(value, level, out);
            out.push_str(";\n");
        }
        Statement::Break(label) => {
            push_indent(level, out);
            out.push_str("break");
            if let Some(label) = label {
                out.push(' ');
                out.push_str(label);
            }
            out.push_str(";\n");
        }
        Statement::Continue(label) => {
            push_indent(level, out);
            out.push_str("continue");
            if let Some(label) = label {
                out.push(' ');
                out.push_str(label);
            }
            out.push_str(";\n");
        }
        Statement::Try {
            body,
            catches,
            finally,
        } => {
            push_indent(level, out);
            out.push_str("try {\n");
            for s in body {
                write_statement(s, level + 1, out);
            }
            for catch in catches {
                push_indent(level, out);
                out.push_str("} catch (");
                out.push_str(&type_ref_display(&catch.param.ty));
                out.push(' ');
                out.push_str(&catch.param.name);
                out.push_str(") {\n");
                for s in &catch.body {
                    write_statement(s, level + 1, out);
                }
            }
            if let Some(finally) = finally {
                push_indent(level, out);
                out.push_str("} finally {\n");
                for s in finally {
                    write_statement(s, level + 1, out);
                }
            }
            push_indent(level, out);
            out.push_str("}\n");
        }
        Statement::Switch { scrutinee, cases } => {
            push_indent(level, out);
            out.push_str("switch (");
            write_expr(scrutinee, level, out);
            out.push_str(") {\n");
            for case in cases {
                push_indent(level + 1, out);
                match &case.label {
                    Some(label) => {
                        out.push_str("case ");
                        write_expr(label, level + 1, out);
                        out.push_str(" :\n");
                    }
                    None => out.push_str("default :\n"),
                }
                for s in &case.body {
                    write_statement(s, level + 2, out);
                }
            }
            push_indent(level, out);
            out.push_str("}\n");
        }
        Statement::Synchronized { lock, body } => {
            push_indent(level, out);
            out.push_str("synchronized (");
            write_expr(lock, level, out);
            out.push_str(") {\n");
            for s in body {
                write_statement(s, level + 1, out);
            }
            push_indent(level, out);
            out.push_str("}\n");
        }
        Statement::Assert { cond, detail } => {
            push_indent(level, out);
            out.push_str("assert ");
            write_expr(cond, level, out);
            if let Some(detail) = detail {
                out.push_str(" : ");
                write_expr(detail, level, out);
            }
            out.push_str(";\n");
        }
        Statement::Labeled { label, body } => {
            push_indent(level, out);
            out.push_str(label);
            out.push_str(" :\n");
            write_statement(body, level + 1, out);
        }
        Statement::Empty => {
            push_indent(level, out);
            out.push_str(";\n");
        }
    }
}

/// Writes an embedded (if/while/for/do) sub-statement. Returns `true` when
/// the sub-statement was a block, in which case the closing `}` is left
/// unterminated so the caller can attach ` else`/` while`.
fn write_embedded(statement: &Statement, level: usize, out: &mut String) -> bool {
    match statement {
        Statement::Block(statements) => {
            out.push_str(" {\n");
            for s in statements {
                write_statement(s, level + 1, out);
            }
            push_indent(level, out);
            out.push('}');
            true
        }
        Statement::Empty => {
            out.push_str(" ;\n");
            false
        }
        other => {
            out.push('\n');
            write_statement(other, level + 1, out);
            false
        }
    }
}

fn write_embedded_closed(statement: &Statement, level: usize, out: &mut String) {
    if write_embedded(statement, level, out) {
        out.push('\n');
    }
}

fn write_local_var(decl: &LocalVarDecl, level: usize, out: &mut String) {
    for word in decl.modifiers.iter_canonical() {
        out.push_str(word);
        out.push(' ');
    }
    out.push_str(&type_ref_display(&decl.ty));
    out.push(' ');
    out.push_str(&decl.name);
    if let Some(init) = &decl.initializer {
        out.push_str(" = ");
        write_expr(init, level, out);
    }
}

fn write_expr_list(exprs: &[Expr], level: usize, out: &mut String) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(expr, level, out);
    }
}

fn write_expr(expr: &Expr, level: usize, out: &mut String) {
    match expr {
        Expr::Name(name) => out.push_str(&name.dotted()),
        Expr::Literal(text) => out.push_str(text),
        Expr::This(_) => out.push_str("this"),
        Expr::FieldAccess { receiver, name, .. } => {
            write_expr(receiver, level, out);
            out.push('.');
            out.push_str(name);
        }
        Expr::SuperFieldAccess { name, .. } => {
            out.push_str("super.");
            out.push_str(name);
        }
        Expr::MethodCall {
            receiver,
            name,
            args,
            ..
        } => {
            if let Some(receiver) = receiver {
                write_expr(receiver, level, out);
                out.push('.');
            }
            out.push_str(name);
            out.push('(');
            write_expr_list(args, level, out);
            out.push(')');
        }
        Expr::SuperMethodCall { name, args, .. } => {
            out.push_str("super.");
            out.push_str(name);
            out.push('(');
            write_expr_list(args, level, out);
            out.push(')');
        }
        Expr::Alloc {
            ty, args, body, ..
        } => {
            out.push_str("new ");
            out.push_str(&type_ref_display(ty));
            out.push('(');
            write_expr_list(args, level, out);
            out.push(')');
            if let Some(body) = body {
                out.push_str(" {\n");
                for member_type in &body.member_types {
                    write_type(member_type, level + 1, out);
                }
                for member in &body.members {
                    write_member(member, level + 1, out);
                }
                for method in &body.methods {
                    write_method(method, level + 1, out);
                }
                push_indent(level, out);
                out.push('}');
            }
        }
        Expr::ArrayAlloc {
            ty,
            dim_exprs,
            extra_dims,
            init,
        } => {
            out.push_str("new ");
            out.push_str(&type_ref_display(ty));
            for dim in dim_exprs {
                out.push('[');
                write_expr(dim, level, out);
                out.push(']');
            }
            for _ in 0..*extra_dims {
                out.push_str("[]");
            }
            if let Some(init) = init {
                out.push(' ');
                write_expr(init, level, out);
            }
        }
        Expr::ArrayAccess { array, index } => {
            write_expr(array, level, out);
            out.push('[');
            write_expr(index, level, out);
            out.push(']');
        }
        Expr::ArrayInit(elements) => {
            out.push('{');
            write_expr_list(elements, level, out);
            out.push('}');
        }
        Expr::Unary {
            op,
            operand,
            postfix,
        } => {
            if *postfix {
                write_expr(operand, level, out);
                out.push_str(op);
            } else {
                out.push_str(op);
                write_expr(operand, level, out);
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(lhs, level, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            write_expr(rhs, level, out);
            out.push(')');
        }
        Expr::Conditional {
            cond,
            then_value,
            else_value,
        } => {
            out.push('(');
            write_expr(cond, level, out);
            out.push_str(" ? ");
            write_expr(then_value, level, out);
            out.push_str(" : ");
            write_expr(else_value, level, out);
            out.push(')');
        }
        Expr::Cast { ty, expr } => {
            out.push('(');
            out.push_str(&type_ref_display(ty));
            out.push_str(") ");
            write_expr(expr, level, out);
        }
        Expr::InstanceOf { expr, ty } => {
            out.push('(');
            write_expr(expr, level, out);
            out.push_str(" instanceof ");
            out.push_str(&type_ref_display(ty));
            out.push(')');
        }
        Expr::Assign { op, lhs, rhs } => {
            write_expr(lhs, level, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            write_expr(rhs, level, out);
        }
        Expr::Paren(inner) => {
            out.push('(');
            write_expr(inner, level, out);
            out.push(')');
        }
        Expr::Missing => out.push_str("$missing$"),
        Expr::CompleteOnName(name) => {
            out.push_str("<CompleteOnName:");
            out.push_str(&name.dotted());
            out.push('>');
        }
        Expr::CompleteOnMemberAccess { receiver, name } => {
            out.push_str("<CompleteOnMemberAccess:");
            write_expr(receiver, level, out);
            out.push('.');
            out.push_str(name);
            out.push('>');
        }
        Expr::SelectOnName(name) => {
            out.push_str("<SelectOnName:");
            out.push_str(&name.dotted());
            out.push('>');
        }
    }
}

/// Render a single expression, as used for assist-parent display strings.
pub fn expr_display(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(expr, 0, &mut out);
    out
}

pub fn type_ref_display(ty: &TypeRef) -> String {
    let mut out = String::new();
    match &ty.base {
        TypeRefBase::Primitive(text) => out.push_str(text),
        TypeRefBase::Named(name) => out.push_str(&name.dotted()),
        TypeRefBase::Wildcard(bound) => {
            out.push('?');
            if let Some(bound) = bound {
                out.push_str(match bound.0 {
                    WildcardBound::Extends => " extends ",
                    WildcardBound::Super => " super ",
                });
                out.push_str(&type_ref_display(&bound.1));
            }
        }
        TypeRefBase::CompleteOn(name) => {
            out.push_str("<CompleteOnType:");
            out.push_str(&name.dotted());
            out.push('>');
        }
        TypeRefBase::SelectOn(name) => {
            out.push_str("<SelectOnType:");
            out.push_str(&name.dotted());
            out.push('>');
        }
    }
    if !ty.args.is_empty() {
        out.push('<');
        for (i, arg) in ty.args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&type_ref_display(arg));
        }
        out.push('>');
    }
    for _ in 0..ty.dims {
        out.push_str("[]");
    }
    out
}

pub fn annotation_display(anno: &Annotation) -> String {
    let mut out = String::new();
    out.push('@');
    if anno.assist_name {
        out.push_str("<CompleteOnType:");
        out.push_str(&anno.name.dotted());
        out.push('>');
    } else {
        out.push_str(&anno.name.dotted());
    }
    match &anno.args {
        AnnotationArgs::None => {}
        AnnotationArgs::Single(value) => {
            out.push('(');
            out.push_str(&expr_display(value));
            out.push(')');
        }
        AnnotationArgs::Pairs(pairs) => {
            out.push('(');
            for (i, pair) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&pair.name);
                out.push_str(" = ");
                out.push_str(&expr_display(&pair.value));
            }
            out.push(')');
        }
    }
    out
}

/// Whether the assist node sits inside an array-valued member of `anno`,
/// which switches the annotation to its own-line display position.
pub fn annotation_has_array_assist(anno: &Annotation) -> bool {
    fn array_holds_assist(expr: &Expr) -> bool {
        match expr {
            Expr::ArrayInit(elements) => elements.iter().any(expr_holds_assist),
            _ => false,
        }
    }
    match &anno.args {
        AnnotationArgs::None => false,
        AnnotationArgs::Single(value) => array_holds_assist(value),
        AnnotationArgs::Pairs(pairs) => pairs.iter().any(|p| array_holds_assist(&p.value)),
    }
}

/// Whether any assist node occurs inside `expr`.
pub fn expr_holds_assist(expr: &Expr) -> bool {
    match expr {
        Expr::CompleteOnName(_) | Expr::CompleteOnMemberAccess { .. } | Expr::SelectOnName(_) => {
            true
        }
        Expr::Name(_) | Expr::Literal(_) | Expr::This(_) | Expr::Missing => false,
        Expr::FieldAccess { receiver, .. } => expr_holds_assist(receiver),
        Expr::SuperFieldAccess { .. } => false,
        Expr::MethodCall { receiver, args, .. } => {
            receiver.as_deref().is_some_and(expr_holds_assist)
                || args.iter().any(expr_holds_assist)
        }
        Expr::SuperMethodCall { args, .. } => args.iter().any(expr_holds_assist),
        Expr::Alloc { args, .. } => args.iter().any(expr_holds_assist),
        Expr::ArrayAlloc {
            dim_exprs, init, ..
        } => dim_exprs.iter().any(expr_holds_assist) || init.as_deref().is_some_and(expr_holds_assist),
        Expr::ArrayAccess { array, index } => {
            expr_holds_assist(array) || expr_holds_assist(index)
        }
        Expr::ArrayInit(elements) => elements.iter().any(expr_holds_assist),
        Expr::Unary { operand, .. } => expr_holds_assist(operand),
        Expr::Binary { lhs, rhs, .. } => expr_holds_assist(lhs) || expr_holds_assist(rhs),
        Expr::Conditional {
            cond,
            then_value,
            else_value,
        } => {
            expr_holds_assist(cond)
                || expr_holds_assist(then_value)
                || expr_holds_assist(else_value)
        }
        Expr::Cast { expr, .. } => expr_holds_assist(expr),
        Expr::InstanceOf { expr, .. } => expr_holds_assist(expr),
        Expr::Assign { lhs, rhs, .. } => expr_holds_assist(lhs) || expr_holds_assist(rhs),
        Expr::Paren(inner) => expr_holds_assist(inner),
    }
}
