use pretty_assertions::assert_eq;

use crate::ast::Modifiers;
use crate::{
    lex, lex_with_errors, parse_java, parse_java_diet, Parser, ParserOptions, SourceLevel,
    TokenKind,
};

fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input)
        .into_iter()
        .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn kinds_at(input: &str, level: SourceLevel) -> Vec<TokenKind> {
    lex_with_errors(input, level)
        .0
        .into_iter()
        .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lexes_shifts_as_adjacent_angle_tokens() {
    assert_eq!(
        kinds("a >> b >>> c"),
        vec![
            TokenKind::Identifier,
            TokenKind::Gt,
            TokenKind::Gt,
            TokenKind::Identifier,
            TokenKind::Gt,
            TokenKind::Gt,
            TokenKind::Gt,
            TokenKind::Identifier,
        ]
    );
    // Compound assignment shifts stay single tokens.
    assert_eq!(
        kinds("a >>= b"),
        vec![TokenKind::Identifier, TokenKind::ShrEq, TokenKind::Identifier]
    );
}

#[test]
fn keywords_gate_on_source_level() {
    assert_eq!(
        kinds_at("enum assert", SourceLevel::Jdk1_3),
        vec![TokenKind::Identifier, TokenKind::Identifier]
    );
    assert_eq!(
        kinds_at("enum assert", SourceLevel::Jdk1_4),
        vec![TokenKind::Identifier, TokenKind::AssertKw]
    );
    assert_eq!(
        kinds_at("enum assert", SourceLevel::Jdk5),
        vec![TokenKind::EnumKw, TokenKind::AssertKw]
    );
}

#[test]
fn unterminated_literals_report_but_do_not_truncate() {
    let (tokens, errors) = lex_with_errors("\"abc", SourceLevel::Jdk5);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unterminated string"));
    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);

    let (tokens, errors) = lex_with_errors("/* open", SourceLevel::Jdk5);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unterminated block comment"));
    assert_eq!(tokens[0].kind, TokenKind::BlockComment);
}

#[test]
fn doc_comments_are_distinguished_from_empty_block_comments() {
    let tokens = lex("/**/ /** d */");
    assert_eq!(tokens[0].kind, TokenKind::BlockComment);
    assert_eq!(tokens[2].kind, TokenKind::DocComment);
}

#[test]
fn varargs_ellipsis_lexes_as_one_token() {
    assert!(kinds("foo(int... rest)").contains(&TokenKind::Ellipsis));
}

#[test]
fn modifiers_print_in_canonical_order() {
    let mut modifiers = Modifiers::empty();
    modifiers.insert(Modifiers::ABSTRACT);
    modifiers.insert(Modifiers::PUBLIC);
    modifiers.insert(Modifiers::STATIC);
    assert_eq!(
        modifiers.iter_canonical().collect::<Vec<_>>(),
        vec!["public", "static", "abstract"]
    );
    assert_eq!(modifiers.access(), Modifiers::PUBLIC);
}

#[test]
fn diet_parse_records_headers_and_skips_bodies() {
    let source = "public class X extends Y {\n  int f = 1;\n  public void m(int a) {\n    int b = a + 1;\n    return;\n  }\n}\n";
    let parse = parse_java_diet(source);
    assert!(!parse.recovered);
    assert_eq!(
        parse.display(),
        "public class X extends Y {\n  int f = 1;\n  public X() {\n  }\n  public void m(int a) {\n  }\n}\n"
    );
}

#[test]
fn full_parse_includes_bodies_and_implicit_super() {
    let source = "public class X extends Y {\n  int f = 1;\n  public void m(int a) {\n    int b = a + 1;\n    return;\n  }\n}\n";
    let parse = parse_java(source);
    assert!(!parse.recovered);
    assert_eq!(
        parse.display(),
        "public class X extends Y {\n  int f = 1;\n  public X() {\n    super();\n  }\n  public void m(int a) {\n    int b = (a + 1);\n    return;\n  }\n}\n"
    );
}

#[test]
fn explicit_constructor_suppresses_synthesis_and_keeps_chain_call() {
    let source = "class C {\n  C() {\n    super(1);\n  }\n}\n";
    let parse = parse_java(source);
    assert_eq!(parse.display(), "class C {\n  C() {\n    super(1);\n  }\n}\n");
}

#[test]
fn binary_expressions_print_parenthesized() {
    let source = "class C {\n  void m() {\n    x = a + b * c;\n  }\n}\n";
    let parse = parse_java(source);
    assert!(parse.display().contains("    x = (a + (b * c));\n"));
}

#[test]
fn static_state_synthesizes_clinit_after_default_constructor() {
    let source = "class C {\n  static int x = 1;\n}\n";
    let parse = parse_java_diet(source);
    assert_eq!(
        parse.display(),
        "class C {\n  static int x = 1;\n  C() {\n  }\n  <clinit>() {\n  }\n}\n"
    );
}

#[test]
fn enum_constants_and_synthesized_members() {
    let source = "enum E {\n  A, B;\n  void m() {\n  }\n}\n";
    let parse = parse_java_diet(source);
    assert_eq!(
        parse.display(),
        "enum E {\n  A,\n  B,\n  E() {\n  }\n  <clinit>() {\n  }\n  void m() {\n  }\n}\n"
    );
}

#[test]
fn interface_and_annotation_type_headers() {
    let parse = parse_java_diet("interface I extends A, B {\n  void m();\n}\n");
    assert_eq!(
        parse.display(),
        "interface I extends A, B {\n  void m();\n}\n"
    );

    let parse = parse_java_diet("@interface A {\n  int value() default 3;\n}\n");
    assert_eq!(parse.display(), "@interface A {\n  int value() default 3;\n}\n");
}

#[test]
fn package_and_imports_render_canonically() {
    let source = "package a.b;\nimport java.util.List;\nimport static java.util.Arrays.*;\nclass C {\n}\n";
    let parse = parse_java_diet(source);
    assert_eq!(
        parse.display(),
        "package a.b;\nimport java.util.List;\nimport static java.util.Arrays.*;\nclass C {\n  C() {\n  }\n}\n"
    );
}

#[test]
fn comma_declarators_desugar_into_sibling_fields() {
    let source = "class C {\n  int a = 1, b;\n}\n";
    let parse = parse_java_diet(source);
    assert_eq!(
        parse.display(),
        "class C {\n  int a = 1;\n  int b;\n  C() {\n  }\n}\n"
    );
}

#[test]
fn lazy_body_parse_touches_only_the_requested_member() {
    let source = "class C {\n  void a() {\n    first();\n  }\n  void b() {\n    second();\n  }\n}\n";
    let mut parser = Parser::new(source, ParserOptions::default());
    let mut parse = parser.diet_parse();
    let ty = &mut parse.unit.types[0];
    // Methods: [synthesized ctor, a, b]; parse only `b`.
    let method = &mut ty.methods[2];
    assert_eq!(method.name, "b");
    parser.parse_method_body(method);
    let display = parse.unit.to_display_string();
    assert!(display.contains("  void a() {\n  }\n"));
    assert!(display.contains("  void b() {\n    second();\n  }\n"));
}

#[test]
fn statement_coverage_round_trips_through_the_printer() {
    let source = "class C {\n  void m(int n) {\n    do {\n      n--;\n    } while (n > 0);\n    switch (n) {\n      case 1:\n        break;\n      default:\n        n++;\n    }\n    try {\n      throw new E();\n    } catch (E e) {\n      handle(e);\n    } finally {\n      done();\n    }\n    synchronized (this) {\n      assert n == 0 : n;\n    }\n  }\n}\n";
    let parse = parse_java(source);
    let display = parse.display();
    assert!(display.contains("    do {\n      n--;\n    } while ((n > 0));\n"));
    assert!(display.contains("    switch (n) {\n      case 1 :\n        break;\n      default :\n        n++;\n    }\n"));
    assert!(display.contains("    try {\n      throw new E();\n    } catch (E e) {\n      handle(e);\n    } finally {\n      done();\n    }\n"));
    assert!(display.contains("    synchronized (this) {\n      assert (n == 0) : n;\n    }\n"));
}

#[test]
fn initializer_blocks_parse_like_method_bodies() {
    let source = "class C {\n  static {\n    setup();\n  }\n}\n";
    let parse = parse_java(source);
    assert_eq!(
        parse.display(),
        "class C {\n  static {\n    setup();\n  }\n  C() {\n    super();\n  }\n  <clinit>() {\n  }\n}\n"
    );
}

#[test]
fn casts_conditionals_and_arrays_print_canonically() {
    let source = "class C {\n  void m() {\n    int[] xs = new int[10];\n    Object o = (Object) xs;\n    int y = flag ? xs[0] : -1;\n    int[] init = {1, 2};\n  }\n}\n";
    let display = parse_java(source).display();
    assert!(display.contains("    int[] xs = new int[10];\n"));
    assert!(display.contains("    Object o = (Object) xs;\n"));
    assert!(display.contains("    int y = (flag ? xs[0] : -1);\n"));
    assert!(display.contains("    int[] init = {1, 2};\n"));
}

#[test]
fn anonymous_class_bodies_parse_with_their_members() {
    let source = "class C {\n  void m() {\n    run(new Task() {\n      void work() {\n        step();\n      }\n    });\n  }\n}\n";
    let parse = parse_java(source);
    let display = parse.display();
    assert!(display.contains("run(new Task() {\n      void work() {\n        step();\n      }\n    })"));
}
