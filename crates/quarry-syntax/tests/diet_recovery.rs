//! Recovery fixtures: each case checks the parse views a caller can observe
//! (diet, diet+bodies, diet+bodies with statements recovery, full, and the
//! completion-mode diet view) against the exact rendered text.

use pretty_assertions::assert_eq;

use quarry_syntax::{parse_java, AssistMode, Parser, ParserOptions};

struct Views {
    diet: String,
    diet_body: String,
    diet_body_recovery: String,
    full: String,
    completion_diet: String,
}

fn views(source: &str) -> Views {
    let mut diet_parser = Parser::new(source, ParserOptions::default());
    let mut diet_parse = diet_parser.diet_parse();
    let diet = diet_parse.unit.to_display_string();
    for ty in &mut diet_parse.unit.types {
        diet_parser.parse_methods(ty);
    }
    let diet_body = diet_parse.unit.to_display_string();

    let options = ParserOptions {
        statements_recovery: true,
        ..ParserOptions::default()
    };
    let mut recovery_parser = Parser::new(source, options);
    let mut recovery_parse = recovery_parser.diet_parse();
    for ty in &mut recovery_parse.unit.types {
        recovery_parser.parse_methods(ty);
    }
    let diet_body_recovery = recovery_parse.unit.to_display_string();

    let full = parse_java(source).display();

    let mut completion_parser = Parser::with_assist(
        source,
        ParserOptions::default(),
        AssistMode::Complete { cursor: u32::MAX },
    );
    let completion_diet = completion_parser.diet_parse().unit.to_display_string();

    Views {
        diet,
        diet_body,
        diet_body_recovery,
        full,
        completion_diet,
    }
}

/// Every distinct line of `smaller` must occur at least as often in
/// `larger`: recovery only adds reconstructed statements, it never removes
/// ones the plain pass already captured.
fn assert_line_subset(smaller: &str, larger: &str) {
    for line in smaller.lines() {
        let in_smaller = smaller.lines().filter(|l| *l == line).count();
        let in_larger = larger.lines().filter(|l| *l == line).count();
        assert!(
            in_larger >= in_smaller,
            "line {line:?} occurs {in_larger} < {in_smaller} times"
        );
    }
}

#[test]
fn modified_orphan_promotes_to_field_of_the_enclosing_type() {
    let source = "public class X {\n  void foo() {\n    System.out.println();\n\n  public int x;\n}\n";
    let v = views(source);
    assert_eq!(
        v.diet,
        "public class X {\n  public int x;\n  public X() {\n  }\n  void foo() {\n  }\n}\n"
    );
    assert_eq!(
        v.diet_body,
        "public class X {\n  public int x;\n  public X() {\n    super();\n  }\n  void foo() {\n    System.out.println();\n  }\n}\n"
    );
    // Structural recovery fired, so the full parse keeps the diet shape.
    assert_eq!(v.full, v.diet);
    assert_eq!(v.completion_diet, v.diet);
    assert_line_subset(&v.diet_body, &v.diet_body_recovery);
}

#[test]
fn unmodified_orphan_stays_a_local_of_the_nearest_method() {
    let source =
        "public class X {\n  void foo() {\n    bar();\n  int x;\n  void baz() {\n  }\n}\n";
    let v = views(source);
    // No field `x` in the structural view.
    assert_eq!(
        v.diet,
        "public class X {\n  public X() {\n  }\n  void foo() {\n  }\n  void baz() {\n  }\n}\n"
    );
    assert_eq!(
        v.diet_body,
        "public class X {\n  public X() {\n    super();\n  }\n  void foo() {\n    bar();\n    int x;\n  }\n  void baz() {\n  }\n}\n"
    );
    assert_eq!(v.full, v.diet);
}

#[test]
fn every_closing_brace_missing_still_nests_by_header_depth() {
    let source = "public class X {\n  void foo() {\n  int a;\n  public int b;\n  void bar() {\n}\n";
    let v = views(source);
    assert_eq!(
        v.diet,
        "public class X {\n  public int b;\n  public X() {\n  }\n  void foo() {\n  }\n  void bar() {\n  }\n}\n"
    );
    assert_eq!(
        v.diet_body,
        "public class X {\n  public int b;\n  public X() {\n    super();\n  }\n  void foo() {\n    int a;\n  }\n  void bar() {\n  }\n}\n"
    );
    assert_eq!(v.full, v.diet);
}

#[test]
fn nesting_stress_caps_recovered_depth_without_overflowing() {
    let source: String = (0..300).map(|i| format!("class AClass{i} {{ ")).collect();
    let mut parser = Parser::new(&source, ParserOptions::default());
    let parse = parser.diet_parse();
    assert!(parse.recovered);
    assert_eq!(parse.unit.types.len(), 1);
    let display = parse.unit.to_display_string();
    let deep_header = format!("{}class AClass255 {{\n", "  ".repeat(255));
    assert!(display.contains(&deep_header));
    assert!(!display.contains("AClass256"));
    // Every surviving type got its synthesized constructor.
    assert_eq!(display.matches("AClass7() {").count(), 1);
}

#[test]
fn unterminated_type_parameter_bound_is_dropped_keeping_the_parameter() {
    let v = views("public class X <A extends, B> {\n}\n");
    assert_eq!(v.diet, "public class X<A, B> {\n  public X() {\n  }\n}\n");
    assert_eq!(v.full, v.diet);
}

#[test]
fn parameter_with_unterminated_nested_bound_is_dropped_whole() {
    let v = views("public class X <A, B extends Z< {\n}\n");
    assert_eq!(v.diet, "public class X<A> {\n  public X() {\n  }\n}\n");
    assert_eq!(v.full, v.diet);
}

#[test]
fn missing_superclass_drops_the_extends_clause() {
    let v = views("public class X extends {\n}\n");
    assert_eq!(v.diet, "public class X {\n  public X() {\n  }\n}\n");
}

#[test]
fn trailing_identifiers_after_a_valid_superclass_are_dropped_silently() {
    let v = views("class X extends Y Z {\n}\n");
    assert_eq!(v.diet, "class X extends Y {\n  X() {\n  }\n}\n");
}

#[test]
fn statement_recovery_rebuilds_placeholders() {
    let source = "public class X {\n  void foo() {\n    a =\n    if (\n    for (\n  }\n}\n";
    let v = views(source);
    // Without statements recovery the malformed first statement leaves the
    // body empty.
    assert_eq!(
        v.diet_body,
        "public class X {\n  public X() {\n    super();\n  }\n  void foo() {\n  }\n}\n"
    );
    assert_eq!(
        v.diet_body_recovery,
        "public class X {\n  public X() {\n    super();\n  }\n  void foo() {\n    a = $missing$;\n    if ($missing$)\n      for (;;) ;\n  }\n}\n"
    );
    assert_line_subset(&v.diet_body, &v.diet_body_recovery);
}

#[test]
fn dangling_name_recovers_as_missing_assignment() {
    let source = "public class X {\n  void foo() {\n    name\n  }\n}\n";
    let v = views(source);
    assert!(v.diet_body_recovery.contains("    name = $missing$;\n"));
    assert!(!v.diet_body.contains("name"));
}

#[test]
fn local_type_is_absent_from_diet_but_reconstructed_under_recovery() {
    let source = "public class X {\n  void foo() {\n    class Local {\n    public int x;\n}\n";
    let v = views(source);
    assert_eq!(
        v.diet,
        "public class X {\n  public X() {\n  }\n  void foo() {\n  }\n}\n"
    );
    // The plain body parse stops ahead of the suspect local type.
    assert_eq!(
        v.diet_body,
        "public class X {\n  public X() {\n    super();\n  }\n  void foo() {\n  }\n}\n"
    );
    assert_eq!(
        v.diet_body_recovery,
        "public class X {\n  public X() {\n    super();\n  }\n  void foo() {\n    class Local {\n      public int x;\n      Local() {\n        super();\n      }\n    }\n  }\n}\n"
    );
    assert_eq!(v.full, v.diet);
    assert_line_subset(&v.diet_body, &v.diet_body_recovery);
}

#[test]
fn headerless_fragments_parse_to_an_empty_unit_in_all_views() {
    let v = views("void foo() {\n  System.out.println();\n}\n");
    assert_eq!(v.diet, "");
    assert_eq!(v.diet_body, "");
    assert_eq!(v.diet_body_recovery, "");
    assert_eq!(v.full, "");
    assert_eq!(v.completion_diet, "");
}

#[test]
fn brace_closes_the_nearest_braced_frame_past_braceless_headers() {
    // `class Y` never opens a brace, so the `}` closes `X`; `Z` is a sibling
    // of `X`, not a member of `Y`.
    let source = "public class X {\n  class Y\n  int a;\n}\nclass Z {\n}\n";
    let v = views(source);
    assert_eq!(
        v.diet,
        "public class X {\n  class Y {\n    int a;\n    Y() {\n    }\n  }\n  public X() {\n  }\n}\nclass Z {\n  Z() {\n  }\n}\n"
    );
    assert_eq!(v.full, v.diet);
}

#[test]
fn stray_closing_braces_are_noise() {
    let v = views("}\nclass X {\n}\n}\n");
    assert_eq!(v.diet, "class X {\n  X() {\n  }\n}\n");
}

#[test]
fn methods_full_recovery_parses_bodies_despite_structural_recovery() {
    let source = "public class X {\n  void foo() {\n    bar();\n  public int x;\n}\n";
    let options = ParserOptions {
        methods_full_recovery: true,
        ..ParserOptions::default()
    };
    let parse = Parser::new(source, options).parse();
    assert!(parse.recovered);
    assert!(parse.display().contains("  void foo() {\n    bar();\n  }\n"));
}
