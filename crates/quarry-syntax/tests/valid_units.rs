//! Well-formed inputs: a diet parse followed by parsing every body must
//! equal a single full parse, and empty or headerless inputs stay empty in
//! every mode.

use pretty_assertions::assert_eq;

use quarry_syntax::{parse_java, parse_java_diet, AssistMode, Parser, ParserOptions};

fn diet_then_bodies(source: &str) -> String {
    let mut parser = Parser::new(source, ParserOptions::default());
    let mut parse = parser.diet_parse();
    assert!(!parse.recovered, "fixture must be well formed");
    for ty in &mut parse.unit.types {
        parser.parse_methods(ty);
    }
    parse.unit.to_display_string()
}

const WELL_FORMED: &[&str] = &[
    "class C {\n}\n",
    "package p;\nimport java.util.Map;\npublic final class C {\n  static int n = 0;\n  C() {\n    this(1);\n  }\n  C(int n) {\n  }\n}\n",
    "interface I {\n  int constant = 1;\n  void m();\n}\n",
    "enum E {\n  A(1), B(2);\n  final int v;\n  E(int v) {\n  }\n}\n",
    "class Outer {\n  class Inner {\n    void m() {\n      if (a) {\n        b();\n      } else {\n        c();\n      }\n      while (d) {\n        e++;\n      }\n      for (int i = 0; i < n; i++) {\n        f(i);\n      }\n    }\n  }\n}\n",
    "class G<T extends Comparable> {\n  java.util.List<T> items;\n  T pick(int i) {\n    return items.get(i);\n  }\n}\n",
];

#[test]
fn full_parse_equals_diet_plus_lazy_bodies() {
    for source in WELL_FORMED {
        let full = parse_java(source);
        assert!(!full.recovered, "fixture must be well formed: {source}");
        assert_eq!(full.display(), diet_then_bodies(source), "for {source}");
    }
}

#[test]
fn empty_input_is_empty_in_all_modes() {
    assert_eq!(parse_java("").display(), "");
    assert_eq!(parse_java_diet("").display(), "");
    let mut completion = Parser::with_assist(
        "",
        ParserOptions::default(),
        AssistMode::Complete { cursor: 0 },
    );
    assert_eq!(completion.diet_parse().display(), "");
    assert!(completion.take_assist().is_none());
}

#[test]
fn dangling_constructor_body_is_empty_in_all_modes() {
    let source = "{\n  super();\n}\n";
    assert_eq!(parse_java(source).display(), "");
    assert_eq!(parse_java_diet(source).display(), "");
    let mut completion = Parser::with_assist(
        source,
        ParserOptions::default(),
        AssistMode::Complete { cursor: 4 },
    );
    assert_eq!(completion.diet_parse().display(), "");
    assert!(completion.take_assist().is_none());
}

#[test]
fn lexical_errors_surface_as_parse_diagnostics() {
    let parse = parse_java("class C {\n  String s = \"open;\n}\n");
    assert!(parse
        .errors
        .iter()
        .any(|e| e.message.contains("unterminated string")));
}
