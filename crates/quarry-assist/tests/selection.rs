//! Selection parsing: wrapping the reference covering an inclusive range.

use pretty_assertions::assert_eq;

use quarry_assist::SelectionParser;
use quarry_syntax::ParserOptions;

fn parser() -> SelectionParser {
    SelectionParser::new(ParserOptions::default())
}

/// Inclusive `[start, end]` character range covering `needle`.
fn range_of(source: &str, needle: &str) -> (u32, u32) {
    let start = source.find(needle).expect("needle present");
    (start as u32, (start + needle.len() - 1) as u32)
}

#[test]
fn selecting_a_name_in_a_body_wraps_it() {
    let source = "public class X {\n  void foo() {\n    int a = value;\n  }\n}\n";
    let (start, end) = range_of(source, "value");
    let parse = parser().select(source, start, end);
    let selection = parse.selection.expect("selection node");
    assert_eq!(selection.node, "<SelectOnName:value>");
    assert_eq!(selection.enclosing_member.as_deref(), Some("foo"));
    assert_eq!(selection.replaced_range.text(source), "value");
    assert!(parse
        .unit
        .to_display_string()
        .contains("    int a = <SelectOnName:value>;\n"));
}

#[test]
fn selecting_a_superclass_reference_wraps_the_type() {
    let source = "public class X extends Base {\n}\n";
    let (start, end) = range_of(source, "Base");
    let parse = parser().select(source, start, end);
    let selection = parse.selection.expect("selection node");
    assert_eq!(selection.node, "<SelectOnType:Base>");
    assert_eq!(selection.enclosing_member.as_deref(), Some("X"));
    assert!(parse
        .unit
        .to_display_string()
        .starts_with("public class X extends <SelectOnType:Base> {\n"));
}

#[test]
fn selecting_a_member_access_name_wraps_the_member() {
    let source = "public class X {\n  void foo() {\n    this.run();\n  }\n}\n";
    let (start, end) = range_of(source, "run");
    let parse = parser().select(source, start, end);
    let selection = parse.selection.expect("selection node");
    assert_eq!(selection.node, "<SelectOnName:run>");
    assert_eq!(selection.enclosing_member.as_deref(), Some("foo"));
}

#[test]
fn selection_covering_no_reference_yields_nothing() {
    let source = "public class X {\n  void foo() {\n    int a = value;\n  }\n}\n";
    let brace = source.find('{').unwrap() as u32;
    let parse = parser().select(source, brace, brace);
    assert!(parse.selection.is_none());
}
