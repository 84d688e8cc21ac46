//! Completion parsing: assist nodes, parent contexts, and replaced spans.

use pretty_assertions::assert_eq;

use quarry_assist::CompletionParser;
use quarry_syntax::ParserOptions;

fn parser() -> CompletionParser {
    CompletionParser::new(ParserOptions::default())
}

/// Cursor on the last character of `needle`, the "complete behind" model.
fn cursor_at_end(source: &str, needle: &str) -> u32 {
    (source.find(needle).expect("needle present") + needle.len() - 1) as u32
}

#[test]
fn annotation_attribute_value_completion() {
    let source = "public class X {\n  @Annot(zzz=foo)\n  int value;\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "foo"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:foo>");
    assert_eq!(assist.parent.as_deref(), Some("zzz = <CompleteOnName:foo>"));
    assert_eq!(assist.completion_identifier, "foo");
    assert_eq!(assist.replaced_range.text(source), "foo");
}

#[test]
fn annotation_array_initializer_tags_its_parent() {
    let source = "@Ann(value={ZZ})\npublic class X {\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "ZZ"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:ZZ>");
    assert_eq!(
        assist.parent.as_deref(),
        Some("<AssistNodeParentAnnotationArrayInitializer:@Ann(value)>")
    );
    // The annotation renders on its own line with modifiers kept.
    assert!(parse
        .unit
        .to_display_string()
        .starts_with("@Ann(value = {<CompleteOnName:ZZ>})\npublic class X {\n"));
}

#[test]
fn elided_attribute_name_still_tags_the_array_parent_as_value() {
    let source = "@Ann({ZZ})\npublic class X {\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "ZZ"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:ZZ>");
    assert_eq!(
        assist.parent.as_deref(),
        Some("<AssistNodeParentAnnotationArrayInitializer:@Ann(value)>")
    );
}

#[test]
fn annotation_name_completion_prints_above_the_declaration() {
    let source = "@Annot\npublic class X {\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "Annot"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "@<CompleteOnType:Annot>");
    assert_eq!(assist.replaced_range.text(source), "Annot");
    assert!(parse
        .unit
        .to_display_string()
        .starts_with("@<CompleteOnType:Annot>\nclass X {\n"));
}

#[test]
fn member_access_on_bare_this_replaces_only_the_member_name() {
    let source = "public class X {\n  void foo() {\n    this.getClass();\n  }\n}\n";
    let parse = parser().method_parse(source, cursor_at_end(source, "getClass"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnMemberAccess:this.getClass>");
    assert_eq!(assist.replaced_range.text(source), "getClass");
    assert!(parse
        .unit
        .to_display_string()
        .contains("    <CompleteOnMemberAccess:this.getClass>;\n"));
}

#[test]
fn member_access_on_other_receivers_replaces_the_receiver_span() {
    let source = "public class X {\n  void foo() {\n    bar().zzz\n  }\n}\n";
    let parse = parser().method_parse(source, cursor_at_end(source, "zzz"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnMemberAccess:bar().zzz>");
    assert_eq!(assist.replaced_range.text(source), "bar()");
}

#[test]
fn qualified_name_replaces_the_whole_name() {
    let source = "public class X {\n  void foo() {\n    System.out.pri\n  }\n}\n";
    let parse = parser().method_parse(source, cursor_at_end(source, "pri"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:System.out.pri>");
    assert_eq!(assist.completion_identifier, "pri");
    assert_eq!(assist.replaced_range.text(source), "System.out.pri");
    assert!(parse
        .unit
        .to_display_string()
        .contains("    <CompleteOnName:System.out.pri>;\n"));
}

#[test]
fn binary_expression_claims_the_parent_context() {
    let source = "public class X {\n  void foo() {\n    if (a && zzz) {\n    }\n  }\n}\n";
    let parse = parser().method_parse(source, cursor_at_end(source, "zzz"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:zzz>");
    assert_eq!(assist.parent.as_deref(), Some("(a && <CompleteOnName:zzz>)"));
}

#[test]
fn method_completion_reduces_the_body_around_the_cursor() {
    let source = "public class X {\n  void foo() {\n    int kept = init();\n    other();\n    use(zzz);\n    trailing();\n  }\n}\n";
    let parse = parser().method_parse(source, cursor_at_end(source, "zzz"));
    assert!(parse.assist.is_some());
    let display = parse.unit.to_display_string();
    assert!(display.contains("    int kept;\n"));
    assert!(display.contains("    use(<CompleteOnName:zzz>);\n"));
    assert!(!display.contains("other"));
    assert!(!display.contains("trailing"));
    assert!(!display.contains("init"));
}

#[test]
fn completion_diet_view_drops_field_initializers() {
    let source = "public class X {\n  int a = compute();\n}\n";
    let parse = parser().diet_parse(source, u32::MAX);
    assert!(parse.assist.is_none());
    assert!(parse.unit.to_display_string().contains("  int a;\n"));
}

#[test]
fn field_initializer_holding_the_assist_node_is_kept() {
    let source = "public class X {\n  int a = compute();\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "compute"));
    let assist = parse.assist.expect("assist node");
    assert_eq!(assist.node, "<CompleteOnName:compute>");
    assert!(parse
        .unit
        .to_display_string()
        .contains("  int a = <CompleteOnName:compute>;\n"));
}

#[test]
fn cursor_in_dead_space_yields_no_assist_node() {
    let source = "public class X {\n}\n";
    assert!(parser().diet_parse(source, u32::MAX).assist.is_none());
    // On the `class` keyword itself there is nothing to complete.
    let on_keyword = source.find("class").unwrap() as u32;
    assert!(parser().diet_parse(source, on_keyword).assist.is_none());
    assert!(parser().method_parse(source, u32::MAX).assist.is_none());
}

#[test]
fn declarations_after_the_cursor_are_still_structured() {
    let source = "public class X {\n  @Annot(zzz=foo)\n  int value;\n  void after() {\n  }\n}\nclass Y {\n}\n";
    let parse = parser().diet_parse(source, cursor_at_end(source, "foo"));
    assert!(parse.assist.is_some());
    let display = parse.unit.to_display_string();
    assert!(display.contains("  void after() {\n"));
    assert!(display.contains("class Y {\n"));
}
