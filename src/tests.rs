use std::time::Duration;

use crate::ast::*;
use crate::codegen::{self, CodegenOptions, Target};
use crate::compiler::{format_duration, Compiler, COMPILER_VERSION, LANGUAGE_NAME};
use crate::error::{CompileError, ErrorKind, Position};
use crate::json::{self, JsonStyle};

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const COMPILE_FIXTURES: &str = include_str!("../test-data/fixtures/compile.json");
const ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/errors.json");

fn compile(source: &str) -> Root {
    let mut compiler = Compiler::new();
    compiler.compile(source).unwrap().clone()
}

fn compile_err(source: &str) -> CompileError {
    crate::compile_to_html(source).unwrap_err()
}

/// Follow child indexes from the first top-level node.
fn tag_path<'a>(root: &'a Root, path: &[usize]) -> &'a Tag {
    let (first, rest) = path.split_first().unwrap();
    let mut tag = root.body[*first].as_tag().unwrap();
    for &index in rest {
        tag = tag.children[index].as_tag().unwrap();
    }
    tag
}

fn child_values(tag: &Tag) -> Vec<&str> {
    tag.children
        .iter()
        .map(|node| match node {
            Node::Tag(tag) => tag.value.as_str(),
            Node::SpecialTag(special) => special.value.as_str(),
            Node::Literal(literal) => literal.value.as_str(),
        })
        .collect()
}

#[test]
fn test_fixture_compile() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(COMPILE_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let expected = fixture["html"].as_str().unwrap();

        match crate::compile_to_html(input) {
            Ok(html) => assert_eq!(html, expected, "Fixture '{}': HTML mismatch", name),
            Err(err) => panic!("Fixture '{}': unexpected error: {}", name, err),
        }
    }
}

#[test]
fn test_fixture_errors() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(ERROR_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let kind = fixture["kind"].as_str().unwrap();

        match crate::compile_to_html(input) {
            Ok(html) => panic!("Fixture '{}': expected {} but got {:?}", name, kind, html),
            Err(err) => assert_eq!(
                err.kind().code(),
                kind,
                "Fixture '{}': wrong error: {}",
                name,
                err
            ),
        }
    }
}

// ── Tree shape ──────────────────────────────────────────────────────

#[test]
fn test_nesting_follows_brackets() {
    let root = compile("Page [\n  Text: \"Hello\"\n]");
    assert_eq!(root.body.len(), 1);

    let wrapper = tag_path(&root, &[0]);
    assert_eq!(wrapper.value, PAGE_WRAPPER);
    assert_eq!(child_values(wrapper), vec!["Page"]);

    let page = tag_path(&root, &[0, 0]);
    assert_eq!(child_values(page), vec!["Text"]);

    let text = tag_path(&root, &[0, 0, 0]);
    assert_eq!(child_values(text), vec![LINE]);

    let line = tag_path(&root, &[0, 0, 0, 0]);
    assert_eq!(line.children, vec![Node::Literal(Literal::new("Hello"))]);
}

#[test]
fn test_shorthand_returns_to_enclosing_component() {
    let root = compile("Page [\n  Title: \"Intro\"\n  \"body\"\n]");
    let page = tag_path(&root, &[0, 0]);
    assert_eq!(child_values(page), vec!["Title", LINE]);
}

#[test]
fn test_deep_nesting() {
    let src = "Page [\n  Section [\n    List [ \"a\" ]\n    Box(k: \"v\") [ \"b\" ]\n  ]\n]";
    let html = crate::compile_to_html(src).unwrap();
    assert_eq!(
        html,
        "<div class=\"ns-PageWrapper\"><div class=\"ns-Page\"><section class=\"ns-Section\">\
         <ul class=\"ns-List\"><li class=\"ns-ListItem\">a</li></ul>\
         <div class=\"ns-Box ns-Box-K-V\"><div class=\"ns-Line\">b</div></div>\
         </section></div></div>"
    );
}

#[test]
fn test_page_break_between_top_level_constructs() {
    let root = compile("Page [ \"a\" ]\nPage [ \"b\" ]\nPage [ \"c\" ]");
    let values: Vec<&str> = root
        .body
        .iter()
        .map(|node| node.as_tag().unwrap().value.as_str())
        .collect();
    assert_eq!(
        values,
        vec![PAGE_WRAPPER, PAGE_BREAK, PAGE_WRAPPER, PAGE_BREAK, PAGE_WRAPPER]
    );
    assert!(tag_path(&root, &[1]).children.is_empty());
}

#[test]
fn test_declarations_do_not_break_pages() {
    let root = compile("@Configure size: \"A4\"\nPage [ ]");
    assert_eq!(root.body.len(), 1);
}

#[test]
fn test_list_literals_become_items() {
    let root = compile("List [\n  \"one\"\n  \"two\"\n]");
    let list = tag_path(&root, &[0, 0]);
    assert_eq!(list.target_element, "ul");
    assert_eq!(child_values(list), vec![LIST_ITEM, LIST_ITEM]);
    assert_eq!(tag_path(&root, &[0, 0, 1]).target_element, "li");
}

#[test]
fn test_list_context_is_direct_parent_only() {
    let root = compile("List [\n  Text [ \"x\" ]\n]");
    let text = tag_path(&root, &[0, 0, 0]);
    assert_eq!(child_values(text), vec![LINE]);
}

#[test]
fn test_classes_and_parameters() {
    let root = compile("Page.cover.dark(title: \"Home\", size: $large) [ ]");
    let page = tag_path(&root, &[0, 0]);
    assert_eq!(page.css_classes, vec!["cover", "dark"]);
    assert_eq!(page.parameters.get("title").map(String::as_str), Some("Home"));
    assert_eq!(page.parameters.get("size").map(String::as_str), Some("large"));
    assert!(page.children.is_empty());
}

#[test]
fn test_dangling_dot_does_not_claim_later_identifier() {
    let root = compile("Page. [ Box(size: \"a4\") [ ] ]");
    assert!(tag_path(&root, &[0, 0]).css_classes.is_empty());

    let inner = tag_path(&root, &[0, 0, 0]);
    assert!(inner.css_classes.is_empty());
    assert_eq!(inner.parameters.get("size").map(String::as_str), Some("a4"));
    assert!(inner.children.is_empty());
}

#[test]
fn test_decorators_become_special_tags() {
    let root = compile("Page [\n  /:::/\n  /-/\n]");
    let page = tag_path(&root, &[0, 0]);
    assert_eq!(
        page.children,
        vec![
            Node::SpecialTag(SpecialTag::line_break()),
            Node::SpecialTag(SpecialTag::horizontal_rule()),
        ]
    );
}

// ── Declarations ────────────────────────────────────────────────────

#[test]
fn test_configure_last_write_wins() {
    let root = compile("@Configure size: \"A4\"\n@Configure size: \"A5\"\n@Configure margin: \"2cm\"\nPage [ ]");
    let entries: Vec<(&str, &str)> = root
        .configurations
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(entries, vec![("size", "A5"), ("margin", "2cm")]);
}

#[test]
fn test_reference_values_are_deduplicated() {
    let src = "@Reference css: \"a.css\"\n@Reference css: \"b.css\"\n@Reference css: \"a.css\"\nPage [ ]";
    let root = compile(src);
    assert_eq!(root.references["css"], vec!["a.css", "b.css"]);
}

#[test]
fn test_declaration_topic_is_case_insensitive() {
    let root = compile("@configure size: \"A4\"\n@REFERENCE Font: \"serif\"\nPage [ ]");
    assert_eq!(root.configurations["size"], "A4");
    assert_eq!(root.references["Font"], vec!["serif"]);
}

#[test]
fn test_unknown_declaration_is_ignored() {
    let root = compile("@Import lib: \"x\"\nPage [ ]");
    assert!(root.configurations.is_empty());
    assert!(root.references.is_empty());
}

// ── Errors ──────────────────────────────────────────────────────────

#[test]
fn test_error_unknown_character() {
    let err = compile_err("Page [ % ]");
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.position(), Some(Position::new(1, 8)));
    assert_eq!(err.to_string(), "1:8: Unexpected character '%' (lexical-error)");
}

#[test]
fn test_error_unterminated_string_points_at_quote() {
    let err = compile_err("Page [\n  \"open ]");
    assert_eq!(err.kind(), ErrorKind::Lexical);
    assert_eq!(err.message(), "Unterminated string");
    assert_eq!(err.position(), Some(Position::new(2, 3)));
}

#[test]
fn test_error_interleaved_brackets() {
    let err = compile_err("Page [ List ( ]");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), "Unmatched ']'");
    assert_eq!(err.position(), Some(Position::new(1, 15)));
}

#[test]
fn test_error_unclosed_bracket() {
    let err = compile_err("Page [\n  Box(a: \"b\" [ \"x\" ]\n]");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.message(), "Unmatched ']'");

    let err = compile_err("Page [\n  \"x\"");
    assert_eq!(err.message(), "Missing closing square bracket");
    assert_eq!(err.position(), Some(Position::new(1, 6)));

    let err = compile_err("Page [ ] Box(a: \"b\"");
    assert_eq!(err.message(), "Missing closing round bracket");
}

#[test]
fn test_error_literal_without_component() {
    let err = compile_err("Page [ ]\n\"late\"");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.position(), Some(Position::new(2, 1)));
}

#[test]
fn test_error_unknown_decorator() {
    let err = compile_err("Page [ /=/ ]");
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.position(), Some(Position::new(1, 8)));
}

#[test]
fn test_error_empty_source() {
    assert_eq!(compile_err("").kind(), ErrorKind::Input);
    assert_eq!(compile_err(" \r\n\t").kind(), ErrorKind::Input);
}

#[test]
fn test_error_json() {
    let err = compile_err("Page [ % ]");
    let value: serde_json::Value = serde_json::from_str(&json::error_to_json(&err)).unwrap();
    assert_eq!(value["code"], "lexical-error");
    assert_eq!(value["line"], 1);
    assert_eq!(value["column"], 8);

    let err = CompileError::codegen("Unsupported generation target 'pdf'");
    let value: serde_json::Value = serde_json::from_str(&json::error_to_json(&err)).unwrap();
    assert_eq!(value["code"], "codegen-error");
    assert!(value.get("line").is_none());
}

// ── Compiler ────────────────────────────────────────────────────────

#[test]
fn test_compile_is_idempotent() {
    let src = "@Reference css: \"a.css\"\nPage.cover(title: \"Home\") [\n  List [ \"x\" ]\n]";
    let mut compiler = Compiler::new();
    let first = compiler.compile(src).unwrap().clone();
    let first_html = compiler.generate("html").unwrap();
    let second = compiler.compile(src).unwrap().clone();
    let second_html = compiler.generate("html").unwrap();
    assert_eq!(first, second);
    assert_eq!(first_html, second_html);
}

#[test]
fn test_compile_stamps_meta() {
    let root = compile("Page [ ]");
    assert_eq!(root.value.as_deref(), Some("Program"));
    assert_eq!(root.meta["languageName"], LANGUAGE_NAME);
    assert_eq!(root.meta["languageCompilerVersion"], COMPILER_VERSION);
}

#[test]
fn test_compiler_keeps_last_run() {
    let mut compiler = Compiler::new();
    compiler.compile("Page [\n  Text: \"Hi\"\n]").unwrap();
    assert_eq!(compiler.source(), Some("Page [\n  Text: \"Hi\"\n]"));
    assert_eq!(compiler.token_count(), 6);
    assert_eq!(compiler.line_count(), 3);
    assert_eq!(compiler.stream().map(<[char]>::len), Some(21));

    compiler.compile("Title: \"x\"").unwrap();
    assert_eq!(compiler.token_count(), 3);
    assert_eq!(compiler.line_count(), 1);

    assert!(compiler.compile("Page [ % ]").is_err());
    assert!(compiler.ast().is_none());
    assert!(compiler.tokens().is_none());
    assert_eq!(compiler.token_count(), 0);
}

#[test]
fn test_compiler_stage_order() {
    let mut compiler = Compiler::new();
    assert_eq!(compiler.check().unwrap_err().kind(), ErrorKind::Input);
    assert_eq!(compiler.generate("html").unwrap_err().kind(), ErrorKind::CodeGen);

    compiler.compile("Page [ \"x\"").unwrap();
    assert_eq!(compiler.check().unwrap_err().kind(), ErrorKind::Syntax);
    // Generation does not depend on the check.
    assert!(compiler.generate("html").is_ok());
}

#[test]
fn test_compiler_metrics() {
    let mut compiler = Compiler::new();
    compiler.compile("Page [ ]").unwrap();
    assert!(compiler.metrics().compilation.is_some());
    assert!(compiler.metrics().code_generation.is_none());

    compiler.generate("HTML").unwrap();
    assert!(compiler.metrics().code_generation.is_some());
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_micros(145_234)), "145.234ms");
    assert_eq!(format_duration(Duration::from_millis(1523)), "1.523s");
}

// ── Code generation ─────────────────────────────────────────────────

#[test]
fn test_unsupported_target() {
    let mut compiler = Compiler::new();
    compiler.compile("Page [ ]").unwrap();

    let err = compiler.generate("pdf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CodeGen);
    assert_eq!(err.message(), "Unsupported generation target 'pdf'");
    assert_eq!(compiler.generate("").unwrap_err().kind(), ErrorKind::CodeGen);

    assert_eq!("Html".parse::<Target>().unwrap(), Target::Html);
}

#[test]
fn test_class_prefix_option() {
    let mut compiler = Compiler::with_options(CodegenOptions {
        class_prefix: "doc-".to_string(),
    });
    compiler.compile("Page(size: \"a4\") [ ]").unwrap();
    assert_eq!(
        compiler.generate("html").unwrap(),
        "<div class=\"doc-PageWrapper\"><div class=\"doc-Page doc-Page-SIZE-A4\"></div></div>"
    );
}

#[test]
fn test_html_attributes_follow_class() {
    let mut tag = Tag::new("Image");
    tag.html_attributes.insert("src".to_string(), "a.png".to_string());
    tag.html_attributes.insert("alt".to_string(), "A".to_string());
    let mut root = Root::new();
    root.body.push(Node::Tag(tag));

    assert_eq!(
        codegen::generate_html(&root),
        "<div class=\"ns-Image\" src=\"a.png\" alt=\"A\"></div>"
    );
}

#[test]
fn test_empty_body_generates_nothing() {
    assert_eq!(codegen::generate_html(&Root::new()), "");
}

// ── JSON dumps ──────────────────────────────────────────────────────

#[test]
fn test_json_root() {
    let root = compile("@Reference css: \"a.css\"\nPage.cover(title: \"Home\") [\n  \"Hi \\there\"\n]");
    let value: serde_json::Value = serde_json::from_str(&json::root_to_json(&root)).unwrap();

    assert_eq!(value["kind"], "root");
    assert_eq!(value["value"], "Program");
    assert_eq!(value["meta"]["languageName"], LANGUAGE_NAME);
    assert_eq!(value["references"]["css"][0], "a.css");

    let page = &value["body"][0]["children"][0];
    assert_eq!(page["kind"], "tag");
    assert_eq!(page["targetElement"], "div");
    assert_eq!(page["cssClasses"][0], "cover");
    assert_eq!(page["parameters"]["title"], "Home");
    assert!(page.get("htmlAttributes").is_none());

    let literal = &page["children"][0]["children"][0];
    assert_eq!(literal["kind"], "literal");
    assert_eq!(literal["value"], "Hi \\there");
}

#[test]
fn test_json_pretty_matches_compact() {
    let root = compile("Page [\n  \"a\"\n  /::/\n]");
    let compact: serde_json::Value = serde_json::from_str(&json::root_to_json(&root)).unwrap();
    let pretty_text = json::root_to_json_pretty(&root);
    let pretty: serde_json::Value = serde_json::from_str(&pretty_text).unwrap();
    assert_eq!(compact, pretty);
    assert!(pretty_text.contains("\n  \"kind\": \"root\""));
    assert_eq!(pretty["body"][0]["children"][0]["children"][1]["kind"], "special-tag");
}

#[test]
fn test_json_tokens() {
    let mut compiler = Compiler::new();
    compiler.compile("Page [\n  Text: \"Hi\"\n]").unwrap();
    let tokens = compiler.tokens().unwrap();

    for style in [JsonStyle::Compact, JsonStyle::Pretty] {
        let value: serde_json::Value =
            serde_json::from_str(&json::tokens_to_json(tokens, style)).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), tokens.len());
        assert_eq!(array[4]["kind"], "String");
        assert_eq!(array[4]["text"], "Hi");
        assert_eq!(array[4]["line"], 2);
        assert_eq!(array[4]["column"], 9);
    }
}
