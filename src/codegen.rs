//! Lowering of the document tree to HTML.
//!
//! Text is written exactly as it appears in the source; nothing is escaped.
//! Callers that inject the output into a live document own its safety.

use std::fmt::Write;
use std::str::FromStr;

use crate::ast::{Node, Root, SpecialTag, Tag};
use crate::error::CompileError;

/// Output languages the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Html,
}

impl FromStr for Target {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("html") {
            Ok(Target::Html)
        } else if s.is_empty() {
            Err(CompileError::codegen("No generation target given"))
        } else {
            Err(CompileError::codegen(format!(
                "Unsupported generation target '{}'",
                s
            )))
        }
    }
}

/// Knobs for the generated markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Prefix of every synthetic class, e.g. `ns-Page`.
    pub class_prefix: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            class_prefix: "ns-".to_string(),
        }
    }
}

/// Generate HTML with the default options.
pub fn generate_html(root: &Root) -> String {
    generate_html_with(root, &CodegenOptions::default())
}

pub fn generate_html_with(root: &Root, options: &CodegenOptions) -> String {
    let mut w = HtmlWriter {
        buf: String::new(),
        prefix: &options.class_prefix,
    };
    for node in &root.body {
        w.write_node(node);
    }
    w.buf.trim().to_string()
}

/// Generate code for a target named by string.
pub fn generate(root: &Root, target: &str, options: &CodegenOptions) -> Result<String, CompileError> {
    match target.parse::<Target>()? {
        Target::Html => Ok(generate_html_with(root, options)),
    }
}

struct HtmlWriter<'a> {
    buf: String,
    prefix: &'a str,
}

impl HtmlWriter<'_> {
    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Tag(tag) => self.write_tag(tag),
            Node::SpecialTag(special) => self.write_special(special),
            Node::Literal(literal) => self.buf.push_str(&literal.value),
        }
    }

    fn write_tag(&mut self, tag: &Tag) {
        write!(
            &mut self.buf,
            "<{} class=\"{}{}",
            tag.target_element, self.prefix, tag.value
        )
        .unwrap();
        for class in &tag.css_classes {
            self.buf.push(' ');
            self.buf.push_str(class);
        }
        for (key, value) in &tag.parameters {
            write!(
                &mut self.buf,
                " {}{}-{}-{}",
                self.prefix,
                tag.value,
                key.to_uppercase(),
                value.to_uppercase()
            )
            .unwrap();
        }
        self.buf.push('"');
        for (name, value) in &tag.html_attributes {
            write!(&mut self.buf, " {}=\"{}\"", name, value).unwrap();
        }
        self.buf.push('>');

        for child in &tag.children {
            self.write_node(child);
        }

        write!(&mut self.buf, "</{}>", tag.target_element).unwrap();
    }

    fn write_special(&mut self, special: &SpecialTag) {
        write!(
            &mut self.buf,
            "<{} class=\"{}{}\"/>",
            special.target_element, self.prefix, special.value
        )
        .unwrap();
    }
}
