use indexmap::IndexMap;

use crate::ast::*;
use crate::error::CompileError;
use crate::token::Token;

/// JSON formatting style.
#[derive(Clone, Copy)]
pub enum JsonStyle {
    /// Compact: no whitespace between tokens.
    Compact,
    /// Pretty: 2-space indented, one entry per line.
    Pretty,
}

struct JsonWriter {
    buf: String,
    style: JsonStyle,
    depth: usize,
}

impl JsonWriter {
    fn new(style: JsonStyle) -> Self {
        JsonWriter {
            buf: String::new(),
            style,
            depth: 0,
        }
    }

    fn is_pretty(&self) -> bool {
        matches!(self.style, JsonStyle::Pretty)
    }

    fn newline(&mut self) {
        if self.is_pretty() {
            self.buf.push('\n');
            for _ in 0..self.depth {
                self.buf.push_str("  ");
            }
        }
    }

    fn space(&mut self) {
        if self.is_pretty() {
            self.buf.push(' ');
        }
    }

    fn begin_object(&mut self) {
        self.buf.push('{');
        self.depth += 1;
    }

    fn end_object(&mut self, empty: bool) {
        self.depth -= 1;
        if !empty {
            self.newline();
        }
        self.buf.push('}');
    }

    fn write_root(&mut self, root: &Root) {
        self.begin_object();
        let mut first = true;

        self.entry_sep(&mut first);
        self.write_key("kind");
        self.write_string_value("root");

        if let Some(ref value) = root.value {
            self.entry_sep(&mut first);
            self.write_key("value");
            self.write_string_value(value);
        }

        self.entry_sep(&mut first);
        self.write_key("meta");
        self.write_string_map(root.meta.iter());

        self.entry_sep(&mut first);
        self.write_key("configurations");
        self.write_string_map(root.configurations.iter());

        self.entry_sep(&mut first);
        self.write_key("references");
        self.write_references(&root.references);

        self.entry_sep(&mut first);
        self.write_key("body");
        self.write_nodes(&root.body);

        self.end_object(false);
    }

    fn write_node(&mut self, node: &Node) {
        match node {
            Node::Tag(tag) => self.write_tag(tag),
            Node::Literal(literal) => {
                self.begin_object();
                let mut first = true;
                self.entry_sep(&mut first);
                self.write_key("kind");
                self.write_string_value("literal");
                self.entry_sep(&mut first);
                self.write_key("value");
                self.write_string_value(&literal.value);
                self.end_object(false);
            }
            Node::SpecialTag(special) => {
                self.begin_object();
                let mut first = true;
                self.entry_sep(&mut first);
                self.write_key("kind");
                self.write_string_value("special-tag");
                self.entry_sep(&mut first);
                self.write_key("value");
                self.write_string_value(&special.value);
                self.entry_sep(&mut first);
                self.write_key("targetElement");
                self.write_string_value(&special.target_element);
                self.end_object(false);
            }
        }
    }

    fn write_tag(&mut self, tag: &Tag) {
        self.begin_object();
        let mut first = true;

        self.entry_sep(&mut first);
        self.write_key("kind");
        self.write_string_value("tag");

        self.entry_sep(&mut first);
        self.write_key("value");
        self.write_string_value(&tag.value);

        self.entry_sep(&mut first);
        self.write_key("targetElement");
        self.write_string_value(&tag.target_element);

        // Empty collections are left out to keep dumps readable.
        if !tag.css_classes.is_empty() {
            self.entry_sep(&mut first);
            self.write_key("cssClasses");
            self.write_string_array(&tag.css_classes);
        }
        if !tag.parameters.is_empty() {
            self.entry_sep(&mut first);
            self.write_key("parameters");
            self.write_string_map(tag.parameters.iter());
        }
        if !tag.html_attributes.is_empty() {
            self.entry_sep(&mut first);
            self.write_key("htmlAttributes");
            self.write_string_map(tag.html_attributes.iter());
        }

        self.entry_sep(&mut first);
        self.write_key("children");
        self.write_nodes(&tag.children);

        self.end_object(false);
    }

    fn write_nodes(&mut self, nodes: &[Node]) {
        self.buf.push('[');
        self.depth += 1;

        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.newline();
            self.write_node(node);
        }

        self.depth -= 1;
        if !nodes.is_empty() {
            self.newline();
        }
        self.buf.push(']');
    }

    fn write_references(&mut self, references: &IndexMap<String, Vec<String>>) {
        self.begin_object();
        let mut first = true;
        for (key, values) in references {
            self.entry_sep(&mut first);
            self.write_key(key);
            self.write_string_array(values);
        }
        self.end_object(first);
    }

    fn write_string_map<'a>(&mut self, entries: impl Iterator<Item = (&'a String, &'a String)>) {
        self.begin_object();
        let mut first = true;
        for (key, value) in entries {
            self.entry_sep(&mut first);
            self.write_key(key);
            self.write_string_value(value);
        }
        self.end_object(first);
    }

    fn write_string_array(&mut self, arr: &[String]) {
        self.buf.push('[');
        for (i, s) in arr.iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
                self.space();
            }
            self.write_string_value(s);
        }
        self.buf.push(']');
    }

    fn write_token(&mut self, token: &Token) {
        // One token per line even in pretty mode.
        self.buf.push_str("{\"kind\":");
        self.write_string_value(token.kind.name());
        self.buf.push_str(",\"text\":");
        self.write_string_value(&token.text);
        write!(
            &mut self.buf,
            ",\"line\":{},\"column\":{}}}",
            token.line, token.column
        )
        .unwrap();
    }

    fn entry_sep(&mut self, first: &mut bool) {
        if *first {
            *first = false;
        } else {
            self.buf.push(',');
        }
        self.newline();
    }

    fn write_key(&mut self, key: &str) {
        self.write_string_value(key);
        self.buf.push(':');
        self.space();
    }

    fn write_string_value(&mut self, s: &str) {
        self.buf.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                '\u{0008}' => self.buf.push_str("\\b"),
                '\u{000C}' => self.buf.push_str("\\f"),
                c if c < '\u{0020}' => {
                    write!(&mut self.buf, "\\u{:04x}", c as u32).unwrap();
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }
}

use std::fmt::Write;

/// Serialize a document tree to a compact JSON string (no whitespace).
pub fn root_to_json(root: &Root) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.write_root(root);
    w.buf
}

/// Serialize a document tree to a pretty-printed JSON string (2-space indent).
pub fn root_to_json_pretty(root: &Root) -> String {
    let mut w = JsonWriter::new(JsonStyle::Pretty);
    w.write_root(root);
    w.buf
}

/// Serialize a token list to a JSON array, one token object per entry.
pub fn tokens_to_json(tokens: &[Token], style: JsonStyle) -> String {
    let mut w = JsonWriter::new(style);
    w.buf.push('[');
    w.depth += 1;
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            w.buf.push(',');
        }
        w.newline();
        w.write_token(token);
    }
    w.depth -= 1;
    if !tokens.is_empty() {
        w.newline();
    }
    w.buf.push(']');
    w.buf
}

/// Serialize a compile error to a JSON object.
pub fn error_to_json(err: &CompileError) -> String {
    let mut w = JsonWriter::new(JsonStyle::Compact);
    w.buf.push('{');
    w.write_key("code");
    w.write_string_value(err.kind().code());
    w.buf.push(',');
    w.write_key("message");
    w.write_string_value(err.message());
    if let Some(pos) = err.position() {
        write!(
            &mut w.buf,
            ",\"line\":{},\"column\":{}",
            pos.line, pos.column
        )
        .unwrap();
    }
    w.buf.push('}');
    w.buf
}
