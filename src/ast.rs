//! The document tree produced by the parser.
//!
//! Every node is owned by exactly one parent; the parser refers to open
//! nodes by index path, never by a second owner.

use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Component name of the wrapper placed around every top-level construct.
pub const PAGE_WRAPPER: &str = "PageWrapper";
/// Component name of the marker inserted between top-level constructs.
pub const PAGE_BREAK: &str = "PageBreak";
/// Wrapper for a bare literal.
pub const LINE: &str = "Line";
/// Wrapper for a bare literal directly inside a `List`.
pub const LIST_ITEM: &str = "ListItem";
pub const LINE_BREAK: &str = "BR";
pub const HORIZONTAL_RULE: &str = "HR";

/// Map a component name to the element it lowers to.
pub fn target_element(component: &str) -> &'static str {
    match component {
        "Section" => "section",
        "List" => "ul",
        LIST_ITEM => "li",
        _ => "div",
    }
}

/// The document: metadata, declarations and the top-level body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub value: Option<String>,
    pub meta: BTreeMap<String, String>,
    pub body: Vec<Node>,
    /// `@Reference key: value`, deduplicated, in declaration order.
    pub references: IndexMap<String, Vec<String>>,
    /// `@Configure key: value`, last write wins.
    pub configurations: IndexMap<String, String>,
}

impl Root {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A node below the root.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Tag(Tag),
    Literal(Literal),
    SpecialTag(SpecialTag),
}

impl Node {
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Literal(_) | Node::SpecialTag(_) => None,
        }
    }

    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            Node::Literal(_) | Node::SpecialTag(_) => None,
        }
    }
}

/// A named component lowering to one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub value: String,
    pub target_element: String,
    pub css_classes: Vec<String>,
    pub parameters: IndexMap<String, String>,
    pub html_attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Tag {
    /// A tag for `component`, with its element looked up by name.
    pub fn new(component: &str) -> Self {
        Tag {
            value: component.to_string(),
            target_element: target_element(component).to_string(),
            css_classes: Vec::new(),
            parameters: IndexMap::new(),
            html_attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn page_wrapper(child: Tag) -> Self {
        let mut wrapper = Tag::new(PAGE_WRAPPER);
        wrapper.children.push(Node::Tag(child));
        wrapper
    }

    pub fn page_break() -> Self {
        Tag::new(PAGE_BREAK)
    }

    /// Wrap a literal in a `Line`, or a `ListItem` when `in_list`.
    pub fn literal_wrapper(literal: Literal, in_list: bool) -> Self {
        let mut tag = Tag::new(if in_list { LIST_ITEM } else { LINE });
        tag.children.push(Node::Literal(literal));
        tag
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: String,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
        }
    }
}

/// A shorthand symbol lowering to a self-closing element.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialTag {
    pub value: String,
    pub target_element: String,
}

impl SpecialTag {
    pub fn line_break() -> Self {
        SpecialTag {
            value: LINE_BREAK.to_string(),
            target_element: "br".to_string(),
        }
    }

    pub fn horizontal_rule() -> Self {
        SpecialTag {
            value: HORIZONTAL_RULE.to_string(),
            target_element: "hr".to_string(),
        }
    }
}
