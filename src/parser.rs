use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::ast::*;
use crate::error::{CompileError, Position};
use crate::token::{Token, TokenKind};

static LINE_BREAK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:+$").expect("valid line-break pattern"));
static HORIZONTAL_RULE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-+$").expect("valid horizontal-rule pattern"));

/// Index path to a tag: first into `Root::body`, then into `Tag::children`.
type NodePath = Vec<usize>;

/// The kind of construct a value token is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Keyword,
    Declaration,
}

/// Every stack the parser keeps across its single forward pass.
///
/// | token              | reads                                  | pushes / pops                                   |
/// |--------------------|----------------------------------------|-------------------------------------------------|
/// | Keyword            | `tag_stack`, `context_stack`           | push `context_stack`; sets `current`            |
/// | `[`                | `current`                              | push `tag_stack`, `bracket_square_stack`        |
/// | `]`                | `tag_stack`                            | pop `tag_stack`, `context_stack`, `bracket_square_stack`; sets `current` |
/// | `(` / `)`          |                                        | push / pop `bracket_round_stack`                |
/// | Dot                | `context_stack`                        | push `dot_stack`; any non-Identifier clears it  |
/// | Identifier         | `context_stack`, `dot_stack`, `bracket_round_stack` | pop `dot_stack`, or push `key_stack` / `declaration_stack` |
/// | Declaration        |                                        | push `declaration_stack`, `context_stack`       |
/// | Colon              |                                        | push `colon_stack`                              |
/// | String / Constant  | all of the above                       | pop `declaration_stack` ×2 + `context_stack`, or `key_stack`; pop `colon_stack` |
/// | Decorator          | `current`                              |                                                 |
/// | Comma / Integer    |                                        |                                                 |
#[derive(Debug, Default)]
struct ParserContext {
    context_stack: Vec<Context>,
    tag_stack: Vec<NodePath>,
    bracket_round_stack: Vec<Position>,
    bracket_square_stack: Vec<Position>,
    colon_stack: Vec<Position>,
    dot_stack: Vec<Position>,
    key_stack: Vec<String>,
    declaration_stack: Vec<String>,
    current: Option<NodePath>,
}

impl ParserContext {
    fn innermost(&self) -> Option<Context> {
        self.context_stack.last().copied()
    }

    fn in_parameter_list(&self) -> bool {
        self.innermost() == Some(Context::Keyword) && !self.bracket_round_stack.is_empty()
    }
}

/// Parser state: the tree under construction plus the stacks.
struct Parser {
    root: Root,
    ctx: ParserContext,
    configurations: IndexMap<String, String>,
    references: IndexMap<String, Vec<String>>,
}

/// Parse a token list into a document tree.
pub fn parse(tokens: &[Token]) -> Result<Root, CompileError> {
    let mut parser = Parser {
        root: Root::new(),
        ctx: ParserContext::default(),
        configurations: IndexMap::new(),
        references: IndexMap::new(),
    };

    for token in tokens {
        parser.parse_token(token)?;
    }

    let mut root = parser.root;
    root.configurations = parser.configurations;
    root.references = parser.references;
    tracing::debug!(nodes = root.body.len(), "parsed");
    Ok(root)
}

impl Parser {
    // ── Tree access ─────────────────────────────────────────────────

    fn tag_at(&mut self, path: &[usize]) -> Option<&mut Tag> {
        let (first, rest) = path.split_first()?;
        let mut tag = self.root.body.get_mut(*first)?.as_tag_mut()?;
        for &index in rest {
            tag = tag.children.get_mut(index)?.as_tag_mut()?;
        }
        Some(tag)
    }

    /// The open component, or a syntax error at `token` if there is none.
    fn current_tag(&mut self, token: &Token, what: &str) -> Result<&mut Tag, CompileError> {
        let path = match &self.ctx.current {
            Some(path) => path.clone(),
            None => {
                return Err(CompileError::syntax(
                    format!("{} outside of any component", what),
                    token.position(),
                ))
            }
        };
        self.tag_at(&path)
            .ok_or_else(|| CompileError::syntax("Lost track of the open component", token.position()))
    }

    // ── Dispatch ────────────────────────────────────────────────────

    fn parse_token(&mut self, token: &Token) -> Result<(), CompileError> {
        tracing::trace!(kind = token.kind.name(), text = %token.text, "parse");
        // A dot names the class only when an identifier follows it directly.
        if token.kind != TokenKind::Identifier && !self.ctx.dot_stack.is_empty() {
            tracing::trace!(at = %token.position(), "dropping dangling dot");
            self.ctx.dot_stack.clear();
        }
        match token.kind {
            TokenKind::Keyword => self.parse_keyword(token),
            TokenKind::BracketSquareOpen => self.open_square(token),
            TokenKind::BracketSquareClose => {
                self.close_square();
                Ok(())
            }
            TokenKind::BracketRoundOpen => {
                self.ctx.bracket_round_stack.push(token.position());
                Ok(())
            }
            TokenKind::BracketRoundClose => {
                self.ctx.bracket_round_stack.pop();
                Ok(())
            }
            TokenKind::Dot => {
                if self.ctx.innermost() == Some(Context::Keyword) {
                    self.ctx.dot_stack.push(token.position());
                }
                Ok(())
            }
            TokenKind::Identifier => self.parse_identifier(token),
            TokenKind::Declaration => {
                self.ctx.declaration_stack.push(token.text.clone());
                self.ctx.context_stack.push(Context::Declaration);
                Ok(())
            }
            TokenKind::Colon => {
                self.ctx.colon_stack.push(token.position());
                Ok(())
            }
            TokenKind::String | TokenKind::Constant => self.parse_value(token),
            TokenKind::Decorator => self.parse_decorator(token),
            TokenKind::Comma | TokenKind::Integer => Ok(()),
        }
    }

    // ── Components ──────────────────────────────────────────────────

    fn parse_keyword(&mut self, token: &Token) -> Result<(), CompileError> {
        // `@Reference Css: ...` names its key with an upper-case word.
        if self.ctx.innermost() == Some(Context::Declaration) {
            self.ctx.declaration_stack.push(token.text.clone());
            return Ok(());
        }

        self.ctx.context_stack.push(Context::Keyword);
        let tag = Tag::new(&token.text);

        let path = match self.ctx.tag_stack.last().cloned() {
            None => {
                if !self.root.body.is_empty() {
                    self.root.body.push(Node::Tag(Tag::page_break()));
                }
                self.root.body.push(Node::Tag(Tag::page_wrapper(tag)));
                vec![self.root.body.len() - 1, 0]
            }
            Some(mut parent_path) => {
                let parent = self.tag_at(&parent_path).ok_or_else(|| {
                    CompileError::syntax("Lost track of the enclosing component", token.position())
                })?;
                parent.children.push(Node::Tag(tag));
                parent_path.push(parent.children.len() - 1);
                parent_path
            }
        };

        self.ctx.current = Some(path);
        Ok(())
    }

    fn open_square(&mut self, token: &Token) -> Result<(), CompileError> {
        let path = self.ctx.current.clone().ok_or_else(|| {
            CompileError::syntax("'[' without a component to open", token.position())
        })?;
        self.ctx.tag_stack.push(path);
        self.ctx.bracket_square_stack.push(token.position());
        Ok(())
    }

    fn close_square(&mut self) {
        self.ctx.tag_stack.pop();
        self.ctx.current = self.ctx.tag_stack.last().cloned();
        self.ctx.context_stack.pop();
        self.ctx.bracket_square_stack.pop();
    }

    fn parse_identifier(&mut self, token: &Token) -> Result<(), CompileError> {
        match self.ctx.innermost() {
            Some(Context::Declaration) => {
                self.ctx.declaration_stack.push(token.text.clone());
            }
            Some(Context::Keyword) if !self.ctx.dot_stack.is_empty() => {
                self.current_tag(token, "Class name")?
                    .css_classes
                    .push(token.text.clone());
                self.ctx.dot_stack.pop();
            }
            Some(Context::Keyword) if !self.ctx.bracket_round_stack.is_empty() => {
                self.ctx.key_stack.push(token.text.clone());
            }
            _ => tracing::trace!(text = %token.text, "identifier outside of any construct"),
        }
        Ok(())
    }

    fn parse_decorator(&mut self, token: &Token) -> Result<(), CompileError> {
        let special = if LINE_BREAK_PATTERN.is_match(&token.text) {
            SpecialTag::line_break()
        } else if HORIZONTAL_RULE_PATTERN.is_match(&token.text) {
            SpecialTag::horizontal_rule()
        } else {
            return Err(CompileError::syntax(
                format!("Unknown decorator /{}/", token.text),
                token.position(),
            ));
        };
        self.current_tag(token, "Decorator")?
            .children
            .push(Node::SpecialTag(special));
        Ok(())
    }

    // ── Values ──────────────────────────────────────────────────────

    fn parse_value(&mut self, token: &Token) -> Result<(), CompileError> {
        if self.ctx.innermost() == Some(Context::Declaration) {
            self.parse_declaration_value(token)
        } else if self.ctx.in_parameter_list() && !self.ctx.key_stack.is_empty() {
            self.parse_parameter_value(token)
        } else {
            self.parse_literal(token)
        }
    }

    fn parse_declaration_value(&mut self, token: &Token) -> Result<(), CompileError> {
        let (key, topic) = match (
            self.ctx.declaration_stack.pop(),
            self.ctx.declaration_stack.pop(),
        ) {
            (Some(key), Some(topic)) if !key.is_empty() && !topic.is_empty() => (key, topic),
            _ => {
                return Err(CompileError::syntax(
                    "Incomplete declaration; expected @Directive key: value",
                    token.position(),
                ))
            }
        };

        let value = token.text.clone();
        match topic.to_lowercase().as_str() {
            "configure" => {
                self.configurations.insert(key, value);
            }
            "reference" => {
                let list = self.references.entry(key).or_default();
                if !list.contains(&value) {
                    list.push(value);
                }
            }
            other => tracing::warn!(topic = other, at = %token.position(), "ignoring unknown declaration"),
        }

        self.ctx.colon_stack.pop();
        self.ctx.context_stack.pop();
        Ok(())
    }

    fn parse_parameter_value(&mut self, token: &Token) -> Result<(), CompileError> {
        let key = match self.ctx.key_stack.pop() {
            Some(key) => key,
            None => return Ok(()),
        };
        self.current_tag(token, "Parameter")?
            .parameters
            .insert(key, token.text.clone());
        self.ctx.colon_stack.pop();
        Ok(())
    }

    fn parse_literal(&mut self, token: &Token) -> Result<(), CompileError> {
        let in_list = match self.ctx.tag_stack.last().cloned() {
            Some(path) => self.tag_at(&path).is_some_and(|tag| tag.value == "List"),
            None => false,
        };
        let wrapper = Tag::literal_wrapper(Literal::new(token.text.clone()), in_list);
        self.current_tag(token, "Literal")?
            .children
            .push(Node::Tag(wrapper));

        // `Tag: "text"` closes the shorthand component.
        if self.ctx.colon_stack.pop().is_some() {
            self.ctx.current = self.ctx.tag_stack.last().cloned();
        }
        Ok(())
    }
}
