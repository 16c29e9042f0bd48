use crate::error::Position;

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    BracketRoundOpen,
    BracketRoundClose,
    BracketSquareOpen,
    BracketSquareClose,
    Colon,
    Comma,
    /// Lower-case word: class name, parameter name or declaration key.
    Identifier,
    /// Upper-case word naming a component.
    Keyword,
    /// `$name`
    Constant,
    /// `@Directive`
    Declaration,
    /// `/.../`
    Decorator,
    Dot,
    Integer,
    /// `"..."`, no escape processing.
    String,
}

impl TokenKind {
    /// The source text of single-character punctuation, `None` for buffered kinds.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            TokenKind::BracketRoundOpen => Some("("),
            TokenKind::BracketRoundClose => Some(")"),
            TokenKind::BracketSquareOpen => Some("["),
            TokenKind::BracketSquareClose => Some("]"),
            TokenKind::Colon => Some(":"),
            TokenKind::Comma => Some(","),
            TokenKind::Dot => Some("."),
            TokenKind::Identifier
            | TokenKind::Keyword
            | TokenKind::Constant
            | TokenKind::Declaration
            | TokenKind::Decorator
            | TokenKind::Integer
            | TokenKind::String => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenKind::BracketRoundOpen => "BracketRoundOpen",
            TokenKind::BracketRoundClose => "BracketRoundClose",
            TokenKind::BracketSquareOpen => "BracketSquareOpen",
            TokenKind::BracketSquareClose => "BracketSquareClose",
            TokenKind::Colon => "Colon",
            TokenKind::Comma => "Comma",
            TokenKind::Identifier => "Identifier",
            TokenKind::Keyword => "Keyword",
            TokenKind::Constant => "Constant",
            TokenKind::Declaration => "Declaration",
            TokenKind::Decorator => "Decorator",
            TokenKind::Dot => "Dot",
            TokenKind::Integer => "Integer",
            TokenKind::String => "String",
        }
    }
}

/// A token with the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}
