//! Character-level finite-state lexer.
//!
//! The scan is a single pass over the character stream plus one virtual
//! end-of-stream character, so a token still being buffered (or a
//! punctuation mark waiting for its follower) is flushed at the end.
//! All state logic lives in [`transition`]; [`lex`] only applies the
//! returned effects and tracks positions.

use crate::error::{CompileError, Position};
use crate::token::{Token, TokenKind};

/// Lexer states. `Start` classifies, every other state either buffers a
/// multi-character token or emits a single punctuation mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    BracketRoundOpen,
    BracketRoundClose,
    BracketSquareOpen,
    BracketSquareClose,
    Colon,
    Comma,
    Dot,
    Identifier,
    Keyword,
    Integer,
    String,
    Constant,
    Declaration,
    Decorator,
    End,
    Error,
}

/// What the driver does with the current character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing beyond the state change.
    Ignore,
    /// Append the character to the token buffer.
    Buffer,
    /// Emit a token of this kind from the buffer (or its fixed symbol).
    Emit(TokenKind),
    /// The character cannot start any token.
    Reject,
    /// The stream ended inside a delimited token of this kind.
    Unterminated(TokenKind),
}

/// Result of feeding one character to one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    pub action: Action,
    /// Re-read the same character in `next` instead of advancing.
    pub rewind: bool,
}

impl Transition {
    fn advance(next: State, action: Action) -> Self {
        Transition {
            next,
            action,
            rewind: false,
        }
    }

    fn rewind(next: State, action: Action) -> Self {
        Transition {
            next,
            action,
            rewind: true,
        }
    }
}

/// Output of a successful scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub line_count: usize,
}

/// Pure transition function. `ch` is `None` for the virtual character
/// past the end of the stream.
pub fn transition(state: State, ch: Option<char>) -> Transition {
    match state {
        State::Start => classify(ch),

        // Entered by rewind, so the bracket itself is consumed here.
        State::BracketRoundClose => Transition::advance(State::Start, Action::Emit(TokenKind::BracketRoundClose)),
        State::BracketSquareClose => Transition::advance(State::Start, Action::Emit(TokenKind::BracketSquareClose)),

        // Already consumed by `Start`; the follower is re-read.
        State::BracketRoundOpen => Transition::rewind(State::Start, Action::Emit(TokenKind::BracketRoundOpen)),
        State::BracketSquareOpen => Transition::rewind(State::Start, Action::Emit(TokenKind::BracketSquareOpen)),
        State::Colon => Transition::rewind(State::Start, Action::Emit(TokenKind::Colon)),
        State::Comma => Transition::rewind(State::Start, Action::Emit(TokenKind::Comma)),
        State::Dot => Transition::rewind(State::Start, Action::Emit(TokenKind::Dot)),

        State::Identifier => buffer_until(ch, is_word_end, State::Identifier, TokenKind::Identifier),
        State::Keyword => buffer_until(ch, is_word_end, State::Keyword, TokenKind::Keyword),
        State::Constant => buffer_until(ch, is_constant_end, State::Constant, TokenKind::Constant),

        State::Integer => match ch {
            Some(c) if c.is_ascii_digit() => Transition::advance(State::Integer, Action::Buffer),
            Some(' ') => Transition::advance(State::Start, Action::Emit(TokenKind::Integer)),
            _ => Transition::rewind(State::Start, Action::Emit(TokenKind::Integer)),
        },

        State::Declaration => match ch {
            Some(' ') => Transition::advance(State::Start, Action::Emit(TokenKind::Declaration)),
            None | Some('\t') | Some('\n') => {
                Transition::rewind(State::Start, Action::Emit(TokenKind::Declaration))
            }
            Some(_) => Transition::advance(State::Declaration, Action::Buffer),
        },

        State::Decorator => delimited(ch, '/', State::Decorator, TokenKind::Decorator),
        State::String => delimited(ch, '"', State::String, TokenKind::String),

        State::End => Transition::advance(State::End, Action::Ignore),
        State::Error => Transition::advance(State::Error, Action::Reject),
    }
}

fn classify(ch: Option<char>) -> Transition {
    let c = match ch {
        Some(c) => c,
        None => return Transition::advance(State::End, Action::Ignore),
    };
    match c {
        ' ' | '\t' | '\n' => Transition::advance(State::Start, Action::Ignore),
        ')' => Transition::rewind(State::BracketRoundClose, Action::Ignore),
        ']' => Transition::rewind(State::BracketSquareClose, Action::Ignore),
        '(' => Transition::advance(State::BracketRoundOpen, Action::Ignore),
        '[' => Transition::advance(State::BracketSquareOpen, Action::Ignore),
        ':' => Transition::advance(State::Colon, Action::Ignore),
        ',' => Transition::advance(State::Comma, Action::Ignore),
        '$' => Transition::advance(State::Constant, Action::Ignore),
        '@' => Transition::advance(State::Declaration, Action::Ignore),
        '/' => Transition::advance(State::Decorator, Action::Ignore),
        '.' => Transition::advance(State::Dot, Action::Ignore),
        c if c.is_ascii_lowercase() => Transition::rewind(State::Identifier, Action::Ignore),
        c if c.is_ascii_digit() => Transition::rewind(State::Integer, Action::Ignore),
        c if c.is_ascii_uppercase() => Transition::rewind(State::Keyword, Action::Ignore),
        '"' => Transition::advance(State::String, Action::Ignore),
        _ => Transition::advance(State::Error, Action::Reject),
    }
}

fn buffer_until(
    ch: Option<char>,
    is_end: fn(Option<char>) -> bool,
    state: State,
    kind: TokenKind,
) -> Transition {
    if is_end(ch) {
        Transition::rewind(State::Start, Action::Emit(kind))
    } else if ch.is_some_and(is_word_char) {
        Transition::advance(state, Action::Buffer)
    } else {
        Transition::advance(State::Error, Action::Reject)
    }
}

fn delimited(ch: Option<char>, close: char, state: State, kind: TokenKind) -> Transition {
    match ch {
        None => Transition::advance(State::Error, Action::Unterminated(kind)),
        Some(c) if c == close => Transition::advance(State::Start, Action::Emit(kind)),
        Some(_) => Transition::advance(state, Action::Buffer),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_word_end(ch: Option<char>) -> bool {
    matches!(
        ch,
        None | Some(' ' | '\t' | '\n' | ':' | '.' | ',' | '(' | ')' | '[' | ']')
    )
}

fn is_constant_end(ch: Option<char>) -> bool {
    matches!(ch, None | Some(' ' | '\t' | '\n' | ',' | ')' | ']'))
}

/// Scanner state carried across the loop in [`lex`].
struct Lexer {
    state: State,
    buffer: String,
    line: usize,
    column: usize,
    /// Position of the first character of the token being built.
    start: Position,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new() -> Self {
        Lexer {
            state: State::Start,
            buffer: String::new(),
            line: 1,
            column: 1,
            start: Position::new(1, 1),
            tokens: Vec::new(),
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn consume(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn emit(&mut self, kind: TokenKind) {
        let text = match kind.symbol() {
            Some(symbol) => {
                self.buffer.clear();
                symbol.to_string()
            }
            None => std::mem::take(&mut self.buffer),
        };
        tracing::trace!(kind = kind.name(), %text, at = %self.start, "token");
        self.tokens.push(Token::new(kind, text, self.start));
    }
}

/// Scan a preprocessed character stream into tokens.
pub fn lex(stream: &[char]) -> Result<Lexed, CompileError> {
    let mut lexer = Lexer::new();
    let mut index = 0;

    while index <= stream.len() {
        let ch = stream.get(index).copied();
        let step = transition(lexer.state, ch);

        if lexer.state == State::Start && step.next != State::Start {
            lexer.start = lexer.position();
        }

        match step.action {
            Action::Ignore => {}
            Action::Buffer => {
                if let Some(c) = ch {
                    lexer.buffer.push(c);
                }
            }
            Action::Emit(kind) => lexer.emit(kind),
            Action::Reject => {
                let message = match ch {
                    Some(c) => format!("Unexpected character '{}'", c.escape_debug()),
                    None => "Unexpected end of input".to_string(),
                };
                return Err(CompileError::lexical(message, lexer.position()));
            }
            Action::Unterminated(kind) => {
                let what = match kind {
                    TokenKind::Decorator => "decorator",
                    _ => "string",
                };
                return Err(CompileError::lexical(
                    format!("Unterminated {}", what),
                    lexer.start,
                ));
            }
        }

        lexer.state = step.next;
        if !step.rewind {
            if let Some(c) = ch {
                lexer.consume(c);
            }
            index += 1;
        }
    }

    let line_count = if stream.is_empty() { 0 } else { lexer.line };
    tracing::debug!(tokens = lexer.tokens.len(), lines = line_count, "lexed");

    Ok(Lexed {
        tokens: lexer.tokens,
        line_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let chars: Vec<char> = src.chars().collect();
        lex(&chars).unwrap().tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn start_rewinds_into_word_states() {
        let t = transition(State::Start, Some('p'));
        assert_eq!(t.next, State::Identifier);
        assert!(t.rewind);

        let t = transition(State::Start, Some('P'));
        assert_eq!(t.next, State::Keyword);
        assert!(t.rewind);

        let t = transition(State::Start, Some('7'));
        assert_eq!(t.next, State::Integer);
        assert!(t.rewind);
    }

    #[test]
    fn start_consumes_sigils() {
        for (ch, state) in [
            ('$', State::Constant),
            ('@', State::Declaration),
            ('/', State::Decorator),
            ('"', State::String),
            ('(', State::BracketRoundOpen),
            (':', State::Colon),
        ] {
            let t = transition(State::Start, Some(ch));
            assert_eq!(t.next, state, "for {:?}", ch);
            assert!(!t.rewind, "for {:?}", ch);
        }
    }

    #[test]
    fn closing_brackets_are_reread_then_consumed() {
        let t = transition(State::Start, Some(']'));
        assert_eq!(t, Transition::rewind(State::BracketSquareClose, Action::Ignore));
        let t = transition(State::BracketSquareClose, Some(']'));
        assert_eq!(
            t,
            Transition::advance(State::Start, Action::Emit(TokenKind::BracketSquareClose))
        );
    }

    #[test]
    fn end_of_stream() {
        assert_eq!(transition(State::Start, None).next, State::End);
        assert_eq!(
            transition(State::String, None).action,
            Action::Unterminated(TokenKind::String)
        );
        assert_eq!(
            transition(State::Keyword, None),
            Transition::rewind(State::Start, Action::Emit(TokenKind::Keyword))
        );
    }

    #[test]
    fn unknown_character_rejects() {
        assert_eq!(transition(State::Start, Some('%')).action, Action::Reject);
    }

    #[test]
    fn words_reject_stray_characters() {
        assert_eq!(
            transition(State::Keyword, Some('%')),
            Transition::advance(State::Error, Action::Reject)
        );
        assert_eq!(transition(State::Identifier, Some('"')).action, Action::Reject);
        assert_eq!(transition(State::Constant, Some(':')).action, Action::Reject);
        assert_eq!(
            transition(State::Identifier, Some('-')),
            Transition::advance(State::Identifier, Action::Buffer)
        );

        let chars: Vec<char> = "Page [\n  Text\"x\"\n]".chars().collect();
        let err = lex(&chars).unwrap_err();
        assert_eq!(err.position(), Some(Position::new(2, 7)));
    }

    #[test]
    fn integer_consumes_trailing_space_only() {
        assert_eq!(
            transition(State::Integer, Some(' ')),
            Transition::advance(State::Start, Action::Emit(TokenKind::Integer))
        );
        assert_eq!(
            transition(State::Integer, Some(')')),
            Transition::rewind(State::Start, Action::Emit(TokenKind::Integer))
        );
    }

    #[test]
    fn trailing_punctuation_is_flushed() {
        assert_eq!(
            kinds("Page ["),
            vec![TokenKind::Keyword, TokenKind::BracketSquareOpen]
        );
    }

    #[test]
    fn comma_keeps_its_follower() {
        let chars: Vec<char> = "(a: $x,b: $y)".chars().collect();
        let tokens = lex(&chars).unwrap().tokens;
        let idents: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(idents, vec!["a", "b"]);
    }

    #[test]
    fn columns_point_at_token_start() {
        let chars: Vec<char> = "Page [\n  Text: \"Hi\"\n]".chars().collect();
        let lexed = lex(&chars).unwrap();
        let positions: Vec<(TokenKind, usize, usize)> = lexed
            .tokens
            .iter()
            .map(|t| (t.kind, t.line, t.column))
            .collect();
        assert_eq!(
            positions,
            vec![
                (TokenKind::Keyword, 1, 1),
                (TokenKind::BracketSquareOpen, 1, 6),
                (TokenKind::Keyword, 2, 3),
                (TokenKind::Colon, 2, 7),
                (TokenKind::String, 2, 9),
                (TokenKind::BracketSquareClose, 3, 1),
            ]
        );
        assert_eq!(lexed.line_count, 3);
    }
}
