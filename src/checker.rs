use crate::error::CompileError;
use crate::token::{Token, TokenKind};

/// Verify that round and square brackets nest properly.
///
/// Both bracket shapes share one stack, so interleaving such as `( [ ) ]`
/// is rejected at the first close that does not match the innermost opener.
/// Openers still pending at the end are reported at the innermost one.
pub fn check(tokens: &[Token]) -> Result<(), CompileError> {
    let mut open: Vec<&Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::BracketRoundOpen | TokenKind::BracketSquareOpen => open.push(token),
            TokenKind::BracketRoundClose | TokenKind::BracketSquareClose => {
                let expected = match token.kind {
                    TokenKind::BracketRoundClose => TokenKind::BracketRoundOpen,
                    _ => TokenKind::BracketSquareOpen,
                };
                match open.last() {
                    Some(top) if top.kind == expected => {
                        open.pop();
                    }
                    _ => {
                        return Err(CompileError::syntax(
                            format!("Unmatched '{}'", token.text),
                            token.position(),
                        ))
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        let message = match unclosed.kind {
            TokenKind::BracketRoundOpen => "Missing closing round bracket",
            _ => "Missing closing square bracket",
        };
        return Err(CompileError::syntax(message, unclosed.position()));
    }

    tracing::debug!(tokens = tokens.len(), "brackets balanced");
    Ok(())
}
