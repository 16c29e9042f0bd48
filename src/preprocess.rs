use crate::error::CompileError;

/// Normalize raw source into the character stream the lexer scans:
/// outer whitespace trimmed, carriage returns removed.
pub fn preprocess(raw: &str) -> Result<Vec<char>, CompileError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CompileError::input("source is empty"));
    }
    Ok(trimmed.chars().filter(|&ch| ch != '\r').collect())
}
