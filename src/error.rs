use std::fmt;

/// A 1-based position in the preprocessed source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based column (character offset within the line)
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The stable category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Input,
    Lexical,
    Syntax,
    CodeGen,
}

impl ErrorKind {
    /// Machine-readable code, stable across releases.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Input => "input-error",
            ErrorKind::Lexical => "lexical-error",
            ErrorKind::Syntax => "syntax-error",
            ErrorKind::CodeGen => "codegen-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Every failure the pipeline can report. None of them are recoverable:
/// a stage that fails produces no partial output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Empty source, or a stage invoked without its predecessor's output.
    #[error("{message} ({})", ErrorKind::Input)]
    Input { message: String },

    /// A character the lexer cannot classify, or a delimited token cut off
    /// by the end of input.
    #[error("{position}: {message} ({})", ErrorKind::Lexical)]
    Lexical { message: String, position: Position },

    /// Bracket mismatch, or a construct with nothing open to attach to.
    #[error("{position}: {message} ({})", ErrorKind::Syntax)]
    Syntax { message: String, position: Position },

    /// Missing AST or unsupported generation target.
    #[error("{message} ({})", ErrorKind::CodeGen)]
    CodeGen { message: String },
}

impl CompileError {
    pub fn input(message: impl Into<String>) -> Self {
        CompileError::Input {
            message: message.into(),
        }
    }

    pub fn lexical(message: impl Into<String>, position: Position) -> Self {
        CompileError::Lexical {
            message: message.into(),
            position,
        }
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        CompileError::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        CompileError::CodeGen {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Input { .. } => ErrorKind::Input,
            CompileError::Lexical { .. } => ErrorKind::Lexical,
            CompileError::Syntax { .. } => ErrorKind::Syntax,
            CompileError::CodeGen { .. } => ErrorKind::CodeGen,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Input { message }
            | CompileError::Lexical { message, .. }
            | CompileError::Syntax { message, .. }
            | CompileError::CodeGen { message } => message,
        }
    }

    /// Source position of the offending token, when the error has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            CompileError::Lexical { position, .. } | CompileError::Syntax { position, .. } => {
                Some(*position)
            }
            CompileError::Input { .. } | CompileError::CodeGen { .. } => None,
        }
    }
}
