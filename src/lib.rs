pub mod ast;
pub mod checker;
pub mod codegen;
pub mod compiler;
pub mod error;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod preprocess;
pub mod token;

pub use ast::{Literal, Node, Root, SpecialTag, Tag};
pub use codegen::{CodegenOptions, Target};
pub use compiler::{Compiler, Metrics};
pub use error::{CompileError, ErrorKind, Position};
pub use token::{Token, TokenKind};

// ── Core API ───────────────────────────────────────────────────────

/// Compile Notescript source to an HTML fragment with default options,
/// rejecting unbalanced brackets before generating.
pub fn compile_to_html(source: &str) -> Result<String, CompileError> {
    let mut compiler = Compiler::new();
    compiler.compile(source)?;
    compiler.check()?;
    compiler.generate("html")
}

#[cfg(test)]
mod tests;
