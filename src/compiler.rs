use std::time::{Duration, Instant};

use crate::ast::Root;
use crate::checker;
use crate::codegen::{self, CodegenOptions};
use crate::error::CompileError;
use crate::lexer;
use crate::parser;
use crate::preprocess::preprocess;
use crate::token::Token;

pub const LANGUAGE_NAME: &str = "Notescript";
pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Elapsed time of the last compile and the last code generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub compilation: Option<Duration>,
    pub code_generation: Option<Duration>,
}

/// `145.234ms` under a second, `1.523s` above.
pub fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{:.3}ms", ms)
    } else {
        format!("{:.3}s", ms / 1000.0)
    }
}

/// Runs the pipeline and keeps the artifacts of the last run for
/// inspection. Each call to [`Compiler::compile`] discards everything the
/// previous call produced.
#[derive(Debug, Default)]
pub struct Compiler {
    source: Option<String>,
    stream: Option<Vec<char>>,
    tokens: Option<Vec<Token>>,
    line_count: usize,
    ast: Option<Root>,
    metrics: Metrics,
    options: CodegenOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodegenOptions) -> Self {
        Compiler {
            options,
            ..Self::default()
        }
    }

    /// Preprocess, lex and parse `source`, stamping the document metadata.
    pub fn compile(&mut self, source: &str) -> Result<&Root, CompileError> {
        self.reset();
        if source.is_empty() {
            return Err(CompileError::input("source is empty"));
        }

        let started = Instant::now();
        self.source = Some(source.to_string());

        let stream = preprocess(source)?;
        let lexed = lexer::lex(&stream)?;
        self.stream = Some(stream);
        self.line_count = lexed.line_count;

        let mut root = parser::parse(&lexed.tokens)?;
        self.tokens = Some(lexed.tokens);

        root.value = Some("Program".to_string());
        root.meta
            .insert("languageName".to_string(), LANGUAGE_NAME.to_string());
        root.meta.insert(
            "languageCompilerVersion".to_string(),
            COMPILER_VERSION.to_string(),
        );

        let elapsed = started.elapsed();
        self.metrics.compilation = Some(elapsed);
        tracing::debug!(elapsed = %format_duration(elapsed), "compilation finished");

        Ok(self.ast.insert(root))
    }

    /// Run the bracket-balance check over the last run's tokens.
    pub fn check(&self) -> Result<(), CompileError> {
        let tokens = self
            .tokens
            .as_deref()
            .ok_or_else(|| CompileError::input("no tokens; compile a source first"))?;
        checker::check(tokens)
    }

    /// Generate code for `target` from the last run's tree.
    pub fn generate(&mut self, target: &str) -> Result<String, CompileError> {
        let ast = self
            .ast
            .as_ref()
            .ok_or_else(|| CompileError::codegen("no AST; compile a source first"))?;
        let started = Instant::now();
        let code = codegen::generate(ast, target, &self.options)?;
        let elapsed = started.elapsed();
        self.metrics.code_generation = Some(elapsed);
        tracing::debug!(lang = target, elapsed = %format_duration(elapsed), "code generation finished");
        Ok(code)
    }

    fn reset(&mut self) {
        self.source = None;
        self.stream = None;
        self.tokens = None;
        self.line_count = 0;
        self.ast = None;
        self.metrics = Metrics::default();
    }

    // ── Last compilation ────────────────────────────────────────────

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn stream(&self) -> Option<&[char]> {
        self.stream.as_deref()
    }

    pub fn tokens(&self) -> Option<&[Token]> {
        self.tokens.as_deref()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.as_ref().map_or(0, Vec::len)
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn ast(&self) -> Option<&Root> {
        self.ast.as_ref()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }
}
