//! error types
//!
//! One enum per pipeline stage, all fatal to the current parse. Every
//! variant carries a [Context] so the caller can render a position; the
//! stages fill it in incrementally (column spans at the raise site, file and
//! line number where the offending [crate::context::LineEntry] is known).
use crate::context::Context;
use std::path::PathBuf;
use std::sync::Arc;

/// A read failure in the line source, tagged with the active stream
#[derive(thiserror::Error, Debug)]
#[error("unable to read '{}'", fname.display())]
pub struct ReadError {
    pub source: std::io::Error,
    pub fname: Arc<PathBuf>,
    pub linenr: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum TokenizerError {
    #[error("unterminated quoted string")]
    UnterminatedQuote { ctx: Context },
}

impl TokenizerError {
    pub fn context(&self) -> &Context {
        match self {
            TokenizerError::UnterminatedQuote { ctx } => ctx,
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        match self {
            TokenizerError::UnterminatedQuote { ctx } => ctx,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PreprocessorError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String, ctx: Context },

    #[error("unterminated variable reference")]
    UnterminatedVariable { ctx: Context },

    #[error("invalid variable name '{name}'")]
    InvalidVariableName { name: String, ctx: Context },

    #[error("nested @IF are not allowed")]
    NestedConditional { ctx: Context },

    #[error("found @ENDIF without a previous @IF")]
    DanglingEndif { ctx: Context },

    #[error("garbage found after @ENDIF")]
    GarbageAfterEndif { ctx: Context },

    #[error("conditional block not closed at end of input")]
    UnclosedConditional { ctx: Context },

    #[error("@INCLUDE requires exactly one argument")]
    IncludeArgument { ctx: Context },

    #[error("unable to open include file '{}'", path.display())]
    Include {
        path: PathBuf,
        source: std::io::Error,
        ctx: Context,
    },

    #[error("unknown preprocessor directive found")]
    UnknownDirective { ctx: Context },

    #[error("unable to read input")]
    Io { source: std::io::Error, ctx: Context },

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}

impl PreprocessorError {
    pub fn context(&self) -> &Context {
        match self {
            PreprocessorError::UndefinedVariable { ctx, .. }
            | PreprocessorError::UnterminatedVariable { ctx }
            | PreprocessorError::InvalidVariableName { ctx, .. }
            | PreprocessorError::NestedConditional { ctx }
            | PreprocessorError::DanglingEndif { ctx }
            | PreprocessorError::GarbageAfterEndif { ctx }
            | PreprocessorError::UnclosedConditional { ctx }
            | PreprocessorError::IncludeArgument { ctx }
            | PreprocessorError::Include { ctx, .. }
            | PreprocessorError::UnknownDirective { ctx }
            | PreprocessorError::Io { ctx, .. } => ctx,
            PreprocessorError::Tokenizer(e) => e.context(),
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        match self {
            PreprocessorError::UndefinedVariable { ctx, .. }
            | PreprocessorError::UnterminatedVariable { ctx }
            | PreprocessorError::InvalidVariableName { ctx, .. }
            | PreprocessorError::NestedConditional { ctx }
            | PreprocessorError::DanglingEndif { ctx }
            | PreprocessorError::GarbageAfterEndif { ctx }
            | PreprocessorError::UnclosedConditional { ctx }
            | PreprocessorError::IncludeArgument { ctx }
            | PreprocessorError::Include { ctx, .. }
            | PreprocessorError::UnknownDirective { ctx }
            | PreprocessorError::Io { ctx, .. } => ctx,
            PreprocessorError::Tokenizer(e) => e.context_mut(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("invalid section '{name}'")]
    UnknownSection { name: String, ctx: Context },

    #[error("invalid keyword '{name}' and no default keyword for this section")]
    UnknownKeyword { name: String, ctx: Context },

    #[error("could not match open section with '{name}'")]
    SectionMismatch { name: String, ctx: Context },

    #[error("found &END without an open section")]
    UnexpectedEnd { ctx: Context },

    #[error("section '{name}' not closed at end of input")]
    UnterminatedSection { name: String, ctx: Context },

    #[error("'{name}' may only be given once")]
    NameRepetition { name: String, ctx: Context },

    #[error("section parameters given for non-parametrized section")]
    ParameterNotAllowed { ctx: Context },

    #[error("{reason}")]
    InvalidValue { reason: String, ctx: Context },
}

impl ParserError {
    pub fn context(&self) -> &Context {
        match self {
            ParserError::UnknownSection { ctx, .. }
            | ParserError::UnknownKeyword { ctx, .. }
            | ParserError::SectionMismatch { ctx, .. }
            | ParserError::UnexpectedEnd { ctx }
            | ParserError::UnterminatedSection { ctx, .. }
            | ParserError::NameRepetition { ctx, .. }
            | ParserError::ParameterNotAllowed { ctx }
            | ParserError::InvalidValue { ctx, .. } => ctx,
        }
    }
}

/// Umbrella error for a whole parse session
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error(transparent)]
    Preprocessor(#[from] PreprocessorError),

    #[error(transparent)]
    Parser(#[from] ParserError),
}

impl InputError {
    pub fn context(&self) -> &Context {
        match self {
            InputError::Preprocessor(e) => e.context(),
            InputError::Parser(e) => e.context(),
        }
    }
}
