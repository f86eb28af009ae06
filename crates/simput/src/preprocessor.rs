//! preprocessing stage
//!
//! Pulls raw lines from the line source and yields fully resolved,
//! directive-free lines: variable references are expanded, `@IF`/`@ENDIF`
//! blocks evaluated, `@SET` executed and `@INCLUDE`d files spliced in place.
//!
//! The quirks are deliberate and legacy-compatible:
//! - `${...}` substitution does not nest; `${foo${bar}}` looks up `foo${bar`
//! - substituted text is never re-scanned for further references
//! - conditional blocks do not nest either, a second `@IF` is an error
//! - an `@IF` condition is resolved first and then classified: empty or `0`
//!   is false, `==`/`/=` compare the trimmed sides as strings, anything else
//!   is true
use crate::context::{Context, LineEntry};
use crate::error::PreprocessorError;
use crate::lineiter::MultiFileLineIterator;
use crate::tokenizer::{tokenize, COMMENT_CHARS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

static VALID_VAR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern compiles"));
static CONDITIONAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*@(?P<stmt>IF|ENDIF)\s*(?P<cond>.*)$").expect("static pattern compiles")
});
static SET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*@SET\s+(?P<var>\w+)\s+(?P<value>.+)$").expect("static pattern compiles")
});
static INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?P<complete>@INCLUDE\b\s*(?P<file>.*))$").expect("static pattern compiles")
});

#[derive(derive_new::new, Debug)]
struct Variable {
    value: String,
    ctx: Option<Context>,
}

#[derive(derive_new::new, Debug)]
struct ConditionalBlock {
    condition: bool,
    ctx: Context,
}

/// One preprocessing session over a file and everything it includes
pub struct Preprocessor {
    lines: MultiFileLineIterator,
    varstack: HashMap<String, Variable>,
    conditional: Option<ConditionalBlock>,
    base_dir: PathBuf,
    done: bool,
}

impl Preprocessor {
    pub fn new(
        reader: Box<dyn BufRead>,
        fname: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut lines = MultiFileLineIterator::new();
        lines.add_file(reader, fname);

        Self {
            lines,
            varstack: HashMap::new(),
            conditional: None,
            base_dir: base_dir.into(),
            done: false,
        }
    }

    pub fn from_path(path: &Path, base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let mut lines = MultiFileLineIterator::new();
        lines.add_path(path)?;

        Ok(Self {
            lines,
            varstack: HashMap::new(),
            conditional: None,
            base_dir: base_dir.into(),
            done: false,
        })
    }

    /// Bind a variable before preprocessing starts, as if set by `@SET`
    pub fn define(&mut self, name: &str, value: &str) {
        self.varstack.insert(
            name.to_ascii_uppercase(),
            Variable::new(value.to_string(), None),
        );
    }

    /// Expand `${NAME}`, `${NAME-default}` and `$NAME` references
    ///
    /// Two left-to-right passes, brace form first. Substituted text is not
    /// re-scanned: scanning continues after the replacement. Column spans in
    /// errors are relative to `line` as passed in; the caller shifts them
    /// when `line` is a sub-string of the physical line.
    fn resolve_variables(&self, line: &str) -> Result<String, PreprocessorError> {
        let mut line = line.to_string();

        let mut scan = 0;
        while let Some(offset) = line[scan..].find("${") {
            let var_start = scan + offset;

            let Some(offset) = line[var_start + 2..].find('}') else {
                return Err(PreprocessorError::UnterminatedVariable {
                    ctx: Context::for_line(&line).with_cols(line.len(), var_start),
                });
            };
            let var_end = var_start + 2 + offset; // position of the '}'

            let ctx = Context::for_line(&line).with_cols(var_start, var_end);
            let inner = &line[var_start + 2..var_end];

            // a '-' separates the name from a literal default value
            let (key, default) = match inner.split_once('-') {
                Some((key, default)) => (key, Some(default)),
                None => (inner, None),
            };

            if !VALID_VAR_NAME.is_match(key) {
                return Err(PreprocessorError::InvalidVariableName {
                    name: key.to_string(),
                    ctx,
                });
            }

            let value = match self.varstack.get(&key.to_ascii_uppercase()) {
                Some(variable) => variable.value.clone(),
                None => match default {
                    Some(default) => default.to_string(),
                    None => {
                        return Err(PreprocessorError::UndefinedVariable {
                            name: key.to_string(),
                            ctx,
                        })
                    }
                },
            };

            line.replace_range(var_start..=var_end, &value);
            scan = var_start + value.len();
        }

        let mut scan = 0;
        while let Some(offset) = line[scan..].find('$') {
            let var_start = scan + offset;
            let var_end = line[var_start + 1..]
                .find(char::is_whitespace)
                .map(|offset| var_start + 1 + offset)
                .unwrap_or_else(|| line.trim_end().len());

            let ctx = Context::for_line(&line).with_cols(var_start, var_end.saturating_sub(1));
            let key = &line[var_start + 1..var_end];

            if !VALID_VAR_NAME.is_match(key) {
                return Err(PreprocessorError::InvalidVariableName {
                    name: key.to_string(),
                    ctx,
                });
            }

            let Some(variable) = self.varstack.get(&key.to_ascii_uppercase()) else {
                return Err(PreprocessorError::UndefinedVariable {
                    name: key.to_string(),
                    ctx,
                });
            };

            let value = variable.value.clone();
            line.replace_range(var_start..var_end, &value);
            scan = var_start + value.len();
        }

        Ok(line)
    }

    fn handle_directive(&mut self, entry: &LineEntry) -> Result<(), PreprocessorError> {
        let line = entry.line.as_str();

        if let Some(caps) = CONDITIONAL.captures(line) {
            let stmt = caps.name("stmt").expect("group is not optional");
            let cond = caps.name("cond").expect("group is not optional");
            let condition = cond.as_str().trim();
            let mut ctx = Context::for_line(line);

            if stmt.as_str().eq_ignore_ascii_case("ENDIF") {
                if self.conditional.is_none() {
                    return Err(PreprocessorError::DanglingEndif { ctx });
                }

                // anything after @ENDIF must be a comment
                if !condition.is_empty() && !condition.starts_with(&COMMENT_CHARS[..]) {
                    ctx = ctx.with_cols(cond.start(), cond.end());
                    return Err(PreprocessorError::GarbageAfterEndif { ctx });
                }

                tracing::trace!("conditional block closed");
                self.conditional = None;
            } else {
                if let Some(block) = &self.conditional {
                    ctx.ref_line = block.ctx.line.clone();
                    return Err(PreprocessorError::NestedConditional { ctx });
                }

                let condition = self.resolve_variables(condition).map_err(|mut e| {
                    e.context_mut().shift_cols(cond.start());
                    e
                })?;

                let value = if condition.is_empty() || condition == "0" {
                    false
                } else if let Some((lhs, rhs)) = condition.split_once("==") {
                    lhs.trim() == rhs.trim()
                } else if let Some((lhs, rhs)) = condition.split_once("/=") {
                    lhs.trim() != rhs.trim()
                } else {
                    true
                };

                tracing::trace!(condition = %condition, value, "conditional block opened");
                self.conditional = Some(ConditionalBlock::new(value, ctx));
            }

            return Ok(());
        }

        // inside a false block every other directive is skipped uninterpreted
        if matches!(&self.conditional, Some(block) if !block.condition) {
            return Ok(());
        }

        if let Some(caps) = SET.captures(line) {
            let key = caps.name("var").expect("group is not optional").as_str();
            let value =
                self.resolve_variables(caps.name("value").expect("group is not optional").as_str())?;
            let ctx = Context::for_line(line);

            if !VALID_VAR_NAME.is_match(key) {
                return Err(PreprocessorError::InvalidVariableName {
                    name: key.to_string(),
                    ctx,
                });
            }

            let key = key.to_ascii_uppercase();
            if let Some(previous) = self.varstack.insert(key.clone(), Variable::new(value, Some(ctx))) {
                tracing::trace!(var = %key, previous = ?previous.ctx, "variable redefined");
            }

            return Ok(());
        }

        if let Some(caps) = INCLUDE.captures(line) {
            let complete = caps.name("complete").expect("group is not optional");
            let file = caps.name("file").expect("group is not optional");

            let mut filename = self.resolve_variables(file.as_str()).map_err(|mut e| {
                e.context_mut().shift_cols(file.start());
                e
            })?;

            if filename.starts_with(['\'', '"']) {
                // run it through the tokenizer to catch unterminated quotes
                let tokens = tokenize(&filename).map_err(|mut e| {
                    e.context_mut().shift_cols(file.start());
                    e
                })?;

                if tokens.len() != 1 {
                    return Err(PreprocessorError::IncludeArgument {
                        ctx: Context::for_line(line).with_cols(complete.start(), complete.end()),
                    });
                }

                filename = tokens.into_iter().next().expect("length was checked above");
            }

            let filename = filename.trim_matches(&['\'', '"'][..]);
            if filename.is_empty() {
                return Err(PreprocessorError::IncludeArgument {
                    ctx: Context::for_line(line).with_cols(complete.start(), complete.end()),
                });
            }

            // an absolute filename wins over the base directory
            let path = self.base_dir.join(filename);
            self.lines
                .add_path(&path)
                .map_err(|source| PreprocessorError::Include {
                    path,
                    source,
                    ctx: Context::for_line(line),
                })?;

            return Ok(());
        }

        Err(PreprocessorError::UnknownDirective {
            ctx: Context::for_line(line),
        })
    }

    fn process(&mut self, entry: &LineEntry) -> Result<Option<LineEntry>, PreprocessorError> {
        // comments and blank lines are inert everywhere
        if entry.line.is_empty() || entry.line.starts_with(&COMMENT_CHARS[..]) {
            return Ok(None);
        }

        if entry.line.starts_with('@') {
            self.handle_directive(entry)?;
            return Ok(None);
        }

        if matches!(&self.conditional, Some(block) if !block.condition) {
            return Ok(None);
        }

        let line = self.resolve_variables(&entry.line)?;
        Ok(Some(LineEntry {
            line,
            fname: entry.fname.clone(),
            linenr: entry.linenr,
        }))
    }
}

impl Iterator for Preprocessor {
    type Item = Result<LineEntry, PreprocessorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let entry = match self.lines.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(PreprocessorError::Io {
                        source: e.source,
                        ctx: Context {
                            filename: Some(e.fname.as_ref().clone()),
                            linenr: Some(e.linenr),
                            ..Default::default()
                        },
                    }));
                }
                None => {
                    self.done = true;

                    if let Some(block) = self.conditional.take() {
                        return Some(Err(PreprocessorError::UnclosedConditional {
                            ctx: Context {
                                ref_line: block.ctx.line,
                                ..Default::default()
                            },
                        }));
                    }

                    return None;
                }
            };

            match self.process(&entry) {
                Ok(None) => continue,
                Ok(Some(resolved)) => return Some(Ok(resolved)),
                Err(mut e) => {
                    self.done = true;
                    e.context_mut().attach(&entry);
                    return Some(Err(e));
                }
            }
        }
    }
}
