//! source provenance
//!
//! Every line that flows through the pipeline carries its origin
//! ([LineEntry]), and every raised error carries a [Context] so the user can
//! be pointed at the offending file, line and column span. The reference
//! column/line fields cross-reference a related token, for example the
//! opening `@IF` when a nested `@IF` is found.
use std::path::PathBuf;
use std::sync::Arc;

/// One logical line plus where it came from
#[derive(Debug, Clone)]
pub struct LineEntry {
    pub line: String,
    pub fname: Arc<PathBuf>,
    pub linenr: usize,
}

/// Diagnostic position attached to errors
///
/// Column numbers are byte offsets into `line`. All fields are optional;
/// whatever is known at the point where the error is raised gets filled in,
/// the rest is attached later by [Context::attach].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub filename: Option<PathBuf>,
    pub linenr: Option<usize>,
    pub line: Option<String>,
    pub colnr: Option<usize>,
    pub ref_colnr: Option<usize>,
    pub ref_line: Option<String>,
}

impl Context {
    pub fn for_line(line: &str) -> Self {
        Self {
            line: Some(line.to_string()),
            ..Default::default()
        }
    }

    pub fn from_entry(entry: &LineEntry) -> Self {
        Self {
            filename: Some(entry.fname.as_ref().clone()),
            linenr: Some(entry.linenr),
            line: Some(entry.line.clone()),
            ..Default::default()
        }
    }

    pub fn with_cols(mut self, colnr: usize, ref_colnr: usize) -> Self {
        self.colnr = Some(colnr);
        self.ref_colnr = Some(ref_colnr);
        self
    }

    /// Shift column offsets into an enclosing line's coordinate system
    ///
    /// Used when an error was raised while resolving a directive's sub-string
    /// (an `@IF` condition, an `@INCLUDE` filename): offsets must always be
    /// relative to the original unresolved line.
    pub fn shift_cols(&mut self, offset: usize) {
        if let Some(colnr) = &mut self.colnr {
            *colnr += offset;
        }
        if let Some(ref_colnr) = &mut self.ref_colnr {
            *ref_colnr += offset;
        }
    }

    /// Fill in file, line number and raw line text from the entry being processed
    pub fn attach(&mut self, entry: &LineEntry) {
        self.filename = Some(entry.fname.as_ref().clone());
        self.linenr = Some(entry.linenr);
        self.line = Some(entry.line.clone());
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "--> ")?;
        match &self.filename {
            Some(filename) => write!(f, "{}", filename.display())?,
            None => write!(f, "<input>")?,
        }
        if let Some(linenr) = self.linenr {
            write!(f, ":{linenr}")?;
        }

        if let Some(line) = &self.line {
            write!(f, "\n  | {line}")?;

            if let Some(colnr) = self.colnr {
                // expansion can leave offsets past the end of the raw line
                let end = self.ref_colnr.unwrap_or(colnr);
                let from = colnr.min(end).min(line.len());
                let to = colnr.max(end).min(line.len()).max(from);
                write!(f, "\n  | {}{}", " ".repeat(from), "^".repeat(to - from + 1))?;
            }
        }

        if let Some(ref_line) = &self.ref_line {
            write!(f, "\n  related: {ref_line}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_position_and_span() {
        let ctx = Context {
            filename: Some("test.inp".into()),
            linenr: Some(3),
            line: Some("ABC ${MISSING}".to_string()),
            colnr: Some(4),
            ref_colnr: Some(13),
            ..Default::default()
        };

        assert_eq!(
            format!("{ctx}"),
            "--> test.inp:3\n  | ABC ${MISSING}\n  |     ^^^^^^^^^^"
        );
    }

    #[test]
    fn clamps_spans_past_the_end_of_the_line() {
        let ctx = Context::for_line("X ${A} ${MISSING}").with_cols(40, 52);

        assert_eq!(
            format!("{ctx}"),
            format!("--> <input>\n  | X ${{A}} ${{MISSING}}\n  | {}^", " ".repeat(17))
        );
    }
}
