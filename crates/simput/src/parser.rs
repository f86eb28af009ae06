//! schema-driven tree parser
//!
//! Consumes resolved lines from the preprocessor and builds the output tree.
//! A `&`-prefixed line is a section directive, everything else a keyword
//! directive; both are validated against the schema.
//!
//! The parser keeps a single stack of [Frame]s. A frame holds the schema
//! position *and* the section mapping under construction, so schema position
//! and tree position can never get out of step: entering a section pushes
//! one frame, `&END` pops it and only then inserts the finished mapping into
//! its parent, which is also where a repeatable entry gets promoted into a
//! [TreeValue::Repeated] on its second occurrence.
use crate::context::{Context, LineEntry};
use crate::error::{InputError, ParserError, PreprocessorError};
use crate::keywords::parse_keyword_value;
use crate::schema::{Schema, SchemaSection};
use crate::value::TreeValue;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?P<name>[\w\-]+)\s*(?P<param>.*)$").expect("static pattern compiles")
});
static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[\w\-]+)\s*(?P<value>.*)$").expect("static pattern compiles")
});

/// Key a section parameter is stored under; no schema name can collide with
/// it since section and keyword names are at least one word character
const PARAMETER_KEY: &str = "_";

struct Frame<'s> {
    schema: &'s SchemaSection,
    tree: IndexMap<String, TreeValue>,
    /// Key (with the `+` section prefix) to insert under in the parent; None
    /// only for the root frame, which is never popped
    key: Option<String>,
    /// Where the section was opened, for unterminated-section diagnostics
    opened: Option<Context>,
}

/// One parse session; consumes a line stream via [InputParser::parse]
pub struct InputParser<'s> {
    frames: Vec<Frame<'s>>,
}

impl<'s> InputParser<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            frames: vec![Frame {
                schema: &schema.root,
                tree: IndexMap::new(),
                key: None,
                opened: None,
            }],
        }
    }

    /// Drive the pipeline to completion and return the finished tree
    ///
    /// Any error aborts the whole parse; no partial tree is returned.
    pub fn parse<I>(mut self, lines: I) -> Result<TreeValue, InputError>
    where
        I: IntoIterator<Item = Result<LineEntry, PreprocessorError>>,
    {
        for entry in lines {
            let entry = entry?;

            if entry.line.starts_with('&') {
                self.parse_section(&entry)?;
            } else {
                self.parse_keyword(&entry)?;
            }
        }

        if self.frames.len() > 1 {
            let frame = self.frames.last().expect("at least the root frame exists");
            return Err(ParserError::UnterminatedSection {
                name: frame.schema.name.clone(),
                ctx: frame.opened.clone().unwrap_or_default(),
            }
            .into());
        }

        let root = self.frames.pop().expect("only the root frame is left");
        Ok(TreeValue::Section(root.tree))
    }

    fn parse_section(&mut self, entry: &LineEntry) -> Result<(), ParserError> {
        let mut ctx = Context::from_entry(entry);

        let Some(caps) = SECTION.captures(&entry.line) else {
            return Err(ParserError::UnknownSection {
                name: entry.line.clone(),
                ctx,
            });
        };

        let name_match = caps.name("name").expect("group is not optional");
        let param_match = caps.name("param").expect("group is not optional");
        let name = name_match.as_str().to_ascii_uppercase();
        let param = param_match.as_str();

        if name == "END" {
            let param = param.trim_end();

            if self.frames.len() == 1 {
                return Err(ParserError::UnexpectedEnd { ctx });
            }

            let frame = self.frames.last().expect("depth was checked above");
            if !param.is_empty() && !frame.schema.matches(param) {
                ctx = ctx.with_cols(param_match.start(), param_match.end());
                return Err(ParserError::SectionMismatch {
                    name: param.to_string(),
                    ctx,
                });
            }

            self.pop_section();
            return Ok(());
        }

        let parent_schema = self.frames.last().expect("at least the root frame exists").schema;
        let Some(section) = parent_schema.find_section(&name) else {
            ctx = ctx.with_cols(name_match.start(), name_match.end() - 1);
            return Err(ParserError::UnknownSection { name, ctx });
        };

        let key = format!("+{}", section.name.to_ascii_uppercase());

        // a second occurrence is only allowed for repeatable sections; the
        // actual promotion happens when the finished mapping is inserted
        let parent = self.frames.last().expect("at least the root frame exists");
        if parent.tree.contains_key(&key) && !section.repeats {
            return Err(ParserError::NameRepetition { name: key, ctx });
        }

        let mut tree = IndexMap::new();
        match &section.parameter {
            Some(parameter) => {
                let value = parse_keyword_value(parameter, param, &ctx)?;
                tree.insert(PARAMETER_KEY.to_string(), TreeValue::Scalar(value));
            }
            None if param.trim().is_empty() => {}
            None => {
                ctx = ctx.with_cols(param_match.start(), param_match.end());
                return Err(ParserError::ParameterNotAllowed { ctx });
            }
        }

        tracing::trace!(section = %key, "section opened");
        self.frames.push(Frame {
            schema: section,
            tree,
            key: Some(key),
            opened: Some(ctx),
        });

        Ok(())
    }

    fn pop_section(&mut self) {
        let frame = self.frames.pop().expect("the root frame is never popped");
        let parent = self.frames.last_mut().expect("the root frame is never popped");
        let key = frame.key.expect("non-root frames have an insertion key");

        tracing::trace!(section = %key, "section closed");
        insert_or_promote(&mut parent.tree, key, TreeValue::Section(frame.tree));
    }

    fn parse_keyword(&mut self, entry: &LineEntry) -> Result<(), ParserError> {
        let mut ctx = Context::from_entry(entry);
        let schema = self.frames.last().expect("at least the root frame exists").schema;

        // a default keyword consumes the whole line, so lines that do not
        // even look like a keyword (first token starts with a non-word
        // character) still fall back to it
        let (keyword, raw) = match KEYWORD.captures(&entry.line) {
            Some(caps) => {
                let name_match = caps.name("name").expect("group is not optional");
                let name = name_match.as_str().to_ascii_uppercase();

                match schema.find_keyword(&name) {
                    Some(keyword) => {
                        let raw = caps.name("value").expect("group is not optional").as_str();
                        (keyword, raw)
                    }
                    None => match &schema.default_keyword {
                        Some(keyword) => (keyword, entry.line.as_str()),
                        None => {
                            ctx = ctx.with_cols(name_match.start(), name_match.end() - 1);
                            return Err(ParserError::UnknownKeyword { name, ctx });
                        }
                    },
                }
            }
            None => match &schema.default_keyword {
                Some(keyword) => (keyword, entry.line.as_str()),
                None => {
                    return Err(ParserError::UnknownKeyword {
                        name: entry.line.clone(),
                        ctx,
                    });
                }
            },
        };

        let value = parse_keyword_value(keyword, raw, &ctx)?;
        let key = keyword.name.to_ascii_uppercase();

        let frame = self.frames.last_mut().expect("at least the root frame exists");
        if frame.tree.contains_key(&key) && !keyword.repeats {
            return Err(ParserError::NameRepetition { name: key, ctx });
        }

        tracing::trace!(keyword = %key, "keyword inserted");
        insert_or_promote(&mut frame.tree, key, TreeValue::Scalar(value));

        Ok(())
    }
}

/// First occurrence stores the value as-is; the second wraps the prior value
/// into a [TreeValue::Repeated]; later ones append. Callers have already
/// rejected repetition of non-repeatable entries.
fn insert_or_promote(tree: &mut IndexMap<String, TreeValue>, key: String, value: TreeValue) {
    match tree.get_mut(&key) {
        None => {
            tree.insert(key, value);
        }
        Some(TreeValue::Repeated(entries)) => entries.push(value),
        Some(existing) => {
            tracing::trace!(key = %key, "promoting repeated entry to a list");
            let first = std::mem::replace(existing, TreeValue::Repeated(Vec::with_capacity(2)));
            let TreeValue::Repeated(entries) = existing else {
                unreachable!("existing was just replaced with a Repeated");
            };
            entries.push(first);
            entries.push(value);
        }
    }
}
