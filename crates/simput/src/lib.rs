//! # simput - schema-driven simulation input file parser
//!
//! Reads the nested section/keyword input format used by scientific
//! simulation packages and produces a validated, structured tree, so tooling
//! can read, edit and regenerate such files programmatically instead of via
//! text munging.
//!
//! ## The input format
//!
//! An input file is a tree of *sections* holding *keywords*, with a
//! C-preprocessor-like macro layer on top:
//!
//! ```text
//! ! comments start with '!' or '#'
//! @SET BOX 12.0
//!
//! &FORCE_EVAL
//!   &SUBSYS
//!     &CELL
//!       ABC ${BOX} ${BOX} ${BOX}
//!     &END CELL
//!     @INCLUDE "coord.inc"
//!   &END SUBSYS
//! &END FORCE_EVAL
//! ```
//!
//! - `&NAME [PARAM]` opens a section, `&END [NAME]` closes it
//! - any other non-blank line is a keyword followed by its value
//! - `@SET`, `@IF`/`@ENDIF` and `@INCLUDE` are preprocessor directives;
//!   `${NAME}`, `${NAME-default}` and `$NAME` are variable references
//!
//! Which sections and keywords are valid where, under which aliases, whether
//! they may repeat and how values are typed is not baked into the parser: it
//! comes from an externally loaded, read-only [schema::Schema].
//!
//! ## Pipeline
//!
//! Parsing is a synchronous, pull-based, three-stage pipeline with one line
//! in flight at a time:
//!
//! ```text
//! file(s) -> lineiter -> preprocessor -> parser -> value::TreeValue
//! ```
//!
//! - [lineiter::MultiFileLineIterator] flattens the stack of open files
//!   (the main input plus anything `@INCLUDE`d) into one ordered sequence of
//!   provenance-tagged lines
//! - [preprocessor::Preprocessor] expands variables, evaluates conditional
//!   blocks and splices included files; it yields resolved, directive-free
//!   lines lazily
//! - [parser::InputParser] validates each line against the schema and builds
//!   the tree
//!
//! Every error anywhere in the pipeline is fatal to the parse and carries a
//! [context::Context] pointing at the offending file, line and column span,
//! see [error]. Sessions share no state; independent parses may run on
//! separate threads.
pub mod context;
pub mod error;
pub mod keywords;
pub mod lineiter;
pub mod parser;
pub mod preprocessor;
pub mod schema;
pub mod tokenizer;
pub mod value;
