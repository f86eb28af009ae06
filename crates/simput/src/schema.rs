//! schema representation
//!
//! The schema is a read-only tree of section and keyword definitions loaded
//! once per session from JSON. It drives the parser: which sections and
//! keywords exist where, under which aliases, whether they may repeat, how
//! their values are typed.
//!
//! The root of a schema file is itself a section with all fields defaulted,
//! so a minimal schema is just `{"sections": [...]}`.
use serde::Deserialize;
use std::path::Path;

/// A loaded schema; [Schema::root] is the implicit top-level section
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub root: SchemaSection,
}

impl Schema {
    pub fn from_json(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, SchemaError> {
        tracing::info!(path=%path.display(), "loading schema");
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

/// A section definition: child sections and keywords, aliases, repeatability,
/// optional typed section parameter and optional default keyword
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub repeats: bool,
    #[serde(default)]
    pub keywords: Vec<SchemaKeyword>,
    /// Keyword that unmatched lines fall back to, taking the whole line as value
    #[serde(default)]
    pub default_keyword: Option<SchemaKeyword>,
    /// Type of the `&NAME PARAM` section parameter, if the section takes one
    #[serde(default)]
    pub parameter: Option<SchemaKeyword>,
    #[serde(default)]
    pub sections: Vec<SchemaSection>,
}

impl SchemaSection {
    /// Case-insensitive match against the name and all aliases
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }

    pub fn find_section(&self, name: &str) -> Option<&SchemaSection> {
        self.sections.iter().find(|section| section.matches(name))
    }

    pub fn find_keyword(&self, name: &str) -> Option<&SchemaKeyword> {
        self.keywords.iter().find(|keyword| keyword.matches(name))
    }
}

/// A keyword definition
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaKeyword {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub repeats: bool,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
    #[serde(default)]
    pub count: ValueCount,
    /// Allowed values for the `enum` data type
    #[serde(default)]
    pub choices: Vec<String>,
    /// Raw value substituted when the keyword is given without one
    #[serde(default)]
    pub default: Option<String>,
}

impl SchemaKeyword {
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Logical,
    Integer,
    Real,
    /// A single bare token, kept as written
    Word,
    /// A token validated against [SchemaKeyword::choices], stored upper-cased
    Enum,
    /// The raw remainder of the line, taken whole
    #[default]
    String,
}

/// How many items a keyword value holds: exactly `n`, or one-or-more (`"*"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCount {
    Exact(usize),
    Any,
}

impl Default for ValueCount {
    fn default() -> Self {
        ValueCount::Exact(1)
    }
}

impl<'de> Deserialize<'de> for ValueCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CountVisitor;

        impl<'de> serde::de::Visitor<'de> for CountVisitor {
            type Value = ValueCount;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a positive item count or \"*\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                if v == 0 {
                    return Err(E::custom("item count must be at least 1"));
                }
                Ok(ValueCount::Exact(v as usize))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v <= 0 {
                    return Err(E::custom("item count must be at least 1"));
                }
                Ok(ValueCount::Exact(v as usize))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "*" {
                    return Ok(ValueCount::Any);
                }
                Err(E::custom(format!("unknown item count '{v}'")))
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("unable to read schema file")]
    IoError(#[from] std::io::Error),
    #[error("unable to parse schema")]
    ParseFailed(#[from] serde_json::Error),
}
