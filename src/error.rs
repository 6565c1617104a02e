use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building rules or persisting rule sets.
///
/// Classification itself never fails: a misbehaving rule only loses its
/// diagnostic for the offending line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid expression {expression:?}: {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate rule id {0:?}")]
    DuplicateRuleId(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed rule file: {0}")]
    RuleFileParse(#[from] toml::de::Error),

    #[error("cannot serialize rule file: {0}")]
    RuleFileWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
