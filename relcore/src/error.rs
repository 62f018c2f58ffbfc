use relterm::error::TermError;
use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum LowerError {
    /// The input uses a construct the lowering has no rule for.
    #[error(
        "The construct `{construct}` cannot be lowered to the set/tuple dialect. No approximation is emitted for it."
    )]
    UnsupportedConstruct { construct: String },

    /// A variable is referenced outside of any quantifier binding it.
    #[error(
        "The variable `{name}` is referenced but not bound by any enclosing quantifier or declaration."
    )]
    Scope { name: String },

    /// The term model rejected a node built during lowering.
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("Failed to parse translator configuration '{file}': {source}")]
    Config {
        source: toml::de::Error,
        file: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LowerError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        LowerError::UnsupportedConstruct {
            construct: construct.into(),
        }
    }
}

pub type LowerResult<T> = Result<T, LowerError>;
