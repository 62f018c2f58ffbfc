use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum TermError {
    /// The construct has no representation in the supported SMT-LIB dialect.
    #[error(
        "The construct `{construct}` is not supported by the set/tuple dialect. No approximation is emitted for it."
    )]
    UnsupportedConstruct { construct: String },

    /// A constructor received arguments that violate its structural invariants.
    #[error("Malformed argument passed to `{constructor}`: {reason}.")]
    MalformedArgument {
        constructor: &'static str,
        reason: String,
    },

    /// The text handed to the reader is not a well-formed model or script.
    #[error("Failed to parse solver output:\n{}", errors.join("\n"))]
    Parse { errors: Vec<String> },
}

impl TermError {
    pub(crate) fn malformed(constructor: &'static str, reason: impl Into<String>) -> Self {
        TermError::MalformedArgument {
            constructor,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        TermError::UnsupportedConstruct {
            construct: construct.into(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        TermError::Parse {
            errors: vec![message.into()],
        }
    }
}

pub type TermResult<T> = Result<T, TermError>;
