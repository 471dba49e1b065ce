//! Error types for turning text into an introspection result.

use thiserror::Error;

/// Why a schema text could not be turned into an [`crate::Introspection`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text is JSON but not an introspection result.
    #[error("invalid introspection: {message}")]
    InvalidIntrospection { message: String },

    /// The text is neither JSON nor something the active parser understands.
    #[error("unable to parse schema text: {message}")]
    Syntax { message: String },

    /// The text looks like SDL and no SDL-capable parser is installed.
    #[error("SDL input is not supported by this parser, paste an introspection result instead")]
    SdlUnsupported,

    /// Parsed fine, but contains no types.
    #[error("schema contains no types")]
    EmptySchema,

    /// The declared query root is not among the types.
    #[error("query root type `{name}` is not defined in the schema")]
    MissingRootType { name: String },
}
