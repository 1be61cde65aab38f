use thiserror::Error;

/// Alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a template can produce.
///
/// Compilation either yields a fully valid tree or `Error::Syntax`; no
/// partial tree is ever handed out. At render time only two things are
/// fatal: a filter function failing, and the nesting depth bound. Missing
/// data never errors: unresolvable paths and type-mismatched operators
/// degrade to null (see the crate docs on evaluation misses).
#[derive(Debug, Error)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A registered filter function returned an error while running.
    /// An *unregistered* filter name is not an error; it passes the
    /// value through untouched.
    #[error("filter '{name}' failed: {message}")]
    Filter { name: String, message: String },

    /// Nested `for`/`if` blocks exceeded the configured recursion bound.
    #[error("template nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },
}

/// Compile-time failures. These abort compilation; the offending tag or
/// expression text is carried so callers can point at the template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    #[error("malformed for tag '{0}', expected 'for <name> in <expr>'")]
    MalformedFor(String),

    #[error("malformed {kind} tag '{text}'")]
    MalformedIf { kind: &'static str, text: String },

    /// `endfor`/`endif`/`else`/`elif` seen where no matching block is open.
    #[error("unexpected '{0}'")]
    UnexpectedTag(&'static str),

    #[error("duplicate 'else' in if block")]
    DuplicateElse,

    /// End of template reached with a block still open; names the
    /// innermost open block kind.
    #[error("unclosed '{0}' block at end of template")]
    Unclosed(&'static str),

    #[error("invalid expression '{text}': {reason}")]
    Expr { text: String, reason: String },
}

impl SyntaxError {
    pub(crate) fn expr(text: impl Into<String>, reason: impl Into<String>) -> Self {
        SyntaxError::Expr {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
