//! Common result and error types for the Tessera placer.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken internal invariant (a bug in Tessera), not a
/// problem with the user's netlist or board. User-facing failures have their
/// own error enums in the crates that detect them.
pub type TesseraResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in Tessera, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal placer error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
