//! Load errors for LP descriptors.

/// Reasons a descriptor buffer can fail to load into a `Plan`.
///
/// Malformed numeric fields are not errors: they read as `0`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A data line ended before all twelve fields were present.
    /// Only raised when `ParseOptions::strict_arity` is set.
    #[error("line {line}: expected {expected} fields, found {found}", expected = crate::parser::FIELD_COUNT)]
    StructuralUnderflow { line: usize, found: usize },

    /// The buffer (or its final line) is not terminated by `\n`.
    #[error("line {line}: descriptor must end with a newline")]
    MissingTerminator { line: usize },

    /// Growing the pixel array or a pixel's state array failed.
    #[error("failed to grow {what} to {requested} entries")]
    Allocation { what: &'static str, requested: usize },
}
