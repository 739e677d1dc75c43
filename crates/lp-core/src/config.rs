//! Parse options for descriptor loading.

/// Configuration for `parse_plan` and `Plan::reload`.
///
/// Defaults match the engine's historical, lenient reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject data lines with fewer than twelve fields instead of reading the
    /// missing ones as `0`. Default: **false**.
    ///
    /// Existing animations may rely on short lines filling with zeros, so this
    /// is opt-in.
    pub strict_arity: bool,
}

impl ParseOptions {
    /// Options with every structural check enabled.
    pub fn strict() -> Self {
        Self { strict_arity: true }
    }
}
