//! Declared-only statement support.

use lattice_reactor::StatementSupport;

/// A statement kind with no build-time behavior beyond being declared,
/// e.g. `description` or `revision`.
pub struct PlainSupport {
    keyword: &'static str,
    takes_argument: bool,
}

impl PlainSupport {
    /// Creates a declared-only support for a keyword.
    #[must_use]
    pub const fn new(keyword: &'static str, takes_argument: bool) -> Self {
        Self {
            keyword,
            takes_argument,
        }
    }
}

impl StatementSupport for PlainSupport {
    fn keyword(&self) -> &'static str {
        self.keyword
    }

    fn takes_argument(&self) -> bool {
        self.takes_argument
    }
}
