//! Source location tracking.
//!
//! [`SourceRef`] names the position of a statement in its source document
//! for error reporting and diagnostics. Every statement context and every
//! error carries one.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reference to a position in a source document.
///
/// The source name is shared (`Arc<str>`), so cloning a reference is cheap
/// no matter how many statements point into the same document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceRef {
    /// Name of the source document (e.g. a file name).
    pub source: Arc<str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceRef {
    /// Creates a new source reference.
    #[must_use]
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// Creates a reference to an unknown position (line and column zero).
    ///
    /// Used for synthesized statements that have no textual origin.
    #[must_use]
    pub fn unknown(source: impl Into<Arc<str>>) -> Self {
        Self::new(source, 0, 0)
    }

    /// Returns a reference into the same source at a different position.
    #[must_use]
    pub fn at(&self, line: u32, column: u32) -> Self {
        Self {
            source: Arc::clone(&self.source),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}
