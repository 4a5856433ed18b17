//! The declared (syntax-level) statement view.
//!
//! A [`DeclaredStatement`] is the immutable record of a statement exactly as
//! written: keyword, raw argument, location, and declared substatements. The
//! reactor constructs these once per context after full declaration
//! completes; consumers share them via `Rc`.

use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::SourceRef;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One statement as written in its source document.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeclaredStatement {
    keyword: Arc<str>,
    argument: Option<Arc<str>>,
    source_ref: SourceRef,
    substatements: Vec<Rc<DeclaredStatement>>,
}

impl DeclaredStatement {
    /// Creates a declared statement.
    #[must_use]
    pub fn new(
        keyword: Arc<str>,
        argument: Option<Arc<str>>,
        source_ref: SourceRef,
        substatements: Vec<Rc<DeclaredStatement>>,
    ) -> Self {
        Self {
            keyword,
            argument,
            source_ref,
            substatements,
        }
    }

    /// Returns the statement keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns the raw argument, if the statement has one.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Returns where the statement was declared.
    #[must_use]
    pub fn source_ref(&self) -> &SourceRef {
        &self.source_ref
    }

    /// Returns the declared substatements, in declaration order.
    #[must_use]
    pub fn substatements(&self) -> &[Rc<DeclaredStatement>] {
        &self.substatements
    }

    /// Returns the first substatement with the given keyword.
    #[must_use]
    pub fn find_first(&self, keyword: &str) -> Option<&Rc<DeclaredStatement>> {
        self.substatements.iter().find(|s| s.keyword() == keyword)
    }

    /// Iterates all substatements with the given keyword.
    pub fn find_all<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a Rc<DeclaredStatement>> {
        self.substatements
            .iter()
            .filter(move |s| s.keyword() == keyword)
    }
}
