//! The effective (semantics-level) statement view.
//!
//! Effective statements are what a statement means after inference has run:
//! the declared substatements plus anything synthesized by augmentation or
//! other inference actions. A statement that was synthesized rather than
//! written has no declared counterpart.

use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::SourceRef;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::declared::DeclaredStatement;

/// One statement in the effective model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EffectiveStatement {
    keyword: Arc<str>,
    argument: Option<Arc<str>>,
    source_ref: SourceRef,
    declared: Option<Rc<DeclaredStatement>>,
    substatements: Vec<Rc<EffectiveStatement>>,
}

impl EffectiveStatement {
    /// Creates an effective statement.
    #[must_use]
    pub fn new(
        keyword: Arc<str>,
        argument: Option<Arc<str>>,
        source_ref: SourceRef,
        declared: Option<Rc<DeclaredStatement>>,
        substatements: Vec<Rc<EffectiveStatement>>,
    ) -> Self {
        Self {
            keyword,
            argument,
            source_ref,
            declared,
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

    /// Returns the location this statement originated from.
    ///
    /// For inferred statements this is the location of the statement the
    /// inference copied from (e.g. inside an augment body).
    #[must_use]
    pub fn source_ref(&self) -> &SourceRef {
        &self.source_ref
    }

    /// Returns the declared statement this arose from, or `None` if it was
    /// synthesized by inference.
    #[must_use]
    pub fn declared(&self) -> Option<&Rc<DeclaredStatement>> {
        self.declared.as_ref()
    }

    /// Returns true if this statement was synthesized by inference rather
    /// than written in the source.
    #[must_use]
    pub fn is_inferred(&self) -> bool {
        self.declared.is_none()
    }

    /// Returns the effective substatements: everything declared plus
    /// everything inferred, declared first.
    #[must_use]
    pub fn substatements(&self) -> &[Rc<EffectiveStatement>] {
        &self.substatements
    }

    /// Returns the first effective substatement with the given keyword.
    #[must_use]
    pub fn find_first(&self, keyword: &str) -> Option<&Rc<EffectiveStatement>> {
        self.substatements.iter().find(|s| s.keyword() == keyword)
    }

    /// Iterates all effective substatements with the given keyword.
    pub fn find_all<'a>(
        &'a self,
        keyword: &'a str,
    ) -> impl Iterator<Item = &'a Rc<EffectiveStatement>> {
        self.substatements
            .iter()
            .filter(move |s| s.keyword() == keyword)
    }
}
