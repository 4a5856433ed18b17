//! The immutable schema context produced by a successful build.

use std::rc::Rc;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::declared::DeclaredStatement;
use crate::effective::EffectiveStatement;

/// One compiled source: its identity and both statement views.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleSchema {
    name: Arc<str>,
    keyword: Arc<str>,
    source: Arc<str>,
    declared: Rc<DeclaredStatement>,
    effective: Rc<EffectiveStatement>,
}

impl ModuleSchema {
    /// Creates a module schema.
    #[must_use]
    pub fn new(
        name: Arc<str>,
        keyword: Arc<str>,
        source: Arc<str>,
        declared: Rc<DeclaredStatement>,
        effective: Rc<EffectiveStatement>,
    ) -> Self {
        Self {
            name,
            keyword,
            source,
            declared,
            effective,
        }
    }

    /// Returns the module (or submodule) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the root statement keyword (`module` or `submodule` for the
    /// base bundle).
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns the name of the source document this was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the declared root statement.
    #[must_use]
    pub fn declared(&self) -> &Rc<DeclaredStatement> {
        &self.declared
    }

    /// Returns the effective root statement.
    #[must_use]
    pub fn effective(&self) -> &Rc<EffectiveStatement> {
        &self.effective
    }
}

/// The immutable output of a successful build.
///
/// Holds one [`ModuleSchema`] per source, in source registration order.
/// Consumers (validators, generators) read only through this.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchemaContext {
    modules: Vec<ModuleSchema>,
}

impl SchemaContext {
    /// Creates a schema context from compiled modules.
    #[must_use]
    pub fn new(modules: Vec<ModuleSchema>) -> Self {
        Self { modules }
    }

    /// Returns the compiled modules in source registration order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleSchema] {
        &self.modules
    }

    /// Looks up a module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleSchema> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// Returns the number of compiled modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the context holds no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
