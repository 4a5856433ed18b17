//! Build namespaces used by the base statement bundle.
//!
//! Module identity is global; prefixes and schema-node paths are
//! source-local, so cross-source reads go through the reactor's
//! imported-source indirection.

use std::fmt;
use std::sync::Arc;

use lattice_reactor::{ContextId, DerivedNamespace, ModelNamespace, SourceId, StorageKind};

// =============================================================================
// ModuleRef
// =============================================================================

/// A resolved module: its root context and owning source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModuleRef {
    /// The module's root statement context.
    pub context: ContextId,
    /// The source the module was declared in.
    pub source: SourceId,
}

// =============================================================================
// Module Identity
// =============================================================================

/// Global namespace: module name to resolved module.
pub struct ModuleNamespace;

impl ModelNamespace for ModuleNamespace {
    type Key = Arc<str>;
    type Value = ModuleRef;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "module";
}

/// Global namespace: submodule name to resolved submodule.
pub struct SubmoduleNamespace;

impl ModelNamespace for SubmoduleNamespace {
    type Key = Arc<str>;
    type Value = ModuleRef;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "submodule";
}

/// Derived global view: module name to owning source.
///
/// Recomputed from [`ModuleNamespace`] on every module registration; never
/// written directly.
pub struct ModuleSourceNamespace;

impl ModelNamespace for ModuleSourceNamespace {
    type Key = Arc<str>;
    type Value = SourceId;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "module-source";
}

impl DerivedNamespace for ModuleSourceNamespace {
    type Base = ModuleNamespace;

    fn derive(key: &Arc<str>, value: &ModuleRef) -> Option<(Arc<str>, SourceId)> {
        Some((Arc::clone(key), value.source))
    }
}

// =============================================================================
// Prefixes
// =============================================================================

/// Source-local namespace: import prefix to the imported module.
pub struct PrefixNamespace;

impl ModelNamespace for PrefixNamespace {
    type Key = Arc<str>;
    type Value = ModuleRef;
    const KIND: StorageKind = StorageKind::Source;
    const NAME: &'static str = "prefix";
}

// =============================================================================
// Schema Node Paths
// =============================================================================

/// The descendant path of a data node from its module root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<Arc<str>>,
}

impl NodePath {
    /// Creates a path from its segments.
    #[must_use]
    pub fn new(segments: Vec<Arc<str>>) -> Self {
        Self { segments }
    }

    /// Creates a path from string segments.
    #[must_use]
    pub fn of(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| Arc::from(*s)).collect(),
        }
    }

    /// Returns the path segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Source-local namespace: descendant path to the data node's context.
pub struct SchemaNodeNamespace;

impl ModelNamespace for SchemaNodeNamespace {
    type Key = NodePath;
    type Value = ContextId;
    const KIND: StorageKind = StorageKind::Source;
    const NAME: &'static str = "schema-node";
}

// =============================================================================
// Tests
// =============================================================================
