//! Data-node supports: `container`, `list`, and `leaf`.
//!
//! Each data node registers its descendant path in the source-local schema
//! tree when the full statement tree is available, making it addressable by
//! augments (cross-source through the imported-namespace indirection).

use lattice_foundation::Result;
use lattice_reactor::{BuildReactor, ContextId, StatementSupport, StorageScope};

use crate::namespaces::{NodePath, SchemaNodeNamespace};

/// Returns true for keywords that form the data-node tree.
#[must_use]
pub fn is_data_keyword(keyword: &str) -> bool {
    matches!(keyword, "container" | "list" | "leaf")
}

/// Support for one data-node statement kind.
pub struct DataNodeSupport {
    keyword: &'static str,
}

impl DataNodeSupport {
    /// Support for the `container` statement.
    #[must_use]
    pub const fn container() -> Self {
        Self {
            keyword: "container",
        }
    }

    /// Support for the `list` statement.
    #[must_use]
    pub const fn list() -> Self {
        Self { keyword: "list" }
    }

    /// Support for the `leaf` statement.
    #[must_use]
    pub const fn leaf() -> Self {
        Self { keyword: "leaf" }
    }
}

impl StatementSupport for DataNodeSupport {
    fn keyword(&self) -> &'static str {
        self.keyword
    }

    fn on_statement_definition_declared(
        &self,
        reactor: &mut BuildReactor,
        ctx: ContextId,
    ) -> Result<()> {
        let Some(path) = data_node_path(reactor, ctx) else {
            return Ok(());
        };
        let source = reactor.source_of(ctx);
        reactor.namespace_put::<SchemaNodeNamespace>(StorageScope::Source(source), path, ctx)
    }
}

/// Computes the descendant path of a data node from its module root, or
/// `None` when the node is not addressable there (e.g. inside an augment
/// body, whose nodes materialize under the target instead).
#[must_use]
pub fn data_node_path(reactor: &BuildReactor, ctx: ContextId) -> Option<NodePath> {
    let mut names = vec![reactor.argument_of(ctx)?];
    let mut current = ctx;
    loop {
        let parent = reactor.parent_of(current)?;
        if reactor.parent_of(parent).is_none() {
            break;
        }
        if !is_data_keyword(reactor.keyword_of(parent)) {
            return None;
        }
        names.push(reactor.argument_of(parent)?);
        current = parent;
    }
    names.reverse();
    Some(NodePath::new(names))
}
