//! Module and submodule supports.
//!
//! Module identity must be visible before any cross-source linkage runs, so
//! both supports register their name in the global namespaces at
//! pre-linkage completion.

use lattice_foundation::Result;
use lattice_reactor::{BuildReactor, ContextId, StatementSupport, StorageScope};

use crate::namespaces::{ModuleNamespace, ModuleRef, SubmoduleNamespace};
use crate::support::require_argument;

/// Support for the `module` statement.
pub struct ModuleSupport;

impl StatementSupport for ModuleSupport {
    fn keyword(&self) -> &'static str {
        "module"
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = require_argument(reactor, ctx)?;
        let module = ModuleRef {
            context: ctx,
            source: reactor.source_of(ctx),
        };
        reactor.namespace_put::<ModuleNamespace>(StorageScope::Global, name, module)
    }
}

/// Support for the `submodule` statement.
pub struct SubmoduleSupport;

impl StatementSupport for SubmoduleSupport {
    fn keyword(&self) -> &'static str {
        "submodule"
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = require_argument(reactor, ctx)?;
        let submodule = ModuleRef {
            context: ctx,
            source: reactor.source_of(ctx),
        };
        reactor.namespace_put::<SubmoduleNamespace>(StorageScope::Global, name, submodule)
    }
}
