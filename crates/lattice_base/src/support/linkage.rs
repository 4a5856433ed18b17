//! Import and include supports.
//!
//! Both express their cross-source dependency as an inference action: the
//! prerequisite is the target's identity appearing in the global namespace,
//! and the mutation holds the importing module at source linkage until the
//! edge is established. An unresolvable import therefore surfaces as a
//! stuck source naming the import statement's location.

use std::sync::Arc;

use lattice_foundation::{Error, Phase, Result};
use lattice_reactor::{BuildReactor, ContextId, StatementSupport, StorageScope};

use crate::namespaces::{ModuleNamespace, PrefixNamespace, SubmoduleNamespace};
use crate::support::require_argument;

/// Support for the `import` statement.
pub struct ImportSupport;

impl StatementSupport for ImportSupport {
    fn keyword(&self) -> &'static str {
        "import"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = require_argument(reactor, ctx)?;
        let at = reactor.source_ref_of(ctx);
        let prefix_ctx = reactor.find_declared_child(ctx, "prefix").ok_or_else(|| {
            Error::malformed(format!("import of `{name}` requires a prefix substatement"), at)
        })?;
        let prefix = require_argument(reactor, prefix_ctx)?;
        let module_root = reactor.root_of(ctx);
        let source = reactor.source_of(ctx);

        reactor
            .new_inference_action(ctx, format!("import of module `{name}`"))
            .require_namespace::<ModuleNamespace>(StorageScope::Global, Arc::clone(&name))
            .mutates(module_root, Phase::SourceLinkage)
            .apply(move |reactor| {
                let module = reactor
                    .namespace_get_at::<ModuleNamespace>(StorageScope::Global, &name)
                    .ok_or_else(|| {
                        Error::internal(format!("module `{name}` vanished after resolution"))
                    })?;
                reactor.namespace_put::<PrefixNamespace>(
                    StorageScope::Source(source),
                    prefix,
                    module,
                )?;
                reactor.add_source_import(source, module.source);
                Ok(())
            });
        Ok(())
    }
}

/// Support for the `include` statement.
pub struct IncludeSupport;

impl StatementSupport for IncludeSupport {
    fn keyword(&self) -> &'static str {
        "include"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = require_argument(reactor, ctx)?;
        let module_root = reactor.root_of(ctx);
        let source = reactor.source_of(ctx);

        reactor
            .new_inference_action(ctx, format!("include of submodule `{name}`"))
            .require_namespace::<SubmoduleNamespace>(StorageScope::Global, Arc::clone(&name))
            .mutates(module_root, Phase::SourceLinkage)
            .apply(move |reactor| {
                let submodule = reactor
                    .namespace_get_at::<SubmoduleNamespace>(StorageScope::Global, &name)
                    .ok_or_else(|| {
                        Error::internal(format!("submodule `{name}` vanished after resolution"))
                    })?;
                reactor.add_source_import(source, submodule.source);
                Ok(())
            });
        Ok(())
    }
}
