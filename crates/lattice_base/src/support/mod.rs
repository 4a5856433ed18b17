//! The base statement supports and their bundle assembly.

use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::{Error, Phase, Result};
use lattice_reactor::{BuildReactor, ContextId, ReactorBuilder};

use crate::namespaces::ModuleSourceNamespace;

mod augment;
mod data;
mod linkage;
mod module;
mod plain;

pub use augment::{AugmentSupport, parse_target_path};
pub use data::{DataNodeSupport, data_node_path, is_data_keyword};
pub use linkage::{ImportSupport, IncludeSupport};
pub use module::{ModuleSupport, SubmoduleSupport};
pub use plain::PlainSupport;

/// Fetches a context's argument, reporting a malformed statement if absent.
pub(crate) fn require_argument(reactor: &BuildReactor, ctx: ContextId) -> Result<Arc<str>> {
    reactor.argument_of(ctx).ok_or_else(|| {
        Error::malformed(
            format!("statement `{}` is missing its argument", reactor.keyword_of(ctx)),
            reactor.source_ref_of(ctx),
        )
    })
}

/// Registers the base bundles with a reactor builder.
///
/// The pre-linkage bundle recognizes module identity and linkage statements;
/// the linkage bundle adds metadata; the statement-definition bundle adds
/// the data-node tree and augments. Later bundles extend earlier ones.
///
/// # Errors
/// Returns an error if any keyword is already registered.
pub fn register_base_bundles(builder: &mut ReactorBuilder) -> Result<()> {
    builder.add_support(Phase::SourcePreLinkage, Rc::new(ModuleSupport))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(SubmoduleSupport))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(PlainSupport::new("namespace", true)))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(PlainSupport::new("prefix", true)))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(PlainSupport::new("belongs-to", true)))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(ImportSupport))?;
    builder.add_support(Phase::SourcePreLinkage, Rc::new(IncludeSupport))?;

    builder.add_support(Phase::SourceLinkage, Rc::new(PlainSupport::new("revision", true)))?;
    builder.add_support(Phase::SourceLinkage, Rc::new(PlainSupport::new("description", true)))?;
    builder.add_support(Phase::SourceLinkage, Rc::new(PlainSupport::new("reference", true)))?;

    builder.add_support(Phase::StatementDefinition, Rc::new(DataNodeSupport::container()))?;
    builder.add_support(Phase::StatementDefinition, Rc::new(DataNodeSupport::list()))?;
    builder.add_support(Phase::StatementDefinition, Rc::new(DataNodeSupport::leaf()))?;
    builder.add_support(Phase::StatementDefinition, Rc::new(PlainSupport::new("type", true)))?;
    builder.add_support(Phase::StatementDefinition, Rc::new(PlainSupport::new("config", true)))?;
    builder.add_support(Phase::StatementDefinition, Rc::new(AugmentSupport))?;

    builder.register_derived::<ModuleSourceNamespace>();
    Ok(())
}
