//! The `augment` support.
//!
//! An augment copies its data-node substatements into another statement's
//! tree, possibly in another module. The target may not exist yet when the
//! augment is declared (and may never exist), so the copy is an inference
//! action: the prerequisite is the target path appearing in the target
//! source's schema tree, and mutations hold both the augmenting and the
//! target module at full declaration until the copy lands.
//!
//! Same-target augments coalesce into one context, so their bodies merge
//! before the copy runs.

use std::sync::Arc;

use lattice_foundation::{Error, Phase, Result, SourceRef};
use lattice_reactor::{BuildReactor, ContextId, StatementSupport, StorageScope};

use crate::namespaces::{NodePath, PrefixNamespace, SchemaNodeNamespace};
use crate::support::data::is_data_keyword;
use crate::support::require_argument;

/// Support for the `augment` statement.
pub struct AugmentSupport;

impl StatementSupport for AugmentSupport {
    fn keyword(&self) -> &'static str {
        "augment"
    }

    fn coalesces(&self) -> bool {
        true
    }

    fn on_full_definition_declared(
        &self,
        reactor: &mut BuildReactor,
        ctx: ContextId,
    ) -> Result<()> {
        let argument = require_argument(reactor, ctx)?;
        let at = reactor.source_ref_of(ctx);
        let (prefix, path) = parse_target_path(&argument, &at)?;
        let source = reactor.source_of(ctx);
        let own_root = reactor.root_of(ctx);
        let (target_source, target_root) = match prefix {
            Some(prefix) => {
                let module = reactor
                    .namespace_get::<PrefixNamespace>(ctx, &prefix)
                    .ok_or_else(|| {
                        Error::malformed(
                            format!("unknown prefix `{prefix}` in augment target `{argument}`"),
                            at,
                        )
                    })?;
                (module.source, module.context)
            }
            None => (source, own_root),
        };

        reactor
            .new_inference_action(ctx, format!("augment of `{path}`"))
            .require_namespace::<SchemaNodeNamespace>(
                StorageScope::Source(target_source),
                path.clone(),
            )
            .mutates(own_root, Phase::FullDeclaration)
            .mutates(target_root, Phase::FullDeclaration)
            .apply(move |reactor| {
                let target = reactor
                    .namespace_get_at::<SchemaNodeNamespace>(
                        StorageScope::Source(target_source),
                        &path,
                    )
                    .ok_or_else(|| {
                        Error::internal(format!("augment target `{path}` vanished after resolution"))
                    })?;
                for child in reactor.declared_children_of(ctx) {
                    if is_data_keyword(reactor.keyword_of(child)) {
                        reactor.copy_subtree_inferred(child, target);
                    }
                }
                Ok(())
            });
        Ok(())
    }
}

/// Parses an augment target path like `/if:interfaces/slot` into its
/// optional prefix and descendant path.
///
/// A prefix names the target module and may appear on any segment, but
/// every prefixed segment must agree with the first.
///
/// # Errors
/// Returns an error for an empty path, an empty segment, or conflicting
/// prefixes.
pub fn parse_target_path(argument: &str, at: &SourceRef) -> Result<(Option<Arc<str>>, NodePath)> {
    let trimmed = argument.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(Error::malformed("empty augment target path", at.clone()));
    }
    let mut prefix: Option<Arc<str>> = None;
    let mut names: Vec<Arc<str>> = Vec::new();
    for (index, segment) in trimmed.split('/').enumerate() {
        let (segment_prefix, name) = match segment.split_once(':') {
            Some((p, n)) => (Some(p), n),
            None => (None, segment),
        };
        if name.is_empty() {
            return Err(Error::malformed(
                format!("empty segment in augment target `{argument}`"),
                at.clone(),
            ));
        }
        match (index, segment_prefix) {
            (0, Some(p)) => prefix = Some(Arc::from(p)),
            (_, Some(p)) if Some(p) != prefix.as_deref() => {
                return Err(Error::malformed(
                    format!("conflicting prefix `{p}` in augment target `{argument}`"),
                    at.clone(),
                ));
            }
            _ => {}
        }
        names.push(Arc::from(name));
    }
    Ok((prefix, NodePath::new(names)))
}
