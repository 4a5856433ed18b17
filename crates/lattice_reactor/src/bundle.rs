//! Statement supports and per-phase bundles.
//!
//! A statement support is the plugin for one statement kind: its argument
//! and coalescing policy, plus the per-phase completion hooks where it binds
//! namespaces and registers inference actions. Supports are grouped into
//! per-phase bundles; a bundle for a later phase extends the earlier ones
//! and never replaces them, so a keyword recognized in an early phase stays
//! recognized for the rest of the build.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use lattice_foundation::{Error, KindId, Phase, Result};

use crate::reactor::BuildReactor;
use crate::tree::ContextId;

/// The plugin for one statement kind.
///
/// All hooks default to no-ops; a support implements only the phases it
/// participates in. Hooks run when `end_statement` finalizes the context in
/// the corresponding phase, at most once per context per phase.
pub trait StatementSupport {
    /// The statement keyword this support handles.
    fn keyword(&self) -> &'static str;

    /// Whether the statement kind takes an argument.
    fn takes_argument(&self) -> bool {
        true
    }

    /// Whether same-identifier siblings coalesce into one context instead of
    /// declaring duplicates.
    fn coalesces(&self) -> bool {
        false
    }

    /// Called when the statement's declared section ends during
    /// source pre-linkage.
    fn on_pre_linkage_declared(
        &self,
        _reactor: &mut BuildReactor,
        _ctx: ContextId,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when the statement's declared section ends during
    /// source linkage.
    fn on_linkage_declared(&self, _reactor: &mut BuildReactor, _ctx: ContextId) -> Result<()> {
        Ok(())
    }

    /// Called when the statement's declared section ends during
    /// statement definition.
    fn on_statement_definition_declared(
        &self,
        _reactor: &mut BuildReactor,
        _ctx: ContextId,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when the statement's declared section ends during
    /// full declaration.
    fn on_full_definition_declared(
        &self,
        _reactor: &mut BuildReactor,
        _ctx: ContextId,
    ) -> Result<()> {
        Ok(())
    }
}

/// The supports recognized from one phase on.
#[derive(Default)]
pub(crate) struct PhaseBundle {
    supports: HashMap<KindId, Rc<dyn StatementSupport>>,
}

impl fmt::Debug for PhaseBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhaseBundle({} supports)", self.supports.len())
    }
}

/// All per-phase bundles of one build.
#[derive(Debug, Default)]
pub(crate) struct BundleRegistry {
    phases: BTreeMap<Phase, PhaseBundle>,
}

impl BundleRegistry {
    /// Registers a support starting at `phase`. A keyword may be registered
    /// only once across all phases: later bundles extend, never replace.
    pub(crate) fn add(
        &mut self,
        phase: Phase,
        kind: KindId,
        support: Rc<dyn StatementSupport>,
    ) -> Result<()> {
        if self.lookup_any(kind).is_some() {
            return Err(Error::internal(format!(
                "statement support `{}` registered twice",
                support.keyword()
            )));
        }
        self.phases
            .entry(phase)
            .or_default()
            .supports
            .insert(kind, support);
        Ok(())
    }

    /// Looks up the support for a kind as visible in `phase`: the union of
    /// all bundles registered at or before it.
    pub(crate) fn lookup(&self, phase: Phase, kind: KindId) -> Option<Rc<dyn StatementSupport>> {
        self.phases
            .range(..=phase)
            .find_map(|(_, bundle)| bundle.supports.get(&kind).cloned())
    }

    fn lookup_any(&self, kind: KindId) -> Option<&Rc<dyn StatementSupport>> {
        self.phases
            .values()
            .find_map(|bundle| bundle.supports.get(&kind))
    }
}
