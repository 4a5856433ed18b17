//! The statement context arena.
//!
//! Every statement being built is one node in a single arena owned by the
//! reactor, referenced by [`ContextId`]. A node owns its substatement lists
//! (declared and inferred) and its statement-local namespace storage; parent
//! and root links are plain ids, so there is one context type for roots and
//! children alike.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::{KindId, Phase, SourceRef, StatementId};
use lattice_model::{DeclaredStatement, EffectiveStatement};

use crate::action::ActionId;
use crate::namespace::NamespaceStorage;
use crate::source::SourceId;

/// Identifies one statement context in the build.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    /// Returns the raw index of this context.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.0)
    }
}

/// Whether a statement was written in a source or synthesized by inference.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatementOrigin {
    /// The statement appears in its source document.
    Declared,
    /// The statement was synthesized by an inference action.
    Inferred,
}

/// One statement context.
///
/// Substatement ownership is exclusive: a context id appears in exactly one
/// parent's `declared` or `inferred` list. `completed_phase` is monotone for
/// the life of the build.
#[derive(Debug)]
pub(crate) struct ContextData {
    pub(crate) parent: Option<ContextId>,
    pub(crate) root: ContextId,
    pub(crate) source: SourceId,
    pub(crate) kind: KindId,
    pub(crate) argument: Option<Arc<str>>,
    pub(crate) source_ref: SourceRef,
    pub(crate) origin: StatementOrigin,
    pub(crate) completed_phase: Phase,
    /// Substatements as declared, in declaration order.
    pub(crate) declared: Vec<ContextId>,
    /// Substatements synthesized by inference, in synthesis order.
    pub(crate) inferred: Vec<ContextId>,
    /// Sibling index: identifier to the contexts declared under it, in
    /// declaration order. Drives replay reuse and coalescing.
    pub(crate) child_index: HashMap<StatementId, Vec<ContextId>>,
    /// The phase whose load pass last reconciled children of this context.
    pub(crate) replay_phase: Phase,
    /// Per-identifier occurrence counters for the current load pass.
    pub(crate) replay_counts: HashMap<StatementId, usize>,
    /// The phase whose load pass last visited this context.
    pub(crate) touched_phase: Phase,
    /// The last phase whose completion hook has fired for this context.
    pub(crate) last_hook_phase: Phase,
    /// Mutations that must apply before the given phase can complete here.
    pub(crate) pending_mutations: Vec<(Phase, ActionId)>,
    /// Actions waiting for this context to complete the given phase.
    pub(crate) phase_waiters: Vec<(Phase, ActionId)>,
    /// Statement-local namespace storage.
    pub(crate) storage: NamespaceStorage,
    /// Memoized declared view.
    pub(crate) declared_view: Option<Rc<DeclaredStatement>>,
    /// Memoized effective view.
    pub(crate) effective_view: Option<Rc<EffectiveStatement>>,
    /// True if this node was coalesced away and is no longer reachable.
    pub(crate) tombstone: bool,
}

/// Arena of all statement contexts in one build.
#[derive(Debug, Default)]
pub(crate) struct ContextArena {
    nodes: Vec<ContextData>,
}

impl ContextArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh context. The root link is inherited from the
    /// parent, or points at the new node itself for roots.
    pub(crate) fn alloc(
        &mut self,
        parent: Option<ContextId>,
        source: SourceId,
        kind: KindId,
        source_ref: SourceRef,
    ) -> ContextId {
        let id = ContextId(u32::try_from(self.nodes.len()).expect("context arena overflow"));
        let root = parent.map_or(id, |p| self.node(p).root);
        self.nodes.push(ContextData {
            parent,
            root,
            source,
            kind,
            argument: None,
            source_ref,
            origin: StatementOrigin::Declared,
            completed_phase: Phase::Init,
            declared: Vec::new(),
            inferred: Vec::new(),
            child_index: HashMap::new(),
            replay_phase: Phase::Init,
            replay_counts: HashMap::new(),
            touched_phase: Phase::Init,
            last_hook_phase: Phase::Init,
            pending_mutations: Vec::new(),
            phase_waiters: Vec::new(),
            storage: NamespaceStorage::new(),
            declared_view: None,
            effective_view: None,
            tombstone: false,
        });
        id
    }

    pub(crate) fn node(&self, id: ContextId) -> &ContextData {
        &self.nodes[id.idx()]
    }

    pub(crate) fn node_mut(&mut self, id: ContextId) -> &mut ContextData {
        &mut self.nodes[id.idx()]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}
