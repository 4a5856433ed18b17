//! Inference actions: deferred cross-statement logic gated by prerequisites.
//!
//! A statement support registers an action when it needs something that may
//! not exist yet: another context reaching a phase, or a namespace acquiring
//! a key. The reactor resolves prerequisites inline as the producing writes
//! occur; once the last prerequisite resolves, the action's apply callback
//! runs inside the same fixpoint pass.
//!
//! An action that also *mutates* a context blocks that context's phase
//! completion until the action has applied, so the dependency is visible to
//! the completion check, not just to the action itself.

use std::fmt;

use lattice_foundation::{ActionDiagnostic, Phase, Result, SourceRef};

use crate::namespace::{ModelNamespace, StorageScope};
use crate::reactor::BuildReactor;
use crate::source::SourceId;
use crate::tree::ContextId;

/// Identifies one inference action in the build.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ActionId(pub(crate) u32);

impl ActionId {
    /// Returns the raw index of this action.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionId({})", self.0)
    }
}

/// The lifecycle of an inference action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionState {
    /// Has unresolved prerequisites.
    Pending,
    /// All prerequisites resolved; the apply callback has not run yet.
    Ready,
    /// Applied successfully. Terminal.
    Applied,
    /// Declared permanently failed (its source is stuck or errored). Terminal.
    Failed,
}

pub(crate) type ApplyFn = Box<dyn FnOnce(&mut BuildReactor) -> Result<()>>;

pub(crate) struct ActionData {
    pub(crate) source: SourceId,
    pub(crate) description: String,
    pub(crate) at: SourceRef,
    pub(crate) state: ActionState,
    /// Number of prerequisites not yet resolved.
    pub(crate) unresolved: usize,
    /// Contexts whose phase completion this action blocks.
    pub(crate) mutations: Vec<(ContextId, Phase)>,
    pub(crate) callback: Option<ApplyFn>,
}

impl fmt::Debug for ActionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionData")
            .field("description", &self.description)
            .field("state", &self.state)
            .field("unresolved", &self.unresolved)
            .field("mutations", &self.mutations)
            .finish_non_exhaustive()
    }
}

/// Arena of all inference actions in one build.
#[derive(Debug, Default)]
pub(crate) struct ActionArena {
    nodes: Vec<ActionData>,
}

impl ActionArena {
    pub(crate) fn alloc(
        &mut self,
        source: SourceId,
        description: String,
        at: SourceRef,
    ) -> ActionId {
        let id = ActionId(u32::try_from(self.nodes.len()).expect("action arena overflow"));
        self.nodes.push(ActionData {
            source,
            description,
            at,
            state: ActionState::Pending,
            unresolved: 0,
            mutations: Vec::new(),
            callback: None,
        });
        id
    }

    pub(crate) fn node(&self, id: ActionId) -> &ActionData {
        &self.nodes[id.idx()]
    }

    pub(crate) fn node_mut(&mut self, id: ActionId) -> &mut ActionData {
        &mut self.nodes[id.idx()]
    }

    pub(crate) fn diagnostic(&self, id: ActionId) -> ActionDiagnostic {
        let node = self.node(id);
        ActionDiagnostic {
            description: node.description.clone(),
            at: node.at.clone(),
        }
    }
}

/// Registers one inference action against the reactor.
///
/// Obtained from [`BuildReactor::new_inference_action`]; prerequisites and
/// mutations are declared with the chaining methods, and [`apply`] seals the
/// action with its callback. An action whose prerequisites are all satisfied
/// at seal time becomes ready immediately.
///
/// [`apply`]: ActionBuilder::apply
pub struct ActionBuilder<'a> {
    pub(crate) reactor: &'a mut BuildReactor,
    pub(crate) id: ActionId,
}

impl ActionBuilder<'_> {
    /// Returns the id of the action being built.
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Requires that `target` completes `phase` before this action applies.
    #[must_use]
    pub fn require_phase(self, target: ContextId, phase: Phase) -> Self {
        let satisfied = self.reactor.contexts.node(target).completed_phase >= phase;
        if !satisfied {
            self.reactor
                .contexts
                .node_mut(target)
                .phase_waiters
                .push((phase, self.id));
            self.reactor.actions.node_mut(self.id).unresolved += 1;
        }
        self
    }

    /// Requires that namespace `N` acquires `key` at `scope` before this
    /// action applies. Resolves immediately if the key is already bound.
    ///
    /// # Panics
    /// Panics if `scope` does not match the namespace's storage kind; that
    /// is a statement-support bug, not an input error.
    #[must_use]
    pub fn require_namespace<N: ModelNamespace>(self, scope: StorageScope, key: N::Key) -> Self {
        assert!(
            scope.kind() == N::KIND,
            "namespace `{}` has {} storage but a prerequisite subscribed at {} scope",
            N::NAME,
            N::KIND.scope_name(),
            scope.kind().scope_name()
        );
        let already_bound = self
            .reactor
            .storage_scope_mut(scope)
            .subscribe::<N>(&key, self.id);
        if !already_bound {
            self.reactor.actions.node_mut(self.id).unresolved += 1;
        }
        self
    }

    /// Claims write responsibility for `target`: the context cannot complete
    /// `phase` until this action has applied.
    #[must_use]
    pub fn mutates(self, target: ContextId, phase: Phase) -> Self {
        self.reactor
            .actions
            .node_mut(self.id)
            .mutations
            .push((target, phase));
        self.reactor
            .contexts
            .node_mut(target)
            .pending_mutations
            .push((phase, self.id));
        self
    }

    /// Seals the action with its apply callback and returns its id.
    pub fn apply(
        self,
        callback: impl FnOnce(&mut BuildReactor) -> Result<()> + 'static,
    ) -> ActionId {
        let id = self.id;
        let action = self.reactor.actions.node_mut(id);
        action.callback = Some(Box::new(callback));
        if action.unresolved == 0 && matches!(action.state, ActionState::Pending) {
            action.state = ActionState::Ready;
            self.reactor.ready.push_back(id);
        }
        id
    }
}
