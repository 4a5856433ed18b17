//! The global build reactor.
//!
//! [`ReactorBuilder`] collects configuration, statement supports, derived
//! namespaces, and sources; [`BuildReactor::build`] then walks the phase
//! sequence. Per phase: every source replays its statement stream, then
//! fixpoint passes run until every source finishes or a full pass makes no
//! progress. Any source left unfinished fails the whole build with one
//! aggregate error; no partial schema context is ever returned.
//!
//! Sources are iterated in registration order, always, so diagnostics and
//! pass counts are deterministic.

use std::any::TypeId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use lattice_foundation::{
    ActionDiagnostic, BuildLimit, Error, ErrorKind, FailureReport, Interner, KindId, Phase, Result,
    SourceFailure, SourceRef, StatementId,
};
use lattice_model::{DeclaredStatement, EffectiveStatement, ModuleSchema, SchemaContext};

use crate::action::{ActionArena, ActionBuilder, ActionId, ActionState};
use crate::bundle::{BundleRegistry, StatementSupport};
use crate::config::ReactorConfig;
use crate::namespace::{
    DeriveRule, DerivedNamespace, DerivedRegistration, ModelNamespace, NamespaceStorage,
    StorageKind, StorageScope,
};
use crate::source::{SourceContext, SourceId, SourceProgress};
use crate::stream::StatementSource;
use crate::tree::{ContextArena, ContextId, StatementOrigin};
use crate::writer::StatementWriter;

// =============================================================================
// Builder
// =============================================================================

/// Collects everything a build needs before it runs.
#[derive(Default)]
pub struct ReactorBuilder {
    config: ReactorConfig,
    interner: Interner,
    bundles: BundleRegistry,
    derived: HashMap<TypeId, Vec<Rc<dyn DeriveRule>>>,
    sources: Vec<SourceContext>,
}

impl ReactorBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reactor configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a statement support starting at `phase`.
    ///
    /// # Errors
    /// Returns an error if the keyword is already registered; bundles for
    /// later phases extend earlier ones, they never replace them.
    pub fn add_support(
        &mut self,
        phase: Phase,
        support: Rc<dyn StatementSupport>,
    ) -> Result<()> {
        let kind = self.interner.intern(support.keyword());
        self.bundles.add(phase, kind, support)
    }

    /// Registers a derived namespace, recomputed on every bind to its base.
    pub fn register_derived<D: DerivedNamespace>(&mut self) {
        self.derived
            .entry(TypeId::of::<D::Base>())
            .or_default()
            .push(Rc::new(DerivedRegistration::<D>::new()));
    }

    /// Adds a source to the build. Sources are processed, and reported, in
    /// registration order.
    pub fn add_source(&mut self, stream: Box<dyn StatementSource>) -> SourceId {
        let id = SourceId(u32::try_from(self.sources.len()).expect("source arena overflow"));
        self.sources.push(SourceContext::new(stream));
        id
    }

    /// Finalizes the builder into a reactor ready to build.
    #[must_use]
    pub fn into_reactor(self) -> BuildReactor {
        BuildReactor {
            config: self.config,
            interner: self.interner,
            bundles: self.bundles,
            derived: self.derived,
            contexts: ContextArena::new(),
            sources: self.sources,
            actions: ActionArena::default(),
            ready: VecDeque::new(),
            global: NamespaceStorage::new(),
            phase: Phase::Init,
            completions: 0,
            applies: 0,
        }
    }
}

// =============================================================================
// Reactor
// =============================================================================

/// The global reactor: owns every arena, storage node, and registry of one
/// build, and drives the phase sequence to a schema context or one
/// aggregate error.
pub struct BuildReactor {
    pub(crate) config: ReactorConfig,
    pub(crate) interner: Interner,
    pub(crate) bundles: BundleRegistry,
    pub(crate) derived: HashMap<TypeId, Vec<Rc<dyn DeriveRule>>>,
    pub(crate) contexts: ContextArena,
    pub(crate) sources: Vec<SourceContext>,
    pub(crate) actions: ActionArena,
    /// Worklist of actions whose prerequisites are all resolved.
    pub(crate) ready: VecDeque<ActionId>,
    pub(crate) global: NamespaceStorage,
    pub(crate) phase: Phase,
    /// Contexts that completed a phase; drives progress detection.
    pub(crate) completions: u64,
    /// Actions applied; drives progress detection.
    pub(crate) applies: u64,
}

impl BuildReactor {
    // =========================================================================
    // Tree Access (plugin API)
    // =========================================================================

    /// Returns the keyword interner.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns the phase currently being executed.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Returns the keyword of a context's statement kind.
    #[must_use]
    pub fn keyword_of(&self, ctx: ContextId) -> &str {
        self.interner.resolve(self.contexts.node(ctx).kind)
    }

    /// Returns a context's raw argument, if set.
    #[must_use]
    pub fn argument_of(&self, ctx: ContextId) -> Option<Arc<str>> {
        self.contexts.node(ctx).argument.clone()
    }

    /// Returns where a context's statement appears.
    #[must_use]
    pub fn source_ref_of(&self, ctx: ContextId) -> SourceRef {
        self.contexts.node(ctx).source_ref.clone()
    }

    /// Returns a context's parent, or `None` for roots.
    #[must_use]
    pub fn parent_of(&self, ctx: ContextId) -> Option<ContextId> {
        self.contexts.node(ctx).parent
    }

    /// Returns the root of a context's tree.
    #[must_use]
    pub fn root_of(&self, ctx: ContextId) -> ContextId {
        self.contexts.node(ctx).root
    }

    /// Returns the source a context belongs to.
    #[must_use]
    pub fn source_of(&self, ctx: ContextId) -> SourceId {
        self.contexts.node(ctx).source
    }

    /// Returns whether a context was declared or synthesized.
    #[must_use]
    pub fn origin_of(&self, ctx: ContextId) -> StatementOrigin {
        self.contexts.node(ctx).origin
    }

    /// Returns the last phase a context completed.
    #[must_use]
    pub fn completed_phase_of(&self, ctx: ContextId) -> Phase {
        self.contexts.node(ctx).completed_phase
    }

    /// Returns a context's declared substatements, in declaration order.
    #[must_use]
    pub fn declared_children_of(&self, ctx: ContextId) -> Vec<ContextId> {
        self.contexts
            .node(ctx)
            .declared
            .iter()
            .copied()
            .filter(|c| !self.contexts.node(*c).tombstone)
            .collect()
    }

    /// Returns a context's inferred substatements, in synthesis order.
    #[must_use]
    pub fn inferred_children_of(&self, ctx: ContextId) -> Vec<ContextId> {
        self.contexts.node(ctx).inferred.clone()
    }

    /// Returns the first declared substatement with the given keyword.
    #[must_use]
    pub fn find_declared_child(&self, ctx: ContextId, keyword: &str) -> Option<ContextId> {
        let kind = self.interner.get(keyword)?;
        self.contexts
            .node(ctx)
            .declared
            .iter()
            .copied()
            .find(|c| !self.contexts.node(*c).tombstone && self.contexts.node(*c).kind == kind)
    }

    /// Returns the diagnostic name of a source.
    #[must_use]
    pub fn source_name(&self, source: SourceId) -> Arc<str> {
        Arc::clone(&self.sources[source.idx()].name)
    }

    /// Records that `from` may read the source-local namespaces of `to`.
    pub fn add_source_import(&mut self, from: SourceId, to: SourceId) {
        let imports = &mut self.sources[from.idx()].imports;
        if !imports.contains(&to) {
            imports.push(to);
        }
    }

    // =========================================================================
    // Namespace Access (plugin API)
    // =========================================================================

    /// Looks up a namespace key, escalating per the namespace's storage
    /// kind: statement-local reads the given context's node only,
    /// source-local reads the owning source and then its imports, global
    /// reads the build-global node.
    #[must_use]
    pub fn namespace_get<N: ModelNamespace>(
        &self,
        from: ContextId,
        key: &N::Key,
    ) -> Option<N::Value> {
        match N::KIND {
            StorageKind::Statement => self.contexts.node(from).storage.get::<N>(key).cloned(),
            StorageKind::Global => self.global.get::<N>(key).cloned(),
            StorageKind::Source => {
                let source = self.contexts.node(from).source;
                if let Some(value) = self.sources[source.idx()].storage.get::<N>(key) {
                    return Some(value.clone());
                }
                for import in &self.sources[source.idx()].imports {
                    if let Some(value) = self.sources[import.idx()].storage.get::<N>(key) {
                        return Some(value.clone());
                    }
                }
                None
            }
        }
    }

    /// Reads a namespace key at one exact storage node, without the
    /// imported-source indirection.
    ///
    /// # Panics
    /// Panics if `scope` does not match the namespace's storage kind.
    #[must_use]
    pub fn namespace_get_at<N: ModelNamespace>(
        &self,
        scope: StorageScope,
        key: &N::Key,
    ) -> Option<N::Value> {
        assert!(
            scope.kind() == N::KIND,
            "namespace `{}` has {} storage but was read at {} scope",
            N::NAME,
            N::KIND.scope_name(),
            scope.kind().scope_name()
        );
        self.storage_scope(scope).get::<N>(key).cloned()
    }

    /// Binds a namespace key at a storage node.
    ///
    /// The bind is write-once and notifies synchronously: waiters on the
    /// exact key first, then derived-namespace subscribers. Resolved actions
    /// apply within the current fixpoint pass.
    ///
    /// # Errors
    /// Returns an error if the scope kind does not match the namespace's
    /// storage kind, or the key is already bound at this node.
    pub fn namespace_put<N: ModelNamespace>(
        &mut self,
        scope: StorageScope,
        key: N::Key,
        value: N::Value,
    ) -> Result<()> {
        if scope.kind() != N::KIND {
            return Err(Error::forbidden_binding(N::NAME, scope.kind().scope_name()));
        }
        let waiters = self
            .storage_scope_mut(scope)
            .bind::<N>(key.clone(), value.clone())?;
        trace!(namespace = N::NAME, key = ?key, waiters = waiters.len(), "namespace binding added");
        self.resolve_waiters(&waiters);

        let rules = self
            .derived
            .get(&TypeId::of::<N>())
            .cloned()
            .unwrap_or_default();
        for rule in rules {
            let derived_waiters = rule.apply(self.storage_scope_mut(scope), &key, &value)?;
            self.resolve_waiters(&derived_waiters);
        }
        Ok(())
    }

    // =========================================================================
    // Inference Actions (plugin API)
    // =========================================================================

    /// Begins registering an inference action on behalf of `ctx`'s source.
    ///
    /// The description and the context's location feed stuck-source
    /// diagnostics, so name the cross-reference being resolved (e.g.
    /// ``import of module `base` ``).
    pub fn new_inference_action(
        &mut self,
        ctx: ContextId,
        description: impl Into<String>,
    ) -> ActionBuilder<'_> {
        let source = self.contexts.node(ctx).source;
        let at = self.contexts.node(ctx).source_ref.clone();
        let id = self.actions.alloc(source, description.into(), at);
        self.sources[source.idx()].actions.push(id);
        if self.sources[source.idx()].actions.len() > self.config.max_actions
            && self.sources[source.idx()].failure.is_none()
        {
            #[allow(clippy::cast_possible_truncation)]
            let limit = self.config.max_actions as u32;
            let name = self.sources[source.idx()].name.to_string();
            self.sources[source.idx()].failure =
                Some(Error::limit_exceeded(BuildLimit::MaxActions {
                    limit,
                    source: name,
                }));
            self.actions.node_mut(id).state = ActionState::Failed;
        }
        ActionBuilder { reactor: self, id }
    }

    /// Returns the state of an action.
    #[must_use]
    pub fn action_state(&self, id: ActionId) -> ActionState {
        self.actions.node(id).state
    }

    // =========================================================================
    // Inferred Statements (plugin API)
    // =========================================================================

    /// Synthesizes a single inferred substatement under `into`.
    pub fn add_inferred_child(
        &mut self,
        into: ContextId,
        keyword: &str,
        argument: Option<Arc<str>>,
        source_ref: SourceRef,
    ) -> ContextId {
        let kind = self.interner.intern(keyword);
        let source = self.contexts.node(into).source;
        let id = self.contexts.alloc(Some(into), source, kind, source_ref);
        {
            let node = self.contexts.node_mut(id);
            node.argument = argument;
            node.origin = StatementOrigin::Inferred;
        }
        self.contexts.node_mut(into).inferred.push(id);
        id
    }

    /// Copies the declared subtree rooted at `from` under `into` as
    /// inferred statements, returning the new subtree's root.
    pub fn copy_subtree_inferred(&mut self, from: ContextId, into: ContextId) -> ContextId {
        let (kind, argument, source_ref) = {
            let node = self.contexts.node(from);
            (node.kind, node.argument.clone(), node.source_ref.clone())
        };
        let source = self.contexts.node(into).source;
        let id = self.contexts.alloc(Some(into), source, kind, source_ref);
        {
            let node = self.contexts.node_mut(id);
            node.argument = argument;
            node.origin = StatementOrigin::Inferred;
        }
        self.contexts.node_mut(into).inferred.push(id);
        let children: Vec<ContextId> = self
            .contexts
            .node(from)
            .declared
            .iter()
            .copied()
            .filter(|c| !self.contexts.node(*c).tombstone)
            .collect();
        for child in children {
            self.copy_subtree_inferred(child, id);
        }
        id
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Builds (or returns the memoized) declared view of a context.
    ///
    /// # Panics
    /// Panics if the context has not completed full declaration; requesting
    /// a view early is a statement-support bug.
    pub fn build_declared(&mut self, ctx: ContextId) -> Rc<DeclaredStatement> {
        assert!(
            self.contexts.node(ctx).completed_phase >= Phase::FullDeclaration,
            "declared view of `{}` requested before full declaration completed",
            self.interner.resolve(self.contexts.node(ctx).kind)
        );
        if let Some(view) = &self.contexts.node(ctx).declared_view {
            return Rc::clone(view);
        }
        let children: Vec<ContextId> = self
            .contexts
            .node(ctx)
            .declared
            .iter()
            .copied()
            .filter(|c| !self.contexts.node(*c).tombstone)
            .collect();
        let substatements: Vec<Rc<DeclaredStatement>> = children
            .into_iter()
            .map(|child| self.build_declared(child))
            .collect();
        let (keyword, argument, source_ref) = {
            let node = self.contexts.node(ctx);
            (
                self.interner.resolve_arc(node.kind),
                node.argument.clone(),
                node.source_ref.clone(),
            )
        };
        let view = Rc::new(DeclaredStatement::new(
            keyword,
            argument,
            source_ref,
            substatements,
        ));
        self.contexts.node_mut(ctx).declared_view = Some(Rc::clone(&view));
        view
    }

    /// Builds (or returns the memoized) effective view of a context.
    ///
    /// # Panics
    /// Panics if the context has not completed the effective-model phase;
    /// requesting a view early is a statement-support bug.
    pub fn build_effective(&mut self, ctx: ContextId) -> Rc<EffectiveStatement> {
        assert!(
            self.contexts.node(ctx).completed_phase >= Phase::EffectiveModel,
            "effective view of `{}` requested before effective model completed",
            self.interner.resolve(self.contexts.node(ctx).kind)
        );
        if let Some(view) = &self.contexts.node(ctx).effective_view {
            return Rc::clone(view);
        }
        let declared = match self.contexts.node(ctx).origin {
            StatementOrigin::Declared => Some(self.build_declared(ctx)),
            StatementOrigin::Inferred => None,
        };
        let children: Vec<ContextId> = {
            let node = self.contexts.node(ctx);
            node.declared
                .iter()
                .chain(node.inferred.iter())
                .copied()
                .filter(|c| !self.contexts.node(*c).tombstone)
                .collect()
        };
        let substatements: Vec<Rc<EffectiveStatement>> = children
            .into_iter()
            .map(|child| self.build_effective(child))
            .collect();
        let (keyword, argument, source_ref) = {
            let node = self.contexts.node(ctx);
            (
                self.interner.resolve_arc(node.kind),
                node.argument.clone(),
                node.source_ref.clone(),
            )
        };
        let view = Rc::new(EffectiveStatement::new(
            keyword,
            argument,
            source_ref,
            declared,
            substatements,
        ));
        self.contexts.node_mut(ctx).effective_view = Some(Rc::clone(&view));
        view
    }

    // =========================================================================
    // Build Loop
    // =========================================================================

    /// Runs the build: every phase over every source to fixpoint.
    ///
    /// # Errors
    /// Returns one aggregate error when any source fails or cannot finish a
    /// phase; no partial schema context is returned.
    pub fn build(mut self) -> Result<SchemaContext> {
        for phase in Phase::EXECUTION {
            self.phase = phase;
            debug!(%phase, sources = self.sources.len(), "entering phase");
            let expected = phase.previous().expect("execution phases have a predecessor");
            for source in &self.sources {
                assert!(
                    source.completed == expected,
                    "source {} enters {} having completed {}, expected {}",
                    source.name,
                    phase,
                    source.completed,
                    expected
                );
            }
            self.load_phase(phase);
            self.run_fixpoint(phase)?;
            let failures = self.collect_failures(phase);
            if !failures.is_empty() {
                return Err(Error::new(ErrorKind::BuildFailed {
                    phase,
                    failures: FailureReport(failures),
                }));
            }
        }
        Ok(self.assemble())
    }

    /// Replays every source's statement stream for `phase`. A failing
    /// source records its error and is skipped for the rest of the build;
    /// the remaining sources still load so diagnostics aggregate.
    pub(crate) fn load_phase(&mut self, phase: Phase) {
        for idx in 0..self.sources.len() {
            if self.sources[idx].failure.is_some() {
                continue;
            }
            let Some(mut stream) = self.sources[idx].stream.take() else {
                continue;
            };
            let source_id = SourceId(u32::try_from(idx).expect("source arena overflow"));
            let result = {
                let mut writer = StatementWriter::new(self, source_id, phase);
                stream
                    .replay(phase, &mut writer)
                    .and_then(|()| writer.finish())
            };
            self.sources[idx].stream = Some(stream);
            if let Err(error) = result {
                warn!(source = %self.sources[idx].name, %error, "source failed to load");
                self.sources[idx].failure = Some(error);
            }
        }
    }

    /// Runs fixpoint passes for `phase` until every source finishes or a
    /// full pass makes no progress.
    ///
    /// # Errors
    /// Returns an error if the configured pass limit is exceeded.
    fn run_fixpoint(&mut self, phase: Phase) -> Result<()> {
        let mut passes: u32 = 0;
        loop {
            passes += 1;
            if passes > self.config.max_passes {
                return Err(Error::limit_exceeded(BuildLimit::MaxPasses {
                    limit: self.config.max_passes,
                    phase,
                }));
            }
            let applies_before = self.applies;
            let completions_before = self.completions;

            self.drain_ready();
            let mut all_finished = true;
            for idx in 0..self.sources.len() {
                if self.sources[idx].failure.is_some() || self.sources[idx].completed >= phase {
                    continue;
                }
                match self.try_complete_source(idx, phase) {
                    SourceProgress::Finished => {
                        self.sources[idx].completed = phase;
                        debug!(source = %self.sources[idx].name, %phase, "source finished phase");
                    }
                    SourceProgress::Progress | SourceProgress::NoProgress => {
                        all_finished = false;
                    }
                }
            }
            self.drain_ready();

            let progressed =
                self.applies > applies_before || self.completions > completions_before;
            trace!(%phase, passes, progressed, all_finished, "fixpoint pass");
            if all_finished || !progressed {
                debug!(%phase, passes, "fixpoint settled");
                return Ok(());
            }
        }
    }

    /// Attempts to complete `phase` for one source.
    fn try_complete_source(&mut self, idx: usize, phase: Phase) -> SourceProgress {
        let Some(root) = self.sources[idx].root else {
            // a source whose stream declared nothing has nothing to finish
            return SourceProgress::Finished;
        };
        let completions_before = self.completions;
        if self.try_complete_ctx(root, phase) {
            SourceProgress::Finished
        } else if self.completions > completions_before {
            SourceProgress::Progress
        } else {
            SourceProgress::NoProgress
        }
    }

    /// Recursively completes a context for `phase`: every substatement
    /// (declared and inferred) must complete, and no mutation scoped to
    /// this phase or earlier may remain. Completion fires phase waiters.
    pub(crate) fn try_complete_ctx(&mut self, ctx: ContextId, phase: Phase) -> bool {
        if self.contexts.node(ctx).tombstone || self.contexts.node(ctx).completed_phase >= phase {
            return true;
        }
        let children: Vec<ContextId> = {
            let node = self.contexts.node(ctx);
            node.declared
                .iter()
                .chain(node.inferred.iter())
                .copied()
                .collect()
        };
        let mut done = true;
        for child in children {
            let child_done = self.try_complete_ctx(child, phase);
            done = done && child_done;
        }
        if done
            && self
                .contexts
                .node(ctx)
                .pending_mutations
                .iter()
                .any(|(p, _)| *p <= phase)
        {
            done = false;
        }
        if done {
            let mut resolved = Vec::new();
            {
                let node = self.contexts.node_mut(ctx);
                node.completed_phase = phase;
                node.phase_waiters.retain(|(waited, action)| {
                    if *waited <= phase {
                        resolved.push(*action);
                        false
                    } else {
                        true
                    }
                });
            }
            self.completions += 1;
            self.resolve_waiters(&resolved);
        }
        done
    }

    /// Applies every ready action. Applying may bind namespaces, which
    /// enqueues newly ready actions; those apply within the same drain.
    pub(crate) fn drain_ready(&mut self) {
        while let Some(id) = self.ready.pop_front() {
            if self.actions.node(id).state != ActionState::Ready {
                continue;
            }
            let source = self.actions.node(id).source;
            if self.sources[source.idx()].failure.is_some() {
                self.actions.node_mut(id).state = ActionState::Failed;
                continue;
            }
            let Some(callback) = self.actions.node_mut(id).callback.take() else {
                self.actions.node_mut(id).state = ActionState::Failed;
                continue;
            };
            match callback(self) {
                Ok(()) => {
                    self.actions.node_mut(id).state = ActionState::Applied;
                    self.applies += 1;
                    trace!(action = ?id, "inference action applied");
                    let mutations = self.actions.node(id).mutations.clone();
                    for (target, _) in mutations {
                        self.contexts
                            .node_mut(target)
                            .pending_mutations
                            .retain(|(_, action)| *action != id);
                    }
                }
                Err(error) => {
                    warn!(source = %self.sources[source.idx()].name, %error, "inference action failed");
                    self.actions.node_mut(id).state = ActionState::Failed;
                    self.sources[source.idx()].failure = Some(error);
                }
            }
        }
    }

    /// Decrements the prerequisite count of each waiter; actions reaching
    /// zero with a sealed callback become ready.
    pub(crate) fn resolve_waiters(&mut self, waiters: &[ActionId]) {
        for &id in waiters {
            let action = self.actions.node_mut(id);
            action.unresolved = action.unresolved.saturating_sub(1);
            if action.unresolved == 0
                && action.state == ActionState::Pending
                && action.callback.is_some()
            {
                action.state = ActionState::Ready;
                self.ready.push_back(id);
            }
        }
    }

    /// Collects one failure per source that errored or could not finish
    /// `phase`. Unapplied actions of stuck sources become `Failed`.
    fn collect_failures(&mut self, phase: Phase) -> Vec<SourceFailure> {
        let mut failures = Vec::new();
        for idx in 0..self.sources.len() {
            let stuck =
                self.sources[idx].failure.is_some() || self.sources[idx].completed < phase;
            if !stuck {
                continue;
            }
            let cause = self.sources[idx].failure.take().map(Box::new);
            let at = self.sources[idx]
                .root
                .map(|root| self.contexts.node(root).source_ref.clone());

            let mut unresolved = Vec::new();
            let owned = self.sources[idx].actions.clone();
            for id in owned {
                if matches!(
                    self.actions.node(id).state,
                    ActionState::Pending | ActionState::Ready
                ) {
                    self.actions.node_mut(id).state = ActionState::Failed;
                    unresolved.push(self.actions.diagnostic(id));
                }
            }

            let mut blocking = Vec::new();
            if let Some(root) = self.sources[idx].root {
                let mut seen = HashSet::new();
                self.collect_blocking(root, idx, phase, &mut seen, &mut blocking);
            }

            failures.push(SourceFailure {
                source: Arc::clone(&self.sources[idx].name),
                phase,
                at,
                unresolved,
                blocking,
                cause,
            });
        }
        failures
    }

    /// Collects pending mutations in `ctx`'s subtree owned by other
    /// sources, so a source stuck only through foreign mutations still
    /// yields an actionable diagnostic.
    fn collect_blocking(
        &self,
        ctx: ContextId,
        source_idx: usize,
        phase: Phase,
        seen: &mut HashSet<ActionId>,
        out: &mut Vec<ActionDiagnostic>,
    ) {
        let node = self.contexts.node(ctx);
        for &(mutation_phase, action) in &node.pending_mutations {
            if mutation_phase <= phase
                && self.actions.node(action).source.idx() != source_idx
                && seen.insert(action)
            {
                out.push(self.actions.diagnostic(action));
            }
        }
        for child in node.declared.iter().chain(node.inferred.iter()) {
            self.collect_blocking(*child, source_idx, phase, seen, out);
        }
    }

    /// Assembles the immutable schema context from every source's root.
    fn assemble(&mut self) -> SchemaContext {
        let mut modules = Vec::new();
        for idx in 0..self.sources.len() {
            let Some(root) = self.sources[idx].root else {
                continue;
            };
            let declared = self.build_declared(root);
            let effective = self.build_effective(root);
            let keyword = self.interner.resolve_arc(self.contexts.node(root).kind);
            let name = self
                .contexts
                .node(root)
                .argument
                .clone()
                .unwrap_or_else(|| Arc::clone(&keyword));
            modules.push(ModuleSchema::new(
                name,
                keyword,
                Arc::clone(&self.sources[idx].name),
                declared,
                effective,
            ));
        }
        debug!(modules = modules.len(), "schema context assembled");
        SchemaContext::new(modules)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    pub(crate) fn storage_scope(&self, scope: StorageScope) -> &NamespaceStorage {
        match scope {
            StorageScope::Statement(ctx) => &self.contexts.node(ctx).storage,
            StorageScope::Source(source) => &self.sources[source.idx()].storage,
            StorageScope::Global => &self.global,
        }
    }

    pub(crate) fn storage_scope_mut(&mut self, scope: StorageScope) -> &mut NamespaceStorage {
        match scope {
            StorageScope::Statement(ctx) => &mut self.contexts.node_mut(ctx).storage,
            StorageScope::Source(source) => &mut self.sources[source.idx()].storage,
            StorageScope::Global => &mut self.global,
        }
    }

    pub(crate) fn lookup_support(
        &self,
        phase: Phase,
        keyword: &str,
    ) -> Option<(KindId, Rc<dyn StatementSupport>)> {
        let kind = self.interner.get(keyword)?;
        let support = self.bundles.lookup(phase, kind)?;
        Some((kind, support))
    }

    /// Attaches a child statement under `parent`, or reuses an existing
    /// context. Reuse is by identifier: across passes the n-th occurrence of
    /// an identifier maps to the n-th existing sibling; within one pass a
    /// duplicate identifier reuses the first sibling only for coalescing
    /// kinds. `staged` is consumed (attached or tombstoned).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reconcile_child(
        &mut self,
        parent: ContextId,
        staged: Option<ContextId>,
        kind: KindId,
        argument: Option<Arc<str>>,
        support: &Rc<dyn StatementSupport>,
        phase: Phase,
        at: &SourceRef,
    ) -> ContextId {
        let ident = StatementId::with_argument(kind, argument.clone());
        {
            let node = self.contexts.node_mut(parent);
            if node.replay_phase != phase {
                node.replay_phase = phase;
                node.replay_counts.clear();
            }
        }
        let occurrence = {
            let node = self.contexts.node_mut(parent);
            let count = node.replay_counts.entry(ident.clone()).or_insert(0);
            let n = *count;
            *count += 1;
            n
        };
        let reuse = {
            let node = self.contexts.node(parent);
            node.child_index.get(&ident).and_then(|siblings| {
                if support.coalesces() {
                    siblings.first().copied()
                } else {
                    siblings.get(occurrence).copied()
                }
            })
        };
        if let Some(existing) = reuse {
            if let Some(staged) = staged {
                self.contexts.node_mut(staged).tombstone = true;
            }
            self.contexts.node_mut(existing).touched_phase = phase;
            return existing;
        }
        let id = match staged {
            Some(staged) => staged,
            None => {
                let source = self.contexts.node(parent).source;
                self.contexts.alloc(Some(parent), source, kind, at.clone())
            }
        };
        {
            let node = self.contexts.node_mut(id);
            node.argument = argument;
            node.touched_phase = phase;
        }
        let node = self.contexts.node_mut(parent);
        node.declared.push(id);
        node.child_index.entry(ident).or_default().push(id);
        id
    }
}

impl std::fmt::Debug for BuildReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildReactor")
            .field("phase", &self.phase)
            .field("sources", &self.sources)
            .field("contexts", &self.contexts.len())
            .field("ready", &self.ready.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
