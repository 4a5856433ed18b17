//! The statement writer: the push interface statement producers drive.
//!
//! The writer maintains a stack of open statements for one source during one
//! phase's load pass. Three behaviors live here:
//!
//! - **Restricted phases.** In the linkage phases an unrecognized keyword
//!   causes the whole enclosed subtree to be skipped; from statement
//!   definition on it is a hard error.
//! - **Idempotent replay.** Re-emitting a statement that was built in an
//!   earlier pass reuses the existing context instead of declaring a
//!   duplicate. Identifiers with an argument attach when the argument
//!   arrives, since identity is not known at `start_statement`.
//! - **Coalescing.** Statement kinds that opt in collapse same-identifier
//!   siblings into one context even within a single pass.

use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::{Error, Phase, Result, SourceRef};

use crate::bundle::StatementSupport;
use crate::reactor::BuildReactor;
use crate::source::SourceId;
use crate::tree::ContextId;

struct Frame {
    ctx: ContextId,
    support: Rc<dyn StatementSupport>,
    /// False while an argument-taking statement waits for its argument; the
    /// context is allocated but not yet reconciled into its parent.
    attached: bool,
}

/// Push interface for one source's statement stream during one phase.
pub struct StatementWriter<'a> {
    reactor: &'a mut BuildReactor,
    source: SourceId,
    phase: Phase,
    stack: Vec<Frame>,
    skip_depth: usize,
}

impl<'a> StatementWriter<'a> {
    pub(crate) fn new(reactor: &'a mut BuildReactor, source: SourceId, phase: Phase) -> Self {
        Self {
            reactor,
            source,
            phase,
            stack: Vec::new(),
            skip_depth: 0,
        }
    }

    /// Returns the phase this writer loads for.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the nesting depth of open statements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Opens a statement.
    ///
    /// # Errors
    /// Returns an error for an unknown keyword in a fully recognizing phase,
    /// a second top-level statement, or a substatement arriving before its
    /// parent's argument.
    pub fn start_statement(&mut self, keyword: &str, at: SourceRef) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }
        let Some((kind, support)) = self.reactor.lookup_support(self.phase, keyword) else {
            if self.phase <= Phase::SourceLinkage {
                // restricted writer: this subtree becomes visible in a later phase
                self.skip_depth = 1;
                return Ok(());
            }
            return Err(Error::unknown_statement(keyword, at));
        };

        if let Some(top) = self.stack.last() {
            if !top.attached {
                let parent_keyword = top.support.keyword();
                return Err(Error::malformed(
                    format!("substatement `{keyword}` begins before the argument of `{parent_keyword}`"),
                    at,
                ));
            }
            let parent = top.ctx;
            if support.takes_argument() {
                // identity unknown until the argument arrives; stage the context
                let ctx = self.reactor.contexts.alloc(Some(parent), self.source, kind, at);
                self.stack.push(Frame {
                    ctx,
                    support,
                    attached: false,
                });
            } else {
                let ctx =
                    self.reactor
                        .reconcile_child(parent, None, kind, None, &support, self.phase, &at);
                self.stack.push(Frame {
                    ctx,
                    support,
                    attached: true,
                });
            }
            return Ok(());
        }

        // top level: one root statement per source, reused across phases
        match self.reactor.sources[self.source.idx()].root {
            Some(root) => {
                if self.reactor.contexts.node(root).kind != kind {
                    return Err(Error::malformed(
                        format!("conflicting top-level statement `{keyword}`"),
                        at,
                    ));
                }
                if self.reactor.contexts.node(root).touched_phase == self.phase {
                    return Err(Error::malformed(
                        "multiple top-level statements in one source",
                        at,
                    ));
                }
                self.reactor.contexts.node_mut(root).touched_phase = self.phase;
                self.stack.push(Frame {
                    ctx: root,
                    support,
                    attached: true,
                });
            }
            None => {
                let ctx = self.reactor.contexts.alloc(None, self.source, kind, at);
                self.reactor.contexts.node_mut(ctx).touched_phase = self.phase;
                self.reactor.sources[self.source.idx()].root = Some(ctx);
                self.stack.push(Frame {
                    ctx,
                    support,
                    attached: true,
                });
            }
        }
        Ok(())
    }

    /// Supplies the argument of the innermost open statement.
    ///
    /// May be called at most once per statement per pass; replaying the same
    /// value onto a reused context is permitted.
    ///
    /// # Errors
    /// Returns an error if no statement is open, the kind takes no argument,
    /// or a different argument was already declared.
    pub fn set_argument(&mut self, value: &str, at: SourceRef) -> Result<()> {
        if self.skip_depth > 0 {
            return Ok(());
        }
        let Some(top) = self.stack.last() else {
            return Err(Error::malformed("argument outside any statement", at));
        };
        if !top.support.takes_argument() {
            let keyword = top.support.keyword();
            return Err(Error::malformed(
                format!("statement `{keyword}` does not take an argument"),
                at,
            ));
        }

        if top.attached {
            let keyword = top.support.keyword();
            let node = self.reactor.contexts.node_mut(top.ctx);
            match &node.argument {
                None => node.argument = Some(Arc::from(value)),
                Some(existing) if existing.as_ref() == value => {}
                Some(_) => {
                    return Err(Error::malformed(
                        format!("argument of `{keyword}` redeclared"),
                        at,
                    ));
                }
            }
            return Ok(());
        }

        // identity is now known; reconcile the staged context into the parent
        let staged = top.ctx;
        let support = Rc::clone(&top.support);
        let kind = self.reactor.contexts.node(staged).kind;
        let parent = self
            .reactor
            .contexts
            .node(staged)
            .parent
            .expect("staged contexts always have a parent");
        let ctx = self.reactor.reconcile_child(
            parent,
            Some(staged),
            kind,
            Some(Arc::from(value)),
            &support,
            self.phase,
            &at,
        );
        let top = self.stack.last_mut().expect("stack checked above");
        top.ctx = ctx;
        top.attached = true;
        Ok(())
    }

    /// Closes the innermost open statement and fires its per-phase
    /// completion hook (at most once per context per phase).
    ///
    /// # Errors
    /// Returns an error on an unbalanced end, a missing required argument,
    /// or a failing completion hook.
    pub fn end_statement(&mut self, at: SourceRef) -> Result<()> {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return Ok(());
        }
        let Some(frame) = self.stack.pop() else {
            return Err(Error::malformed("unbalanced end of statement", at));
        };
        if !frame.attached
            || (frame.support.takes_argument()
                && self.reactor.contexts.node(frame.ctx).argument.is_none())
        {
            let keyword = frame.support.keyword();
            return Err(Error::malformed(
                format!("statement `{keyword}` is missing its argument"),
                at,
            ));
        }

        let fire = self.reactor.contexts.node(frame.ctx).last_hook_phase < self.phase;
        if fire {
            self.reactor.contexts.node_mut(frame.ctx).last_hook_phase = self.phase;
            match self.phase {
                Phase::SourcePreLinkage => {
                    frame.support.on_pre_linkage_declared(self.reactor, frame.ctx)?;
                }
                Phase::SourceLinkage => {
                    frame.support.on_linkage_declared(self.reactor, frame.ctx)?;
                }
                Phase::StatementDefinition => {
                    frame
                        .support
                        .on_statement_definition_declared(self.reactor, frame.ctx)?;
                }
                Phase::FullDeclaration => {
                    frame
                        .support
                        .on_full_definition_declared(self.reactor, frame.ctx)?;
                }
                Phase::Init | Phase::EffectiveModel => {}
            }
        }
        Ok(())
    }

    /// Re-enters a context built in an earlier phase without rebuilding it.
    ///
    /// With no statement open, offset 0 re-enters the source's root. With an
    /// open statement, `offset` indexes its declared substatements. The
    /// re-entered statement must be closed with `end_statement` as usual;
    /// its existing substatements are preserved, and statements emitted
    /// after the resume are appended.
    ///
    /// # Errors
    /// Returns an error if the offset names no existing context.
    pub fn resume_statement(&mut self, offset: usize) -> Result<()> {
        if self.skip_depth > 0 {
            // inside a skipped subtree: stay balanced with the matching end
            self.skip_depth += 1;
            return Ok(());
        }
        let here = SourceRef::unknown(Arc::clone(&self.reactor.sources[self.source.idx()].name));
        let ctx = match self.stack.last() {
            None => {
                if offset != 0 {
                    return Err(Error::malformed("top-level resume offset out of range", here));
                }
                self.reactor.sources[self.source.idx()]
                    .root
                    .ok_or_else(|| {
                        Error::malformed("resume before any statement was built", here.clone())
                    })?
            }
            Some(top) => {
                let children = self.reactor.declared_children_of(top.ctx);
                *children.get(offset).ok_or_else(|| {
                    Error::malformed(format!("resume offset {offset} out of range"), here.clone())
                })?
            }
        };
        let kind = self.reactor.contexts.node(ctx).kind;
        let support = self.reactor.bundles.lookup(self.phase, kind).ok_or_else(|| {
            let keyword = self.reactor.interner.resolve(kind).to_string();
            Error::malformed(
                format!("statement `{keyword}` cannot be resumed in this phase"),
                here,
            )
        })?;
        self.stack.push(Frame {
            ctx,
            support,
            attached: true,
        });
        Ok(())
    }

    /// Verifies the stream ended with every statement closed.
    ///
    /// # Errors
    /// Returns an error if statements remain open.
    pub fn finish(&mut self) -> Result<()> {
        if self.skip_depth > 0 || !self.stack.is_empty() {
            let at = self.stack.last().map_or_else(
                || SourceRef::unknown(Arc::clone(&self.reactor.sources[self.source.idx()].name)),
                |top| self.reactor.contexts.node(top.ctx).source_ref.clone(),
            );
            return Err(Error::malformed("unterminated statement at end of input", at));
        }
        Ok(())
    }
}
