//! Integration tests for the prerequisite/mutation engine.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::{Error, ErrorKind, Phase, Result};
use lattice_reactor::{
    BuildReactor, ContextId, ModelNamespace, ReactorBuilder, ReactorConfig, RecordedStream,
    StatementSupport, StorageKind, StorageScope,
};

use crate::common::Plain;

struct RootNs;
impl ModelNamespace for RootNs {
    type Key = Arc<str>;
    type Value = ContextId;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "root-by-name";
}

/// A module support that registers its root context under its name.
struct RegisteredModule;
impl StatementSupport for RegisteredModule {
    fn keyword(&self) -> &'static str {
        "module"
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = reactor.argument_of(ctx).expect("writer enforces the argument");
        reactor.namespace_put::<RootNs>(StorageScope::Global, name, ctx)
    }
}

/// Blocks its own module at linkage until the named module completes
/// linkage, exercising cross-source phase prerequisites.
struct AfterSupport {
    applied: Rc<RefCell<Vec<String>>>,
}

impl StatementSupport for AfterSupport {
    fn keyword(&self) -> &'static str {
        "after"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = reactor.argument_of(ctx).expect("writer enforces the argument");
        let target = reactor
            .namespace_get::<RootNs>(ctx, &name)
            .expect("target module registered at pre-linkage");
        let root = reactor.root_of(ctx);
        let applied = Rc::clone(&self.applied);
        reactor
            .new_inference_action(ctx, format!("waiting for module `{name}`"))
            .require_phase(target, Phase::SourceLinkage)
            .mutates(root, Phase::SourceLinkage)
            .apply(move |_| {
                applied.borrow_mut().push(name.to_string());
                Ok(())
            });
        Ok(())
    }
}

#[test]
fn cross_source_phase_prerequisites_resolve_over_passes() {
    let applied = Rc::new(RefCell::new(Vec::new()));
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(RegisteredModule))
        .unwrap();
    builder
        .add_support(
            Phase::SourcePreLinkage,
            Rc::new(AfterSupport {
                applied: Rc::clone(&applied),
            }),
        )
        .unwrap();

    // the dependent source is registered first, forcing a second pass
    let dependent = RecordedStream::new("b.schema")
        .start("module", 1, 1)
        .argument("b", 1, 8)
        .complete("after", Some("a"), 2, 3)
        .end(3, 1);
    let independent = RecordedStream::new("a.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .end(2, 1);
    builder.add_source(Box::new(dependent));
    builder.add_source(Box::new(independent));

    let context = builder.into_reactor().build().unwrap();
    assert_eq!(context.len(), 2);
    assert_eq!(*applied.borrow(), vec!["a".to_string()]);
}

struct NeverNs;
impl ModelNamespace for NeverNs {
    type Key = Arc<str>;
    type Value = u32;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "never";
}

/// Registers an action gated on a key nothing ever binds.
struct NeedSupport;
impl StatementSupport for NeedSupport {
    fn keyword(&self) -> &'static str {
        "need"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let key = reactor.argument_of(ctx).expect("writer enforces the argument");
        let root = reactor.root_of(ctx);
        reactor
            .new_inference_action(ctx, format!("resolution of `{key}`"))
            .require_namespace::<NeverNs>(StorageScope::Global, key)
            .mutates(root, Phase::SourceLinkage)
            .apply(|_| Ok(()));
        Ok(())
    }
}

#[test]
fn unresolved_prerequisites_fail_the_build_with_a_diagnostic() {
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(NeedSupport))
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .complete("need", Some("ghost"), 4, 5)
        .end(5, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourceLinkage);
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    assert_eq!(failure.unresolved.len(), 1);
    assert!(failure.unresolved[0].description.contains("resolution of `ghost`"));
    assert_eq!(failure.unresolved[0].at.line, 4);
    assert_eq!(failure.unresolved[0].at.column, 5);
}

/// Registers an action whose apply callback fails.
struct BoomSupport;
impl StatementSupport for BoomSupport {
    fn keyword(&self) -> &'static str {
        "boom"
    }

    fn takes_argument(&self) -> bool {
        false
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let root = reactor.root_of(ctx);
        reactor
            .new_inference_action(ctx, "detonation")
            .mutates(root, Phase::SourceLinkage)
            .apply(|_| Err(Error::internal("exploded during apply")));
        Ok(())
    }
}

#[test]
fn failing_apply_aborts_the_source() {
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(BoomSupport))
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .complete("boom", None, 2, 3)
        .end(3, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { failures, .. } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("exploded during apply"));
}

#[test]
fn pass_limit_turns_runaway_builds_into_errors() {
    let mut builder =
        ReactorBuilder::new().with_config(ReactorConfig::new().with_max_passes(0));
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .end(2, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LimitExceeded(_)));
}
