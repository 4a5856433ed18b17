//! Integration tests for namespace storage semantics.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use lattice_foundation::{ErrorKind, Phase, Result};
use lattice_reactor::{
    BuildReactor, ContextId, ModelNamespace, ReactorBuilder, RecordedStream, StatementSupport,
    StorageKind, StorageScope,
};

use crate::common::Plain;

struct TagNs;
impl ModelNamespace for TagNs {
    type Key = Arc<str>;
    type Value = u32;
    const KIND: StorageKind = StorageKind::Global;
    const NAME: &'static str = "tag";
}

struct LocalNs;
impl ModelNamespace for LocalNs {
    type Key = Arc<str>;
    type Value = u32;
    const KIND: StorageKind = StorageKind::Statement;
    const NAME: &'static str = "local";
}

struct SourceNs;
impl ModelNamespace for SourceNs {
    type Key = Arc<str>;
    type Value = u32;
    const KIND: StorageKind = StorageKind::Source;
    const NAME: &'static str = "per-source";
}

/// Binds its argument into the global tag namespace at pre-linkage.
struct TagSupport;
impl StatementSupport for TagSupport {
    fn keyword(&self) -> &'static str {
        "tag"
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name = reactor.argument_of(ctx).expect("writer enforces the argument");
        reactor.namespace_put::<TagNs>(StorageScope::Global, name, 1)
    }
}

#[test]
fn second_binding_of_a_key_fails_the_source() {
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(TagSupport))
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .complete("tag", Some("x"), 2, 3)
        .complete("tag", Some("x"), 3, 3)
        .end(4, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourcePreLinkage);
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().expect("binding failure is recorded");
    assert!(format!("{cause}").contains("duplicate binding"));
}

/// Binds a global namespace at statement scope, which must be rejected.
struct MisboundSupport;
impl StatementSupport for MisboundSupport {
    fn keyword(&self) -> &'static str {
        "misbound"
    }

    fn takes_argument(&self) -> bool {
        false
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        reactor.namespace_put::<TagNs>(StorageScope::Statement(ctx), Arc::from("x"), 1)
    }
}

#[test]
fn binding_at_a_mismatched_scope_is_rejected() {
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(MisboundSupport))
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .complete("misbound", None, 2, 3)
        .end(3, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { failures, .. } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("cannot be bound at statement scope"));
}

/// Binds a statement-local entry at pre-linkage and probes visibility at
/// linkage: visible at the owning statement, invisible at the root.
struct LocalProbe {
    seen: Rc<RefCell<Option<(bool, bool)>>>,
}

impl StatementSupport for LocalProbe {
    fn keyword(&self) -> &'static str {
        "probe"
    }

    fn takes_argument(&self) -> bool {
        false
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        reactor.namespace_put::<LocalNs>(StorageScope::Statement(ctx), Arc::from("k"), 7)
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let key: Arc<str> = Arc::from("k");
        let at_statement = reactor.namespace_get::<LocalNs>(ctx, &key).is_some();
        let at_root = reactor
            .namespace_get::<LocalNs>(reactor.root_of(ctx), &key)
            .is_some();
        *self.seen.borrow_mut() = Some((at_statement, at_root));
        Ok(())
    }
}

#[test]
fn statement_local_bindings_never_escalate() {
    let seen = Rc::new(RefCell::new(None));
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(
            Phase::SourcePreLinkage,
            Rc::new(LocalProbe {
                seen: Rc::clone(&seen),
            }),
        )
        .unwrap();
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .complete("probe", None, 2, 3)
        .end(3, 1);
    builder.add_source(Box::new(stream));

    builder.into_reactor().build().unwrap();
    assert_eq!(*seen.borrow(), Some((true, false)));
}

/// Binds a source-local entry in its own source.
struct GiveSupport;
impl StatementSupport for GiveSupport {
    fn keyword(&self) -> &'static str {
        "give"
    }

    fn on_pre_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let key = reactor.argument_of(ctx).expect("writer enforces the argument");
        let source = reactor.source_of(ctx);
        reactor.namespace_put::<SourceNs>(StorageScope::Source(source), key, 1)
    }
}

/// Waits for a source-local entry in its own source.
struct WantSupport;
impl StatementSupport for WantSupport {
    fn keyword(&self) -> &'static str {
        "want"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let key = reactor.argument_of(ctx).expect("writer enforces the argument");
        let source = reactor.source_of(ctx);
        let root = reactor.root_of(ctx);
        reactor
            .new_inference_action(ctx, format!("waiting for `{key}`"))
            .require_namespace::<SourceNs>(StorageScope::Source(source), key)
            .mutates(root, Phase::SourceLinkage)
            .apply(|_| Ok(()));
        Ok(())
    }
}

#[test]
fn source_local_bindings_are_invisible_without_an_import_edge() {
    let mut builder = ReactorBuilder::new();
    builder
        .add_support(Phase::SourcePreLinkage, Plain::support("module", true))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(GiveSupport))
        .unwrap();
    builder
        .add_support(Phase::SourcePreLinkage, Rc::new(WantSupport))
        .unwrap();

    let giver = RecordedStream::new("giver.schema")
        .start("module", 1, 1)
        .argument("giver", 1, 8)
        .complete("give", Some("k"), 2, 3)
        .end(3, 1);
    let wanter = RecordedStream::new("wanter.schema")
        .start("module", 1, 1)
        .argument("wanter", 1, 8)
        .complete("want", Some("k"), 2, 3)
        .end(3, 1);
    builder.add_source(Box::new(giver));
    builder.add_source(Box::new(wanter));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourceLinkage);
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    assert_eq!(&*failure.source, "wanter.schema");
    assert!(failure.unresolved[0].description.contains("waiting for `k`"));
}
