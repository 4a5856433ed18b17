//! End-to-end builds through the base bundle.

use std::rc::Rc;
use std::sync::Arc;

use lattice_base::{ModuleSourceNamespace, register_base_bundles};
use lattice_foundation::{ErrorKind, Phase, Result};
use lattice_model::SchemaContext;
use lattice_reactor::{
    BuildReactor, ContextId, ReactorBuilder, RecordedStream, StatementSupport, StorageScope,
};

// =============================================================================
// Fixtures
// =============================================================================

/// `module a { prefix a; container box { leaf size } }`
fn base_module() -> RecordedStream {
    RecordedStream::new("a.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .complete("namespace", Some("urn:example:a"), 2, 3)
        .complete("prefix", Some("a"), 3, 3)
        .start("container", 4, 3)
        .argument("box", 4, 12)
        .complete("leaf", Some("size"), 5, 5)
        .end(6, 3)
        .end(7, 1)
}

/// `module b { prefix b; import <target> { prefix a } }` plus extra body.
fn importing_module(target: &str, body: impl FnOnce(RecordedStream) -> RecordedStream) -> RecordedStream {
    let stream = RecordedStream::new("b.schema")
        .start("module", 1, 1)
        .argument("b", 1, 8)
        .complete("prefix", Some("b"), 2, 3)
        .start("import", 3, 3)
        .argument(target, 3, 10)
        .complete("prefix", Some("a"), 4, 5)
        .end(5, 3);
    body(stream).end(9, 1)
}

fn build(sources: Vec<RecordedStream>) -> Result<SchemaContext> {
    let mut builder = ReactorBuilder::new();
    register_base_bundles(&mut builder).unwrap();
    for source in sources {
        builder.add_source(Box::new(source));
    }
    builder.into_reactor().build()
}

// =============================================================================
// Linkage
// =============================================================================

#[test]
fn two_modules_with_an_import_build_to_completion() {
    let context = build(vec![base_module(), importing_module("a", |s| s)]).unwrap();

    assert_eq!(context.len(), 2);
    let a = context.module("a").unwrap();
    assert_eq!(a.keyword(), "module");
    assert_eq!(a.source(), "a.schema");

    let b = context.module("b").unwrap();
    let import = b.declared().find_first("import").unwrap();
    assert_eq!(import.argument(), Some("a"));
}

#[test]
fn missing_import_fails_at_the_linkage_boundary() {
    let err = build(vec![base_module(), importing_module("ghost", |s| s)]).unwrap_err();

    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourceLinkage);
    // only the importing source is stuck
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    assert_eq!(&*failure.source, "b.schema");
    assert_eq!(failure.unresolved.len(), 1);
    let unresolved = &failure.unresolved[0];
    assert!(unresolved.description.contains("import of module `ghost`"));
    assert_eq!(unresolved.at.line, 3);
    assert_eq!(unresolved.at.column, 3);
}

#[test]
fn includes_link_submodules() {
    let module = RecordedStream::new("a.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .complete("prefix", Some("a"), 2, 3)
        .complete("include", Some("a-types"), 3, 3)
        .end(4, 1);
    let submodule = RecordedStream::new("a-types.schema")
        .start("submodule", 1, 1)
        .argument("a-types", 1, 11)
        .complete("belongs-to", Some("a"), 2, 3)
        .end(3, 1);

    let context = build(vec![module, submodule]).unwrap();
    assert_eq!(context.len(), 2);
    assert_eq!(context.module("a").unwrap().keyword(), "module");
    assert_eq!(context.module("a-types").unwrap().keyword(), "submodule");
}

#[test]
fn duplicate_module_names_are_rejected() {
    let first = RecordedStream::new("a1.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .end(2, 1);
    let second = RecordedStream::new("a2.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .end(2, 1);

    let err = build(vec![first, second]).unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourcePreLinkage);
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    assert_eq!(&*failure.source, "a2.schema");
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("duplicate binding"));
}

// =============================================================================
// Augmentation
// =============================================================================

#[test]
fn cross_module_augments_add_inferred_statements() {
    let augmenter = importing_module("a", |s| {
        s.start("augment", 6, 3)
            .argument("/a:box", 6, 12)
            .complete("leaf", Some("extra"), 7, 5)
            .end(8, 3)
    });

    let context = build(vec![base_module(), augmenter]).unwrap();
    let a = context.module("a").unwrap();

    // the declared view stays as written
    let declared_box = a.declared().find_first("container").unwrap();
    assert!(declared_box.find_first("leaf").unwrap().argument() == Some("size"));
    assert_eq!(declared_box.substatements().len(), 1);

    // the effective view carries the augmented leaf, marked inferred
    let effective_box = a.effective().find_first("container").unwrap();
    assert_eq!(effective_box.substatements().len(), 2);
    let extra = effective_box
        .find_all("leaf")
        .find(|leaf| leaf.argument() == Some("extra"))
        .unwrap();
    assert!(extra.is_inferred());
    assert!(extra.declared().is_none());

    // the original leaf still links back to its declared statement
    let size = effective_box
        .find_all("leaf")
        .find(|leaf| leaf.argument() == Some("size"))
        .unwrap();
    assert!(!size.is_inferred());
}

#[test]
fn augment_of_a_missing_target_fails_at_full_declaration() {
    let augmenter = importing_module("a", |s| {
        s.start("augment", 6, 3)
            .argument("/a:nope", 6, 12)
            .complete("leaf", Some("extra"), 7, 5)
            .end(8, 3)
    });

    let err = build(vec![base_module(), augmenter]).unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::FullDeclaration);

    // the augmenting source reports its own unresolved action
    let b = failures.iter().find(|f| &*f.source == "b.schema").unwrap();
    assert_eq!(b.unresolved.len(), 1);
    assert!(b.unresolved[0].description.contains("augment of `/nope`"));
    assert_eq!(b.unresolved[0].at.line, 6);
    assert_eq!(b.unresolved[0].at.column, 3);

    // the target module is blocked by that same action, and says so
    let a = failures.iter().find(|f| &*f.source == "a.schema").unwrap();
    assert!(a.unresolved.is_empty());
    assert_eq!(a.blocking.len(), 1);
    assert!(a.blocking[0].description.contains("augment of `/nope`"));
}

#[test]
fn same_target_augments_coalesce_into_one_context() {
    let module = RecordedStream::new("a.schema")
        .start("module", 1, 1)
        .argument("a", 1, 8)
        .start("container", 2, 3)
        .argument("box", 2, 12)
        .end(3, 3)
        .start("augment", 4, 3)
        .argument("/box", 4, 12)
        .complete("leaf", Some("x"), 5, 5)
        .end(6, 3)
        .start("augment", 7, 3)
        .argument("/box", 7, 12)
        .complete("leaf", Some("y"), 8, 5)
        .end(9, 3)
        .end(10, 1);

    let context = build(vec![module]).unwrap();
    let a = context.module("a").unwrap();

    // the duplicate declaration reused the first context
    assert_eq!(a.declared().find_all("augment").count(), 1);
    let augment = a.declared().find_first("augment").unwrap();
    assert_eq!(augment.substatements().len(), 2);

    // both bodies landed in the target
    let effective_box = a.effective().find_first("container").unwrap();
    let leaves: Vec<_> = effective_box
        .find_all("leaf")
        .map(|leaf| leaf.argument().unwrap().to_string())
        .collect();
    assert_eq!(leaves, vec!["x", "y"]);
    assert!(effective_box.substatements().iter().all(|s| s.is_inferred()));
}

// =============================================================================
// Derived Namespaces
// =============================================================================

/// Waits on the derived module-source view for the named module.
struct SourceProbe;
impl StatementSupport for SourceProbe {
    fn keyword(&self) -> &'static str {
        "source-probe"
    }

    fn on_linkage_declared(&self, reactor: &mut BuildReactor, ctx: ContextId) -> Result<()> {
        let name: Arc<str> = reactor.argument_of(ctx).expect("writer enforces the argument");
        let root = reactor.root_of(ctx);
        reactor
            .new_inference_action(ctx, format!("source of module `{name}`"))
            .require_namespace::<ModuleSourceNamespace>(StorageScope::Global, name)
            .mutates(root, Phase::SourceLinkage)
            .apply(|_| Ok(()));
        Ok(())
    }
}

#[test]
fn derived_module_source_view_tracks_module_registration() {
    let mut builder = ReactorBuilder::new();
    register_base_bundles(&mut builder).unwrap();
    builder
        .add_support(Phase::SourceLinkage, Rc::new(SourceProbe))
        .unwrap();

    let prober = RecordedStream::new("p.schema")
        .start("module", 1, 1)
        .argument("p", 1, 8)
        .complete("source-probe", Some("a"), 2, 3)
        .end(3, 1);

    // resolves only because every module registration also feeds the
    // derived name-to-source view
    let context = build_with(builder, vec![base_module(), prober]).unwrap();
    assert_eq!(context.len(), 2);
}

fn build_with(
    mut builder: ReactorBuilder,
    sources: Vec<RecordedStream>,
) -> Result<SchemaContext> {
    for source in sources {
        builder.add_source(Box::new(source));
    }
    builder.into_reactor().build()
}
