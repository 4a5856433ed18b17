//! Integration tests for error construction and rendering.

use std::sync::Arc;

use lattice_foundation::{
    ActionDiagnostic, BuildLimit, Error, ErrorKind, FailureReport, Phase, SourceFailure, SourceRef,
};

fn stuck_source(name: &str, description: &str) -> SourceFailure {
    SourceFailure {
        source: Arc::from(name),
        phase: Phase::SourceLinkage,
        at: Some(SourceRef::new(name, 1, 1)),
        unresolved: vec![ActionDiagnostic {
            description: description.to_string(),
            at: SourceRef::new(name, 3, 3),
        }],
        blocking: Vec::new(),
        cause: None,
    }
}

#[test]
fn build_failure_renders_every_stuck_source() {
    let err = Error::new(ErrorKind::BuildFailed {
        phase: Phase::SourceLinkage,
        failures: FailureReport(vec![
            stuck_source("b.schema", "import of module `a`"),
            stuck_source("c.schema", "import of module `b`"),
        ]),
    });
    let message = format!("{err}");
    assert!(message.contains("build failed during source-linkage"));
    assert!(message.contains("source b.schema stuck"));
    assert!(message.contains("source c.schema stuck"));
    assert!(message.contains("import of module `a` (at b.schema:3:3)"));
}

#[test]
fn source_failures_render_their_cause() {
    let failure = SourceFailure {
        source: Arc::from("m.schema"),
        phase: Phase::SourcePreLinkage,
        at: None,
        unresolved: Vec::new(),
        blocking: Vec::new(),
        cause: Some(Box::new(Error::malformed(
            "argument redeclared",
            SourceRef::new("m.schema", 2, 5),
        ))),
    };
    let message = format!("{failure}");
    assert!(message.contains("caused by"));
    assert!(message.contains("m.schema:2:5"));
}

#[test]
fn limits_render_their_phase() {
    let err = Error::limit_exceeded(BuildLimit::MaxPasses {
        limit: 7,
        phase: Phase::FullDeclaration,
    });
    let message = format!("{err}");
    assert!(message.contains("max fixpoint passes (7)"));
    assert!(message.contains("full-declaration"));
}

#[test]
fn malformed_statements_point_at_their_location() {
    let err = Error::malformed("unexpected argument", SourceRef::new("x.schema", 9, 14));
    assert!(format!("{err}").contains("x.schema:9:14"));
}
