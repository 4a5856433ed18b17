//! Integration tests for statement-writer behavior across phases.

use lattice_foundation::{ErrorKind, Phase, Result, SourceRef};
use lattice_reactor::{ReactorBuilder, RecordedStream, StatementSource, StatementWriter};

use crate::common::Plain;

fn builder_with(keywords: &[(&'static str, bool)]) -> ReactorBuilder {
    let mut builder = ReactorBuilder::new();
    for (keyword, takes_argument) in keywords {
        builder
            .add_support(Phase::SourcePreLinkage, Plain::support(keyword, *takes_argument))
            .unwrap();
    }
    builder
}

#[test]
fn unknown_keywords_are_skipped_early_and_rejected_late() {
    // `mystery` has no support: silently skipped in the linkage phases,
    // a hard error once full recognition is required
    let mut builder = builder_with(&[("module", true)]);
    let stream = RecordedStream::new("m.schema")
        .start("module", 1, 1)
        .argument("m", 1, 8)
        .start("mystery", 2, 3)
        .argument("?", 2, 11)
        .complete("mystery-child", None, 3, 5)
        .end(4, 3)
        .end(5, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::StatementDefinition);
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("unknown statement keyword `mystery`"));
    assert!(format!("{cause}").contains("m.schema:2:3"));
}

#[test]
fn missing_required_argument_is_a_source_error() {
    let mut builder = builder_with(&[("module", true)]);
    let stream = RecordedStream::new("m.schema").start("module", 1, 1).end(2, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { phase, failures } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    assert_eq!(phase, Phase::SourcePreLinkage);
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("missing its argument"));
}

#[test]
fn unterminated_streams_are_rejected() {
    let mut builder = builder_with(&[("module", true)]);
    let stream = RecordedStream::new("m.schema").start("module", 1, 1).argument("m", 1, 8);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { failures, .. } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("unterminated statement"));
}

#[test]
fn arguments_outside_statements_are_rejected() {
    let mut builder = builder_with(&[("module", true)]);
    let stream = RecordedStream::new("m.schema").argument("stray", 1, 1);
    builder.add_source(Box::new(stream));

    let err = builder.into_reactor().build().unwrap_err();
    let ErrorKind::BuildFailed { failures, .. } = err.kind else {
        panic!("expected an aggregate build failure");
    };
    let failure = failures.iter().next().unwrap();
    let cause = failure.cause.as_ref().unwrap();
    assert!(format!("{cause}").contains("argument outside any statement"));
}

/// Emits the full tree in the linkage phases, then switches to
/// `resume_statement` and appends one new substatement.
struct PhasedSource;

impl PhasedSource {
    fn here(line: u32, column: u32) -> SourceRef {
        SourceRef::new("phased.schema", line, column)
    }
}

impl StatementSource for PhasedSource {
    fn name(&self) -> &str {
        "phased.schema"
    }

    fn replay(&mut self, phase: Phase, writer: &mut StatementWriter<'_>) -> Result<()> {
        if phase < Phase::StatementDefinition {
            writer.start_statement("module", Self::here(1, 1))?;
            writer.set_argument("m", Self::here(1, 8))?;
            writer.start_statement("alpha", Self::here(2, 3))?;
            writer.set_argument("a", Self::here(2, 9))?;
            writer.end_statement(Self::here(2, 20))?;
            writer.end_statement(Self::here(3, 1))?;
        } else {
            writer.resume_statement(0)?;
            writer.start_statement("beta", Self::here(4, 3))?;
            writer.set_argument("b", Self::here(4, 8))?;
            writer.end_statement(Self::here(4, 20))?;
            writer.end_statement(Self::here(5, 1))?;
        }
        Ok(())
    }
}

#[test]
fn resume_preserves_existing_substatements_and_appends_new_ones() {
    let mut builder = builder_with(&[("module", true), ("alpha", true), ("beta", true)]);
    builder.add_source(Box::new(PhasedSource));

    let context = builder.into_reactor().build().unwrap();
    let module = context.module("m").unwrap();
    let keywords: Vec<&str> = module
        .declared()
        .substatements()
        .iter()
        .map(|s| s.keyword())
        .collect();
    assert_eq!(keywords, vec!["alpha", "beta"]);
    assert_eq!(module.declared().find_all("alpha").count(), 1);
    assert_eq!(module.declared().find_all("beta").count(), 1);
}
