//! Integration tests for the phase sequence.

use lattice_foundation::Phase;

#[test]
fn execution_covers_every_phase_after_init() {
    assert_eq!(Phase::EXECUTION.len(), 5);
    assert_eq!(Phase::EXECUTION.first(), Some(&Phase::SourcePreLinkage));
    assert_eq!(Phase::EXECUTION.last(), Some(&Phase::EffectiveModel));
    assert!(!Phase::EXECUTION.contains(&Phase::Init));
}

#[test]
fn sequence_is_strictly_increasing() {
    let mut previous = Phase::Init;
    for phase in Phase::EXECUTION {
        assert!(phase > previous);
        previous = phase;
    }
}

#[test]
fn next_and_previous_are_inverses() {
    for phase in Phase::EXECUTION {
        let before = phase.previous().unwrap();
        assert_eq!(before.next(), Some(phase));
    }
}

#[test]
fn display_is_stable() {
    let rendered: Vec<String> = Phase::EXECUTION.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "source-pre-linkage",
            "source-linkage",
            "statement-definition",
            "full-declaration",
            "effective-model",
        ]
    );
}
