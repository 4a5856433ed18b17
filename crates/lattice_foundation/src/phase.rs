//! The ordered build phases.
//!
//! A build walks a fixed sequence of phases; every statement context records
//! the last phase it completed. The ordering is total, and a context's
//! completed phase is monotonically non-decreasing for the life of a build.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One stage of the fixed build pipeline.
///
/// `Init` is the state of a freshly created context; it is never executed as
/// a phase. The remaining phases run in declaration order, each gated on
/// every source having completed its predecessor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Initial state; nothing has been processed.
    Init,
    /// Module identities and linkage statements are discovered.
    SourcePreLinkage,
    /// Cross-source linkage (imports, includes) is resolved.
    SourceLinkage,
    /// The full statement tree is populated.
    StatementDefinition,
    /// Declared statement trees are finalized.
    FullDeclaration,
    /// Effective statement trees (inheritance, augmentation) are finalized.
    EffectiveModel,
}

impl Phase {
    /// The phases a build executes, in order. Excludes `Init`.
    pub const EXECUTION: [Phase; 5] = [
        Phase::SourcePreLinkage,
        Phase::SourceLinkage,
        Phase::StatementDefinition,
        Phase::FullDeclaration,
        Phase::EffectiveModel,
    ];

    /// Returns the phase after this one, or `None` for the last phase.
    #[must_use]
    pub const fn next(self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::SourcePreLinkage),
            Phase::SourcePreLinkage => Some(Phase::SourceLinkage),
            Phase::SourceLinkage => Some(Phase::StatementDefinition),
            Phase::StatementDefinition => Some(Phase::FullDeclaration),
            Phase::FullDeclaration => Some(Phase::EffectiveModel),
            Phase::EffectiveModel => None,
        }
    }

    /// Returns the phase before this one, or `None` for `Init`.
    #[must_use]
    pub const fn previous(self) -> Option<Phase> {
        match self {
            Phase::Init => None,
            Phase::SourcePreLinkage => Some(Phase::Init),
            Phase::SourceLinkage => Some(Phase::SourcePreLinkage),
            Phase::StatementDefinition => Some(Phase::SourceLinkage),
            Phase::FullDeclaration => Some(Phase::StatementDefinition),
            Phase::EffectiveModel => Some(Phase::FullDeclaration),
        }
    }

    /// Returns true if this phase is at or past `other`.
    #[must_use]
    pub fn is_at_least(self, other: Phase) -> bool {
        self >= other
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::SourcePreLinkage => "source-pre-linkage",
            Phase::SourceLinkage => "source-linkage",
            Phase::StatementDefinition => "statement-definition",
            Phase::FullDeclaration => "full-declaration",
            Phase::EffectiveModel => "effective-model",
        };
        write!(f, "{name}")
    }
}
