//! Error types for the Lattice build.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Two families of failures exist. Recoverable failures (malformed input,
//! unresolvable cross-references, exceeded build limits) surface as [`Error`]
//! values from the build call. Contract violations, where a statement-support
//! plugin breaks a reactor invariant, panic instead; they indicate a bug in
//! the plugin, not bad input.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::phase::Phase;
use crate::source::SourceRef;

/// Convenience alias for results carrying a Lattice [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The main error type for Lattice operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a malformed-statement error.
    #[must_use]
    pub fn malformed(message: impl Into<String>, at: SourceRef) -> Self {
        Self::new(ErrorKind::MalformedStatement {
            message: message.into(),
            at,
        })
    }

    /// Creates an unknown-statement error.
    #[must_use]
    pub fn unknown_statement(keyword: impl Into<String>, at: SourceRef) -> Self {
        Self::new(ErrorKind::UnknownStatement {
            keyword: keyword.into(),
            at,
        })
    }

    /// Creates a duplicate-binding error.
    #[must_use]
    pub fn duplicate_binding(namespace: &'static str, key: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateBinding {
            namespace,
            key: key.into(),
        })
    }

    /// Creates a forbidden-binding error.
    #[must_use]
    pub fn forbidden_binding(namespace: &'static str, scope: &'static str) -> Self {
        Self::new(ErrorKind::ForbiddenBinding { namespace, scope })
    }

    /// Creates a build-limit error.
    #[must_use]
    pub fn limit_exceeded(limit: BuildLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A statement or its argument is malformed at a specific location.
    #[error("malformed statement at {at}: {message}")]
    MalformedStatement {
        /// Description of the problem.
        message: String,
        /// Where the statement appears.
        at: SourceRef,
    },

    /// A statement keyword has no registered support in a phase that
    /// requires full recognition.
    #[error("unknown statement keyword `{keyword}` at {at}")]
    UnknownStatement {
        /// The unrecognized keyword.
        keyword: String,
        /// Where the statement appears.
        at: SourceRef,
    },

    /// A (namespace, key) pair was bound twice in the same storage node.
    #[error("duplicate binding in namespace `{namespace}`: {key}")]
    DuplicateBinding {
        /// The namespace name.
        namespace: &'static str,
        /// The offending key, rendered for diagnostics.
        key: String,
    },

    /// A namespace was bound against a storage node of the wrong kind.
    #[error("namespace `{namespace}` cannot be bound at {scope} scope")]
    ForbiddenBinding {
        /// The namespace name.
        namespace: &'static str,
        /// The scope kind the binding was attempted at.
        scope: &'static str,
    },

    /// One source could not complete a phase.
    #[error("{0}")]
    SourceStuck(SourceFailure),

    /// The build terminated with unfinished sources.
    #[error("build failed during {phase}:\n{failures}")]
    BuildFailed {
        /// The phase whose fixpoint loop terminated without progress.
        phase: Phase,
        /// One diagnostic per stuck source.
        failures: FailureReport,
    },

    /// A build limit (kill switch) was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(BuildLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Build limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildLimit {
    /// Maximum fixpoint passes within one phase exceeded.
    MaxPasses {
        /// The configured limit.
        limit: u32,
        /// The phase whose loop overran.
        phase: Phase,
    },
    /// Maximum inference actions registered by one source exceeded.
    MaxActions {
        /// The configured limit.
        limit: u32,
        /// The offending source.
        source: String,
    },
}

impl fmt::Display for BuildLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPasses { limit, phase } => {
                write!(f, "max fixpoint passes ({limit}) exceeded during {phase}")
            }
            Self::MaxActions { limit, source } => {
                write!(
                    f,
                    "max inference actions ({limit}) exceeded by source {source}"
                )
            }
        }
    }
}

/// A diagnostic for one inference action that never completed.
#[derive(Debug, Clone)]
pub struct ActionDiagnostic {
    /// What the action was trying to do, e.g. `import of module \`base\``.
    pub description: String,
    /// Where the originating statement appears.
    pub at: SourceRef,
}

impl fmt::Display for ActionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.description, self.at)
    }
}

/// Why one source could not finish a phase.
#[derive(Debug)]
pub struct SourceFailure {
    /// Name of the stuck source.
    pub source: Arc<str>,
    /// The phase it could not complete.
    pub phase: Phase,
    /// Location of the source's root statement, if one was built.
    pub at: Option<SourceRef>,
    /// Inference actions owned by this source that never resolved.
    pub unresolved: Vec<ActionDiagnostic>,
    /// Foreign inference actions whose pending mutations block this source.
    pub blocking: Vec<ActionDiagnostic>,
    /// The error that aborted this source's processing, if any.
    pub cause: Option<Box<Error>>,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source {} stuck in {}", self.source, self.phase)?;
        if let Some(at) = &self.at {
            write!(f, " (root at {at})")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\n  caused by: {cause}")?;
        }
        for action in &self.unresolved {
            write!(f, "\n  unresolved: {action}")?;
        }
        for action in &self.blocking {
            write!(f, "\n  blocked by: {action}")?;
        }
        Ok(())
    }
}

/// An ordered collection of per-source failures, rendered one block each.
#[derive(Debug, Default)]
pub struct FailureReport(pub Vec<SourceFailure>);

impl FailureReport {
    /// Returns the number of stuck sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no source failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the per-source failures.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFailure> {
        self.0.iter()
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The location the error is attributed to.
    pub at: Option<SourceRef>,
    /// Stack of processing steps leading to the error.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attributed location.
    #[must_use]
    pub fn with_at(mut self, at: SourceRef) -> Self {
        self.at = Some(at);
        self
    }

    /// Adds a processing-step frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(at) = &self.at {
            write!(f, "at {at}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
