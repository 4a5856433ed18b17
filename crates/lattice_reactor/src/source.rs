//! Per-source build state.

use std::fmt;
use std::sync::Arc;

use lattice_foundation::{Error, Phase};

use crate::action::ActionId;
use crate::namespace::NamespaceStorage;
use crate::stream::StatementSource;
use crate::tree::ContextId;

/// Identifies one source in the build.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u32);

impl SourceId {
    /// Returns the raw index of this source.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

/// What one attempt to complete a phase for a source achieved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SourceProgress {
    /// Nothing moved; the source is waiting on something external to it.
    NoProgress,
    /// Part of the tree completed, but the root has not.
    Progress,
    /// The source completed the phase.
    Finished,
}

/// Build state of one source: its stream, root context, source-local
/// namespace storage, import edges, and owned inference actions.
pub(crate) struct SourceContext {
    pub(crate) name: Arc<str>,
    /// Taken out during stream replay, present otherwise.
    pub(crate) stream: Option<Box<dyn StatementSource>>,
    pub(crate) root: Option<ContextId>,
    pub(crate) storage: NamespaceStorage,
    /// Sources whose source-local namespaces this source may read.
    pub(crate) imports: Vec<SourceId>,
    /// Actions registered by this source, for stuck-source diagnostics.
    pub(crate) actions: Vec<ActionId>,
    pub(crate) completed: Phase,
    /// Set when an error aborts this source's processing.
    pub(crate) failure: Option<Error>,
}

impl SourceContext {
    pub(crate) fn new(stream: Box<dyn StatementSource>) -> Self {
        let name = Arc::from(stream.name());
        Self {
            name,
            stream: Some(stream),
            root: None,
            storage: NamespaceStorage::new(),
            imports: Vec::new(),
            actions: Vec::new(),
            completed: Phase::Init,
            failure: None,
        }
    }
}

impl fmt::Debug for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceContext")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("completed", &self.completed)
            .field("imports", &self.imports)
            .field("failed", &self.failure.is_some())
            .finish_non_exhaustive()
    }
}
