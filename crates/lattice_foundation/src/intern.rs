//! Statement keyword interning.
//!
//! Statement keywords are interned to a compact [`KindId`] so that sibling
//! indexes and bundle registries can key on a `u32` instead of a string.
//! The interner is owned by the reactor and threaded explicitly; there is
//! no process-wide state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interned statement-keyword identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct KindId(pub(crate) u32);

impl KindId {
    /// Returns the raw index of this kind.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KindId({})", self.0)
    }
}

/// Interner for statement keywords.
///
/// Maps keyword strings to unique [`KindId`]s and back. Not thread-safe;
/// the owning reactor serializes all access.
#[derive(Clone, Debug, Default)]
pub struct Interner {
    keywords: Vec<Arc<str>>,
    map: HashMap<Arc<str>, KindId>,
}

impl Interner {
    /// Creates a new empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a keyword, returning its id. Idempotent.
    pub fn intern(&mut self, keyword: &str) -> KindId {
        if let Some(&id) = self.map.get(keyword) {
            return id;
        }
        let arc: Arc<str> = Arc::from(keyword);
        let id = KindId(u32::try_from(self.keywords.len()).expect("keyword interner overflow"));
        self.keywords.push(Arc::clone(&arc));
        self.map.insert(arc, id);
        id
    }

    /// Looks up a previously interned keyword.
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<KindId> {
        self.map.get(keyword).copied()
    }

    /// Resolves an id back to its keyword.
    ///
    /// # Panics
    /// Panics if the id was not produced by this interner.
    #[must_use]
    pub fn resolve(&self, id: KindId) -> &str {
        &self.keywords[id.0 as usize]
    }

    /// Resolves an id to a shared copy of its keyword.
    ///
    /// # Panics
    /// Panics if the id was not produced by this interner.
    #[must_use]
    pub fn resolve_arc(&self, id: KindId) -> Arc<str> {
        Arc::clone(&self.keywords[id.0 as usize])
    }

    /// Returns the number of interned keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
