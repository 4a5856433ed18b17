//! Typed namespace storage.
//!
//! A namespace is a typed key/value mapping scoped to one storage node of
//! the build. Namespaces are registered through a typed token (a marker type
//! implementing [`ModelNamespace`]), so every lookup and binding is
//! statically typed; the `Any`-based erasure is an internal detail of the
//! per-node map table.
//!
//! Storage kinds and their escalation chains are fixed by this table; a kind
//! not covered here does not exist, and binding against a mismatched node is
//! an error, never a silent fallback:
//!
//! | kind        | bind node                   | lookup chain                                        |
//! |-------------|-----------------------------|-----------------------------------------------------|
//! | `Statement` | the given statement context | that statement node only                            |
//! | `Source`    | the owning source           | owning source, then each imported source's same map |
//! | `Global`    | the reactor                 | the reactor node only                               |
//!
//! Every (namespace, key) entry is a single-assignment slot: it is either
//! pending with a list of waiting inference actions, or bound exactly once.
//! Binding an already-bound slot is rejected. A successful bind synchronously
//! notifies the slot's own waiters before any derived-namespace subscribers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use lattice_foundation::{Error, Result};

use crate::action::ActionId;
use crate::source::SourceId;
use crate::tree::ContextId;

// =============================================================================
// Storage Kinds and Scopes
// =============================================================================

/// The storage-node kind a namespace binds at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Bound at a single statement context; never escalates.
    Statement,
    /// Bound at the owning source; lookups may consult imported sources.
    Source,
    /// Bound once for the whole build.
    Global,
}

impl StorageKind {
    /// Returns the scope name used in diagnostics.
    #[must_use]
    pub const fn scope_name(self) -> &'static str {
        match self {
            StorageKind::Statement => "statement",
            StorageKind::Source => "source",
            StorageKind::Global => "global",
        }
    }
}

/// A concrete storage node to bind or read at.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StorageScope {
    /// The storage of one statement context.
    Statement(ContextId),
    /// The storage of one source.
    Source(SourceId),
    /// The build-global storage.
    Global,
}

impl StorageScope {
    /// Returns the kind of node this scope names.
    #[must_use]
    pub const fn kind(self) -> StorageKind {
        match self {
            StorageScope::Statement(_) => StorageKind::Statement,
            StorageScope::Source(_) => StorageKind::Source,
            StorageScope::Global => StorageKind::Global,
        }
    }
}

// =============================================================================
// Namespace Traits
// =============================================================================

/// A typed namespace registered with the build.
///
/// Implementors are zero-sized marker types; the trait carries the key and
/// value types plus the storage kind, so reads and writes are statically
/// typed end to end.
pub trait ModelNamespace: 'static {
    /// The key type.
    type Key: Clone + Eq + Hash + fmt::Debug + 'static;
    /// The value type.
    type Value: Clone + fmt::Debug + 'static;
    /// The storage-node kind this namespace binds at.
    const KIND: StorageKind;
    /// The namespace name used in diagnostics.
    const NAME: &'static str;
}

/// A virtual namespace computed from another namespace.
///
/// Derived namespaces are never written directly; every bind to `Base`
/// recomputes the derived entry at the same storage node. Subscribers of the
/// derived namespace are notified after the base namespace's own waiters.
pub trait DerivedNamespace: ModelNamespace {
    /// The namespace this view is derived from.
    type Base: ModelNamespace;

    /// Computes the derived entry for one base binding, or `None` if the
    /// binding contributes nothing to this view.
    fn derive(
        key: &<Self::Base as ModelNamespace>::Key,
        value: &<Self::Base as ModelNamespace>::Value,
    ) -> Option<(Self::Key, Self::Value)>;
}

// =============================================================================
// Slots
// =============================================================================

/// One single-assignment entry: pending with waiters, or bound exactly once.
#[derive(Debug)]
enum Slot<V> {
    Pending { waiters: Vec<ActionId> },
    Bound { value: V },
}

#[derive(Debug)]
struct TypedMap<N: ModelNamespace> {
    slots: HashMap<N::Key, Slot<N::Value>>,
}

impl<N: ModelNamespace> TypedMap<N> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    fn get(&self, key: &N::Key) -> Option<&N::Value> {
        match self.slots.get(key) {
            Some(Slot::Bound { value }) => Some(value),
            _ => None,
        }
    }

    /// Binds a value, returning the waiters to notify.
    fn bind(&mut self, key: N::Key, value: N::Value) -> Result<Vec<ActionId>> {
        match self.slots.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(Slot::Bound { value });
                Ok(Vec::new())
            }
            Entry::Occupied(mut entry) => {
                if matches!(entry.get(), Slot::Bound { .. }) {
                    return Err(Error::duplicate_binding(N::NAME, format!("{:?}", entry.key())));
                }
                match std::mem::replace(entry.get_mut(), Slot::Bound { value }) {
                    Slot::Pending { waiters } => Ok(waiters),
                    Slot::Bound { .. } => unreachable!("bound slots are rejected above"),
                }
            }
        }
    }

    /// Subscribes a waiter to a key. Returns true if the key is already
    /// bound (the waiter is already satisfied and was not recorded).
    fn subscribe(&mut self, key: &N::Key, waiter: ActionId) -> bool {
        match self.slots.entry(key.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(Slot::Pending {
                    waiters: vec![waiter],
                });
                false
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Slot::Bound { .. } => true,
                Slot::Pending { waiters } => {
                    waiters.push(waiter);
                    false
                }
            },
        }
    }

    fn bound_len(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, Slot::Bound { .. }))
            .count()
    }
}

// =============================================================================
// Per-Node Storage
// =============================================================================

trait AnyMap: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn bound_len(&self) -> usize;
}

impl<N: ModelNamespace> AnyMap for TypedMap<N> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn bound_len(&self) -> usize {
        self.bound_len()
    }
}

/// Namespace storage for one node (statement, source, or global).
#[derive(Default)]
pub struct NamespaceStorage {
    maps: HashMap<TypeId, Box<dyn AnyMap>>,
}

impl NamespaceStorage {
    /// Creates empty storage.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn map<N: ModelNamespace>(&self) -> Option<&TypedMap<N>> {
        self.maps.get(&TypeId::of::<N>()).map(|m| {
            m.as_any()
                .downcast_ref::<TypedMap<N>>()
                .expect("namespace map registered under a foreign type id")
        })
    }

    fn map_mut<N: ModelNamespace>(&mut self) -> &mut TypedMap<N> {
        self.maps
            .entry(TypeId::of::<N>())
            .or_insert_with(|| Box::new(TypedMap::<N>::new()))
            .as_any_mut()
            .downcast_mut::<TypedMap<N>>()
            .expect("namespace map registered under a foreign type id")
    }

    /// Returns the bound value for a key at this node, if any.
    pub(crate) fn get<N: ModelNamespace>(&self, key: &N::Key) -> Option<&N::Value> {
        self.map::<N>()?.get(key)
    }

    /// Binds a key at this node, returning the waiters to notify.
    pub(crate) fn bind<N: ModelNamespace>(
        &mut self,
        key: N::Key,
        value: N::Value,
    ) -> Result<Vec<ActionId>> {
        self.map_mut::<N>().bind(key, value)
    }

    /// Subscribes a waiter to a key at this node. Returns true if the key is
    /// already bound.
    pub(crate) fn subscribe<N: ModelNamespace>(&mut self, key: &N::Key, waiter: ActionId) -> bool {
        self.map_mut::<N>().subscribe(key, waiter)
    }

    /// Returns the total number of bound entries across all namespaces.
    pub(crate) fn bound_len(&self) -> usize {
        self.maps.values().map(|m| m.bound_len()).sum()
    }
}

impl fmt::Debug for NamespaceStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NamespaceStorage({} namespaces, {} bindings)",
            self.maps.len(),
            self.bound_len()
        )
    }
}

// =============================================================================
// Derived-Namespace Rules
// =============================================================================

/// Type-erased derivation rule, applied on every bind to its base namespace.
pub(crate) trait DeriveRule {
    fn base(&self) -> TypeId;
    fn name(&self) -> &'static str;
    fn apply(
        &self,
        storage: &mut NamespaceStorage,
        key: &dyn Any,
        value: &dyn Any,
    ) -> Result<Vec<ActionId>>;
}

pub(crate) struct DerivedRegistration<D: DerivedNamespace> {
    _marker: PhantomData<fn() -> D>,
}

impl<D: DerivedNamespace> DerivedRegistration<D> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<D: DerivedNamespace> DeriveRule for DerivedRegistration<D> {
    fn base(&self) -> TypeId {
        TypeId::of::<D::Base>()
    }

    fn name(&self) -> &'static str {
        D::NAME
    }

    fn apply(
        &self,
        storage: &mut NamespaceStorage,
        key: &dyn Any,
        value: &dyn Any,
    ) -> Result<Vec<ActionId>> {
        let key = key
            .downcast_ref::<<D::Base as ModelNamespace>::Key>()
            .expect("derived namespace applied to a foreign key type");
        let value = value
            .downcast_ref::<<D::Base as ModelNamespace>::Value>()
            .expect("derived namespace applied to a foreign value type");
        match D::derive(key, value) {
            Some((derived_key, derived_value)) => storage.bind::<D>(derived_key, derived_value),
            None => Ok(Vec::new()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
