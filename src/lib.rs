//! Lattice - phase-ordered schema build reactor
//!
//! This crate re-exports all layers of the Lattice system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: lattice_base       — Base statement supports and namespaces
//! Layer 2: lattice_reactor    — Build reactor, namespace storage, inference
//! Layer 1: lattice_model      — Immutable declared/effective statement views
//! Layer 0: lattice_foundation — Core types (Phase, SourceRef, Error)
//! ```

pub use lattice_base as base;
pub use lattice_foundation as foundation;
pub use lattice_model as model;
pub use lattice_reactor as reactor;
