//! Base statement bundle for the Lattice reactor.
//!
//! This crate provides:
//! - [`register_base_bundles`] - Per-phase bundles for module identity,
//!   linkage, the data-node tree, and augments
//! - [`ModuleNamespace`] / [`PrefixNamespace`] / [`SchemaNodeNamespace`] -
//!   The build namespaces those supports cross-reference through
//! - [`NodePath`] - Descendant paths addressing data nodes
//!
//! The bundle is a reference plugin set: it exercises every reactor
//! mechanism (global and source-local namespaces, a derived namespace,
//! phase and namespace prerequisites, mutations, coalescing) without
//! attempting to be a complete schema-language definition.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod namespaces;
mod support;

pub use namespaces::{
    ModuleNamespace, ModuleRef, ModuleSourceNamespace, NodePath, PrefixNamespace,
    SchemaNodeNamespace, SubmoduleNamespace,
};
pub use support::{
    AugmentSupport, DataNodeSupport, ImportSupport, IncludeSupport, ModuleSupport, PlainSupport,
    SubmoduleSupport, data_node_path, is_data_keyword, parse_target_path, register_base_bundles,
};
