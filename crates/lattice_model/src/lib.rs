//! Immutable output model for the Lattice schema build.
//!
//! This crate provides:
//! - [`DeclaredStatement`] - A statement as written (syntax level)
//! - [`EffectiveStatement`] - A statement after inference (semantics level)
//! - [`ModuleSchema`] / [`SchemaContext`] - The assembled build output

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod declared;
mod effective;
mod schema;

pub use declared::DeclaredStatement;
pub use effective::EffectiveStatement;
pub use schema::{ModuleSchema, SchemaContext};
