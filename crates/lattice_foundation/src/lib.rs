//! Core types for the Lattice schema build.
//!
//! This crate provides:
//! - [`Phase`] - The ordered build phases
//! - [`SourceRef`] - Source document locations for diagnostics
//! - [`KindId`] / [`Interner`] - Interned statement keywords
//! - [`StatementId`] - Sibling-unique statement identifiers
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod ident;
mod intern;
mod phase;
mod source;

pub use error::{
    ActionDiagnostic, BuildLimit, Error, ErrorContext, ErrorKind, FailureReport, Result,
    SourceFailure,
};
pub use ident::StatementId;
pub use intern::{Interner, KindId};
pub use phase::Phase;
pub use source::SourceRef;
