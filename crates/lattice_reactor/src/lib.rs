//! The Lattice statement build reactor.
//!
//! This crate provides:
//! - [`BuildReactor`] / [`ReactorBuilder`] - The phase-ordered, fixpoint
//!   build engine
//! - [`StatementSupport`] - The per-statement-kind plugin trait
//! - [`ModelNamespace`] / [`DerivedNamespace`] - Typed cross-reference
//!   namespaces with write-once slots
//! - [`ActionBuilder`] - Prerequisite-gated inference actions
//! - [`StatementWriter`] / [`StatementSource`] - The statement stream
//!   interfaces
//!
//! The reactor is single-threaded and cooperative: every mutation happens
//! synchronously within the build call stack, and the only waiting construct
//! is the prerequisite, resolved inline when the producing write occurs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod action;
mod bundle;
mod config;
mod namespace;
mod reactor;
mod source;
mod stream;
mod tree;
mod writer;


pub use action::{ActionBuilder, ActionId, ActionState};
pub use bundle::StatementSupport;
pub use config::ReactorConfig;
pub use namespace::{DerivedNamespace, ModelNamespace, StorageKind, StorageScope};
pub use reactor::{BuildReactor, ReactorBuilder};
pub use source::{SourceId, SourceProgress};
pub use stream::{RecordedStream, StatementEvent, StatementSource};
pub use tree::{ContextId, StatementOrigin};
pub use writer::StatementWriter;
