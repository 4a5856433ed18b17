//! End-to-end integration tests
//!
//! Full builds through the base bundle: imports, includes, augments, and
//! the failure modes of each.

mod build;
