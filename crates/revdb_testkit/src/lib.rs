//! # RevDB Testkit
//!
//! Test utilities for RevDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - A model-checking harness for document and index consistency
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use revdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_shared_store(|store, ctx| {
//!         store.save(ctx, "users", Document::new("alice", Vec::new())).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
    pub use revdb_core::{Context, DocStore, Document, DocumentId, KeyType, Revision};
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
