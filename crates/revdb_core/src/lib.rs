//! # RevDB Core
//!
//! Revisioned document storage on top of an embedded transactional
//! key-value engine.
//!
//! This crate provides:
//! - Namespace stores holding document records, content blobs and a
//!   secondary key index
//! - Operations that enforce optimistic locking through document revisions
//! - Drivers that coordinate access to the store file, either opening it per
//!   operation ([`SharedDriver`]) or holding it open ([`ExclusiveDriver`])
//! - A typed [`DocStore`] facade
//!
//! ## Example
//!
//! ```rust,no_run
//! use revdb_core::{Context, DocStore, Document, DriverConfig, SharedDriver};
//!
//! # fn main() -> revdb_core::CoreResult<()> {
//! let store = DocStore::new(SharedDriver::new(DriverConfig::new("app.redb")));
//! let ctx = Context::background();
//!
//! let doc = Document::new("alice", b"hello".to_vec()).with_unique_key("alice@example.com");
//! let saved = store.save(&ctx, "users", doc)?;
//!
//! // Saving again requires the revision we last saw.
//! let mut update = saved.clone();
//! update.content = b"hello again".to_vec();
//! store.save(&ctx, "users", update)?;
//!
//! // `saved` is stale now.
//! let err = store.delete(&ctx, "users", "alice", saved.revision).unwrap_err();
//! assert!(err.as_optimistic_lock().is_some());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod docstore;
mod document;
mod driver;
mod error;
pub mod ops;
pub mod store;
mod types;

pub use config::{DriverConfig, EngineOptions, DEFAULT_LOCK_POLL_INTERVAL, DEFAULT_MODE};
pub use context::{CancelHandle, Context};
pub use docstore::DocStore;
pub use document::Document;
pub use driver::{Driver, ExclusiveDriver, SharedDriver};
pub use error::{CoreError, CoreResult, OptimisticLockError};
pub use ops::{
    execute_delete, execute_save, OpDelete, OpFetchAll, OpFetchByKey, OpLoad, OpLoadMany, OpSave,
    UpdateOp, ViewOp,
};
pub use store::{ReadStore, Record, StoreRead, WriteStore};
pub use types::{DocumentId, Headers, KeyType, Keys, Revision};

/// Engine transaction types that operations receive.
pub use redb::{ReadTransaction, WriteTransaction};
