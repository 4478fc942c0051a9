#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Loader Core
//!
//! Batch-loading and request-coalescing core, the "DataLoader" pattern:
//! collect the single-key lookups issued during one logical request,
//! deduplicate them, execute exactly one bulk fetch per unique key set, and
//! redistribute the results to every original caller in the correct order.
//! O(N) per-item fetches become O(1) per distinct-key-set fetches.
//!
//! ## Architecture
//!
//! A [`Loader`] owns one pending-request queue and one per-scope cache for
//! a single relation (say, "author by id"). A scope bundles one fresh
//! loader per relation and lives for exactly one inbound request; caching
//! never crosses scopes. The bulk fetch itself is an injected
//! [`BatchFn`] collaborator, and a [`FlushObserver`] is notified once per
//! flush so measurement harnesses can count real bulk operations.
//!
//! ## Module Organization
//!
//! - [`loader`] - The coalescing scheduler, queue, and scope cache
//! - [`batch_fn`] - Bulk-fetch traits implemented by collaborators
//! - [`metrics`] - Flush observer hook and the read/reset counter
//! - [`catalog`] - Seeded demo domain showing naive vs coalesced resolution
//! - [`config`] - Flush window and timeout configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use loader_core::catalog::{CatalogScope, CatalogStore};
//! use loader_core::{FlushCounter, LoaderConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(CatalogStore::seeded());
//! let metrics = Arc::new(FlushCounter::new());
//!
//! // One scope per logical request.
//! let scope = CatalogScope::new(Arc::clone(&store), metrics.clone(), LoaderConfig::default());
//! let page = scope.books_page_with_relations(10, 0).await?;
//!
//! // Two flushes: one for authors, one for reviews - not twenty.
//! println!("resolved {} books with {} bulk fetches", page.len(), metrics.flushes());
//! # Ok(())
//! # }
//! ```

pub mod batch_fn;
pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod metrics;

pub use batch_fn::{BatchFetchMany, BatchFetchOne, BatchFn};
pub use config::LoaderConfig;
pub use error::{BatchError, LoadError, LoadResult};
pub use loader::Loader;
pub use metrics::{FlushCounter, FlushObserver, NoopFlushObserver};
