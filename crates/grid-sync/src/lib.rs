//! Client-side synchronization engine for position-ordered data grids.
//!
//! This crate is transport-agnostic: it drives any [`GridClient`]
//! implementation and owns everything between the UI and the wire:
//! - An optimistic mutation pipeline (snapshot, speculative apply, dispatch,
//!   commit-or-rollback, reconciling refetch)
//! - Temporary-id minting and re-keying for optimistically created entities
//! - A paginated row cache with cross-page position shifts and advisory
//!   prefetch
//! - Bulk insert job tracking with polled progress
//! - Debounced, deduplicated persistence of view configurations and column
//!   widths
//! - An in-memory backend for tests and offline development

mod bulk;
mod client;
mod debounce;
mod error;
mod mem;
mod pages;
mod session;
mod views;

pub use bulk::BulkJobTracker;
pub use client::{BulkJobStatus, GridClient, JobStatus, RowPage, MAX_PAGE_SIZE};
pub use debounce::Debouncer;
pub use error::{Result, SyncError};
pub use mem::MemoryBackend;
pub use pages::{CacheStats, PageCache};
pub use session::{SessionConfig, TableSession};
pub use views::ViewConfigSync;
