//! Record model, error taxonomy, worker pool and collaborator contracts for
//! the library-arbitration engine.
//!
//! This crate contains the shared plumbing every other crate in the
//! workspace depends on: no enrichment, filtering, or action logic lives
//! here.

pub mod cache;
pub mod collaborators;
pub mod error;
pub mod models;
pub mod pool;
pub mod ttl_cache;

pub use error::{CollaboratorErrorKind, LibraryError, Result};
pub use pool::WorkerPool;
