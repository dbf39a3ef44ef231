//! Shared primitives for the Velella placement engine.
//!
//! `velella-core` provides the foundation the other Velella crates build on:
//!
//! - **Error types** — [`VelellaError`] and [`Result`] for structured error handling
//! - **Name table** — [`NameTable`], the single owner of sequence id ↔ name mappings
//! - **Hashing** — the CRC-32 routine used for min-hash word sampling
//! - **Cancellation** — [`CancelFlag`], the cooperative abort signal polled by
//!   the indexing and matching loops

pub mod cancel;
pub mod error;
pub mod hash;
pub mod names;

pub use cancel::CancelFlag;
pub use error::{Result, VelellaError};
pub use names::{NameTable, SeqId};
