//! Match queue and session storage for Parlor.
//!
//! This crate owns the two shared mutable resources of the engine: the
//! per-game FIFO queues of waiting players and the session store with its
//! user → room reverse index. Both sit behind the [`MatchStore`] trait so
//! the coordinators are written against an atomic-operation contract, not
//! a concrete store: [`MemoryStore`] serves tests and single-process
//! deployments, and a networked implementation can honor the same
//! contract with transactions.
//!
//! # Atomicity contract
//!
//! Every trait method is atomic with respect to concurrent callers. In
//! particular `dequeue_up_to` never hands the same entry to two callers,
//! and `insert_session` persists the session and both players' index
//! entries in one step.

mod error;
mod memory;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::MatchStore;
pub use types::{QueueEntry, unix_millis};
