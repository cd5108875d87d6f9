//! Coordination core for an online word-category game ("stop" / alphabet
//! game). Two clients agree on a pairing, a shared round and an exchange of
//! graded results through nothing but a shared key-value store: there is no
//! server-side logic and no direct client-to-client channel.
//!
//! - [`repositories`] — storage access: the [`repositories::kv_store::KeyValueStore`]
//!   seam plus the queue and room records kept on top of it.
//! - [`services`] — pairing, result exchange, answer grading, the per-client
//!   round state machine and the orchestrating coordinator.
//! - [`models`] — the shared record types.

pub mod models;
pub mod repositories;
pub mod services;
