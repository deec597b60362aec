//! `notifelect` — leader election among peer processes that share a
//! relational database providing NOTIFY/LISTEN and a monotonic counter.
//!
//! Peers learn of each other only through notifications on a shared
//! channel; each peer can at any time ask whether it currently holds
//! leadership via [`election::Outcome::winner`]. See `SPEC_FULL.md` and
//! `DESIGN.md` for the full design.

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod election;
pub mod error;
pub mod factory;
pub mod logging;
pub mod models;
pub mod queries;
pub mod task_manager;

pub use coordinator::{run, CoordinatorHandle};
pub use election::Outcome;
pub use error::Error;
