//! Store module: the shared-note document table and its satellites.
//!
//! Split in two:
//! - `model`: row shapes returned by queries.
//! - `repo`: SQL-only functions that map rows into entities.
//!
//! External modules should import from `pairnote::db`; the repository API
//! is re-exported here.

pub mod model;
pub mod repo;

pub use model::PendingEvent;
pub use repo::*;
