//! Authoritative in-memory state: accounts and the game catalogue, with
//! crash-atomic JSON snapshots.

pub mod catalog;
pub mod snapshot;
pub mod users;

pub use catalog::{Catalog, GameEntry, VersionEntry};
pub use users::UserStore;

use thiserror::Error;

/// Failures surfaced by store mutations. These map onto `{status: "error"}`
/// replies; the connection stays open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username already exists")]
    UserExists,
    #[error("Invalid username or password")]
    BadCredentials,
    #[error("Game not found")]
    GameNotFound,
    #[error("Permission denied: you are not the owner of this game")]
    NotOwner,
    #[error("You must play this game first!")]
    NotPlayed,
    #[error("Game is in use by an active room")]
    GameInUse,
}
