#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

//! # Game Hub Server
//!
//! A game-distribution and matchmaking hub. Developers upload self-contained
//! game bundles; players browse the catalogue, download bundles, form rooms,
//! and launch bundled game sessions together — all over a single persistent
//! framed TCP connection per client.

/// Server configuration and environment variables
pub mod config;

/// The hub: single state-owning event loop and its request handlers
pub mod hub;

/// Structured logging configuration
pub mod logging;

/// Bundle manifest parsing
pub mod manifest;

/// TCP listener and per-connection tasks
pub mod net;

/// Wire protocol: framing, message types, payload shapes
pub mod protocol;

/// Accounts, catalogue, and crash-atomic snapshots
pub mod store;
