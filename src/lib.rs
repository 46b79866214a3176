//! Game service client library
//!
//! Exposes the stale-tolerant response cache, the game data backends, and the
//! cached API layer built on them. The binary and the integration tests use
//! these modules.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
