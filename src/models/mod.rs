// src/models/mod.rs

//! Domain models for the resolver application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entrance;
mod record;

// Re-export all public types
pub use config::{
    BlockSignatures, Config, FetcherConfig, MatcherConfig, OutputConfig, ProxyEntry,
};
pub use entrance::{Entrance, MatchResult};
pub use record::{AddressRow, FailureRecord, SuccessRecord, parse_coord};
