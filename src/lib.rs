//! # flatkv
//!
//! A minimal HTTP key-value store persisted to a single JSON file:
//! - Keys and values are arbitrary bytes, base64-wrapped on disk
//! - Every operation reloads the whole file; every mutation rewrites it
//! - Optional per-store serialization of operations
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                             │
//! │               GET / POST / DELETE /key/:key                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Store                                  │
//! │        ensure root → ensure file → load → mutate → persist   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐        ┌──────────────────┐
//!               │    Codec     │◄──────►│ <root>/data.json │
//!               └──────────────┘        └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod command;
pub mod store;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatKvError, Result};
pub use config::Config;
pub use codec::Mapping;
pub use command::Command;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
