//! Type definitions for the dice settle core
//!
//! This module is organized into submodules:
//! - `dice` - Face tables, per-die state and the `Die` component
//! - `settings` - Tunable settings and RON persistence

pub mod dice;
pub mod settings;

// Re-export all public types for convenient access
pub use dice::*;
pub use settings::*;
