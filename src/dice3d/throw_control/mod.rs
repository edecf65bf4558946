//! Throw Control Module
//!
//! This module handles randomized dice throws: the parameters that shape
//! a throw, the launcher that applies it to a body, and the system that
//! launches every die when a roll is requested.

mod state;
mod systems;

pub use state::*;
pub use systems::*;
