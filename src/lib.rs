//! Dice Settle
//!
//! Physically simulated dice: randomized throws, settle detection and
//! face resolution, with a Bevy + Rapier integration on top.

pub mod dice3d;
