//! # Communications interface crate.
//!
//! Provides the message model exchanged with the driving simulator and the
//! network layer used to carry it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator event messages (telemetry in, control out)
pub mod sim;

/// Network module
pub mod net;
