//! Cyclic module interface
//!
//! A cyclic module is initialised once when the executable starts, then
//! processed once per cycle. The planner implements [`State`] so the
//! executable drives it the same way whatever it is planning with.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// State of a cyclic module.
pub trait State {
    /// Data needed to initialise the module, for example parameter file
    /// names.
    type InitData;

    type InitError;

    /// Data consumed by one cycle.
    type InputData;

    /// Data produced by one cycle.
    type OutputData;

    /// Summary of one cycle, suitable for logging or archiving.
    type StatusReport;

    type ProcError;

    /// Initialise the module within the given session.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
