//! Bridge to the embedded interpreter.
//!
//! The dispatch core never links an interpreter itself. Whatever hosts one
//! installs an [`EmbedBridge`] and receives start, end, and event notices.

use std::fmt;

use crate::error::GpiResult;

/// Severity of an event reported to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimEvent {
    /// Informational; the run continues.
    Info,
    /// A test failed; the interpreter decides whether to continue.
    TestFail,
    /// Unrecoverable; the simulation is ending.
    Fatal,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::TestFail => f.write_str("test-fail"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// Hooks the interpreter host implements.
pub trait EmbedBridge {
    /// Start the interpreter with the simulator's command line.
    fn embed_init(&mut self, args: &[String]) -> GpiResult<()>;

    /// Shut the interpreter down. Called at most once.
    fn embed_end(&mut self, message: &str);

    /// Deliver an out-of-band event.
    fn embed_event(&mut self, event: SimEvent, message: &str);
}

/// Where the interpreter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EmbedPhase {
    #[default]
    Idle,
    Running,
    Ended,
}
