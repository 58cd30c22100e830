//! Simulator/interpreter context token.
//!
//! There is one logical thread of control. It is either inside the simulator
//! (`Simulator`) or inside the embedded interpreter (`User`). Every callback
//! trampoline brackets the user function with exactly one [`ContextGuard::to_user`]
//! and one [`ContextGuard::to_simulator`]. Flipping to the side that already
//! holds control means the interpreter was re-entered without returning; the
//! process is terminated rather than letting interpreter state corrupt.

use std::cell::Cell;
use std::fmt;

use crate::error::ContextViolation;
use crate::logging::{log_at, LogLevel};

/// Which side of the boundary holds control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimContext {
    /// The vendor simulator.
    Simulator,
    /// The embedded interpreter.
    User,
}

impl fmt::Display for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulator => f.write_str("simulator"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Two-state context token.
#[derive(Debug)]
pub struct ContextGuard {
    state: Cell<SimContext>,
}

impl Default for ContextGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextGuard {
    /// Starts in simulator context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Cell::new(SimContext::Simulator),
        }
    }

    /// Current context.
    #[must_use]
    pub fn current(&self) -> SimContext {
        self.state.get()
    }

    /// Enter the interpreter, reporting a violation instead of terminating.
    pub fn try_to_user(&self) -> Result<(), ContextViolation> {
        self.transition(SimContext::Simulator, SimContext::User)
    }

    /// Return to the simulator, reporting a violation instead of terminating.
    pub fn try_to_simulator(&self) -> Result<(), ContextViolation> {
        self.transition(SimContext::User, SimContext::Simulator)
    }

    /// Enter the interpreter. Terminates the process on violation.
    pub fn to_user(&self) {
        if let Err(violation) = self.try_to_user() {
            abort_on(violation);
        }
    }

    /// Return to the simulator. Terminates the process on violation.
    pub fn to_simulator(&self) {
        if let Err(violation) = self.try_to_simulator() {
            abort_on(violation);
        }
    }

    fn transition(&self, from: SimContext, to: SimContext) -> Result<(), ContextViolation> {
        let current = self.state.get();
        if current != from {
            return Err(ContextViolation {
                current,
                requested: to,
            });
        }
        self.state.set(to);
        Ok(())
    }
}

fn abort_on(violation: ContextViolation) -> ! {
    log_at(LogLevel::Critical, "context", &violation.to_string());
    std::process::abort()
}
