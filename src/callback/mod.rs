//! Callback registration, lifecycle, and dispatch.

mod engine;
mod handle;

pub use engine::{CallbackEngine, Decoded};
pub use handle::{CallbackKind, CbId, CbState, RemoveOutcome, UserCallback};
