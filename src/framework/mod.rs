//! Control flow for operations against remote collaborators.
//!
//! See: [`retry`], [`StateError`]

mod retry;
mod state;

pub use retry::*;
pub use state::*;
