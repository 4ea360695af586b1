//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod attachments;

pub use attachments::Attachments;
