//! Scheduler runner -- owns the walker thread and the priority mailbox.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, `start`, `set_priority_task`, `stop`, accessors
//! - `execution`: walker loop, mailbox draining, termination handshake
//! - `output`: silent and streaming compiles, background regeneration

mod core;
mod execution;
mod output;

pub use self::core::Scheduler;
