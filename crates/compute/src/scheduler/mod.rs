//! Background compilation scheduler.
//!
//! A single walker thread compiles every unit of a document in order while
//! navigation requests preempt it through a one-slot mailbox. Units already
//! compiled are replayed on short-lived threads without touching the
//! mailbox. Results stream to a cancellable [`OutputSink`](crate::sink::OutputSink).

pub mod mailbox;
pub mod runner;
pub mod state;
pub mod task;

pub use mailbox::PriorityMailbox;
pub use runner::Scheduler;
pub use state::CompiledUnits;
pub use task::{PriorityTask, TaskKind};
