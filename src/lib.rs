//! Single-user task tracker.
//!
//! High-priority tasks wait in a FIFO queue, low-priority tasks on a LIFO
//! stack. Each execution cycle takes one task (high before low), settles it
//! with a simulated outcome and files it as succeeded or failed. Completed
//! tasks can be saved to and loaded from a fixed binary layout.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod report;
pub mod session;
pub mod shell;
pub mod tracker;
pub mod ui;
