//! Pipeline entry points for the relay.
//!
//! - `Monitor`: the polling loop
//! - `select_new` / `delivery_order`: seen/unseen reconciliation

pub mod diff;
pub mod monitor;

pub use diff::{delivery_order, select_new};
pub use monitor::{CycleReport, Monitor, MonitorState};
