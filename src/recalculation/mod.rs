//! Batch recalculation across employees.
//!
//! This module determines which dates a change affects and recalculates
//! many employees concurrently on a bounded worker pool, each employee's
//! dates strictly in order.

mod pool;
mod trigger;

pub use pool::{EmployeeReport, EmployeeRunStatus, RecalculationReport, Recalculator};
pub use trigger::{AffectedRange, RecalculationTrigger, affected_range, coalesce_triggers};
