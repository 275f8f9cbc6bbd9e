//! Daily time-calculation engine for workforce time tracking.
//!
//! This crate turns a day plan, an employee's raw clock bookings, and any
//! absence or holiday record into the credited minutes, break deductions,
//! bonuses and balance of a working day, and recalculates date ranges for
//! many employees on a bounded worker pool.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod recalculation;
