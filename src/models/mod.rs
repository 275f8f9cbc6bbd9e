//! Core data models for the daily time-calculation engine.
//!
//! This module contains the input records (bookings, absences, holidays),
//! the intermediate interval and carry-over types, and the result types.

mod absence;
mod booking;
mod calculation_result;
mod carry_over;
mod interval;

pub use absence::{
    AbsenceDuration, AbsenceRecord, CreditMultiplier, HalfDayPeriod, HolidayCategory,
    HolidayRecord, active_absence,
};
pub use booking::{BookingCategory, BookingDirection, BookingEvent};
pub(crate) use booking::{sorted_events, sorted_work_events};
pub use calculation_result::{
    AdjustmentReason, AuditStep, AuditTrace, AuditWarning, BookingSide, BreakDeduction,
    CalculationFlags, CreditSource, DailyCalculationResult, TimeAdjustment,
};
pub use carry_over::CarryOver;
pub use interval::{PairedInterval, total_duration};
