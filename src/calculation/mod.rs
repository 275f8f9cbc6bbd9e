//! Calculation logic for the daily time-calculation engine.
//!
//! This module contains one component per pipeline stage: day plan
//! resolution with shift detection, booking pairing with cross-midnight
//! handling, tolerance absorption, rounding, break deduction, time-window
//! bonuses, and absence/holiday/no-booking crediting. [`calculate_day`]
//! sequences them for one date and [`calculate_range`] runs an employee's
//! dates in order.

mod absence_credit;
mod bonus;
mod booking_pairer;
mod break_deduction;
mod daily;
mod day_plan_resolver;
mod range;
mod rounding;
mod tolerance;

pub use absence_credit::{AbsenceCreditResult, CreditInput, resolve_absence_credit};
pub use bonus::{AppliedBonus, BonusResult, bonus_minutes, calculate_bonuses};
pub use booking_pairer::{PairingInput, PairingResult, pair_bookings};
pub use break_deduction::{BreakDeductionResult, calculate_break_deductions, minimum_break_minutes};
pub use daily::{DayInput, DayOutcome, ENGINE_VERSION, calculate_day};
pub use day_plan_resolver::{ResolvedDayPlan, ResolverInput, TargetSource, resolve_day_plan};
pub use range::{DateOutcome, EmployeeRange, RangeCalculation, calculate_range};
pub use rounding::{RoundingResult, apply_rounding, round_time};
pub use tolerance::{ToleranceResult, absorb_arrival, absorb_departure, apply_tolerance};
