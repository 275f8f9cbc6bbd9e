//! Sequential date-range calculation for one employee.
//!
//! Dates run strictly in ascending order and the [`CarryOver`] produced by
//! one date is passed to the next. A failed date never stops the range; when
//! it leaves a shift open across midnight under a carrying day-change
//! behavior, the next date fails with [`EngineError::CarryOverUnresolved`]
//! instead of computing from a wrong starting state.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{DayPlanId, DayPlanTable, Minutes};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AbsenceRecord, BookingDirection, BookingEvent, CarryOver, DailyCalculationResult,
    HolidayRecord, active_absence, sorted_work_events,
};

use super::daily::{DayInput, DayOutcome, calculate_day};

/// Everything needed to calculate one employee over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRange {
    /// The employee.
    pub employee_id: String,
    /// First date, inclusive.
    pub start: NaiveDate,
    /// Last date, inclusive.
    pub end: NaiveDate,
    /// The day plan assigned to each date.
    pub plan_assignments: BTreeMap<NaiveDate, DayPlanId>,
    /// Bookings of the range, including the date after `end`.
    #[serde(default)]
    pub bookings: Vec<BookingEvent>,
    /// Absence records. Cancelled ones are ignored.
    #[serde(default)]
    pub absences: Vec<AbsenceRecord>,
    /// Holiday records.
    #[serde(default)]
    pub holidays: Vec<HolidayRecord>,
    /// Target minutes from the employee master, if recorded.
    #[serde(default)]
    pub employee_master_target: Option<Minutes>,
    /// State handed over by the date before `start`.
    #[serde(default)]
    pub carry_in: CarryOver,
}

/// The outcome of one date inside a range.
#[derive(Debug, Clone)]
pub struct DateOutcome {
    /// The date.
    pub date: NaiveDate,
    /// The result, or the error the date failed with.
    pub result: EngineResult<DailyCalculationResult>,
}

/// The ordered per-date outcomes of a range.
#[derive(Debug, Clone)]
pub struct RangeCalculation {
    /// The employee.
    pub employee_id: String,
    /// One entry per date, ascending.
    pub days: Vec<DateOutcome>,
    /// State for the date after the range.
    pub carry_out: CarryOver,
}

impl RangeCalculation {
    /// Returns the successful results in date order.
    pub fn results(&self) -> impl Iterator<Item = &DailyCalculationResult> {
        self.days.iter().filter_map(|day| day.result.as_ref().ok())
    }

    /// Returns the failed dates with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, &EngineError)> {
        self.days
            .iter()
            .filter_map(|day| day.result.as_ref().err().map(|error| (day.date, error)))
    }

    /// Returns true when every date succeeded.
    pub fn is_complete_success(&self) -> bool {
        self.days.iter().all(|day| day.result.is_ok())
    }
}

/// Calculates every date of `range` in ascending order.
///
/// Fails as a whole only when the range itself is malformed; per-date
/// failures are returned inside [`RangeCalculation::days`].
pub fn calculate_range(range: &EmployeeRange, plans: &DayPlanTable) -> EngineResult<RangeCalculation> {
    if range.start > range.end {
        return Err(EngineError::invalid_input(
            "range",
            format!("start {} is after end {}", range.start, range.end),
        ));
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<BookingEvent>> = BTreeMap::new();
    for booking in &range.bookings {
        by_date.entry(booking.date()).or_default().push(*booking);
    }

    let mut days = Vec::new();
    let mut carry = range.carry_in;
    let mut date = range.start;
    loop {
        let next = date.checked_add_days(Days::new(1));
        let mut window: Vec<BookingEvent> = by_date.get(&date).cloned().unwrap_or_default();
        if let Some(next_date) = next {
            if let Some(following) = by_date.get(&next_date) {
                window.extend_from_slice(following);
            }
        }

        let outcome = calculate_date(range, plans, date, &window, carry);
        carry = match &outcome {
            Ok(day) => day.carry_out,
            Err(_) => carry_after_failure(range, plans, date, &window),
        };
        days.push(DateOutcome {
            date,
            result: outcome.map(|day| day.result),
        });

        match next {
            Some(next_date) if next_date <= range.end => date = next_date,
            _ => break,
        }
    }

    Ok(RangeCalculation {
        employee_id: range.employee_id.clone(),
        days,
        carry_out: carry,
    })
}

fn calculate_date(
    range: &EmployeeRange,
    plans: &DayPlanTable,
    date: NaiveDate,
    bookings: &[BookingEvent],
    carry_in: CarryOver,
) -> EngineResult<DayOutcome> {
    let plan_id = range
        .plan_assignments
        .get(&date)
        .ok_or(EngineError::DayPlanNotAssigned { date })?;
    let day_plan = plans.get(plan_id)?;
    let absence = active_absence(&range.absences, date)?;

    let mut holidays = range.holidays.iter().filter(|holiday| holiday.date == date);
    let holiday = holidays.next();
    if holidays.next().is_some() {
        return Err(EngineError::invalid_input(
            "holiday",
            format!("more than one holiday on {date}"),
        ));
    }

    calculate_day(
        &DayInput {
            employee_id: &range.employee_id,
            date,
            day_plan,
            bookings,
            absence,
            holiday,
            employee_master_target: range.employee_master_target,
            carry_in,
        },
        plans,
    )
}

/// A failed date blocks the next one only when its plan carries open shifts
/// over midnight and its last work booking is an arrival.
fn carry_after_failure(
    range: &EmployeeRange,
    plans: &DayPlanTable,
    date: NaiveDate,
    bookings: &[BookingEvent],
) -> CarryOver {
    let carries = range
        .plan_assignments
        .get(&date)
        .and_then(|id| plans.get(id).ok())
        .is_some_and(|plan| plan.day_change_behavior.carries_over());
    if !carries {
        return CarryOver::None;
    }

    let ends_open = sorted_work_events(bookings)
        .iter()
        .rev()
        .find(|event| event.date() == date)
        .is_some_and(|event| event.direction == BookingDirection::In);
    if ends_open {
        CarryOver::Unresolved { source_date: date }
    } else {
        CarryOver::None
    }
}
