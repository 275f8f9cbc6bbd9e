//! Affected-range determination for recalculation triggers.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::DayChangeBehavior;

/// A change that requires recalculating an employee's date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationTrigger {
    /// The employee whose data changed.
    pub employee_id: String,
    /// The date of the changed booking or absence.
    pub date: NaiveDate,
    /// The day-change behavior of the plan assigned to `date`.
    pub day_change_behavior: DayChangeBehavior,
}

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRange {
    /// First date, inclusive.
    pub start: NaiveDate,
    /// Last date, inclusive.
    pub end: NaiveDate,
}

impl AffectedRange {
    /// Returns the smallest range covering both.
    pub fn union(self, other: AffectedRange) -> AffectedRange {
        AffectedRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns true when `date` lies inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Returns the dates a change on `date` can affect.
///
/// - `none`: only the date.
/// - `at_arrival`: the previous date may have consumed a departure of this
///   date, and this date may consume one of the next.
/// - `at_departure` and `auto_complete`: the next date receives what this
///   date leaves open.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use workday_engine::config::DayChangeBehavior;
/// use workday_engine::recalculation::affected_range;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let range = affected_range(date, DayChangeBehavior::AutoComplete);
/// assert_eq!(range.start, date);
/// assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
/// ```
pub fn affected_range(date: NaiveDate, behavior: DayChangeBehavior) -> AffectedRange {
    let previous = date.checked_sub_days(Days::new(1)).unwrap_or(date);
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    match behavior {
        DayChangeBehavior::None => AffectedRange { start: date, end: date },
        DayChangeBehavior::AtArrival => AffectedRange {
            start: previous,
            end: next,
        },
        DayChangeBehavior::AtDeparture | DayChangeBehavior::AutoComplete => AffectedRange {
            start: date,
            end: next,
        },
    }
}

/// Merges triggers into one affected range per employee.
pub fn coalesce_triggers(triggers: &[RecalculationTrigger]) -> BTreeMap<String, AffectedRange> {
    let mut ranges: BTreeMap<String, AffectedRange> = BTreeMap::new();
    for trigger in triggers {
        let range = affected_range(trigger.date, trigger.day_change_behavior);
        ranges
            .entry(trigger.employee_id.clone())
            .and_modify(|existing| *existing = existing.union(range))
            .or_insert(range);
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn trigger(employee_id: &str, date: &str, behavior: DayChangeBehavior) -> RecalculationTrigger {
        RecalculationTrigger {
            employee_id: employee_id.to_string(),
            date: make_date(date),
            day_change_behavior: behavior,
        }
    }

    #[test]
    fn test_affected_range_per_behavior() {
        let date = make_date("2026-03-02");
        assert_eq!(
            affected_range(date, DayChangeBehavior::None),
            AffectedRange { start: date, end: date }
        );
        assert_eq!(
            affected_range(date, DayChangeBehavior::AtArrival),
            AffectedRange {
                start: make_date("2026-03-01"),
                end: make_date("2026-03-03"),
            }
        );
        assert_eq!(
            affected_range(date, DayChangeBehavior::AtDeparture),
            AffectedRange {
                start: date,
                end: make_date("2026-03-03"),
            }
        );
    }

    #[test]
    fn test_coalesce_merges_per_employee() {
        let triggers = vec![
            trigger("emp_a", "2026-03-02", DayChangeBehavior::None),
            trigger("emp_b", "2026-03-10", DayChangeBehavior::AutoComplete),
            trigger("emp_a", "2026-03-05", DayChangeBehavior::AtArrival),
        ];
        let ranges = coalesce_triggers(&triggers);

        assert_eq!(ranges.len(), 2);
        assert_eq!(
            ranges["emp_a"],
            AffectedRange {
                start: make_date("2026-03-02"),
                end: make_date("2026-03-06"),
            }
        );
        assert!(ranges["emp_b"].contains(make_date("2026-03-11")));
        assert!(!ranges["emp_b"].contains(make_date("2026-03-09")));
    }
}
