//! Booking pairing and cross-midnight handling.
//!
//! This module turns a date's raw clock events into ordered
//! arrival/departure intervals and applies the plan's
//! [`DayChangeBehavior`] to shifts left open at midnight.

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde_json::json;

use crate::config::{DayChangeBehavior, MINUTES_PER_DAY, Minutes};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditWarning, BookingCategory, BookingDirection, BookingEvent, CarryOver,
    PairedInterval, sorted_events,
};

/// Inputs of the booking pairer.
#[derive(Debug, Clone, Copy)]
pub struct PairingInput<'a> {
    /// The calculation date.
    pub date: NaiveDate,
    /// Bookings of the date and of the following date. Bookings on other
    /// dates are ignored.
    pub bookings: &'a [BookingEvent],
    /// State handed over by the previous date.
    pub carry_in: CarryOver,
    /// The cross-midnight policy of the resolved plan.
    pub day_change_behavior: DayChangeBehavior,
}

/// The result of pairing a date's bookings.
#[derive(Debug, Clone)]
pub struct PairingResult {
    /// Work intervals in chronological order.
    pub intervals: Vec<PairedInterval>,
    /// Break intervals built from break bookings.
    pub break_intervals: Vec<PairedInterval>,
    /// State handed to the next date.
    pub carry_out: CarryOver,
    /// Cross-midnight handling changed the intervals.
    pub day_changed: bool,
    /// Warnings for incomplete pairs.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

#[derive(Debug, Clone, Copy)]
struct Point {
    minute: Minutes,
    direction: BookingDirection,
    synthetic: bool,
    carried: bool,
    timestamp: Option<NaiveDateTime>,
}

/// Pairs the date's work bookings into intervals.
///
/// Work bookings are sorted and paired greedily: each arrival is closed by
/// the next departure. Two arrivals in a row leave the first one open, and a
/// departure without an arrival forms an interval without arrival. Both are
/// reported as `INCOMPLETE_PAIR` warnings and count zero minutes.
///
/// A trailing open arrival is handled by `day_change_behavior`:
///
/// - `none`: it stays open.
/// - `at_arrival`: when the next date starts with a departure, that
///   departure closes today's interval (past 1440) and is consumed.
/// - `at_departure`: when the next date starts with a departure, the arrival
///   moves to the next date.
/// - `auto_complete`: the interval closes synthetically at 1440 and the next
///   date reopens it at 00:00.
///
/// An arrival carried in from the previous date is never carried again.
///
/// Fails with [`EngineError::CarryOverUnresolved`] when the previous date
/// failed with an open shift.
pub fn pair_bookings(input: &PairingInput<'_>, step_number: u32) -> EngineResult<PairingResult> {
    let date = input.date;
    let next_date = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| EngineError::invalid_input("date", format!("{date} has no following date")))?;

    let work = sorted_events(input.bookings, BookingCategory::Work);
    let mut today: Vec<BookingEvent> = work.iter().filter(|e| e.date() == date).copied().collect();
    let next_first = work.iter().find(|e| e.date() == next_date).copied();

    let mut points = Vec::with_capacity(today.len() + 1);
    let carried_in = match input.carry_in {
        CarryOver::None => false,
        CarryOver::Unresolved { source_date } => {
            return Err(EngineError::CarryOverUnresolved { date, source_date });
        }
        CarryOver::ConsumedDeparture { timestamp } => {
            if let Some(position) = today
                .iter()
                .position(|e| e.timestamp == timestamp && e.direction == BookingDirection::Out)
            {
                today.remove(position);
            }
            true
        }
        CarryOver::PendingArrival { timestamp } => {
            points.push(Point {
                minute: BookingEvent::work(timestamp, BookingDirection::In).minutes_from(date),
                direction: BookingDirection::In,
                synthetic: false,
                carried: true,
                timestamp: Some(timestamp),
            });
            true
        }
        CarryOver::OpenAtMidnight { .. } => {
            points.push(Point {
                minute: 0,
                direction: BookingDirection::In,
                synthetic: true,
                carried: false,
                timestamp: None,
            });
            true
        }
    };

    points.extend(today.iter().map(|event| Point {
        minute: event.minutes_from(date),
        direction: event.direction,
        synthetic: false,
        carried: false,
        timestamp: Some(event.timestamp),
    }));

    let mut intervals = Vec::new();
    let mut open: Option<Point> = None;
    for point in points {
        match point.direction {
            BookingDirection::In => {
                if let Some(previous) = open.replace(point) {
                    intervals.push(open_interval(&previous));
                }
            }
            BookingDirection::Out => {
                let interval = match open.take() {
                    Some(arrival) => PairedInterval {
                        arrival: Some(arrival.minute),
                        departure: Some(point.minute),
                        arrival_synthetic: arrival.synthetic,
                        departure_synthetic: false,
                        arrival_carried: arrival.carried,
                    },
                    None => PairedInterval {
                        arrival: None,
                        departure: Some(point.minute),
                        arrival_synthetic: false,
                        departure_synthetic: false,
                        arrival_carried: false,
                    },
                };
                intervals.push(interval);
            }
        }
    }

    let mut carry_out = CarryOver::None;
    if let Some(trailing) = open {
        let next_departure = next_first.filter(|e| e.direction == BookingDirection::Out);
        match (
            input.day_change_behavior,
            trailing.synthetic || trailing.carried,
            trailing.timestamp,
            next_departure,
        ) {
            (DayChangeBehavior::AtArrival, false, _, Some(departure)) => {
                intervals.push(PairedInterval {
                    arrival: Some(trailing.minute),
                    departure: Some(departure.minutes_from(date)),
                    arrival_synthetic: false,
                    departure_synthetic: false,
                    arrival_carried: false,
                });
                carry_out = CarryOver::ConsumedDeparture {
                    timestamp: departure.timestamp,
                };
            }
            (DayChangeBehavior::AtDeparture, false, Some(timestamp), Some(_)) => {
                carry_out = CarryOver::PendingArrival { timestamp };
            }
            (DayChangeBehavior::AutoComplete, false, Some(since), _) => {
                intervals.push(PairedInterval {
                    arrival: Some(trailing.minute),
                    departure: Some(MINUTES_PER_DAY),
                    arrival_synthetic: false,
                    departure_synthetic: true,
                    arrival_carried: false,
                });
                carry_out = CarryOver::OpenAtMidnight { since };
            }
            _ => intervals.push(open_interval(&trailing)),
        }
    }

    let break_intervals = pair_breaks(input.bookings, date);

    let warnings: Vec<AuditWarning> = intervals
        .iter()
        .filter(|interval| !interval.is_complete())
        .map(|interval| {
            AuditWarning::new(
                "INCOMPLETE_PAIR",
                match (interval.arrival, interval.departure) {
                    (Some(arrival), _) => format!("Arrival at minute {arrival} has no departure"),
                    (_, Some(departure)) => {
                        format!("Departure at minute {departure} has no arrival")
                    }
                    _ => "Empty booking pair".to_string(),
                },
            )
        })
        .collect();

    let day_changed = carried_in || !carry_out.is_none();

    let audit_step = AuditStep {
        step_number,
        rule_id: "booking_pairing".to_string(),
        rule_name: "Booking Pairing".to_string(),
        input: json!({
            "work_bookings": today.len(),
            "carry_in": input.carry_in,
            "day_change_behavior": input.day_change_behavior,
        }),
        output: json!({
            "intervals": intervals,
            "break_intervals": break_intervals,
            "carry_out": carry_out,
            "incomplete_pairs": warnings.len(),
        }),
        reasoning: format!(
            "Paired work bookings into {} interval(s), {} incomplete",
            intervals.len(),
            warnings.len()
        ),
    };

    Ok(PairingResult {
        intervals,
        break_intervals,
        carry_out,
        day_changed,
        warnings,
        audit_step,
    })
}

fn open_interval(point: &Point) -> PairedInterval {
    PairedInterval {
        arrival: Some(point.minute),
        departure: None,
        arrival_synthetic: point.synthetic,
        departure_synthetic: false,
        arrival_carried: point.carried,
    }
}

/// Pairs the date's break bookings, break start (`in`) to break end (`out`).
/// Unmatched break bookings are dropped.
fn pair_breaks(bookings: &[BookingEvent], date: NaiveDate) -> Vec<PairedInterval> {
    let mut breaks = Vec::new();
    let mut start: Option<Minutes> = None;
    for event in sorted_events(bookings, BookingCategory::Break)
        .iter()
        .filter(|e| e.date() == date)
    {
        let minute = event.minutes_from(date);
        match event.direction {
            BookingDirection::In => start = Some(minute),
            BookingDirection::Out => {
                if let Some(begin) = start.take() {
                    breaks.push(PairedInterval::new(begin, minute));
                }
            }
        }
    }
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn work_in(date: &str, time: &str) -> BookingEvent {
        BookingEvent::work(make_datetime(date, time), BookingDirection::In)
    }

    fn work_out(date: &str, time: &str) -> BookingEvent {
        BookingEvent::work(make_datetime(date, time), BookingDirection::Out)
    }

    fn pair(
        date: &str,
        bookings: &[BookingEvent],
        carry_in: CarryOver,
        behavior: DayChangeBehavior,
    ) -> EngineResult<PairingResult> {
        pair_bookings(
            &PairingInput {
                date: make_date(date),
                bookings,
                carry_in,
                day_change_behavior: behavior,
            },
            2,
        )
    }

    // ==========================================================================
    // Same-day pairing
    // ==========================================================================

    #[test]
    fn test_pairs_alternating_bookings_in_order() {
        let bookings = vec![
            work_out("2026-03-02", "17:00:00"),
            work_in("2026-03-02", "08:00:00"),
            work_in("2026-03-02", "12:30:00"),
            work_out("2026-03-02", "12:00:00"),
        ];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();

        assert_eq!(
            result.intervals,
            vec![PairedInterval::new(480, 720), PairedInterval::new(750, 1020)]
        );
        assert!(result.warnings.is_empty());
        assert!(result.carry_out.is_none());
        assert!(!result.day_changed);
    }

    #[test]
    fn test_double_arrival_leaves_first_open() {
        let bookings = vec![
            work_in("2026-03-02", "08:00:00"),
            work_in("2026-03-02", "08:05:00"),
            work_out("2026-03-02", "17:00:00"),
        ];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();

        assert_eq!(result.intervals[0], PairedInterval::open(480));
        assert_eq!(result.intervals[1], PairedInterval::new(485, 1020));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "INCOMPLETE_PAIR");
    }

    #[test]
    fn test_departure_without_arrival_is_incomplete() {
        let bookings = vec![work_out("2026-03-02", "06:00:00")];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();

        assert_eq!(result.intervals[0].arrival, None);
        assert_eq!(result.intervals[0].departure, Some(360));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_other_dates_are_ignored() {
        let bookings = vec![
            work_in("2026-03-01", "08:00:00"),
            work_in("2026-03-02", "08:00:00"),
            work_out("2026-03-02", "16:00:00"),
            work_in("2026-03-04", "08:00:00"),
        ];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();
        assert_eq!(result.intervals, vec![PairedInterval::new(480, 960)]);
    }

    #[test]
    fn test_break_bookings_paired_separately() {
        let bookings = vec![
            work_in("2026-03-02", "08:00:00"),
            BookingEvent::break_event(make_datetime("2026-03-02", "12:00:00"), BookingDirection::In),
            BookingEvent::break_event(make_datetime("2026-03-02", "12:40:00"), BookingDirection::Out),
            work_out("2026-03-02", "17:00:00"),
        ];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();

        assert_eq!(result.intervals, vec![PairedInterval::new(480, 1020)]);
        assert_eq!(result.break_intervals, vec![PairedInterval::new(720, 760)]);
    }

    // ==========================================================================
    // Day change: none
    // ==========================================================================

    #[test]
    fn test_none_keeps_open_interval() {
        let bookings = vec![
            work_in("2026-03-02", "22:00:00"),
            work_out("2026-03-03", "06:00:00"),
        ];
        let result = pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::None).unwrap();

        assert_eq!(result.intervals, vec![PairedInterval::open(1320)]);
        assert!(result.carry_out.is_none());
        assert_eq!(result.warnings.len(), 1);
    }

    // ==========================================================================
    // Day change: auto_complete
    // ==========================================================================

    #[test]
    fn test_auto_complete_closes_at_midnight() {
        let bookings = vec![work_in("2026-03-02", "22:00:00")];
        let result =
            pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::AutoComplete).unwrap();

        let interval = result.intervals[0];
        assert_eq!(interval.arrival, Some(1320));
        assert_eq!(interval.departure, Some(1440));
        assert!(interval.departure_synthetic);
        assert_eq!(interval.duration(), 120);
        assert_eq!(
            result.carry_out,
            CarryOver::OpenAtMidnight {
                since: make_datetime("2026-03-02", "22:00:00")
            }
        );
        assert!(result.day_changed);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_auto_complete_reopens_next_date_at_midnight() {
        let bookings = vec![work_out("2026-03-03", "06:00:00")];
        let carry = CarryOver::OpenAtMidnight {
            since: make_datetime("2026-03-02", "22:00:00"),
        };
        let result = pair("2026-03-03", &bookings, carry, DayChangeBehavior::AutoComplete).unwrap();

        let interval = result.intervals[0];
        assert_eq!(interval.arrival, Some(0));
        assert!(interval.arrival_synthetic);
        assert_eq!(interval.departure, Some(360));
        assert!(result.day_changed);
        assert!(result.carry_out.is_none());
    }

    #[test]
    fn test_carried_arrival_is_not_carried_again() {
        let carry = CarryOver::OpenAtMidnight {
            since: make_datetime("2026-03-02", "22:00:00"),
        };
        let result = pair("2026-03-03", &[], carry, DayChangeBehavior::AutoComplete).unwrap();

        assert_eq!(result.intervals.len(), 1);
        assert!(result.intervals[0].is_open());
        assert!(result.carry_out.is_none());
    }

    // ==========================================================================
    // Day change: at_arrival and at_departure
    // ==========================================================================

    #[test]
    fn test_at_arrival_consumes_next_departure() {
        let bookings = vec![
            work_in("2026-03-02", "22:00:00"),
            work_out("2026-03-03", "06:00:00"),
        ];
        let result =
            pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::AtArrival).unwrap();

        assert_eq!(result.intervals, vec![PairedInterval::new(1320, 1800)]);
        assert_eq!(
            result.carry_out,
            CarryOver::ConsumedDeparture {
                timestamp: make_datetime("2026-03-03", "06:00:00")
            }
        );

        let next = pair(
            "2026-03-03",
            &[work_out("2026-03-03", "06:00:00")],
            result.carry_out,
            DayChangeBehavior::AtArrival,
        )
        .unwrap();
        assert!(next.intervals.is_empty());
        assert!(next.warnings.is_empty());
        assert!(next.day_changed);
    }

    #[test]
    fn test_at_arrival_without_next_departure_stays_open() {
        let bookings = vec![
            work_in("2026-03-02", "22:00:00"),
            work_in("2026-03-03", "08:00:00"),
        ];
        let result =
            pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::AtArrival).unwrap();
        assert_eq!(result.intervals, vec![PairedInterval::open(1320)]);
        assert!(result.carry_out.is_none());
    }

    #[test]
    fn test_at_departure_moves_arrival_to_next_date() {
        let bookings = vec![
            work_in("2026-03-02", "08:00:00"),
            work_out("2026-03-02", "12:00:00"),
            work_in("2026-03-02", "22:00:00"),
            work_out("2026-03-03", "06:00:00"),
        ];
        let result =
            pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::AtDeparture).unwrap();
        assert_eq!(result.intervals, vec![PairedInterval::new(480, 720)]);
        assert_eq!(
            result.carry_out,
            CarryOver::PendingArrival {
                timestamp: make_datetime("2026-03-02", "22:00:00")
            }
        );

        let next = pair("2026-03-03", &bookings, result.carry_out, DayChangeBehavior::AtDeparture)
            .unwrap();
        assert_eq!(next.intervals[0].arrival, Some(-120));
        assert_eq!(next.intervals[0].departure, Some(360));
        assert_eq!(next.intervals[0].duration(), 480);
        assert!(next.intervals[0].arrival_carried);
        assert!(!next.intervals[0].arrival_synthetic);
    }

    #[test]
    fn test_carried_arrival_left_open_is_not_carried_again() {
        let carry = CarryOver::PendingArrival {
            timestamp: make_datetime("2026-03-02", "22:00:00"),
        };
        let bookings = vec![work_out("2026-03-04", "06:00:00")];
        let result = pair("2026-03-03", &bookings, carry, DayChangeBehavior::AtDeparture).unwrap();

        assert_eq!(result.intervals.len(), 1);
        assert!(result.intervals[0].is_open());
        assert!(result.intervals[0].arrival_carried);
        assert!(result.carry_out.is_none());
    }

    #[test]
    fn test_at_arrival_departure_past_midnight_is_not_synthetic() {
        let bookings = vec![
            work_in("2026-03-02", "22:07:00"),
            work_out("2026-03-03", "06:05:00"),
        ];
        let result =
            pair("2026-03-02", &bookings, CarryOver::None, DayChangeBehavior::AtArrival).unwrap();

        let interval = result.intervals[0];
        assert_eq!(interval.arrival, Some(1327));
        assert_eq!(interval.departure, Some(1805));
        assert!(!interval.departure_synthetic);
        assert!(!interval.arrival_carried);
    }

    #[test]
    fn test_unresolved_carry_fails() {
        let carry = CarryOver::Unresolved {
            source_date: make_date("2026-03-02"),
        };
        let err = pair("2026-03-03", &[], carry, DayChangeBehavior::AutoComplete).unwrap_err();
        assert_eq!(
            err,
            EngineError::CarryOverUnresolved {
                date: make_date("2026-03-03"),
                source_date: make_date("2026-03-02"),
            }
        );
    }
}
