//! Booking model.
//!
//! This module defines [`BookingEvent`], the raw clock event an employee
//! produces at a terminal or in a client.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::{MINUTES_PER_DAY, Minutes};

/// Direction of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingDirection {
    /// Arrival, or the start of a break for break bookings.
    In,
    /// Departure, or the end of a break for break bookings.
    Out,
}

/// What a booking records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingCategory {
    /// Attendance.
    #[default]
    Work,
    /// A registered break.
    Break,
}

/// A raw timestamped clock event.
///
/// Supplied externally and never mutated by the engine.
///
/// # Example
///
/// ```
/// use workday_engine::models::{BookingDirection, BookingEvent};
/// use chrono::NaiveDateTime;
///
/// let arrival = BookingEvent::work(
///     NaiveDateTime::parse_from_str("2026-03-02 08:07:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     BookingDirection::In,
/// );
/// assert_eq!(arrival.minutes_from(arrival.date()), 487);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEvent {
    /// When the event was recorded.
    pub timestamp: NaiveDateTime,
    /// Arrival or departure.
    pub direction: BookingDirection,
    /// Work or break booking.
    #[serde(default)]
    pub category: BookingCategory,
}

impl BookingEvent {
    /// Creates a work booking.
    pub fn work(timestamp: NaiveDateTime, direction: BookingDirection) -> Self {
        Self {
            timestamp,
            direction,
            category: BookingCategory::Work,
        }
    }

    /// Creates a break booking.
    pub fn break_event(timestamp: NaiveDateTime, direction: BookingDirection) -> Self {
        Self {
            timestamp,
            direction,
            category: BookingCategory::Break,
        }
    }

    /// Returns the calendar date of the event.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Returns the event time in minutes relative to midnight of `date`.
    ///
    /// Events on later dates yield values past 1440, events on earlier dates
    /// negative values. Seconds are truncated.
    pub fn minutes_from(&self, date: NaiveDate) -> Minutes {
        let days = (self.timestamp.date() - date).num_days() as Minutes;
        let minute_of_day = (self.timestamp.time().num_seconds_from_midnight() / 60) as Minutes;
        days * MINUTES_PER_DAY + minute_of_day
    }

    /// Returns true for work bookings.
    pub fn is_work(&self) -> bool {
        self.category == BookingCategory::Work
    }
}

/// Returns the work bookings of `events` sorted by timestamp.
pub(crate) fn sorted_work_events(events: &[BookingEvent]) -> Vec<BookingEvent> {
    sorted_events(events, BookingCategory::Work)
}

/// Returns the events of one category sorted by timestamp. Stable for equal
/// timestamps.
pub(crate) fn sorted_events(events: &[BookingEvent], category: BookingCategory) -> Vec<BookingEvent> {
    let mut selected: Vec<BookingEvent> = events
        .iter()
        .filter(|event| event.category == category)
        .copied()
        .collect();
    selected.sort_by_key(|event| event.timestamp);
    selected
}
