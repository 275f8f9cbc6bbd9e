//! Paired work intervals.

use serde::{Deserialize, Serialize};

use crate::config::Minutes;

/// One arrival/departure pair, in minutes relative to the calculation date.
///
/// A missing side marks an incomplete pair. Synthetic sides were produced by
/// the day-change policy rather than by a booking. A carried arrival is a
/// real booking of the previous date moved onto this one; it stays subject to
/// tolerance and rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedInterval {
    /// Arrival minute, if booked.
    pub arrival: Option<Minutes>,
    /// Departure minute, if booked.
    pub departure: Option<Minutes>,
    /// The arrival was inserted by the day-change policy.
    #[serde(default)]
    pub arrival_synthetic: bool,
    /// The departure was inserted by the day-change policy.
    #[serde(default)]
    pub departure_synthetic: bool,
    /// The arrival was booked on the previous date (`at_departure`).
    #[serde(default)]
    pub arrival_carried: bool,
}

impl PairedInterval {
    /// Creates a complete interval from two booked times.
    pub fn new(arrival: Minutes, departure: Minutes) -> Self {
        Self {
            arrival: Some(arrival),
            departure: Some(departure),
            arrival_synthetic: false,
            departure_synthetic: false,
            arrival_carried: false,
        }
    }

    /// Creates an interval with an arrival and no departure.
    pub fn open(arrival: Minutes) -> Self {
        Self {
            arrival: Some(arrival),
            departure: None,
            arrival_synthetic: false,
            departure_synthetic: false,
            arrival_carried: false,
        }
    }

    /// Returns true when both sides are present.
    pub fn is_complete(&self) -> bool {
        self.arrival.is_some() && self.departure.is_some()
    }

    /// Returns true for an arrival without departure.
    pub fn is_open(&self) -> bool {
        self.arrival.is_some() && self.departure.is_none()
    }

    /// Returns the duration in minutes. Incomplete pairs count zero.
    pub fn duration(&self) -> Minutes {
        match (self.arrival, self.departure) {
            (Some(arrival), Some(departure)) => (departure - arrival).max(0),
            _ => 0,
        }
    }

    /// Returns the minutes shared with `from..to`.
    pub fn overlap(&self, from: Minutes, to: Minutes) -> Minutes {
        match (self.arrival, self.departure) {
            (Some(arrival), Some(departure)) => (departure.min(to) - arrival.max(from)).max(0),
            _ => 0,
        }
    }
}

/// Sums the durations of all complete intervals.
pub fn total_duration(intervals: &[PairedInterval]) -> Minutes {
    intervals.iter().map(PairedInterval::duration).sum()
}
