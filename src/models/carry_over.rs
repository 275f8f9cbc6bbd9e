//! Cross-midnight carry-over state threaded between consecutive dates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// State one date hands to the next date of the same employee.
///
/// Produced by the booking pairer according to the day-change behavior of
/// the date it was calculated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CarryOver {
    /// Nothing carried.
    #[default]
    None,
    /// The previous date consumed this date's leading departure (`at_arrival`).
    ConsumedDeparture {
        /// The consumed departure.
        timestamp: NaiveDateTime,
    },
    /// The previous date's trailing arrival belongs to this date (`at_departure`).
    PendingArrival {
        /// The carried arrival.
        timestamp: NaiveDateTime,
    },
    /// The previous date closed an open interval at midnight (`auto_complete`).
    OpenAtMidnight {
        /// The arrival of the interval that was closed.
        since: NaiveDateTime,
    },
    /// The previous date failed with a shift open across midnight.
    Unresolved {
        /// The failed date.
        source_date: NaiveDate,
    },
}

impl CarryOver {
    /// Returns true when nothing is carried.
    pub fn is_none(&self) -> bool {
        matches!(self, CarryOver::None)
    }
}
