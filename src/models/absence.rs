//! Absence and holiday records.
//!
//! This module defines the [`AbsenceRecord`] and [`HolidayRecord`] that
//! replace attendance on days without real work.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The portion of a day an absence covers.
///
/// Serialized as the decimal `1.0` or `0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub enum AbsenceDuration {
    /// A whole day.
    Full,
    /// Half a day.
    Half,
}

impl AbsenceDuration {
    /// Returns the duration as a factor of the day.
    pub fn factor(&self) -> Decimal {
        match self {
            AbsenceDuration::Full => Decimal::ONE,
            AbsenceDuration::Half => Decimal::new(5, 1),
        }
    }
}

impl TryFrom<Decimal> for AbsenceDuration {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value == Decimal::ONE {
            Ok(AbsenceDuration::Full)
        } else if value == Decimal::new(5, 1) {
            Ok(AbsenceDuration::Half)
        } else {
            Err(format!("absence duration must be 1.0 or 0.5, got {value}"))
        }
    }
}

impl From<AbsenceDuration> for Decimal {
    fn from(value: AbsenceDuration) -> Self {
        value.factor()
    }
}

/// Which half of the day a half-day absence covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfDayPeriod {
    /// The first half of the day.
    Morning,
    /// The second half of the day.
    Afternoon,
}

/// How much of the target an absence type credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditMultiplier {
    /// The full target.
    Full,
    /// Half the target.
    Half,
    /// Nothing.
    None,
}

impl CreditMultiplier {
    /// Returns the multiplier as a factor.
    pub fn factor(&self) -> Decimal {
        match self {
            CreditMultiplier::Full => Decimal::ONE,
            CreditMultiplier::Half => Decimal::new(5, 1),
            CreditMultiplier::None => Decimal::ZERO,
        }
    }
}

/// An absence on a single date, with the properties of its absence type
/// already resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    /// The date the absence applies to.
    pub date: NaiveDate,
    /// The absence type id (for example "vacation" or "sick").
    pub absence_type_id: String,
    /// Whole or half day.
    pub duration: AbsenceDuration,
    /// Required exactly for half-day absences.
    #[serde(default)]
    pub half_day_period: Option<HalfDayPeriod>,
    /// Credit multiplier of the absence type.
    pub credit: CreditMultiplier,
    /// Whether the absence type consumes vacation entitlement.
    #[serde(default)]
    pub deducts_vacation: bool,
    /// Cancelled absences are ignored.
    #[serde(default)]
    pub cancelled: bool,
}

impl AbsenceRecord {
    /// Checks that `half_day_period` is present exactly for half days.
    pub fn validate(&self) -> EngineResult<()> {
        match (self.duration, self.half_day_period) {
            (AbsenceDuration::Half, None) => Err(EngineError::invalid_input(
                "absence.half_day_period",
                format!("half-day absence on {} needs a half_day_period", self.date),
            )),
            (AbsenceDuration::Full, Some(_)) => Err(EngineError::invalid_input(
                "absence.half_day_period",
                format!("full-day absence on {} must not set half_day_period", self.date),
            )),
            _ => Ok(()),
        }
    }
}

/// The category of a public holiday, 1 to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HolidayCategory(u8);

impl HolidayCategory {
    /// Returns the category number.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HolidayCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(HolidayCategory(value))
        } else {
            Err(format!("holiday category must be 1, 2 or 3, got {value}"))
        }
    }
}

impl From<HolidayCategory> for u8 {
    fn from(value: HolidayCategory) -> Self {
        value.0
    }
}

/// A public holiday on a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRecord {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    #[serde(default)]
    pub name: String,
    /// The holiday category.
    pub category: HolidayCategory,
}

/// Picks the single non-cancelled absence for `date` out of `absences`.
///
/// Fails when more than one non-cancelled absence exists for the date.
pub fn active_absence(
    absences: &[AbsenceRecord],
    date: NaiveDate,
) -> EngineResult<Option<&AbsenceRecord>> {
    let mut active = absences
        .iter()
        .filter(|absence| absence.date == date && !absence.cancelled);
    let first = active.next();
    if active.next().is_some() {
        return Err(EngineError::invalid_input(
            "absence",
            format!("more than one active absence on {date}"),
        ));
    }
    Ok(first)
}
