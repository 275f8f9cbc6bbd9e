//! Error types for the daily time-calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while calculating a day.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the daily time-calculation engine.
///
/// Every error that can be reported for a single date is one of these
/// variants. Range calculations attach them to the date they occurred on.
///
/// # Example
///
/// ```
/// use workday_engine::error::EngineError;
///
/// let error = EngineError::DayPlanNotFound {
///     plan_id: "early_shift".to_string(),
/// };
/// assert_eq!(error.to_string(), "Day plan not found: early_shift");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A day plan is internally inconsistent or misses a required value.
    #[error("Configuration error in day plan '{plan_id}': {message}")]
    Configuration {
        /// The day plan that failed validation.
        plan_id: String,
        /// A description of the problem.
        message: String,
    },

    /// A day plan id was referenced but is not in the plan table.
    #[error("Day plan not found: {plan_id}")]
    DayPlanNotFound {
        /// The missing plan id.
        plan_id: String,
    },

    /// No day plan was assigned to a date inside a range calculation.
    #[error("No day plan assigned for {date}")]
    DayPlanNotAssigned {
        /// The date without an assignment.
        date: NaiveDate,
    },

    /// The no-booking policy is `error` and the day has no bookings,
    /// no absence and no holiday.
    #[error("No bookings for employee '{employee_id}' on {date}")]
    NoBookingPolicy {
        /// The employee the day belongs to.
        employee_id: String,
        /// The date without bookings.
        date: NaiveDate,
    },

    /// More than one alternate plan matched the shift-detection windows.
    #[error(
        "Ambiguous shift detection for day plan '{plan_id}': candidates {}",
        .candidates.join(", ")
    )]
    AmbiguousShiftDetection {
        /// The base plan whose alternates were evaluated.
        plan_id: String,
        /// Every alternate that matched.
        candidates: Vec<String>,
    },

    /// The previous date failed while it had a shift open across midnight.
    #[error("Carry-over from {source_date} unresolved, cannot calculate {date}")]
    CarryOverUnresolved {
        /// The date that could not be calculated.
        date: NaiveDate,
        /// The failed date the carry-over originates from.
        source_date: NaiveDate,
    },

    /// Input records (bookings, absences, holidays) are inconsistent.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The same employee was submitted twice in one recalculation run.
    #[error("Employee '{employee_id}' submitted more than once")]
    DuplicateEmployee {
        /// The duplicated employee id.
        employee_id: String,
    },
}

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad configuration data. Never retried.
    Configuration,
    /// The no-booking policy demanded an error.
    NoBookingPolicy,
    /// Shift detection could not pick a single alternate plan.
    AmbiguousShiftDetection,
    /// A previous date's failure left a cross-midnight shift unresolved.
    CarryOverUnresolved,
    /// The supplied records were inconsistent.
    InvalidInput,
}

impl EngineError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::Configuration { .. }
            | EngineError::DayPlanNotFound { .. }
            | EngineError::DayPlanNotAssigned { .. } => ErrorKind::Configuration,
            EngineError::NoBookingPolicy { .. } => ErrorKind::NoBookingPolicy,
            EngineError::AmbiguousShiftDetection { .. } => ErrorKind::AmbiguousShiftDetection,
            EngineError::CarryOverUnresolved { .. } => ErrorKind::CarryOverUnresolved,
            EngineError::InvalidInput { .. } | EngineError::DuplicateEmployee { .. } => {
                ErrorKind::InvalidInput
            }
        }
    }

    pub(crate) fn configuration(plan_id: &str, message: impl Into<String>) -> Self {
        EngineError::Configuration {
            plan_id: plan_id.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
