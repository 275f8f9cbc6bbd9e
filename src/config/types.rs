//! Configuration types for daily time calculation.
//!
//! This module contains the strongly-typed day-plan structures that are
//! deserialized from YAML configuration files, plus the id-keyed
//! [`DayPlanTable`] the resolver looks alternates up in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Integer minutes. Used both for durations and for times of day, where it
/// counts minutes from the calculation date's midnight.
pub type Minutes = i32;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: Minutes = 1440;

/// Maximum number of alternate plans a day plan may reference.
pub const MAX_ALTERNATE_PLANS: usize = 6;

/// Identifier of a day plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayPlanId(pub String);

impl DayPlanId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DayPlanId {
    fn from(value: &str) -> Self {
        DayPlanId(value.to_string())
    }
}

impl From<String> for DayPlanId {
    fn from(value: String) -> Self {
        DayPlanId(value)
    }
}

/// The kind of day plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Fixed working hours.
    #[default]
    Fixed,
    /// Flexible working hours inside an arrival and departure window.
    Flextime,
}

/// A closed time-of-day window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window start in minutes from midnight.
    pub start: Minutes,
    /// Window end in minutes from midnight.
    pub end: Minutes,
}

impl TimeWindow {
    /// Creates a new window.
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    /// Returns true when `time` lies inside the window (inclusive).
    pub fn contains(&self, time: Minutes) -> bool {
        self.start <= time && time <= self.end
    }

    /// Returns the number of minutes shared with the half-open span `from..to`.
    pub fn overlap(&self, from: Minutes, to: Minutes) -> Minutes {
        (self.end.min(to) - self.start.max(from)).max(0)
    }

    /// Returns true when both windows share at least one minute.
    pub fn intersects(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns the window length in minutes.
    pub fn len(&self) -> Minutes {
        self.end - self.start
    }

    /// Returns true when the window has no length.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// Tolerance minutes absorbed around the planned arrival and departure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Late arrival after `come_from` that is still treated as on time.
    pub come_plus: Minutes,
    /// Early arrival before `come_from` that snaps to `come_from`.
    pub come_minus: Minutes,
    /// Late departure after the planned departure that snaps back to it.
    pub go_plus: Minutes,
    /// Early departure before the planned departure that is still treated as on time.
    pub go_minus: Minutes,
}

/// The rounding type as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingType {
    /// No rounding.
    #[default]
    None,
    /// Round up to the next multiple of `interval`.
    Up,
    /// Round down to the previous multiple of `interval`.
    Down,
    /// Round to the nearest multiple of `interval`.
    Nearest,
    /// Add a fixed `add_value`.
    Add,
    /// Subtract a fixed `add_value`.
    Subtract,
}

/// A rounding rule in its configuration shape.
///
/// Converted into [`RoundingRule`] with [`RoundingConfig::to_rule`], which is
/// where missing or superfluous parameters are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// The rounding type.
    #[serde(rename = "type", default)]
    pub kind: RoundingType,
    /// Interval in minutes for `up`, `down` and `nearest`.
    #[serde(default)]
    pub interval: Option<Minutes>,
    /// Offset in minutes for `add` and `subtract`.
    #[serde(default)]
    pub add_value: Option<Minutes>,
}

/// A validated rounding rule, one variant per rounding type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundingRule {
    /// Times are left untouched.
    None,
    /// Round up to a multiple of `interval`.
    Up {
        /// Interval in minutes.
        interval: Minutes,
    },
    /// Round down to a multiple of `interval`.
    Down {
        /// Interval in minutes.
        interval: Minutes,
    },
    /// Round to the nearest multiple of `interval`.
    Nearest {
        /// Interval in minutes.
        interval: Minutes,
    },
    /// Shift the time later by `value`.
    Add {
        /// Offset in minutes.
        value: Minutes,
    },
    /// Shift the time earlier by `value`.
    Subtract {
        /// Offset in minutes.
        value: Minutes,
    },
}

impl RoundingConfig {
    /// Converts the configuration into a [`RoundingRule`].
    ///
    /// Fails when the parameter the type needs is missing or not positive, or
    /// when a parameter is given that the type does not use.
    pub fn to_rule(&self, plan_id: &str, side: &str) -> EngineResult<RoundingRule> {
        let interval = |kind: &str| -> EngineResult<Minutes> {
            if self.add_value.is_some() {
                return Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding '{kind}' does not take add_value"),
                ));
            }
            match self.interval {
                Some(value) if value > 0 => Ok(value),
                Some(value) => Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding interval must be positive, got {value}"),
                )),
                None => Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding '{kind}' requires an interval"),
                )),
            }
        };
        let add_value = |kind: &str| -> EngineResult<Minutes> {
            if self.interval.is_some() {
                return Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding '{kind}' does not take an interval"),
                ));
            }
            match self.add_value {
                Some(value) if value >= 0 => Ok(value),
                Some(value) => Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding add_value must not be negative, got {value}"),
                )),
                None => Err(EngineError::configuration(
                    plan_id,
                    format!("{side} rounding '{kind}' requires add_value"),
                )),
            }
        };

        match self.kind {
            RoundingType::None => {
                if self.interval.is_some() || self.add_value.is_some() {
                    return Err(EngineError::configuration(
                        plan_id,
                        format!("{side} rounding 'none' takes no parameters"),
                    ));
                }
                Ok(RoundingRule::None)
            }
            RoundingType::Up => Ok(RoundingRule::Up {
                interval: interval("up")?,
            }),
            RoundingType::Down => Ok(RoundingRule::Down {
                interval: interval("down")?,
            }),
            RoundingType::Nearest => Ok(RoundingRule::Nearest {
                interval: interval("nearest")?,
            }),
            RoundingType::Add => Ok(RoundingRule::Add {
                value: add_value("add")?,
            }),
            RoundingType::Subtract => Ok(RoundingRule::Subtract {
                value: add_value("subtract")?,
            }),
        }
    }
}

/// Rounding configuration for a day plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingSettings {
    /// Rounding applied to arrivals.
    pub arrival: RoundingConfig,
    /// Rounding applied to departures.
    pub departure: RoundingConfig,
    /// Round every paired booking instead of only the first arrival and the
    /// last departure of the date.
    pub round_all_bookings: bool,
}

/// A break rule, one variant per break kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakRule {
    /// A break at a fixed time of day.
    Fixed {
        /// Window start in minutes from midnight.
        start: Minutes,
        /// Window end in minutes from midnight.
        end: Minutes,
        /// Minutes deducted when the window overlaps work.
        duration_minutes: Minutes,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        is_paid: bool,
    },
    /// A break taken via break bookings.
    Variable {
        /// Optional window restricting which break bookings count.
        #[serde(default)]
        start: Option<Minutes>,
        /// Optional window end.
        #[serde(default)]
        end: Option<Minutes>,
        /// Lower bound for the deduction once a break was booked.
        #[serde(default)]
        min_minutes: Option<Minutes>,
        /// Upper bound for the deduction.
        #[serde(default)]
        max_minutes: Option<Minutes>,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        is_paid: bool,
    },
    /// A break enforced once net work exceeds a threshold.
    Minimum {
        /// Net work threshold in minutes.
        after_work_minutes: Minutes,
        /// Minutes deducted past the threshold.
        duration_minutes: Minutes,
        /// Deduct only the minutes past the threshold, capped at the duration.
        #[serde(default)]
        proportional_near_threshold: bool,
        /// Paid breaks are recorded but not deducted.
        #[serde(default)]
        is_paid: bool,
    },
}

impl BreakRule {
    /// Returns the time window the rule occupies, if it has one.
    pub fn window(&self) -> Option<TimeWindow> {
        match *self {
            BreakRule::Fixed { start, end, .. } => Some(TimeWindow::new(start, end)),
            BreakRule::Variable {
                start: Some(start),
                end: Some(end),
                ..
            } => Some(TimeWindow::new(start, end)),
            BreakRule::Variable { .. } | BreakRule::Minimum { .. } => None,
        }
    }

    /// Returns true for paid breaks.
    pub fn is_paid(&self) -> bool {
        match *self {
            BreakRule::Fixed { is_paid, .. }
            | BreakRule::Variable { is_paid, .. }
            | BreakRule::Minimum { is_paid, .. } => is_paid,
        }
    }

    /// Returns the kind of the rule.
    pub fn kind(&self) -> BreakKind {
        match self {
            BreakRule::Fixed { .. } => BreakKind::Fixed,
            BreakRule::Variable { .. } => BreakKind::Variable,
            BreakRule::Minimum { .. } => BreakKind::Minimum,
        }
    }
}

/// The kind of a [`BreakRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    /// A break at a fixed time of day.
    Fixed,
    /// A break taken via break bookings.
    Variable,
    /// A break enforced past a work threshold.
    Minimum,
}

/// How a bonus rule turns overlap minutes into bonus minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BonusCalculation {
    /// A flat amount once per day when the window overlaps work.
    Fixed {
        /// Bonus minutes credited.
        value_minutes: Decimal,
    },
    /// `value_minutes` for every overlapping minute.
    PerMinute {
        /// Bonus minutes per overlapping minute.
        value_minutes: Decimal,
    },
    /// A percentage of the overlapping minutes.
    Percentage {
        /// Percentage of overlap minutes credited.
        value: Decimal,
    },
}

/// A time-window bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRule {
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// The bonus window. `end` may exceed 1440 for windows past midnight.
    pub window: TimeWindow,
    /// How the bonus is computed.
    pub calculation: BonusCalculation,
    /// Net work the day must reach before the bonus applies.
    #[serde(default)]
    pub min_work_minutes: Option<Minutes>,
    /// The account the bonus minutes are posted to.
    pub account: String,
}

/// Holiday credit minutes for each holiday category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayCredit {
    /// Credit for category 1 holidays.
    pub category_1: Option<Minutes>,
    /// Credit for category 2 holidays.
    pub category_2: Option<Minutes>,
    /// Credit for category 3 holidays.
    pub category_3: Option<Minutes>,
}

/// What to do with a day that has no bookings, no absence and no holiday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoBookingBehavior {
    /// Report a calculation error.
    #[default]
    Error,
    /// Credit nothing so the balance becomes minus the target.
    DeductTarget,
    /// Credit the target (vocational school day).
    VocationalSchool,
    /// Credit the target.
    AdoptTarget,
    /// Credit the target and flag the day for order-linked follow-up.
    TargetWithOrder,
}

/// How work intervals crossing midnight are attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChangeBehavior {
    /// An open interval at day end stays open.
    #[default]
    None,
    /// The whole shift belongs to the arrival date.
    AtArrival,
    /// The whole shift belongs to the departure date.
    AtDeparture,
    /// Close at midnight and reopen at 00:00 on the next date.
    AutoComplete,
}

impl DayChangeBehavior {
    /// Returns true when the behavior can carry state into the next date.
    pub fn carries_over(&self) -> bool {
        !matches!(self, DayChangeBehavior::None)
    }
}

/// Shift-detection windows and the alternates evaluated against them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftDetection {
    /// Window the earliest arrival must fall in.
    pub arrive: Option<TimeWindow>,
    /// Window the latest departure must fall in.
    pub depart: Option<TimeWindow>,
    /// Alternate plan ids in evaluation order.
    pub alternates: Vec<DayPlanId>,
}

impl ShiftDetection {
    /// Returns true when at least one detection window is configured.
    pub fn has_windows(&self) -> bool {
        self.arrive.is_some() || self.depart.is_some()
    }

    /// Returns true when the arrival or the departure falls inside its window.
    pub fn matches(&self, arrival: Option<Minutes>, departure: Option<Minutes>) -> bool {
        let arrive_hit = matches!((self.arrive, arrival), (Some(w), Some(t)) if w.contains(t));
        let depart_hit = matches!((self.depart, departure), (Some(w), Some(t)) if w.contains(t));
        arrive_hit || depart_hit
    }
}

/// The configuration of a working day.
///
/// Immutable for the duration of a calculation. Times of day are minutes
/// from midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlanConfig {
    /// Unique plan id.
    pub id: DayPlanId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Fixed or flextime.
    #[serde(default)]
    pub plan_type: PlanType,
    /// Earliest (flextime) or planned (fixed) arrival.
    pub come_from: Minutes,
    /// Latest arrival. Required for flextime plans.
    #[serde(default)]
    pub come_to: Option<Minutes>,
    /// Earliest departure.
    #[serde(default)]
    pub go_from: Option<Minutes>,
    /// Latest (flextime) or planned (fixed) departure.
    #[serde(default)]
    pub go_to: Option<Minutes>,
    /// Optional core-time window.
    #[serde(default)]
    pub core_time: Option<TimeWindow>,
    /// Target minutes.
    #[serde(default)]
    pub regular_hours: Option<Minutes>,
    /// Target minutes on absence days.
    #[serde(default)]
    pub regular_hours_2: Option<Minutes>,
    /// Take the target from the employee master when it is available.
    #[serde(default)]
    pub from_employee_master: bool,
    /// Tolerance minutes.
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Allows early-arrival tolerance on fixed plans.
    #[serde(default)]
    pub variable_work_time: bool,
    /// Rounding rules.
    #[serde(default)]
    pub rounding: RoundingSettings,
    /// Break rules, evaluated in declared order.
    #[serde(default)]
    pub breaks: Vec<BreakRule>,
    /// Bonus rules, evaluated in declared order.
    #[serde(default)]
    pub bonuses: Vec<BonusRule>,
    /// Holiday credit per category.
    #[serde(default)]
    pub holiday_credit: HolidayCredit,
    /// Vacation days deducted for a full-day vacation absence.
    #[serde(default = "default_vacation_deduction")]
    pub vacation_deduction: Decimal,
    /// Policy for days without bookings, absence or holiday.
    #[serde(default)]
    pub no_booking_behavior: NoBookingBehavior,
    /// Cross-midnight policy.
    #[serde(default)]
    pub day_change_behavior: DayChangeBehavior,
    /// Shift detection.
    #[serde(default)]
    pub shift_detection: ShiftDetection,
    /// Optional cap on net work minutes after breaks.
    #[serde(default)]
    pub max_net_work_minutes: Option<Minutes>,
}

fn default_vacation_deduction() -> Decimal {
    Decimal::ONE
}

impl Default for DayPlanConfig {
    fn default() -> Self {
        Self {
            id: DayPlanId::default(),
            name: String::new(),
            plan_type: PlanType::default(),
            come_from: 0,
            come_to: None,
            go_from: None,
            go_to: None,
            core_time: None,
            regular_hours: None,
            regular_hours_2: None,
            from_employee_master: false,
            tolerance: ToleranceConfig::default(),
            variable_work_time: false,
            rounding: RoundingSettings::default(),
            breaks: Vec::new(),
            bonuses: Vec::new(),
            holiday_credit: HolidayCredit::default(),
            vacation_deduction: default_vacation_deduction(),
            no_booking_behavior: NoBookingBehavior::default(),
            day_change_behavior: DayChangeBehavior::default(),
            shift_detection: ShiftDetection::default(),
            max_net_work_minutes: None,
        }
    }
}

impl DayPlanConfig {
    /// Returns the planned departure used as the tolerance reference.
    ///
    /// `go_to` when configured, otherwise `go_from`.
    pub fn planned_departure(&self) -> Option<Minutes> {
        self.go_to.or(self.go_from)
    }

    /// Returns the validated arrival and departure rounding rules.
    pub fn rounding_rules(&self) -> EngineResult<(RoundingRule, RoundingRule)> {
        let plan_id = self.id.as_str();
        Ok((
            self.rounding.arrival.to_rule(plan_id, "arrival")?,
            self.rounding.departure.to_rule(plan_id, "departure")?,
        ))
    }

    /// Checks the plan for internal consistency.
    ///
    /// Does not look at alternates; [`DayPlanTable`] validates references.
    pub fn validate(&self) -> EngineResult<()> {
        let plan_id = self.id.as_str();
        let fail = |message: String| Err(EngineError::configuration(plan_id, message));

        if plan_id.is_empty() {
            return fail("plan id must not be empty".to_string());
        }
        if self.plan_type == PlanType::Flextime && self.come_to.is_none() {
            return fail("flextime plans require come_to".to_string());
        }
        if let Some(come_to) = self.come_to {
            if self.come_from > come_to {
                return fail(format!(
                    "come_from {} is after come_to {}",
                    self.come_from, come_to
                ));
            }
        }
        if let (Some(go_from), Some(go_to)) = (self.go_from, self.go_to) {
            if go_from > go_to {
                return fail(format!("go_from {go_from} is after go_to {go_to}"));
            }
        }
        if let Some(core) = self.core_time {
            if core.start > core.end {
                return fail(format!(
                    "core time start {} is after end {}",
                    core.start, core.end
                ));
            }
        }

        let tolerance = &self.tolerance;
        if tolerance.come_plus < 0
            || tolerance.come_minus < 0
            || tolerance.go_plus < 0
            || tolerance.go_minus < 0
        {
            return fail("tolerance minutes must not be negative".to_string());
        }

        for (label, value) in [
            ("regular_hours", self.regular_hours),
            ("regular_hours_2", self.regular_hours_2),
            ("max_net_work_minutes", self.max_net_work_minutes),
        ] {
            if value.is_some_and(|v| v < 0) {
                return fail(format!("{label} must not be negative"));
            }
        }

        self.rounding_rules()?;

        for (index, rule) in self.breaks.iter().enumerate() {
            validate_break_rule(plan_id, index, rule)?;
        }

        for (index, bonus) in self.bonuses.iter().enumerate() {
            if bonus.window.start >= bonus.window.end {
                return fail(format!(
                    "bonus {index} window start {} is not before end {}",
                    bonus.window.start, bonus.window.end
                ));
            }
            if bonus.account.is_empty() {
                return fail(format!("bonus {index} has no target account"));
            }
        }

        for (label, window) in [
            ("arrive", self.shift_detection.arrive),
            ("depart", self.shift_detection.depart),
        ] {
            if let Some(window) = window {
                if window.start > window.end {
                    return fail(format!(
                        "shift detection {label} window start {} is after end {}",
                        window.start, window.end
                    ));
                }
            }
        }
        if self.shift_detection.alternates.len() > MAX_ALTERNATE_PLANS {
            return fail(format!(
                "at most {MAX_ALTERNATE_PLANS} alternate plans allowed, got {}",
                self.shift_detection.alternates.len()
            ));
        }

        Ok(())
    }
}

fn validate_break_rule(plan_id: &str, index: usize, rule: &BreakRule) -> EngineResult<()> {
    let fail = |message: String| Err(EngineError::configuration(plan_id, message));
    match *rule {
        BreakRule::Fixed {
            start,
            end,
            duration_minutes,
            ..
        } => {
            if start >= end {
                return fail(format!(
                    "fixed break {index} start {start} is not before end {end}"
                ));
            }
            if duration_minutes < 0 {
                return fail(format!("fixed break {index} has a negative duration"));
            }
        }
        BreakRule::Variable {
            start,
            end,
            min_minutes,
            max_minutes,
            ..
        } => {
            match (start, end) {
                (Some(start), Some(end)) if start >= end => {
                    return fail(format!(
                        "variable break {index} start {start} is not before end {end}"
                    ));
                }
                (Some(_), None) | (None, Some(_)) => {
                    return fail(format!(
                        "variable break {index} needs both start and end or neither"
                    ));
                }
                _ => {}
            }
            if let (Some(min), Some(max)) = (min_minutes, max_minutes) {
                if min > max {
                    return fail(format!(
                        "variable break {index} min_minutes {min} exceeds max_minutes {max}"
                    ));
                }
            }
        }
        BreakRule::Minimum {
            after_work_minutes,
            duration_minutes,
            ..
        } => {
            if after_work_minutes < 0 || duration_minutes < 0 {
                return fail(format!("minimum break {index} has negative minutes"));
            }
        }
    }
    Ok(())
}

/// The id-keyed lookup table of day plans.
///
/// Alternates are stored as ids and resolved through this table, one level
/// deep, so the plan graph never needs to be followed recursively.
#[derive(Debug, Clone, Default)]
pub struct DayPlanTable {
    plans: HashMap<DayPlanId, DayPlanConfig>,
}

impl DayPlanTable {
    /// Builds a table from a list of plans, validating every plan and every
    /// alternate reference.
    pub fn from_plans(plans: Vec<DayPlanConfig>) -> EngineResult<Self> {
        let mut table = HashMap::with_capacity(plans.len());
        for plan in plans {
            plan.validate()?;
            if table.contains_key(&plan.id) {
                return Err(EngineError::configuration(
                    plan.id.as_str(),
                    "duplicate day plan id",
                ));
            }
            table.insert(plan.id.clone(), plan);
        }

        for plan in table.values() {
            for alternate in &plan.shift_detection.alternates {
                if alternate == &plan.id {
                    return Err(EngineError::configuration(
                        plan.id.as_str(),
                        "a day plan cannot be its own alternate",
                    ));
                }
                if !table.contains_key(alternate) {
                    return Err(EngineError::configuration(
                        plan.id.as_str(),
                        format!("alternate plan '{alternate}' does not exist"),
                    ));
                }
            }
        }

        Ok(Self { plans: table })
    }

    /// Looks up a plan by id.
    pub fn get(&self, id: &DayPlanId) -> EngineResult<&DayPlanConfig> {
        self.plans
            .get(id)
            .ok_or_else(|| EngineError::DayPlanNotFound {
                plan_id: id.to_string(),
            })
    }

    /// Returns the number of plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Returns true when the table holds no plans.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Iterates over all plans in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &DayPlanConfig> {
        self.plans.values()
    }
}

/// Worker-pool settings for batch recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecalculationSettings {
    /// Maximum number of employees calculated concurrently.
    pub max_workers: usize,
}

impl Default for RecalculationSettings {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

/// Engine settings from `engine.yaml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Batch recalculation settings.
    pub recalculation: RecalculationSettings,
}
