//! Crediting of days without real work.
//!
//! This module credits absences, holidays and the no-booking behavior on
//! dates that have no complete work interval.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::config::{DayPlanConfig, Minutes, NoBookingBehavior};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AbsenceDuration, AbsenceRecord, AuditStep, AuditWarning, CreditSource, HolidayRecord,
};

/// Inputs of absence and no-booking crediting.
#[derive(Debug, Clone, Copy)]
pub struct CreditInput<'a> {
    /// The employee the date belongs to.
    pub employee_id: &'a str,
    /// The calculation date.
    pub date: NaiveDate,
    /// At least one complete work interval exists.
    pub has_real_work: bool,
    /// The resolved target minutes.
    pub target_minutes: Minutes,
    /// The active absence, if any.
    pub absence: Option<&'a AbsenceRecord>,
    /// The holiday, if any.
    pub holiday: Option<&'a HolidayRecord>,
}

/// The result of absence and no-booking crediting.
#[derive(Debug, Clone)]
pub struct AbsenceCreditResult {
    /// Minutes credited in place of work.
    pub credit_minutes: Decimal,
    /// Where the credit came from.
    pub source: CreditSource,
    /// Vacation days consumed.
    pub vacation_days_deducted: Decimal,
    /// The no-booking behavior was applied.
    pub no_booking_triggered: bool,
    /// The no-booking behavior asked for order-linked follow-up.
    pub order_booking_required: bool,
    /// Warnings raised while crediting.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Resolves the credit for a date.
///
/// Dates with real work credit nothing here, except a half-day absence,
/// which credits its half alongside the work. A full-day absence recorded on
/// such a date is ignored with an `ABSENCE_WITH_BOOKINGS` warning. Otherwise,
/// in order of precedence:
///
/// 1. An absence credits `target × credit multiplier × duration`.
/// 2. A holiday credits the plan's holiday credit for its category, or nothing
///    with a `HOLIDAY_CREDIT_MISSING` warning when the category has none.
/// 3. The plan's [`NoBookingBehavior`] decides. `error` fails the date with
///    [`EngineError::NoBookingPolicy`].
///
/// Vacation days are reported for credited absences whose type deducts
/// vacation, unless the date is also a holiday.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use workday_engine::calculation::{CreditInput, resolve_absence_credit};
/// use workday_engine::config::{DayPlanConfig, DayPlanId, NoBookingBehavior};
///
/// let plan = DayPlanConfig {
///     id: DayPlanId::from("standard"),
///     come_from: 480,
///     regular_hours: Some(480),
///     no_booking_behavior: NoBookingBehavior::DeductTarget,
///     ..Default::default()
/// };
/// let input = CreditInput {
///     employee_id: "emp_001",
///     date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     has_real_work: false,
///     target_minutes: 480,
///     absence: None,
///     holiday: None,
/// };
///
/// let result = resolve_absence_credit(&plan, &input, 1).unwrap();
/// assert_eq!(result.credit_minutes, Decimal::ZERO);
/// assert!(result.no_booking_triggered);
/// ```
pub fn resolve_absence_credit(
    plan: &DayPlanConfig,
    input: &CreditInput<'_>,
    step_number: u32,
) -> EngineResult<AbsenceCreditResult> {
    if let Some(absence) = input.absence {
        absence.validate()?;
        if absence.date != input.date {
            return Err(EngineError::invalid_input(
                "absence.date",
                format!("absence for {} supplied for {}", absence.date, input.date),
            ));
        }
    }
    if let Some(holiday) = input.holiday {
        if holiday.date != input.date {
            return Err(EngineError::invalid_input(
                "holiday.date",
                format!("holiday for {} supplied for {}", holiday.date, input.date),
            ));
        }
    }

    let target = Decimal::from(input.target_minutes);
    let mut warnings = Vec::new();
    let mut vacation_days_deducted = Decimal::ZERO;
    let mut no_booking_triggered = false;
    let mut order_booking_required = false;

    let (credit_minutes, source, reasoning) = if let (true, Some(absence)) = (
        input.has_real_work,
        input.absence.filter(|a| a.duration == AbsenceDuration::Half),
    ) {
        let credit = target * absence.credit.factor() * absence.duration.factor();
        if absence.deducts_vacation && input.holiday.is_none() {
            vacation_days_deducted = plan.vacation_deduction * absence.duration.factor();
        }
        (
            credit,
            CreditSource::Work,
            format!(
                "Half-day absence '{}' credits {} x {} x {} = {} minutes alongside work",
                absence.absence_type_id,
                target,
                absence.credit.factor(),
                absence.duration.factor(),
                credit
            ),
        )
    } else if input.has_real_work {
        if let Some(absence) = input.absence {
            warnings.push(AuditWarning::new(
                "ABSENCE_WITH_BOOKINGS",
                format!(
                    "Absence '{}' ignored because the date has work bookings",
                    absence.absence_type_id
                ),
            ));
        }
        (
            Decimal::ZERO,
            CreditSource::Work,
            "Date has real work; no credit applied".to_string(),
        )
    } else if let Some(absence) = input.absence {
        let credit = target * absence.credit.factor() * absence.duration.factor();
        if absence.deducts_vacation && input.holiday.is_none() {
            vacation_days_deducted = plan.vacation_deduction * absence.duration.factor();
        }
        (
            credit,
            CreditSource::Absence,
            format!(
                "Absence '{}' credits {} x {} x {} = {} minutes",
                absence.absence_type_id,
                target,
                absence.credit.factor(),
                absence.duration.factor(),
                credit
            ),
        )
    } else if let Some(holiday) = input.holiday {
        let configured = match holiday.category.get() {
            1 => plan.holiday_credit.category_1,
            2 => plan.holiday_credit.category_2,
            _ => plan.holiday_credit.category_3,
        };
        let credit = match configured {
            Some(minutes) => Decimal::from(minutes),
            None => {
                warnings.push(AuditWarning::new(
                    "HOLIDAY_CREDIT_MISSING",
                    format!(
                        "Day plan '{}' has no holiday credit for category {}",
                        plan.id,
                        holiday.category.get()
                    ),
                ));
                Decimal::ZERO
            }
        };
        (
            credit,
            CreditSource::Holiday,
            format!(
                "Holiday '{}' (category {}) credits {} minutes",
                holiday.name,
                holiday.category.get(),
                credit
            ),
        )
    } else {
        no_booking_triggered = true;
        let credit = match plan.no_booking_behavior {
            NoBookingBehavior::Error => {
                return Err(EngineError::NoBookingPolicy {
                    employee_id: input.employee_id.to_string(),
                    date: input.date,
                });
            }
            NoBookingBehavior::DeductTarget => Decimal::ZERO,
            NoBookingBehavior::VocationalSchool | NoBookingBehavior::AdoptTarget => target,
            NoBookingBehavior::TargetWithOrder => {
                order_booking_required = true;
                target
            }
        };
        (
            credit,
            CreditSource::NoBookingPolicy,
            format!(
                "No bookings; {:?} credits {} minutes",
                plan.no_booking_behavior, credit
            ),
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "absence_credit".to_string(),
        rule_name: "Absence and No-Booking Credit".to_string(),
        input: json!({
            "has_real_work": input.has_real_work,
            "target_minutes": input.target_minutes,
            "absence": input.absence,
            "holiday": input.holiday,
            "no_booking_behavior": plan.no_booking_behavior,
        }),
        output: json!({
            "credit_minutes": credit_minutes,
            "source": source,
            "vacation_days_deducted": vacation_days_deducted,
            "order_booking_required": order_booking_required,
        }),
        reasoning,
    };

    Ok(AbsenceCreditResult {
        credit_minutes,
        source,
        vacation_days_deducted,
        no_booking_triggered,
        order_booking_required,
        warnings,
        audit_step,
    })
}
