//! Single-date calculation.
//!
//! This module runs the full pipeline for one employee and date: resolve
//! the plan, pair bookings, absorb tolerance, round, deduct breaks, add
//! bonuses, credit absences or the no-booking behavior, and aggregate the
//! [`DailyCalculationResult`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{DayPlanConfig, DayPlanTable, Minutes, TimeWindow};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AbsenceRecord, AuditStep, AuditTrace, AuditWarning, BookingDirection, BookingEvent,
    CalculationFlags, CarryOver, CreditSource, DailyCalculationResult, HolidayRecord,
    PairedInterval, sorted_work_events,
};

use super::absence_credit::{CreditInput, resolve_absence_credit};
use super::bonus::calculate_bonuses;
use super::booking_pairer::{PairingInput, pair_bookings};
use super::break_deduction::calculate_break_deductions;
use super::day_plan_resolver::{ResolverInput, resolve_day_plan};
use super::rounding::apply_rounding;
use super::tolerance::apply_tolerance;

/// The engine version recorded on every result.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to calculate one employee and date.
#[derive(Debug, Clone, Copy)]
pub struct DayInput<'a> {
    /// The employee.
    pub employee_id: &'a str,
    /// The calculation date.
    pub date: NaiveDate,
    /// The day plan assigned to the date, before shift detection.
    pub day_plan: &'a DayPlanConfig,
    /// Bookings of the date and of the following date.
    pub bookings: &'a [BookingEvent],
    /// The absence recorded for the date, if any.
    pub absence: Option<&'a AbsenceRecord>,
    /// The holiday on the date, if any.
    pub holiday: Option<&'a HolidayRecord>,
    /// Target minutes from the employee master, if recorded.
    pub employee_master_target: Option<Minutes>,
    /// State handed over by the previous date.
    pub carry_in: CarryOver,
}

/// A completed date together with the state it hands to the next date.
#[derive(Debug, Clone)]
pub struct DayOutcome {
    /// The calculation result.
    pub result: DailyCalculationResult,
    /// State for the next date of the same employee.
    pub carry_out: CarryOver,
}

/// Calculates one employee and date.
///
/// `plans` is the table alternates are looked up in. Returns either a
/// complete result or the error that stopped the date; nothing is returned
/// half-done.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveDateTime};
/// use rust_decimal::Decimal;
/// use workday_engine::calculation::{DayInput, calculate_day};
/// use workday_engine::config::{DayPlanConfig, DayPlanId, DayPlanTable};
/// use workday_engine::models::{BookingDirection, BookingEvent, CarryOver};
///
/// let plan = DayPlanConfig {
///     id: DayPlanId::from("standard"),
///     come_from: 480,
///     go_to: Some(1020),
///     regular_hours: Some(480),
///     ..Default::default()
/// };
/// let plans = DayPlanTable::from_plans(vec![plan.clone()]).unwrap();
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
/// let bookings = vec![
///     BookingEvent::work(at("2026-03-02 08:00"), BookingDirection::In),
///     BookingEvent::work(at("2026-03-02 17:00"), BookingDirection::Out),
/// ];
///
/// let outcome = calculate_day(
///     &DayInput {
///         employee_id: "emp_001",
///         date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///         day_plan: &plan,
///         bookings: &bookings,
///         absence: None,
///         holiday: None,
///         employee_master_target: None,
///         carry_in: CarryOver::None,
///     },
///     &plans,
/// )
/// .unwrap();
/// assert_eq!(outcome.result.net_work_minutes, 540);
/// assert_eq!(outcome.result.balance_minutes, Decimal::from(60));
/// ```
pub fn calculate_day(input: &DayInput<'_>, plans: &DayPlanTable) -> EngineResult<DayOutcome> {
    match run_pipeline(input, plans) {
        Ok(outcome) => {
            debug!(
                employee_id = input.employee_id,
                date = %input.date,
                plan_id = %outcome.result.resolved_plan_id,
                credited_minutes = %outcome.result.credited_minutes,
                balance_minutes = %outcome.result.balance_minutes,
                "Calculated date"
            );
            Ok(outcome)
        }
        Err(error) => {
            warn!(
                employee_id = input.employee_id,
                date = %input.date,
                plan_id = %input.day_plan.id,
                error = %error,
                "Date calculation failed"
            );
            Err(error)
        }
    }
}

fn run_pipeline(input: &DayInput<'_>, plans: &DayPlanTable) -> EngineResult<DayOutcome> {
    let date = input.date;
    if let CarryOver::Unresolved { source_date } = input.carry_in {
        return Err(EngineError::CarryOverUnresolved { date, source_date });
    }

    let absence = input.absence.filter(|absence| !absence.cancelled);
    let mut trace = AuditTrace::default();
    let mut step = 1;

    // Step 1: resolve the plan against the raw day's first arrival and last departure
    let (earliest_arrival, latest_departure) = raw_span(input.bookings, date);
    let resolved = resolve_day_plan(
        input.day_plan,
        plans,
        &ResolverInput {
            earliest_arrival,
            latest_departure,
            has_absence: absence.is_some(),
            employee_master_target: input.employee_master_target,
        },
        step,
    )?;
    let plan = resolved.plan;
    let target_minutes = resolved.target_minutes;
    trace.steps.push(resolved.audit_step);
    trace.warnings.extend(resolved.warnings);
    step += 1;

    // Step 2: pair bookings
    let pairing = pair_bookings(
        &PairingInput {
            date,
            bookings: input.bookings,
            carry_in: input.carry_in,
            day_change_behavior: plan.day_change_behavior,
        },
        step,
    )?;
    trace.steps.push(pairing.audit_step);
    trace.warnings.extend(pairing.warnings);
    step += 1;

    // Step 3: tolerance, then rounding
    let tolerance = apply_tolerance(plan, &pairing.intervals, step);
    trace.steps.push(tolerance.audit_step);
    step += 1;

    let rounding = apply_rounding(plan, &tolerance.intervals, step)?;
    trace.steps.push(rounding.audit_step);
    trace.warnings.extend(rounding.warnings);
    step += 1;

    let intervals = rounding.intervals;
    let mut adjustments = tolerance.adjustments;
    adjustments.extend(rounding.adjustments);
    let has_real_work = intervals.iter().any(PairedInterval::is_complete);

    if let (Some(core), true) = (plan.core_time, has_real_work) {
        if let Some(warning) = core_time_violation(core, &intervals) {
            trace.warnings.push(warning);
        }
    }

    // Step 4: breaks
    let breaks = calculate_break_deductions(&plan.breaks, &intervals, &pairing.break_intervals, step);
    trace.steps.push(breaks.audit_step);
    step += 1;

    let gross_work_minutes = breaks.gross_work_minutes;
    let mut net_work_minutes = gross_work_minutes - breaks.total_minutes;
    if let Some(cap) = plan.max_net_work_minutes {
        if net_work_minutes > cap {
            trace.warnings.push(AuditWarning::new(
                "MAX_NET_WORK_CAPPED",
                format!("Net work of {net_work_minutes} minutes capped at {cap}"),
            ));
            trace.steps.push(AuditStep {
                step_number: step,
                rule_id: "max_net_work".to_string(),
                rule_name: "Maximum Net Work".to_string(),
                input: json!({ "net_work_minutes": net_work_minutes, "max_net_work_minutes": cap }),
                output: json!({ "net_work_minutes": cap }),
                reasoning: format!("Capped {} minutes of net work", net_work_minutes - cap),
            });
            step += 1;
            net_work_minutes = cap;
        }
    }

    // Step 5: bonuses
    let bonuses = calculate_bonuses(&plan.bonuses, &intervals, net_work_minutes, step);
    trace.steps.push(bonuses.audit_step);
    step += 1;

    // Step 6: absence, holiday or no-booking credit
    let credit = resolve_absence_credit(
        plan,
        &CreditInput {
            employee_id: input.employee_id,
            date,
            has_real_work,
            target_minutes,
            absence,
            holiday: input.holiday,
        },
        step,
    )?;
    trace.steps.push(credit.audit_step);
    trace.warnings.extend(credit.warnings);
    step += 1;

    // Step 7: aggregate
    let credited_minutes = Decimal::from(net_work_minutes) + credit.credit_minutes;
    let balance_minutes = credited_minutes - Decimal::from(target_minutes);
    trace.steps.push(AuditStep {
        step_number: step,
        rule_id: "aggregate".to_string(),
        rule_name: "Daily Aggregate".to_string(),
        input: json!({
            "net_work_minutes": net_work_minutes,
            "credit_minutes": credit.credit_minutes,
            "target_minutes": target_minutes,
        }),
        output: json!({
            "credited_minutes": credited_minutes,
            "balance_minutes": balance_minutes,
        }),
        reasoning: format!(
            "Credited {credited_minutes} minutes against a target of {target_minutes}, balance {balance_minutes}"
        ),
    });

    let credit_source = if has_real_work {
        CreditSource::Work
    } else {
        credit.source
    };

    let result = DailyCalculationResult {
        employee_id: input.employee_id.to_string(),
        date,
        resolved_plan_id: plan.id.clone(),
        intervals,
        adjustments,
        gross_work_minutes,
        break_minutes: breaks.total_minutes,
        break_deductions: breaks.deductions,
        net_work_minutes,
        bonus_minutes: bonuses.total_minutes,
        bonus_accounts: bonuses.accounts,
        absence_credit_minutes: credit.credit_minutes,
        credit_source,
        vacation_days_deducted: credit.vacation_days_deducted,
        credited_minutes,
        target_minutes,
        balance_minutes,
        flags: CalculationFlags {
            shift_detected: resolved.shift_detected,
            day_changed: pairing.day_changed,
            no_booking_triggered: credit.no_booking_triggered,
            rounding_applied: rounding.rounding_applied,
            order_booking_required: credit.order_booking_required,
        },
        engine_version: ENGINE_VERSION.to_string(),
        audit_trace: trace,
    };

    Ok(DayOutcome {
        result,
        carry_out: pairing.carry_out,
    })
}

/// Returns the first work arrival and the last work departure booked on
/// `date`, in minutes from its midnight.
pub(crate) fn raw_span(
    bookings: &[BookingEvent],
    date: NaiveDate,
) -> (Option<Minutes>, Option<Minutes>) {
    let today: Vec<BookingEvent> = sorted_work_events(bookings)
        .into_iter()
        .filter(|event| event.date() == date)
        .collect();
    let earliest = today
        .iter()
        .find(|event| event.direction == BookingDirection::In)
        .map(|event| event.minutes_from(date));
    let latest = today
        .iter()
        .rev()
        .find(|event| event.direction == BookingDirection::Out)
        .map(|event| event.minutes_from(date));
    (earliest, latest)
}

fn core_time_violation(core: TimeWindow, intervals: &[PairedInterval]) -> Option<AuditWarning> {
    let covered: Minutes = intervals
        .iter()
        .map(|interval| interval.overlap(core.start, core.end))
        .sum();
    let missing = core.len() - covered;
    (missing > 0).then(|| {
        AuditWarning::new(
            "CORE_TIME_VIOLATION",
            format!(
                "{missing} minute(s) of core time {}-{} not covered by work",
                core.start, core.end
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BonusCalculation, BonusRule, BreakRule, DayChangeBehavior, DayPlanId, NoBookingBehavior,
        RoundingConfig, RoundingSettings, RoundingType, ToleranceConfig,
    };
    use crate::error::ErrorKind;
    use crate::models::{AbsenceDuration, CreditMultiplier};
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn work(date: &str, time: &str, direction: BookingDirection) -> BookingEvent {
        BookingEvent::work(make_datetime(date, time), direction)
    }

    fn standard_plan() -> DayPlanConfig {
        DayPlanConfig {
            id: DayPlanId::from("standard"),
            come_from: 480,
            go_to: Some(1020),
            regular_hours: Some(480),
            no_booking_behavior: NoBookingBehavior::DeductTarget,
            breaks: vec![BreakRule::Fixed {
                start: 720,
                end: 750,
                duration_minutes: 30,
                is_paid: false,
            }],
            ..Default::default()
        }
    }

    fn run(
        plan: &DayPlanConfig,
        date: &str,
        bookings: &[BookingEvent],
        carry_in: CarryOver,
    ) -> EngineResult<DayOutcome> {
        let plans = DayPlanTable::from_plans(vec![plan.clone()]).unwrap();
        calculate_day(
            &DayInput {
                employee_id: "emp_001",
                date: make_date(date),
                day_plan: plan,
                bookings,
                absence: None,
                holiday: None,
                employee_master_target: None,
                carry_in,
            },
            &plans,
        )
    }

    // ==========================================================================
    // Full working day
    // ==========================================================================

    #[test]
    fn test_standard_day() {
        let bookings = vec![
            work("2026-03-02", "08:00:00", BookingDirection::In),
            work("2026-03-02", "17:00:00", BookingDirection::Out),
        ];
        let outcome = run(&standard_plan(), "2026-03-02", &bookings, CarryOver::None).unwrap();
        let result = outcome.result;

        assert_eq!(result.gross_work_minutes, 540);
        assert_eq!(result.break_minutes, 30);
        assert_eq!(result.net_work_minutes, 510);
        assert_eq!(result.credited_minutes, dec("510"));
        assert_eq!(result.balance_minutes, dec("30"));
        assert_eq!(result.credit_source, CreditSource::Work);
        assert_eq!(result.resolved_plan_id.as_str(), "standard");
        assert_eq!(result.engine_version, ENGINE_VERSION);
        assert!(outcome.carry_out.is_none());
    }

    #[test]
    fn test_audit_steps_are_numbered_in_order() {
        let bookings = vec![
            work("2026-03-02", "08:00:00", BookingDirection::In),
            work("2026-03-02", "17:00:00", BookingDirection::Out),
        ];
        let result = run(&standard_plan(), "2026-03-02", &bookings, CarryOver::None)
            .unwrap()
            .result;

        let ids: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|step| step.rule_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "day_plan_resolution",
                "booking_pairing",
                "tolerance",
                "rounding",
                "break_deduction",
                "bonus",
                "absence_credit",
                "aggregate"
            ]
        );
        for (index, step) in result.audit_trace.steps.iter().enumerate() {
            assert_eq!(step.step_number, index as u32 + 1);
        }
    }

    #[test]
    fn test_tolerance_then_rounding() {
        let mut plan = standard_plan();
        plan.tolerance = ToleranceConfig {
            come_plus: 10,
            ..Default::default()
        };
        plan.rounding = RoundingSettings {
            arrival: RoundingConfig {
                kind: RoundingType::Nearest,
                interval: Some(15),
                add_value: None,
            },
            departure: RoundingConfig {
                kind: RoundingType::Up,
                interval: Some(15),
                add_value: None,
            },
            round_all_bookings: false,
        };
        let bookings = vec![
            work("2026-03-02", "08:07:00", BookingDirection::In),
            work("2026-03-02", "16:52:00", BookingDirection::Out),
        ];

        let result = run(&plan, "2026-03-02", &bookings, CarryOver::None).unwrap().result;
        assert_eq!(result.intervals, vec![PairedInterval::new(480, 1020)]);
        assert!(result.flags.rounding_applied);
        assert_eq!(result.adjustments.len(), 2);
    }

    #[test]
    fn test_max_net_work_cap() {
        let mut plan = standard_plan();
        plan.max_net_work_minutes = Some(600);
        let bookings = vec![
            work("2026-03-02", "06:00:00", BookingDirection::In),
            work("2026-03-02", "20:00:00", BookingDirection::Out),
        ];
        let result = run(&plan, "2026-03-02", &bookings, CarryOver::None).unwrap().result;
        assert_eq!(result.net_work_minutes, 600);
        assert!(result.audit_trace.has_warning("MAX_NET_WORK_CAPPED"));
    }

    #[test]
    fn test_core_time_violation_warns() {
        let mut plan = standard_plan();
        plan.core_time = Some(TimeWindow::new(540, 900));
        let bookings = vec![
            work("2026-03-02", "10:00:00", BookingDirection::In),
            work("2026-03-02", "17:00:00", BookingDirection::Out),
        ];
        let result = run(&plan, "2026-03-02", &bookings, CarryOver::None).unwrap().result;
        assert!(result.audit_trace.has_warning("CORE_TIME_VIOLATION"));
    }

    #[test]
    fn test_bonus_does_not_change_balance() {
        let mut plan = standard_plan();
        plan.bonuses = vec![BonusRule {
            name: "late".to_string(),
            window: TimeWindow::new(960, 1320),
            calculation: BonusCalculation::Percentage { value: dec("50") },
            min_work_minutes: None,
            account: "late_bonus".to_string(),
        }];
        let bookings = vec![
            work("2026-03-02", "08:00:00", BookingDirection::In),
            work("2026-03-02", "17:00:00", BookingDirection::Out),
        ];
        let result = run(&plan, "2026-03-02", &bookings, CarryOver::None).unwrap().result;
        assert_eq!(result.bonus_minutes, dec("30"));
        assert_eq!(result.bonus_accounts["late_bonus"], dec("30"));
        assert_eq!(result.credited_minutes, dec("510"));
    }

    // ==========================================================================
    // Days without work
    // ==========================================================================

    #[test]
    fn test_no_bookings_deduct_target() {
        let result = run(&standard_plan(), "2026-03-02", &[], CarryOver::None).unwrap().result;
        assert_eq!(result.credited_minutes, Decimal::ZERO);
        assert_eq!(result.balance_minutes, dec("-480"));
        assert!(result.flags.no_booking_triggered);
    }

    #[test]
    fn test_no_bookings_error_policy_fails_date() {
        let mut plan = standard_plan();
        plan.no_booking_behavior = NoBookingBehavior::Error;
        let err = run(&plan, "2026-03-02", &[], CarryOver::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoBookingPolicy);
    }

    #[test]
    fn test_incomplete_bookings_only_count_as_no_work() {
        let bookings = vec![work("2026-03-02", "08:00:00", BookingDirection::In)];
        let result = run(&standard_plan(), "2026-03-02", &bookings, CarryOver::None)
            .unwrap()
            .result;
        assert_eq!(result.net_work_minutes, 0);
        assert!(result.flags.no_booking_triggered);
        assert!(result.audit_trace.has_warning("INCOMPLETE_PAIR"));
    }

    #[test]
    fn test_absence_uses_absence_target() {
        let mut plan = standard_plan();
        plan.regular_hours_2 = Some(420);
        let plans = DayPlanTable::from_plans(vec![plan.clone()]).unwrap();
        let absence = AbsenceRecord {
            date: make_date("2026-03-02"),
            absence_type_id: "sick".to_string(),
            duration: AbsenceDuration::Full,
            half_day_period: None,
            credit: CreditMultiplier::Full,
            deducts_vacation: false,
            cancelled: false,
        };

        let result = calculate_day(
            &DayInput {
                employee_id: "emp_001",
                date: make_date("2026-03-02"),
                day_plan: &plan,
                bookings: &[],
                absence: Some(&absence),
                holiday: None,
                employee_master_target: None,
                carry_in: CarryOver::None,
            },
            &plans,
        )
        .unwrap()
        .result;
        assert_eq!(result.target_minutes, 420);
        assert_eq!(result.absence_credit_minutes, dec("420"));
        assert_eq!(result.balance_minutes, Decimal::ZERO);
        assert_eq!(result.credit_source, CreditSource::Absence);
    }

    // ==========================================================================
    // Cross-midnight
    // ==========================================================================

    #[test]
    fn test_auto_complete_threads_carry_over() {
        let mut plan = standard_plan();
        plan.breaks.clear();
        plan.day_change_behavior = DayChangeBehavior::AutoComplete;
        let bookings = vec![
            work("2026-03-02", "22:00:00", BookingDirection::In),
            work("2026-03-03", "06:00:00", BookingDirection::Out),
        ];

        let first = run(&plan, "2026-03-02", &bookings, CarryOver::None).unwrap();
        assert_eq!(first.result.net_work_minutes, 120);
        assert!(first.result.flags.day_changed);

        let second = run(&plan, "2026-03-03", &bookings, first.carry_out).unwrap();
        assert_eq!(second.result.intervals[0].arrival, Some(0));
        assert_eq!(second.result.net_work_minutes, 360);
        assert!(second.result.flags.day_changed);
    }

    #[test]
    fn test_unresolved_carry_fails_before_resolution() {
        let carry = CarryOver::Unresolved {
            source_date: make_date("2026-03-01"),
        };
        let err = run(&standard_plan(), "2026-03-02", &[], carry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CarryOverUnresolved);
    }

    #[test]
    fn test_raw_span_uses_only_the_date() {
        let bookings = vec![
            work("2026-03-02", "22:00:00", BookingDirection::In),
            work("2026-03-03", "06:00:00", BookingDirection::Out),
        ];
        assert_eq!(raw_span(&bookings, make_date("2026-03-02")), (Some(1320), None));
        assert_eq!(raw_span(&bookings, make_date("2026-03-03")), (None, Some(360)));
    }
}
