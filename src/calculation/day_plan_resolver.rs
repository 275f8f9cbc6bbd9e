//! Day plan resolution.
//!
//! This module selects the effective day plan for a date, applying shift
//! detection against alternate plans, and resolves the date's target minutes.

use serde_json::json;

use crate::config::{DayPlanConfig, DayPlanTable, Minutes};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, AuditWarning};

/// Where the resolved target minutes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// The employee master record.
    EmployeeMaster,
    /// The plan's absence-day target (`regular_hours_2`).
    AbsenceTarget,
    /// The plan's regular target.
    RegularHours,
}

/// Inputs the resolver looks at besides the plans themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverInput {
    /// Earliest work arrival of the date, in minutes from midnight.
    pub earliest_arrival: Option<Minutes>,
    /// Latest work departure of the date, in minutes from midnight.
    pub latest_departure: Option<Minutes>,
    /// Whether an active absence exists for the date.
    pub has_absence: bool,
    /// Target minutes from the employee master, if recorded.
    pub employee_master_target: Option<Minutes>,
}

/// The outcome of day plan resolution.
#[derive(Debug, Clone)]
pub struct ResolvedDayPlan<'a> {
    /// The effective plan.
    pub plan: &'a DayPlanConfig,
    /// The effective target minutes.
    pub target_minutes: Minutes,
    /// Where the target came from.
    pub target_source: TargetSource,
    /// An alternate plan replaced the base plan.
    pub shift_detected: bool,
    /// Warnings raised during resolution.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Resolves the effective day plan and target minutes.
///
/// Shift detection runs when the base plan lists alternates and the date has
/// at least one work booking:
///
/// 1. If the base plan's own detection windows match, the base plan stays.
/// 2. Otherwise every alternate (looked up in `plans`, in declared order) is
///    matched against its own detection windows.
/// 3. Exactly one match selects that alternate; no match keeps the base plan
///    with a `SHIFT_NOT_DETECTED` warning; several matches fail with
///    [`EngineError::AmbiguousShiftDetection`] instead of guessing.
///
/// The target then comes from the employee master when the resolved plan asks
/// for it and a value exists, from `regular_hours_2` on absence days, and from
/// `regular_hours` otherwise. A plan without any usable target fails with a
/// configuration error.
///
/// # Example
///
/// ```
/// use workday_engine::calculation::{ResolverInput, resolve_day_plan};
/// use workday_engine::config::{DayPlanConfig, DayPlanId, DayPlanTable};
///
/// let base = DayPlanConfig {
///     id: DayPlanId::from("standard"),
///     come_from: 480,
///     go_to: Some(1020),
///     regular_hours: Some(480),
///     ..Default::default()
/// };
/// let plans = DayPlanTable::from_plans(vec![base.clone()]).unwrap();
///
/// let resolved = resolve_day_plan(&base, &plans, &ResolverInput::default(), 1).unwrap();
/// assert_eq!(resolved.plan.id.as_str(), "standard");
/// assert_eq!(resolved.target_minutes, 480);
/// ```
pub fn resolve_day_plan<'a>(
    base: &'a DayPlanConfig,
    plans: &'a DayPlanTable,
    input: &ResolverInput,
    step_number: u32,
) -> EngineResult<ResolvedDayPlan<'a>> {
    base.validate()?;

    let mut warnings = Vec::new();
    let mut plan = base;
    let mut shift_detected = false;
    let mut candidates_checked = Vec::new();

    let detection = &base.shift_detection;
    let has_bookings = input.earliest_arrival.is_some() || input.latest_departure.is_some();
    if !detection.alternates.is_empty() && has_bookings {
        let base_matches = detection.has_windows()
            && detection.matches(input.earliest_arrival, input.latest_departure);

        if !base_matches {
            let mut matched = Vec::new();
            for alternate_id in &detection.alternates {
                let alternate = plans.get(alternate_id)?;
                candidates_checked.push(alternate_id.to_string());
                if alternate
                    .shift_detection
                    .matches(input.earliest_arrival, input.latest_departure)
                {
                    matched.push(alternate);
                }
            }

            match matched.as_slice() {
                [] => warnings.push(AuditWarning::new(
                    "SHIFT_NOT_DETECTED",
                    format!(
                        "No shift-detection window of '{}' or its alternates matched; keeping base plan",
                        base.id
                    ),
                )),
                [single] => {
                    single.validate()?;
                    plan = *single;
                    shift_detected = true;
                }
                several => {
                    return Err(EngineError::AmbiguousShiftDetection {
                        plan_id: base.id.to_string(),
                        candidates: several.iter().map(|p| p.id.to_string()).collect(),
                    });
                }
            }
        }
    }

    let (target_minutes, target_source) = resolve_target(plan, input)?;

    let reasoning = if shift_detected {
        format!(
            "Shift detection replaced '{}' with '{}'; target {} minutes from {:?}",
            base.id, plan.id, target_minutes, target_source
        )
    } else {
        format!(
            "Using day plan '{}'; target {} minutes from {:?}",
            plan.id, target_minutes, target_source
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "day_plan_resolution".to_string(),
        rule_name: "Day Plan Resolution".to_string(),
        input: json!({
            "base_plan_id": base.id.as_str(),
            "earliest_arrival": input.earliest_arrival,
            "latest_departure": input.latest_departure,
            "has_absence": input.has_absence,
            "employee_master_target": input.employee_master_target,
            "alternates_checked": candidates_checked,
        }),
        output: json!({
            "resolved_plan_id": plan.id.as_str(),
            "shift_detected": shift_detected,
            "target_minutes": target_minutes,
        }),
        reasoning,
    };

    Ok(ResolvedDayPlan {
        plan,
        target_minutes,
        target_source,
        shift_detected,
        warnings,
        audit_step,
    })
}

fn resolve_target(
    plan: &DayPlanConfig,
    input: &ResolverInput,
) -> EngineResult<(Minutes, TargetSource)> {
    if plan.from_employee_master {
        if let Some(master) = input.employee_master_target {
            return Ok((master, TargetSource::EmployeeMaster));
        }
    }
    if input.has_absence {
        if let Some(absence_target) = plan.regular_hours_2 {
            return Ok((absence_target, TargetSource::AbsenceTarget));
        }
    }
    plan.regular_hours
        .map(|target| (target, TargetSource::RegularHours))
        .ok_or_else(|| {
            EngineError::configuration(
                plan.id.as_str(),
                "no target minutes configured and no employee master target available",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DayPlanId, ShiftDetection, TimeWindow};
    use crate::error::ErrorKind;

    fn plan(id: &str, come_from: Minutes, target: Minutes) -> DayPlanConfig {
        DayPlanConfig {
            id: DayPlanId::from(id),
            come_from,
            go_to: Some(come_from + target + 30),
            regular_hours: Some(target),
            ..Default::default()
        }
    }

    fn detecting(mut p: DayPlanConfig, arrive: Option<TimeWindow>, alternates: &[&str]) -> DayPlanConfig {
        p.shift_detection = ShiftDetection {
            arrive,
            depart: None,
            alternates: alternates.iter().map(|id| DayPlanId::from(*id)).collect(),
        };
        p
    }

    fn shift_table() -> DayPlanTable {
        let base = detecting(
            plan("day", 480, 480),
            Some(TimeWindow::new(420, 540)),
            &["early", "late"],
        );
        let early = detecting(plan("early", 360, 450), Some(TimeWindow::new(300, 419)), &[]);
        let late = detecting(plan("late", 840, 450), Some(TimeWindow::new(780, 900)), &[]);
        DayPlanTable::from_plans(vec![base, early, late]).unwrap()
    }

    fn arriving(at: Minutes) -> ResolverInput {
        ResolverInput {
            earliest_arrival: Some(at),
            latest_departure: None,
            ..Default::default()
        }
    }

    // ==========================================================================
    // Shift detection
    // ==========================================================================

    #[test]
    fn test_base_window_match_keeps_base_plan() {
        let plans = shift_table();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let resolved = resolve_day_plan(base, &plans, &arriving(485), 1).unwrap();
        assert_eq!(resolved.plan.id.as_str(), "day");
        assert!(!resolved.shift_detected);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_alternate_selected_by_arrival() {
        let plans = shift_table();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let resolved = resolve_day_plan(base, &plans, &arriving(350), 1).unwrap();
        assert_eq!(resolved.plan.id.as_str(), "early");
        assert!(resolved.shift_detected);
        assert_eq!(resolved.target_minutes, 450);
        assert_eq!(
            resolved.audit_step.output["resolved_plan_id"].as_str().unwrap(),
            "early"
        );
    }

    #[test]
    fn test_alternate_selected_by_departure() {
        let base = detecting(plan("day", 480, 480), Some(TimeWindow::new(420, 540)), &["night_out"]);
        let mut night_out = plan("night_out", 1200, 420);
        night_out.shift_detection.depart = Some(TimeWindow::new(1740, 1860));
        let plans = DayPlanTable::from_plans(vec![base, night_out]).unwrap();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let input = ResolverInput {
            earliest_arrival: Some(1190),
            latest_departure: Some(1800),
            ..Default::default()
        };
        let resolved = resolve_day_plan(base, &plans, &input, 1).unwrap();
        assert_eq!(resolved.plan.id.as_str(), "night_out");
    }

    #[test]
    fn test_no_match_falls_back_with_warning() {
        let plans = shift_table();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let resolved = resolve_day_plan(base, &plans, &arriving(660), 1).unwrap();
        assert_eq!(resolved.plan.id.as_str(), "day");
        assert!(!resolved.shift_detected);
        assert_eq!(resolved.warnings[0].code, "SHIFT_NOT_DETECTED");
    }

    #[test]
    fn test_two_matching_alternates_fail_closed() {
        let base = detecting(
            plan("day", 480, 480),
            Some(TimeWindow::new(420, 540)),
            &["early_a", "early_b"],
        );
        let a = detecting(plan("early_a", 360, 450), Some(TimeWindow::new(300, 400)), &[]);
        let b = detecting(plan("early_b", 370, 450), Some(TimeWindow::new(330, 419)), &[]);
        let plans = DayPlanTable::from_plans(vec![base, a, b]).unwrap();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let err = resolve_day_plan(base, &plans, &arriving(350), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousShiftDetection);
        match err {
            EngineError::AmbiguousShiftDetection { plan_id, candidates } => {
                assert_eq!(plan_id, "day");
                assert_eq!(candidates, vec!["early_a".to_string(), "early_b".to_string()]);
            }
            other => panic!("Expected AmbiguousShiftDetection, got {:?}", other),
        }
    }

    #[test]
    fn test_detection_skipped_without_bookings() {
        let plans = shift_table();
        let base = plans.get(&DayPlanId::from("day")).unwrap();

        let resolved = resolve_day_plan(base, &plans, &ResolverInput::default(), 1).unwrap();
        assert_eq!(resolved.plan.id.as_str(), "day");
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_missing_alternate_in_table_is_configuration_error() {
        let base = detecting(plan("day", 480, 480), Some(TimeWindow::new(420, 540)), &["gone"]);
        let plans = DayPlanTable::default();

        let err = resolve_day_plan(&base, &plans, &arriving(300), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    // ==========================================================================
    // Target resolution
    // ==========================================================================

    #[test]
    fn test_employee_master_target_preferred() {
        let mut p = plan("std", 480, 480);
        p.from_employee_master = true;
        p.regular_hours_2 = Some(240);
        let plans = DayPlanTable::default();
        let input = ResolverInput {
            has_absence: true,
            employee_master_target: Some(456),
            ..Default::default()
        };

        let resolved = resolve_day_plan(&p, &plans, &input, 1).unwrap();
        assert_eq!(resolved.target_minutes, 456);
        assert_eq!(resolved.target_source, TargetSource::EmployeeMaster);
    }

    #[test]
    fn test_master_flag_without_value_falls_through() {
        let mut p = plan("std", 480, 480);
        p.from_employee_master = true;
        let plans = DayPlanTable::default();

        let resolved = resolve_day_plan(&p, &plans, &ResolverInput::default(), 1).unwrap();
        assert_eq!(resolved.target_minutes, 480);
        assert_eq!(resolved.target_source, TargetSource::RegularHours);
    }

    #[test]
    fn test_absence_target_used_on_absence_days() {
        let mut p = plan("std", 480, 480);
        p.regular_hours_2 = Some(462);
        let plans = DayPlanTable::default();
        let input = ResolverInput {
            has_absence: true,
            ..Default::default()
        };

        let resolved = resolve_day_plan(&p, &plans, &input, 1).unwrap();
        assert_eq!(resolved.target_minutes, 462);
        assert_eq!(resolved.target_source, TargetSource::AbsenceTarget);

        let without_absence = resolve_day_plan(&p, &plans, &ResolverInput::default(), 1).unwrap();
        assert_eq!(without_absence.target_minutes, 480);
    }

    #[test]
    fn test_missing_target_is_configuration_error() {
        let mut p = plan("std", 480, 480);
        p.regular_hours = None;
        p.from_employee_master = true;
        let plans = DayPlanTable::default();

        let err = resolve_day_plan(&p, &plans, &ResolverInput::default(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("no target minutes"));
    }

    #[test]
    fn test_invalid_base_plan_rejected() {
        let mut p = plan("std", 480, 480);
        p.come_to = Some(400);
        let plans = DayPlanTable::default();

        assert!(resolve_day_plan(&p, &plans, &ResolverInput::default(), 1).is_err());
    }
}
