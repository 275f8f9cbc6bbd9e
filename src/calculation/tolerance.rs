//! Tolerance absorption.
//!
//! Small deviations of booked arrivals and departures from the plan are
//! snapped back to the planned time before rounding runs.

use serde_json::json;

use crate::config::{DayPlanConfig, MINUTES_PER_DAY, Minutes, PlanType};
use crate::models::{AdjustmentReason, AuditStep, BookingSide, PairedInterval, TimeAdjustment};

/// The result of applying tolerance to a day's intervals.
#[derive(Debug, Clone)]
pub struct ToleranceResult {
    /// The intervals after tolerance.
    pub intervals: Vec<PairedInterval>,
    /// Every time that was snapped.
    pub adjustments: Vec<TimeAdjustment>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Snaps an arrival to `come_from` when it is inside the tolerance band.
///
/// A late arrival up to `come_plus` minutes after `come_from` is grace time.
/// An early arrival up to `come_minus` minutes before `come_from` snaps only
/// on flextime plans or fixed plans with `variable_work_time`.
///
/// A negative arrival was carried over from the previous date and is
/// compared against that date's `come_from`.
pub fn absorb_arrival(plan: &DayPlanConfig, arrival: Minutes) -> Minutes {
    let tolerance = &plan.tolerance;
    let planned = if arrival < 0 {
        plan.come_from - MINUTES_PER_DAY
    } else {
        plan.come_from
    };
    let delta = arrival - planned;
    let early_allowed = plan.plan_type == PlanType::Flextime || plan.variable_work_time;

    if delta > 0 && delta <= tolerance.come_plus {
        planned
    } else if delta < 0 && -delta <= tolerance.come_minus && early_allowed {
        planned
    } else {
        arrival
    }
}

/// Snaps a departure to the planned departure when it is inside the
/// tolerance band (`go_minus` early, `go_plus` late).
///
/// A departure past midnight on a plan whose planned departure lies before
/// `come_from` is compared against the planned departure of the next day.
pub fn absorb_departure(plan: &DayPlanConfig, departure: Minutes) -> Minutes {
    let Some(mut planned) = plan.planned_departure() else {
        return departure;
    };
    if departure > MINUTES_PER_DAY && planned < plan.come_from {
        planned += MINUTES_PER_DAY;
    }
    let tolerance = &plan.tolerance;
    let delta = departure - planned;

    if delta < 0 && -delta <= tolerance.go_minus {
        planned
    } else if delta > 0 && delta <= tolerance.go_plus {
        planned
    } else {
        departure
    }
}

/// Applies tolerance to every booked (non-synthetic) arrival and departure,
/// carried arrivals included.
pub fn apply_tolerance(
    plan: &DayPlanConfig,
    intervals: &[PairedInterval],
    step_number: u32,
) -> ToleranceResult {
    let mut adjusted_intervals = intervals.to_vec();
    let mut adjustments = Vec::new();

    for (index, interval) in adjusted_intervals.iter_mut().enumerate() {
        if let (Some(arrival), false) = (interval.arrival, interval.arrival_synthetic) {
            let snapped = absorb_arrival(plan, arrival);
            if snapped != arrival {
                interval.arrival = Some(snapped);
                adjustments.push(TimeAdjustment {
                    interval_index: index,
                    side: BookingSide::Arrival,
                    original: arrival,
                    adjusted: snapped,
                    reason: AdjustmentReason::Tolerance,
                });
            }
        }
        if let (Some(departure), false) = (interval.departure, interval.departure_synthetic) {
            let snapped = absorb_departure(plan, departure);
            if snapped != departure {
                interval.departure = Some(snapped);
                adjustments.push(TimeAdjustment {
                    interval_index: index,
                    side: BookingSide::Departure,
                    original: departure,
                    adjusted: snapped,
                    reason: AdjustmentReason::Tolerance,
                });
            }
        }
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "tolerance".to_string(),
        rule_name: "Tolerance Absorption".to_string(),
        input: json!({
            "come_from": plan.come_from,
            "planned_departure": plan.planned_departure(),
            "tolerance": plan.tolerance,
            "early_arrival_allowed": plan.plan_type == PlanType::Flextime || plan.variable_work_time,
        }),
        output: json!({
            "adjusted_count": adjustments.len(),
            "adjustments": adjustments,
        }),
        reasoning: format!(
            "Absorbed {} booking(s) into the tolerance window",
            adjustments.len()
        ),
    };

    ToleranceResult {
        intervals: adjusted_intervals,
        adjustments,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DayPlanId, ToleranceConfig};

    fn plan(tolerance: ToleranceConfig) -> DayPlanConfig {
        DayPlanConfig {
            id: DayPlanId::from("std"),
            come_from: 480,
            go_to: Some(1020),
            regular_hours: Some(480),
            tolerance,
            ..Default::default()
        }
    }

    fn tol(come_plus: Minutes, come_minus: Minutes, go_plus: Minutes, go_minus: Minutes) -> ToleranceConfig {
        ToleranceConfig {
            come_plus,
            come_minus,
            go_plus,
            go_minus,
        }
    }

    // ==========================================================================
    // Arrival
    // ==========================================================================

    #[test]
    fn test_late_arrival_within_grace_snaps() {
        let p = plan(tol(10, 0, 0, 0));
        assert_eq!(absorb_arrival(&p, 487), 480);
        assert_eq!(absorb_arrival(&p, 490), 480);
        assert_eq!(absorb_arrival(&p, 491), 491);
    }

    #[test]
    fn test_early_arrival_on_fixed_plan_needs_variable_work_time() {
        let mut p = plan(tol(0, 15, 0, 0));
        assert_eq!(absorb_arrival(&p, 470), 470);

        p.variable_work_time = true;
        assert_eq!(absorb_arrival(&p, 470), 480);
        assert_eq!(absorb_arrival(&p, 465), 480);
        assert_eq!(absorb_arrival(&p, 464), 464);
    }

    #[test]
    fn test_early_arrival_on_flextime_plan_snaps() {
        let mut p = plan(tol(0, 15, 0, 0));
        p.plan_type = PlanType::Flextime;
        p.come_to = Some(600);
        assert_eq!(absorb_arrival(&p, 470), 480);
    }

    #[test]
    fn test_on_time_arrival_unchanged() {
        let p = plan(tol(10, 10, 10, 10));
        assert_eq!(absorb_arrival(&p, 480), 480);
    }

    // ==========================================================================
    // Departure
    // ==========================================================================

    #[test]
    fn test_departure_tolerance_both_sides() {
        let p = plan(tol(0, 0, 5, 10));
        assert_eq!(absorb_departure(&p, 1010), 1020);
        assert_eq!(absorb_departure(&p, 1009), 1009);
        assert_eq!(absorb_departure(&p, 1025), 1020);
        assert_eq!(absorb_departure(&p, 1026), 1026);
    }

    #[test]
    fn test_departure_without_planned_time_unchanged() {
        let mut p = plan(tol(0, 0, 30, 30));
        p.go_to = None;
        p.go_from = None;
        assert_eq!(absorb_departure(&p, 1010), 1010);
    }

    // ==========================================================================
    // Interval application
    // ==========================================================================

    #[test]
    fn test_apply_tolerance_records_adjustments() {
        let p = plan(tol(10, 0, 0, 10));
        let intervals = vec![PairedInterval::new(487, 720), PairedInterval::new(750, 1012)];

        let result = apply_tolerance(&p, &intervals, 3);
        assert_eq!(result.intervals[0].arrival, Some(480));
        assert_eq!(result.intervals[1].departure, Some(1020));
        assert_eq!(result.adjustments.len(), 2);
        assert_eq!(result.adjustments[0].reason, AdjustmentReason::Tolerance);
        assert_eq!(result.adjustments[1].side, BookingSide::Departure);
        assert_eq!(result.audit_step.step_number, 3);
        assert_eq!(result.audit_step.output["adjusted_count"], 2);
    }

    #[test]
    fn test_synthetic_times_are_not_absorbed() {
        let p = plan(tol(10, 0, 0, 0));
        let mut interval = PairedInterval::new(485, 1440);
        interval.arrival_synthetic = true;
        interval.departure_synthetic = true;

        let result = apply_tolerance(&p, &[interval], 1);
        assert_eq!(result.intervals[0].arrival, Some(485));
        assert!(result.adjustments.is_empty());
    }

    // ==========================================================================
    // Cross-midnight shifts
    // ==========================================================================

    fn night(tolerance: ToleranceConfig) -> DayPlanConfig {
        DayPlanConfig {
            id: DayPlanId::from("night"),
            come_from: 1320,
            go_to: Some(360),
            regular_hours: Some(480),
            tolerance,
            ..Default::default()
        }
    }

    #[test]
    fn test_carried_arrival_uses_previous_date_come_from() {
        let p = night(tol(10, 0, 0, 0));
        assert_eq!(absorb_arrival(&p, -113), -120);
        assert_eq!(absorb_arrival(&p, -109), -109);
        assert_eq!(absorb_arrival(&p, 1327), 1320);
    }

    #[test]
    fn test_departure_past_midnight_uses_next_day_go_to() {
        let p = night(tol(0, 0, 10, 10));
        assert_eq!(absorb_departure(&p, 1805), 1800);
        assert_eq!(absorb_departure(&p, 1792), 1800);
        assert_eq!(absorb_departure(&p, 1815), 1815);
        assert_eq!(absorb_departure(&p, 365), 360);
    }

    #[test]
    fn test_day_plan_departure_past_midnight_not_shifted() {
        let p = plan(tol(0, 0, 10, 10));
        assert_eq!(absorb_departure(&p, 1445), 1445);
    }

    #[test]
    fn test_carried_arrival_is_absorbed() {
        let p = night(tol(10, 0, 0, 0));
        let mut interval = PairedInterval::new(-113, 360);
        interval.arrival_carried = true;

        let result = apply_tolerance(&p, &[interval], 3);
        assert_eq!(result.intervals[0].arrival, Some(-120));
        assert_eq!(result.intervals[0].duration(), 480);
        assert_eq!(result.adjustments.len(), 1);
    }
}
