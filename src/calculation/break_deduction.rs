//! Break deduction calculation.
//!
//! This module evaluates a plan's [`BreakRule`]s against the day's rounded
//! work intervals and registered break intervals.
//!
//! Rules are evaluated in declared order. Rules that deduct from overlapping
//! spans of the day form a group in which only the largest deduction applies. Minimum breaks top up
//! whatever the other rules already deducted to the required minutes, so the
//! same minutes are never deducted twice. Paid breaks are evaluated and
//! recorded but deduct nothing. The total never exceeds gross work.

use serde_json::json;

use crate::config::{BreakRule, Minutes, TimeWindow};
use crate::models::{AuditStep, BreakDeduction, PairedInterval, total_duration};

/// The result of break deduction.
#[derive(Debug, Clone)]
pub struct BreakDeductionResult {
    /// Work minutes before breaks.
    pub gross_work_minutes: Minutes,
    /// Minutes deducted across all rules.
    pub total_minutes: Minutes,
    /// Per-rule contributions in declared order.
    pub deductions: Vec<BreakDeduction>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Minutes a minimum break asks for at `work_minutes` of work.
///
/// Nothing up to and including the threshold. Past it the full duration, or
/// with `proportional_near_threshold` the minutes past the threshold capped at
/// the duration.
///
/// # Example
///
/// ```
/// use workday_engine::calculation::minimum_break_minutes;
///
/// assert_eq!(minimum_break_minutes(370, 360, 30, true), 10);
/// assert_eq!(minimum_break_minutes(420, 360, 30, true), 30);
/// assert_eq!(minimum_break_minutes(361, 360, 30, false), 30);
/// assert_eq!(minimum_break_minutes(360, 360, 30, false), 0);
/// ```
pub fn minimum_break_minutes(
    work_minutes: Minutes,
    after_work_minutes: Minutes,
    duration_minutes: Minutes,
    proportional_near_threshold: bool,
) -> Minutes {
    if work_minutes <= after_work_minutes {
        0
    } else if proportional_near_threshold {
        (work_minutes - after_work_minutes).min(duration_minutes)
    } else {
        duration_minutes
    }
}

/// Calculates the break deduction for a day.
///
/// `intervals` are the work intervals after rounding; `break_intervals` are
/// the paired break bookings that feed variable breaks.
pub fn calculate_break_deductions(
    rules: &[BreakRule],
    intervals: &[PairedInterval],
    break_intervals: &[PairedInterval],
    step_number: u32,
) -> BreakDeductionResult {
    let gross_work_minutes = total_duration(intervals);

    let mut deductions: Vec<BreakDeduction> = rules
        .iter()
        .enumerate()
        .map(|(rule_index, rule)| {
            let minutes = requested_minutes(rule, intervals, break_intervals, gross_work_minutes);
            BreakDeduction {
                rule_index,
                kind: rule.kind(),
                minutes,
                applied_minutes: if rule.is_paid() { 0 } else { minutes },
                is_paid: rule.is_paid(),
            }
        })
        .collect();

    resolve_span_overlaps(rules, intervals, break_intervals, &mut deductions);
    top_up_minimum_breaks(rules, &mut deductions);

    let requested_total: Minutes = deductions.iter().map(|d| d.applied_minutes).sum();
    let mut excess = requested_total - gross_work_minutes;
    for deduction in deductions.iter_mut().rev() {
        if excess <= 0 {
            break;
        }
        let cut = excess.min(deduction.applied_minutes);
        deduction.applied_minutes -= cut;
        excess -= cut;
    }
    let total_minutes: Minutes = deductions.iter().map(|d| d.applied_minutes).sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "break_deduction".to_string(),
        rule_name: "Break Deduction".to_string(),
        input: json!({
            "gross_work_minutes": gross_work_minutes,
            "rules": rules,
            "break_intervals": break_intervals,
        }),
        output: json!({
            "deductions": deductions,
            "total_minutes": total_minutes,
        }),
        reasoning: format!(
            "Deducted {} break minute(s) from {} gross work minute(s) across {} rule(s)",
            total_minutes,
            gross_work_minutes,
            rules.len()
        ),
    };

    BreakDeductionResult {
        gross_work_minutes,
        total_minutes,
        deductions,
        audit_step,
    }
}

fn requested_minutes(
    rule: &BreakRule,
    intervals: &[PairedInterval],
    break_intervals: &[PairedInterval],
    gross_work_minutes: Minutes,
) -> Minutes {
    match *rule {
        BreakRule::Fixed {
            start,
            end,
            duration_minutes,
            ..
        } => {
            let overlap: Minutes = intervals.iter().map(|i| i.overlap(start, end)).sum();
            duration_minutes.min(overlap)
        }
        BreakRule::Variable {
            min_minutes,
            max_minutes,
            ..
        } => {
            let window = rule.window();
            let taken = booked_break_minutes(intervals, break_intervals, window);
            if taken == 0 {
                return 0;
            }
            let floored = min_minutes.map_or(taken, |min| taken.max(min));
            max_minutes.map_or(floored, |max| floored.min(max))
        }
        BreakRule::Minimum {
            after_work_minutes,
            duration_minutes,
            proportional_near_threshold,
            ..
        } => minimum_break_minutes(
            gross_work_minutes,
            after_work_minutes,
            duration_minutes,
            proportional_near_threshold,
        ),
    }
}

/// Minutes of registered breaks that fall inside work and, if given, inside
/// `window`.
fn booked_break_minutes(
    intervals: &[PairedInterval],
    break_intervals: &[PairedInterval],
    window: Option<TimeWindow>,
) -> Minutes {
    break_intervals
        .iter()
        .filter_map(|b| Some((b.arrival?, b.departure?)))
        .map(|(mut from, mut to)| {
            if let Some(window) = window {
                from = from.max(window.start);
                to = to.min(window.end);
            }
            if to <= from {
                return 0;
            }
            intervals.iter().map(|work| work.overlap(from, to)).sum::<Minutes>()
        })
        .sum()
}

/// The spans of the day a rule deducts from.
///
/// A rule with a window occupies its window. A variable rule without one
/// occupies the booked breaks it consumed, clipped to work. Minimum rules
/// occupy nothing; they are resolved by the top-up.
fn deduction_spans(
    rule: &BreakRule,
    intervals: &[PairedInterval],
    break_intervals: &[PairedInterval],
) -> Vec<TimeWindow> {
    if let Some(window) = rule.window() {
        return vec![window];
    }
    if !matches!(rule, BreakRule::Variable { .. }) {
        return Vec::new();
    }
    let worked: Vec<(Minutes, Minutes)> = intervals
        .iter()
        .filter_map(|i| Some((i.arrival?, i.departure?)))
        .collect();
    break_intervals
        .iter()
        .filter_map(|b| Some((b.arrival?, b.departure?)))
        .flat_map(|(from, to)| {
            worked
                .iter()
                .map(move |&(work_from, work_to)| TimeWindow::new(from.max(work_from), to.min(work_to)))
        })
        .filter(|span| !span.is_empty())
        .collect()
}

/// Keeps only the largest deduction within each group of rules whose spans
/// overlap. Ties go to the rule declared first.
fn resolve_span_overlaps(
    rules: &[BreakRule],
    intervals: &[PairedInterval],
    break_intervals: &[PairedInterval],
    deductions: &mut [BreakDeduction],
) {
    let spanned: Vec<(usize, Vec<TimeWindow>)> = rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| !rule.is_paid())
        .map(|(index, rule)| (index, deduction_spans(rule, intervals, break_intervals)))
        .filter(|(_, spans)| !spans.is_empty())
        .collect();

    let mut group_of: Vec<usize> = (0..spanned.len()).collect();
    for a in 0..spanned.len() {
        for b in (a + 1)..spanned.len() {
            let shared = spanned[a]
                .1
                .iter()
                .any(|left| spanned[b].1.iter().any(|right| left.intersects(right)));
            if shared {
                let (from, to) = (group_of[b], group_of[a]);
                for group in group_of.iter_mut() {
                    if *group == from {
                        *group = to;
                    }
                }
            }
        }
    }

    for group in 0..spanned.len() {
        let members: Vec<usize> = (0..spanned.len())
            .filter(|&member| group_of[member] == group)
            .map(|member| spanned[member].0)
            .collect();
        if members.len() < 2 {
            continue;
        }
        let mut keep = members[0];
        for &member in &members[1..] {
            if deductions[member].applied_minutes > deductions[keep].applied_minutes {
                keep = member;
            }
        }
        for &member in &members {
            if member != keep {
                deductions[member].applied_minutes = 0;
            }
        }
    }
}

/// Applies the largest unpaid minimum requirement as a top-up over the
/// other rules' deductions.
fn top_up_minimum_breaks(rules: &[BreakRule], deductions: &mut [BreakDeduction]) {
    let is_minimum = |index: usize| matches!(rules[index], BreakRule::Minimum { is_paid: false, .. });

    let other_total: Minutes = (0..rules.len())
        .filter(|&index| !is_minimum(index))
        .map(|index| deductions[index].applied_minutes)
        .sum();

    let mut strongest: Option<usize> = None;
    for index in (0..rules.len()).filter(|&index| is_minimum(index)) {
        match strongest {
            Some(current) if deductions[current].minutes >= deductions[index].minutes => {}
            _ => strongest = Some(index),
        }
    }

    for index in (0..rules.len()).filter(|&index| is_minimum(index)) {
        deductions[index].applied_minutes = if Some(index) == strongest {
            (deductions[index].minutes - other_total).max(0)
        } else {
            0
        };
    }
}
