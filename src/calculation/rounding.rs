//! Booking rounding.
//!
//! This module rounds arrivals and departures with the plan's
//! [`RoundingRule`]s and removes overlaps the rounding introduced.

use serde_json::json;

use crate::config::{DayPlanConfig, Minutes, RoundingRule};
use crate::error::EngineResult;
use crate::models::{
    AdjustmentReason, AuditStep, AuditWarning, BookingSide, PairedInterval, TimeAdjustment,
};

/// The result of rounding a day's intervals.
#[derive(Debug, Clone)]
pub struct RoundingResult {
    /// The intervals after rounding and overlap removal.
    pub intervals: Vec<PairedInterval>,
    /// Rounding and overlap adjustments, in application order.
    pub adjustments: Vec<TimeAdjustment>,
    /// At least one rounding rule changed a time.
    pub rounding_applied: bool,
    /// Warnings raised while removing overlaps.
    pub warnings: Vec<AuditWarning>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Rounds a single time.
///
/// Multiples are counted from midnight of the calculation date, so negative
/// and past-midnight times round on the same grid. `Nearest` ties go to the
/// later multiple for arrivals and to the earlier one for departures.
///
/// # Example
///
/// ```
/// use workday_engine::calculation::round_time;
/// use workday_engine::config::RoundingRule;
/// use workday_engine::models::BookingSide;
///
/// let up = RoundingRule::Up { interval: 15 };
/// assert_eq!(round_time(up, 1012, BookingSide::Departure), 1020);
///
/// let nearest = RoundingRule::Nearest { interval: 10 };
/// assert_eq!(round_time(nearest, 485, BookingSide::Arrival), 490);
/// assert_eq!(round_time(nearest, 485, BookingSide::Departure), 480);
/// ```
pub fn round_time(rule: RoundingRule, time: Minutes, side: BookingSide) -> Minutes {
    match rule {
        RoundingRule::None => time,
        RoundingRule::Up { interval } => {
            let remainder = time.rem_euclid(interval);
            if remainder == 0 {
                time
            } else {
                time - remainder + interval
            }
        }
        RoundingRule::Down { interval } => time - time.rem_euclid(interval),
        RoundingRule::Nearest { interval } => {
            let remainder = time.rem_euclid(interval);
            let below = time - remainder;
            let doubled = remainder * 2;
            if remainder == 0 || doubled < interval {
                below
            } else if doubled > interval {
                below + interval
            } else {
                match side {
                    BookingSide::Arrival => below + interval,
                    BookingSide::Departure => below,
                }
            }
        }
        RoundingRule::Add { value } => time + value,
        RoundingRule::Subtract { value } => time - value,
    }
}

/// Rounds the day's intervals with the plan's rounding rules.
///
/// With `round_all_bookings` every booked time is rounded, otherwise only the
/// arrival of the first interval and the departure of the last one. When the
/// day starts without an arrival or ends without a departure, that side is
/// not rounded. Synthetic times are never rounded; carried arrivals are. Afterwards overlaps between consecutive intervals
/// are clipped and inverted intervals collapse to zero length; each clip is
/// recorded as an [`AdjustmentReason::OverlapClip`] adjustment.
///
/// Fails with a configuration error when a rounding rule is malformed.
pub fn apply_rounding(
    plan: &DayPlanConfig,
    intervals: &[PairedInterval],
    step_number: u32,
) -> EngineResult<RoundingResult> {
    let (arrival_rule, departure_rule) = plan.rounding_rules()?;
    let round_all = plan.rounding.round_all_bookings;

    let first_arrival = intervals
        .first()
        .filter(|i| i.arrival.is_some() && !i.arrival_synthetic)
        .map(|_| 0);
    let last_departure = intervals
        .last()
        .filter(|i| i.departure.is_some() && !i.departure_synthetic)
        .map(|_| intervals.len() - 1);

    let mut rounded = intervals.to_vec();
    let mut adjustments = Vec::new();

    for (index, interval) in rounded.iter_mut().enumerate() {
        if round_all || first_arrival == Some(index) {
            if let (Some(arrival), false) = (interval.arrival, interval.arrival_synthetic) {
                let adjusted = round_time(arrival_rule, arrival, BookingSide::Arrival);
                if adjusted != arrival {
                    interval.arrival = Some(adjusted);
                    adjustments.push(TimeAdjustment {
                        interval_index: index,
                        side: BookingSide::Arrival,
                        original: arrival,
                        adjusted,
                        reason: AdjustmentReason::Rounding,
                    });
                }
            }
        }
        if round_all || last_departure == Some(index) {
            if let (Some(departure), false) = (interval.departure, interval.departure_synthetic) {
                let adjusted = round_time(departure_rule, departure, BookingSide::Departure);
                if adjusted != departure {
                    interval.departure = Some(adjusted);
                    adjustments.push(TimeAdjustment {
                        interval_index: index,
                        side: BookingSide::Departure,
                        original: departure,
                        adjusted,
                        reason: AdjustmentReason::Rounding,
                    });
                }
            }
        }
    }

    let rounding_applied = !adjustments.is_empty();
    let clips = clip_overlaps(&mut rounded);
    let clip_count = clips.len();
    let mut warnings = Vec::new();
    if !clips.is_empty() {
        warnings.push(AuditWarning::new(
            "ROUNDING_OVERLAP",
            format!("Clipped {} time(s) that overlapped after rounding", clips.len()),
        ));
    }
    adjustments.extend(clips);

    let audit_step = AuditStep {
        step_number,
        rule_id: "rounding".to_string(),
        rule_name: "Booking Rounding".to_string(),
        input: json!({
            "arrival_rule": arrival_rule,
            "departure_rule": departure_rule,
            "round_all_bookings": round_all,
            "intervals": intervals,
        }),
        output: json!({
            "intervals": rounded,
            "rounding_applied": rounding_applied,
            "overlaps_clipped": clip_count,
        }),
        reasoning: if round_all {
            "Rounded every booked time".to_string()
        } else {
            "Rounded the first arrival and the last departure".to_string()
        },
    };

    Ok(RoundingResult {
        intervals: rounded,
        adjustments,
        rounding_applied,
        warnings,
        audit_step,
    })
}

/// Clips overlaps in place and returns the clip adjustments.
///
/// Each arrival is raised to the latest time seen so far; a departure before
/// its own arrival is raised to the arrival.
fn clip_overlaps(intervals: &mut [PairedInterval]) -> Vec<TimeAdjustment> {
    let mut clips = Vec::new();
    let mut boundary: Option<Minutes> = None;

    for (index, interval) in intervals.iter_mut().enumerate() {
        if let Some(arrival) = interval.arrival {
            if let Some(limit) = boundary {
                if arrival < limit {
                    interval.arrival = Some(limit);
                    clips.push(TimeAdjustment {
                        interval_index: index,
                        side: BookingSide::Arrival,
                        original: arrival,
                        adjusted: limit,
                        reason: AdjustmentReason::OverlapClip,
                    });
                }
            }
            boundary = interval.arrival.max(boundary);
        }
        if let Some(departure) = interval.departure {
            if let Some(limit) = boundary {
                if departure < limit {
                    interval.departure = Some(limit);
                    clips.push(TimeAdjustment {
                        interval_index: index,
                        side: BookingSide::Departure,
                        original: departure,
                        adjusted: limit,
                        reason: AdjustmentReason::OverlapClip,
                    });
                }
            }
            boundary = interval.departure.max(boundary);
        }
    }

    clips
}
