//! Calculation result models for the daily time-calculation engine.
//!
//! This module contains the [`DailyCalculationResult`] type and its associated
//! structures that capture all outputs of one employee/date calculation,
//! including the intervals used, adjustments, deductions, credits and the
//! audit trace.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{BreakKind, DayPlanId, Minutes};

use super::PairedInterval;

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use workday_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// assert!(!trace.has_warning("INCOMPLETE_PAIR"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Returns true when a warning with `code` was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|warning| warning.code == code)
    }

    /// Returns the step with `rule_id`, if any.
    pub fn step(&self, rule_id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|step| step.rule_id == rule_id)
    }
}

/// Which side of an interval an adjustment touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSide {
    /// The arrival.
    Arrival,
    /// The departure.
    Departure,
}

/// Why a time was adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    /// Absorbed by a tolerance window.
    Tolerance,
    /// Changed by a rounding rule.
    Rounding,
    /// Clipped so intervals do not overlap after rounding.
    OverlapClip,
}

/// One change made to a booked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAdjustment {
    /// Index of the interval in [`DailyCalculationResult::intervals`].
    pub interval_index: usize,
    /// Which side was adjusted.
    pub side: BookingSide,
    /// Time before the adjustment.
    pub original: Minutes,
    /// Time after the adjustment.
    pub adjusted: Minutes,
    /// Why it was adjusted.
    pub reason: AdjustmentReason,
}

/// What credited minutes on a day without real work came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditSource {
    /// Real work.
    Work,
    /// An absence record.
    Absence,
    /// A holiday record.
    Holiday,
    /// The no-booking behavior.
    NoBookingPolicy,
}

/// A break rule's contribution to the day's deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakDeduction {
    /// Index of the rule in the plan's break list.
    pub rule_index: usize,
    /// The kind of the rule.
    pub kind: BreakKind,
    /// Minutes the rule asks for.
    pub minutes: Minutes,
    /// Minutes actually deducted after overlap resolution.
    pub applied_minutes: Minutes,
    /// Paid breaks are not deducted.
    pub is_paid: bool,
}

/// Diagnostic flags of a calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationFlags {
    /// An alternate plan was selected by shift detection.
    pub shift_detected: bool,
    /// Cross-midnight handling changed the intervals.
    pub day_changed: bool,
    /// The no-booking behavior was applied.
    pub no_booking_triggered: bool,
    /// A rounding rule changed at least one time.
    pub rounding_applied: bool,
    /// The no-booking behavior asked for order-linked follow-up.
    pub order_booking_required: bool,
}

/// The complete result of one employee/date calculation.
///
/// Created fresh on every invocation and returned only when complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCalculationResult {
    /// The employee.
    pub employee_id: String,
    /// The calculation date.
    pub date: NaiveDate,
    /// The plan the date was calculated with, after shift detection.
    pub resolved_plan_id: DayPlanId,
    /// The paired intervals after tolerance and rounding.
    pub intervals: Vec<PairedInterval>,
    /// Every tolerance, rounding and overlap adjustment applied.
    pub adjustments: Vec<TimeAdjustment>,
    /// Work minutes before breaks.
    pub gross_work_minutes: Minutes,
    /// Break minutes deducted.
    pub break_minutes: Minutes,
    /// Per-rule break contributions.
    pub break_deductions: Vec<BreakDeduction>,
    /// Work minutes after breaks and the net-work cap.
    pub net_work_minutes: Minutes,
    /// Bonus minutes across all accounts.
    pub bonus_minutes: Decimal,
    /// Bonus minutes per target account.
    pub bonus_accounts: BTreeMap<String, Decimal>,
    /// Minutes credited from an absence, holiday or no-booking behavior.
    pub absence_credit_minutes: Decimal,
    /// Where the day's credit came from.
    pub credit_source: CreditSource,
    /// Vacation days consumed by the day's absence.
    pub vacation_days_deducted: Decimal,
    /// Net work plus absence credit.
    pub credited_minutes: Decimal,
    /// The day's target minutes.
    pub target_minutes: Minutes,
    /// Credited minus target. Positive means overtime.
    pub balance_minutes: Decimal,
    /// Diagnostic flags.
    pub flags: CalculationFlags,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}
