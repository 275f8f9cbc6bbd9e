//! Time-window bonus calculation.
//!
//! Bonus minutes are returned per target account. Posting them to the
//! accounts is left to the caller.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::config::{BonusCalculation, BonusRule, Minutes};
use crate::models::{AuditStep, PairedInterval};

/// One bonus rule that applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedBonus {
    /// Index of the rule in the plan's bonus list.
    pub rule_index: usize,
    /// The account credited.
    pub account: String,
    /// Work minutes inside the bonus window.
    pub overlap_minutes: Minutes,
    /// Bonus minutes credited.
    pub minutes: Decimal,
}

/// The result of bonus calculation.
#[derive(Debug, Clone)]
pub struct BonusResult {
    /// Bonus minutes across all accounts.
    pub total_minutes: Decimal,
    /// Bonus minutes per account.
    pub accounts: BTreeMap<String, Decimal>,
    /// The rules that applied, in declared order.
    pub applied: Vec<AppliedBonus>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the bonus minutes one rule yields for `overlap_minutes`.
pub fn bonus_minutes(calculation: BonusCalculation, overlap_minutes: Minutes) -> Decimal {
    if overlap_minutes <= 0 {
        return Decimal::ZERO;
    }
    let overlap = Decimal::from(overlap_minutes);
    match calculation {
        BonusCalculation::Fixed { value_minutes } => value_minutes,
        BonusCalculation::PerMinute { value_minutes } => overlap * value_minutes,
        BonusCalculation::Percentage { value } => overlap * value / Decimal::ONE_HUNDRED,
    }
}

/// Evaluates the plan's bonus rules against the day's work intervals.
///
/// A rule applies when its window overlaps work and the day's net work
/// reaches `min_work_minutes`, if set.
pub fn calculate_bonuses(
    rules: &[BonusRule],
    intervals: &[PairedInterval],
    net_work_minutes: Minutes,
    step_number: u32,
) -> BonusResult {
    let mut accounts: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut applied = Vec::new();

    for (rule_index, rule) in rules.iter().enumerate() {
        if rule
            .min_work_minutes
            .is_some_and(|required| net_work_minutes < required)
        {
            continue;
        }
        let overlap_minutes: Minutes = intervals
            .iter()
            .map(|interval| interval.overlap(rule.window.start, rule.window.end))
            .sum();
        if overlap_minutes == 0 {
            continue;
        }

        let minutes = bonus_minutes(rule.calculation, overlap_minutes);
        *accounts.entry(rule.account.clone()).or_insert(Decimal::ZERO) += minutes;
        applied.push(AppliedBonus {
            rule_index,
            account: rule.account.clone(),
            overlap_minutes,
            minutes,
        });
    }

    let total_minutes: Decimal = accounts.values().copied().sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "bonus".to_string(),
        rule_name: "Time-Window Bonuses".to_string(),
        input: json!({
            "rules": rules,
            "net_work_minutes": net_work_minutes,
        }),
        output: json!({
            "applied": applied,
            "accounts": accounts,
            "total_minutes": total_minutes,
        }),
        reasoning: format!(
            "{} of {} bonus rule(s) applied for {} bonus minute(s)",
            applied.len(),
            rules.len(),
            total_minutes
        ),
    };

    BonusResult {
        total_minutes,
        accounts,
        applied,
        audit_step,
    }
}
