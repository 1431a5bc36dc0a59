//! Netting a payroll result into take-home pay.
//!
//! The engine stops at gross salary; it does not know about manual
//! adjustments and leaves `percentage_monthly` rules unresolved.  This
//! module finishes the job:
//!
//! * `subtotal = gross salary + Σ adjustments`
//! * every `percentage_monthly` rule is applied to `subtotal`, so
//!   deductions never feed into one another
//! * `take_home = max(0, subtotal + monthly bonuses − deductions)`

use crate::models::{Adjustment, PayrollResult, RuleResult};
use crate::rules::{RuleCategory, RuleType};
use serde::{Deserialize, Serialize};

/// One resolved rule contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine {
    pub rule_id: String,
    pub label: String,
    pub category: RuleCategory,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub amount: f64,
}

/// Final pay figures for one employee and one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub base_salary: f64,
    pub gross_salary: f64,
    pub adjustment_total: f64,
    /// Gross salary plus adjustments; the base for monthly percentages.
    pub subtotal: f64,
    pub bonus_total: f64,
    pub deduction_total: f64,
    pub take_home: f64,
    /// Every positive contribution, bonuses first, each group in the order
    /// the rules were evaluated.
    pub lines: Vec<SummaryLine>,
}

/// Resolves deferred percentages and nets deductions against gross pay.
pub fn summarize(result: &PayrollResult, adjustments: &[Adjustment]) -> PayrollSummary {
    let adjustment_total: f64 = adjustments.iter().map(|a| a.amount).sum();
    let subtotal = result.gross_salary + adjustment_total;

    let bonus_lines = lines_for(result.bonuses_in_order(), subtotal);
    let deduction_lines = lines_for(result.deductions_in_order(), subtotal);

    let bonus_total: f64 = bonus_lines.iter().map(|l| l.amount).sum();
    let deduction_total: f64 = deduction_lines.iter().map(|l| l.amount).sum();

    // Bonuses already counted in gross are everything but monthly ones.
    let monthly_bonus_total: f64 = bonus_lines
        .iter()
        .filter(|l| l.rule_type == RuleType::PercentageMonthly)
        .map(|l| l.amount)
        .sum();
    let take_home = (subtotal + monthly_bonus_total - deduction_total).max(0.0);

    PayrollSummary {
        base_salary: result.base_salary,
        gross_salary: result.gross_salary,
        adjustment_total,
        subtotal,
        bonus_total,
        deduction_total,
        take_home,
        lines: bonus_lines.into_iter().chain(deduction_lines).collect(),
    }
}

/// The amount a single recorded rule contributes, given the subtotal.
pub fn resolved_amount(item: &RuleResult, subtotal: f64) -> f64 {
    match item.final_value {
        Some(amount) => amount,
        None => (subtotal * item.value).max(0.0),
    }
}

/// Lines in evaluation order.  A monthly percentage that resolves to
/// nothing (a subtotal of zero or less) leaves no line.
fn lines_for(items: Vec<&RuleResult>, subtotal: f64) -> Vec<SummaryLine> {
    items
        .into_iter()
        .map(|item| SummaryLine {
            rule_id: item.rule.id.clone(),
            label: item.rule.label.clone(),
            category: item.rule.category,
            rule_type: item.rule.rule_type,
            amount: resolved_amount(item, subtotal),
        })
        .filter(|line| line.amount > 0.0)
        .collect()
}
