//! Per-rule value calculation.
//!
//! [`calculate_rule_value`] turns one rule into one number.  For amount
//! rules (`fixed`, `days_multiplier`, `hourly_multiplier`) that number is
//! the contribution itself; for percentage rules it is the rate, which
//! the engine or the summary later applies to base or gross salary.

use crate::eligibility::applies_to_employee;
use crate::error::Result;
use crate::models::{AttendanceItem, Employee, PayrollConfig};
use crate::rates::{actual_days, days_worked_proportion, hourly_rate, total_hours};
use crate::rules::{Rule, RuleType};

/// Hours in one day for `days_multiplier` rules, independent of the
/// configured workday length.
pub const STANDARD_DAY_HOURS: f64 = 8.0;

/// Computes the raw value of `rule` for `employee`.
///
/// Ineligible employees yield `0.0` for every rule type.  The only error
/// is an unusable configuration.
pub fn calculate_rule_value(
    rule: &Rule,
    employee: &Employee,
    attendance: &[AttendanceItem],
    config: &PayrollConfig,
) -> Result<f64> {
    if !applies_to_employee(rule, employee) {
        return Ok(0.0);
    }

    let value = match rule.rule_type {
        RuleType::Fixed => rule.value * attendance_proportion(attendance, config)?,
        RuleType::DaysMultiplier => {
            let hours = rule.value * STANDARD_DAY_HOURS * attendance_proportion(attendance, config)?;
            hours * hourly_rate(employee, config)?
        }
        RuleType::HourlyMultiplier => hourly_rate(employee, config)? * rule.value,
        RuleType::PercentageMonthly | RuleType::PercentageBase => rule.value,
    };
    Ok(value)
}

fn attendance_proportion(attendance: &[AttendanceItem], config: &PayrollConfig) -> Result<f64> {
    let days = actual_days(total_hours(attendance, config), config)?;
    days_worked_proportion(days, config)
}
