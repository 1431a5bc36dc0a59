//! Payroll computation engine.
//!
//! The `engine` module turns an employee, their attendance deltas, the
//! active rule list and a [`PayrollConfig`] into a [`PayrollResult`].
//! Evaluation runs in two phases:
//!
//! 1. every enabled rule is evaluated in order into a raw value, and
//!    rules that do not produce a positive value are dropped;
//! 2. the survivors are resolved into amounts.  Amount rules are final
//!    as they are, `percentage_base` rules are applied to the now fixed
//!    base salary, and `percentage_monthly` rules are left for
//!    [`crate::summary::summarize`], which alone knows the adjusted gross.
//!
//! [`run_payroll`] applies the same calculation to a whole pay run,
//! using [`rayon`] to spread employees across CPU cores.

use crate::calculator::calculate_rule_value;
use crate::error::{FieldErrors, PayrollError, Result};
use crate::models::{
    validate_employee, AttendanceItem, AttendanceSummary, DayRecord, Employee, EmployeePayResult,
    PayRunInput, PayRunResult, PayrollConfig, PayrollResult, RuleResult,
};
use crate::rates;
use crate::rules::{Rule, RuleCategory, RuleType};
use crate::summary::summarize;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, trace, warn};

/// A rule that survived phase one, with its raw value and its place in
/// evaluation order.
#[derive(Debug, Clone)]
struct Evaluated<'a> {
    rule: &'a Rule,
    raw: f64,
    position: usize,
}

/// Calculates the salary breakdown for one employee.
///
/// The result is a pure function of the arguments.  Probationary
/// employees short-circuit to base salary with no rules evaluated.
/// The rule list must pass [`validate_rule_list`]; a list with an invalid
/// rule or a repeated id is rejected before anything is computed.
#[tracing::instrument(level = "debug", skip_all, fields(employee = %employee.id))]
pub fn calculate_payroll(
    employee: &Employee,
    attendance: &[AttendanceItem],
    rules: &[Rule],
    config: &PayrollConfig,
) -> Result<PayrollResult> {
    config.validate()?;
    validate_rule_list(rules)?;

    let hourly_rate = rates::hourly_rate(employee, config)?;
    let total_hours = rates::total_hours(attendance, config);
    let actual_days = rates::actual_days(total_hours, config)?;
    let base_salary = total_hours * hourly_rate;

    if employee.probationary {
        debug!("probationary employee, skipping rules");
        return Ok(PayrollResult {
            hourly_rate,
            base_salary,
            bonuses: BTreeMap::new(),
            deductions: BTreeMap::new(),
            gross_salary: base_salary,
            total_hours,
            actual_days,
        });
    }

    let evaluated = evaluate_rules(employee, attendance, rules, config)?;

    let mut bonuses = BTreeMap::new();
    let mut deductions = BTreeMap::new();
    for item in evaluated {
        let Some(result) = resolve(item, base_salary) else {
            continue;
        };
        let target = match result.rule.category {
            RuleCategory::Bonus => &mut bonuses,
            RuleCategory::Deduction => &mut deductions,
        };
        target.insert(result.rule.id.clone(), result);
    }

    let bonus_total: f64 = bonuses.values().filter_map(|r| r.final_value).sum();
    let gross_salary = base_salary + bonus_total;
    debug!(base_salary, gross_salary, "payroll calculated");

    Ok(PayrollResult {
        hourly_rate,
        base_salary,
        bonuses,
        deductions,
        gross_salary,
        total_hours,
        actual_days,
    })
}

/// Phase one: enabled rules in order, each with a positive raw value.
fn evaluate_rules<'a>(
    employee: &Employee,
    attendance: &[AttendanceItem],
    rules: &'a [Rule],
    config: &PayrollConfig,
) -> Result<Vec<Evaluated<'a>>> {
    let mut ordered: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
    ordered.sort_by(|a, b| a.order.total_cmp(&b.order));

    let mut evaluated = Vec::with_capacity(ordered.len());
    for (position, rule) in ordered.into_iter().enumerate() {
        let raw = calculate_rule_value(rule, employee, attendance, config)?;
        if raw > 0.0 {
            evaluated.push(Evaluated { rule, raw, position });
        } else {
            trace!(rule = %rule.id, raw, "rule contributes nothing");
        }
    }
    Ok(evaluated)
}

/// Phase two: turns a raw value into a recorded contribution.
///
/// A `percentage_base` rule whose resolved amount is not positive (a
/// zero base salary) is dropped like any other non-contributing rule.
fn resolve(item: Evaluated<'_>, base_salary: f64) -> Option<RuleResult> {
    let Evaluated { rule, raw, position } = item;
    let final_value = match rule.rule_type {
        RuleType::Fixed | RuleType::DaysMultiplier | RuleType::HourlyMultiplier => Some(raw),
        RuleType::PercentageBase => {
            let amount = base_salary * raw;
            if amount <= 0.0 {
                trace!(rule = %rule.id, amount, "percentage of base resolved to nothing");
                return None;
            }
            Some(amount)
        }
        RuleType::PercentageMonthly => None,
    };
    Some(RuleResult {
        rule: rule.clone(),
        value: raw,
        percentage: rule.rule_type.is_percentage(),
        final_value,
        position,
    })
}

/// Checks a rule list before a run: every rule must be valid and ids
/// must be unique.
pub fn validate_rule_list(rules: &[Rule]) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        rule.validate()?;
        if !seen.insert(rule.id.as_str()) {
            let mut errors = FieldErrors::new();
            errors.insert("id", format!("Duplicate rule id {}", rule.id));
            return Err(PayrollError::Validation(errors));
        }
    }
    Ok(())
}

/// Collects an employee's attendance deltas: the explicit items followed
/// by those derived from day records.  The summary is only produced when
/// day records were supplied.
fn employee_attendance(
    items: &[AttendanceItem],
    days: Option<&Vec<DayRecord>>,
    config: &PayrollConfig,
) -> Result<(Vec<AttendanceItem>, Option<AttendanceSummary>)> {
    let mut attendance = items.to_vec();
    let Some(days) = days else {
        return Ok((attendance, None));
    };
    attendance.extend(rates::deltas_from_days(days, config)?);
    let summary = rates::attendance_summary(days, config)?;
    Ok((attendance, Some(summary)))
}

/// Runs a payroll for every employee in `input`.
///
/// An invalid configuration or rule list fails the whole run.  Problems
/// with a single employee, including unreadable day records, are recorded
/// on that employee's result and do not affect anyone else.
pub fn run_payroll(input: PayRunInput) -> Result<PayRunResult> {
    input.config.validate()?;
    validate_rule_list(&input.rules)?;

    let rules = &input.rules;
    let config = input.config;
    let attendance = &input.attendance;
    let days = &input.days;
    let adjustments = &input.adjustments;

    // Compute each employee's pay result in parallel
    let results: Vec<EmployeePayResult> = input
        .employees
        .into_par_iter()
        .map(|employee| {
            let items = attendance.get(&employee.id).map_or(&[][..], Vec::as_slice);
            let adjust = adjustments.get(&employee.id).map_or(&[][..], Vec::as_slice);
            let outcome = validate_employee(&employee).and_then(|()| {
                let (items, summary) =
                    employee_attendance(items, days.get(&employee.id), &config)?;
                let payroll = calculate_payroll(&employee, &items, rules, &config)?;
                Ok((payroll, summary))
            });
            match outcome {
                Ok((payroll, attendance)) => {
                    let summary = summarize(&payroll, adjust);
                    EmployeePayResult {
                        employee,
                        payroll: Some(payroll),
                        summary: Some(summary),
                        attendance,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!(employee = %employee.id, error = %err, "employee skipped");
                    EmployeePayResult {
                        employee,
                        payroll: None,
                        summary: None,
                        attendance: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(
        employees = results.len(),
        failed,
        start = %input.pay_period.start,
        end = %input.pay_period.end,
        "pay run complete"
    );
    Ok(PayRunResult {
        period: input.pay_period,
        config,
        results,
    })
}
