//! Data models for the Payroll Engine.
//!
//! The `models` module defines the serialisable records that cross the
//! engine boundary: employees, attendance adjustments, the calculation
//! configuration, manual adjustments and the result structures.  All of
//! them derive `Serialize` and `Deserialize` (camelCase on the wire) so
//! that a persistence or presentation layer can hand them over as plain
//! JSON.  The engine never mutates any of them.

use crate::error::{PayrollError, Result};
use crate::rules::Rule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Represents an employee in the payroll system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// A unique identifier for the employee.
    pub id: String,
    /// The employee's full name.
    pub name: String,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    /// Pay for one fully attended workday.
    pub daily_salary: f64,
    /// Probationary (newly hired) employees receive base salary only;
    /// no calculation rule is evaluated for them.
    #[serde(default)]
    pub probationary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Single,
    Married,
}

/// Checks that an employee record can be paid.
///
/// The name must have at least two non-blank characters and the daily
/// salary must be a finite, non-negative number.
pub fn validate_employee(employee: &Employee) -> Result<()> {
    let invalid = |reason: &str| PayrollError::InvalidEmployee {
        id: employee.id.clone(),
        reason: reason.to_string(),
    };
    if employee.name.trim().chars().count() < 2 {
        return Err(invalid("name must be at least 2 characters"));
    }
    if !employee.daily_salary.is_finite() || employee.daily_salary < 0.0 {
        return Err(invalid("daily salary must be a non-negative number"));
    }
    Ok(())
}

/// A single attendance adjustment, expressed as a signed delta against a
/// fully attended period.
///
/// Positive hours are overtime; negative hours are undertime or absence.
/// An employee with no items at all is paid for the full expected month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceItem {
    pub hours: f64,
}

impl AttendanceItem {
    pub fn new(hours: f64) -> Self {
        Self { hours }
    }
}

/// A per-date attendance record in the older day-based form.
///
/// These are never fed to the engine directly; convert them with
/// [`crate::rates::delta_from_day`] first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DayRecord {
    /// A worked day with `"HH:MM"` clock-in/clock-out times.
    Regular {
        #[serde(rename = "entryTime")]
        entry: String,
        #[serde(rename = "exitTime")]
        exit: String,
    },
    Holiday,
    PaidLeave,
    UnpaidLeave,
    Sick,
}

/// Calculation configuration.  Supplied fresh on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollConfig {
    /// Hours in one workday.
    #[serde(default = "default_workday_hours")]
    pub workday_hours: f64,
    /// Expected days in one pay period.
    #[serde(default = "default_month_days")]
    pub month_days: f64,
    /// Multiplier applied to positive (overtime) attendance deltas.
    #[serde(default = "default_overtime_rate")]
    pub overtime_rate: f64,
    /// Multiplier applied to negative (undertime) attendance deltas.
    #[serde(default = "default_undertime_rate")]
    pub undertime_rate: f64,
}

fn default_workday_hours() -> f64 {
    8.0
}

fn default_month_days() -> f64 {
    30.0
}

fn default_overtime_rate() -> f64 {
    1.5
}

fn default_undertime_rate() -> f64 {
    0.5
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            workday_hours: default_workday_hours(),
            month_days: default_month_days(),
            overtime_rate: default_overtime_rate(),
            undertime_rate: default_undertime_rate(),
        }
    }
}

impl PayrollConfig {
    /// Rejects configurations that would make the rate or proportion
    /// arithmetic undefined.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PayrollError::InvalidConfiguration(msg.to_string()));
        if !self.workday_hours.is_finite() || self.workday_hours <= 0.0 {
            return fail("workdayHours must be greater than 0");
        }
        if self.workday_hours > 24.0 {
            return fail("workdayHours cannot exceed 24");
        }
        if !self.month_days.is_finite() || self.month_days <= 0.0 {
            return fail("monthDays must be greater than 0");
        }
        if !self.overtime_rate.is_finite() || self.overtime_rate < 1.0 {
            return fail("overtimeRate must be at least 1");
        }
        if !self.undertime_rate.is_finite() || self.undertime_rate < 0.0 {
            return fail("undertimeRate must be a non-negative number");
        }
        Ok(())
    }
}

/// A manual earning or deduction entered by the operator for one period.
///
/// Positive amounts add to the subtotal, negative amounts subtract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Human-readable description of the item.
    pub description: String,
    pub amount: f64,
}

/// The evaluated contribution of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub rule: Rule,
    /// The raw value produced by the rule calculator.  For percentage
    /// rules this is the rate itself (e.g. `0.07`).
    pub value: f64,
    /// True when `value` is a rate rather than an amount.
    pub percentage: bool,
    /// The resolved amount.  `None` for `percentage_monthly` rules, which
    /// are resolved by [`crate::summary::summarize`] once gross salary
    /// and adjustments are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_value: Option<f64>,
    /// Place in the evaluation sequence: rule order, ties by list position.
    #[serde(default)]
    pub position: usize,
}

/// Salary breakdown for one employee and one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResult {
    pub hourly_rate: f64,
    pub base_salary: f64,
    pub bonuses: BTreeMap<String, RuleResult>,
    pub deductions: BTreeMap<String, RuleResult>,
    /// Base salary plus every resolved bonus.  Deductions never reduce it.
    pub gross_salary: f64,
    pub total_hours: f64,
    pub actual_days: f64,
}

impl PayrollResult {
    /// Bonuses in evaluation order.  The map itself is keyed by rule id.
    pub fn bonuses_in_order(&self) -> Vec<&RuleResult> {
        in_evaluation_order(self.bonuses.values())
    }

    /// Deductions in evaluation order.
    pub fn deductions_in_order(&self) -> Vec<&RuleResult> {
        in_evaluation_order(self.deductions.values())
    }
}

fn in_evaluation_order<'a>(items: impl Iterator<Item = &'a RuleResult>) -> Vec<&'a RuleResult> {
    let mut items: Vec<&RuleResult> = items.collect();
    items.sort_by_key(|item| item.position);
    items
}

/// Day counts and paid hours for a list of day-based records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    /// Worked hours on regular days plus a full workday for every paid
    /// non-working day.
    pub hours: f64,
    pub regular_days: u32,
    pub holidays: u32,
    pub paid_leave: u32,
    pub unpaid_leave: u32,
    pub sick_days: u32,
    pub total_days: u32,
}

/// Defines the start and end dates of a pay period.  Dates are
/// represented as ISO 8601 strings (`YYYY-MM-DD`) for simplicity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Inclusive start date of the pay period.
    pub start: String,
    /// Inclusive end date of the pay period.
    pub end: String,
}

/// Input to a batch payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRunInput {
    /// The employees to be paid in this run.
    pub employees: Vec<Employee>,
    /// Attendance deltas keyed by employee id.  Missing entries mean a
    /// fully attended period.
    #[serde(default)]
    pub attendance: HashMap<String, Vec<AttendanceItem>>,
    /// Day-based records keyed by employee id.  They are converted to
    /// deltas and added to that employee's `attendance`.
    #[serde(default)]
    pub days: HashMap<String, Vec<DayRecord>>,
    /// Manual adjustments keyed by employee id.
    #[serde(default)]
    pub adjustments: HashMap<String, Vec<Adjustment>>,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub config: PayrollConfig,
    pub pay_period: PayPeriod,
}

/// The outcome of a batch run for a single employee.
///
/// Exactly one of `payroll`/`summary` (both set) or `error` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayResult {
    pub employee: Employee,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payroll: Option<PayrollResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<crate::summary::PayrollSummary>,
    /// Per-type day counts, present when day records were supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The aggregate result of a payroll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRunResult {
    /// The pay period that was processed.
    pub period: PayPeriod,
    /// The configuration every employee in this run was calculated with.
    pub config: PayrollConfig,
    /// Individual results for each employee, in input order.
    pub results: Vec<EmployeePayResult>,
}
