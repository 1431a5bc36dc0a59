//! Time and rate primitives.
//!
//! Attendance is modelled as a set of signed hour deltas against a fully
//! attended period of `month_days × workday_hours` hours.  Overtime deltas
//! are weighted by `overtime_rate`, undertime deltas by `undertime_rate`.

use crate::error::{PayrollError, Result};
use crate::models::{AttendanceItem, AttendanceSummary, DayRecord, Employee, PayrollConfig};

/// Pay for one fully attended workday.
pub fn daily_rate(employee: &Employee) -> f64 {
    employee.daily_salary
}

/// Pay for one hour of work.
pub fn hourly_rate(employee: &Employee, config: &PayrollConfig) -> Result<f64> {
    if !config.workday_hours.is_finite() || config.workday_hours <= 0.0 {
        return Err(PayrollError::InvalidConfiguration(
            "workdayHours must be greater than 0".into(),
        ));
    }
    Ok(employee.daily_salary / config.workday_hours)
}

/// Hours in a fully attended period.
pub fn expected_hours(config: &PayrollConfig) -> f64 {
    config.month_days * config.workday_hours
}

/// Weighted sum of all attendance deltas.
pub fn hours_adjustment(items: &[AttendanceItem], config: &PayrollConfig) -> f64 {
    items
        .iter()
        .map(|item| {
            if item.hours > 0.0 {
                item.hours * config.overtime_rate
            } else if item.hours < 0.0 {
                item.hours * config.undertime_rate
            } else {
                0.0
            }
        })
        .sum()
}

/// Expected hours plus the weighted attendance adjustment.
pub fn total_hours(items: &[AttendanceItem], config: &PayrollConfig) -> f64 {
    expected_hours(config) + hours_adjustment(items, config)
}

/// `total_hours` expressed in workdays.  May be fractional and may exceed
/// `month_days`.
pub fn actual_days(total_hours: f64, config: &PayrollConfig) -> Result<f64> {
    if !config.workday_hours.is_finite() || config.workday_hours <= 0.0 {
        return Err(PayrollError::InvalidConfiguration(
            "workdayHours must be greater than 0".into(),
        ));
    }
    Ok(total_hours / config.workday_hours)
}

/// Share of the period that was attended, capped to `[0, 1]`.
pub fn days_worked_proportion(actual_days: f64, config: &PayrollConfig) -> Result<f64> {
    if !config.month_days.is_finite() || config.month_days <= 0.0 {
        return Err(PayrollError::InvalidConfiguration(
            "monthDays must be greater than 0".into(),
        ));
    }
    Ok((actual_days / config.month_days).clamp(0.0, 1.0))
}

pub fn base_salary(
    employee: &Employee,
    items: &[AttendanceItem],
    config: &PayrollConfig,
) -> Result<f64> {
    Ok(total_hours(items, config) * hourly_rate(employee, config)?)
}

/// Parses `"HH:MM"` into minutes since midnight.
pub fn parse_clock(time: &str) -> Result<u32> {
    let bad = || PayrollError::InvalidAttendance(format!("invalid clock time {time:?}"));
    let (h, m) = time.trim().split_once(':').ok_or_else(bad)?;
    let hours: u32 = h.parse().map_err(|_| bad())?;
    let minutes: u32 = m.parse().map_err(|_| bad())?;
    if hours > 23 || minutes > 59 {
        return Err(bad());
    }
    Ok(hours * 60 + minutes)
}

/// Hours between two clock times, rounded to two decimals.  Zero when
/// `exit` is not after `entry`.
pub fn worked_hours(entry: &str, exit: &str) -> Result<f64> {
    let entry = parse_clock(entry)?;
    let exit = parse_clock(exit)?;
    if exit <= entry {
        return Ok(0.0);
    }
    let hours = f64::from(exit - entry) / 60.0;
    Ok((hours * 100.0).round() / 100.0)
}

/// Converts a day-based record into an attendance delta.
pub fn delta_from_day(day: &DayRecord, config: &PayrollConfig) -> Result<AttendanceItem> {
    let hours = match day {
        DayRecord::Regular { entry, exit } => worked_hours(entry, exit)? - config.workday_hours,
        DayRecord::Holiday | DayRecord::PaidLeave | DayRecord::Sick => 0.0,
        DayRecord::UnpaidLeave => -config.workday_hours,
    };
    Ok(AttendanceItem::new(hours))
}

/// Converts a list of day-based records, dropping days that balance out
/// to zero.
pub fn deltas_from_days(days: &[DayRecord], config: &PayrollConfig) -> Result<Vec<AttendanceItem>> {
    days.iter()
        .map(|day| delta_from_day(day, config))
        .filter(|item| !matches!(item, Ok(i) if i.hours == 0.0))
        .collect()
}

/// Counts day-based records by type and totals their paid hours.
pub fn attendance_summary(days: &[DayRecord], config: &PayrollConfig) -> Result<AttendanceSummary> {
    let mut summary = AttendanceSummary::default();
    for day in days {
        match day {
            DayRecord::Regular { entry, exit } => {
                summary.hours += worked_hours(entry, exit)?;
                summary.regular_days += 1;
            }
            DayRecord::Holiday => {
                summary.hours += config.workday_hours;
                summary.holidays += 1;
            }
            DayRecord::PaidLeave => {
                summary.hours += config.workday_hours;
                summary.paid_leave += 1;
            }
            DayRecord::Sick => {
                summary.hours += config.workday_hours;
                summary.sick_days += 1;
            }
            DayRecord::UnpaidLeave => summary.unpaid_leave += 1,
        }
        summary.total_days += 1;
    }
    Ok(summary)
}
