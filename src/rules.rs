//! Calculation rules.
//!
//! A [`Rule`] is a user-authored bonus or deduction: what kind of number
//! it produces ([`RuleType`]), who it applies to ([`Criteria`]), and where
//! it sits in the evaluation sequence.  Rules enter the system only via
//! [`create_rule`] (or by deserialising, which goes through the same
//! path), so an invalid rule can never be part of an active rule list.

use crate::error::{FieldErrors, PayrollError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order given to rules authored without one.
pub const DEFAULT_ORDER: f64 = 999.0;

/// The numeric semantics of a rule's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// A fixed amount, scaled down for partial attendance.
    Fixed,
    /// A number of standard 8-hour days priced at the hourly rate.
    DaysMultiplier,
    /// A rate applied to gross salary (resolved by the summary).
    PercentageMonthly,
    /// A rate applied to base salary (resolved by the engine).
    PercentageBase,
    /// A literal number of hours priced at the hourly rate.
    HourlyMultiplier,
}

impl RuleType {
    pub const ALL: [RuleType; 5] = [
        RuleType::Fixed,
        RuleType::DaysMultiplier,
        RuleType::PercentageMonthly,
        RuleType::PercentageBase,
        RuleType::HourlyMultiplier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::Fixed => "fixed",
            RuleType::DaysMultiplier => "days_multiplier",
            RuleType::PercentageMonthly => "percentage_monthly",
            RuleType::PercentageBase => "percentage_base",
            RuleType::HourlyMultiplier => "hourly_multiplier",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }

    /// Whether the calculator returns a rate instead of an amount.
    pub fn is_percentage(self) -> bool {
        matches!(self, RuleType::PercentageMonthly | RuleType::PercentageBase)
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Bonus,
    Deduction,
}

impl RuleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Bonus => "bonus",
            RuleCategory::Deduction => "deduction",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bonus" => Some(RuleCategory::Bonus),
            "deduction" => Some(RuleCategory::Deduction),
            _ => None,
        }
    }
}

/// One eligibility tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Married,
    Single,
    Male,
    Female,
    /// Reserved for custom predicates.  Never matches.
    Custom,
}

impl Criterion {
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Married => "married",
            Criterion::Single => "single",
            Criterion::Male => "male",
            Criterion::Female => "female",
            Criterion::Custom => "custom",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "married" => Some(Criterion::Married),
            "single" => Some(Criterion::Single),
            "male" => Some(Criterion::Male),
            "female" => Some(Criterion::Female),
            "custom" => Some(Criterion::Custom),
            _ => None,
        }
    }
}

/// Who a rule applies to.  An empty list means everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub applies_to: Vec<Criterion>,
}

impl Criteria {
    pub fn everyone() -> Self {
        Self::default()
    }

    pub fn any_of(tags: impl IntoIterator<Item = Criterion>) -> Self {
        Self {
            applies_to: tags.into_iter().collect(),
        }
    }
}

/// A validated calculation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RuleDraft")]
pub struct Rule {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub value: f64,
    pub criteria: Criteria,
    pub category: RuleCategory,
    /// Evaluation sequence; ties keep list position.
    pub order: f64,
    pub enabled: bool,
}

impl Rule {
    /// Re-checks a constructed rule against the authoring constraints.
    pub fn validate(&self) -> Result<()> {
        match validate_rule(&RuleDraft::from(self)) {
            Some(errors) => Err(PayrollError::Validation(errors)),
            None => Ok(()),
        }
    }
}

/// Candidate criteria as typed by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaDraft {
    #[serde(default)]
    pub applies_to: Option<Vec<String>>,
}

/// A loosely typed rule candidate.  Every field may be missing or hold an
/// unrecognised tag; [`validate_rule`] reports what is wrong with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub rule_type: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub criteria: Option<CriteriaDraft>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        RuleDraft {
            id: Some(rule.id.clone()),
            label: Some(rule.label.clone()),
            rule_type: Some(rule.rule_type.as_str().to_string()),
            value: Some(rule.value),
            criteria: Some(CriteriaDraft {
                applies_to: Some(
                    rule.criteria
                        .applies_to
                        .iter()
                        .map(|c| c.as_str().to_string())
                        .collect(),
                ),
            }),
            category: Some(rule.category.as_str().to_string()),
            order: Some(rule.order),
            enabled: Some(rule.enabled),
        }
    }
}

impl TryFrom<RuleDraft> for Rule {
    type Error = PayrollError;

    fn try_from(draft: RuleDraft) -> Result<Self> {
        create_rule(draft)
    }
}

fn long_enough(text: Option<&str>) -> bool {
    text.is_some_and(|t| t.chars().count() >= 2)
}

fn non_negative(number: Option<f64>) -> bool {
    number.is_some_and(|n| n.is_finite() && n >= 0.0)
}

/// Checks every constraint on a rule candidate.
///
/// All violations are collected; `None` means the candidate is valid.
pub fn validate_rule(draft: &RuleDraft) -> Option<FieldErrors> {
    let mut errors = FieldErrors::new();

    if !long_enough(draft.id.as_deref()) {
        errors.insert("id", "Rule ID must be at least 2 characters");
    }
    if !long_enough(draft.label.as_deref()) {
        errors.insert("label", "Rule label must be at least 2 characters");
    }
    if draft
        .rule_type
        .as_deref()
        .and_then(RuleType::from_tag)
        .is_none()
    {
        errors.insert("type", "Invalid rule type");
    }
    if !non_negative(draft.value) {
        errors.insert("value", "Value must be a non-negative number");
    }
    match draft.criteria.as_ref().and_then(|c| c.applies_to.as_ref()) {
        None => errors.insert("criteria", "Criteria must specify appliesTo as an array"),
        Some(tags) if tags.iter().any(|t| Criterion::from_tag(t).is_none()) => {
            errors.insert("criteria", "Invalid criteria type in array")
        }
        Some(_) => {}
    }
    if draft
        .category
        .as_deref()
        .and_then(RuleCategory::from_tag)
        .is_none()
    {
        errors.insert("category", "Invalid category");
    }
    if !non_negative(draft.order) {
        errors.insert("order", "Order must be a non-negative number");
    }

    errors.into_option()
}

/// Builds a rule id from a label: lowercase, runs of anything other than
/// `[a-z0-9]` collapsed to a single `_`, no leading or trailing `_`.
pub fn generate_rule_id(label: &str) -> String {
    let mut id = String::with_capacity(label.len());
    for ch in label.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            id.push(ch);
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }
    id.trim_matches('_').to_string()
}

/// Builds a rule from partial input.
///
/// A missing or empty `id` is derived from the label, a missing `order`
/// becomes [`DEFAULT_ORDER`], and the rule is enabled unless `enabled` is
/// explicitly `false`.  The result is validated; nothing is coerced.
pub fn create_rule(mut draft: RuleDraft) -> Result<Rule> {
    if draft.id.as_deref().map_or(true, str::is_empty) {
        draft.id = draft.label.as_deref().map(generate_rule_id);
    }
    draft.order = Some(draft.order.unwrap_or(DEFAULT_ORDER));
    draft.enabled = Some(draft.enabled != Some(false));

    if let Some(errors) = validate_rule(&draft) {
        return Err(PayrollError::Validation(errors));
    }

    // Validated: every field below is present and recognised.
    let applies_to = draft
        .criteria
        .and_then(|c| c.applies_to)
        .unwrap_or_default()
        .iter()
        .filter_map(|t| Criterion::from_tag(t))
        .collect();
    let invalid = |field: &str| {
        let mut errors = FieldErrors::new();
        errors.insert(field, "missing after validation");
        PayrollError::Validation(errors)
    };
    Ok(Rule {
        id: draft.id.unwrap_or_default(),
        label: draft.label.unwrap_or_default(),
        rule_type: draft
            .rule_type
            .as_deref()
            .and_then(RuleType::from_tag)
            .ok_or_else(|| invalid("type"))?,
        value: draft.value.unwrap_or_default(),
        criteria: Criteria { applies_to },
        category: draft
            .category
            .as_deref()
            .and_then(RuleCategory::from_tag)
            .ok_or_else(|| invalid("category"))?,
        order: draft.order.unwrap_or(DEFAULT_ORDER),
        enabled: draft.enabled.unwrap_or(true),
    })
}

/// Stable ascending sort by `order`.
pub fn sort_rules_by_order(rules: &[Rule]) -> Vec<Rule> {
    let mut sorted = rules.to_vec();
    sorted.sort_by(|a, b| a.order.total_cmp(&b.order));
    sorted
}

/// The order to give a rule appended to `rules`.
pub fn next_order(rules: &[Rule]) -> f64 {
    rules
        .iter()
        .map(|r| r.order)
        .max_by(f64::total_cmp)
        .map_or(1.0, |max| max + 1.0)
}

/// The starter rule book.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "bonus_e".into(),
            label: "Bonus E".into(),
            rule_type: RuleType::DaysMultiplier,
            value: 5.0,
            criteria: Criteria::everyone(),
            category: RuleCategory::Bonus,
            order: 1.0,
            enabled: true,
        },
        Rule {
            id: "insurance".into(),
            label: "Insurance Deduction".into(),
            rule_type: RuleType::PercentageMonthly,
            value: 0.07,
            criteria: Criteria::everyone(),
            category: RuleCategory::Deduction,
            order: 2.0,
            enabled: true,
        },
        Rule {
            id: "marital_bonus".into(),
            label: "Marital Bonus".into(),
            rule_type: RuleType::Fixed,
            value: 150_000.0,
            criteria: Criteria::any_of([Criterion::Married]),
            category: RuleCategory::Bonus,
            order: 3.0,
            enabled: true,
        },
    ]
}
