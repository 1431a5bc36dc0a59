//! Rule eligibility.

use crate::models::{Employee, Gender, MaritalStatus};
use crate::rules::{Criterion, Rule};

/// Whether the employee satisfies a single criterion.
pub fn matches_criterion(criterion: Criterion, employee: &Employee) -> bool {
    match criterion {
        Criterion::Married => employee.marital_status == MaritalStatus::Married,
        Criterion::Single => employee.marital_status == MaritalStatus::Single,
        Criterion::Male => employee.gender == Gender::Male,
        Criterion::Female => employee.gender == Gender::Female,
        Criterion::Custom => false,
    }
}

/// Whether `rule` applies to `employee`.
///
/// An empty criteria list applies to everyone; otherwise matching any one
/// criterion is enough.
pub fn applies_to_employee(rule: &Rule, employee: &Employee) -> bool {
    let applies_to = &rule.criteria.applies_to;
    applies_to.is_empty()
        || applies_to
            .iter()
            .any(|&criterion| matches_criterion(criterion, employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Criteria, RuleCategory, RuleType};
    use rstest::rstest;

    fn rule(tags: &[Criterion]) -> Rule {
        Rule {
            id: "r1".into(),
            label: "Rule".into(),
            rule_type: RuleType::Fixed,
            value: 1.0,
            criteria: Criteria::any_of(tags.iter().copied()),
            category: RuleCategory::Bonus,
            order: 1.0,
            enabled: true,
        }
    }

    fn employee(gender: Gender, marital_status: MaritalStatus) -> Employee {
        Employee {
            id: "e1".into(),
            name: "Test".into(),
            gender,
            marital_status,
            daily_salary: 100.0,
            probationary: false,
        }
    }

    #[rstest]
    #[case(vec![], Gender::Female, MaritalStatus::Single, true)]
    #[case(vec![], Gender::Male, MaritalStatus::Married, true)]
    #[case(vec![Criterion::Married, Criterion::Male], Gender::Male, MaritalStatus::Single, true)]
    #[case(vec![Criterion::Married, Criterion::Male], Gender::Female, MaritalStatus::Married, true)]
    #[case(vec![Criterion::Married, Criterion::Male], Gender::Female, MaritalStatus::Single, false)]
    #[case(vec![Criterion::Female], Gender::Male, MaritalStatus::Married, false)]
    #[case(vec![Criterion::Single], Gender::Male, MaritalStatus::Single, true)]
    #[case(vec![Criterion::Custom], Gender::Female, MaritalStatus::Married, false)]
    fn eligibility(
        #[case] tags: Vec<Criterion>,
        #[case] gender: Gender,
        #[case] marital_status: MaritalStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(
            applies_to_employee(&rule(&tags), &employee(gender, marital_status)),
            expected
        );
    }
}
