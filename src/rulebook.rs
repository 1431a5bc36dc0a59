//! Loading rule books and configuration from JSON files.
//!
//! A rule book is a JSON array of rule drafts.  Each draft goes through
//! [`create_rule`], so defaults are applied and invalid rules are
//! rejected with their field errors rather than silently skipped.  A
//! directory may hold several rule books; they are read in file name
//! order and concatenated.

use crate::engine::validate_rule_list;
use crate::models::PayrollConfig;
use crate::rules::{create_rule, Rule, RuleDraft};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parses one rule book.  `source` names it in error messages.
pub fn parse_rules(data: &str, source: &str) -> Result<Vec<Rule>> {
    let drafts: Vec<RuleDraft> =
        serde_json::from_str(data).with_context(|| format!("failed to parse rule book {source}"))?;
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            create_rule(draft).map_err(|err| anyhow!("{source}: rule #{index}: {err}"))
        })
        .collect()
}

fn rule_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads a rule book from a file, or every `.json` rule book in a
/// directory.  The combined list must have unique ids.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let files = if path.is_dir() {
        rule_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    let mut rules = Vec::new();
    for file in files {
        let data = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read rule book {}", file.display()))?;
        let loaded = parse_rules(&data, &file.display().to_string())?;
        debug!(file = %file.display(), count = loaded.len(), "rule book loaded");
        rules.extend(loaded);
    }
    validate_rule_list(&rules)?;
    info!(count = rules.len(), path = %path.display(), "rules loaded");
    Ok(rules)
}

/// Loads and validates a [`PayrollConfig`].  Missing fields take their
/// defaults.
pub fn load_config(path: &Path) -> Result<PayrollConfig> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: PayrollConfig = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleCategory, RuleType, DEFAULT_ORDER};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("payroll_engine_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parse_applies_defaults() {
        let rules = parse_rules(
            r#"[{"label": "Meal Allowance", "type": "fixed", "value": 25000,
                 "criteria": {"appliesTo": []}, "category": "bonus"}]"#,
            "inline",
        )
        .unwrap();
        assert_eq!(rules[0].id, "meal_allowance");
        assert_eq!(rules[0].order, DEFAULT_ORDER);
        assert_eq!(rules[0].rule_type, RuleType::Fixed);
        assert_eq!(rules[0].category, RuleCategory::Bonus);
    }

    #[test]
    fn parse_reports_the_bad_rule() {
        let err = parse_rules(
            r#"[{"label": "Ok rule", "type": "fixed", "value": 1,
                 "criteria": {"appliesTo": []}, "category": "bonus"},
                {"label": "Bad", "type": "fixed", "value": -1,
                 "criteria": {"appliesTo": []}, "category": "bonus"}]"#,
            "inline",
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rule #1"), "{message}");
        assert!(message.contains("value"), "{message}");
    }

    #[test]
    fn directory_books_are_merged_in_name_order() {
        let dir = temp_dir("merge");
        std::fs::write(
            dir.join("b.json"),
            r#"[{"id": "second", "label": "Second", "type": "percentage_base", "value": 0.05,
                 "criteria": {"appliesTo": ["single"]}, "category": "deduction", "order": 2}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("a.json"),
            r#"[{"id": "first", "label": "First", "type": "hourly_multiplier", "value": 4,
                 "criteria": {"appliesTo": []}, "category": "bonus", "order": 1}]"#,
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let rules = load_rules(&dir).unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn duplicate_ids_across_books_fail() {
        let dir = temp_dir("dupes");
        let book = r#"[{"id": "same", "label": "Same", "type": "fixed", "value": 1,
                        "criteria": {"appliesTo": []}, "category": "bonus"}]"#;
        std::fs::write(dir.join("a.json"), book).unwrap();
        std::fs::write(dir.join("b.json"), book).unwrap();
        assert!(load_rules(&dir).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn config_file_is_validated() {
        let dir = temp_dir("config");
        let good = dir.join("good.json");
        let bad = dir.join("bad.json");
        std::fs::write(&good, r#"{"monthDays": 22}"#).unwrap();
        std::fs::write(&bad, r#"{"workdayHours": 0}"#).unwrap();
        let config = load_config(&good).unwrap();
        assert_eq!(config.month_days, 22.0);
        assert_eq!(config.workday_hours, 8.0);
        assert!(load_config(&bad).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
