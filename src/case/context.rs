use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The facts that frame every conversation: who was taken, where from,
/// where to, and how long it has been. Loaded from a small JSON file the
/// user maintains; every field tolerates absence because an incomplete case
/// file must not block the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaseContext {
    #[serde(default)]
    pub child_name: String,
    #[serde(default)]
    pub origin_country: String,
    #[serde(default)]
    pub destination_country: String,
    #[serde(default)]
    pub custody_status: String,
    #[serde(default)]
    pub abductor_relation: String,
    /// ISO date of the incident, e.g. "2026-03-14".
    #[serde(default)]
    pub incident_date: Option<NaiveDate>,
}

impl CaseContext {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read case file '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse case file '{}'", path.display()))
    }

    /// Whole days since the incident, as of the local date. None when the
    /// incident date is unknown or in the future.
    pub fn days_since_incident(&self) -> Option<i64> {
        self.days_since_incident_on(Local::now().date_naive())
    }

    pub(crate) fn days_since_incident_on(&self, today: NaiveDate) -> Option<i64> {
        let incident = self.incident_date?;
        let days = (today - incident).num_days();
        (days >= 0).then_some(days)
    }

    fn field_or<'a>(&self, value: &'a str, fallback: &'a str) -> &'a str {
        if value.trim().is_empty() {
            fallback
        } else {
            value
        }
    }

    /// One-paragraph case summary embedded in the system instruction.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "The parent's child {} was taken from {} to {}.",
            self.field_or(&self.child_name, "(name not provided)"),
            self.field_or(&self.origin_country, "(origin unknown)"),
            self.field_or(&self.destination_country, "(destination unknown)"),
        )];
        lines.push(format!(
            "Custody status: {}. The abductor is the child's {}.",
            self.field_or(&self.custody_status, "not established"),
            self.field_or(&self.abductor_relation, "other parent"),
        ));
        match self.days_since_incident() {
            Some(0) => lines.push("The abduction happened today.".to_string()),
            Some(days) => lines.push(format!("It has been {days} days since the abduction.")),
            None => {}
        }
        lines.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CaseContext {
        CaseContext {
            child_name: "Maya".to_string(),
            origin_country: "Canada".to_string(),
            destination_country: "Brazil".to_string(),
            custody_status: "joint custody order".to_string(),
            abductor_relation: "father".to_string(),
            incident_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        }
    }

    #[test]
    fn days_since_counts_whole_days() {
        let ctx = context();
        let today = NaiveDate::from_ymd_opt(2026, 3, 21).unwrap();
        assert_eq!(ctx.days_since_incident_on(today), Some(7));
    }

    #[test]
    fn future_incident_date_yields_none() {
        let ctx = context();
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(ctx.days_since_incident_on(today), None);
    }

    #[test]
    fn summary_names_the_case_facts() {
        let summary = context().summary();
        assert!(summary.contains("Maya"));
        assert!(summary.contains("Canada"));
        assert!(summary.contains("Brazil"));
        assert!(summary.contains("father"));
    }

    #[test]
    fn summary_tolerates_an_empty_context() {
        let summary = CaseContext::default().summary();
        assert!(summary.contains("(name not provided)"));
        assert!(summary.contains("(origin unknown)"));
    }

    #[test]
    fn loads_partial_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.json");
        std::fs::write(&path, r#"{"child_name":"Leo","incident_date":"2026-01-02"}"#).unwrap();
        let ctx = CaseContext::load(&path).expect("partial files are fine");
        assert_eq!(ctx.child_name, "Leo");
        assert_eq!(ctx.incident_date, NaiveDate::from_ymd_opt(2026, 1, 2));
        assert!(ctx.origin_country.is_empty());
    }
}
