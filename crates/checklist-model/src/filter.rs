use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Record, Status, DATE_FORMAT};

/// Conjunctive record filter. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub date: Option<NaiveDate>,
    pub name: Option<String>,
    pub status: Option<Status>,
}

impl FilterCriteria {
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Blank names are treated as "no name filter".
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = (!name.trim().is_empty()).then(|| name.to_string());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.name.is_none() && self.status.is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(date) = self.date {
            if record.date != date.format(DATE_FORMAT).to_string() {
                return false;
            }
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            if !record.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, name: &str, status: Status) -> Record {
        Record {
            date: date.to_string(),
            time: "10:00:00".to_string(),
            name: name.to_string(),
            item: "UPS".to_string(),
            status,
            notes: None,
        }
    }

    #[test]
    fn empty_criteria_match_everything() {
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert!(criteria.matches(&record("01/01/2024", "Ana", Status::Fail)));
    }

    #[test]
    fn date_matches_the_rendered_calendar_date_exactly() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");
        let criteria = FilterCriteria::default().with_date(date);
        assert!(criteria.matches(&record("05/03/2024", "Ana", Status::Ok)));
        assert!(!criteria.matches(&record("5/3/2024", "Ana", Status::Ok)));
        assert!(!criteria.matches(&record("05/03/2025", "Ana", Status::Ok)));
    }

    #[test]
    fn name_is_a_case_insensitive_substring() {
        let criteria = FilterCriteria::default().with_name("an");
        assert!(criteria.matches(&record("01/01/2024", "ANA", Status::Ok)));
        assert!(criteria.matches(&record("01/01/2024", "Juliana", Status::Ok)));
        assert!(!criteria.matches(&record("01/01/2024", "Bruno", Status::Ok)));
    }

    #[test]
    fn blank_name_counts_as_absent() {
        let criteria = FilterCriteria::default().with_name("  ");
        assert_eq!(criteria.name, None);
        assert!(criteria.matches(&record("01/01/2024", "Bruno", Status::Ok)));
    }

    #[test]
    fn all_fields_must_match() {
        let criteria = FilterCriteria::default()
            .with_name("ana")
            .with_status(Status::Fail);
        assert!(criteria.matches(&record("01/01/2024", "Ana", Status::Fail)));
        assert!(!criteria.matches(&record("01/01/2024", "Ana", Status::Ok)));
        assert!(!criteria.matches(&record("01/01/2024", "Bruno", Status::Fail)));
    }
}
