use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A user-defined training block: a date range plus the routines trained
/// in it.
///
/// Plans reference routines by UUID (live lookup) rather than embedding
/// routine data. Routines are externally sourced and may be deleted and
/// recreated remotely, so the references are deliberately soft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodiqPlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// First day of the plan, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the plan, inclusive. Invariant: `start_date <= end_date`.
    pub end_date: NaiveDate,
    /// Routine references in first-seen order, deduplicated at write time.
    pub routine_uuids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PeriodiqPlan {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            start_date,
            end_date,
            routine_uuids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_routines(mut self, routine_uuids: Vec<Uuid>) -> Self {
        self.routine_uuids = routine_uuids;
        self
    }
}

impl fmt::Display for PeriodiqPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        if let Some(description) = &self.description {
            writeln!(f, "{}", description)?;
        }
        writeln!(f, "From: {}", self.start_date)?;
        writeln!(f, "To:   {}", self.end_date)?;
        writeln!(f, "Routines: {}", self.routine_uuids.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_plan() {
        let plan = PeriodiqPlan::new("Block 1", date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(plan.name, "Block 1");
        assert!(plan.description.is_none());
        assert!(plan.routine_uuids.is_empty());
    }

    #[test]
    fn test_display_includes_range() {
        let plan = PeriodiqPlan::new("Block 1", date(2024, 1, 1), date(2024, 1, 31))
            .with_description("Strength");
        let rendered = plan.to_string();
        assert!(rendered.contains("Block 1"));
        assert!(rendered.contains("Strength"));
        assert!(rendered.contains("2024-01-01"));
    }
}
