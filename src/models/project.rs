//! Project model
//!
//! A development or construction effort, usually attached to an asset.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AssetId, ProjectId};
use super::money::Money;

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    UnderReview,
    Approved,
    Construction,
    Completed,
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    /// Statuses counted as "active" on the dashboard
    pub const ACTIVE: [ProjectStatus; 3] = [Self::Planning, Self::UnderReview, Self::Construction];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Construction => "construction",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "planning" => Some(Self::Planning),
            "under_review" | "review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "construction" | "in_construction" => Some(Self::Construction),
            "completed" | "complete" | "done" => Some(Self::Completed),
            "on_hold" | "hold" => Some(Self::OnHold),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Planning => "Planning",
            Self::UnderReview => "Under Review",
            Self::Approved => "Approved",
            Self::Construction => "Construction",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Cancelled => "Cancelled",
        };
        f.pad(label)
    }
}

impl_sql_text!(ProjectStatus);

/// A tracked development effort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,

    /// Owning asset, if any
    pub asset_id: Option<AssetId>,

    pub name: String,

    /// Short project code (e.g., "SC-2025-01")
    pub code: Option<String>,

    pub project_type: Option<String>,

    pub status: ProjectStatus,

    pub budget: Money,

    /// Recorded actual cost to date
    pub actual_cost: Money,

    pub contingency: Money,

    /// Reported completion, 0-100
    pub completion_percentage: f64,

    pub start_date: Option<NaiveDate>,

    pub expected_completion: Option<NaiveDate>,

    pub actual_start_date: Option<NaiveDate>,

    pub actual_completion_date: Option<NaiveDate>,

    pub description: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new, unsaved project
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::default(),
            asset_id: None,
            name: name.into(),
            code: None,
            project_type: None,
            status: ProjectStatus::default(),
            budget: Money::zero(),
            actual_cost: Money::zero(),
            contingency: Money::zero(),
            completion_percentage: 0.0,
            start_date: None,
            expected_completion: None,
            actual_start_date: None,
            actual_completion_date: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective start: actual start wins over the planned one
    pub fn effective_start(&self) -> Option<NaiveDate> {
        self.actual_start_date.or(self.start_date)
    }

    /// Effective end: actual completion wins over the expected one
    pub fn effective_end(&self) -> Option<NaiveDate> {
        self.actual_completion_date.or(self.expected_completion)
    }

    /// Completion estimated from elapsed time between start and end dates
    ///
    /// Missing dates give 0. On or past the end date gives 100.
    pub fn timeline_completion(&self, today: NaiveDate) -> f64 {
        let (Some(start), Some(end)) = (self.effective_start(), self.effective_end()) else {
            return 0.0;
        };

        if today >= end {
            return 100.0;
        }

        let total_days = (end - start).num_days();
        if total_days <= 0 {
            return 0.0;
        }

        let elapsed = (today - start).num_days() as f64;
        (elapsed / total_days as f64 * 100.0).clamp(0.0, 100.0)
    }

    /// Validate the project
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }

        if self.name.len() > 200 {
            return Err(ProjectValidationError::NameTooLong(self.name.len()));
        }

        if self.budget.is_negative() || self.contingency.is_negative() || self.actual_cost.is_negative()
        {
            return Err(ProjectValidationError::NegativeAmount);
        }

        if !(0.0..=100.0).contains(&self.completion_percentage) {
            return Err(ProjectValidationError::CompletionOutOfRange(
                self.completion_percentage,
            ));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.expected_completion) {
            if end < start {
                return Err(ProjectValidationError::EndBeforeStart);
            }
        }

        Ok(())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}]", self.name, code),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Validation errors for projects
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeAmount,
    CompletionOutOfRange(f64),
    EndBeforeStart,
}

impl fmt::Display for ProjectValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Project name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Project name too long ({} chars, max 200)", len),
            Self::NegativeAmount => {
                write!(f, "Budget, actual cost and contingency cannot be negative")
            }
            Self::CompletionOutOfRange(pct) => {
                write!(f, "Completion must be between 0 and 100 (got {})", pct)
            }
            Self::EndBeforeStart => write!(f, "Expected completion is before the start date"),
        }
    }
}

impl std::error::Error for ProjectValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_timeline_completion_missing_dates() {
        let project = Project::new("Stage 1");
        assert_eq!(project.timeline_completion(date(2025, 6, 1)), 0.0);
    }

    #[test]
    fn test_timeline_completion_midway() {
        let mut project = Project::new("Stage 1");
        project.start_date = Some(date(2025, 1, 1));
        project.expected_completion = Some(date(2025, 1, 11));
        let pct = project.timeline_completion(date(2025, 1, 6));
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_timeline_completion_past_end_and_before_start() {
        let mut project = Project::new("Stage 1");
        project.start_date = Some(date(2025, 1, 1));
        project.expected_completion = Some(date(2025, 12, 31));
        assert_eq!(project.timeline_completion(date(2026, 3, 1)), 100.0);
        assert_eq!(project.timeline_completion(date(2024, 12, 1)), 0.0);
    }

    #[test]
    fn test_actual_dates_win() {
        let mut project = Project::new("Stage 1");
        project.start_date = Some(date(2025, 1, 1));
        project.expected_completion = Some(date(2025, 12, 31));
        project.actual_completion_date = Some(date(2025, 6, 30));
        assert_eq!(project.timeline_completion(date(2025, 7, 1)), 100.0);
    }

    #[test]
    fn test_validation() {
        let mut project = Project::new("Warehouse fit-out");
        assert!(project.validate().is_ok());

        project.completion_percentage = 120.0;
        assert!(matches!(
            project.validate(),
            Err(ProjectValidationError::CompletionOutOfRange(_))
        ));

        project.completion_percentage = 10.0;
        project.start_date = Some(date(2025, 5, 1));
        project.expected_completion = Some(date(2025, 4, 1));
        assert_eq!(project.validate(), Err(ProjectValidationError::EndBeforeStart));
    }

    #[test]
    fn test_status_active() {
        assert!(ProjectStatus::Construction.is_active());
        assert!(ProjectStatus::UnderReview.is_active());
        assert!(!ProjectStatus::Completed.is_active());
        assert_eq!(ProjectStatus::parse("On Hold"), Some(ProjectStatus::OnHold));
    }
}
