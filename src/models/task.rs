//! Project task (WBS) model
//!
//! Schedule lines for a project. Tasks form a tree through `parent_task_id`
//! and reference earlier work through `predecessors`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ProjectId, TaskId};
use super::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Delayed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Delayed => "delayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "not_started" | "pending" => Some(Self::NotStarted),
            "in_progress" | "started" | "active" => Some(Self::InProgress),
            "completed" | "complete" | "done" => Some(Self::Completed),
            "on_hold" | "hold" => Some(Self::OnHold),
            "delayed" | "late" => Some(Self::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::OnHold => "On Hold",
            Self::Delayed => "Delayed",
        })
    }
}

impl_sql_text!(TaskStatus);

/// How a task relates to its predecessors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-start
    #[default]
    FS,
    /// Start-to-start
    SS,
    /// Finish-to-finish
    FF,
    /// Start-to-finish
    SF,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FS => "FS",
            Self::SS => "SS",
            Self::FF => "FF",
            Self::SF => "SF",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Some(Self::FS),
            "SS" => Some(Self::SS),
            "FF" => Some(Self::FF),
            "SF" => Some(Self::SF),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl_sql_text!(DependencyType);

/// A WBS schedule line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTask {
    pub id: TaskId,

    pub project_id: ProjectId,

    /// Must belong to the same project
    pub parent_task_id: Option<TaskId>,

    /// WBS code (e.g., "1.2.3")
    pub code: Option<String>,

    pub name: String,

    pub description: Option<String>,

    /// Depth in the WBS, 1 for top-level tasks
    pub wbs_level: u32,

    pub sort_order: i32,

    pub start_date: NaiveDate,

    pub finish_date: NaiveDate,

    /// Planned duration in days; derived from the dates when not given
    pub duration_days: i64,

    pub actual_start_date: Option<NaiveDate>,

    pub actual_finish_date: Option<NaiveDate>,

    #[serde(default)]
    pub predecessors: Vec<TaskId>,

    pub dependency_type: DependencyType,

    pub lag_days: i64,

    /// 0-100
    pub completion_percentage: f64,

    pub status: TaskStatus,

    pub contractor: Option<String>,

    pub estimated_cost: Option<Money>,

    pub actual_cost: Option<Money>,

    pub is_critical: bool,

    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ProjectTask {
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        start_date: NaiveDate,
        finish_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::default(),
            project_id,
            parent_task_id: None,
            code: None,
            name: name.into(),
            description: None,
            wbs_level: 1,
            sort_order: 0,
            start_date,
            finish_date,
            duration_days: (finish_date - start_date).num_days(),
            actual_start_date: None,
            actual_finish_date: None,
            predecessors: Vec::new(),
            dependency_type: DependencyType::default(),
            lag_days: 0,
            completion_percentage: 0.0,
            status: TaskStatus::default(),
            contractor: None,
            estimated_cost: None,
            actual_cost: None,
            is_critical: false,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Past its finish date and not yet complete
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.finish_date < today && self.completion_percentage < 100.0
    }

    /// Predecessors as stored in the database ("3,7,12")
    pub fn predecessors_to_text(&self) -> String {
        self.predecessors
            .iter()
            .map(|id| id.get().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse a comma-separated predecessor list; ids may carry their prefix
    pub fn parse_predecessors(text: &str) -> Result<Vec<TaskId>, TaskValidationError> {
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<TaskId>()
                    .map_err(|_| TaskValidationError::InvalidPredecessor(s.to_string()))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.name.trim().is_empty() {
            return Err(TaskValidationError::EmptyName);
        }

        if self.finish_date < self.start_date {
            return Err(TaskValidationError::FinishBeforeStart);
        }

        if !(0.0..=100.0).contains(&self.completion_percentage) {
            return Err(TaskValidationError::CompletionOutOfRange(
                self.completion_percentage,
            ));
        }

        if self.duration_days < 0 {
            return Err(TaskValidationError::NegativeDuration);
        }

        if !self.id.is_unsaved() && self.parent_task_id == Some(self.id) {
            return Err(TaskValidationError::OwnParent);
        }

        if !self.id.is_unsaved() && self.predecessors.contains(&self.id) {
            return Err(TaskValidationError::OwnPredecessor);
        }

        Ok(())
    }
}

impl fmt::Display for ProjectTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} {}", code, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskValidationError {
    EmptyName,
    FinishBeforeStart,
    CompletionOutOfRange(f64),
    NegativeDuration,
    OwnParent,
    OwnPredecessor,
    InvalidPredecessor(String),
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Task name cannot be empty"),
            Self::FinishBeforeStart => write!(f, "Finish date cannot be before start date"),
            Self::CompletionOutOfRange(v) => {
                write!(f, "Completion must be between 0 and 100 (got {})", v)
            }
            Self::NegativeDuration => write!(f, "Duration cannot be negative"),
            Self::OwnParent => write!(f, "A task cannot be its own parent"),
            Self::OwnPredecessor => write!(f, "A task cannot be its own predecessor"),
            Self::InvalidPredecessor(s) => write!(f, "Invalid predecessor id: {}", s),
        }
    }
}

impl std::error::Error for TaskValidationError {}
