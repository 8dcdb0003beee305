use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhive_core::{AppError, AppResult, NonEmptyString, OrganizationId, TaskId, UserId};

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Completed.
    Done,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown task status '{value}'"
            ))),
        }
    }
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Default priority.
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Critical,
}

impl TaskPriority {
    /// Returns a stable storage value for this priority.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(AppError::Validation(format!(
                "unknown task priority '{value}'"
            ))),
        }
    }
}

/// Coarse grouping of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Day-to-day work items.
    Work,
    /// Personal items.
    Personal,
    /// Project deliverables.
    Project,
    /// Meeting follow-ups.
    Meeting,
    /// Anything else.
    Other,
}

impl TaskCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Project => "project",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }
}

impl FromStr for TaskCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "work" => Ok(Self::Work),
            "personal" => Ok(Self::Personal),
            "project" => Ok(Self::Project),
            "meeting" => Ok(Self::Meeting),
            "other" => Ok(Self::Other),
            _ => Err(AppError::Validation(format!(
                "unknown task category '{value}'"
            ))),
        }
    }
}

/// A task owned by exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: NonEmptyString,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    category: TaskCategory,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    assignee_id: Option<UserId>,
    created_by: UserId,
    organization_id: OrganizationId,
}

impl Task {
    /// Creates a new task in `Todo` state with a validated title.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        description: Option<String>,
        created_by: UserId,
        organization_id: OrganizationId,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            title: NonEmptyString::new(title)?,
            description,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            category: TaskCategory::Work,
            due_date: None,
            completed_at: None,
            assignee_id: None,
            created_by,
            organization_id,
        })
    }

    /// Returns the stable task identifier.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &NonEmptyString {
        &self.title
    }

    /// Returns the optional free-form description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> TaskCategory {
        self.category
    }

    /// Returns the optional due date.
    #[must_use]
    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns when the task was completed, if it is done.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the assigned user, if any.
    #[must_use]
    pub fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the creating user.
    #[must_use]
    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the owning organization.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Replaces the title.
    pub fn set_title(&mut self, title: impl Into<String>) -> AppResult<()> {
        self.title = NonEmptyString::new(title)?;
        Ok(())
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Replaces the priority.
    pub fn set_priority(&mut self, priority: TaskPriority) {
        self.priority = priority;
    }

    /// Replaces the category.
    pub fn set_category(&mut self, category: TaskCategory) {
        self.category = category;
    }

    /// Replaces the due date.
    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.due_date = due_date;
    }

    /// Replaces the assignee.
    pub fn set_assignee(&mut self, assignee_id: Option<UserId>) {
        self.assignee_id = assignee_id;
    }

    /// Restores status and completion timestamp verbatim, bypassing the
    /// clock-driven transition logic. Intended for persistence adapters
    /// rehydrating stored rows.
    pub fn restore_status(&mut self, status: TaskStatus, completed_at: Option<DateTime<Utc>>) {
        self.status = status;
        self.completed_at = completed_at;
    }

    /// Moves the task to a new status, maintaining the completion timestamp:
    /// entering `Done` stamps `completed_at`, leaving `Done` clears it.
    pub fn transition(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        let was_done = self.status == TaskStatus::Done;
        let is_done = status == TaskStatus::Done;

        if is_done && !was_done {
            self.completed_at = Some(now);
        } else if !is_done && was_done {
            self.completed_at = None;
        }

        self.status = status;
    }

    /// Returns whether the task is past its due date and not done.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due_date) => self.status != TaskStatus::Done && now > due_date,
            None => false,
        }
    }

    /// Returns whether the task is done.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }
}
