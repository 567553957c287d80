//! Task model shared by the dependency graph, the scheduler and the conflict detector.
//!
//! Tasks are plain value snapshots. Every engine operation takes them by
//! reference and hands back new values; nothing here is persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stable task identifier.
pub type TaskId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    School,
    Work,
    Club,
    Personal,
}

/// Task priority. Variants are declared low to high so the derived `Ord`
/// sorts `High` as the greatest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// 3 for high, 2 for medium, 1 for low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// Core task type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub category: Category,
    pub priority: Priority,

    /// Minutes. `None` or zero means "not estimated".
    #[serde(default)]
    pub estimated_minutes: Option<u32>,

    /// Optional hard deadline (UTC).
    #[serde(default)]
    pub deadline_at: Option<DateTime<Utc>>,

    /// Calendar day the task is planned for.
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,

    /// Explicit start time, used for overlap detection.
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,

    /// Locked tasks keep their `planned_date` no matter what the scheduler wants.
    #[serde(default)]
    pub is_date_locked: bool,

    /// Prerequisites, in insertion order, without duplicates.
    #[serde(default)]
    pub depends_on_task_ids: Vec<TaskId>,

    #[serde(default)]
    pub is_done: bool,

    /// Manual ordering within a list view.
    #[serde(default)]
    pub sort_order: Option<i32>,

    /// Organization the task came from; `None` for personal tasks.
    #[serde(default)]
    pub source_org_id: Option<String>,

    /// Creation time; ties in scheduling go to the older task.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: Category::Personal,
            priority: Priority::Medium,
            estimated_minutes: None,
            deadline_at: None,
            planned_date: None,
            start_at: None,
            is_date_locked: false,
            depends_on_task_ids: Vec::new(),
            is_done: false,
            sort_order: None,
            source_org_id: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline_at = Some(deadline);
        self
    }

    pub fn with_planned_date(mut self, date: NaiveDate) -> Self {
        self.planned_date = Some(date);
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start_at = Some(start);
        self
    }

    pub fn locked(mut self) -> Self {
        self.is_date_locked = true;
        self
    }

    pub fn done(mut self) -> Self {
        self.is_done = true;
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.depends_on_task_ids.contains(&id) {
            self.depends_on_task_ids.push(id);
        }
        self
    }

    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.source_org_id = Some(org_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Estimate in minutes, treating a missing estimate as zero.
    pub fn minutes(&self) -> u32 {
        self.estimated_minutes.unwrap_or(0)
    }

    /// True when the task carries a usable (positive) estimate.
    pub fn has_estimate(&self) -> bool {
        self.minutes() > 0
    }

    /// End of the explicit time window, if the task has one.
    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        let start = self.start_at?;
        Some(start + chrono::Duration::minutes(i64::from(self.minutes())))
    }
}
