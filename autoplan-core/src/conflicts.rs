//! ConflictDetector: read-only scan for overlapping or overloaded days.
//!
//! Only open tasks with a positive estimate take part. Each task lands on one
//! calendar day: its planned date, else the day of its explicit start, else
//! the day of its deadline (so deadline pressure still shows up).

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeBounds;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::options::PlanningOptions;
use crate::task::{Task, TaskId};
use crate::time::local_date;

/// What kind of conflict was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    /// Two explicit time windows intersect.
    Overlap,
    /// A day holds more estimated minutes than its capacity.
    Overload,
}

/// Escalation level, ordered warning < severe < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictLevel {
    Warning,
    Severe,
    Critical,
}

impl ConflictLevel {
    /// 2 tasks: warning. 3+: severe, or critical when at least two are high priority.
    fn for_tasks(tasks: &[&Task]) -> Self {
        if tasks.len() < 3 {
            return ConflictLevel::Warning;
        }
        let high = tasks
            .iter()
            .filter(|t| t.priority == crate::task::Priority::High)
            .count();
        if high >= 2 {
            ConflictLevel::Critical
        } else {
            ConflictLevel::Severe
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConflictLevel::Warning => "warning",
            ConflictLevel::Severe => "severe",
            ConflictLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub task_ids: Vec<TaskId>,
    pub severity: ConflictSeverity,
    pub level: ConflictLevel,
    pub description: String,
    /// Empty for purely personal conflicts.
    pub involved_organizations: BTreeSet<String>,
    pub day: NaiveDate,
    /// Shared interval, for overlaps.
    pub window: Option<TimeWindow>,
    /// Planned minutes on the day, for overloads.
    pub total_minutes: Option<u64>,
    pub capacity_minutes: Option<u32>,
}

impl Conflict {
    pub fn is_personal(&self) -> bool {
        self.involved_organizations.is_empty()
    }

    pub fn involves(&self, task_id: &str) -> bool {
        self.task_ids.iter().any(|id| id == task_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    capacity_minutes: u32,
    tz: Tz,
}

impl ConflictDetector {
    pub fn new(options: &PlanningOptions) -> Self {
        Self {
            capacity_minutes: options.daily_capacity(),
            tz: options.timezone,
        }
    }

    /// Conflicts ordered by day; a day's overlaps come before its overload.
    pub fn detect(&self, tasks: &[Task]) -> Vec<Conflict> {
        self.scan(tasks, ..)
    }

    /// Like `detect`, restricted to days in `[from, to)`.
    pub fn detect_between(&self, tasks: &[Task], from: NaiveDate, to: NaiveDate) -> Vec<Conflict> {
        if to <= from {
            return Vec::new();
        }
        self.scan(tasks, from..to)
    }

    pub fn detect_on(&self, tasks: &[Task], day: NaiveDate) -> Vec<Conflict> {
        self.scan(tasks, day..=day)
    }

    /// The seven days starting at `week_start`.
    pub fn detect_week(&self, tasks: &[Task], week_start: NaiveDate) -> Vec<Conflict> {
        self.scan(tasks, week_start..week_start + Duration::days(7))
    }

    /// Conflicts that would involve `new_task` if it were added to `existing`.
    pub fn check_insertion(&self, new_task: &Task, existing: &[Task]) -> Vec<Conflict> {
        let mut all: Vec<Task> = existing
            .iter()
            .filter(|t| t.id != new_task.id)
            .cloned()
            .collect();
        all.push(new_task.clone());

        self.detect(&all)
            .into_iter()
            .filter(|c| c.involves(&new_task.id))
            .collect()
    }

    fn scan(&self, tasks: &[Task], days: impl RangeBounds<NaiveDate>) -> Vec<Conflict> {
        let mut by_day: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
        for t in tasks.iter().filter(|t| !t.is_done && t.has_estimate()) {
            if let Some(day) = self.day_of(t) {
                by_day.entry(day).or_default().push(t);
            }
        }

        let mut out = Vec::new();
        let mut scanned = 0;
        for (day, day_tasks) in by_day.range(days) {
            scanned += 1;
            self.overlaps(*day, day_tasks, &mut out);
            if let Some(c) = self.overload(*day, day_tasks) {
                out.push(c);
            }
        }

        info!(conflicts = out.len(), days = scanned, "conflict scan finished");
        out
    }

    fn day_of(&self, t: &Task) -> Option<NaiveDate> {
        t.planned_date
            .or_else(|| t.start_at.map(|s| local_date(s, self.tz)))
            .or_else(|| t.deadline_at.map(|d| local_date(d, self.tz)))
    }

    fn overlaps(&self, day: NaiveDate, tasks: &[&Task], out: &mut Vec<Conflict>) {
        let timed: Vec<(&Task, DateTime<Utc>, DateTime<Utc>)> = tasks
            .iter()
            .filter_map(|t| Some((*t, t.start_at?, t.end_at()?)))
            .collect();

        for (i, (a, a_start, a_end)) in timed.iter().enumerate() {
            for (b, b_start, b_end) in &timed[i + 1..] {
                if !(a_start < b_end && b_start < a_end) {
                    continue;
                }
                let window = TimeWindow {
                    start: *a_start.max(b_start),
                    end: *a_end.min(b_end),
                };
                let pair = [*a, *b];
                out.push(Conflict {
                    task_ids: vec![a.id.clone(), b.id.clone()],
                    severity: ConflictSeverity::Overlap,
                    level: ConflictLevel::for_tasks(&pair),
                    description: format!(
                        "\"{}\" and \"{}\" overlap on {} from {} to {}",
                        a.title,
                        b.title,
                        day,
                        window.start.with_timezone(&self.tz).format("%H:%M"),
                        window.end.with_timezone(&self.tz).format("%H:%M"),
                    ),
                    involved_organizations: organizations(&pair),
                    day,
                    window: Some(window),
                    total_minutes: None,
                    capacity_minutes: None,
                });
            }
        }
    }

    fn overload(&self, day: NaiveDate, tasks: &[&Task]) -> Option<Conflict> {
        let total: u64 = tasks.iter().map(|t| u64::from(t.minutes())).sum();
        if total <= u64::from(self.capacity_minutes) {
            return None;
        }

        Some(Conflict {
            task_ids: tasks.iter().map(|t| t.id.clone()).collect(),
            severity: ConflictSeverity::Overload,
            level: ConflictLevel::for_tasks(tasks),
            description: format!(
                "{} is overloaded: {} of {} minutes planned across {} task(s)",
                day,
                total,
                self.capacity_minutes,
                tasks.len()
            ),
            involved_organizations: organizations(tasks),
            day,
            window: None,
            total_minutes: Some(total),
            capacity_minutes: Some(self.capacity_minutes),
        })
    }
}

fn organizations(tasks: &[&Task]) -> BTreeSet<String> {
    tasks
        .iter()
        .filter_map(|t| t.source_org_id.clone())
        .collect()
}

/// Scan `tasks` using the capacity and timezone from `options`.
pub fn detect_conflicts(tasks: &[Task], options: &PlanningOptions) -> Vec<Conflict> {
    ConflictDetector::new(options).detect(tasks)
}

/// One-line summary, e.g. "3 conflicts: 1 critical, 2 warning".
pub fn conflict_summary(conflicts: &[Conflict]) -> String {
    if conflicts.is_empty() {
        return "No time conflicts".to_string();
    }

    let parts: Vec<String> = [ConflictLevel::Critical, ConflictLevel::Severe, ConflictLevel::Warning]
        .into_iter()
        .filter_map(|level| {
            let n = conflicts.iter().filter(|c| c.level == level).count();
            (n > 0).then(|| format!("{n} {}", level.label()))
        })
        .collect();

    let noun = if conflicts.len() == 1 { "conflict" } else { "conflicts" };
    format!("{} {}: {}", conflicts.len(), noun, parts.join(", "))
}

/// Resolution hints for one conflict; `tasks` resolves its ids.
pub fn suggestions(conflict: &Conflict, tasks: &[Task]) -> Vec<String> {
    let mut involved: Vec<&Task> = conflict
        .task_ids
        .iter()
        .filter_map(|id| tasks.iter().find(|t| &t.id == id))
        .collect();

    // most important first: priority desc, then earliest deadline
    involved.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then_with(|| match (a.deadline_at, b.deadline_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
    });

    let mut out = Vec::new();

    if let Some(lowest) = involved.last() {
        let target = match conflict.severity {
            ConflictSeverity::Overlap => "another time",
            ConflictSeverity::Overload => "another day",
        };
        out.push(format!("Consider moving \"{}\" to {}", lowest.title, target));
    }

    if conflict.involved_organizations.len() > 1 {
        out.push(format!(
            "These tasks come from {} organizations; coordinate with the people in charge",
            conflict.involved_organizations.len()
        ));
    }

    if let Some(longest) = involved.iter().max_by_key(|t| t.minutes()) {
        if longest.minutes() > 60 {
            out.push(format!(
                "Re-check the estimate for \"{}\" ({} minutes)",
                longest.title,
                longest.minutes()
            ));
        }
    }

    out
}
