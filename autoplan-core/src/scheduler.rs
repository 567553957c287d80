//! CapacityScheduler: greedy first-fit placement of unscheduled tasks onto
//! workdays of a fixed planning horizon.
//!
//! Algorithm (deterministic, single pass):
//! 1) partition: done or locked+planned tasks are fixed; not-done, unlocked,
//!    unplanned tasks with a positive estimate are eligible
//! 2) horizon: `horizon_days` calendar days from `today`, workdays only
//! 3) per-day remaining = daily capacity - planned estimates - busy minutes
//! 4) rank eligible: priority DESC, has-deadline first, deadline ASC,
//!    created_at ASC, input position ASC
//! 5) first day (chronological) that fits and is not after the deadline's date
//!
//! Tasks that fit nowhere stay unplanned; that is an outcome, not an error.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::busy::{busy_minutes_on, BusyTimeBlock};
use crate::graph::DependencyGraph;
use crate::options::PlanningOptions;
use crate::task::{Task, TaskId};
use crate::time::local_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// Some prerequisite is not done yet.
    Blocked,
    /// Deadline falls before the first day of the horizon.
    DeadlineBeforeHorizon,
    /// Estimate is larger than a whole day's capacity.
    ExceedsDailyCapacity,
    /// No horizon day on or before the deadline has enough room left.
    NoFittingDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unscheduled {
    pub task_id: TaskId,
    pub reason: UnscheduledReason,
}

/// Committed load of one horizon day after planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLoad {
    pub date: NaiveDate,
    pub capacity_minutes: u32,
    /// Planned task estimates plus busy minutes.
    pub committed_minutes: i64,
}

impl DayLoad {
    pub fn remaining_minutes(&self) -> i64 {
        i64::from(self.capacity_minutes) - self.committed_minutes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoplanOutcome {
    /// Full snapshot; only newly placed tasks differ from the input.
    pub tasks: Vec<Task>,
    pub scheduled_count: usize,
    /// Newly planned tasks in placement order.
    pub placements: Vec<(TaskId, NaiveDate)>,
    pub unscheduled: Vec<Unscheduled>,
    pub day_loads: Vec<DayLoad>,
}

#[derive(Debug, Clone)]
pub struct CapacityScheduler {
    options: PlanningOptions,
}

impl CapacityScheduler {
    pub fn new(options: PlanningOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PlanningOptions {
        &self.options
    }

    pub fn plan(&self, tasks: &[Task], busy: &[BusyTimeBlock], today: NaiveDate) -> AutoplanOutcome {
        let opts = &self.options;
        let tz = opts.timezone;
        let capacity = i64::from(opts.daily_capacity());
        let days = opts.horizon(today);

        let mut planned: HashMap<NaiveDate, i64> = HashMap::new();
        for t in tasks {
            if let Some(date) = t.planned_date {
                *planned.entry(date).or_default() += i64::from(t.minutes());
            }
        }

        let mut committed: Vec<i64> = days
            .iter()
            .map(|d| planned.get(d).copied().unwrap_or(0) + busy_minutes_on(busy, *d, tz))
            .collect();

        let graph = DependencyGraph::new(tasks);
        let mut unscheduled = Vec::new();

        let mut candidates: Vec<(usize, &Task)> = Vec::new();
        for (i, t) in tasks.iter().enumerate() {
            if !is_eligible(t) {
                continue;
            }
            if opts.respect_dependencies && !graph.can_start(t) {
                debug!(task_id = %t.id, "skipping blocked task");
                unscheduled.push(Unscheduled {
                    task_id: t.id.clone(),
                    reason: UnscheduledReason::Blocked,
                });
                continue;
            }
            candidates.push((i, t));
        }

        candidates.sort_by(|(ia, a), (ib, b)| {
            // priority desc
            b.priority
                .cmp(&a.priority)
                // deadline present first, then earliest deadline
                .then_with(|| match (a.deadline_at, b.deadline_at) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                // creation order
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| ia.cmp(ib))
        });

        let mut assigned: HashMap<usize, NaiveDate> = HashMap::new();
        let mut placements = Vec::new();

        for (i, task) in candidates {
            let minutes = i64::from(task.minutes());
            let deadline_date = task.deadline_at.map(|d| local_date(d, tz));

            let slot = days.iter().enumerate().find(|(di, day)| {
                deadline_date.is_none_or(|dl| **day <= dl) && capacity - committed[*di] >= minutes
            });

            match slot {
                Some((di, day)) => {
                    committed[di] += minutes;
                    assigned.insert(i, *day);
                    placements.push((task.id.clone(), *day));
                    debug!(task_id = %task.id, %day, minutes, "placed task");
                }
                None => {
                    let reason = if minutes > capacity {
                        UnscheduledReason::ExceedsDailyCapacity
                    } else if matches!((deadline_date, days.first()), (Some(dl), Some(first)) if dl < *first)
                    {
                        UnscheduledReason::DeadlineBeforeHorizon
                    } else {
                        UnscheduledReason::NoFittingDay
                    };
                    debug!(task_id = %task.id, ?reason, "left unscheduled");
                    unscheduled.push(Unscheduled {
                        task_id: task.id.clone(),
                        reason,
                    });
                }
            }
        }

        let scheduled_count = assigned.len();
        let updated: Vec<Task> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| match assigned.get(&i) {
                Some(day) => {
                    let mut t = t.clone();
                    t.planned_date = Some(*day);
                    t
                }
                None => t.clone(),
            })
            .collect();

        let day_loads = days
            .iter()
            .zip(committed)
            .map(|(date, committed_minutes)| DayLoad {
                date: *date,
                capacity_minutes: opts.daily_capacity(),
                committed_minutes,
            })
            .collect();

        info!(
            scheduled = scheduled_count,
            unscheduled = unscheduled.len(),
            horizon_days = days.len(),
            "autoplan finished"
        );

        AutoplanOutcome {
            tasks: updated,
            scheduled_count,
            placements,
            unscheduled,
            day_loads,
        }
    }
}

/// Plan `tasks` against `busy` with the given options, starting at `today`.
pub fn autoplan(
    tasks: &[Task],
    busy: &[BusyTimeBlock],
    options: &PlanningOptions,
    today: NaiveDate,
) -> AutoplanOutcome {
    CapacityScheduler::new(options.clone()).plan(tasks, busy, today)
}

fn is_eligible(t: &Task) -> bool {
    !t.is_done && !t.is_date_locked && t.planned_date.is_none() && t.has_estimate()
}

/// Sum of estimates planned on `date`.
pub fn daily_duration(tasks: &[Task], date: NaiveDate) -> u64 {
    tasks
        .iter()
        .filter(|t| t.planned_date == Some(date))
        .map(|t| u64::from(t.minutes()))
        .sum()
}

pub fn is_overloaded(tasks: &[Task], date: NaiveDate, capacity: u32) -> bool {
    daily_duration(tasks, date) > u64::from(capacity)
}

/// Planned minutes for the seven days starting at `week_start`.
pub fn weekly_load(tasks: &[Task], week_start: NaiveDate) -> [u64; 7] {
    let mut loads = [0u64; 7];
    for (i, load) in loads.iter_mut().enumerate() {
        *load = daily_duration(tasks, week_start + Duration::days(i as i64));
    }
    loads
}
