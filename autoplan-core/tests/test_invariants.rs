//! Invariant checks over generated task sets.
//!
//! Inputs come from a fixed-seed generator so failures reproduce exactly.

use std::collections::{HashMap, HashSet};

use autoplan_core::{
    autoplan, busy_minutes_on, try_add_dependency, BusyTimeBlock, DependencyGraph, PlanningOptions, Priority,
    Task,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};

/// xorshift64: tiny, deterministic, good enough for fixtures.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
}

fn generate(seed: u64, n: usize) -> (Vec<Task>, Vec<BusyTimeBlock>) {
    let mut rng = Rng(seed);
    let base = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();
    let mut tasks = Vec::with_capacity(n);

    for i in 0..n {
        let mut t = Task::new(format!("t{i}"), format!("Task {i}"))
            .with_estimate(15 * (1 + rng.below(10) as u32))
            .with_created_at(base - Duration::hours(rng.below(500) as i64))
            .with_priority(match rng.below(3) {
                0 => Priority::Low,
                1 => Priority::Medium,
                _ => Priority::High,
            });
        if rng.below(2) == 0 {
            t = t.with_deadline(base + Duration::hours(rng.below(24 * 16) as i64) - Duration::days(1));
        }
        match rng.below(6) {
            0 => t = t.with_planned_date(today() + Duration::days(rng.below(10) as i64)).locked(),
            1 => t = t.with_planned_date(today() + Duration::days(rng.below(10) as i64)),
            2 => t = t.done(),
            _ => {}
        }
        tasks.push(t);
    }

    let busy = (0..n / 4)
        .map(|_| {
            let start = base + Duration::minutes(rng.below(60 * 24 * 14) as i64);
            BusyTimeBlock::new(start, start + Duration::minutes(15 * (1 + rng.below(8) as i64)))
        })
        .collect();

    (tasks, busy)
}

#[test]
fn capacity_is_never_exceeded_by_new_placements() {
    for seed in 1..=40u64 {
        let (tasks, busy) = generate(seed, 60);
        let opts = PlanningOptions::default().with_daily_capacity(180);
        let out = autoplan(&tasks, &busy, &opts, today());

        for day in opts.horizon(today()) {
            let before: i64 = tasks
                .iter()
                .filter(|t| t.planned_date == Some(day))
                .map(|t| i64::from(t.minutes()))
                .sum::<i64>()
                + busy_minutes_on(&busy, day, opts.timezone);
            let after: i64 = out
                .tasks
                .iter()
                .filter(|t| t.planned_date == Some(day))
                .map(|t| i64::from(t.minutes()))
                .sum::<i64>()
                + busy_minutes_on(&busy, day, opts.timezone);

            if after > before {
                assert!(after <= 180, "seed {seed}: {day} holds {after} minutes");
            }
        }
    }
}

#[test]
fn deadlines_and_locks_are_respected() {
    for seed in 1..=40u64 {
        let (tasks, busy) = generate(seed, 50);
        let opts = PlanningOptions::default();
        let out = autoplan(&tasks, &busy, &opts, today());

        for (before, after) in tasks.iter().zip(&out.tasks) {
            if before.is_date_locked || before.is_done || before.planned_date.is_some() {
                assert_eq!(before, after, "seed {seed}: fixed task {} changed", before.id);
            }
            if let (Some(planned), Some(deadline)) = (after.planned_date, after.deadline_at) {
                if before.planned_date.is_none() {
                    assert!(planned <= deadline.date_naive(), "seed {seed}: {} after deadline", after.id);
                }
            }
        }

        let newly = tasks
            .iter()
            .zip(&out.tasks)
            .filter(|(b, a)| b.planned_date.is_none() && a.planned_date.is_some())
            .count();
        assert_eq!(newly, out.scheduled_count);
    }
}

#[test]
fn autoplan_is_deterministic() {
    let (tasks, busy) = generate(7, 80);
    let opts = PlanningOptions::default().with_weekends(true);
    let first = autoplan(&tasks, &busy, &opts, today());
    let second = autoplan(&tasks, &busy, &opts, today());
    assert_eq!(first, second);
}

#[test]
fn random_edge_sequences_keep_graph_acyclic() {
    for seed in 1..=20u64 {
        let mut rng = Rng(seed);
        let mut tasks: Vec<Task> = (0..25).map(|i| Task::new(format!("n{i}"), format!("N{i}"))).collect();

        for _ in 0..200 {
            let from = format!("n{}", rng.below(25));
            let to = format!("n{}", rng.below(25));
            let before = tasks.clone();
            match try_add_dependency(&from, &to, &tasks) {
                Ok(edge) => edge.apply(&mut tasks),
                Err(_) => assert_eq!(tasks, before),
            }
            assert!(is_acyclic(&tasks), "seed {seed}: cycle after {from} -> {to}");
        }

        // The topological order must list every prerequisite before its dependents.
        let order = DependencyGraph::new(&tasks).topological_order();
        let pos: HashMap<&str, usize> = order.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
        for t in &tasks {
            for dep in &t.depends_on_task_ids {
                assert!(pos[dep.as_str()] < pos[t.id.as_str()]);
            }
        }
    }
}

/// Kahn's algorithm as an independent acyclicity oracle.
fn is_acyclic(tasks: &[Task]) -> bool {
    let mut indegree: HashMap<&str, usize> = tasks.iter().map(|t| (t.id.as_str(), t.depends_on_task_ids.len())).collect();
    let mut ready: Vec<&str> = indegree.iter().filter(|(_, d)| **d == 0).map(|(id, _)| *id).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    while let Some(id) = ready.pop() {
        seen.insert(id);
        for t in tasks.iter().filter(|t| t.depends_on_task_ids.iter().any(|d| d == id)) {
            let d = indegree.get_mut(t.id.as_str()).unwrap();
            *d -= 1;
            if *d == 0 {
                ready.push(t.id.as_str());
            }
        }
    }

    seen.len() == tasks.len()
}
