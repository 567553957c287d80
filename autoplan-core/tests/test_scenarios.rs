use autoplan_core::{
    autoplan, can_start, detect_conflicts, try_add_dependency, unlocked_tasks, ConflictSeverity,
    PlanningOptions, Task,
};
use chrono::{NaiveDate, TimeZone, Utc};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// Daily capacity 120, three 60-minute tasks due within two days.
#[test]
fn scenario_a_fills_first_day_then_second() {
    let due = Utc.with_ymd_and_hms(2026, 3, 3, 18, 0, 0).unwrap();
    let tasks: Vec<Task> = (1..=3)
        .map(|i| Task::new(format!("t{i}"), format!("Task {i}")).with_estimate(60).with_deadline(due))
        .collect();

    let opts = PlanningOptions::default().with_daily_capacity(120);
    let out = autoplan(&tasks, &[], &opts, monday());

    assert_eq!(out.scheduled_count, 3);
    let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
    let planned: Vec<_> = out.tasks.iter().map(|t| t.planned_date).collect();
    assert_eq!(planned, vec![Some(monday()), Some(monday()), Some(tuesday)]);
    assert!(out.unscheduled.is_empty());
}

/// A depends on B; completing B unlocks A.
#[test]
fn scenario_b_completion_unlocks_dependent() {
    let mut tasks = vec![Task::new("a", "A").depends_on("b"), Task::new("b", "B")];
    assert!(!can_start(&tasks[0], &tasks));

    tasks[1].is_done = true;
    let unlocked = unlocked_tasks("b", &tasks);
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].id, "a");
    assert!(can_start(&tasks[0], &tasks));
}

/// A depends on B; making B depend on A is rejected and nothing changes.
#[test]
fn scenario_c_reverse_edge_is_circular() {
    let tasks = vec![Task::new("a", "A").depends_on("b"), Task::new("b", "B")];
    let before = tasks.clone();

    let err = try_add_dependency("b", "a", &tasks).unwrap_err();
    assert_eq!(err.task_id, "b");
    assert_eq!(err.dependency_id, "a");
    assert_eq!(tasks, before);
}

/// Two tasks on the same day with intersecting windows give one overlap.
#[test]
fn scenario_d_single_overlap_conflict() {
    let tasks = vec![
        Task::new("x", "Study")
            .with_planned_date(monday())
            .with_start(Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap())
            .with_estimate(60),
        Task::new("y", "Meeting")
            .with_planned_date(monday())
            .with_start(Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap())
            .with_estimate(30),
    ];

    let conflicts = detect_conflicts(&tasks, &PlanningOptions::default());
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].severity, ConflictSeverity::Overlap);
    assert_eq!(conflicts[0].task_ids, vec!["x", "y"]);
}

#[test]
fn conflicts_can_run_before_and_after_autoplan() {
    let tasks = vec![
        Task::new("fixed", "Fixed").with_estimate(100).with_planned_date(monday()).locked(),
        Task::new("new", "New").with_estimate(60),
    ];
    let opts = PlanningOptions::default().with_daily_capacity(120);

    assert!(detect_conflicts(&tasks, &opts).is_empty());
    let out = autoplan(&tasks, &[], &opts, monday());
    assert!(detect_conflicts(&out.tasks, &opts).is_empty());
    assert_ne!(out.tasks[1].planned_date, Some(monday()));
}
