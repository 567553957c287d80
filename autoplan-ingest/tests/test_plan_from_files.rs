use autoplan_core::{autoplan, detect_conflicts, PlanningOptions};
use autoplan_ingest::{load_snapshot_json, parse_busy, BusyFormat};
use chrono::NaiveDate;
use chrono_tz::Tz;

const SNAPSHOT: &str = r#"{
  "tasks": [
    {
      "id": "essay",
      "title": "Draft essay",
      "category": "school",
      "priority": "high",
      "estimatedMinutes": 90,
      "deadlineAt": "2026-03-04T23:00:00Z",
      "createdAt": "2026-02-25T10:00:00Z"
    },
    {
      "id": "slides",
      "title": "Club slides",
      "category": "club",
      "priority": "medium",
      "estimatedMinutes": 60,
      "sourceOrgId": "robotics",
      "dependsOnTaskIds": ["essay"],
      "createdAt": "2026-02-26T10:00:00Z"
    },
    {
      "id": "gym",
      "title": "Gym",
      "category": "personal",
      "priority": "low",
      "estimatedMinutes": 60,
      "plannedDate": "2026-03-02",
      "isDateLocked": true,
      "createdAt": "2026-02-20T10:00:00Z"
    }
  ]
}"#;

const CALENDAR: &str = "BEGIN:VCALENDAR
BEGIN:VEVENT
DTSTART:20260302T130000Z
DTEND:20260302T140000Z
SUMMARY:Seminar
END:VEVENT
END:VCALENDAR
";

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

#[test]
fn snapshot_plus_calendar_feeds_autoplan() {
    let snap = load_snapshot_json(SNAPSHOT).unwrap();
    let busy = parse_busy(CALENDAR, BusyFormat::Ics, Tz::UTC).unwrap();
    assert_eq!(busy.len(), 1);

    let opts = PlanningOptions::default();
    let out = autoplan(&snap.tasks, &busy, &opts, monday());

    // Monday: 120 capacity - 60 gym - 60 seminar = 0, so the essay moves to Tuesday.
    let essay = out.tasks.iter().find(|t| t.id == "essay").unwrap();
    assert_eq!(essay.planned_date, NaiveDate::from_ymd_opt(2026, 3, 3));

    // Tuesday keeps 30 minutes after the essay, so the slides land on Wednesday.
    let slides = out.tasks.iter().find(|t| t.id == "slides").unwrap();
    assert_eq!(slides.planned_date, NaiveDate::from_ymd_opt(2026, 3, 4));
    assert_eq!(out.scheduled_count, 2);

    let gym = out.tasks.iter().find(|t| t.id == "gym").unwrap();
    assert_eq!(gym, snap.task("gym").unwrap());

    assert!(detect_conflicts(&out.tasks, &opts).is_empty());
}

#[test]
fn dependency_filter_holds_back_blocked_tasks() {
    let snap = load_snapshot_json(SNAPSHOT).unwrap();
    let busy = parse_busy(CALENDAR, BusyFormat::Ics, Tz::UTC).unwrap();
    let opts = PlanningOptions::default().with_respect_dependencies(true);
    let out = autoplan(&snap.tasks, &busy, &opts, monday());

    // Slides wait for the essay to be done.
    let slides = out.tasks.iter().find(|t| t.id == "slides").unwrap();
    assert_eq!(slides.planned_date, None);
    assert_eq!(out.scheduled_count, 1);
}

#[test]
fn planned_snapshot_round_trips_through_json() {
    let snap = load_snapshot_json(SNAPSHOT).unwrap();
    let json = snap.to_json_pretty().unwrap();
    assert!(json.contains("\"dependsOnTaskIds\""));
    assert_eq!(load_snapshot_json(&json).unwrap(), snap);
}
