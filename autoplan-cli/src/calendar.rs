use std::collections::BTreeMap;

use autoplan_core::time::start_of_day;
use autoplan_core::{Task, TaskId};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

/// Block length for tasks planned without an estimate.
const UNESTIMATED_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub task_id: TaskId,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// Lay planned tasks out as back-to-back timeblocks.
///
/// Tasks with a concrete `start_at` keep it. The rest are stacked per day
/// from `day_start_hour` local time, highest priority first, never starting
/// before the end of the previous block.
pub fn planned_timeblocks(tasks: &[Task], tz: Tz, day_start_hour: u32) -> Vec<CalendarEvent> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for t in tasks.iter().filter(|t| !t.is_done) {
        if let Some(day) = t.planned_date {
            by_day.entry(day).or_default().push(t);
        }
    }

    let mut events = Vec::new();
    for (day, mut day_tasks) in by_day {
        day_tasks.sort_by(|a, b| {
            a.start_at
                .is_none()
                .cmp(&b.start_at.is_none())
                .then_with(|| a.start_at.cmp(&b.start_at))
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.sort_order.unwrap_or(i32::MAX).cmp(&b.sort_order.unwrap_or(i32::MAX)))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut cursor = start_of_day(day, tz) + Duration::hours(day_start_hour.min(23).into());
        for t in day_tasks {
            let minutes = if t.has_estimate() {
                i64::from(t.minutes())
            } else {
                UNESTIMATED_MINUTES
            };
            let start = t.start_at.unwrap_or(cursor);
            let end = start + Duration::minutes(minutes);
            cursor = cursor.max(end);

            events.push(CalendarEvent {
                task_id: t.id.clone(),
                start_utc: start,
                end_utc: end,
                summary: t.title.clone(),
                description: format!(
                    "TaskId: {}\nCategory: {:?}\nPriority: {:?}\nPlanned: {}\n",
                    t.id, t.category, t.priority, day
                ),
            });
        }
    }

    events
}

/// Emit a minimal ICS calendar with one VEVENT per block, times in UTC.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Autoplan//EN\r\n");

    for e in events {
        s.push_str("BEGIN:VEVENT\r\n");
        s.push_str(&format!("UID:{}@autoplan\r\n", escape_ics(&e.task_id)));
        s.push_str(&format!("DTSTART:{}\r\n", e.start_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("DTEND:{}\r\n", e.end_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("SUMMARY:{}\r\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\r\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\r\n");
    }

    s.push_str("END:VCALENDAR\r\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
