//! ICS (iCalendar) busy-time parser.
//!
//! Reads VEVENT blocks from a calendar export:
//!   BEGIN:VEVENT
//!   DTSTART;TZID=America/Chicago:20260302T090000
//!   DTEND;TZID=America/Chicago:20260302T103000
//!   SUMMARY:Lecture
//!   END:VEVENT
//!
//! Supported value forms: UTC (`...Z`), floating local time (read in the
//! caller's zone), `TZID=` local time, and all-day `VALUE=DATE` dates.
//! Transparent events are free time and are skipped, as are events without a
//! usable start or end.

use anyhow::Result;
use autoplan_core::time::start_of_day;
use autoplan_core::BusyTimeBlock;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

/// A DTSTART/DTEND value before it is pinned to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IcsTime {
    Date(NaiveDate),
    Instant(DateTime<Utc>),
}

#[derive(Debug, Default)]
struct PendingEvent {
    start: Option<IcsTime>,
    end: Option<IcsTime>,
    summary: Option<String>,
    transparent: bool,
    recurring: bool,
}

/// Undo RFC 5545 line folding (continuation lines start with a space or tab).
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(cont) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(cont);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

fn unescape(s: &str) -> String {
    s.replace("\\n", " ")
        .replace("\\N", " ")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}

fn parse_time(params: &str, value: &str, default_tz: Tz) -> Option<IcsTime> {
    let value = value.trim();

    if params.contains("VALUE=DATE") && !params.contains("VALUE=DATE-TIME") || value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d").ok().map(IcsTime::Date);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let ndt = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(IcsTime::Instant(Utc.from_utc_datetime(&ndt)));
    }

    // Windows zone names ("Eastern Standard Time") are not IANA ids
    let tz = match params.split(';').find_map(|p| p.strip_prefix("TZID=")) {
        Some(name) => name.trim_matches('"').parse::<Tz>().unwrap_or_else(|_| {
            warn!(tzid = name, "unknown TZID, reading the time in the default zone");
            default_tz
        }),
        None => default_tz,
    };

    let ndt = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    tz.from_local_datetime(&ndt)
        .earliest()
        .map(|dt| IcsTime::Instant(dt.with_timezone(&Utc)))
}

fn to_utc(t: IcsTime, tz: Tz) -> DateTime<Utc> {
    match t {
        IcsTime::Date(d) => start_of_day(d, tz),
        IcsTime::Instant(dt) => dt,
    }
}

fn finish(ev: PendingEvent, tz: Tz) -> Option<BusyTimeBlock> {
    if ev.transparent {
        return None;
    }
    let start = ev.start?;
    let end = match (start, ev.end) {
        (_, Some(end)) => end,
        // all-day event without DTEND lasts one day
        (IcsTime::Date(d), None) => IcsTime::Date(d + Duration::days(1)),
        (IcsTime::Instant(_), None) => return None,
    };

    Some(BusyTimeBlock {
        start: to_utc(start, tz),
        end: to_utc(end, tz),
        summary: ev.summary,
    })
}

/// Parse VEVENTs into busy blocks. Floating and all-day times are read in `tz`.
pub fn parse_ics_busy_blocks(text: &str, tz: Tz) -> Result<Vec<BusyTimeBlock>> {
    let prop_re = Regex::new(r"^(?P<name>[A-Za-z-]+)(?P<params>(?:;[^:]*)?):(?P<value>.*)$")?;

    let mut out = Vec::new();
    let mut current: Option<PendingEvent> = None;

    for line in unfold(text) {
        let Some(caps) = prop_re.captures(&line) else { continue };
        let name = caps["name"].to_ascii_uppercase();
        let params = &caps["params"];
        let value = &caps["value"];

        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                current = Some(PendingEvent::default());
            }
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                if let Some(ev) = current.take() {
                    let summary = ev.summary.clone();
                    if ev.recurring {
                        warn!(?summary, "recurring event: only the first occurrence counts as busy");
                    }
                    match finish(ev, tz) {
                        Some(block) => out.push(block),
                        None => warn!(?summary, "skipping calendar event without a usable time range"),
                    }
                }
            }
            _ => {
                let Some(ev) = current.as_mut() else { continue };
                match name.as_str() {
                    "DTSTART" => ev.start = parse_time(params, value, tz),
                    "DTEND" => ev.end = parse_time(params, value, tz),
                    "SUMMARY" => ev.summary = Some(unescape(value.trim())),
                    "RRULE" => ev.recurring = true,
                    "TRANSP" => ev.transparent = value.trim().eq_ignore_ascii_case("TRANSPARENT"),
                    _ => {}
                }
            }
        }
    }

    Ok(out)
}
