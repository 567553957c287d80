//! Busy time: externally committed intervals (calendar events) that eat
//! into a day's capacity without being tasks.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time::{day_bounds, overlap_minutes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyTimeBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl BusyTimeBlock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Minutes of this block that fall on `date` in `tz`. Inverted blocks count as zero.
    pub fn minutes_on(&self, date: NaiveDate, tz: Tz) -> i64 {
        let (day_start, day_end) = day_bounds(date, tz);
        overlap_minutes(self.start, self.end, day_start, day_end)
    }
}

/// Total busy minutes on `date` across all blocks.
pub fn busy_minutes_on(blocks: &[BusyTimeBlock], date: NaiveDate, tz: Tz) -> i64 {
    blocks.iter().map(|b| b.minutes_on(date, tz)).sum()
}

/// A gap between busy blocks, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeSlot {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Free intervals of the local day `date`, in chronological order.
pub fn free_slots(blocks: &[BusyTimeBlock], date: NaiveDate, tz: Tz) -> Vec<FreeSlot> {
    let (day_start, day_end) = day_bounds(date, tz);

    let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = blocks
        .iter()
        .map(|b| (b.start.max(day_start), b.end.min(day_end)))
        .filter(|(s, e)| s < e)
        .collect();
    busy.sort();

    let mut out = Vec::new();
    let mut cursor = day_start;
    for (start, end) in busy {
        if start > cursor {
            out.push(FreeSlot { start: cursor, end: start });
        }
        cursor = cursor.max(end);
    }
    if cursor < day_end {
        out.push(FreeSlot { start: cursor, end: day_end });
    }
    out
}

/// First busy block that intersects `[start, start + minutes)`.
pub fn clashing_block(blocks: &[BusyTimeBlock], start: DateTime<Utc>, minutes: u32) -> Option<&BusyTimeBlock> {
    let end = start + Duration::minutes(i64::from(minutes));
    blocks
        .iter()
        .find(|b| b.start < b.end && b.start < end && start < b.end)
}

/// True when `[start, start + minutes)` touches no busy block.
pub fn can_schedule_at(blocks: &[BusyTimeBlock], start: DateTime<Utc>, minutes: u32) -> bool {
    clashing_block(blocks, start, minutes).is_none()
}
