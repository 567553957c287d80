//! CSV busy-time parser.
//!
//! Expected columns (header required, summary optional):
//!   start,end,summary
//!   2026-03-02 09:00,2026-03-02 10:30,Standup + planning

use std::io::Read;

use anyhow::{Context, Result};
use autoplan_core::time::parse_local_to_utc;
use autoplan_core::BusyTimeBlock;
use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BusyRow {
    start: String,
    end: String,
    #[serde(default)]
    summary: Option<String>,
}

/// Parse busy rows with local `YYYY-MM-DD HH:MM` times in `tz`.
pub fn parse_busy_csv<R: Read>(reader: R, tz: Tz) -> Result<Vec<BusyTimeBlock>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<BusyRow>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row.with_context(|| format!("busy CSV line {line}"))?;
        let start = parse_local_to_utc(&row.start, tz).with_context(|| format!("busy CSV line {line}: start"))?;
        let end = parse_local_to_utc(&row.end, tz).with_context(|| format!("busy CSV line {line}: end"))?;

        out.push(BusyTimeBlock {
            start,
            end,
            summary: row.summary.filter(|s| !s.is_empty()),
        });
    }

    Ok(out)
}
