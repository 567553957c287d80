//! Busy-time parsers, one per source format.

pub mod busy_csv;
pub mod ics;

use std::path::Path;

use anyhow::Result;
use autoplan_core::BusyTimeBlock;
use chrono_tz::Tz;

pub use busy_csv::parse_busy_csv;
pub use ics::parse_ics_busy_blocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyFormat {
    Ics,
    Csv,
}

impl BusyFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ics" | "ical" | "ifb" => Some(BusyFormat::Ics),
            "csv" => Some(BusyFormat::Csv),
            _ => None,
        }
    }
}

pub fn parse_busy(text: &str, format: BusyFormat, tz: Tz) -> Result<Vec<BusyTimeBlock>> {
    match format {
        BusyFormat::Ics => parse_ics_busy_blocks(text, tz),
        BusyFormat::Csv => parse_busy_csv(text.as_bytes(), tz),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(BusyFormat::from_path(Path::new("cal/work.ICS")), Some(BusyFormat::Ics));
        assert_eq!(BusyFormat::from_path(Path::new("busy.csv")), Some(BusyFormat::Csv));
        assert_eq!(BusyFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(BusyFormat::from_path(Path::new("noext")), None);
    }
}
