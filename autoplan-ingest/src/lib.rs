//! autoplan-ingest: turn files into engine inputs.
//!
//! Task snapshots arrive as JSON; busy time arrives as an ICS calendar export
//! or a small CSV. Everything here is a parser; nothing touches the engine's
//! semantics.

pub mod parsers;
pub mod types;

pub use parsers::{parse_busy, parse_busy_csv, parse_ics_busy_blocks, BusyFormat};
pub use types::{load_snapshot_json, TaskSnapshot};
