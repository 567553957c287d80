use anyhow::{Context, Result};
use autoplan_core::PlanningOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_autoplan_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planning: PlanningOptions,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    /// error | warn | info | debug | trace
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_autoplan_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s).context("parse config.toml")?;
    cfg.planning.validate().context("invalid [planning] section")?;
    Ok(cfg)
}

/// Effective config as TOML, or the raw text plus the reason it was rejected.
///
/// Never fails, so `config show` stays usable when config.toml is broken.
pub fn render_config(raw: &str) -> (String, Option<anyhow::Error>) {
    let rendered = parse_config(raw)
        .and_then(|cfg| toml::to_string_pretty(&cfg).context("serialize config"));
    match rendered {
        Ok(text) => (text, None),
        Err(e) => (raw.to_string(), Some(e)),
    }
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("load {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        assert!(s.contains("[planning]"));
        assert_eq!(parse_config(&s).unwrap(), cfg);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg = parse_config(
            r#"
[planning]
weekly_capacity_minutes = 900
workdays = ["Mon", "Wed", "Fri"]
timezone = "America/Chicago"
"#,
        )
        .unwrap();
        assert_eq!(cfg.planning.daily_capacity(), 300);
        assert_eq!(cfg.planning.workdays, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(cfg.planning.horizon_days, 14);
        assert_eq!(cfg.log.level, "warn");
    }

    #[test]
    fn broken_config_still_renders_raw_text() {
        let raw = "[planning]\nweekly_capacity_minutes = \"lots\"\n";
        let (text, problem) = render_config(raw);
        assert_eq!(text, raw);
        assert!(problem.is_some());

        let (text, problem) = render_config("");
        assert!(problem.is_none());
        assert!(text.contains("weekly_capacity_minutes = 600"));
    }

    #[test]
    fn invalid_planning_is_rejected() {
        let err = parse_config("[planning]\nweekly_capacity_minutes = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("weekly capacity"));
    }
}
