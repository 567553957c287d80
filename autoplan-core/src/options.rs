//! Planning options: capacity, workdays, horizon and timezone.

use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningOptions {
    pub weekly_capacity_minutes: u32,

    /// Overrides `weekly_capacity_minutes / workdays` when set.
    pub daily_capacity_minutes: Option<u32>,

    /// Weekdays eligible for scheduling.
    pub workdays: Vec<Weekday>,

    /// Treat every day of the week as a workday.
    pub allow_weekends: bool,

    /// Length of the forward planning window in calendar days.
    pub horizon_days: u32,

    /// Zone used to turn timestamps (deadlines, busy blocks) into calendar days.
    pub timezone: Tz,

    /// Leave tasks with unfinished prerequisites unscheduled. Off by default:
    /// the scheduler plans every eligible task unless asked to filter.
    pub respect_dependencies: bool,
}

impl Default for PlanningOptions {
    fn default() -> Self {
        Self {
            weekly_capacity_minutes: 600,
            daily_capacity_minutes: None,
            workdays: ALL_DAYS[..5].to_vec(),
            allow_weekends: false,
            horizon_days: 14,
            timezone: Tz::UTC,
            respect_dependencies: false,
        }
    }
}

impl PlanningOptions {
    pub fn new(weekly_capacity_minutes: u32) -> Self {
        Self {
            weekly_capacity_minutes,
            ..Self::default()
        }
    }

    pub fn with_daily_capacity(mut self, minutes: u32) -> Self {
        self.daily_capacity_minutes = Some(minutes);
        self
    }

    pub fn with_workdays(mut self, workdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.workdays = workdays.into_iter().collect();
        self
    }

    pub fn with_weekends(mut self, allow: bool) -> Self {
        self.allow_weekends = allow;
        self
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_respect_dependencies(mut self, respect: bool) -> Self {
        self.respect_dependencies = respect;
        self
    }

    /// Effective workday set in Monday-first order, without duplicates.
    pub fn effective_workdays(&self) -> Vec<Weekday> {
        if self.allow_weekends {
            return ALL_DAYS.to_vec();
        }
        ALL_DAYS
            .into_iter()
            .filter(|d| self.workdays.contains(d))
            .collect()
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.allow_weekends || self.workdays.contains(&date.weekday())
    }

    /// Capacity of a single workday in minutes.
    ///
    /// An empty workday set yields zero rather than dividing by it.
    pub fn daily_capacity(&self) -> u32 {
        if let Some(daily) = self.daily_capacity_minutes {
            return daily;
        }
        match self.effective_workdays().len() as u32 {
            0 => 0,
            n => self.weekly_capacity_minutes / n,
        }
    }

    /// Workdays of the horizon starting at `today`, in chronological order.
    pub fn horizon(&self, today: NaiveDate) -> Vec<NaiveDate> {
        today
            .iter_days()
            .take(self.horizon_days as usize)
            .filter(|d| self.is_workday(*d))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.weekly_capacity_minutes == 0 {
            bail!("weekly capacity must be positive");
        }
        if self.daily_capacity_minutes == Some(0) {
            bail!("daily capacity override must be positive");
        }
        if self.horizon_days == 0 {
            bail!("planning horizon must cover at least one day");
        }
        if self.effective_workdays().is_empty() {
            bail!("at least one workday is required (or enable weekends)");
        }
        Ok(())
    }
}
