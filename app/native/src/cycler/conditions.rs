//! Dynamic gating rules attached to a wallpaper.
//!
//! Conditions are re-evaluated on every pick attempt, never cached, so a
//! wallpaper can become eligible or ineligible between two cycles (or even in
//! the middle of one).

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Weekday};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A local time-of-day window. `start > end` wraps over midnight and
/// `start == end` covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeWindow {
    /// Inclusive start, e.g. `"08:00:00"`.
    #[schemars(with = "String")]
    pub start: NaiveTime,
    /// Exclusive end, e.g. `"18:30:00"`.
    #[schemars(with = "String")]
    pub end: NaiveTime,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self { Self { start, end } }

    /// Returns whether `time` falls inside the window.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start == self.end {
            return true;
        }
        if self.start < self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Conditions that must hold for a wallpaper to be picked or kept static.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CycleConditions {
    /// Only eligible inside this local time window. Equal `start` and `end`
    /// mean all day.
    pub active_between: Option<TimeWindow>,

    /// Only eligible on these weekdays (`"Mon"`, `"Tue"`, ...). Empty means every day.
    #[schemars(with = "Vec<String>")]
    pub weekdays: Vec<Weekday>,

    /// Only eligible while this path exists.
    pub requires_path: Option<PathBuf>,
}

impl CycleConditions {
    /// Returns whether no condition is configured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.active_between.is_none() && self.weekdays.is_empty() && self.requires_path.is_none()
    }

    /// Evaluates the conditions against the current local time.
    #[must_use]
    pub fn evaluate(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        self.evaluate_at(&Local::now())
    }

    /// Evaluates the conditions against an explicit point in time.
    #[must_use]
    pub fn evaluate_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        if let Some(window) = &self.active_between {
            if !window.contains(now.time()) {
                return false;
            }
        }

        if !self.weekdays.is_empty() && !self.weekdays.contains(&now.weekday()) {
            return false;
        }

        self.requires_path.as_ref().is_none_or(|path| path.exists())
    }
}
