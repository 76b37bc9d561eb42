use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// A recurring work shift (wall-clock, repeats every eligible day).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shift {
    pub id: i64,
    pub name: String,
    pub start: NaiveTime, // ⇔ shifts.start_time (TEXT "HH:MM")
    pub end: NaiveTime,   // ⇔ shifts.end_time; may be before `start` (overnight)
    pub break_start: Option<NaiveTime>,
    pub break_minutes: i64,
    pub is_active: bool,
    pub order: i32, // tie-break for default shift selection
    pub color: String,
}

impl Shift {
    pub fn new(id: i64, name: &str, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id,
            name: name.to_string(),
            start,
            end,
            break_start: None,
            break_minutes: 0,
            is_active: true,
            order: 0,
            color: String::new(),
        }
    }

    pub fn with_break(mut self, start: NaiveTime, minutes: i64) -> Self {
        self.break_start = Some(start);
        self.break_minutes = minutes;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Length of the shift window, derived modulo 24h.
    /// `start == end` yields a zero-length shift.
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds().rem_euclid(SECONDS_PER_DAY)
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    /// Offset of the break from the shift start, if the break falls inside the window.
    pub fn break_offset_seconds(&self) -> Option<i64> {
        let b = self.break_start?;
        if self.break_minutes <= 0 {
            return None;
        }
        let offset = (b - self.start).num_seconds().rem_euclid(SECONDS_PER_DAY);
        (offset < self.duration_seconds()).then_some(offset)
    }

    pub fn break_duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.break_minutes.max(0))
    }

    /// Available capacity per occurrence (window minus the part of the break inside it).
    pub fn capacity_seconds(&self) -> i64 {
        let total = self.duration_seconds();
        match self.break_offset_seconds() {
            Some(offset) => {
                let break_end = (offset + self.break_duration().num_seconds()).min(total);
                total - (break_end - offset)
            }
            None => total,
        }
    }
}
