//! Shift calendar resolver.
//!
//! Maps `(start, duration)` onto real wall-clock capacity given a set of
//! shifts, their breaks and the weekday/weekend policy of a job.
//!
//! # Capacity model
//! A shift occurrence starting on day `D` covers `[D+start, D+start+len)`
//! where `len` is derived modulo 24h (overnight shifts end on `D+1`).
//! The break window is carved out of the occurrence without moving its
//! boundaries. When weekends are excluded, any part of an occurrence that
//! falls on a Saturday or Sunday contributes nothing.
//!
//! Overlapping shifts count their common time once; the segment is
//! attributed to the shift that comes first in `(start, order)`.
//!
//! The resolver is a pure function of its inputs: no clock, no randomness.

use crate::errors::{AppError, AppResult};
use crate::models::shift::Shift;
use crate::models::timeline::Segment;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

/// Which shifts are eligible with respect to `Shift::is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftActivity {
    /// Production scheduling: only active shifts.
    ActiveOnly,
    /// What-if scheduling: shifts explicitly allowed by the job are eligible
    /// even while deactivated in production.
    IgnoreActiveStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub end: NaiveDateTime,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
struct Window {
    shift_id: i64,
    order: i32,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Eligible shifts of one job, ready to resolve intervals.
#[derive(Debug, Clone)]
pub struct ShiftCalendar {
    shifts: Vec<Shift>,
    include_weekends: bool,
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

fn midnight(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

impl ShiftCalendar {
    /// Select the candidate shifts for a job.
    ///
    /// - `allowed` non-empty restricts candidates to those ids (unknown ids
    ///   are an `InvalidReference`); empty means every shift.
    /// - `ActiveOnly` drops inactive shifts; `IgnoreActiveStatus` keeps
    ///   inactive shifts only when `allowed` names them explicitly.
    /// - Fails with `Validation` when no candidate has positive capacity.
    pub fn new(
        all: &[Shift],
        allowed: &[i64],
        include_weekends: bool,
        activity: ShiftActivity,
    ) -> AppResult<Self> {
        if let Some(missing) = allowed.iter().find(|id| !all.iter().any(|s| s.id == **id)) {
            return Err(AppError::InvalidReference(format!(
                "shift {} does not exist",
                missing
            )));
        }

        let explicit = !allowed.is_empty();
        let mut shifts: Vec<Shift> = all
            .iter()
            .filter(|s| !explicit || allowed.contains(&s.id))
            .filter(|s| s.is_active || (explicit && activity == ShiftActivity::IgnoreActiveStatus))
            .cloned()
            .collect();
        shifts.sort_by_key(|s| (s.order, s.id));

        if shifts.iter().all(|s| s.capacity_seconds() == 0) {
            return Err(AppError::Validation(
                "no eligible shift with available capacity".to_string(),
            ));
        }

        Ok(Self {
            shifts,
            include_weekends,
        })
    }

    /// Split `[start, end)` at midnights and drop weekend days.
    /// Contiguous weekday pieces stay merged.
    fn push_weekday_pieces(
        &self,
        out: &mut Vec<Window>,
        shift: &Shift,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) {
        if start >= end {
            return;
        }
        if self.include_weekends {
            out.push(Window {
                shift_id: shift.id,
                order: shift.order,
                start,
                end,
            });
            return;
        }

        let mut cursor = start;
        while cursor < end {
            let day = cursor.date();
            let chunk_end = end.min(midnight(day + TimeDelta::days(1)));
            if !is_weekend(day) {
                match out.last_mut() {
                    Some(last) if last.shift_id == shift.id && last.end == cursor => {
                        last.end = chunk_end;
                    }
                    _ => out.push(Window {
                        shift_id: shift.id,
                        order: shift.order,
                        start: cursor,
                        end: chunk_end,
                    }),
                }
            }
            cursor = chunk_end;
        }
    }

    /// Capacity windows of every shift occurrence that starts on `day`,
    /// sorted by start then shift order.
    fn windows_for_day(&self, day: NaiveDate) -> Vec<Window> {
        let mut out = Vec::new();

        for shift in &self.shifts {
            let len = shift.duration_seconds();
            if len == 0 {
                continue;
            }
            let occ_start = day.and_time(shift.start);
            let occ_end = occ_start + TimeDelta::seconds(len);

            match shift.break_offset_seconds() {
                Some(offset) => {
                    let break_start = occ_start + TimeDelta::seconds(offset);
                    let break_end = (break_start + shift.break_duration()).min(occ_end);
                    self.push_weekday_pieces(&mut out, shift, occ_start, break_start);
                    self.push_weekday_pieces(&mut out, shift, break_end, occ_end);
                }
                None => self.push_weekday_pieces(&mut out, shift, occ_start, occ_end),
            }
        }

        out.sort_by_key(|w| (w.start, w.order, w.shift_id));
        out
    }

    /// Consume `duration_seconds` of capacity greedily from `start`.
    ///
    /// A start inside a break or outside any shift is advanced to the next
    /// available window. The returned segments are ordered, non-overlapping
    /// and sum to exactly `duration_seconds`; a zero duration yields
    /// `end == start` and no segments.
    pub fn resolve(&self, start: NaiveDateTime, duration_seconds: i64) -> Resolution {
        let mut remaining = duration_seconds.max(0);
        let mut cursor = start;
        let mut segments: Vec<Segment> = Vec::new();

        if remaining == 0 {
            return Resolution {
                end: start,
                segments,
            };
        }

        // Overnight occurrences of the previous day may still be running at `start`.
        let mut day = start.date() - TimeDelta::days(1);

        while remaining > 0 {
            for w in self.windows_for_day(day) {
                if w.end <= cursor {
                    continue;
                }
                let seg_start = w.start.max(cursor);
                let take = (w.end - seg_start).num_seconds().min(remaining);
                let seg_end = seg_start + TimeDelta::seconds(take);

                match segments.last_mut() {
                    Some(last) if last.shift_id == w.shift_id && last.end == seg_start => {
                        last.end = seg_end;
                    }
                    _ => segments.push(Segment {
                        shift_id: w.shift_id,
                        start: seg_start,
                        end: seg_end,
                    }),
                }

                cursor = seg_end;
                remaining -= take;
                if remaining == 0 {
                    break;
                }
            }
            day += TimeDelta::days(1);
        }

        Resolution {
            end: cursor,
            segments,
        }
    }
}

/// One-shot form of [`ShiftCalendar::resolve`].
pub fn resolve_interval(
    start: NaiveDateTime,
    duration_seconds: i64,
    shifts: &[Shift],
    allowed: &[i64],
    include_weekends: bool,
) -> AppResult<Resolution> {
    let calendar = ShiftCalendar::new(shifts, allowed, include_weekends, ShiftActivity::ActiveOnly)?;
    Ok(calendar.resolve(start, duration_seconds))
}
