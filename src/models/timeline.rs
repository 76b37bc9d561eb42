use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum ItemKind {
    Step,
    Delay,
}

/// One entry of the extended step list (route step or injected delay).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtendedItem {
    pub kind: ItemKind,
    pub name: String,
    pub duration_seconds: i64,
    /// Step order for steps, `insert_after` for delays.
    pub anchor_order: i32,
}

/// Contiguous slice of shift capacity consumed by an item.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Segment {
    pub shift_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Segment {
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduledItem {
    pub item: ExtendedItem,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Timeline {
    pub job_id: i64,
    pub job_name: String,
    pub scenario_id: Option<i64>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub items: Vec<ScheduledItem>,
}

impl Timeline {
    pub fn delay_seconds(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| i.item.kind == ItemKind::Delay)
            .map(|i| i.item.duration_seconds)
            .sum()
    }
}
