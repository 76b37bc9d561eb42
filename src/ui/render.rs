//! Text rendering of computed timelines.

use crate::models::timeline::{ItemKind, Timeline};
use crate::utils::colors::{GREY, RESET, color_for_kind};
use crate::utils::table::Table;
use crate::utils::time::{fmt_datetime, format_seconds};

pub fn timeline_table(timeline: &Timeline, show_segments: bool) -> String {
    let mut table = Table::new(&["#", "Kind", "Name", "Duration", "Start", "End"]);

    for (i, entry) in timeline.items.iter().enumerate() {
        let kind = match entry.item.kind {
            ItemKind::Step => "step",
            ItemKind::Delay => "delay",
        };
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{}{}{}", color_for_kind(entry.item.kind), kind, RESET),
            entry.item.name.clone(),
            format_seconds(entry.item.duration_seconds),
            fmt_datetime(&entry.start),
            fmt_datetime(&entry.end),
        ]);

        if show_segments {
            for seg in &entry.segments {
                table.add_row(vec![
                    String::new(),
                    format!("{}shift {}{}", GREY, seg.shift_id, RESET),
                    String::new(),
                    format_seconds(seg.seconds()),
                    fmt_datetime(&seg.start),
                    fmt_datetime(&seg.end),
                ]);
            }
        }
    }

    let scope = match timeline.scenario_id {
        Some(id) => format!("scenario {}", id),
        None => "production".to_string(),
    };

    let mut out = format!(
        "Job {} '{}' ({})\nStart: {}\nEnd:   {}\nDelays: {}\n\n",
        timeline.job_id,
        timeline.job_name,
        scope,
        fmt_datetime(&timeline.start),
        fmt_datetime(&timeline.end),
        format_seconds(timeline.delay_seconds()),
    );
    out.push_str(&table.render());
    out
}
