/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

use crate::models::timeline::ItemKind;

/// Steps in cyan, injected delays in yellow.
pub fn color_for_kind(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Step => CYAN,
        ItemKind::Delay => YELLOW,
    }
}

/// Active shifts green, deactivated shifts grey.
pub fn color_for_active(active: bool) -> &'static str {
    if active { GREEN } else { GREY }
}

/// Drift sign: local behind → red, ahead → yellow, in sync → reset.
pub fn color_for_drift(drift: i64) -> &'static str {
    if drift > 0 {
        RED
    } else if drift < 0 {
        YELLOW
    } else {
        RESET
    }
}
