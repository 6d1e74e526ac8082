//! ANSI color markup for names shown to the user.

pub const COLOR_GREEN: &str = "\x1b[32m";
pub const ENDC: &str = "\x1b[0m";

/// Wrap `text` in `color` when `enabled`, otherwise return it unchanged.
pub fn colorize(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{text}{ENDC}")
    } else {
        text.to_string()
    }
}
