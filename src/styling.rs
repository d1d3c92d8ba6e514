//! Terminal output styling.
//!
//! Mirrors the teacher's stdout/stderr split: `println!`/`print!` (via
//! `anstream`, which auto-strips ANSI codes when the stream isn't a TTY)
//! are reserved for primary data output (status tables, the shell
//! directive); `eprintln!` carries human status messages so piping
//! `gman work status | grep foo` isn't polluted with color codes or
//! progress chatter.

pub use anstream::{eprint, eprintln, print, println};

use anstyle::{AnsiColor, Color, Style};
use color_print::cformat;
use unicode_width::UnicodeWidthStr;

/// Computed-at-runtime style constants, for table cells whose color
/// depends on a value rather than being known as a `cformat!` literal
/// (mirrors the teacher's own carve-out for `ADDITION`/`DELETION` in its
/// `styling::constants` module).
pub const ADDITION: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
pub const DELETION: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

/// User-facing message formatting uses `color-print`'s HTML-like tags
/// rather than hand-built `anstyle::Style` wrapping, matching the teacher's
/// convention (see its `styling::constants` module).
pub fn success_message(msg: impl AsRef<str>) -> String {
    cformat!("<green>✓</> {}", msg.as_ref())
}

pub fn error_message(msg: impl AsRef<str>) -> String {
    cformat!("<red>✗</> {}", msg.as_ref())
}

pub fn warning_message(msg: impl AsRef<str>) -> String {
    cformat!("<yellow>!</> {}", msg.as_ref())
}

pub fn hint_message(msg: impl AsRef<str>) -> String {
    cformat!("<dim>hint:</> {}", msg.as_ref())
}

/// Pad `s` with spaces to `width` display columns, accounting for
/// double-width/combining characters so table columns stay aligned even
/// when an alias or branch name contains non-ASCII text.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let display_width = UnicodeWidthStr::width(s);
    if display_width >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - display_width))
    }
}

/// Widest display width among `items`, for sizing a table column.
pub fn max_display_width<'a>(items: impl IntoIterator<Item = &'a str>) -> usize {
    items.into_iter().map(UnicodeWidthStr::width).max().unwrap_or(0)
}
