//! Inline color markup
//!
//! Narrative strings carry spans like `<color="red">the key</color>`. `render`
//! turns each span into a terminal foreground color that resets right after the
//! span; `strip` removes markup (and any color escapes) entirely.

use crossterm::style::{Color, Stylize};
use regex::Regex;
use std::sync::OnceLock;

fn span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<color="(\w+)">(.*?)</color>"#).expect("valid span regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<color=["'][^"'>]*["']>|</color>"#).expect("valid tag regex")
    })
}

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ansi regex"))
}

fn single_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<color='(\w+)'>").expect("valid quote regex"))
}

/// Map a markup color name to a terminal color. Unknown names fall back to white.
pub fn color_for(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::DarkRed,
        "green" => Color::DarkGreen,
        "yellow" => Color::DarkYellow,
        "blue" => Color::DarkBlue,
        "magenta" | "purple" => Color::DarkMagenta,
        "cyan" => Color::DarkCyan,
        "grey" | "gray" => Color::Grey,
        "lightred" => Color::Red,
        "lightgreen" => Color::Green,
        "lightyellow" => Color::Yellow,
        "lightblue" => Color::Blue,
        "lightmagenta" => Color::Magenta,
        "lightcyan" => Color::Cyan,
        _ => Color::White,
    }
}

/// Rewrite `<color='x'>` openers to the double-quoted form
fn normalize(text: &str) -> std::borrow::Cow<'_, str> {
    single_quote_re().replace_all(text, r#"<color="$1">"#)
}

/// Render color spans as terminal styling
pub fn render(text: &str) -> String {
    let normalized = normalize(text);
    span_re()
        .replace_all(&normalized, |caps: &regex::Captures| {
            let color = color_for(&caps[1]);
            caps[2].with(color).to_string()
        })
        .into_owned()
}

/// Remove markup tags and color escapes, leaving plain text
pub fn strip(text: &str) -> String {
    let without_tags = tag_re().replace_all(text, "");
    ansi_re().replace_all(&without_tags, "").into_owned()
}
