//! Scalar analysis and rendering for the emitter.

use crate::ScalarStyle;
use crate::reader::is_printable;

/// Where a scalar is written; keys must stay on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Key,
    Value,
}

/// Pick the style actually written for `value`, falling back to
/// double-quoted whenever the requested style cannot represent it.
pub(crate) fn resolve_style(value: &str, requested: ScalarStyle, placement: Placement) -> ScalarStyle {
    let requested = match (requested, placement) {
        (ScalarStyle::Literal | ScalarStyle::Folded, Placement::Key) => ScalarStyle::Any,
        (style, _) => style,
    };
    match requested {
        ScalarStyle::Any | ScalarStyle::Plain if allows_plain(value) => ScalarStyle::Plain,
        ScalarStyle::SingleQuoted if allows_single_quoted(value) => ScalarStyle::SingleQuoted,
        ScalarStyle::Literal if allows_block(value) => ScalarStyle::Literal,
        ScalarStyle::Folded if allows_block(value) => {
            if value.split('\n').any(|line| line.starts_with([' ', '\t'])) {
                ScalarStyle::Literal
            } else {
                ScalarStyle::Folded
            }
        }
        _ => ScalarStyle::DoubleQuoted,
    }
}

/// Characters that break a line or are otherwise unsafe outside double quotes.
fn is_unsafe_char(ch: char) -> bool {
    !is_printable(ch) || matches!(ch, '\r' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}')
}

fn allows_plain(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if value.starts_with([' ', '\t']) || value.ends_with([' ', '\t']) {
        return false;
    }
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    let second = value.chars().nth(1);
    let indicator_ok = match first {
        '-' | '?' | ':' => second.is_some_and(|c| c != ' ' && c != '\t'),
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => false,
        _ => true,
    };
    indicator_ok
        && !value.ends_with(':')
        && !value.contains(": ")
        && !value.contains(":\t")
        && !value.contains(" #")
        && !value.contains("\t#")
        && !value.chars().any(|c| c == '\n' || c == '\t' || is_unsafe_char(c))
}

fn allows_single_quoted(value: &str) -> bool {
    !value.chars().any(|c| c == '\n' || is_unsafe_char(c))
}

fn allows_block(value: &str) -> bool {
    let Some(first_line) = value.split('\n').next() else {
        return false;
    };
    !first_line.is_empty()
        && !first_line.starts_with([' ', '\t'])
        && !value.chars().any(|c| c != '\t' && is_unsafe_char(c))
}

pub(crate) fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{0B}' => out.push_str("\\v"),
            '\u{0C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\u{1B}' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if is_unsafe_char(c) => {
                let code = u32::from(c);
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02X}", code));
                } else if code <= 0xFFFF {
                    out.push_str(&format!("\\u{:04X}", code));
                } else {
                    out.push_str(&format!("\\U{:08X}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Header indicator and body lines of a block scalar.
pub(crate) struct Block<'a> {
    pub chomping: &'static str,
    pub lines: Vec<&'a str>,
    /// Line breaks kept after the last line beyond the first (keep chomping)
    pub extra_breaks: usize,
}

pub(crate) fn block(value: &str) -> Block<'_> {
    let body = value.trim_end_matches('\n');
    let breaks = value.len() - body.len();
    let chomping = match breaks {
        0 => "-",
        1 => "",
        _ => "+",
    };
    Block {
        chomping,
        lines: body.split('\n').collect(),
        extra_breaks: breaks.saturating_sub(1),
    }
}
