//! Pure escaping helpers for the Markdown writer.
//!
//! Run text is written verbatim; only the places where Markdown syntax
//! would break (table cells, link labels and link targets) are escaped.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters percent-encoded in relative asset paths.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'(')
    .add(b')')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'|')
    .add(b'\\');

/// Characters that would end or confuse an inline link target.
const LINK_TARGET: &AsciiSet = &CONTROLS.add(b' ').add(b'(').add(b')').add(b'<').add(b'>');

/// Percent-encode one file name for use in a relative link.
///
/// # Examples
///
/// ```
/// use onenote_md::markdown::encode_path_segment;
///
/// assert_eq!(encode_path_segment("Q3 plan (final).pdf"), "Q3%20plan%20%28final%29.pdf");
/// assert_eq!(encode_path_segment("café.png"), "caf%C3%A9.png");
/// ```
pub fn encode_path_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// Make a URL safe to place inside `(...)`.
///
/// Existing escapes are left alone; only spaces, parentheses, angle
/// brackets and control characters are encoded.
pub fn escape_link_target(url: &str) -> String {
    percent_encoding::percent_encode(url.as_bytes(), LINK_TARGET).to_string()
}

/// Escape square brackets in link and image labels.
pub fn escape_link_label(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\') {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Escape rendered Markdown for a single table cell.
///
/// Pipes become `\|` and line breaks become `<br>`. A blank cell renders
/// as a single space so the row keeps its shape.
///
/// # Examples
///
/// ```
/// use onenote_md::markdown::escape_table_cell;
///
/// assert_eq!(escape_table_cell("a | b"), "a \\| b");
/// assert_eq!(escape_table_cell("line one\nline two"), "line one<br>line two");
/// assert_eq!(escape_table_cell(""), " ");
/// ```
pub fn escape_table_cell(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return " ".to_string();
    }

    let mut result = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '|' => result.push_str("\\|"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                result.push_str("<br>");
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(c),
        }
    }
    result
}
