//! Text payload decoding.
//!
//! Text properties arrive in several shapes depending on how the container
//! parser handled them: raw UTF-16LE bytes, hex strings, single-byte text,
//! or strings that were already decoded (sometimes with the wrong codec).
//! Everything here is total: any input produces a string.

use std::sync::LazyLock;

use regex::Regex;

/// Which text property a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// `RichEditTextUnicode`: UTF-16LE text.
    Utf16,
    /// `TextExtendedAscii`: single-byte text.
    Ascii,
}

/// How a payload was turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMethod {
    Empty,
    Utf16,
    Hex,
    Utf8,
    Windows1252,
    /// The parser already produced a string.
    Verbatim,
    /// An ASCII payload that had been misread as UTF-16, re-encoded.
    Recovered,
}

/// Result of decoding one text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub method: DecodeMethod,
    /// Set when the raw decoded text failed the printable-character check.
    pub garbled: bool,
}

impl DecodedText {
    fn new(raw: &str, method: DecodeMethod, threshold: f64) -> Self {
        Self {
            garbled: is_garbled(raw, threshold),
            text: clean_text(raw),
            method,
        }
    }

    fn empty() -> Self {
        Self {
            text: String::new(),
            method: DecodeMethod::Empty,
            garbled: false,
        }
    }
}

/// Default share of suspicious characters above which text counts as garbled.
pub const DEFAULT_GARBLED_THRESHOLD: f64 = 0.3;

// ============================================================================
// Byte payloads
// ============================================================================

/// Decode a byte payload.
///
/// Order of attempts:
///
/// 1. UTF-16LE, when the length is even, decoding is strict-clean and the
///    bytes are not all printable ASCII (those are ASCII text or hex).
///    Skipped for the single-byte ASCII property.
/// 2. Hex digits, decoded and then read as UTF-16LE or Windows-1252
///    depending on `encoding`.
/// 3. UTF-8, falling back to Windows-1252 on malformed input.
///
/// # Examples
///
/// ```
/// use onenote_md::extract::text::{decode_text, DecodeMethod, TextEncoding};
///
/// let utf16: Vec<u8> = "Héllo".encode_utf16().flat_map(u16::to_le_bytes).collect();
/// let decoded = decode_text(&utf16, TextEncoding::Utf16, 0.3);
/// assert_eq!(decoded.text, "Héllo");
/// assert_eq!(decoded.method, DecodeMethod::Utf16);
///
/// let hex = decode_text(b"48656c6c6f", TextEncoding::Ascii, 0.3);
/// assert_eq!(hex.text, "Hello");
/// ```
pub fn decode_text(payload: &[u8], encoding: TextEncoding, threshold: f64) -> DecodedText {
    if payload.is_empty() {
        return DecodedText::empty();
    }

    if encoding == TextEncoding::Utf16
        && let Some(text) = decode_utf16_strict(payload)
    {
        return DecodedText::new(&text, DecodeMethod::Utf16, threshold);
    }

    if let Some(bytes) = decode_hex(payload, encoding) {
        let text = match encoding {
            TextEncoding::Utf16 => decode_utf16_lossy(&bytes),
            TextEncoding::Ascii => encoding_rs::WINDOWS_1252.decode(&bytes).0.into_owned(),
        };
        return DecodedText::new(&text, DecodeMethod::Hex, threshold);
    }

    let (text, _, malformed) = encoding_rs::UTF_8.decode(payload);
    if !malformed {
        return DecodedText::new(&text, DecodeMethod::Utf8, threshold);
    }

    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(payload);
    DecodedText::new(&text, DecodeMethod::Windows1252, threshold)
}

fn is_printable_ascii(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7E | b'\t' | b'\n' | b'\r')
}

fn decode_utf16_strict(payload: &[u8]) -> Option<String> {
    if payload.len() % 2 != 0 || payload.iter().all(|&b| is_printable_ascii(b)) {
        return None;
    }
    let units = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

fn decode_utf16_lossy(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode a payload made only of hex digits.
///
/// UTF-16 payloads need whole code units, so their digit count must be a
/// multiple of four. Words like `cafe` or `facade` are all hex letters;
/// requiring at least one decimal digit keeps them as text.
fn decode_hex(payload: &[u8], encoding: TextEncoding) -> Option<Vec<u8>> {
    let digits = payload.trim_ascii();
    let unit = match encoding {
        TextEncoding::Utf16 => 4,
        TextEncoding::Ascii => 2,
    };
    if digits.is_empty()
        || digits.len() % unit != 0
        || !digits.iter().all(u8::is_ascii_hexdigit)
        || !digits.iter().any(u8::is_ascii_digit)
    {
        return None;
    }
    hex::decode(digits).ok()
}

/// Decode a metadata payload such as a title, file name or URL.
///
/// Metadata is stored as plain text, never hex, so values made of digits
/// like `2024` come back unchanged. UTF-16LE is tried first, then UTF-8,
/// then Windows-1252.
///
/// # Examples
///
/// ```
/// use onenote_md::extract::text::decode_metadata;
///
/// assert_eq!(decode_metadata(b"2024"), "2024");
/// let utf16: Vec<u8> = "Été".encode_utf16().flat_map(u16::to_le_bytes).collect();
/// assert_eq!(decode_metadata(&utf16), "Été");
/// ```
pub fn decode_metadata(payload: &[u8]) -> String {
    if let Some(text) = decode_utf16_strict(payload) {
        return clean_text(&text);
    }
    let (text, _, malformed) = encoding_rs::UTF_8.decode(payload);
    if !malformed {
        return clean_text(&text);
    }
    clean_text(&encoding_rs::WINDOWS_1252.decode(payload).0)
}

// ============================================================================
// Already-decoded strings
// ============================================================================

/// Decode a text property the parser already turned into a string.
///
/// Hex strings are decoded like byte payloads. For the ASCII property, a
/// string that looks like ASCII bytes misread as UTF-16 is re-encoded to
/// UTF-16LE and read back as Windows-1252.
pub fn decode_text_value(value: &str, encoding: TextEncoding, threshold: f64) -> DecodedText {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return DecodedText::empty();
    }

    if let Some(bytes) = decode_hex(trimmed.as_bytes(), encoding) {
        let text = match encoding {
            TextEncoding::Utf16 => decode_utf16_lossy(&bytes),
            TextEncoding::Ascii => encoding_rs::WINDOWS_1252.decode(&bytes).0.into_owned(),
        };
        return DecodedText::new(&text, DecodeMethod::Hex, threshold);
    }

    if encoding == TextEncoding::Ascii && looks_like_misread_ascii(trimmed) {
        let bytes: Vec<u8> = trimmed.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
        return DecodedText::new(&text, DecodeMethod::Recovered, threshold);
    }

    DecodedText::new(value, DecodeMethod::Verbatim, threshold)
}

/// True when more than 30% of the chars lie above U+00FF, which is what
/// single-byte text looks like after being decoded as UTF-16.
pub fn looks_like_misread_ascii(text: &str) -> bool {
    let total = text.chars().count();
    if total <= 2 {
        return false;
    }
    let wide = text.chars().filter(|&c| u32::from(c) > 0xFF).count();
    wide as f64 / total as f64 > 0.3
}

// ============================================================================
// Cleaning and heuristics
// ============================================================================

/// Remove OneNote text artefacts.
///
/// NUL and vertical tab are dropped, U+202F becomes a plain space and
/// U+FFFD is removed. Surrounding whitespace is kept so that adjacent runs
/// still join correctly.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\0' | '\u{0B}' | '\u{FFFD}'))
        .map(|c| if c == '\u{202F}' { ' ' } else { c })
        .collect()
}

fn is_suspicious(c: char) -> bool {
    let code = u32::from(c);
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        || c == '\u{FFFD}'
        || (0xE000..=0xF8FF).contains(&code)
        || code >= 0xF_0000
        || (0xFDD0..=0xFDEF).contains(&code)
        || matches!(code & 0xFFFF, 0xFFFE | 0xFFFF)
}

/// Printable-character heuristic.
///
/// Text with more than two chars is garbled when the share of control
/// chars (other than tab and line breaks), replacement chars, private-use
/// and noncharacter code points exceeds `threshold`.
///
/// # Examples
///
/// ```
/// use onenote_md::extract::text::is_garbled;
///
/// assert!(!is_garbled("Meeting notes", 0.3));
/// assert!(is_garbled("\u{1}\u{2}\u{3}ab", 0.3));
/// ```
pub fn is_garbled(text: &str, threshold: f64) -> bool {
    let total = text.chars().count();
    if total <= 2 {
        return false;
    }
    let bad = text.chars().filter(|&c| is_suspicious(c)).count();
    bad as f64 / total as f64 > threshold
}

// ============================================================================
// Hyperlink field codes
// ============================================================================

static HYPERLINK_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\x{FDDF}\x{FDF3}]HYPERLINK\s+"([^"]+)"([^\x{FDDF}\x{FDF3}]*)"#).unwrap()
});

/// True when the text embeds a field-code marker.
pub fn has_field_codes(text: &str) -> bool {
    text.contains(['\u{FDDF}', '\u{FDF3}'])
}

/// Split text with embedded `HYPERLINK "url"display` field codes into
/// `(text, url)` segments. Plain segments have no url; a field with no
/// display text shows its url.
///
/// # Examples
///
/// ```
/// use onenote_md::extract::text::parse_hyperlink_field_codes;
///
/// let segments = parse_hyperlink_field_codes("See \u{FDDF}HYPERLINK \"https://a.example\"docs");
/// assert_eq!(segments[0], ("See ".to_string(), None));
/// assert_eq!(segments[1], ("docs".to_string(), Some("https://a.example".to_string())));
/// ```
pub fn parse_hyperlink_field_codes(text: &str) -> Vec<(String, Option<String>)> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in HYPERLINK_FIELD.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_plain(&mut segments, &text[last..whole.start()]);

        let url = clean_text(caps.get(1).map_or("", |m| m.as_str()))
            .trim()
            .to_string();
        let display = clean_text(caps.get(2).map_or("", |m| m.as_str()));
        if !display.trim().is_empty() {
            segments.push((display, Some(url)));
        } else if !url.is_empty() {
            segments.push((url.clone(), Some(url)));
        }
        last = whole.end();
    }
    push_plain(&mut segments, &text[last..]);

    if segments.is_empty() {
        segments.push((clean_text(text), None));
    }
    segments
}

fn push_plain(segments: &mut Vec<(String, Option<String>)>, raw: &str) {
    let cleaned: String = clean_text(raw)
        .chars()
        .filter(|c| !matches!(c, '\u{FDDF}' | '\u{FDF3}'))
        .collect();
    if !cleaned.trim().is_empty() {
        segments.push((cleaned, None));
    }
}

// ============================================================================
// Tests
// ============================================================================
