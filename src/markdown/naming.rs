//! Output file naming.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static ILLEGAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());
static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\s]+").unwrap());

/// Leaves room for a ` (NN).ext` suffix under the common 255-byte limit.
const MAX_NAME_BYTES: usize = 200;

/// Turn arbitrary text into a portable file name (without extension).
///
/// Illegal characters become `_`, runs of `_` and whitespace collapse to a
/// single space, the result is trimmed (including trailing dots) and capped
/// at 200 bytes without splitting a character. Empty input yields `unnamed`.
///
/// # Examples
///
/// ```
/// use onenote_md::markdown::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Q3: plan/review?"), "Q3 plan review");
/// assert_eq!(sanitize_filename("notes..."), "notes");
/// assert_eq!(sanitize_filename("***"), "unnamed");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let replaced = ILLEGAL.replace_all(name, "_");
    let collapsed = SEPARATOR_RUN.replace_all(&replaced, " ");

    let cleaned = truncate_bytes(collapsed.trim(), MAX_NAME_BYTES)
        .trim_end_matches(['.', ' '])
        .trim_start();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Longest prefix of `text` that fits in `max` bytes.
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let end = (0..=max).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
    &text[..end]
}

/// Split a file name into stem and extension at the last dot.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Names already handed out in one directory.
///
/// Comparison is case-insensitive so that output is safe on
/// case-insensitive filesystems. Repeats are numbered `Name (2)`,
/// `Name (3)` and so on.
#[derive(Debug, Clone, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name built from `stem` and an optional extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use onenote_md::markdown::UniqueNames;
    ///
    /// let mut names = UniqueNames::new();
    /// assert_eq!(names.claim("Meeting", Some("md")), "Meeting.md");
    /// assert_eq!(names.claim("meeting", Some("md")), "meeting (2).md");
    /// assert_eq!(names.claim("Meeting", Some("md")), "Meeting (3).md");
    /// ```
    pub fn claim(&mut self, stem: &str, extension: Option<&str>) -> String {
        let build = |suffix: Option<usize>| {
            let mut name = match suffix {
                Some(n) => format!("{stem} ({n})"),
                None => stem.to_string(),
            };
            if let Some(ext) = extension {
                name.push('.');
                name.push_str(ext);
            }
            name
        };

        let mut candidate = build(None);
        let mut n = 2;
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = build(Some(n));
            n += 1;
        }
        candidate
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_collapses_separators() {
        assert_eq!(sanitize_filename("a__b  c\td"), "a b c d");
        assert_eq!(sanitize_filename("<Draft> \"v2\""), "Draft v2");
        assert_eq!(sanitize_filename(""), "unnamed");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).chars().count(), 200);

        // Three bytes per char: 66 whole chars fit, the 67th would not.
        let wide = sanitize_filename(&"日".repeat(100));
        assert_eq!(wide.len(), 198);
        assert_eq!(wide.chars().count(), 66);

        let mixed = sanitize_filename(&format!("{}é", "a".repeat(199)));
        assert_eq!(mixed, "a".repeat(199));
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.final.pdf"), ("report.final", Some("pdf")));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
        assert_eq!(split_extension("plain"), ("plain", None));
    }

    #[test]
    fn test_literal_suffix_does_not_collide() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("A (2)", None), "A (2)");
        assert_eq!(names.claim("A", None), "A");
        assert_eq!(names.claim("A", None), "A (3)");
        assert_eq!(names.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_sanitized_names_are_portable(name in any::<String>()) {
            let clean = sanitize_filename(&name);
            prop_assert!(!clean.is_empty());
            prop_assert!(clean.len() <= MAX_NAME_BYTES);
            prop_assert!(!clean.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
            prop_assert!(!clean.ends_with('.'));
            prop_assert!(!clean.chars().any(|c| (c as u32) < 0x20));
        }
    }
}
