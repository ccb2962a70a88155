//! Version selection for section files.
//!
//! OneNote backups keep several copies of the same section side by side,
//! distinguished by a date annotation in the file name:
//!
//! ```text
//! Notes.one
//! Notes (On 2-25-26).one
//! Notes (On 2-25-26 - 2).one
//! ADP.one (On 8-24-25).one
//! ```
//!
//! All of these map to a *section key* (`Notes`, `ADP`) and only the newest
//! copy per key is exported.
//!
//! ## Ranking
//!
//! 1. Latest annotation date. Files without a (valid) date rank below any
//!    dated file.
//! 2. Larger numeric disambiguator (`- 2`); absent counts as 0.
//! 3. Lexicographically greater path.
//!
//! ## Two-digit years
//!
//! Years below 100 are resolved with a fixed pivot
//! ([`SelectorConfig::two_digit_year_pivot`], default 50): `yy < pivot`
//! means `20yy`, otherwise `19yy`. So `26` is 2026 and `50` is 1950.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(On\s+(\d+)-(\d+)-(\d+)(?:\s*-\s*(\d+))?\)").unwrap()
});

const UNTITLED: &str = "Untitled";

/// Configuration for version selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Two-digit years below this value are 20xx, the rest 19xx.
    pub two_digit_year_pivot: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            two_digit_year_pivot: 50,
        }
    }
}

/// Version information parsed from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Version {
    /// `None` when the name has no annotation or the date is not a real date.
    pub date: Option<NaiveDate>,
    pub disambiguator: u32,
}

/// Result of selecting one file per section key.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: BTreeMap<String, PathBuf>,
    superseded: BTreeMap<String, Vec<PathBuf>>,
}

impl Selection {
    /// Selected path per section key, ordered by key.
    pub fn selected(&self) -> &BTreeMap<String, PathBuf> {
        &self.selected
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.selected.get(key).map(PathBuf::as_path)
    }

    /// Older versions that lost to the selected path, per key.
    pub fn superseded(&self, key: &str) -> &[PathBuf] {
        self.superseded.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn discarded_count(&self) -> usize {
        self.superseded.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Iterate `(section key, path)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.selected.iter().map(|(k, p)| (k.as_str(), p.as_path()))
    }
}

/// Picks the newest file for each section key.
#[derive(Debug, Clone, Default)]
pub struct VersionSelector {
    config: SelectorConfig,
}

impl VersionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Select one path per section key.
    ///
    /// Never fails: malformed annotations only lower a file's rank.
    pub fn select<P: AsRef<Path>>(&self, paths: &[P]) -> Selection {
        let mut groups: BTreeMap<String, Vec<(Version, PathBuf)>> = BTreeMap::new();

        for path in paths {
            let path = path.as_ref();
            let stem = file_stem(path);
            let key = section_key(&stem);
            let version = self.parse_version(&stem);
            groups
                .entry(key)
                .or_default()
                .push((version, path.to_path_buf()));
        }

        let mut selection = Selection::default();
        for (key, mut candidates) in groups {
            // Newest first
            candidates.sort_by(|(va, pa), (vb, pb)| vb.cmp(va).then_with(|| pb.cmp(pa)));
            let mut iter = candidates.into_iter().map(|(_, path)| path);
            let Some(latest) = iter.next() else {
                continue;
            };
            let older: Vec<PathBuf> = iter.collect();

            if !older.is_empty() {
                log::info!(
                    "Section '{}': using {}, skipping {} older version(s)",
                    key,
                    latest.display(),
                    older.len()
                );
                for path in &older {
                    log::debug!("  superseded: {}", path.display());
                }
                selection.superseded.insert(key.clone(), older);
            }
            selection.selected.insert(key, latest);
        }

        selection
    }

    /// Parse the version annotation of a file stem.
    pub fn parse_version(&self, stem: &str) -> Version {
        let Some(caps) = ANNOTATION.captures(stem) else {
            return Version::default();
        };

        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let disambiguator = number(4).unwrap_or(0);

        let date = match (number(1), number(2), number(3)) {
            (Some(month), Some(day), Some(year)) => {
                let year = self.normalize_year(year);
                let date = i32::try_from(year)
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, month, day));
                if date.is_none() {
                    log::warn!(
                        "Ignoring invalid date {}-{}-{} in '{}'",
                        month,
                        day,
                        year,
                        stem
                    );
                }
                date
            }
            _ => {
                log::warn!("Ignoring unparsable version annotation in '{}'", stem);
                None
            }
        };

        Version {
            date,
            disambiguator,
        }
    }

    /// Expand a two-digit year using the configured pivot.
    pub fn normalize_year(&self, year: u32) -> u32 {
        if year >= 100 {
            year
        } else if year < self.config.two_digit_year_pivot {
            2000 + year
        } else {
            1900 + year
        }
    }
}

/// Derive the section key from a file stem.
///
/// Strips version annotations and any trailing `.one` left over from names
/// like `ADP.one (On 8-24-25).one`.
///
/// # Examples
///
/// ```
/// use onenote_md::select::section_key;
///
/// assert_eq!(section_key("ADI (On 2-25-26)"), "ADI");
/// assert_eq!(section_key("ADP.one (On 8-24-25)"), "ADP");
/// assert_eq!(section_key("(On 1-1-25)"), "Untitled");
/// ```
pub fn section_key(stem: &str) -> String {
    let mut name = ANNOTATION.replace_all(stem, "").trim().to_string();
    while name
        .len()
        .checked_sub(4)
        .and_then(|start| name.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(".one"))
    {
        name.truncate(name.len() - 4);
        name = name.trim_end().to_string();
    }
    if name.is_empty() {
        UNTITLED.to_string()
    } else {
        name
    }
}

/// Section key for a path (see [`section_key`]).
pub fn section_key_for_path(path: &Path) -> String {
    section_key(&file_stem(path))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
