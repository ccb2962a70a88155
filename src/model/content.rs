//! Content elements that make up a page.

use std::sync::Arc;

/// A run of text with uniform formatting.
///
/// Runs are immutable: fields are private and the `with_*` builders consume
/// the run and return a new one, so a run can be shared between renders
/// without defensive copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TextRun {
    text: Arc<str>,
    bold: bool,
    /// Also set for underlined source text, which Markdown cannot express.
    italic: bool,
    strikethrough: bool,
    superscript: bool,
    subscript: bool,
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    hyperlink: Option<Arc<str>>,
    /// The decoder considered this text likely corrupt.
    garbled: bool,
}

impl TextRun {
    /// Create an unstyled run.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_bold(self, bold: bool) -> Self {
        Self { bold, ..self }
    }

    pub fn with_italic(self, italic: bool) -> Self {
        Self { italic, ..self }
    }

    pub fn with_strikethrough(self, strikethrough: bool) -> Self {
        Self {
            strikethrough,
            ..self
        }
    }

    pub fn with_superscript(self, superscript: bool) -> Self {
        Self {
            superscript,
            ..self
        }
    }

    pub fn with_subscript(self, subscript: bool) -> Self {
        Self { subscript, ..self }
    }

    /// Attach a hyperlink target. Empty targets are ignored.
    pub fn with_hyperlink(self, url: impl AsRef<str>) -> Self {
        let url = url.as_ref().trim();
        Self {
            hyperlink: (!url.is_empty()).then(|| Arc::from(url)),
            ..self
        }
    }

    pub fn with_garbled(self, garbled: bool) -> Self {
        Self { garbled, ..self }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn is_italic(&self) -> bool {
        self.italic
    }

    pub fn is_strikethrough(&self) -> bool {
        self.strikethrough
    }

    pub fn is_superscript(&self) -> bool {
        self.superscript
    }

    pub fn is_subscript(&self) -> bool {
        self.subscript
    }

    pub fn hyperlink(&self) -> Option<&str> {
        self.hyperlink.as_deref()
    }

    pub fn is_garbled(&self) -> bool {
        self.garbled
    }

    /// True when no style flag or link is set.
    pub fn is_plain(&self) -> bool {
        !(self.bold
            || self.italic
            || self.strikethrough
            || self.superscript
            || self.subscript
            || self.hyperlink.is_some())
    }
}

/// List marker of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// A paragraph of formatted runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RichText {
    pub runs: Vec<TextRun>,
    /// Heading level 1-6, or 0 for body text.
    pub heading_level: u8,
    pub list: Option<ListKind>,
    /// Nesting depth within the outline (0 = top level).
    pub indent_level: u8,
    pub is_title: bool,
}

impl RichText {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(TextRun::text).collect()
    }

    /// True when every run is garbled (and there is at least one run).
    pub fn is_garbled(&self) -> bool {
        !self.runs.is_empty() && self.runs.iter().all(TextRun::is_garbled)
    }
}

/// Image formats recognised from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Unknown,
}

impl ImageFormat {
    /// File extension used when writing the image.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::WebP => "webp",
            ImageFormat::Unknown => "bin",
        }
    }
}

/// An image embedded in a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ImageElement {
    #[cfg_attr(feature = "json", serde(skip))]
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// File stem to prefer when writing (from the source file name).
    pub suggested_stem: Option<String>,
    pub alt_text: Option<String>,
    /// Pixel `(width, height)` when the header exposes them.
    pub dimensions: Option<(u32, u32)>,
}

/// A table; every cell holds its own content elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct TableElement {
    pub rows: Vec<Vec<Vec<ContentElement>>>,
    pub borders_visible: bool,
}

impl TableElement {
    pub fn new(rows: Vec<Vec<Vec<ContentElement>>>) -> Self {
        Self {
            rows,
            borders_visible: true,
        }
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// A file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct EmbeddedFile {
    #[cfg_attr(feature = "json", serde(skip))]
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    /// Extension without the dot, e.g. `pdf`.
    pub extension: Option<String>,
    pub source_path: Option<String>,
}

/// Closed set of page content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(tag = "type", rename_all = "snake_case"))]
pub enum ContentElement {
    RichText(RichText),
    Image(ImageElement),
    Table(TableElement),
    EmbeddedFile(EmbeddedFile),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_return_new_runs() {
        let base = TextRun::new("note");
        let bold = base.clone().with_bold(true);

        assert!(base.is_plain());
        assert!(!bold.is_plain());
        assert_eq!(base.text(), bold.text());
        assert_ne!(base, bold);
    }

    #[test]
    fn test_empty_hyperlink_is_ignored() {
        let run = TextRun::new("x").with_hyperlink("  ");
        assert_eq!(run.hyperlink(), None);
        assert!(run.is_plain());
    }

    #[test]
    fn test_structural_equality() {
        let a = RichText::new(vec![TextRun::new("a").with_italic(true)]);
        let b = RichText::new(vec![TextRun::new(String::from("a")).with_italic(true)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_image_extensions() {
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Unknown.extension(), "bin");
    }
}
