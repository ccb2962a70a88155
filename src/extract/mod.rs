//! Content extraction: raw object graph to document model.
//!
//! The [`Extractor`] walks a [`RawObjectGraph`] from its roots in reading
//! order and builds [`Page`]s of typed content. Extraction never fails;
//! anything it cannot interpret is dropped or degraded and recorded as a
//! [`Warning`].
//!
//! ## Graph shape
//!
//! ```text
//! SectionMetaData / PageSeries
//! └── PageNode (+ PageMetaData)
//!     ├── TitleNode ── OutlineElement ── RichText
//!     └── OutlineNode
//!         └── OutlineElement          (ListNodes -> NumberList)
//!             ├── content: RichText | Image | Table | EmbeddedFile
//!             └── children: OutlineElement (one level deeper)
//! Table ── TableRow ── TableCell ── OutlineElement ...
//! ```
//!
//! Tree edges are `ElementChildNodes` and `ContentChildNodes`. Each object
//! reached through a tree edge is visited once; formatting objects
//! (paragraph styles, number lists, run formatting) are shared lookups and
//! may be referenced any number of times.

pub mod text;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::diagnostics::{Diagnostics, Warning, WarningKind};
use crate::model::{
    ContentElement, EmbeddedFile, ImageElement, ImageFormat, ListKind, Page, RichText,
    TableElement, TextRun,
};
use crate::raw::{ObjectId, ObjectKind, PropertyId, PropertyValue, RawObject, RawObjectGraph};
use crate::util::{detect_image_format, extract_image_dimensions, filetime_to_datetime, time32_to_datetime};

use text::{DEFAULT_GARBLED_THRESHOLD, DecodedText, TextEncoding};

/// Marker that opens an ordered `NumberListFormat`.
const ORDERED_LIST_MARKER: char = '\u{3}';

/// Configuration for extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Share of suspicious characters above which text is flagged garbled.
    pub garbled_threshold: f64,
    /// Title used when a page has none.
    pub default_title: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            garbled_threshold: DEFAULT_GARBLED_THRESHOLD,
            default_title: "Untitled".to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn with_garbled_threshold(mut self, threshold: f64) -> Self {
        self.garbled_threshold = threshold;
        self
    }
}

/// Output of extracting one section graph.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub pages: Vec<Page>,
    /// Display name stored in the section metadata, if any.
    pub section_name: Option<String>,
    pub warnings: Vec<Warning>,
}

/// Builds pages from a raw object graph.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract all pages of a section graph.
    pub fn extract(&self, graph: &RawObjectGraph) -> Extraction {
        let mut walk = Walk {
            graph,
            config: &self.config,
            visited: HashSet::new(),
            diag: Diagnostics::new(),
        };

        let section_name = walk.section_name();

        let mut pages = Vec::new();
        let mut loose = Vec::new();
        let mut pending_meta = None;
        for &root in graph.roots() {
            walk.collect(root, &mut pages, &mut loose, &mut pending_meta);
        }

        if pages.is_empty() && !loose.is_empty() {
            log::debug!("No page nodes found; wrapping loose content in one page");
            pages.push(Page::new(self.config.default_title.clone(), loose));
        } else if !loose.is_empty() {
            walk.diag.warn(
                WarningKind::UnexpectedObject,
                None,
                format!("{} content element(s) outside any page dropped", loose.len()),
            );
        }

        log::debug!(
            "Extracted {} page(s) from {} object(s)",
            pages.len(),
            graph.len()
        );

        Extraction {
            pages,
            section_name,
            warnings: walk.diag.into_warnings(),
        }
    }
}

// ============================================================================
// Walk state
// ============================================================================

/// Per-element context passed down the outline.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    depth: u8,
    list: Option<ListKind>,
    in_title: bool,
}

/// Page metadata gathered from the page node and its metadata object.
#[derive(Debug, Default)]
struct PageMeta {
    title: Option<String>,
    level: Option<u32>,
    author: Option<String>,
    created: Option<DateTime<Utc>>,
    modified: Option<DateTime<Utc>>,
}

impl PageMeta {
    /// Fill fields that are still empty from `other`.
    fn merge(&mut self, other: PageMeta) {
        self.title = self.title.take().or(other.title);
        self.level = self.level.or(other.level);
        self.author = self.author.take().or(other.author);
        self.created = self.created.or(other.created);
        self.modified = self.modified.or(other.modified);
    }
}

struct Walk<'a> {
    graph: &'a RawObjectGraph,
    config: &'a ExtractConfig,
    visited: HashSet<ObjectId>,
    diag: Diagnostics,
}

impl<'a> Walk<'a> {
    /// Follow a tree edge. Returns the object on first visit only.
    fn enter(&mut self, id: ObjectId) -> Option<&'a RawObject> {
        let graph = self.graph;
        let Some(object) = graph.object(id) else {
            self.diag.warn(
                WarningKind::MissingObject,
                Some(id),
                "reference to an object that is not in the graph",
            );
            return None;
        };
        if !self.visited.insert(id) {
            self.diag.warn(
                WarningKind::CycleDetected,
                Some(id),
                "object reached more than once; skipping",
            );
            return None;
        }
        Some(object)
    }

    /// Look up a shared formatting object without marking it visited.
    fn lookup(&self, id: ObjectId) -> Option<&'a RawObject> {
        self.graph.object(id)
    }

    fn section_name(&self) -> Option<String> {
        self.graph
            .objects_of_kind(ObjectKind::SectionMetaData)
            .into_iter()
            .find_map(|meta| self.plain_text(meta, PropertyId::SectionDisplayName))
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    fn collect(
        &mut self,
        id: ObjectId,
        pages: &mut Vec<Page>,
        loose: &mut Vec<ContentElement>,
        pending_meta: &mut Option<PageMeta>,
    ) {
        let Some(object) = self.enter(id) else {
            return;
        };

        match object.kind {
            ObjectKind::PageNode => {
                let meta = pending_meta.take();
                pages.push(self.page(object, meta));
            }
            ObjectKind::PageMetaData => {
                *pending_meta = Some(self.page_meta(object));
            }
            ObjectKind::SectionMetaData | ObjectKind::PageSeries | ObjectKind::Other => {
                for &child in object.refs(PropertyId::ElementChildNodes) {
                    self.collect(child, pages, loose, pending_meta);
                }
            }
            ObjectKind::OutlineNode | ObjectKind::TitleNode => {
                self.outline_children(object, Context::default(), loose);
            }
            ObjectKind::OutlineElement => {
                self.outline_element(object, Context::default(), loose);
            }
            kind if kind.is_content() => {
                self.content(object, Context::default(), loose);
            }
            _ => self.unexpected(object, "at section level"),
        }
    }

    fn page(&mut self, node: &'a RawObject, pending: Option<PageMeta>) -> Page {
        let mut meta = self.page_meta(node);
        if let Some(pending) = pending {
            meta.merge(pending);
        }

        let mut elements = Vec::new();
        let mut title_text = Vec::new();

        for &child_id in node.refs(PropertyId::ElementChildNodes) {
            let Some(child) = self.enter(child_id) else {
                continue;
            };
            match child.kind {
                ObjectKind::PageMetaData => {
                    let child_meta = self.page_meta(child);
                    meta.merge(child_meta);
                }
                ObjectKind::TitleNode => {
                    let ctx = Context {
                        in_title: true,
                        ..Context::default()
                    };
                    self.outline_children(child, ctx, &mut title_text);
                }
                ObjectKind::OutlineNode => {
                    self.outline_children(child, Context::default(), &mut elements);
                }
                ObjectKind::OutlineElement => {
                    self.outline_element(child, Context::default(), &mut elements);
                }
                kind if kind.is_content() => {
                    self.content(child, Context::default(), &mut elements);
                }
                ObjectKind::Other => {
                    self.outline_children(child, Context::default(), &mut elements);
                }
                _ => self.unexpected(child, "inside a page"),
            }
        }

        // Title text becomes the heading; anything else in the title node
        // stays with the body.
        let mut title_from_node = None;
        for element in title_text {
            match element {
                ContentElement::RichText(rich) => {
                    if title_from_node.is_none() && !rich.is_garbled() {
                        let text = rich.plain_text().trim().to_string();
                        if !text.is_empty() {
                            title_from_node = Some(text);
                        }
                    }
                }
                other => elements.push(other),
            }
        }

        let title = meta
            .title
            .or(title_from_node)
            .unwrap_or_else(|| self.config.default_title.clone());
        log::debug!("Page '{}' with {} element(s)", title, elements.len());

        Page {
            title,
            elements,
            created: meta.created,
            modified: meta.modified,
            author: meta.author,
            level: meta.level.unwrap_or(0),
        }
    }

    fn page_meta(&self, object: &RawObject) -> PageMeta {
        PageMeta {
            title: self.plain_text(object, PropertyId::CachedTitleString),
            level: object
                .uint(PropertyId::PageLevel)
                .and_then(|n| u32::try_from(n).ok()),
            author: self.plain_text(object, PropertyId::Author),
            created: object
                .uint(PropertyId::CreationTimeStamp)
                .and_then(|n| u32::try_from(n).ok())
                .and_then(time32_to_datetime),
            modified: object
                .uint(PropertyId::LastModifiedTime)
                .and_then(filetime_to_datetime),
        }
    }

    // ------------------------------------------------------------------------
    // Outline
    // ------------------------------------------------------------------------

    fn outline_children(&mut self, parent: &RawObject, ctx: Context, out: &mut Vec<ContentElement>) {
        for &child_id in parent.refs(PropertyId::ElementChildNodes) {
            let Some(child) = self.enter(child_id) else {
                continue;
            };
            match child.kind {
                ObjectKind::OutlineElement => self.outline_element(child, ctx, out),
                ObjectKind::OutlineNode | ObjectKind::Other => self.outline_children(child, ctx, out),
                kind if kind.is_content() => self.content(child, ctx, out),
                _ => self.unexpected(child, "inside an outline"),
            }
        }
    }

    fn outline_element(&mut self, element: &RawObject, ctx: Context, out: &mut Vec<ContentElement>) {
        let ctx = Context {
            list: self.list_kind(element),
            ..ctx
        };

        for &content_id in element.refs(PropertyId::ContentChildNodes) {
            let Some(content) = self.enter(content_id) else {
                continue;
            };
            self.content(content, ctx, out);
        }

        let nested = Context {
            depth: ctx.depth.saturating_add(1),
            list: None,
            ..ctx
        };
        for &child_id in element.refs(PropertyId::ElementChildNodes) {
            let Some(child) = self.enter(child_id) else {
                continue;
            };
            match child.kind {
                ObjectKind::OutlineElement => self.outline_element(child, nested, out),
                kind if kind.is_content() => self.content(child, nested, out),
                _ => self.unexpected(child, "nested in an outline element"),
            }
        }
    }

    fn list_kind(&self, element: &RawObject) -> Option<ListKind> {
        let list = element
            .refs(PropertyId::ListNodes)
            .iter()
            .find_map(|&id| self.lookup(id))?;
        let ordered = match list.get(PropertyId::NumberListFormat) {
            Some(PropertyValue::Text(format)) => format.starts_with(ORDERED_LIST_MARKER),
            Some(PropertyValue::Bytes(bytes)) => bytes.first() == Some(&0x03),
            _ => false,
        };
        Some(if ordered {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        })
    }

    // ------------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------------

    fn content(&mut self, object: &'a RawObject, ctx: Context, out: &mut Vec<ContentElement>) {
        let element = match object.kind {
            ObjectKind::RichText => self.rich_text(object, ctx).map(ContentElement::RichText),
            ObjectKind::Image => self.image(object).map(ContentElement::Image),
            ObjectKind::Table => self.table(object).map(ContentElement::Table),
            ObjectKind::EmbeddedFile => self.embedded_file(object).map(ContentElement::EmbeddedFile),
            ObjectKind::OutlineElement => {
                self.outline_element(object, ctx, out);
                None
            }
            _ => {
                self.unexpected(object, "where content was expected");
                None
            }
        };
        out.extend(element);
    }

    fn rich_text(&mut self, object: &RawObject, ctx: Context) -> Option<RichText> {
        let decoded = self.paragraph_text(object)?;
        if decoded.garbled {
            self.diag.warn(
                WarningKind::GarbledText,
                Some(object.id),
                format!("text looks corrupt: {:?}", preview(&decoded.text)),
            );
        }

        let base = RunStyle::from_object(object, self);
        let text = decoded.text;

        let mut runs = if text::has_field_codes(&text) {
            text::parse_hyperlink_field_codes(&text)
                .into_iter()
                .enumerate()
                .map(|(i, (segment, url))| {
                    let url = url.or_else(|| (i == 0).then(|| base.hyperlink.clone()).flatten());
                    let style = RunStyle {
                        hyperlink: url,
                        ..base.clone()
                    };
                    style.apply(TextRun::new(segment))
                })
                .collect()
        } else {
            self.styled_runs(object, &text, &base)
        };

        if decoded.garbled {
            runs = runs.into_iter().map(|run| run.with_garbled(true)).collect();
        }
        let runs = trim_runs(runs);
        if runs.is_empty() {
            return None;
        }

        Some(RichText {
            runs,
            heading_level: self.heading_level(object),
            list: ctx.list,
            indent_level: ctx.depth,
            is_title: ctx.in_title || object.flag(PropertyId::IsTitleText),
        })
    }

    /// Decode the paragraph text, preferring the Unicode property.
    fn paragraph_text(&mut self, object: &RawObject) -> Option<DecodedText> {
        let (value, encoding) = match object.get(PropertyId::RichEditTextUnicode) {
            Some(value) => (value, TextEncoding::Utf16),
            None => (object.get(PropertyId::TextExtendedAscii)?, TextEncoding::Ascii),
        };
        let decoded = self.decode(value, encoding)?;

        if decoded.text.is_empty() && decoded.method != text::DecodeMethod::Empty {
            self.diag.warn(
                WarningKind::UndecodableText,
                Some(object.id),
                "text payload decoded to nothing",
            );
        }
        if decoded.text.trim().is_empty() {
            return None;
        }
        Some(decoded)
    }

    fn decode(&self, value: &PropertyValue, encoding: TextEncoding) -> Option<DecodedText> {
        let threshold = self.config.garbled_threshold;
        match value {
            PropertyValue::Text(s) => Some(text::decode_text_value(s, encoding, threshold)),
            other => self
                .graph
                .payload(other)
                .map(|bytes| text::decode_text(bytes, encoding, threshold)),
        }
    }

    /// Read a metadata property (titles, names, URLs), trimmed; `None` if
    /// blank. Unlike paragraph text this never goes through hex decoding.
    fn plain_text(&self, object: &RawObject, prop: PropertyId) -> Option<String> {
        let text = match object.get(prop)? {
            PropertyValue::Text(s) => text::clean_text(s),
            other => text::decode_metadata(self.graph.payload(other)?),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Split paragraph text into runs using `TextRunIndex`.
    fn styled_runs(&self, object: &RawObject, text: &str, base: &RunStyle) -> Vec<TextRun> {
        let ends = match object.get(PropertyId::TextRunIndex) {
            Some(PropertyValue::Ints(ends)) if !ends.is_empty() => ends.as_slice(),
            _ => return vec![base.apply(TextRun::new(text))],
        };
        let formatting = object.refs(PropertyId::TextRunFormatting);

        split_at_utf16(text, ends)
            .into_iter()
            .enumerate()
            .filter(|(_, segment)| !segment.is_empty())
            .map(|(i, segment)| {
                let style = match formatting.get(i).and_then(|&id| self.lookup(id)) {
                    Some(fmt) => base.overlay(&RunStyle::from_object(fmt, self)),
                    None => base.clone(),
                };
                style.apply(TextRun::new(segment))
            })
            .collect()
    }

    fn heading_level(&self, object: &RawObject) -> u8 {
        let style_id = object
            .refs(PropertyId::ParagraphStyle)
            .first()
            .and_then(|&id| self.lookup(id))
            .and_then(|style| self.plain_text(style, PropertyId::ParagraphStyleId))
            .or_else(|| self.plain_text(object, PropertyId::ParagraphStyleId));

        match style_id.as_deref() {
            Some("h1") => 1,
            Some("h2") => 2,
            Some("h3") => 3,
            Some("h4") => 4,
            Some("h5") => 5,
            Some("h6") => 6,
            _ => 0,
        }
    }

    fn image(&mut self, object: &RawObject) -> Option<ImageElement> {
        let name = self.plain_text(object, PropertyId::ImageFilename);
        let data = object
            .get(PropertyId::PictureContainer)
            .and_then(|value| self.graph.payload(value))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        if data.is_empty() {
            self.diag.warn(
                WarningKind::MissingPayload,
                Some(object.id),
                format!("image {} has no data", name.as_deref().unwrap_or("(unnamed)")),
            );
            name.as_ref()?;
        }

        let format = detect_image_format(&data);
        if format == ImageFormat::Unknown && !data.is_empty() {
            self.diag.warn(
                WarningKind::UnknownImageFormat,
                Some(object.id),
                format!("{} byte image with an unrecognised signature", data.len()),
            );
        }

        let declared = match (
            object.uint(PropertyId::PictureWidth),
            object.uint(PropertyId::PictureHeight),
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => u32::try_from(w).ok().zip(u32::try_from(h).ok()),
            _ => None,
        };

        Some(ImageElement {
            dimensions: extract_image_dimensions(&data).or(declared),
            suggested_stem: name
                .as_deref()
                .map(file_stem)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            alt_text: self.plain_text(object, PropertyId::ImageAltText),
            format,
            data,
        })
    }

    fn table(&mut self, object: &'a RawObject) -> Option<TableElement> {
        let row_limit = object.uint(PropertyId::RowCount);
        let col_limit = object.uint(PropertyId::ColumnCount);
        if row_limit == Some(0) || col_limit == Some(0) {
            return None;
        }

        let mut rows = Vec::new();
        for &row_id in object.refs(PropertyId::ElementChildNodes) {
            let Some(row) = self.enter(row_id) else {
                continue;
            };
            if row.kind != ObjectKind::TableRow {
                self.unexpected(row, "inside a table");
                continue;
            }

            let mut cells = Vec::new();
            for &cell_id in row.refs(PropertyId::ElementChildNodes) {
                let Some(cell) = self.enter(cell_id) else {
                    continue;
                };
                if cell.kind != ObjectKind::TableCell {
                    self.unexpected(cell, "inside a table row");
                    continue;
                }
                let mut content = Vec::new();
                self.outline_children(cell, Context::default(), &mut content);
                cells.push(content);
            }
            if let Some(limit) = col_limit.and_then(|n| usize::try_from(n).ok()) {
                cells.truncate(limit);
            }
            rows.push(cells);
        }
        if let Some(limit) = row_limit.and_then(|n| usize::try_from(n).ok()) {
            rows.truncate(limit);
        }

        let mut table = TableElement::new(rows);
        if object.get(PropertyId::TableBordersVisible).is_some() {
            table.borders_visible = object.flag(PropertyId::TableBordersVisible);
        }
        Some(table)
    }

    fn embedded_file(&mut self, object: &RawObject) -> Option<EmbeddedFile> {
        let file_name = self.plain_text(object, PropertyId::EmbeddedFileName);
        let source_path = self.plain_text(object, PropertyId::SourceFilepath);
        let data = object
            .get(PropertyId::EmbeddedFileContainer)
            .and_then(|value| self.graph.payload(value))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        if data.is_empty() {
            self.diag.warn(
                WarningKind::MissingPayload,
                Some(object.id),
                format!(
                    "attachment {} has no data",
                    file_name.as_deref().unwrap_or("(unnamed)")
                ),
            );
            file_name.as_ref()?;
        }

        let extension = file_name
            .as_deref()
            .or(source_path.as_deref())
            .and_then(file_extension);

        Some(EmbeddedFile {
            data,
            file_name,
            extension,
            source_path,
        })
    }

    fn unexpected(&mut self, object: &RawObject, place: &str) {
        self.diag.warn(
            WarningKind::UnexpectedObject,
            Some(object.id),
            format!("{:?} object {place}", object.kind),
        );
    }
}

// ============================================================================
// Run styles
// ============================================================================

/// Style flags as found on one object; `None` means "not specified".
#[derive(Debug, Clone, Default)]
struct RunStyle {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strikethrough: Option<bool>,
    superscript: Option<bool>,
    subscript: Option<bool>,
    hyperlink: Option<String>,
}

impl RunStyle {
    fn from_object(object: &RawObject, walk: &Walk<'_>) -> Self {
        let flag = |prop| object.get(prop).map(PropertyValue::as_bool);
        Self {
            bold: flag(PropertyId::Bold),
            italic: flag(PropertyId::Italic),
            underline: flag(PropertyId::Underline),
            strikethrough: flag(PropertyId::Strikethrough),
            superscript: flag(PropertyId::Superscript),
            subscript: flag(PropertyId::Subscript),
            hyperlink: walk.plain_text(object, PropertyId::WzHyperlinkUrl),
        }
    }

    /// Values set on `other` win.
    fn overlay(&self, other: &RunStyle) -> Self {
        Self {
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikethrough: other.strikethrough.or(self.strikethrough),
            superscript: other.superscript.or(self.superscript),
            subscript: other.subscript.or(self.subscript),
            hyperlink: other.hyperlink.clone().or_else(|| self.hyperlink.clone()),
        }
    }

    fn apply(&self, run: TextRun) -> TextRun {
        let set = |v: Option<bool>| v.unwrap_or(false);
        let run = run
            .with_bold(set(self.bold))
            .with_italic(set(self.italic) || set(self.underline))
            .with_strikethrough(set(self.strikethrough))
            .with_superscript(set(self.superscript))
            .with_subscript(set(self.subscript));
        match &self.hyperlink {
            Some(url) => run.with_hyperlink(url),
            None => run,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Split text at run end offsets counted in UTF-16 code units.
///
/// Yields one segment per offset plus the remainder after the last one.
fn split_at_utf16(text: &str, ends: &[u32]) -> Vec<String> {
    let mut segments = Vec::with_capacity(ends.len() + 1);
    let mut current = String::new();
    let mut units: u32 = 0;
    let mut next_end = ends.iter().copied().peekable();

    for c in text.chars() {
        while next_end.peek().is_some_and(|&end| units >= end) {
            segments.push(std::mem::take(&mut current));
            next_end.next();
        }
        current.push(c);
        units += c.len_utf16() as u32;
    }
    for _ in next_end {
        segments.push(std::mem::take(&mut current));
    }
    segments.push(current);
    segments
}

/// Trim the paragraph's outer whitespace and drop empty runs.
fn trim_runs(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = runs.into_iter().filter(|r| !r.text().is_empty()).collect();

    while runs.first().is_some_and(|r| r.text().trim().is_empty()) {
        runs.remove(0);
    }
    while runs.last().is_some_and(|r| r.text().trim().is_empty()) {
        runs.pop();
    }

    let last = runs.len().saturating_sub(1);
    runs.into_iter()
        .enumerate()
        .map(|(i, run)| {
            let mut text = run.text();
            if i == 0 {
                text = text.trim_start();
            }
            if i == last {
                text = text.trim_end();
            }
            if text.len() == run.text().len() {
                run
            } else {
                retext(&run, text)
            }
        })
        .collect()
}

/// Copy of `run` with different text.
fn retext(run: &TextRun, text: &str) -> TextRun {
    let copy = TextRun::new(text)
        .with_bold(run.is_bold())
        .with_italic(run.is_italic())
        .with_strikethrough(run.is_strikethrough())
        .with_superscript(run.is_superscript())
        .with_subscript(run.is_subscript())
        .with_garbled(run.is_garbled());
    match run.hyperlink() {
        Some(url) => copy.with_hyperlink(url),
        None => copy,
    }
}

fn file_stem(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    }
}

fn file_extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let dot = base.rfind('.').filter(|&d| d > 0)?;
    let ext = &base[dot + 1..];
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawObject;

    fn text(s: &str) -> PropertyValue {
        PropertyValue::Text(s.to_string())
    }

    fn utf16(s: &str) -> PropertyValue {
        PropertyValue::Bytes(s.encode_utf16().flat_map(u16::to_le_bytes).collect())
    }

    fn para(id: u64, s: &str) -> RawObject {
        RawObject::new(id, ObjectKind::RichText).with(PropertyId::RichEditTextUnicode, utf16(s))
    }

    fn outline_element(id: u64, content: &[u64]) -> RawObject {
        RawObject::new(id, ObjectKind::OutlineElement).with_content(content)
    }

    /// Root page 1 with an outline holding the given outline elements.
    fn page_graph(title: &str, elements: &[u64]) -> RawObjectGraph {
        RawObjectGraph::new()
            .with_root(1)
            .with_object(
                RawObject::new(1, ObjectKind::PageNode)
                    .with(PropertyId::CachedTitleString, text(title))
                    .with_children(&[2]),
            )
            .with_object(RawObject::new(2, ObjectKind::OutlineNode).with_children(elements))
    }

    fn only_page(extraction: &Extraction) -> &Page {
        assert_eq!(extraction.pages.len(), 1);
        &extraction.pages[0]
    }

    fn rich(element: &ContentElement) -> &RichText {
        match element {
            ContentElement::RichText(r) => r,
            other => panic!("expected rich text, got {other:?}"),
        }
    }

    #[test]
    fn test_page_with_paragraphs() {
        let graph = page_graph("Standup", &[10, 11])
            .with_object(outline_element(10, &[20]))
            .with_object(outline_element(11, &[21]))
            .with_object(para(20, "First"))
            .with_object(para(21, "Second"));

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.title, "Standup");
        let texts: Vec<_> = page.elements.iter().map(|e| rich(e).plain_text()).collect();
        assert_eq!(texts, ["First", "Second"]);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_title_from_title_node() {
        let graph = RawObjectGraph::new()
            .with_root(1)
            .with_object(RawObject::new(1, ObjectKind::PageNode).with_children(&[2]))
            .with_object(RawObject::new(2, ObjectKind::TitleNode).with_children(&[3]))
            .with_object(outline_element(3, &[4]))
            .with_object(para(4, "  Weekly review "));

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.title, "Weekly review");
        assert!(page.elements.is_empty());
    }

    #[test]
    fn test_numeric_metadata_kept_verbatim() {
        let graph = page_graph("2024", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                RawObject::new(20, ObjectKind::Image)
                    .with(PropertyId::ImageFilename, text("0000"))
                    .with(PropertyId::PictureContainer, PropertyValue::Bytes(b"GIF89a".to_vec())),
            )
            .with_object(
                RawObject::new(9, ObjectKind::SectionMetaData)
                    .with(PropertyId::SectionDisplayName, utf16("1999")),
            );

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.title, "2024");
        assert_eq!(extraction.section_name.as_deref(), Some("1999"));
        let ContentElement::Image(image) = &page.elements[0] else {
            panic!("expected image");
        };
        assert_eq!(image.suggested_stem.as_deref(), Some("0000"));
    }

    #[test]
    fn test_default_title() {
        let graph = RawObjectGraph::new()
            .with_root(1)
            .with_object(RawObject::new(1, ObjectKind::PageNode));
        let config = ExtractConfig::default().with_default_title("Sans titre");
        let extraction = Extractor::with_config(config).extract(&graph);
        assert_eq!(only_page(&extraction).title, "Sans titre");
    }

    #[test]
    fn test_cycle_is_empty_contribution() {
        // Outline element 10 lists itself as a child
        let graph = page_graph("Loop", &[10]).with_object(
            outline_element(10, &[20]).with_children(&[10]),
        )
        .with_object(para(20, "once"));

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.elements.len(), 1);
        assert!(
            extraction
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::CycleDetected && w.object == Some(ObjectId(10)))
        );
    }

    #[test]
    fn test_dangling_reference_warns() {
        let graph = page_graph("Gone", &[99]);
        let extraction = Extractor::new().extract(&graph);
        assert!(only_page(&extraction).elements.is_empty());
        assert_eq!(extraction.warnings[0].kind, WarningKind::MissingObject);
    }

    #[test]
    fn test_styles_and_underline() {
        let graph = page_graph("Styles", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                para(20, "styled")
                    .with(PropertyId::Bold, PropertyValue::Bool(true))
                    .with(PropertyId::Underline, PropertyValue::Int(1)),
            );

        let extraction = Extractor::new().extract(&graph);
        let run = &rich(&only_page(&extraction).elements[0]).runs[0];
        assert!(run.is_bold());
        assert!(run.is_italic());
        assert!(!run.is_strikethrough());
    }

    #[test]
    fn test_run_index_splits_runs() {
        let graph = page_graph("Runs", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                para(20, "plain bold")
                    .with(PropertyId::TextRunIndex, PropertyValue::Ints(vec![6]))
                    .with(
                        PropertyId::TextRunFormatting,
                        PropertyValue::Refs(vec![ObjectId(30), ObjectId(31)]),
                    ),
            )
            .with_object(RawObject::new(30, ObjectKind::TextFormatting))
            .with_object(
                RawObject::new(31, ObjectKind::TextFormatting)
                    .with(PropertyId::Bold, PropertyValue::Bool(true)),
            );

        let extraction = Extractor::new().extract(&graph);
        let runs = &rich(&only_page(&extraction).elements[0]).runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text(), "plain ");
        assert!(runs[0].is_plain());
        assert_eq!(runs[1].text(), "bold");
        assert!(runs[1].is_bold());
        // Shared formatting objects are not "visited"
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_field_code_hyperlinks() {
        let graph = page_graph("Links", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(para(
                20,
                "Join | \u{FDDF}HYPERLINK \"https://meet.example/1\"Click here",
            ));

        let extraction = Extractor::new().extract(&graph);
        let runs = &rich(&only_page(&extraction).elements[0]).runs;
        assert_eq!(runs[0].text(), "Join | ");
        assert_eq!(runs[0].hyperlink(), None);
        assert_eq!(runs[1].text(), "Click here");
        assert_eq!(runs[1].hyperlink(), Some("https://meet.example/1"));
    }

    #[test]
    fn test_headings_and_lists() {
        let graph = page_graph("Structure", &[10, 11])
            .with_object(
                outline_element(10, &[20]).with_children(&[12]),
            )
            .with_object(
                outline_element(11, &[21]).with(
                    PropertyId::ListNodes,
                    PropertyValue::Refs(vec![ObjectId(40)]),
                ),
            )
            .with_object(
                outline_element(12, &[22]).with(
                    PropertyId::ListNodes,
                    PropertyValue::Refs(vec![ObjectId(41)]),
                ),
            )
            .with_object(para(20, "Heading").with(
                PropertyId::ParagraphStyle,
                PropertyValue::Refs(vec![ObjectId(50)]),
            ))
            .with_object(para(21, "numbered"))
            .with_object(para(22, "nested bullet"))
            .with_object(
                RawObject::new(40, ObjectKind::NumberList)
                    .with(PropertyId::NumberListFormat, text("\u{3}\u{0}.")),
            )
            .with_object(
                RawObject::new(41, ObjectKind::NumberList)
                    .with(PropertyId::NumberListFormat, text("\u{2022}")),
            )
            .with_object(
                RawObject::new(50, ObjectKind::ParagraphStyle)
                    .with(PropertyId::ParagraphStyleId, text("h2")),
            );

        let extraction = Extractor::new().extract(&graph);
        let elements = &only_page(&extraction).elements;
        let heading = rich(&elements[0]);
        assert_eq!(heading.heading_level, 2);

        let nested = rich(&elements[1]);
        assert_eq!(nested.plain_text(), "nested bullet");
        assert_eq!(nested.list, Some(ListKind::Unordered));
        assert_eq!(nested.indent_level, 1);

        let numbered = rich(&elements[2]);
        assert_eq!(numbered.list, Some(ListKind::Ordered));
        assert_eq!(numbered.indent_level, 0);
    }

    #[test]
    fn test_table_cells() {
        let graph = page_graph("Grid", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                RawObject::new(20, ObjectKind::Table)
                    .with(PropertyId::RowCount, PropertyValue::Int(1))
                    .with(PropertyId::ColumnCount, PropertyValue::Int(2))
                    .with_children(&[21]),
            )
            .with_object(RawObject::new(21, ObjectKind::TableRow).with_children(&[22, 23]))
            .with_object(RawObject::new(22, ObjectKind::TableCell).with_children(&[24]))
            .with_object(RawObject::new(23, ObjectKind::TableCell))
            .with_object(outline_element(24, &[25]))
            .with_object(para(25, "cell text"));

        let extraction = Extractor::new().extract(&graph);
        let ContentElement::Table(table) = &only_page(&extraction).elements[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.column_count(), 2);
        assert_eq!(rich(&table.rows[0][0][0]).plain_text(), "cell text");
        assert!(table.rows[0][1].is_empty());
    }

    #[test]
    fn test_image_from_blob() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x10\0\0\0\x08".to_vec();
        let graph = page_graph("Pics", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                RawObject::new(20, ObjectKind::Image)
                    .with(PropertyId::PictureContainer, PropertyValue::Blob("{b1}".into()))
                    .with(PropertyId::ImageFilename, text("diagram.png"))
                    .with(PropertyId::ImageAltText, text("Architecture")),
            )
            .with_blob("{b1}", png);

        let extraction = Extractor::new().extract(&graph);
        let ContentElement::Image(image) = &only_page(&extraction).elements[0] else {
            panic!("expected image");
        };
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.suggested_stem.as_deref(), Some("diagram"));
        assert_eq!(image.alt_text.as_deref(), Some("Architecture"));
        assert_eq!(image.dimensions, Some((16, 8)));
    }

    #[test]
    fn test_unknown_image_keeps_bytes() {
        let graph = page_graph("Pics", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                RawObject::new(20, ObjectKind::Image)
                    .with(PropertyId::PictureContainer, PropertyValue::Bytes(vec![1, 2, 3])),
            );

        let extraction = Extractor::new().extract(&graph);
        let ContentElement::Image(image) = &only_page(&extraction).elements[0] else {
            panic!("expected image");
        };
        assert_eq!(image.format, ImageFormat::Unknown);
        assert_eq!(image.data, [1, 2, 3]);
        assert_eq!(extraction.warnings[0].kind, WarningKind::UnknownImageFormat);
    }

    #[test]
    fn test_embedded_file_metadata() {
        let graph = page_graph("Files", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(
                RawObject::new(20, ObjectKind::EmbeddedFile)
                    .with(PropertyId::EmbeddedFileName, text("Budget Q3.XLSX"))
                    .with(PropertyId::SourceFilepath, text("C:\\docs\\Budget Q3.XLSX"))
                    .with(PropertyId::EmbeddedFileContainer, PropertyValue::Bytes(vec![7; 4])),
            );

        let extraction = Extractor::new().extract(&graph);
        let ContentElement::EmbeddedFile(file) = &only_page(&extraction).elements[0] else {
            panic!("expected attachment");
        };
        assert_eq!(file.file_name.as_deref(), Some("Budget Q3.XLSX"));
        assert_eq!(file.extension.as_deref(), Some("xlsx"));
        assert_eq!(file.data.len(), 4);
    }

    #[test]
    fn test_page_metadata() {
        let graph = RawObjectGraph::new()
            .with_root(1)
            .with_object(
                RawObject::new(1, ObjectKind::PageSeries).with_children(&[2, 3]),
            )
            .with_object(
                RawObject::new(2, ObjectKind::PageMetaData)
                    .with(PropertyId::CachedTitleString, text("From metadata"))
                    .with(PropertyId::PageLevel, PropertyValue::Int(2))
                    .with(PropertyId::CreationTimeStamp, PropertyValue::Int(0)),
            )
            .with_object(
                RawObject::new(3, ObjectKind::PageNode)
                    .with(PropertyId::Author, text("Dana")),
            )
            .with_object(
                RawObject::new(9, ObjectKind::SectionMetaData)
                    .with(PropertyId::SectionDisplayName, text("Work Log")),
            );

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.title, "From metadata");
        assert_eq!(page.level, 2);
        assert_eq!(page.author.as_deref(), Some("Dana"));
        assert_eq!(page.created, time32_to_datetime(0));
        assert_eq!(extraction.section_name.as_deref(), Some("Work Log"));
    }

    #[test]
    fn test_loose_content_becomes_one_page() {
        let graph = RawObjectGraph::new()
            .with_root(10)
            .with_object(outline_element(10, &[20]))
            .with_object(para(20, "orphan"));

        let extraction = Extractor::new().extract(&graph);
        let page = only_page(&extraction);
        assert_eq!(page.title, "Untitled");
        assert_eq!(page.elements.len(), 1);
    }

    #[test]
    fn test_empty_graph_has_no_pages() {
        let extraction = Extractor::new().extract(&RawObjectGraph::new());
        assert!(extraction.pages.is_empty());
    }

    #[test]
    fn test_garbled_text_is_flagged() {
        let graph = page_graph("Noise", &[10])
            .with_object(outline_element(10, &[20]))
            .with_object(para(20, "\u{E000}\u{E001}\u{E002}\u{E003}ab"));

        let extraction = Extractor::new().extract(&graph);
        let paragraph = rich(&only_page(&extraction).elements[0]);
        assert!(paragraph.is_garbled());
        assert!(
            extraction
                .warnings
                .iter()
                .any(|w| w.kind == WarningKind::GarbledText)
        );
    }

    #[test]
    fn test_split_at_utf16() {
        assert_eq!(split_at_utf16("abcdef", &[2, 4]), ["ab", "cd", "ef"]);
        // U+1F600 occupies two code units
        assert_eq!(split_at_utf16("😀x", &[2]), ["😀", "x"]);
        assert_eq!(split_at_utf16("ab", &[5]), ["ab", ""]);
    }
}
