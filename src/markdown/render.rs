//! Page → Markdown rendering.
//!
//! Rendering is pure: it produces the page text plus the list of asset
//! files the text links to. Writing anything to disk is the exporter's job.
//! Asset names are reserved in the caller's [`AssetNames`], so pages
//! rendered against the same names never overwrite each other's files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::{
    ContentElement, EmbeddedFile, ImageElement, ListKind, Page, RichText, TableElement, TextRun,
};

use super::escape::{encode_path_segment, escape_link_label, escape_link_target, escape_table_cell};
use super::naming::{UniqueNames, sanitize_filename, split_extension};

/// Directory for images, relative to the page.
pub const IMAGES_DIR: &str = "images";
/// Directory for attachments, relative to the page.
pub const ATTACHMENTS_DIR: &str = "attachments";

const LIST_INDENT: &str = "   ";

/// Configuration for Markdown rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownConfig {
    /// Append an `*Author: ...*` footer when the page has an author.
    pub include_author: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            include_author: true,
        }
    }
}

/// Image and attachment names handed out so far.
#[derive(Debug, Clone, Default)]
pub struct AssetNames {
    images: UniqueNames,
    attachments: UniqueNames,
}

impl AssetNames {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A binary file referenced from the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset<'a> {
    /// Path relative to the page's directory, e.g. `images/chart.png`.
    pub path: PathBuf,
    pub data: &'a [u8],
}

/// Result of rendering one page.
#[derive(Debug, Clone)]
pub struct RenderResult<'a> {
    /// The rendered markdown content.
    pub content: String,
    /// Files the content links to, in document order.
    pub assets: Vec<Asset<'a>>,
}

/// Render a page to Markdown.
pub fn render_page<'a>(
    page: &'a Page,
    config: &MarkdownConfig,
    names: &mut AssetNames,
) -> RenderResult<'a> {
    RenderContext::new(page, config, names).render()
}

/// Render one text run with its inline styling.
///
/// Styles nest from the inside out as link, italic, bold, strikethrough,
/// superscript, subscript. Whitespace at either end of the run stays
/// outside the markers, and unstyled or blank runs come back unchanged.
///
/// # Examples
///
/// ```
/// use onenote_md::markdown::render_run;
/// use onenote_md::model::TextRun;
///
/// assert_eq!(render_run(&TextRun::new("plain *text*")), "plain *text*");
/// let run = TextRun::new("both ").with_bold(true).with_italic(true);
/// assert_eq!(render_run(&run), "***both*** ");
/// ```
pub fn render_run(run: &TextRun) -> String {
    let text = run.text();
    if run.is_plain() || text.trim().is_empty() {
        return text.to_string();
    }

    let (lead, core, trail) = split_whitespace(text);

    let mut out = match run.hyperlink() {
        Some(url) => format!("[{}]({})", escape_link_label(core), escape_link_target(url)),
        None => core.to_string(),
    };
    if run.is_italic() {
        out = format!("*{out}*");
    }
    if run.is_bold() {
        out = format!("**{out}**");
    }
    if run.is_strikethrough() {
        out = format!("~~{out}~~");
    }
    if run.is_superscript() {
        out = format!("<sup>{out}</sup>");
    }
    if run.is_subscript() {
        out = format!("<sub>{out}</sub>");
    }

    format!("{lead}{out}{trail}")
}

/// Heading text keeps links but drops every other inline style.
fn render_heading_run(run: &TextRun) -> String {
    let text = run.text();
    match run.hyperlink() {
        Some(url) if !text.trim().is_empty() => {
            let (lead, core, trail) = split_whitespace(text);
            format!(
                "{lead}[{}]({}){trail}",
                escape_link_label(core),
                escape_link_target(url)
            )
        }
        _ => text.to_string(),
    }
}

fn split_whitespace(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    (&text[..start], &text[start..end], &text[end..])
}

/// Rendering state for one page.
struct RenderContext<'a, 'n> {
    page: &'a Page,
    config: &'n MarkdownConfig,
    names: &'n mut AssetNames,
    assets: Vec<Asset<'a>>,
    /// Ordered-list counters by indent level.
    counters: BTreeMap<u8, usize>,
    image_count: usize,
    attachment_count: usize,
}

impl<'a, 'n> RenderContext<'a, 'n> {
    fn new(page: &'a Page, config: &'n MarkdownConfig, names: &'n mut AssetNames) -> Self {
        Self {
            page,
            config,
            names,
            assets: Vec::new(),
            counters: BTreeMap::new(),
            image_count: 0,
            attachment_count: 0,
        }
    }

    fn render(mut self) -> RenderResult<'a> {
        let page = self.page;
        let mut lines: Vec<String> = Vec::new();

        if !page.title.trim().is_empty() {
            lines.push(format!("# {}", page.title.trim()));
            lines.push(String::new());
        }

        for element in &page.elements {
            let block = self.block(element);
            if !block.is_empty() {
                lines.push(block);
                lines.push(String::new());
            }
        }

        if self.config.include_author
            && let Some(author) = page.author.as_deref().filter(|a| !a.trim().is_empty())
        {
            lines.push("---".to_string());
            lines.push(format!("*Author: {}*", author.trim()));
            lines.push(String::new());
        }

        let mut content = lines.join("\n");
        if !content.ends_with('\n') {
            content.push('\n');
        }

        RenderResult {
            content,
            assets: self.assets,
        }
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    fn block(&mut self, element: &'a ContentElement) -> String {
        if !matches!(element, ContentElement::RichText(RichText { list: Some(_), .. })) {
            self.counters.clear();
        }

        match element {
            ContentElement::RichText(rich) => self.rich_text(rich),
            ContentElement::Image(image) => self.image(image),
            ContentElement::Table(table) => self.table(table),
            ContentElement::EmbeddedFile(file) => self.embedded_file(file),
        }
    }

    fn rich_text(&mut self, rich: &RichText) -> String {
        // The `# title` line already carries it.
        if rich.is_title && rich.plain_text().trim() == self.page.title.trim() {
            return String::new();
        }

        if rich.heading_level > 0 {
            let text: String = rich.runs.iter().map(render_heading_run).collect();
            let text = text.trim();
            if text.is_empty() {
                return String::new();
            }
            let level = usize::from(rich.heading_level.min(6));
            return format!("{} {}", "#".repeat(level), text);
        }

        let text = inline(rich);
        if text.is_empty() {
            return String::new();
        }

        let indent = LIST_INDENT.repeat(usize::from(rich.indent_level));
        match rich.list {
            Some(ListKind::Ordered) => {
                let level = rich.indent_level;
                self.counters.retain(|&l, _| l <= level);
                let counter = self.counters.entry(level).or_insert(0);
                *counter += 1;
                format!("{indent}{counter}. {text}")
            }
            Some(ListKind::Unordered) => format!("{indent}- {text}"),
            None if rich.indent_level > 0 => format!("{indent}- {text}"),
            None => text,
        }
    }

    fn image(&mut self, image: &'a ImageElement) -> String {
        self.image_count += 1;
        let alt = image
            .alt_text
            .as_deref()
            .or(image.suggested_stem.as_deref())
            .unwrap_or("image");

        if image.data.is_empty() {
            return format!("[{}]", escape_link_label(alt));
        }

        let stem = match image.suggested_stem.as_deref() {
            Some(stem) if !stem.trim().is_empty() => sanitize_filename(stem),
            _ => format!("image_{:03}", self.image_count),
        };
        let name = self.names.images.claim(&stem, Some(image.format.extension()));
        let link = self.push_asset(IMAGES_DIR, &name, &image.data);
        format!("![{}]({link})", escape_link_label(alt))
    }

    fn embedded_file(&mut self, file: &'a EmbeddedFile) -> String {
        self.attachment_count += 1;
        let label = file.file_name.as_deref().unwrap_or("attachment");

        if file.data.is_empty() {
            return format!("[{}]", escape_link_label(label));
        }

        let name = match file.file_name.as_deref() {
            Some(original) if !original.trim().is_empty() => {
                let (stem, ext) = split_extension(original.trim());
                let ext = ext.map(sanitize_filename);
                self.names
                    .attachments
                    .claim(&sanitize_filename(stem), ext.as_deref())
            }
            _ => {
                let stem = format!("attachment_{:03}", self.attachment_count);
                let ext = file.extension.as_deref().unwrap_or("bin");
                self.names.attachments.claim(&stem, Some(ext))
            }
        };
        let link = self.push_asset(ATTACHMENTS_DIR, &name, &file.data);
        format!("[{}]({link})", escape_link_label(label))
    }

    fn push_asset(&mut self, dir: &str, name: &str, data: &'a [u8]) -> String {
        self.assets.push(Asset {
            path: PathBuf::from(dir).join(name),
            data,
        });
        format!("{dir}/{}", encode_path_segment(name))
    }

    fn table(&mut self, table: &'a TableElement) -> String {
        if table.rows.is_empty() {
            return String::new();
        }

        let width = table.column_count().max(1);
        let mut lines = Vec::with_capacity(table.rows.len() + 1);

        for (i, row) in table.rows.iter().enumerate() {
            let mut cells: Vec<String> = row.iter().map(|cell| self.cell(cell)).collect();
            cells.resize(width, " ".to_string());
            lines.push(format!("| {} |", cells.join(" | ")));

            if i == 0 {
                lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
            }
        }

        lines.join("\n")
    }

    /// Render a table cell's content on one line.
    fn cell(&mut self, content: &'a [ContentElement]) -> String {
        let parts: Vec<String> = content
            .iter()
            .map(|element| self.inline_element(element))
            .filter(|part| !part.trim().is_empty())
            .collect();
        escape_table_cell(&parts.join(" "))
    }

    fn inline_element(&mut self, element: &'a ContentElement) -> String {
        match element {
            ContentElement::RichText(rich) if rich.heading_level > 0 => {
                rich.runs.iter().map(render_heading_run).collect()
            }
            ContentElement::RichText(rich) => inline(rich),
            ContentElement::Image(image) => self.image(image),
            ContentElement::EmbeddedFile(file) => self.embedded_file(file),
            ContentElement::Table(inner) => {
                let parts: Vec<String> = inner
                    .rows
                    .iter()
                    .flatten()
                    .flatten()
                    .map(|element| self.inline_element(element))
                    .filter(|part| !part.trim().is_empty())
                    .collect();
                parts.join(" ")
            }
        }
    }
}

fn inline(rich: &RichText) -> String {
    rich.runs.iter().map(render_run).collect::<String>().trim().to_string()
}
