//! Writing rendered pages and assets to disk.
//!
//! The [`MarkdownExporter`] maps sections onto output directories, picks
//! collision-free page file names and writes each page with its assets.
//!
//! # Layouts
//!
//! ```text
//! Nested                                Flat
//! out/                                  out/
//! └── Work/                             ├── Standup.md
//!     └── Meetings/                     ├── Standup (2).md
//!         ├── Standup.md                ├── images/
//!         ├── images/chart.png          │   └── chart.png
//!         └── attachments/notes.pdf     └── attachments/
//! ```
//!
//! Page file names are unique per output directory. In flat mode all
//! sections share the root directory and therefore one scope, so pages from
//! different sections that share a title are numbered.
//!
//! Image and attachment names are claimed in a single scope for the whole
//! export, whatever the layout. A page therefore links to the same asset
//! names, and renders to the same Markdown, in flat and nested mode.
//!
//! # Example
//!
//! ```no_run
//! use onenote_md::export::{ExportConfig, Layout, MarkdownExporter};
//! use onenote_md::model::{Notebook, Page, Section};
//!
//! let section = Section::new("Meetings", vec![Page::new("Standup", vec![])], "Meetings.one")?;
//! let notebook = Notebook::new("Work", vec![section])?;
//!
//! let config = ExportConfig::new("out").with_layout(Layout::Flat);
//! let written = MarkdownExporter::with_config(config).export_notebook(&notebook)?;
//! println!("wrote {} file(s)", written.len());
//! # Ok::<(), onenote_md::Error>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::markdown::{AssetNames, MarkdownConfig, UniqueNames, render_page, sanitize_filename};
use crate::model::{Notebook, Section};

/// Directory layout of the output tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Layout {
    /// `<root>/<notebook>/<section>/<page>.md`
    #[default]
    Nested,
    /// `<root>/<page>.md`
    Flat,
}

/// Configuration for Markdown export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub layout: Layout,
    pub markdown: MarkdownConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self::new("output")
    }
}

impl ExportConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout: Layout::default(),
            markdown: MarkdownConfig::default(),
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_markdown(mut self, markdown: MarkdownConfig) -> Self {
        self.markdown = markdown;
        self
    }
}

/// Exporter for Markdown output.
///
/// Holds the page names of every directory written so far and the asset
/// names of the whole export, so exporting several sections through one
/// exporter never overwrites its own output.
#[derive(Debug, Default)]
pub struct MarkdownExporter {
    config: ExportConfig,
    pages: HashMap<PathBuf, UniqueNames>,
    assets: AssetNames,
}

impl MarkdownExporter {
    /// Create an exporter writing a nested tree under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(ExportConfig::new(output_dir))
    }

    /// Create a MarkdownExporter with the specified configuration.
    pub fn with_config(config: ExportConfig) -> Self {
        Self {
            config,
            pages: HashMap::new(),
            assets: AssetNames::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Directory that receives the pages of a section.
    pub fn section_dir(&self, notebook: &str, section: &str) -> PathBuf {
        match self.config.layout {
            Layout::Flat => self.config.output_dir.clone(),
            Layout::Nested => self
                .config
                .output_dir
                .join(sanitize_filename(notebook))
                .join(sanitize_filename(section)),
        }
    }

    /// Export every section of a notebook. Stops at the first failure.
    pub fn export_notebook(&mut self, notebook: &Notebook) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for section in notebook.sections() {
            written.extend(self.export_section(notebook.name(), section)?);
        }
        Ok(written)
    }

    /// Export one section, returning every file written.
    ///
    /// Directories are created as needed and existing files are replaced.
    pub fn export_section(&mut self, notebook: &str, section: &Section) -> Result<Vec<PathBuf>> {
        let dir = self.section_dir(notebook, section.name());
        create_dir(&dir)?;

        let config = &self.config.markdown;
        let page_names = self.pages.entry(dir.clone()).or_default();
        let mut written = Vec::new();

        for page in section.pages() {
            let rendered = render_page(page, config, &mut self.assets);
            let file_name = page_names.claim(&sanitize_filename(&page.title), Some("md"));
            let page_path = dir.join(&file_name);

            write_file(&page_path, rendered.content.as_bytes())?;
            log::info!("Wrote {}", page_path.display());
            written.push(page_path);

            for asset in rendered.assets {
                let asset_path = dir.join(&asset.path);
                if let Some(parent) = asset_path.parent() {
                    create_dir(parent)?;
                }
                write_file(&asset_path, asset.data)?;
                log::debug!("Wrote {} ({} bytes)", asset_path.display(), asset.data.len());
                written.push(asset_path);
            }
        }

        Ok(written)
    }
}

/// `create_dir_all`, where a directory that already exists is success.
fn create_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(Error::at(dir, e)),
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).map_err(|e| Error::at(path, e))
}
