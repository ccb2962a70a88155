//! Pure Markdown generation from the document model.
//!
//! The design separates rendering from I/O:
//!
//! - [`escape`]: escaping for table cells, link labels and asset paths
//! - [`naming`]: portable file names and per-directory collision handling
//! - [`render`]: page → Markdown text plus the assets it links to
//!
//! The export layer ([`crate::export`]) decides where pages go and writes
//! the files.
//!
//! ## Output conventions
//!
//! - The page title becomes a level-one heading; every block is followed by
//!   a blank line.
//! - Run text is written verbatim. Styles nest as link, italic, bold,
//!   strikethrough, `<sup>`, `<sub>` from the inside out.
//! - Lists indent three spaces per level; ordered counters are kept per
//!   level and restart after any non-list block.
//! - Tables always get a header separator after the first row.
//! - Images live in `images/` and attachments in `attachments/` next to the
//!   page, linked with percent-encoded relative paths.

mod escape;
mod naming;
mod render;

pub use escape::{encode_path_segment, escape_link_label, escape_link_target, escape_table_cell};
pub use naming::{UniqueNames, sanitize_filename, split_extension};
pub use render::{
    ATTACHMENTS_DIR, Asset, AssetNames, IMAGES_DIR, MarkdownConfig, RenderResult, render_page,
    render_run,
};
