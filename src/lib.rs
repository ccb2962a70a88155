//! # onenote-md
//!
//! Convert parsed OneNote sections into a tree of Markdown files with their
//! images and attachments.
//!
//! ## Features
//!
//! - Pick the newest copy of each section from dated backups
//!   (`Notes (On 2-25-26).one`)
//! - Decode OneNote text payloads (UTF-16, hex, single-byte) without ever
//!   failing on bad input
//! - Rich text styles, headings, nested lists, tables, images and embedded
//!   files
//! - Nested (`notebook/section/page.md`) or flat output layouts
//! - Per-section failure isolation with a structured [`BatchReport`]
//!
//! Decoding the MS-ONESTORE container itself is left to a
//! [`ContainerParser`] implementation, which turns file bytes into a
//! [`RawObjectGraph`]. With the `json` feature, [`JsonGraphParser`] reads
//! graph dumps written as JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use onenote_md::{JsonGraphParser, Pipeline, PipelineConfig, discover_sections};
//!
//! let files = discover_sections(Path::new("backup"), "one.json")?;
//! let pipeline = Pipeline::new(JsonGraphParser::new(), PipelineConfig::new("markdown"));
//! let report = pipeline.run(&files)?;
//! println!("{} page(s) written", report.pages_written());
//! # Ok::<(), onenote_md::Error>(())
//! ```
//!
//! ## Working with the pieces
//!
//! Each stage can be used on its own:
//!
//! ```
//! use onenote_md::extract::Extractor;
//! use onenote_md::markdown::{AssetNames, MarkdownConfig, render_page};
//! use onenote_md::raw::{ObjectKind, PropertyId, PropertyValue, RawObject, RawObjectGraph};
//!
//! let graph = RawObjectGraph::new()
//!     .with_root(1)
//!     .with_object(
//!         RawObject::new(1, ObjectKind::PageNode)
//!             .with(PropertyId::CachedTitleString, PropertyValue::Text("Hello".into())),
//!     );
//!
//! let extraction = Extractor::new().extract(&graph);
//! let page = &extraction.pages[0];
//! let rendered = render_page(page, &MarkdownConfig::default(), &mut AssetNames::new());
//! assert_eq!(rendered.content, "# Hello\n");
//! ```

pub mod diagnostics;
pub mod discover;
pub mod error;
pub mod export;
pub mod extract;
pub mod markdown;
pub mod model;
pub mod pipeline;
pub mod raw;
pub mod select;
pub mod util;

pub use diagnostics::{Warning, WarningKind};
pub use discover::{SECTION_EXTENSION, discover_sections};
pub use error::{Error, Result};
pub use export::{ExportConfig, Layout, MarkdownExporter};
pub use extract::{ExtractConfig, Extraction, Extractor};
pub use markdown::MarkdownConfig;
pub use model::{ContentElement, Notebook, Page, Section, TextRun};
pub use pipeline::{BatchReport, Outcome, Pipeline, PipelineConfig, SectionFailure, SectionReport};
#[cfg(feature = "json")]
pub use raw::JsonGraphParser;
pub use raw::{ContainerParser, ParseError, RawObjectGraph};
pub use select::{SelectorConfig, Selection, VersionSelector};
