//! Document model for exported notebooks.
//!
//! This module contains:
//! - Notebook and section containers
//! - Page metadata and content
//! - Content elements (rich text, images, tables, attachments)
//! - Immutable text runs
//!
//! Ownership is strictly top-down: a notebook owns its sections, a section
//! its pages, a page its elements. Nothing holds a reference to its parent.

mod content;
mod notebook;
mod page;

pub use content::{
    ContentElement, EmbeddedFile, ImageElement, ImageFormat, ListKind, RichText, TableElement,
    TextRun,
};
pub use notebook::{Notebook, Section};
pub use page::Page;
