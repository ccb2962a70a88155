//! Batch conversion: section files in, Markdown tree out.
//!
//! ```text
//! paths ─ group by directory ─ select versions ─┬─ read ─ parse ─ extract ─ Section
//!                                                └─ ... one per section key
//!       ─ Notebook ─ export each section ─ BatchReport
//! ```
//!
//! Sections are processed one after another. A failure in one section is
//! recorded in the report and the batch moves on; only an empty input is an
//! error for the whole run.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::Warning;
use crate::error::{Error, Result};
use crate::export::{ExportConfig, MarkdownExporter};
use crate::extract::{ExtractConfig, Extractor};
use crate::model::{Notebook, Section};
use crate::raw::ContainerParser;
use crate::select::{SelectorConfig, VersionSelector};

const UNTITLED_NOTEBOOK: &str = "Untitled";

/// Configuration for a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub selector: SelectorConfig,
    pub extract: ExtractConfig,
    pub export: ExportConfig,
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            export: ExportConfig::new(output_dir),
            ..Self::default()
        }
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_export(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }
}

/// Overall result of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Outcome {
    Success,
    /// Some sections failed, at least one succeeded.
    PartialFailure,
    /// Every section failed.
    TotalFailure,
}

/// A section that was converted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SectionReport {
    pub notebook: String,
    pub section: String,
    pub source: PathBuf,
    pub pages_written: usize,
    pub files: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// A section that could not be converted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SectionFailure {
    pub notebook: String,
    pub section: String,
    pub source: PathBuf,
    pub error: String,
}

impl fmt::Display for SectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.notebook, self.section, self.error)
    }
}

/// What a batch did.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct BatchReport {
    pub sections: Vec<SectionReport>,
    pub failures: Vec<SectionFailure>,
    /// Older section versions skipped by version selection.
    pub superseded: usize,
}

impl BatchReport {
    pub fn outcome(&self) -> Outcome {
        if self.failures.is_empty() {
            Outcome::Success
        } else if self.sections.is_empty() {
            Outcome::TotalFailure
        } else {
            Outcome::PartialFailure
        }
    }

    pub fn pages_written(&self) -> usize {
        self.sections.iter().map(|s| s.pages_written).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.sections.iter().map(|s| s.warnings.len()).sum()
    }
}

/// Runs selection, parsing, extraction and export over a set of files.
pub struct Pipeline<P> {
    parser: P,
    config: PipelineConfig,
}

impl<P: ContainerParser> Pipeline<P> {
    pub fn new(parser: P, config: PipelineConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert `paths`, grouping them into notebooks by parent directory.
    pub fn run<Q: AsRef<Path>>(&self, paths: &[Q]) -> Result<BatchReport> {
        if paths.is_empty() {
            return Err(Error::NoInput);
        }

        let mut groups: BTreeMap<PathBuf, Vec<&Path>> = BTreeMap::new();
        for path in paths {
            let path = path.as_ref();
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            groups.entry(dir).or_default().push(path);
        }

        let selector = VersionSelector::with_config(self.config.selector);
        let extractor = Extractor::with_config(self.config.extract.clone());
        let mut exporter = MarkdownExporter::with_config(self.config.export.clone());
        let mut report = BatchReport::default();

        for (dir, files) in groups {
            let notebook_name = notebook_name(&dir);
            let selection = selector.select(&files);
            report.superseded += selection.discarded_count();

            let mut sections = Vec::new();
            let mut warnings = Vec::new();
            for (key, path) in selection.iter() {
                match self.load_section(&extractor, key, path) {
                    Ok((section, section_warnings)) => {
                        sections.push(section);
                        warnings.push(section_warnings);
                    }
                    Err(e) => {
                        log::warn!("Skipping section '{key}': {e}");
                        report.failures.push(SectionFailure {
                            notebook: notebook_name.clone(),
                            section: key.to_string(),
                            source: path.to_path_buf(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            let Some(notebook) = assemble_notebook(notebook_name, sections, &mut report) else {
                continue;
            };
            for (section, warnings) in notebook.sections().iter().zip(warnings) {
                match exporter.export_section(notebook.name(), section) {
                    Ok(files) => report.sections.push(SectionReport {
                        notebook: notebook.name().to_string(),
                        section: section.name().to_string(),
                        source: section.source().to_path_buf(),
                        pages_written: section.pages().len(),
                        files,
                        warnings,
                    }),
                    Err(e) => {
                        log::warn!("Failed to write section '{}': {e}", section.name());
                        report.failures.push(SectionFailure {
                            notebook: notebook.name().to_string(),
                            section: section.name().to_string(),
                            source: section.source().to_path_buf(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        log::info!(
            "Converted {} section(s), {} page(s); {} failed, {} older version(s) skipped",
            report.sections.len(),
            report.pages_written(),
            report.failures.len(),
            report.superseded
        );
        Ok(report)
    }

    fn load_section(
        &self,
        extractor: &Extractor,
        key: &str,
        path: &Path,
    ) -> Result<(Section, Vec<Warning>)> {
        let bytes = fs::read(path).map_err(|e| Error::at(path, e))?;
        let graph = self.parser.parse(&bytes).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.message,
        })?;

        let extraction = extractor.extract(&graph);
        if let Some(display) = extraction.section_name.as_deref()
            && display != key
        {
            log::debug!("Section '{key}' is titled '{display}' inside the file");
        }
        log::info!(
            "Extracted {} page(s) from {}",
            extraction.pages.len(),
            path.display()
        );

        let section = Section::new(key, extraction.pages, path)?;
        Ok((section, extraction.warnings))
    }
}

/// Build a notebook, recording every section as failed if it is rejected.
fn assemble_notebook(
    name: String,
    sections: Vec<Section>,
    report: &mut BatchReport,
) -> Option<Notebook> {
    let members: Vec<(String, PathBuf)> = sections
        .iter()
        .map(|s| (s.name().to_string(), s.source().to_path_buf()))
        .collect();

    match Notebook::new(name.clone(), sections) {
        Ok(notebook) => Some(notebook),
        Err(e) => {
            log::warn!("Skipping notebook '{name}': {e}");
            report
                .failures
                .extend(members.into_iter().map(|(section, source)| SectionFailure {
                    notebook: name.clone(),
                    section,
                    source,
                    error: e.to_string(),
                }));
            None
        }
    }
}

fn notebook_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNTITLED_NOTEBOOK.to_string())
}
