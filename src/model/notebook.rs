use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::page::Page;

/// A section: the pages of one selected section file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Section {
    name: String,
    pages: Vec<Page>,
    source: PathBuf,
}

impl Section {
    /// Create a section. The name must not be blank.
    pub fn new(name: impl Into<String>, pages: Vec<Page>, source: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidModel("section name must not be empty".into()));
        }
        Ok(Self {
            name,
            pages,
            source: source.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The file this section was extracted from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// A notebook: the sections found in one input directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Notebook {
    name: String,
    sections: Vec<Section>,
}

impl Notebook {
    /// Create a notebook.
    ///
    /// Fails when the name is blank or two sections share a name; version
    /// selection guarantees one section per name.
    pub fn new(name: impl Into<String>, sections: Vec<Section>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidModel("notebook name must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for section in &sections {
            if !seen.insert(section.name()) {
                return Err(Error::InvalidModel(format!(
                    "notebook '{}' has more than one section named '{}'",
                    name,
                    section.name()
                )));
            }
        }

        Ok(Self { name, sections })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str) -> Section {
        Section::new(name, Vec::new(), format!("{name}.one")).unwrap()
    }

    #[test]
    fn test_blank_names_rejected() {
        assert!(Section::new("  ", Vec::new(), "x.one").is_err());
        assert!(Notebook::new("", Vec::new()).is_err());
    }

    #[test]
    fn test_duplicate_sections_rejected() {
        let err = Notebook::new("Work", vec![section("ADI"), section("ADI")]).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }

    #[test]
    fn test_sections_keep_order() {
        let notebook = Notebook::new("Work", vec![section("B"), section("A")]).unwrap();
        let names: Vec<_> = notebook.sections().iter().map(Section::name).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(notebook.sections()[0].source(), Path::new("B.one"));
    }
}
