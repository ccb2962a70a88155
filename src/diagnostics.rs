//! Non-fatal conditions observed while extracting and exporting.
//!
//! Every recoverable problem is recorded as a [`Warning`] and logged, so
//! degraded output is always observable even when processing continues.

use std::fmt;

use crate::raw::ObjectId;

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum WarningKind {
    /// A text payload decoded to nothing usable.
    UndecodableText,
    /// Decoded text failed the printable-character heuristic.
    GarbledText,
    /// An image payload matched none of the known signatures.
    UnknownImageFormat,
    /// An image or attachment had no bytes to write.
    MissingPayload,
    /// An object was reached a second time while walking the graph.
    CycleDetected,
    /// A reference pointed at an object that is not in the graph.
    MissingObject,
    /// An object of an unexpected kind appeared where content was expected.
    UnexpectedObject,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::UndecodableText => "undecodable text",
            WarningKind::GarbledText => "garbled text",
            WarningKind::UnknownImageFormat => "unknown image format",
            WarningKind::MissingPayload => "missing payload",
            WarningKind::CycleDetected => "cycle detected",
            WarningKind::MissingObject => "missing object",
            WarningKind::UnexpectedObject => "unexpected object",
        };
        f.write_str(label)
    }
}

/// A recorded recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Warning {
    pub kind: WarningKind,
    /// Raw object the problem was found on, if any.
    #[cfg_attr(feature = "json", serde(skip_serializing_if = "Option::is_none"))]
    pub object: Option<ObjectId>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object {
            Some(ObjectId(id)) => write!(f, "{} (object {}): {}", self.kind, id, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Accumulates warnings and mirrors each one to the `log` facade.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: WarningKind, object: Option<ObjectId>, message: impl Into<String>) {
        let warning = Warning {
            kind,
            object,
            message: message.into(),
        };
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut diag = Diagnostics::new();
        diag.warn(WarningKind::CycleDetected, Some(ObjectId(7)), "revisited");
        diag.warn(WarningKind::MissingPayload, None, "image has no data");

        let rendered: Vec<String> = diag.warnings().iter().map(ToString::to_string).collect();
        assert_eq!(rendered[0], "cycle detected (object 7): revisited");
        assert_eq!(rendered[1], "missing payload: image has no data");
        assert_eq!(diag.count(WarningKind::CycleDetected), 1);
    }
}
