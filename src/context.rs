use tracing::warn;

/// Category of a per-file problem that was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Broken hunk header or diff structure; the file was not reconciled.
    MalformedDiff,
    /// The working tree could not provide the file; it was not reconciled.
    MissingFile,
    /// An interface could not be scanned unambiguously and was discarded.
    ExtractionAmbiguity,
    /// The working tree content does not agree with the diff's new side.
    TreeMismatch,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::MalformedDiff => write!(f, "malformed diff"),
            WarningKind::MissingFile => write!(f, "missing file"),
            WarningKind::ExtractionAmbiguity => write!(f, "extraction ambiguity"),
            WarningKind::TreeMismatch => write!(f, "working tree mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Diff-relative path of the file concerned
    pub path: String,
    pub message: String,
}

/// Warnings gathered during one run.
///
/// Passed by `&mut` through the tokenizer consumer, the extractor and the
/// reconciliation engine. Every recorded warning is also logged.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: WarningKind, path: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(kind = %kind, path = %path, "{}", message);
        self.warnings.push(Warning {
            kind,
            path: path.to_string(),
            message,
        });
    }

    #[cfg(test)]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_keep_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(WarningKind::MissingFile, "a.idl", "not found");
        diagnostics.warn(WarningKind::MalformedDiff, "b.idl", "bad header");
        let kinds: Vec<WarningKind> = diagnostics.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::MissingFile, WarningKind::MalformedDiff]);
        assert_eq!(diagnostics.into_warnings()[1].path, "b.idl");
    }

    #[test]
    fn test_warning_kind_display() {
        assert_eq!(WarningKind::TreeMismatch.to_string(), "working tree mismatch");
        assert_eq!(WarningKind::ExtractionAmbiguity.to_string(), "extraction ambiguity");
    }
}
