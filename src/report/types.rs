use std::path::Path;

use crate::context::Warning;
use crate::reconcile::FileOutcome;

/// An interface that changed without a new IID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub interface: String,
    /// Diff-relative path of the file
    pub path: String,
    /// 1-based line of the declaration in the post-change file
    pub line: usize,
    /// First difference found between the two versions
    pub detail: Option<String>,
}

impl Finding {
    /// Last component of the path, as shown in the output line.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.path)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ERROR: Interface '{}', in file '{}' needs a new IID",
            self.interface,
            self.file_name()
        )
    }
}

/// Counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files_checked: usize,
    pub interfaces_compared: usize,
    pub flagged: usize,
    pub warnings: usize,
}

/// Everything one run produced, in output order.
#[derive(Debug)]
pub struct Report {
    pub files: Vec<FileOutcome>,
    pub findings: Vec<Finding>,
    pub warnings: Vec<Warning>,
    pub summary: Summary,
}
