/// A single file block within the diff.
/// Populated by the tokenizer in tokenizer.rs.
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Path from the `---` header, `None` for `/dev/null` (file added)
    pub old_path: Option<String>,
    /// Path from the `+++` header, `None` for `/dev/null` (file deleted)
    pub new_path: Option<String>,
    /// Hunks (contiguous changed regions), in diff order
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// The path to look up in the working tree: the new path, or the old
    /// one when the file was deleted.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        self.new_path.is_none()
    }

    #[cfg(test)]
    pub fn is_new(&self) -> bool {
        self.old_path.is_none()
    }
}

/// Tag carried by every content line of a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One content line of a hunk, without its leading marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone)]
pub struct Hunk {
    /// Starting line number in the old file
    pub old_start: usize,
    /// Number of lines in the old file
    pub old_len: usize,
    /// Starting line number in the new file
    pub new_start: usize,
    /// Number of lines in the new file
    pub new_len: usize,
    /// Tagged content lines
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Old-version text of this hunk's span: context and removed lines, in order.
    pub fn old_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Added)
            .map(|l| l.text.as_str())
    }

    /// New-version text of this hunk's span: context and added lines, in order.
    pub fn new_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Removed)
            .map(|l| l.text.as_str())
    }

    /// Zero-based index of the first new-file line this hunk covers.
    ///
    /// With an empty new range, `new_start` names the line the hunk is
    /// inserted after, so the span begins one line later.
    pub fn new_span_begin(&self) -> usize {
        if self.new_len == 0 {
            self.new_start
        } else {
            self.new_start.saturating_sub(1)
        }
    }
}
