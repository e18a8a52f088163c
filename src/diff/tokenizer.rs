use std::path::Path;

use tracing::debug;

use super::types::{DiffLine, FileDiff, Hunk, LineKind};
use super::DiffError;

/// Lazy iterator over the file blocks of a unified diff.
///
/// Each item is one file's parsed hunks, or the error that made that
/// file's block unusable. A malformed block never stops the iteration:
/// the next call resumes at the following block. Blocks whose path does
/// not carry a recognized extension are skipped without being yielded.
///
/// The iterator holds no state beyond a cursor into the borrowed text, so
/// calling [`file_blocks`] again over the same text replays it exactly.
pub struct FileBlocks<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    extensions: &'a [String],
}

/// Split `raw_diff` into file blocks, keeping only files whose extension is
/// one of `extensions` (lowercase, without the leading dot).
///
/// A file block starts at a `diff --git` / `diff -r` line or at a
/// `--- old` / `+++ new` header pair. Hunks start with:
///   @@ -{old_start}[,{old_len}] +{new_start}[,{new_len}] @@
///
/// Lines inside a hunk are prefixed with:
///   '+' for additions
///   '-' for removals
///   ' ' for context (a line with no marker is taken as context as is)
pub fn file_blocks<'a>(raw_diff: &'a str, extensions: &'a [String]) -> FileBlocks<'a> {
    FileBlocks {
        lines: raw_diff.lines().collect(),
        pos: 0,
        extensions,
    }
}

impl<'a> Iterator for FileBlocks<'a> {
    type Item = Result<FileDiff, DiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.find_block_start()?;
            let end = self.find_block_end(start);
            self.pos = end.max(start + 1);

            let block = &self.lines[start..end];
            match parse_block(block, start + 1) {
                Ok(file) if !self.is_recognized(file.path()) => {
                    debug!(path = %file.path(), "skipping file without an interface-definition extension");
                }
                Err(DiffError::Malformed { ref path, .. }) if !self.is_recognized(path) => {
                    debug!(path = %path, "skipping malformed block of a non-interface file");
                }
                result => return Some(result),
            }
        }
    }
}

impl<'a> FileBlocks<'a> {
    fn is_recognized(&self, path: &str) -> bool {
        // Unknown paths stay in so that their errors surface.
        if path == UNKNOWN_PATH {
            return true;
        }
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|known| *known == ext)
            })
            .unwrap_or(false)
    }

    fn is_header_pair(&self, i: usize) -> bool {
        self.lines[i].starts_with("--- ")
            && self
                .lines
                .get(i + 1)
                .is_some_and(|next| next.starts_with("+++ "))
    }

    /// Skip preamble text (commit messages, diffstats) up to the next block.
    fn find_block_start(&self) -> Option<usize> {
        (self.pos..self.lines.len())
            .find(|&i| is_diff_command(self.lines[i]) || self.is_header_pair(i))
    }

    /// Index one past the last line of the block beginning at `start`.
    ///
    /// Hunk lengths decide which lines are content, so a removed line that
    /// reads `-- x` is never taken for the next header.
    fn find_block_end(&self, start: usize) -> usize {
        let mut saw_paths = false;
        let mut old_left = 0usize;
        let mut new_left = 0usize;
        let mut i = start;

        while i < self.lines.len() {
            let line = self.lines[i];

            if old_left > 0 || new_left > 0 {
                match line.chars().next() {
                    Some('+') => new_left = new_left.saturating_sub(1),
                    Some('-') => old_left = old_left.saturating_sub(1),
                    Some('\\') => {}
                    Some(_) if ends_open_hunk(line) => {
                        // Truncated hunk: let the header checks below see this line.
                        old_left = 0;
                        new_left = 0;
                        continue;
                    }
                    _ => {
                        old_left = old_left.saturating_sub(1);
                        new_left = new_left.saturating_sub(1);
                    }
                }
                i += 1;
                continue;
            }

            if i > start && is_diff_command(line) {
                return i;
            }
            if self.is_header_pair(i) {
                if saw_paths {
                    return i;
                }
                saw_paths = true;
                i += 2;
                continue;
            }
            if line == "-- " {
                // Mail signature separator after the last hunk of a patch series.
                return i;
            }
            if line.starts_with("@@") {
                if let Ok((_, old_len, _, new_len)) = parse_hunk_header(line) {
                    old_left = old_len;
                    new_left = new_len;
                }
            }
            i += 1;
        }
        self.lines.len()
    }
}

const UNKNOWN_PATH: &str = "<unknown>";

/// `diff --git a/x b/x` or `diff -r rev path`, never prose that starts with "diff".
fn is_diff_command(line: &str) -> bool {
    line.starts_with("diff --git ") || line.starts_with("diff -r ")
}

/// Lines that cannot be hunk content even while a hunk expects more.
fn ends_open_hunk(line: &str) -> bool {
    is_diff_command(line) || line.starts_with("@@")
}

struct OpenHunk {
    hunk: Hunk,
    old_left: usize,
    new_left: usize,
}

/// Parse one file block. `first_line` is the 1-based diff line number of
/// `block[0]`, used in error messages.
fn parse_block(block: &[&str], first_line: usize) -> Result<FileDiff, DiffError> {
    let mut git_paths: Option<(String, String)> = None;
    let mut old_header: Option<Option<String>> = None;
    let mut new_header: Option<Option<String>> = None;
    let mut hunks = Vec::new();
    let mut open: Option<OpenHunk> = None;

    let malformed = |old: &Option<Option<String>>,
                     new: &Option<Option<String>>,
                     git: &Option<(String, String)>,
                     line: usize,
                     reason: String| {
        let path = new
            .clone()
            .flatten()
            .or_else(|| old.clone().flatten())
            .or_else(|| git.as_ref().map(|(_, b)| b.clone()))
            .unwrap_or_else(|| UNKNOWN_PATH.to_string());
        DiffError::Malformed { path, line, reason }
    };

    for (offset, &line) in block.iter().enumerate() {
        let line_no = first_line + offset;

        if let Some(current) = open.as_mut() {
            let (kind, text) = match line.chars().next() {
                Some('+') => (LineKind::Added, &line[1..]),
                Some('-') => (LineKind::Removed, &line[1..]),
                Some(' ') => (LineKind::Context, &line[1..]),
                None => (LineKind::Context, ""),
                Some('\\') => continue,
                Some(_) if !ends_open_hunk(line) => (LineKind::Context, line),
                Some(_) => {
                    return Err(malformed(
                        &old_header,
                        &new_header,
                        &git_paths,
                        line_no,
                        format!(
                            "hunk truncated: expected {} more old and {} more new lines",
                            current.old_left, current.new_left
                        ),
                    ));
                }
            };

            let overflow = match kind {
                LineKind::Added => current.new_left == 0,
                LineKind::Removed => current.old_left == 0,
                LineKind::Context => current.old_left == 0 || current.new_left == 0,
            };
            if overflow {
                return Err(malformed(
                    &old_header,
                    &new_header,
                    &git_paths,
                    line_no,
                    "hunk content exceeds the lengths in its header".to_string(),
                ));
            }
            if kind != LineKind::Added {
                current.old_left -= 1;
            }
            if kind != LineKind::Removed {
                current.new_left -= 1;
            }
            current.hunk.lines.push(DiffLine {
                kind,
                text: text.to_string(),
            });

            if current.old_left == 0 && current.new_left == 0 {
                if let Some(done) = open.take() {
                    hunks.push(done.hunk);
                }
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            git_paths = parse_git_paths(rest);
            continue;
        }
        if let Some(rest) = line.strip_prefix("--- ") {
            old_header = Some(parse_header_path(rest));
            continue;
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            new_header = Some(parse_header_path(rest));
            continue;
        }
        if line.starts_with("@@") {
            let (old_start, old_len, new_start, new_len) =
                parse_hunk_header(line).map_err(|reason| {
                    malformed(&old_header, &new_header, &git_paths, line_no, reason)
                })?;
            let hunk = Hunk {
                old_start,
                old_len,
                new_start,
                new_len,
                lines: Vec::new(),
            };
            if old_len == 0 && new_len == 0 {
                hunks.push(hunk);
            } else {
                open = Some(OpenHunk {
                    hunk,
                    old_left: old_len,
                    new_left: new_len,
                });
            }
            continue;
        }
        if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
            let reason = if hunks.is_empty() {
                "content line before any hunk header"
            } else {
                "content line outside the range of its hunk"
            };
            return Err(malformed(
                &old_header,
                &new_header,
                &git_paths,
                line_no,
                reason.to_string(),
            ));
        }
        // Extended header lines (index, mode, rename, similarity) and blanks.
    }

    if let Some(current) = open {
        return Err(malformed(
            &old_header,
            &new_header,
            &git_paths,
            first_line + block.len(),
            format!(
                "hunk truncated: expected {} more old and {} more new lines",
                current.old_left, current.new_left
            ),
        ));
    }

    let (old_path, new_path) = match (old_header, new_header, git_paths) {
        (Some(old), Some(new), _) => (old, new),
        (None, None, Some((a, b))) => (Some(a), Some(b)),
        (old, new, git) => {
            return Err(malformed(
                &old,
                &new,
                &git,
                first_line,
                "missing old or new file path".to_string(),
            ));
        }
    };
    if old_path.is_none() && new_path.is_none() {
        return Err(DiffError::Malformed {
            path: UNKNOWN_PATH.to_string(),
            line: first_line,
            reason: "both file paths are /dev/null".to_string(),
        });
    }

    Ok(FileDiff {
        old_path,
        new_path,
        hunks,
    })
}

/// `a/foo.idl\t2024-01-01 10:00:00` -> `Some("foo.idl")`, `/dev/null` -> `None`.
fn parse_header_path(rest: &str) -> Option<String> {
    let path = rest.split('\t').next().unwrap_or(rest).trim_end();
    if path == "/dev/null" {
        return None;
    }
    Some(strip_side_prefix(path).to_string())
}

fn parse_git_paths(rest: &str) -> Option<(String, String)> {
    let mut parts = rest.split_whitespace();
    let a_path = parts.next()?;
    let b_path = parts.next()?;
    Some((
        strip_side_prefix(a_path).to_string(),
        strip_side_prefix(b_path).to_string(),
    ))
}

fn strip_side_prefix(path: &str) -> &str {
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}

fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize), String> {
    let header = line
        .trim()
        .strip_prefix("@@")
        .ok_or_else(|| "invalid hunk header".to_string())?;
    let header = match header.find("@@") {
        Some(end) => &header[..end],
        None => return Err(format!("unterminated hunk header '{}'", line)),
    };
    let mut parts = header.split_whitespace();
    let old_part = parts
        .next()
        .ok_or_else(|| "missing old range".to_string())?;
    let new_part = parts
        .next()
        .ok_or_else(|| "missing new range".to_string())?;

    let (old_start, old_len) = parse_range(old_part, '-')?;
    let (new_start, new_len) = parse_range(new_part, '+')?;

    Ok((old_start, old_len, new_start, new_len))
}

fn parse_range(part: &str, prefix: char) -> Result<(usize, usize), String> {
    let range = part
        .strip_prefix(prefix)
        .ok_or_else(|| format!("invalid range prefix in {}", part))?;
    let (start_str, len_str) = match range.split_once(',') {
        Some((start, len)) => (start, len),
        None => (range, "1"),
    };
    let start = start_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range start in {}", part))?;
    let len = len_str
        .parse::<usize>()
        .map_err(|_| format!("invalid range length in {}", part))?;
    Ok((start, len))
}
