use crate::context::{Diagnostics, WarningKind};
use crate::diff::Hunk;

/// Reconstruct the pre-change file from the current one.
///
/// Walks the hunks in order, copying unchanged lines from `current` and
/// substituting each hunk's new span with its context and removed lines.
/// Offsets past the end of `current` are clamped. When a hunk's new side
/// does not match `current`, one `TreeMismatch` warning is recorded for the
/// file and the walk carries on.
pub fn rebuild_old<'a>(
    path: &str,
    current: &[&'a str],
    hunks: &'a [Hunk],
    diagnostics: &mut Diagnostics,
) -> Vec<&'a str> {
    let mut old: Vec<&'a str> = Vec::with_capacity(current.len());
    let mut cursor = 0usize;
    let mut mismatch_reported = false;

    for hunk in hunks {
        let mut begin = hunk.new_span_begin().min(current.len());
        let overlaps = begin < cursor;
        begin = begin.max(cursor);
        let end = (begin + hunk.new_len).min(current.len());

        old.extend_from_slice(&current[cursor..begin]);

        let matches = !overlaps && current[begin..end].iter().copied().eq(hunk.new_lines());
        if !matches && !mismatch_reported {
            diagnostics.warn(
                WarningKind::TreeMismatch,
                path,
                format!(
                    "hunk -{},{} +{},{} does not match the working tree; is it checked out at the diff's end revision?",
                    hunk.old_start, hunk.old_len, hunk.new_start, hunk.new_len
                ),
            );
            mismatch_reported = true;
        }

        old.extend(hunk.old_lines());
        cursor = end;
    }

    old.extend_from_slice(&current[cursor..]);
    old
}
