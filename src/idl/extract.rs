use std::collections::HashSet;

use tracing::{debug, instrument};

use super::normalize::{self, Unterminated};
use super::types::{Interface, Span};
use super::Grammar;
use crate::context::{Diagnostics, WarningKind};

/// Normalized text of one input plus what is needed to map offsets back.
struct Source<'a, S> {
    path: &'a str,
    raw: &'a [S],
    text: String,
    line_starts: Vec<usize>,
}

impl<'a, S: AsRef<str>> Source<'a, S> {
    fn new(path: &'a str, raw: &'a [S], normalized: Vec<String>) -> Self {
        let text = normalized.join("\n");
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            path,
            raw,
            text,
            line_starts,
        }
    }

    /// 1-based line holding byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    fn raw_lines(&self, first_line: usize, last_line: usize) -> String {
        let end = last_line.min(self.raw.len());
        let begin = first_line.saturating_sub(1).min(end);
        self.raw[begin..end]
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Grammar {
    /// Scan `lines` (a whole file or a reconstructed version of one) for
    /// interface declarations, in source order.
    ///
    /// An attribute block `[...]` preceding the declaration, with only blank
    /// or comment lines in between, supplies the UUID. Forward declarations
    /// produce nothing. Interfaces that cannot be scanned unambiguously are
    /// dropped and reported to `diagnostics`.
    #[instrument(skip(self, lines, diagnostics), fields(lines = lines.len()))]
    pub fn extract<S: AsRef<str>>(
        &self,
        path: &str,
        lines: &[S],
        diagnostics: &mut Diagnostics,
    ) -> Vec<Interface> {
        let normalized = normalize::strip(lines);
        match normalized.unterminated {
            Some(Unterminated::Comment(line)) => diagnostics.warn(
                WarningKind::ExtractionAmbiguity,
                path,
                format!("comment opened at line {} is never closed", line),
            ),
            Some(Unterminated::Passthrough(line)) => diagnostics.warn(
                WarningKind::ExtractionAmbiguity,
                path,
                format!("%{{ block opened at line {} is never closed", line),
            ),
            None => {}
        }

        let source = Source::new(path, lines, normalized.lines);
        let text = source.text.as_str();

        let mut interfaces: Vec<Interface> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut pending_uuid: Option<String> = None;
        let mut pos = 0;

        while pos < text.len() {
            let line_end = text[pos..].find('\n').map_or(text.len(), |n| pos + n);
            let trimmed = text[pos..line_end].trim_start();
            if trimmed.trim_end().is_empty() {
                pos = line_end + 1;
                continue;
            }
            let start = line_end - trimmed.len();

            if trimmed.starts_with('[') {
                let Some(close) = matching_close(text, start, '[', ']') else {
                    diagnostics.warn(
                        WarningKind::ExtractionAmbiguity,
                        path,
                        format!(
                            "attribute block at line {} is never closed; line skipped",
                            source.line_of(start)
                        ),
                    );
                    pending_uuid = None;
                    pos = line_end + 1;
                    continue;
                };
                let uuid = self
                    .uuid
                    .captures(&text[start..=close])
                    .and_then(|caps| caps.name("uuid"))
                    .map(|m| m.as_str().to_string());
                pending_uuid = uuid.or(pending_uuid);
                pos = close + 1;
                continue;
            }

            if self.interface_keyword.is_match(trimmed) {
                let (found, next) =
                    self.scan_interface(&source, start, pending_uuid.take(), diagnostics);
                if let Some(interface) = found {
                    if seen.insert(interface.name.clone()) {
                        interfaces.push(interface);
                    } else {
                        diagnostics.warn(
                            WarningKind::ExtractionAmbiguity,
                            path,
                            format!(
                                "interface {} is declared twice; second declaration at line {} ignored",
                                interface.name, interface.span.first_line
                            ),
                        );
                    }
                }
                pos = next;
                continue;
            }

            // Any other code between an attribute block and a declaration
            // detaches the block.
            pending_uuid = None;
            pos = line_end + 1;
        }

        debug!(path = %path, interfaces = interfaces.len(), "extracted interfaces");
        interfaces
    }

    /// Scan the declaration beginning at byte `start` of the normalized
    /// text. Returns the interface, if one could be built, and the offset
    /// to resume scanning from.
    fn scan_interface<S: AsRef<str>>(
        &self,
        source: &Source<'_, S>,
        start: usize,
        uuid: Option<String>,
        diagnostics: &mut Diagnostics,
    ) -> (Option<Interface>, usize) {
        let text = source.text.as_str();
        let first_line = source.line_of(start);

        let Some(header_end) = text[start..]
            .find(|c: char| c == '{' || c == ';')
            .map(|n| start + n)
        else {
            diagnostics.warn(
                WarningKind::ExtractionAmbiguity,
                source.path,
                format!("interface declaration at line {} has no body", first_line),
            );
            return (None, text.len());
        };

        let header = text[start..header_end]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if text[header_end..].starts_with(';') {
            debug!(declaration = %header, line = first_line, "skipping forward declaration");
            return (None, header_end + 1);
        }

        let Some(caps) = self.declaration.captures(&header) else {
            diagnostics.warn(
                WarningKind::ExtractionAmbiguity,
                source.path,
                format!(
                    "unrecognized interface declaration '{}' at line {}",
                    header, first_line
                ),
            );
            let next = matching_close(text, header_end, '{', '}').map_or(text.len(), |c| c + 1);
            return (None, next);
        };
        let name = caps["name"].to_string();
        let base = caps.name("base").map(|m| m.as_str().to_string());

        let Some(close) = matching_close(text, header_end, '{', '}') else {
            diagnostics.warn(
                WarningKind::ExtractionAmbiguity,
                source.path,
                format!(
                    "body of interface {} opened at line {} is never closed",
                    name, first_line
                ),
            );
            return (None, text.len());
        };

        let members = match self.parse_members(&text[header_end + 1..close]) {
            Ok(members) => members,
            Err(statement) => {
                diagnostics.warn(
                    WarningKind::ExtractionAmbiguity,
                    source.path,
                    format!(
                        "nested declaration '{}' inside interface {}; interface discarded",
                        statement, name
                    ),
                );
                return (None, close + 1);
            }
        };

        let last_line = source.line_of(close);
        let interface = Interface {
            name,
            base,
            uuid,
            members,
            span: Span {
                path: source.path.to_string(),
                first_line,
                last_line,
            },
            source: source.raw_lines(first_line, last_line),
        };
        (Some(interface), close + 1)
    }
}

/// Byte offset of the bracket closing the one at `open`.
fn matching_close(text: &str, open: usize, open_char: char, close_char: char) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        if c == open_char {
            depth += 1;
        } else if c == close_char {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}
