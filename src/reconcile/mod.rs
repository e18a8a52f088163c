pub mod rebuild;
pub mod resolver;

pub use resolver::{FileResolver, WorkingTree};

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::context::{Diagnostics, WarningKind};
use crate::diff::{self, DiffError, FileDiff};
use crate::idl::types::Span;
use crate::idl::{Grammar, Interface};

/// How an interface changed between the two versions of its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    Unchanged,
    /// Only whitespace or comments differ
    Cosmetic,
    /// Member added, removed, retyped or reordered, or base changed
    Substantive,
    Removed,
    Added,
}

impl std::fmt::Display for ChangeVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeVerdict::Unchanged => write!(f, "unchanged"),
            ChangeVerdict::Cosmetic => write!(f, "cosmetic"),
            ChangeVerdict::Substantive => write!(f, "substantive"),
            ChangeVerdict::Removed => write!(f, "removed"),
            ChangeVerdict::Added => write!(f, "added"),
        }
    }
}

/// The two versions of one interface, joined by name.
#[derive(Debug, Clone, Copy)]
pub struct InterfacePair<'a> {
    pub before: Option<&'a Interface>,
    pub after: Option<&'a Interface>,
}

impl<'a> InterfacePair<'a> {
    /// Pair interfaces by name: every `after` interface in order, then the
    /// ones only present `before`, in their order.
    pub fn join(before: &'a [Interface], after: &'a [Interface]) -> Vec<InterfacePair<'a>> {
        let by_name: HashMap<&str, &Interface> =
            before.iter().map(|i| (i.name.as_str(), i)).collect();
        let mut pairs: Vec<InterfacePair<'a>> = after
            .iter()
            .map(|a| InterfacePair {
                before: by_name.get(a.name.as_str()).copied(),
                after: Some(a),
            })
            .collect();

        let kept: std::collections::HashSet<&str> =
            after.iter().map(|a| a.name.as_str()).collect();
        pairs.extend(
            before
                .iter()
                .filter(|b| !kept.contains(b.name.as_str()))
                .map(|b| InterfacePair {
                    before: Some(b),
                    after: None,
                }),
        );
        pairs
    }

    pub fn name(&self) -> &'a str {
        self.after
            .or(self.before)
            .map(|i| i.name.as_str())
            .unwrap_or_default()
    }

    pub fn verdict(&self) -> ChangeVerdict {
        match (self.before, self.after) {
            (None, _) => ChangeVerdict::Added,
            (Some(_), None) => ChangeVerdict::Removed,
            (Some(before), Some(after)) => {
                if !before.same_layout(after) {
                    ChangeVerdict::Substantive
                } else if before.source == after.source {
                    ChangeVerdict::Unchanged
                } else {
                    ChangeVerdict::Cosmetic
                }
            }
        }
    }

    /// Whether the UUID literal differs. An absent UUID equals another
    /// absent UUID.
    pub fn uuid_changed(&self) -> bool {
        match (self.before, self.after) {
            (Some(before), Some(after)) => before.uuid != after.uuid,
            _ => false,
        }
    }

    /// A substantive change that kept the same UUID needs a new one.
    pub fn needs_new_uuid(&self) -> bool {
        self.verdict() == ChangeVerdict::Substantive && !self.uuid_changed()
    }
}

/// Verdict for one interface of one file.
#[derive(Debug, Clone)]
pub struct InterfaceOutcome {
    pub name: String,
    pub verdict: ChangeVerdict,
    pub uuid_changed: bool,
    /// Substantive change without a UUID change
    pub needs_new_uuid: bool,
    /// First difference found, for substantive changes
    pub detail: Option<String>,
    /// Location in the post-change file, or the pre-change one if removed
    pub span: Span,
}

impl From<InterfacePair<'_>> for InterfaceOutcome {
    fn from(pair: InterfacePair<'_>) -> Self {
        let verdict = pair.verdict();
        let detail = match (pair.before, pair.after) {
            (Some(before), Some(after)) if verdict == ChangeVerdict::Substantive => {
                Some(describe_difference(before, after))
            }
            _ => None,
        };
        let span = pair
            .after
            .or(pair.before)
            .map(|i| i.span.clone())
            .unwrap_or_else(|| Span {
                path: String::new(),
                first_line: 0,
                last_line: 0,
            });
        InterfaceOutcome {
            name: pair.name().to_string(),
            verdict,
            uuid_changed: pair.uuid_changed(),
            needs_new_uuid: pair.needs_new_uuid(),
            detail,
            span,
        }
    }
}

/// All verdicts for one touched file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: String,
    pub interfaces: Vec<InterfaceOutcome>,
}

impl FileOutcome {
    /// Interfaces needing a new UUID, in post-change order.
    pub fn flagged(&self) -> impl Iterator<Item = &InterfaceOutcome> {
        self.interfaces.iter().filter(|i| i.needs_new_uuid)
    }
}

/// Classify every interface of a file from its two extracted versions.
pub fn classify(before: &[Interface], after: &[Interface]) -> Vec<InterfaceOutcome> {
    InterfacePair::join(before, after)
        .into_iter()
        .map(InterfaceOutcome::from)
        .collect()
}

fn describe_difference(before: &Interface, after: &Interface) -> String {
    if before.base != after.base {
        return format!(
            "base changed from {} to {}",
            before.base.as_deref().unwrap_or("(none)"),
            after.base.as_deref().unwrap_or("(none)")
        );
    }
    let position = before
        .members
        .iter()
        .zip(&after.members)
        .position(|(b, a)| b.signature != a.signature);
    match position {
        Some(index) => {
            let member = &after.members[index];
            let label = member
                .name
                .clone()
                .unwrap_or_else(|| format!("#{}", index + 1));
            format!(
                "{} {} changed from `{}` to `{}`",
                member.kind, label, before.members[index].signature, member.signature
            )
        }
        None if after.members.len() > before.members.len() => {
            let added = &after.members[before.members.len()];
            format!("{} `{}` added", added.kind, added.signature)
        }
        None => match before.members.get(after.members.len()) {
            Some(removed) => format!("{} `{}` removed", removed.kind, removed.signature),
            None => "layout changed".to_string(),
        },
    }
}

/// Drives the tokenizer, resolver and extractor over a whole diff.
pub struct Engine<'a, R: FileResolver> {
    grammar: &'a Grammar,
    resolver: &'a R,
}

impl<'a, R: FileResolver> Engine<'a, R> {
    pub fn new(grammar: &'a Grammar, resolver: &'a R) -> Self {
        Self { grammar, resolver }
    }

    /// Reconcile every interface-definition file of `raw_diff`, in diff
    /// order. Per-file problems become warnings in `diagnostics`.
    #[instrument(skip_all, fields(diff_bytes = raw_diff.len()))]
    pub fn run(
        &self,
        raw_diff: &str,
        extensions: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Vec<FileOutcome> {
        let mut outcomes = Vec::new();
        for block in diff::file_blocks(raw_diff, extensions) {
            match block {
                Ok(file) => {
                    if let Some(outcome) = self.reconcile_file(&file, diagnostics) {
                        outcomes.push(outcome);
                    }
                }
                Err(err) => {
                    let DiffError::Malformed { path, .. } = &err;
                    diagnostics.warn(WarningKind::MalformedDiff, path, err.to_string());
                }
            }
        }
        outcomes
    }

    /// Reconcile one file. `None` when the file could not be read.
    #[instrument(skip_all, fields(path = %file.path()))]
    pub fn reconcile_file(
        &self,
        file: &FileDiff,
        diagnostics: &mut Diagnostics,
    ) -> Option<FileOutcome> {
        let path = file.path();

        let content = if file.is_deleted() {
            debug!("file deleted; no post-change interfaces");
            String::new()
        } else {
            match self.resolver.read(path) {
                Ok(content) => content,
                Err(err) => {
                    diagnostics.warn(WarningKind::MissingFile, path, err.to_string());
                    return None;
                }
            }
        };

        let current: Vec<&str> = content.lines().collect();
        let old = rebuild::rebuild_old(path, &current, &file.hunks, diagnostics);

        let before = self.grammar.extract(path, &old, diagnostics);
        let after = self.grammar.extract(path, &current, diagnostics);
        let interfaces = classify(&before, &after);

        for outcome in &interfaces {
            debug!(
                interface = %outcome.name,
                location = %format!("{}:{}-{}", outcome.span.path, outcome.span.first_line, outcome.span.last_line),
                verdict = %outcome.verdict,
                uuid_changed = outcome.uuid_changed,
                "classified interface"
            );
            if outcome.needs_new_uuid {
                info!(interface = %outcome.name, detail = outcome.detail.as_deref().unwrap_or(""), "interface changed without a new IID");
            }
        }

        Some(FileOutcome {
            path: path.to_string(),
            interfaces,
        })
    }
}
