pub mod types;

pub use types::{Finding, Report, Summary};

use crate::context::Warning;
use crate::reconcile::{ChangeVerdict, FileOutcome};
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// Build a Report from the per-file outcomes and the run's warnings.
///
/// Findings keep diff file order, then post-change interface order.
pub fn build(files: Vec<FileOutcome>, warnings: Vec<Warning>) -> Report {
    let findings: Vec<Finding> = files
        .iter()
        .flat_map(|file| {
            file.flagged().map(move |outcome| Finding {
                interface: outcome.name.clone(),
                path: file.path.clone(),
                line: outcome.span.first_line,
                detail: outcome.detail.clone(),
            })
        })
        .collect();

    let summary = Summary {
        files_checked: files.len(),
        interfaces_compared: files
            .iter()
            .flat_map(|f| &f.interfaces)
            .filter(|i| {
                !matches!(i.verdict, ChangeVerdict::Added | ChangeVerdict::Removed)
            })
            .count(),
        flagged: findings.len(),
        warnings: warnings.len(),
    };

    Report {
        files,
        findings,
        warnings,
        summary,
    }
}

/// Print findings to stdout and the warning summary to stderr; also write
/// a markdown report when `output_path` is given.
#[instrument(skip(report), fields(flagged = report.summary.flagged, warnings = report.summary.warnings))]
pub fn output(report: &Report, output_path: Option<&Path>) -> Result<(), ReportError> {
    let stdout = io::stdout();
    write_findings(report, &mut stdout.lock())?;
    print_warnings(report);

    if let Some(path) = output_path {
        debug!(path = %path.display(), "writing markdown report");
        write_markdown_report(report, path)?;
    }
    Ok(())
}

/// One line per finding, nothing else. This stream is the tool's result.
pub fn write_findings<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    for finding in &report.findings {
        writeln!(out, "{}", finding)?;
    }
    out.flush()
}

/// Warnings go to stderr so they are never mistaken for findings.
fn print_warnings(report: &Report) {
    if report.warnings.is_empty() {
        return;
    }
    eprintln!();
    eprintln!(
        "{} {} file(s) could not be fully checked:",
        "WARNING:".yellow().bold(),
        distinct_paths(&report.warnings)
    );
    for warning in &report.warnings {
        eprintln!("  • {} ({}): {}", warning.path, warning.kind, warning.message);
    }
}

fn distinct_paths(warnings: &[Warning]) -> usize {
    let mut paths: Vec<&str> = warnings.iter().map(|w| w.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    paths.len()
}

/// Write the report as a markdown file:
/// # IID check
/// **Files checked:** 2 | **Interfaces compared:** 5 | **Needing a new IID:** 1
///
/// ## Needing a new IID
/// - **nsIFoo** (`xpcom/foo.idl:4`): method `void b()` added
///
/// ## xpcom/foo.idl
/// | Interface | Verdict | UUID changed |
fn write_markdown_report(report: &Report, path: &Path) -> Result<(), ReportError> {
    std::fs::write(path, render_markdown(report))?;
    Ok(())
}

fn render_markdown(report: &Report) -> String {
    let summary = &report.summary;
    let mut md = String::new();
    md.push_str("# IID check\n\n");
    md.push_str(&format!(
        "**Files checked:** {} | **Interfaces compared:** {} | **Needing a new IID:** {} | **Warnings:** {}\n\n",
        summary.files_checked, summary.interfaces_compared, summary.flagged, summary.warnings
    ));

    md.push_str("## Needing a new IID\n\n");
    if report.findings.is_empty() {
        md.push_str("None.\n\n");
    } else {
        for finding in &report.findings {
            md.push_str(&format!(
                "- **{}** (`{}:{}`)",
                finding.interface, finding.path, finding.line
            ));
            if let Some(detail) = &finding.detail {
                md.push_str(&format!(": {}", detail));
            }
            md.push('\n');
        }
        md.push('\n');
    }

    for file in &report.files {
        md.push_str(&format!("## {}\n\n", file.path));
        if file.interfaces.is_empty() {
            md.push_str("No interfaces.\n\n");
            continue;
        }
        md.push_str("| Interface | Verdict | UUID changed |\n");
        md.push_str("|---|---|---|\n");
        for outcome in &file.interfaces {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                outcome.name,
                outcome.verdict,
                if outcome.uuid_changed { "yes" } else { "no" }
            ));
        }
        md.push('\n');
    }

    if !report.warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for warning in &report.warnings {
            md.push_str(&format!(
                "- `{}` ({}): {}\n",
                warning.path, warning.kind, warning.message
            ));
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WarningKind;
    use crate::idl::types::Span;
    use crate::reconcile::InterfaceOutcome;

    fn outcome(name: &str, verdict: ChangeVerdict, uuid_changed: bool) -> InterfaceOutcome {
        InterfaceOutcome {
            name: name.to_string(),
            verdict,
            uuid_changed,
            needs_new_uuid: verdict == ChangeVerdict::Substantive && !uuid_changed,
            detail: None,
            span: Span {
                path: String::new(),
                first_line: 4,
                last_line: 8,
            },
        }
    }

    fn sample_files() -> Vec<FileOutcome> {
        vec![
            FileOutcome {
                path: "xpcom/foo.idl".to_string(),
                interfaces: vec![
                    outcome("nsIFoo", ChangeVerdict::Substantive, false),
                    outcome("nsIFooCallback", ChangeVerdict::Substantive, true),
                    outcome("nsINew", ChangeVerdict::Added, false),
                ],
            },
            FileOutcome {
                path: "dom/bar.idl".to_string(),
                interfaces: vec![
                    outcome("nsIBar", ChangeVerdict::Cosmetic, false),
                    outcome("nsIBaz", ChangeVerdict::Substantive, false),
                ],
            },
        ]
    }

    #[test]
    fn test_build_keeps_file_then_interface_order() {
        let report = build(sample_files(), vec![]);
        let names: Vec<&str> = report
            .findings
            .iter()
            .map(|f| f.interface.as_str())
            .collect();
        assert_eq!(names, vec!["nsIFoo", "nsIBaz"]);
        assert_eq!(
            report.summary,
            Summary {
                files_checked: 2,
                interfaces_compared: 4,
                flagged: 2,
                warnings: 0,
            }
        );
    }

    #[test]
    fn test_write_findings_exact_lines() {
        let report = build(sample_files(), vec![]);
        let mut out = Vec::new();
        write_findings(&report, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ERROR: Interface 'nsIFoo', in file 'foo.idl' needs a new IID\n\
             ERROR: Interface 'nsIBaz', in file 'bar.idl' needs a new IID\n"
        );
    }

    #[test]
    fn test_no_findings_writes_nothing() {
        let report = build(vec![], vec![]);
        let mut out = Vec::new();
        write_findings(&report, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_markdown_report() {
        let warnings = vec![Warning {
            kind: WarningKind::MissingFile,
            path: "gone.idl".to_string(),
            message: "cannot read gone.idl".to_string(),
        }];
        let report = build(sample_files(), warnings);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_markdown_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("# IID check"));
        assert!(content.contains("**Needing a new IID:** 2"));
        assert!(content.contains("- **nsIFoo** (`xpcom/foo.idl:4`)"));
        assert!(content.contains("## dom/bar.idl"));
        assert!(content.contains("| nsIBar | cosmetic | no |"));
        assert!(content.contains("| nsIFooCallback | substantive | yes |"));
        assert!(content.contains("## Warnings"));
    }

    #[test]
    fn test_distinct_paths_counts_files_once() {
        let warning = |path: &str| Warning {
            kind: WarningKind::ExtractionAmbiguity,
            path: path.to_string(),
            message: String::new(),
        };
        assert_eq!(
            distinct_paths(&[warning("a.idl"), warning("a.idl"), warning("b.idl")]),
            2
        );
    }

    #[test]
    fn test_output_to_file() {
        let report = build(vec![], vec![]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        output(&report, Some(&path)).unwrap();
        assert!(path.exists());
    }
}
