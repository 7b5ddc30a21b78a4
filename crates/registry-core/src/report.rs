//! Plain terminal rendering of an add summary, for non-interactive runs

use crate::install::AddSummary;
use crate::writer::{FileReport, SkipReason, WriteOutcome};
use colored::{ColoredString, Colorize};

/// Short label for a write outcome
pub fn outcome_label(outcome: &WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Written => "created",
        WriteOutcome::Overwritten => "updated",
        WriteOutcome::Unchanged => "unchanged",
        WriteOutcome::WouldWrite => "would write",
        WriteOutcome::Skipped(SkipReason::Conflict) => "skipped (exists)",
        WriteOutcome::Failed(_) => "failed",
    }
}

fn colored_label(outcome: &WriteOutcome) -> ColoredString {
    let label = outcome_label(outcome);
    match outcome {
        WriteOutcome::Written | WriteOutcome::Overwritten | WriteOutcome::WouldWrite => {
            label.green()
        }
        WriteOutcome::Unchanged => label.dimmed(),
        WriteOutcome::Skipped(_) => label.yellow(),
        WriteOutcome::Failed(_) => label.red(),
    }
}

/// One line per file, e.g. `created  components/ui/button.tsx`
pub fn file_line(file: &FileReport) -> String {
    let mut line = format!(
        "{:<16} {}",
        outcome_label(&file.outcome),
        file.path.display()
    );
    if let WriteOutcome::Failed(reason) = &file.outcome {
        line.push_str(&format!(": {}", reason));
    }
    line
}

/// Headline counts, e.g. `2 written, 1 skipped`
pub fn counts_line(summary: &AddSummary) -> String {
    let files = &summary.files;
    let mut parts = vec![format!(
        "{} {}",
        files.written(),
        if summary.dry_run { "to write" } else { "written" }
    )];
    for (count, label) in [
        (files.unchanged(), "unchanged"),
        (files.skipped(), "skipped"),
        (files.failed(), "failed"),
    ] {
        if count > 0 {
            parts.push(format!("{} {}", count, label));
        }
    }
    parts.join(", ")
}

/// Print the summary to stderr, keeping stdout free for machine output
pub fn print_summary(summary: &AddSummary) {
    if summary.cancelled {
        eprintln!("{}", "Cancelled, no files were written.".yellow());
        return;
    }

    for failure in &summary.failures {
        eprintln!(
            "{} {} ({}): {}",
            "Error:".red().bold(),
            failure.reference,
            failure.kind,
            failure.message
        );
    }
    for warning in &summary.warnings {
        eprintln!("{} {}", "Warning:".yellow(), warning);
    }
    if summary.items.is_empty() {
        return;
    }

    eprintln!("{} {}", "Resolved".bold(), summary.items.join(", "));
    for file in summary.files.files.iter().chain(summary.updates.iter()) {
        let line = file_line(file);
        let label = outcome_label(&file.outcome);
        eprintln!(
            "  {}{}",
            colored_label(&file.outcome),
            line.strip_prefix(label).unwrap_or(&line)
        );
    }
    eprintln!("{}", counts_line(summary).bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WriteReport;
    use std::path::PathBuf;

    fn report(path: &str, outcome: WriteOutcome) -> FileReport {
        FileReport {
            path: PathBuf::from(path),
            outcome,
        }
    }

    #[test]
    fn test_file_lines() {
        assert_eq!(
            file_line(&report("components/ui/button.tsx", WriteOutcome::Written)),
            "created          components/ui/button.tsx"
        );
        assert_eq!(
            file_line(&report("lib/utils.ts", WriteOutcome::Failed("denied".to_string()))),
            "failed           lib/utils.ts: denied"
        );
    }

    #[test]
    fn test_counts_line() {
        let summary = AddSummary {
            files: WriteReport {
                files: vec![
                    report("a.tsx", WriteOutcome::Written),
                    report("b.tsx", WriteOutcome::Skipped(SkipReason::Conflict)),
                    report("c.tsx", WriteOutcome::Unchanged),
                ],
            },
            ..Default::default()
        };
        assert_eq!(counts_line(&summary), "1 written, 1 unchanged, 1 skipped");

        let dry = AddSummary {
            dry_run: true,
            files: WriteReport {
                files: vec![report("a.tsx", WriteOutcome::WouldWrite)],
            },
            ..Default::default()
        };
        assert_eq!(counts_line(&dry), "1 to write");
    }
}
