use crate::submit::{RowOutcome, SubmissionReport};

use std::fmt::Write;

/// Plain-text summary of a submission run, one line per row plus totals.
pub fn render_summary(report: &SubmissionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} on project {}", report.gear, report.project);

    for row in &report.rows {
        let status = match &row.outcome {
            RowOutcome::Submitted { job_id } => format!("submitted  {}", job_id),
            RowOutcome::Skipped { existing_analysis } => {
                format!("skipped    exists as {}", existing_analysis)
            }
            RowOutcome::Failed { error } => format!("FAILED     {}", error),
        };
        let _ = writeln!(
            out,
            "  {:<24} {:<32} {}",
            row.session_path, row.analysis_label, status
        );
    }

    let failed = report.failed_sessions();
    let _ = writeln!(
        out,
        "{} submitted, {} skipped, {} failed",
        report.job_ids().len(),
        report.skipped(),
        failed.len()
    );
    if !failed.is_empty() {
        let _ = writeln!(out, "failed sessions: {}", failed.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::RowReport;

    fn row(session: &str, outcome: RowOutcome) -> RowReport {
        RowReport {
            line: 8,
            session_path: session.into(),
            session_id: "s".into(),
            analysis_label: format!("fmriprep {}", session),
            outcome,
        }
    }

    #[test]
    fn summary_lists_rows_and_totals() {
        let report = SubmissionReport {
            project: "flicker".into(),
            gear: "fmriprep".into(),
            rows: vec![
                row("sub-01/ses-01", RowOutcome::Submitted { job_id: "j1".into() }),
                row(
                    "sub-02/ses-01",
                    RowOutcome::Skipped {
                        existing_analysis: "a9".into(),
                    },
                ),
                row(
                    "sub-03/ses-01",
                    RowOutcome::Failed {
                        error: "boom".into(),
                    },
                ),
            ],
        };
        let text = render_summary(&report);
        assert!(text.starts_with("fmriprep on project flicker\n"));
        assert!(text.contains("submitted  j1"));
        assert!(text.contains("exists as a9"));
        assert!(text.contains("FAILED     boom"));
        assert!(text.contains("1 submitted, 1 skipped, 1 failed"));
        assert!(text.contains("failed sessions: sub-03/ses-01"));
    }
}
