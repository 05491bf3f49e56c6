//! Submission driver: one gear run per planned row, with a duplicate-label guard.

use crate::Result;
use crate::job::{PlannedInput, RowPlan};
use crate::platform::{Container, InputValue, JobId, JobRequest, Platform};

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub group: String,
    /// Reserved: existing analyses are never replaced.
    pub overwrite_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Submitted { job_id: JobId },
    Skipped { existing_analysis: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    pub line: usize,
    pub session_path: String,
    pub session_id: String,
    pub analysis_label: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReport {
    pub project: String,
    pub gear: String,
    pub rows: Vec<RowReport>,
}

impl SubmissionReport {
    pub fn job_ids(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|r| match &r.outcome {
                RowOutcome::Submitted { job_id } => Some(job_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failed_sessions(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Failed { .. }))
            .map(|r| r.session_path.as_str())
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Skipped { .. }))
            .count()
    }
}

/// Resolve the gear and project, then submit every plan in order.
///
/// Lookup errors abort the run. A failed gear run is recorded for its row and
/// the run moves on to the next one.
pub fn submit_all<P: Platform + ?Sized>(
    platform: &P,
    project_label: &str,
    gear_name: &str,
    plans: &[RowPlan],
    options: &SubmitOptions,
) -> Result<SubmissionReport> {
    if options.overwrite_existing {
        log::warn!("--overwrite-existing is not supported yet; existing analyses are kept");
    }

    let gear = platform
        .lookup(&["gears", gear_name])
        .with_context(|| format!("look up gear {}", gear_name))?;
    let project = platform
        .lookup(&[options.group.as_str(), project_label])
        .with_context(|| format!("look up project {}/{}", options.group, project_label))?;
    log::info!(
        "submitting {} ({}) to project {} ({})",
        gear_name,
        gear.id,
        project_label,
        project.id
    );

    let total = plans.len();
    let mut rows = Vec::with_capacity(total);
    for (i, plan) in plans.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, total, plan.session_path);
        match submit_row(platform, &gear, &project, project_label, plan, options) {
            Ok(row) => rows.push(row),
            Err(e) => {
                let queued = queued_job_ids(&rows);
                if queued.is_empty() {
                    return Err(e);
                }
                log::error!("aborting; already queued: {}", queued);
                return Err(e.context(format!("aborted after queuing {}", queued)));
            }
        }
    }

    Ok(SubmissionReport {
        project: project_label.to_string(),
        gear: gear_name.to_string(),
        rows,
    })
}

fn queued_job_ids(rows: &[RowReport]) -> String {
    rows.iter()
        .filter_map(|r| match &r.outcome {
            RowOutcome::Submitted { job_id } => Some(format!("{} ({})", job_id, r.session_path)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn submit_row<P: Platform + ?Sized>(
    platform: &P,
    gear: &Container,
    project: &Container,
    project_label: &str,
    plan: &RowPlan,
    options: &SubmitOptions,
) -> Result<RowReport> {
    let mut path = vec![options.group.as_str(), project_label];
    path.extend(plan.session_path.split('/').filter(|p| !p.is_empty()));
    let session = platform
        .lookup(&path)
        .with_context(|| format!("look up session {} (line {})", path.join("/"), plan.line))?;

    let report = |outcome| RowReport {
        line: plan.line,
        session_path: plan.session_path.clone(),
        session_id: session.id.clone(),
        analysis_label: plan.analysis_label.clone(),
        outcome,
    };

    let existing = platform
        .session_analyses(&session)
        .with_context(|| format!("list analyses of session {}", plan.session_path))?;
    if let Some(dup) = existing.iter().find(|a| a.label == plan.analysis_label) {
        log::warn!(
            "{}: analysis {:?} already exists ({}), skipping",
            plan.session_path,
            plan.analysis_label,
            dup.id
        );
        return Ok(report(RowOutcome::Skipped {
            existing_analysis: dup.id.clone(),
        }));
    }

    let mut inputs = BTreeMap::new();
    for (key, input) in &plan.inputs {
        let value = match input {
            PlannedInput::ProjectFile(name) => InputValue::File(
                platform
                    .project_file(project, name)
                    .with_context(|| format!("resolve input {} for line {}", key, plan.line))?,
            ),
            PlannedInput::Value(v) => InputValue::Value(v.clone()),
        };
        inputs.insert(key.clone(), value);
    }

    let request = JobRequest {
        analysis_label: plan.analysis_label.clone(),
        config: plan.config.clone(),
        inputs,
        destination: session.id.clone(),
    };

    Ok(match platform.run_gear(gear, &request) {
        Ok(job_id) => {
            log::info!("{}: queued {}", plan.session_path, job_id);
            report(RowOutcome::Submitted { job_id })
        }
        Err(e) => {
            log::error!("{}: gear run failed: {}", plan.session_path, e);
            report(RowOutcome::Failed {
                error: e.to_string(),
            })
        }
    })
}
