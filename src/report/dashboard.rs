use crate::backend::Backend;
use crate::error::ApiError;
use crate::model::{AnalysisResult, Workflow, WorkflowId};
use serde::Serialize;
use std::cmp::Ordering;

/// One workflow row. Workflows whose analysis never ran (or failed) have no score.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub automation_score: Option<f64>,
    pub hours_saved: Option<f64>,
    pub annual_savings: Option<f64>,
    pub task_count: usize,
}

impl DashboardEntry {
    pub fn is_analyzed(&self) -> bool {
        self.automation_score.is_some()
    }

    fn from_parts(wf: Workflow, analysis: Option<AnalysisResult>) -> Self {
        let fallback_tasks = wf.tasks.len();
        match analysis {
            Some(a) => {
                // The analysis response embeds the workflow with its tasks when available.
                let task_count = a
                    .workflow
                    .as_ref()
                    .map(|w| w.tasks.len())
                    .filter(|n| *n > 0)
                    .unwrap_or(fallback_tasks);
                Self {
                    id: wf.id,
                    name: wf.name,
                    description: wf.description,
                    created_at: wf.created_at,
                    automation_score: Some(a.automation_score),
                    hours_saved: a.hours_saved,
                    annual_savings: a.annual_savings,
                    task_count,
                }
            }
            None => Self {
                id: wf.id,
                name: wf.name,
                description: wf.description,
                created_at: wf.created_at,
                automation_score: None,
                hours_saved: None,
                annual_savings: None,
                task_count: fallback_tasks,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardTotals {
    pub workflows: usize,
    pub analyzed: usize,
    pub total_hours_saved: f64,
    /// Rounded mean over analyzed workflows only.
    pub average_score: Option<i64>,
    pub total_annual_savings: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub entries: Vec<DashboardEntry>,
    pub totals: DashboardTotals,
}

fn created_key(s: Option<&str>) -> Option<time::PrimitiveDateTime> {
    use time::format_description::well_known::{Iso8601, Rfc3339};
    let s = s?.trim();
    if let Ok(dt) = time::OffsetDateTime::parse(s, &Rfc3339) {
        let utc = dt.to_offset(time::UtcOffset::UTC);
        return Some(time::PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    time::PrimitiveDateTime::parse(s, &Iso8601::DEFAULT).ok()
}

/// Newest first. Unparseable timestamps fall back to string order and sort after parsed ones.
fn newest_first(a: &DashboardEntry, b: &DashboardEntry) -> Ordering {
    match (
        created_key(a.created_at.as_deref()),
        created_key(b.created_at.as_deref()),
    ) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at.cmp(&a.created_at),
    }
}

pub fn totals(entries: &[DashboardEntry]) -> DashboardTotals {
    let analyzed: Vec<&DashboardEntry> = entries.iter().filter(|e| e.is_analyzed()).collect();
    let average_score = (!analyzed.is_empty()).then(|| {
        let sum: f64 = analyzed.iter().filter_map(|e| e.automation_score).sum();
        (sum / analyzed.len() as f64).round() as i64
    });
    DashboardTotals {
        workflows: entries.len(),
        analyzed: analyzed.len(),
        total_hours_saved: analyzed.iter().filter_map(|e| e.hours_saved).sum(),
        average_score,
        total_annual_savings: analyzed.iter().filter_map(|e| e.annual_savings).sum(),
    }
}

pub fn build_dashboard(rows: Vec<(Workflow, Option<AnalysisResult>)>) -> Dashboard {
    let mut entries: Vec<DashboardEntry> = rows
        .into_iter()
        .map(|(wf, a)| DashboardEntry::from_parts(wf, a))
        .collect();
    entries.sort_by(newest_first);
    let totals = totals(&entries);
    Dashboard { entries, totals }
}

/// List workflows and look up each one's analysis concurrently. A failed lookup marks the
/// workflow as not analyzed rather than failing the listing.
pub async fn load_dashboard(backend: &dyn Backend) -> Result<Dashboard, ApiError> {
    let workflows = backend.list_workflows().await?;
    let lookups = workflows.iter().map(|wf| backend.results(&wf.id));
    let analyses = futures::future::join_all(lookups).await;
    let rows = workflows
        .into_iter()
        .zip(analyses)
        .map(|(wf, a)| {
            let a = match a {
                Ok(a) => Some(a),
                Err(e) => {
                    tracing::debug!("no analysis for workflow {}: {e}", wf.id);
                    None
                }
            };
            (wf, a)
        })
        .collect();
    Ok(build_dashboard(rows))
}
