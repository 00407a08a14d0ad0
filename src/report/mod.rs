//! Result views built from backend analysis data.
//!
//! Nothing here computes scores or savings; it only arranges what the backend returned.

mod dashboard;
mod roadmap;

pub use dashboard::{build_dashboard, load_dashboard, Dashboard, DashboardEntry, DashboardTotals};
pub use roadmap::{
    build_roadmap, detect_tools, Phase, Roadmap, RoadmapItem, RoadmapPhase, KNOWN_TOOLS,
};

use crate::backend::Backend;
use crate::error::ApiError;
use crate::metrics::{ReadinessSpread, AUTOMATION_READY_SCORE};
use crate::model::{AnalysisResult, Difficulty, WorkflowId};
use serde::Serialize;

/// Name shown when the workflow record cannot be fetched.
pub const FALLBACK_WORKFLOW_NAME: &str = "Workflow";

/// Analysis together with the workflow it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub analysis_id: WorkflowId,
    pub workflow_name: String,
    pub workflow_description: Option<String>,
    pub analysis: AnalysisResult,
}

impl ResultsView {
    pub fn total_tasks(&self) -> usize {
        self.analysis.results.len()
    }

    pub fn automation_ready(&self) -> usize {
        self.analysis
            .results
            .iter()
            .filter(|r| r.ai_readiness_score >= AUTOMATION_READY_SCORE)
            .count()
    }

    pub fn readiness(&self) -> Option<ReadinessSpread> {
        ReadinessSpread::from_results(&self.analysis.results)
    }
}

/// Fetch results for `id`, then the workflow for its name. A failed workflow lookup falls back
/// to a generic name; a failed results lookup is an error.
pub async fn load_results(backend: &dyn Backend, id: &WorkflowId) -> Result<ResultsView, ApiError> {
    let analysis = backend.results(id).await?;
    let workflow = match analysis.workflow.clone() {
        Some(w) => Some(w),
        None => match backend.get_workflow(&analysis.workflow_id).await {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::debug!("workflow lookup for {} failed: {e}", analysis.workflow_id);
                None
            }
        },
    };
    let (workflow_name, workflow_description) = match workflow {
        Some(w) if !w.name.trim().is_empty() => (w.name, w.description),
        Some(w) => (FALLBACK_WORKFLOW_NAME.to_string(), w.description),
        None => (FALLBACK_WORKFLOW_NAME.to_string(), None),
    };
    Ok(ResultsView {
        analysis_id: id.clone(),
        workflow_name,
        workflow_description,
        analysis,
    })
}

fn round(v: f64) -> i64 {
    v.round() as i64
}

/// Group digits with commas: 12345 -> "12,345".
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Full plain-text analysis report, suitable for sharing or saving.
pub fn render_report(view: &ResultsView, date: &str) -> String {
    let a = &view.analysis;
    let mut out = Vec::new();
    out.push("WORKSCANAI AUTOMATION ANALYSIS REPORT".to_string());
    out.push("=====================================".to_string());
    out.push(String::new());
    out.push(format!("Workflow: {}", view.workflow_name));
    out.push(format!("Analysis Date: {date}"));
    out.push(format!("Analysis ID: {}", view.analysis_id));
    out.push(String::new());
    out.push("EXECUTIVE SUMMARY".to_string());
    out.push("-----------------".to_string());
    out.push(format!("Automation Score: {}/100", round(a.automation_score)));
    out.push(format!("Total Tasks Analyzed: {}", view.total_tasks()));
    out.push(format!(
        "Tasks Ready for Automation: {}",
        view.automation_ready()
    ));
    out.push(format!(
        "Annual Savings Potential: €{}",
        group_thousands(round(a.annual_savings.unwrap_or(0.0)))
    ));
    out.push(format!(
        "Time Saved Per Year: {} hours",
        round(a.hours_saved.unwrap_or(0.0))
    ));
    out.push(String::new());
    out.push("DETAILED TASK ANALYSIS".to_string());
    out.push("----------------------".to_string());
    for (i, r) in a.results.iter().enumerate() {
        out.push(String::new());
        out.push(format!("{}. {}", i + 1, r.display_name(i)));
        out.push(format!(
            "   Automation Readiness: {}%",
            round(r.ai_readiness_score)
        ));
        out.push(format!(
            "   Time Savings Potential: {}%",
            round(r.time_saved_percentage.unwrap_or(0.0))
        ));
        out.push(format!(
            "   Implementation Difficulty: {}",
            r.difficulty.map(Difficulty::as_str).unwrap_or("unknown")
        ));
        if let Some(rec) = r.recommendation.as_deref() {
            out.push(format!("   Recommendation: {rec}"));
        }
        out.push(format!(
            "   Estimated Hours Saved: {} hours/year",
            round(r.estimated_hours_saved.unwrap_or(0.0))
        ));
    }
    out.push(String::new());
    out.push("RECOMMENDATIONS".to_string());
    out.push("---------------".to_string());
    let by_difficulty = |d: Difficulty| -> Vec<String> {
        a.results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.difficulty == Some(d))
            .map(|(i, r)| format!("• {}", r.display_name(i)))
            .collect()
    };
    out.push("Quick Wins (Implement First):".to_string());
    out.extend(by_difficulty(Difficulty::Easy));
    out.push(String::new());
    out.push("Medium-Term Goals:".to_string());
    out.extend(by_difficulty(Difficulty::Medium));
    out.push(String::new());
    out.push("NEXT STEPS".to_string());
    out.push("----------".to_string());
    out.push("1. Start with the highest-scoring, easiest-to-implement tasks".to_string());
    out.push("2. Set up automation tools recommended above".to_string());
    out.push("3. Test automations with small batches before full rollout".to_string());
    out.push("4. Monitor and iterate based on results".to_string());
    out.push(String::new());
    out.push("---".to_string());
    out.push("Report generated by WorkScanAI".to_string());
    out.join("\n")
}
