//! Text summary builders for CLI output.
//!
//! This module formats human-readable lines for text mode. Nothing is recomputed beyond
//! counts and the score distribution; all figures come from the backend.

use crate::metrics::{self, ScoreBand};
use crate::report::{group_thousands, Dashboard, Phase, ResultsView, Roadmap};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn band_label(score: f64) -> &'static str {
    match metrics::score_band(score) {
        ScoreBand::High => "high",
        ScoreBand::Medium => "medium",
        ScoreBand::Low => "low",
    }
}

fn fmt_hours(h: Option<f64>) -> String {
    h.map(|v| format!("{} h", v.round() as i64))
        .unwrap_or_else(|| "-".into())
}

fn fmt_money(v: Option<f64>) -> String {
    v.map(|v| format!("€{}", group_thousands(v.round() as i64)))
        .unwrap_or_else(|| "-".into())
}

/// Results headline plus one line per task.
pub(crate) fn build_results_summary(view: &ResultsView) -> TextSummary {
    let a = &view.analysis;
    let mut lines = Vec::new();

    lines.push(format!("Workflow: {} (id {})", view.workflow_name, view.analysis_id));
    if let Some(desc) = view.workflow_description.as_deref() {
        if !desc.trim().is_empty() {
            lines.push(format!("Description: {desc}"));
        }
    }
    lines.push(format!(
        "Automation score: {}/100 ({})",
        a.automation_score.round() as i64,
        band_label(a.automation_score)
    ));
    lines.push(format!(
        "Tasks: {} analyzed, {} ready for automation",
        view.total_tasks(),
        view.automation_ready()
    ));
    lines.push(format!(
        "Savings: {} per year, {} saved per year",
        fmt_money(a.annual_savings),
        fmt_hours(a.hours_saved)
    ));

    if let Some(s) = view.readiness() {
        lines.push(format!(
            "Readiness: avg {:.1} med {:.1} p25 {:.1} p75 {:.1} (range {:.0}-{:.0})",
            s.mean, s.median, s.p25, s.p75, s.lowest, s.highest
        ));
    }

    for (i, r) in a.results.iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:<32} {:>3}% {:<6} {:<7} {}",
            i + 1,
            r.display_name(i),
            r.ai_readiness_score.round() as i64,
            band_label(r.ai_readiness_score),
            r.difficulty.map(|d| d.as_str()).unwrap_or("-"),
            fmt_hours(r.estimated_hours_saved)
        ));
        if let Some(rec) = r.recommendation.as_deref().filter(|s| !s.trim().is_empty()) {
            lines.push(format!("      {rec}"));
        }
    }

    TextSummary { lines }
}

pub(crate) fn build_roadmap_summary(roadmap: &Roadmap) -> TextSummary {
    let mut lines = Vec::new();
    for phase in Phase::ALL {
        let items = roadmap.phase(phase);
        lines.push(format!("{} ({})", phase.label(), phase.timeframe()));
        lines.push(format!("  {}", phase.description()));
        if items.is_empty() {
            lines.push("  (no tasks)".into());
        }
        for item in items {
            let tools = if item.tools.is_empty() {
                String::new()
            } else {
                format!(" [{}]", item.tools.join(", "))
            };
            lines.push(format!(
                "  - {} ({}% ready, {}){}",
                item.name,
                item.readiness.round() as i64,
                fmt_hours(item.hours_saved),
                tools
            ));
        }
    }
    if roadmap.unplaced > 0 {
        lines.push(format!(
            "{} task(s) without a known difficulty are not placed in any phase",
            roadmap.unplaced
        ));
    }
    TextSummary { lines }
}

pub(crate) fn build_dashboard_summary(dash: &Dashboard) -> TextSummary {
    let t = &dash.totals;
    let mut lines = vec![
        format!("Workflows: {} ({} analyzed)", t.workflows, t.analyzed),
        format!(
            "Total: {} saved per year, {} per year, average score {}",
            fmt_hours(Some(t.total_hours_saved)),
            fmt_money(Some(t.total_annual_savings)),
            t.average_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into())
        ),
    ];
    for e in &dash.entries {
        let created = e
            .created_at
            .as_deref()
            .map(|s| s.get(..10).unwrap_or(s))
            .unwrap_or("-");
        let status = match e.automation_score {
            Some(s) => format!(
                "score {:>3}, {}, {}",
                s.round() as i64,
                fmt_hours(e.hours_saved),
                fmt_money(e.annual_savings)
            ),
            None => "no analysis".to_string(),
        };
        lines.push(format!(
            "  {:>6}  {}  {:<32} {:>2} tasks  {}",
            e.id, created, e.name, e.task_count, status
        ));
    }
    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Workflow, WorkflowId};
    use crate::report::fixtures::{analysis, task};
    use crate::report::{build_dashboard, build_roadmap};

    fn view() -> ResultsView {
        ResultsView {
            analysis_id: WorkflowId::Int(7),
            workflow_name: "Ops".into(),
            workflow_description: Some("Back office".into()),
            analysis: analysis(
                7,
                vec![
                    task("Invoices", 82.0, Difficulty::Easy, "Use Zapier"),
                    task("Calls", 30.0, Difficulty::Hard, ""),
                ],
            ),
        }
    }

    #[test]
    fn results_headline() {
        let s = build_results_summary(&view()).lines.join("\n");
        assert!(s.contains("Workflow: Ops (id 7)"));
        assert!(s.contains("Automation score: 68/100 (medium)"));
        assert!(s.contains("Tasks: 2 analyzed, 1 ready for automation"));
        assert!(s.contains("€15,630 per year"));
        assert!(s.contains("Readiness: avg 56.0 med 56.0"));
        assert!(s.contains("(range 30-82)"));
        assert!(s.contains("Use Zapier"));
    }

    #[test]
    fn roadmap_lists_empty_phases() {
        let r = build_roadmap(&view().analysis);
        let s = build_roadmap_summary(&r).lines.join("\n");
        assert!(s.contains("Invoices (82% ready, 82 h) [zapier]"));
        assert!(s.contains("(no tasks)"));
    }

    #[test]
    fn dashboard_marks_orphans() {
        let wf = Workflow {
            id: WorkflowId::Int(3),
            name: "Orphan".into(),
            description: None,
            created_at: Some("2025-01-05T08:00:00".into()),
            tasks: Vec::new(),
        };
        let d = build_dashboard(vec![(wf, None)]);
        let s = build_dashboard_summary(&d).lines.join("\n");
        assert!(s.contains("Workflows: 1 (0 analyzed)"));
        assert!(s.contains("average score -"));
        assert!(s.contains("2025-01-05"));
        assert!(s.contains("no analysis"));
    }
}
