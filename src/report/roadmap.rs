use crate::model::{AnalysisResult, Difficulty};
use serde::Serialize;

/// Automation tools recognised in recommendation text.
pub const KNOWN_TOOLS: &[&str] = &[
    "zapier",
    "make",
    "buffer",
    "hootsuite",
    "calendly",
    "python",
    "chatgpt",
    "claude",
    "zendesk",
    "intercom",
    "tableau",
    "notion",
    "slack",
    "asana",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    QuickWins,
    MediumTerm,
    LongTerm,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::QuickWins, Phase::MediumTerm, Phase::LongTerm];

    pub fn for_difficulty(d: Difficulty) -> Option<Phase> {
        match d {
            Difficulty::Easy => Some(Phase::QuickWins),
            Difficulty::Medium => Some(Phase::MediumTerm),
            Difficulty::Hard => Some(Phase::LongTerm),
            Difficulty::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::QuickWins => "Phase 1 - Quick Wins",
            Phase::MediumTerm => "Phase 2 - Medium-Term",
            Phase::LongTerm => "Phase 3 - Long-Term",
        }
    }

    pub fn timeframe(self) -> &'static str {
        match self {
            Phase::QuickWins => "Start here · 0-4 weeks",
            Phase::MediumTerm => "After phase 1 · 1-3 months",
            Phase::LongTerm => "Strategic · 3-6 months",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Phase::QuickWins => "Easy automations with high ROI. No-code tools, immediate impact.",
            Phase::MediumTerm => "More complex automations requiring some setup or light coding.",
            Phase::LongTerm => {
                "Custom development or AI model integrations for maximum efficiency."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapItem {
    pub name: String,
    pub readiness: f64,
    pub hours_saved: Option<f64>,
    pub recommendation: Option<String>,
    pub tools: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapPhase {
    pub phase: Phase,
    pub items: Vec<RoadmapItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roadmap {
    pub phases: Vec<RoadmapPhase>,
    /// Tasks the backend gave no recognised difficulty; they belong to no phase.
    pub unplaced: usize,
}

impl Roadmap {
    pub fn phase(&self, phase: Phase) -> &[RoadmapItem] {
        self.phases
            .iter()
            .find(|p| p.phase == phase)
            .map(|p| p.items.as_slice())
            .unwrap_or(&[])
    }
}

/// Tools mentioned in `text`, matched on word boundaries, in `KNOWN_TOOLS` order.
pub fn detect_tools(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    KNOWN_TOOLS
        .iter()
        .copied()
        .filter(|tool| words.contains(tool))
        .collect()
}

/// Group task results into phases by difficulty, highest readiness first within a phase.
pub fn build_roadmap(analysis: &AnalysisResult) -> Roadmap {
    let mut phases: Vec<RoadmapPhase> = Phase::ALL
        .iter()
        .map(|p| RoadmapPhase {
            phase: *p,
            items: Vec::new(),
        })
        .collect();
    let mut unplaced = 0;

    for (i, r) in analysis.results.iter().enumerate() {
        let Some(phase) = r.difficulty.and_then(Phase::for_difficulty) else {
            unplaced += 1;
            continue;
        };
        let item = RoadmapItem {
            name: r.display_name(i),
            readiness: r.ai_readiness_score,
            hours_saved: r.estimated_hours_saved,
            recommendation: r.recommendation.clone(),
            tools: r.recommendation.as_deref().map(detect_tools).unwrap_or_default(),
        };
        if let Some(slot) = phases.iter_mut().find(|p| p.phase == phase) {
            slot.items.push(item);
        }
    }

    for p in &mut phases {
        // Stable sort keeps backend order among equal scores.
        p.items.sort_by(|a, b| {
            b.readiness
                .partial_cmp(&a.readiness)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    Roadmap { phases, unplaced }
}
