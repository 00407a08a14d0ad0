mod clipboard;
mod help;
mod state;

use crate::backend::Backend;
use crate::flow::session::{self, SessionEvent, UiCommand};
use crate::flow::{FlowState, Step, SubmissionController};
use crate::metrics::{score_band, ScoreBand};
use crate::model::{ClientConfig, WorkflowDraft};
use crate::report::{group_thousands, Phase};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{apply_event, push_wrapped_status_kv, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(
    cfg: ClientConfig,
    backend: Arc<dyn Backend>,
    draft: WorkflowDraft,
    submit_on_launch: bool,
) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let verifier = crate::verification::verifier_from_config(&cfg);
    let controller =
        SubmissionController::new(backend, verifier).with_settle_delay(cfg.settle_delay);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_state = UiState::for_draft(&draft);
    let ui_handle = std::thread::spawn(move || run_threaded(ui_state, event_rx, cmd_tx));

    let res = session::run_session(controller, draft, submit_on_launch, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) | (_, KeyCode::Enter) => {
                        if state.progress.is_frozen() {
                            state.info = "Dismiss the rate-limit notice first (d)".into();
                        } else if !state.submitting {
                            state.tab = state::TAB_PROGRESS;
                            let _ = cmd_tx.send(UiCommand::Submit);
                        }
                    }
                    (_, KeyCode::Char('d')) => {
                        let _ = cmd_tx.send(UiCommand::DismissNotice);
                    }
                    (_, KeyCode::Char('y')) => match state.workflow_id.as_ref() {
                        Some(id) => match clipboard::copy_to_clipboard(&id.to_string()) {
                            Ok(()) => state.info = format!("Copied workflow id {id}"),
                            Err(e) => state.info = format!("Copy failed: {e:#}"),
                        },
                        None => state.info = "No workflow saved yet".into(),
                    },
                    (_, KeyCode::Tab) => state.tab = (state.tab + 1) % state::TAB_COUNT,
                    (_, KeyCode::BackTab) => {
                        state.tab = (state.tab + state::TAB_COUNT - 1) % state::TAB_COUNT
                    }
                    (_, KeyCode::Char('?')) => state.tab = state::TAB_HELP,
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn band_color(score: f64) -> Color {
    match score_band(score) {
        ScoreBand::High => Color::Green,
        ScoreBand::Medium => Color::Yellow,
        ScoreBand::Low => Color::Red,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(4)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Progress"),
        Line::from("Results"),
        Line::from("Roadmap"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("workscan"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        state::TAB_PROGRESS => draw_progress(chunks[1], f, state),
        state::TAB_RESULTS => draw_results(chunks[1], f, state),
        state::TAB_ROADMAP => draw_roadmap(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    let mut status = Vec::new();
    push_wrapped_status_kv(&mut status, "Status", &state.info, chunks[2].width);
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );
}

fn draw_progress(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),                        // Draft summary
                Constraint::Length(3),                        // Gauge
                Constraint::Length(Step::COUNT as u16 + 2),   // Step list
                Constraint::Min(0),                           // Notices
            ]
            .as_ref(),
        )
        .split(area);

    let summary = vec![
        Line::from(vec![
            Span::styled("Workflow: ", Style::default().fg(Color::Gray)),
            Span::styled(
                state.workflow_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Tasks: ", Style::default().fg(Color::Gray)),
            Span::raw(state.task_count.to_string()),
            Span::styled("   Hourly rate: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("€{:.0}", state.hourly_rate)),
        ]),
    ];
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title("Draft")),
        rows[0],
    );

    let done = state.progress.completed_steps().len();
    let ratio = (done as f64 / Step::COUNT as f64).clamp(0.0, 1.0);
    let gauge_color = match state.progress.state() {
        FlowState::RateLimited { .. } => Color::Yellow,
        FlowState::Done => Color::Green,
        _ => Color::Cyan,
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!("{done}/{}", Step::COUNT));
    f.render_widget(gauge, rows[1]);

    let current = state.progress.current_step_index();
    let steps: Vec<Line> = Step::ALL
        .iter()
        .map(|step| {
            let (mark, style) = if state.progress.is_step_completed(*step) {
                ("✓", Style::default().fg(Color::Green))
            } else if current == step.index() as i32 {
                ("▶", Style::default().fg(Color::Yellow))
            } else {
                ("·", Style::default().fg(Color::DarkGray))
            };
            Line::from(vec![
                Span::styled(format!(" {mark} "), style),
                Span::raw(step.label()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(steps).block(Block::default().borders(Borders::ALL).title("Steps")),
        rows[2],
    );

    let mut notices: Vec<Line> = Vec::new();
    if let Some(msg) = state.progress.rate_limit_notice() {
        notices.push(Line::from(Span::styled(
            "Rate limit reached",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        notices.push(Line::from(msg.to_string()));
        notices.push(Line::from(Span::styled(
            "Press d to dismiss.",
            Style::default().fg(Color::Gray),
        )));
    } else if let Some(err) = state.progress.terminal_error() {
        notices.push(Line::from(Span::styled(
            "Submission failed",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        notices.push(Line::from(err.to_string()));
        notices.push(Line::from(Span::styled(
            "Press s to try again.",
            Style::default().fg(Color::Gray),
        )));
    } else if matches!(state.progress.state(), FlowState::NotStarted) && !state.submitting {
        notices.push(Line::from("Press s or Enter to submit."));
    }
    f.render_widget(
        Paragraph::new(notices)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        rows[3],
    );
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(view) = state.results.as_ref() else {
        let p = Paragraph::new("No results yet.")
            .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(p, area);
        return;
    };
    let a = &view.analysis;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)].as_ref())
        .split(area);

    let score = a.automation_score;
    let headline = vec![
        Line::from(vec![
            Span::styled("Automation score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/100", score.round() as i64),
                Style::default()
                    .fg(band_color(score))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Tasks: ", Style::default().fg(Color::Gray)),
            Span::raw(format!(
                "{} analyzed, {} ready for automation",
                view.total_tasks(),
                view.automation_ready()
            )),
        ]),
        Line::from(vec![
            Span::styled("Annual savings: ", Style::default().fg(Color::Gray)),
            Span::raw(format!(
                "€{}",
                group_thousands(a.annual_savings.unwrap_or(0.0).round() as i64)
            )),
            Span::styled("   Hours saved: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}/yr", a.hours_saved.unwrap_or(0.0).round() as i64)),
        ]),
    ];
    f.render_widget(
        Paragraph::new(headline).block(
            Block::default()
                .borders(Borders::ALL)
                .title(view.workflow_name.clone()),
        ),
        rows[0],
    );

    let mut lines: Vec<Line> = Vec::new();
    for (i, r) in a.results.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:>3}% ", r.ai_readiness_score.round() as i64),
                Style::default().fg(band_color(r.ai_readiness_score)),
            ),
            Span::styled(
                r.display_name(i),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {}",
                    r.difficulty.map(|d| d.as_str()).unwrap_or("-")
                ),
                Style::default().fg(Color::Gray),
            ),
        ]));
        if let Some(rec) = r.recommendation.as_deref().filter(|s| !s.trim().is_empty()) {
            lines.push(Line::from(format!("      {rec}")));
        }
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Tasks")),
        rows[1],
    );
}

fn draw_roadmap(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(roadmap) = state.roadmap.as_ref() else {
        let p = Paragraph::new("No roadmap yet.")
            .block(Block::default().borders(Borders::ALL).title("Roadmap"));
        f.render_widget(p, area);
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(34),
                Constraint::Percentage(33),
                Constraint::Percentage(33),
            ]
            .as_ref(),
        )
        .split(area);

    for (phase, col) in Phase::ALL.iter().zip(cols.iter()) {
        let mut lines = vec![
            Line::from(Span::styled(
                phase.timeframe(),
                Style::default().fg(Color::Gray),
            )),
            Line::from(phase.description()),
            Line::from(""),
        ];
        let items = roadmap.phase(*phase);
        if items.is_empty() {
            lines.push(Line::from(Span::styled(
                "No tasks",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for item in items {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:>3}% ", item.readiness.round() as i64),
                    Style::default().fg(band_color(item.readiness)),
                ),
                Span::raw(item.name.clone()),
            ]));
            if !item.tools.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("      {}", item.tools.join(", ")),
                    Style::default().fg(Color::Cyan),
                )));
            }
        }
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(phase.label())),
            *col,
        );
    }
}
