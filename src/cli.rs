use crate::backend::{Backend, HttpBackend};
use crate::capture::{FileAudioCapture, RemoteRecognizer, TranscriptEvent};
use crate::flow::{SubmissionController, SubmitEvent, SubmitOutcome};
use crate::model::{ClientConfig, ReportFormat, TaskDraft, WorkflowDraft, WorkflowId};
use crate::report::{self, ResultsView};
use crate::text_summary::{self, TextSummary};
use crate::{intake, verification};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

type OutputTx = mpsc::UnboundedSender<OutputLine>;

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (OutputTx, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "workscan",
    version,
    about = "Analyze workflows for automation potential, with an optional TUI"
)]
pub struct Cli {
    /// Base URL of the analysis backend
    #[arg(
        long,
        global = true,
        env = "WORKSCAN_API_URL",
        default_value = "http://localhost:8000"
    )]
    pub api_url: String,

    /// Site key for the bot-verification provider; verification is skipped when unset
    #[arg(long, global = true, env = "WORKSCAN_RECAPTCHA_SITE_KEY")]
    pub recaptcha_site_key: Option<String>,

    /// Pre-obtained bot-verification token
    #[arg(long, global = true, env = "WORKSCAN_RECAPTCHA_TOKEN", hide_env_values = true)]
    pub recaptcha_token: Option<String>,

    /// Program that prints a bot-verification token; called with the action and site key
    #[arg(long, global = true, env = "WORKSCAN_RECAPTCHA_TOKEN_CMD")]
    pub recaptcha_token_cmd: Option<String>,

    /// Per-request timeout
    #[arg(long, global = true, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Print JSON and exit (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long, global = true)]
    pub text: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Submit a workflow for analysis
    Submit(SubmitArgs),
    /// List saved workflows with their analysis totals
    List,
    /// Show one workflow and its tasks
    Show { id: WorkflowId },
    /// Show the analysis results for a workflow
    Results {
        id: WorkflowId,
        /// Print the full plain-text analysis report
        #[arg(long)]
        report: bool,
    },
    /// Show the phased implementation roadmap for a workflow
    Roadmap { id: WorkflowId },
    /// Download the analysis report as a document
    Export {
        id: WorkflowId,
        #[arg(long, value_enum)]
        format: ReportFormat,
        /// Output path (default: workscan-report-<id>.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args, Clone)]
pub struct SubmitArgs {
    /// Load the draft from a JSON file
    #[arg(long)]
    pub draft: Option<PathBuf>,

    /// Workflow name
    #[arg(long)]
    pub name: Option<String>,

    /// Workflow description
    #[arg(long)]
    pub description: Option<String>,

    /// Task as name[:frequency[:minutes[:category[:complexity]]]] (repeatable)
    #[arg(long = "task", value_name = "SPEC")]
    pub tasks: Vec<TaskDraft>,

    /// Hourly rate used for ROI
    #[arg(long)]
    pub hourly_rate: Option<f64>,

    /// Extract tasks from a document (PDF, DOCX, TXT)
    #[arg(long, conflicts_with_all = ["audio", "from_text"])]
    pub document: Option<PathBuf>,

    /// Extract tasks from a recorded description of the workflow
    #[arg(long, conflicts_with = "from_text")]
    pub audio: Option<PathBuf>,

    /// Extract tasks from a free-text description
    #[arg(long)]
    pub from_text: Option<String>,

    /// Delay for each of the two closing steps
    #[arg(long, default_value = "400ms")]
    pub settle_delay: humantime::Duration,

    /// Start the submission as soon as the TUI opens
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub submit_on_launch: bool,
}

impl Cli {
    /// True when this invocation hands the terminal to the TUI.
    pub fn is_tui(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text && matches!(self.command, Command::Submit(_))
    }
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    let settle_delay = match &args.command {
        Command::Submit(s) => Duration::from(s.settle_delay),
        _ => ClientConfig::default().settle_delay,
    };
    ClientConfig {
        api_url: args.api_url.clone(),
        recaptcha_site_key: args.recaptcha_site_key.clone(),
        recaptcha_token: args.recaptcha_token.clone(),
        recaptcha_token_cmd: args.recaptcha_token_cmd.clone(),
        timeout: Duration::from(args.timeout),
        settle_delay,
        user_agent: format!("workscan/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&cfg)?);
    let json = args.json;

    let (out_tx, out_handle) = spawn_output_writer();
    let res = match &args.command {
        Command::Submit(s) => {
            let draft = match build_draft(s, backend.clone(), &out_tx, json).await {
                Ok(d) => d,
                Err(e) => {
                    drop(out_tx);
                    let _ = out_handle.await;
                    return Err(e);
                }
            };
            // The writer holds the stdout lock; release it before the TUI takes the terminal.
            #[cfg(feature = "tui")]
            if args.is_tui() {
                drop(out_tx);
                let _ = out_handle.await;
                return crate::tui::run(cfg, backend, draft, s.submit_on_launch).await;
            }
            run_submit(&cfg, backend, draft, &out_tx, json).await
        }
        Command::List => run_list(backend.as_ref(), &out_tx, json).await,
        Command::Show { id } => run_show(backend.as_ref(), id, &out_tx, json).await,
        Command::Results { id, report } => {
            run_results(backend.as_ref(), id, *report, &out_tx, json).await
        }
        Command::Roadmap { id } => run_roadmap(backend.as_ref(), id, &out_tx, json).await,
        Command::Export { id, format, output } => {
            let (path, bytes) =
                crate::export::export_report(backend.as_ref(), id, *format, output.as_deref())
                    .await?;
            if json {
                emit_json(
                    &out_tx,
                    &serde_json::json!({ "path": path, "bytes": bytes }),
                )?;
            } else {
                let _ = out_tx.send(OutputLine::Stdout(format!(
                    "Saved: {} ({bytes} bytes)",
                    path.display()
                )));
            }
            Ok(())
        }
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

fn emit_json<T: serde::Serialize>(out_tx: &OutputTx, value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    Ok(())
}

fn emit_lines(out_tx: &OutputTx, summary: TextSummary) {
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
}

/// Assemble the draft: JSON file first, then intake, then explicit tasks, then flag overrides.
async fn build_draft(
    args: &SubmitArgs,
    backend: Arc<dyn Backend>,
    out_tx: &OutputTx,
    quiet: bool,
) -> Result<WorkflowDraft> {
    let mut draft = match args.draft.as_deref() {
        Some(p) => WorkflowDraft::load_json(p)?,
        None => WorkflowDraft::empty(),
    };

    let extracted = if let Some(path) = args.document.as_deref() {
        Some(
            intake::from_document(backend.as_ref(), &mut draft, path)
                .await
                .with_context(|| format!("document intake from {}", path.display()))?,
        )
    } else if let Some(path) = args.audio.as_deref() {
        let recognizer = RemoteRecognizer::new(backend.clone());
        let (tr_tx, mut tr_rx) = mpsc::unbounded_channel::<TranscriptEvent>();
        let n = intake::from_voice(
            backend.as_ref(),
            &recognizer,
            &mut draft,
            Box::new(FileAudioCapture::new(path)),
            Arc::new(AtomicBool::new(false)),
            Some(&tr_tx),
        )
        .await
        .with_context(|| format!("voice intake from {}", path.display()))?;
        while let Ok(TranscriptEvent::Final(t)) = tr_rx.try_recv() {
            if !quiet {
                let _ = out_tx.send(OutputLine::Stderr(format!("Transcript: {t}")));
            }
        }
        Some(n)
    } else if let Some(text) = args.from_text.as_deref() {
        Some(
            intake::from_text(backend.as_ref(), &mut draft, text)
                .await
                .context("text intake")?,
        )
    } else {
        None
    };
    if let (Some(n), false) = (extracted, quiet) {
        let _ = out_tx.send(OutputLine::Stderr(format!("Extracted {n} task(s)")));
    }

    // Drop the blank placeholder row before appending explicit tasks.
    if !args.tasks.is_empty() {
        draft.tasks.retain(TaskDraft::is_valid);
        draft.tasks.extend(args.tasks.iter().cloned());
    }
    if let Some(name) = &args.name {
        draft.name = name.clone();
    }
    if let Some(desc) = &args.description {
        draft.description = desc.clone();
    }
    if let Some(rate) = args.hourly_rate {
        draft.hourly_rate = rate;
    }
    Ok(draft)
}

async fn run_submit(
    cfg: &ClientConfig,
    backend: Arc<dyn Backend>,
    draft: WorkflowDraft,
    out_tx: &OutputTx,
    json: bool,
) -> Result<()> {
    let verifier = verification::verifier_from_config(cfg);
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<SubmitEvent>();
    let mut controller = SubmissionController::new(backend.clone(), verifier)
        .with_settle_delay(cfg.settle_delay)
        .with_events(evt_tx);
    let handle = tokio::spawn(async move { controller.submit(&draft).await });

    while let Some(ev) = evt_rx.recv().await {
        if json {
            continue;
        }
        match ev {
            SubmitEvent::StepStarted { step } => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "[{}/{}] {}…",
                    step.index() + 1,
                    crate::flow::Step::COUNT,
                    step.label()
                )));
            }
            SubmitEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            _ => {}
        }
    }

    let outcome = handle.await.context("submission task failed")?;
    match outcome {
        Ok(SubmitOutcome::Completed { workflow_id }) => {
            let view = report::load_results(backend.as_ref(), &workflow_id)
                .await
                .with_context(|| format!("load results for {workflow_id}"))?;
            if json {
                emit_json(
                    out_tx,
                    &serde_json::json!({
                        "status": "completed",
                        "workflow_id": workflow_id,
                        "results": view,
                    }),
                )?;
            } else {
                emit_lines(out_tx, text_summary::build_results_summary(&view));
            }
            Ok(())
        }
        Ok(SubmitOutcome::RateLimited {
            workflow_id,
            message,
        }) => {
            if json {
                emit_json(
                    out_tx,
                    &serde_json::json!({
                        "status": "rate_limited",
                        "workflow_id": workflow_id,
                        "message": message,
                    }),
                )?;
            } else {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "{message} (workflow {workflow_id} was saved without analysis)"
                )));
            }
            Ok(())
        }
        Err(e) => {
            if json {
                emit_json(
                    out_tx,
                    &serde_json::json!({
                        "status": "error",
                        "kind": e.kind(),
                        "message": e.to_string(),
                    }),
                )?;
            }
            Err(e.into())
        }
    }
}

async fn run_list(backend: &dyn Backend, out_tx: &OutputTx, json: bool) -> Result<()> {
    let dash = report::load_dashboard(backend)
        .await
        .context("list workflows")?;
    if json {
        return emit_json(out_tx, &dash);
    }
    emit_lines(out_tx, text_summary::build_dashboard_summary(&dash));
    Ok(())
}

async fn run_show(
    backend: &dyn Backend,
    id: &WorkflowId,
    out_tx: &OutputTx,
    json: bool,
) -> Result<()> {
    let wf = backend
        .get_workflow(id)
        .await
        .with_context(|| format!("load workflow {id}"))?;
    if json {
        return emit_json(out_tx, &wf);
    }
    let mut lines = vec![format!("{} (id {})", wf.name, wf.id)];
    if let Some(d) = wf.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(d.to_string());
    }
    if let Some(c) = wf.created_at.as_deref() {
        lines.push(format!("Created: {c}"));
    }
    for (i, t) in wf.tasks.iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:<32} {:<8} {:>4} min  {:<14} {}",
            i + 1,
            t.name,
            t.frequency.as_deref().unwrap_or("-"),
            t.time_per_task
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".into()),
            t.category.as_deref().unwrap_or("-"),
            t.complexity.as_deref().unwrap_or("-"),
        ));
    }
    emit_lines(out_tx, TextSummary { lines });
    Ok(())
}

fn today() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

async fn run_results(
    backend: &dyn Backend,
    id: &WorkflowId,
    full_report: bool,
    out_tx: &OutputTx,
    json: bool,
) -> Result<()> {
    let view: ResultsView = report::load_results(backend, id)
        .await
        .with_context(|| format!("load results for {id}"))?;
    match (json, full_report) {
        (true, true) => emit_json(
            out_tx,
            &serde_json::json!({ "report": report::render_report(&view, &today()) }),
        ),
        (true, false) => emit_json(out_tx, &view),
        (false, true) => {
            let _ = out_tx.send(OutputLine::Stdout(report::render_report(&view, &today())));
            Ok(())
        }
        (false, false) => {
            emit_lines(out_tx, text_summary::build_results_summary(&view));
            Ok(())
        }
    }
}

async fn run_roadmap(
    backend: &dyn Backend,
    id: &WorkflowId,
    out_tx: &OutputTx,
    json: bool,
) -> Result<()> {
    let view = report::load_results(backend, id)
        .await
        .with_context(|| format!("load results for {id}"))?;
    let roadmap = report::build_roadmap(&view.analysis);
    if json {
        return emit_json(out_tx, &roadmap);
    }
    let _ = out_tx.send(OutputLine::Stdout(format!(
        "Implementation roadmap: {}",
        view.workflow_name
    )));
    emit_lines(out_tx, text_summary::build_roadmap_summary(&roadmap));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_flags() {
        let cli = Cli::try_parse_from([
            "workscan",
            "--text",
            "submit",
            "--name",
            "Marketing",
            "--task",
            "Write posts:daily:45",
            "--task",
            "Reply to DMs",
            "--settle-delay",
            "0s",
        ])
        .unwrap();
        assert!(!cli.is_tui());
        let Command::Submit(s) = &cli.command else {
            panic!("expected submit");
        };
        assert_eq!(s.tasks.len(), 2);
        assert_eq!(s.tasks[0].time_per_task, 45);
        assert_eq!(build_config(&cli).settle_delay, Duration::ZERO);
    }

    #[test]
    fn intake_sources_conflict() {
        let res = Cli::try_parse_from([
            "workscan",
            "submit",
            "--document",
            "a.pdf",
            "--from-text",
            "hello",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn ids_keep_their_type() {
        let cli = Cli::try_parse_from(["workscan", "results", "42", "--report"]).unwrap();
        match cli.command {
            Command::Results { id, report } => {
                assert_eq!(id, WorkflowId::Int(42));
                assert!(report);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["workscan", "list", "--json", "--api-url", "http://x:1"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(build_config(&cli).api_url, "http://x:1");
    }
}
