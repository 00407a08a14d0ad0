use anyhow::Result;
use clap::Parser;
use workscan::cli;

fn init_tracing(to_sink: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    // The TUI owns the terminal; log lines would tear the alternate screen.
    if to_sink {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let args = cli::Cli::parse();
    let is_tui = args.is_tui();
    init_tracing(is_tui);

    cli::run(args).await?;
    // Explicitly exit with code 0 on success for non-TUI modes
    if !is_tui {
        std::process::exit(0);
    }
    Ok(())
}
