use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tasktrack::cli::{Cli, Command};
use tasktrack::config::TrackerConfig;
use tasktrack::session::TaskTracker;
use tasktrack::shell::Shell;
use tasktrack::ui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag.
    let default_filter = if cli.verbose {
        "tasktrack=debug"
    } else {
        "tasktrack=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = TrackerConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.data_file {
        config.data_file = path;
    }
    if let Some(path) = cli.report_file {
        config.report_file = path;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    tracing::debug!(?config, "configuration resolved");

    let mut tracker = TaskTracker::from_config(&config)?;

    match cli.command.unwrap_or(Command::Shell) {
        Command::Shell => {
            let interactive = console::Term::stdout().is_term();
            let mut shell = Shell::new(tracker, &config).with_progress(interactive);
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }
        Command::Show { json } => {
            tracker
                .load(&config.data_file)
                .with_context(|| format!("failed to load {}", config.data_file.display()))?;
            let view = tracker.list_completed();
            let mut stdout = std::io::stdout();
            if json {
                writeln!(stdout, "{}", ui::render_completed_json(&view)?)?;
            } else {
                write!(stdout, "{}", ui::render_completed(&view))?;
            }
        }
        Command::Report { output } => {
            tracker
                .load(&config.data_file)
                .with_context(|| format!("failed to load {}", config.data_file.display()))?;
            let path = output.unwrap_or_else(|| config.report_file.clone());
            let n = tracker.generate_report(&path)?;
            print!(
                "{}",
                ui::render_ok(&format!("Report with {n} task(s) written to {}.", path.display()))
            );
        }
    }

    Ok(())
}
