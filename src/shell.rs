//! Interactive session loop.
//!
//! Reads one command per line, drives the [`TaskTracker`] and writes rendered
//! results. Every tracker error is reported and the session carries on; only
//! I/O failures on the session streams themselves end it.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::CommandFactory;

use crate::cli::{ShellCommand, ShellLine};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::session::TaskTracker;
use crate::tracker::OutcomeSource;
use crate::ui;

const PROMPT: &str = "tasktrack> ";

/// Whether the loop should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'a, O> {
    tracker: TaskTracker<O>,
    config: &'a TrackerConfig,
    show_progress: bool,
}

impl<'a, O: OutcomeSource> Shell<'a, O> {
    pub fn new(tracker: TaskTracker<O>, config: &'a TrackerConfig) -> Self {
        Self {
            tracker,
            config,
            show_progress: false,
        }
    }

    /// Shows a spinner while each task executes.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Runs until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> Result<()> {
        write!(output, "{PROMPT}")?;
        output.flush()?;
        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() && self.handle(&line, output)? == Flow::Quit {
                break;
            }
            write!(output, "{PROMPT}")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }

    fn handle<W: Write>(&mut self, line: &str, output: &mut W) -> Result<Flow> {
        let parsed = match ShellLine::parse_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                write!(output, "{}", e.render())?;
                return Ok(Flow::Continue);
            }
        };

        let text = match self.dispatch(parsed.command) {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(Flow::Quit),
            Err(e) => {
                tracing::debug!(error = %e, "command failed");
                ui::render_error(&e)
            }
        };
        write!(output, "{text}")?;
        Ok(Flow::Continue)
    }

    /// Runs one command, returning the text to show or `None` to quit.
    fn dispatch(&mut self, command: ShellCommand) -> Result<Option<String>, TrackerError> {
        let text = match command {
            ShellCommand::Add {
                priority,
                description,
            } => {
                let task = self.tracker.intake(&description, priority.into())?;
                ui::render_ok(&format!(
                    "Task {} registered with {} priority.",
                    task.id, task.priority
                ))
            }
            ShellCommand::Run => {
                let progress = self.show_progress.then(ui::ExecutionProgress::start);
                let result = self.tracker.execute_next();
                if let Some(p) = progress {
                    p.finish();
                }
                ui::render_execution(&result?)
            }
            ShellCommand::Pending => ui::render_section("PENDING TASKS", self.tracker.list_pending()),
            ShellCommand::Queue => {
                let mut text = ui::render_section(
                    "HIGH PRIORITY QUEUE (next first)",
                    self.tracker.high_queue().iter(),
                );
                text.push_str(&ui::render_section(
                    "LOW PRIORITY STACK (next first)",
                    self.tracker.low_stack().iter(),
                ));
                text
            }
            ShellCommand::Done => ui::render_completed(&self.tracker.list_completed()),
            ShellCommand::Find { id } => ui::render_located(&self.tracker.find(id)?),
            ShellCommand::Report { path } => {
                let path = self.resolve(path, &self.config.report_file);
                let n = self.tracker.generate_report(&path)?;
                ui::render_ok(&format!("Report with {n} task(s) written to {}.", path.display()))
            }
            ShellCommand::Save { path } => {
                let path = self.resolve(path, &self.config.data_file);
                self.tracker.save(&path)?;
                ui::render_ok(&format!("Completed tasks saved to {}.", path.display()))
            }
            ShellCommand::Load { path } => {
                let path = self.resolve(path, &self.config.data_file);
                self.tracker.load(&path)?;
                let view = self.tracker.list_completed();
                ui::render_ok(&format!(
                    "Loaded {} succeeded and {} failed task(s) from {}.",
                    view.succeeded.len(),
                    view.failed.len(),
                    path.display()
                ))
            }
            ShellCommand::Help => ShellLine::command().render_help().to_string(),
            ShellCommand::Quit => return Ok(None),
        };
        Ok(Some(text))
    }

    fn resolve(&self, path: Option<PathBuf>, default: &Path) -> PathBuf {
        path.unwrap_or_else(|| default.to_path_buf())
    }
}
