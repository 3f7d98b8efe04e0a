//! Interface de terminal do tasktrack: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de execução e `console` para
//! estilização com cores. As funções `render_*` devolvem texto pronto para
//! ser escrito em qualquer destino, o que mantém o shell testável.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::report::format_timestamp;
use crate::session::{CompletedView, Located};
use crate::tracker::{Execution, Outcome, Priority, Task};

/// Indicador visual de progresso enquanto uma tarefa é executada.
///
/// Em saídas que não são terminais o indicatif esconde o spinner sozinho.
pub struct ExecutionProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
}

impl ExecutionProgress {
    /// Inicia o spinner e retorna a instância de progresso.
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("SELECT: picking next task");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    /// Finaliza e limpa o spinner.
    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

// Estilos usados em toda a saída.
fn green() -> Style {
    Style::new().green().bold()
}

fn red() -> Style {
    Style::new().red().bold()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn outcome_label(outcome: Outcome) -> String {
    match outcome {
        Outcome::Succeeded => green().apply_to("Succeeded").to_string(),
        Outcome::Failed => red().apply_to("Failed").to_string(),
        Outcome::Pending => yellow().apply_to("Pending").to_string(),
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "High",
        Priority::Low => "Low",
    }
}

/// Formata uma tarefa com todos os seus campos, uma linha por campo.
pub fn render_task(task: &Task) -> String {
    let mut out = format!(
        "ID: {}\nDescription: {}\nPriority: {}\nRegistered at: {}\n",
        task.id,
        task.description,
        priority_label(task.priority),
        format_timestamp(&task.registered_at)
    );
    if let Some(at) = &task.completed_at {
        out.push_str(&format!("Completed at: {}\n", format_timestamp(at)));
    }
    out.push_str(&format!("Status: {}\n", outcome_label(task.outcome)));
    out
}

/// Formata uma lista de tarefas sob um título, na ordem recebida.
pub fn render_section<'t>(title: &str, tasks: impl IntoIterator<Item = &'t Task>) -> String {
    let mut out = format!("{}\n", Style::new().bold().apply_to(title));
    let mut any = false;
    for task in tasks {
        any = true;
        out.push_str(&render_task(task));
        out.push('\n');
    }
    if !any {
        out.push_str("  (none)\n");
    }
    out
}

/// Formata o resultado de um ciclo de execução.
pub fn render_execution(execution: &Execution) -> String {
    match execution {
        Execution::Processed(task) => {
            let mark = match task.outcome {
                Outcome::Succeeded => green().apply_to("✓").to_string(),
                _ => red().apply_to("✗").to_string(),
            };
            format!("  {mark} Task processed:\n{}", render_task(task))
        }
        Execution::Idle => format!("  {} No pending tasks to process.\n", yellow().apply_to("•")),
    }
}

/// Formata as duas coleções de tarefas concluídas.
pub fn render_completed(view: &CompletedView<'_>) -> String {
    let mut out = render_section("SUCCEEDED TASKS", view.succeeded);
    out.push_str(&render_section("FAILED TASKS", view.failed));
    out
}

/// Formata o resultado de uma busca por id.
pub fn render_located(found: &Located<'_>) -> String {
    format!("Found in {} tasks:\n{}", found.collection, render_task(found.task))
}

/// Formata uma mensagem de erro recuperável.
pub fn render_error(err: &dyn std::fmt::Display) -> String {
    format!("  {} {err}\n", red().apply_to("error:"))
}

/// Formata uma mensagem de confirmação.
pub fn render_ok(message: &str) -> String {
    format!("  {} {message}\n", green().apply_to("✓"))
}

/// Serializa as tarefas concluídas em JSON legível.
pub fn render_completed_json(view: &CompletedView<'_>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "succeeded": view.succeeded,
        "failed": view.failed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Description;
    use chrono::Utc;

    fn task(outcome: Outcome) -> Task {
        let mut t = Task::new(7, Description::new("Render me").unwrap(), Priority::Low);
        if outcome != Outcome::Pending {
            t.complete(outcome, Utc::now());
        }
        t
    }

    #[test]
    fn pending_task_has_no_completion_line() {
        let text = render_task(&task(Outcome::Pending));
        assert!(text.contains("ID: 7"));
        assert!(text.contains("Description: Render me"));
        assert!(text.contains("Priority: Low"));
        assert!(!text.contains("Completed at"));
        assert!(text.contains("Pending"));
    }

    #[test]
    fn completed_task_shows_completion() {
        let text = render_task(&task(Outcome::Failed));
        assert!(text.contains("Completed at: "));
        assert!(text.contains("Failed"));
    }

    #[test]
    fn idle_execution_message() {
        assert!(render_execution(&Execution::Idle).contains("No pending tasks"));
    }

    #[test]
    fn empty_sections_say_none() {
        let view = CompletedView {
            succeeded: &[],
            failed: &[],
        };
        let text = render_completed(&view);
        assert!(text.contains("SUCCEEDED TASKS"));
        assert!(text.contains("FAILED TASKS"));
        assert_eq!(text.matches("(none)").count(), 2);
    }

    #[test]
    fn completed_json_lists_both_collections() {
        let ok = [task(Outcome::Succeeded)];
        let view = CompletedView {
            succeeded: &ok,
            failed: &[],
        };
        let json = render_completed_json(&view).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["succeeded"][0]["id"], 7);
        assert_eq!(value["succeeded"][0]["outcome"], "succeeded");
        assert!(value["failed"].as_array().unwrap().is_empty());
    }
}
