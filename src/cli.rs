//! Interface de linha de comando do tasktrack baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (shell, show, report)
//! e flags globais, além de [`ShellLine`], que interpreta cada linha digitada
//! dentro da sessão interativa.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::tracker::Priority;

/// tasktrack: gestor de tarefas com despacho por prioridade.
#[derive(Debug, Parser)]
#[command(name = "tasktrack", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Caminho para o arquivo de configuração (padrão: ./tasktrack.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Arquivo binário de tarefas concluídas.
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Arquivo de texto do relatório de sucesso.
    #[arg(long, global = true)]
    pub report_file: Option<PathBuf>,

    /// Semente do simulador de execução.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Abre a sessão interativa (padrão quando nenhum subcomando é dado).
    Shell,

    /// Lista as tarefas concluídas guardadas no arquivo de dados.
    Show {
        /// Emite JSON em vez de texto.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Gera o relatório de sucesso a partir do arquivo de dados.
    Report {
        /// Destino do relatório (padrão: `report_file` da configuração).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Prioridade aceita pela CLI, mapeada para [`Priority`] internamente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    /// Fila FIFO, atendida primeiro.
    High,
    /// Pilha LIFO, atendida quando não há alta prioridade.
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::High => Priority::High,
            PriorityArg::Low => Priority::Low,
        }
    }
}

/// Uma linha digitada na sessão interativa.
#[derive(Debug, Parser)]
#[command(
    name = "tasktrack>",
    no_binary_name = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// Registra uma nova tarefa pendente.
    Add {
        /// Prioridade: high (FIFO) ou low (LIFO).
        priority: PriorityArg,
        /// Descrição da tarefa, exatamente como digitada.
        #[arg(allow_hyphen_values = true)]
        description: String,
    },

    /// Executa a próxima tarefa pendente.
    #[command(visible_alias = "process")]
    Run,

    /// Lista as tarefas pendentes.
    Pending,

    /// Mostra a fila e a pilha na ordem em que serão atendidas.
    Queue,

    /// Lista as tarefas concluídas (sucesso e insucesso).
    Done,

    /// Procura uma tarefa pelo id.
    Find { id: u32 },

    /// Gera o relatório de tarefas com sucesso.
    Report { path: Option<PathBuf> },

    /// Guarda as tarefas concluídas em arquivo.
    Save { path: Option<PathBuf> },

    /// Carrega tarefas concluídas de um arquivo.
    Load { path: Option<PathBuf> },

    /// Mostra os comandos disponíveis.
    Help,

    /// Encerra a sessão.
    #[command(visible_alias = "exit")]
    Quit,
}

impl ShellLine {
    /// Interpreta uma linha digitada no shell.
    ///
    /// Em `add <prioridade> <descrição>` tudo o que vem depois da prioridade
    /// é a descrição, com os espaços internos preservados.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        let (head, rest) = next_word(line);
        if head != "add" {
            return Self::try_parse_from(line.split_whitespace());
        }
        let (priority, rest) = next_word(rest);
        let description = rest.trim_start();
        let args = [head, priority, description]
            .into_iter()
            .filter(|arg| !arg.is_empty());
        Self::try_parse_from(args)
    }
}

// Separa a primeira palavra do resto da linha, que segue intacto.
fn next_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    text.split_at(end)
}
