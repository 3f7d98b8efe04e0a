//! Configuração do tasktrack carregada a partir de `tasktrack.toml`.
//!
//! A struct [`TrackerConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `TASKTRACK_SEED` tem precedência sobre o arquivo.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::TrackerError;
use crate::tracker::{DescriptionPolicy, IdPolicy};

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "tasktrack.toml";

/// Variável de ambiente que fixa a semente do simulador de execução.
pub const SEED_ENV: &str = "TASKTRACK_SEED";

/// Configuração de nível superior carregada de `tasktrack.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// Arquivo binário onde as tarefas concluídas são guardadas.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Arquivo de texto do relatório de tarefas com sucesso.
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,

    /// Probabilidade de uma execução simulada terminar com sucesso.
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,

    /// Semente fixa para o simulador; ausente usa entropia do sistema.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Política de atribuição de ids na admissão de tarefas.
    #[serde(default)]
    pub id_policy: IdPolicy,

    /// O que fazer com descrições maiores que o limite de armazenamento.
    #[serde(default)]
    pub long_descriptions: DescriptionPolicy,
}

// Valor padrão para o arquivo de dados: "tarefas.bin".
fn default_data_file() -> PathBuf {
    PathBuf::from("tarefas.bin")
}

// Valor padrão para o relatório: "relatorio_sucesso.txt".
fn default_report_file() -> PathBuf {
    PathBuf::from("relatorio_sucesso.txt")
}

// Valor padrão para a probabilidade de sucesso: 50%.
fn default_success_probability() -> f64 {
    0.5
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            report_file: default_report_file(),
            success_probability: default_success_probability(),
            seed: None,
            id_policy: IdPolicy::default(),
            long_descriptions: DescriptionPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Carrega a configuração de `path`, ou de `tasktrack.toml` no diretório atual.
    /// Usa valores padrão se o arquivo implícito não existir; um `path`
    /// explícito inexistente é erro.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let p = Path::new(CONFIG_FILE);
                if p.exists() {
                    Self::from_file(p)?
                } else {
                    Self::default()
                }
            }
        };

        // Variável de ambiente tem precedência sobre o arquivo para a semente.
        if let Ok(raw) = std::env::var(SEED_ENV) {
            if !raw.trim().is_empty() {
                config.seed = Some(parse_seed(&raw)?);
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<TrackerConfig>(&contents)
            .map_err(TrackerError::from)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Rejeita combinações que o motor de execução não aceitaria.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(TrackerError::Config(format!(
                "success_probability must be within [0, 1], got {}",
                self.success_probability
            )));
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(TrackerError::Config("data_file must not be empty".into()));
        }
        if self.report_file.as_os_str().is_empty() {
            return Err(TrackerError::Config("report_file must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_seed(raw: &str) -> Result<u64, TrackerError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| TrackerError::Config(format!("{SEED_ENV}={raw:?} is not a valid seed: {e}")))
}
