//! Configuração do agente carregada de `duet-agent.toml` e do ambiente.
//!
//! A struct [`AgentConfig`] contém todos os parâmetros configuráveis.
//! Chaves ausentes no arquivo usam defaults, e as variáveis de ambiente
//! (`PRINTER_IP`, `BACKEND_URL`, `POLL_INTERVAL_MS`, `STATE_FILE`,
//! `REQUEST_TIMEOUT_MS`) têm precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "duet-agent.toml";

/// Configuração de nível superior.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Endereço da API local da impressora. Também identifica a impressora no backend.
    #[serde(default)]
    pub printer_ip: String,

    /// URL base da fila de jobs do backend.
    #[serde(default)]
    pub backend_url: String,

    /// Intervalo entre ticks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Arquivo onde o estado atual é persistido.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Limite de tempo de cada chamada à impressora ou ao backend.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// Valor padrão do intervalo de polling: 5000ms.
fn default_poll_interval_ms() -> u64 {
    5000
}

// Valor padrão do arquivo de estado: `./printer-state.json`.
fn default_state_file() -> PathBuf {
    PathBuf::from("./printer-state.json")
}

// Valor padrão do timeout por chamada: 10000ms.
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            printer_ip: String::new(),
            backend_url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            state_file: default_state_file(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl AgentConfig {
    /// Carrega de `path` (ou `duet-agent.toml` no diretório atual) mais o
    /// ambiente do processo. Chame [`validate`](Self::validate) antes do polling.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let contents = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Monta a partir de um texto TOML opcional e de uma consulta ao ambiente.
    /// Valores de ambiente não vazios sobrescrevem o arquivo.
    pub fn from_sources(toml_text: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match toml_text {
            Some(text) => toml::from_str::<AgentConfig>(text).context("parsing config file")?,
            None => Self::default(),
        };

        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(ip) = lookup("PRINTER_IP") {
            config.printer_ip = ip;
        }
        if let Some(url) = lookup("BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(ms) = lookup("POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_ms("POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(path) = lookup("STATE_FILE") {
            config.state_file = PathBuf::from(path);
        }
        if let Some(ms) = lookup("REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_ms("REQUEST_TIMEOUT_MS", &ms)?;
        }

        Ok(config)
    }

    /// Rejeita configurações com as quais o agente não consegue rodar.
    pub fn validate(&self) -> Result<()> {
        if self.printer_ip.trim().is_empty() {
            bail!("PRINTER_IP is required");
        }
        if self.backend_url.trim().is_empty() {
            bail!("BACKEND_URL is required");
        }
        if self.poll_interval_ms == 0 {
            bail!("POLL_INTERVAL_MS must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("REQUEST_TIMEOUT_MS must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_ms(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = AgentConfig::default();
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.state_file, PathBuf::from("./printer-state.json"));
        assert_eq!(config.request_timeout_ms, 10_000);
        assert!(config.printer_ip.is_empty());
    }

    #[test]
    fn env_only_config() {
        let config = AgentConfig::from_sources(
            None,
            env_of(&[
                ("PRINTER_IP", "192.168.1.50"),
                ("BACKEND_URL", "http://queue.local"),
            ]),
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.printer_ip, "192.168.1.50");
        assert_eq!(config.backend_url, "http://queue.local");
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            printer_ip = "10.0.0.7"
            poll_interval_ms = 2000
        "#;
        let config = AgentConfig::from_sources(Some(toml_str), env_of(&[])).unwrap();
        assert_eq!(config.printer_ip, "10.0.0.7");
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert!(config.backend_url.is_empty());
    }

    #[test]
    fn env_overrides_file() {
        let toml_str = r#"
            printer_ip = "10.0.0.7"
            backend_url = "http://file.local"
            state_file = "/var/lib/agent/state.json"
        "#;
        let config = AgentConfig::from_sources(
            Some(toml_str),
            env_of(&[
                ("BACKEND_URL", "http://env.local"),
                ("POLL_INTERVAL_MS", "750"),
                ("STATE_FILE", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.printer_ip, "10.0.0.7");
        assert_eq!(config.backend_url, "http://env.local");
        assert_eq!(config.poll_interval_ms, 750);
        // Empty values are ignored.
        assert_eq!(config.state_file, PathBuf::from("/var/lib/agent/state.json"));
    }

    #[test]
    fn missing_required_values_fail_validation() {
        let config = AgentConfig::from_sources(None, env_of(&[("PRINTER_IP", "10.0.0.7")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("BACKEND_URL"));

        let config = AgentConfig::from_sources(None, env_of(&[])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PRINTER_IP"));
    }

    #[test]
    fn bad_interval_is_an_error() {
        let result = AgentConfig::from_sources(None, env_of(&[("POLL_INTERVAL_MS", "soon")]));
        assert!(result.is_err());

        let config = AgentConfig::from_sources(
            None,
            env_of(&[
                ("PRINTER_IP", "10.0.0.7"),
                ("BACKEND_URL", "http://queue.local"),
                ("POLL_INTERVAL_MS", "0"),
            ]),
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AgentConfig::from_sources(Some("printer_ip = "), env_of(&[])).is_err());
    }
}
