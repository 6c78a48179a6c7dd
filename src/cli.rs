//! Interface de linha de comando do agente baseada em clap.
//!
//! Define a struct [`Cli`] com subcomando opcional [`Command`] (run, tick,
//! status, reset) e flags globais (--config, --verbose). Sem subcomando o
//! agente entra no laço de polling.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Entrega jobs de impressão do backend a uma impressora Duet após confirmação do operador.
#[derive(Debug, Parser)]
#[command(name = "duet-job-agent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Caminho do arquivo de configuração TOML (padrão: `duet-agent.toml`).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita logs em nível DEBUG em vez de INFO.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Subcomandos disponíveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Consulta a impressora até ser interrompido.
    Run,

    /// Executa um único tick e sai.
    Tick,

    /// Mostra o estado persistido.
    Status,

    /// Sobrescreve o estado persistido com BUSY.
    Reset,
}

impl Cli {
    /// Subcomando escolhido, ou [`Command::Run`] quando nenhum foi informado.
    pub fn command_or_default(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::parse_from(["duet-job-agent"]);
        assert_eq!(cli.command_or_default(), Command::Run);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "duet-job-agent",
            "--config",
            "/etc/duet-agent.toml",
            "--verbose",
            "status",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/duet-agent.toml")));
        assert_eq!(cli.command_or_default(), Command::Status);
    }

    #[test]
    fn cli_parses_tick_and_reset() {
        assert_eq!(Cli::parse_from(["duet-job-agent", "tick"]).command_or_default(), Command::Tick);
        assert_eq!(Cli::parse_from(["duet-job-agent", "reset", "-v"]).command_or_default(), Command::Reset);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
