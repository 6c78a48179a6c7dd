//! Saída de terminal dos comandos `status` e `reset`.
//!
//! Usa a crate `console` para colorir o estado: verde quando a impressora
//! pode receber um job, amarelo enquanto aguarda operador ou backend, ciano
//! durante a impressão.

use console::Style;

use crate::state_machine::AgentState;
use crate::store::PersistedState;

// Estilo de cor associado a cada estado.
fn style_for(state: AgentState) -> Style {
    match state {
        AgentState::Ready => Style::new().green().bold(),
        AgentState::Pending | AgentState::Interaction => Style::new().yellow().bold(),
        AgentState::Busy => Style::new().cyan(),
    }
}

fn describe(state: AgentState) -> &'static str {
    match state {
        AgentState::Busy => "printer is busy",
        AgentState::Ready => "printer is idle, next tick asks the backend for a job",
        AgentState::Pending => "a readiness request was interrupted",
        AgentState::Interaction => "waiting for the operator to confirm on the printer",
    }
}

/// Formata o registro persistido, ou o estado padrão quando não há nenhum.
pub fn format_status(record: Option<&PersistedState>) -> String {
    match record {
        Some(record) => {
            let state = style_for(record.state).apply_to(record.state);
            let updated = record
                .updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            format!("{state}  {}\n  updated at {updated}", describe(record.state))
        }
        None => {
            let state = style_for(AgentState::Busy).apply_to(AgentState::Busy);
            format!("{state}  no saved state (will start as BUSY)")
        }
    }
}

/// Imprime o estado atual no stdout.
pub fn print_status(record: Option<&PersistedState>) {
    println!("{}", format_status(record));
}

/// Confirma o reset mostrando o estado anterior.
pub fn print_reset(previous: AgentState) {
    let green = Style::new().green().bold();
    println!(
        "  {} state reset: {previous} → {}",
        green.apply_to("✓"),
        AgentState::Busy
    );
}
