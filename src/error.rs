//! Caller-visible failures of a technician match

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Missing or blank target address
    #[error("Endereço não informado")]
    InvalidInput,

    /// Every geocoding strategy missed the target address
    #[error("Endereço do atendimento inválido ou não encontrado")]
    UnresolvableAddress,

    /// No roster entry resolved to coordinates
    #[error("Nenhum técnico disponível com endereço válido")]
    EmptyRoster,

    /// The routing provider found no route to any technician
    #[error("Nenhuma rota disponível até os técnicos")]
    NoRoute,

    #[error("Falha ao carregar a lista de técnicos: {0:#}")]
    Roster(anyhow::Error),

    /// Transport failure from a geocoding or routing provider
    #[error("Serviço externo indisponível: {0:#}")]
    Upstream(anyhow::Error),
}

impl MatchError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::InvalidInput => "address_missing",
            MatchError::UnresolvableAddress => "address_unresolvable",
            MatchError::EmptyRoster => "no_technician",
            MatchError::NoRoute => "no_route",
            MatchError::Roster(_) => "roster_unavailable",
            MatchError::Upstream(_) => "upstream_unavailable",
        }
    }
}
