//! Error Types for the Portfolio Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No price data for {0}")]
    NoData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Agent error: {0}")]
    Agent(#[from] agent_core::AgentError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            AdvisorError::UnknownSymbol(symbol) => format!("'{}' is not a known ticker.", symbol),
            AdvisorError::NoData(_) | AdvisorError::MarketData(_) | AdvisorError::Network(_) => {
                "Market data is currently unavailable.".into()
            }
            AdvisorError::Agent(e) => e.user_message(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}

impl From<AdvisorError> for agent_core::AgentError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::Agent(inner) => inner,
            AdvisorError::InvalidRequest(msg) => agent_core::AgentError::ToolValidation(msg),
            other => agent_core::AgentError::ToolExecution(other.to_string()),
        }
    }
}
