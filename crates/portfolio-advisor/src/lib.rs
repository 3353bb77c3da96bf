//! # portfolio-advisor
//!
//! Volatility-based portfolio advice for a universe of stock tickers.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Market data  │──▶│ Risk assessor│──▶│  Portfolio   │──▶│ Explanation  │
//! │ (Yahoo/Mock) │   │ (σ of simple │   │  generator   │   │ (LLM or      │
//! │              │   │  returns)    │   │ (inverse σ)  │   │  fallback)   │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! The [`Orchestrator`] runs the first three steps either in process or as a
//! crew task graph (when crew credentials are configured) and always returns a
//! [`PortfolioResult`], possibly empty.
//!
//! ## Example: two tickers
//!
//! ```text
//! AAA  daily σ 0.02  ██████████████  66.7%
//! BBB  daily σ 0.04  ███████         33.3%
//! ```
//!
//! ```rust,ignore
//! let orchestrator = Orchestrator::new(config, market);
//! let result = orchestrator.recommend(request).await?;
//! ```

pub mod chart;
pub mod config;
pub mod error;
pub mod explain;
pub mod market;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod risk;
pub mod strategy;
pub mod svckit;

pub use config::{AdvisorConfig, ExplanationConfig, MarketSource};
pub use error::{AdvisorError, Result};
pub use explain::ExplanationAgent;
pub use market::{MarketDataProvider, MockMarketData, YahooFinanceClient};
pub use model::{
    DEFAULT_UNIVERSE, Explanation, ExplanationSource, PortfolioResult, PortfolioStatus, RecommendRequest,
    RiskLevel, StrategyKind, UniverseInput,
};
pub use orchestrator::{Orchestrator, PipelineState};
pub use pipeline::PipelineStrategy;
pub use risk::RiskAssessor;
pub use strategy::PortfolioGenerator;

/// Re-export crew tools for registration
pub mod tools {
    pub use crate::svckit::{PortfolioGeneratorTool, PriceHistoryTool, RiskAssessmentTool};
}
