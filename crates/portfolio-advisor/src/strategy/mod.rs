//! Allocation Strategies
//!
//! Turning risk scores into weights, and weights into whole-share holdings.

mod holdings;
mod inverse_volatility;

pub use holdings::plan_holdings;
pub use inverse_volatility::PortfolioGenerator;
