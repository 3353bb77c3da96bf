//! Explanation Agent
//!
//! Asks a generative-text provider for a short rationale of an allocation.
//! Every failure path (no provider, error, timeout, empty reply) produces a
//! deterministic text instead, tagged as a fallback.

use std::sync::Arc;
use std::time::Duration;

use agent_core::{AgentError, GenerationOptions, LlmProvider, Message};
use serde_json::json;

use crate::model::{Explanation, ExplanationSource, PortfolioResult, RiskLevel};

const SYSTEM_PROMPT: &str = "You are a helpful financial advisor. \
Explain portfolio allocations to retail investors in plain language. \
Be concise and do not promise returns.";

const EMPTY_PORTFOLIO_TEXT: &str = "Not enough market data was available to build a portfolio. \
No allocation was made; try again later or choose a different set of tickers.";

pub struct ExplanationAgent {
    provider: Option<Arc<dyn LlmProvider>>,
    options: GenerationOptions,
    timeout: Duration,
}

impl ExplanationAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            options,
            timeout,
        }
    }

    /// Agent that always uses the offline text
    pub fn offline() -> Self {
        Self {
            provider: None,
            options: GenerationOptions::default(),
            timeout: Duration::from_secs(1),
        }
    }

    /// Explain `result` for an investor with `risk_level`
    pub async fn explain(&self, result: &PortfolioResult, risk_level: RiskLevel) -> Explanation {
        if result.is_empty() {
            return Explanation {
                text: EMPTY_PORTFOLIO_TEXT.into(),
                source: ExplanationSource::Fallback {
                    reason: "empty portfolio".into(),
                },
            };
        }

        let Some(provider) = &self.provider else {
            return fallback(result, risk_level, "no explanation provider configured");
        };

        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(build_prompt(result, risk_level)),
        ];
        tracing::debug!(
            model = %self.options.model,
            prompt_tokens = messages.iter().map(Message::estimate_tokens).sum::<u32>(),
            "Requesting explanation"
        );

        match tokio::time::timeout(self.timeout, provider.complete(&messages, &self.options)).await {
            Ok(Ok(completion)) => {
                let text = completion.content.trim();
                if text.is_empty() {
                    tracing::warn!("Explanation provider returned an empty reply");
                    fallback(result, risk_level, "empty response")
                } else {
                    Explanation {
                        text: text.to_string(),
                        source: ExplanationSource::Live {
                            model: completion.model,
                        },
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "Explanation provider failed");
                fallback(result, risk_level, failure_reason(&e))
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "Explanation timed out");
                fallback(result, risk_level, "timed out")
            }
        }
    }
}

fn build_prompt(result: &PortfolioResult, risk_level: RiskLevel) -> String {
    let holdings: Vec<serde_json::Value> = result
        .holdings
        .holdings
        .iter()
        .map(|h| {
            json!({
                "ticker": h.symbol,
                "weight": format!("{:.1}%", h.weight * 100.0),
                "shares": h.shares,
                "allocated": h.allocated,
                "annualized_volatility": result
                    .risk_report
                    .entries
                    .get(&h.symbol)
                    .map(|e| format!("{:.1}%", e.annualized_volatility * 100.0)),
            })
        })
        .collect();

    let weights: serde_json::Map<String, serde_json::Value> = result
        .weights
        .iter()
        .map(|(symbol, w)| (symbol.clone(), json!(format!("{:.1}%", w * 100.0))))
        .collect();

    let portfolio = json!({
        "weights": weights,
        "budget": result.holdings.budget,
        "allocated": result.holdings.allocated,
        "remaining": result.holdings.remaining,
        "holdings": holdings,
    });

    format!(
        "Given the risk level: {}\n\
         and the portfolio: {}\n\
         The weights are inverse-volatility: calmer stocks receive larger shares of the budget.\n\
         Provide a concise, clear explanation of why these tickers were weighted this way, \
         the risk considerations, and any simple suggestions.",
        risk_level, portfolio
    )
}

/// Caller-facing reason for a provider failure; raw provider text stays in the logs
fn failure_reason(err: &AgentError) -> &'static str {
    match err {
        AgentError::Timeout(_) => "timed out",
        AgentError::RateLimited(_) => "provider rate limited",
        AgentError::Auth(_) => "provider rejected credentials",
        AgentError::ProviderUnavailable(_) => "provider unavailable",
        AgentError::MalformedResponse(_) => "unusable provider response",
        _ => "provider error",
    }
}

fn fallback(result: &PortfolioResult, risk_level: RiskLevel, reason: &str) -> Explanation {
    let mut ranked: Vec<(&String, &f64)> = result.weights.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let listing = ranked
        .iter()
        .map(|(symbol, w)| format!("{} ({:.1}%)", symbol, *w * 100.0))
        .collect::<Vec<_>>()
        .join(", ");

    Explanation {
        text: format!(
            "Selected tickers: {}. Weights are inversely proportional to each stock's recent volatility, \
             so steadier stocks receive more of the budget. Portfolio matches {} risk preference. \
             (No LLM available)",
            listing, risk_level
        ),
        source: ExplanationSource::Fallback {
            reason: reason.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::provider::{Completion, FinishReason, ModelInfo, ProviderInfo};
    use agent_core::Result as CoreResult;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use crate::model::{PipelineRequest, PortfolioStatus, StrategyKind};

    enum Behavior {
        Reply(&'static str),
        Fail,
        Unreachable,
        Hang,
    }

    struct MockProvider(Behavior);

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn info(&self) -> CoreResult<ProviderInfo> {
            Ok(ProviderInfo { name: "mock".into(), version: None, models: vec![] })
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> CoreResult<Completion> {
            assert!(messages[1].content.contains("AAA"));
            match self.0 {
                Behavior::Reply(text) => Ok(Completion {
                    content: text.into(),
                    model: options.model.clone(),
                    usage: None,
                    truncated: false,
                    finish_reason: Some(FinishReason::Stop),
                }),
                Behavior::Fail => Err(AgentError::RateLimited("quota".into())),
                Behavior::Unreachable => Err(AgentError::ProviderUnavailable(
                    "error sending request for url (http://host/generate?key=SECRETKEY123)".into(),
                )),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Err(AgentError::Timeout(10))
                }
            }
        }

        async fn list_models(&self) -> CoreResult<Vec<ModelInfo>> {
            Ok(vec![])
        }
    }

    fn result_with(weights: &[(&str, f64)]) -> PortfolioResult {
        let request = PipelineRequest {
            symbols: weights.iter().map(|(s, _)| (*s).to_string()).collect(),
            lookback_days: 30,
            budget: dec!(1000),
            risk_level: RiskLevel::Moderate,
        };
        let mut result = PortfolioResult::empty(&request, StrategyKind::Deterministic);
        result.weights = weights.iter().map(|(s, w)| ((*s).to_string(), *w)).collect();
        if !result.weights.is_empty() {
            result.status = PortfolioStatus::Complete;
        }
        result
    }

    fn agent(behavior: Behavior) -> ExplanationAgent {
        ExplanationAgent::new(
            Arc::new(MockProvider(behavior)),
            GenerationOptions::for_model("mock-model"),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_live_explanation() {
        let explanation = agent(Behavior::Reply("  AAA is calm.  "))
            .explain(&result_with(&[("AAA", 1.0)]), RiskLevel::Low)
            .await;

        assert_eq!(explanation.text, "AAA is calm.");
        assert_eq!(explanation.source, ExplanationSource::Live { model: "mock-model".into() });
    }

    #[tokio::test]
    async fn test_offline_fallback_lists_weights() {
        let explanation = ExplanationAgent::offline()
            .explain(&result_with(&[("BBB", 0.25), ("AAA", 0.75)]), RiskLevel::High)
            .await;

        assert!(explanation.is_fallback());
        assert!(explanation.text.starts_with("Selected tickers: AAA (75.0%), BBB (25.0%)."));
        assert!(explanation.text.contains("high risk preference"));
    }

    #[tokio::test]
    async fn test_fallback_on_error_timeout_and_empty_reply() {
        let result = result_with(&[("AAA", 1.0)]);

        for behavior in [Behavior::Fail, Behavior::Hang, Behavior::Reply("   ")] {
            let explanation = agent(behavior).explain(&result, RiskLevel::Moderate).await;
            assert!(explanation.is_fallback());
            assert!(explanation.text.contains("AAA (100.0%)"));
        }
    }

    #[tokio::test]
    async fn test_fallback_reason_omits_provider_detail() {
        let result = result_with(&[("AAA", 1.0)]);

        let explanation = agent(Behavior::Unreachable).explain(&result, RiskLevel::Moderate).await;
        assert_eq!(
            explanation.source,
            ExplanationSource::Fallback { reason: "provider unavailable".into() }
        );
        assert!(!explanation.text.contains("SECRETKEY123"));

        let explanation = agent(Behavior::Fail).explain(&result, RiskLevel::Moderate).await;
        assert_eq!(
            explanation.source,
            ExplanationSource::Fallback { reason: "provider rate limited".into() }
        );
    }

    #[tokio::test]
    async fn test_empty_portfolio_skips_provider() {
        // the mock asserts on prompt content, so reaching it would panic
        let explanation = agent(Behavior::Reply("unused")).explain(&result_with(&[]), RiskLevel::Low).await;

        assert_eq!(explanation.text, EMPTY_PORTFOLIO_TEXT);
        assert!(explanation.is_fallback());
    }
}
