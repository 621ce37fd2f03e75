//! # ReviewProbe
//!
//! **ReviewProbe** is a controlled-experiment harness that measures whether adversarial
//! text injected into research-paper content can bias a Large Language Model (LLM)
//! reviewer's evaluation scores, and whether a defensive system prompt mitigates that bias.
//!
//! It drives a chat-completion API across a matrix of
//! (paper × attack × injection position × mitigation) conditions, extracts numeric
//! soundness/novelty scores from the free-form responses, and collects one result row
//! per condition for reporting.
//!
//! ## Core Architecture
//!
//! The library is built around five main parts:
//!
//! 1.  **[inject](crate::inject)**: Pure payload injection; splices an adversarial fragment into paper text at a named [Position](crate::inject::Position).
//! 2.  **[score](crate::score)**: The [ScoreParser](crate::score::ScoreParser); pulls soundness and novelty scores out of unstructured response text.
//! 3.  **[limiter](crate::limiter)**: The per-model [RateLimiter](crate::limiter::RateLimiter); serializes admission so no two calls to the same model start closer together than its configured delay.
//! 4.  **[client](crate::client)**: The [ModelClient](crate::client::ModelClient) trait and its OpenAI-compatible implementation; every external failure is converted into a result record, never an error.
//! 5.  **[runner](crate::runner)**: The async engine that fans the full condition matrix out onto a bounded concurrent pool and collects results in completion order.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use reviewprobe::client::{ModelClient, OpenAiClient};
//! use reviewprobe::limiter::RateLimiter;
//! use reviewprobe::runner::Runner;
//! use reviewprobe::ProviderConfig;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!
//!     // 1. One provider config per model under test
//!     let providers = vec![ProviderConfig::new(
//!         "openai",
//!         "gpt-4o-mini",
//!         Duration::from_secs(6),
//!         colored::Color::Blue,
//!     )];
//!
//!     // 2. One client per provider, one rate-limit gate per model
//!     let clients: Vec<Arc<dyn ModelClient>> = vec![Arc::new(OpenAiClient::new(
//!         api_key,
//!         "gpt-4o-mini".to_string(),
//!     ))];
//!     let limiter = Arc::new(RateLimiter::new(&providers));
//!
//!     // 3. The paper corpus: name -> full text
//!     let mut papers = BTreeMap::new();
//!     papers.insert("sample_paper.txt".to_string(), "Abstract.\n\nBody.".to_string());
//!
//!     // 4. Run the full condition matrix with 8 concurrent workers
//!     let runner = Runner::new(8);
//!     let results = runner.run(&papers, &providers, &clients, limiter).await?;
//!
//!     println!("Collected {} result rows.", results.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod condition;
pub mod corpus;
pub mod inject;
pub mod limiter;
pub mod report;
pub mod runner;
pub mod score;

use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A convenient type alias for `anyhow::Result`.
pub type ProbeResult<T> = anyhow::Result<T>;

/// Identifies one callable model under test.
///
/// Immutable, defined at startup, one instance per distinct model. The call
/// behavior lives in a [ModelClient](crate::client::ModelClient) implementation
/// selected by provider id; this struct is data only.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider id (e.g., "openai").
    pub provider: String,

    /// Model name as sent to the API (e.g., "gpt-4o-mini").
    pub model: String,

    /// Minimum interval between call starts for this model.
    pub rate_limit_delay: Duration,

    /// Console color for this model's log lines.
    pub color: Color,
}

impl ProviderConfig {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        rate_limit_delay: Duration,
        color: Color,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            rate_limit_delay,
            color,
        }
    }

    /// Model name wrapped in this provider's console color.
    pub fn colored_model(&self) -> String {
        self.model.as_str().color(self.color).to_string()
    }
}

/// One row of the experiment: the outcome of a single
/// (paper, provider, condition) unit of work.
///
/// Created once per completed unit and immutable afterwards. The collection of
/// these rows is unordered; the reporter must not assume completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Experimental phase label (`1_baseline`, `2_attack`, `3_defense`).
    pub phase: String,

    /// Provider id of the model that produced this row.
    pub provider: String,

    /// Model name.
    pub model: String,

    /// Paper identifier (file name).
    pub paper: String,

    /// Length of the original paper content in bytes, before injection.
    pub paper_length: usize,

    /// Attack payload name, or `none` for the baseline.
    pub attack_type: String,

    /// Injection position name, or `none` for the baseline.
    pub payload_position: String,

    /// Whether the defensive system prompt was attached.
    pub mitigation: bool,

    /// Parsed soundness score, absent when the response carried none.
    pub soundness_score: Option<u8>,

    /// Parsed novelty score, absent when the response carried none.
    pub novelty_score: Option<u8>,

    /// Raw response text, or a textual record of a block/error.
    pub response: String,
}
