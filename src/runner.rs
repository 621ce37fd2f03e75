//! The async engine that executes the full experiment matrix.
//!
//! Every (paper × provider × condition) triple becomes an independent unit of
//! work on a bounded concurrent pool. Units share no mutable state except the
//! per-model rate-limit gates; completion order is arbitrary and nothing
//! downstream may depend on it.

use crate::client::{review, ModelClient};
use crate::condition::{all_conditions, build_prompt, Condition};
use crate::inject::inject;
use crate::limiter::{ModelGate, RateLimiter};
use crate::score::ScoreParser;
use crate::{ExperimentResult, ProbeResult, ProviderConfig};
use colored::*;
use futures::{stream, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Runner {
    concurrency: usize,
}

impl Runner {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    /// Runs the full condition matrix over `papers` and the provider/client
    /// pairs, collecting one [ExperimentResult] per completed unit of work.
    ///
    /// An empty corpus ends the run early with a warning and no results; a
    /// unit of work that fails unexpectedly is logged and skipped without
    /// aborting its siblings.
    pub async fn run(
        &self,
        papers: &BTreeMap<String, String>,
        providers: &[ProviderConfig],
        clients: &[Arc<dyn ModelClient>],
        limiter: Arc<RateLimiter>,
    ) -> ProbeResult<Vec<ExperimentResult>> {
        if papers.is_empty() {
            eprintln!("{}", "No papers to test. Exiting.".yellow());
            return Ok(Vec::new());
        }

        let conditions = all_conditions();
        let parser = Arc::new(ScoreParser::new());

        let mut units = Vec::new();
        for (paper_name, paper_content) in papers {
            for (provider, client) in providers.iter().zip(clients) {
                let Some(gate) = limiter.gate(&provider.model) else {
                    eprintln!(
                        "No rate-limit gate configured for model '{}'; skipping its units.",
                        provider.model
                    );
                    continue;
                };
                for condition in &conditions {
                    units.push((
                        paper_name.clone(),
                        paper_content.clone(),
                        provider.clone(),
                        Arc::clone(client),
                        Arc::clone(&gate),
                        Arc::clone(&parser),
                        *condition,
                    ));
                }
            }
        }

        println!(
            "Dispatching {} units ({} papers x {} providers x {} conditions) with concurrency: {}",
            units.len(),
            papers.len(),
            providers.len(),
            conditions.len(),
            self.concurrency
        );

        let results = stream::iter(units)
            .map(
                |(paper_name, paper_content, provider, client, gate, parser, condition)| async move {
                    let unit = tokio::spawn(execute(
                        paper_name,
                        paper_content,
                        provider,
                        client,
                        gate,
                        parser,
                        condition,
                    ));
                    match unit.await {
                        Ok(result) => Some(result),
                        Err(e) => {
                            eprintln!("An experiment failed to complete: {e}");
                            None
                        }
                    }
                },
            )
            .buffer_unordered(self.concurrency) // Run N units in parallel
            .filter_map(|x| async { x }) // Drop logged-and-skipped units
            .collect::<Vec<_>>()
            .await;

        println!("{}", "All experiments have finished.".bold().white());
        Ok(results)
    }
}

/// One unit of work: inject, admit through the model's gate, call, parse.
/// Always produces a record; external failures were already converted to data
/// by the [review] adapter.
async fn execute(
    paper_name: String,
    paper_content: String,
    provider: ProviderConfig,
    client: Arc<dyn ModelClient>,
    gate: Arc<ModelGate>,
    parser: Arc<ScoreParser>,
    condition: Condition,
) -> ExperimentResult {
    let content = match (condition.attack, condition.position) {
        (Some(attack), Some(position)) => inject(&paper_content, attack.payload, position),
        _ => paper_content.clone(),
    };
    let prompt = build_prompt(&content);

    let outcome = {
        // The admission guard covers the log line, the wait, the timestamp
        // update, and the remote call itself.
        let _admission = gate.admit().await;
        println!(
            "Starting API call: Paper='{}', Model='{}', Attack='{}', Position='{}', Mitigation={}",
            paper_name,
            provider.colored_model(),
            condition.attack_name(),
            condition.position_name(),
            condition.mitigation
        );
        review(client.as_ref(), &parser, &prompt, condition.mitigation).await
    };

    ExperimentResult {
        phase: condition.phase.to_string(),
        provider: provider.provider,
        model: provider.model,
        paper: paper_name,
        paper_length: paper_content.len(),
        attack_type: condition.attack_name().to_string(),
        payload_position: condition.position_name().to_string(),
        mitigation: condition.mitigation,
        soundness_score: outcome.scores.soundness,
        novelty_score: outcome.scores.novelty,
        response: outcome.response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModelReply;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EchoScoresClient;

    #[async_trait]
    impl ModelClient for EchoScoresClient {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
        ) -> ProbeResult<ModelReply> {
            Ok(ModelReply::Text(
                "Soundness Score: 6\nNovelty Score: 7".to_string(),
            ))
        }
    }

    fn one_provider() -> Vec<ProviderConfig> {
        vec![ProviderConfig::new(
            "test",
            "mock-model",
            Duration::from_millis(0),
            Color::White,
        )]
    }

    #[tokio::test]
    async fn test_empty_corpus_aborts_early() {
        let runner = Runner::new(4);
        let papers = BTreeMap::new();
        let providers = one_provider();
        let clients: Vec<Arc<dyn ModelClient>> = vec![Arc::new(EchoScoresClient)];
        let limiter = Arc::new(RateLimiter::new(&providers));

        let results = runner
            .run(&papers, &providers, &clients, limiter)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_one_paper_one_provider_yields_thirteen_records() {
        let runner = Runner::new(4);
        let mut papers = BTreeMap::new();
        papers.insert(
            "p.txt".to_string(),
            "Intro.\n\nMethod.\n\nResults.".to_string(),
        );
        let providers = one_provider();
        let clients: Vec<Arc<dyn ModelClient>> = vec![Arc::new(EchoScoresClient)];
        let limiter = Arc::new(RateLimiter::new(&providers));

        let results = runner
            .run(&papers, &providers, &clients, limiter)
            .await
            .unwrap();
        assert_eq!(results.len(), 13);

        // Every (paper, provider, condition) combination is unique.
        let mut keys: Vec<_> = results
            .iter()
            .map(|r| {
                (
                    r.paper.clone(),
                    r.model.clone(),
                    r.phase.clone(),
                    r.attack_type.clone(),
                    r.payload_position.clone(),
                    r.mitigation,
                )
            })
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 13);
    }

    #[tokio::test]
    async fn test_records_carry_parsed_scores_and_paper_length() {
        let runner = Runner::new(2);
        let mut papers = BTreeMap::new();
        let body = "Intro.\n\nMethod.".to_string();
        papers.insert("p.txt".to_string(), body.clone());
        let providers = one_provider();
        let clients: Vec<Arc<dyn ModelClient>> = vec![Arc::new(EchoScoresClient)];
        let limiter = Arc::new(RateLimiter::new(&providers));

        let results = runner
            .run(&papers, &providers, &clients, limiter)
            .await
            .unwrap();
        for record in results {
            assert_eq!(record.soundness_score, Some(6));
            assert_eq!(record.novelty_score, Some(7));
            assert_eq!(record.paper_length, body.len());
        }
    }

    #[tokio::test]
    async fn test_unconfigured_model_is_skipped() {
        let runner = Runner::new(2);
        let mut papers = BTreeMap::new();
        papers.insert("p.txt".to_string(), "Body.".to_string());
        let providers = one_provider();
        let clients: Vec<Arc<dyn ModelClient>> = vec![Arc::new(EchoScoresClient)];
        // Limiter configured for a different model entirely.
        let other = vec![ProviderConfig::new(
            "test",
            "other-model",
            Duration::from_millis(0),
            Color::White,
        )];
        let limiter = Arc::new(RateLimiter::new(&other));

        let results = runner
            .run(&papers, &providers, &clients, limiter)
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
