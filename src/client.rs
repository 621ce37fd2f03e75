//! The boundary with the remote text-generation API.
//!
//! [ModelClient] is the only abstraction that touches the network. The
//! [review] adapter on top of it upholds the harness's central contract:
//! a unit of work always completes with a record. Blocked responses and
//! transport errors become data, never errors that could abort sibling work.

use crate::condition::DEFENSE_PROMPT;
use crate::score::{ParsedScores, ScoreParser};
use crate::ProbeResult;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, FinishReason,
    },
    Client,
};
use async_trait::async_trait;

/// What the remote API handed back for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// Generated text.
    Text(String),
    /// The API declined to answer; carries the reason.
    Blocked(String),
}

/// A remote text-generation model. One implementation per provider, selected
/// by provider id at startup.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends a prompt, with an optional system instruction, and returns the
    /// reply. Transport and API-level failures surface as `Err`; a content
    /// block is a successful call with a [ModelReply::Blocked] reply.
    async fn complete(&self, prompt: &str, system: Option<&str>) -> ProbeResult<ModelReply>;
}

/// [ModelClient] for OpenAI-compatible chat-completion endpoints.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client, model }
    }

    /// Creates a client with a custom API base URL.
    ///
    /// This is primarily used for testing (mocking) or pointing to non-OpenAI
    /// endpoints.
    pub fn new_with_base_url(api_key: String, model: String, base_url: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let client = Client::with_config(config);
        Self { client, model }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> ProbeResult<ModelReply> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        if let Some(instruction) = system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(instruction)
                    .build()?,
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?,
        ));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Ok(ModelReply::Blocked("no candidates returned".to_string()));
        };
        if choice.finish_reason == Some(FinishReason::ContentFilter) {
            return Ok(ModelReply::Blocked("content filter".to_string()));
        }

        Ok(ModelReply::Text(choice.message.content.unwrap_or_default()))
    }
}

/// The outcome of one reviewed call: always a record, never an error.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub response: String,
    pub scores: ParsedScores,
}

/// Issues one review call and converts every failure mode into data.
///
/// With `mitigation` on, the fixed defensive system instruction is attached.
/// A blocked response or a transport error yields a textual record with both
/// scores absent; any single condition failing (quota, timeout, content
/// filter) must not abort the batch.
pub async fn review(
    client: &dyn ModelClient,
    parser: &ScoreParser,
    prompt: &str,
    mitigation: bool,
) -> ReviewOutcome {
    let system = mitigation.then_some(DEFENSE_PROMPT);
    match client.complete(prompt, system).await {
        Ok(ModelReply::Text(response)) => {
            let scores = parser.parse(&response);
            ReviewOutcome { response, scores }
        }
        Ok(ModelReply::Blocked(reason)) => ReviewOutcome {
            response: format!("Response blocked. Reason: {reason}"),
            scores: ParsedScores::default(),
        },
        Err(e) => ReviewOutcome {
            response: format!("Error: {e}"),
            scores: ParsedScores::default(),
        },
    }
}
