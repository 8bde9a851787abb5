//! How agents make up their minds.
//!
//! `HttpDecisionMaker` asks a messages-style language model endpoint;
//! `Deliberator` wraps any [`DecisionMaker`] and falls back to a uniform
//! random option whenever the backend is missing, fails or answers with
//! something that doesn't name an option.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use agentdao_common::ports::{DecisionError, DecisionMaker};
use agentdao_governance::{Agent, VoteChoice};

use crate::config::DecisionConfig;

pub const VOTE_OPTIONS: [&str; 2] = ["Vote FOR this proposal", "Vote AGAINST this proposal"];

pub fn build_prompt(name: &str, personality: &str, context: &str, options: &[String]) -> String {
    let numbered = options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}. {}", i + 1, opt))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are {}, an AI agent in a DAO with the following personality: {}\n\n\
         Context: {}\n\n\
         Available options:\n{}\n\n\
         Based on your personality and the context, choose ONE option by responding with ONLY the number \
         (1, 2, 3, etc.) of your choice. Be decisive and stay true to your personality.",
        name, personality, context, numbered
    )
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Client for a messages-style completion endpoint.
pub struct HttpDecisionMaker {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl HttpDecisionMaker {
    pub fn new(endpoint: impl Into<String>, config: &DecisionConfig) -> Result<Self, DecisionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DecisionError::Unavailable(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// `None` when no endpoint is configured.
    pub fn from_config(config: &DecisionConfig) -> Result<Option<Self>, DecisionError> {
        match config.api_url.as_deref() {
            Some(url) => Self::new(url, config).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DecisionMaker for HttpDecisionMaker {
    async fn decide(&self, prompt: &str, _options: &[String]) -> Result<String, DecisionError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| DecisionError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DecisionError::Unavailable(format!("endpoint returned {}", resp.status())));
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| DecisionError::Malformed(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| DecisionError::Malformed("response carries no text block".to_string()))
    }
}

/// Leading option number of `answer`, if it names one of `count` options.
fn parse_choice(answer: &str, count: usize) -> Option<usize> {
    let digits: String = answer.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    let n: usize = digits.parse().ok()?;
    (1..=count).contains(&n).then_some(n)
}

pub struct Deliberator {
    maker: Option<Arc<dyn DecisionMaker>>,
}

impl Deliberator {
    pub fn new(maker: Arc<dyn DecisionMaker>) -> Self {
        Self { maker: Some(maker) }
    }

    /// Every decision is a random pick.
    pub fn offline() -> Self {
        Self { maker: None }
    }

    pub fn is_online(&self) -> bool {
        self.maker.is_some()
    }

    /// 1-based number of the option `agent` settles on, `None` for an empty list.
    pub async fn choose(&self, agent: &Agent, context: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }

        if let Some(maker) = &self.maker {
            let prompt = build_prompt(agent.name(), agent.personality(), context, options);
            match maker.decide(&prompt, options).await {
                Ok(answer) => match parse_choice(&answer, options.len()) {
                    Some(n) => {
                        debug!("🧠 {} chose option {}", agent.name(), n);
                        return Some(n);
                    }
                    None => warn!("⚠️ {} gave an unusable answer {:?}, picking at random", agent.name(), answer),
                },
                Err(e) => warn!("⚠️ Decision backend failed for {}: {}, picking at random", agent.name(), e),
            }
        }

        Some(rand::thread_rng().gen_range(1..=options.len()))
    }

    pub async fn choose_vote(&self, agent: &Agent, context: &str) -> VoteChoice {
        let options: Vec<String> = VOTE_OPTIONS.iter().map(|s| s.to_string()).collect();
        match self.choose(agent, context, &options).await {
            Some(1) => VoteChoice::For,
            _ => VoteChoice::Against,
        }
    }
}
