#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use aiterm_core::Message;
use aiterm_core::Role;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde::Deserialize;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChunkSink;
use crate::domain::models::ModelClient;
use crate::domain::models::ModelName;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: String,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Deserialize, Debug, Default)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    #[serde(default)]
    delta: CompletionDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CompletionChunk {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    data: Vec<serde_json::Value>,
}

fn to_chat_messages(conversation: &[Message], input: &str) -> Vec<ChatMessage> {
    let mut messages = conversation
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::Human => "user",
                Role::Ai => "assistant",
            };
            return ChatMessage {
                role,
                content: message.content.to_string(),
            };
        })
        .collect::<Vec<ChatMessage>>();

    messages.push(ChatMessage {
        role: "user",
        content: input.to_string(),
    });

    return messages;
}

/// Client for servers speaking the OpenAI chat completions API, which
/// includes most self hosted model servers.
pub struct OpenAI {
    url: String,
    api_key: String,
    model: String,
    timeout: String,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

const DEFAULT_TEMPERATURE: f64 = 0.5;
const DEFAULT_TOP_P: f64 = 0.5;
const DEFAULT_MAX_TOKENS: u32 = 1024;
const CONTINUE_PROMPT: &str = "Continue exactly where you stopped.";

impl Default for OpenAI {
    fn default() -> OpenAI {
        // Values were range checked when the config was loaded.
        return OpenAI::new(
            &Config::get(ConfigKey::ApiBase),
            &Config::get(ConfigKey::ApiKey),
            &Config::get(ConfigKey::Model),
        )
        .with_sampling(
            Config::get(ConfigKey::Temperature)
                .parse()
                .unwrap_or(DEFAULT_TEMPERATURE),
            Config::get(ConfigKey::TopP).parse().unwrap_or(DEFAULT_TOP_P),
            Config::get(ConfigKey::MaxTokens)
                .parse()
                .unwrap_or(DEFAULT_MAX_TOKENS),
        );
    }
}

impl OpenAI {
    pub fn new(url: &str, api_key: &str, model: &str) -> OpenAI {
        return OpenAI {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout: "5000".to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
        };
    }

    pub fn with_sampling(mut self, temperature: f64, top_p: f64, max_tokens: u32) -> OpenAI {
        self.temperature = temperature;
        self.top_p = top_p;
        self.max_tokens = max_tokens;
        return self;
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            return req;
        }
        return req.bearer_auth(&self.api_key);
    }
}

#[async_trait]
impl ModelClient for OpenAI {
    fn name(&self) -> ModelName {
        return ModelName::OpenAI;
    }

    fn model(&self) -> String {
        return self.model.to_string();
    }

    async fn health_check(&self) -> Result<String> {
        if self.url.is_empty() {
            bail!("API base URL is not defined");
        }

        let res = self
            .with_auth(reqwest::Client::new().get(format!("{}/models", self.url)))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, url = %self.url, "model endpoint is not reachable");
                bail!("{} is not reachable", self.url);
            }
        };

        let status = res.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "model endpoint health check failed");
            bail!("{} answered {}", self.url, status);
        }

        if let Ok(list) = res.json::<ModelList>().await {
            return Ok(format!(
                "{} is reachable, {} models available",
                self.url,
                list.data.len()
            ));
        }

        return Ok(format!("{} is reachable", self.url));
    }

    async fn stream_chat(
        &self,
        conversation: &[Message],
        input: &str,
        sink: &mut ChunkSink,
    ) -> Result<()> {
        let mut messages = to_chat_messages(conversation, input);

        loop {
            let (reply, truncated) = self.stream_once(&messages, sink).await?;
            if !truncated {
                break;
            }

            let question = format!(
                "The reply hit the {} token limit. Ask {} to continue?",
                self.max_tokens, self.model
            );
            if !sink.confirm(&question).await? {
                break;
            }

            tracing::debug!(model = %self.model, "continuing a truncated reply");
            messages.push(ChatMessage {
                role: "assistant",
                content: reply,
            });
            messages.push(ChatMessage {
                role: "user",
                content: CONTINUE_PROMPT.to_string(),
            });
        }

        sink.finish().await?;
        return Ok(());
    }
}

impl OpenAI {
    /// Streams one completion into the sink. Returns the text received and
    /// whether the server cut it off at `max_tokens`.
    async fn stream_once(
        &self,
        messages: &[ChatMessage],
        sink: &mut ChunkSink,
    ) -> Result<(String, bool)> {
        let req = CompletionRequest {
            model: self.model.to_string(),
            messages,
            stream: true,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        };

        let res = self
            .with_auth(reqwest::Client::new().post(format!("{}/chat/completions", self.url)))
            .header("Accept", "text/event-stream")
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "chat completion failed");
            bail!("{} responded with {}: {}", self.model, status, body.trim());
        }

        fn convert_err(err: reqwest::Error) -> std::io::Error {
            let err_msg = err.to_string();
            return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();
        let mut reply = String::new();
        let mut truncated = false;

        while let Some(line) = lines_reader.next_line().await? {
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                break;
            }

            let chunk = serde_json::from_str::<CompletionChunk>(data)?;
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content {
                    if !content.is_empty() {
                        sink.push(&content).await?;
                        reply.push_str(&content);
                    }
                }
                if choice.finish_reason.as_deref() == Some("length") {
                    truncated = true;
                }
            }
        }

        return Ok((reply, truncated));
    }
}
