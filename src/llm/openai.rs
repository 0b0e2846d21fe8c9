//! OpenAI-compatible HTTP provider.
//!
//! Works against any endpoint speaking the `/v1/chat/completions` and
//! `/v1/embeddings` wire format (Ollama, LM Studio, vLLM, the hosted
//! OpenAI API with an api key).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ModelProvider;
use super::types::{ChatMessage, ModelTurn, ToolCall, ToolSpec};
use crate::core::config::ProviderConfig;
use crate::core::errors::AppError;

#[derive(Clone)]
pub struct OpenAiCompatProvider {
    config: ProviderConfig,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(AppError::provider)?;

        Ok(Self {
            config: ProviderConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        })
    }

    fn request(&self, url: &str, body: &Value) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(url).json(body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        builder
    }

    fn wire_message(message: &ChatMessage) -> Value {
        let mut wire = json!({
            "role": message.role,
            "content": message.content,
        });

        if let Some(calls) = &message.tool_calls {
            wire["tool_calls"] = Value::Array(
                calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            },
                        })
                    })
                    .collect(),
            );
        }
        if let Some(call_id) = &message.tool_call_id {
            wire["tool_call_id"] = json!(call_id);
        }

        wire
    }

    fn wire_tool(spec: &ToolSpec) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": spec.name,
                "description": spec.description,
                "parameters": spec.parameters,
            },
        })
    }

    fn parse_tool_calls(raw: &[Value]) -> Vec<ToolCall> {
        raw.iter()
            .enumerate()
            .filter_map(|(i, call)| {
                let name = call["function"]["name"].as_str()?.to_string();
                let arguments = call["function"]["arguments"]
                    .as_str()
                    .and_then(|args| serde_json::from_str::<Value>(args).ok())
                    .unwrap_or_else(|| json!({}));
                let id = call["id"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{i}"));
                Some(ToolCall {
                    id,
                    name,
                    arguments,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ModelTurn, AppError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let wire_messages: Vec<Value> = messages.iter().map(Self::wire_message).collect();
        let mut body = json!({
            "model": self.config.model,
            "messages": wire_messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": false,
        });
        if let Some(specs) = tools {
            if !specs.is_empty() {
                body["tools"] = Value::Array(specs.iter().map(Self::wire_tool).collect());
                body["tool_choice"] = json!("auto");
            }
        }

        let res = self
            .request(&url, &body)
            .send()
            .await
            .map_err(AppError::provider)?;
        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!("chat error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(AppError::provider)?;
        let message = &payload["choices"][0]["message"];

        if let Some(raw_calls) = message["tool_calls"].as_array() {
            let calls = Self::parse_tool_calls(raw_calls);
            if !calls.is_empty() {
                return Ok(ModelTurn::ToolUse(calls));
            }
        }

        let content = message["content"].as_str().unwrap_or_default().to_string();
        Ok(ModelTurn::Answer(content))
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let url = format!("{}/v1/embeddings", self.config.base_url);

        let body = json!({
            "model": self.config.embedding_model,
            "input": inputs,
        });

        let res = self
            .request(&url, &body)
            .send()
            .await
            .map_err(AppError::provider)?;
        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!("embed error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(AppError::provider)?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(values) = item["embedding"].as_array() {
                    let vector: Vec<f32> = values
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vector);
                }
            }
        }

        Ok(embeddings)
    }
}
