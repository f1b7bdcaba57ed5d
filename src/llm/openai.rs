//! OpenAI-compatible Chat Completions provider.
//!
//! Works against any server exposing `/chat/completions` with function
//! tools. Streaming responses are read as server-sent events: text deltas
//! are yielded as they arrive, tool-call argument fragments are collected
//! and the assembled call is emitted with the final increment.

use std::collections::BTreeMap;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Map, Value};

use super::{DeltaStream, FunctionCall, Provider, ProviderRequest, ResponseDelta, Turn};
use crate::config::AgntConfig;
use crate::AgntError;

pub struct OpenAiProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    stream: bool,
}

impl OpenAiProvider {
    pub fn new(config: &AgntConfig) -> Result<Self, AgntError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            stream: config.stream,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }

    async fn post(&self, payload: &Value) -> Result<reqwest::Response, AgntError> {
        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers())
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgntError::Transport(format!(
                "provider returned {}: {}",
                status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream(&self, request: ProviderRequest) -> Result<DeltaStream, AgntError> {
        let payload = build_payload(&request, self.stream);
        tracing::debug!(
            model = %request.model,
            turns = request.turns.len(),
            stream = self.stream,
            "Sending completion request"
        );
        let response = self.post(&payload).await?;

        if !self.stream {
            let body: Value = response.json().await?;
            let delta = parse_completion(&body);
            return Ok(futures::stream::once(async move { Ok::<_, AgntError>(delta) }).boxed());
        }

        let stream = stream! {
            let mut bytes = response.bytes_stream();
            let mut parser = SseParser::default();
            let mut calls = ToolCallAssembler::default();
            let mut finished = false;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AgntError::from(e));
                        return;
                    }
                };
                for data in parser.push(&chunk) {
                    if data == "[DONE]" {
                        finished = true;
                        break;
                    }
                    let text = match serde_json::from_str::<Value>(&data) {
                        Ok(event) => apply_chunk(&event, &mut calls),
                        Err(e) => {
                            tracing::warn!("Skipping malformed stream event: {}", e);
                            continue;
                        }
                    };
                    if !text.is_empty() {
                        yield Ok(ResponseDelta::text(text));
                    }
                }
                if finished {
                    break;
                }
            }

            yield Ok(ResponseDelta {
                text: String::new(),
                function_call: calls.finish(),
                done: true,
            });
        };
        Ok(Box::pin(stream))
    }
}

/// Request body for `/chat/completions`.
pub fn build_payload(request: &ProviderRequest, stream: bool) -> Value {
    let mut payload = json!({
        "model": request.model,
        "messages": build_messages(request),
        "max_tokens": request.max_tokens,
        "stream": stream,
    });
    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        payload["tools"] = Value::Array(tools);
        payload["parallel_tool_calls"] = Value::Bool(false);
    }
    payload
}

fn build_messages(request: &ProviderRequest) -> Vec<Value> {
    let mut messages = Vec::with_capacity(request.turns.len() + 1);
    if let Some(system) = request.system_prompt.as_deref().filter(|s| !s.is_empty()) {
        messages.push(json!({ "role": "system", "content": system }));
    }
    for turn in &request.turns {
        messages.push(match turn {
            Turn::User { text } => json!({ "role": "user", "content": text }),
            Turn::Assistant { text } => json!({ "role": "assistant", "content": text }),
            Turn::FunctionCall {
                call_id,
                name,
                arguments,
            } => json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": [{
                    "id": call_id,
                    "type": "function",
                    "function": {
                        "name": name,
                        "arguments": Value::Object(arguments.clone()).to_string(),
                    }
                }]
            }),
            Turn::FunctionResult {
                call_id,
                content,
                is_error,
                ..
            } => {
                let content = if *is_error {
                    format!("error: {}", content)
                } else {
                    content.clone()
                };
                json!({ "role": "tool", "tool_call_id": call_id, "content": content })
            }
        });
    }
    messages
}

/// Parse a non-streamed completion body into a single final increment.
fn parse_completion(body: &Value) -> ResponseDelta {
    let message = &body["choices"][0]["message"];
    let text = message["content"].as_str().unwrap_or_default().to_string();
    let function_call = message["tool_calls"]
        .as_array()
        .and_then(|calls| calls.first())
        .and_then(|call| {
            let name = call["function"]["name"].as_str()?;
            let arguments = call["function"]["arguments"].as_str().unwrap_or_default();
            Some(FunctionCall {
                name: name.to_string(),
                arguments: parse_arguments(name, arguments),
            })
        });
    ResponseDelta {
        text,
        function_call,
        done: true,
    }
}

fn parse_arguments(name: &str, raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("Arguments for {} are not an object: {}", name, other);
            Map::new()
        }
        Err(e) => {
            tracing::warn!("Unparseable arguments for {}: {}", name, e);
            Map::new()
        }
    }
}

/// Splits a byte stream into SSE `data:` payloads.
///
/// Bytes are buffered until a full line arrives, so multi-byte characters
/// split across chunks decode intact.
#[derive(Debug, Default)]
struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Feed a chunk and return every complete `data:` payload it finished.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    tracing::warn!("Skipping stream line with invalid UTF-8: {}", e);
                    continue;
                }
            };
            if let Some(data) = line.strip_prefix("data:") {
                out.push(data.trim().to_string());
            }
        }
        out
    }
}

#[derive(Debug, Default)]
struct PartialCall {
    name: String,
    arguments: String,
}

/// Collects streamed `tool_calls` fragments keyed by their index.
#[derive(Debug, Default)]
struct ToolCallAssembler {
    calls: BTreeMap<u64, PartialCall>,
}

impl ToolCallAssembler {
    fn push(&mut self, fragment: &Value) {
        let index = fragment["index"].as_u64().unwrap_or(0);
        let call = self.calls.entry(index).or_default();
        if let Some(name) = fragment["function"]["name"].as_str() {
            call.name.push_str(name);
        }
        if let Some(arguments) = fragment["function"]["arguments"].as_str() {
            call.arguments.push_str(arguments);
        }
    }

    /// The first assembled call. Additional parallel calls are dropped.
    fn finish(self) -> Option<FunctionCall> {
        if self.calls.len() > 1 {
            tracing::warn!(
                "Model issued {} tool calls in one response; only the first is used",
                self.calls.len()
            );
        }
        let (_, call) = self.calls.into_iter().find(|(_, c)| !c.name.is_empty())?;
        Some(FunctionCall {
            arguments: parse_arguments(&call.name, &call.arguments),
            name: call.name,
        })
    }
}

/// Apply one stream event, returning its text delta.
fn apply_chunk(event: &Value, calls: &mut ToolCallAssembler) -> String {
    let delta = &event["choices"][0]["delta"];
    if let Some(fragments) = delta["tool_calls"].as_array() {
        for fragment in fragments {
            calls.push(fragment);
        }
    }
    delta["content"].as_str().unwrap_or_default().to_string()
}
