//! Gemini `generateContent` client with optional Google Search grounding

use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use serde_json::{json, Value};

use crate::chat::{ChatDelta, ChatReply, ChatTransport, DeltaStream};
use crate::error::ChatError;
use crate::models::GroundingSource;
use crate::prompts::SYSTEM_INSTRUCTION;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Title used when a grounding chunk has none
const UNTITLED_SOURCE: &str = "Source";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub search_grounding: bool,
}

pub struct GeminiClient {
    settings: GeminiSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    fn api_key(&self) -> Result<&str, ChatError> {
        self.settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ChatError::NotConfigured("No Gemini API key. Set GEMINI_API_KEY.".to_string())
            })
    }

    async fn post(&self, url: String, prompt: &str) -> Result<reqwest::Response, ChatError> {
        let api_key = self.api_key()?;
        let body = request_body(prompt, self.settings.search_grounding);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("[gemini] API error: {} - {}", status, body);
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl ChatTransport for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<ChatReply, ChatError> {
        let url = format!("{}/{}:generateContent", API_BASE, self.settings.model);
        info!("[gemini] generateContent with {}", self.settings.model);

        let response = self.post(url, prompt).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(format!("Failed to read response: {}", e)))?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ChatError::Decode(format!("Failed to parse response: {}", e)))?;

        let reply = ChatReply {
            text: candidate_text(&json),
            sources: grounding_sources(&json),
        };
        debug!(
            "[gemini] Reply: {} chars, {} sources",
            reply.text.len(),
            reply.sources.len()
        );
        Ok(reply)
    }

    async fn stream(&self, prompt: &str) -> Result<DeltaStream, ChatError> {
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse",
            API_BASE, self.settings.model
        );
        info!("[gemini] streamGenerateContent with {}", self.settings.model);

        let response = self.post(url, prompt).await?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ChatError::Transport(format!("Stream error: {}", e)))
            })
            .boxed();
        Ok(decode_sse(chunks))
    }
}

fn request_body(prompt: &str, search_grounding: bool) -> Value {
    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
    });
    if search_grounding {
        body["tools"] = json!([{ "google_search": {} }]);
    }
    body
}

/// Concatenated text parts of the first candidate.
fn candidate_text(json: &Value) -> String {
    json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Web citations of the first candidate, deduplicated in order.
fn grounding_sources(json: &Value) -> Vec<GroundingSource> {
    let mut sources: Vec<GroundingSource> = Vec::new();
    let Some(chunks) = json["candidates"][0]["groundingMetadata"]["groundingChunks"].as_array()
    else {
        return sources;
    };
    for chunk in chunks {
        let Some(uri) = chunk["web"]["uri"].as_str() else {
            continue;
        };
        let title = chunk["web"]["title"]
            .as_str()
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED_SOURCE);
        let source = GroundingSource {
            title: title.to_string(),
            uri: uri.to_string(),
        };
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

/// Line splitter for `text/event-stream` bodies. Bytes are buffered until a full line
/// is available so multi-byte characters split across chunks survive.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<Result<ChatDelta, ChatError>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Handles a trailing line without a newline.
    fn flush(&mut self) -> Option<Result<ChatDelta, ChatError>> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest)
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<Result<ChatDelta, ChatError>> {
        if self.finished {
            return None;
        }
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        let data = line.strip_prefix("data:")?.trim_start();
        if data == "[DONE]" {
            self.finished = true;
            return None;
        }

        let json_value = match serde_json::from_str::<Value>(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("[gemini] Skipping unreadable event: {}", e);
                return None;
            }
        };
        if let Some(message) = json_value["error"]["message"].as_str() {
            return Some(Err(ChatError::Api {
                status: json_value["error"]["code"].as_u64().unwrap_or(0) as u16,
                body: message.to_string(),
            }));
        }

        let delta = ChatDelta {
            text: candidate_text(&json_value),
            sources: grounding_sources(&json_value),
        };
        if delta.text.is_empty() && delta.sources.is_empty() {
            return None;
        }
        Some(Ok(delta))
    }
}

struct DecodeState {
    chunks: BoxStream<'static, Result<Vec<u8>, ChatError>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<ChatDelta, ChatError>>,
    done: bool,
}

/// Turns raw body chunks into deltas. A transport error ends the stream after being
/// yielded.
fn decode_sse(chunks: BoxStream<'static, Result<Vec<u8>, ChatError>>) -> DeltaStream {
    let state = DecodeState {
        chunks,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.done = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.pending.extend(events);
                    if state.decoder.finished {
                        state.done = true;
                    }
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(e));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.decoder.flush());
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
        )
    }

    async fn collect(chunks: Vec<Result<Vec<u8>, ChatError>>) -> Vec<Result<ChatDelta, ChatError>> {
        decode_sse(stream::iter(chunks).boxed()).collect().await
    }

    #[test]
    fn request_body_includes_search_tool_only_when_enabled() {
        let body = request_body("hi", true);
        assert_eq!(body["tools"][0]["google_search"], json!({}));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Nexlyn"));
        assert!(request_body("hi", false).get("tools").is_none());
    }

    #[test]
    fn reply_parsing_joins_parts_and_dedupes_sources() {
        let json = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "RouterOS " }, { "text": "v7" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://help.mikrotik.com", "title": "Docs" } },
                    { "web": { "uri": "https://help.mikrotik.com", "title": "Docs" } },
                    { "web": { "uri": "https://mikrotik.com/product" } },
                    { "retrievedContext": {} }
                ]}
            }]
        });
        assert_eq!(candidate_text(&json), "RouterOS v7");
        assert_eq!(
            grounding_sources(&json),
            vec![
                GroundingSource {
                    title: "Docs".into(),
                    uri: "https://help.mikrotik.com".into()
                },
                GroundingSource {
                    title: UNTITLED_SOURCE.into(),
                    uri: "https://mikrotik.com/product".into()
                },
            ]
        );
        assert_eq!(candidate_text(&json!({})), "");
    }

    #[tokio::test]
    async fn events_split_across_chunks_are_reassembled() {
        let body = format!("{}{}", event("Wi-Fi "), event("6 → ax³"));
        let bytes = body.into_bytes();
        // Split inside the multi-byte arrow.
        let cut = bytes.iter().position(|b| *b == 0xe2).unwrap() + 1;
        let chunks = vec![Ok(bytes[..cut].to_vec()), Ok(bytes[cut..].to_vec())];

        let deltas: Vec<String> = collect(chunks)
            .await
            .into_iter()
            .map(|d| d.unwrap().text)
            .collect();
        assert_eq!(deltas, vec!["Wi-Fi ", "6 → ax³"]);
    }

    #[tokio::test]
    async fn trailing_event_without_newline_is_flushed() {
        let body = event("tail");
        let trimmed = body.trim_end().to_string();
        let deltas = collect(vec![Ok(trimmed.into_bytes())]).await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().text, "tail");
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let chunks = vec![
            Ok(event("one").into_bytes()),
            Err(ChatError::Transport("reset".into())),
            Ok(event("two").into_bytes()),
        ];
        let items = collect(chunks).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "one");
        assert_eq!(items[1], Err(ChatError::Transport("reset".into())));
    }

    #[tokio::test]
    async fn error_events_and_garbage_lines() {
        let body = format!(
            ": keep-alive\n\ndata: not json\n\n{}data: {}\n\n",
            event("ok"),
            json!({ "error": { "code": 429, "message": "quota" } })
        );
        let items = collect(vec![Ok(body.into_bytes())]).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "ok");
        assert_eq!(
            items[1],
            Err(ChatError::Api {
                status: 429,
                body: "quota".into()
            })
        );
    }

    #[tokio::test]
    async fn done_marker_stops_decoding() {
        let body = format!("{}data: [DONE]\n\n{}", event("a"), event("b"));
        let items = collect(vec![Ok(body.into_bytes())]).await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = GeminiClient::new(GeminiSettings {
            api_key: None,
            model: "gemini-3-flash-preview".into(),
            search_grounding: true,
        });
        assert!(!client.is_configured());
        assert!(matches!(
            client.generate("hi").await,
            Err(ChatError::NotConfigured(_))
        ));
    }
}
