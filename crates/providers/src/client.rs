use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use shared::agent_api::{ChatMessage as ApiChatMessage, StreamChunk};
use shared::message::ChatMessage;
use shared::settings::{ChatConfig, RequestShape};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::ndjson::{NdjsonParser, StreamLine};
use crate::reasoning::{strip_reasoning, ReasoningFilter};
use crate::wire::{self, ChatRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid endpoint URL '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unparsable response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server reported an error: {0}")]
    Stream(String),
    #[error("response did not contain any message content")]
    MissingContent,
}

/// Anything that can answer a chat turn.
///
/// `tx` receives visible text while a streamed answer is being consumed; the
/// returned string is the final answer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        input: &str,
        history: &[ChatMessage],
        tx: UnboundedSender<StreamChunk>,
    ) -> Result<String, ClientError>;
}

/// HTTP client for a single configured chat endpoint.
pub struct ChatClient {
    http: Client,
    endpoint: Url,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ClientError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|source| ClientError::InvalidEndpoint {
                url: config.endpoint.clone(),
                source,
            })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(2)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Most recent `history_window` messages, minus empty placeholders.
    pub fn context_window<'a>(&self, history: &'a [ChatMessage]) -> Vec<&'a ChatMessage> {
        let start = history.len().saturating_sub(self.config.history_window);
        history[start..]
            .iter()
            .filter(|m| !m.text.trim().is_empty())
            .collect()
    }

    pub fn build_request(&self, input: &str, history: &[ChatMessage]) -> ChatRequest {
        let context = self.context_window(history);
        let model = self.config.model.clone();
        let stream = self.config.stream;

        match self.config.shape {
            RequestShape::Messages => {
                let mut messages = Vec::with_capacity(context.len() + 2);
                messages.push(ApiChatMessage::new("system", self.config.system_prompt.clone()));
                messages.extend(
                    context
                        .iter()
                        .map(|m| ApiChatMessage::new(m.role(), m.text.clone())),
                );
                messages.push(ApiChatMessage::new("user", input));
                ChatRequest::Messages {
                    model,
                    messages,
                    stream,
                }
            }
            RequestShape::Prompt => ChatRequest::Prompt {
                model,
                system: self.config.system_prompt.clone(),
                prompt: render_transcript(&context, input),
                stream,
            },
        }
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.http.post(self.endpoint.clone()).json(request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(endpoint = %self.endpoint, stream = request.is_stream(), "sending chat request");
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            tracing::warn!(%status, "chat endpoint returned an error");
            return Err(ClientError::Status { status, body });
        }
        Ok(resp)
    }

    /// Non-streaming request: one JSON body in, answer text out.
    pub async fn generate(
        &self,
        input: &str,
        history: &[ChatMessage],
    ) -> Result<String, ClientError> {
        let request = self.build_request(input, history);
        let resp = self.post(&request).await?;
        let bytes = resp.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;

        let content = wire::message_content(&value).ok_or(ClientError::MissingContent)?;
        let answer = strip_reasoning(content, self.config.reasoning_delimiter.as_deref()).trim();
        if answer.is_empty() {
            return Err(ClientError::MissingContent);
        }
        Ok(answer.to_string())
    }

    /// Streaming request: newline-delimited JSON objects until `done`.
    pub async fn generate_stream(
        &self,
        input: &str,
        history: &[ChatMessage],
        tx: UnboundedSender<StreamChunk>,
    ) -> Result<String, ClientError> {
        let request = self.build_request(input, history);
        let resp = self.post(&request).await?;

        let mut stream = resp.bytes_stream();
        let mut parser = NdjsonParser::new();
        let mut filter = ReasoningFilter::new(self.config.reasoning_delimiter.as_deref());
        let mut finished = false;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            for line in parser.feed(&bytes) {
                if apply_line(line?, &mut filter, &tx)? {
                    finished = true;
                    break;
                }
            }
            if finished {
                break;
            }
        }
        if !finished {
            if let Some(line) = parser.finish() {
                apply_line(line?, &mut filter, &tx)?;
            }
        }

        let answer = filter.finish();
        if answer.is_empty() {
            return Err(ClientError::MissingContent);
        }
        Ok(answer)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(
        &self,
        input: &str,
        history: &[ChatMessage],
        tx: UnboundedSender<StreamChunk>,
    ) -> Result<String, ClientError> {
        if self.config.stream {
            self.generate_stream(input, history, tx).await
        } else {
            self.generate(input, history).await
        }
    }
}

/// Feeds one decoded line into the filter. Returns true once the stream is done.
fn apply_line(
    line: StreamLine,
    filter: &mut ReasoningFilter,
    tx: &UnboundedSender<StreamChunk>,
) -> Result<bool, ClientError> {
    let value = match line {
        StreamLine::Done => return Ok(true),
        StreamLine::Object(value) => value,
    };
    if let Some(err) = wire::stream_error(&value) {
        return Err(ClientError::Stream(err));
    }
    if let Some(delta) = wire::delta_content(&value) {
        if let Some(visible) = filter.push(delta) {
            // Receiver gone means the UI stopped listening; keep consuming anyway
            let _ = tx.send(StreamChunk::Visible(visible.to_string()));
        }
    }
    Ok(wire::is_done(&value))
}

/// Flat transcript for generation endpoints that take a single prompt.
fn render_transcript(context: &[&ChatMessage], input: &str) -> String {
    let mut prompt = String::new();
    for msg in context {
        prompt.push_str(if msg.is_user { "User: " } else { "Assistant: " });
        prompt.push_str(msg.text.trim());
        prompt.push_str("\n\n");
    }
    prompt.push_str("User: ");
    prompt.push_str(input);
    prompt.push_str("\n\nAssistant:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(endpoint: String) -> ChatConfig {
        ChatConfig {
            endpoint,
            system_prompt: "Be brief.".into(),
            ..ChatConfig::default()
        }
    }

    fn history_of(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {}", i))
                } else {
                    ChatMessage::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = ChatClient::new(config_for("not a url".into())).err().unwrap();
        assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_context_window_takes_last_n() {
        let client = ChatClient::new(config_for("http://localhost:1/chat".into())).unwrap();
        let history = history_of(15);

        let window = client.context_window(&history);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0].text, "answer 5");
        assert_eq!(window[9].text, "question 14");
    }

    #[test]
    fn test_context_window_drops_placeholders() {
        let client = ChatClient::new(config_for("http://localhost:1/chat".into())).unwrap();
        let mut history = history_of(15);
        history[12] = ChatMessage::placeholder();
        history[14] = ChatMessage::placeholder();

        let window = client.context_window(&history);
        assert_eq!(window.len(), 8);
        assert!(window.iter().all(|m| !m.text.is_empty()));
    }

    #[test]
    fn test_build_messages_request() {
        let client = ChatClient::new(config_for("http://localhost:1/chat".into())).unwrap();
        let history = vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")];

        let req = client.build_request("How are you?", &history);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello!"},
                    {"role": "user", "content": "How are you?"}
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_build_prompt_request() {
        let mut config = config_for("http://localhost:1/api/generate".into());
        config.shape = RequestShape::Prompt;
        config.model = Some("llama3.2".into());
        config.stream = true;
        let client = ChatClient::new(config).unwrap();

        let req = client.build_request("Thanks", &[ChatMessage::user("Hi"), ChatMessage::assistant("Hey")]);
        match req {
            ChatRequest::Prompt {
                model,
                system,
                prompt,
                stream,
            } => {
                assert_eq!(model.as_deref(), Some("llama3.2"));
                assert_eq!(system, "Be brief.");
                assert_eq!(prompt, "User: Hi\n\nAssistant: Hey\n\nUser: Thanks\n\nAssistant:");
                assert!(stream);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_non_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "<think>plan</think>\n Hi there \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(format!("{}/v1/chat", server.uri()))).unwrap();
        let (tx, _rx) = unbounded_channel();
        let answer = client.send("Hello", &[], tx).await.unwrap();
        assert_eq!(answer, "Hi there");
    }

    #[tokio::test]
    async fn test_api_key_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.api_key = Some("secret".into());
        let client = ChatClient::new(config).unwrap();
        assert_eq!(client.generate("ping", &[]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_streaming_hides_reasoning() {
        let body = [
            json!({"choices": [{"delta": {"content": "<think>secret"}}], "done": false}),
            json!({"choices": [{"delta": {"content": " thoughts</think>"}}], "done": false}),
            json!({"choices": [{"delta": {"content": "Visible"}}], "done": false}),
            json!({"choices": [{"delta": {"content": " answer"}}], "done": true}),
            json!({"choices": [{"delta": {"content": " ignored"}}], "done": false}),
        ]
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.stream = true;
        let client = ChatClient::new(config).unwrap();

        let (tx, mut rx) = unbounded_channel();
        let answer = client.send("Hello", &[], tx).await.unwrap();
        assert_eq!(answer, "Visible answer");

        let mut published = Vec::new();
        while let Ok(StreamChunk::Visible(text)) = rx.try_recv() {
            published.push(text);
        }
        assert_eq!(published, vec!["Visible".to_string(), "Visible answer".to_string()]);
        assert!(published.iter().all(|t| !t.contains("secret")));
    }

    #[tokio::test]
    async fn test_streaming_local_variant() {
        let body = "{\"response\":\"Hel\",\"done\":false}\n{\"response\":\"lo\",\"done\":true}\n";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.stream = true;
        config.reasoning_delimiter = None;
        let client = ChatClient::new(config).unwrap();

        let (tx, mut rx) = unbounded_channel();
        assert_eq!(client.send("hi", &[], tx).await.unwrap(), "Hello");
        assert_eq!(rx.try_recv().unwrap(), StreamChunk::Visible("Hel".into()));
        assert_eq!(rx.try_recv().unwrap(), StreamChunk::Visible("Hello".into()));
    }

    async fn stream_from(body: &'static str) -> Result<String, ClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let mut config = config_for(server.uri());
        config.stream = true;
        let client = ChatClient::new(config).unwrap();
        let (tx, _rx) = unbounded_channel();
        client.send("hi", &[], tx).await
    }

    #[tokio::test]
    async fn test_streaming_stops_at_done_sentinel() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n\
                    data: [DONE]\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\" ignored\"}}]}\n";
        assert_eq!(stream_from(body).await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_streaming_error_object() {
        let body = "{\"response\":\"partial\",\"done\":false}\n{\"error\":\"model not found\"}\n";
        match stream_from(body).await {
            Err(ClientError::Stream(msg)) => assert_eq!(msg, "model not found"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_streaming_malformed_line() {
        let body = "{\"response\":\"a\",\"done\":false}\nnot json at all\n{\"response\":\"b\",\"done\":true}\n";
        let err = stream_from(body).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(server.uri())).unwrap();
        match client.generate("hi", &[]).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(server.uri())).unwrap();
        let err = client.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = ChatClient::new(config_for(server.uri())).unwrap();
        let err = client.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingContent));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is not expected to be listening on loopback
        let client = ChatClient::new(config_for("http://127.0.0.1:9/chat".into())).unwrap();
        let err = client.generate("hi", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
