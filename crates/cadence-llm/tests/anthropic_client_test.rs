use cadence_llm::{
    AnthropicClient, AnthropicConfig, ChatClient, ChatOptions, ChatRequest, Message, StreamEvent, Tool,
};
use futures::StreamExt;
use serde_json::json;

fn request() -> ChatRequest {
    ChatRequest::new("claude-test", vec![Message::user("Hello")])
        .with_system("Be brief")
        .with_options(
            ChatOptions::new()
                .max_tokens(256)
                .tools(vec![Tool::new("web_search", "Search", json!({"type": "object"}))]),
        )
}

#[test]
fn test_payload_shape() {
    let payload = AnthropicClient::build_payload(&request()).unwrap();

    assert_eq!(payload["model"], "claude-test");
    assert_eq!(payload["max_tokens"], 256);
    assert_eq!(payload["system"], "Be brief");
    assert_eq!(payload["stream"], true);
    assert_eq!(payload["tools"][0]["name"], "web_search");
    assert_eq!(payload["messages"][0]["role"], "user");
    assert!(payload.get("temperature").is_none());
}

#[test]
fn test_payload_omits_empty_tools() {
    let request = ChatRequest::new("m", vec![Message::user("x")])
        .with_options(ChatOptions::new().tools(Vec::new()));
    let payload = AnthropicClient::build_payload(&request).unwrap();
    assert!(payload.get("tools").is_none());
    assert_eq!(payload["max_tokens"], 1024);
}

#[tokio::test]
async fn test_chat_stream_against_mock_server() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client =
        AnthropicClient::from_config(AnthropicConfig::new("test-key").with_base_url(server.url())).unwrap();
    let mut stream = client.chat_stream(request()).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }

    mock.assert_async().await;
    assert_eq!(
        events,
        vec![StreamEvent::token("Hi"), StreamEvent::stop(Some("end_turn"))]
    );
}

#[tokio::test]
async fn test_api_version_override() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("anthropic-version", "2024-01-01")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n")
        .create_async()
        .await;

    let config = AnthropicConfig::new("test-key")
        .with_base_url(server.url())
        .with_api_version("2024-01-01");
    let client = AnthropicClient::from_config(config).unwrap();
    let events: Vec<_> = client.chat_stream(request()).await.unwrap().collect().await;

    mock.assert_async().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::stop(None));
}

#[tokio::test]
async fn test_chat_stream_http_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/messages")
        .with_status(529)
        .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
        .create_async()
        .await;

    let client =
        AnthropicClient::from_config(AnthropicConfig::new("k").with_base_url(server.url())).unwrap();
    let err = client.chat_stream(request()).await.err().unwrap();
    assert!(err.to_string().contains("529"));
}
