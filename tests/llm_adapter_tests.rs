//! Adapter contract tests with fixture transports
//!
//! Verifies that each backend's wire quirks stay inside its adapter and
//! that the uniform contract (stream, list, normalized errors) holds
//! across all of them.

use sketchpilot::core::{ConversationTurn, TurnRole};
use sketchpilot::llm::adapters::anthropic::AnthropicAdapter;
use sketchpilot::llm::adapters::gemini::GeminiAdapter;
use sketchpilot::llm::adapters::openai::OpenAiAdapter;
use sketchpilot::llm::{
    AdapterError, FakeTransport, ProviderAdapter, ProviderErrorKind, StreamContext, Transport,
};

fn turns() -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::text(TurnRole::System, "you edit sketches"),
        ConversationTurn::text(TurnRole::User, "draw a square"),
    ]
}

#[test]
fn every_backend_reassembles_the_same_reply() {
    let openai_sse = "data: {\"choices\":[{\"delta\":{\"content\":\"sq\"}}]}\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"uare\"}}]}\n\
                      data: [DONE]";
    let anthropic_sse = "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"sq\"}}\n\
                         data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"uare\"}}\n\
                         data: {\"type\":\"message_stop\"}";
    let gemini_sse = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"sq\"}]}}]}\n\
                      data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"uare\"}]}}]}";

    let results = [
        OpenAiAdapter::with_transport(
            "https://x/v1".into(),
            "m".into(),
            "k".into(),
            Transport::Fake(FakeTransport::with_stream(openai_sse)),
        )
        .stream_reply(&turns(), &StreamContext::default(), |_| {}),
        AnthropicAdapter::with_transport(
            "https://x".into(),
            "m".into(),
            "k".into(),
            Transport::Fake(FakeTransport::with_stream(anthropic_sse)),
        )
        .stream_reply(&turns(), &StreamContext::default(), |_| {}),
        GeminiAdapter::with_transport(
            "https://x/v1beta".into(),
            "m".into(),
            "k".into(),
            Transport::Fake(FakeTransport::with_stream(gemini_sse)),
        )
        .stream_reply(&turns(), &StreamContext::default(), |_| {}),
    ];

    for result in results {
        assert_eq!(result.unwrap(), "square");
    }
}

#[test]
fn vendor_errors_collapse_to_one_taxonomy() {
    let cases: [(u16, &str, ProviderErrorKind); 4] = [
        (
            401,
            r#"{"error":{"message":"Incorrect API key"}}"#,
            ProviderErrorKind::InvalidCredential,
        ),
        (
            429,
            r#"{"error":{"message":"Rate limit reached"}}"#,
            ProviderErrorKind::RateLimited,
        ),
        (
            429,
            r#"{"error":{"message":"quota","code":"insufficient_quota"}}"#,
            ProviderErrorKind::InsufficientCredit,
        ),
        (
            404,
            r#"{"error":{"message":"model gone"}}"#,
            ProviderErrorKind::ModelUnavailable,
        ),
    ];

    for (status, body, expected) in cases {
        let adapter = OpenAiAdapter::with_transport(
            "https://x/v1".into(),
            "m".into(),
            "k".into(),
            Transport::Fake(FakeTransport::with_error(AdapterError::Http {
                status,
                message: body.to_string(),
            })),
        );
        let err = adapter
            .stream_reply(&turns(), &StreamContext::default(), |_| {})
            .unwrap_err();
        assert_eq!(err.kind(), expected, "status {} body {}", status, body);
    }
}

#[test]
fn cancellation_stops_the_transport_loop() {
    let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\
               data: [DONE]";
    let transport = FakeTransport::with_stream(sse);

    let flag = sketchpilot::llm::CancelFlag::new();
    flag.cancel();
    let ctx = StreamContext::unbounded(flag);

    let adapter = OpenAiAdapter::with_transport(
        "https://x/v1".into(),
        "m".into(),
        "k".into(),
        Transport::Fake(transport),
    );

    let mut tokens = Vec::new();
    let result = adapter.stream_reply(&turns(), &ctx, |t| tokens.push(t.to_string()));
    assert_eq!(result, Err(AdapterError::Cancelled));
    assert!(tokens.is_empty());
}

#[test]
fn empty_stream_falls_back_to_a_single_completion() {
    // A backend ignoring stream=true returns a plain JSON body; the
    // adapter retries without streaming and emits the reply once.
    let body = r#"{"choices":[{"message":{"content":"full reply"}}]}"#;
    let adapter = OpenAiAdapter::with_transport(
        "https://x/v1".into(),
        "m".into(),
        "k".into(),
        Transport::Fake(FakeTransport::new(body)),
    );

    let mut tokens = Vec::new();
    let result = adapter
        .stream_reply(&turns(), &StreamContext::default(), |t| {
            tokens.push(t.to_string())
        })
        .unwrap();
    assert_eq!(result, "full reply");
    assert_eq!(tokens, vec!["full reply"]);
}
