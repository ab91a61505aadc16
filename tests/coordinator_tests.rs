//! Coordinator behavior over the event channel

use sketchpilot::core::{AppConfig, BudgetedRequest, ConversationTurn, ProviderSelection, TurnRole};
use sketchpilot::llm::coordinator::{run_turn, StreamEvent};
use sketchpilot::llm::AdapterError;

fn budgeted(text: &str) -> BudgetedRequest {
    BudgetedRequest {
        message: ConversationTurn::text(TurnRole::User, text),
        history: Vec::new(),
    }
}

fn selection(provider: &str) -> ProviderSelection {
    ProviderSelection {
        provider_id: provider.to_string(),
        model_id: "stub-model".to_string(),
        credential: None,
    }
}

#[test]
fn tokens_arrive_in_order_and_reassemble_the_reply() {
    let config = AppConfig::default();
    let (rx, handle) = run_turn(budgeted("grow the circle"), selection("stub"), &config);
    handle.join();

    let events: Vec<StreamEvent> = rx.iter().collect();
    let mut assembled = String::new();
    let mut terminal_seen = false;
    for event in &events {
        match event {
            StreamEvent::Token { content } => {
                assert!(!terminal_seen, "token after terminal event");
                assembled.push_str(content);
            }
            StreamEvent::Done { full_text } => {
                terminal_seen = true;
                assert_eq!(*full_text, assembled);
            }
            StreamEvent::Error { error } => panic!("unexpected error: {}", error),
        }
    }
    assert!(terminal_seen);
}

#[test]
fn configuration_failure_surfaces_as_the_only_event() {
    let config = AppConfig::default();
    let (rx, handle) = run_turn(budgeted("x"), selection("no-such-provider"), &config);
    assert!(!handle.is_running());

    let events: Vec<StreamEvent> = rx.iter().collect();
    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error {
            error: AdapterError::Configuration(msg),
        } => assert!(msg.contains("no-such-provider")),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn expired_deadline_ends_the_turn_with_a_timeout_error() {
    let mut config = AppConfig::default();
    config.stream.turn_timeout_secs = 0;

    let (rx, handle) = run_turn(budgeted("x"), selection("stub"), &config);
    handle.join();

    let events: Vec<StreamEvent> = rx.iter().collect();
    match events.last() {
        Some(StreamEvent::Error {
            error: AdapterError::Timeout { limit_secs },
        }) => assert_eq!(*limit_secs, 0),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[test]
fn missing_caller_credential_is_refused_before_any_network() {
    let config = AppConfig::default();
    let sel = ProviderSelection {
        provider_id: "openai".to_string(),
        model_id: "gpt-4o".to_string(),
        credential: None,
    };
    let (rx, handle) = run_turn(budgeted("x"), sel, &config);
    assert!(!handle.is_running());

    let events: Vec<StreamEvent> = rx.iter().collect();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        StreamEvent::Error {
            error: AdapterError::Configuration(_)
        }
    ));
}
