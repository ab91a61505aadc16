//! End-to-end review flow
//!
//! Drives a reply through extract, apply, stage, accept/reject, and the
//! history ledger, including the JSONL persistence sink.

use sketchpilot::core::{
    apply_patches, extract, ChangeOrigin, HistorySink, JsonlHistorySink, ReplyAction,
    ReviewSession, ReviewState,
};

const SKETCH: &str = "function draw() {\n  circle(200, 200, 50);\n}\n";

fn stage_reply(session: &mut ReviewSession, reply: &str, key: &str) {
    match extract(reply) {
        ReplyAction::Patches(patches) => {
            let patched = apply_patches(session.document(), &patches).unwrap();
            session.stage(patched, ChangeOrigin::Patch, Some(key.to_string()), false);
        }
        ReplyAction::FullCode(code) => {
            session.stage(code, ChangeOrigin::FullCode, Some(key.to_string()), false);
        }
        ReplyAction::None => {}
    }
}

#[test]
fn reply_to_accepted_history_entry() {
    let mut session = ReviewSession::new(SKETCH.to_string());
    stage_reply(
        &mut session,
        "<<<<<<< SEARCH\n  circle(200, 200, 50);\n=======\n  circle(200, 200, 120);\n>>>>>>> REPLACE",
        "msg-1",
    );
    assert_eq!(session.state(), ReviewState::Staged);

    let entry = session.accept(Some("make it bigger".to_string())).unwrap();
    assert_eq!(entry.summary, "+1 / -1 lines");
    assert_eq!(entry.prompt.as_deref(), Some("make it bigger"));
    assert!(session.document().contains("circle(200, 200, 120);"));
}

#[test]
fn superseded_diff_never_reaches_history() {
    let mut session = ReviewSession::new(SKETCH.to_string());
    stage_reply(
        &mut session,
        "```javascript\nfirst proposal\n```",
        "msg-1",
    );
    stage_reply(
        &mut session,
        "```javascript\nsecond proposal\n```",
        "msg-2",
    );

    session.accept(None).unwrap();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.document(), "second proposal");
}

#[test]
fn accepted_entries_persist_as_jsonl() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("history.jsonl");
    let mut session = ReviewSession::with_sink(
        SKETCH.to_string(),
        Box::new(JsonlHistorySink::new(path.clone())),
    );

    stage_reply(&mut session, "```javascript\nv2\n```", "msg-1");
    session.accept(Some("rewrite".to_string())).unwrap();
    stage_reply(&mut session, "```javascript\nv3\n```", "msg-2");
    session.accept(None).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["result_document"], "v2");
    assert_eq!(first["prompt"], "rewrite");
    assert_eq!(first["is_restore"], false);
}

#[test]
fn sink_failure_never_rolls_back_the_accept() {
    // Directory path: every append fails
    let dir = tempfile::TempDir::new().unwrap();
    let sink = JsonlHistorySink::new(dir.path().to_path_buf());
    assert!(sink
        .persist(&{
            let mut probe = ReviewSession::new(String::new());
            probe.stage("x".to_string(), ChangeOrigin::Manual, None, false);
            probe.accept(None).unwrap()
        })
        .is_err());

    let mut session =
        ReviewSession::with_sink(SKETCH.to_string(), Box::new(sink));
    stage_reply(&mut session, "```javascript\nv2\n```", "msg-1");

    // The in-memory accept stands even though persistence failed
    let entry = session.accept(None);
    assert!(entry.is_some());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.document(), "v2");
}

#[test]
fn restore_is_itself_reviewable_and_audited() {
    let mut session = ReviewSession::new("v1".to_string());
    stage_reply(&mut session, "```javascript\nv2\n```", "msg-1");
    let old_id = session.accept(None).unwrap().id;
    stage_reply(&mut session, "```javascript\nv3\n```", "msg-2");
    session.accept(None).unwrap();

    assert!(session.restore(&old_id));
    assert_eq!(session.state(), ReviewState::Staged);

    // Rejecting the restoration keeps the current document
    assert!(session.reject());
    assert_eq!(session.document(), "v3");

    // Accepting it writes an audited restore entry
    session.restore(&old_id);
    let entry = session.accept(None).unwrap();
    assert!(entry.is_restore);
    assert_eq!(session.document(), "v2");
    assert_eq!(session.history().len(), 3);
}
