//! Multi-turn workflow tests driving the orchestrator with scripted adapters

use std::sync::Arc;
use std::time::Duration;

use prd_builder::conversation::{Message, Role};
use prd_builder::endpoint::{ChatRequest, chat};
use prd_builder::prd::{ListField, PrdDocument, PrdFragment};
use prd_builder::provider::{AdapterError, ExtractionResult, ScriptedAdapter};
use prd_builder::session::{SessionRegistry, SessionState, TurnError, TurnOrchestrator, TurnPhase};
use tokio::sync::Mutex;

fn extraction(questions: &[&str], fragment: PrdFragment) -> Result<ExtractionResult, AdapterError> {
    Ok(ExtractionResult {
        assistant_text: String::new(),
        questions: questions.iter().map(|q| q.to_string()).collect(),
        prd_fragment: fragment,
    })
}

fn goals(entries: &[&str]) -> PrdFragment {
    PrdFragment::default().with_list(ListField::Goals, entries)
}

fn orchestrator_over(adapter: Arc<ScriptedAdapter>) -> TurnOrchestrator {
    TurnOrchestrator::new(adapter, Duration::from_secs(5))
}

/// Two turns where the second repeats a goal: the document keeps one copy
#[tokio::test]
async fn goals_accumulate_without_duplicates() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        extraction(&["Who uses it?"], goals(&["faster review"])),
        extraction(
            &["Who uses it?", "How is success measured?"],
            goals(&["Faster Review", "stay organized"]),
        ),
    ]));
    let orchestrator = orchestrator_over(adapter.clone());
    let mut state = SessionState::new();

    let first = orchestrator
        .run_turn(&mut state, "We want faster review")
        .await
        .unwrap();
    assert_eq!(first.document.goals, vec!["faster review"]);
    assert_eq!(first.questions, vec!["Who uses it?"]);

    let second = orchestrator
        .run_turn(&mut state, "Also staying organized")
        .await
        .unwrap();
    assert_eq!(second.document.goals, vec!["faster review", "stay organized"]);
    assert_eq!(second.questions, vec!["How is success measured?"]);

    // adapter saw the history including the new user message each time
    assert_eq!(adapter.seen_history_lens(), vec![1, 3]);
    assert_eq!(state.messages.len(), 4);
    assert_eq!(state.turn_count, 2);
    assert_eq!(state.last_phase, TurnPhase::Done);
}

#[tokio::test]
async fn failed_turn_leaves_document_untouched() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        extraction(&[], goals(&["faster review"])),
        Err(AdapterError::MalformedOutput {
            reason: "not JSON".to_string(),
            raw_output: "oops".to_string(),
        }),
        extraction(&[], goals(&["stay organized"])),
    ]));
    let orchestrator = orchestrator_over(adapter);
    let mut state = SessionState::new();

    orchestrator.run_turn(&mut state, "first").await.unwrap();
    let document_before = serde_json::to_vec(&state.prd).unwrap();
    let asked_before = state.asked_questions.clone();

    let err = orchestrator.run_turn(&mut state, "second").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(serde_json::to_vec(&state.prd).unwrap(), document_before);
    assert_eq!(state.asked_questions, asked_before);
    assert_eq!(state.last_phase, TurnPhase::Failed);
    assert_eq!(state.turn_count, 1);

    // user message stays, no assistant reply was appended
    let last = state.messages.history().last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "second");

    let retry = orchestrator.run_turn(&mut state, "second").await.unwrap();
    assert_eq!(retry.document.goals, vec!["faster review", "stay organized"]);
}

#[tokio::test]
async fn slow_provider_times_out_without_merging() {
    let adapter = Arc::new(
        ScriptedAdapter::new(vec![extraction(&[], goals(&["late goal"]))])
            .with_delay(Duration::from_millis(500)),
    );
    let orchestrator = TurnOrchestrator::new(adapter, Duration::from_millis(20));
    let mut state = SessionState::new();

    let err = orchestrator.run_turn(&mut state, "hello").await.unwrap_err();
    assert!(matches!(
        err,
        TurnError::Adapter(AdapterError::ProviderUnavailable(_))
    ));
    assert!(state.prd.goals.is_empty());
    assert_eq!(state.turn_count, 0);
}

#[tokio::test]
async fn dropped_turn_merges_nothing() {
    let adapter = Arc::new(
        ScriptedAdapter::new(vec![extraction(&["Who uses it?"], goals(&["on time"]))])
            .with_delay(Duration::from_millis(200)),
    );
    // orchestrator's own limit is generous; the caller gives up first
    let orchestrator = orchestrator_over(adapter.clone());
    let mut state = SessionState::new();
    state.prd.goals.push("existing".to_string());
    let document_before = serde_json::to_vec(&state.prd).unwrap();
    let asked_before = state.asked_questions.clone();

    let dropped = tokio::time::timeout(
        Duration::from_millis(20),
        orchestrator.run_turn(&mut state, "cancel me"),
    )
    .await;
    assert!(dropped.is_err());

    assert_eq!(serde_json::to_vec(&state.prd).unwrap(), document_before);
    assert_eq!(state.asked_questions, asked_before);
    assert_eq!(state.messages.history(), &[Message::user("cancel me")]);
    assert_eq!(state.turn_count, 0);
    assert_eq!(state.last_phase, TurnPhase::AwaitingCompletion);
    // the dropped call never got as far as taking its result
    assert_eq!(adapter.remaining(), 1);

    // the next turn runs normally on top of the interrupted one
    let outcome = orchestrator.run_turn(&mut state, "again").await.unwrap();
    assert_eq!(outcome.document.goals, vec!["existing", "on time"]);
    assert_eq!(outcome.questions, vec!["Who uses it?"]);
    assert_eq!(state.last_phase, TurnPhase::Done);
    assert_eq!(state.messages.len(), 3);
}

#[tokio::test]
async fn turns_on_one_session_queue_behind_each_other() {
    let adapter = Arc::new(
        ScriptedAdapter::new(vec![
            extraction(&[], goals(&["alpha"])),
            extraction(&[], goals(&["beta"])),
        ])
        .with_delay(Duration::from_millis(20)),
    );
    let orchestrator = Arc::new(orchestrator_over(adapter.clone()));
    let session = Arc::new(Mutex::new(SessionState::new()));

    let a = {
        let (orchestrator, session) = (orchestrator.clone(), session.clone());
        tokio::spawn(async move { orchestrator.handle_turn(&session, "one").await })
    };
    let b = {
        let (orchestrator, session) = (orchestrator.clone(), session.clone());
        tokio::spawn(async move { orchestrator.handle_turn(&session, "two").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let state = session.lock().await;
    assert_eq!(state.turn_count, 2);
    assert_eq!(state.prd.goals.len(), 2);
    // the second turn saw the first turn's complete exchange
    assert_eq!(adapter.seen_history_lens(), vec![1, 3]);

    let roles: Vec<Role> = state.messages.history().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn independent_sessions_do_not_share_state() {
    let orchestrator = Arc::new(orchestrator_over(Arc::new(ScriptedAdapter::new(vec![
        extraction(&["Who uses it?"], goals(&["alpha"])),
        extraction(&["Who uses it?"], goals(&["beta"])),
    ]))));
    let registry = SessionRegistry::new();
    let (first_id, first) = registry.create().await;
    let (second_id, second) = registry.create().await;
    assert_ne!(first_id, second_id);

    let one = orchestrator.handle_turn(&first, "one").await.unwrap();
    let two = orchestrator.handle_turn(&second, "two").await.unwrap();

    // the asked set is per session, so both see the question
    assert_eq!(one.questions, vec!["Who uses it?"]);
    assert_eq!(two.questions, vec!["Who uses it?"]);
    assert_eq!(first.lock().await.prd.goals, vec!["alpha"]);
    assert_eq!(second.lock().await.prd.goals, vec!["beta"]);
    assert_eq!(registry.len().await, 2);
}

#[tokio::test]
async fn completed_document_stops_asking() {
    let full = PrdFragment::default()
        .with_problem("Reviews are slow")
        .with_list(ListField::Goals, &["faster review"])
        .with_list(ListField::Metrics, &["median review time"])
        .with_list(ListField::Requirements, &["inline comments"]);
    let orchestrator = orchestrator_over(Arc::new(ScriptedAdapter::new(vec![extraction(
        &["Anything else?"],
        full,
    )])));
    let mut state = SessionState::new();

    let outcome = orchestrator.run_turn(&mut state, "everything").await.unwrap();
    assert!(outcome.complete);
    assert!(outcome.questions.is_empty());
    assert!(state.asked_questions.is_empty());
}

#[tokio::test]
async fn stateless_endpoint_does_not_repeat_earlier_questions() {
    let orchestrator = orchestrator_over(Arc::new(ScriptedAdapter::new(vec![extraction(
        &["Who uses it?", "What is the deadline?"],
        PrdFragment::default(),
    )])));

    let request = ChatRequest {
        messages: vec![
            Message::user("A review tool"),
            Message::assistant("Thanks. Could you tell me:\n- who uses it?"),
            Message::user("Designers"),
        ],
        prd: Some(PrdDocument::default()),
    };

    let response = chat(&orchestrator, request).await.unwrap();
    assert_eq!(response.questions, vec!["What is the deadline?"]);
}
