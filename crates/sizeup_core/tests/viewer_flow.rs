use sizeup_core::db::open_db_in_memory;
use sizeup_core::{
    EstimationModeId, InMemorySessionStore, InvalidSubmission, SessionContext, SessionError,
    SessionService, SessionStore, SqliteSessionStore, ViewerEvent, ViewerPhase, ViewerSession,
};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn two_viewers_move_from_estimating_to_results() {
    let service = SessionService::new(InMemorySessionStore::new());
    let session = service
        .create_session(
            "Implement login",
            EstimationModeId::Tshirt,
            &names(&["Alice", "Bob"]),
        )
        .unwrap();
    assert!(sizeup_core::is_valid_session_id(&session.id));
    assert!(session.created_at > 0);
    assert!(!session.all_submitted);

    let mut alice = ViewerSession::new();
    let mut bob = ViewerSession::new();
    assert_eq!(alice.phase(), ViewerPhase::NoSession);

    let (alice_ctx, _) = service.open_session(&session.id, Some("Alice")).unwrap();
    let (bob_ctx, _) = service.open_session(&session.id, Some("Bob")).unwrap();
    assert_eq!(alice.load(&service, alice_ctx).unwrap(), ViewerPhase::Estimating);
    assert_eq!(bob.load(&service, bob_ctx).unwrap(), ViewerPhase::Estimating);

    assert_eq!(alice.submit(&service, "M").unwrap(), ViewerPhase::Waiting);
    assert_eq!(bob.poll(), vec![ViewerEvent::Updated(ViewerPhase::Estimating)]);

    let err = alice.submit(&service, "L").unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            phase: ViewerPhase::Waiting,
            action: "submit"
        }
    ));

    assert_eq!(bob.submit(&service, "L").unwrap(), ViewerPhase::Results);
    let events = alice.poll();
    assert_eq!(events.last(), Some(&ViewerEvent::Updated(ViewerPhase::Results)));
    assert_eq!(alice.phase(), ViewerPhase::Results);

    let results = alice.view().and_then(|view| view.results.clone()).unwrap();
    assert_eq!(results.display, "M (3.50)");
}

#[test]
fn loading_another_session_cancels_previous_subscription() {
    let store = InMemorySessionStore::new();
    let service = SessionService::new(&store);
    let first = service
        .create_session("First", EstimationModeId::Tshirt, &names(&["Alice"]))
        .unwrap();
    let second = service
        .create_session("Second", EstimationModeId::Fibonacci, &names(&["Alice"]))
        .unwrap();

    let mut viewer = ViewerSession::new();
    viewer
        .load(&service, SessionContext::view_only(&first.id))
        .unwrap();
    assert_eq!(store.watchers().subscriber_count(&first.id), 1);

    viewer
        .load(&service, SessionContext::view_only(&second.id))
        .unwrap();
    assert_eq!(store.watchers().subscriber_count(&first.id), 0);
    assert_eq!(store.watchers().subscriber_count(&second.id), 1);
    assert_eq!(
        viewer.view().map(|view| view.task_description.as_str()),
        Some("Second")
    );

    viewer.leave();
    assert_eq!(viewer.phase(), ViewerPhase::NoSession);
    assert!(viewer.context().is_none());
    assert_eq!(store.watchers().subscriber_count(&second.id), 0);
}

#[test]
fn deleted_session_returns_viewer_to_no_session() {
    let store = InMemorySessionStore::new();
    let service = SessionService::new(&store);
    let session = service
        .create_session("Doomed", EstimationModeId::Tshirt, &names(&["Alice"]))
        .unwrap();

    let mut viewer = ViewerSession::new();
    viewer
        .load(&service, SessionContext::participant(&session.id, "Alice"))
        .unwrap();
    service.delete_session(&session.id).unwrap();

    assert_eq!(viewer.poll(), vec![ViewerEvent::SessionEnded]);
    assert_eq!(viewer.phase(), ViewerPhase::NoSession);

    let err = viewer
        .load(&service, SessionContext::view_only(&session.id))
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
    assert_eq!(store.watchers().subscriber_count(&session.id), 0);
}

#[test]
fn submit_without_session_is_rejected() {
    let service = SessionService::new(InMemorySessionStore::new());
    let mut viewer = ViewerSession::new();
    let err = viewer.submit(&service, "M").unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidTransition {
            phase: ViewerPhase::NoSession,
            ..
        }
    ));
}

#[test]
fn joining_adds_participant_and_reopens_estimating() {
    let conn = open_db_in_memory().unwrap();
    let service = SessionService::new(SqliteSessionStore::new(&conn));
    let session = service
        .create_session("Spike", EstimationModeId::Fibonacci, &names(&["Alice"]))
        .unwrap();

    let alice_ctx = SessionContext::participant(&session.id, "Alice");
    let done = service.submit_estimate(&alice_ctx, "13").unwrap();
    assert!(done.all_submitted);
    assert_eq!(
        service.view(&alice_ctx).unwrap().results.unwrap().display,
        "13.0 (≈13)"
    );

    let carol_ctx = service.join_session(&session.id, "Carol").unwrap();
    let view = service.view(&carol_ctx).unwrap();
    assert!(!view.all_submitted);
    assert!(view.show_welcome_banner);
    assert_eq!(service.view(&alice_ctx).unwrap().panel, sizeup_core::Panel::Waiting);

    let err = service.join_session(&session.id, "Carol").unwrap_err();
    assert!(matches!(err, SessionError::DuplicateParticipant(name) if name == "Carol"));
    assert_eq!(service.store().read(&session.id).unwrap().participants.len(), 2);
}

#[test]
fn invalid_submission_leaves_stored_document_untouched() {
    let service = SessionService::new(InMemorySessionStore::new());
    let session = service
        .create_session("Task", EstimationModeId::Tshirt, &names(&["Alice"]))
        .unwrap();

    let err = service
        .submit_estimate(&SessionContext::participant(&session.id, "Alice"), "13")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidSubmission(InvalidSubmission::UnknownEstimate { .. })
    ));

    let err = service
        .submit_estimate(&SessionContext::participant(&session.id, "Zed"), "M")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidSubmission(InvalidSubmission::UnknownParticipant(_))
    ));

    assert_eq!(service.store().read(&session.id).unwrap(), session);
}
