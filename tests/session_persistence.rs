//! Session lifecycle and write-back integration tests
//!
//! Runs full sessions against the sled store and the in-memory store,
//! including a store outage.

use civic_progress::{
    Activity, ActivityKind, Curriculum, LearnerSession, LevelId, MemoryStore, ProgressError,
    ProgressRequest, ProgressStore, Rewards, SledStore, UserId, WriteBackConfig,
};
use std::sync::Arc;
use tempfile::TempDir;

fn quick_write_back() -> WriteBackConfig {
    WriteBackConfig {
        max_retries: 1,
        retry_backoff_ms: 1,
    }
}

#[tokio::test]
async fn test_new_learner_starts_at_first_level() {
    let store = Arc::new(MemoryStore::new());
    let session = LearnerSession::start(
        UserId::new("new"),
        Arc::new(Curriculum::civic_default()),
        store.clone(),
        quick_write_back(),
    )
    .await
    .unwrap();

    let state = session.tracker().state();
    assert_eq!(state.current_level().as_str(), "level-1");
    assert_eq!(state.xp(), 0);

    let report = session.end().await;
    assert_eq!(report.write_back.saved, 0);
    assert!(store.stored(&UserId::new("new")).is_none());
}

#[tokio::test]
async fn test_progress_survives_sled_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("progress.sled");
    let curriculum = Arc::new(Curriculum::civic_default());
    let user = UserId::new("alice");

    {
        let store = Arc::new(SledStore::open(&db_path).unwrap());
        let mut session =
            LearnerSession::start(user.clone(), curriculum.clone(), store, quick_write_back())
                .await
                .unwrap();
        let tracker = session.tracker_mut();
        tracker.award_xp(5);
        tracker.complete_level("level-1");
        tracker.record_myth_fact_result(true);

        let report = session.end().await;
        assert_eq!(report.write_back.failures, 0);
        assert_eq!(report.state.xp(), 5);
    }

    let store = Arc::new(SledStore::open(&db_path).unwrap());
    assert_eq!(store.user_count(), 1);

    let session = LearnerSession::start(user.clone(), curriculum, store.clone(), quick_write_back())
        .await
        .unwrap();
    let state = session.tracker().state();
    assert_eq!(state.xp(), 5);
    assert!(state.is_completed("level-1"));
    assert_eq!(state.current_level().as_str(), "level-2");
    assert_eq!(state.myth_fact().total, 1);
    assert!(session.tracker().is_level_unlocked("level-2"));
    session.end().await;

    let activity = store.recent_activity(&user, 10).await.unwrap();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0].kind, ActivityKind::FactMyth);
    assert_eq!(activity[1].kind, ActivityKind::LevelComplete);
    assert_eq!(activity[1].url, "/learn/level-1");
}

#[tokio::test]
async fn test_sled_activity_is_isolated_per_user() {
    let dir = TempDir::new().unwrap();
    let store = SledStore::open(dir.path().join("progress.sled")).unwrap();

    let short = UserId::new("a");
    let nul_suffixed = UserId::new("a\0b");
    store
        .record_activity(&nul_suffixed, &Activity::fact_myth())
        .await
        .unwrap();
    store
        .record_activity(&short, &Activity::level_complete(&LevelId::from("level-1")))
        .await
        .unwrap();

    let short_entries = store.recent_activity(&short, 10).await.unwrap();
    assert_eq!(short_entries.len(), 1);
    assert_eq!(short_entries[0].kind, ActivityKind::LevelComplete);

    let other_entries = store.recent_activity(&nul_suffixed, 10).await.unwrap();
    assert_eq!(other_entries.len(), 1);
    assert_eq!(other_entries[0].kind, ActivityKind::FactMyth);
}

#[tokio::test]
async fn test_failed_load_does_not_overwrite_stored_progress() {
    let store = Arc::new(MemoryStore::new());
    let curriculum = Arc::new(Curriculum::civic_default());
    let user = UserId::new("returning");

    let mut session =
        LearnerSession::start(user.clone(), curriculum.clone(), store.clone(), quick_write_back())
            .await
            .unwrap();
    session.tracker_mut().award_xp(100);
    session.tracker_mut().complete_level("level-1");
    session.end().await;

    store.set_available(false);
    let result =
        LearnerSession::start(user.clone(), curriculum.clone(), store.clone(), quick_write_back())
            .await;
    assert!(matches!(result, Err(ProgressError::Persistence(_))));
    store.set_available(true);

    let stored = store.stored(&user).unwrap();
    assert_eq!(stored.xp(), 100);
    assert!(stored.is_completed("level-1"));

    let mut session = LearnerSession::start(user.clone(), curriculum, store.clone(), quick_write_back())
        .await
        .unwrap();
    session.tracker_mut().award_xp(1);
    session.end().await;

    let stored = store.stored(&user).unwrap();
    assert_eq!(stored.xp(), 101);
    assert!(stored.is_completed("level-1"));
}

#[tokio::test]
async fn test_store_outage_keeps_in_memory_state() {
    let store = Arc::new(MemoryStore::new());
    let user = UserId::new("offline");

    let mut session = LearnerSession::start(
        user.clone(),
        Arc::new(Curriculum::civic_default()),
        store.clone(),
        quick_write_back(),
    )
    .await
    .unwrap();
    store.set_available(false);

    session.tracker_mut().award_xp(10);
    session.tracker_mut().complete_level("level-1");
    assert_eq!(session.tracker().state().xp(), 10);
    assert!(session.tracker().is_level_unlocked("level-2"));

    let report = session.end().await;
    assert!(report.write_back.failures > 0);
    assert_eq!(report.state.xp(), 10);
    assert!(report.state.is_completed("level-1"));
    assert!(store.stored(&user).is_none());
}

#[tokio::test]
async fn test_api_requests_through_session() {
    let store = Arc::new(MemoryStore::new());
    let user = UserId::new("api-user");
    let rewards = Rewards::default();
    let mut session = LearnerSession::start(
        user.clone(),
        Arc::new(Curriculum::civic_default()),
        store.clone(),
        quick_write_back(),
    )
    .await
    .unwrap();

    let requests = [
        r#"{"action":"start_module","module_id":"level-1"}"#,
        r#"{"action":"complete_module","module_id":"level-1"}"#,
        r#"{"action":"update_xp","xp_earned":10}"#,
        r#"{"action":"start_module","module_id":"level-3"}"#,
    ];
    let mut responses = Vec::new();
    for raw in requests {
        let request: ProgressRequest = serde_json::from_str(raw).unwrap();
        responses.push(civic_progress::api::handle(
            session.tracker_mut(),
            &rewards,
            request,
        ));
    }

    assert!(responses[0].ok);
    assert!(responses[1].ok);
    assert_eq!(responses[2].progress.xp, 60);
    assert!(!responses[3].ok);
    assert_eq!(
        responses[3].progress.last_visited_route.as_deref(),
        Some("/learn/level-1")
    );

    let report = session.end().await;
    assert_eq!(report.write_back.failures, 0);

    let stored = store.stored(&user).unwrap();
    assert_eq!(stored.xp(), 60);
    assert!(stored.is_completed("level-1"));
}
