mod common;

use common::{
    pipeline, posting, settings_for, setup_db, ApplyScript, ScriptedApplier, StaticCollector,
};
use jobsentinel::config::Profile;
use jobsentinel::platforms::{ApplyStatus, PlatformRegistry};

#[tokio::test]
async fn daily_quota_leaves_overflow_queued() {
    let db = setup_db().await;

    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![
            posting("feed", "Junior Engineer", "First", "https://example.com/1"),
            posting("feed", "Junior Engineer", "Second", "https://example.com/2"),
        ]),
    );
    registry.register_applier("feed", ScriptedApplier::always_applied());

    let mut settings = settings_for(&["feed"]);
    settings.limits.daily_applications = 1;

    let pipe = pipeline(&db, registry, settings, Profile::default());
    let stats = pipe.run_cycle().await.unwrap();

    assert_eq!(stats.applied, 1);
    assert_eq!(stats.deferred, 0);
    assert_eq!(stats.skipped_apply, 0);

    // The passed-over job stays queued for the next cycle, it is not
    // deferred or skipped.
    let queued = db.repo.list(&["queued".to_string()], &[], None, 10).await.unwrap();
    let applied = db.repo.list(&["applied".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(applied.len(), 1);
}

#[tokio::test]
async fn quota_spans_cycles_within_the_same_day() {
    let db = setup_db().await;

    let applier = ScriptedApplier::always_applied();
    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![
            posting("feed", "Junior Engineer", "First", "https://example.com/1"),
            posting("feed", "Junior Engineer", "Second", "https://example.com/2"),
        ]),
    );
    registry.register_applier("feed", applier.clone());

    let mut settings = settings_for(&["feed"]);
    settings.limits.daily_applications = 1;

    let pipe = pipeline(&db, registry, settings, Profile::default());
    let first = pipe.run_cycle().await.unwrap();
    assert_eq!(first.applied, 1);

    // The derived count sees today's earlier application, so the second
    // cycle never reaches the applier.
    let second = pipe.run_cycle().await.unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(applier.call_count(), 1);

    let queued = db.repo.list(&["queued".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(queued.len(), 1);
}

#[tokio::test]
async fn adapter_error_routes_to_review_and_continues() {
    let db = setup_db().await;

    let applier = ScriptedApplier::new(vec![
        ApplyScript::Fail,
        ApplyScript::Report(ApplyStatus::Applied, Some(true)),
    ]);
    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![
            posting("feed", "Junior Engineer", "First", "https://example.com/1"),
            posting("feed", "Junior Engineer", "Second", "https://example.com/2"),
        ]),
    );
    registry.register_applier("feed", applier.clone());

    let pipe = pipeline(&db, registry, settings_for(&["feed"]), Profile::default());
    let stats = pipe.run_cycle().await.unwrap();

    // The failed apply is contained: the loop reaches the second job.
    assert_eq!(applier.call_count(), 2);
    assert_eq!(stats.review_apply, 1);
    assert_eq!(stats.applied, 1);

    let review = db.repo.list(&["review".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].easy_apply, Some(false));

    let applied = db.repo.list(&["applied".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].easy_apply, Some(true));
}

#[tokio::test]
async fn missing_applier_skips_without_stopping_the_loop() {
    let db = setup_db().await;

    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "orphan",
        StaticCollector::new(vec![posting(
            "orphan",
            "Junior Engineer",
            "First",
            "https://example.com/1",
        )]),
    );
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![posting(
            "feed",
            "Junior Engineer",
            "Second",
            "https://example.com/2",
        )]),
    );
    registry.register_applier("feed", ScriptedApplier::always_applied());

    let pipe = pipeline(
        &db,
        registry,
        settings_for(&["orphan", "feed"]),
        Profile::default(),
    );
    let stats = pipe.run_cycle().await.unwrap();

    assert_eq!(stats.skipped_apply, 1);
    assert_eq!(stats.applied, 1);

    let skipped = db.repo.list(&["skipped".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].platform, "orphan");
}

#[tokio::test]
async fn no_report_defers_until_explicitly_requeued() {
    let db = setup_db().await;

    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![posting(
            "feed",
            "Junior Engineer",
            "First",
            "https://example.com/1",
        )]),
    );
    registry.register_applier("feed", ScriptedApplier::new(vec![ApplyScript::NoReport]));

    let pipe = pipeline(&db, registry, settings_for(&["feed"]), Profile::default());
    let stats = pipe.run_cycle().await.unwrap();
    assert_eq!(stats.deferred, 1);

    let deferred = db.repo.list(&["deferred".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(deferred.len(), 1);
    assert_eq!(deferred[0].easy_apply, None);

    // Deferred rows stay put by default; retry_deferred opts into a
    // re-queue at the start of the next cycle.
    let mut registry = PlatformRegistry::new();
    registry.register_applier("feed", ScriptedApplier::always_applied());
    let mut settings = settings_for(&[]);
    settings.app.retry_deferred = true;

    let retry_pipe = pipeline(&db, registry, settings, Profile::default());
    let stats = retry_pipe.run_cycle().await.unwrap();
    assert_eq!(stats.applied, 1);

    let applied = db.repo.list(&["applied".to_string()], &[], None, 10).await.unwrap();
    assert_eq!(applied.len(), 1);
}

#[tokio::test]
async fn apply_all_bypasses_the_quota() {
    let db = setup_db().await;

    let mut registry = PlatformRegistry::new();
    registry.register_collector(
        "feed",
        StaticCollector::new(vec![
            posting("feed", "Junior Engineer", "First", "https://example.com/1"),
            posting("feed", "Junior Engineer", "Second", "https://example.com/2"),
            posting("feed", "Junior Engineer", "Third", "https://example.com/3"),
        ]),
    );
    registry.register_applier("feed", ScriptedApplier::always_applied());

    let mut settings = settings_for(&["feed"]);
    settings.limits.daily_applications = 0;
    settings.app.apply_all = true;

    let pipe = pipeline(&db, registry, settings, Profile::default());
    let stats = pipe.run_cycle().await.unwrap();

    assert_eq!(stats.applied, 3);
}
