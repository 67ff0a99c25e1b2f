mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{commit, harness, test_config, FakeHost, RecordingQueue};
use database::storage::RecordStore;
use ingestion::tasks::build_contribution;
use ingestion::{IngestionConfig, ProfileLookup, ProfileService, TaskOutcome, TaskQueue};
use model::{contribution_id, Developer, IngestionRun, IngestionStatus, Task};
use search::{SearchConfig, SearchEngine, SearchRequest};
use uuid::Uuid;

fn two_repo_host() -> FakeHost {
    FakeHost::new()
        .with_user("octo", 1)
        .with_repo("octo", "api", 1, false)
        .with_repo("octo", "web", 2, false)
        .with_commit(
            "octo/api",
            commit(
                "a1",
                "feat(billing): add invoices endpoint",
                5,
                &[("api/handlers/billing.go", 120, 10, None)],
            ),
        )
        .with_commit(
            "octo/api",
            commit(
                "a2",
                "fix: handle nil customer",
                3,
                &[
                    ("api/handlers/billing.go", 12, 4, None),
                    ("api/handlers/billing_test.go", 30, 0, None),
                ],
            ),
        )
        .with_commit(
            "octo/web",
            commit("w1", "docs: explain local setup", 2, &[("docs/setup.md", 40, 2, None)]),
        )
        .with_review(
            "octo/api",
            7,
            "alice",
            "octo",
            "APPROVED",
            &["nil check belongs in the handler", "rename `cust` here"],
        )
}

async fn ingest(h: &common::Harness, username: &str) {
    h.queue
        .enqueue(Task::Ingest {
            username: username.to_owned(),
        })
        .await
        .unwrap();
    h.worker.run_until_idle().await;
}

#[tokio::test(start_paused = true)]
async fn test_full_pipeline_scores_and_indexes() {
    let h = harness(two_repo_host(), test_config());
    ingest(&h, "octo").await;

    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(dev.status, IngestionStatus::Complete);
    assert!(dev.has_scores());
    assert!(dev.overall_score > 0.0);
    assert!(dev.scored_at >= dev.last_ingested_at);

    let contributions = h.store.list_contributions("octo").await.unwrap();
    assert_eq!(contributions.len(), 3);
    assert!(contributions.iter().all(|c| c.classified && c.scored));

    let reviews = h.store.list_reviews("octo").await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].comment_count, 2);
    assert_eq!(reviews[0].pr_author.as_deref(), Some("alice"));

    let run = h.store.get_ingestion_run("octo").await.unwrap().unwrap();
    assert_eq!(run.completed_units.len(), 2);
    assert!(run.finished_at.is_some());

    // one profile vector plus one per portfolio repo
    assert_eq!(h.index.entry_count(), 3);
    assert_eq!(h.store.list_portfolios("octo").await.unwrap().len(), 2);
    assert!(h.store.get_repo_metadata("octo/api").await.unwrap().unwrap().has_tests);
    assert_eq!(h.queue.outstanding(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ingested_developer_is_searchable_and_profiled() {
    let h = harness(two_repo_host(), test_config());
    ingest(&h, "octo").await;

    let engine = SearchEngine::new(
        h.index.clone(),
        Arc::new(common::LengthEmbedder),
        h.store.clone(),
        SearchConfig::default(),
    );
    let hits = engine
        .search(&SearchRequest {
            text: "billing api in go".to_owned(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].developer_id, "octo");

    let profiles = ProfileService::new(h.store.clone(), h.queue.clone());
    match profiles.lookup("Octo").await.unwrap() {
        ProfileLookup::Ready(view) => {
            assert_eq!(view.developer.id, "octo");
            assert_eq!(view.portfolios.len(), 2);
            assert!(!view.domain_scores.is_empty());
            for pair in view.domain_scores.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
        other => panic!("expected a ready profile, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_reingest_only_adds_new_commits() {
    let h = harness(two_repo_host(), test_config());
    ingest(&h, "octo").await;
    let first = h.store.get_developer("octo").await.unwrap().unwrap();

    ingest(&h, "octo").await;
    let second = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(second.status, IngestionStatus::Complete);
    assert_eq!(second.attempt_count, first.attempt_count + 1);
    assert!(second.last_ingested_at > first.last_ingested_at);
    assert_eq!(h.store.count_contributions("octo").await.unwrap(), 3);
    assert_eq!(h.store.list_reviews("octo").await.unwrap().len(), 1);
    assert_eq!(h.index.entry_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_zero_repos_complete_without_scoring() {
    let h = harness(FakeHost::new().with_user("octo", 1), test_config());
    ingest(&h, "octo").await;

    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(dev.status, IngestionStatus::Complete);
    assert!(!dev.has_scores());
    assert_eq!(h.index.entry_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_repo_still_closes_the_run() {
    let host = two_repo_host().with_missing_repo("octo/web");
    let h = harness(host, test_config());
    ingest(&h, "octo").await;

    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(dev.status, IngestionStatus::Complete);
    assert!(dev.has_scores());
    let repos: Vec<String> = h
        .store
        .list_contributions("octo")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.repo)
        .collect();
    assert_eq!(repos, vec!["octo/api".to_owned(), "octo/api".to_owned()]);
    let run = h.store.get_ingestion_run("octo").await.unwrap().unwrap();
    assert!(run.completed_units.contains("octo/web"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_detail_failure_is_retried() {
    let host = two_repo_host().with_flaky_detail("a2", 2);
    let h = harness(host, test_config());
    ingest(&h, "octo").await;

    let ids: Vec<String> = h
        .store
        .list_contributions("octo")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert!(ids.contains(&contribution_id("octo/api", "a2")));
    assert_eq!(ids.len(), 3);
    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(dev.status, IngestionStatus::Complete);
}

#[tokio::test(start_paused = true)]
async fn test_long_classification_still_builds_vectors() {
    // 64 batches at the default requeue delay outlast every deferral of the
    // completion-time BuildVectors
    let mut host = FakeHost::new().with_user("octo", 1).with_repo("octo", "api", 1, false);
    for i in 0..1600 {
        host = host.with_commit(
            "octo/api",
            commit(
                &format!("c{:04}", i),
                "update billing handler",
                1 + i % 30,
                &[("api/handlers/billing.go", 10, 2, None)],
            ),
        );
    }
    let h = harness(host, IngestionConfig::default());
    ingest(&h, "octo").await;

    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(dev.status, IngestionStatus::Complete);
    assert!(dev.has_scores());
    assert_eq!(h.store.count_unclassified("octo").await.unwrap(), 0);
    assert_eq!(h.index.entry_count(), 2);
}

#[tokio::test]
async fn test_compute_scores_classifies_in_chunks() {
    let config = IngestionConfig {
        classify_batch: 1,
        ..test_config()
    };
    let h = harness(FakeHost::new(), config);
    let now = Utc::now();
    h.store.upsert_developer(&Developer::new("octo", now)).await.unwrap();
    for (sha, path) in [("c1", "src/lib.rs"), ("c2", "docs/guide.md"), ("c3", "tests/it.rs")] {
        let detail = commit(sha, "update things", 4, &[(path, 20, 3, None)]);
        let c = build_contribution("octo", "octo/core", &detail, now);
        h.store.insert_contribution_if_absent(&c).await.unwrap();
    }

    let task = Task::ComputeScores {
        developer_id: "octo".to_owned(),
    };
    let delay = Duration::from_millis(10);
    assert_eq!(h.pipeline.handle(&task).await.unwrap(), TaskOutcome::Requeued(delay));
    assert_eq!(h.pipeline.handle(&task).await.unwrap(), TaskOutcome::Requeued(delay));
    assert_eq!(h.pipeline.handle(&task).await.unwrap(), TaskOutcome::Done);

    assert_eq!(h.store.count_unclassified("octo").await.unwrap(), 0);
    let dev = h.store.get_developer("octo").await.unwrap().unwrap();
    assert!(dev.has_scores());
    let contributions = h.store.list_contributions("octo").await.unwrap();
    assert!(contributions.iter().all(|c| c.classified && c.scored));
}

#[tokio::test]
async fn test_reviews_of_superseded_run_skip_upstream() {
    let host = two_repo_host();
    let listings = host.pull_listings();
    let h = harness(host, test_config());
    let now = Utc::now();
    let mut dev = Developer::new("octo", now);
    dev.begin_ingestion(now);
    h.store.upsert_developer(&dev).await.unwrap();
    let run = IngestionRun::start("octo", 2, now);
    h.store.put_ingestion_run(&run).await.unwrap();

    let stale = Task::AnalyzeReviews {
        developer_id: "octo".to_owned(),
        run_id: Uuid::new_v4(),
        repo: "octo/api".to_owned(),
    };
    assert_eq!(
        h.pipeline.handle(&stale).await.unwrap(),
        TaskOutcome::Skipped("stale run".into())
    );

    dev.mark_complete(now, now);
    h.store.upsert_developer(&dev).await.unwrap();
    let finished = Task::AnalyzeReviews {
        developer_id: "octo".to_owned(),
        run_id: run.run_id,
        repo: "octo/api".to_owned(),
    };
    assert!(matches!(
        h.pipeline.handle(&finished).await.unwrap(),
        TaskOutcome::Skipped(_)
    ));
    assert_eq!(listings.load(Ordering::SeqCst), 0);
    assert!(h.store.list_reviews("octo").await.unwrap().is_empty());
    let stored = h.store.get_ingestion_run("octo").await.unwrap().unwrap();
    assert_eq!(stored.completed(), 0);
}

#[tokio::test]
async fn test_build_vectors_waits_for_fresh_scores() {
    let h = harness(FakeHost::new(), test_config());
    let now = Utc::now();
    let mut dev = Developer::new("octo", now);
    dev.last_ingested_at = Some(now);
    h.store.upsert_developer(&dev).await.unwrap();

    let task = Task::BuildVectors {
        developer_id: "octo".to_owned(),
    };
    assert_eq!(
        h.pipeline.handle(&task).await.unwrap(),
        TaskOutcome::Deferred(Duration::from_millis(10))
    );

    // scores from before the watermark are stale too
    dev.scored_at = Some(now - chrono::Duration::hours(1));
    h.store.upsert_developer(&dev).await.unwrap();
    assert!(matches!(
        h.pipeline.handle(&task).await.unwrap(),
        TaskOutcome::Deferred(_)
    ));

    dev.scored_at = Some(now);
    h.store.upsert_developer(&dev).await.unwrap();
    assert_eq!(h.pipeline.handle(&task).await.unwrap(), TaskOutcome::Done);
    assert_eq!(h.index.entry_count(), 1);

    dev.opted_out = true;
    h.store.upsert_developer(&dev).await.unwrap();
    assert!(matches!(
        h.pipeline.handle(&task).await.unwrap(),
        TaskOutcome::Skipped(_)
    ));
    assert_eq!(h.index.entry_count(), 0);
}

#[tokio::test]
async fn test_profile_lookup_requests_ingestion_when_not_ready() {
    let store = Arc::new(database::storage::MemoryStore::new());
    let queue = Arc::new(RecordingQueue::default());
    let profiles = ProfileService::new(store.clone(), queue.clone());

    let lookup = profiles.lookup("Octo").await.unwrap();
    assert!(matches!(
        lookup,
        ProfileLookup::Pending {
            status: IngestionStatus::Pending
        }
    ));
    assert_eq!(queue.kinds(), vec!["ingest"]);

    let mut dev = Developer::new("octo", Utc::now());
    dev.begin_ingestion(Utc::now());
    store.upsert_developer(&dev).await.unwrap();
    let lookup = profiles.lookup("octo").await.unwrap();
    assert!(matches!(
        lookup,
        ProfileLookup::Pending {
            status: IngestionStatus::InProgress
        }
    ));
    assert_eq!(queue.count("ingest"), 1);

    dev.opted_out = true;
    store.upsert_developer(&dev).await.unwrap();
    assert!(matches!(profiles.lookup("octo").await.unwrap(), ProfileLookup::OptedOut));
    assert_eq!(queue.count("ingest"), 1);
}
