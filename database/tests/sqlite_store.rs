use chrono::{DateTime, Duration, Utc};
use database::storage::{Context, RecordStore};
use model::{
    contribution_id, review_id, Contribution, ContributionType, Developer, DomainScore,
    IngestionRun, IngestionStatus, QualificationFilter, RepoMetadata, Review, ReviewState,
};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-05-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

async fn store(dir: &tempfile::TempDir) -> Context {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("devrank.db").display());
    let ctx = Context::new(&url).await.unwrap();
    ctx.setup_schema().await.unwrap();
    ctx
}

fn contribution(sha: &str) -> Contribution {
    Contribution {
        id: contribution_id("acme/api", sha),
        developer_id: "octo".to_owned(),
        repo: "acme/api".to_owned(),
        sha: sha.to_owned(),
        message: "add endpoint".to_owned(),
        authored_at: now() - Duration::days(3),
        additions: 30,
        deletions: 4,
        file_count: 2,
        churn: 34,
        entropy: 0.4,
        complexity_delta: 1,
        abs_complexity_delta: 1,
        test_ratio: -0.2,
        languages: vec!["go".to_owned()],
        file_paths: vec!["api/user.go".to_owned(), "api/user_test.go".to_owned()],
        formatting_only: false,
        contribution_type: None,
        domains: vec![],
        classified: false,
        quality_score: None,
        recency_weighted: None,
        scored: false,
        score_version: 0,
    }
}

#[tokio::test]
async fn test_developer_and_run_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = store(&dir).await;

    let mut dev = Developer::new("Octo", now());
    assert!(dev.begin_ingestion(now()));
    dev.languages = vec!["go".to_owned()];
    ctx.upsert_developer(&dev).await.unwrap();
    dev.attempt_count = 2;
    ctx.upsert_developer(&dev).await.unwrap();

    let loaded = ctx.get_developer("octo").await.unwrap().unwrap();
    assert_eq!(loaded, dev);
    let in_progress = ctx
        .list_developers_by_status(IngestionStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(in_progress.len(), 1);

    let mut run = IngestionRun::start("octo", 2, now());
    run.record_completion("acme/api");
    ctx.put_ingestion_run(&run).await.unwrap();
    assert_eq!(ctx.get_ingestion_run("octo").await.unwrap(), Some(run));
}

#[tokio::test]
async fn test_contributions_insert_once_and_update() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = store(&dir).await;

    assert!(ctx.insert_contribution_if_absent(&contribution("a1")).await.unwrap());
    assert!(!ctx.insert_contribution_if_absent(&contribution("a1")).await.unwrap());
    assert!(ctx.insert_contribution_if_absent(&contribution("a2")).await.unwrap());
    assert_eq!(ctx.count_contributions("octo").await.unwrap(), 2);
    assert_eq!(ctx.count_unclassified("octo").await.unwrap(), 2);

    let mut batch = ctx.list_unclassified("octo", 1).await.unwrap();
    assert_eq!(batch.len(), 1);
    let c = &mut batch[0];
    c.contribution_type = Some(ContributionType::Feature);
    c.domains = vec!["backend".to_owned()];
    c.classified = true;
    ctx.update_contribution(c).await.unwrap();
    assert_eq!(ctx.count_unclassified("octo").await.unwrap(), 1);

    let review = Review {
        id: review_id("acme/api", 4, 99),
        developer_id: "octo".to_owned(),
        repo: "acme/api".to_owned(),
        pr_number: 4,
        pr_author: Some("hubot".to_owned()),
        pr_opened_at: Some(now()),
        state: ReviewState::ChangesRequested,
        comment_count: 3,
        comment_chars: 240,
        references_code: true,
        submitted_at: now(),
    };
    assert!(ctx.insert_review_if_absent(&review).await.unwrap());
    assert!(!ctx.insert_review_if_absent(&review).await.unwrap());
    assert_eq!(ctx.list_reviews("octo").await.unwrap(), vec![review]);
}

#[tokio::test]
async fn test_repo_metadata_merge_and_domain_scores() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = store(&dir).await;

    let mut meta = RepoMetadata::new("acme/api", now());
    meta.stars = 150;
    meta.topics = vec!["billing".to_owned()];
    ctx.merge_repo_metadata(meta).await.unwrap();
    let merged = ctx
        .merge_repo_metadata(RepoMetadata::new("acme/api", now()))
        .await
        .unwrap();
    assert_eq!(merged.stars, 150);
    assert_eq!(merged.topics, vec!["billing".to_owned()]);

    let score = |domain: &str, value: f64| DomainScore {
        developer_id: "octo".to_owned(),
        domain: domain.to_owned(),
        score: value,
        contribution_count: 1,
        evidence_repos: vec!["acme/api".to_owned()],
        updated_at: now(),
    };
    ctx.upsert_domain_scores(&[score("backend", 30.0), score("ml", 10.0)])
        .await
        .unwrap();
    ctx.upsert_domain_scores(&[score("backend", 45.0)]).await.unwrap();
    let scores = ctx.list_domain_scores("octo").await.unwrap();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].domain, "backend");
    assert_eq!(scores[0].score, 45.0);
}

#[tokio::test]
async fn test_purge_and_gate() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = store(&dir).await;

    let mut dev = Developer::new("octo", now());
    dev.status = IngestionStatus::Complete;
    dev.overall_score = 42.0;
    dev.last_ingested_at = Some(now());
    ctx.upsert_developer(&dev).await.unwrap();
    ctx.insert_contribution_if_absent(&contribution("a1")).await.unwrap();

    let ids = vec!["octo".to_owned(), "ghost".to_owned()];
    let gated = ctx
        .qualified_developers(&ids, &QualificationFilter::default(), now())
        .await
        .unwrap();
    assert_eq!(gated.len(), 1);

    ctx.purge_developer_data("octo").await.unwrap();
    assert_eq!(ctx.count_contributions("octo").await.unwrap(), 0);
    assert!(ctx.get_developer("octo").await.unwrap().is_some());
}
