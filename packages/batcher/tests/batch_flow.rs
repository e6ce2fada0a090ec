//! End-to-end orchestration tests: the public dispatcher API driven with
//! the mock scraper and in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use batcher::{
    ArtifactKey, ArtifactKind, ArtifactStore, BatchError, BatchJob, BatchStatus, Dispatcher,
    DispatcherConfig, ItemStatus, MemoryArtifactStore, MemoryJobStore, MockScraper, SubmitMode,
    SubmitOptions, SubmitOutcome,
};

fn dispatcher_with(
    scraper: MockScraper,
    config: DispatcherConfig,
) -> (Dispatcher, Arc<MemoryJobStore>, Arc<MemoryArtifactStore>) {
    let store = Arc::new(MemoryJobStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::new("http://artifacts.test"));
    let dispatcher = Dispatcher::with_config(
        Arc::new(scraper),
        store.clone(),
        artifacts.clone(),
        config,
    );
    (dispatcher, store, artifacts)
}

async fn wait_terminal(dispatcher: &Dispatcher, id: Uuid) -> BatchJob {
    for _ in 0..500 {
        let job = dispatcher.status(id).await.unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not reach a terminal state");
}

fn submitted_job_id(outcome: SubmitOutcome) -> Uuid {
    match outcome {
        SubmitOutcome::Accepted(submission) => submission.job_id,
        SubmitOutcome::Finished(job) => job.id,
    }
}

/// Local HTTP receiver capturing webhook deliveries.
async fn spawn_webhook_receiver() -> (String, mpsc::Receiver<(HeaderMap, Value)>) {
    let (tx, rx) = mpsc::channel(4);
    let app = Router::new().route(
        "/hook",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((headers, body)).await;
                StatusCode::OK
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), rx)
}

#[tokio::test]
async fn all_items_are_addressable_immediately_after_submission() {
    let scraper = MockScraper::new().with_delay_for_all(Duration::from_millis(50));
    let (dispatcher, _, _) = dispatcher_with(scraper, DispatcherConfig::default());

    let urls: Vec<String> = ["https://a.example", "https://b.example", "https://c.example"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outcome = dispatcher.submit(SubmitOptions::new(urls.clone())).await.unwrap();
    let id = submitted_job_id(outcome);

    // Immediately after submission: every slot exists, none torn.
    let job = dispatcher.status(id).await.unwrap();
    assert_eq!(job.total, 3);
    assert_eq!(job.items.len(), 3);
    for (item, url) in job.items.iter().zip(&urls) {
        assert_eq!(&item.url, url);
    }
    assert!(job.completed_count + job.failed_count <= job.total);

    let job = wait_terminal(&dispatcher, id).await;
    assert_eq!(job.completed_count + job.failed_count, job.total);
}

#[tokio::test]
async fn counters_never_exceed_total_while_processing() {
    let scraper = MockScraper::new().with_delay_for_all(Duration::from_millis(20));
    let (dispatcher, _, _) = dispatcher_with(scraper, DispatcherConfig::default());

    let urls = (0..6).map(|i| format!("https://example.com/{i}")).collect();
    let outcome = dispatcher.submit(SubmitOptions::new(urls)).await.unwrap();
    let id = submitted_job_id(outcome);

    loop {
        let job = dispatcher.status(id).await.unwrap();
        assert!(job.completed_count + job.failed_count <= job.total);
        assert_eq!(job.items.len(), job.total);
        if job.is_terminal() {
            assert_eq!(job.completed_count + job.failed_count, job.total);
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn status_is_idempotent_once_terminal() {
    let (dispatcher, _, _) = dispatcher_with(MockScraper::new(), DispatcherConfig::default());

    let outcome = dispatcher
        .submit(SubmitOptions::new(vec!["https://a.example".to_string()]))
        .await
        .unwrap();
    let id = submitted_job_id(outcome);
    wait_terminal(&dispatcher, id).await;

    let first = serde_json::to_value(dispatcher.status(id).await.unwrap()).unwrap();
    let second = serde_json::to_value(dispatcher.status(id).await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn item_indexes_are_stable_regardless_of_completion_order() {
    let scraper = MockScraper::new()
        .with_page("https://a.example", "content of A")
        .with_page("https://b.example", "content of B")
        .with_delay("https://b.example", Duration::from_millis(100))
        .with_failure("https://c.example", "connection refused");
    let (dispatcher, _, artifacts) = dispatcher_with(scraper, DispatcherConfig::default());

    let outcome = dispatcher
        .submit(SubmitOptions::new(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
            "https://c.example".to_string(),
        ]))
        .await
        .unwrap();
    let id = submitted_job_id(outcome);
    let job = wait_terminal(&dispatcher, id).await;

    // C finished (failed) long before B, but index 1 is still B.
    assert_eq!(job.items[0].url, "https://a.example");
    assert_eq!(job.items[1].url, "https://b.example");
    assert_eq!(job.items[2].url, "https://c.example");
    assert_eq!(job.items[1].status, ItemStatus::Succeeded);
    assert_eq!(job.items[2].status, ItemStatus::Failed);

    // And B's artifact sits at index 1's address.
    let key = ArtifactKey::item(id, 1, ArtifactKind::Markdown);
    let artifact = artifacts.get(&key.object_path()).await.unwrap().unwrap();
    assert_eq!(artifact.bytes, b"content of B");
}

#[tokio::test]
async fn collation_merges_successes_and_notes_failures() {
    let scraper = MockScraper::new()
        .with_page("https://x.example", "unique content of X")
        .with_failure("https://y.example", "server exploded")
        .with_page("https://z.example", "unique content of Z");
    let (dispatcher, _, artifacts) = dispatcher_with(scraper, DispatcherConfig::default());

    let options = SubmitOptions::new(vec![
        "https://x.example".to_string(),
        "https://y.example".to_string(),
        "https://z.example".to_string(),
    ])
    .with_collate(true)
    .with_mode(SubmitMode::Sync);

    let SubmitOutcome::Finished(job) = dispatcher.submit(options).await.unwrap() else {
        panic!("expected sync submission to finish");
    };
    assert_eq!(job.status, BatchStatus::Completed);

    let location = job.collated_location.as_deref().unwrap();
    assert!(location.ends_with(&format!("jobs/{}/collated.md", job.id)));

    let artifact = artifacts
        .get(&ArtifactKey::collated(job.id).object_path())
        .await
        .unwrap()
        .unwrap();
    let doc = String::from_utf8(artifact.bytes).unwrap();

    let x = doc.find("unique content of X").unwrap();
    let z = doc.find("unique content of Z").unwrap();
    assert!(x < z);
    assert!(doc.contains("https://y.example"));
    assert!(doc.contains("server exploded"));
    assert!(!doc.contains("## https://y.example"));
}

#[tokio::test]
async fn collation_with_zero_successes_still_produces_a_document() {
    let scraper = MockScraper::new().with_failure("https://a.example", "boom");
    let (dispatcher, _, artifacts) = dispatcher_with(scraper, DispatcherConfig::default());

    let options = SubmitOptions::new(vec!["https://a.example".to_string()])
        .with_collate(true)
        .with_mode(SubmitMode::Sync);
    let SubmitOutcome::Finished(job) = dispatcher.submit(options).await.unwrap() else {
        panic!("expected sync submission to finish");
    };

    assert_eq!(job.status, BatchStatus::Failed);
    assert!(job.collated_location.is_some());

    let artifact = artifacts
        .get(&ArtifactKey::collated(job.id).object_path())
        .await
        .unwrap()
        .unwrap();
    let doc = String::from_utf8(artifact.bytes).unwrap();
    assert!(doc.contains("All 1 items failed"));
}

#[tokio::test]
async fn callback_payload_matches_status_snapshot() {
    let (hook_url, mut rx) = spawn_webhook_receiver().await;
    let scraper = MockScraper::new().with_failure("https://b.example", "boom");
    let (dispatcher, _, _) = dispatcher_with(scraper, DispatcherConfig::default());

    let options = SubmitOptions::new(vec![
        "https://a.example".to_string(),
        "https://b.example".to_string(),
    ])
    .with_callback(&hook_url)
    .with_callback_header("x-batch-token", "secret");

    let outcome = dispatcher.submit(options).await.unwrap();
    let id = submitted_job_id(outcome);
    wait_terminal(&dispatcher, id).await;

    let (headers, payload) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("callback not delivered in time")
        .expect("receiver closed");

    // Caller header was merged in, defaults survived.
    assert_eq!(headers.get("x-batch-token").unwrap(), "secret");
    assert_eq!(headers.get("content-type").unwrap(), "application/json");

    // Payload is exactly the status snapshot.
    let snapshot = serde_json::to_value(dispatcher.status(id).await.unwrap()).unwrap();
    assert_eq!(payload, snapshot);
    assert_eq!(payload["status"], "completed");
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["completed_count"], 1);
    assert_eq!(payload["failed_count"], 1);
}

#[tokio::test]
async fn failed_callback_does_not_change_job_status() {
    // Nothing listens on this port; delivery fails fast.
    let scraper = MockScraper::new();
    let (dispatcher, _, _) = dispatcher_with(scraper, DispatcherConfig::default());

    let options = SubmitOptions::new(vec!["https://a.example".to_string()])
        .with_callback("http://127.0.0.1:9/hook");
    let outcome = dispatcher.submit(options).await.unwrap();
    let id = submitted_job_id(outcome);

    let job = wait_terminal(&dispatcher, id).await;
    assert_eq!(job.status, BatchStatus::Completed);
}

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let (dispatcher, _, _) = dispatcher_with(MockScraper::new(), DispatcherConfig::default());
    let id = Uuid::new_v4();
    let err = dispatcher.status(id).await.unwrap_err();
    assert!(matches!(err, BatchError::NotFound { id: e } if e == id));
}

#[tokio::test]
async fn rejected_submission_creates_no_job() {
    let (dispatcher, store, _) = dispatcher_with(MockScraper::new(), DispatcherConfig::default());

    let err = dispatcher.submit(SubmitOptions::new(vec![])).await.unwrap_err();
    assert!(matches!(err, BatchError::Validation { .. }));
    assert_eq!(store.job_count(), 0);
}

#[tokio::test]
async fn per_job_concurrency_stays_under_the_limit() {
    let scraper = MockScraper::new().with_delay_for_all(Duration::from_millis(20));
    let config = DispatcherConfig {
        max_concurrent_items: 2,
        ..Default::default()
    };
    let (dispatcher, _, _) = dispatcher_with(scraper.clone(), config);

    let urls = (0..8).map(|i| format!("https://example.com/{i}")).collect();
    let outcome = dispatcher
        .submit(SubmitOptions::new(urls).with_mode(SubmitMode::Sync))
        .await
        .unwrap();
    let SubmitOutcome::Finished(job) = outcome else {
        panic!("expected sync submission to finish");
    };

    assert_eq!(job.completed_count, 8);
    assert_eq!(scraper.call_count(), 8);
    assert!(
        scraper.max_in_flight() <= 2,
        "observed {} concurrent scrapes with limit 2",
        scraper.max_in_flight()
    );
}

#[tokio::test]
async fn concurrent_jobs_do_not_corrupt_each_other() {
    let scraper = MockScraper::new().with_delay_for_all(Duration::from_millis(10));
    let config = DispatcherConfig {
        max_concurrent_items: 2,
        ..Default::default()
    };
    let (dispatcher, _, _) = dispatcher_with(scraper.clone(), config);

    let urls_a: Vec<String> = (0..6).map(|i| format!("https://a.example/{i}")).collect();
    let urls_b: Vec<String> = (0..6).map(|i| format!("https://b.example/{i}")).collect();

    let id_a = submitted_job_id(dispatcher.submit(SubmitOptions::new(urls_a.clone())).await.unwrap());
    let id_b = submitted_job_id(dispatcher.submit(SubmitOptions::new(urls_b.clone())).await.unwrap());

    let job_a = wait_terminal(&dispatcher, id_a).await;
    let job_b = wait_terminal(&dispatcher, id_b).await;

    assert_eq!(job_a.completed_count, 6);
    assert_eq!(job_b.completed_count, 6);
    for (item, url) in job_a.items.iter().zip(&urls_a) {
        assert_eq!(&item.url, url);
        assert_eq!(item.status, ItemStatus::Succeeded);
    }
    for (item, url) in job_b.items.iter().zip(&urls_b) {
        assert_eq!(&item.url, url);
    }

    // Two jobs with a per-job limit of 2 never exceed 4 in flight overall.
    assert!(scraper.max_in_flight() <= 4);
}
