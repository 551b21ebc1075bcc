//! End-to-end crawl scenarios

use crate::common::{
    assert_progress_invariants, child_path, child_url, doc_page, mount_page, mount_section,
    root_url, test_config, RecordingStore, DELAY_MS, SECTION_PATH,
};
use std::time::Duration;
use sumi_folio::state::JobUpdate;
use sumi_folio::storage::{ContentStore, JobFilter, JobTracker};
use sumi_folio::{Crawler, FolioError, JobStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawler(server: &MockServer) -> Crawler<RecordingStore> {
    Crawler::new(test_config(server), RecordingStore::new()).unwrap()
}

#[tokio::test]
async fn test_seven_urls_in_batches_of_three() {
    let server = MockServer::start().await;
    mount_section(&server, 6).await;
    let crawler = crawler(&server);

    let started = crawler.start_crawl("test").unwrap();
    let summary = started.handle.await.unwrap().unwrap();

    assert_eq!(summary.total, 7);
    assert_eq!(summary.success, 7);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.written, 7);

    let storage = crawler.storage();
    let store = storage.lock().unwrap();

    // started, one update per page, completed
    assert_eq!(store.updates.len(), 9);
    assert_eq!(
        store.updates[0].1,
        JobUpdate {
            status: Some(JobStatus::Running),
            total_urls: Some(7),
            started_at: store.updates[0].1.started_at,
            ..JobUpdate::default()
        }
    );
    assert!(store.updates[0].1.started_at.is_some());
    assert_eq!(store.updates[8].1.status, Some(JobStatus::Completed));

    let progress = store.progress_updates();
    let processed: Vec<u32> = progress
        .iter()
        .map(|(_, u)| u.urls_processed.unwrap())
        .collect();
    assert_eq!(processed, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_progress_invariants(&progress);

    // The inter-batch delay separates page 3 from page 4 and page 6 from page 7
    let delay = Duration::from_millis(DELAY_MS);
    assert!(progress[3].0.duration_since(progress[2].0) >= delay);
    assert!(progress[6].0.duration_since(progress[5].0) >= delay);

    let job = store.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_urls, 7);
    assert_eq!(job.urls_processed, 7);
    assert_eq!(job.items_scraped, 7);
    assert_eq!(job.urls_failed, 0);
    assert_eq!(job.progress_percentage, 100.0);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_some());
    assert!(job.error_message.is_none());
}

#[tokio::test]
async fn test_pages_are_stored_normalized() {
    let server = MockServer::start().await;
    mount_section(&server, 2).await;
    let crawler = crawler(&server);

    let started = crawler.start_crawl("test").unwrap();
    started.handle.await.unwrap().unwrap();

    let storage = crawler.storage();
    let store = storage.lock().unwrap();
    assert_eq!(store.count_content().unwrap(), 3);

    let page = store.get_content(&child_url(&server, 1)).unwrap().unwrap();
    assert_eq!(page.title, "Page 1");
    assert_eq!(page.category, "testing");
    assert!(page.content.contains("Some documentation text"));
    assert!(page.markdown.starts_with("# Page 1"));
    assert_eq!(page.code_snippets.len(), 1);
    assert_eq!(page.code_snippets[0].language, "js");
    assert_eq!(page.topics, vec!["Test", "page-1"]);
    assert!(page.keywords.contains(&"documentation".to_string()));
    assert_eq!(page.content_hash.len(), 64);
}

#[tokio::test]
async fn test_one_failing_page_is_isolated() {
    let server = MockServer::start().await;
    let root = format!(
        r#"<main class="main-page-content"><h1>Root</h1>
        <a href="{}">ok</a><a href="{}">missing</a></main>"#,
        child_path(1),
        child_path(2)
    );
    mount_page(&server, SECTION_PATH, 200, root).await;
    mount_page(&server, &child_path(1), 200, doc_page("Fine", "works")).await;
    mount_page(&server, &child_path(2), 404, "not found".to_string()).await;
    let crawler = crawler(&server);

    let started = crawler.start_crawl("test").unwrap();
    let summary = started.handle.await.unwrap().unwrap();

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);

    let storage = crawler.storage();
    let store = storage.lock().unwrap();
    assert_progress_invariants(&store.progress_updates());

    let job = store.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_scraped, 2);
    assert_eq!(job.urls_failed, 1);
    assert_eq!(job.urls_processed, 3);

    assert!(store.get_content(&root_url(&server)).unwrap().is_some());
    assert!(store.get_content(&child_url(&server, 1)).unwrap().is_some());
    assert!(store.get_content(&child_url(&server, 2)).unwrap().is_none());
}

#[tokio::test]
async fn test_recrawl_of_unchanged_section_writes_nothing() {
    let server = MockServer::start().await;
    mount_section(&server, 3).await;
    let crawler = crawler(&server);

    let first = crawler.start_crawl("test").unwrap();
    let first_summary = first.handle.await.unwrap().unwrap();
    assert_eq!(first_summary.written, 4);
    let upserts_after_first = crawler.storage().lock().unwrap().upserts;
    assert_eq!(upserts_after_first, 4);

    let second = crawler.start_crawl("test").unwrap();
    let second_summary = second.handle.await.unwrap().unwrap();
    assert_eq!(second_summary.written, 0);
    assert_eq!(second_summary.unchanged, 4);

    let storage = crawler.storage();
    let store = storage.lock().unwrap();
    assert_eq!(store.upserts, upserts_after_first);

    let job = store.get_job(second.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.items_scraped, 4);
    assert_eq!(job.progress_percentage, 100.0);
}

#[tokio::test]
async fn test_changed_page_is_rewritten() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        SECTION_PATH,
        200,
        doc_page("Root", "first version"),
    )
    .await;
    let crawler = crawler(&server);

    crawler.start_crawl("test").unwrap().handle.await.unwrap().unwrap();

    server.reset().await;
    mount_page(
        &server,
        SECTION_PATH,
        200,
        doc_page("Root", "second version"),
    )
    .await;

    let summary = crawler.start_crawl("test").unwrap().handle.await.unwrap().unwrap();
    assert_eq!(summary.written, 1);

    let storage = crawler.storage();
    let store = storage.lock().unwrap();
    let page = store.get_content(&root_url(&server)).unwrap().unwrap();
    assert!(page.content.contains("second version"));
    assert_eq!(store.count_content().unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_section_is_rejected() {
    let server = MockServer::start().await;
    let crawler = crawler(&server);

    let err = crawler.start_crawl("does-not-exist").unwrap_err();
    assert!(matches!(err, FolioError::UnknownSection(ref slug) if slug == "does-not-exist"));

    assert!(crawler.list_jobs(&JobFilter::default(), 10).unwrap().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_root_degrades_to_single_url() {
    let server = MockServer::start().await;
    mount_page(&server, SECTION_PATH, 503, "unavailable".to_string()).await;
    let crawler = crawler(&server);

    let started = crawler.start_crawl("test").unwrap();
    let summary = started.handle.await.unwrap().unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);

    let job = crawler.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_urls, 1);
    assert_eq!(job.urls_failed, 1);
    assert_eq!(job.progress_percentage, 100.0);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECTION_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, SECTION_PATH, 200, doc_page("Root", "eventually")).await;

    let mut config = test_config(&server);
    config.crawler.max_retries = 2;
    let crawler = Crawler::new(config, RecordingStore::new()).unwrap();

    let summary = crawler.start_crawl("test").unwrap().handle.await.unwrap().unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_failed_progress_writes_do_not_abort_the_crawl() {
    let server = MockServer::start().await;
    mount_section(&server, 2).await;

    let mut store = RecordingStore::new();
    store.fail_progress_updates = true;
    let crawler = Crawler::new(test_config(&server), store).unwrap();

    let started = crawler.start_crawl("test").unwrap();
    let summary = started.handle.await.unwrap().unwrap();
    assert_eq!(summary.success, 3);

    let job = crawler.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    // Progress under-reports when its writes are lost
    assert_eq!(job.urls_processed, 0);
    assert_eq!(crawler.storage().lock().unwrap().count_content().unwrap(), 3);
}

#[tokio::test]
async fn test_failed_content_write_counts_as_failed_page() {
    let server = MockServer::start().await;
    mount_section(&server, 2).await;

    let mut store = RecordingStore::new();
    store.fail_upsert_url = Some(child_url(&server, 2));
    let crawler = Crawler::new(test_config(&server), store).unwrap();

    let started = crawler.start_crawl("test").unwrap();
    let summary = started.handle.await.unwrap().unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 2);

    let job = crawler.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.urls_processed, 3);
    assert_eq!(job.items_scraped, 2);
    assert_eq!(job.urls_failed, 1);
    assert_eq!(job.urls_processed, job.items_scraped + job.urls_failed);

    let storage = crawler.storage();
    let store = storage.lock().unwrap();
    assert_progress_invariants(&store.progress_updates());
    assert_eq!(store.upserts, 2);
    assert!(store.get_content(&child_url(&server, 2)).unwrap().is_none());
    assert!(store.get_content(&child_url(&server, 1)).unwrap().is_some());
}

#[tokio::test]
async fn test_structural_failure_marks_job_failed() {
    let server = MockServer::start().await;
    mount_section(&server, 1).await;

    let mut store = RecordingStore::new();
    store.fail_start_update = true;
    let crawler = Crawler::new(test_config(&server), store).unwrap();

    let started = crawler.start_crawl("test").unwrap();
    let result = started.handle.await.unwrap();
    assert!(matches!(result, Err(FolioError::Storage(_))));

    let job = crawler.get_job(started.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .unwrap()
        .contains("start write rejected"));
    assert!(job.completed_at.is_some());
    assert_eq!(job.urls_processed, 0);
}

#[tokio::test]
async fn test_progress_is_observable_while_running() {
    let server = MockServer::start().await;
    mount_section(&server, 6).await;
    let crawler = crawler(&server);

    let started = crawler.start_crawl("test").unwrap();

    let mut observed = Vec::new();
    loop {
        let job = crawler.get_job(started.job_id).unwrap();
        assert_eq!(job.urls_processed, job.items_scraped + job.urls_failed);
        assert!((0.0..=100.0).contains(&job.progress_percentage));
        observed.push(job.progress_percentage);

        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(observed.last().copied(), Some(100.0));
    assert!(started.handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_jobs_are_listed_most_recent_first() {
    let server = MockServer::start().await;
    mount_section(&server, 0).await;
    let crawler = crawler(&server);

    let first = crawler.start_crawl("test").unwrap();
    first.handle.await.unwrap().unwrap();
    let second = crawler.start_crawl("test").unwrap();
    second.handle.await.unwrap().unwrap();

    let jobs = crawler.list_jobs(&JobFilter::default(), 10).unwrap();
    let ids: Vec<i64> = jobs.iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![second.job_id, first.job_id]);

    let filter = JobFilter {
        status: Some(JobStatus::Completed),
        section: Some("test".to_string()),
    };
    assert_eq!(crawler.list_jobs(&filter, 1).unwrap().len(), 1);

    let filter = JobFilter {
        status: Some(JobStatus::Failed),
        section: None,
    };
    assert!(crawler.list_jobs(&filter, 10).unwrap().is_empty());
}
