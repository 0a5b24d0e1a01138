//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Stack Exchange API, the ROS
//! package index and wiki, and a Discourse forum, and run full crawls
//! end-to-end.

use qa_harvest::config::{
    Config, CrawlMode, CrawlerConfig, ForumConfig, IndexConfig, InputConfig, OutputConfig,
    ProviderConfig, UserAgentConfig, WikiConfig,
};
use qa_harvest::crawler::{crawl, Coordinator, ShutdownHandle, StopReason};
use qa_harvest::output::{MemorySink, OutputRecord, RunSummary};
use qa_harvest::storage::read_missing;
use qa_harvest::SourceRecord;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(api_base: &str, mode: CrawlMode, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            mode,
            max_concurrent_requests: 2,
            minimum_delay: 0, // No pacing in tests
            maximum_delay: 50,
            throttle_step: 10,
            max_retries: 2,
            retry_delay: 1,
            request_timeout: 2000,
            batch_size: 100,
            max_pages: None,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvest".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        provider: ProviderConfig {
            api_base: api_base.to_string(),
            site: "stackoverflow".to_string(),
            tagged: Some("ros".to_string()),
            page_size: 50,
            listing_filter: "default".to_string(),
            detail_filter: "withbody".to_string(),
            fetch_answers: true,
            key: None,
            id_patterns: vec!["questions".to_string(), "question".to_string()],
        },
        index: IndexConfig {
            base: api_base.to_string(),
            distro: "humble".to_string(),
        },
        wiki: WikiConfig {
            base: format!("{}/wiki", api_base),
            versions: vec!["noetic".to_string(), "melodic".to_string()],
        },
        forum: ForumConfig {
            base: api_base.to_string(),
            category: "ng-ros".to_string(),
        },
        input: InputConfig::default(),
        output: OutputConfig {
            records_path: dir.path().join("records.jsonl").to_string_lossy().into_owned(),
            missing_path: dir.path().join("missing.json").to_string_lossy().into_owned(),
        },
    }
}

fn question_url(id: u64) -> String {
    format!("https://stackoverflow.com/questions/{}/q{}", id, id)
}

fn question(id: u64, answer_count: u32) -> serde_json::Value {
    json!({
        "question_id": id,
        "title": format!("Question {}", id),
        "link": question_url(id),
        "creation_date": 1_700_000_000,
        "answer_count": answer_count,
        "body": format!("<p>Body {}</p><pre><code>rosrun pkg{}</code></pre>", id, id),
        "owner": { "display_name": format!("user{}", id) }
    })
}

fn page(items: Vec<serde_json::Value>, has_more: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "items": items,
        "has_more": has_more,
        "quota_remaining": 9000
    }))
}

/// Writes a JSON array of `{"url": ...}` records and returns its path
fn write_sources(dir: &TempDir, name: &str, ids: &[u64]) -> String {
    let records: Vec<_> = ids.iter().map(|id| json!({ "url": question_url(*id) })).collect();
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

async fn run(config: Config) -> (RunSummary, Vec<OutputRecord>, Vec<SourceRecord>) {
    run_with_shutdown(config, ShutdownHandle::new()).await
}

async fn run_with_shutdown(
    config: Config,
    shutdown: ShutdownHandle,
) -> (RunSummary, Vec<OutputRecord>, Vec<SourceRecord>) {
    let missing_path = config.output.missing_path.clone();
    let sink = MemorySink::new();
    let mut coordinator = Coordinator::new(config, Box::new(sink.clone()))
        .expect("Failed to create coordinator")
        .with_shutdown(shutdown);

    let summary = coordinator.run().await.expect("Crawl failed");
    let missing = read_missing(Path::new(&missing_path)).expect("Missing file not written");
    (summary, sink.records(), missing)
}

fn identifiers(records: &[SourceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.identifier.as_str()).collect()
}

fn questions(records: &[OutputRecord]) -> Vec<qa_harvest::output::QuestionRecord> {
    records
        .iter()
        .map(|r| match r {
            OutputRecord::Question(q) => q.clone(),
            other => panic!("expected a question record, got {:?}", other),
        })
        .collect()
}

#[tokio::test]
async fn test_provider_omission_marks_missing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/10;20;30"))
        .and(query_param("pagesize", "3"))
        .respond_with(page(vec![question(20, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[10, 20, 30]));

    let (summary, records, missing) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), question_url(20));
    assert_eq!(identifiers(&missing), vec!["10", "30"]);
    assert_eq!(missing[0].source_url, question_url(10));

    assert_eq!(summary.ids_dispatched, 3);
    assert_eq!(summary.records_emitted, 1);
    assert_eq!(summary.missing, 2);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_revisit_emits_owner_records() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut orphan = question(2, 0);
    orphan["owner"] = json!({ "user_type": "does_not_exist" });

    Mock::given(method("GET"))
        .and(path("/questions/1;2"))
        .respond_with(page(vec![orphan, question(1, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    // Duplicate and malformed sources are collapsed before batching
    let sources = dir.path().join("sources.jsonl");
    std::fs::write(
        &sources,
        format!(
            "{{\"url\":\"{}\"}}\n{{\"url\":\"{}\"}}\n{{\"url\":\"https://stackoverflow.com/users/9\"}}\n{{\"url\":\"{}\"}}\n",
            question_url(1),
            question_url(2),
            question_url(1)
        ),
    )
    .unwrap();
    config.input.source_path = Some(sources.to_string_lossy().into_owned());

    let (summary, records, missing) = run(config).await;

    assert!(missing.is_empty());
    assert_eq!(summary.malformed_skipped, 1);
    assert_eq!(summary.duplicates_skipped, 1);

    let owners: Vec<_> = records
        .iter()
        .map(|r| match r {
            OutputRecord::Owner(owner) => (owner.url.clone(), owner.user.clone()),
            other => panic!("expected an owner record, got {:?}", other),
        })
        .collect();
    assert_eq!(
        owners,
        vec![
            (question_url(1), Some("user1".to_string())),
            (question_url(2), None),
        ]
    );
}

#[tokio::test]
async fn test_pagination_stops_after_last_page() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    for (page_number, ids, has_more) in [
        ("1", vec![1, 2], true),
        ("2", vec![3, 4], true),
        ("3", vec![5], false),
    ] {
        Mock::given(method("GET"))
            .and(path("/questions"))
            .and(query_param("page", page_number))
            .and(query_param("tagged", "ros"))
            .respond_with(page(ids.iter().map(|id| question(*id, 0)).collect(), has_more))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page", "4"))
        .respond_with(page(vec![question(6, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    for (batch, ids) in [("/questions/1;2", vec![1, 2]), ("/questions/3;4", vec![3, 4]), ("/questions/5", vec![5])] {
        Mock::given(method("GET"))
            .and(path(batch))
            .respond_with(page(ids.iter().map(|id| question(*id, 0)).collect(), false))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    let (summary, records, missing) = run(config).await;

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.stop_reason, Some(StopReason::Exhausted));
    assert_eq!(records.len(), 5);
    assert!(missing.is_empty());

    let mut urls: Vec<_> = records.iter().map(|r| r.url().to_string()).collect();
    urls.sort();
    assert_eq!(urls, (1..=5).map(question_url).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_resumption_skips_collected_identifiers() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page", "1"))
        .respond_with(page(vec![question(42, 0), question(43, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/43"))
        .respond_with(page(vec![question(43, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/42;43"))
        .respond_with(page(vec![question(42, 0), question(43, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    config.input.dataset_path = Some(write_sources(&dir, "dataset.json", &[42]));

    let (summary, records, _) = run(config).await;

    assert_eq!(summary.ids_dispatched, 1);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), question_url(43));
}

#[tokio::test]
async fn test_answers_follow_up_completes_record() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(page(vec![question(7, 2), question(8, 0)], false))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/7;8"))
        .respond_with(page(vec![question(7, 2), question(8, 0)], false))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/7/answers"))
        .and(query_param("page", "1"))
        .respond_with(page(
            vec![json!({
                "answer_id": 70,
                "question_id": 7,
                "body": "<p>Source <code>setup.bash</code> first</p>"
            })],
            true,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/7/answers"))
        .and(query_param("page", "2"))
        .respond_with(page(
            vec![json!({ "answer_id": 71, "question_id": 7, "body": "<p>Reinstall</p>" })],
            false,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/8/answers"))
        .respond_with(page(vec![], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    let (summary, records, missing) = run(config).await;

    assert!(missing.is_empty());
    assert!(summary.is_balanced());

    let mut records = questions(&records);
    records.sort_by(|a, b| a.url.cmp(&b.url));
    assert_eq!(records.len(), 2);

    let with_answers = &records[0];
    assert_eq!(with_answers.url, question_url(7));
    assert_eq!(with_answers.title, "Question 7");
    assert_eq!(with_answers.time, "2023-11-14 22:13:20");
    assert_eq!(with_answers.post_content, vec!["Body 7rosrun pkg7"]);
    assert_eq!(with_answers.question_code, vec!["rosrun pkg7"]);
    assert_eq!(with_answers.answer, vec!["Source setup.bash first", "Reinstall"]);
    assert_eq!(with_answers.answer_code, vec!["setup.bash"]);

    assert!(records[1].answer.is_empty());
    assert!(records[1].answer_code.is_empty());
}

#[tokio::test]
async fn test_failed_follow_up_marks_question_missing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(page(vec![question(7, 1)], false))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/7"))
        .respond_with(page(vec![question(7, 1)], false))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/7/answers"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    let (summary, records, missing) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(identifiers(&missing), vec!["7"]);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_timeouts_stop_after_retry_limit() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/1;2"))
        .respond_with(page(vec![question(1, 0)], false).set_delay(Duration::from_millis(500)))
        .expect(3) // first attempt plus two retries
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.crawler.request_timeout = 100;
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[1, 2]));

    let (summary, records, missing) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(identifiers(&missing), vec!["1", "2"]);
    assert_eq!(summary.requests, 1);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/5"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/5"))
        .respond_with(page(vec![question(5, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[5]));

    let (summary, records, missing) = run(config).await;

    assert_eq!(records.len(), 1);
    assert!(missing.is_empty());
    assert_eq!(summary.records_emitted, 1);
}

#[tokio::test]
async fn test_provider_error_marks_batch_missing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_id": 400,
            "error_name": "bad_parameter",
            "error_message": "ids"
        })))
        .expect(1) // not retried
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/2"))
        .respond_with(page(vec![question(2, 0)], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.crawler.batch_size = 1;
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[1, 2]));

    let (summary, records, missing) = run(config).await;

    assert_eq!(summary.batches_dispatched, 2);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), question_url(2));
    assert_eq!(identifiers(&missing), vec!["1"]);
}

#[tokio::test]
async fn test_quota_exhaustion_stops_dispatch() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [question(1, 0)],
            "has_more": true,
            "quota_remaining": 0
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions"))
        .and(query_param("page", "2"))
        .respond_with(page(vec![question(2, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/1"))
        .respond_with(page(vec![question(1, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    let (summary, records, missing) = run(config).await;

    assert_eq!(summary.stop_reason, Some(StopReason::QuotaExhausted));
    assert_eq!(summary.ids_undispatched, 1);
    assert!(records.is_empty());
    assert!(missing.is_empty());
}

#[tokio::test]
async fn test_shutdown_before_start_dispatches_nothing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions"))
        .respond_with(page(vec![question(1, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), CrawlMode::Harvest, &dir);
    let shutdown = ShutdownHandle::new();
    shutdown.request();

    let (summary, records, missing) = run_with_shutdown(config, shutdown).await;

    assert_eq!(summary.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(summary.requests, 0);
    assert!(records.is_empty());
    assert!(missing.is_empty());
}

#[tokio::test]
async fn test_crawl_appends_records_file() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/3"))
        .respond_with(page(vec![question(3, 0)], false))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[3]));
    let records_path = config.output.records_path.clone();

    let summary = crawl(config.clone()).await.expect("Crawl failed");
    assert_eq!(summary.records_emitted, 1);

    let content = std::fs::read_to_string(&records_path).unwrap();
    assert_eq!(
        content.trim(),
        format!(r#"{{"url":"{}","user":"user3"}}"#, question_url(3))
    );

    // The records file doubles as the next run's dataset
    config.input.dataset_path = Some(records_path);
    let summary = crawl(config).await.expect("Second crawl failed");
    assert_eq!(summary.ids_dispatched, 0);
    assert_eq!(summary.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_interrupt_drains_in_flight_batch() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/1;2"))
        .respond_with(page(vec![question(2, 0)], false).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/questions/3"))
        .respond_with(page(vec![question(3, 0)], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.crawler.batch_size = 2;
    config.crawler.max_concurrent_requests = 1;
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[1, 2, 3]));
    let missing_path = config.output.missing_path.clone();

    let shutdown = ShutdownHandle::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        interrupt.request();
    });

    let (summary, records, missing) = run_with_shutdown(config, shutdown).await;

    // The batch in flight at the interrupt still completes
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), question_url(2));
    assert_eq!(identifiers(&missing), vec!["1"]);
    assert_eq!(missing[0].source_url, question_url(1));

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&missing_path).unwrap()).unwrap();
    assert_eq!(on_disk.as_array().map(Vec::len), Some(1));

    assert_eq!(summary.stop_reason, Some(StopReason::Cancelled));
    assert_eq!(summary.ids_undispatched, 1);
    assert_eq!(summary.requests, 1);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_persistent_throttling_marks_batch_missing() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/questions/1"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3) // first attempt plus two retries
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), CrawlMode::Revisit, &dir);
    config.input.source_path = Some(write_sources(&dir, "sources.json", &[1]));

    let (summary, records, missing) = run(config).await;

    assert!(records.is_empty());
    assert_eq!(identifiers(&missing), vec!["1"]);
    assert_eq!(summary.throttle_hits, 3);
    assert_eq!(summary.requests, 1);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_index_emits_package_records() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search/packages/data.humble.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "tf2",
                "url": "/p/tf2/#humble",
                "authors": ["Tully Foote", "Eitan Marder-Eppstein"],
                "last_commit_time": "2024-05-01T10:00:00Z"
            },
            { "url": "/p/rclcpp/#humble", "authors": "William Woodall" },
            { "url": "/p/nav2_core/#humble" },
            { "url": "/p/tf2/#humble-dev" },
            { "url": "/r/geometry2/" },
            { "url": "/p/collected/#humble" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dataset = dir.path().join("dataset.json");
    std::fs::write(
        &dataset,
        json!([{ "url": format!("{}/p/collected/", base) }]).to_string(),
    )
    .unwrap();

    let mut config = create_test_config(&base, CrawlMode::Index, &dir);
    config.input.dataset_path = Some(dataset.to_string_lossy().into_owned());

    let (summary, records, missing) = run(config).await;

    let packages: Vec<_> = records
        .iter()
        .map(|r| match r {
            OutputRecord::Package(p) => (p.url.clone(), p.time.clone(), p.user.clone()),
            other => panic!("expected a package record, got {:?}", other),
        })
        .collect();
    assert_eq!(
        packages,
        vec![
            (
                format!("{}/p/tf2/", base),
                "2024-05-01T10:00:00Z".to_string(),
                "Tully Foote, Eitan Marder-Eppstein".to_string()
            ),
            (
                format!("{}/p/rclcpp/", base),
                "N/A".to_string(),
                "William Woodall".to_string()
            ),
            (
                format!("{}/p/nav2_core/", base),
                "N/A".to_string(),
                "N/A".to_string()
            ),
        ]
    );

    assert!(missing.is_empty());
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.requests, 1);
    assert_eq!(summary.duplicates_skipped, 2);
    assert_eq!(summary.malformed_skipped, 1);
    assert_eq!(summary.stop_reason, Some(StopReason::Exhausted));
    assert!(summary.is_balanced());
}

fn wiki_page(package: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"<html><body><div id="content">
            <div class="version noetic"><p id="package-info-{0}">{0} summary</p></div>
            <p class="line867">Maintainer: someone</p>
        </div></body></html>"#,
        package
    ))
}

#[tokio::test]
async fn test_wiki_pages_from_package_list() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search/packages/data.humble.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "url": "/p/tf2/#humble" },
            { "url": "/p/rclcpp/#humble" },
            { "url": "/p/ghost/#humble" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    for package in ["tf2", "rclcpp"] {
        Mock::given(method("GET"))
            .and(path(format!("/wiki/{}", package)))
            .respond_with(wiki_page(package))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/wiki/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base, CrawlMode::Wiki, &dir);
    let (summary, records, missing) = run(config).await;

    let mut pages: Vec<_> = records
        .iter()
        .map(|r| match r {
            OutputRecord::Wiki(w) => w.clone(),
            other => panic!("expected a wiki record, got {:?}", other),
        })
        .collect();
    pages.sort_by(|a, b| a.package.cmp(&b.package));

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].package, "rclcpp");
    assert_eq!(pages[1].url, format!("{}/wiki/tf2", base));
    assert_eq!(pages[1].package_summary, vec!["tf2 summary"]);
    assert_eq!(pages[1].package_details, vec!["Maintainer: someone"]);

    assert_eq!(identifiers(&missing), vec!["ghost"]);
    assert_eq!(summary.batches_dispatched, 3);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_wiki_pages_from_source_file() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/search/packages/data.humble.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/wiki/tf2"))
        .respond_with(wiki_page("tf2"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sources = dir.path().join("urls.json");
    std::fs::write(&sources, r#"["/p/tf2/#humble", "/p/tf2/#noetic"]"#).unwrap();

    let mut config = create_test_config(&base, CrawlMode::Wiki, &dir);
    config.input.source_path = Some(sources.to_string_lossy().into_owned());

    let (summary, records, missing) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), format!("{}/wiki/tf2", base));
    assert!(missing.is_empty());
    assert_eq!(summary.duplicates_skipped, 1);
}

fn topics(entries: &[(u64, &str)], more: bool) -> ResponseTemplate {
    let topics: Vec<_> = entries
        .iter()
        .map(|(id, slug)| json!({ "id": id, "slug": slug, "title": format!("Topic {}", id) }))
        .collect();
    let mut body = json!({ "topic_list": { "topics": topics } });
    if more {
        body["topic_list"]["more_topics_url"] = json!("/c/ng-ros/12?page=1");
    }
    ResponseTemplate::new(200).set_body_json(body)
}

fn topic(id: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": id,
        "title": format!("Topic {}", id),
        "post_stream": { "posts": [
            { "cooked": format!("<p>Post {}</p><ul><li>detail {}</li></ul>", id, id) },
            { "cooked": "<p>Reply</p>" }
        ] }
    }))
}

#[tokio::test]
async fn test_forum_category_topics() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/categories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "category_list": { "categories": [
                { "id": 3, "slug": "general", "name": "General" },
                { "id": 12, "slug": "ng-ros", "name": "Next Generation ROS" }
            ] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    for (page_number, entries) in [("0", vec![(1, "a"), (2, "b")]), ("1", vec![(3, "c")])] {
        Mock::given(method("GET"))
            .and(path("/c/ng-ros/12.json"))
            .and(query_param("page", page_number))
            .respond_with(topics(&entries, true))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/c/ng-ros/12.json"))
        .and(query_param("page", "2"))
        .respond_with(topics(&[(4, "d")], false))
        .expect(0)
        .mount(&mock_server)
        .await;

    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/t/{}.json", id)))
            .respond_with(topic(id))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/t/3.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base, CrawlMode::Forum, &dir);
    config.crawler.max_pages = Some(2);

    let (summary, records, missing) = run(config).await;

    let mut threads: Vec<_> = records
        .iter()
        .map(|r| match r {
            OutputRecord::Topic(t) => t.clone(),
            other => panic!("expected a topic record, got {:?}", other),
        })
        .collect();
    threads.sort_by(|a, b| a.url.cmp(&b.url));

    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].url, format!("{}/t/a/1", base));
    assert_eq!(threads[0].title, "Topic 1");
    assert_eq!(threads[0].thread_contents, vec!["Post 1", "Reply"]);
    assert_eq!(threads[0].thread_details, vec!["detail 1"]);

    assert_eq!(identifiers(&missing), vec!["3"]);
    assert_eq!(missing[0].source_url, format!("{}/t/c/3", base));

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.stop_reason, Some(StopReason::PageCeiling));
    assert_eq!(summary.requests, 6);
    assert!(summary.is_balanced());
}

#[tokio::test]
async fn test_forum_unknown_category_lists_latest() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/categories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "category_list": { "categories": [
                { "id": 3, "slug": "general", "name": "General" }
            ] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .and(query_param("page", "0"))
        .respond_with(topics(&[(4, "old"), (5, "new")], false))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/t/5.json"))
        .respond_with(topic(5))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/t/4.json"))
        .respond_with(topic(4))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dataset = dir.path().join("dataset.json");
    std::fs::write(
        &dataset,
        json!([{ "url": format!("{}/t/old/4", base) }]).to_string(),
    )
    .unwrap();

    let mut config = create_test_config(&base, CrawlMode::Forum, &dir);
    config.forum.category = "ros-projects".to_string();
    config.input.dataset_path = Some(dataset.to_string_lossy().into_owned());

    let (summary, records, missing) = run(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url(), format!("{}/t/new/5", base));
    assert!(missing.is_empty());
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.stop_reason, Some(StopReason::Exhausted));
}
