//! End-to-end flows through the dispatcher with every collaborator mocked.
//!
//! These tests cover:
//! - Acquisition fallback from a missing binary to its module form
//! - Page-scan delivery when every extractor reports the URL unsupported
//! - Oversized video escalation down to a single capped send
//! - Index browsing over grouped gallery output
//! - Expiry of jobs and item tokens

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use mediafetch_core::{
    acquire::AcquireConfig,
    config::CredentialsConfig,
    converter::ConverterConfig,
    dispatch::{messages, DispatchConfig, IncomingCallback, IncomingMessage},
    media::{DeliveryConfig, DeliveryMode},
    store::{EvictionPolicy, JobState, SourceRef},
    testing::{
        CallKind, MockConverter, MockFetcher, MockResponse, MockRunner, MockTransport,
        TransportCall,
    },
    transport::{MediaSource, MessageRef, TransportError},
    AcquisitionPipeline, Dispatcher, JobStore, MediaPipeline, NoneAuthenticator, TokenStore,
};

const CHAT: i64 = 42;

struct TestHarness {
    root: TempDir,
    runner: MockRunner,
    fetcher: MockFetcher,
    converter: MockConverter,
    transport: MockTransport,
    dispatcher: Dispatcher,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_policies(EvictionPolicy::unbounded(), EvictionPolicy::unbounded())
    }

    fn with_policies(jobs: EvictionPolicy, tokens: EvictionPolicy) -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let runner = MockRunner::new();
        let fetcher = MockFetcher::new();
        let converter = MockConverter::new();
        let transport = MockTransport::new();

        let acquisition = AcquisitionPipeline::new(
            AcquireConfig::default(),
            CredentialsConfig::default(),
            Arc::new(runner.clone()),
            Arc::new(fetcher.clone()),
        );
        let media = MediaPipeline::new(
            DeliveryConfig::default(),
            ConverterConfig::default(),
            Arc::new(converter.clone()),
            Arc::new(transport.clone()),
        );
        let dispatcher = Dispatcher::new(
            DispatchConfig::default(),
            Arc::new(NoneAuthenticator::new()),
            Arc::new(acquisition),
            Arc::new(media),
            Arc::new(JobStore::new(root.path(), jobs)),
            Arc::new(TokenStore::new(tokens, false)),
        );

        Self {
            root,
            runner,
            fetcher,
            converter,
            transport,
            dispatcher,
        }
    }

    /// Sends `url` and returns the new job's id from the mode menu.
    async fn submit(&self, url: &str) -> String {
        self.dispatcher
            .handle_message(&IncomingMessage {
                chat_id: CHAT,
                user_id: Some(7),
                text: url.to_string(),
            })
            .await
            .expect("message handled");

        let calls = self.transport.calls().await;
        let menu = calls
            .iter()
            .rev()
            .find_map(|c| c.keyboard())
            .expect("mode menu sent");
        let data = &menu.buttons().next().expect("menu has buttons").data;
        data.split(':').nth(1).expect("job id in payload").to_string()
    }

    async fn press(&self, data: &str) {
        self.dispatcher
            .handle_callback(&IncomingCallback {
                id: "cb".to_string(),
                chat_id: CHAT,
                user_id: Some(7),
                message: Some(MessageRef::new(CHAT, 5)),
                data: data.to_string(),
            })
            .await
            .expect("callback handled");
    }

    fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.path().join(job_id)
    }

    async fn last_text(&self) -> String {
        self.transport
            .texts()
            .await
            .pop()
            .expect("at least one text")
    }
}

fn remote_sources(calls: &[TransportCall]) -> Vec<String> {
    calls
        .iter()
        .filter_map(|c| match c.source() {
            Some(MediaSource::Remote(url)) => Some(url.clone()),
            _ => None,
        })
        .collect()
}

fn local_sources(calls: &[TransportCall]) -> Vec<PathBuf> {
    calls
        .iter()
        .filter_map(|c| match c.source() {
            Some(MediaSource::Local(path)) => Some(path.clone()),
            _ => None,
        })
        .collect()
}

fn sparse_file(path: &Path, len: u64) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    file.set_len(len).unwrap();
}

// =============================================================================
// Acquisition
// =============================================================================

#[tokio::test]
async fn test_missing_binary_falls_back_to_module() {
    let h = TestHarness::new();
    let job_id = h.submit("https://gallery.example/post/1").await;
    let dir = h.job_dir(&job_id);

    h.runner.on("gallery-dl", MockResponse::not_found()).await;
    h.runner
        .on(
            "python3 -m gallery_dl",
            MockResponse::success().with_file(dir.join("a.jpg"), vec![1u8; 4]),
        )
        .await;

    h.press(&format!("pre:{}:orig", job_id)).await;

    assert_eq!(
        h.runner.called_keys().await,
        vec!["gallery-dl", "python3 -m gallery_dl"]
    );
    assert_eq!(h.transport.delivered_of(CallKind::Photo).await.len(), 1);
    assert_eq!(h.last_text().await, messages::delivery_summary(1, 0));
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_ytdlp_success_after_gallery_failure_is_noted() {
    let h = TestHarness::new();
    let job_id = h.submit("https://video.example/watch?v=1").await;
    let dir = h.job_dir(&job_id);

    h.runner.on("gallery-dl", MockResponse::exit(1, "no extractor")).await;
    h.runner
        .on(
            "yt-dlp",
            MockResponse::success().with_file(dir.join("Talk [abc].mp4"), vec![0u8; 16]),
        )
        .await;

    h.press(&format!("pre:{}:orig", job_id)).await;

    let texts = h.transport.texts().await;
    assert!(texts.contains(&messages::fallback_used("yt-dlp")));
    assert_eq!(h.transport.delivered_of(CallKind::Video).await.len(), 1);
}

#[tokio::test]
async fn test_unsupported_url_falls_back_to_page_scan() {
    let h = TestHarness::new();
    let url = "https://blog.example/article";
    let job_id = h.submit(url).await;

    h.runner
        .on("gallery-dl", MockResponse::exit(1, "[error] Unsupported URL 'https://blog.example/article'"))
        .await;
    h.runner
        .on("yt-dlp", MockResponse::exit(1, "ERROR: Unsupported URL: https://blog.example/article"))
        .await;
    h.fetcher
        .set_page(
            url,
            r#"<img src="https://cdn.example/a.jpg"><img src="https://cdn.example/b.jpg">
               <img src="https://cdn.example/a.jpg">"#,
        )
        .await;

    h.press(&format!("pre:{}:orig", job_id)).await;

    let photos = h.transport.delivered_of(CallKind::Photo).await;
    assert_eq!(
        remote_sources(&photos),
        vec!["https://cdn.example/a.jpg", "https://cdn.example/b.jpg"]
    );
    assert_eq!(h.last_text().await, messages::scrape_summary(2));
    assert!(h.last_text().await.contains("Sent 2"));
    assert!(!h.job_dir(&job_id).exists());
    assert!(h.dispatcher.jobs().get(&job_id).await.is_none());
}

#[tokio::test]
async fn test_rejected_remote_link_is_posted_as_text() {
    let h = TestHarness::new();
    let url = "https://blog.example/one";
    let job_id = h.submit(url).await;

    h.runner.on("gallery-dl", MockResponse::exit(1, "Unsupported URL")).await;
    h.runner.on("yt-dlp", MockResponse::exit(1, "Unsupported URL")).await;
    h.fetcher
        .set_page(url, r#"<video src="https://cdn.example/v.mp4"></video>"#)
        .await;
    h.transport
        .fail_next(CallKind::Video, TransportError::Rejected("wrong type".into()))
        .await;

    h.press(&format!("pre:{}:orig", job_id)).await;

    let texts = h.transport.texts().await;
    assert!(texts.contains(&"https://cdn.example/v.mp4".to_string()));
    assert_eq!(h.last_text().await, messages::scrape_summary(1));
}

// =============================================================================
// Delivery escalation
// =============================================================================

#[tokio::test]
async fn test_oversized_video_is_recompressed_once() {
    let h = TestHarness::new();
    let job_id = h.submit("https://video.example/big").await;
    let dir = h.job_dir(&job_id);

    // 120 MB source already on disk: the first send is refused, the capped
    // re-encode goes through.
    sparse_file(&dir.join("big.mp4"), 120 * 1024 * 1024);
    h.runner.on("gallery-dl", MockResponse::success()).await;
    h.transport
        .fail_next(CallKind::Video, TransportError::TooLarge("Request Entity Too Large".into()))
        .await;

    h.press(&format!("pre:{}:orig", job_id)).await;

    let videos = h.transport.delivered_of(CallKind::Video).await;
    assert_eq!(local_sources(&videos), vec![dir.join("big.capped.mp4")]);
    assert!(h
        .converter
        .operation_labels()
        .await
        .contains(&"size_capped"));
    assert_eq!(h.last_text().await, messages::delivery_summary(1, 0));
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_escalation_target_for_large_source() {
    let config = DeliveryConfig::default();
    let size = 120 * 1024 * 1024;
    assert_eq!(config.escalation_target(size), config.compress_target_bytes);
    assert!(config.escalation_target(10 * 1024 * 1024) < 10 * 1024 * 1024);
}

// =============================================================================
// Index browsing
// =============================================================================

#[tokio::test]
async fn test_index_browse_and_send_post() {
    let h = TestHarness::new();
    let job_id = h.submit("https://gallery.example/user/someone").await;
    let dir = h.job_dir(&job_id);

    h.runner
        .on(
            "gallery-dl",
            MockResponse::success()
                .with_file(dir.join("setA/site_user_100_0.jpg"), vec![1u8])
                .with_file(dir.join("setA/site_user_100_1.jpg"), vec![1u8])
                .with_file(dir.join("setA/site_user_200_0.jpg"), vec![1u8])
                .with_file(dir.join("setB/x.jpg"), vec![1u8]),
        )
        .await;

    h.press(&format!("pre:{}:idx", job_id)).await;

    let job = h.dispatcher.jobs().get(&job_id).await.expect("job kept");
    assert_eq!(job.state, JobState::Indexed);
    let index = job.index.expect("index built");
    assert_eq!(index.groups.len(), 2);
    assert_eq!(index.groups[0].name, "setA");
    let posts: Vec<(&str, usize)> = index.groups[0]
        .posts
        .iter()
        .map(|p| (p.id.as_str(), p.files.len()))
        .collect();
    assert_eq!(posts, vec![("100", 2), ("200", 1)]);
    assert_eq!(index.groups[1].name, "setB");
    assert_eq!(index.groups[1].posts[0].id, "misc");

    // Nothing is delivered until asked.
    assert!(h.transport.delivered_of(CallKind::Photo).await.is_empty());

    h.press(&format!("jp:{}:0:0", job_id)).await;
    let edits = h.transport.delivered_of(CallKind::Edit).await;
    assert!(edits.last().unwrap().text().unwrap().contains("Post 100"));

    h.press(&format!("ap:{}:0:0:orig", job_id)).await;
    assert_eq!(h.transport.delivered_of(CallKind::Photo).await.len(), 2);
    assert!(!dir.join("setA/site_user_100_0.jpg").exists());
    assert!(dir.join("setA/site_user_200_0.jpg").exists());

    // The group send skips what the post send already delivered.
    h.press(&format!("ag:{}:0:orig", job_id)).await;
    assert_eq!(h.transport.delivered_of(CallKind::Photo).await.len(), 3);
    assert_eq!(h.last_text().await, messages::bulk_done(1, 1, "setA"));
    assert!(h.dispatcher.jobs().get(&job_id).await.is_some());

    // Cleaning the last group leaves nothing to browse.
    h.press(&format!("clg:{}:1", job_id)).await;
    assert_eq!(h.last_text().await, messages::group_cleaned(1, "setB"));
    assert!(h.dispatcher.jobs().get(&job_id).await.is_none());
    assert!(!dir.exists());
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn test_evicted_job_answers_expired_without_work() {
    let h = TestHarness::with_policies(
        EvictionPolicy::unbounded().with_capacity(1),
        EvictionPolicy::unbounded(),
    );
    let first = h.submit("https://a.example/1").await;
    let second = h.submit("https://a.example/2").await;
    assert!(h.dispatcher.jobs().get(&first).await.is_none());
    assert!(h.dispatcher.jobs().get(&second).await.is_some());

    let before = h.transport.call_count().await;
    h.press(&format!("pre:{}:orig", first)).await;

    let calls = h.transport.calls().await;
    assert_eq!(calls.len(), before + 1);
    assert_eq!(
        calls.last().unwrap(),
        &TransportCall::Answer {
            callback_id: "cb".to_string(),
            text: Some(messages::EXPIRED.to_string()),
        }
    );
    assert!(h.runner.calls().await.is_empty());
}

#[tokio::test]
async fn test_expired_token_answers_expired() {
    let h = TestHarness::with_policies(
        EvictionPolicy::unbounded(),
        EvictionPolicy::unbounded().with_ttl(Duration::from_secs(0)),
    );
    let token = h
        .dispatcher
        .tokens()
        .issue(SourceRef::Direct("https://cdn.example/v.mp4".into()), CHAT, None)
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    h.press(&format!("va:{}:{}", token, DeliveryMode::Hd.code())).await;

    assert_eq!(
        h.transport.calls().await,
        vec![TransportCall::Answer {
            callback_id: "cb".to_string(),
            text: Some(messages::EXPIRED.to_string()),
        }]
    );
    assert!(h.fetcher.requests().await.is_empty());
}

#[tokio::test]
async fn test_failed_page_token_reports_and_cleans_scratch() {
    let h = TestHarness::new();
    let token = h
        .dispatcher
        .tokens()
        .issue(
            SourceRef::Page("https://video.example/watch?v=9".into()),
            CHAT,
            Some("cap".into()),
        )
        .await;

    h.runner.on("gallery-dl", MockResponse::exit(1, "nothing")).await;
    h.runner.on("yt-dlp", MockResponse::exit(1, "ERROR: gone")).await;

    h.press(&format!("va:{}:sd", token)).await;

    let texts = h.transport.texts().await;
    assert_eq!(
        texts,
        vec![
            messages::FETCHING_ITEM.to_string(),
            messages::item_failed("ERROR: gone"),
        ]
    );
    assert_eq!(h.runner.called_keys().await, vec!["gallery-dl", "yt-dlp"]);
    let scratch = h
        .root
        .path()
        .read_dir()
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("item-"))
        .count();
    assert_eq!(scratch, 0);
    assert!(h.converter.conversions().await.is_empty());
}
