//! Runs the extraction chain for one URL.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::config::AcquireConfig;
use super::fetch::HttpFetcher;
use super::files::sendable_files;
use super::scrape::extract_media_links;
use super::strategy::{default_chain, interpret, AcquireContext, Plan, Strategy};
use super::types::{AcquireResult, Acquired, Attempt, AttemptOutcome, Tool};
use crate::config::CredentialsConfig;
use crate::metrics;
use crate::runner::CommandRunner;

const DEFAULT_ERROR: &str = "download error";

/// Last `max` characters of `text`, trimmed.
pub fn error_tail(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - max).collect()
    }
}

/// Acquisition pipeline: tries each tier in order until one succeeds.
pub struct AcquisitionPipeline {
    config: AcquireConfig,
    credentials: CredentialsConfig,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn HttpFetcher>,
    chain: Vec<Strategy>,
}

impl AcquisitionPipeline {
    pub fn new(
        config: AcquireConfig,
        credentials: CredentialsConfig,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Self {
        Self {
            config,
            credentials,
            runner,
            fetcher,
            chain: default_chain(),
        }
    }

    /// Replaces the extraction chain.
    pub fn with_chain(mut self, chain: Vec<Strategy>) -> Self {
        self.chain = chain;
        self
    }

    pub fn config(&self) -> &AcquireConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Arc<dyn HttpFetcher> {
        &self.fetcher
    }

    /// Acquires `url` into `dir`.
    ///
    /// Never fails outright: every problem ends up in the result's `error`.
    pub async fn acquire(&self, url: &str, dir: &Path) -> AcquireResult {
        let start = Instant::now();
        let result = self.run_chain(url, dir).await;

        let label = if result.success { "success" } else { "failed" };
        metrics::ACQUISITION_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        if result.success {
            info!(
                url,
                tool = result.tool_name(),
                files = result.files().len(),
                links = result.links().len(),
                partial = result.was_partial(),
                "acquisition succeeded"
            );
        } else {
            warn!(url, tool = result.tool_name(), "acquisition failed");
        }
        result
    }

    async fn run_chain(&self, url: &str, dir: &Path) -> AcquireResult {
        let mut attempts: Vec<Attempt> = Vec::new();

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            return AcquireResult {
                success: false,
                acquired: Acquired::Files(Vec::new()),
                tool: None,
                error: Some(format!("cannot create job directory: {}", e)),
                attempts,
            };
        }

        for strategy in &self.chain {
            let plan = {
                let ctx = AcquireContext {
                    url,
                    dir,
                    config: &self.config,
                    credentials: &self.credentials,
                    attempts: &attempts,
                };
                (strategy.plan)(&ctx)
            };

            match plan {
                Plan::Skip => continue,
                Plan::Run(spec) => {
                    debug!(tool = %strategy.tool, command = %spec.display(), "running extraction tier");
                    let output = self.runner.run(spec).await;
                    let files = sendable_files(dir);
                    let outcome = interpret(&output, !files.is_empty());
                    self.record(&mut attempts, strategy.tool, outcome, output.diagnostic());

                    if outcome == AttemptOutcome::Partial {
                        info!(
                            tool = %strategy.tool,
                            files = files.len(),
                            "timed out with files on disk, keeping partial result"
                        );
                    }
                    if outcome.is_success() {
                        return AcquireResult {
                            success: true,
                            acquired: Acquired::Files(files),
                            tool: Some(strategy.tool),
                            error: None,
                            attempts,
                        };
                    }
                    info!(tool = %strategy.tool, outcome = outcome.label(), "extraction tier failed, falling back");
                }
                Plan::Scrape => match self.fetcher.fetch_text(url).await {
                    Ok(page) => {
                        let links = extract_media_links(&page);
                        if links.is_empty() {
                            self.record(
                                &mut attempts,
                                strategy.tool,
                                AttemptOutcome::Failed(0),
                                "no media links found",
                            );
                        } else {
                            self.record(&mut attempts, strategy.tool, AttemptOutcome::Success, "");
                            return AcquireResult {
                                success: true,
                                acquired: Acquired::Links(links),
                                tool: Some(strategy.tool),
                                error: None,
                                attempts,
                            };
                        }
                    }
                    Err(e) => {
                        warn!(url, error = %e, "page fetch failed");
                        self.record(
                            &mut attempts,
                            strategy.tool,
                            AttemptOutcome::Failed(-1),
                            &e.to_string(),
                        );
                    }
                },
            }
        }

        self.failure(attempts)
    }

    fn record(
        &self,
        attempts: &mut Vec<Attempt>,
        tool: Tool,
        outcome: AttemptOutcome,
        diagnostic: &str,
    ) {
        metrics::ACQUISITION_ATTEMPTS
            .with_label_values(&[tool.name(), outcome.label()])
            .inc();
        attempts.push(Attempt {
            tool,
            outcome,
            diagnostic: diagnostic.to_string(),
        });
    }

    /// Failure result reporting the last extraction tool that ran.
    fn failure(&self, attempts: Vec<Attempt>) -> AcquireResult {
        let last = attempts
            .iter()
            .rev()
            .find(|a| a.tool != Tool::PageScrape)
            .or_else(|| attempts.last());

        let error = last
            .map(|a| error_tail(&a.diagnostic, self.config.error_tail_chars))
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR.to_string());

        AcquireResult {
            success: false,
            acquired: Acquired::Files(Vec::new()),
            tool: last.map(|a| a.tool),
            error: Some(error),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockResponse, MockRunner};
    use tempfile::TempDir;

    fn pipeline(runner: &MockRunner, fetcher: &MockFetcher) -> AcquisitionPipeline {
        AcquisitionPipeline::new(
            AcquireConfig::default(),
            CredentialsConfig::default(),
            Arc::new(runner.clone()),
            Arc::new(fetcher.clone()),
        )
    }

    #[test]
    fn test_error_tail() {
        assert_eq!(error_tail("  short  ", 10), "short");
        assert_eq!(error_tail("abcdefghij", 4), "ghij");
    }

    #[tokio::test]
    async fn test_primary_success_returns_its_files() {
        let dir = TempDir::new().unwrap();
        let job = dir.path().join("job");
        let runner = MockRunner::new();
        runner
            .on(
                "gallery-dl",
                MockResponse::success()
                    .with_file(job.join("a.jpg"), b"a".to_vec())
                    .with_file(job.join("a.jpg.json"), b"{}".to_vec()),
            )
            .await;
        let fetcher = MockFetcher::new();

        let result = pipeline(&runner, &fetcher).acquire("https://x/p", &job).await;

        assert!(result.success);
        assert_eq!(result.tool, Some(Tool::GalleryDl));
        assert_eq!(result.files(), &[job.join("a.jpg")]);
        assert_eq!(runner.called_keys().await, vec!["gallery-dl"]);
    }

    #[tokio::test]
    async fn test_zero_files_on_exit_zero_is_success() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner.on("gallery-dl", MockResponse::success()).await;

        let result = pipeline(&runner, &MockFetcher::new())
            .acquire("https://x/p", dir.path())
            .await;
        assert!(result.success);
        assert!(result.files().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_with_files_keeps_partial_result() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner
            .on(
                "gallery-dl",
                MockResponse::timeout().with_file(dir.path().join("a.jpg"), b"a".to_vec()),
            )
            .await;

        let result = pipeline(&runner, &MockFetcher::new())
            .acquire("https://x/p", dir.path())
            .await;

        assert!(result.success);
        assert!(result.was_partial());
        assert_eq!(result.tool, Some(Tool::GalleryDl));
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Partial);
        assert_eq!(result.files(), &[dir.path().join("a.jpg")]);
        assert_eq!(runner.called_keys().await, vec!["gallery-dl"]);
    }

    #[tokio::test]
    async fn test_timeout_without_files_falls_back_to_ytdlp() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner.on("gallery-dl", MockResponse::timeout()).await;
        runner
            .on(
                "yt-dlp",
                MockResponse::success().with_file(dir.path().join("v.mp4"), b"v".to_vec()),
            )
            .await;

        let result = pipeline(&runner, &MockFetcher::new())
            .acquire("https://x/p", dir.path())
            .await;

        assert!(result.success);
        assert!(!result.was_partial());
        assert_eq!(result.tool, Some(Tool::YtDlp));
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::TimedOut);
        assert_eq!(runner.called_keys().await, vec!["gallery-dl", "yt-dlp"]);
    }

    #[tokio::test]
    async fn test_tool_exiting_124_is_not_a_partial_result() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner
            .on(
                "gallery-dl",
                MockResponse::exit(124, "some downloads failed")
                    .with_file(dir.path().join("a.jpg"), b"a".to_vec()),
            )
            .await;
        runner.on("yt-dlp", MockResponse::exit(1, "no video")).await;

        let result = pipeline(&runner, &MockFetcher::new())
            .acquire("https://x/p", dir.path())
            .await;

        assert!(!result.success);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Failed(124));
        assert_eq!(runner.called_keys().await, vec!["gallery-dl", "yt-dlp"]);
    }

    #[tokio::test]
    async fn test_failure_reports_last_tool_tail() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner.on("gallery-dl", MockResponse::exit(1, "gallery says no")).await;
        let long = format!("{}END", "x".repeat(2000));
        runner.on("yt-dlp", MockResponse::exit(1, long)).await;

        let result = pipeline(&runner, &MockFetcher::new())
            .acquire("https://x/p", dir.path())
            .await;

        assert!(!result.success);
        assert_eq!(result.tool, Some(Tool::YtDlp));
        let error = result.error.unwrap();
        assert_eq!(error.chars().count(), 1200);
        assert!(error.ends_with("END"));
        assert_eq!(result.attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_fetch_error_keeps_tool_error() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner
            .on("gallery-dl", MockResponse::exit(1, "Unsupported URL 'https://x/p'"))
            .await;
        runner.on("yt-dlp", MockResponse::exit(1, "ERROR: Unsupported URL: https://x/p")).await;
        let fetcher = MockFetcher::new();

        let result = pipeline(&runner, &fetcher).acquire("https://x/p", dir.path()).await;

        assert!(!result.success);
        assert_eq!(result.tool, Some(Tool::YtDlp));
        assert_eq!(result.error.as_deref(), Some("ERROR: Unsupported URL: https://x/p"));
        assert_eq!(result.attempts.last().unwrap().tool, Tool::PageScrape);
        assert_eq!(fetcher.requests().await, vec!["https://x/p"]);
    }
}
