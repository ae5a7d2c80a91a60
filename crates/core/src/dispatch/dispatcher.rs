//! Routes inbound messages and callbacks to the pipelines.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::callback::{Callback, PreMode};
use super::config::DispatchConfig;
use super::error::DispatchError;
use super::menus::{self, PageWindow};
use super::messages;
use crate::acquire::files::{
    direct_media_url, find_metadata, item_page_url, remove_dir_quietly, remove_file_quietly,
    sidecar_for,
};
use crate::acquire::scrape::{link_kind, LinkKind};
use crate::acquire::{AcquisitionPipeline, Acquired, Tool};
use crate::auth::{AuthRequest, Authenticator};
use crate::index::build_index;
use crate::media::{build_caption, DeliveryError, DeliveryMode, MediaKind, MediaPipeline};
use crate::metrics;
use crate::store::{generate_key, ItemToken, Job, JobState, JobStore, SourceRef, TokenStore};
use crate::transport::{Keyboard, MediaSource, MessageRef, Transport, VideoHints};

static URL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)^https?://\S+$").ok());

/// Title of scraped links, which carry no metadata.
const SCRAPED_TITLE: &str = "Media";

/// A text message from the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: Option<u64>,
    pub text: String,
}

/// A button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallback {
    /// Query id, used to answer it.
    pub id: String,
    pub chat_id: i64,
    pub user_id: Option<u64>,
    /// Message that carried the button, when the platform still has it.
    pub message: Option<MessageRef>,
    pub data: String,
}

/// Whether a handler found the state it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handled {
    Done,
    Expired,
}

/// Whether `text` is a single http(s) link.
pub fn is_url(text: &str) -> bool {
    URL_PATTERN.as_ref().is_some_and(|re| re.is_match(text))
}

/// Command name of `/name` or `/name@bot`, lowercased.
fn command_of(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next().unwrap_or_default();
    let name = word.split('@').next().unwrap_or_default();
    Some(name.to_lowercase())
}

/// Local file name for a downloaded URL.
fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    let clean: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if clean.trim_matches('.').is_empty() {
        "media".to_string()
    } else {
        clean
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Interactive state machine over jobs and item tokens.
///
/// Every callback is handled independently from the stores' current
/// contents; a callback whose job or token is gone is answered with an
/// expiry notice and nothing else.
pub struct Dispatcher {
    config: DispatchConfig,
    authenticator: Arc<dyn Authenticator>,
    acquisition: Arc<AcquisitionPipeline>,
    media: Arc<MediaPipeline>,
    transport: Arc<dyn Transport>,
    jobs: Arc<JobStore>,
    tokens: Arc<TokenStore>,
}

impl Dispatcher {
    pub fn new(
        config: DispatchConfig,
        authenticator: Arc<dyn Authenticator>,
        acquisition: Arc<AcquisitionPipeline>,
        media: Arc<MediaPipeline>,
        jobs: Arc<JobStore>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        let transport = Arc::clone(media.transport());
        Self {
            config,
            authenticator,
            acquisition,
            media,
            transport,
            jobs,
            tokens,
        }
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    async fn authorized(&self, user_id: Option<u64>, chat_id: i64) -> bool {
        match self
            .authenticator
            .authenticate(&AuthRequest::new(user_id, chat_id))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                info!(chat_id, error = %e, "rejected sender");
                false
            }
        }
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Handles a text message: commands, links, everything else.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<(), DispatchError> {
        let chat_id = message.chat_id;
        if !self.authorized(message.user_id, chat_id).await {
            self.transport
                .send_text(chat_id, messages::NOT_AUTHORIZED, None)
                .await?;
            return Ok(());
        }

        let text = message.text.trim();
        if let Some(command) = command_of(text) {
            let reply = match command.as_str() {
                "start" => messages::GREETING,
                "help" => messages::HELP,
                _ => return Ok(()),
            };
            self.transport.send_text(chat_id, reply, None).await?;
            return Ok(());
        }

        if !is_url(text) {
            self.transport
                .send_text(chat_id, messages::INVALID_LINK, None)
                .await?;
            return Ok(());
        }

        let job = self.jobs.create(chat_id, text).await;
        info!(job_id = %job.id, chat_id, url = text, "link received");
        self.transport
            .send_text(
                chat_id,
                messages::CHOOSE_MODE,
                Some(&menus::mode_menu(&job.id)),
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Handles a button press.
    ///
    /// Handler failures are reported to the chat rather than returned; only
    /// a failure to answer the query itself is an error here.
    pub async fn handle_callback(&self, callback: &IncomingCallback) -> Result<(), DispatchError> {
        if !self.authorized(callback.user_id, callback.chat_id).await {
            self.transport
                .answer_callback(&callback.id, Some(messages::NOT_AUTHORIZED))
                .await?;
            return Ok(());
        }

        let parsed = match Callback::parse(&callback.data) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(data = %callback.data, error = %e, "unparseable callback");
                metrics::CALLBACKS_TOTAL
                    .with_label_values(&["unknown", "invalid"])
                    .inc();
                self.transport
                    .answer_callback(&callback.id, Some(messages::UNKNOWN_ACTION))
                    .await?;
                return Ok(());
            }
        };

        let tag = parsed.tag();
        let outcome = match parsed {
            Callback::Pre { job, mode } => self.on_pre(callback, &job, mode).await,
            Callback::Groups { job, page } => self.on_groups(callback, &job, page).await,
            Callback::Group { job, group, page } => {
                self.on_group(callback, &job, group, page).await
            }
            Callback::Post { job, group, post } => self.on_post(callback, &job, group, post).await,
            Callback::Item { token, mode } => self.on_item(callback, &token, mode).await,
            Callback::SendGroup { job, group, mode } => {
                self.on_send_group(callback, &job, group, mode).await
            }
            Callback::SendPost {
                job,
                group,
                post,
                mode,
            } => self.on_send_post(callback, &job, group, post, mode).await,
            Callback::CleanGroup { job, group } => {
                self.on_clean_group(callback, &job, group).await
            }
        };

        match outcome {
            Ok(Handled::Done) => {
                metrics::CALLBACKS_TOTAL.with_label_values(&[tag, "ok"]).inc();
            }
            Ok(Handled::Expired) => {
                metrics::CALLBACKS_TOTAL
                    .with_label_values(&[tag, "expired"])
                    .inc();
                info!(tag, data = %callback.data, "callback for expired state");
                self.transport
                    .answer_callback(&callback.id, Some(messages::EXPIRED))
                    .await?;
            }
            Err(e) => {
                metrics::CALLBACKS_TOTAL
                    .with_label_values(&[tag, "error"])
                    .inc();
                warn!(tag, data = %callback.data, error = %e, "callback failed");
                if let Err(e) = self
                    .transport
                    .send_text(callback.chat_id, &messages::error(&e.to_string()), None)
                    .await
                {
                    debug!(error = %e, "could not report callback failure");
                }
            }
        }
        Ok(())
    }

    /// Acknowledges a callback; late acknowledgements are ignored.
    async fn ack(&self, callback: &IncomingCallback) {
        if let Err(e) = self.transport.answer_callback(&callback.id, None).await {
            debug!(error = %e, "callback answer failed");
        }
    }

    /// Replaces the menu the button lived on, or sends a new message.
    async fn show(
        &self,
        callback: &IncomingCallback,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DispatchError> {
        if let Some(message) = callback.message {
            match self.transport.edit_text(message, text, keyboard).await {
                Ok(()) => return Ok(()),
                Err(e) => debug!(error = %e, "edit failed, sending instead"),
            }
        }
        self.transport
            .send_text(callback.chat_id, text, keyboard)
            .await?;
        Ok(())
    }

    async fn finish(&self, job: &Job) {
        self.jobs.set_state(&job.id, JobState::Completed).await;
        remove_dir_quietly(&job.dir).await;
        self.jobs.remove(&job.id).await;
        debug!(job_id = %job.id, "job finished");
    }

    // -------------------------------------------------------------------------
    // pre: acquisition with a chosen mode
    // -------------------------------------------------------------------------

    async fn on_pre(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        mode: PreMode,
    ) -> Result<Handled, DispatchError> {
        let Some(job) = self.jobs.get(job_id).await else {
            return Ok(Handled::Expired);
        };
        let started = self
            .jobs
            .update(job_id, |j| {
                if j.state == JobState::Pending {
                    j.state = JobState::Acquiring;
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);
        if !started {
            self.transport
                .answer_callback(&callback.id, Some(messages::ALREADY_STARTED))
                .await?;
            return Ok(Handled::Done);
        }

        self.ack(callback).await;
        let keep = self.run_job(callback, &job, mode).await;
        if !matches!(keep, Ok(true)) {
            self.finish(&job).await;
        }
        keep.map(|_| Handled::Done)
    }

    /// Acquires and hands the result on. Returns whether the job stays
    /// around for browsing.
    async fn run_job(
        &self,
        callback: &IncomingCallback,
        job: &Job,
        mode: PreMode,
    ) -> Result<bool, DispatchError> {
        self.show(callback, messages::DOWNLOADING, None).await?;
        info!(job_id = %job.id, mode = mode.code(), url = %job.url, "acquisition started");

        let result = self.acquisition.acquire(&job.url, &job.dir).await;
        let chat_id = job.chat_id;

        if !result.success {
            let error = result.error.as_deref().unwrap_or("download error");
            self.transport
                .send_text(
                    chat_id,
                    &messages::download_failed(result.tool_name(), error),
                    None,
                )
                .await?;
            return Ok(false);
        }

        if let Some(tool @ (Tool::YtDlp | Tool::YtDlpModule)) = result.tool {
            self.transport
                .send_text(chat_id, &messages::fallback_used(tool.name()), None)
                .await?;
        }

        let files = match result.acquired {
            Acquired::Links(links) => {
                self.deliver_links(chat_id, &links).await?;
                return Ok(false);
            }
            Acquired::Files(files) => files,
        };
        if files.is_empty() {
            self.transport
                .send_text(chat_id, messages::NOTHING_TO_SEND, None)
                .await?;
            return Ok(false);
        }

        let meta = find_metadata(&job.dir);
        let mut job = job.clone();
        job.meta = meta.clone();
        job.state = JobState::Acquired;
        self.jobs
            .update(&job.id, |j| {
                j.meta = meta;
                j.state = JobState::Acquired;
            })
            .await;

        match mode {
            PreMode::Index => {
                let index = build_index(&job.id, &job.dir, &files);
                let window = PageWindow::new(index.groups.len(), 0, self.config.page_size);
                let text = menus::groups_text(&index, &window);
                let keyboard = menus::groups_keyboard(&index, &window);
                info!(
                    job_id = %job.id,
                    groups = index.groups.len(),
                    files = index.total_files(),
                    "job indexed"
                );
                self.jobs
                    .update(&job.id, |j| {
                        j.index = Some(index);
                        j.state = JobState::Indexed;
                    })
                    .await;
                self.transport
                    .send_text(chat_id, &text, Some(&keyboard))
                    .await?;
                Ok(true)
            }
            PreMode::Deliver(mode) => {
                self.deliver_files(&job, &files, mode).await?;
                Ok(false)
            }
        }
    }

    /// Sends scraped links by URL, degrading to the bare link.
    async fn deliver_links(&self, chat_id: i64, links: &[String]) -> Result<(), DispatchError> {
        let cap = self.acquisition.config().scrape_link_cap;
        let delivery = self.media.config();
        let mut sent = 0usize;

        for link in links.iter().take(cap) {
            let caption = build_caption(
                Some(SCRAPED_TITLE),
                Some(link),
                None,
                delivery.caption_limit,
                delivery.caption_cut,
            );
            let source = MediaSource::Remote(link.clone());
            let result = match link_kind(link) {
                LinkKind::Video => self
                    .transport
                    .send_video(chat_id, &source, Some(&caption), &VideoHints::streaming(), None)
                    .await
                    .map(|_| ()),
                LinkKind::Photo => self
                    .transport
                    .send_photo(chat_id, &source, Some(&caption))
                    .await
                    .map(|_| ()),
                LinkKind::Document => self
                    .transport
                    .send_document(chat_id, &source, Some(&caption))
                    .await
                    .map(|_| ()),
            };
            if let Err(e) = result {
                debug!(link = %link, error = %e, "remote send failed, posting link");
                self.transport.send_text(chat_id, link, None).await?;
            }
            sent += 1;
        }

        self.transport
            .send_text(chat_id, &messages::scrape_summary(sent), None)
            .await?;
        Ok(())
    }

    fn caption_for(&self, job: &Job, file: &Path) -> String {
        let delivery = self.media.config();
        let name = display_name(file);
        build_caption(
            job.meta.title.as_deref(),
            Some(job.meta.href.as_deref().unwrap_or(&job.url)),
            Some(&name),
            delivery.caption_limit,
            delivery.caption_cut,
        )
    }

    /// Issues a token pointing back at where `file` came from.
    async fn item_token(&self, job: &Job, file: &Path, caption: &str) -> String {
        let source = direct_media_url(file)
            .map(SourceRef::Direct)
            .or_else(|| item_page_url(file).map(SourceRef::Page))
            .unwrap_or_else(|| SourceRef::Page(job.url.clone()));
        self.tokens
            .issue(source, job.chat_id, Some(caption.to_string()))
            .await
    }

    /// Issues a token for `file` and returns its after-retrieval controls.
    async fn item_controls(&self, job: &Job, file: &Path, caption: &str) -> Keyboard {
        menus::item_keyboard(&self.item_token(job, file, caption).await)
    }

    /// Direct-mode delivery of every acquired file, up to the per-job cap.
    async fn deliver_files(
        &self,
        job: &Job,
        files: &[PathBuf],
        mode: DeliveryMode,
    ) -> Result<(), DispatchError> {
        let chat_id = job.chat_id;
        let cap = self.media.config().max_files_per_job;
        if files.len() > cap {
            self.transport
                .send_text(chat_id, &messages::files_capped(files.len() - cap, cap), None)
                .await?;
        }

        let mut sent = 0usize;
        let mut failed = 0usize;
        for file in files.iter().take(cap) {
            let caption = self.caption_for(job, file);
            let kind = self.media.classify(file).await;
            let keyboard = if kind == MediaKind::Video && mode != DeliveryMode::Screenshots {
                Some(self.item_controls(job, file, &caption).await)
            } else {
                None
            };

            match self
                .media
                .deliver_as(kind, chat_id, file, &caption, mode, keyboard.as_ref())
                .await
            {
                Ok(_) => sent += 1,
                Err(DeliveryError::NotMediaType { .. }) => {}
                Err(e) => {
                    failed += 1;
                    self.transport
                        .send_text(
                            chat_id,
                            &messages::file_failed(&display_name(file), &e.to_string()),
                            None,
                        )
                        .await?;
                }
            }
        }

        info!(job_id = %job.id, sent, failed, mode = mode.code(), "direct delivery finished");
        self.transport
            .send_text(chat_id, &messages::delivery_summary(sent, failed), None)
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // jl / jg / jp: browsing an index
    // -------------------------------------------------------------------------

    async fn on_groups(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        page: usize,
    ) -> Result<Handled, DispatchError> {
        let Some(index) = self.jobs.get(job_id).await.and_then(|j| j.index) else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;

        let window = PageWindow::new(index.groups.len(), page, self.config.page_size);
        let keyboard = menus::groups_keyboard(&index, &window);
        self.show(callback, &menus::groups_text(&index, &window), Some(&keyboard))
            .await?;
        Ok(Handled::Done)
    }

    async fn on_group(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        gi: usize,
        page: usize,
    ) -> Result<Handled, DispatchError> {
        let group = self
            .jobs
            .get(job_id)
            .await
            .and_then(|j| j.index)
            .and_then(|index| index.groups.into_iter().nth(gi));
        let Some(group) = group else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;

        let window = PageWindow::new(group.posts.len(), page, self.config.page_size);
        let keyboard = menus::group_keyboard(job_id, gi, &group, &window);
        self.show(callback, &menus::group_text(&group, &window), Some(&keyboard))
            .await?;
        Ok(Handled::Done)
    }

    async fn on_post(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        gi: usize,
        pi: usize,
    ) -> Result<Handled, DispatchError> {
        let Some(job) = self.jobs.get(job_id).await else {
            return Ok(Handled::Expired);
        };
        let Some(index) = job.index.as_ref() else {
            return Ok(Handled::Expired);
        };
        let (Some(group), Some(post)) = (index.group(gi), index.post(gi, pi)) else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;

        let page_size = self.config.page_size;
        let mut items = Vec::new();
        for (i, file) in post.files.iter().enumerate() {
            if items.len() >= page_size {
                break;
            }
            if self.media.classify(file).await == MediaKind::Video {
                let caption = self.caption_for(&job, file);
                items.push((i + 1, self.item_token(&job, file, &caption).await));
            }
        }

        let keyboard = menus::post_keyboard(job_id, gi, pi, page_size, &items);
        self.show(callback, &menus::post_text(group, post), Some(&keyboard))
            .await?;
        Ok(Handled::Done)
    }

    // -------------------------------------------------------------------------
    // ag / ap / clg: bulk actions on an index
    // -------------------------------------------------------------------------

    async fn on_send_group(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        gi: usize,
        mode: DeliveryMode,
    ) -> Result<Handled, DispatchError> {
        let Some(job) = self.jobs.get(job_id).await else {
            return Ok(Handled::Expired);
        };
        let Some(group) = job.index.as_ref().and_then(|i| i.group(gi)).cloned() else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;
        self.send_bulk(&job, &group.files, mode, &group.name).await?;
        Ok(Handled::Done)
    }

    async fn on_send_post(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        gi: usize,
        pi: usize,
        mode: DeliveryMode,
    ) -> Result<Handled, DispatchError> {
        let Some(job) = self.jobs.get(job_id).await else {
            return Ok(Handled::Expired);
        };
        let Some(post) = job.index.as_ref().and_then(|i| i.post(gi, pi)).cloned() else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;
        let target = format!("post {}", post.id);
        self.send_bulk(&job, &post.files, mode, &target).await?;
        Ok(Handled::Done)
    }

    /// Delivers `files` one by one, keeping a running count in one message.
    async fn send_bulk(
        &self,
        job: &Job,
        files: &[PathBuf],
        mode: DeliveryMode,
        target: &str,
    ) -> Result<(), DispatchError> {
        let chat_id = job.chat_id;
        let pending: Vec<&PathBuf> = files.iter().filter(|f| f.exists()).collect();
        if pending.is_empty() {
            self.settle(job, files).await;
            self.transport
                .send_text(chat_id, messages::NOTHING_LEFT, None)
                .await?;
            return Ok(());
        }

        let total = pending.len();
        let progress = self
            .transport
            .send_text(chat_id, &messages::bulk_progress(0, total), None)
            .await?;

        let mut sent = 0usize;
        for (i, file) in pending.iter().enumerate() {
            let caption = self.caption_for(job, file);
            let kind = self.media.classify(file).await;
            let keyboard = if kind == MediaKind::Video && mode != DeliveryMode::Screenshots {
                Some(self.item_controls(job, file, &caption).await)
            } else {
                None
            };
            match self
                .media
                .deliver_as(kind, chat_id, file, &caption, mode, keyboard.as_ref())
                .await
            {
                Ok(_) => sent += 1,
                Err(e) => debug!(file = %file.display(), error = %e, "bulk item not delivered"),
            }
            if let Err(e) = self
                .transport
                .edit_text(progress, &messages::bulk_progress(i + 1, total), None)
                .await
            {
                debug!(error = %e, "progress update failed");
            }
        }

        info!(job_id = %job.id, target, sent, total, mode = mode.code(), "bulk delivery finished");
        let done = messages::bulk_done(sent, total, target);
        if self.transport.edit_text(progress, &done, None).await.is_err() {
            self.transport.send_text(chat_id, &done, None).await?;
        }
        self.settle(job, files).await;
        Ok(())
    }

    /// Drops handled `files` and their sidecars from the job, finishing it
    /// once its index has nothing left to send.
    async fn settle(&self, job: &Job, files: &[PathBuf]) {
        for file in files {
            if let Some(sidecar) = sidecar_for(file) {
                remove_file_quietly(&sidecar).await;
            }
        }
        let remaining = self
            .jobs
            .update(&job.id, |j| {
                j.index.as_mut().map(|index| {
                    index.remove_files(files);
                    index.total_files()
                })
            })
            .await
            .flatten();
        if remaining == Some(0) {
            info!(job_id = %job.id, "index exhausted");
            self.finish(job).await;
        }
    }

    async fn on_clean_group(
        &self,
        callback: &IncomingCallback,
        job_id: &str,
        gi: usize,
    ) -> Result<Handled, DispatchError> {
        let Some(job) = self.jobs.get(job_id).await else {
            return Ok(Handled::Expired);
        };
        let Some(group) = job.index.as_ref().and_then(|i| i.group(gi)).cloned() else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;

        let files = self
            .jobs
            .update(job_id, |j| j.index.as_mut().and_then(|i| i.clear_group(gi)))
            .await
            .flatten()
            .unwrap_or_default();

        let mut removed = 0usize;
        for file in &files {
            if file.exists() {
                removed += 1;
            }
            remove_file_quietly(file).await;
        }
        self.settle(&job, &files).await;
        if let Some(dir) = group.dir(&job.dir) {
            remove_dir_quietly(&dir).await;
        }

        info!(job_id, group = %group.name, removed, "group cleaned");
        self.transport
            .send_text(
                job.chat_id,
                &messages::group_cleaned(removed, &group.name),
                None,
            )
            .await?;
        Ok(Handled::Done)
    }

    // -------------------------------------------------------------------------
    // va: single item again, in another mode
    // -------------------------------------------------------------------------

    async fn on_item(
        &self,
        callback: &IncomingCallback,
        token: &str,
        mode: DeliveryMode,
    ) -> Result<Handled, DispatchError> {
        let Some(item) = self.tokens.resolve(token).await else {
            return Ok(Handled::Expired);
        };
        self.ack(callback).await;

        let chat_id = callback.chat_id;
        self.transport
            .send_text(chat_id, messages::FETCHING_ITEM, None)
            .await?;

        let dir = self
            .jobs
            .download_root()
            .join(format!("item-{}", generate_key()));
        let outcome = self.redeliver(chat_id, &item, &dir, mode).await;
        remove_dir_quietly(&dir).await;

        if let Err(message) = outcome {
            self.transport
                .send_text(chat_id, &messages::item_failed(&message), None)
                .await?;
        }
        Ok(Handled::Done)
    }

    async fn redeliver(
        &self,
        chat_id: i64,
        item: &ItemToken,
        dir: &Path,
        mode: DeliveryMode,
    ) -> Result<(), String> {
        let file = self.fetch_item(item, dir).await?;
        let caption = match item.caption {
            Some(ref caption) => caption.clone(),
            None => {
                let delivery = self.media.config();
                build_caption(
                    None,
                    Some(item.source.url()),
                    Some(&display_name(&file)),
                    delivery.caption_limit,
                    delivery.caption_cut,
                )
            }
        };
        info!(chat_id, mode = mode.code(), source = item.source.url(), "item re-delivery");
        self.media
            .deliver(chat_id, &file, &caption, mode, None)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Downloads the item's direct URL, or runs the acquisition chain on its
    /// page and takes the first result.
    async fn fetch_item(&self, item: &ItemToken, dir: &Path) -> Result<PathBuf, String> {
        let fetcher = self.acquisition.fetcher();
        match &item.source {
            SourceRef::Direct(url) => {
                let dest = dir.join(file_name_from_url(url));
                fetcher
                    .download(url, &dest)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(dest)
            }
            SourceRef::Page(url) => {
                let result = self.acquisition.acquire(url, dir).await;
                if !result.success {
                    return Err(result
                        .error
                        .unwrap_or_else(|| "download error".to_string()));
                }
                if let Some(file) = result.files().first() {
                    return Ok(file.clone());
                }
                let Some(link) = result.links().first() else {
                    return Err(messages::NOTHING_TO_SEND.to_string());
                };
                let dest = dir.join(file_name_from_url(link));
                fetcher
                    .download(link, &dest)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(dest)
            }
        }
    }
}
