//! The ordered extraction chain.
//!
//! Each tier is a pure planner: given the URL, the target directory and the
//! attempts made so far, it either produces a command to run, asks for the
//! page-scrape tier, or skips. Running and interpreting the plan is the
//! pipeline's job, so the fallback order can be tested without processes.

use std::path::Path;
use std::time::Duration;

use super::config::AcquireConfig;
use super::types::{Attempt, AttemptOutcome, Tool};
use crate::config::CredentialsConfig;
use crate::runner::{CommandOutput, CommandSpec, ExitOutcome};

/// Inputs visible to a planner.
#[derive(Debug, Clone, Copy)]
pub struct AcquireContext<'a> {
    pub url: &'a str,
    pub dir: &'a Path,
    pub config: &'a AcquireConfig,
    pub credentials: &'a CredentialsConfig,
    pub attempts: &'a [Attempt],
}

impl AcquireContext<'_> {
    /// Outcome of the most recent attempt by `tool`.
    pub fn outcome_of(&self, tool: Tool) -> Option<AttemptOutcome> {
        self.attempts
            .iter()
            .rev()
            .find(|a| a.tool == tool)
            .map(|a| a.outcome)
    }

    /// Whether any attempt so far reported the URL as unsupported.
    pub fn any_unsupported(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Unsupported || is_unsupported(&a.diagnostic))
    }
}

/// What a tier wants to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Run(CommandSpec),
    Scrape,
    Skip,
}

pub type Planner = fn(&AcquireContext<'_>) -> Plan;

/// One tier of the chain.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub tool: Tool,
    pub plan: Planner,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("tool", &self.tool).finish()
    }
}

/// gallery-dl → gallery-dl as module → yt-dlp → yt-dlp as module → page scrape.
pub fn default_chain() -> Vec<Strategy> {
    vec![
        Strategy {
            tool: Tool::GalleryDl,
            plan: plan_gallery_dl,
        },
        Strategy {
            tool: Tool::GalleryDlModule,
            plan: plan_gallery_dl_module,
        },
        Strategy {
            tool: Tool::YtDlp,
            plan: plan_ytdlp,
        },
        Strategy {
            tool: Tool::YtDlpModule,
            plan: plan_ytdlp_module,
        },
        Strategy {
            tool: Tool::PageScrape,
            plan: plan_scrape,
        },
    ]
}

/// Case-insensitive match for the extractors' "Unsupported URL" message.
pub fn is_unsupported(diagnostic: &str) -> bool {
    diagnostic.to_lowercase().contains("unsupported url")
}

/// Classifies a finished command. `has_files` reports whether the target
/// directory holds sendable files after the run.
pub fn interpret(output: &CommandOutput, has_files: bool) -> AttemptOutcome {
    match output.outcome() {
        ExitOutcome::Success => AttemptOutcome::Success,
        ExitOutcome::TimedOut if has_files => AttemptOutcome::Partial,
        ExitOutcome::TimedOut => AttemptOutcome::TimedOut,
        ExitOutcome::NotFound => AttemptOutcome::ToolNotFound,
        ExitOutcome::Failed(_) if is_unsupported(output.diagnostic()) => {
            AttemptOutcome::Unsupported
        }
        ExitOutcome::Failed(code) => AttemptOutcome::Failed(code),
    }
}

/// Arguments for the primary tool: metadata sidecars, no mtime, credentials.
pub fn gallery_dl_args(ctx: &AcquireContext<'_>) -> Vec<String> {
    let mut args = vec![
        "-D".to_string(),
        ctx.dir.to_string_lossy().to_string(),
        "--write-metadata".to_string(),
        "--no-mtime".to_string(),
    ];

    let creds = ctx.credentials;
    let options = [
        ("api-id", creds.api_id.map(|id| id.to_string())),
        ("api-hash", creds.api_hash.clone()),
        ("session", creds.session.clone()),
    ];
    for (key, value) in options {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            args.push("-o".to_string());
            args.push(format!("extractor.telegram.{}={}", key, value));
        }
    }

    args.push(ctx.url.to_string());
    args
}

/// Arguments for the secondary tool: single item, bounded filename.
pub fn ytdlp_args(ctx: &AcquireContext<'_>) -> Vec<String> {
    let template = ctx.dir.join(format!(
        "%(title).{}s [%(id)s].%(ext)s",
        ctx.config.title_max_len
    ));
    vec![
        "--no-playlist".to_string(),
        "--write-info-json".to_string(),
        "-o".to_string(),
        template.to_string_lossy().to_string(),
        ctx.url.to_string(),
    ]
}

fn module_spec(ctx: &AcquireContext<'_>, module: &str, timeout: u64, args: Vec<String>) -> CommandSpec {
    CommandSpec::new(ctx.config.python_bin.clone(), Duration::from_secs(timeout))
        .arg("-m")
        .arg(module)
        .args(args)
}

fn plan_gallery_dl(ctx: &AcquireContext<'_>) -> Plan {
    Plan::Run(
        CommandSpec::new(
            ctx.config.gallery_dl_bin.clone(),
            Duration::from_secs(ctx.config.primary_timeout_secs),
        )
        .args(gallery_dl_args(ctx)),
    )
}

fn plan_gallery_dl_module(ctx: &AcquireContext<'_>) -> Plan {
    if ctx.outcome_of(Tool::GalleryDl) != Some(AttemptOutcome::ToolNotFound) {
        return Plan::Skip;
    }
    Plan::Run(module_spec(
        ctx,
        &ctx.config.gallery_dl_module,
        ctx.config.primary_timeout_secs,
        gallery_dl_args(ctx),
    ))
}

fn plan_ytdlp(ctx: &AcquireContext<'_>) -> Plan {
    Plan::Run(
        CommandSpec::new(
            ctx.config.ytdlp_bin.clone(),
            Duration::from_secs(ctx.config.secondary_timeout_secs),
        )
        .args(ytdlp_args(ctx)),
    )
}

fn plan_ytdlp_module(ctx: &AcquireContext<'_>) -> Plan {
    if ctx.outcome_of(Tool::YtDlp) != Some(AttemptOutcome::ToolNotFound) {
        return Plan::Skip;
    }
    Plan::Run(module_spec(
        ctx,
        &ctx.config.ytdlp_module,
        ctx.config.secondary_timeout_secs,
        ytdlp_args(ctx),
    ))
}

fn plan_scrape(ctx: &AcquireContext<'_>) -> Plan {
    if ctx.any_unsupported() {
        Plan::Scrape
    } else {
        Plan::Skip
    }
}
