//! Live session listing from the `openclaw` CLI

use crate::services::aggregator::round_to;
use crate::services::pricing::PricingCatalog;
use crate::types::{
    ClawdashError, LiveSession, LiveSessions, Result, SessionListing, SessionStats,
    SessionStatus, UNKNOWN,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Age reported for sessions that don't carry one
pub const DEFAULT_AGE_MS: u64 = 99_999;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAIN_SESSION_KEY: &str = "agent:main:main";

/// Produces the raw JSON session listing.
#[async_trait]
pub trait LiveSessionSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<String>;
}

/// Runs `openclaw sessions --json --active 120`.
#[derive(Debug, Clone)]
pub struct OpenClawCli {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for OpenClawCli {
    fn default() -> Self {
        Self {
            program: "openclaw".into(),
            args: ["sessions", "--json", "--active", "120"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OpenClawCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable and arguments
    pub fn with_command(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LiveSessionSource for OpenClawCli {
    fn name(&self) -> &str {
        &self.program
    }

    async fn fetch(&self) -> Result<String> {
        debug!(program = %self.program, args = ?self.args, "listing live sessions");

        let result = tokio::time::timeout(
            self.timeout,
            Command::new(&self.program)
                .args(&self.args)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ClawdashError::LiveSession(format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    stderr.trim()
                )))
            }
            Ok(Err(e)) => Err(ClawdashError::LiveSession(format!(
                "failed to run {}: {}",
                self.program, e
            ))),
            Err(_) => Err(ClawdashError::LiveSession(format!(
                "{} timed out after {}s",
                self.program,
                self.timeout.as_secs()
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListing {
    sessions: Vec<RawSession>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSession {
    key: Option<String>,
    age_ms: Option<u64>,
    input_tokens: Option<u64>,
    total_input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    total_output_tokens: Option<u64>,
    model: Option<String>,
    updated_at: Option<serde_json::Value>,
    context_tokens: Option<u64>,
}

/// First present, nonzero count
fn first_nonzero(values: &[Option<u64>]) -> u64 {
    values
        .iter()
        .flatten()
        .copied()
        .find(|v| *v > 0)
        .unwrap_or(0)
}

impl RawSession {
    fn into_live(self, pricing: &PricingCatalog) -> LiveSession {
        let key = self.key.unwrap_or_default();
        let age_ms = self.age_ms.filter(|a| *a > 0).unwrap_or(DEFAULT_AGE_MS);
        let tokens_in = first_nonzero(&[self.input_tokens, self.total_input_tokens]);
        let tokens_out = first_nonzero(&[self.output_tokens, self.total_output_tokens]);
        let model = self
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let rate = pricing.resolve(&model);
        let cost = tokens_in as f64 / 1e6 * rate.input + tokens_out as f64 / 1e6 * rate.output;

        LiveSession {
            id: key.rsplit(':').next().unwrap_or(&key).to_string(),
            key,
            model,
            updated_at: self.updated_at,
            age_ms,
            status: SessionStatus::from_age_ms(age_ms),
            tokens_in,
            tokens_out,
            tokens: tokens_in.saturating_add(tokens_out),
            cost: round_to(cost, 2),
            context_tokens: self.context_tokens.unwrap_or(0),
        }
    }
}

impl LiveSessions {
    /// Parse the `openclaw sessions --json` output.
    ///
    /// Sessions are grouped by key: `:subagent:` and `:cron:` keys into their
    /// lists, `agent:main:main` as the main session. Other keys only count
    /// toward `stats.total`.
    pub fn from_json(content: &str, pricing: &PricingCatalog) -> Result<Self> {
        let raw: RawListing = serde_json::from_str(content)
            .map_err(|e| ClawdashError::LiveSession(format!("Invalid session listing: {}", e)))?;

        let total = raw.sessions.len() as u64;
        let mut listing = SessionListing::default();

        for session in raw.sessions {
            let live = session.into_live(pricing);
            if live.key.contains(":subagent:") {
                listing.subagents.push(live);
            } else if live.key.contains(":cron:") {
                listing.cron.push(live);
            } else if live.key == MAIN_SESSION_KEY {
                listing.main = Some(live);
            }
        }

        let stats = SessionStats {
            total,
            subagents: listing.subagents.len() as u64,
            cron: listing.cron.len() as u64,
            active_subagents: listing
                .subagents
                .iter()
                .filter(|s| s.status == SessionStatus::Active)
                .count() as u64,
        };

        Ok(Self {
            sessions: listing,
            stats,
        })
    }

    /// Fetch and parse from a live source.
    pub async fn fetch(source: &dyn LiveSessionSource, pricing: &PricingCatalog) -> Result<Self> {
        let content = source.fetch().await?;
        debug!(source = source.name(), bytes = content.len(), "session listing received");
        Self::from_json(&content, pricing)
    }
}
