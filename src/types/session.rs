//! Live-session listing and the assembled snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CumulativeSummary;

/// Sessions updated more recently than this are "active"
pub const ACTIVE_THRESHOLD_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Idle,
}

impl SessionStatus {
    pub fn from_age_ms(age_ms: u64) -> Self {
        if age_ms < ACTIVE_THRESHOLD_MS {
            SessionStatus::Active
        } else {
            SessionStatus::Idle
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveSession {
    /// Last `:`-separated segment of the key
    pub id: String,
    pub key: String,
    pub model: String,
    pub updated_at: Option<serde_json::Value>,
    pub age_ms: u64,
    pub status: SessionStatus,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub tokens: u64,
    /// USD, 2 decimals, input/output rates only
    pub cost: f64,
    pub context_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionListing {
    pub subagents: Vec<LiveSession>,
    pub cron: Vec<LiveSession>,
    pub main: Option<LiveSession>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// All sessions reported, including ones not listed above
    pub total: u64,
    pub subagents: u64,
    pub cron: u64,
    pub active_subagents: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LiveSessions {
    pub sessions: SessionListing,
    pub stats: SessionStats,
}

/// Immutable result of one collection: cumulative usage plus live sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub sessions: SessionListing,
    pub stats: SessionStats,
    /// Why the live-session listing is empty, when the source failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cumulative: CumulativeSummary,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
}
