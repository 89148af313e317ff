//! Usage event types flowing from the transcript parser into the aggregator

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One priced-to-be assistant message, as read from a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    /// Agent directory the transcript lives under (before alias resolution)
    pub agent_id: String,
    pub model: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    /// Cost the agent runtime reported for this message, if any
    pub reported_cost: Option<f64>,
}

impl UsageEvent {
    /// Calendar day (UTC) used for date filtering and daily series.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Tokens counted towards the "tokens" totals.
    /// Cache writes are tracked separately and not part of this sum.
    pub fn counted_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_read_tokens)
    }
}

/// Why a transcript line did not become a [`UsageEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSkip {
    /// Line is not valid JSON or has the wrong shape
    Malformed,
    /// `type` is not "message"
    NotMessage,
    /// Message role is not "assistant"
    NotAssistant,
    /// No `usage` object, or usage without a `cost` entry
    MissingUsage,
    MissingTimestamp,
    InvalidTimestamp,
}

/// Per-reason counters for records dropped during one aggregation pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub malformed: u64,
    pub not_message: u64,
    pub not_assistant: u64,
    pub missing_usage: u64,
    pub missing_timestamp: u64,
    pub invalid_timestamp: u64,
    /// Valid events outside the requested date range
    pub out_of_range: u64,
}

impl SkipCounts {
    pub fn record(&mut self, reason: RecordSkip) {
        let slot = match reason {
            RecordSkip::Malformed => &mut self.malformed,
            RecordSkip::NotMessage => &mut self.not_message,
            RecordSkip::NotAssistant => &mut self.not_assistant,
            RecordSkip::MissingUsage => &mut self.missing_usage,
            RecordSkip::MissingTimestamp => &mut self.missing_timestamp,
            RecordSkip::InvalidTimestamp => &mut self.invalid_timestamp,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.malformed
            + self.not_message
            + self.not_assistant
            + self.missing_usage
            + self.missing_timestamp
            + self.invalid_timestamp
            + self.out_of_range
    }
}

/// Billing category of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Subscription,
    PayPerUse,
    Free,
}

impl PlanType {
    /// Qualifier used when one model shows up under several plan types.
    pub fn label(self) -> &'static str {
        match self {
            PlanType::Subscription => "subscription",
            PlanType::PayPerUse => "pay-per-use",
            PlanType::Free => "free",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingClassification {
    pub subscription_key: Option<String>,
    pub plan_type: PlanType,
}

impl BillingClassification {
    pub fn free() -> Self {
        Self {
            subscription_key: None,
            plan_type: PlanType::Free,
        }
    }

    pub fn pay_per_use() -> Self {
        Self {
            subscription_key: None,
            plan_type: PlanType::PayPerUse,
        }
    }

    pub fn subscription(key: impl Into<String>) -> Self {
        Self {
            subscription_key: Some(key.into()),
            plan_type: PlanType::Subscription,
        }
    }
}

/// Token breakdown by kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

impl TokenTotals {
    pub fn add(&mut self, event: &UsageEvent) {
        self.input = self.input.saturating_add(event.input_tokens);
        self.output = self.output.saturating_add(event.output_tokens);
        self.cache_read = self.cache_read.saturating_add(event.cache_read_tokens);
        self.cache_write = self.cache_write.saturating_add(event.cache_write_tokens);
    }

    /// input + output + cache reads, matching [`UsageEvent::counted_tokens`]
    pub fn counted(&self) -> u64 {
        self.input
            .saturating_add(self.output)
            .saturating_add(self.cache_read)
    }
}
