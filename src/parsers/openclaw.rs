//! OpenClaw session transcript parser
//!
//! Layout: `<base>/<agent>/sessions/<session>.jsonl`, one JSON record per line.

use crate::types::{ClawdashError, RecordSkip, Result, UsageEvent};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{ScannedRecord, TranscriptSource};

/// One transcript line
#[derive(Deserialize)]
struct TranscriptLine {
    #[serde(rename = "type")]
    line_type: Option<String>,
    timestamp: Option<TimestampValue>,
    message: Option<TranscriptMessage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampValue {
    Text(String),
    EpochMillis(f64),
}

#[derive(Deserialize)]
struct TranscriptMessage {
    role: Option<String>,
    model: Option<String>,
    usage: Option<TranscriptUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptUsage {
    input: Option<TokenCount>,
    output: Option<TokenCount>,
    cache_read: Option<TokenCount>,
    cache_write: Option<TokenCount>,
    cost: Option<CostValue>,
}

/// Token counts are written as integers, but `1000.0` also occurs.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenCount {
    Whole(u64),
    Fractional(f64),
}

impl TokenCount {
    /// Negative or non-finite counts are zero; fractions are truncated.
    fn count(count: Option<TokenCount>) -> u64 {
        match count {
            Some(TokenCount::Whole(n)) => n,
            Some(TokenCount::Fractional(n)) if n.is_finite() && n > 0.0 => n as u64,
            _ => 0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CostValue {
    Breakdown { total: Option<f64> },
    Amount(f64),
    Other(IgnoredAny),
}

impl CostValue {
    fn reported(&self) -> Option<f64> {
        match self {
            CostValue::Breakdown { total } => *total,
            CostValue::Amount(amount) => Some(*amount),
            CostValue::Other(_) => None,
        }
    }
}

fn parse_timestamp(value: &TimestampValue) -> Option<DateTime<Utc>> {
    match value {
        TimestampValue::Text(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        TimestampValue::EpochMillis(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(*ms as i64)
        }
        TimestampValue::EpochMillis(_) => None,
    }
}

/// Parser for OpenClaw agent session transcripts
pub struct OpenClawParser {
    data_dir: PathBuf,
}

impl OpenClawParser {
    /// Create a new parser with default data directory (~/.openclaw/agents/)
    pub fn new() -> Self {
        let home = directories::BaseDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .unwrap_or_else(|| {
                warn!("could not determine home directory");
                PathBuf::from(".")
            });
        Self {
            data_dir: home.join(".openclaw").join("agents"),
        }
    }

    /// Create a parser with a custom data directory
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Agent id for a transcript: the directory above `sessions/`
    fn agent_for(path: &Path) -> Option<String> {
        path.parent()?
            .parent()?
            .file_name()?
            .to_str()
            .map(String::from)
    }

    /// Parse a single JSONL line
    pub fn parse_line(agent_id: &str, line: &mut [u8]) -> ScannedRecord {
        let data: TranscriptLine =
            simd_json::from_slice(line).map_err(|_| RecordSkip::Malformed)?;

        if data.line_type.as_deref() != Some("message") {
            return Err(RecordSkip::NotMessage);
        }
        let message = data.message.ok_or(RecordSkip::NotAssistant)?;
        if message.role.as_deref() != Some("assistant") {
            return Err(RecordSkip::NotAssistant);
        }

        let usage = message.usage.ok_or(RecordSkip::MissingUsage)?;
        let cost = usage.cost.as_ref().ok_or(RecordSkip::MissingUsage)?;

        let raw_timestamp = data.timestamp.ok_or(RecordSkip::MissingTimestamp)?;
        let timestamp = parse_timestamp(&raw_timestamp).ok_or(RecordSkip::InvalidTimestamp)?;

        Ok(UsageEvent {
            timestamp,
            agent_id: agent_id.to_string(),
            model: message.model,
            input_tokens: TokenCount::count(usage.input),
            output_tokens: TokenCount::count(usage.output),
            cache_read_tokens: TokenCount::count(usage.cache_read),
            cache_write_tokens: TokenCount::count(usage.cache_write),
            reported_cost: cost.reported(),
        })
    }
}

impl Default for OpenClawParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSource for OpenClawParser {
    fn name(&self) -> &str {
        "openclaw"
    }

    fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_pattern(&self) -> &str {
        "*/sessions/*.jsonl"
    }

    fn parse_file(&self, path: &Path) -> Result<Vec<ScannedRecord>> {
        let agent_id = Self::agent_for(path).ok_or_else(|| {
            ClawdashError::Parse(format!("no agent directory for {}", path.display()))
        })?;
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        // Stream line-by-line to avoid loading entire file into memory
        for line_result in reader.lines() {
            let line = match line_result {
                Ok(l) => l,
                Err(_) => {
                    records.push(Err(RecordSkip::Malformed));
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            // Convert to mutable bytes for simd-json
            let mut line_bytes = line.into_bytes();
            records.push(Self::parse_line(&agent_id, &mut line_bytes));
        }

        Ok(records)
    }
}
