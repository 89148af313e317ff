//! Validated dashboard configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN: &str = "unknown";

/// Default refresh interval for the background collector (ms)
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    /// Flat monthly price in USD
    pub price: f64,
    pub label: String,
}

/// Configuration consumed by the aggregation engine.
///
/// Produced once at the loading boundary (see `services::config_loader`);
/// everything downstream trusts these fields as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub agents: BTreeMap<String, AgentConfig>,
    /// Transcript directory name → canonical agent id
    pub agent_aliases: BTreeMap<String, String>,
    pub subscriptions: BTreeMap<String, Subscription>,
    pub default_provider: String,
    pub default_model: String,
    /// Providers with auth profiles but no matching subscription
    pub unconfigured_providers: Vec<String>,
    pub refresh_interval_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
            agent_aliases: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
            default_provider: UNKNOWN.into(),
            default_model: UNKNOWN.into(),
            unconfigured_providers: Vec::new(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }
}

impl DashboardConfig {
    /// Canonical agent id for a transcript directory name.
    pub fn resolve_agent<'a>(&'a self, agent_dir: &'a str) -> &'a str {
        self.agent_aliases
            .get(agent_dir)
            .map(String::as_str)
            .unwrap_or(agent_dir)
    }

    /// Configured model for an agent, looked up by directory name first,
    /// then by canonical id.
    pub fn agent_model(&self, agent_dir: &str, canonical: &str) -> Option<&str> {
        self.agents
            .get(agent_dir)
            .or_else(|| self.agents.get(canonical))
            .map(|a| a.model.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Sum of all configured subscription prices.
    pub fn subscription_total(&self) -> f64 {
        self.subscriptions.values().map(|s| s.price).sum()
    }
}
