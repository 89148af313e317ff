//! Cumulative summary produced by one aggregation pass

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PlanType, PricingEntry, SkipCounts};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    /// USD, 2 decimals
    pub cost: f64,
    /// input + output + cache reads
    pub tokens: u64,
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    /// Representative model label (the agent's configured model)
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// Bare model name, without the billing qualifier
    pub model: String,
    /// Contributing agent ids, sorted
    pub agents: Vec<String>,
    /// USD, 4 decimals
    pub total_cost: f64,
    pub pricing: PricingEntry,
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
    pub plan_type: PlanType,
    /// Projected 30-day cost at the observed daily rate
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUsage {
    pub price: f64,
    pub label: String,
    /// Pay-per-use equivalent of the usage billed to this subscription
    pub estimated_api_cost: f64,
    /// estimated_api_cost - price
    pub savings: f64,
    /// Percent, 1 decimal; 0 when price is 0
    pub utilization: f64,
}

/// One row of a per-day series: `{"date": "...", "<key>": value, ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRow<T> {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, T>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeSummary {
    pub total_cost: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
    pub days_running: u64,
    pub active_days: u64,
    pub subscription_total: f64,
    pub subscription_breakdown: BTreeMap<String, SubscriptionUsage>,
    pub utilization: f64,
    pub total_estimated_api_cost: f64,
    #[serde(rename = "payperUseCost")]
    pub pay_per_use_cost: f64,
    pub total_tokens: u64,
    pub total_input: u64,
    pub total_output: u64,
    pub total_cache_read: u64,
    pub total_cache_write: u64,
    pub by_agent: BTreeMap<String, AgentSummary>,
    /// Keyed by display name (billing-qualified when a model is split)
    pub by_model: BTreeMap<String, ModelSummary>,
    pub daily_cost_by_agent: Vec<DailyRow<f64>>,
    pub daily_cost_by_model: Vec<DailyRow<f64>>,
    pub daily_tokens_by_agent: Vec<DailyRow<u64>>,
    pub daily_tokens_by_model: Vec<DailyRow<u64>>,
    /// agent → model → cost (4 decimals)
    pub agent_model_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub date_range: DateRange,
    pub skipped: SkipCounts,
    /// Providers with auth profiles but no matching subscription configured
    pub unconfigured_providers: Vec<String>,
}
