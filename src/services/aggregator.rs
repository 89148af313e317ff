//! Single-pass usage aggregation
//!
//! One call to [`UsageAggregator::aggregate`] prices and classifies every
//! event once and feeds it into all groupings at the same time. Nothing is
//! kept between calls; rounding happens only when the summary is built.

use crate::services::billing::BillingClassifier;
use crate::services::pricing::PricingCatalog;
use crate::types::{
    AgentSummary, CumulativeSummary, DailyRow, DashboardConfig, DateRange, ModelSummary,
    PlanType, PricingEntry, RecordSkip, SkipCounts, SubscriptionUsage, TokenTotals, UsageEvent,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

const MS_PER_DAY: f64 = 86_400_000.0;
const DAYS_PER_MONTH: f64 = 30.0;

/// Inclusive calendar-day bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateFilter {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

#[derive(Debug)]
struct AgentBucket {
    cost: f64,
    tokens: TokenTotals,
    model: String,
}

#[derive(Debug, Default)]
struct ModelBillingBucket {
    tokens: TokenTotals,
    cost: f64,
    agents: BTreeSet<String>,
}

type DailyMap<T> = BTreeMap<NaiveDate, BTreeMap<String, T>>;

/// Running state for one pass. Ordered maps keep float summation order,
/// and therefore the output, identical across runs.
#[derive(Debug, Default)]
struct Accumulator {
    agents: BTreeMap<String, AgentBucket>,
    daily_agent_cost: DailyMap<f64>,
    daily_model_cost: DailyMap<f64>,
    daily_agent_tokens: DailyMap<u64>,
    daily_model_tokens: DailyMap<u64>,
    agent_model_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    model_billing: BTreeMap<(String, PlanType), ModelBillingBucket>,
    subscription_usage: BTreeMap<String, f64>,
    total_cost: f64,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
    active_days: BTreeSet<NaiveDate>,
    skipped: SkipCounts,
}

/// Values summed into the daily series. Token counts saturate.
trait DailyValue: Copy + Default {
    fn accumulate(&mut self, value: Self);
}

impl DailyValue for f64 {
    fn accumulate(&mut self, value: Self) {
        *self += value;
    }
}

impl DailyValue for u64 {
    fn accumulate(&mut self, value: Self) {
        *self = self.saturating_add(value);
    }
}

fn add_daily<T: DailyValue>(map: &mut DailyMap<T>, day: NaiveDate, key: &str, value: T) {
    map.entry(day)
        .or_default()
        .entry(key.to_string())
        .or_default()
        .accumulate(value);
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Whole days spanned by the observed events, at least 1.
pub fn days_running(earliest: Option<DateTime<Utc>>, latest: Option<DateTime<Utc>>) -> u64 {
    match (earliest, latest) {
        (Some(first), Some(last)) => {
            let span_ms = (last - first).num_milliseconds() as f64;
            ((span_ms / MS_PER_DAY).round() as i64 + 1).max(1) as u64
        }
        _ => 1,
    }
}

/// Computes cumulative cost and token summaries from usage events.
pub struct UsageAggregator<'a> {
    config: &'a DashboardConfig,
    pricing: &'a PricingCatalog,
    classifier: BillingClassifier<'a>,
}

impl<'a> UsageAggregator<'a> {
    pub fn new(config: &'a DashboardConfig, pricing: &'a PricingCatalog) -> Self {
        Self {
            config,
            pricing,
            classifier: BillingClassifier::new(config),
        }
    }

    /// Aggregate a stream of parsed transcript records.
    ///
    /// Skipped records (`Err`) are counted by reason and never abort the
    /// pass. Events outside `range` are counted as out of range.
    pub fn aggregate<I>(&self, records: I, range: DateFilter) -> CumulativeSummary
    where
        I: IntoIterator<Item = std::result::Result<UsageEvent, RecordSkip>>,
    {
        let mut acc = Accumulator::default();
        let mut rates: HashMap<String, PricingEntry> = HashMap::new();

        for record in records {
            match record {
                Ok(event) => self.add_event(&mut acc, &mut rates, event, &range),
                Err(reason) => acc.skipped.record(reason),
            }
        }

        debug!(
            total_cost = acc.total_cost,
            agents = acc.agents.len(),
            active_days = acc.active_days.len(),
            skipped = acc.skipped.total(),
            "aggregation pass complete"
        );

        self.finish(acc)
    }

    /// Summary of an empty event stream.
    pub fn empty(&self) -> CumulativeSummary {
        self.aggregate(std::iter::empty(), DateFilter::all())
    }

    fn add_event(
        &self,
        acc: &mut Accumulator,
        rates: &mut HashMap<String, PricingEntry>,
        event: UsageEvent,
        range: &DateFilter,
    ) {
        let day = event.day();
        if !range.contains(day) {
            acc.skipped.out_of_range = acc.skipped.out_of_range.saturating_add(1);
            return;
        }

        let agent = self.config.resolve_agent(&event.agent_id).to_string();
        let agent_model = self
            .config
            .agent_model(&event.agent_id, &agent)
            .unwrap_or(self.config.default_model.as_str());
        let model = event
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(agent_model)
            .to_string();

        let rate = *rates
            .entry(model.clone())
            .or_insert_with(|| *self.pricing.resolve(&model));
        let cost = rate.cost(
            event.input_tokens,
            event.output_tokens,
            event.cache_read_tokens,
            event.cache_write_tokens,
        );

        let billing = self.classifier.determine(&model, event.reported_cost);
        if let (PlanType::Subscription, Some(key)) =
            (billing.plan_type, billing.subscription_key.as_ref())
        {
            *acc.subscription_usage.entry(key.clone()).or_default() += cost;
        }

        let tokens = event.counted_tokens();

        let bucket = acc
            .agents
            .entry(agent.clone())
            .or_insert_with(|| AgentBucket {
                cost: 0.0,
                tokens: TokenTotals::default(),
                model: agent_model.to_string(),
            });
        bucket.cost += cost;
        bucket.tokens.add(&event);
        acc.total_cost += cost;

        add_daily(&mut acc.daily_agent_cost, day, &agent, cost);
        add_daily(&mut acc.daily_model_cost, day, &model, cost);
        add_daily(&mut acc.daily_agent_tokens, day, &agent, tokens);
        add_daily(&mut acc.daily_model_tokens, day, &model, tokens);
        *acc.agent_model_matrix
            .entry(agent.clone())
            .or_default()
            .entry(model.clone())
            .or_default() += cost;

        let mb = acc
            .model_billing
            .entry((model, billing.plan_type))
            .or_default();
        mb.tokens.add(&event);
        mb.cost += cost;
        mb.agents.insert(agent);

        acc.active_days.insert(day);
        if acc.earliest.map_or(true, |t| event.timestamp < t) {
            acc.earliest = Some(event.timestamp);
        }
        if acc.latest.map_or(true, |t| event.timestamp > t) {
            acc.latest = Some(event.timestamp);
        }
    }

    fn finish(&self, acc: Accumulator) -> CumulativeSummary {
        let days = days_running(acc.earliest, acc.latest);
        let daily_cost = acc.total_cost / days as f64;

        let by_agent: BTreeMap<String, AgentSummary> = acc
            .agents
            .into_iter()
            .filter(|(_, a)| a.cost > 0.0 || a.tokens.counted() > 0)
            .map(|(id, a)| {
                (
                    id,
                    AgentSummary {
                        cost: round_to(a.cost, 2),
                        tokens: a.tokens.counted(),
                        input: a.tokens.input,
                        output: a.tokens.output,
                        cache_read: a.tokens.cache_read,
                        cache_write: a.tokens.cache_write,
                        model: a.model,
                    },
                )
            })
            .collect();

        let mut plans_per_model: HashMap<&str, usize> = HashMap::new();
        for (model, _) in acc.model_billing.keys() {
            *plans_per_model.entry(model.as_str()).or_default() += 1;
        }

        let mut pay_per_use_cost = 0.0;
        let mut by_model = BTreeMap::new();
        for ((model, plan_type), bucket) in &acc.model_billing {
            if *plan_type == PlanType::PayPerUse {
                pay_per_use_cost += bucket.cost;
            }
            let display = if plans_per_model.get(model.as_str()).copied().unwrap_or(0) > 1 {
                format!("{} ({})", model, plan_type.label())
            } else {
                model.clone()
            };
            by_model.insert(
                display,
                ModelSummary {
                    model: model.clone(),
                    agents: bucket.agents.iter().cloned().collect(),
                    total_cost: round_to(bucket.cost, 4),
                    pricing: *self.pricing.resolve(model),
                    input: bucket.tokens.input,
                    output: bucket.tokens.output,
                    cache_read: bucket.tokens.cache_read,
                    cache_write: bucket.tokens.cache_write,
                    plan_type: *plan_type,
                    monthly_cost: round_to(bucket.cost / days as f64 * DAYS_PER_MONTH, 2),
                },
            );
        }

        let subscription_breakdown: BTreeMap<String, SubscriptionUsage> = self
            .config
            .subscriptions
            .iter()
            .map(|(key, sub)| {
                let usage = acc.subscription_usage.get(key).copied().unwrap_or(0.0);
                let utilization = if sub.price > 0.0 {
                    round_to(usage / sub.price * 100.0, 1)
                } else {
                    0.0
                };
                (
                    key.clone(),
                    SubscriptionUsage {
                        price: sub.price,
                        label: sub.label.clone(),
                        estimated_api_cost: round_to(usage, 2),
                        savings: round_to(usage - sub.price, 2),
                        utilization,
                    },
                )
            })
            .collect();

        let subscription_total = self.config.subscription_total();
        let total_estimated: f64 = self
            .config
            .subscriptions
            .keys()
            .filter_map(|key| acc.subscription_usage.get(key))
            .sum();
        let utilization = if subscription_total > 0.0 {
            round_to(total_estimated / subscription_total * 100.0, 1)
        } else {
            0.0
        };

        let mut totals = TokenTotals::default();
        for agent in by_agent.values() {
            totals.input = totals.input.saturating_add(agent.input);
            totals.output = totals.output.saturating_add(agent.output);
            totals.cache_read = totals.cache_read.saturating_add(agent.cache_read);
            totals.cache_write = totals.cache_write.saturating_add(agent.cache_write);
        }

        let agent_model_matrix = acc
            .agent_model_matrix
            .into_iter()
            .map(|(agent, models)| {
                let models = models
                    .into_iter()
                    .map(|(model, cost)| (model, round_to(cost, 4)))
                    .collect();
                (agent, models)
            })
            .collect();

        CumulativeSummary {
            total_cost: round_to(acc.total_cost, 2),
            daily_cost: round_to(daily_cost, 2),
            monthly_cost: round_to(daily_cost * DAYS_PER_MONTH, 2),
            days_running: days,
            active_days: acc.active_days.len() as u64,
            subscription_total: round_to(subscription_total, 2),
            subscription_breakdown,
            utilization,
            total_estimated_api_cost: round_to(total_estimated, 2),
            pay_per_use_cost: round_to(pay_per_use_cost, 2),
            total_tokens: totals.counted(),
            total_input: totals.input,
            total_output: totals.output,
            total_cache_read: totals.cache_read,
            total_cache_write: totals.cache_write,
            by_agent,
            by_model,
            daily_cost_by_agent: cost_rows(acc.daily_agent_cost),
            daily_cost_by_model: cost_rows(acc.daily_model_cost),
            daily_tokens_by_agent: token_rows(acc.daily_agent_tokens),
            daily_tokens_by_model: token_rows(acc.daily_model_tokens),
            agent_model_matrix,
            date_range: DateRange {
                start: acc.earliest,
                end: acc.latest,
            },
            skipped: acc.skipped,
            unconfigured_providers: self.config.unconfigured_providers.clone(),
        }
    }
}

/// Per-day cost series, 4 decimals
fn cost_rows(map: DailyMap<f64>) -> Vec<DailyRow<f64>> {
    map.into_iter()
        .map(|(date, values)| DailyRow {
            date,
            values: values
                .into_iter()
                .map(|(k, v)| (k, round_to(v, 4)))
                .collect(),
        })
        .collect()
}

fn token_rows(map: DailyMap<u64>) -> Vec<DailyRow<u64>> {
    map.into_iter()
        .map(|(date, values)| DailyRow { date, values })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentConfig, Subscription};
    use chrono::TimeZone;

    #[allow(clippy::too_many_arguments)]
    fn make_event(
        day: u32,
        hour: u32,
        agent: &str,
        model: Option<&str>,
        input: u64,
        output: u64,
        cache_read: u64,
        reported_cost: Option<f64>,
    ) -> std::result::Result<UsageEvent, RecordSkip> {
        Ok(UsageEvent {
            timestamp: Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
            agent_id: agent.into(),
            model: model.map(String::from),
            input_tokens: input,
            output_tokens: output,
            cache_read_tokens: cache_read,
            cache_write_tokens: 0,
            reported_cost,
        })
    }

    fn subscription(price: f64, label: &str) -> Subscription {
        Subscription {
            price,
            label: label.into(),
        }
    }

    fn mixed_config() -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config
            .subscriptions
            .insert("claude_max".into(), subscription(100.0, "Claude Max"));
        config
            .subscriptions
            .insert("google_ai_pro".into(), subscription(19.99, "Google AI Pro"));
        config.agents.insert(
            "main".into(),
            AgentConfig {
                model: "claude-opus-4-6".into(),
                provider: "anthropic".into(),
            },
        );
        config.agents.insert(
            "idle".into(),
            AgentConfig {
                model: "gpt-4o".into(),
                provider: "openai".into(),
            },
        );
        config
            .agent_aliases
            .insert("research-dir".into(), "research".into());
        config
    }

    fn mixed_events() -> Vec<std::result::Result<UsageEvent, RecordSkip>> {
        vec![
            make_event(1, 9, "main", Some("claude-opus-4-6"), 200_000, 10_000, 50_000, None),
            make_event(1, 10, "main", None, 1_000, 2_000, 0, None),
            make_event(2, 11, "research-dir", Some("gemini-2.5-pro"), 300_000, 20_000, 0, Some(0.5)),
            make_event(3, 12, "research-dir", Some("gemini-2.5-pro"), 100_000, 5_000, 0, None),
            make_event(3, 13, "coder", Some("grok-4"), 50_000, 40_000, 0, None),
            Err(RecordSkip::Malformed),
            make_event(4, 8, "coder", Some("mystery-model"), 10, 10, 0, None),
        ]
    }

    fn run(
        config: &DashboardConfig,
        events: Vec<std::result::Result<UsageEvent, RecordSkip>>,
        range: DateFilter,
    ) -> CumulativeSummary {
        let pricing = PricingCatalog::builtin();
        UsageAggregator::new(config, &pricing).aggregate(events, range)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    // ========== scenarios ==========

    #[test]
    fn test_single_sonnet_event_pay_per_use() {
        let config = DashboardConfig::default();
        let events = vec![make_event(
            1,
            12,
            "main",
            Some("claude-sonnet-4"),
            1_000_000,
            500_000,
            0,
            None,
        )];

        let summary = run(&config, events, DateFilter::all());

        assert!((summary.total_cost - 10.5).abs() < f64::EPSILON);
        let model = summary.by_model.get("claude-sonnet-4").unwrap();
        assert_eq!(model.plan_type, PlanType::PayPerUse);
        assert!((summary.pay_per_use_cost - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_source() {
        let config = DashboardConfig::default();
        let summary = run(&config, Vec::new(), DateFilter::all());

        assert_eq!(summary.total_cost, 0.0);
        assert!(summary.by_agent.is_empty());
        assert_eq!(summary.date_range, DateRange::default());
        assert_eq!(summary.days_running, 1);
        assert_eq!(summary.active_days, 0);
        assert_eq!(summary.daily_cost, 0.0);
        assert!(summary.daily_cost_by_agent.is_empty());
    }

    #[test]
    fn test_unused_subscription_reported() {
        let mut config = DashboardConfig::default();
        config
            .subscriptions
            .insert("claude_max".into(), subscription(100.0, "Claude Max"));
        config
            .subscriptions
            .insert("chatgpt_plus".into(), subscription(20.0, "ChatGPT Plus"));
        let events = vec![make_event(
            1,
            12,
            "main",
            Some("claude-sonnet-4"),
            1_000_000,
            0,
            0,
            None,
        )];

        let summary = run(&config, events, DateFilter::all());

        assert_eq!(summary.subscription_breakdown.len(), 2);
        let unused = summary.subscription_breakdown.get("chatgpt_plus").unwrap();
        assert_eq!(unused.estimated_api_cost, 0.0);
        assert!((unused.savings - -20.0).abs() < f64::EPSILON);
        assert_eq!(unused.utilization, 0.0);

        let used = summary.subscription_breakdown.get("claude_max").unwrap();
        assert!((used.estimated_api_cost - 3.0).abs() < f64::EPSILON);
        assert!((used.savings - -97.0).abs() < f64::EPSILON);
        assert!((used.utilization - 3.0).abs() < f64::EPSILON);
        // 3.0 / 120.0
        assert!((summary.utilization - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_model_split_by_billing() {
        let mut config = DashboardConfig::default();
        config
            .subscriptions
            .insert("google_ai_pro".into(), subscription(19.99, "Google AI Pro"));
        let events = vec![
            make_event(1, 9, "main", Some("gemini-2.5-pro"), 1_000_000, 0, 0, None),
            make_event(1, 10, "main", Some("gemini-2.5-pro"), 2_000_000, 0, 0, Some(0.4)),
        ];

        let summary = run(&config, events, DateFilter::all());

        assert_eq!(summary.by_model.len(), 2);
        assert!(!summary.by_model.contains_key("gemini-2.5-pro"));
        let sub = summary
            .by_model
            .get("gemini-2.5-pro (subscription)")
            .unwrap();
        let ppu = summary
            .by_model
            .get("gemini-2.5-pro (pay-per-use)")
            .unwrap();
        assert_eq!(sub.plan_type, PlanType::Subscription);
        assert_eq!(sub.input, 1_000_000);
        assert!((sub.total_cost - 1.25).abs() < 1e-9);
        assert_eq!(ppu.plan_type, PlanType::PayPerUse);
        assert_eq!(ppu.input, 2_000_000);
        assert!((ppu.total_cost - 2.5).abs() < 1e-9);
        assert_eq!(sub.model, "gemini-2.5-pro");
        // Only the subscription-billed event counts towards utilization
        let usage = summary.subscription_breakdown.get("google_ai_pro").unwrap();
        assert!((usage.estimated_api_cost - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_configured_but_idle_agent_excluded() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        assert!(!summary.by_agent.contains_key("idle"));
        assert!(summary.by_agent.contains_key("main"));
    }

    #[test]
    fn test_zero_usage_agent_excluded() {
        let config = DashboardConfig::default();
        let events = vec![
            make_event(1, 9, "ghost", Some("claude-sonnet-4"), 0, 0, 0, None),
            make_event(1, 9, "main", Some("claude-sonnet-4"), 10, 0, 0, None),
        ];

        let summary = run(&config, events, DateFilter::all());

        assert!(!summary.by_agent.contains_key("ghost"));
        assert!(summary.by_agent.contains_key("main"));
        // The event still counts towards day tracking
        assert_eq!(summary.active_days, 1);
    }

    // ========== invariants ==========

    #[test]
    fn test_cost_groupings_agree() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        let agent_sum: f64 = summary.by_agent.values().map(|a| a.cost).sum();
        let model_sum: f64 = summary.by_model.values().map(|m| m.total_cost).sum();
        let matrix_sum: f64 = summary
            .agent_model_matrix
            .values()
            .flat_map(|m| m.values())
            .sum();
        let daily_sum: f64 = summary
            .daily_cost_by_agent
            .iter()
            .flat_map(|r| r.values.values())
            .sum();

        assert!(summary.total_cost > 0.0);
        assert!((agent_sum - summary.total_cost).abs() < 0.02);
        assert!((model_sum - summary.total_cost).abs() < 0.01);
        assert!((matrix_sum - summary.total_cost).abs() < 0.01);
        assert!((daily_sum - summary.total_cost).abs() < 0.01);
    }

    #[test]
    fn test_token_groupings_agree() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        let daily_agent: u64 = summary
            .daily_tokens_by_agent
            .iter()
            .flat_map(|r| r.values.values())
            .sum();
        let daily_model: u64 = summary
            .daily_tokens_by_model
            .iter()
            .flat_map(|r| r.values.values())
            .sum();

        assert_eq!(daily_agent, summary.total_tokens);
        assert_eq!(daily_model, summary.total_tokens);
        assert_eq!(
            summary.total_tokens,
            summary.total_input + summary.total_output + summary.total_cache_read
        );
    }

    #[test]
    fn test_unconfigured_providers_carried_into_summary() {
        let mut config = mixed_config();
        config.unconfigured_providers = vec!["OpenAI (ChatGPT)".into()];
        let summary = run(&config, mixed_events(), DateFilter::all());
        assert_eq!(summary.unconfigured_providers, vec!["OpenAI (ChatGPT)"]);

        let empty = run(&config, Vec::new(), DateFilter::all());
        assert_eq!(empty.unconfigured_providers, vec!["OpenAI (ChatGPT)"]);
    }

    #[test]
    fn test_huge_token_counts_saturate() {
        let config = DashboardConfig::default();
        let events = vec![
            make_event(1, 9, "main", Some("claude-sonnet-4"), u64::MAX, 0, 0, None),
            make_event(1, 10, "worker", Some("claude-sonnet-4"), u64::MAX, 0, 0, None),
        ];
        let summary = run(&config, events, DateFilter::all());

        assert_eq!(summary.by_agent["main"].input, u64::MAX);
        assert_eq!(summary.by_agent["worker"].input, u64::MAX);
        assert_eq!(summary.total_input, u64::MAX);
        assert_eq!(summary.total_tokens, u64::MAX);
        assert_eq!(
            summary.daily_tokens_by_model[0].values["claude-sonnet-4"],
            u64::MAX
        );
        assert_eq!(summary.by_model["claude-sonnet-4"].input, u64::MAX);
        assert!(summary.total_cost.is_finite());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let config = mixed_config();
        let first = run(&config, mixed_events(), DateFilter::all());
        let second = run(&config, mixed_events(), DateFilter::all());

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    // ========== per-event processing ==========

    #[test]
    fn test_alias_resolution() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        assert!(summary.by_agent.contains_key("research"));
        assert!(!summary.by_agent.contains_key("research-dir"));
        let model = summary.by_model.get("gemini-2.5-pro (pay-per-use)").unwrap();
        assert_eq!(model.agents, vec!["research".to_string()]);
    }

    #[test]
    fn test_missing_model_uses_agent_config() {
        let config = mixed_config();
        let events = vec![make_event(1, 10, "main", None, 1_000_000, 0, 0, None)];

        let summary = run(&config, events, DateFilter::all());

        // claude-opus-4-6 input rate is $5/1M
        assert!((summary.total_cost - 5.0).abs() < f64::EPSILON);
        assert!(summary.by_model.contains_key("claude-opus-4-6"));
        assert_eq!(summary.by_agent["main"].model, "claude-opus-4-6");
    }

    #[test]
    fn test_unconfigured_agent_without_model_is_free_default_rate() {
        let config = DashboardConfig::default();
        let events = vec![make_event(1, 10, "stray", None, 1_000_000, 0, 0, None)];

        let summary = run(&config, events, DateFilter::all());

        let model = summary.by_model.get("unknown").unwrap();
        assert_eq!(model.plan_type, PlanType::Free);
        // Default entry: $3/1M input
        assert!((model.total_cost - 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.by_agent["stray"].model, "unknown");
    }

    #[test]
    fn test_skipped_records_counted() {
        let config = mixed_config();
        let mut events = mixed_events();
        events.push(Err(RecordSkip::NotAssistant));
        events.push(Err(RecordSkip::InvalidTimestamp));

        let summary = run(&config, events, DateFilter::all());

        assert_eq!(summary.skipped.malformed, 1);
        assert_eq!(summary.skipped.not_assistant, 1);
        assert_eq!(summary.skipped.invalid_timestamp, 1);
        assert_eq!(summary.skipped.out_of_range, 0);
    }

    // ========== date filtering ==========

    #[test]
    fn test_date_filter_contains() {
        let filter = DateFilter::new(Some(date(2)), Some(date(3)));
        assert!(!filter.contains(date(1)));
        assert!(filter.contains(date(2)));
        assert!(filter.contains(date(3)));
        assert!(!filter.contains(date(4)));

        assert!(DateFilter::new(None, Some(date(3))).contains(date(1)));
        assert!(DateFilter::new(Some(date(2)), None).contains(date(30)));
        assert!(DateFilter::all().contains(date(1)));
    }

    #[test]
    fn test_aggregate_with_date_range() {
        let config = mixed_config();
        let range = DateFilter::new(Some(date(2)), Some(date(3)));

        let summary = run(&config, mixed_events(), range);

        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.skipped.out_of_range, 3);
        assert!(!summary.by_agent.contains_key("main"));
        let days: Vec<String> = summary
            .daily_cost_by_agent
            .iter()
            .map(|r| r.date.to_string())
            .collect();
        assert_eq!(days, ["2025-03-02", "2025-03-03"]);
        assert_eq!(
            summary.date_range.start,
            Some(Utc.with_ymd_and_hms(2025, 3, 2, 11, 0, 0).unwrap())
        );
    }

    // ========== derived statistics ==========

    #[test]
    fn test_days_running_and_rates() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        // 2025-03-01 09:00 → 2025-03-04 08:00 is 2.96 days → round(2.96) + 1
        assert_eq!(summary.days_running, 4);
        assert_eq!(summary.active_days, 4);
        let expected_daily = round_to(summary.total_cost / 4.0, 2);
        assert!((summary.daily_cost - expected_daily).abs() < 0.01);
        assert!((summary.monthly_cost - summary.daily_cost * 30.0).abs() < 0.3);
    }

    #[test]
    fn test_days_running_single_event() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(days_running(Some(t), Some(t)), 1);
        assert_eq!(days_running(None, None), 1);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.499_999, 2), 10.5);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        assert_eq!(round_to(-19.994, 2), -19.99);
    }

    #[test]
    fn test_daily_series_keeps_four_decimals() {
        let config = DashboardConfig::default();
        // 1234 input tokens of sonnet = $0.003702
        let events = vec![make_event(1, 9, "main", Some("claude-sonnet-4"), 1234, 0, 0, None)];

        let summary = run(&config, events, DateFilter::all());

        assert_eq!(summary.daily_cost_by_agent[0].values["main"], 0.0037);
        assert_eq!(summary.by_agent["main"].cost, 0.0);
        // Agent is kept: tokens > 0
        assert_eq!(summary.by_agent["main"].tokens, 1234);
    }

    #[test]
    fn test_free_and_xai_plans() {
        let config = mixed_config();
        let summary = run(&config, mixed_events(), DateFilter::all());

        assert_eq!(summary.by_model["grok-4"].plan_type, PlanType::PayPerUse);
        assert_eq!(summary.by_model["mystery-model"].plan_type, PlanType::Free);
        assert_eq!(
            summary.by_model["claude-opus-4-6"].plan_type,
            PlanType::Subscription
        );
    }
}
