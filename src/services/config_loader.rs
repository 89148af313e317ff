//! Loads `openclaw.json` into a validated [`DashboardConfig`]
//!
//! All shape checking happens here. A missing or unreadable file degrades to
//! the default configuration; individual malformed entries are dropped.

use crate::types::{
    AgentConfig, ClawdashError, DashboardConfig, Result, Subscription,
    DEFAULT_REFRESH_INTERVAL_MS, UNKNOWN,
};
use directories::BaseDirs;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Plugin entry holding dashboard-specific settings
pub const PLUGIN_ID: &str = "openclaw-dashboard";

/// Well-known plans: key, monthly price (USD), label
const KNOWN_SUBSCRIPTIONS: &[(&str, f64, &str)] = &[
    ("claude_max", 100.0, "Claude Max"),
    ("claude_max_5x", 200.0, "Claude Max (5x)"),
    ("chatgpt_pro", 200.0, "ChatGPT Pro"),
    ("chatgpt_plus", 20.0, "ChatGPT Plus"),
    ("google_ai_pro", 19.99, "Google AI Pro"),
    ("google_ai_ultra", 249.99, "Google AI Ultra"),
];

/// Auth-profile providers → (display name, subscription keys that cover them)
const PROVIDER_PLANS: &[(&[&str], &str, &[&str])] = &[
    (&["anthropic"], "Anthropic (Claude)", &["claude_max", "claude_max_5x"]),
    (
        &["openai-codex", "openai"],
        "OpenAI (ChatGPT)",
        &["chatgpt_pro", "chatgpt_plus"],
    ),
    (
        &["google-gemini-cli"],
        "Google (Gemini)",
        &["google_ai_pro", "google_ai_ultra"],
    ),
];

// Sections are held as raw values and validated one entry at a time, so a
// single mistyped field only drops that entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    agents: Value,
    auth: Value,
    plugins: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgents {
    defaults: Value,
    list: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgentDefaults {
    model: Option<ModelRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgent {
    id: Option<String>,
    model: Option<ModelRef>,
}

/// `"provider/model"` or `{"primary": "provider/model"}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelRef {
    Name(String),
    Primary { primary: Option<String> },
    Other(IgnoredAny),
}

impl ModelRef {
    fn full_name(&self) -> &str {
        match self {
            ModelRef::Name(name) => name,
            ModelRef::Primary { primary } => primary.as_deref().unwrap_or(""),
            ModelRef::Other(_) => "",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuth {
    profiles: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthProfile {
    provider: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlugins {
    entries: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPluginEntry {
    config: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawDashboardSettings {
    subscriptions: Value,
    agent_aliases: Value,
    refresh_interval_ms: Value,
}

#[derive(Debug, Deserialize)]
struct RawSubscription {
    price: Option<f64>,
    label: Option<String>,
}

/// `~/.openclaw/openclaw.json`
pub fn default_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().join(".openclaw").join("openclaw.json"))
}

/// Load configuration, falling back to defaults when the file is missing or
/// unparsable.
pub fn load_config(path: &Path) -> DashboardConfig {
    match try_load_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "using default configuration");
            DashboardConfig::default()
        }
    }
}

pub fn try_load_config(path: &Path) -> Result<DashboardConfig> {
    let content = fs::read_to_string(path)?;
    from_json(&content)
}

/// Parse the contents of `openclaw.json`.
///
/// Only unparsable JSON or a non-object document is an error. Malformed
/// sections fall back to their defaults and malformed entries are dropped,
/// each with a warning.
pub fn from_json(content: &str) -> Result<DashboardConfig> {
    let raw: RawConfig = serde_json::from_str(content)
        .map_err(|e| ClawdashError::Config(format!("Invalid openclaw.json: {}", e)))?;

    let raw_agents: RawAgents = section(raw.agents, "agents");
    let defaults: RawAgentDefaults = section(raw_agents.defaults, "agents.defaults");
    let default_full = defaults
        .model
        .as_ref()
        .map(ModelRef::full_name)
        .unwrap_or("");
    let (default_provider, default_model) = split_model(default_full);
    let default_model = if default_model.is_empty() {
        UNKNOWN.to_string()
    } else {
        default_model
    };

    let mut agents = BTreeMap::new();
    let list: Vec<Value> = section(raw_agents.list, "agents.list");
    for (index, entry) in list.into_iter().enumerate() {
        let agent: RawAgent = match serde_json::from_value(entry) {
            Ok(agent) => agent,
            Err(e) => {
                warn!(index, error = %e, "dropping malformed agent entry");
                continue;
            }
        };
        let Some(id) = agent.id.filter(|id| !id.is_empty()) else {
            debug!("skipping agent entry without id");
            continue;
        };
        let full = agent.model.as_ref().map(ModelRef::full_name).unwrap_or("");
        let config = if full.is_empty() {
            AgentConfig {
                model: default_model.clone(),
                provider: default_provider.clone(),
            }
        } else {
            let (provider, model) = split_model(full);
            AgentConfig { model, provider }
        };
        agents.insert(id, config);
    }

    let auth: RawAuth = section(raw.auth, "auth");
    let providers = auth_providers(auth.profiles);

    let settings = dashboard_settings(raw.plugins);
    let subscriptions = merge_subscriptions(section(settings.subscriptions, "subscriptions"));
    let agent_aliases = agent_aliases(section(settings.agent_aliases, "agentAliases"));
    let unconfigured_providers = unconfigured_providers(&providers, &subscriptions);
    let refresh_interval_ms: Option<u64> =
        section(settings.refresh_interval_ms, "refreshIntervalMs");
    let refresh_interval_ms = refresh_interval_ms
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);

    Ok(DashboardConfig {
        agents,
        agent_aliases,
        subscriptions,
        default_provider,
        default_model,
        unconfigured_providers,
        refresh_interval_ms,
    })
}

/// Deserialize one config section; null or a wrong shape yields the default.
fn section<T: DeserializeOwned + Default>(value: Value, name: &str) -> T {
    if value.is_null() {
        return T::default();
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(section = name, error = %e, "ignoring malformed config section");
        T::default()
    })
}

/// Split `provider/model` on the first `/`; a bare name has provider `unknown`.
fn split_model(full: &str) -> (String, String) {
    match full.split_once('/') {
        Some((provider, model)) => (provider.to_string(), model.to_string()),
        None => (UNKNOWN.to_string(), full.to_string()),
    }
}

fn dashboard_settings(plugins: Value) -> RawDashboardSettings {
    let plugins: RawPlugins = section(plugins, "plugins");
    let mut entries: BTreeMap<String, Value> = section(plugins.entries, "plugins.entries");
    let Some(entry) = entries.remove(PLUGIN_ID) else {
        return RawDashboardSettings::default();
    };
    let entry: RawPluginEntry = section(entry, PLUGIN_ID);
    section(entry.config, PLUGIN_ID)
}

fn agent_aliases(configured: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    for (alias, target) in configured {
        match target {
            Value::String(target) if !target.is_empty() => {
                aliases.insert(alias, target);
            }
            other => warn!(alias = %alias, value = %other, "dropping malformed agent alias"),
        }
    }
    aliases
}

/// Providers named by well-formed auth profiles, in profile order
fn auth_providers(profiles: Value) -> Vec<String> {
    let profiles: BTreeMap<String, Value> = section(profiles, "auth.profiles");
    let mut providers = Vec::new();
    for (name, value) in profiles {
        match serde_json::from_value::<RawAuthProfile>(value) {
            Ok(profile) => providers.extend(profile.provider),
            Err(e) => warn!(profile = %name, error = %e, "dropping malformed auth profile"),
        }
    }
    providers
}

/// Overlay configured entries on the known catalog. Only configured keys are
/// kept; unknown keys need an explicit price.
fn merge_subscriptions(
    configured: BTreeMap<String, Value>,
) -> BTreeMap<String, Subscription> {
    let mut subscriptions = BTreeMap::new();
    for (key, value) in configured {
        let raw: RawSubscription = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(subscription = %key, error = %e, "dropping malformed subscription");
                continue;
            }
        };
        let known = KNOWN_SUBSCRIPTIONS.iter().find(|(k, _, _)| *k == key);

        let price = raw.price.or(known.map(|(_, price, _)| *price));
        let Some(price) = price.filter(|p| p.is_finite() && *p >= 0.0) else {
            warn!(subscription = %key, "dropping subscription without a valid price");
            continue;
        };
        let label = raw
            .label
            .or_else(|| known.map(|(_, _, label)| label.to_string()))
            .unwrap_or_else(|| key.clone());

        subscriptions.insert(key, Subscription { price, label });
    }
    subscriptions
}

fn unconfigured_providers(
    providers: &[String],
    subscriptions: &BTreeMap<String, Subscription>,
) -> Vec<String> {
    let mut detected: Vec<String> = Vec::new();
    for provider in providers {
        for (names, display, keys) in PROVIDER_PLANS {
            let covered = keys.iter().any(|k| subscriptions.contains_key(*k));
            if names.contains(&provider.as_str())
                && !covered
                && !detected.iter().any(|d| d == display)
            {
                detected.push(display.to_string());
            }
        }
    }
    detected
}
