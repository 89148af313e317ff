//! Pricing catalog and model-name resolution
//!
//! Rates are USD per million tokens. The built-in catalog mirrors LiteLLM
//! list prices; a whole replacement catalog can be loaded from JSON.
//! Resolution never fails: unknown names fall back to a tier default and
//! finally to the catalog's default entry.

use crate::services::family::ModelTier;
use crate::types::{ClawdashError, PricingEntry, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Built-in rates, in declaration order (substring matching depends on it)
const BUILTIN_RATES: &[(&str, PricingEntry)] = &[
    // Anthropic
    ("claude-opus-4-6", PricingEntry::with_cache(5.0, 25.0, 0.5, 6.25)),
    ("claude-opus-4-5", PricingEntry::with_cache(5.0, 25.0, 0.5, 6.25)),
    ("claude-opus-4", PricingEntry::with_cache(15.0, 75.0, 1.5, 18.75)),
    ("claude-opus-4-1", PricingEntry::with_cache(15.0, 75.0, 1.5, 18.75)),
    ("claude-sonnet-4", PricingEntry::with_cache(3.0, 15.0, 0.3, 3.75)),
    ("claude-sonnet-4-20250514", PricingEntry::with_cache(3.0, 15.0, 0.3, 3.75)),
    ("claude-sonnet-4-5-20250929", PricingEntry::with_cache(5.0, 25.0, 0.5, 6.25)),
    ("claude-haiku-3-5", PricingEntry::with_cache(0.8, 4.0, 0.08, 1.0)),
    // xAI
    ("grok-4-1-fast", PricingEntry::with_cache_read(0.20, 0.50, 0.05)),
    ("grok-4", PricingEntry::new(3.0, 15.0)),
    ("grok-2", PricingEntry::new(2.0, 10.0)),
    // OpenAI
    ("gpt-5.3-codex", PricingEntry::with_cache_read(2.0, 8.0, 0.5)),
    ("gpt-4.1", PricingEntry::with_cache_read(2.0, 8.0, 0.5)),
    ("gpt-4o", PricingEntry::with_cache_read(2.5, 10.0, 1.25)),
    // Google Gemini
    ("gemini-3-pro-preview", PricingEntry::with_cache_read(1.25, 10.0, 0.125)),
    ("gemini-2.5-pro", PricingEntry::with_cache_read(1.25, 10.0, 0.125)),
    ("gemini-2.5-flash", PricingEntry::with_cache_read(0.30, 2.50, 0.03)),
    ("gemini-2.5-flash-preview-05-20", PricingEntry::with_cache_read(0.30, 2.50, 0.03)),
    ("gemini-3-flash-preview", PricingEntry::with_cache_read(0.50, 3.0, 0.05)),
];

const BUILTIN_DEFAULT: PricingEntry = PricingEntry::new(3.0, 15.0);

/// Catalog key each tier falls back to
const TIER_DEFAULT_KEYS: &[(ModelTier, &str)] = &[
    (ModelTier::Opus, "claude-opus-4-6"),
    (ModelTier::Sonnet, "claude-sonnet-4"),
    (ModelTier::Haiku, "claude-haiku-3-5"),
    (ModelTier::Grok, "grok-4-1-fast"),
    (ModelTier::Gemini, "gemini-3-pro-preview"),
    (ModelTier::Gpt, "gpt-5.3-codex"),
];

#[derive(Debug, Clone)]
struct CatalogEntry {
    name: String,
    /// Lowercased name, used for matching
    key: String,
    rate: PricingEntry,
}

/// On-disk catalog format
#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<CatalogFileEntry>,
    default: PricingEntry,
}

#[derive(Debug, Deserialize)]
struct CatalogFileEntry {
    model: String,
    #[serde(flatten)]
    rate: PricingEntry,
}

/// Ordered, immutable model → rate table with one default entry.
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    entries: Vec<CatalogEntry>,
    default: PricingEntry,
    tier_defaults: Vec<(ModelTier, PricingEntry)>,
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingCatalog {
    /// The built-in catalog
    pub fn builtin() -> Self {
        let entries = BUILTIN_RATES
            .iter()
            .map(|(name, rate)| (name.to_string(), *rate))
            .collect();
        Self::new(entries, BUILTIN_DEFAULT)
    }

    /// Build a catalog from ordered entries.
    ///
    /// Tier fallbacks point at the built-in tier models when the given
    /// entries don't include them.
    pub fn new(entries: Vec<(String, PricingEntry)>, default: PricingEntry) -> Self {
        let entries: Vec<CatalogEntry> = entries
            .into_iter()
            .map(|(name, rate)| CatalogEntry {
                key: name.to_lowercase(),
                name,
                rate,
            })
            .collect();

        let tier_defaults = TIER_DEFAULT_KEYS
            .iter()
            .filter_map(|(tier, key)| {
                entries
                    .iter()
                    .find(|e| e.key == *key)
                    .map(|e| e.rate)
                    .or_else(|| {
                        BUILTIN_RATES
                            .iter()
                            .find(|(name, _)| name == key)
                            .map(|(_, rate)| *rate)
                    })
                    .map(|rate| (*tier, rate))
            })
            .collect();

        Self {
            entries,
            default,
            tier_defaults,
        }
    }

    /// Load a replacement catalog from a JSON file:
    /// `{"models": [{"model": "...", "input": 3.0, "output": 15.0, ...}], "default": {...}}`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| ClawdashError::Parse(format!("Invalid pricing catalog: {}", e)))?;
        let entries = file
            .models
            .into_iter()
            .map(|entry| (entry.model, entry.rate))
            .collect();
        Ok(Self::new(entries, file.default))
    }

    pub fn default_entry(&self) -> &PricingEntry {
        &self.default
    }

    /// Catalog model names in declaration order
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a model name to its rates.
    ///
    /// Order: empty → default; exact (case-insensitive) key; first key
    /// contained in the name; tier keyword fallback; default.
    pub fn resolve(&self, model: &str) -> &PricingEntry {
        if model.is_empty() {
            return &self.default;
        }
        let lower = model.to_lowercase();

        if let Some(entry) = self.entries.iter().find(|e| e.key == lower) {
            return &entry.rate;
        }

        if let Some(entry) = self.entries.iter().find(|e| lower.contains(&e.key)) {
            return &entry.rate;
        }

        if let Some(tier) = ModelTier::of(&lower) {
            if let Some((_, rate)) = self.tier_defaults.iter().find(|(t, _)| *t == tier) {
                return rate;
            }
        }

        &self.default
    }

    /// Cost of a token breakdown for the given model.
    pub fn cost(
        &self,
        model: &str,
        input: u64,
        output: u64,
        cache_read: u64,
        cache_write: u64,
    ) -> f64 {
        self.resolve(model)
            .cost(input, output, cache_read, cache_write)
    }
}
