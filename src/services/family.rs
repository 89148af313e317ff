//! Model family detection
//!
//! All keyword matching on model names lives here. Billing uses
//! [`ModelFamily`] to pair models with subscriptions; pricing uses
//! [`ModelTier`] as a last-resort rate fallback.

/// Provider family of a model, as far as billing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Claude,
    OpenAi,
    Xai,
    Google,
    Unknown,
}

/// Checked in order; first keyword contained in the lowercased name wins.
const FAMILY_KEYWORDS: &[(&str, ModelFamily)] = &[
    ("claude", ModelFamily::Claude),
    ("gpt", ModelFamily::OpenAi),
    ("codex", ModelFamily::OpenAi),
    ("grok", ModelFamily::Xai),
    ("gemini", ModelFamily::Google),
];

impl ModelFamily {
    pub fn of(model: &str) -> Self {
        let lower = model.to_lowercase();
        FAMILY_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, family)| *family)
            .unwrap_or(ModelFamily::Unknown)
    }

    /// Subscription key prefixes that belong to this family.
    /// Empty for families without a flat-rate plan.
    pub fn subscription_prefixes(self) -> &'static [&'static str] {
        match self {
            ModelFamily::Claude => &["claude"],
            ModelFamily::OpenAi => &["chatgpt", "openai"],
            ModelFamily::Google => &["google"],
            ModelFamily::Xai | ModelFamily::Unknown => &[],
        }
    }

    /// Whether a subscription key belongs to this family.
    pub fn owns_subscription(self, key: &str) -> bool {
        self.subscription_prefixes()
            .iter()
            .any(|prefix| key.starts_with(prefix))
    }
}

/// Coarse model tier used when a name matches no pricing catalog key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    Opus,
    Sonnet,
    Haiku,
    Grok,
    Gemini,
    Gpt,
}

const TIER_KEYWORDS: &[(&str, ModelTier)] = &[
    ("opus", ModelTier::Opus),
    ("sonnet", ModelTier::Sonnet),
    ("haiku", ModelTier::Haiku),
    ("grok", ModelTier::Grok),
    ("gemini", ModelTier::Gemini),
    ("codex", ModelTier::Gpt),
    ("gpt", ModelTier::Gpt),
];

impl ModelTier {
    /// Expects an already lowercased name.
    pub fn of(lower: &str) -> Option<Self> {
        TIER_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, tier)| *tier)
    }
}
