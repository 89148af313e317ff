use serde::{Deserialize, Serialize};

/// Default cache-read rate as a fraction of the input rate
pub const CACHE_READ_INPUT_RATIO: f64 = 0.1;
/// Default cache-write rate as a fraction of the input rate
pub const CACHE_WRITE_INPUT_RATIO: f64 = 1.25;

/// Rates for one model, in USD per million tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingEntry {
    pub input: f64,
    pub output: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<f64>,
}

impl PricingEntry {
    pub const fn new(input: f64, output: f64) -> Self {
        Self {
            input,
            output,
            cache_read: None,
            cache_write: None,
        }
    }

    pub const fn with_cache(input: f64, output: f64, cache_read: f64, cache_write: f64) -> Self {
        Self {
            input,
            output,
            cache_read: Some(cache_read),
            cache_write: Some(cache_write),
        }
    }

    pub const fn with_cache_read(input: f64, output: f64, cache_read: f64) -> Self {
        Self {
            input,
            output,
            cache_read: Some(cache_read),
            cache_write: None,
        }
    }

    /// Cache-read rate, defaulting to 10% of input. Never written back.
    pub fn cache_read_or_default(&self) -> f64 {
        self.cache_read
            .unwrap_or(self.input * CACHE_READ_INPUT_RATIO)
    }

    /// Cache-write rate, defaulting to 125% of input. Never written back.
    pub fn cache_write_or_default(&self) -> f64 {
        self.cache_write
            .unwrap_or(self.input * CACHE_WRITE_INPUT_RATIO)
    }

    /// Cost in USD of a token breakdown at these rates.
    pub fn cost(&self, input: u64, output: u64, cache_read: u64, cache_write: u64) -> f64 {
        (input as f64 / 1e6) * self.input
            + (output as f64 / 1e6) * self.output
            + (cache_read as f64 / 1e6) * self.cache_read_or_default()
            + (cache_write as f64 / 1e6) * self.cache_write_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_input_output_only() {
        // $3/1M input, $15/1M output
        // 1M input + 0.5M output = 3.0 + 7.5 = 10.5
        let rate = PricingEntry::new(3.0, 15.0);
        let cost = rate.cost(1_000_000, 500_000, 0, 0);
        assert!((cost - 10.5).abs() < 1e-10, "Expected 10.5, got {}", cost);
    }

    #[test]
    fn test_cache_defaults_derived_from_input() {
        let rate = PricingEntry::new(2.0, 8.0);
        assert!((rate.cache_read_or_default() - 0.2).abs() < 1e-12);
        assert!((rate.cache_write_or_default() - 2.5).abs() < 1e-12);
        // Defaults are computed, not stored
        assert_eq!(rate.cache_read, None);
        assert_eq!(rate.cache_write, None);
    }

    #[test]
    fn test_cost_with_explicit_cache_rates() {
        // 1M cache read at $0.30 + 1M cache write at $3.75
        let rate = PricingEntry::with_cache(3.0, 15.0, 0.3, 3.75);
        let cost = rate.cost(0, 0, 1_000_000, 1_000_000);
        assert!((cost - 4.05).abs() < 1e-10, "Expected 4.05, got {}", cost);
    }

    #[test]
    fn test_serialize_omits_missing_cache_rates() {
        let json = serde_json::to_string(&PricingEntry::new(3.0, 15.0)).unwrap();
        assert_eq!(json, r#"{"input":3.0,"output":15.0}"#);
    }
}
