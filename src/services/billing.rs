//! Billing classification: subscription vs. pay-per-use vs. free

use crate::services::family::ModelFamily;
use crate::types::{BillingClassification, DashboardConfig, PlanType};

/// Placeholder model names that never incur cost
pub const NON_BILLABLE_MODELS: &[&str] = &["delivery-mirror"];

/// Subscription families whose flat plan covers a quota and meters the
/// overflow. Overflow messages arrive with a nonzero reported cost.
pub const METERED_OVERFLOW_FAMILIES: &[ModelFamily] = &[ModelFamily::Google];

/// Classifies events against the configured subscriptions.
pub struct BillingClassifier<'a> {
    config: &'a DashboardConfig,
}

impl<'a> BillingClassifier<'a> {
    pub fn new(config: &'a DashboardConfig) -> Self {
        Self { config }
    }

    /// Plan type and subscription key implied by the model name alone.
    pub fn classify(&self, model: &str) -> BillingClassification {
        if model.is_empty() || NON_BILLABLE_MODELS.contains(&model) {
            return BillingClassification::free();
        }

        let family = ModelFamily::of(model);
        match family {
            ModelFamily::Unknown => BillingClassification::free(),
            ModelFamily::Xai => BillingClassification::pay_per_use(),
            ModelFamily::Claude | ModelFamily::OpenAi | ModelFamily::Google => {
                match self.subscription_for(family) {
                    Some(key) => BillingClassification::subscription(key),
                    None => BillingClassification::pay_per_use(),
                }
            }
        }
    }

    /// Apply the metered-overflow override to a classification.
    pub fn refine(
        &self,
        classification: &BillingClassification,
        reported_cost: Option<f64>,
    ) -> PlanType {
        if classification.plan_type != PlanType::Subscription {
            return classification.plan_type;
        }
        let Some(key) = classification.subscription_key.as_deref() else {
            return classification.plan_type;
        };
        let metered = METERED_OVERFLOW_FAMILIES
            .iter()
            .any(|family| family.owns_subscription(key));
        if metered && reported_cost.is_some_and(|c| c > 0.0) {
            PlanType::PayPerUse
        } else {
            PlanType::Subscription
        }
    }

    /// `classify` followed by `refine`. The subscription key is only kept
    /// when the event is actually billed to the subscription.
    pub fn determine(&self, model: &str, reported_cost: Option<f64>) -> BillingClassification {
        let classification = self.classify(model);
        match self.refine(&classification, reported_cost) {
            PlanType::Subscription => classification,
            plan_type => BillingClassification {
                subscription_key: None,
                plan_type,
            },
        }
    }

    /// First configured subscription key (in key order) owned by `family`.
    fn subscription_for(&self, family: ModelFamily) -> Option<&'a str> {
        self.config
            .subscriptions
            .keys()
            .find(|key| family.owns_subscription(key))
            .map(String::as_str)
    }
}
