//! Combines a cumulative summary with a live-session result

use crate::types::{CumulativeSummary, LiveSessions, Result, Snapshot};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Builds [`Snapshot`] values. A failed live-session lookup never hides the
/// cumulative summary.
pub struct SnapshotAssembler;

impl SnapshotAssembler {
    /// Assemble a snapshot stamped with the current time.
    pub fn assemble(cumulative: CumulativeSummary, live: Result<LiveSessions>) -> Snapshot {
        Self::assemble_at(cumulative, live, Utc::now())
    }

    pub fn assemble_at(
        cumulative: CumulativeSummary,
        live: Result<LiveSessions>,
        captured_at: DateTime<Utc>,
    ) -> Snapshot {
        let (live, error) = match live {
            Ok(live) => (live, None),
            Err(e) => {
                warn!(error = %e, "live sessions unavailable");
                (LiveSessions::default(), Some(e.to_string()))
            }
        };

        Snapshot {
            sessions: live.sessions,
            stats: live.stats,
            error,
            cumulative,
            captured_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregator::UsageAggregator;
    use crate::services::pricing::PricingCatalog;
    use crate::types::{ClawdashError, DashboardConfig, LiveSession, SessionStats, SessionStatus};
    use chrono::TimeZone;

    fn summary_with_cost(total_cost: f64) -> CumulativeSummary {
        let config = DashboardConfig::default();
        let pricing = PricingCatalog::builtin();
        CumulativeSummary {
            total_cost,
            ..UsageAggregator::new(&config, &pricing).empty()
        }
    }

    fn live_with_main() -> LiveSessions {
        let mut live = LiveSessions::default();
        live.sessions.main = Some(LiveSession {
            id: "main".into(),
            key: "agent:main:main".into(),
            model: "claude-opus-4-6".into(),
            updated_at: None,
            age_ms: 100,
            status: SessionStatus::Active,
            tokens_in: 10,
            tokens_out: 5,
            tokens: 15,
            cost: 0.0,
            context_tokens: 0,
        });
        live.stats.total = 1;
        live
    }

    #[test]
    fn test_assemble_with_live_sessions() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let snapshot = SnapshotAssembler::assemble_at(summary_with_cost(4.2), Ok(live_with_main()), ts);

        assert_eq!(snapshot.captured_at, ts);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.stats.total, 1);
        assert!(snapshot.sessions.main.is_some());
        assert!((snapshot.cumulative.total_cost - 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_live_failure_keeps_cumulative() {
        let snapshot = SnapshotAssembler::assemble(
            summary_with_cost(9.99),
            Err(ClawdashError::LiveSession("openclaw timed out after 10s".into())),
        );

        assert_eq!(
            snapshot.error.as_deref(),
            Some("live sessions unavailable: openclaw timed out after 10s")
        );
        assert_eq!(snapshot.stats, SessionStats::default());
        assert!(snapshot.sessions.main.is_none());
        assert!(snapshot.sessions.subagents.is_empty());
        assert!((snapshot.cumulative.total_cost - 9.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let snapshot =
            SnapshotAssembler::assemble_at(summary_with_cost(0.0), Ok(LiveSessions::default()), ts);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["ts"], 1_740_787_200_000i64);
        assert!(json.get("error").is_none());
        assert!(json["cumulative"]["totalCost"].is_number());
        assert_eq!(json["stats"]["activeSubagents"], 0);
    }
}
