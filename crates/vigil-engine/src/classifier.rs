//! Health classification of triggers and assets.
//!
//! Classification is pure: the current instant arrives inside the rules, so
//! the same record and rules always produce the same verdict.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::{Asset, TriggerRecord};

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Allowed delay when none is configured.
pub const DEFAULT_ALLOWED_DELAY: Duration = Duration::from_secs(60);

/// Thresholds a schedule trigger is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRules {
    pub now: DateTime<Utc>,
    /// Grace period after the expected next execution.
    pub allowed_delay: Duration,
    /// Longest acceptable gap since the last execution.
    pub max_execution_interval: Option<Duration>,
    /// Longest acceptable run time of the current execution.
    pub max_execution_duration: Option<Duration>,
}

impl ScheduleRules {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            allowed_delay: DEFAULT_ALLOWED_DELAY,
            max_execution_interval: None,
            max_execution_duration: None,
        }
    }
}

/// What to do with an asset that has never reported an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTimestamp {
    #[default]
    Stale,
    Skip,
}

/// Freshness threshold for assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessRule {
    pub max_staleness: Duration,
    pub now: DateTime<Utc>,
    pub missing_timestamp: MissingTimestamp,
}

impl StalenessRule {
    pub fn new(max_staleness: Duration, now: DateTime<Utc>) -> Self {
        Self {
            max_staleness,
            now,
            missing_timestamp: MissingTimestamp::default(),
        }
    }

    /// Latest `updated` instant that still counts as stale.
    pub fn threshold(&self) -> Option<DateTime<Utc>> {
        sub(self.now, self.max_staleness)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verdicts
// ─────────────────────────────────────────────────────────────────────────────

/// Why a schedule is considered stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StuckCause {
    /// The next scheduled run did not start in time.
    MissedSchedule,
    /// No run for longer than the maximum execution interval.
    NoRecentExecution,
}

/// Outcome of classifying one unhealthy trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyVerdict {
    Disabled,
    Stuck {
        cause: StuckCause,
        /// When the run should have happened.
        expected_at: DateTime<Utc>,
        /// Time past the tolerated deadline, i.e. excluding the allowed
        /// delay. [`AnomalyVerdict::overdue`] gives the time since `expected_at`.
        #[serde(with = "secs")]
        late_by: Duration,
    },
    /// The trigger has no next execution date.
    MissingSchedule,
    RunningTooLong {
        execution_id: String,
        #[serde(with = "secs")]
        running_for: Duration,
    },
}

impl AnomalyVerdict {
    /// Time elapsed since the expected run, ignoring any grace period.
    ///
    /// Only stuck verdicts carry an expected instant.
    pub fn overdue(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            AnomalyVerdict::Stuck { expected_at, .. } => Some(elapsed(*expected_at, now)),
            _ => None,
        }
    }

    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyVerdict::Disabled => "disabled",
            AnomalyVerdict::Stuck {
                cause: StuckCause::MissedSchedule,
                ..
            } => "missed_schedule",
            AnomalyVerdict::Stuck {
                cause: StuckCause::NoRecentExecution,
                ..
            } => "no_recent_execution",
            AnomalyVerdict::MissingSchedule => "missing_schedule",
            AnomalyVerdict::RunningTooLong { .. } => "running_too_long",
        }
    }
}

/// A trigger together with the verdict it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTrigger {
    #[serde(flatten)]
    pub trigger: TriggerRecord,
    pub verdict: AnomalyVerdict,
}

/// An asset that has not been updated recently enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleAsset {
    #[serde(flatten)]
    pub asset: Asset,
    /// Time since the last update; absent when the asset never reported one.
    #[serde(
        default,
        with = "opt_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub stale_for: Option<Duration>,
    pub checked_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Classify one trigger. The first matching rule wins:
///
/// 1. disabled: reported only with `include_disabled`, otherwise skipped
/// 2. backfill in progress: skipped
/// 3. current execution running longer than `max_execution_duration`
/// 4. last execution older than `max_execution_interval`
/// 5. no next execution date
/// 6. next execution more than `allowed_delay` in the past
pub fn classify(
    record: &TriggerRecord,
    rules: &ScheduleRules,
    include_disabled: bool,
) -> Option<AnomalyVerdict> {
    let now = rules.now;

    if record.disabled {
        return include_disabled.then_some(AnomalyVerdict::Disabled);
    }

    if record.backfill {
        return None;
    }

    if let (Some(limit), Some(execution_id), Some(since)) = (
        rules.max_execution_duration,
        record.running_execution_id.as_ref(),
        record.running_since,
    ) {
        let running_for = elapsed(since, now);
        if running_for > limit {
            return Some(AnomalyVerdict::RunningTooLong {
                execution_id: execution_id.clone(),
                running_for,
            });
        }
    }

    if let (Some(interval), Some(last)) = (rules.max_execution_interval, record.last_execution_time)
        && let Some(expected_at) = add(last, interval)
        && now > expected_at
    {
        return Some(AnomalyVerdict::Stuck {
            cause: StuckCause::NoRecentExecution,
            expected_at,
            late_by: elapsed(expected_at, now),
        });
    }

    let Some(next) = record.next_execution_time else {
        return Some(AnomalyVerdict::MissingSchedule);
    };

    if let Some(deadline) = add(next, rules.allowed_delay)
        && now > deadline
    {
        return Some(AnomalyVerdict::Stuck {
            cause: StuckCause::MissedSchedule,
            expected_at: next,
            late_by: elapsed(deadline, now),
        });
    }

    None
}

/// Classify one asset against a staleness rule.
///
/// An asset is stale once `max_staleness` has fully elapsed since its last
/// update, which matches the server-side `UPDATED <= now - max_staleness`
/// filter.
pub fn classify_asset(asset: &Asset, rule: &StalenessRule) -> Option<StaleAsset> {
    let stale_for = match asset.updated {
        Some(updated) => {
            let age = elapsed(updated, rule.now);
            if updated > rule.now || age < rule.max_staleness {
                return None;
            }
            Some(age)
        }
        None => match rule.missing_timestamp {
            MissingTimestamp::Stale => None,
            MissingTimestamp::Skip => return None,
        },
    };

    Some(StaleAsset {
        asset: asset.clone(),
        stale_for,
        checked_at: rule.now,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Time arithmetic
// ─────────────────────────────────────────────────────────────────────────────

/// `at + duration`, or `None` past the representable range.
fn add(at: DateTime<Utc>, duration: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
}

fn sub(at: DateTime<Utc>, duration: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_sub_signed(delta))
}

/// Time from `from` to `to`, zero when `to` is earlier.
pub(crate) fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or_default()
}

/// Durations as whole seconds on the wire.
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

pub(crate) mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&value.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|v| v.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn hours(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    fn schedule() -> TriggerRecord {
        let mut record = TriggerRecord::new("company.team", "etl", "daily");
        record.trigger_type = Some("io.example.core.trigger.Schedule".to_string());
        record.next_execution_time = Some(now() + TimeDelta::minutes(30));
        record
    }

    #[test]
    fn test_healthy_trigger() {
        assert_eq!(classify(&schedule(), &ScheduleRules::new(now()), false), None);
    }

    #[test]
    fn test_disabled_only_with_flag() {
        let mut record = schedule();
        record.disabled = true;
        // Also overdue, but disabled takes precedence
        record.next_execution_time = Some(now() - TimeDelta::hours(5));

        let rules = ScheduleRules::new(now());
        assert_eq!(classify(&record, &rules, false), None);
        assert_eq!(
            classify(&record, &rules, true),
            Some(AnomalyVerdict::Disabled)
        );
    }

    #[test]
    fn test_backfill_is_skipped() {
        let mut record = schedule();
        record.backfill = true;
        record.next_execution_time = None;
        assert_eq!(classify(&record, &ScheduleRules::new(now()), true), None);
    }

    #[test]
    fn test_missed_schedule_late_by_counts_from_deadline() {
        let mut record = schedule();
        record.next_execution_time = Some(now() - TimeDelta::hours(2));
        let rules = ScheduleRules {
            allowed_delay: hours(1),
            ..ScheduleRules::new(now())
        };

        let verdict = classify(&record, &rules, false).unwrap();
        assert_eq!(
            verdict,
            AnomalyVerdict::Stuck {
                cause: StuckCause::MissedSchedule,
                expected_at: now() - TimeDelta::hours(2),
                late_by: hours(1),
            }
        );
        assert_eq!(verdict.overdue(now()), Some(hours(2)));
    }

    #[test]
    fn test_within_allowed_delay_is_healthy() {
        let mut record = schedule();
        record.next_execution_time = Some(now() - TimeDelta::seconds(30));
        assert_eq!(classify(&record, &ScheduleRules::new(now()), false), None);
    }

    #[test]
    fn test_exactly_at_deadline_is_healthy() {
        let mut record = schedule();
        record.next_execution_time = Some(now() - TimeDelta::seconds(60));
        assert_eq!(classify(&record, &ScheduleRules::new(now()), false), None);
    }

    #[test]
    fn test_missing_schedule() {
        let mut record = schedule();
        record.next_execution_time = None;
        assert_eq!(
            classify(&record, &ScheduleRules::new(now()), false),
            Some(AnomalyVerdict::MissingSchedule)
        );
    }

    #[test]
    fn test_no_recent_execution() {
        let mut record = schedule();
        record.last_execution_time = Some(now() - TimeDelta::hours(30));
        let rules = ScheduleRules {
            max_execution_interval: Some(hours(24)),
            ..ScheduleRules::new(now())
        };

        assert_eq!(
            classify(&record, &rules, false),
            Some(AnomalyVerdict::Stuck {
                cause: StuckCause::NoRecentExecution,
                expected_at: now() - TimeDelta::hours(6),
                late_by: hours(6),
            })
        );
    }

    #[test]
    fn test_no_recent_execution_wins_over_missing_schedule() {
        let mut record = schedule();
        record.next_execution_time = None;
        record.last_execution_time = Some(now() - TimeDelta::hours(30));
        let rules = ScheduleRules {
            max_execution_interval: Some(hours(24)),
            ..ScheduleRules::new(now())
        };

        assert_eq!(classify(&record, &rules, false).unwrap().label(), "no_recent_execution");
    }

    #[test]
    fn test_running_too_long_wins_over_overdue() {
        let mut record = schedule();
        record.next_execution_time = Some(now() - TimeDelta::hours(3));
        record.running_execution_id = Some("exec-1".to_string());
        record.running_since = Some(now() - TimeDelta::hours(2));
        let rules = ScheduleRules {
            max_execution_duration: Some(hours(1)),
            ..ScheduleRules::new(now())
        };

        assert_eq!(
            classify(&record, &rules, false),
            Some(AnomalyVerdict::RunningTooLong {
                execution_id: "exec-1".to_string(),
                running_for: hours(2),
            })
        );
    }

    #[test]
    fn test_running_within_limit_falls_through() {
        let mut record = schedule();
        record.running_execution_id = Some("exec-1".to_string());
        record.running_since = Some(now() - TimeDelta::minutes(10));
        let rules = ScheduleRules {
            max_execution_duration: Some(hours(1)),
            ..ScheduleRules::new(now())
        };
        assert_eq!(classify(&record, &rules, false), None);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let mut record = schedule();
        record.next_execution_time = Some(now() - TimeDelta::hours(2));
        let rules = ScheduleRules::new(now());
        assert_eq!(
            classify(&record, &rules, false),
            classify(&record, &rules, false)
        );
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = AnomalyVerdict::RunningTooLong {
            execution_id: "exec-1".to_string(),
            running_for: hours(2),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["kind"], "running_too_long");
        assert_eq!(json["running_for"], 7200);
    }

    fn asset(updated: Option<DateTime<Utc>>) -> Asset {
        let mut asset = Asset::new("orders", "table");
        asset.updated = updated;
        asset
    }

    #[test]
    fn test_stale_asset() {
        let rule = StalenessRule::new(hours(24), now());
        let stale = classify_asset(&asset(Some(now() - TimeDelta::hours(30))), &rule).unwrap();

        assert_eq!(stale.stale_for, Some(hours(30)));
        assert_eq!(stale.checked_at, now());
    }

    #[test]
    fn test_fresh_asset() {
        let rule = StalenessRule::new(hours(24), now());
        assert!(classify_asset(&asset(Some(now() - TimeDelta::hours(1))), &rule).is_none());
        // Clock skew: an update in the future is fresh
        assert!(classify_asset(&asset(Some(now() + TimeDelta::hours(1))), &rule).is_none());
    }

    #[test]
    fn test_asset_at_threshold_is_stale() {
        let rule = StalenessRule::new(hours(24), now());
        assert!(classify_asset(&asset(rule.threshold()), &rule).is_some());
    }

    #[test]
    fn test_missing_timestamp_policy() {
        let mut rule = StalenessRule::new(hours(24), now());
        let stale = classify_asset(&asset(None), &rule).unwrap();
        assert!(stale.stale_for.is_none());

        rule.missing_timestamp = MissingTimestamp::Skip;
        assert!(classify_asset(&asset(None), &rule).is_none());
    }

    #[test]
    fn test_stale_asset_serialization() {
        let rule = StalenessRule::new(hours(24), now());
        let stale = classify_asset(&asset(Some(now() - TimeDelta::hours(30))), &rule).unwrap();
        let json = serde_json::to_value(&stale).unwrap();

        assert_eq!(json["id"], "orders");
        assert_eq!(json["staleFor"], 108000);
        assert!(json.get("checkedAt").is_some());
    }
}
