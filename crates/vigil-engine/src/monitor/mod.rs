//! Polling monitors.
//!
//! A [`Monitor`] knows how to fetch its records and how to classify them.
//! [`MonitorRunner`] drives one monitor through its ticks:
//!
//! ```text
//! Idle -> Fetching -> Classifying -> EventEmitted | NoEvent -> Idle
//! ```
//!
//! A failed fetch returns the runner to `Idle` and the tick is skipped; it is
//! never retried within the same tick. Ticks of one runner never overlap
//! because [`MonitorRunner::tick`] takes `&mut self`.

mod freshness;
mod generator;
mod schedule;
mod source;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub use freshness::{FreshnessMonitor, FreshnessSettings};
pub use generator::{EvaluationContext, ExecutionGenerator, ExecutionHandle, LogGenerator};
pub use schedule::{ScheduleMonitor, ScheduleSettings};
pub use source::{AssetSource, TriggerSource};

use crate::classifier::{DetectedTrigger, StaleAsset};
use crate::clock::Clock;
use crate::error::{EngineError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Batch of anomalies found in one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorEvent {
    Schedules { triggers: Vec<DetectedTrigger> },
    StaleAssets { assets: Vec<StaleAsset> },
}

impl MonitorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::Schedules { .. } => "schedules",
            MonitorEvent::StaleAssets { .. } => "stale_assets",
        }
    }

    /// Number of records in the event.
    pub fn len(&self) -> usize {
        match self {
            MonitorEvent::Schedules { triggers } => triggers.len(),
            MonitorEvent::StaleAssets { assets } => assets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Monitor
// ─────────────────────────────────────────────────────────────────────────────

/// A periodic health check over one kind of remote record.
#[async_trait]
pub trait Monitor: Send + Sync {
    type Record: Send + Sync;

    fn name(&self) -> &str;

    /// Time between ticks.
    fn interval(&self) -> Duration;

    /// Fetch every record to classify.
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<Self::Record>>;

    /// Classify fetched records; `None` when everything is healthy.
    fn classify(&self, records: &[Self::Record], now: DateTime<Utc>) -> Option<MonitorEvent>;
}

/// Where a runner is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Idle,
    Fetching,
    Classifying,
    EventEmitted,
    NoEvent,
}

impl fmt::Display for EvaluationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluationState::Idle => "idle",
            EvaluationState::Fetching => "fetching",
            EvaluationState::Classifying => "classifying",
            EvaluationState::EventEmitted => "event_emitted",
            EvaluationState::NoEvent => "no_event",
        };
        f.write_str(name)
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    NoEvent,
    Emitted(ExecutionHandle),
}

// ─────────────────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────────────────

/// Drives a monitor tick by tick.
pub struct MonitorRunner<M> {
    monitor: M,
    generator: Arc<dyn ExecutionGenerator>,
    clock: Arc<dyn Clock>,
    state: EvaluationState,
    ticks: u64,
}

impl<M: Monitor> MonitorRunner<M> {
    /// Fails when the monitor's interval is zero.
    pub fn new(
        monitor: M,
        generator: Arc<dyn ExecutionGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if monitor.interval().is_zero() {
            return Err(EngineError::EmptyRequiredValue(format!(
                "interval of monitor '{}'",
                monitor.name()
            )));
        }
        Ok(Self {
            monitor,
            generator,
            clock,
            state: EvaluationState::Idle,
            ticks: 0,
        })
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn state(&self) -> EvaluationState {
        self.state
    }

    /// Number of ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn transition(&mut self, next: EvaluationState) {
        tracing::trace!(monitor = %self.monitor.name(), from = %self.state, to = %next, "state");
        self.state = next;
    }

    /// Run one complete evaluation.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.ticks += 1;
        let now = self.clock.now();

        self.transition(EvaluationState::Fetching);
        let records = match self.monitor.fetch(now).await {
            Ok(records) => records,
            Err(e) => {
                self.transition(EvaluationState::Idle);
                return Err(e);
            }
        };

        self.transition(EvaluationState::Classifying);
        let outcome = match self.monitor.classify(&records, now) {
            None => {
                self.transition(EvaluationState::NoEvent);
                TickOutcome::NoEvent
            }
            Some(event) => {
                let context = EvaluationContext {
                    monitor: self.monitor.name().to_string(),
                    tick: self.ticks,
                    evaluated_at: now,
                };
                match self.generator.generate(&context, &event).await {
                    Ok(handle) => {
                        self.transition(EvaluationState::EventEmitted);
                        TickOutcome::Emitted(handle)
                    }
                    Err(e) => {
                        self.transition(EvaluationState::Idle);
                        return Err(e);
                    }
                }
            }
        };

        tracing::debug!(
            monitor = %self.monitor.name(),
            tick = self.ticks,
            records = records.len(),
            outcome = %self.state,
            "tick complete"
        );
        self.transition(EvaluationState::Idle);
        Ok(outcome)
    }

    /// Tick every interval until `cancel` fires.
    ///
    /// Tick failures are logged and the runner waits for the next interval.
    /// Cancelling mid-tick drops the partial evaluation.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let interval = self.monitor.interval();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            monitor = %self.monitor.name(),
            interval_secs = interval.as_secs(),
            "monitor started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = self.tick() => {
                            if let Err(e) = result {
                                tracing::warn!(
                                    monitor = %self.monitor.name(),
                                    error = %e,
                                    "tick failed, waiting for next interval"
                                );
                            }
                        }
                    }
                }
            }
        }

        self.state = EvaluationState::Idle;
        tracing::info!(monitor = %self.monitor.name(), ticks = self.ticks, "monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AnomalyVerdict;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use vigil_types::TriggerRecord;

    /// Serves scripted fetch results.
    struct ScriptedMonitor {
        interval: Duration,
        fetches: Mutex<Vec<Result<Vec<TriggerRecord>>>>,
    }

    #[async_trait]
    impl Monitor for ScriptedMonitor {
        type Record = TriggerRecord;

        fn name(&self) -> &str {
            "scripted"
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        async fn fetch(&self, _now: DateTime<Utc>) -> Result<Vec<TriggerRecord>> {
            self.fetches.lock().remove(0)
        }

        fn classify(&self, records: &[TriggerRecord], _now: DateTime<Utc>) -> Option<MonitorEvent> {
            let triggers: Vec<DetectedTrigger> = records
                .iter()
                .map(|r| DetectedTrigger {
                    trigger: r.clone(),
                    verdict: AnomalyVerdict::MissingSchedule,
                })
                .collect();
            (!triggers.is_empty()).then_some(MonitorEvent::Schedules { triggers })
        }
    }

    /// Records every event it receives.
    #[derive(Default)]
    struct RecordingGenerator {
        events: Mutex<Vec<(EvaluationContext, MonitorEvent)>>,
    }

    #[async_trait]
    impl ExecutionGenerator for RecordingGenerator {
        async fn generate(
            &self,
            context: &EvaluationContext,
            event: &MonitorEvent,
        ) -> Result<ExecutionHandle> {
            self.events.lock().push((context.clone(), event.clone()));
            Ok(ExecutionHandle {
                id: format!("exec-{}", context.tick),
                monitor: context.monitor.clone(),
                emitted_at: context.evaluated_at,
                records: event.len(),
            })
        }
    }

    fn runner(
        fetches: Vec<Result<Vec<TriggerRecord>>>,
        generator: Arc<RecordingGenerator>,
    ) -> MonitorRunner<ScriptedMonitor> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
        ));
        MonitorRunner::new(
            ScriptedMonitor {
                interval: Duration::from_secs(60),
                fetches: Mutex::new(fetches),
            },
            generator,
            clock,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_tick_emits_one_batch_event() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(
            vec![Ok(vec![
                TriggerRecord::new("a", "b", "c"),
                TriggerRecord::new("a", "b", "d"),
            ])],
            generator.clone(),
        );

        let outcome = runner.tick().await.unwrap();

        assert!(matches!(outcome, TickOutcome::Emitted(ref h) if h.records == 2));
        assert_eq!(generator.events.lock().len(), 1);
        assert_eq!(runner.state(), EvaluationState::Idle);
    }

    #[tokio::test]
    async fn test_healthy_tick_emits_nothing() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(vec![Ok(Vec::new())], generator.clone());

        assert_eq!(runner.tick().await.unwrap(), TickOutcome::NoEvent);
        assert!(generator.events.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_to_idle_without_event() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(
            vec![
                Err(EngineError::Transport(vigil_client::Error::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                })),
                Ok(vec![TriggerRecord::new("a", "b", "c")]),
            ],
            generator.clone(),
        );

        assert!(runner.tick().await.is_err());
        assert_eq!(runner.state(), EvaluationState::Idle);
        assert!(generator.events.lock().is_empty());

        // The next tick starts fresh
        assert!(matches!(runner.tick().await.unwrap(), TickOutcome::Emitted(_)));
        assert_eq!(runner.ticks(), 2);
        assert_eq!(generator.events.lock()[0].0.tick, 2);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = MonitorRunner::new(
            ScriptedMonitor {
                interval: Duration::ZERO,
                fetches: Mutex::new(Vec::new()),
            },
            Arc::new(RecordingGenerator::default()),
            Arc::new(FixedClock::new(Utc::now())),
        );
        assert!(matches!(result, Err(EngineError::EmptyRequiredValue(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancel() {
        let generator = Arc::new(RecordingGenerator::default());
        let mut runner = runner(
            vec![Ok(Vec::new()), Ok(Vec::new()), Ok(Vec::new())],
            generator,
        );
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            stopper.cancel();
        });

        runner.run(cancel).await;

        // Ticks at 0s and 60s, cancelled at 90s
        assert_eq!(runner.ticks(), 2);
        assert_eq!(runner.state(), EvaluationState::Idle);
    }
}
