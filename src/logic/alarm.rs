//! Alarm Evaluator - consecutive-breach alerting with hysteresis
//!
//! One evaluation per drift-score observation. The alert fires only after
//! `evaluation_periods` consecutive breaches of `threshold` and clears on
//! the first non-breaching observation, emitting exactly one event per
//! state transition so a stable condition never storms the alert sink.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct AlarmConfig {
    pub threshold: f64,
    pub evaluation_periods: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            evaluation_periods: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPhase {
    /// No breach streak in progress.
    Normal,
    /// Breaching, but below the consecutive-period threshold.
    Armed,
    /// Alert is firing.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    Raised,
    Cleared,
}

/// Emitted once per state transition.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmEvent {
    pub id: Uuid,
    pub kind: AlarmKind,
    pub score: f64,
    pub threshold: f64,
    pub consecutive_breaches: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlarmSnapshot {
    pub phase: AlarmPhase,
    pub consecutive_breaches: u32,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub last_transition: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct AlarmState {
    phase: AlarmPhase,
    consecutive_breaches: u32,
    last_transition: Option<DateTime<Utc>>,
}

/// Mutex-guarded evaluator; the lock serializes the read-then-write on the
/// breach counter across concurrent requests.
pub struct AlarmEvaluator {
    config: AlarmConfig,
    state: Mutex<AlarmState>,
}

impl AlarmEvaluator {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            state: Mutex::new(AlarmState {
                phase: AlarmPhase::Normal,
                consecutive_breaches: 0,
                last_transition: None,
            }),
        }
    }

    /// Feed one aggregate drift score. Returns an event only on a
    /// Normal/Armed -> Active or Active -> Normal transition.
    ///
    /// A non-finite score counts as a breach: a scorer that produces NaN is
    /// itself an anomaly, and the evaluator fails toward alerting rather
    /// than silently swallowing it.
    pub fn evaluate(&self, score: f64, now: DateTime<Utc>) -> Option<AlarmEvent> {
        let breach = !score.is_finite() || score > self.config.threshold;
        let mut state = self.state.lock();

        if breach {
            state.consecutive_breaches = state.consecutive_breaches.saturating_add(1);
            if state.consecutive_breaches >= self.config.evaluation_periods
                && state.phase != AlarmPhase::Active
            {
                state.phase = AlarmPhase::Active;
                state.last_transition = Some(now);
                tracing::warn!(
                    score,
                    threshold = self.config.threshold,
                    breaches = state.consecutive_breaches,
                    "drift alarm raised"
                );
                return Some(self.event(AlarmKind::Raised, score, &state, now));
            }
            if state.phase == AlarmPhase::Normal {
                state.phase = AlarmPhase::Armed;
            }
            None
        } else {
            state.consecutive_breaches = 0;
            match state.phase {
                AlarmPhase::Active => {
                    state.phase = AlarmPhase::Normal;
                    state.last_transition = Some(now);
                    tracing::info!(score, "drift alarm cleared");
                    Some(self.event(AlarmKind::Cleared, score, &state, now))
                }
                AlarmPhase::Armed => {
                    state.phase = AlarmPhase::Normal;
                    None
                }
                AlarmPhase::Normal => None,
            }
        }
    }

    fn event(
        &self,
        kind: AlarmKind,
        score: f64,
        state: &AlarmState,
        now: DateTime<Utc>,
    ) -> AlarmEvent {
        AlarmEvent {
            id: Uuid::new_v4(),
            kind,
            score,
            threshold: self.config.threshold,
            consecutive_breaches: state.consecutive_breaches,
            timestamp: now,
        }
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        let state = self.state.lock();
        AlarmSnapshot {
            phase: state.phase,
            consecutive_breaches: state.consecutive_breaches,
            threshold: self.config.threshold,
            evaluation_periods: self.config.evaluation_periods,
            last_transition: state.last_transition,
        }
    }
}
