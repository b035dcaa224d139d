//! Position feedback: applies `position` events from the axis server to the
//! store and keeps the event connection alive forever.

use crate::core::store::MountStore;
use crate::domain::model::{Axis, AxisIds};
use crate::domain::ports::{EventConnector, EventStream, ServerEvent};
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const POSITION_EVENT: &str = "position";

/// Payload of a `position` event. RA axes report `*_astronomical`, DEC axes
/// report `*_angle`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PositionEvent {
    pub id: String,
    #[serde(default)]
    pub position_astronomical: Option<Value>,
    #[serde(default)]
    pub target_astronomical: Option<Value>,
    #[serde(default)]
    pub position_angle: Option<Value>,
    #[serde(default)]
    pub target_angle: Option<Value>,
    #[serde(default)]
    pub tracking: Option<bool>,
}

impl PositionEvent {
    /// Partial state tree for this event, `None` for an unknown axis id.
    pub fn store_patch(&self, axes: &AxisIds) -> Option<Value> {
        let axis = axes.axis_for(&self.id)?;
        let mut mount = Map::new();
        let mut target = Map::new();

        match axis {
            Axis::RightAscension => {
                if let Some(position) = &self.position_astronomical {
                    mount.insert("right_ascension".into(), position.clone());
                }
                if let Some(position) = &self.target_astronomical {
                    target.insert("right_ascension".into(), position.clone());
                }
                if let Some(tracking) = self.tracking {
                    mount.insert(
                        "alignment_status".into(),
                        json!({ "is_tracking": tracking }),
                    );
                }
            }
            Axis::Declination => {
                if let Some(position) = &self.position_angle {
                    mount.insert("declination".into(), position.clone());
                }
                if let Some(position) = &self.target_angle {
                    target.insert("declination".into(), position.clone());
                }
            }
        }

        if !target.is_empty() {
            mount.insert("target".into(), Value::Object(target));
        }
        Some(json!({ "mount": mount }))
    }
}

/// Applies one server event; returns whether the store changed.
pub fn apply_event(store: &MountStore, axes: &AxisIds, event: &ServerEvent) -> bool {
    if event.name != POSITION_EVENT {
        tracing::debug!("Ignoring event '{}'", event.name);
        return false;
    }

    let position: PositionEvent = match serde_json::from_value(event.payload.clone()) {
        Ok(position) => position,
        Err(e) => {
            tracing::warn!("Malformed position event: {}", e);
            return false;
        }
    };

    match position.store_patch(axes) {
        Some(patch) => {
            store.update(patch);
            true
        }
        None => {
            tracing::warn!("Position event for unknown axis '{}'", position.id);
            false
        }
    }
}

/// Delay between connection attempts. Never gives up; `backoff` only
/// changes how long each wait is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: bool,
    pub jitter: bool,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            max_delay: delay,
            backoff: false,
            jitter: false,
        }
    }

    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            backoff: true,
            jitter: true,
        }
    }

    /// Wait before retry number `attempt` (0 = first retry).
    pub fn delay(&self, attempt: u32) -> Duration {
        if !self.backoff {
            return self.base_delay;
        }

        let factor = 2u32.saturating_pow(attempt.min(16));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if !self.jitter || delay.is_zero() {
            return delay;
        }

        // equal jitter: [delay/2, delay]
        let half = delay / 2;
        let spread = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(spread)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Counters exposed for logging and tests.
#[derive(Debug, Default)]
pub struct FeedbackStats {
    pub attempts: AtomicU64,
    pub connections: AtomicU64,
    pub events_applied: AtomicU64,
}

pub struct FeedbackChannel<C: EventConnector> {
    connector: C,
    store: MountStore,
    axes: AxisIds,
    policy: ReconnectPolicy,
    stats: Arc<FeedbackStats>,
}

impl<C: EventConnector> FeedbackChannel<C> {
    pub fn new(connector: C, store: MountStore, axes: AxisIds, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            store,
            axes,
            policy,
            stats: Arc::new(FeedbackStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<FeedbackStats> {
        Arc::clone(&self.stats)
    }

    /// Connect, consume, reconnect. Only returns if the task is aborted.
    pub async fn run(self) {
        let mut failures: u32 = 0;
        loop {
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);
            match self.connector.connect().await {
                Ok(stream) => {
                    failures = 0;
                    self.stats.connections.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("Position feedback connected");
                    self.consume(stream).await;
                    tracing::warn!("Position feedback disconnected");
                }
                Err(e) => {
                    tracing::debug!("Position feedback connect failed: {}", e);
                    failures = failures.saturating_add(1);
                }
            }

            let delay = self.policy.delay(failures.saturating_sub(1));
            tokio::time::sleep(delay).await;
        }
    }

    async fn consume(&self, mut stream: Box<dyn EventStream>) {
        loop {
            match stream.next_event().await {
                Ok(Some(event)) => {
                    if apply_event(&self.store, &self.axes, &event) {
                        self.stats.events_applied.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    tracing::warn!("Position feedback stream error: {}", e);
                    return;
                }
            }
        }
    }
}
