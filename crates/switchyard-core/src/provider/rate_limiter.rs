//! Sliding-window request admission per provider.
//!
//! Each tracked provider owns a queue of admitted-request timestamps, oldest
//! first. Every query recomputes `window_start = now - window` and only
//! timestamps strictly after it count, so arbitrary gaps between calls are
//! handled without a background sweeper.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use switchyard_types::error::{GatewayError, ResourceKind};
use switchyard_types::gateway::RateLimitInfo;
use switchyard_types::provider::RateLimitPolicy;

use crate::clock::{millis_between, Clock};

#[derive(Debug)]
struct RateWindow {
    policy: RateLimitPolicy,
    timestamps: VecDeque<DateTime<Utc>>,
}

impl RateWindow {
    /// The window as a signed span, or `None` if it exceeds chrono's range.
    fn span(&self) -> Option<chrono::Duration> {
        i64::try_from(self.policy.window_ms)
            .ok()
            .and_then(chrono::Duration::try_milliseconds)
    }

    /// `None` when the window reaches back past the earliest representable
    /// instant: every recorded timestamp is then in-window.
    fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.span().and_then(|span| now.checked_sub_signed(span))
    }

    /// Drop timestamps at or before the window start.
    fn prune(&mut self, now: DateTime<Utc>) {
        let start = self.window_start(now);
        while self.timestamps.front().is_some_and(|ts| is_stale(*ts, start)) {
            self.timestamps.pop_front();
        }
    }

    /// In-window count without mutating the queue.
    fn count(&self, now: DateTime<Utc>) -> u32 {
        let start = self.window_start(now);
        let stale = self.timestamps.partition_point(|ts| is_stale(*ts, start));
        u32::try_from(self.timestamps.len() - stale).unwrap_or(u32::MAX)
    }

    /// Oldest timestamp still inside the window.
    fn oldest(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = self.window_start(now);
        self.timestamps
            .iter()
            .find(|ts| !is_stale(**ts, start))
            .copied()
    }

    /// When the oldest in-window request leaves the window. Saturates at
    /// the latest representable instant.
    fn reset_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.oldest(now).map(|oldest| {
            self.span()
                .and_then(|span| oldest.checked_add_signed(span))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    fn until_reset(&self, now: DateTime<Utc>) -> Duration {
        self.reset_at(now)
            .map(|reset| Duration::from_millis(millis_between(now, reset)))
            .unwrap_or(Duration::ZERO)
    }
}

fn is_stale(ts: DateTime<Utc>, window_start: Option<DateTime<Utc>>) -> bool {
    window_start.is_some_and(|start| ts <= start)
}

/// Per-provider sliding-window rate limiter.
///
/// Providers must be registered with a policy before they can be queried.
/// An unknown provider id is reported as [`GatewayError::NotFound`] rather
/// than silently admitted.
pub struct RateLimiter {
    windows: DashMap<String, RateWindow>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Track `provider_id` under `policy`.
    ///
    /// Re-registering replaces the policy but keeps already-recorded requests.
    pub fn register(&self, provider_id: &str, policy: RateLimitPolicy) {
        self.windows
            .entry(provider_id.to_string())
            .and_modify(|w| w.policy = policy)
            .or_insert_with(|| RateWindow {
                policy,
                timestamps: VecDeque::new(),
            });
        debug!(
            provider_id,
            max_requests = policy.max_requests,
            window_ms = policy.window_ms,
            "Rate limit policy registered"
        );
    }

    /// Stop tracking a provider. Returns whether it was tracked.
    pub fn unregister(&self, provider_id: &str) -> bool {
        self.windows.remove(provider_id).is_some()
    }

    pub fn is_tracked(&self, provider_id: &str) -> bool {
        self.windows.contains_key(provider_id)
    }

    /// Tracked provider ids, sorted.
    pub fn tracked(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.windows.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Admit a request if the in-window count is below the limit.
    ///
    /// Records the request only when admitting. A denial leaves the window
    /// untouched.
    pub fn admit(&self, provider_id: &str) -> Result<bool, GatewayError> {
        let now = self.clock.now();
        let mut window = self
            .windows
            .get_mut(provider_id)
            .ok_or_else(|| unknown(provider_id))?;

        window.prune(now);
        if (window.timestamps.len() as u64) < u64::from(window.policy.max_requests) {
            window.timestamps.push_back(now);
            Ok(true)
        } else {
            warn!(
                provider_id,
                limit = window.policy.max_requests,
                "Rate limit admission denied"
            );
            Ok(false)
        }
    }

    /// Same decision as [`admit`](Self::admit) without recording anything.
    pub fn check(&self, provider_id: &str) -> Result<bool, GatewayError> {
        let now = self.clock.now();
        let window = self
            .windows
            .get(provider_id)
            .ok_or_else(|| unknown(provider_id))?;
        Ok(window.count(now) < window.policy.max_requests)
    }

    pub fn info(&self, provider_id: &str) -> Result<RateLimitInfo, GatewayError> {
        let now = self.clock.now();
        let window = self
            .windows
            .get(provider_id)
            .ok_or_else(|| unknown(provider_id))?;

        let current_count = window.count(now);
        let limit = window.policy.max_requests;
        Ok(RateLimitInfo {
            limit,
            remaining: limit.saturating_sub(current_count),
            current_count,
            reset_time: window.reset_at(now).unwrap_or(now),
        })
    }

    /// Time until the oldest in-window request leaves the window.
    ///
    /// Zero when the window is empty: nothing is holding budget.
    pub fn time_until_reset(&self, provider_id: &str) -> Result<Duration, GatewayError> {
        let now = self.clock.now();
        let window = self
            .windows
            .get(provider_id)
            .ok_or_else(|| unknown(provider_id))?;
        Ok(window.until_reset(now))
    }

    /// Forget every recorded request for a provider.
    pub fn reset(&self, provider_id: &str) -> Result<(), GatewayError> {
        let mut window = self
            .windows
            .get_mut(provider_id)
            .ok_or_else(|| unknown(provider_id))?;
        window.timestamps.clear();
        debug!(provider_id, "Rate window reset");
        Ok(())
    }
}

fn unknown(provider_id: &str) -> GatewayError {
    GatewayError::not_found(ResourceKind::RateLimit, provider_id)
}
