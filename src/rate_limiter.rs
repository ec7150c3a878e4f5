use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::ApiError;

/// Length of the sliding window and of the interval between sweeps.
pub const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

struct LimiterState {
    windows: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

/// Per-address sliding window rate limiter.
///
/// Each address keeps the instants of its requests from the trailing minute.
/// Addresses that go quiet are dropped by a sweep that runs at most once per
/// window, triggered from `check`.
pub struct RateLimiter {
    requests_per_minute: i64,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// A threshold of zero or less disables limiting.
    pub fn new(requests_per_minute: i64) -> Self {
        Self::starting_at(requests_per_minute, Instant::now())
    }

    pub fn starting_at(requests_per_minute: i64, now: Instant) -> Self {
        Self {
            requests_per_minute,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_sweep: now,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.requests_per_minute > 0
    }

    pub fn requests_per_minute(&self) -> i64 {
        self.requests_per_minute
    }

    /// Record a request from `address` at `now` and decide whether it is over the limit.
    pub fn check(&self, address: &str, now: Instant) -> Result<RateDecision, ApiError> {
        if !self.is_enabled() {
            return Ok(RateDecision::Allowed);
        }

        let mut state = self.lock()?;

        if now.saturating_duration_since(state.last_sweep) > WINDOW {
            let removed = sweep_windows(&mut state.windows, now);
            state.last_sweep = now;
            if removed > 0 {
                tracing::debug!(removed, "Dropped idle rate limit windows");
            }
        }

        let window = state.windows.entry(address.to_string()).or_default();
        window.push_back(now);
        prune(window, now);

        if window.len() as i64 > self.requests_per_minute {
            Ok(RateDecision::Limited)
        } else {
            Ok(RateDecision::Allowed)
        }
    }

    /// Prune every window and drop the empty ones. Returns how many were dropped.
    pub fn sweep(&self, now: Instant) -> Result<usize, ApiError> {
        let mut state = self.lock()?;
        let removed = sweep_windows(&mut state.windows, now);
        state.last_sweep = now;
        Ok(removed)
    }

    /// Number of requests from `address` inside the window ending at `now`.
    pub fn requests_in_window(&self, address: &str, now: Instant) -> Result<usize, ApiError> {
        let state = self.lock()?;
        Ok(state
            .windows
            .get(address)
            .map(|w| w.iter().filter(|t| is_recent(**t, now)).count())
            .unwrap_or(0))
    }

    /// Number of addresses currently tracked.
    pub fn tracked_addresses(&self) -> Result<usize, ApiError> {
        Ok(self.lock()?.windows.len())
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.state.lock();
            panic!("poisoning rate limiter lock");
        }));
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LimiterState>, ApiError> {
        self.state.lock().map_err(|_| {
            ApiError::InternalError("Failed to acquire rate limiter lock".to_string())
        })
    }
}

fn is_recent(t: Instant, now: Instant) -> bool {
    now.saturating_duration_since(t) < WINDOW
}

fn prune(window: &mut VecDeque<Instant>, now: Instant) {
    window.retain(|t| is_recent(*t, now));
}

fn sweep_windows(windows: &mut HashMap<String, VecDeque<Instant>>, now: Instant) -> usize {
    let before = windows.len();
    windows.retain(|_, window| {
        prune(window, now);
        !window.is_empty()
    });
    before - windows.len()
}
