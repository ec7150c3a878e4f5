use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::rate_limiter::WINDOW;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitCounters {
    pub total_requests: u64,
    pub allowed_requests: u64,
    pub limited_requests: u64,
    pub last_reset: u64,
}

impl Default for RateLimitCounters {
    fn default() -> Self {
        Self {
            total_requests: 0,
            allowed_requests: 0,
            limited_requests: 0,
            last_reset: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

impl RateLimitCounters {
    fn record(&mut self, allowed: bool) {
        self.total_requests += 1;
        if allowed {
            self.allowed_requests += 1;
        } else {
            self.limited_requests += 1;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointMetrics {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub rate_limit: RateLimitCounters,
    pub tracked_clients: usize,
    pub clients: HashMap<String, RateLimitCounters>,
    pub endpoints: HashMap<String, EndpointMetrics>,
}

struct ClientEntry {
    counters: RateLimitCounters,
    last_seen: Instant,
}

#[derive(Default)]
struct ClientTable {
    clients: HashMap<String, ClientEntry>,
    last_sweep: Option<Instant>,
}

/// Request counters for `/metrics`.
///
/// Per-client counters only cover clients seen within the last rate limit
/// window; idle clients are swept on the same schedule as the limiter.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    global: Arc<RwLock<RateLimitCounters>>,
    clients: Arc<RwLock<ClientTable>>,
    endpoint_metrics: Arc<RwLock<HashMap<String, EndpointMetrics>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, client_id: &str, allowed: bool, now: Instant) {
        self.global.write().await.record(allowed);

        let mut table = self.clients.write().await;
        let last_sweep = *table.last_sweep.get_or_insert(now);
        if now.saturating_duration_since(last_sweep) > WINDOW {
            prune_idle(&mut table.clients, now);
            table.last_sweep = Some(now);
        }

        let entry = table
            .clients
            .entry(client_id.to_string())
            .or_insert_with(|| ClientEntry {
                counters: RateLimitCounters::default(),
                last_seen: now,
            });
        entry.counters.record(allowed);
        entry.last_seen = now;
    }

    pub async fn record_endpoint(&self, endpoint: &str, success: bool) {
        let mut metrics = self.endpoint_metrics.write().await;
        let endpoint_metrics = metrics.entry(endpoint.to_string()).or_default();

        endpoint_metrics.requests += 1;
        if success {
            endpoint_metrics.successes += 1;
        } else {
            endpoint_metrics.failures += 1;
        }
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let rate_limit = self.global.read().await.clone();
        let clients: HashMap<_, _> = self
            .clients
            .read()
            .await
            .clients
            .iter()
            .map(|(id, entry)| (id.clone(), entry.counters.clone()))
            .collect();
        let endpoints = self.endpoint_metrics.read().await.clone();

        MetricsSnapshot {
            rate_limit,
            tracked_clients: clients.len(),
            clients,
            endpoints,
        }
    }
}

fn prune_idle(clients: &mut HashMap<String, ClientEntry>, now: Instant) {
    clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < WINDOW);
}
