use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::rate_limiter::RateLimiter;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub rate_limiter: ServiceStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub tracked_addresses: usize,
    pub error: Option<String>,
}

pub struct HealthChecker {
    rate_limiter: Arc<RateLimiter>,
    started_at: Instant,
}

impl HealthChecker {
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            rate_limiter,
            started_at: Instant::now(),
        }
    }

    pub fn check_health(&self) -> HealthStatus {
        let rate_limiter = self.check_rate_limiter();

        let overall_status = if rate_limiter.status == "unhealthy" {
            "degraded"
        } else {
            "healthy"
        };

        HealthStatus {
            status: overall_status.to_string(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            dependencies: DependencyStatus { rate_limiter },
        }
    }

    fn check_rate_limiter(&self) -> ServiceStatus {
        if !self.rate_limiter.is_enabled() {
            return ServiceStatus {
                status: "disabled".to_string(),
                tracked_addresses: 0,
                error: None,
            };
        }

        match self.rate_limiter.tracked_addresses() {
            Ok(tracked_addresses) => ServiceStatus {
                status: "healthy".to_string(),
                tracked_addresses,
                error: None,
            },
            Err(err) => ServiceStatus {
                status: "unhealthy".to_string(),
                tracked_addresses: 0,
                error: Some(err.to_string()),
            },
        }
    }
}
