use envconfig::Envconfig;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "BIND_ADDR", default = "127.0.0.1:3002")]
    pub bind_addr: SocketAddr,

    /// Default tracing level when RUST_LOG is not set
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Deployment environment name
    #[envconfig(from = "APP_ENV", default = "development")]
    pub environment: String,

    /// Requests per minute per client address, zero or less disables limiting
    #[envconfig(from = "RATE_LIMIT", default = "60")]
    pub rate_limit: i64,

    /// Require a matching X-API-Key header on API routes
    #[envconfig(from = "VERIFY_API_KEY", default = "false")]
    pub verify_api_key: bool,

    /// Shared secret for X-API-Key
    #[envconfig(from = "API_KEY")]
    pub api_key: Option<String>,

    /// Comma separated referrer hosts, `*.domain` wildcards allowed, `*` for any
    #[envconfig(from = "ALLOWED_REFERRERS", default = "*")]
    pub allowed_referrers: String,

    #[envconfig(from = "CORS_ALLOW_ORIGINS", default = "*")]
    pub cors_allow_origins: String,

    #[envconfig(from = "CORS_ALLOW_METHODS", default = "GET, POST, OPTIONS")]
    pub cors_allow_methods: String,

    #[envconfig(from = "CORS_ALLOW_HEADERS", default = "Content-Type, X-API-Key, Origin, Referer")]
    pub cors_allow_headers: String,

    /// Expose server error details in responses
    #[envconfig(from = "DETAILED_ERRORS", default = "false")]
    pub detailed_errors: bool,

    /// Timeout for requests to the captions provider
    #[envconfig(from = "PROVIDER_TIMEOUT_SECS", default = "20")]
    pub provider_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Allowed referrer patterns, empty when any referrer is accepted.
    pub fn referrer_patterns(&self) -> Vec<String> {
        let patterns = split_list(&self.allowed_referrers);
        if patterns.iter().any(|p| p == "*") {
            Vec::new()
        } else {
            patterns
        }
    }

    pub fn cors_origins(&self) -> Vec<String> {
        split_list(&self.cors_allow_origins)
    }

    pub fn cors_methods(&self) -> Vec<String> {
        split_list(&self.cors_allow_methods)
    }

    pub fn cors_headers(&self) -> Vec<String> {
        split_list(&self.cors_allow_headers)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3002)),
            log_level: "info".to_string(),
            environment: "development".to_string(),
            rate_limit: 60,
            verify_api_key: false,
            api_key: None,
            allowed_referrers: "*".to_string(),
            cors_allow_origins: "*".to_string(),
            cors_allow_methods: "GET, POST, OPTIONS".to_string(),
            cors_allow_headers: "Content-Type, X-API-Key, Origin, Referer".to_string(),
            detailed_errors: false,
            provider_timeout_secs: 20,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
