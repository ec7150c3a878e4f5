use crate::config::Config;
use crate::error::ApiError;

const KNOWN_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the whole service configuration
    pub fn validate(config: &Config) -> Result<(), ApiError> {
        Self::validate_bind_address(&config.bind_addr.to_string())?;
        Self::validate_environment(&config.environment)?;
        Self::validate_api_key(config.verify_api_key, config.api_key.as_deref())?;
        for pattern in config.referrer_patterns() {
            Self::validate_referrer_pattern(&pattern)?;
        }
        Self::validate_cors_methods(&config.cors_methods())?;
        Self::validate_provider_timeout(config.provider_timeout_secs)?;
        Ok(())
    }

    /// Validates a bind address
    pub fn validate_bind_address(address: &str) -> Result<(), ApiError> {
        if address.is_empty() {
            return Err(ApiError::ConfigurationError(
                "Bind address cannot be empty".to_string(),
            ));
        }

        // Check if it looks like host:port format
        if !address.contains(':') {
            return Err(ApiError::ConfigurationError(
                "Bind address must be in host:port format".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates environment name
    pub fn validate_environment(env: &str) -> Result<(), ApiError> {
        let valid_envs = ["development", "local", "preview", "staging", "production", "test"];
        if !valid_envs.contains(&env.to_lowercase().as_str()) {
            return Err(ApiError::ConfigurationError(format!(
                "Invalid environment '{}'. Must be one of: {:?}",
                env, valid_envs
            )));
        }

        Ok(())
    }

    /// API key verification needs a non-empty key
    pub fn validate_api_key(verify: bool, api_key: Option<&str>) -> Result<(), ApiError> {
        if !verify {
            return Ok(());
        }

        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ApiError::ConfigurationError(
                "VERIFY_API_KEY is enabled but API_KEY is not set".to_string(),
            )),
        }
    }

    /// Validates a referrer host pattern such as `localhost` or `*.example.com`
    pub fn validate_referrer_pattern(pattern: &str) -> Result<(), ApiError> {
        let host = pattern.strip_prefix("*.").unwrap_or(pattern);

        if host.is_empty() || host.contains('*') || host.contains('/') {
            return Err(ApiError::ConfigurationError(format!(
                "Invalid referrer pattern '{}'",
                pattern
            )));
        }

        Ok(())
    }

    /// Validates CORS method names
    pub fn validate_cors_methods(methods: &[String]) -> Result<(), ApiError> {
        for method in methods {
            if method != "*" && !KNOWN_METHODS.contains(&method.to_uppercase().as_str()) {
                return Err(ApiError::ConfigurationError(format!(
                    "Unknown CORS method '{}'",
                    method
                )));
            }
        }

        Ok(())
    }

    pub fn validate_provider_timeout(secs: u64) -> Result<(), ApiError> {
        if secs == 0 {
            return Err(ApiError::ConfigurationError(
                "Provider timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
