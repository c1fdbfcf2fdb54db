//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    AI_PROVIDER_ANTHROPIC, AI_PROVIDER_OPENAI, DEFAULT_ANTHROPIC_BASE_URL,
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, DEFAULT_REDIS_URL, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH,
};

/// Hosted language model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Anthropic,
}

impl AiProvider {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            AI_PROVIDER_OPENAI => Some(AiProvider::OpenAi),
            AI_PROVIDER_ANTHROPIC => Some(AiProvider::Anthropic),
            _ => None,
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => DEFAULT_OPENAI_MODEL,
            AiProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            AiProvider::OpenAi => DEFAULT_OPENAI_BASE_URL,
            AiProvider::Anthropic => DEFAULT_ANTHROPIC_BASE_URL,
        }
    }
}

/// Language model settings. Absent when no API key is configured.
#[derive(Clone)]
pub struct AiSettings {
    pub provider: AiProvider,
    api_key: String,
    pub model: String,
    pub base_url: String,
}

impl AiSettings {
    pub fn new(provider: AiProvider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
            base_url: provider.default_base_url().to_string(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn from_env() -> Option<Self> {
        let provider = env::var("AI_PROVIDER")
            .ok()
            .map(|value| {
                AiProvider::parse(&value).unwrap_or_else(|| {
                    tracing::warn!(provider = %value, "Unknown AI_PROVIDER, falling back to openai");
                    AiProvider::OpenAi
                })
            })
            .unwrap_or(AiProvider::OpenAi);

        let api_key = env::var("AI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;

        Some(Self {
            provider,
            api_key,
            model: env::var("AI_MODEL").unwrap_or_else(|_| provider.default_model().to_string()),
            base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| provider.default_base_url().to_string()),
        })
    }
}

impl std::fmt::Debug for AiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiSettings")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub ai: Option<AiSettings>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("ai", &self.ai)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set in release builds or is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let ai = AiSettings::from_env();
        if ai.is_none() {
            tracing::info!("AI_API_KEY not set, assistant endpoints are disabled");
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            ai,
        }
    }

    /// Build a configuration with explicit values (tests and tooling).
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            ai: None,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(AiProvider::parse("openai"), Some(AiProvider::OpenAi));
        assert_eq!(AiProvider::parse(" Anthropic "), Some(AiProvider::Anthropic));
        assert_eq!(AiProvider::parse("gemini"), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::with_secret("super-secret-value-that-is-long-enough");
        config.ai = Some(AiSettings::new(AiProvider::Anthropic, "sk-live-key", "model"));
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("sk-live-key"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
