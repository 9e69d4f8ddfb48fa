use std::env;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct Config {
    // Redis
    pub redis_url: String,

    // Server
    pub bind_addr: SocketAddr,
    pub public_scheme: String,
    pub max_body_bytes: usize,
    pub cors_allowed_origins: Vec<String>,

    // Sign-in message
    pub sign_in_statement: String,
    pub chain_id: u64,

    // TTLs (in seconds)
    pub nonce_ttl_secs: u64,
    pub session_ttl_secs: u64,

    // Rate limiting
    pub rate_limit_auth_per_min: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("redis_url", &"[REDACTED]")
            .field("bind_addr", &self.bind_addr)
            .field("public_scheme", &self.public_scheme)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("sign_in_statement", &self.sign_in_statement)
            .field("chain_id", &self.chain_id)
            .field("nonce_ttl_secs", &self.nonce_ttl_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("rate_limit_auth_per_min", &self.rate_limit_auth_per_min)
            .finish()
    }
}

/// Settings the challenge and verification services are built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Maximum nonce age accepted at verification (T_nonce).
    pub nonce_ttl_secs: u64,
    /// Statement line of the sign-in message.
    pub statement: String,
    pub chain_id: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            nonce_ttl_secs: 300,
            statement: "Sign in to Spectra Market".to_string(),
            chain_id: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        let defaults = AuthConfig::default();

        // Redis — required to prevent silent unauthenticated connections
        let redis_url =
            env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL".to_string()))?;

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let public_scheme = env::var("PUBLIC_SCHEME").unwrap_or_else(|_| "http".to_string());
        if public_scheme != "http" && public_scheme != "https" {
            return Err(ConfigError::InvalidValue(
                "PUBLIC_SCHEME".to_string(),
                "must be http or https".to_string(),
            ));
        }

        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 65_536)?;

        let cors_allowed_origins: Vec<String> = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Sign-in message
        let sign_in_statement = env::var("SIGN_IN_STATEMENT").unwrap_or(defaults.statement);
        if sign_in_statement.trim().is_empty() || sign_in_statement.contains('\n') {
            return Err(ConfigError::InvalidValue(
                "SIGN_IN_STATEMENT".to_string(),
                "must be a single non-empty line".to_string(),
            ));
        }
        let chain_id = parse_env_or_default("CHAIN_ID", defaults.chain_id)?;

        // TTLs
        let nonce_ttl_secs = parse_env_or_default("NONCE_TTL_SECS", defaults.nonce_ttl_secs)?;
        if nonce_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "NONCE_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        // Rate limiting
        let rate_limit_auth_per_min = parse_env_or_default("RATE_LIMIT_AUTH_PER_MIN", 30)?;

        Ok(Config {
            redis_url,
            bind_addr,
            public_scheme,
            max_body_bytes,
            cors_allowed_origins,
            sign_in_statement,
            chain_id,
            nonce_ttl_secs,
            session_ttl_secs,
            rate_limit_auth_per_min,
        })
    }

    /// The subset injected into the sign-in services.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            nonce_ttl_secs: self.nonce_ttl_secs,
            statement: self.sign_in_statement.clone(),
            chain_id: self.chain_id,
        }
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
