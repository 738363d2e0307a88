use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How often the security alert detector sweeps, in seconds (default: `300`).
    pub sweep_interval_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// External risk-scoring oracle configuration.
    pub oracle: OracleConfig,
}

/// Configuration for the external risk-scoring oracle subprocess.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Command line to invoke, split on whitespace. `None` disables the
    /// oracle entirely and every scan uses the deterministic fallback.
    pub command: Option<Vec<String>>,
    /// How long to wait for the oracle before falling back (default: `5`).
    pub timeout_secs: u64,
}

/// Default oracle timeout in seconds.
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 5;

/// Default detector sweep interval in seconds.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `SWEEP_INTERVAL_SECS`      | `300`                   |
    /// | `RISK_ORACLE_CMD`          | unset (disabled)        |
    /// | `RISK_ORACLE_TIMEOUT_SECS` | `5`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let sweep_interval_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("SWEEP_INTERVAL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let oracle = OracleConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            sweep_interval_secs,
            jwt,
            oracle,
        }
    }
}

impl OracleConfig {
    /// Load oracle configuration from environment variables.
    ///
    /// `RISK_ORACLE_CMD` is a whitespace-separated command line, e.g.
    /// `python3 scripts/assess_risk.py`. When unset or empty the oracle
    /// is disabled.
    pub fn from_env() -> Self {
        let command = std::env::var("RISK_ORACLE_CMD").ok().and_then(|raw| {
            let parts: Vec<String> = raw.split_whitespace().map(String::from).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts)
            }
        });

        let timeout_secs: u64 = std::env::var("RISK_ORACLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_ORACLE_TIMEOUT_SECS.to_string())
            .parse()
            .expect("RISK_ORACLE_TIMEOUT_SECS must be a valid u64");

        Self {
            command,
            timeout_secs,
        }
    }
}
