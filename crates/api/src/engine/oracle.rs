//! External risk-scoring oracle behind a trait seam.
//!
//! Production runs a subprocess (typically a Python model runner) that
//! takes a JSON document as its final argument and prints a JSON verdict
//! to stdout. Every failure mode (disabled, spawn error, timeout, bad
//! exit, malformed output) is surfaced as an [`OracleError`] so the
//! caller can fall back to the deterministic rule-based score.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use shadowid_core::risk::{AnomalyFlags, RiskLevel};
use shadowid_core::types::{DbId, Timestamp};

use crate::config::OracleConfig;

/// Context handed to the oracle for one scan: the rule flags plus the
/// raw issuance and scan attributes the rules were derived from, so a
/// model can weigh the evidence itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleRequest<'a> {
    pub flags: &'a AnomalyFlags,
    pub user_id: DbId,
    pub issued_at: Timestamp,
    pub scanned_at: Timestamp,
    pub issued_location: Option<&'a str>,
    pub scan_location: &'a str,
    pub issuing_fingerprint: Option<&'a str>,
    pub scan_fingerprint: Option<&'a str>,
    /// Seconds between issuance and this scan.
    pub token_age_secs: i64,
    /// Tokens the user created inside the generation-burst window.
    pub recent_token_count: i64,
    /// Travel distance between issuance and scan, when computable.
    pub distance_km: Option<f64>,
    /// Minutes elapsed between issuance and scan.
    pub elapsed_mins: Option<f64>,
}

/// The oracle's answer. A declared level is authoritative when present;
/// otherwise the level is derived from the score. Anything else the
/// subprocess prints alongside these fields is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleVerdict {
    pub risk_score: i32,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle is not configured")]
    Disabled,

    #[error("oracle timed out after {0}s")]
    Timeout(u64),

    #[error("failed to spawn oracle: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("oracle exited with non-zero status")]
    NonZeroExit,

    #[error("malformed oracle output: {0}")]
    Malformed(String),
}

/// Seam for the external scorer. Handlers only see this trait, so tests
/// can inject a stub and production wires up [`SubprocessOracle`].
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(&self, request: &OracleRequest<'_>) -> Result<OracleVerdict, OracleError>;
}

/// Oracle that shells out to a configured command, passing the request
/// as a JSON argument and parsing the JSON verdict from stdout.
pub struct SubprocessOracle {
    command: Vec<String>,
    timeout: Duration,
}

impl SubprocessOracle {
    pub fn from_config(config: &OracleConfig) -> Option<Self> {
        config.command.as_ref().map(|command| Self {
            command: command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl ScoringOracle for SubprocessOracle {
    async fn score(&self, request: &OracleRequest<'_>) -> Result<OracleVerdict, OracleError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let (program, args) = self
            .command
            .split_first()
            .ok_or(OracleError::Disabled)?;

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(program)
                .args(args)
                .arg(&payload)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| OracleError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            tracing::warn!(status = ?output.status, "Risk oracle exited with failure");
            return Err(OracleError::NonZeroExit);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict: OracleVerdict = serde_json::from_str(stdout.trim())
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        Ok(OracleVerdict {
            risk_score: verdict.risk_score.clamp(0, 100),
            risk_level: verdict.risk_level,
        })
    }
}

/// Oracle used when `RISK_ORACLE_CMD` is unset: always errors so the
/// rule-based fallback decides. Also the default in tests, which keeps
/// redemption outcomes deterministic.
pub struct DisabledOracle;

#[async_trait]
impl ScoringOracle for DisabledOracle {
    async fn score(&self, _request: &OracleRequest<'_>) -> Result<OracleVerdict, OracleError> {
        Err(OracleError::Disabled)
    }
}
