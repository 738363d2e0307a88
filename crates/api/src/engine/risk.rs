//! Risk assessment for one redemption attempt.
//!
//! Rule-based detectors produce boolean anomaly flags; the external
//! oracle is then asked for a score with those flags as context. When
//! the oracle answers, its score is authoritative. When it does not
//! (disabled, timeout, crash, garbage output), the deterministic
//! rule-based score decides, so an identical scan replayed against a
//! dead oracle reaches the same verdict every time.

use shadowid_core::geo;
use shadowid_core::risk::{
    check_travel, is_device_hop, rule_based_score, AnomalyFlags, RiskLevel, TravelAnomaly,
};
use shadowid_core::token::RATE_LIMIT_MAX_TOKENS;
use shadowid_core::types::Timestamp;

use shadowid_db::models::ShadowToken;

use crate::engine::oracle::{OracleRequest, ScoringOracle};

/// Everything the assessment needs to know about one scan.
#[derive(Debug)]
pub struct ScanContext<'a> {
    pub token: &'a ShadowToken,
    pub scan_fingerprint: Option<&'a str>,
    pub scan_location: &'a str,
    pub scanned_at: Timestamp,
    /// Tokens the owner created in the window leading up to this
    /// token's issuance.
    pub recent_token_count: i64,
    /// Whether this scan hit a token that was already consumed.
    pub reuse_attempt: bool,
}

/// The assessment outcome persisted onto the token.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub score: i32,
    pub level: RiskLevel,
    pub flags: AnomalyFlags,
}

/// Evaluate all rule-based detectors, then consult the oracle.
pub async fn assess(oracle: &dyn ScoringOracle, ctx: &ScanContext<'_>) -> RiskAssessment {
    let token = ctx.token;

    let issued_location = token.issued_location.as_deref().unwrap_or("");
    let travel = check_travel(
        issued_location,
        ctx.scan_location,
        token.created_at,
        ctx.scanned_at,
    );

    let flags = AnomalyFlags {
        device_hopping: is_device_hop(token.device_fingerprint.as_deref(), ctx.scan_fingerprint),
        impossible_travel: matches!(travel, Some(TravelAnomaly::Impossible { .. })),
        suspicious_travel: matches!(travel, Some(TravelAnomaly::Suspicious { .. })),
        frequent_generation: ctx.recent_token_count >= RATE_LIMIT_MAX_TOKENS,
        token_reuse: ctx.reuse_attempt,
    };

    let (distance_km, elapsed_mins) = match &travel {
        Some(TravelAnomaly::Impossible {
            distance_km,
            elapsed_mins,
            ..
        }) => (Some(*distance_km), Some(*elapsed_mins)),
        Some(TravelAnomaly::Suspicious { elapsed_mins }) => {
            (geo::distance_km(issued_location, ctx.scan_location), Some(*elapsed_mins))
        }
        None => (
            geo::distance_km(issued_location, ctx.scan_location),
            Some((ctx.scanned_at - token.created_at).num_milliseconds() as f64 / 60_000.0),
        ),
    };

    let request = OracleRequest {
        flags: &flags,
        user_id: token.user_id,
        issued_at: token.created_at,
        scanned_at: ctx.scanned_at,
        issued_location: token.issued_location.as_deref(),
        scan_location: ctx.scan_location,
        issuing_fingerprint: token.device_fingerprint.as_deref(),
        scan_fingerprint: ctx.scan_fingerprint,
        token_age_secs: (ctx.scanned_at - token.created_at).num_seconds(),
        recent_token_count: ctx.recent_token_count,
        distance_km,
        elapsed_mins,
    };

    let (score, level) = match oracle.score(&request).await {
        Ok(verdict) => {
            let score = verdict.risk_score.clamp(0, 100);
            let level = verdict.risk_level.unwrap_or_else(|| RiskLevel::from_score(score));
            (score, level)
        }
        Err(err) => {
            tracing::warn!(error = %err, token_id = token.id, "Oracle unavailable, using rule-based score");
            let score = rule_based_score(&flags);
            (score, RiskLevel::from_score(score))
        }
    };

    RiskAssessment { score, level, flags }
}
