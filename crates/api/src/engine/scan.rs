//! Token redemption: the scan flow executed on behalf of a relying
//! service.
//!
//! Ordering matters here. A token is only consumed after the risk
//! assessment passes; a High verdict rejects the scan and leaves
//! `is_used` untouched so the incident can be investigated against a
//! still-intact token. Consumption itself is a compare-and-set, so two
//! concurrent scanners can never both redeem.

use chrono::Utc;

use shadowid_core::activity::{event_types, statuses, trace_hash, UNKNOWN_LOCATION};
use shadowid_core::identity::mask_national_id;
use shadowid_core::region::region_for_location;
use shadowid_core::risk::RiskLevel;
use shadowid_core::token::{is_expired, is_well_formed, RATE_LIMIT_WINDOW_SECS};
use shadowid_core::types::DbId;

use shadowid_db::models::{CreateActivity, Service, ServicePortal, ShadowToken};
use shadowid_db::repositories::{ActivityRepo, ShadowTokenRepo, UserRepo};
use shadowid_db::DbPool;

use crate::engine::risk::{assess, RiskAssessment, ScanContext};
use crate::error::AppResult;
use crate::state::AppState;

/// Parameters for one scan request.
#[derive(Debug)]
pub struct ScanParams<'a> {
    pub service: &'a Service,
    pub portal: Option<&'a ServicePortal>,
    pub token: &'a str,
    pub scan_fingerprint: Option<&'a str>,
    pub scan_location: Option<&'a str>,
}

/// Masked identity disclosed to services that require it.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedIdentity {
    pub name: String,
    pub national_id: String,
    pub person_type: String,
    pub nationality: String,
}

/// What the scanning service gets back.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub verified: bool,
    pub message: &'static str,
    pub risk_score: Option<i32>,
    pub risk_level: Option<RiskLevel>,
    /// Names of the anomaly rules this scan tripped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<MaskedIdentity>,
}

/// Execute the scan flow for one presented token.
pub async fn scan_token(state: &AppState, params: ScanParams<'_>) -> AppResult<ScanOutcome> {
    let pool = &state.pool;
    let now = Utc::now();
    let location = resolve_location(&params);

    if !is_well_formed(params.token) {
        record_scan(pool, None, &params, &location, statuses::REJECTED, None).await?;
        return Ok(rejected("Invalid token format"));
    }

    let Some(token) = ShadowTokenRepo::find_by_token(pool, params.token).await? else {
        record_scan(pool, None, &params, &location, statuses::REJECTED, None).await?;
        return Ok(rejected("Token not found"));
    };

    // Lapsed beats consumed: a token that is both expired and used
    // answers with expiry.
    if is_expired(token.expires_at, now) {
        if token.is_active {
            ShadowTokenRepo::deactivate(pool, token.id).await?;
        }
        record_scan(pool, Some(token.id), &params, &location, statuses::REJECTED, None).await?;
        return Ok(rejected("Token has expired"));
    }

    // Redemption flips both flags, so revoked means deactivated without
    // ever being consumed.
    if !token.is_active && !token.is_used {
        record_scan(pool, Some(token.id), &params, &location, statuses::REJECTED, None).await?;
        return Ok(rejected("Token has been revoked"));
    }

    // Reuse of a consumed token is itself a risk signal worth recording,
    // but only on the trail. The score persisted at redemption describes
    // the redemption and must not be overwritten by later replays.
    if token.is_used {
        let assessment = assess_scan(state, &token, &params, &location, true).await?;
        let anomalies = anomaly_names(&assessment);
        record_scan(
            pool,
            Some(token.id),
            &params,
            &location,
            statuses::REJECTED,
            Some(assessment_metadata(&assessment, &anomalies)),
        )
        .await?;
        return Ok(ScanOutcome {
            verified: false,
            message: "Token has already been used",
            risk_score: Some(assessment.score),
            risk_level: Some(assessment.level),
            anomalies,
            identity: None,
        });
    }

    let assessment = assess_scan(state, &token, &params, &location, false).await?;
    ShadowTokenRepo::set_risk(pool, token.id, assessment.score, assessment.level.as_str()).await?;
    let anomalies = anomaly_names(&assessment);

    // High risk rejects without consuming: the token stays intact for
    // investigation and the detector's high-risk pass.
    if assessment.level == RiskLevel::High {
        record_scan(
            pool,
            Some(token.id),
            &params,
            &location,
            statuses::REJECTED,
            Some(assessment_metadata(&assessment, &anomalies)),
        )
        .await?;
        tracing::warn!(
            token_id = token.id,
            score = assessment.score,
            anomalies = ?anomalies,
            "Rejected high-risk scan"
        );
        return Ok(ScanOutcome {
            verified: false,
            message: "Scan rejected due to high risk",
            risk_score: Some(assessment.score),
            risk_level: Some(assessment.level),
            anomalies,
            identity: None,
        });
    }

    // Atomic claim; a concurrent scanner losing this race sees reuse.
    if !ShadowTokenRepo::mark_used(pool, token.id).await? {
        record_scan(pool, Some(token.id), &params, &location, statuses::REJECTED, None).await?;
        return Ok(rejected("Token has already been used"));
    }

    UserRepo::increment_verified(pool, token.user_id).await?;
    record_scan(pool, Some(token.id), &params, &location, statuses::VERIFIED, None).await?;

    let identity = if params.service.requires_identity {
        let identity = disclose_identity(pool, &token, &params, &location).await?;
        Some(identity)
    } else {
        None
    };

    tracing::info!(
        token_id = token.id,
        service = %params.service.name,
        score = assessment.score,
        "Verified shadow token"
    );

    Ok(ScanOutcome {
        verified: true,
        message: "Token verified",
        risk_score: Some(assessment.score),
        risk_level: Some(assessment.level),
        anomalies,
        identity,
    })
}

async fn assess_scan(
    state: &AppState,
    token: &ShadowToken,
    params: &ScanParams<'_>,
    location: &str,
    reuse_attempt: bool,
) -> AppResult<RiskAssessment> {
    // Generation bursts are measured around issuance, not around this
    // scan: a token minted in a burst stays suspect for its whole life.
    let window_start = token.created_at - chrono::Duration::seconds(RATE_LIMIT_WINDOW_SECS);
    let recent_token_count = ShadowTokenRepo::count_created_between(
        &state.pool,
        token.user_id,
        window_start,
        token.created_at,
    )
    .await?;

    let ctx = ScanContext {
        token,
        scan_fingerprint: params.scan_fingerprint,
        scan_location: location,
        scanned_at: Utc::now(),
        recent_token_count,
        reuse_attempt,
    };
    Ok(assess(state.oracle.as_ref(), &ctx).await)
}

/// Load the token owner and write the disclosure record.
async fn disclose_identity(
    pool: &DbPool,
    token: &ShadowToken,
    params: &ScanParams<'_>,
    location: &str,
) -> AppResult<MaskedIdentity> {
    let user = UserRepo::find_by_id(pool, token.user_id)
        .await?
        .ok_or_else(|| crate::error::AppError::InternalError("Token owner missing".into()))?;

    ActivityRepo::create(
        pool,
        &CreateActivity {
            token_id: Some(token.id),
            event_type: event_types::DATA_ACCESS.into(),
            service: params.service.name.clone(),
            location: location.to_string(),
            region: region_for_location(location).map(String::from),
            status: statuses::VERIFIED.into(),
            trace_hash: trace_hash(),
            metadata: None,
        },
    )
    .await?;

    Ok(MaskedIdentity {
        name: user.name,
        national_id: mask_national_id(&user.national_id),
        person_type: user.person_type,
        nationality: user.nationality,
    })
}

fn resolve_location(params: &ScanParams<'_>) -> String {
    params
        .portal
        .map(|p| p.location.clone())
        .or_else(|| params.scan_location.map(String::from))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}

fn rejected(message: &'static str) -> ScanOutcome {
    ScanOutcome {
        verified: false,
        message,
        risk_score: None,
        risk_level: None,
        anomalies: Vec::new(),
        identity: None,
    }
}

fn anomaly_names(assessment: &RiskAssessment) -> Vec<String> {
    assessment.flags.active().into_iter().map(String::from).collect()
}

/// Assessment details attached to a rejected scan's trail entry.
fn assessment_metadata(assessment: &RiskAssessment, anomalies: &[String]) -> serde_json::Value {
    serde_json::json!({
        "riskScore": assessment.score,
        "riskLevel": assessment.level.as_str(),
        "anomalies": anomalies,
    })
}

async fn record_scan(
    pool: &DbPool,
    token_id: Option<DbId>,
    params: &ScanParams<'_>,
    location: &str,
    status: &str,
    metadata: Option<serde_json::Value>,
) -> Result<(), sqlx::Error> {
    ActivityRepo::create(
        pool,
        &CreateActivity {
            token_id,
            event_type: event_types::USED.into(),
            service: params.service.name.clone(),
            location: location.to_string(),
            region: region_for_location(location).map(String::from),
            status: status.to_string(),
            trace_hash: trace_hash(),
            metadata,
        },
    )
    .await?;
    Ok(())
}
