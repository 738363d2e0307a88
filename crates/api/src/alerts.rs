//! Security alert detector: four correlation passes over store state,
//! deduplicated against already-raised alerts so repeated sweeps do not
//! pile up copies of the same finding.

use chrono::{Duration, Utc};
use serde_json::json;

use shadowid_core::alert::{
    severity_for_identity_count, AlertSeverity, AlertType, CROSS_ACTIVITY_DISTANCE_KM,
    CROSS_ACTIVITY_WINDOW_MINS, HIGH_RISK_SCORE_FLOOR, MULTI_IDENTITY_WINDOW_MINS,
};
use shadowid_core::geo;
use shadowid_core::region::region_for_location;

use shadowid_db::models::CreateSecurityAlert;
use shadowid_db::repositories::{ActivityRepo, SecurityAlertRepo, SessionRepo, ShadowTokenRepo};
use shadowid_db::DbPool;

/// Counts of alerts raised by one sweep, per pass.
#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub multiple_identities: usize,
    pub impossible_travel: usize,
    pub device_hopping: usize,
    pub high_risk_scans: usize,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.multiple_identities + self.impossible_travel + self.device_hopping + self.high_risk_scans
    }
}

/// Run all four detection passes.
pub async fn run_sweep(pool: &DbPool) -> Result<SweepSummary, sqlx::Error> {
    let summary = SweepSummary {
        multiple_identities: detect_multiple_identities(pool).await?,
        impossible_travel: detect_impossible_travel(pool).await?,
        device_hopping: detect_device_hopping(pool).await?,
        high_risk_scans: detect_high_risk_scans(pool).await?,
    };

    if summary.total() > 0 {
        tracing::info!(
            multiple_identities = summary.multiple_identities,
            impossible_travel = summary.impossible_travel,
            device_hopping = summary.device_hopping,
            high_risk_scans = summary.high_risk_scans,
            "Detector sweep raised alerts"
        );
    }
    Ok(summary)
}

/// Pass 1: one physical device carrying sessions for several identities
/// inside a short window. Severity scales with the identity count.
async fn detect_multiple_identities(pool: &DbPool) -> Result<usize, sqlx::Error> {
    let devices = SessionRepo::multi_identity_devices(pool, MULTI_IDENTITY_WINDOW_MINS).await?;
    let mut raised = 0;

    for device in devices {
        let alert_type = AlertType::MultipleIdentities.as_str();
        if SecurityAlertRepo::exists_unresolved_for_fingerprint(
            pool,
            alert_type,
            &device.device_fingerprint,
        )
        .await?
        {
            continue;
        }

        let count = device.user_ids.len();
        SecurityAlertRepo::create(
            pool,
            &CreateSecurityAlert {
                alert_type: alert_type.to_string(),
                severity: severity_for_identity_count(count).as_str().to_string(),
                title: "Multiple identities from one device".to_string(),
                description: format!(
                    "{count} distinct identities used the same device within {MULTI_IDENTITY_WINDOW_MINS} minutes"
                ),
                user_id: device.user_ids.first().copied(),
                token_id: None,
                location: None,
                region: None,
                metadata: Some(json!({
                    "fingerprint": device.device_fingerprint,
                    "userIds": device.user_ids,
                    "windowMins": MULTI_IDENTITY_WINDOW_MINS,
                })),
            },
        )
        .await?;
        raised += 1;
    }
    Ok(raised)
}

/// Pass 2: consecutive verified redemptions by the same user, far enough
/// apart geographically that the travel is not physically possible.
async fn detect_impossible_travel(pool: &DbPool) -> Result<usize, sqlx::Error> {
    let since = Utc::now() - Duration::minutes(CROSS_ACTIVITY_WINDOW_MINS);
    let redemptions = ActivityRepo::redemptions_since(pool, since).await?;
    let mut raised = 0;

    // Rows arrive ordered by (user_id, occurred_at); compare neighbours.
    for pair in redemptions.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if prev.user_id != curr.user_id {
            continue;
        }

        let elapsed_mins = (curr.occurred_at - prev.occurred_at).num_milliseconds() as f64 / 60_000.0;
        let Some(distance) = geo::distance_km(&prev.location, &curr.location) else {
            continue;
        };
        if distance <= CROSS_ACTIVITY_DISTANCE_KM || elapsed_mins >= CROSS_ACTIVITY_WINDOW_MINS as f64
        {
            continue;
        }

        let alert_type = AlertType::ImpossibleTravel.as_str();
        if SecurityAlertRepo::exists_unresolved_for_user(pool, alert_type, curr.user_id).await? {
            continue;
        }

        SecurityAlertRepo::create(
            pool,
            &CreateSecurityAlert {
                alert_type: alert_type.to_string(),
                severity: AlertSeverity::Critical.as_str().to_string(),
                title: "Impossible travel between scans".to_string(),
                description: format!(
                    "Tokens redeemed {distance:.0} km apart within {elapsed_mins:.0} minutes"
                ),
                user_id: Some(curr.user_id),
                token_id: Some(curr.token_id),
                location: Some(curr.location.clone()),
                region: region_for_location(&curr.location).map(String::from),
                metadata: Some(json!({
                    "locations": [
                        { "location": prev.location, "time": prev.occurred_at },
                        { "location": curr.location, "time": curr.occurred_at },
                    ],
                    "distanceKm": distance,
                    "elapsedMins": elapsed_mins,
                })),
            },
        )
        .await?;
        raised += 1;
    }
    Ok(raised)
}

/// Pass 3: post-hoc alerts for High tokens that were bound to a device,
/// where the inline assessment already flagged the hop. A token's score
/// never decays, so the pass looks at the whole store and keys
/// deduplication on any prior alert, resolved or not.
async fn detect_device_hopping(pool: &DbPool) -> Result<usize, sqlx::Error> {
    let tokens = ShadowTokenRepo::find_high_risk(pool).await?;
    let mut raised = 0;

    for token in tokens {
        let alert_type = AlertType::DeviceHopping.as_str();
        if SecurityAlertRepo::exists_for_token(pool, alert_type, token.id).await? {
            continue;
        }

        SecurityAlertRepo::create(
            pool,
            &CreateSecurityAlert {
                alert_type: alert_type.to_string(),
                severity: AlertSeverity::High.as_str().to_string(),
                title: "Token scanned from a different device".to_string(),
                description: "A high-risk token was presented from a device other than the one that issued it".to_string(),
                user_id: Some(token.user_id),
                token_id: Some(token.id),
                location: token.issued_location.clone(),
                region: token
                    .issued_location
                    .as_deref()
                    .and_then(region_for_location)
                    .map(String::from),
                metadata: Some(json!({
                    "issuingDevice": token.device_fingerprint,
                })),
            },
        )
        .await?;
        raised += 1;
    }
    Ok(raised)
}

/// Pass 4: tokens whose persisted score crossed the high-risk floor,
/// regardless of age, deduplicated like pass 3.
async fn detect_high_risk_scans(pool: &DbPool) -> Result<usize, sqlx::Error> {
    let tokens = ShadowTokenRepo::find_scored_at_least(pool, HIGH_RISK_SCORE_FLOOR).await?;
    let mut raised = 0;

    for token in tokens {
        let alert_type = AlertType::HighRiskScan.as_str();
        if SecurityAlertRepo::exists_for_token(pool, alert_type, token.id).await? {
            continue;
        }

        SecurityAlertRepo::create(
            pool,
            &CreateSecurityAlert {
                alert_type: alert_type.to_string(),
                severity: AlertSeverity::High.as_str().to_string(),
                title: "High-risk scan".to_string(),
                description: format!("Token was scanned with risk score {}", token.risk_score),
                user_id: Some(token.user_id),
                token_id: Some(token.id),
                location: token.issued_location.clone(),
                region: token
                    .issued_location
                    .as_deref()
                    .and_then(region_for_location)
                    .map(String::from),
                metadata: Some(json!({
                    "riskScore": token.risk_score,
                    "riskLevel": token.risk_level,
                })),
            },
        )
        .await?;
        raised += 1;
    }
    Ok(raised)
}
