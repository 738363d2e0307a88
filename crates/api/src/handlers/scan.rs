//! The scan endpoint used by relying services.
//!
//! Services authenticate with an `X-Api-Key` header rather than a JWT;
//! a scanner kiosk has no user session. The optional portal id narrows
//! the scan to a registered physical location, whose coordinates then
//! take precedence over any client-supplied location.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use shadowid_core::error::CoreError;

use shadowid_db::models::{Service, ServicePortal};
use shadowid_db::repositories::ServiceRepo;

use crate::engine::scan::{scan_token, ScanOutcome, ScanParams};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub token: String,
    pub portal_id: Option<String>,
    pub device_fingerprint: Option<String>,
    pub location: Option<String>,
}

/// POST /api/v1/scan
pub async fn scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ScanRequest>,
) -> AppResult<Json<DataResponse<ScanOutcome>>> {
    let service = authenticate_service(&state, &headers).await?;

    let portal = match body.portal_id.as_deref() {
        Some(portal_id) => Some(find_portal(&state, &service, portal_id).await?),
        None => None,
    };

    let outcome = scan_token(
        &state,
        ScanParams {
            service: &service,
            portal: portal.as_ref(),
            token: &body.token,
            scan_fingerprint: body.device_fingerprint.as_deref(),
            scan_location: body.location.as_deref(),
        },
    )
    .await?;

    Ok(Json(DataResponse { data: outcome }))
}

async fn authenticate_service(state: &AppState, headers: &HeaderMap) -> AppResult<Service> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing X-Api-Key header".into()))
        })?;

    ServiceRepo::find_active_by_api_key(&state.pool, api_key)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid API key".into())))
}

async fn find_portal(
    state: &AppState,
    service: &Service,
    portal_id: &str,
) -> AppResult<ServicePortal> {
    ServiceRepo::find_portal(&state.pool, service.id, portal_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "portal",
                id: portal_id.to_string(),
            })
        })
}
