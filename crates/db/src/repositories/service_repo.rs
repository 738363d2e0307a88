//! Repository for relying services and their scan portals.

use shadowid_core::types::DbId;
use sqlx::PgPool;

use crate::models::service::{CreateService, CreateServicePortal, Service, ServicePortal};

/// Column list shared across queries to avoid repetition.
const SERVICE_COLUMNS: &str = "id, service_id, name, description, api_key, is_active, \
                                requires_identity, created_at";

const PORTAL_COLUMNS: &str = "id, portal_id, service_id, name, location, address, region, \
                               is_active, created_at";

/// Provides CRUD operations for services and portals.
pub struct ServiceRepo;

impl ServiceRepo {
    /// Insert a new service, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateService) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (service_id, name, description, api_key, requires_identity)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SERVICE_COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(&input.service_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.api_key)
            .bind(input.requires_identity)
            .fetch_one(pool)
            .await
    }

    /// Look up an active service by API key. Scan authentication.
    pub async fn find_active_by_api_key(
        pool: &PgPool,
        api_key: &str,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!(
            "SELECT {SERVICE_COLUMNS} FROM services
             WHERE api_key = $1 AND is_active = true"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(api_key)
            .fetch_optional(pool)
            .await
    }

    /// All active services, for the catalogue endpoint.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Service>, sqlx::Error> {
        let query = format!(
            "SELECT {SERVICE_COLUMNS} FROM services
             WHERE is_active = true
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Service>(&query).fetch_all(pool).await
    }

    /// Insert a new portal, returning the created row.
    pub async fn create_portal(
        pool: &PgPool,
        input: &CreateServicePortal,
    ) -> Result<ServicePortal, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_portals (portal_id, service_id, name, location, address, region)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PORTAL_COLUMNS}"
        );
        sqlx::query_as::<_, ServicePortal>(&query)
            .bind(&input.portal_id)
            .bind(input.service_id)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.address)
            .bind(&input.region)
            .fetch_one(pool)
            .await
    }

    /// Look up an active portal belonging to a given service.
    pub async fn find_portal(
        pool: &PgPool,
        service_id: DbId,
        portal_id: &str,
    ) -> Result<Option<ServicePortal>, sqlx::Error> {
        let query = format!(
            "SELECT {PORTAL_COLUMNS} FROM service_portals
             WHERE service_id = $1 AND portal_id = $2 AND is_active = true"
        );
        sqlx::query_as::<_, ServicePortal>(&query)
            .bind(service_id)
            .bind(portal_id)
            .fetch_optional(pool)
            .await
    }
}
