use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pedicare_application::{AssignedRole, AuthorizationRepository};
use pedicare_core::{AppError, AppResult, TenantId};
use pedicare_domain::PermissionKey;

use crate::postgres_error::map_sqlx_error;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for role and grant lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignedRoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    role_tenant_id: uuid::Uuid,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_assigned_roles(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Vec<AssignedRole>> {
        let rows = sqlx::query_as::<_, AssignedRoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.tenant_id AS role_tenant_id
            FROM rbac_subject_roles AS subject_roles
            INNER JOIN rbac_roles AS roles
                ON roles.id = subject_roles.role_id
            WHERE subject_roles.tenant_id = $1
                AND subject_roles.subject = $2
            ORDER BY roles.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("load assigned roles", error))?;

        Ok(rows
            .into_iter()
            .map(|row| AssignedRole {
                role_id: row.role_id.to_string(),
                role_name: row.role_name,
                role_tenant_id: TenantId::from_uuid(row.role_tenant_id),
            })
            .collect())
    }

    async fn list_permissions_for_roles(
        &self,
        tenant_id: TenantId,
        role_ids: &[String],
    ) -> AppResult<Vec<PermissionKey>> {
        let role_ids = role_ids
            .iter()
            .map(|role_id| {
                uuid::Uuid::parse_str(role_id).map_err(|error| {
                    AppError::Internal(format!("invalid role id '{role_id}': {error}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT grants.permission
            FROM rbac_role_grants AS grants
            INNER JOIN rbac_roles AS roles
                ON roles.id = grants.role_id
            WHERE roles.tenant_id = $1
                AND roles.id = ANY($2)
            ORDER BY grants.permission
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("load role grants", error))?;

        rows.into_iter()
            .map(|row| {
                PermissionKey::parse(row.permission.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for tenant '{}': {error}",
                        row.permission, tenant_id
                    ))
                })
            })
            .collect()
    }
}
