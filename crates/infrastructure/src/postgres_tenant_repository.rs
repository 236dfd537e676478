use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use pedicare_application::{SubjectDirectory, TenantRepository};
use pedicare_core::{AppError, AppResult, Subject, SubjectStatus, TenantId};
use pedicare_domain::{PermissionCatalog, SystemRole};

use crate::postgres_error::map_sqlx_error;

/// PostgreSQL-backed clinic membership repository and subject directory.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn ensure_membership(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        display_name: &str,
        catalog: &PermissionCatalog,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error("begin transaction", error))?;

        let tenant_created = sqlx::query(
            r#"
            INSERT INTO tenants (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(format!("Clinic {tenant_id}"))
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("ensure tenant exists", error))?
        .rows_affected()
            > 0;

        if tenant_created {
            seed_system_roles(&mut transaction, tenant_id, catalog).await?;
            info!(%tenant_id, "provisioned clinic with system roles");
        }

        let existing_subjects = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM subjects
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("count tenant subjects", error))?;

        let subject_created = sqlx::query(
            r#"
            INSERT INTO subjects (tenant_id, subject_id, display_name, status)
            VALUES ($1, $2, $3, 'active')
            ON CONFLICT (tenant_id, subject_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .bind(display_name)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("ensure subject exists", error))?
        .rows_affected()
            > 0;

        if subject_created && existing_subjects == 0 {
            sqlx::query(
                r#"
                INSERT INTO rbac_subject_roles (tenant_id, subject, role_id)
                SELECT $1, $2, roles.id
                FROM rbac_roles AS roles
                WHERE roles.tenant_id = $1
                    AND roles.name = $3
                ON CONFLICT (tenant_id, subject, role_id) DO NOTHING
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(subject_id)
            .bind(SystemRole::Owner.name())
            .execute(&mut *transaction)
            .await
            .map_err(|error| map_sqlx_error("assign owner role", error))?;
        }

        transaction
            .commit()
            .await
            .map_err(|error| map_sqlx_error("commit transaction", error))
    }
}

#[async_trait]
impl SubjectDirectory for PostgresTenantRepository {
    async fn find_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Option<Subject>> {
        let status = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM subjects
            WHERE tenant_id = $1
                AND subject_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("load subject", error))?;

        let Some(status) = status else {
            return Ok(None);
        };

        let status = SubjectStatus::from_str(status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored status for subject '{subject_id}': {error}"
            ))
        })?;

        Subject::new(subject_id, tenant_id, status).map(Some)
    }
}

/// Inserts every system role and its catalog grants for a new clinic.
async fn seed_system_roles(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    catalog: &PermissionCatalog,
) -> AppResult<()> {
    for role in SystemRole::all() {
        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (tenant_id, name, is_system)
            VALUES ($1, $2, true)
            ON CONFLICT (tenant_id, name) DO UPDATE
            SET is_system = true
            RETURNING id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.name())
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| map_sqlx_error("seed system role", error))?;

        for permission in role.grants_in(catalog) {
            sqlx::query(
                r#"
                INSERT INTO rbac_role_grants (role_id, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission.as_str())
            .execute(&mut **transaction)
            .await
            .map_err(|error| map_sqlx_error("seed system role grants", error))?;
        }
    }

    Ok(())
}
