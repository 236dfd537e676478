use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use pedicare_application::{
    CreateRoleInput, RoleAssignment, RoleDefinition, SecurityAdminRepository, SubjectRecord,
};
use pedicare_core::{AppError, AppResult, SubjectStatus, TenantId};
use pedicare_domain::PermissionKey;

use crate::postgres_error::map_sqlx_error;


/// PostgreSQL-backed repository for role and subject administration.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_roles(
        &self,
        tenant_id: TenantId,
        role_name: Option<&str>,
    ) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.is_system,
                grants.permission
            FROM rbac_roles AS roles
            LEFT JOIN rbac_role_grants AS grants
                ON grants.role_id = roles.id
            WHERE roles.tenant_id = $1
                AND ($2::TEXT IS NULL OR roles.name = $2)
            ORDER BY roles.name, grants.permission
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("list roles", error))?;

        aggregate_roles(rows, tenant_id)
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    role_name: String,
    is_system: bool,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct RoleHeaderRow {
    id: uuid::Uuid,
    is_system: bool,
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    subject: String,
    role_id: uuid::Uuid,
    role_name: String,
    assigned_at: String,
}

#[derive(Debug, FromRow)]
struct SubjectRow {
    subject_id: String,
    display_name: String,
    status: String,
    created_at: String,
}

impl TryFrom<SubjectRow> for SubjectRecord {
    type Error = AppError;

    fn try_from(row: SubjectRow) -> Result<Self, Self::Error> {
        let status = SubjectStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored status for subject '{}': {error}",
                row.subject_id
            ))
        })?;

        Ok(Self {
            subject_id: row.subject_id,
            display_name: row.display_name,
            status,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        self.load_roles(tenant_id, None).await
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .load_roles(tenant_id, Some(role_name))
            .await?
            .into_iter()
            .next())
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error("begin transaction", error))?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO rbac_roles (tenant_id, name, is_system)
            VALUES ($1, $2, false)
            RETURNING id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(input.name.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| match map_sqlx_error("create role", error) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("role '{}' already exists", input.name))
            }
            other => other,
        })?;

        insert_grants(&mut transaction, role_id, &input.permissions).await?;

        transaction
            .commit()
            .await
            .map_err(|error| map_sqlx_error("commit transaction", error))?;

        Ok(RoleDefinition {
            role_id: role_id.to_string(),
            name: input.name,
            is_system: false,
            permissions: input.permissions,
        })
    }

    async fn replace_role_permissions(
        &self,
        tenant_id: TenantId,
        role_name: &str,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error("begin transaction", error))?;

        let role = sqlx::query_as::<_, RoleHeaderRow>(
            r#"
            SELECT id, is_system
            FROM rbac_roles
            WHERE tenant_id = $1 AND name = $2
            FOR UPDATE
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_name)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("resolve role", error))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        sqlx::query(
            r#"
            DELETE FROM rbac_role_grants
            WHERE role_id = $1
            "#,
        )
        .bind(role.id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("clear role grants", error))?;

        insert_grants(&mut transaction, role.id, &permissions).await?;

        transaction
            .commit()
            .await
            .map_err(|error| map_sqlx_error("commit transaction", error))?;

        Ok(RoleDefinition {
            role_id: role.id.to_string(),
            name: role_name.to_owned(),
            is_system: role.is_system,
            permissions,
        })
    }

    async fn assign_role_to_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| map_sqlx_error("begin transaction", error))?;

        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM rbac_roles
            WHERE tenant_id = $1 AND name = $2
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_name)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("resolve role", error))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        let subject_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM subjects
            WHERE tenant_id = $1
                AND subject_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("resolve subject", error))?;

        if subject_exists == 0 {
            return Err(AppError::NotFound(format!(
                "subject '{subject_id}' does not belong to tenant '{tenant_id}'"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO rbac_subject_roles (tenant_id, subject, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, subject, role_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error("assign role", error))?;

        transaction
            .commit()
            .await
            .map_err(|error| map_sqlx_error("commit transaction", error))
    }

    async fn remove_role_from_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM rbac_subject_roles AS subject_roles
            USING rbac_roles AS roles
            WHERE subject_roles.role_id = roles.id
                AND subject_roles.tenant_id = $1
                AND subject_roles.subject = $2
                AND roles.tenant_id = $1
                AND roles.name = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .bind(role_name)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("remove role assignment", error))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "role assignment '{subject_id}:{role_name}' was not found"
            )));
        }

        Ok(())
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                subject_roles.subject,
                subject_roles.role_id,
                roles.name AS role_name,
                to_char(subject_roles.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS assigned_at
            FROM rbac_subject_roles AS subject_roles
            INNER JOIN rbac_roles AS roles
                ON roles.id = subject_roles.role_id
            WHERE subject_roles.tenant_id = $1
            ORDER BY subject_roles.subject, roles.name
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("list role assignments", error))?;

        Ok(rows
            .into_iter()
            .map(|row| RoleAssignment {
                subject_id: row.subject,
                role_id: row.role_id.to_string(),
                role_name: row.role_name,
                assigned_at: row.assigned_at,
            })
            .collect())
    }

    async fn list_subjects(&self, tenant_id: TenantId) -> AppResult<Vec<SubjectRecord>> {
        let rows = sqlx::query_as::<_, SubjectRow>(
            r#"
            SELECT
                subject_id,
                display_name,
                status,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM subjects
            WHERE tenant_id = $1
            ORDER BY display_name, subject_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("list subjects", error))?;

        rows.into_iter().map(SubjectRecord::try_from).collect()
    }

    async fn set_subject_status(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        status: SubjectStatus,
    ) -> AppResult<SubjectRecord> {
        let row = sqlx::query_as::<_, SubjectRow>(
            r#"
            UPDATE subjects
            SET status = $3
            WHERE tenant_id = $1
                AND subject_id = $2
            RETURNING
                subject_id,
                display_name,
                status,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("update subject status", error))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "subject '{subject_id}' does not belong to tenant '{tenant_id}'"
            ))
        })?;

        SubjectRecord::try_from(row)
    }
}

async fn insert_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: uuid::Uuid,
    permissions: &[PermissionKey],
) -> AppResult<()> {
    for permission in permissions {
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
        .map_err(|error| map_sqlx_error("persist role grants", error))?;
    }

    Ok(())
}

fn aggregate_roles(rows: Vec<RoleRow>, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
    let mut by_id: HashMap<uuid::Uuid, RoleDefinition> = HashMap::new();

    for row in rows {
        let role = by_id.entry(row.role_id).or_insert_with(|| RoleDefinition {
            role_id: row.role_id.to_string(),
            name: row.role_name.clone(),
            is_system: row.is_system,
            permissions: Vec::new(),
        });

        if let Some(permission_value) = row.permission {
            let permission = PermissionKey::parse(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{permission_value}' for tenant '{tenant_id}': {error}"
                ))
            })?;

            role.permissions.push(permission);
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}
