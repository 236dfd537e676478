use async_trait::async_trait;

use pedicare_core::{AppResult, SubjectStatus, TenantId};
use pedicare_domain::PermissionKey;

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: String,
    /// Unique role name in tenant scope.
    pub name: String,
    /// Indicates a system-managed role.
    pub is_system: bool,
    /// Role grants.
    pub permissions: Vec<PermissionKey>,
}

/// Assignment projection mapping a subject to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Subject identifier.
    pub subject_id: String,
    /// Role identifier.
    pub role_id: String,
    /// Role name.
    pub role_name: String,
    /// Assignment timestamp in RFC3339.
    pub assigned_at: String,
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Grants to attach to the role.
    pub permissions: Vec<PermissionKey>,
}

/// Clinic user projection for administrative views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    /// Subject identifier.
    pub subject_id: String,
    /// Display name.
    pub display_name: String,
    /// Current lifecycle status.
    pub status: SubjectStatus,
    /// Creation timestamp in RFC3339.
    pub created_at: String,
}

/// Repository port for role, assignment and subject administration.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists all tenant roles with their grants.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>>;

    /// Finds one role by name.
    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>>;

    /// Creates a role and attaches grants.
    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition>;

    /// Replaces every grant of a role.
    async fn replace_role_permissions(
        &self,
        tenant_id: TenantId,
        role_name: &str,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<RoleDefinition>;

    /// Assigns an existing role to a subject of the same tenant.
    async fn assign_role_to_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()>;

    /// Removes a role assignment from a subject.
    async fn remove_role_from_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()>;

    /// Lists current role assignments in tenant scope.
    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists tenant subjects.
    async fn list_subjects(&self, tenant_id: TenantId) -> AppResult<Vec<SubjectRecord>>;

    /// Updates and returns a subject's lifecycle status.
    async fn set_subject_status(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        status: SubjectStatus,
    ) -> AppResult<SubjectRecord>;
}
