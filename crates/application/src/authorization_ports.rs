use async_trait::async_trait;

use pedicare_core::{AppResult, Subject, TenantId};
use pedicare_domain::PermissionKey;

/// Role assigned to a subject, with the tenant that owns the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRole {
    /// Stable role identifier.
    pub role_id: String,
    /// Role name, for diagnostics.
    pub role_name: String,
    /// Tenant that owns the role.
    pub role_tenant_id: TenantId,
}

/// Read-only repository port used by permission resolution.
///
/// Adapters report storage outages as `AppError::Unavailable`.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists every role assigned to the subject, regardless of the role's tenant.
    async fn list_assigned_roles(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Vec<AssignedRole>>;

    /// Lists the distinct permission keys granted to the given roles of a tenant.
    async fn list_permissions_for_roles(
        &self,
        tenant_id: TenantId,
        role_ids: &[String],
    ) -> AppResult<Vec<PermissionKey>>;
}

/// Lookup port for the current state of authenticated subjects.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// Finds a subject in a tenant with its current lifecycle status.
    async fn find_subject(&self, tenant_id: TenantId, subject_id: &str)
    -> AppResult<Option<Subject>>;
}
