use std::collections::BTreeSet;
use std::sync::Arc;

use pedicare_core::{AppError, AppResult, Subject};
use pedicare_domain::{
    Decision, DenialReason, GuardedOperation, PermissionCatalog, PermissionKey,
};

use crate::{AuthorizationRepository, OperationPermissionMap};


/// Effective permission set resolved for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissions {
    /// Union of grants of the subject's in-tenant roles.
    pub permissions: BTreeSet<PermissionKey>,
    /// Set when every permission is denied for the same reason.
    pub blanket_denial: Option<DenialReason>,
}

/// Application service resolving tenant-scoped permission decisions.
///
/// Resolution reads the current role and grant state on every call and holds
/// no per-subject state between calls.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    operation_permissions: Arc<OperationPermissionMap>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        operation_permissions: Arc<OperationPermissionMap>,
    ) -> Self {
        Self {
            repository,
            operation_permissions,
        }
    }

    /// Decides whether the subject holds the permission.
    ///
    /// `Denied` is a normal outcome. Storage faults are returned as errors.
    pub async fn authorize(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> AppResult<Decision> {
        Ok(match self.resolve(subject).await? {
            Resolution::Denied(reason) => Decision::Denied(reason),
            Resolution::Granted(permissions) if permissions.contains(permission) => {
                Decision::Allowed
            }
            Resolution::Granted(_) => Decision::Denied(DenialReason::NoMatchingRole),
        })
    }

    /// Ensures the subject holds the permission, failing with `Forbidden` otherwise.
    pub async fn require_permission(
        &self,
        subject: &Subject,
        permission: &PermissionKey,
    ) -> AppResult<()> {
        match self.authorize(subject, permission).await? {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => Err(AppError::Forbidden(format!(
                "subject '{}' is missing permission '{permission}' in tenant '{}' ({reason})",
                subject.subject_id(),
                subject.tenant_id()
            ))),
        }
    }

    /// Ensures the subject may run the guarded operation.
    pub async fn require_operation(
        &self,
        subject: &Subject,
        operation: GuardedOperation,
    ) -> AppResult<()> {
        let permission = self.operation_permissions.required_permission(operation)?;
        self.require_permission(subject, permission).await
    }

    /// Resolves the full permission set of a subject.
    pub async fn effective_permissions(&self, subject: &Subject) -> AppResult<EffectivePermissions> {
        Ok(match self.resolve(subject).await? {
            Resolution::Denied(reason) => EffectivePermissions {
                permissions: BTreeSet::new(),
                blanket_denial: Some(reason),
            },
            Resolution::Granted(permissions) => EffectivePermissions {
                permissions,
                blanket_denial: None,
            },
        })
    }

    /// Returns the permission catalog operations were validated against.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        self.operation_permissions.catalog()
    }

    /// Returns the operation permission map.
    #[must_use]
    pub fn operation_permissions(&self) -> &OperationPermissionMap {
        &self.operation_permissions
    }

    async fn resolve(&self, subject: &Subject) -> AppResult<Resolution> {
        if !subject.status().is_active() {
            return Ok(Resolution::Denied(DenialReason::SubjectInactive));
        }

        let tenant_id = subject.tenant_id();
        let assigned_roles = self
            .repository
            .list_assigned_roles(tenant_id, subject.subject_id())
            .await?;

        if assigned_roles.is_empty() {
            return Ok(Resolution::Denied(DenialReason::NoMatchingRole));
        }

        let role_ids: Vec<String> = assigned_roles
            .into_iter()
            .filter(|role| role.role_tenant_id == tenant_id)
            .map(|role| role.role_id)
            .collect();

        if role_ids.is_empty() {
            return Ok(Resolution::Denied(DenialReason::TenantMismatch));
        }

        let permissions = self
            .repository
            .list_permissions_for_roles(tenant_id, &role_ids)
            .await?;

        Ok(Resolution::Granted(permissions.into_iter().collect()))
    }
}

enum Resolution {
    Granted(BTreeSet<PermissionKey>),
    Denied(DenialReason),
}
