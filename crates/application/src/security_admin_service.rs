use std::collections::BTreeSet;
use std::sync::Arc;

use pedicare_core::{AppError, AppResult, Subject, SubjectStatus};
use pedicare_domain::{AuditAction, GuardedOperation, PermissionKey};

use crate::security_admin_ports::{
    CreateRoleInput, RoleAssignment, RoleDefinition, SecurityAdminRepository, SubjectRecord,
};
use crate::{AuditEvent, AuditRepository, AuthorizationService};

#[cfg(test)]
mod tests;

/// Application service for role and user administration workflows.
#[derive(Clone)]
pub struct SecurityAdminService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn SecurityAdminRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl SecurityAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn SecurityAdminRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    /// Returns tenant roles for administrative users.
    pub async fn list_roles(&self, actor: &Subject) -> AppResult<Vec<RoleDefinition>> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::RoleList)
            .await?;

        self.repository.list_roles(actor.tenant_id()).await
    }

    /// Creates a custom role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &Subject,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::RoleCreate)
            .await?;

        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }
        let permissions = self.catalog_permissions(input.permissions)?;

        let role = self
            .repository
            .create_role(actor.tenant_id(), CreateRoleInput { name, permissions })
            .await?;

        self.append_audit_event(
            actor,
            AuditAction::SecurityRoleCreated,
            "rbac_role",
            role.name.clone(),
            format!(
                "created role '{}' with {} permission(s)",
                role.name,
                role.permissions.len()
            ),
        )
        .await?;

        Ok(role)
    }

    /// Replaces the grants of a custom role and emits an audit event.
    pub async fn update_role_permissions(
        &self,
        actor: &Subject,
        role_name: &str,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::RoleUpdatePermissions)
            .await?;

        let permissions = self.catalog_permissions(permissions)?;
        let existing = self
            .repository
            .find_role(actor.tenant_id(), role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        if existing.is_system {
            return Err(AppError::Conflict(format!(
                "system role '{role_name}' cannot be changed"
            )));
        }

        let role = self
            .repository
            .replace_role_permissions(actor.tenant_id(), role_name, permissions)
            .await?;

        let granted: Vec<&str> = role.permissions.iter().map(PermissionKey::as_str).collect();
        self.append_audit_event(
            actor,
            AuditAction::SecurityRolePermissionsUpdated,
            "rbac_role",
            role.name.clone(),
            format!("set grants of role '{}' to [{}]", role.name, granted.join(", ")),
        )
        .await?;

        Ok(role)
    }

    /// Assigns a role to a subject and emits an audit event.
    pub async fn assign_role(
        &self,
        actor: &Subject,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::RoleAssign)
            .await?;

        self.repository
            .assign_role_to_subject(actor.tenant_id(), subject_id, role_name)
            .await?;

        self.append_audit_event(
            actor,
            AuditAction::SecurityRoleAssigned,
            "rbac_subject_role",
            format!("{subject_id}:{role_name}"),
            format!("assigned role '{role_name}' to '{subject_id}'"),
        )
        .await
    }

    /// Removes a role assignment from a subject and emits an audit event.
    pub async fn unassign_role(
        &self,
        actor: &Subject,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::RoleUnassign)
            .await?;

        self.repository
            .remove_role_from_subject(actor.tenant_id(), subject_id, role_name)
            .await?;

        self.append_audit_event(
            actor,
            AuditAction::SecurityRoleUnassigned,
            "rbac_subject_role",
            format!("{subject_id}:{role_name}"),
            format!("removed role '{role_name}' from '{subject_id}'"),
        )
        .await
    }

    /// Returns role assignments for administrative users.
    pub async fn list_role_assignments(&self, actor: &Subject) -> AppResult<Vec<RoleAssignment>> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::AssignmentList)
            .await?;

        self.repository
            .list_role_assignments(actor.tenant_id())
            .await
    }

    /// Returns tenant subjects for user administrators.
    pub async fn list_subjects(&self, actor: &Subject) -> AppResult<Vec<SubjectRecord>> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::SubjectList)
            .await?;

        self.repository.list_subjects(actor.tenant_id()).await
    }

    /// Activates, deactivates or suspends a subject and emits an audit event.
    pub async fn update_subject_status(
        &self,
        actor: &Subject,
        subject_id: &str,
        status: SubjectStatus,
    ) -> AppResult<SubjectRecord> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::SubjectUpdateStatus)
            .await?;

        if actor.subject_id() == subject_id {
            return Err(AppError::Validation(
                "subjects cannot change their own status".to_owned(),
            ));
        }

        let record = self
            .repository
            .set_subject_status(actor.tenant_id(), subject_id, status)
            .await?;

        self.append_audit_event(
            actor,
            AuditAction::SecuritySubjectStatusChanged,
            "subject",
            record.subject_id.clone(),
            format!("set status of '{}' to '{}'", record.subject_id, record.status),
        )
        .await?;

        Ok(record)
    }

    fn catalog_permissions(&self, permissions: Vec<PermissionKey>) -> AppResult<Vec<PermissionKey>> {
        let catalog = self.authorization_service.catalog();
        let unique: BTreeSet<PermissionKey> = permissions.into_iter().collect();
        for permission in &unique {
            catalog.require(permission)?;
        }

        Ok(unique.into_iter().collect())
    }

    async fn append_audit_event(
        &self,
        actor: &Subject,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject_id().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await
    }
}
