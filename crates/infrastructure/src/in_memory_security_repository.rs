use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pedicare_application::{
    AssignedRole, AuthorizationRepository, CreateRoleInput, RoleAssignment, RoleDefinition,
    SecurityAdminRepository, SubjectDirectory, SubjectRecord, TenantRepository,
};
use pedicare_core::{AppError, AppResult, Subject, SubjectStatus, TenantId};
use pedicare_domain::{PermissionCatalog, PermissionKey, SystemRole};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
struct StoredRole {
    tenant_id: TenantId,
    name: String,
    is_system: bool,
    permissions: BTreeSet<PermissionKey>,
}

#[derive(Debug, Clone)]
struct StoredSubject {
    display_name: String,
    status: SubjectStatus,
    created_at: String,
}

#[derive(Debug, Default)]
struct SecurityState {
    tenants: BTreeSet<TenantId>,
    roles: BTreeMap<String, StoredRole>,
    subjects: BTreeMap<(TenantId, String), StoredSubject>,
    assignments: BTreeMap<(TenantId, String, String), String>,
}

impl SecurityState {
    fn role_id_by_name(&self, tenant_id: TenantId, role_name: &str) -> Option<String> {
        self.roles
            .iter()
            .find(|(_, role)| role.tenant_id == tenant_id && role.name == role_name)
            .map(|(role_id, _)| role_id.clone())
    }

    fn insert_role(
        &mut self,
        tenant_id: TenantId,
        name: &str,
        is_system: bool,
        permissions: impl IntoIterator<Item = PermissionKey>,
    ) -> String {
        let role_id = Uuid::new_v4().to_string();
        self.roles.insert(
            role_id.clone(),
            StoredRole {
                tenant_id,
                name: name.to_owned(),
                is_system,
                permissions: permissions.into_iter().collect(),
            },
        );
        role_id
    }
}

fn definition(role_id: &str, role: &StoredRole) -> RoleDefinition {
    RoleDefinition {
        role_id: role_id.to_owned(),
        name: role.name.clone(),
        is_system: role.is_system,
        permissions: role.permissions.iter().cloned().collect(),
    }
}

fn subject_record(subject_id: &str, subject: &StoredSubject) -> SubjectRecord {
    SubjectRecord {
        subject_id: subject_id.to_owned(),
        display_name: subject.display_name.clone(),
        status: subject.status,
        created_at: subject.created_at.clone(),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// In-memory clinic, role and subject store.
///
/// Implements every security port over one lock so local runs and tests see
/// the same state the resolver reads.
#[derive(Debug, Default)]
pub struct InMemorySecurityRepository {
    state: RwLock<SecurityState>,
}

impl InMemorySecurityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a role by identifier without checking the role's tenant.
    ///
    /// Stores the kind of stale cross-clinic assignment that resolution must
    /// ignore.
    pub async fn insert_raw_assignment(&self, tenant_id: TenantId, subject_id: &str, role_id: &str) {
        self.state.write().await.assignments.insert(
            (tenant_id, subject_id.to_owned(), role_id.to_owned()),
            timestamp(),
        );
    }
}

#[async_trait]
impl AuthorizationRepository for InMemorySecurityRepository {
    async fn list_assigned_roles(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Vec<AssignedRole>> {
        let state = self.state.read().await;

        Ok(state
            .assignments
            .keys()
            .filter(|(stored_tenant_id, stored_subject, _)| {
                *stored_tenant_id == tenant_id && stored_subject == subject_id
            })
            .filter_map(|(_, _, role_id)| {
                state.roles.get(role_id).map(|role| AssignedRole {
                    role_id: role_id.clone(),
                    role_name: role.name.clone(),
                    role_tenant_id: role.tenant_id,
                })
            })
            .collect())
    }

    async fn list_permissions_for_roles(
        &self,
        tenant_id: TenantId,
        role_ids: &[String],
    ) -> AppResult<Vec<PermissionKey>> {
        let state = self.state.read().await;

        let permissions: BTreeSet<PermissionKey> = role_ids
            .iter()
            .filter_map(|role_id| state.roles.get(role_id))
            .filter(|role| role.tenant_id == tenant_id)
            .flat_map(|role| role.permissions.iter().cloned())
            .collect();

        Ok(permissions.into_iter().collect())
    }
}

#[async_trait]
impl SubjectDirectory for InMemorySecurityRepository {
    async fn find_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Option<Subject>> {
        let state = self.state.read().await;

        state
            .subjects
            .get(&(tenant_id, subject_id.to_owned()))
            .map(|subject| Subject::new(subject_id, tenant_id, subject.status))
            .transpose()
    }
}

#[async_trait]
impl TenantRepository for InMemorySecurityRepository {
    async fn ensure_membership(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        display_name: &str,
        catalog: &PermissionCatalog,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        if state.tenants.insert(tenant_id) {
            for role in SystemRole::all() {
                state.insert_role(tenant_id, role.name(), true, role.grants_in(catalog));
            }
        }

        let key = (tenant_id, subject_id.to_owned());
        if state.subjects.contains_key(&key) {
            return Ok(());
        }

        let first_subject = !state
            .subjects
            .keys()
            .any(|(stored_tenant_id, _)| *stored_tenant_id == tenant_id);

        state.subjects.insert(
            key,
            StoredSubject {
                display_name: display_name.to_owned(),
                status: SubjectStatus::Active,
                created_at: timestamp(),
            },
        );

        if first_subject
            && let Some(owner_role_id) = state.role_id_by_name(tenant_id, SystemRole::Owner.name())
        {
            state.assignments.insert(
                (tenant_id, subject_id.to_owned(), owner_role_id),
                timestamp(),
            );
        }

        Ok(())
    }
}

#[async_trait]
impl SecurityAdminRepository for InMemorySecurityRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.read().await;

        let mut roles: Vec<RoleDefinition> = state
            .roles
            .iter()
            .filter(|(_, role)| role.tenant_id == tenant_id)
            .map(|(role_id, role)| definition(role_id, role))
            .collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn find_role(
        &self,
        tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        let state = self.state.read().await;

        Ok(state
            .roles
            .iter()
            .find(|(_, role)| role.tenant_id == tenant_id && role.name == role_name)
            .map(|(role_id, role)| definition(role_id, role)))
    }

    async fn create_role(
        &self,
        tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;

        if state.role_id_by_name(tenant_id, &input.name).is_some() {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        let role_id = state.insert_role(tenant_id, &input.name, false, input.permissions);
        state
            .roles
            .get(&role_id)
            .map(|role| definition(&role_id, role))
            .ok_or_else(|| AppError::Internal(format!("role '{role_id}' vanished after insert")))
    }

    async fn replace_role_permissions(
        &self,
        tenant_id: TenantId,
        role_name: &str,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;

        let role_id = state
            .role_id_by_name(tenant_id, role_name)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;
        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        role.permissions = permissions.into_iter().collect();
        Ok(definition(&role_id, role))
    }

    async fn assign_role_to_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        let role_id = state
            .role_id_by_name(tenant_id, role_name)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' was not found")))?;

        if !state
            .subjects
            .contains_key(&(tenant_id, subject_id.to_owned()))
        {
            return Err(AppError::NotFound(format!(
                "subject '{subject_id}' does not belong to tenant '{tenant_id}'"
            )));
        }

        state
            .assignments
            .entry((tenant_id, subject_id.to_owned(), role_id))
            .or_insert_with(timestamp);
        Ok(())
    }

    async fn remove_role_from_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        let role_id = state.role_id_by_name(tenant_id, role_name);
        let removed = role_id.and_then(|role_id| {
            state
                .assignments
                .remove(&(tenant_id, subject_id.to_owned(), role_id))
        });

        if removed.is_none() {
            return Err(AppError::NotFound(format!(
                "role assignment '{subject_id}:{role_name}' was not found"
            )));
        }

        Ok(())
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.read().await;

        let mut assignments: Vec<RoleAssignment> = state
            .assignments
            .iter()
            .filter(|((stored_tenant_id, _, _), _)| *stored_tenant_id == tenant_id)
            .filter_map(|((_, subject_id, role_id), assigned_at)| {
                state.roles.get(role_id).map(|role| RoleAssignment {
                    subject_id: subject_id.clone(),
                    role_id: role_id.clone(),
                    role_name: role.name.clone(),
                    assigned_at: assigned_at.clone(),
                })
            })
            .collect();
        assignments.sort_by(|left, right| {
            (&left.subject_id, &left.role_name).cmp(&(&right.subject_id, &right.role_name))
        });
        Ok(assignments)
    }

    async fn list_subjects(&self, tenant_id: TenantId) -> AppResult<Vec<SubjectRecord>> {
        let state = self.state.read().await;

        Ok(state
            .subjects
            .iter()
            .filter(|((stored_tenant_id, _), _)| *stored_tenant_id == tenant_id)
            .map(|((_, subject_id), subject)| subject_record(subject_id, subject))
            .collect())
    }

    async fn set_subject_status(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        status: SubjectStatus,
    ) -> AppResult<SubjectRecord> {
        let mut state = self.state.write().await;

        let subject = state
            .subjects
            .get_mut(&(tenant_id, subject_id.to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "subject '{subject_id}' does not belong to tenant '{tenant_id}'"
                ))
            })?;

        subject.status = status;
        Ok(subject_record(subject_id, subject))
    }
}
