use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pedicare_core::{AppError, AppResult, Subject, SubjectStatus, TenantId};
use pedicare_domain::PermissionKey;

use crate::{
    AssignedRole, AuditEvent, AuditRepository, AuthorizationRepository, AuthorizationService,
    OperationPermissionMap,
};

pub(crate) fn key(value: &str) -> PermissionKey {
    match PermissionKey::parse(value) {
        Ok(key) => key,
        Err(error) => panic!("invalid test permission key '{value}': {error}"),
    }
}

pub(crate) fn subject(subject_id: &str, tenant_id: TenantId, status: SubjectStatus) -> Subject {
    match Subject::new(subject_id, tenant_id, status) {
        Ok(subject) => subject,
        Err(error) => panic!("invalid test subject '{subject_id}': {error}"),
    }
}

struct FakeRole {
    role_id: String,
    name: String,
    tenant_id: TenantId,
    permissions: Vec<PermissionKey>,
}

/// In-process role store with call counters and an outage switch.
#[derive(Default)]
pub(crate) struct FakeAuthorizationRepository {
    roles: std::sync::Mutex<Vec<FakeRole>>,
    assignments: std::sync::Mutex<Vec<(TenantId, String, String)>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl FakeAuthorizationRepository {
    pub(crate) fn with_role(
        self,
        tenant_id: TenantId,
        role_id: &str,
        permissions: &[&str],
    ) -> Self {
        if let Ok(mut roles) = self.roles.lock() {
            roles.push(FakeRole {
                role_id: role_id.to_owned(),
                name: role_id.to_owned(),
                tenant_id,
                permissions: permissions.iter().map(|value| key(value)).collect(),
            });
        }
        self
    }

    pub(crate) fn with_assignment(self, tenant_id: TenantId, subject_id: &str, role_id: &str) -> Self {
        if let Ok(mut assignments) = self.assignments.lock() {
            assignments.push((tenant_id, subject_id.to_owned(), role_id.to_owned()));
        }
        self
    }

    pub(crate) fn grant(&self, role_id: &str, permission: &str) {
        if let Ok(mut roles) = self.roles.lock() {
            for role in roles.iter_mut().filter(|role| role.role_id == role_id) {
                role.permissions.push(key(permission));
            }
        }
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn begin_read(&self) -> AppResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable(
                "role store connection refused".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn list_assigned_roles(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
    ) -> AppResult<Vec<AssignedRole>> {
        self.begin_read()?;
        let assignments = self
            .assignments
            .lock()
            .map_err(|_| AppError::Internal("assignment lock poisoned".to_owned()))?;
        let roles = self
            .roles
            .lock()
            .map_err(|_| AppError::Internal("role lock poisoned".to_owned()))?;

        Ok(assignments
            .iter()
            .filter(|(stored_tenant_id, stored_subject, _)| {
                *stored_tenant_id == tenant_id && stored_subject == subject_id
            })
            .filter_map(|(_, _, role_id)| roles.iter().find(|role| &role.role_id == role_id))
            .map(|role| AssignedRole {
                role_id: role.role_id.clone(),
                role_name: role.name.clone(),
                role_tenant_id: role.tenant_id,
            })
            .collect())
    }

    async fn list_permissions_for_roles(
        &self,
        tenant_id: TenantId,
        role_ids: &[String],
    ) -> AppResult<Vec<PermissionKey>> {
        self.begin_read()?;
        let roles = self
            .roles
            .lock()
            .map_err(|_| AppError::Internal("role lock poisoned".to_owned()))?;

        Ok(roles
            .iter()
            .filter(|role| role.tenant_id == tenant_id && role_ids.contains(&role.role_id))
            .flat_map(|role| role.permissions.iter().cloned())
            .collect())
    }
}

/// Audit sink that keeps every event for assertions.
#[derive(Default)]
pub(crate) struct RecordingAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) fn authorization_service(
    repository: Arc<FakeAuthorizationRepository>,
) -> AuthorizationService {
    AuthorizationService::new(repository, Arc::new(OperationPermissionMap::clinic_default()))
}
