use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pedicare_core::{AppError, AppResult, SubjectStatus, TenantId};
use pedicare_domain::{AuditAction, PermissionKey, keys};

use crate::security_admin_ports::{
    CreateRoleInput, RoleAssignment, RoleDefinition, SecurityAdminRepository, SubjectRecord,
};
use crate::test_support::{
    FakeAuthorizationRepository, RecordingAuditRepository, authorization_service, key, subject,
};

use super::SecurityAdminService;

#[derive(Default)]
struct FakeSecurityAdminRepository {
    roles: Mutex<Vec<RoleDefinition>>,
    assignments: Mutex<Vec<(TenantId, String, String)>>,
    statuses: Mutex<Vec<(String, SubjectStatus)>>,
    writes: Mutex<usize>,
}

impl FakeSecurityAdminRepository {
    async fn with_system_role(self, name: &str) -> Self {
        self.roles.lock().await.push(RoleDefinition {
            role_id: name.to_lowercase(),
            name: name.to_owned(),
            is_system: true,
            permissions: vec![key(keys::PATIENT_VIEW)],
        });
        self
    }

    async fn writes(&self) -> usize {
        *self.writes.lock().await
    }
}

#[async_trait]
impl SecurityAdminRepository for FakeSecurityAdminRepository {
    async fn list_roles(&self, _tenant_id: TenantId) -> AppResult<Vec<RoleDefinition>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn find_role(
        &self,
        _tenant_id: TenantId,
        role_name: &str,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name == role_name)
            .cloned())
    }

    async fn create_role(
        &self,
        _tenant_id: TenantId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        *self.writes.lock().await += 1;
        let role = RoleDefinition {
            role_id: input.name.to_lowercase(),
            name: input.name,
            is_system: false,
            permissions: input.permissions,
        };
        self.roles.lock().await.push(role.clone());
        Ok(role)
    }

    async fn replace_role_permissions(
        &self,
        _tenant_id: TenantId,
        role_name: &str,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<RoleDefinition> {
        *self.writes.lock().await += 1;
        let mut roles = self.roles.lock().await;
        let role = roles
            .iter_mut()
            .find(|role| role.name == role_name)
            .ok_or_else(|| AppError::NotFound(role_name.to_owned()))?;
        role.permissions = permissions;
        Ok(role.clone())
    }

    async fn assign_role_to_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        *self.writes.lock().await += 1;
        self.assignments
            .lock()
            .await
            .push((tenant_id, subject_id.to_owned(), role_name.to_owned()));
        Ok(())
    }

    async fn remove_role_from_subject(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        role_name: &str,
    ) -> AppResult<()> {
        *self.writes.lock().await += 1;
        self.assignments.lock().await.retain(|(stored_tenant, stored_subject, stored_role)| {
            !(stored_tenant == &tenant_id && stored_subject == subject_id && stored_role == role_name)
        });
        Ok(())
    }

    async fn list_role_assignments(&self, tenant_id: TenantId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|(stored_tenant, _, _)| stored_tenant == &tenant_id)
            .map(|(_, subject_id, role_name)| RoleAssignment {
                subject_id: subject_id.clone(),
                role_id: role_name.to_lowercase(),
                role_name: role_name.clone(),
                assigned_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .collect())
    }

    async fn list_subjects(&self, _tenant_id: TenantId) -> AppResult<Vec<SubjectRecord>> {
        Ok(self
            .statuses
            .lock()
            .await
            .iter()
            .map(|(subject_id, status)| SubjectRecord {
                subject_id: subject_id.clone(),
                display_name: subject_id.clone(),
                status: *status,
                created_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .collect())
    }

    async fn set_subject_status(
        &self,
        _tenant_id: TenantId,
        subject_id: &str,
        status: SubjectStatus,
    ) -> AppResult<SubjectRecord> {
        *self.writes.lock().await += 1;
        self.statuses
            .lock()
            .await
            .push((subject_id.to_owned(), status));
        Ok(SubjectRecord {
            subject_id: subject_id.to_owned(),
            display_name: subject_id.to_owned(),
            status,
            created_at: "2026-01-01T00:00:00Z".to_owned(),
        })
    }
}

struct Fixture {
    tenant_id: TenantId,
    authorization: Arc<FakeAuthorizationRepository>,
    repository: Arc<FakeSecurityAdminRepository>,
    audit: Arc<RecordingAuditRepository>,
    service: SecurityAdminService,
}

async fn fixture() -> Fixture {
    let tenant_id = TenantId::new();
    let authorization = Arc::new(
        FakeAuthorizationRepository::default()
            .with_role(tenant_id, "permissions-admin", &[keys::ADMIN_PERMISSIONS])
            .with_role(tenant_id, "users-admin", &[keys::ADMIN_USERS])
            .with_role(tenant_id, "doctor", &[keys::PATIENT_VIEW])
            .with_assignment(tenant_id, "owner", "permissions-admin")
            .with_assignment(tenant_id, "owner", "users-admin")
            .with_assignment(tenant_id, "office", "users-admin")
            .with_assignment(tenant_id, "dr-ada", "doctor"),
    );
    let repository = Arc::new(
        FakeSecurityAdminRepository::default()
            .with_system_role("Owner")
            .await,
    );
    let audit = Arc::new(RecordingAuditRepository::default());
    let service = SecurityAdminService::new(
        authorization_service(authorization.clone()),
        repository.clone(),
        audit.clone(),
    );

    Fixture {
        tenant_id,
        authorization,
        repository,
        audit,
        service,
    }
}

#[tokio::test]
async fn create_role_persists_unique_catalog_grants_and_audits() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let role = fixture
        .service
        .create_role(
            &owner,
            CreateRoleInput {
                name: "  Nurse ".to_owned(),
                permissions: vec![
                    key(keys::CLINICAL_VITALS_RECORD),
                    key(keys::CLINICAL_VITALS_RECORD),
                    key(keys::PATIENT_VIEW),
                ],
            },
        )
        .await;

    assert!(role.is_ok());
    let Ok(role) = role else {
        return;
    };
    assert_eq!(role.name, "Nurse");
    assert_eq!(role.permissions.len(), 2);

    let events = fixture.audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::SecurityRoleCreated);
    assert_eq!(events[0].subject, "owner");
}

#[tokio::test]
async fn create_role_rejects_permission_outside_catalog() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let role = fixture
        .service
        .create_role(
            &owner,
            CreateRoleInput {
                name: "Nurse".to_owned(),
                permissions: vec![key("patient.veiw")],
            },
        )
        .await;

    assert!(matches!(role, Err(AppError::Validation(_))));
    assert_eq!(fixture.repository.writes().await, 0);
}

#[tokio::test]
async fn denied_actor_cannot_create_role_and_nothing_is_written() {
    let fixture = fixture().await;
    let doctor = subject("dr-ada", fixture.tenant_id, SubjectStatus::Active);

    let role = fixture
        .service
        .create_role(
            &doctor,
            CreateRoleInput {
                name: "Shadow Admin".to_owned(),
                permissions: vec![key(keys::ADMIN_PERMISSIONS)],
            },
        )
        .await;

    assert!(matches!(role, Err(AppError::Forbidden(_))));
    assert_eq!(fixture.repository.writes().await, 0);
    assert!(fixture.audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn inactive_owner_cannot_assign_roles() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Inactive);

    let result = fixture
        .service
        .assign_role(&owner, "dr-ada", "Owner")
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(ref message)) if message.contains("subject_inactive")));
    assert_eq!(fixture.repository.writes().await, 0);
}

#[tokio::test]
async fn assign_and_unassign_role_emit_audit_events() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    assert!(
        fixture
            .service
            .assign_role(&owner, "dr-ada", "Owner")
            .await
            .is_ok()
    );
    let assignments = fixture.service.list_role_assignments(&owner).await;
    assert!(matches!(assignments, Ok(ref values) if values.len() == 1));

    assert!(
        fixture
            .service
            .unassign_role(&owner, "dr-ada", "Owner")
            .await
            .is_ok()
    );
    let assignments = fixture.service.list_role_assignments(&owner).await;
    assert!(matches!(assignments, Ok(ref values) if values.is_empty()));

    let events = fixture.audit.events.lock().await;
    let actions: Vec<AuditAction> = events.iter().map(|event| event.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::SecurityRoleAssigned,
            AuditAction::SecurityRoleUnassigned
        ]
    );
}

#[tokio::test]
async fn system_role_grants_cannot_be_replaced() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let result = fixture
        .service
        .update_role_permissions(&owner, "Owner", vec![key(keys::PATIENT_VIEW)])
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(fixture.repository.writes().await, 0);
}

#[tokio::test]
async fn custom_role_grants_are_replaced() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);
    let created = fixture
        .service
        .create_role(
            &owner,
            CreateRoleInput {
                name: "Billing".to_owned(),
                permissions: vec![key(keys::BILLING_VIEW)],
            },
        )
        .await;
    assert!(created.is_ok());

    let updated = fixture
        .service
        .update_role_permissions(
            &owner,
            "Billing",
            vec![key(keys::BILLING_VIEW), key(keys::BILLING_PAYMENT)],
        )
        .await;

    assert!(matches!(updated, Ok(ref role) if role.permissions.len() == 2));
}

#[tokio::test]
async fn updating_unknown_role_is_not_found() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let result = fixture
        .service
        .update_role_permissions(&owner, "Ghost", vec![key(keys::BILLING_VIEW)])
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn subject_status_requires_admin_users() {
    let fixture = fixture().await;
    let office = subject("office", fixture.tenant_id, SubjectStatus::Active);
    let doctor = subject("dr-ada", fixture.tenant_id, SubjectStatus::Active);

    let updated = fixture
        .service
        .update_subject_status(&office, "dr-ada", SubjectStatus::Suspended)
        .await;
    assert!(matches!(updated, Ok(ref record) if record.status == SubjectStatus::Suspended));

    let denied = fixture
        .service
        .update_subject_status(&doctor, "office", SubjectStatus::Inactive)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let listed = fixture.service.list_subjects(&office).await;
    assert!(matches!(listed, Ok(ref records) if records.len() == 1));
}

#[tokio::test]
async fn users_admin_cannot_manage_roles() {
    let fixture = fixture().await;
    let office = subject("office", fixture.tenant_id, SubjectStatus::Active);

    let roles = fixture.service.list_roles(&office).await;
    assert!(matches!(roles, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn subjects_cannot_change_their_own_status() {
    let fixture = fixture().await;
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let result = fixture
        .service
        .update_subject_status(&owner, "owner", SubjectStatus::Inactive)
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(fixture.repository.writes().await, 0);
}

#[tokio::test]
async fn resolution_outage_blocks_mutation() {
    let fixture = fixture().await;
    fixture.authorization.set_unavailable(true);
    let owner = subject("owner", fixture.tenant_id, SubjectStatus::Active);

    let result = fixture
        .service
        .assign_role(&owner, "dr-ada", "Owner")
        .await;

    assert!(matches!(result, Err(AppError::Unavailable(_))));
    assert_eq!(fixture.repository.writes().await, 0);
}
