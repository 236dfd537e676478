use std::sync::Arc;

use pedicare_application::{
    AuthorizationService, CreateRoleInput, OperationPermissionMap, SecurityAdminRepository,
    SubjectDirectory, TenantRepository,
};
use pedicare_core::{AppError, Subject, SubjectStatus, TenantId};
use pedicare_domain::{Decision, DenialReason, PermissionCatalog, PermissionKey, SystemRole};

use super::InMemorySecurityRepository;

fn permission(value: &str) -> PermissionKey {
    match PermissionKey::parse(value) {
        Ok(key) => key,
        Err(error) => panic!("invalid test permission '{value}': {error}"),
    }
}

async fn provisioned(tenant_id: TenantId, subjects: &[&str]) -> Arc<InMemorySecurityRepository> {
    let repository = Arc::new(InMemorySecurityRepository::new());
    let catalog = PermissionCatalog::clinic_default();
    for subject_id in subjects {
        let ensured = repository
            .ensure_membership(tenant_id, subject_id, subject_id, &catalog)
            .await;
        assert!(ensured.is_ok());
    }
    repository
}

async fn current_subject(
    repository: &InMemorySecurityRepository,
    tenant_id: TenantId,
    subject_id: &str,
) -> Subject {
    match repository.find_subject(tenant_id, subject_id).await {
        Ok(Some(subject)) => subject,
        other => panic!("expected subject '{subject_id}', got {other:?}"),
    }
}

fn service(repository: Arc<InMemorySecurityRepository>) -> AuthorizationService {
    AuthorizationService::new(repository, Arc::new(OperationPermissionMap::clinic_default()))
}

#[tokio::test]
async fn new_clinic_is_seeded_with_system_roles() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder"]).await;

    let roles = repository.list_roles(tenant_id).await;
    let Ok(roles) = roles else {
        panic!("roles should list");
    };

    let mut names: Vec<&str> = roles.iter().map(|role| role.name.as_str()).collect();
    names.sort_unstable();
    let mut expected: Vec<&str> = SystemRole::all().iter().map(SystemRole::name).collect();
    expected.sort_unstable();
    assert_eq!(names, expected);
    assert!(roles.iter().all(|role| role.is_system));
}

#[tokio::test]
async fn first_subject_becomes_owner_and_later_subjects_start_empty() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder", "newcomer"]).await;
    let authorization = service(repository.clone());

    let founder = current_subject(&repository, tenant_id, "founder").await;
    let newcomer = current_subject(&repository, tenant_id, "newcomer").await;

    let owner_view = authorization
        .authorize(&founder, &permission("admin.permissions"))
        .await;
    assert!(matches!(owner_view, Ok(Decision::Allowed)));

    let newcomer_view = authorization
        .authorize(&newcomer, &permission("patient.view"))
        .await;
    assert!(matches!(
        newcomer_view,
        Ok(Decision::Denied(DenialReason::NoMatchingRole))
    ));
}

#[tokio::test]
async fn repeated_membership_keeps_stored_status() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder", "nurse"]).await;

    let updated = repository
        .set_subject_status(tenant_id, "nurse", SubjectStatus::Suspended)
        .await;
    assert!(updated.is_ok());

    let again = repository
        .ensure_membership(
            tenant_id,
            "nurse",
            "nurse",
            &PermissionCatalog::clinic_default(),
        )
        .await;
    assert!(again.is_ok());

    let nurse = current_subject(&repository, tenant_id, "nurse").await;
    assert_eq!(nurse.status(), SubjectStatus::Suspended);
}

#[tokio::test]
async fn doctor_role_grants_clinical_but_not_delete() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder", "dr-ada"]).await;
    let assigned = repository
        .assign_role_to_subject(tenant_id, "dr-ada", SystemRole::Doctor.name())
        .await;
    assert!(assigned.is_ok());

    let authorization = service(repository.clone());
    let doctor = current_subject(&repository, tenant_id, "dr-ada").await;

    assert!(matches!(
        authorization
            .authorize(&doctor, &permission("patient.add"))
            .await,
        Ok(Decision::Allowed)
    ));
    assert!(matches!(
        authorization
            .authorize(&doctor, &permission("patient.delete"))
            .await,
        Ok(Decision::Denied(DenialReason::NoMatchingRole))
    ));
}

#[tokio::test]
async fn role_from_another_clinic_is_ignored() {
    let home = TenantId::new();
    let other = TenantId::new();
    let repository = Arc::new(InMemorySecurityRepository::new());
    let catalog = PermissionCatalog::clinic_default();
    assert!(
        repository
            .ensure_membership(home, "founder", "founder", &catalog)
            .await
            .is_ok()
    );
    assert!(
        repository
            .ensure_membership(home, "drifter", "drifter", &catalog)
            .await
            .is_ok()
    );
    assert!(
        repository
            .ensure_membership(other, "other-founder", "other-founder", &catalog)
            .await
            .is_ok()
    );

    let Ok(Some(foreign_owner)) = repository
        .find_role(other, SystemRole::Owner.name())
        .await
    else {
        panic!("other clinic owner role should exist");
    };
    repository
        .insert_raw_assignment(home, "drifter", &foreign_owner.role_id)
        .await;

    let authorization = service(repository.clone());
    let drifter = current_subject(&repository, home, "drifter").await;

    let decision = authorization
        .authorize(&drifter, &permission("patient.view"))
        .await;
    assert!(matches!(
        decision,
        Ok(Decision::Denied(DenialReason::TenantMismatch))
    ));
}

#[tokio::test]
async fn assignment_requires_subject_in_same_clinic() {
    let home = TenantId::new();
    let repository = provisioned(home, &["founder"]).await;

    let result = repository
        .assign_role_to_subject(home, "stranger", SystemRole::Staff.name())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = repository
        .assign_role_to_subject(home, "founder", "Ghost")
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_role_name_conflicts() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder"]).await;

    let result = repository
        .create_role(
            tenant_id,
            CreateRoleInput {
                name: SystemRole::Staff.name().to_owned(),
                permissions: Vec::new(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn replaced_grants_are_visible_to_the_next_decision() {
    let tenant_id = TenantId::new();
    let repository = provisioned(tenant_id, &["founder", "billing"]).await;
    let created = repository
        .create_role(
            tenant_id,
            CreateRoleInput {
                name: "Cashier".to_owned(),
                permissions: vec![permission("billing.view")],
            },
        )
        .await;
    assert!(created.is_ok());
    assert!(
        repository
            .assign_role_to_subject(tenant_id, "billing", "Cashier")
            .await
            .is_ok()
    );

    let authorization = service(repository.clone());
    let cashier = current_subject(&repository, tenant_id, "billing").await;
    let payment = permission("billing.payment");

    assert!(matches!(
        authorization.authorize(&cashier, &payment).await,
        Ok(Decision::Denied(DenialReason::NoMatchingRole))
    ));

    let replaced = repository
        .replace_role_permissions(
            tenant_id,
            "Cashier",
            vec![permission("billing.view"), payment.clone()],
        )
        .await;
    assert!(replaced.is_ok());

    assert!(matches!(
        authorization.authorize(&cashier, &payment).await,
        Ok(Decision::Allowed)
    ));

    assert!(
        repository
            .remove_role_from_subject(tenant_id, "billing", "Cashier")
            .await
            .is_ok()
    );
    assert!(matches!(
        authorization.authorize(&cashier, &payment).await,
        Ok(Decision::Denied(DenialReason::NoMatchingRole))
    ));
}
