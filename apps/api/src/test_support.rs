use std::sync::Arc;

use pedicare_application::{
    AuthorizationService, OperationPermissionMap, PatientService, SecurityAdminRepository,
    SecurityAdminService, SubjectDirectory, TenantRepository,
};
use pedicare_core::{Subject, TenantId};
use pedicare_domain::PermissionCatalog;
use pedicare_infrastructure::{
    InMemoryAuditRepository, InMemoryPatientRepository, InMemorySecurityRepository,
};
use tower_sessions::{MemoryStore, Session};

use crate::state::AppState;

pub const BOOTSTRAP_TOKEN: &str = "test-bootstrap-token";
pub const FRONTEND_URL: &str = "http://localhost:3000";

/// In-memory API wiring with one provisioned clinic.
///
/// The first subject joined, `founder`, holds the Owner role.
pub struct TestApp {
    pub state: AppState,
    pub security: Arc<InMemorySecurityRepository>,
    pub audit: Arc<InMemoryAuditRepository>,
    pub tenant_id: TenantId,
}

impl TestApp {
    pub async fn new() -> Self {
        let security = Arc::new(InMemorySecurityRepository::new());
        let audit = Arc::new(InMemoryAuditRepository::new());
        let authorization_service = AuthorizationService::new(
            security.clone(),
            Arc::new(OperationPermissionMap::clinic_default()),
        );

        let state = AppState {
            security_admin_service: SecurityAdminService::new(
                authorization_service.clone(),
                security.clone(),
                audit.clone(),
            ),
            patient_service: PatientService::new(
                authorization_service.clone(),
                Arc::new(InMemoryPatientRepository::new()),
                audit.clone(),
            ),
            authorization_service,
            subject_directory: security.clone(),
            tenant_repository: security.clone(),
            postgres_pool: None,
            frontend_url: FRONTEND_URL.to_owned(),
            bootstrap_token: BOOTSTRAP_TOKEN.to_owned(),
        };

        let app = Self {
            state,
            security,
            audit,
            tenant_id: TenantId::new(),
        };
        app.join("founder", &[]).await;
        app
    }

    /// Provisions a subject and assigns the named roles.
    pub async fn join(&self, subject_id: &str, role_names: &[&str]) -> Subject {
        let joined = self
            .security
            .ensure_membership(
                self.tenant_id,
                subject_id,
                subject_id,
                &PermissionCatalog::clinic_default(),
            )
            .await;
        assert!(joined.is_ok());

        for role_name in role_names {
            let assigned = self
                .security
                .assign_role_to_subject(self.tenant_id, subject_id, role_name)
                .await;
            assert!(assigned.is_ok(), "role '{role_name}' should be assignable");
        }

        self.subject(subject_id).await
    }

    /// Re-reads a subject with its current status.
    pub async fn subject(&self, subject_id: &str) -> Subject {
        match self.security.find_subject(self.tenant_id, subject_id).await {
            Ok(Some(subject)) => subject,
            other => panic!("expected subject '{subject_id}', got {other:?}"),
        }
    }
}

pub fn empty_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}
