use std::sync::Arc;

use pedicare_application::{
    AuthorizationService, PatientService, SecurityAdminService, SubjectDirectory,
    TenantRepository,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub security_admin_service: SecurityAdminService,
    pub patient_service: PatientService,
    pub subject_directory: Arc<dyn SubjectDirectory>,
    pub tenant_repository: Arc<dyn TenantRepository>,
    pub postgres_pool: Option<PgPool>,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
