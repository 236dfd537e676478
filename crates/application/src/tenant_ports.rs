use async_trait::async_trait;

use pedicare_core::{AppResult, TenantId};
use pedicare_domain::PermissionCatalog;

/// Repository port for clinic and membership provisioning.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Ensures the clinic, its system roles and the subject exist.
    ///
    /// A missing clinic is created with every system role seeded from the
    /// catalog. A missing subject is created active. The first subject of a
    /// clinic receives the Owner role. Existing subjects are left unchanged.
    async fn ensure_membership(
        &self,
        tenant_id: TenantId,
        subject_id: &str,
        display_name: &str,
        catalog: &PermissionCatalog,
    ) -> AppResult<()>;
}
