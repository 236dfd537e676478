use async_trait::async_trait;
use chrono::NaiveDate;

use pedicare_core::{AppResult, TenantId};
use pedicare_domain::{Patient, PatientId, PatientSex};

/// Unvalidated patient demographics supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Recorded sex.
    pub sex: PatientSex,
    /// Parent or guardian name.
    pub guardian_name: Option<String>,
    /// Parent or guardian phone number.
    pub guardian_phone: Option<String>,
}

/// Repository port for tenant-scoped patient records.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Lists patients of one clinic ordered by last then first name.
    async fn list_patients(&self, tenant_id: TenantId) -> AppResult<Vec<Patient>>;

    /// Finds one patient in clinic scope.
    async fn find_patient(
        &self,
        tenant_id: TenantId,
        patient_id: PatientId,
    ) -> AppResult<Option<Patient>>;

    /// Inserts a new patient.
    async fn insert_patient(&self, patient: Patient) -> AppResult<()>;

    /// Overwrites an existing patient.
    async fn update_patient(&self, patient: Patient) -> AppResult<()>;

    /// Removes a patient. Returns `false` when nothing matched.
    async fn delete_patient(&self, tenant_id: TenantId, patient_id: PatientId) -> AppResult<bool>;
}
