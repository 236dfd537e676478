use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pedicare_application::PatientRepository;
use pedicare_core::{AppError, AppResult, TenantId};
use pedicare_domain::{Patient, PatientId};

/// In-memory patient repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryPatientRepository {
    patients: RwLock<HashMap<(TenantId, PatientId), Patient>>,
}

impl InMemoryPatientRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn list_patients(&self, tenant_id: TenantId) -> AppResult<Vec<Patient>> {
        let patients = self.patients.read().await;

        let mut values: Vec<Patient> = patients
            .iter()
            .filter(|((stored_tenant_id, _), _)| *stored_tenant_id == tenant_id)
            .map(|(_, patient)| patient.clone())
            .collect();
        values.sort_by(|left, right| {
            (left.details().last_name(), left.details().first_name())
                .cmp(&(right.details().last_name(), right.details().first_name()))
        });
        Ok(values)
    }

    async fn find_patient(
        &self,
        tenant_id: TenantId,
        patient_id: PatientId,
    ) -> AppResult<Option<Patient>> {
        Ok(self
            .patients
            .read()
            .await
            .get(&(tenant_id, patient_id))
            .cloned())
    }

    async fn insert_patient(&self, patient: Patient) -> AppResult<()> {
        let key = (patient.tenant_id(), patient.patient_id());
        let mut patients = self.patients.write().await;

        if patients.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "patient '{}' already exists",
                key.1
            )));
        }

        patients.insert(key, patient);
        Ok(())
    }

    async fn update_patient(&self, patient: Patient) -> AppResult<()> {
        let key = (patient.tenant_id(), patient.patient_id());
        let mut patients = self.patients.write().await;

        let Some(existing) = patients.get_mut(&key) else {
            return Err(AppError::NotFound(format!(
                "patient '{}' was not found",
                key.1
            )));
        };

        *existing = patient;
        Ok(())
    }

    async fn delete_patient(&self, tenant_id: TenantId, patient_id: PatientId) -> AppResult<bool> {
        Ok(self
            .patients
            .write()
            .await
            .remove(&(tenant_id, patient_id))
            .is_some())
    }
}
