use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use pedicare_core::{AppError, AppResult, Subject};
use pedicare_domain::{AuditAction, GuardedOperation, Patient, PatientDetails, PatientId};

use crate::{AuditEvent, AuditRepository, AuthorizationService, PatientInput, PatientRepository};


/// Application service for patient registration and chart headers.
///
/// Every operation checks the caller's permission before it reads or
/// mutates the patient store.
#[derive(Clone)]
pub struct PatientService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn PatientRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl PatientService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn PatientRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    /// Lists the caller's clinic patients.
    pub async fn list_patients(&self, actor: &Subject) -> AppResult<Vec<Patient>> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::PatientList)
            .await?;

        self.repository.list_patients(actor.tenant_id()).await
    }

    /// Returns one patient of the caller's clinic.
    pub async fn get_patient(&self, actor: &Subject, patient_id: PatientId) -> AppResult<Patient> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::PatientRead)
            .await?;

        self.find_existing(actor, patient_id).await
    }

    /// Registers a patient and emits an audit event.
    pub async fn create_patient(&self, actor: &Subject, input: PatientInput) -> AppResult<Patient> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::PatientCreate)
            .await?;

        let now = Utc::now();
        let details = validate(input, now.date_naive())?;
        let patient = Patient::new(PatientId::new(), actor.tenant_id(), details, now, now);
        self.repository.insert_patient(patient.clone()).await?;

        self.append_audit_event(actor, AuditAction::PatientCreated, patient.patient_id())
            .await?;

        Ok(patient)
    }

    /// Replaces a patient's demographics and emits an audit event.
    pub async fn update_patient(
        &self,
        actor: &Subject,
        patient_id: PatientId,
        input: PatientInput,
    ) -> AppResult<Patient> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::PatientUpdate)
            .await?;

        let now = Utc::now();
        let details = validate(input, now.date_naive())?;
        let mut patient = self.find_existing(actor, patient_id).await?;
        patient.revise(details, now);
        self.repository.update_patient(patient.clone()).await?;

        self.append_audit_event(actor, AuditAction::PatientUpdated, patient_id)
            .await?;

        Ok(patient)
    }

    /// Deletes a patient and emits an audit event.
    pub async fn delete_patient(&self, actor: &Subject, patient_id: PatientId) -> AppResult<()> {
        self.authorization_service
            .require_operation(actor, GuardedOperation::PatientDelete)
            .await?;

        if !self
            .repository
            .delete_patient(actor.tenant_id(), patient_id)
            .await?
        {
            return Err(not_found(patient_id));
        }

        self.append_audit_event(actor, AuditAction::PatientDeleted, patient_id)
            .await
    }

    async fn find_existing(&self, actor: &Subject, patient_id: PatientId) -> AppResult<Patient> {
        self.repository
            .find_patient(actor.tenant_id(), patient_id)
            .await?
            .ok_or_else(|| not_found(patient_id))
    }

    async fn append_audit_event(
        &self,
        actor: &Subject,
        action: AuditAction,
        patient_id: PatientId,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.subject_id().to_owned(),
                action,
                resource_type: "patient".to_owned(),
                resource_id: patient_id.to_string(),
                detail: None,
            })
            .await
    }
}

fn validate(input: PatientInput, today: NaiveDate) -> AppResult<PatientDetails> {
    PatientDetails::new(
        input.first_name,
        input.last_name,
        input.date_of_birth,
        input.sex,
        input.guardian_name,
        input.guardian_phone,
        today,
    )
}

fn not_found(patient_id: PatientId) -> AppError {
    AppError::NotFound(format!("patient '{patient_id}' was not found"))
}
