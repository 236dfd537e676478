use chrono::{NaiveDate, SecondsFormat};
use pedicare_application::{
    EffectivePermissions, PatientInput, RoleAssignment, RoleDefinition, SubjectRecord,
};
use pedicare_core::{Subject, SubjectStatus, TenantId};
use pedicare_domain::{
    Decision, DenialReason, GuardedOperation, Patient, PatientSex, PermissionDefinition,
};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub postgres: HealthDependencyStatus,
}

/// Status of one backing dependency.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub subject: String,
    pub tenant_id: TenantId,
    pub token: String,
}

/// Current session subject.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject_id: String,
    pub tenant_id: String,
    pub status: SubjectStatus,
}

impl From<Subject> for MeResponse {
    fn from(value: Subject) -> Self {
        Self {
            subject_id: value.subject_id().to_owned(),
            tenant_id: value.tenant_id().to_string(),
            status: value.status(),
        }
    }
}

/// Resolved permission set of the session subject.
#[derive(Debug, Serialize)]
pub struct EffectivePermissionsResponse {
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<DenialReason>,
}

impl From<EffectivePermissions> for EffectivePermissionsResponse {
    fn from(value: EffectivePermissions) -> Self {
        Self {
            permissions: value
                .permissions
                .into_iter()
                .map(String::from)
                .collect(),
            denial_reason: value.blanket_denial,
        }
    }
}

/// Decision for one permission key.
#[derive(Debug, Serialize)]
pub struct AuthorizationDecisionResponse {
    pub permission: String,
    pub decision: Decision,
}

#[derive(Debug, Serialize)]
pub struct CatalogEntryResponse {
    pub key: String,
    pub description: String,
}

impl From<&PermissionDefinition> for CatalogEntryResponse {
    fn from(value: &PermissionDefinition) -> Self {
        Self {
            key: value.key.to_string(),
            description: value.description.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OperationPermissionResponse {
    pub operation: GuardedOperation,
    pub permission: String,
}

/// Permission catalog and the key each guarded operation requires.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub permissions: Vec<CatalogEntryResponse>,
    pub operations: Vec<OperationPermissionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRolePermissionsRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub is_system: bool,
    pub permissions: Vec<String>,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id,
            name: value.name,
            is_system: value.is_system,
            permissions: value
                .permissions
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Body shared by assignment creation and removal.
#[derive(Debug, Deserialize)]
pub struct RoleAssignmentRequest {
    pub subject_id: String,
    pub role_name: String,
}

#[derive(Debug, Serialize)]
pub struct RoleAssignmentResponse {
    pub subject_id: String,
    pub role_id: String,
    pub role_name: String,
    pub assigned_at: String,
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            subject_id: value.subject_id,
            role_id: value.role_id,
            role_name: value.role_name,
            assigned_at: value.assigned_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubjectResponse {
    pub subject_id: String,
    pub display_name: String,
    pub status: SubjectStatus,
    pub created_at: String,
}

impl From<SubjectRecord> for SubjectResponse {
    fn from(value: SubjectRecord) -> Self {
        Self {
            subject_id: value.subject_id,
            display_name: value.display_name,
            status: value.status,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubjectStatusRequest {
    pub status: SubjectStatus,
}

/// Incoming patient demographics for create and update.
#[derive(Debug, Deserialize)]
pub struct PatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: PatientSex,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

impl From<PatientRequest> for PatientInput {
    fn from(value: PatientRequest) -> Self {
        Self {
            first_name: value.first_name,
            last_name: value.last_name,
            date_of_birth: value.date_of_birth,
            sex: value.sex,
            guardian_name: value.guardian_name,
            guardian_phone: value.guardian_phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PatientResponse {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: PatientSex,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Patient> for PatientResponse {
    fn from(value: Patient) -> Self {
        let details = value.details();
        Self {
            patient_id: value.patient_id().to_string(),
            first_name: details.first_name().to_owned(),
            last_name: details.last_name().to_owned(),
            date_of_birth: details.date_of_birth(),
            sex: details.sex(),
            guardian_name: details.guardian_name().map(str::to_owned),
            guardian_phone: details.guardian_phone().map(str::to_owned),
            created_at: value
                .created_at()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            updated_at: value
                .updated_at()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
