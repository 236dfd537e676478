use serde::{Deserialize, Serialize};

use crate::permission::{PermissionCatalog, PermissionKey, keys};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    SecurityRoleCreated,
    /// Emitted when a role's grants are replaced.
    SecurityRolePermissionsUpdated,
    /// Emitted when a role is assigned to a subject.
    SecurityRoleAssigned,
    /// Emitted when a role is removed from a subject.
    SecurityRoleUnassigned,
    /// Emitted when a subject is activated, deactivated or suspended.
    SecuritySubjectStatusChanged,
    /// Emitted when a patient is registered.
    PatientCreated,
    /// Emitted when patient demographics change.
    PatientUpdated,
    /// Emitted when a patient record is removed.
    PatientDeleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityRoleCreated => "security.role.created",
            Self::SecurityRolePermissionsUpdated => "security.role.permissions_updated",
            Self::SecurityRoleAssigned => "security.role.assigned",
            Self::SecurityRoleUnassigned => "security.role.unassigned",
            Self::SecuritySubjectStatusChanged => "security.subject.status_changed",
            Self::PatientCreated => "patient.created",
            Self::PatientUpdated => "patient.updated",
            Self::PatientDeleted => "patient.deleted",
        }
    }
}

/// Roles seeded into every new clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRole {
    /// Clinic owner, holds every catalog permission.
    Owner,
    /// Treating physician.
    Doctor,
    /// Front desk and billing staff.
    Staff,
    /// Laboratory technician.
    LabTechnician,
}

impl SystemRole {
    /// Returns the role name as stored.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Doctor => "Doctor",
            Self::Staff => "Staff",
            Self::LabTechnician => "Lab Technician",
        }
    }

    /// Returns the seeded grants. `None` means every key in the catalog.
    #[must_use]
    pub fn default_grants(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Owner => None,
            Self::Doctor => Some(&[
                keys::PATIENT_VIEW,
                keys::PATIENT_ADD,
                keys::PATIENT_EDIT,
                keys::CLINICAL_VISIT_VIEW,
                keys::CLINICAL_VISIT_CREATE,
                keys::CLINICAL_VISIT_EDIT,
                keys::CLINICAL_VACCINE_VIEW,
                keys::CLINICAL_VACCINE_RECORD,
                keys::CLINICAL_MILESTONE_VIEW,
                keys::CLINICAL_MILESTONE_RECORD,
                keys::CLINICAL_VITALS_VIEW,
                keys::CLINICAL_VITALS_RECORD,
                keys::LAB_REQUEST_VIEW,
                keys::LAB_REQUEST_CREATE,
                keys::REPORT_VIEW,
            ]),
            Self::Staff => Some(&[
                keys::PATIENT_VIEW,
                keys::PATIENT_ADD,
                keys::PATIENT_EDIT,
                keys::CLINICAL_VISIT_VIEW,
                keys::CLINICAL_VACCINE_VIEW,
                keys::CLINICAL_VITALS_VIEW,
                keys::BILLING_VIEW,
                keys::BILLING_CREATE,
                keys::BILLING_PAYMENT,
            ]),
            Self::LabTechnician => Some(&[
                keys::PATIENT_VIEW,
                keys::LAB_REQUEST_VIEW,
                keys::LAB_REQUEST_CREATE,
                keys::LAB_RESULT_RECORD,
            ]),
        }
    }

    /// Resolves the seeded grants against a catalog.
    ///
    /// Owner receives every catalog key. Keys missing from a custom catalog
    /// are skipped.
    #[must_use]
    pub fn grants_in(&self, catalog: &PermissionCatalog) -> Vec<PermissionKey> {
        match self.default_grants() {
            None => catalog.keys().cloned().collect(),
            Some(grants) => grants
                .iter()
                .filter_map(|key| catalog.resolve(key).ok())
                .collect(),
        }
    }

    /// Returns all system roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Owner, Self::Doctor, Self::Staff, Self::LabTechnician]
    }
}
