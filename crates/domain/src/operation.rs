use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pedicare_core::AppError;
use serde::{Deserialize, Serialize};

use crate::permission::{PermissionKey, keys};

/// Operations that require a permission before they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuardedOperation {
    /// List tenant patients.
    #[serde(rename = "patient.list")]
    PatientList,
    /// Read one patient.
    #[serde(rename = "patient.read")]
    PatientRead,
    /// Register a patient.
    #[serde(rename = "patient.create")]
    PatientCreate,
    /// Update patient demographics.
    #[serde(rename = "patient.update")]
    PatientUpdate,
    /// Delete a patient.
    #[serde(rename = "patient.delete")]
    PatientDelete,
    /// List tenant roles.
    #[serde(rename = "security.role.list")]
    RoleList,
    /// Create a custom role.
    #[serde(rename = "security.role.create")]
    RoleCreate,
    /// Replace the grants of a role.
    #[serde(rename = "security.role.update_permissions")]
    RoleUpdatePermissions,
    /// Assign a role to a subject.
    #[serde(rename = "security.role.assign")]
    RoleAssign,
    /// Remove a role from a subject.
    #[serde(rename = "security.role.unassign")]
    RoleUnassign,
    /// List role assignments.
    #[serde(rename = "security.assignment.list")]
    AssignmentList,
    /// List tenant subjects.
    #[serde(rename = "security.subject.list")]
    SubjectList,
    /// Change a subject's lifecycle status.
    #[serde(rename = "security.subject.update_status")]
    SubjectUpdateStatus,
}

impl GuardedOperation {
    /// Returns the stable operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatientList => "patient.list",
            Self::PatientRead => "patient.read",
            Self::PatientCreate => "patient.create",
            Self::PatientUpdate => "patient.update",
            Self::PatientDelete => "patient.delete",
            Self::RoleList => "security.role.list",
            Self::RoleCreate => "security.role.create",
            Self::RoleUpdatePermissions => "security.role.update_permissions",
            Self::RoleAssign => "security.role.assign",
            Self::RoleUnassign => "security.role.unassign",
            Self::AssignmentList => "security.assignment.list",
            Self::SubjectList => "security.subject.list",
            Self::SubjectUpdateStatus => "security.subject.update_status",
        }
    }

    /// Returns the permission key this operation requires unless configured otherwise.
    #[must_use]
    pub fn default_permission(&self) -> &'static str {
        match self {
            Self::PatientList | Self::PatientRead => keys::PATIENT_VIEW,
            Self::PatientCreate => keys::PATIENT_ADD,
            Self::PatientUpdate => keys::PATIENT_EDIT,
            Self::PatientDelete => keys::PATIENT_DELETE,
            Self::RoleList
            | Self::RoleCreate
            | Self::RoleUpdatePermissions
            | Self::RoleAssign
            | Self::RoleUnassign
            | Self::AssignmentList => keys::ADMIN_PERMISSIONS,
            Self::SubjectList | Self::SubjectUpdateStatus => keys::ADMIN_USERS,
        }
    }

    /// Returns the default permission as a typed key.
    #[must_use]
    pub fn default_permission_key(&self) -> PermissionKey {
        PermissionKey::built_in(self.default_permission())
    }

    /// Returns all guarded operations.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[GuardedOperation] = &[
            GuardedOperation::PatientList,
            GuardedOperation::PatientRead,
            GuardedOperation::PatientCreate,
            GuardedOperation::PatientUpdate,
            GuardedOperation::PatientDelete,
            GuardedOperation::RoleList,
            GuardedOperation::RoleCreate,
            GuardedOperation::RoleUpdatePermissions,
            GuardedOperation::RoleAssign,
            GuardedOperation::RoleUnassign,
            GuardedOperation::AssignmentList,
            GuardedOperation::SubjectList,
            GuardedOperation::SubjectUpdateStatus,
        ];

        ALL
    }
}

impl Display for GuardedOperation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for GuardedOperation {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|operation| operation.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown guarded operation '{value}'")))
    }
}
