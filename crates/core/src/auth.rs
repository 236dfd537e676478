use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, TenantId};

/// Lifecycle status of a clinic user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    /// May act within the tenant.
    Active,
    /// Deactivated by an administrator.
    Inactive,
    /// Temporarily blocked.
    Suspended,
}

impl SubjectStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    /// Returns whether the status allows any access at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl Display for SubjectStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SubjectStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::Validation(format!(
                "unknown subject status '{value}'"
            ))),
        }
    }
}

/// Authenticated user making a request, scoped to one tenant.
///
/// The value is produced after authentication and passed explicitly into
/// authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    subject_id: String,
    tenant_id: TenantId,
    status: SubjectStatus,
}

impl Subject {
    /// Creates a subject, rejecting blank identifiers.
    pub fn new(
        subject_id: impl Into<String>,
        tenant_id: TenantId,
        status: SubjectStatus,
    ) -> AppResult<Self> {
        let subject_id = subject_id.into();
        if subject_id.trim().is_empty() {
            return Err(AppError::Validation(
                "subject id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            subject_id,
            tenant_id,
            status,
        })
    }

    /// Returns the stable subject identifier.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        self.subject_id.as_str()
    }

    /// Returns the tenant the subject belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the subject lifecycle status.
    #[must_use]
    pub fn status(&self) -> SubjectStatus {
        self.status
    }
}
