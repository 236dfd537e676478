use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Why an authorization check did not allow the subject through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The subject is not active.
    SubjectInactive,
    /// None of the subject's in-tenant roles grants the permission.
    NoMatchingRole,
    /// Every role assignment points at a role outside the subject's tenant.
    TenantMismatch,
}

impl DenialReason {
    /// Returns a stable transport value for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubjectInactive => "subject_inactive",
            Self::NoMatchingRole => "no_matching_role",
            Self::TenantMismatch => "tenant_mismatch",
        }
    }
}

impl Display for DenialReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// The subject holds the permission.
    Allowed,
    /// The subject does not hold the permission.
    Denied(DenialReason),
}

impl Decision {
    /// Returns whether the decision allows the operation.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::Allowed => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}
