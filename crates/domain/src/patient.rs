use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use pedicare_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientId(Uuid);

impl PatientId {
    /// Creates a new random patient identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a patient identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PatientId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PatientId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid patient id '{value}': {error}")))
    }
}

/// Sex recorded on the patient chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientSex {
    /// Female.
    Female,
    /// Male.
    Male,
    /// Other.
    Other,
    /// Not recorded.
    Unknown,
}

impl PatientSex {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a storage or transport value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "other" => Ok(Self::Other),
            "unknown" => Ok(Self::Unknown),
            _ => Err(AppError::Validation(format!(
                "unknown patient sex '{value}'"
            ))),
        }
    }
}

/// Validated patient demographics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDetails {
    first_name: NonEmptyString,
    last_name: NonEmptyString,
    date_of_birth: NaiveDate,
    sex: PatientSex,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
}

impl PatientDetails {
    /// Validates demographics against the provided current date.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        sex: PatientSex,
        guardian_name: Option<String>,
        guardian_phone: Option<String>,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let first_name = NonEmptyString::new(first_name.into().trim())
            .map_err(|_| AppError::Validation("first name must not be empty".to_owned()))?;
        let last_name = NonEmptyString::new(last_name.into().trim())
            .map_err(|_| AppError::Validation("last name must not be empty".to_owned()))?;

        if date_of_birth > today {
            return Err(AppError::Validation(format!(
                "date of birth {date_of_birth} is in the future"
            )));
        }

        Ok(Self {
            first_name,
            last_name,
            date_of_birth,
            sex,
            guardian_name: normalize_optional(guardian_name),
            guardian_phone: normalize_optional(guardian_phone),
        })
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Returns the date of birth.
    #[must_use]
    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// Returns the recorded sex.
    #[must_use]
    pub fn sex(&self) -> PatientSex {
        self.sex
    }

    /// Returns the guardian name, if recorded.
    #[must_use]
    pub fn guardian_name(&self) -> Option<&str> {
        self.guardian_name.as_deref()
    }

    /// Returns the guardian phone, if recorded.
    #[must_use]
    pub fn guardian_phone(&self) -> Option<&str> {
        self.guardian_phone.as_deref()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Tenant-scoped patient chart header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    patient_id: PatientId,
    tenant_id: TenantId,
    details: PatientDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Patient {
    /// Creates a patient aggregate from persisted or freshly validated parts.
    #[must_use]
    pub fn new(
        patient_id: PatientId,
        tenant_id: TenantId,
        details: PatientDetails,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            patient_id,
            tenant_id,
            details,
            created_at,
            updated_at,
        }
    }

    /// Returns the patient identifier.
    #[must_use]
    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    /// Returns the owning clinic.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the demographics.
    #[must_use]
    pub fn details(&self) -> &PatientDetails {
        &self.details
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces demographics and bumps the update timestamp.
    pub fn revise(&mut self, details: PatientDetails, updated_at: DateTime<Utc>) {
        self.details = details;
        self.updated_at = updated_at;
    }
}
