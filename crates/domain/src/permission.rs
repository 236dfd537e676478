use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use pedicare_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Built-in clinic permission keys.
pub mod keys {
    /// View patient charts and demographics.
    pub const PATIENT_VIEW: &str = "patient.view";
    /// Register new patients.
    pub const PATIENT_ADD: &str = "patient.add";
    /// Edit patient demographics.
    pub const PATIENT_EDIT: &str = "patient.edit";
    /// Remove patient records.
    pub const PATIENT_DELETE: &str = "patient.delete";
    /// View clinical visits.
    pub const CLINICAL_VISIT_VIEW: &str = "clinical.visit.view";
    /// Open clinical visits.
    pub const CLINICAL_VISIT_CREATE: &str = "clinical.visit.create";
    /// Edit clinical visit notes.
    pub const CLINICAL_VISIT_EDIT: &str = "clinical.visit.edit";
    /// View vaccination history.
    pub const CLINICAL_VACCINE_VIEW: &str = "clinical.vaccine.view";
    /// Record administered vaccines.
    pub const CLINICAL_VACCINE_RECORD: &str = "clinical.vaccine.record";
    /// View developmental milestones.
    pub const CLINICAL_MILESTONE_VIEW: &str = "clinical.milestone.view";
    /// Record developmental milestones.
    pub const CLINICAL_MILESTONE_RECORD: &str = "clinical.milestone.record";
    /// View vital signs.
    pub const CLINICAL_VITALS_VIEW: &str = "clinical.vitals.view";
    /// Record vital signs.
    pub const CLINICAL_VITALS_RECORD: &str = "clinical.vitals.record";
    /// View lab requests.
    pub const LAB_REQUEST_VIEW: &str = "lab.request.view";
    /// Create lab requests.
    pub const LAB_REQUEST_CREATE: &str = "lab.request.create";
    /// Record lab results.
    pub const LAB_RESULT_RECORD: &str = "lab.result.record";
    /// View invoices and balances.
    pub const BILLING_VIEW: &str = "billing.view";
    /// Create invoices.
    pub const BILLING_CREATE: &str = "billing.create";
    /// Take payments.
    pub const BILLING_PAYMENT: &str = "billing.payment";
    /// View operational and clinical reports.
    pub const REPORT_VIEW: &str = "report.view";
    /// Manage clinic users.
    pub const ADMIN_USERS: &str = "admin.users";
    /// Manage roles and permission grants.
    pub const ADMIN_PERMISSIONS: &str = "admin.permissions";

    pub(crate) const BUILT_IN: &[(&str, &str)] = &[
        (PATIENT_VIEW, "View patient charts and demographics"),
        (PATIENT_ADD, "Register new patients"),
        (PATIENT_EDIT, "Edit patient demographics"),
        (PATIENT_DELETE, "Remove patient records"),
        (CLINICAL_VISIT_VIEW, "View clinical visits"),
        (CLINICAL_VISIT_CREATE, "Open clinical visits"),
        (CLINICAL_VISIT_EDIT, "Edit clinical visit notes"),
        (CLINICAL_VACCINE_VIEW, "View vaccination history"),
        (CLINICAL_VACCINE_RECORD, "Record administered vaccines"),
        (CLINICAL_MILESTONE_VIEW, "View developmental milestones"),
        (CLINICAL_MILESTONE_RECORD, "Record developmental milestones"),
        (CLINICAL_VITALS_VIEW, "View vital signs"),
        (CLINICAL_VITALS_RECORD, "Record vital signs"),
        (LAB_REQUEST_VIEW, "View lab requests"),
        (LAB_REQUEST_CREATE, "Create lab requests"),
        (LAB_RESULT_RECORD, "Record lab results"),
        (BILLING_VIEW, "View invoices and balances"),
        (BILLING_CREATE, "Create invoices"),
        (BILLING_PAYMENT, "Take payments"),
        (REPORT_VIEW, "View operational and clinical reports"),
        (ADMIN_USERS, "Manage clinic users"),
        (ADMIN_PERMISSIONS, "Manage roles and permission grants"),
    ];
}

/// Permission key of the form `<domain>.<action>`.
///
/// Keys compare as exact, case-sensitive strings. There is no wildcard and no
/// hierarchy: `admin.users` says nothing about `admin.permissions`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Parses and validates a permission key.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        validate_key(value.as_str())?;
        Ok(Self(value))
    }

    /// Returns the key as stored and transported.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the leading domain segment, e.g. `patient` for `patient.view`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    pub(crate) fn built_in(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

fn validate_key(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(
            "permission key must not be empty".to_owned(),
        ));
    }

    let mut segments = 0_usize;
    for segment in value.split('.') {
        segments += 1;
        if segment.is_empty() {
            return Err(AppError::Validation(format!(
                "permission key '{value}' contains an empty segment"
            )));
        }

        if let Some(invalid) = segment
            .chars()
            .find(|character| !(character.is_ascii_alphanumeric() || *character == '_'))
        {
            return Err(AppError::Validation(format!(
                "permission key '{value}' contains invalid character '{invalid}'"
            )));
        }
    }

    if segments < 2 {
        return Err(AppError::Validation(format!(
            "permission key '{value}' must have the form '<domain>.<action>'"
        )));
    }

    Ok(())
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

/// Catalog entry describing one permission key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// The permission key.
    pub key: PermissionKey,
    /// Human-readable capability description.
    #[serde(default)]
    pub description: String,
}

/// Stable catalog of permission keys shared by role grants and operation guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    definitions: BTreeMap<PermissionKey, PermissionDefinition>,
}

impl PermissionCatalog {
    /// Returns the built-in pediatric clinic catalog.
    #[must_use]
    pub fn clinic_default() -> Self {
        let definitions = keys::BUILT_IN
            .iter()
            .map(|(key, description)| {
                let key = PermissionKey::built_in(key);
                (
                    key.clone(),
                    PermissionDefinition {
                        key,
                        description: (*description).to_owned(),
                    },
                )
            })
            .collect();

        Self { definitions }
    }

    /// Builds a catalog from explicit definitions, rejecting duplicates.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = PermissionDefinition>,
    ) -> AppResult<Self> {
        let mut catalog = BTreeMap::new();
        for definition in definitions {
            if catalog.contains_key(&definition.key) {
                return Err(AppError::Validation(format!(
                    "permission '{}' is defined more than once",
                    definition.key
                )));
            }
            catalog.insert(definition.key.clone(), definition);
        }

        if catalog.is_empty() {
            return Err(AppError::Validation(
                "permission catalog must define at least one permission".to_owned(),
            ));
        }

        Ok(Self {
            definitions: catalog,
        })
    }

    /// Returns whether the key is part of the catalog.
    #[must_use]
    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.definitions.contains_key(key)
    }

    /// Fails with a validation error when the key is not in the catalog.
    pub fn require(&self, key: &PermissionKey) -> AppResult<()> {
        if self.contains(key) {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "permission '{key}' is not part of the permission catalog"
        )))
    }

    /// Parses a transport value and checks catalog membership.
    pub fn resolve(&self, value: &str) -> AppResult<PermissionKey> {
        let key = PermissionKey::parse(value)?;
        self.require(&key)?;
        Ok(key)
    }

    /// Iterates catalog definitions in key order.
    pub fn definitions(&self) -> impl Iterator<Item = &PermissionDefinition> {
        self.definitions.values()
    }

    /// Iterates catalog keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.definitions.keys()
    }

    /// Returns the number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::clinic_default()
    }
}
