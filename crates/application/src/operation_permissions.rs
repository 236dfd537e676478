use std::collections::BTreeMap;
use std::str::FromStr;

use pedicare_core::{AppError, AppResult};
use pedicare_domain::{GuardedOperation, PermissionCatalog, PermissionDefinition, PermissionKey};
use serde::Deserialize;

/// Access policy document loaded from configuration.
///
/// ```json
/// {
///   "permissions": [{ "key": "patient.view", "description": "View patients" }],
///   "operations": { "patient.list": "patient.view" }
/// }
/// ```
///
/// A missing `permissions` list selects the built-in clinic catalog. Operations
/// that are not listed keep their default key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessPolicyDocument {
    /// Permission catalog entries.
    #[serde(default)]
    pub permissions: Option<Vec<PermissionDefinition>>,
    /// Operation name to permission key overrides.
    #[serde(default)]
    pub operations: BTreeMap<String, String>,
}

/// Declarative map from guarded operations to required permission keys.
///
/// Construction validates every key against the catalog, so a typo in the
/// map fails at startup instead of silently denying requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPermissionMap {
    catalog: PermissionCatalog,
    required: BTreeMap<GuardedOperation, PermissionKey>,
}

impl OperationPermissionMap {
    /// Builds a map from defaults plus overrides, validated against the catalog.
    pub fn new(
        catalog: PermissionCatalog,
        overrides: impl IntoIterator<Item = (GuardedOperation, PermissionKey)>,
    ) -> AppResult<Self> {
        let mut required: BTreeMap<GuardedOperation, PermissionKey> = GuardedOperation::all()
            .iter()
            .map(|operation| (*operation, operation.default_permission_key()))
            .collect();
        required.extend(overrides);

        let unknown: Vec<String> = required
            .iter()
            .filter(|(_, key)| !catalog.contains(key))
            .map(|(operation, key)| format!("{operation} -> {key}"))
            .collect();

        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "operations reference permissions missing from the catalog: {}",
                unknown.join(", ")
            )));
        }

        Ok(Self { catalog, required })
    }

    /// Returns the built-in clinic catalog with default operation keys.
    #[must_use]
    pub fn clinic_default() -> Self {
        let catalog = PermissionCatalog::clinic_default();
        let required = GuardedOperation::all()
            .iter()
            .map(|operation| (*operation, operation.default_permission_key()))
            .collect();

        Self { catalog, required }
    }

    /// Parses and validates a JSON access policy document.
    pub fn from_policy_json(raw: &str) -> AppResult<Self> {
        let document: AccessPolicyDocument = serde_json::from_str(raw)
            .map_err(|error| AppError::Validation(format!("invalid access policy: {error}")))?;

        Self::from_document(document)
    }

    /// Validates a parsed access policy document.
    pub fn from_document(document: AccessPolicyDocument) -> AppResult<Self> {
        let catalog = match document.permissions {
            Some(definitions) => PermissionCatalog::from_definitions(definitions)?,
            None => PermissionCatalog::clinic_default(),
        };

        let overrides = document
            .operations
            .iter()
            .map(|(operation, key)| {
                Ok((
                    GuardedOperation::from_str(operation.as_str())?,
                    PermissionKey::parse(key.as_str())?,
                ))
            })
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(catalog, overrides)
    }

    /// Returns the permission key an operation requires.
    pub fn required_permission(&self, operation: GuardedOperation) -> AppResult<&PermissionKey> {
        self.required.get(&operation).ok_or_else(|| {
            AppError::Internal(format!(
                "operation '{operation}' has no permission mapping"
            ))
        })
    }

    /// Returns the catalog the map was validated against.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Iterates operation mappings in operation order.
    pub fn entries(&self) -> impl Iterator<Item = (GuardedOperation, &PermissionKey)> {
        self.required.iter().map(|(operation, key)| (*operation, key))
    }
}

impl Default for OperationPermissionMap {
    fn default() -> Self {
        Self::clinic_default()
    }
}
