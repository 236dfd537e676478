//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_ports;
mod authorization_service;
mod operation_permissions;
mod patient_ports;
mod patient_service;
mod security_admin_ports;
mod security_admin_service;
mod tenant_ports;

#[cfg(test)]
mod test_support;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_ports::{AssignedRole, AuthorizationRepository, SubjectDirectory};
pub use authorization_service::{AuthorizationService, EffectivePermissions};
pub use operation_permissions::{AccessPolicyDocument, OperationPermissionMap};
pub use patient_ports::{PatientInput, PatientRepository};
pub use patient_service::PatientService;
pub use security_admin_ports::{
    CreateRoleInput, RoleAssignment, RoleDefinition, SecurityAdminRepository, SubjectRecord,
};
pub use security_admin_service::SecurityAdminService;
pub use tenant_ports::TenantRepository;
