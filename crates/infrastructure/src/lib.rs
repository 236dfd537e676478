//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_patient_repository;
mod in_memory_security_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_error;
mod postgres_patient_repository;
mod postgres_security_admin_repository;
mod postgres_tenant_repository;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_patient_repository::InMemoryPatientRepository;
pub use in_memory_security_repository::InMemorySecurityRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_patient_repository::PostgresPatientRepository;
pub use postgres_security_admin_repository::PostgresSecurityAdminRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
