//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod decision;
mod operation;
mod patient;
mod permission;
mod security;

pub use decision::{Decision, DenialReason};
pub use operation::GuardedOperation;
pub use patient::{Patient, PatientDetails, PatientId, PatientSex};
pub use permission::{PermissionCatalog, PermissionDefinition, PermissionKey, keys};
pub use security::{AuditAction, SystemRole};
