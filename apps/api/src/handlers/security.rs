use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pedicare_application::CreateRoleInput;
use pedicare_core::{AppResult, Subject};
use pedicare_domain::PermissionKey;

use crate::dto::{
    CatalogEntryResponse, CatalogResponse, CreateRoleRequest, OperationPermissionResponse,
    RoleAssignmentRequest, RoleAssignmentResponse, RoleResponse, SubjectResponse,
    UpdateRolePermissionsRequest, UpdateSubjectStatusRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn catalog_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    let operation_permissions = state.authorization_service.operation_permissions();

    Json(CatalogResponse {
        permissions: operation_permissions
            .catalog()
            .definitions()
            .map(CatalogEntryResponse::from)
            .collect(),
        operations: operation_permissions
            .entries()
            .map(|(operation, permission)| OperationPermissionResponse {
                operation,
                permission: permission.to_string(),
            })
            .collect(),
    })
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles(&subject)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .security_admin_service
        .create_role(
            &subject,
            CreateRoleInput {
                name: payload.name,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_permissions_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(role_name): Path<String>,
    Json(payload): Json<UpdateRolePermissionsRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .security_admin_service
        .update_role_permissions(&subject, role_name.as_str(), permissions)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .security_admin_service
        .list_role_assignments(&subject)
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .assign_role(
            &subject,
            payload.subject_id.as_str(),
            payload.role_name.as_str(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .unassign_role(
            &subject,
            payload.subject_id.as_str(),
            payload.role_name.as_str(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subjects_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
) -> ApiResult<Json<Vec<SubjectResponse>>> {
    let subjects = state
        .security_admin_service
        .list_subjects(&subject)
        .await?
        .into_iter()
        .map(SubjectResponse::from)
        .collect();

    Ok(Json(subjects))
}

pub async fn update_subject_status_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(subject_id): Path<String>,
    Json(payload): Json<UpdateSubjectStatusRequest>,
) -> ApiResult<Json<SubjectResponse>> {
    let record = state
        .security_admin_service
        .update_subject_status(&subject, subject_id.as_str(), payload.status)
        .await?;

    Ok(Json(SubjectResponse::from(record)))
}

fn parse_permissions(values: &[String]) -> AppResult<Vec<PermissionKey>> {
    values
        .iter()
        .map(|value| PermissionKey::parse(value.as_str()))
        .collect()
}
