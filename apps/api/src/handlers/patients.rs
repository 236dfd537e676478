use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pedicare_core::Subject;
use pedicare_domain::PatientId;

use crate::dto::{PatientRequest, PatientResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_patients_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
) -> ApiResult<Json<Vec<PatientResponse>>> {
    let patients = state
        .patient_service
        .list_patients(&subject)
        .await?
        .into_iter()
        .map(PatientResponse::from)
        .collect();

    Ok(Json(patients))
}

pub async fn create_patient_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(payload): Json<PatientRequest>,
) -> ApiResult<(StatusCode, Json<PatientResponse>)> {
    let patient = state
        .patient_service
        .create_patient(&subject, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(PatientResponse::from(patient))))
}

pub async fn get_patient_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<PatientResponse>> {
    let patient = state
        .patient_service
        .get_patient(&subject, PatientId::from_str(patient_id.as_str())?)
        .await?;

    Ok(Json(PatientResponse::from(patient)))
}

pub async fn update_patient_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(patient_id): Path<String>,
    Json(payload): Json<PatientRequest>,
) -> ApiResult<Json<PatientResponse>> {
    let patient = state
        .patient_service
        .update_patient(
            &subject,
            PatientId::from_str(patient_id.as_str())?,
            payload.into(),
        )
        .await?;

    Ok(Json(PatientResponse::from(patient)))
}

pub async fn delete_patient_handler(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Path(patient_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .patient_service
        .delete_patient(&subject, PatientId::from_str(patient_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
