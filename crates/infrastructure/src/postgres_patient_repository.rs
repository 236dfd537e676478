use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use pedicare_application::PatientRepository;
use pedicare_core::{AppError, AppResult, TenantId};
use pedicare_domain::{Patient, PatientDetails, PatientId, PatientSex};

use crate::postgres_error::map_sqlx_error;

/// PostgreSQL-backed patient repository.
#[derive(Clone)]
pub struct PostgresPatientRepository {
    pool: PgPool,
}

impl PostgresPatientRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PatientRow {
    id: uuid::Uuid,
    tenant_id: uuid::Uuid,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    sex: String,
    guardian_name: Option<String>,
    guardian_phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = AppError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let sex = PatientSex::parse(row.sex.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored sex for patient '{}': {error}", row.id))
        })?;
        let details = PatientDetails::new(
            row.first_name,
            row.last_name,
            row.date_of_birth,
            sex,
            row.guardian_name,
            row.guardian_phone,
            Utc::now().date_naive(),
        )
        .map_err(|error| {
            AppError::Internal(format!("invalid stored patient '{}': {error}", row.id))
        })?;

        Ok(Patient::new(
            PatientId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            details,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[async_trait]
impl PatientRepository for PostgresPatientRepository {
    async fn list_patients(&self, tenant_id: TenantId) -> AppResult<Vec<Patient>> {
        let rows = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT
                id,
                tenant_id,
                first_name,
                last_name,
                date_of_birth,
                sex,
                guardian_name,
                guardian_phone,
                created_at,
                updated_at
            FROM patients
            WHERE tenant_id = $1
            ORDER BY last_name, first_name, id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("list patients", error))?;

        rows.into_iter().map(Patient::try_from).collect()
    }

    async fn find_patient(
        &self,
        tenant_id: TenantId,
        patient_id: PatientId,
    ) -> AppResult<Option<Patient>> {
        let row = sqlx::query_as::<_, PatientRow>(
            r#"
            SELECT
                id,
                tenant_id,
                first_name,
                last_name,
                date_of_birth,
                sex,
                guardian_name,
                guardian_phone,
                created_at,
                updated_at
            FROM patients
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(patient_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("load patient", error))?;

        row.map(Patient::try_from).transpose()
    }

    async fn insert_patient(&self, patient: Patient) -> AppResult<()> {
        let details = patient.details();
        sqlx::query(
            r#"
            INSERT INTO patients (
                id,
                tenant_id,
                first_name,
                last_name,
                date_of_birth,
                sex,
                guardian_name,
                guardian_phone,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(patient.patient_id().as_uuid())
        .bind(patient.tenant_id().as_uuid())
        .bind(details.first_name())
        .bind(details.last_name())
        .bind(details.date_of_birth())
        .bind(details.sex().as_str())
        .bind(details.guardian_name())
        .bind(details.guardian_phone())
        .bind(patient.created_at())
        .bind(patient.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("insert patient", error))?;

        Ok(())
    }

    async fn update_patient(&self, patient: Patient) -> AppResult<()> {
        let details = patient.details();
        let rows_affected = sqlx::query(
            r#"
            UPDATE patients
            SET first_name = $3,
                last_name = $4,
                date_of_birth = $5,
                sex = $6,
                guardian_name = $7,
                guardian_phone = $8,
                updated_at = $9
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(patient.tenant_id().as_uuid())
        .bind(patient.patient_id().as_uuid())
        .bind(details.first_name())
        .bind(details.last_name())
        .bind(details.date_of_birth())
        .bind(details.sex().as_str())
        .bind(details.guardian_name())
        .bind(details.guardian_phone())
        .bind(patient.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("update patient", error))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "patient '{}' was not found",
                patient.patient_id()
            )));
        }

        Ok(())
    }

    async fn delete_patient(&self, tenant_id: TenantId, patient_id: PatientId) -> AppResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM patients
            WHERE tenant_id = $1
                AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(patient_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error("delete patient", error))?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}
