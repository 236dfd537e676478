use std::time::Duration;

use pedicare_application::{AuthorizationRepository, TenantRepository};
use pedicare_core::{AppError, TenantId};
use pedicare_domain::{PermissionCatalog, SystemRole};
use sqlx::postgres::PgPoolOptions;

use super::PostgresAuthorizationRepository;
use crate::PostgresTenantRepository;
use crate::postgres_test_support::test_pool;

#[tokio::test]
async fn unreachable_database_is_reported_as_unavailable() {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://pedicare@127.0.0.1:1/pedicare");
    let Ok(pool) = pool else {
        panic!("lazy pool should accept a well-formed url");
    };

    let repository = PostgresAuthorizationRepository::new(pool);
    let roles = repository
        .list_assigned_roles(TenantId::new(), "dr-ada")
        .await;

    assert!(matches!(roles, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn assigned_roles_carry_their_owning_tenant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let catalog = PermissionCatalog::clinic_default();
    let tenants = PostgresTenantRepository::new(pool.clone());
    let home = TenantId::new();
    let other = TenantId::new();
    assert!(tenants.ensure_membership(home, "founder", "Founder", &catalog).await.is_ok());
    assert!(tenants.ensure_membership(home, "drifter", "Drifter", &catalog).await.is_ok());
    assert!(tenants.ensure_membership(other, "other", "Other", &catalog).await.is_ok());

    let foreign_owner = sqlx::query_scalar::<_, uuid::Uuid>(
        "SELECT id FROM rbac_roles WHERE tenant_id = $1 AND name = $2",
    )
    .bind(other.as_uuid())
    .bind(SystemRole::Owner.name())
    .fetch_one(&pool)
    .await;
    let Ok(foreign_owner) = foreign_owner else {
        panic!("other clinic owner role should be seeded");
    };

    let inserted = sqlx::query(
        "INSERT INTO rbac_subject_roles (tenant_id, subject, role_id) VALUES ($1, $2, $3)",
    )
    .bind(home.as_uuid())
    .bind("drifter")
    .bind(foreign_owner)
    .execute(&pool)
    .await;
    assert!(inserted.is_ok());

    let repository = PostgresAuthorizationRepository::new(pool);
    let roles = repository.list_assigned_roles(home, "drifter").await;
    let Ok(roles) = roles else {
        panic!("assigned roles should load");
    };
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role_tenant_id, other);

    let permissions = repository
        .list_permissions_for_roles(home, &[roles[0].role_id.clone()])
        .await;
    assert!(matches!(permissions, Ok(ref keys) if keys.is_empty()));
}

#[tokio::test]
async fn founder_holds_every_catalog_permission() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let catalog = PermissionCatalog::clinic_default();
    let tenant_id = TenantId::new();
    let tenants = PostgresTenantRepository::new(pool.clone());
    assert!(
        tenants
            .ensure_membership(tenant_id, "founder", "Founder", &catalog)
            .await
            .is_ok()
    );

    let repository = PostgresAuthorizationRepository::new(pool);
    let Ok(roles) = repository.list_assigned_roles(tenant_id, "founder").await else {
        panic!("assigned roles should load");
    };
    let role_ids: Vec<String> = roles.into_iter().map(|role| role.role_id).collect();

    let permissions = repository
        .list_permissions_for_roles(tenant_id, &role_ids)
        .await;
    assert!(matches!(permissions, Ok(ref keys) if keys.len() == catalog.len()));
}
