use async_trait::async_trait;
use tokio::sync::RwLock;

use pedicare_application::{AuditEvent, AuditRepository};
use pedicare_core::{AppResult, TenantId};

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events of one tenant in append order.
    pub async fn events_for_tenant(&self, tenant_id: TenantId) -> Vec<AuditEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|event| event.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}
