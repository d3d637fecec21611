//! Repository traits and implementations for the Messaging domain

pub mod deliveries;
pub mod memory;
pub mod preferences;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use deji_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{
    DeliveryFilter, DeliveryRecord, DeliveryStatus, NotificationPreference,
};

pub use deliveries::PgDeliveryLog;
pub use memory::InMemoryMessagingStore;
pub use preferences::PgPreferenceRepository;

/// How long a status callback waits for its delivery record
pub const EARLY_STATUS_TTL_HOURS: i64 = 24;

pub(crate) fn early_status_cutoff() -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(EARLY_STATUS_TTL_HOURS)
}

/// Persistent log of outbound delivery attempts
#[async_trait::async_trait]
pub trait DeliveryLog: Send + Sync {
    /// Persist a new delivery record
    async fn record(&self, record: &DeliveryRecord) -> Result<(), RepositoryError>;

    /// Apply a provider status callback to the record carrying `provider_message_id`.
    ///
    /// Returns the number of records changed; records already past `status`
    /// are left alone. A callback for an id with no record yet is held for
    /// `EARLY_STATUS_TTL_HOURS` and applied when `record` writes that id, since the
    /// provider can report a status before the send call returns.
    async fn apply_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        error_detail: Option<&str>,
    ) -> Result<u64, RepositoryError>;

    /// Newest first
    async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
        filter: &DeliveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeliveryRecord>, RepositoryError>;
}

/// Tenant notification preferences
#[async_trait::async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn find(&self, tenant_id: Uuid)
        -> Result<Option<NotificationPreference>, RepositoryError>;

    async fn upsert(
        &self,
        preference: &NotificationPreference,
    ) -> Result<NotificationPreference, RepositoryError>;
}

/// Combined repository access for the Messaging domain
#[derive(Clone)]
pub struct MessagingRepositories {
    pub deliveries: Arc<dyn DeliveryLog>,
    pub preferences: Arc<dyn PreferenceRepository>,
}

impl MessagingRepositories {
    /// PostgreSQL-backed repositories
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            deliveries: Arc::new(PgDeliveryLog::new(pool.clone())),
            preferences: Arc::new(PgPreferenceRepository::new(pool)),
        }
    }

    /// Repositories sharing one in-memory store
    pub fn in_memory(store: InMemoryMessagingStore) -> Self {
        let store = Arc::new(store);
        Self {
            deliveries: store.clone(),
            preferences: store,
        }
    }
}
