//! In-memory Messaging store
//!
//! Implements every Messaging repository trait over process memory. Used by
//! tests and by the local binary when no database is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use deji_common::RepositoryError;
use uuid::Uuid;

use super::{early_status_cutoff, DeliveryLog, PreferenceRepository};
use crate::domain::entities::{
    DeliveryFilter, DeliveryRecord, DeliveryStatus, NotificationPreference,
};

#[derive(Debug, Clone)]
struct EarlyStatus {
    status: DeliveryStatus,
    error_detail: Option<String>,
    received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMessagingStore {
    records: Arc<Mutex<Vec<DeliveryRecord>>>,
    early_statuses: Arc<Mutex<HashMap<String, EarlyStatus>>>,
    preferences: Arc<Mutex<HashMap<Uuid, NotificationPreference>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryMessagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all records in insertion order
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Callbacks waiting for their delivery record
    pub fn early_status_count(&self) -> usize {
        self.early_statuses.lock().unwrap().len()
    }

    pub fn set_preference(&self, preference: NotificationPreference) {
        self.preferences
            .lock()
            .unwrap()
            .insert(preference.tenant_id, preference);
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable(
                "in-memory store switched off".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl DeliveryLog for InMemoryMessagingStore {
    async fn record(&self, record: &DeliveryRecord) -> Result<(), RepositoryError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        records.push(record.clone());

        let Some(provider_message_id) = record.provider_message_id.as_deref() else {
            return Ok(());
        };
        if let Some(early) = self.early_statuses.lock().unwrap().remove(provider_message_id) {
            advance(
                &mut records,
                provider_message_id,
                early.status,
                early.error_detail.as_deref(),
            );
        }
        Ok(())
    }

    async fn apply_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
        error_detail: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        self.check_available()?;
        if status.reachable_from().is_empty() {
            return Ok(0);
        }
        let mut records = self.records.lock().unwrap();

        if records
            .iter()
            .any(|r| r.provider_message_id.as_deref() == Some(provider_message_id))
        {
            return Ok(advance(&mut records, provider_message_id, status, error_detail));
        }

        let mut early = self.early_statuses.lock().unwrap();
        let cutoff = early_status_cutoff();
        early.retain(|_, e| e.received_at >= cutoff);

        let keep_existing = early
            .get(provider_message_id)
            .is_some_and(|e| !status.reachable_from().contains(&e.status));
        if !keep_existing {
            early.insert(
                provider_message_id.to_string(),
                EarlyStatus {
                    status,
                    error_detail: error_detail.map(str::to_string),
                    received_at: Utc::now(),
                },
            );
        }

        Ok(0)
    }

    async fn list_for_tenant(
        &self,
        tenant_id: Uuid,
        filter: &DeliveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DeliveryRecord>, RepositoryError> {
        self.check_available()?;
        let records = self.records.lock().unwrap();

        Ok(records
            .iter()
            .rev()
            .filter(|r| r.tenant_id == tenant_id && filter.matches(r))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

fn advance(
    records: &mut [DeliveryRecord],
    provider_message_id: &str,
    status: DeliveryStatus,
    error_detail: Option<&str>,
) -> u64 {
    let from = status.reachable_from();
    let mut changed = 0;

    for record in records.iter_mut() {
        if record.provider_message_id.as_deref() == Some(provider_message_id)
            && from.contains(&record.status)
        {
            record.status = status;
            if let Some(detail) = error_detail {
                record.error_detail = Some(detail.to_string());
            }
            changed += 1;
        }
    }

    changed
}

#[async_trait::async_trait]
impl PreferenceRepository for InMemoryMessagingStore {
    async fn find(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<NotificationPreference>, RepositoryError> {
        self.check_available()?;
        Ok(self.preferences.lock().unwrap().get(&tenant_id).cloned())
    }

    async fn upsert(
        &self,
        preference: &NotificationPreference,
    ) -> Result<NotificationPreference, RepositoryError> {
        self.check_available()?;
        self.set_preference(preference.clone());
        Ok(preference.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeliveryChannel;

    fn sent(tenant: Uuid, wamid: &str) -> DeliveryRecord {
        DeliveryRecord::sent(
            tenant,
            DeliveryChannel::Whatsapp,
            "chat_reply",
            "+2348000000001",
            "hello",
            Some(wamid.to_string()),
        )
    }

    #[tokio::test]
    async fn test_apply_status_moves_forward_only() {
        let store = InMemoryMessagingStore::new();
        let tenant = Uuid::new_v4();
        store.record(&sent(tenant, "wamid.1")).await.unwrap();

        assert_eq!(
            store
                .apply_status("wamid.1", DeliveryStatus::Read, None)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .apply_status("wamid.1", DeliveryStatus::Delivered, None)
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.records()[0].status, DeliveryStatus::Read);
    }

    #[tokio::test]
    async fn test_apply_status_unknown_id() {
        let store = InMemoryMessagingStore::new();
        let changed = store
            .apply_status("wamid.none", DeliveryStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(changed, 0);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_status_before_record_is_applied_on_record() {
        let store = InMemoryMessagingStore::new();
        store
            .apply_status("wamid.early", DeliveryStatus::Delivered, None)
            .await
            .unwrap();
        store
            .apply_status("wamid.early", DeliveryStatus::Read, None)
            .await
            .unwrap();
        store
            .apply_status("wamid.early", DeliveryStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(store.early_status_count(), 1);

        store.record(&sent(Uuid::new_v4(), "wamid.early")).await.unwrap();

        assert_eq!(store.records()[0].status, DeliveryStatus::Read);
        assert_eq!(store.early_status_count(), 0);
    }

    #[tokio::test]
    async fn test_early_failure_keeps_detail() {
        let store = InMemoryMessagingStore::new();
        store
            .apply_status("wamid.f", DeliveryStatus::Failed, Some("131026: undeliverable"))
            .await
            .unwrap();

        store.record(&sent(Uuid::new_v4(), "wamid.f")).await.unwrap();

        let record = &store.records()[0];
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.error_detail.as_deref(), Some("131026: undeliverable"));
    }

    #[tokio::test]
    async fn test_failed_callback_keeps_error_detail() {
        let store = InMemoryMessagingStore::new();
        store.record(&sent(Uuid::new_v4(), "wamid.2")).await.unwrap();

        store
            .apply_status("wamid.2", DeliveryStatus::Failed, Some("131047: expired"))
            .await
            .unwrap();

        let record = &store.records()[0];
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.error_detail.as_deref(), Some("131047: expired"));
    }

    #[tokio::test]
    async fn test_list_for_tenant_is_scoped_and_newest_first() {
        let store = InMemoryMessagingStore::new();
        let tenant = Uuid::new_v4();
        store.record(&sent(tenant, "wamid.a")).await.unwrap();
        store.record(&sent(Uuid::new_v4(), "wamid.b")).await.unwrap();
        store.record(&sent(tenant, "wamid.c")).await.unwrap();

        let listed = store
            .list_for_tenant(tenant, &DeliveryFilter::default(), 10, 0)
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].provider_message_id.as_deref(), Some("wamid.c"));

        let paged = store
            .list_for_tenant(tenant, &DeliveryFilter::default(), 1, 1)
            .await
            .unwrap();
        assert_eq!(paged[0].provider_message_id.as_deref(), Some("wamid.a"));
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = InMemoryMessagingStore::new();
        store.set_unavailable(true);
        assert!(store.record(&sent(Uuid::new_v4(), "x")).await.is_err());
        assert!(store.find(Uuid::new_v4()).await.is_err());
    }
}
