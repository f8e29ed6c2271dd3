//! Sync controller
//!
//! Ties the durable store, the transport and the connectivity flag together.
//! Owns the submission lifecycle: validate a draft, queue a point-in-time
//! snapshot of it, reset the draft, then drain the outbox whenever the host
//! is online.
//!
//! Delivery is at-least-once. An item is removed only after the endpoint
//! acknowledges it, so a crash between acknowledgement and delete resends it
//! on the next drain with the same idempotency key.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::autosave::{AutosaveLink, Autosaver};
use super::connectivity::Connectivity;
use super::status::{DrainReport, DrainStatus, StatusView};
use super::transport::Transport;
use super::validate::{validate, ValidationError};
use super::wire::WireForm;
use crate::config::{Config, DEFAULT_FORM_NAME};
use crate::export::{ExportDocument, ImportSummary};
use crate::models::{Draft, OutboxEntry, SubmissionId};
use crate::storage::{
    Collection, DurableStore, DurableStoreExt, Key, StorageError, StorageResult, DRAFT_KEY,
};

/// Why a submission was not queued
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The form needs fixing; nothing was written
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store could not be written
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A successfully queued submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub id: SubmissionId,
    pub idempotency_key: Uuid,
    /// Result of the drain triggered by the submit; `None` if it could not run
    pub drain: Option<DrainReport>,
}

/// Controller tunables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// `form-name` on the wire
    pub form_name: String,
    /// Records per collection exploded into indexed wire fields
    pub record_limit: usize,
    pub autosave_debounce: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            form_name: DEFAULT_FORM_NAME.to_string(),
            record_limit: 5,
            autosave_debounce: Duration::from_millis(400),
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            form_name: config.form_name.clone(),
            record_limit: config.wire_record_limit,
            autosave_debounce: config.autosave_debounce(),
        }
    }
}

/// Drives the draft and outbox lifecycle over a store and a transport
pub struct SyncController<S: ?Sized, T> {
    store: Arc<S>,
    transport: T,
    connectivity: Connectivity,
    options: ControllerOptions,
    autosaves: Mutex<Vec<AutosaveLink>>,
}

impl<S, T> SyncController<S, T>
where
    S: DurableStore + ?Sized + 'static,
    T: Transport,
{
    pub fn new(
        store: Arc<S>,
        transport: T,
        connectivity: Connectivity,
        options: ControllerOptions,
    ) -> Self {
        Self {
            store,
            transport,
            connectivity,
            options,
            autosaves: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    // ==================== Draft ====================

    /// Stored draft for hydrating the form (skeleton if none)
    pub async fn load_draft(&self) -> StorageResult<Draft> {
        self.store.load_draft().await
    }

    /// Write the draft immediately, surfacing failures
    pub async fn save_draft(&self, draft: &Draft) -> StorageResult<()> {
        self.store.save_draft(draft).await?;
        debug!("Draft saved");
        Ok(())
    }

    /// Reset the draft slot to the empty skeleton
    pub async fn clear_draft(&self) -> StorageResult<()> {
        self.store.clear_draft().await?;
        info!("Draft cleared");
        Ok(())
    }

    /// Start a debounced autosaver writing into this controller's store
    ///
    /// `submit` drops whatever this autosaver has pending, so a late write
    /// cannot bring back a draft that was already queued.
    pub fn autosaver(&self) -> Autosaver {
        let autosaver = Autosaver::spawn(self.store.clone(), self.options.autosave_debounce);
        match self.autosaves.lock() {
            Ok(mut links) => {
                links.retain(AutosaveLink::is_alive);
                links.push(autosaver.link());
            }
            Err(_) => warn!("Autosave registry poisoned; submit will not discard pending saves"),
        }
        autosaver
    }

    /// Drop pending state in every live autosaver and wait for in-flight writes
    async fn discard_autosaves(&self) {
        let links: Vec<AutosaveLink> = match self.autosaves.lock() {
            Ok(links) => links.clone(),
            Err(_) => Vec::new(),
        };
        for link in &links {
            link.discard().await;
        }
    }

    // ==================== Submission ====================

    /// Check a draft without touching the store
    pub fn validate(&self, draft: &Draft) -> Result<(), ValidationError> {
        validate(draft)
    }

    /// Queue a snapshot of `draft`, reset the draft, then drain
    ///
    /// Nothing is written when validation fails. If the draft cannot be
    /// reset the queued entry is withdrawn again, so an error always means
    /// nothing was queued. A failing drain does not undo the submission; it
    /// is logged and reported as `drain: None`.
    pub async fn submit(&self, draft: &Draft) -> Result<Submitted, SubmitError> {
        validate(draft)?;
        self.discard_autosaves().await;

        let entry = OutboxEntry::new(self.options.form_name.as_str(), draft);
        let id = self.store.enqueue(&entry).await?;
        if let Err(e) = self.store.clear_draft().await {
            if let Err(rollback) = self.store.remove_queued(id).await {
                warn!("Submission {} stays queued after failed draft reset: {}", id, rollback);
            }
            return Err(e.into());
        }
        info!("Queued submission {} for '{}'", id, entry.primary.company_name);

        let drain = match self.drain().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Drain after submit failed: {}", e);
                None
            }
        };

        Ok(Submitted {
            id,
            idempotency_key: entry.idempotency_key,
            drain,
        })
    }

    /// Try to deliver every queued submission, oldest first
    ///
    /// Offline hosts skip the network entirely. Each item gets one attempt
    /// per cycle; failures stay queued for the next cycle.
    pub async fn drain(&self) -> StorageResult<DrainReport> {
        if !self.connectivity.is_online() {
            let remaining = self.store.queued_count().await?;
            info!("Offline, {} submission(s) remain queued", remaining);
            return Ok(DrainReport::offline(remaining));
        }

        let items = self.store.queued().await?;
        let mut attempted = 0;
        let mut delivered = 0;
        let mut failed = 0;

        for item in &items {
            let form = WireForm::encode(item, self.options.record_limit)?;
            attempted += 1;

            match self.transport.deliver(&form).await {
                Ok(()) => {
                    self.store.remove_queued(item.id).await?;
                    delivered += 1;
                    debug!("Delivered submission {}", item.id);
                }
                Err(e) => {
                    failed += 1;
                    warn!("Submission {} not delivered: {}", item.id, e);
                }
            }
        }

        let remaining = self.store.queued_count().await?;
        let status = if remaining == 0 {
            DrainStatus::AllSynced
        } else {
            DrainStatus::SomeQueued
        };
        info!(
            "Drain complete: {} delivered, {} failed, {} remaining",
            delivered, failed, remaining
        );

        Ok(DrainReport {
            status,
            attempted,
            delivered,
            failed,
            remaining,
        })
    }

    // ==================== Data ====================

    /// Read-only snapshot of the draft slot and the outbox
    pub async fn export(&self) -> StorageResult<ExportDocument> {
        let draft = match self
            .store
            .get(Collection::Draft, &Key::from(DRAFT_KEY))
            .await?
        {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };
        let outbox = self.store.queued().await?;
        Ok(ExportDocument { draft, outbox })
    }

    /// Load an export document into this store
    ///
    /// A present draft replaces the current one. Outbox entries are appended
    /// under new ids with their contents, timestamps and idempotency keys
    /// unchanged; entries whose key is already queued are skipped.
    pub async fn import(&self, doc: &ExportDocument) -> StorageResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        if let Some(draft) = &doc.draft {
            self.store.save_draft(draft).await?;
            summary.draft_restored = true;
        }

        let mut known: HashSet<Uuid> = self
            .store
            .queued()
            .await?
            .into_iter()
            .map(|item| item.entry.idempotency_key)
            .collect();

        for item in &doc.outbox {
            if !known.insert(item.entry.idempotency_key) {
                summary.skipped += 1;
                continue;
            }
            let id = self.store.enqueue(&item.entry).await?;
            debug!("Imported submission {} as {}", item.id, id);
            summary.queued += 1;
        }

        info!(
            "Import complete: {} queued, {} skipped",
            summary.queued, summary.skipped
        );
        Ok(summary)
    }

    /// Current badge state
    pub async fn status(&self) -> StorageResult<StatusView> {
        let queued = self.store.queued_count().await?;
        Ok(StatusView::project(self.connectivity.is_online(), queued))
    }
}

impl<S, T> SyncController<S, T>
where
    S: DurableStore + ?Sized + 'static,
    T: Transport + 'static,
{
    /// Drain once now, then again on every offline to online transition
    ///
    /// Storage failures end the loop; delivery failures never do.
    pub fn spawn_watch(self: Arc<Self>) -> JoinHandle<StorageResult<()>> {
        tokio::spawn(async move {
            let mut rx = self.connectivity.subscribe();
            let mut was_online = *rx.borrow_and_update();

            self.drain().await?;

            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if online && !was_online {
                    info!("Back online, draining outbox");
                    self.drain().await?;
                }
                was_online = online;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubRecord;
    use crate::storage::{MemoryStore, SqliteStore};
    use crate::sync::transport::DeliveryError;
    use crate::sync::validate::ValidationReason;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Records every body it is handed and answers from a script
    ///
    /// Once the script runs out every delivery succeeds.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<(), DeliveryError>>>,
        bodies: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn with_script(outcomes: Vec<Result<(), DeliveryError>>) -> Self {
            Self {
                script: Mutex::new(outcomes.into()),
                bodies: Mutex::new(Vec::new()),
            }
        }

        fn bodies(&self) -> Vec<String> {
            self.bodies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn deliver(&self, form: &WireForm) -> Result<(), DeliveryError> {
            self.bodies.lock().unwrap().push(form.body());
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    type TestController = SyncController<MemoryStore, Arc<ScriptedTransport>>;

    fn controller(
        online: bool,
        outcomes: Vec<Result<(), DeliveryError>>,
    ) -> (TestController, Arc<MemoryStore>, Arc<ScriptedTransport>) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(ScriptedTransport::with_script(outcomes));
        let controller = SyncController::new(
            store.clone(),
            transport.clone(),
            Connectivity::new(online),
            ControllerOptions::default(),
        );
        (controller, store, transport)
    }

    fn rejected() -> Result<(), DeliveryError> {
        Err(DeliveryError::Rejected { status: 500 })
    }

    fn valid_draft(company: &str) -> Draft {
        let mut draft = Draft::skeleton();
        draft.set("company_name", company);
        draft.set("primary_contact", "Jane Doe");
        draft.set("primary_email", "jane@acme.com");
        draft.set("primary_phone", "555-0100");
        let mut location = SubRecord::new();
        location.insert("name".into(), "HQ".into());
        draft.push_record("locations", location);
        draft
    }

    #[tokio::test]
    async fn test_submit_valid_draft() {
        let (controller, store, _) = controller(false, vec![]);
        let draft = valid_draft("Acme");
        store.save_draft(&draft).await.unwrap();
        let before: HashSet<_> = store.queued().await.unwrap().iter().map(|i| i.id).collect();

        let submitted = controller.submit(&draft).await.unwrap();

        assert!(store.load_draft().await.unwrap().is_empty());
        let queued = store.queued().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].entry.data, draft);
        assert_eq!(queued[0].entry.idempotency_key, submitted.idempotency_key);
        assert_eq!(queued[0].id, submitted.id);
        assert!(!before.contains(&submitted.id));
        assert_eq!(submitted.drain.unwrap().status, DrainStatus::Offline);
    }

    #[tokio::test]
    async fn test_submit_invalid_draft_changes_nothing() {
        let (controller, store, transport) = controller(true, vec![]);
        let mut draft = valid_draft("Acme");
        draft.unset("primary_contact");
        draft.unset("primary_phone");
        store.save_draft(&draft).await.unwrap();

        let err = controller.submit(&draft).await.unwrap_err();

        match err {
            SubmitError::Validation(e) => {
                assert_eq!(e.field, "primary_contact");
                assert_eq!(e.reason, ValidationReason::MissingField);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.load_draft().await.unwrap(), draft);
        assert_eq!(store.queued_count().await.unwrap(), 0);
        assert!(transport.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_offline_submit_then_reconnect() {
        // Submit while offline, come back online, drain
        let (controller, store, transport) = controller(false, vec![]);

        let submitted = controller.submit(&valid_draft("Acme")).await.unwrap();
        let report = submitted.drain.unwrap();
        assert_eq!(report.status, DrainStatus::Offline);
        assert_eq!(report.remaining, 1);
        assert!(transport.bodies().is_empty());

        let status = controller.status().await.unwrap();
        assert_eq!(status.queue_badge(), "Queued: 1");
        assert_eq!(status.sync.to_string(), "Offline – queued");

        controller.connectivity().set_online(true);
        let report = controller.drain().await.unwrap();

        assert_eq!(report.status, DrainStatus::AllSynced);
        assert_eq!(report.delivered, 1);
        assert_eq!(transport.bodies().len(), 1);
        assert_eq!(store.queued_count().await.unwrap(), 0);
        assert_eq!(controller.status().await.unwrap().queue_badge(), "Queued: 0");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_failed_items() {
        // Three queued; the middle one is rejected
        let (controller, store, transport) = controller(false, vec![Ok(()), rejected(), Ok(())]);
        for company in ["First", "Second", "Third"] {
            controller.submit(&valid_draft(company)).await.unwrap();
        }

        controller.connectivity().set_online(true);
        let report = controller.drain().await.unwrap();

        assert_eq!(report.status, DrainStatus::SomeQueued);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.remaining, 1);

        let left = store.queued().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].entry.primary.company_name, "Second");
        assert_eq!(transport.bodies().len(), 3);
        assert_eq!(controller.status().await.unwrap().queue_badge(), "Queued: 1");
    }

    #[tokio::test]
    async fn test_failed_item_is_retried_byte_identical() {
        let (controller, _, transport) = controller(false, vec![rejected()]);
        controller.submit(&valid_draft("Acme")).await.unwrap();
        controller.connectivity().set_online(true);

        let first = controller.drain().await.unwrap();
        assert_eq!(first.remaining, 1);
        let second = controller.drain().await.unwrap();
        assert!(second.is_synced());

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn test_second_drain_sends_nothing() {
        let (controller, _, transport) = controller(true, vec![]);
        controller.submit(&valid_draft("Acme")).await.unwrap();
        assert_eq!(transport.bodies().len(), 1);

        let report = controller.drain().await.unwrap();
        assert_eq!(report.attempted, 0);
        assert!(report.is_synced());
        assert_eq!(transport.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_drain_is_oldest_first() {
        let (controller, _, transport) = controller(false, vec![]);
        controller.submit(&valid_draft("Older")).await.unwrap();
        controller.submit(&valid_draft("Newer")).await.unwrap();

        controller.connectivity().set_online(true);
        controller.drain().await.unwrap();

        let bodies = transport.bodies();
        assert!(bodies[0].contains("company_name=Older"));
        assert!(bodies[1].contains("company_name=Newer"));
    }

    #[tokio::test]
    async fn test_offline_drain_skips_network() {
        let (controller, store, transport) = controller(false, vec![]);
        store
            .enqueue(&OutboxEntry::new("caprock-onboarding", &valid_draft("Acme")))
            .await
            .unwrap();

        let report = controller.drain().await.unwrap();
        assert_eq!(report, DrainReport::offline(1));
        assert!(transport.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_storage_fault_surfaces_on_submit() {
        let (controller, store, _) = controller(true, vec![]);
        store.set_fail_writes(true);

        let err = controller.submit(&valid_draft("Acme")).await.unwrap_err();
        assert!(matches!(err, SubmitError::Storage(_)));

        store.set_fail_writes(false);
        assert_eq!(store.queued_count().await.unwrap(), 0);
    }

    /// Store whose draft slot rejects writes while the outbox keeps working
    struct DraftSlotFails(MemoryStore);

    #[async_trait]
    impl DurableStore for DraftSlotFails {
        async fn get(&self, c: Collection, key: &Key) -> StorageResult<Option<Value>> {
            self.0.get(c, key).await
        }
        async fn put(&self, _: Collection, _: &Key, _: Value) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "draft slot unavailable",
            )))
        }
        async fn add(&self, c: Collection, value: Value) -> StorageResult<SubmissionId> {
            self.0.add(c, value).await
        }
        async fn delete(&self, c: Collection, key: &Key) -> StorageResult<()> {
            self.0.delete(c, key).await
        }
        async fn list(&self, c: Collection) -> StorageResult<Vec<(Key, Value)>> {
            self.0.list(c).await
        }
    }

    #[tokio::test]
    async fn test_failed_draft_reset_withdraws_submission() {
        let store = Arc::new(DraftSlotFails(MemoryStore::new()));
        let controller = SyncController::new(
            store.clone(),
            Arc::new(ScriptedTransport::default()),
            Connectivity::new(false),
            ControllerOptions::default(),
        );
        let draft = valid_draft("Acme");

        let err = controller.submit(&draft).await.unwrap_err();
        assert!(matches!(err, SubmitError::Storage(_)));
        assert_eq!(store.queued_count().await.unwrap(), 0);

        // Retrying does not pile up duplicates
        assert!(controller.submit(&draft).await.is_err());
        assert_eq!(store.queued_count().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_discards_pending_autosave() {
        let (controller, store, _) = controller(false, vec![]);
        let autosaver = controller.autosaver();
        let draft = valid_draft("Acme");

        autosaver.touch(draft.clone());
        controller.submit(&draft).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(store.load_draft().await.unwrap().is_empty());
        assert_eq!(store.queued_count().await.unwrap(), 1);

        // The autosaver keeps working for the next draft
        autosaver.touch(valid_draft("Next"));
        autosaver.shutdown().await;
        assert_eq!(store.load_draft().await.unwrap().text("company_name"), "Next");
    }

    #[tokio::test]
    async fn test_undecodable_entry_does_not_block_drain() {
        let (controller, store, transport) = controller(false, vec![]);
        store
            .add(Collection::Outbox, serde_json::json!({"type": "x"}))
            .await
            .unwrap();
        controller.submit(&valid_draft("Acme")).await.unwrap();

        controller.connectivity().set_online(true);
        let report = controller.drain().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.remaining, 1);
        assert_eq!(report.status, DrainStatus::SomeQueued);
        assert_eq!(transport.bodies().len(), 1);
    }

    #[tokio::test]
    async fn test_save_draft_surfaces_faults() {
        let (controller, store, _) = controller(true, vec![]);
        store.set_fail_writes(true);
        assert!(controller.save_draft(&valid_draft("Acme")).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_drains_deliver_everything() {
        let (controller, store, transport) = controller(false, vec![]);
        for company in ["A", "B", "C"] {
            controller.submit(&valid_draft(company)).await.unwrap();
        }
        controller.connectivity().set_online(true);

        let (first, second) = tokio::join!(controller.drain(), controller.drain());
        first.unwrap();
        second.unwrap();

        assert_eq!(store.queued_count().await.unwrap(), 0);
        // Duplicates are allowed, losses are not
        assert!(transport.bodies().len() >= 3);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let (controller, _, _) = controller(false, vec![]);
        controller.submit(&valid_draft("Queued")).await.unwrap();
        controller.save_draft(&valid_draft("In progress")).await.unwrap();
        let exported = controller.export().await.unwrap();
        assert_eq!(exported.outbox.len(), 1);

        let json = exported.to_pretty_json().unwrap();
        let (fresh, _, _) = self::controller(false, vec![]);
        let summary = fresh
            .import(&ExportDocument::from_json(&json).unwrap())
            .await
            .unwrap();
        assert!(summary.draft_restored);
        assert_eq!(summary.queued, 1);

        let reexported = fresh.export().await.unwrap();
        assert_eq!(reexported.draft, exported.draft);
        let entries = |doc: &ExportDocument| -> Vec<OutboxEntry> {
            doc.outbox.iter().map(|item| item.entry.clone()).collect()
        };
        assert_eq!(entries(&reexported), entries(&exported));
    }

    #[tokio::test]
    async fn test_import_skips_already_queued() {
        let (controller, _, _) = controller(false, vec![]);
        controller.submit(&valid_draft("Acme")).await.unwrap();
        let exported = controller.export().await.unwrap();

        let summary = controller.import(&exported).await.unwrap();
        assert_eq!(summary.queued, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(controller.status().await.unwrap().queued, 1);
    }

    #[tokio::test]
    async fn test_export_of_untouched_store() {
        let (controller, _, _) = controller(false, vec![]);
        let exported = controller.export().await.unwrap();
        assert!(exported.draft.is_none());
        assert!(exported.outbox.is_empty());
    }

    #[tokio::test]
    async fn test_submission_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.db");

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            let controller = SyncController::new(
                store,
                ScriptedTransport::default(),
                Connectivity::new(false),
                ControllerOptions::default(),
            );
            controller.submit(&valid_draft("Acme")).await.unwrap();
        }

        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let transport = Arc::new(ScriptedTransport::default());
        let controller = SyncController::new(
            store,
            transport.clone(),
            Connectivity::new(true),
            ControllerOptions::default(),
        );
        let report = controller.drain().await.unwrap();
        assert!(report.is_synced());
        assert_eq!(report.delivered, 1);
        assert!(transport.bodies()[0].contains("company_name=Acme"));
    }

    #[tokio::test]
    async fn test_watch_drains_on_reconnect() {
        let (controller, store, transport) = controller(false, vec![]);
        controller.submit(&valid_draft("Acme")).await.unwrap();

        let controller = Arc::new(controller);
        let handle = controller.clone().spawn_watch();

        // Startup drain is offline and sends nothing
        tokio::task::yield_now().await;
        assert!(transport.bodies().is_empty());

        controller.connectivity().set_online(true);
        for _ in 0..100 {
            if store.queued_count().await.unwrap() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.queued_count().await.unwrap(), 0);
        assert_eq!(transport.bodies().len(), 1);

        handle.abort();
    }
}
