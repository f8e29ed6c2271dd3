//! Onboard Core Library
//!
//! This crate provides the core functionality for onboard, a local-first
//! client for the Caprock onboarding form. A draft is edited offline, queued
//! as an immutable submission, and delivered to the remote form endpoint
//! whenever connectivity allows.
//!
//! # Architecture
//!
//! - **Durable store**: source of truth for the draft and the outbox
//! - **Sync controller**: validation, queueing and at-least-once delivery
//!
//! Nothing leaves the outbox until the endpoint has acknowledged it.
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(SqliteStore::open_with_config(&config)?);
//! let transport = HttpTransport::new(&config.endpoint_url, config.request_timeout())?;
//! let controller = SyncController::new(store, transport, Connectivity::new(true),
//!     ControllerOptions::from_config(&config));
//!
//! let mut draft = controller.load_draft().await?;
//! draft.set("company_name", "Acme");
//! controller.submit(&draft).await?;
//! ```
//!
//! # Modules
//!
//! - `models`: Draft and queued submission data structures
//! - `storage`: Durable store trait with SQLite and in-memory backends
//! - `sync`: Sync controller, wire format and transport
//! - `export`: Export/import artifact
//! - `config`: Application configuration

pub mod config;
pub mod export;
pub mod models;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use export::{ExportDocument, ImportSummary};
pub use models::{Draft, FieldValue, OutboxEntry, QueuedSubmission, SubRecord, SubmissionId};
pub use storage::{DurableStore, DurableStoreExt, MemoryStore, SqliteStore, StorageError};
pub use sync::{
    Connectivity, ControllerOptions, DrainReport, DrainStatus, HttpTransport, StatusView,
    SubmitError, Submitted, SyncController, Transport, ValidationError,
};
