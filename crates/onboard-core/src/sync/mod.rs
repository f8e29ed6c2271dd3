//! Sync controller and its moving parts
//!
//! Provides the submission lifecycle on top of a `DurableStore`:
//!
//! - `validate`: required fields and email shape
//! - `autosave`: debounced draft writes
//! - `wire`: form-encoded request bodies
//! - `transport`: delivery over HTTP
//! - `connectivity`: the online/offline flag and its probe
//! - `controller`: submit, drain, export/import and status
//!
//! ## Usage
//!
//! ```ignore
//! let controller = SyncController::new(store, transport, connectivity, options);
//! let submitted = controller.submit(&draft).await?;
//! let report = controller.drain().await?;
//! ```

mod autosave;
mod connectivity;
mod controller;
mod status;
mod transport;
mod validate;
mod wire;

pub use autosave::Autosaver;
pub use connectivity::{probe, spawn_probe, Connectivity};
pub use controller::{ControllerOptions, SubmitError, Submitted, SyncController};
pub use status::{DrainReport, DrainStatus, StatusView};
pub use transport::{DeliveryError, HttpTransport, Transport};
pub use validate::{
    is_email, validate, ValidationError, ValidationReason, EMAIL_FIELDS, REQUIRED_FIELDS,
};
pub use wire::{summary_lines, WireForm, CONTENT_TYPE};
