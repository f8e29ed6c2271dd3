//! Command handlers

pub mod config;
pub mod data;
pub mod draft;
pub mod fill;
pub mod queue;
pub mod status;
pub mod sync;
