//! plfix library interface
//!
//! Playlist repair pipeline: detect entries whose content became
//! unavailable, find a replacement, and swap it in at the same position.
//! Exposed as a library so the pipeline can be driven by tests with
//! in-memory catalogs.

pub mod catalog;
pub mod config;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::config::Settings;
pub use crate::workflow::{RepairEvent, RepairObserver, RepairRun, RunError};
