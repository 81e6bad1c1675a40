//! Back-end of the Mongo Workbench desktop client.
//!
//! The [`mongo::registry::ConnectionRegistry`] owns every live database
//! handle, keyed by connection id. Query and write operations in
//! [`mongo::query`] and [`mongo::crud`] look a handle up and delegate to the
//! driver. [`app::bridge::Bridge`] exposes them to the UI process; with the
//! `desktop` feature, `app::commands` wires the bridge into Tauri IPC.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod mongo;
pub mod utils;
