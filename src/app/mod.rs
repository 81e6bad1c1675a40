pub mod bridge;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod state;
