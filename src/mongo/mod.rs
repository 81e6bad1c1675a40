pub mod client;
pub mod crud;
pub mod cursor_engine;
pub mod descriptor;
pub mod document_id;
pub mod index;
#[cfg(test)]
pub(crate) mod memory;
pub mod query;
pub mod registry;
pub mod search;
pub mod uri;
