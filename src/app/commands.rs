use serde_json::Value;
use tauri::State;

use crate::app::bridge::ConnectOutcome;
use crate::app::state::AppState;
use crate::mongo::descriptor::ConnectionDescriptor;
use crate::mongo::document_id::DocumentId;
use crate::mongo::query::{DocumentPage, QueryOptions};
use crate::mongo::registry::ConnectionInfo;

#[tauri::command]
pub fn app_version(app: tauri::AppHandle) -> String {
    app.package_info().version.to_string()
}

#[tauri::command]
pub fn platform() -> &'static str {
    std::env::consts::OS
}

#[tauri::command]
pub async fn mongodb_connect(
    connection: ConnectionDescriptor,
    state: State<'_, AppState>,
) -> Result<ConnectOutcome, String> {
    Ok(state.bridge.connect(&connection).await)
}

#[tauri::command]
pub async fn mongodb_disconnect(
    connection_id: String,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state.bridge.disconnect(&connection_id).await;
    Ok(())
}

#[tauri::command]
pub async fn mongodb_test_connection(
    connection: ConnectionDescriptor,
    state: State<'_, AppState>,
) -> Result<ConnectOutcome, String> {
    Ok(state.bridge.test_connection(&connection).await)
}

#[tauri::command]
pub async fn mongodb_is_connected(
    connection_id: String,
    state: State<'_, AppState>,
) -> Result<bool, String> {
    Ok(state.bridge.is_connected(&connection_id).await)
}

#[tauri::command]
pub async fn mongodb_connection_info(
    connection_id: String,
    state: State<'_, AppState>,
) -> Result<Option<ConnectionInfo>, String> {
    Ok(state.bridge.connection_info(&connection_id).await)
}

#[tauri::command]
pub async fn mongodb_list_databases(
    connection_id: String,
    state: State<'_, AppState>,
) -> Result<Vec<String>, String> {
    state
        .bridge
        .list_databases(&connection_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn mongodb_list_collections(
    connection_id: String,
    database_name: String,
    state: State<'_, AppState>,
) -> Result<Vec<String>, String> {
    state
        .bridge
        .list_collections(&connection_id, &database_name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn mongodb_get_documents(
    connection_id: String,
    database_name: String,
    collection_name: String,
    options: Option<QueryOptions>,
    state: State<'_, AppState>,
) -> Result<DocumentPage, String> {
    state
        .bridge
        .get_documents(&connection_id, &database_name, &collection_name, options)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn mongodb_insert_document(
    connection_id: String,
    database_name: String,
    collection_name: String,
    document: Value,
    state: State<'_, AppState>,
) -> Result<String, String> {
    state
        .bridge
        .insert_document(&connection_id, &database_name, &collection_name, document)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn mongodb_update_document(
    connection_id: String,
    database_name: String,
    collection_name: String,
    document_id: DocumentId,
    document: Value,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state
        .bridge
        .update_document(
            &connection_id,
            &database_name,
            &collection_name,
            &document_id,
            document,
        )
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn mongodb_delete_document(
    connection_id: String,
    database_name: String,
    collection_name: String,
    document_id: DocumentId,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state
        .bridge
        .delete_document(&connection_id, &database_name, &collection_name, &document_id)
        .await
        .map_err(|e| e.to_string())
}
