#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::Context;
use mongo_workbench::app::{commands, state::AppState};
use mongo_workbench::config::AppConfig;
use mongo_workbench::logging;
use tauri::{CustomMenuItem, Menu, MenuItem, RunEvent, Submenu};

const MENU_NEW_CONNECTION: &str = "new-connection";
const EVENT_NEW_CONNECTION: &str = "menu-new-connection";

fn build_menu() -> Menu {
    let file = Menu::new()
        .add_item(
            CustomMenuItem::new(MENU_NEW_CONNECTION, "New Connection").accelerator("CmdOrCtrl+N"),
        )
        .add_native_item(MenuItem::Separator)
        .add_native_item(MenuItem::Quit);
    let edit = Menu::new()
        .add_native_item(MenuItem::Undo)
        .add_native_item(MenuItem::Redo)
        .add_native_item(MenuItem::Separator)
        .add_native_item(MenuItem::Cut)
        .add_native_item(MenuItem::Copy)
        .add_native_item(MenuItem::Paste)
        .add_native_item(MenuItem::SelectAll);

    Menu::new()
        .add_submenu(Submenu::new("File", file))
        .add_submenu(Submenu::new("Edit", edit))
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    logging::init(&config.log_level)?;
    tracing::info!(app = %config.app_name, "starting");

    let state = AppState::new(&config);
    let registry = state.bridge.registry();

    let app = tauri::Builder::default()
        .menu(build_menu())
        .on_menu_event(|event| {
            if event.menu_item_id() == MENU_NEW_CONNECTION {
                if let Err(err) = event.window().emit(EVENT_NEW_CONNECTION, ()) {
                    tracing::warn!(error = %err, "failed to emit menu notification");
                }
            }
        })
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            commands::app_version,
            commands::platform,
            // Connection Management
            commands::mongodb_connect,
            commands::mongodb_disconnect,
            commands::mongodb_test_connection,
            commands::mongodb_is_connected,
            commands::mongodb_connection_info,
            // Database Operations
            commands::mongodb_list_databases,
            commands::mongodb_list_collections,
            // Documents
            commands::mongodb_get_documents,
            commands::mongodb_insert_document,
            commands::mongodb_update_document,
            commands::mongodb_delete_document,
        ])
        .build(tauri::generate_context!())
        .context("error building Mongo Workbench")?;

    app.run(move |_handle, event| {
        if let RunEvent::Exit = event {
            tauri::async_runtime::block_on(registry.close_all());
            tracing::info!("registry closed");
        }
    });
    Ok(())
}
