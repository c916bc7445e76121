pub mod error;
mod models;
mod modules;
mod utils;

use std::sync::Arc;

use modules::api::UsageClient;
use modules::refresh::{DisplaySink, DisplayState, RefreshService, RefreshTrigger};
use modules::tray::TrayMenu;
use modules::{config, logger, prompt};
use tauri::{AppHandle, Manager};
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::AppConfig;

/// Stored config, or credentials from the native prompt when it is missing or incomplete
fn load_or_prompt_config() -> AppResult<AppConfig> {
    let existing = match config::load_app_config() {
        Ok(existing) => existing,
        Err(e) => {
            error!("Error loading config: {}", e);
            None
        }
    };

    let prompter = prompt::default_prompter();
    prompt::ensure_config(existing, prompter.as_ref(), config::save_app_config)
}

/// Put the tray in its permanent error state when no usable config exists
fn fail_startup(app: &AppHandle, tray: &TrayMenu, message: String) {
    error!("Startup failed: {}", message);
    tray.render(&DisplayState::failed(message.clone()));
    modules::system::show_setup_error(app, &message);
}

async fn start_monitoring(app: AppHandle, tray: Arc<TrayMenu>) {
    // Dialogs block until answered, keep them off the async workers
    let config = match tauri::async_runtime::spawn_blocking(load_or_prompt_config).await {
        Ok(Ok(config)) => config,
        Ok(Err(e)) => return fail_startup(&app, &tray, e.to_string()),
        Err(e) => return fail_startup(&app, &tray, e.to_string()),
    };

    let client = match UsageClient::new(config.credentials(), config.proxy.as_deref()) {
        Ok(client) => client,
        Err(e) => return fail_startup(&app, &tray, e.to_string()),
    };

    let service = Arc::new(RefreshService::new(client, &config, tray));
    app.manage(service.clone());

    // A rejected token leaves `!` up until a later refresh succeeds
    if service.validate().await.is_ok() {
        let _ = service.refresh(RefreshTrigger::Startup).await;
    }
    service.run_timer(config.refresh_interval()).await;
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Flushes the log file when `run` returns
    let _log_guard = logger::init_logger();

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            info!("Second instance launched, refreshing instead");
            modules::tray::trigger_refresh(app);
        }))
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            info!("Setup starting...");

            // Menu-bar only, no Dock icon
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let tray = modules::tray::create_tray(app.handle())?;
            info!("Tray created");

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(start_monitoring(handle, tray));

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
