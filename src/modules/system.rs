use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;
use tracing::{error, info};

use crate::error::AppResult;
use crate::models::{AppConfig, Credentials};
use crate::modules::config;

pub const DASHBOARD_URL: &str = "https://cursor.com/settings";

pub fn open_dashboard(app: &AppHandle) {
    if let Err(e) = app.opener().open_url(DASHBOARD_URL, None::<&str>) {
        error!("Failed to open dashboard: {}", e);
    }
}

/// Open the config file in a text editor, writing an empty template first if needed
pub fn open_config(app: &AppHandle) {
    let path = match ensure_config_file() {
        Ok(path) => path,
        Err(e) => {
            error!("Error getting config path: {}", e);
            return;
        }
    };
    info!("Opening config file: {}", path.display());

    #[cfg(target_os = "macos")]
    {
        let _ = app;
        if let Err(e) = std::process::Command::new("open").arg("-t").arg(&path).spawn() {
            error!("Failed to open config file: {}", e);
        }
    }

    #[cfg(not(target_os = "macos"))]
    if let Err(e) = app
        .opener()
        .open_path(path.to_string_lossy(), None::<&str>)
    {
        error!("Failed to open config file: {}", e);
    }
}

fn ensure_config_file() -> AppResult<std::path::PathBuf> {
    let path = config::get_config_path()?;
    if !path.exists() {
        config::save_to(&path, &AppConfig::new(Credentials::new("", "")))?;
    }
    Ok(path)
}

/// Explain a setup failure; the tray stays in the error state afterwards
pub fn show_setup_error(app: &AppHandle, message: &str) {
    let config_hint = config::get_config_path()
        .map(|p| format!("\n\nConfig file: {}", p.display()))
        .unwrap_or_default();

    app.dialog()
        .message(format!("{}{}", message, config_hint))
        .title("Cursor Bar Setup")
        .kind(MessageDialogKind::Error)
        .show(|_| {});
}
