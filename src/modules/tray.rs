use std::sync::Arc;

use tauri::menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tauri::tray::{TrayIcon, TrayIconBuilder};
use tauri::{AppHandle, Manager, Wry};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::modules::formatter::{EVENT_SLOTS, TITLE_LOADING};
use crate::modules::refresh::{DisplaySink, DisplayState, RefreshService, RefreshTrigger};
use crate::modules::system;

pub const TRAY_ID: &str = "main";
const TOOLTIP: &str = "Cursor Usage";

const MENU_REFRESH: &str = "refresh";
const MENU_DASHBOARD: &str = "open_dashboard";
const MENU_EDIT_CONFIG: &str = "edit_config";
const MENU_QUIT: &str = "quit";

/// Handles to the tray and every menu row that changes between refreshes
pub struct TrayMenu {
    tray: TrayIcon<Wry>,
    request_usage: MenuItem<Wry>,
    request_bar: MenuItem<Wry>,
    request_reset: MenuItem<Wry>,
    money_usage: MenuItem<Wry>,
    money_bar: MenuItem<Wry>,
    events: Vec<MenuItem<Wry>>,
}

fn label(app: &AppHandle, text: &str) -> tauri::Result<MenuItem<Wry>> {
    MenuItem::new(app, text, false, None::<&str>)
}

fn action(app: &AppHandle, id: &str, text: &str) -> tauri::Result<MenuItem<Wry>> {
    MenuItem::with_id(app, id, text, true, None::<&str>)
}

/// Build the menu and attach it to the tray declared in `tauri.conf.json`
pub fn create_tray(app: &AppHandle) -> AppResult<Arc<TrayMenu>> {
    let request_usage = label(app, TITLE_LOADING)?;
    let request_bar = label(app, TITLE_LOADING)?;
    let request_reset = label(app, TITLE_LOADING)?;
    let money_usage = label(app, TITLE_LOADING)?;
    let money_bar = label(app, TITLE_LOADING)?;
    let events = (0..EVENT_SLOTS)
        .map(|_| label(app, TITLE_LOADING))
        .collect::<tauri::Result<Vec<_>>>()?;

    let menu = Menu::new(app)?;

    // Request usage section
    menu.append_items(&[
        &label(app, "Request Usage")?,
        &request_usage,
        &request_bar,
        &request_reset,
        &PredefinedMenuItem::separator(app)?,
    ])?;

    // Money usage section
    menu.append_items(&[
        &label(app, "Request Usage (Money)")?,
        &money_usage,
        &money_bar,
        &PredefinedMenuItem::separator(app)?,
    ])?;

    // Recent usage section
    menu.append_items(&[
        &label(app, "Recent Usage")?,
        &PredefinedMenuItem::separator(app)?,
    ])?;
    for item in &events {
        menu.append(item)?;
    }

    menu.append_items(&[
        &PredefinedMenuItem::separator(app)?,
        &action(app, MENU_REFRESH, "Refresh")?,
        &action(app, MENU_DASHBOARD, "Open Dashboard")?,
        &action(app, MENU_EDIT_CONFIG, "Edit Config")?,
        &PredefinedMenuItem::separator(app)?,
        &action(app, MENU_QUIT, "Quit")?,
    ])?;

    let tray = match app.tray_by_id(TRAY_ID) {
        Some(tray) => tray,
        None => {
            let mut builder = TrayIconBuilder::with_id(TRAY_ID)
                .title(TITLE_LOADING)
                .tooltip(TOOLTIP)
                .icon_as_template(true);
            if let Some(icon) = app.default_window_icon() {
                builder = builder.icon(icon.clone());
            }
            builder.build(app)?
        }
    };
    tray.set_menu(Some(menu))?;
    tray.on_menu_event(handle_menu_event);

    Ok(Arc::new(TrayMenu {
        tray,
        request_usage,
        request_bar,
        request_reset,
        money_usage,
        money_bar,
        events,
    }))
}

fn handle_menu_event(app: &AppHandle, event: MenuEvent) {
    match event.id().as_ref() {
        MENU_REFRESH => trigger_refresh(app),
        MENU_DASHBOARD => system::open_dashboard(app),
        MENU_EDIT_CONFIG => system::open_config(app),
        MENU_QUIT => {
            info!("Quit requested from tray");
            app.exit(0);
        }
        _ => {}
    }
}

/// Start a manual refresh if monitoring is running
pub fn trigger_refresh(app: &AppHandle) {
    let Some(service) = app.try_state::<Arc<RefreshService>>() else {
        info!("Refresh ignored: monitoring is not running");
        return;
    };

    let service = service.inner().clone();
    tauri::async_runtime::spawn(async move {
        let _ = service.refresh(RefreshTrigger::Manual).await;
    });
}

fn tooltip(state: &DisplayState) -> String {
    match &state.last_error {
        Some(err) => format!("{}\nLast error: {}", TOOLTIP, err),
        None => TOOLTIP.to_string(),
    }
}

impl TrayMenu {
    fn apply(&self, state: &DisplayState) -> tauri::Result<()> {
        self.tray.set_title(Some(&state.title))?;
        self.tray.set_tooltip(Some(tooltip(state)))?;

        self.request_usage.set_text(&state.request_usage)?;
        self.request_bar.set_text(&state.request_bar)?;
        self.request_reset.set_text(&state.request_reset)?;
        self.money_usage.set_text(&state.money_usage)?;
        self.money_bar.set_text(&state.money_bar)?;

        for (item, text) in self.events.iter().zip(&state.events) {
            item.set_text(text)?;
        }
        Ok(())
    }
}

impl DisplaySink for TrayMenu {
    fn render(&self, state: &DisplayState) {
        if let Err(e) = self.apply(state) {
            warn!("Failed to update tray: {}", e);
        }
    }
}
