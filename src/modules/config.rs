use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const DATA_DIR: &str = ".cursor-bar";
const CONFIG_FILE: &str = "config.json";

/// Get data directory path (`~/.cursor-bar`), creating it owner-only if missing
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);
    ensure_private_dir(&data_dir)?;
    Ok(data_dir)
}

pub fn get_config_path() -> AppResult<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

/// Load application config; `None` when the file has not been written yet
pub fn load_app_config() -> AppResult<Option<AppConfig>> {
    load_from(&get_config_path()?)
}

/// Save application config
pub fn save_app_config(config: &AppConfig) -> AppResult<()> {
    save_to(&get_config_path()?, config)
}

pub fn load_from(path: &Path) -> AppResult<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(Some(config))
}

/// Atomic write: temp file with 0600 permissions, then rename over the target
pub fn save_to(path: &Path, config: &AppConfig) -> AppResult<()> {
    if let Some(dir) = path.parent() {
        ensure_private_dir(dir)?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = private_file(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;

    tracing::info!("Config saved to {}", path.display());
    Ok(())
}

fn ensure_private_dir(dir: &Path) -> AppResult<()> {
    if dir.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    }
    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;

    Ok(())
}

fn private_file(path: &Path) -> AppResult<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    Ok(options.open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Credentials;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from(&dir.path().join("config.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = AppConfig::new(Credentials::new("tok", "user_1"));
        config.default_request_limit = 1000;
        save_to(&path, &config).unwrap();

        let loaded = load_from(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ token: ").unwrap();
        assert!(matches!(load_from(&path), Err(AppError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join(".cursor-bar");
        let path = data_dir.join("config.json");
        save_to(&path, &AppConfig::new(Credentials::new("t", "u"))).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = fs::metadata(&data_dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode & 0o077, 0);
    }
}
