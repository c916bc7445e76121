use crate::error::{AppError, AppResult};
use crate::models::{AppConfig, Credentials};

/// Interactive credential bootstrap, used when no valid config exists
pub trait CredentialPrompter: Send + Sync {
    fn prompt(&self) -> AppResult<Credentials>;
}

/// Native dialogs through `osascript`
#[cfg(target_os = "macos")]
pub struct OsaScriptPrompter;

#[cfg(target_os = "macos")]
impl OsaScriptPrompter {
    const TOKEN_SCRIPT: &'static str = r#"
    set tokenValue to text returned of (display dialog "Enter your WorkosCursorSessionToken cookie:" & return & return & "Find it in DevTools > Application > Cookies > cursor.com" default answer "" with title "Cursor Bar Setup" with icon note)
    return tokenValue
  "#;

    const USER_ID_SCRIPT: &'static str = r#"
    set userValue to text returned of (display dialog "Enter your Cursor User ID:" & return & return & "Find it in the cookie value or API responses" default answer "" with title "Cursor Bar Setup" with icon note)
    return userValue
  "#;

    fn ask(script: &str) -> AppResult<String> {
        let output = std::process::Command::new("osascript")
            .args(["-e", script])
            .output()?;

        // Non-zero exit means the user pressed Cancel
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Prompt(format!(
                "Dialog dismissed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(target_os = "macos")]
impl CredentialPrompter for OsaScriptPrompter {
    fn prompt(&self) -> AppResult<Credentials> {
        let token = Self::ask(Self::TOKEN_SCRIPT)?;
        let user_id = Self::ask(Self::USER_ID_SCRIPT)?;

        let credentials = Credentials::new(token, user_id);
        if !credentials.is_valid() {
            return Err(AppError::Prompt(
                "Token and user ID must both be provided".to_string(),
            ));
        }
        Ok(credentials)
    }
}

/// Fallback for platforms without a native prompt
#[cfg_attr(target_os = "macos", allow(dead_code))]
pub struct UnsupportedPrompter;

impl CredentialPrompter for UnsupportedPrompter {
    fn prompt(&self) -> AppResult<Credentials> {
        Err(AppError::Prompt(
            "Prompt only supported on macOS; edit the config file instead".to_string(),
        ))
    }
}

pub fn default_prompter() -> Box<dyn CredentialPrompter> {
    #[cfg(target_os = "macos")]
    {
        Box::new(OsaScriptPrompter)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(UnsupportedPrompter)
    }
}

/// Return the stored config if it is usable, otherwise prompt and persist the answer
pub fn ensure_config(
    existing: Option<AppConfig>,
    prompter: &dyn CredentialPrompter,
    save: impl FnOnce(&AppConfig) -> AppResult<()>,
) -> AppResult<AppConfig> {
    if let Some(config) = existing.as_ref().filter(|c| c.is_valid()) {
        return Ok(config.clone());
    }

    let credentials = prompter.prompt()?;

    // Keep tunables from a partially filled file
    let config = match existing {
        Some(mut config) => {
            config.token = credentials.token;
            config.user_id = credentials.user_id;
            config
        }
        None => AppConfig::new(credentials),
    };

    if let Err(e) = save(&config) {
        tracing::error!("Error saving config: {}", e);
    }
    Ok(config)
}
