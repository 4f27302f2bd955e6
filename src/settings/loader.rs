//! Settings loading and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.interviewer/settings.toml` (or an explicit path)
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - First-run template generation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::schema::InterviewerSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".interviewer")
        .join("settings.toml")
}

/// Loads settings once at startup and hands out the resolved values.
pub struct SettingsManager {
    /// Settings with env vars resolved
    settings: InterviewerSettings,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Load from the default location, generating a template on first run.
    pub async fn new() -> Result<Self> {
        let path = settings_path();
        let manager = Self::with_path(path).await?;
        if let Err(e) = manager.ensure_settings_file().await {
            // A read-only home directory is not fatal; defaults still apply
            tracing::warn!("Could not write settings template: {:#}", e);
        }
        Ok(manager)
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub async fn with_path(path: PathBuf) -> Result<Self> {
        let settings = Self::load_from_path(&path).await?;
        Ok(Self { settings, path })
    }

    /// Load settings from a specific path.
    async fn load_from_path(path: &Path) -> Result<InterviewerSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(InterviewerSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file {:?}", path))?;

        // Parse into typed struct
        let mut settings: InterviewerSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        // Resolve environment variable references
        Self::resolve_env_vars(&mut settings);

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    fn resolve_env_vars(settings: &mut InterviewerSettings) {
        // Helper to resolve a single optional string
        // An unset reference resolves to None, i.e. "not configured"
        fn resolve_opt(value: &mut Option<String>) {
            let Some(v) = value.as_deref() else {
                return;
            };
            if v.trim().starts_with('$') {
                *value = resolve_env_ref(v);
            }
        }

        resolve_opt(&mut settings.ai.openai.api_key);
        resolve_opt(&mut settings.ai.openrouter.api_key);
        resolve_opt(&mut settings.questions.bank_path);
    }

    /// Get the current settings (read-only).
    pub fn get(&self) -> &InterviewerSettings {
        &self.settings
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false); // Already exists
        }

        // Create parent directory
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write template
        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true) // Created new file
    }
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
/// Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    let var_name = if let Some(braced) = trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        braced
    } else {
        trimmed.strip_prefix('$')?
    };

    std::env::var(var_name).ok()
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    // 1. Check settings value
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    // 2. Check environment variables
    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    // 3. Return default
    default
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_ref_dollar_format() {
        std::env::set_var("INTERVIEWER_TEST_VAR_1", "test_value_1");

        assert_eq!(
            resolve_env_ref("$INTERVIEWER_TEST_VAR_1"),
            Some("test_value_1".to_string())
        );

        std::env::remove_var("INTERVIEWER_TEST_VAR_1");
    }

    #[test]
    fn test_resolve_env_ref_braces_format() {
        std::env::set_var("INTERVIEWER_TEST_VAR_2", "test_value_2");

        assert_eq!(
            resolve_env_ref("${INTERVIEWER_TEST_VAR_2}"),
            Some("test_value_2".to_string())
        );

        std::env::remove_var("INTERVIEWER_TEST_VAR_2");
    }

    #[test]
    fn test_resolve_env_ref_no_match() {
        assert_eq!(resolve_env_ref("regular_value"), None);
        assert_eq!(resolve_env_ref("$NONEXISTENT_VAR_XYZ_12345"), None);
    }

    #[test]
    fn test_get_with_env_fallback_from_setting() {
        let setting = Some("from_settings".to_string());
        let result = get_with_env_fallback(&setting, &["SOME_VAR"], None);
        assert_eq!(result, Some("from_settings".to_string()));
    }

    #[test]
    fn test_get_with_env_fallback_from_env() {
        std::env::set_var("INTERVIEWER_FALLBACK_TEST_VAR", "from_env");

        let setting = None;
        let result = get_with_env_fallback(&setting, &["INTERVIEWER_FALLBACK_TEST_VAR"], None);
        assert_eq!(result, Some("from_env".to_string()));

        std::env::remove_var("INTERVIEWER_FALLBACK_TEST_VAR");
    }

    #[test]
    fn test_get_with_env_fallback_default() {
        let setting = None;
        let result = get_with_env_fallback(
            &setting,
            &["NONEXISTENT_VAR_ABC"],
            Some("default_value".to_string()),
        );
        assert_eq!(result, Some("default_value".to_string()));
    }

    #[test]
    fn test_get_with_env_fallback_empty_setting() {
        std::env::set_var("INTERVIEWER_EMPTY_SETTING_TEST", "from_env");

        // Empty string in setting should fall through to env var
        let setting = Some("".to_string());
        let result = get_with_env_fallback(&setting, &["INTERVIEWER_EMPTY_SETTING_TEST"], None);
        assert_eq!(result, Some("from_env".to_string()));

        std::env::remove_var("INTERVIEWER_EMPTY_SETTING_TEST");
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let manager = SettingsManager::with_path(PathBuf::from("/nonexistent/settings.toml"))
            .await
            .unwrap();

        assert_eq!(manager.get(), &InterviewerSettings::default());
    }

    #[tokio::test]
    async fn test_load_resolves_env_refs() {
        std::env::set_var("INTERVIEWER_LOADER_KEY", "sk-test");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(
            &path,
            r#"
                [ai]
                provider = "openrouter"

                [ai.openrouter]
                api_key = "${INTERVIEWER_LOADER_KEY}"

                [ai.openai]
                api_key = "$INTERVIEWER_LOADER_UNSET_KEY"
            "#,
        )
        .await
        .unwrap();

        let manager = SettingsManager::with_path(path).await.unwrap();
        let settings = manager.get();
        assert_eq!(settings.ai.provider, "openrouter");
        assert_eq!(settings.ai.openrouter.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.ai.openai.api_key, None);

        std::env::remove_var("INTERVIEWER_LOADER_KEY");
    }

    #[tokio::test]
    async fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "[server\nport = ").await.unwrap();

        assert!(SettingsManager::with_path(path).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_settings_file_writes_parseable_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let manager = SettingsManager::with_path(path.clone()).await.unwrap();

        assert!(manager.ensure_settings_file().await.unwrap());
        assert!(!manager.ensure_settings_file().await.unwrap());

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: InterviewerSettings = toml::from_str(&contents).unwrap();
        assert_eq!(parsed.server.port, 8000);
        assert_eq!(parsed.ai.provider, "openai");
    }
}
