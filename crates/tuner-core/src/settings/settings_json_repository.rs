use std::path::PathBuf;

use tracing::debug;

use super::settings_repository::{BoxFuture, SettingsError, SettingsRepository, SettingsResult};
use super::tuner_settings::TunerSettings;

pub struct SettingsJsonRepository {
    file_path: PathBuf,
}

impl SettingsJsonRepository {
    /// Create repository with XDG-compliant path
    pub fn new() -> SettingsResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SettingsError::PathError("Cannot determine config directory".into()))?;

        let file_path = config_dir.join("tuner-lab").join("settings.json");

        Ok(Self { file_path })
    }

    /// Create repository with custom path (for testing)
    pub fn with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn storage_path(&self) -> String {
        self.file_path.to_string_lossy().to_string()
    }
}

impl SettingsRepository for SettingsJsonRepository {
    fn load(&self) -> BoxFuture<'static, SettingsResult<TunerSettings>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(TunerSettings::default());
            }

            let contents = tokio::fs::read_to_string(&path).await?;
            let settings: TunerSettings = serde_json::from_str(&contents)?;

            Ok(settings)
        })
    }

    fn save(&self, settings: TunerSettings) -> BoxFuture<'static, SettingsResult<()>> {
        let path = self.file_path.clone();

        Box::pin(async move {
            let json = serde_json::to_string_pretty(&settings)?;

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Write atomically using temp file + rename.
            let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
            tokio::fs::write(&temp_path, &json).await?;
            tokio::fs::rename(&temp_path, &path).await?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = SettingsJsonRepository::with_path(dir.path().join("settings.json"));

        let settings = repo.load().await.expect("defaults");
        assert_eq!(settings, TunerSettings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = SettingsJsonRepository::with_path(dir.path().join("cfg").join("settings.json"));

        let settings = TunerSettings {
            model: "gemini-2.0-flash".to_string(),
            tick_interval_ms: 200,
            api_key: Some("not persisted".to_string()),
        };
        repo.save(settings).await.expect("save");

        let loaded = repo.load().await.expect("load");
        assert_eq!(loaded.model, "gemini-2.0-flash");
        assert_eq!(loaded.tick_interval_ms, 200);
        assert_eq!(loaded.api_key, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").expect("write");

        let repo = SettingsJsonRepository::with_path(path);
        assert!(matches!(
            repo.load().await,
            Err(SettingsError::SerializationError(_))
        ));
    }
}
