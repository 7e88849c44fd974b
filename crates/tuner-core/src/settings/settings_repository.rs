use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use super::tuner_settings::TunerSettings;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

pub trait SettingsRepository: Send + Sync + 'static {
    /// Load settings, falling back to defaults when nothing is stored yet
    fn load(&self) -> BoxFuture<'static, SettingsResult<TunerSettings>>;

    /// Save settings to storage
    fn save(&self, settings: TunerSettings) -> BoxFuture<'static, SettingsResult<()>>;
}
