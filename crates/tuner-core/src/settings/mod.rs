pub mod settings_json_repository;
pub mod settings_repository;
pub mod tuner_settings;

pub use settings_json_repository::SettingsJsonRepository;
pub use settings_repository::{SettingsError, SettingsRepository, SettingsResult};
pub use tuner_settings::TunerSettings;
