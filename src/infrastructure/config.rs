use std::path::{Path, PathBuf};

use config::{ConfigError, FileFormat};
use serde::Deserialize;

use crate::{core::config::LoadMoreConfig, utils};

const CONFIG: &str = include_str!("../../.config/config.json5");

const CONFIG_FILES: [(&str, FileFormat); 5] = [
    ("config.json5", FileFormat::Json5),
    ("config.json", FileFormat::Json),
    ("config.yaml", FileFormat::Yaml),
    ("config.toml", FileFormat::Toml),
    ("config.ini", FileFormat::Ini),
];

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub _data_dir: PathBuf,
    #[serde(default)]
    pub _config_dir: PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    #[serde(default)]
    pub load_more: LoadMoreConfig,
}

impl Config {
    /// Embedded defaults overlaid with whatever config file exists in the
    /// config directory
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_dir(&utils::get_config_dir())
    }

    pub fn from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        let data_dir = utils::get_data_dir();
        let mut builder = config::Config::builder()
            .set_default("_data_dir", data_dir.to_string_lossy().into_owned())?
            .set_default("_config_dir", config_dir.to_string_lossy().into_owned())?
            .add_source(config::File::from_str(CONFIG, FileFormat::Json5));

        let mut found_config = false;
        for (file, format) in CONFIG_FILES {
            let path = config_dir.join(file);
            found_config |= path.exists();
            builder = builder.add_source(config::File::from(path).format(format).required(false));
        }
        if !found_config {
            log::info!(
                "no configuration file in {}, using defaults",
                config_dir.display()
            );
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.load_more
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }
}
