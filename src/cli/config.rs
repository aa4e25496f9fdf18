// FILE: src/cli/config.rs

use crate::error::{ConverterError, Result};
use crate::{CollisionPolicy, ConverterOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "less2sass.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub repository_url: Option<String>,
    pub git_ref: Option<String>,
    pub hashed_subtree: Option<String>,
    pub checkout_dir: Option<String>,
    pub theme_dir: Option<String>,
    pub definitions_dir: Option<String>,
    pub site_variables: Option<String>,
    pub stylesheets_dir: Option<String>,
    pub javascripts_dir: Option<String>,
    pub version_file: Option<String>,
    pub version_constant: Option<String>,
    pub record_version: Option<bool>,
    pub rewrite_asset_urls: Option<bool>,
    pub on_collision: Option<CollisionPolicy>,
}

impl ConfigFile {
    /// Every field filled in with the built-in default
    pub fn from_options(options: &ConverterOptions) -> Self {
        let path = |p: &PathBuf| Some(p.to_string_lossy().into_owned());
        Self {
            repository_url: Some(options.repository_url.clone()),
            git_ref: Some(options.git_ref.clone()),
            hashed_subtree: Some(options.hashed_subtree.clone()),
            checkout_dir: path(&options.checkout_dir),
            theme_dir: path(&options.theme_dir),
            definitions_dir: path(&options.definitions_dir),
            site_variables: path(&options.site_variables),
            stylesheets_dir: path(&options.stylesheets_dir),
            javascripts_dir: path(&options.javascripts_dir),
            version_file: path(&options.version_file),
            version_constant: Some(options.version_constant.clone()),
            record_version: Some(options.record_version),
            rewrite_asset_urls: Some(options.rewrite_asset_urls),
            on_collision: Some(options.collision_policy),
        }
    }

    /// Overlay the fields that are set onto `options`
    pub fn apply(&self, mut options: ConverterOptions) -> ConverterOptions {
        let set_string = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *target = value.clone();
            }
        };
        let set_path = |target: &mut PathBuf, value: &Option<String>| {
            if let Some(value) = value {
                *target = PathBuf::from(value);
            }
        };

        set_string(&mut options.repository_url, &self.repository_url);
        set_string(&mut options.git_ref, &self.git_ref);
        set_string(&mut options.hashed_subtree, &self.hashed_subtree);
        set_string(&mut options.version_constant, &self.version_constant);
        set_path(&mut options.checkout_dir, &self.checkout_dir);
        set_path(&mut options.theme_dir, &self.theme_dir);
        set_path(&mut options.definitions_dir, &self.definitions_dir);
        set_path(&mut options.site_variables, &self.site_variables);
        set_path(&mut options.stylesheets_dir, &self.stylesheets_dir);
        set_path(&mut options.javascripts_dir, &self.javascripts_dir);
        set_path(&mut options.version_file, &self.version_file);

        if let Some(record) = self.record_version {
            options.record_version = record;
        }
        if let Some(rewrite) = self.rewrite_asset_urls {
            options.rewrite_asset_urls = rewrite;
        }
        if let Some(policy) = self.on_collision {
            options.collision_policy = policy;
        }
        options
    }
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path)
        .map_err(|e| ConverterError::io_at(format!("Config file {}", config_path), e))?;

    let config = if config_path.ends_with(".json") {
        serde_json::from_str(&config_content).map_err(|e| ConverterError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        })?
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content).map_err(|e| ConverterError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })?
    } else {
        return Err(ConverterError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        });
    };

    log::info!("Loaded configuration from {}", config_path);
    Ok(config)
}

/// Default configuration rendered as TOML
pub fn render_default() -> Result<String> {
    let config = ConfigFile::from_options(&ConverterOptions::default());
    toml::to_string_pretty(&config).map_err(|e| ConverterError::InvalidFormat {
        message: format!("TOML serialization error: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_round_trips_to_defaults() {
        let rendered = render_default().unwrap();
        assert!(rendered.contains("version_constant = \"SEMANTIC_UI_SHA\""));

        let config: ConfigFile = toml::from_str(&rendered).unwrap();
        assert!(rendered.contains("on_collision = \"error\""));
        let options = config.apply(ConverterOptions::default());
        let defaults = ConverterOptions::default();
        assert_eq!(options.checkout_dir, defaults.checkout_dir);
        assert_eq!(options.stylesheets_dir, defaults.stylesheets_dir);
        assert_eq!(options.collision_policy, CollisionPolicy::Error);
    }

    #[test]
    fn test_load_json_and_toml() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("config.json");
        fs::write(&json, r#"{ "git_ref": "2.4.2", "rewrite_asset_urls": true }"#).unwrap();
        let config = load(json.to_str().unwrap()).unwrap();
        assert_eq!(config.git_ref.as_deref(), Some("2.4.2"));
        assert_eq!(config.rewrite_asset_urls, Some(true));

        let toml_path = dir.path().join("config.toml");
        fs::write(&toml_path, "checkout_dir = \"vendor/sui\"\n").unwrap();
        let config = load(toml_path.to_str().unwrap()).unwrap();
        assert_eq!(config.checkout_dir.as_deref(), Some("vendor/sui"));
        assert!(config.git_ref.is_none());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "git_ref: master\n").unwrap();
        assert!(matches!(
            load(path.to_str().unwrap()),
            Err(ConverterError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_collision_policy_names() {
        let config: ConfigFile = toml::from_str("on_collision = \"overwrite\"\n").unwrap();
        assert_eq!(config.on_collision, Some(CollisionPolicy::Overwrite));
        let options = config.apply(ConverterOptions::default());
        assert_eq!(options.collision_policy, CollisionPolicy::Overwrite);

        assert!(toml::from_str::<ConfigFile>("on_collision = \"merge\"\n").is_err());
    }
}
