use crate::error::{HandtableError, Result};
use handtable_common::types::{DEFAULT_BACKEND_URL, EXPORT_TIMEOUT, EXTRACT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// バックエンドURLを上書きする環境変数
pub const BACKEND_URL_ENV: &str = "HANDTABLE_BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub extract_timeout_secs: u64,
    pub export_timeout_secs: u64,
    /// Excelの保存先（未指定ならカレントディレクトリ）
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            extract_timeout_secs: EXTRACT_TIMEOUT.as_secs(),
            export_timeout_secs: EXPORT_TIMEOUT.as_secs(),
            output_dir: None,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数の上書きを適用（検証は呼び出し側で行う）
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&Self::config_path()?)?.with_env_override())
    }

    /// 設定ファイルが壊れていても既定値で読み込む（`config` コマンドで直せるように）
    pub fn load_for_repair() -> Result<Self> {
        Ok(Self::load_or_default_from(&Self::config_path()?).with_env_override())
    }

    pub fn load_or_default_from(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file unreadable, using defaults");
                Self::default()
            }
        }
    }

    fn with_env_override(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
        self
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| HandtableError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("handtable").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HandtableError::Config(format!(
                "backend_url は http:// または https:// で始まる必要があります: {}",
                self.backend_url
            )));
        }
        if self.extract_timeout_secs == 0 || self.export_timeout_secs == 0 {
            return Err(HandtableError::Config("タイムアウトは1秒以上にしてください".into()));
        }
        Ok(())
    }

    pub fn set_backend_url(&mut self, url: String) -> Result<()> {
        self.backend_url = url;
        self.validate()?;
        self.save()
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.extract_timeout(), Duration::from_secs(60));
        assert_eq!(config.export_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_save_and_load_roundtrip_partial_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"backend_url": "http://10.0.0.5:8000"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend_url, "http://10.0.0.5:8000");
        assert_eq!(config.extract_timeout_secs, 60);

        config.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.export_timeout_secs, 30);
    }

    #[test]
    fn test_corrupt_file_can_be_repaired() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::load_from(&path), Err(HandtableError::JsonParse(_))));

        let mut config = Config::load_or_default_from(&path);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);

        config.backend_url = "http://10.0.0.5:8000".into();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().backend_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = Config {
            backend_url: "localhost:8000".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HandtableError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            extract_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
