//! 解析器配置
//!
//! 扫描目录与文件命名约定可以从 TOML 或 JSON 文件读取，缺省项使用默认值。

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 解析器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// 扫描根目录，按顺序合并
    pub directories: Vec<PathBuf>,
    /// 入口文件名（不含扩展名）
    pub entry_stem: String,
    /// 提供者文件名（不含扩展名）
    pub provider_stem: String,
    /// 可加载的扩展名，同时决定提供者文件的查找顺序
    pub extensions: Vec<String>,
    /// 仅作为声明的扩展名
    pub declaration_extensions: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            entry_stem: "index".to_string(),
            provider_stem: "provider".to_string(),
            extensions: ["js", "cjs", "mjs", "ts"].map(String::from).to_vec(),
            declaration_extensions: vec!["ts".to_string()],
        }
    }
}

impl ResolverConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文本解析
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 按扩展名读取配置文件
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("加载解析器配置文件: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.entry_stem.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "入口文件名不能为空".to_string(),
            });
        }
        if self.provider_stem.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "提供者文件名不能为空".to_string(),
            });
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "至少需要一个可加载的扩展名".to_string(),
            });
        }
        Ok(())
    }
}
