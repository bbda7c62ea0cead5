//! JSON 模块加载器
//!
//! 把 `index.json` 当作数据模块读取，适用于只包含配置数据的目录。

use async_trait::async_trait;
use di_abstractions::{ModuleLoader, ScanOptions};
use infrastructure_common::{InjectError, InjectResult, Value};
use std::path::Path;
use tracing::debug;

/// 以 JSON 文件内容作为默认导出的加载器
#[derive(Debug, Clone, Default)]
pub struct JsonModuleLoader;

impl JsonModuleLoader {
    /// 创建加载器
    pub fn new() -> Self {
        Self
    }

    /// 与该加载器配套的扫描选项
    pub fn scan_options() -> ScanOptions {
        ScanOptions {
            extensions: vec!["json".to_string()],
            declaration_extensions: Vec::new(),
            ..ScanOptions::default()
        }
    }
}

#[async_trait]
impl ModuleLoader for JsonModuleLoader {
    async fn load_default(&self, path: &Path) -> InjectResult<Value> {
        debug!("读取 JSON 模块: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InjectError::load_failed(path.display().to_string(), e))?;
        let data: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| InjectError::load_failed(path.display().to_string(), e))?;

        Ok(Value::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn json_files_become_data_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{"host": "localhost", "port": 8080}"#).unwrap();

        let value = JsonModuleLoader::new().load_default(&path).await.unwrap();
        assert_eq!(value.get("host").unwrap(), Value::from("localhost"));
        assert_eq!(value.get("port").unwrap().as_i64(), Some(8080));
    }

    #[tokio::test]
    async fn malformed_json_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonModuleLoader::new().load_default(&path).await.unwrap_err();
        assert!(matches!(err, InjectError::LoadFailed { .. }));
    }

    #[test]
    fn scan_options_only_accept_json() {
        let options = JsonModuleLoader::scan_options();
        assert_eq!(options.entry_extension("index.json"), Some("json"));
        assert_eq!(options.entry_extension("index.js"), None);
    }
}
